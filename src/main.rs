//! alpha_scout - Binance Alpha listing scout
//!
//! ```text
//! ┌────────────┐    ┌────────────┐    ┌────────────┐    ┌────────────┐
//! │  Binance   │───▶│   Alpha    │───▶│ Classifier │───▶│  Advisor   │
//! │ pairs sync │    │  listing   │    │ (platform) │    │ + webhook  │
//! └────────────┘    └────────────┘    └────────────┘    └────────────┘
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use alpha_scout::config::AppConfig;
use alpha_scout::logging::init_logging;
use alpha_scout::pipeline::{Components, Pipeline, RunOptions, RunSummary};

#[derive(Debug, Parser)]
#[command(name = "alpha_scout", version, about = "Binance Alpha listing scout")]
struct Args {
    /// Configuration environment (loads config/<env>.yaml)
    #[arg(long, short = 'e', default_value = "dev")]
    env: String,

    /// Generate prompts only: no advisor requests, no listing push
    #[arg(long)]
    debug_only: bool,

    /// Process a single platform (debug runs only)
    #[arg(long)]
    platform: Option<String>,

    /// Ignore the cached Alpha listing
    #[arg(long)]
    force_update: bool,

    /// Do not refresh the exchange trading pair snapshot
    #[arg(long)]
    skip_tokens_update: bool,
}

impl Args {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            debug_only: self.debug_only,
            platform: self.platform.clone(),
            force_update: self.force_update,
            skip_tokens_update: self.skip_tokens_update,
        }
    }
}

fn load_config(env: &str) -> Result<AppConfig> {
    let mut config = AppConfig::load(env).with_context(|| format!("loading config for env '{}'", env))?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

fn print_mode(options: &RunOptions) {
    println!("Run mode:");
    if !options.skip_tokens_update {
        println!("- update Binance trading pairs");
    }
    println!("- fetch Binance Alpha listing");
    if options.debug_only {
        println!("- debug: prompts only, no advisor requests");
    } else {
        println!("- regular: request advice and push messages");
    }
    if options.force_update {
        println!("- force update: listing cache ignored");
    }
    println!();
}

fn print_summary(summary: &RunSummary, debug_only: bool) {
    println!("\n=== Run summary ===");
    println!(
        "Removed {} listed and {} block-listed projects",
        summary.removed_listed, summary.blocked
    );
    println!("Succeeded: {}/{}", summary.succeeded.len(), summary.attempted());
    if !summary.failed.is_empty() {
        println!("Failed: {}", summary.failed.join(", "));
    }
    if !summary.skipped.is_empty() {
        println!("Skipped (no projects): {}", summary.skipped.join(", "));
    }
    if summary.aborted {
        println!("⚠️ Stopped early after consecutive advisor failures");
    }
    if let Some(path) = &summary.combined_advice {
        println!("Combined advice: {}", path.display());
    }
    match (summary.succeeded.is_empty(), debug_only) {
        (false, true) => println!("✅ Prompts generated"),
        (false, false) => println!("✅ Advice processed"),
        (true, _) => println!("⚠️ No platform produced advice"),
    }
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    let options = args.run_options();
    print_mode(&options);

    let components = Components::from_config(&config, &options)?;
    let pipeline = Pipeline::new(config, components)?;
    let summary = pipeline.run(&options).await?;

    print_summary(&summary, options.debug_only);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let config = match load_config(&args.env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = init_logging(&config);

    tracing::info!(
        env = %args.env,
        git = env!("ALPHA_SCOUT_GIT_HASH"),
        "Starting alpha_scout"
    );
    println!("=== alpha_scout: Binance Alpha listing scout ===\n");

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Run failed");
            eprintln!("\n❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
