use std::fs;
use std::path::Path;

use alpha_scout::config::AppConfig;
use alpha_scout::pipeline::{Components, Pipeline, RunOptions};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_dir(name: &str) -> String {
    let dir = format!("target/test_qa_run_{}_{}", name, std::process::id());
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn config(server: &MockServer, data_dir: &str) -> AppConfig {
    let mut config = AppConfig {
        data_dir: data_dir.to_string(),
        ..AppConfig::default()
    };
    config.exchange.base_url = server.uri();
    config.market.listing_url = format!("{}/listing", server.uri());
    config.advisor.api_url = format!("{}/chat", server.uri());
    config.advisor.api_key = "sk-test".to_string();
    config.advisor.retry_delay_ms = 1;
    config.webhook.url = format!("{}/hook", server.uri());
    config.webhook.max_segment_len = 4000;
    config.webhook.segment_delay_ms = 1;
    config
}

fn project(id: u64, symbol: &str, platform: &str, market_cap: f64) -> Value {
    json!({
        "id": id,
        "name": format!("{} Project", symbol),
        "symbol": symbol,
        "cmcRank": id,
        "platform": {"name": platform},
        "tags": ["alpha", 7],
        "quotes": [{"name": "USD", "price": 1.5, "marketCap": market_cap, "fullyDilluttedMarketCap": market_cap * 2.0, "volume24h": 1000.0}]
    })
}

async fn mount_listing(server: &MockServer, expect: u64) {
    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "cryptoCurrencyList": [
                    project(1, "SATS", "BNB", 5_000_000.0),
                    project(2, "OLD", "BNB", 4_000_000.0),
                    project(3, "NEWSOL", "Solana", 3_000_000.0),
                    project(4, "AITECH", "BNB", 2_000_000.0),
                ],
                "totalCount": "4"
            }
        })))
        .expect(expect)
        .mount(server)
        .await;
}

async fn mount_exchange(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v3/exchangeInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbols": [
                {"symbol": "BTCUSDT", "status": "TRADING"},
                {"symbol": "1000SATSUSDT", "status": "TRADING"},
                {"symbol": "OLDUSDT", "status": "BREAK"}
            ]
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_hook(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errcode": 0, "errmsg": "ok"})))
        .mount(server)
        .await;
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn qa_tc_full_run_against_mocked_services() {
    let server = MockServer::start().await;
    let dir = test_dir("full");
    mount_exchange(&server).await;
    mount_listing(&server, 1).await;
    mount_hook(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": format!("1. **New Sol (NEWSOL)** {}", "Top pick: ".repeat(20))}}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let config = config(&server, &dir);
    let options = RunOptions::default();
    let components = Components::from_config(&config, &options).unwrap();
    let summary = Pipeline::new(config, components).unwrap().run(&options).await.unwrap();

    // SATS is listed as 1000SATS; OLD is halted so it stays; AITECH is block-listed
    assert_eq!(summary.removed_listed, 1);
    assert_eq!(summary.blocked, 1);
    assert_eq!(summary.succeeded, vec!["BNB Chain", "Solana"]);
    assert_eq!(summary.skipped, vec!["Ethereum"]);
    assert!(!summary.aborted);

    let root = Path::new(&dir);
    assert_eq!(count_files(&root.join("symbols/canonical_tokens")), 1);
    assert_eq!(count_files(&root.join("platforms")), 2);
    assert_eq!(count_files(&root.join("prompts")), 2);
    assert!(root.join("alpha_listing.json").exists());

    let combined = fs::read_to_string(summary.combined_advice.unwrap()).unwrap();
    assert!(combined.contains("## BNB Chain"));
    assert!(combined.contains("## Solana"));

    // Both platforms recommended NEWSOL
    let stats = fs::read_to_string(summary.frequency_stats.unwrap()).unwrap();
    assert!(stats.contains("| New Sol (NEWSOL) | 2 |  |"));

    // Listing summary plus one message per platform
    let hooks = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/hook")
        .count();
    assert_eq!(hooks, 3);

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn qa_tc_debug_runs_reuse_cached_listing() {
    let server = MockServer::start().await;
    let dir = test_dir("debug");
    mount_listing(&server, 1).await;
    mount_hook(&server).await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let options = RunOptions {
        debug_only: true,
        skip_tokens_update: true,
        ..RunOptions::default()
    };

    for _ in 0..2 {
        let config = config(&server, &dir);
        let components = Components::from_config(&config, &options).unwrap();
        let summary = Pipeline::new(config, components).unwrap().run(&options).await.unwrap();

        // No listing index: nothing removed as listed
        assert_eq!(summary.removed_listed, 0);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.succeeded, vec!["BNB Chain", "Solana"]);
    }

    assert!(!Path::new(&dir).join("symbols").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn qa_tc_listing_failure_is_fatal() {
    let server = MockServer::start().await;
    let dir = test_dir("fatal");
    Mock::given(method("GET"))
        .and(path("/listing"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = config(&server, &dir);
    let options = RunOptions {
        skip_tokens_update: true,
        ..RunOptions::default()
    };
    let components = Components::from_config(&config, &options).unwrap();
    let err = Pipeline::new(config, components)
        .unwrap()
        .run(&options)
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("Binance Alpha listing"));

    let _ = fs::remove_dir_all(&dir);
}
