//! Run artifacts under `data_dir`
//!
//! ```text
//! <data_dir>/prompts/prompt_<YYYYmmddHHMMSS>_<platform>.txt
//! <data_dir>/advices/advice_<YYYYmmddHHMMSS>_<platform>.md
//! <data_dir>/advices/all-platforms/advice_<YYYYmmdd>.md
//! <data_dir>/advices/all-platforms/alpha_frequency_stats.md
//! <data_dir>/platforms/<platform>_projects_<YYYYmmdd>.json
//! <data_dir>/filtered_crypto_list_<YYYYmmdd>.json
//! ```
//!
//! Every file is written to a dot-prefixed temp name and renamed into place.

use crate::models::Project;
use crate::platform::Classification;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Recommendation frequency table, next to the combined advice files
pub const FREQUENCY_STATS_FILE: &str = "alpha_frequency_stats.md";

/// "BNB Chain" -> "bnb_chain"
pub fn platform_slug(platform: &str) -> String {
    if platform.is_empty() {
        "general".to_string()
    } else {
        platform.to_lowercase().replace(' ', "_")
    }
}

#[derive(Debug, Serialize)]
struct PlatformFile<'a> {
    platform: &'a str,
    date: String,
    count: usize,
    projects: &'a [&'a Project],
}

pub struct RunArchive {
    root: PathBuf,
}

impl RunArchive {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "archive path has no parent"))?;
        fs::create_dir_all(dir)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = dir.join(format!(".tmp-{}", name));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "Archived");
        Ok(())
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Self::write_atomic(path, &bytes)
    }

    pub fn write_prompt(&self, platform: &str, prompt: &str, now: NaiveDateTime) -> io::Result<PathBuf> {
        let path = self.root.join("prompts").join(format!(
            "prompt_{}_{}.txt",
            now.format("%Y%m%d%H%M%S"),
            platform_slug(platform)
        ));
        Self::write_atomic(&path, prompt.as_bytes())?;
        Ok(path)
    }

    pub fn write_advice(&self, platform: &str, advice: &str, now: NaiveDateTime) -> io::Result<PathBuf> {
        let path = self.root.join("advices").join(format!(
            "advice_{}_{}.md",
            now.format("%Y%m%d%H%M%S"),
            platform_slug(platform)
        ));
        Self::write_atomic(&path, advice.as_bytes())?;
        Ok(path)
    }

    fn combined_dir(&self) -> PathBuf {
        self.root.join("advices").join("all-platforms")
    }

    /// Combined advice of all platforms; one file per day, later runs replace it
    pub fn write_combined_advice(&self, content: &str, now: NaiveDateTime) -> io::Result<PathBuf> {
        let path = self
            .combined_dir()
            .join(format!("advice_{}.md", now.format("%Y%m%d")));
        Self::write_atomic(&path, content.as_bytes())?;
        Ok(path)
    }

    /// Every archived combined advice file, oldest first
    pub fn read_combined_advice(&self) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(self.combined_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_advice = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("advice_") && n.ends_with(".md"));
            if is_advice {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(fs::read_to_string).collect()
    }

    pub fn write_frequency_stats(&self, content: &str) -> io::Result<PathBuf> {
        let path = self.combined_dir().join(FREQUENCY_STATS_FILE);
        Self::write_atomic(&path, content.as_bytes())?;
        Ok(path)
    }

    /// One JSON file per non-empty bucket
    pub fn write_platform_buckets(
        &self,
        classification: &Classification<'_>,
        now: NaiveDateTime,
    ) -> io::Result<Vec<PathBuf>> {
        let date = now.format("%Y%m%d").to_string();
        let dir = self.root.join("platforms");
        let mut paths = Vec::new();

        for bucket in classification.buckets.iter().filter(|b| !b.projects.is_empty()) {
            let path = dir.join(format!("{}_projects_{}.json", platform_slug(&bucket.platform), date));
            Self::write_json(
                &path,
                &PlatformFile {
                    platform: &bucket.platform,
                    date: date.clone(),
                    count: bucket.projects.len(),
                    projects: &bucket.projects,
                },
            )?;
            paths.push(path);
        }

        info!(files = paths.len(), dir = %dir.display(), "Saved platform buckets");
        Ok(paths)
    }

    /// Project list left after the listed and block-list filters
    pub fn write_filtered(&self, projects: &[Project], now: NaiveDateTime) -> io::Result<PathBuf> {
        let path = self
            .root
            .join(format!("filtered_crypto_list_{}.json", now.format("%Y%m%d")));
        Self::write_json(&path, &projects)?;
        Ok(path)
    }
}
