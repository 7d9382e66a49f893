use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    Txt,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Txt => "txt",
        }
    }
}

/// Execution parameters for one crawl job. Matches the shape the task
/// submission API hands out, so a downloaded config file works unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub urls: Vec<String>,
    #[serde(default = "default_depth")]
    pub depth: usize,
    #[serde(default = "default_format")]
    pub format: OutputFormat,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub enable_anomaly_scoring: bool,
}

fn default_depth() -> usize {
    2
}

fn default_format() -> OutputFormat {
    OutputFormat::Html
}

fn default_concurrency() -> usize {
    3
}

impl JobConfig {
    /// Loads and validates a job config. Missing files, malformed JSON and
    /// an empty URL list are all fatal: no crawling starts on a bad config.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|_| CoreError::ConfigMissing(path.display().to_string()))?;
        let config: JobConfig =
            serde_json::from_str(&raw).map_err(|e| CoreError::ConfigInvalid(e.to_string()))?;
        if config.urls.is_empty() {
            return Err(CoreError::NoUrls);
        }
        info!(
            "Loaded config: {} URLs, depth {}, format {:?}, concurrency {}",
            config.urls.len(),
            config.depth,
            config.format,
            config.concurrency
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: JobConfig =
            serde_json::from_str(r#"{"urls": ["http://example.com"]}"#).unwrap();
        assert_eq!(config.depth, 2);
        assert_eq!(config.format, OutputFormat::Html);
        assert_eq!(config.concurrency, 3);
        assert!(!config.enable_anomaly_scoring);
    }

    #[test]
    fn format_parses_lowercase() {
        let config: JobConfig =
            serde_json::from_str(r#"{"urls": ["u"], "format": "txt"}"#).unwrap();
        assert_eq!(config.format, OutputFormat::Txt);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = JobConfig::load(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(matches!(err, CoreError::ConfigMissing(_)));
    }

    #[test]
    fn empty_url_list_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"urls": []}"#).unwrap();
        let err = JobConfig::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::NoUrls));
    }

    #[test]
    fn malformed_json_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JobConfig::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid(_)));
    }
}
