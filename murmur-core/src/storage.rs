use crate::config::OutputFormat;
use crate::error::Result;
use crate::scorer::AnomalyReport;
use chrono::Local;
use murmur_scanner::extractor::MediaMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

/// Filesystem limits: paths longer than this are truncated and suffixed
/// with a digest.
const MAX_PATH_CHARS: usize = 50;
const TRUNCATED_PREFIX_CHARS: usize = 30;

/// Sidecar metadata written next to each content file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub url: String,
    pub depth: usize,
    pub crawl_time: String,
    pub keywords: Vec<String>,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded_media: Option<MediaMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<AnomalyReport>,
}

/// Lays crawl output on disk: one timestamped directory per run, one
/// subdirectory per domain, one content file plus `.meta.json` per page.
pub struct StorageManager {
    run_dir: PathBuf,
}

impl StorageManager {
    pub fn new(base_dir: &Path) -> Result<Self> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let run_dir = base_dir.join(format!("run_{}", timestamp));
        fs::create_dir_all(&run_dir)?;
        info!("Created run directory: {}", run_dir.display());
        Ok(Self { run_dir })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    fn domain_dir(&self, url: &str) -> Result<PathBuf> {
        let domain = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| "unknown".to_string());
        let dir = self.run_dir.join(domain);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Writes a content file and its metadata sidecar. Empty content is
    /// skipped. Returns the content file path.
    pub fn save_content(
        &self,
        url: &str,
        content: &str,
        format: OutputFormat,
        metadata: &PageMetadata,
    ) -> Result<Option<PathBuf>> {
        if content.is_empty() {
            warn!("Empty content, not saving: {}", url);
            return Ok(None);
        }

        let dir = self.domain_dir(url)?;
        let stem = filename_stem(url);
        let file_path = dir.join(format!("{}.{}", stem, format.extension()));
        fs::write(&file_path, content)?;

        let meta_path = dir.join(format!("{}.meta.json", stem));
        fs::write(&meta_path, serde_json::to_string_pretty(metadata)?)?;

        info!("Saved {} -> {}", url, file_path.display());
        Ok(Some(file_path))
    }
}

/// Derives a safe filename stem from the URL path. The site root becomes
/// `index`; long paths keep a 30-char prefix plus a 10-hex digest so the
/// name stays unique under filesystem limits.
fn filename_stem(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().trim_matches('/').to_string())
        .unwrap_or_default();

    let path = if path.is_empty() {
        "index".to_string()
    } else {
        path
    };

    let path = if path.chars().count() > MAX_PATH_CHARS {
        let digest = Sha256::digest(path.as_bytes());
        let hex = format!("{:x}", digest);
        let prefix: String = path.chars().take(TRUNCATED_PREFIX_CHARS).collect();
        format!("{}_{}", prefix, &hex[..10])
    } else {
        path
    };

    path.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_url_maps_to_index() {
        assert_eq!(filename_stem("http://example.com/"), "index");
        assert_eq!(filename_stem("http://example.com"), "index");
    }

    #[test]
    fn slashes_are_replaced() {
        assert_eq!(filename_stem("http://example.com/a/b/c"), "a_b_c");
    }

    #[test]
    fn long_paths_are_truncated_with_digest() {
        let long = format!("http://example.com/{}", "x".repeat(80));
        let stem = filename_stem(&long);
        assert!(stem.chars().count() <= TRUNCATED_PREFIX_CHARS + 11);
        assert!(stem.starts_with(&"x".repeat(30)));
    }

    #[test]
    fn query_characters_are_sanitized() {
        let stem = filename_stem("http://example.com/a:b*c");
        assert!(!stem.contains(':'));
        assert!(!stem.contains('*'));
    }
}
