use crate::classifier::{self, ClusterAssignment};
use crate::config::{JobConfig, OutputFormat};
use crate::lexicon::Lexicon;
use crate::normalizer;
use crate::scorer::{AnomalyReport, Scorer};
use crate::stats::{self, AnomalyTally, RunStatistics};
use crate::storage::{PageMetadata, StorageManager};
use chrono::Utc;
use murmur_scanner::extractor::{extract_embedded_media, MediaMap};
use murmur_scanner::record::{is_sentinel, PageRecord, PDF_SENTINEL};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

const KEYWORDS_PER_PAGE: usize = 10;
const MAX_CLUSTERS: usize = 5;

/// One fully processed page as it appears in the result artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedPage {
    pub url: String,
    pub title: String,
    pub content: String,
    pub keywords: Vec<String>,
    pub file_path: Option<String>,
    pub depth: usize,
    pub format: OutputFormat,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded_media: Option<MediaMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<AnomalyReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub urls: Vec<String>,
    pub depth: usize,
    pub format: OutputFormat,
    pub concurrency: usize,
    pub anomaly_scoring_enabled: bool,
    pub run_directory: String,
    pub finished_at: String,
    pub duration_secs: f64,
}

/// The complete result artifact for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub task: TaskInfo,
    pub content: Vec<ProcessedPage>,
    /// Cluster id -> indices into `content`.
    pub categories: ClusterAssignment,
    pub statistics: RunStatistics,
}

impl RunReport {
    pub fn save(&self, path: &std::path::Path) -> crate::error::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Normalizes, persists, clusters and optionally scores every crawled
/// page. A bad page is logged and skipped or degraded, never allowed to
/// fail a sibling.
pub fn process_results(
    records: &HashMap<String, PageRecord>,
    config: &JobConfig,
    lexicon: &Lexicon,
    storage: &StorageManager,
    duration_secs: f64,
) -> RunReport {
    let scorer = config.enable_anomaly_scoring.then(Scorer::new);
    let mut content: Vec<ProcessedPage> = Vec::new();

    // Stable iteration keeps cluster indices and file layout reproducible.
    let mut urls: Vec<&String> = records.keys().collect();
    urls.sort();

    for url in urls {
        let record = &records[url];
        let raw = match &record.content {
            Some(raw) if !raw.is_empty() => raw.clone(),
            // Failed fetches have no content to process.
            _ => continue,
        };

        let clean_content = if is_sentinel(&raw) {
            // The extractor already produced a descriptive body.
            record.body_text.clone().unwrap_or_default()
        } else {
            let cleaned = normalizer::clean_markup(&raw, Some(url));
            match config.format {
                OutputFormat::Txt => normalizer::extract_text(&cleaned),
                OutputFormat::Html => cleaned,
            }
        };

        let keywords = record
            .body_text
            .as_deref()
            .map(|body| lexicon.extract_keywords(body, KEYWORDS_PER_PAGE))
            .unwrap_or_default();

        let media = if is_sentinel(&raw) {
            None
        } else {
            let media = extract_embedded_media(&raw, Some(url));
            (!media.is_empty()).then_some(media)
        };

        let anomaly = scorer.as_ref().and_then(|scorer| {
            if clean_content.is_empty() {
                None
            } else {
                Some(scorer.analyze_content(&clean_content, url))
            }
        });

        let metadata = PageMetadata {
            title: record.title.clone().unwrap_or_else(|| "untitled".to_string()),
            url: url.clone(),
            depth: record.depth,
            crawl_time: Utc::now().to_rfc3339(),
            keywords: keywords.clone(),
            content_type: if raw.starts_with(PDF_SENTINEL) {
                "pdf".to_string()
            } else {
                "html".to_string()
            },
            embedded_media: media.clone(),
            anomaly: anomaly.clone(),
        };

        let file_path = match storage.save_content(url, &clean_content, config.format, &metadata) {
            Ok(path) => path.map(|p| p.display().to_string()),
            Err(e) => {
                warn!("Failed to persist {}: {}", url, e);
                None
            }
        };

        content.push(ProcessedPage {
            url: url.clone(),
            title: metadata.title,
            content: clean_content,
            keywords,
            file_path,
            depth: record.depth,
            format: config.format,
            status: record.status_code,
            embedded_media: media,
            anomaly,
        });
    }

    info!("Processed {} of {} crawled pages", content.len(), records.len());

    let categories = if content.is_empty() {
        ClusterAssignment::new()
    } else {
        let texts: Vec<String> = content.iter().map(|p| p.content.clone()).collect();
        let cluster_count = MAX_CLUSTERS.min((content.len() / 3).max(2));
        classifier::classify(&texts, cluster_count, lexicon)
    };

    let mut statistics = stats::calculate_statistics(
        records,
        content.len(),
        categories.len(),
        duration_secs,
    );
    if config.enable_anomaly_scoring {
        statistics.anomaly = Some(AnomalyTally::tally(
            content.iter().filter_map(|p| p.anomaly.as_ref()),
        ));
    }

    RunReport {
        task: TaskInfo {
            urls: config.urls.clone(),
            depth: config.depth,
            format: config.format,
            concurrency: config.concurrency,
            anomaly_scoring_enabled: config.enable_anomaly_scoring,
            run_directory: storage.run_dir().display().to_string(),
            finished_at: Utc::now().to_rfc3339(),
            duration_secs,
        },
        content,
        categories,
        statistics,
    }
}
