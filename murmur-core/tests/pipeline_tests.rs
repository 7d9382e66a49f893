// End-to-end pipeline tests over fabricated crawl records

use murmur_core::config::{JobConfig, OutputFormat};
use murmur_core::lexicon::Lexicon;
use murmur_core::pipeline::process_results;
use murmur_core::storage::StorageManager;
use murmur_scanner::record::PageRecord;
use std::collections::HashMap;

fn html_record(url: &str, title: &str, body: &str, html: &str) -> (String, PageRecord) {
    let mut record = PageRecord::new(url.to_string());
    record.status_code = 200;
    record.title = Some(title.to_string());
    record.body_text = Some(body.to_string());
    record.content = Some(html.to_string());
    (url.to_string(), record)
}

fn config(format: OutputFormat, scoring: bool) -> JobConfig {
    serde_json::from_value(serde_json::json!({
        "urls": ["http://example.com"],
        "depth": 2,
        "format": match format { OutputFormat::Html => "html", OutputFormat::Txt => "txt" },
        "concurrency": 2,
        "enable_anomaly_scoring": scoring,
    }))
    .unwrap()
}

#[test]
fn pdf_sentinel_resolves_to_description_with_url() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageManager::new(dir.path()).unwrap();
    let lexicon = Lexicon::full();

    let url = "http://x/y.pdf";
    let mut record = PageRecord::new(url.to_string());
    record.status_code = 200;
    record.title = Some(format!("PDF file: {}", url));
    record.body_text = Some(format!(
        "This is a PDF file and cannot be rendered directly. Download link: {}",
        url
    ));
    record.content = Some(format!("PDF_CONTENT_{}", url));

    let records: HashMap<_, _> = [(url.to_string(), record)].into_iter().collect();
    let report = process_results(&records, &config(OutputFormat::Txt, false), &lexicon, &storage, 1.0);

    assert_eq!(report.content.len(), 1);
    let page = &report.content[0];
    assert!(page.content.contains("http://x/y.pdf"));
    assert!(!page.content.contains('<'));
}

#[test]
fn failed_pages_are_counted_but_not_processed() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageManager::new(dir.path()).unwrap();
    let lexicon = Lexicon::full();

    let mut failed = PageRecord::new("http://example.com/broken".to_string());
    failed.status_code = 500;

    let records: HashMap<_, _> = [
        ("http://example.com/broken".to_string(), failed),
        html_record(
            "http://example.com/ok",
            "OK",
            "some body text here",
            "<html><body><p>some body text here</p></body></html>",
        ),
    ]
    .into_iter()
    .collect();

    let report = process_results(&records, &config(OutputFormat::Html, false), &lexicon, &storage, 2.0);
    assert_eq!(report.statistics.total_urls, 2);
    assert_eq!(report.content.len(), 1);
    assert_eq!(report.statistics.success_rate, 50.0);
    assert_eq!(report.statistics.status_counts["500"], 1);
}

#[test]
fn categories_partition_the_processed_pages() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageManager::new(dir.path()).unwrap();
    let lexicon = Lexicon::full();

    let records: HashMap<_, _> = (0..6)
        .map(|i| {
            html_record(
                &format!("http://example.com/page{}", i),
                &format!("Page {}", i),
                "repeated body words for clustering tests",
                "<html><body><p>repeated body words for clustering tests</p></body></html>",
            )
        })
        .collect();

    let report = process_results(&records, &config(OutputFormat::Txt, false), &lexicon, &storage, 3.0);
    let assigned: usize = report.categories.values().map(|v| v.len()).sum();
    assert_eq!(assigned, report.content.len());
    assert_eq!(report.statistics.categories_count, report.categories.len());
}

#[test]
fn anomaly_scoring_adds_verdicts_and_tally() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageManager::new(dir.path()).unwrap();
    let lexicon = Lexicon::full();

    let records: HashMap<_, _> = [html_record(
        "http://example.com/story",
        "Story",
        "shocking secret exposed",
        "<html><body><p>shocking secret exposed</p></body></html>",
    )]
    .into_iter()
    .collect();

    let report = process_results(&records, &config(OutputFormat::Txt, true), &lexicon, &storage, 1.0);
    assert!(report.content[0].anomaly.is_some());
    let tally = report.statistics.anomaly.as_ref().expect("tally present");
    let total = tally.confirmed_count + tally.suspect_count + tally.normal_count + tally.failed_count;
    assert_eq!(total, 1);
}

#[test]
fn content_files_and_metadata_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageManager::new(dir.path()).unwrap();
    let lexicon = Lexicon::full();

    let records: HashMap<_, _> = [html_record(
        "http://example.com/article",
        "An Article",
        "body words",
        "<html><body><p>body words</p></body></html>",
    )]
    .into_iter()
    .collect();

    let report = process_results(&records, &config(OutputFormat::Html, false), &lexicon, &storage, 1.0);
    let file_path = report.content[0].file_path.as_ref().expect("file saved");
    assert!(std::path::Path::new(file_path).exists());
    let meta_path = file_path.replace(".html", ".meta.json");
    assert!(std::path::Path::new(&meta_path).exists());

    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&meta_path).unwrap()).unwrap();
    assert_eq!(meta["title"], "An Article");
    assert_eq!(meta["url"], "http://example.com/article");
}

#[test]
fn report_serializes_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageManager::new(dir.path()).unwrap();
    let lexicon = Lexicon::full();

    let records: HashMap<_, _> = [html_record(
        "http://example.com/",
        "Home",
        "welcome text",
        "<html><body><p>welcome text</p></body></html>",
    )]
    .into_iter()
    .collect();

    let report = process_results(&records, &config(OutputFormat::Html, false), &lexicon, &storage, 1.0);
    let out = dir.path().join("crawler_results.json");
    report.save(&out).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed["statistics"]["totalUrls"], 1);
    assert!(parsed["content"].is_array());
}
