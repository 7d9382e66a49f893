use crate::scorer::{AnomalyReport, Verdict};
use murmur_scanner::record::PageRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// Aggregate run statistics, serialized with the field names the result
/// viewer expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub total_urls: usize,
    pub categories_count: usize,
    /// Percentage of visited pages that produced processable content.
    pub success_rate: f64,
    pub status_counts: BTreeMap<String, usize>,
    pub domain_counts: BTreeMap<String, usize>,
    /// Seconds of wall time per processed page.
    pub avg_crawl_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<AnomalyTally>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalyTally {
    pub confirmed_count: usize,
    pub suspect_count: usize,
    pub normal_count: usize,
    pub failed_count: usize,
}

impl AnomalyTally {
    pub fn tally<'a>(reports: impl Iterator<Item = &'a AnomalyReport>) -> Self {
        let mut tally = Self::default();
        for report in reports {
            match report.verdict {
                Verdict::Confirmed => tally.confirmed_count += 1,
                Verdict::Suspected => tally.suspect_count += 1,
                Verdict::Normal => tally.normal_count += 1,
                Verdict::CannotAnalyze | Verdict::Failed => tally.failed_count += 1,
            }
        }
        tally
    }
}

pub fn calculate_statistics(
    records: &HashMap<String, PageRecord>,
    processed_count: usize,
    categories_count: usize,
    duration_secs: f64,
) -> RunStatistics {
    let total = records.len();

    let mut status_counts = BTreeMap::new();
    let mut domain_counts = BTreeMap::new();
    for (url, record) in records {
        *status_counts
            .entry(record.status_code.to_string())
            .or_insert(0) += 1;
        let domain = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| "unknown".to_string());
        *domain_counts.entry(domain).or_insert(0) += 1;
    }

    RunStatistics {
        total_urls: total,
        categories_count,
        success_rate: round2(processed_count as f64 / total.max(1) as f64 * 100.0),
        status_counts,
        domain_counts,
        avg_crawl_time: round2(duration_secs / processed_count.max(1) as f64),
        anomaly: None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, status: u16) -> (String, PageRecord) {
        let mut r = PageRecord::new(url.to_string());
        r.status_code = status;
        (url.to_string(), r)
    }

    #[test]
    fn counts_statuses_and_domains() {
        let records: HashMap<_, _> = [
            record("http://a.com/1", 200),
            record("http://a.com/2", 200),
            record("http://b.com/", 404),
        ]
        .into_iter()
        .collect();

        let stats = calculate_statistics(&records, 2, 1, 10.0);
        assert_eq!(stats.total_urls, 3);
        assert_eq!(stats.status_counts["200"], 2);
        assert_eq!(stats.status_counts["404"], 1);
        assert_eq!(stats.domain_counts["a.com"], 2);
        assert_eq!(stats.domain_counts["b.com"], 1);
        assert_eq!(stats.success_rate, 66.67);
        assert_eq!(stats.avg_crawl_time, 5.0);
    }

    #[test]
    fn empty_run_does_not_divide_by_zero() {
        let stats = calculate_statistics(&HashMap::new(), 0, 0, 1.0);
        assert_eq!(stats.total_urls, 0);
        assert_eq!(stats.success_rate, 0.0);
    }
}
