use crate::extractor;
use crate::fetcher::Fetcher;
use crate::record::PageRecord;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, error, info, warn};
use url::Url;

/// Depth-bounded crawl orchestrator.
///
/// One visited set is shared by every worker; insertion is check-and-set
/// under a single lock, so no two workers fetch the same URL. Traversal
/// below a seed is an explicit worklist running inside the task that owns
/// the seed, so fan-out concurrency is bounded by the worker count at the
/// top level only.
#[derive(Clone)]
pub struct Orchestrator {
    fetcher: Arc<Fetcher>,
    visited: Arc<Mutex<HashSet<String>>>,
    cancelled: Arc<AtomicBool>,
    /// At most this many outbound links are considered per page.
    link_cap: usize,
}

impl Orchestrator {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            visited: Arc::new(Mutex::new(HashSet::new())),
            cancelled: Arc::new(AtomicBool::new(false)),
            link_cap: 10,
        }
    }

    pub fn with_link_cap(mut self, cap: usize) -> Self {
        self.link_cap = cap;
        self
    }

    /// Handle for interrupt handlers: flipping it stops new fetches while
    /// in-flight ones finish.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub async fn visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }

    /// Atomically marks a URL visited; returns false when it already was.
    async fn mark_visited(&self, url: &str) -> bool {
        let mut visited = self.visited.lock().await;
        visited.insert(url.to_string())
    }

    /// Crawls one seed to at most `depth` levels. Every visited URL gets a
    /// `PageRecord`, failed fetches included. Duplicate URLs reached via
    /// different branches keep the last write.
    pub async fn crawl(&self, seed: &str, depth: usize) -> HashMap<String, PageRecord> {
        let mut results = HashMap::new();
        if depth == 0 {
            return results;
        }
        if !self.mark_visited(seed).await {
            debug!("Seed already visited, skipping: {}", seed);
            return results;
        }

        // (url, remaining depth budget, distance from seed)
        let mut worklist: VecDeque<(String, usize, usize)> = VecDeque::new();
        worklist.push_back((seed.to_string(), depth, 0));

        while let Some((url, remaining, distance)) = worklist.pop_front() {
            if self.cancelled.load(Ordering::Relaxed) {
                info!("Crawl cancelled, skipping remaining work for {}", seed);
                break;
            }

            let (body, status) = self.fetcher.fetch(&url).await;

            let mut record = PageRecord::new(url.clone());
            record.depth = distance;
            record.status_code = status;

            if let Some(body) = body {
                let extraction = extractor::parse(&body, &url);
                record.title = extraction.title;
                record.body_text = extraction.body_text;
                record.outbound_links = extraction.links.clone();
                record.content = Some(body);

                if remaining > 1 {
                    for link in extraction.links.iter().take(self.link_cap) {
                        if !same_host(&url, link) {
                            debug!("Skipping cross-domain link: {}", link);
                            continue;
                        }
                        if self.mark_visited(link).await {
                            worklist.push_back((link.clone(), remaining - 1, distance + 1));
                        }
                    }
                }
            } else {
                warn!("No content for {} (status {})", url, status);
            }

            results.insert(url, record);
        }

        results
    }

    /// Crawls every not-yet-visited seed on a worker pool of `workers`
    /// permits and merges the per-seed result maps. A failed seed traversal
    /// is logged and does not abort its siblings.
    pub async fn batch_crawl(
        &self,
        seeds: &[String],
        depth: usize,
        workers: usize,
    ) -> HashMap<String, PageRecord> {
        info!(
            "Starting batch crawl of {} seeds at depth {} with {} workers",
            seeds.len(),
            depth,
            workers
        );

        let semaphore = Arc::new(Semaphore::new(workers.max(1)));
        let mut handles = Vec::new();

        for seed in seeds {
            {
                let visited = self.visited.lock().await;
                if visited.contains(seed) {
                    continue;
                }
            }

            let orchestrator = self.clone();
            let semaphore = semaphore.clone();
            let seed = seed.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("crawl semaphore closed");
                orchestrator.crawl(&seed, depth).await
            }));
        }

        let mut results = HashMap::new();
        for outcome in futures::future::join_all(handles).await {
            match outcome {
                Ok(seed_results) => results.extend(seed_results),
                Err(e) => error!("Crawl task failed: {}", e),
            }
        }

        info!("Batch crawl complete, {} pages recorded", results.len());
        results
    }
}

fn same_host(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => match (a.host_str(), b.host_str()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        _ => false,
    }
}
