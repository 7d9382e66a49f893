use crate::record::{PDF_SENTINEL, UNSUPPORTED_SENTINEL};
use rand::Rng;
use reqwest::Client;
use std::ops::Range;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
];

/// HTTP fetcher with politeness jitter and bounded retries.
///
/// Retry policy: 403/429 and transient network faults consume one retry
/// each; any other non-200 status fails the URL permanently. The retry
/// schedule is an explicit loop so attempt counts are testable.
pub struct Fetcher {
    client: Client,
    max_retries: usize,
    /// Jitter before every attempt, seconds.
    request_delay: Range<f64>,
    /// Longer backoff after a 403/429 soft block, seconds.
    block_delay: Range<f64>,
    /// Short backoff after a connection error, seconds.
    connect_delay: Range<f64>,
}

impl Fetcher {
    pub fn new() -> Self {
        Self::with_timeout(30)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(10)
            .redirect(reqwest::redirect::Policy::limited(5))
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            max_retries: 3,
            request_delay: 1.0..3.0,
            block_delay: 3.0..10.0,
            connect_delay: 2.0..5.0,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_request_delay(mut self, delay: Range<f64>) -> Self {
        self.request_delay = delay;
        self
    }

    /// Disables all sleeps. Intended for tests against a local stub server.
    pub fn without_delays(mut self) -> Self {
        self.request_delay = 0.0..0.0;
        self.block_delay = 0.0..0.0;
        self.connect_delay = 0.0..0.0;
        self
    }

    fn random_user_agent() -> &'static str {
        USER_AGENTS[rand::thread_rng().gen_range(0..USER_AGENTS.len())]
    }

    async fn jitter(&self, window: &Range<f64>) {
        if window.end <= window.start {
            if window.start > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(window.start)).await;
            }
            return;
        }
        let secs = rand::thread_rng().gen_range(window.clone());
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }

    /// Fetches a URL, returning the body (or a sentinel marker for content
    /// that is not rendered) and the final HTTP status. Permanent failures
    /// return `(None, status)`; exhausted retries return `(None, 0)`.
    pub async fn fetch(&self, url: &str) -> (Option<String>, u16) {
        let url = normalize_scheme(url);
        let mut attempt = 0;

        while attempt < self.max_retries {
            self.jitter(&self.request_delay).await;

            let request = self
                .client
                .get(&url)
                .header("User-Agent", Self::random_user_agent())
                .header(
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header("Accept-Language", "en-US,en;q=0.5");

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    match status {
                        200 => return self.read_body(response, &url).await,
                        403 | 429 => {
                            warn!(
                                "Possible anti-scraping block (status {}) for {}, backing off",
                                status, url
                            );
                            self.jitter(&self.block_delay).await;
                            attempt += 1;
                        }
                        _ => {
                            error!("Download failed with status {}: {}", status, url);
                            return (None, status);
                        }
                    }
                }
                Err(e) if e.is_timeout() => {
                    warn!(
                        "Request timed out: {} (attempt {}/{})",
                        url,
                        attempt + 1,
                        self.max_retries
                    );
                    attempt += 1;
                }
                Err(e) if e.is_connect() => {
                    warn!(
                        "Connection error for {}: {} (attempt {}/{})",
                        url,
                        e,
                        attempt + 1,
                        self.max_retries
                    );
                    self.jitter(&self.connect_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!("Request error for {}: {}", url, e);
                    return (None, 0);
                }
            }
        }

        error!("Retry limit of {} reached, giving up on {}", self.max_retries, url);
        (None, 0)
    }

    async fn read_body(&self, response: reqwest::Response, url: &str) -> (Option<String>, u16) {
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.contains("text/html") || content_type.contains("application/xhtml+xml") {
            match response.bytes().await {
                Ok(bytes) => (Some(decode_body(&bytes)), 200),
                Err(e) => {
                    error!("Failed to read body for {}: {}", url, e);
                    (None, 0)
                }
            }
        } else if content_type.contains("application/pdf") {
            info!("PDF detected: {}", url);
            (Some(format!("{}{}", PDF_SENTINEL, url)), 200)
        } else {
            warn!("Unsupported content type for {}: {}", url, content_type);
            (Some(format!("{}{}", UNSUPPORTED_SENTINEL, content_type)), 200)
        }
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes response bytes, sniffing the charset from the content itself
/// so pages declaring gb2312/gbk and friends come out right.
fn decode_body(bytes: &[u8]) -> String {
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, actual, _) = encoding.decode(bytes);
    debug!("Decoded body as {}", actual.name());
    text.into_owned()
}

fn normalize_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}
