use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

const EPSILON: f64 = 1e-6;

/// Phrases typical of sensationalist framing; matches feed the SEO factor.
const SENSATIONAL_PHRASES: [&str; 14] = [
    "shocking",
    "secret",
    "exposed",
    "the truth about",
    "they don't want you to know",
    "doctors won't tell you",
    "cover-up",
    "government is hiding",
    "conspiracy",
    "top secret",
    "share this",
    "spread the word",
    "before it's deleted",
    "wake up",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Confirmed,
    Suspected,
    Normal,
    CannotAnalyze,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    pub confirmed_j: f64,
    pub suspect_j: f64,
    pub lag: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            confirmed_j: 1.8,
            suspect_j: 1.3,
            lag: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetails {
    pub theta_max: f64,
    pub y_max: f64,
    pub j_raw: f64,
    pub j_seo: f64,
    pub seo_factor: f64,
    pub peak_count: usize,
    pub lag_time: f64,
}

/// Full per-page analysis output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub verdict: Verdict,
    pub details: Option<ScoreDetails>,
    pub content_length: usize,
    pub keyword_score: f64,
    pub keyword_count: usize,
    pub matched_phrases: Vec<String>,
    pub reason: Option<String>,
    pub url: String,
    pub analysis_time: String,
}

/// Propagation-intensity scorer.
///
/// `score` answers the reusable question: given topical-heat and
/// counter-signal time series, does the propagation pattern look like
/// viral misinformation? The per-page driver synthesizes those series
/// because no real telemetry exists; the generator is a documented
/// placeholder, seeded from the content so runs are reproducible.
pub struct Scorer {
    thresholds: Thresholds,
    alpha_seo: f64,
}

impl Scorer {
    pub fn new() -> Self {
        Self {
            thresholds: Thresholds::default(),
            alpha_seo: 0.5,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Pure scoring over explicit series; deterministic for fixed inputs.
    ///
    /// `J = max(theta) / (max(y) + eps)`, SEO-adjusted by
    /// `1 + alpha_seo * seo_factor`. Confirmed needs a high adjusted J, a
    /// counter-signal lag above threshold and at least two heat peaks.
    pub fn score(
        &self,
        theta: &[f64],
        y: &[f64],
        t: &[f64],
        seo_factor: f64,
    ) -> (Verdict, ScoreDetails) {
        if theta.is_empty() || y.is_empty() || t.len() != theta.len() || t.len() != y.len() {
            return (Verdict::Failed, ScoreDetails::default());
        }

        let theta_max = max_value(theta);
        let y_max = max_value(y);
        let j_raw = theta_max / (y_max + EPSILON);
        let j_seo = j_raw * (1.0 + self.alpha_seo * seo_factor);

        let peak_count = theta
            .windows(3)
            .filter(|w| w[1] > w[0] && w[1] > w[2])
            .count();

        let lag_time = (t[argmax(y)] - t[argmax(theta)]).abs();

        let verdict = if j_seo > self.thresholds.confirmed_j
            && lag_time > self.thresholds.lag
            && peak_count >= 2
        {
            Verdict::Confirmed
        } else if j_seo > self.thresholds.suspect_j && lag_time > self.thresholds.lag {
            Verdict::Suspected
        } else {
            Verdict::Normal
        };

        let details = ScoreDetails {
            theta_max,
            y_max,
            j_raw,
            j_seo,
            seo_factor,
            peak_count,
            lag_time,
        };
        (verdict, details)
    }

    /// Scores one page of content against synthesized propagation series.
    pub fn analyze_content(&self, content: &str, url: &str) -> AnomalyReport {
        let analysis_time = Utc::now().to_rfc3339();
        if content.is_empty() {
            return AnomalyReport {
                verdict: Verdict::CannotAnalyze,
                details: None,
                content_length: 0,
                keyword_score: 0.0,
                keyword_count: 0,
                matched_phrases: Vec::new(),
                reason: Some("content is empty".to_string()),
                url: url.to_string(),
                analysis_time,
            };
        }

        let content_length = content.chars().count();
        let lowered = content.to_lowercase();
        let matched_phrases: Vec<String> = SENSATIONAL_PHRASES
            .iter()
            .filter(|phrase| lowered.contains(*phrase))
            .map(|phrase| phrase.to_string())
            .collect();
        let keyword_count = matched_phrases.len();
        // Five matched phrases saturate the score.
        let keyword_score = (keyword_count as f64 / 5.0).min(1.0);

        let seo_factor = (content_length as f64 / 1000.0).min(5.0) * (1.0 + keyword_score);

        let (theta, y, t) = synthesize_series(content_length);
        let (verdict, details) = self.score(&theta, &y, &t, seo_factor);
        debug!("Analyzed {}: {:?} (J_seo {:.3})", url, verdict, details.j_seo);

        AnomalyReport {
            verdict,
            details: Some(details),
            content_length,
            keyword_score,
            keyword_count,
            matched_phrases,
            reason: None,
            url: url.to_string(),
            analysis_time,
        }
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-shape sinusoids over 100 points in [0, 20], perturbed by Gaussian
/// noise and a content-length offset; the counter signal lags by 1.5.
fn synthesize_series(content_length: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(content_length as u64);
    let noise = Normal::new(0.0, 0.1).expect("valid normal distribution");

    let points = 100;
    let t: Vec<f64> = (0..points)
        .map(|i| 20.0 * i as f64 / (points - 1) as f64)
        .collect();

    let offset = content_length as f64 / 50000.0;
    let theta: Vec<f64> = t
        .iter()
        .map(|&t| 1.0 + 0.5 * (t / 2.0).sin() + 0.3 * t.sin() + noise.sample(&mut rng) + offset)
        .collect();
    let y: Vec<f64> = t
        .iter()
        .map(|&t| {
            0.8 + 0.4 * ((t - 1.5) / 2.0).sin() + 0.2 * (t - 1.5).sin() + noise.sample(&mut rng)
        })
        .collect();

    (theta, y, t)
}

fn max_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::MIN, f64::max)
}

/// Index of the maximum, first occurrence on ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
