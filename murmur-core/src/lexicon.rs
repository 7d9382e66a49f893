use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Whether full language resources (stop words + stemmer) are in play.
///
/// Resolved once at startup so both code paths are statically reachable:
/// the degraded path is required behavior for resource-constrained
/// environments, not an optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Full,
    Degraded,
}

pub struct Lexicon {
    capability: Capability,
    stemmer: Option<Stemmer>,
}

impl Lexicon {
    /// Resolves the capability for this process. `MURMUR_DEGRADED_LEXICON`
    /// forces the naive tokenizer path.
    pub fn detect() -> Self {
        if std::env::var_os("MURMUR_DEGRADED_LEXICON").is_some() {
            warn!("Degraded lexicon forced, keyword quality will be reduced");
            Self::degraded()
        } else {
            info!("Full lexicon available (stop words + stemmer)");
            Self::full()
        }
    }

    pub fn full() -> Self {
        Self {
            capability: Capability::Full,
            stemmer: Some(Stemmer::create(Algorithm::English)),
        }
    }

    pub fn degraded() -> Self {
        Self {
            capability: Capability::Degraded,
            stemmer: None,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Lowercases, strips URLs, residual tags and punctuation, and
    /// collapses whitespace.
    pub fn clean_text(text: &str) -> String {
        let lower = text.to_lowercase();
        let without_tags = strip_tags(&lower);

        let mut words = Vec::new();
        for token in without_tags.split_whitespace() {
            if token.starts_with("http://")
                || token.starts_with("https://")
                || token.starts_with("www.")
            {
                continue;
            }
            let cleaned: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect();
            if !cleaned.is_empty() {
                words.push(cleaned);
            }
        }
        words.join(" ")
    }

    /// Cleans and tokenizes text for clustering: stop words and tokens of
    /// two characters or fewer are dropped, survivors are stemmed. The
    /// degraded path keeps the length filter only.
    pub fn preprocess(&self, text: &str) -> String {
        let cleaned = Self::clean_text(text);
        let tokens = cleaned
            .split_whitespace()
            .filter(|t| t.len() > 2)
            .filter(|t| self.capability == Capability::Degraded || !stop_words().contains(*t));

        match &self.stemmer {
            Some(stemmer) => tokens
                .map(|t| stemmer.stem(t).into_owned())
                .collect::<Vec<_>>()
                .join(" "),
            None => tokens.collect::<Vec<_>>().join(" "),
        }
    }

    /// Top `top_n` preprocessed tokens by frequency, descending. Ties
    /// break lexicographically so repeated runs agree.
    pub fn extract_keywords(&self, text: &str, top_n: usize) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let preprocessed = self.preprocess(text);
        let mut frequencies: HashMap<&str, usize> = HashMap::new();
        for token in preprocessed.split_whitespace() {
            *frequencies.entry(token).or_insert(0) += 1;
        }

        let mut ranked: Vec<(&str, usize)> = frequencies.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(top_n)
            .map(|(token, _)| token.to_string())
            .collect()
    }
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn stop_words() -> &'static HashSet<&'static str> {
    static STOP_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOP_WORDS.get_or_init(|| {
        [
            "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her",
            "was", "one", "our", "out", "day", "get", "has", "him", "his", "how", "man", "new",
            "now", "old", "see", "two", "way", "who", "its", "did", "yes", "this", "that", "with",
            "have", "from", "they", "will", "would", "there", "their", "what", "about", "which",
            "when", "make", "like", "time", "just", "know", "take", "into", "year", "your", "some",
            "could", "them", "than", "then", "look", "only", "come", "over", "think", "also",
            "back", "after", "use", "work", "first", "well", "even", "want", "because", "these",
            "give", "most", "being", "been", "were", "much", "where", "while", "such", "here",
            "more", "very", "should", "those", "other", "does", "said", "each", "many", "must",
            "before", "under", "same", "between", "both", "during", "through", "still", "own",
            "too", "may", "off", "she", "itself", "himself", "herself", "themselves",
        ]
        .into_iter()
        .collect()
    })
}
