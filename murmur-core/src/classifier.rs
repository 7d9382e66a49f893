use crate::lexicon::{Capability, Lexicon};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

const MAX_FEATURES: usize = 1000;
const MAX_ITERATIONS: usize = 100;
/// Fixed seed keeps cluster assignments reproducible across runs.
const KMEANS_SEED: u64 = 42;

pub type ClusterAssignment = BTreeMap<usize, Vec<usize>>;

/// Buckets `texts` into at most `n_clusters` topic clusters.
///
/// Too few texts yield the degenerate single-cluster partition. With a
/// degraded lexicon the result is a deterministic contiguous split, a
/// documented placeholder rather than a real clustering. Every input index
/// lands in exactly one bucket either way.
pub fn classify(texts: &[String], n_clusters: usize, lexicon: &Lexicon) -> ClusterAssignment {
    let n = texts.len();
    if n == 0 || n < n_clusters {
        let mut fallback = ClusterAssignment::new();
        fallback.insert(0, (0..n).collect());
        return fallback;
    }

    let k = n_clusters.min(n).max(1);

    if lexicon.capability() == Capability::Degraded {
        warn!("Degraded lexicon: using contiguous partition instead of clustering");
        return contiguous_partition(n, k);
    }

    let preprocessed: Vec<String> = texts.iter().map(|t| lexicon.preprocess(t)).collect();
    let vectors = tfidf_vectors(&preprocessed);
    info!(
        "Clustering {} documents into {} clusters ({} features)",
        n,
        k,
        vectors.first().map(|v| v.len()).unwrap_or(0)
    );

    let labels = kmeans(&vectors, k);

    let mut clusters = ClusterAssignment::new();
    for (index, label) in labels.into_iter().enumerate() {
        clusters.entry(label).or_default().push(index);
    }
    clusters
}

/// Near-equal contiguous index groups; the first `n % k` groups take the
/// extra element.
fn contiguous_partition(n: usize, k: usize) -> ClusterAssignment {
    let mut clusters = ClusterAssignment::new();
    let per_cluster = n / k;
    let remainder = n % k;

    let mut start = 0;
    for cluster_id in 0..k {
        let count = per_cluster + usize::from(cluster_id < remainder);
        clusters.insert(cluster_id, (start..start + count).collect());
        start += count;
    }
    clusters
}

/// TF-IDF with a vocabulary capped at the most frequent `MAX_FEATURES`
/// terms, smoothed idf, l2-normalized rows.
fn tfidf_vectors(documents: &[String]) -> Vec<Vec<f64>> {
    let n = documents.len();

    let mut term_totals: HashMap<&str, usize> = HashMap::new();
    let mut doc_frequencies: HashMap<&str, usize> = HashMap::new();
    let doc_tokens: Vec<Vec<&str>> = documents
        .iter()
        .map(|doc| doc.split_whitespace().collect())
        .collect();

    for tokens in &doc_tokens {
        let mut seen: HashSet<&str> = HashSet::new();
        for &token in tokens {
            *term_totals.entry(token).or_insert(0) += 1;
            if seen.insert(token) {
                *doc_frequencies.entry(token).or_insert(0) += 1;
            }
        }
    }

    let mut vocabulary: Vec<(&str, usize)> = term_totals.into_iter().collect();
    vocabulary.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    vocabulary.truncate(MAX_FEATURES);
    let term_index: HashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, (term, _))| (*term, i))
        .collect();

    let idf: Vec<f64> = vocabulary
        .iter()
        .map(|(term, _)| {
            let df = doc_frequencies.get(term).copied().unwrap_or(0);
            (((1 + n) as f64) / ((1 + df) as f64)).ln() + 1.0
        })
        .collect();

    let mut vectors = Vec::with_capacity(n);
    for tokens in &doc_tokens {
        let mut vector = vec![0.0; term_index.len()];
        for token in tokens {
            if let Some(&i) = term_index.get(token) {
                vector[i] += 1.0;
            }
        }
        for (value, idf) in vector.iter_mut().zip(&idf) {
            *value *= idf;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in vector.iter_mut() {
                *value /= norm;
            }
        }
        vectors.push(vector);
    }
    vectors
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Lloyd's algorithm with k-means++ seeding and a fixed RNG seed.
fn kmeans(vectors: &[Vec<f64>], k: usize) -> Vec<usize> {
    let n = vectors.len();
    let dim = vectors.first().map(|v| v.len()).unwrap_or(0);
    if dim == 0 {
        // All-empty documents vectorize to nothing; one bucket is all we
        // can say about them.
        return vec![0; n];
    }

    let mut rng = ChaCha8Rng::seed_from_u64(KMEANS_SEED);
    let mut centroids = kmeans_plus_plus_init(vectors, k, &mut rng);
    let mut assignments = vec![0usize; n];

    for iteration in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, vector) in vectors.iter().enumerate() {
            let mut best = 0;
            let mut best_distance = f64::MAX;
            for (j, centroid) in centroids.iter().enumerate() {
                let distance = squared_distance(vector, centroid);
                if distance < best_distance {
                    best_distance = distance;
                    best = j;
                }
            }
            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }

        if !changed && iteration > 0 {
            debug!("k-means converged after {} iterations", iteration);
            break;
        }

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (vector, &cluster) in vectors.iter().zip(&assignments) {
            counts[cluster] += 1;
            for (sum, value) in sums[cluster].iter_mut().zip(vector) {
                *sum += value;
            }
        }
        for (centroid, (sum, count)) in centroids.iter_mut().zip(sums.iter().zip(&counts)) {
            if *count > 0 {
                for (c, s) in centroid.iter_mut().zip(sum) {
                    *c = s / *count as f64;
                }
            }
        }
    }

    assignments
}

fn kmeans_plus_plus_init(
    vectors: &[Vec<f64>],
    k: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(vectors[rng.gen_range(0..vectors.len())].clone());

    while centroids.len() < k {
        let distances: Vec<f64> = vectors
            .iter()
            .map(|v| {
                centroids
                    .iter()
                    .map(|c| squared_distance(v, c))
                    .fold(f64::MAX, f64::min)
            })
            .collect();

        let total: f64 = distances.iter().sum();
        if total <= f64::EPSILON {
            // Remaining points coincide with existing centroids.
            centroids.push(vectors[rng.gen_range(0..vectors.len())].clone());
            continue;
        }
        let weighted = WeightedIndex::new(&distances)
            .unwrap_or_else(|_| WeightedIndex::new(vec![1.0; vectors.len()]).unwrap());
        centroids.push(vectors[weighted.sample(rng)].clone());
    }
    centroids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_partition_spreads_remainder() {
        let clusters = contiguous_partition(7, 3);
        assert_eq!(clusters[&0], vec![0, 1, 2]);
        assert_eq!(clusters[&1], vec![3, 4]);
        assert_eq!(clusters[&2], vec![5, 6]);
    }
}
