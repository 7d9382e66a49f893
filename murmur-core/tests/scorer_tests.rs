// Tests for the propagation-intensity scorer

use murmur_core::scorer::{Scorer, Thresholds, Verdict};

fn scorer() -> Scorer {
    Scorer::new().with_thresholds(Thresholds {
        confirmed_j: 1.8,
        suspect_j: 1.3,
        lag: 2.0,
    })
}

#[test]
fn low_intensity_ratio_is_normal_despite_lag_and_peaks() {
    // Two interior peaks, large lag, but J = 3/(5+eps) ~ 0.6 stays low.
    let theta = [1.0, 3.0, 1.0, 3.0, 1.0];
    let y = [1.0, 1.0, 1.0, 1.0, 5.0];
    let t = [0.0, 1.0, 2.0, 3.0, 4.0];

    let (verdict, details) = scorer().score(&theta, &y, &t, 0.0);
    assert_eq!(verdict, Verdict::Normal);
    assert!((details.j_raw - 0.6).abs() < 1e-3);
    assert_eq!(details.peak_count, 2);
    assert!((details.lag_time - 3.0).abs() < 1e-9);
}

#[test]
fn lag_uses_first_occurrence_argmax() {
    let theta = [1.0, 3.0, 1.0, 3.0, 1.0];
    let y = [5.0, 1.0, 1.0, 1.0, 1.0];
    let t = [0.0, 1.0, 2.0, 3.0, 4.0];

    // theta peaks first at t=1, y at t=0
    let (_, details) = scorer().score(&theta, &y, &t, 0.0);
    assert!((details.lag_time - 1.0).abs() < 1e-9);
}

#[test]
fn high_ratio_with_lag_and_two_peaks_is_confirmed() {
    let theta = [1.0, 3.0, 1.0, 3.0, 1.0];
    let y = [1.0, 0.9, 0.9, 0.9, 0.9];
    let t = [0.0, 3.0, 6.0, 9.0, 12.0];

    // J = 3/(1+eps) ~ 3, lag = |0 - 3| = 3, peaks = 2
    let (verdict, _) = scorer().score(&theta, &y, &t, 0.0);
    assert_eq!(verdict, Verdict::Confirmed);
}

#[test]
fn single_peak_downgrades_to_suspected() {
    let theta = [1.0, 3.0, 1.0];
    let y = [1.0, 0.9, 0.9];
    let t = [0.0, 3.0, 6.0];

    let (verdict, details) = scorer().score(&theta, &y, &t, 0.0);
    assert_eq!(details.peak_count, 1);
    assert_eq!(verdict, Verdict::Suspected);
}

#[test]
fn insufficient_lag_is_normal_even_with_high_ratio() {
    let theta = [1.0, 3.0, 1.0, 3.0, 1.0];
    let y = [0.9, 1.0, 0.9, 0.9, 0.9];
    let t = [0.0, 1.0, 2.0, 3.0, 4.0];

    // lag = |1 - 1| = 0
    let (verdict, _) = scorer().score(&theta, &y, &t, 0.0);
    assert_eq!(verdict, Verdict::Normal);
}

#[test]
fn seo_factor_amplifies_the_ratio() {
    let theta = [1.0, 1.2, 1.0];
    let y = [1.0, 0.9, 0.9];
    let t = [0.0, 3.0, 6.0];

    // J = 1.2; below suspect threshold unadjusted
    let (verdict, _) = scorer().score(&theta, &y, &t, 0.0);
    assert_eq!(verdict, Verdict::Normal);

    // alpha=0.5, seo=2 -> J_seo = 1.2 * 2 = 2.4; one peak keeps it out
    // of confirmed territory
    let (boosted, details) = scorer().score(&theta, &y, &t, 2.0);
    assert!((details.j_seo - 2.4).abs() < 1e-3);
    assert_eq!(boosted, Verdict::Suspected);
}

#[test]
fn score_is_deterministic() {
    let theta = [1.0, 3.0, 1.0, 3.0, 1.0];
    let y = [1.0, 1.0, 1.0, 1.0, 5.0];
    let t = [0.0, 1.0, 2.0, 3.0, 4.0];

    let s = scorer();
    let (v1, d1) = s.score(&theta, &y, &t, 0.7);
    let (v2, d2) = s.score(&theta, &y, &t, 0.7);
    assert_eq!(v1, v2);
    assert_eq!(d1, d2);
}

#[test]
fn mismatched_series_fail_cleanly() {
    let (verdict, _) = scorer().score(&[1.0, 2.0], &[1.0], &[0.0, 1.0], 0.0);
    assert_eq!(verdict, Verdict::Failed);
}

#[test]
fn empty_content_cannot_be_analyzed() {
    let report = Scorer::new().analyze_content("", "http://example.com");
    assert_eq!(report.verdict, Verdict::CannotAnalyze);
    assert!(report.reason.is_some());
    assert!(report.details.is_none());
}

#[test]
fn sensational_phrases_raise_the_keyword_score() {
    let scorer = Scorer::new();
    let bland = scorer.analyze_content("a perfectly ordinary gardening article", "http://a");
    assert_eq!(bland.keyword_count, 0);
    assert_eq!(bland.keyword_score, 0.0);

    let lurid = scorer.analyze_content(
        "SHOCKING secret exposed: the truth about the conspiracy they don't want you to know",
        "http://b",
    );
    assert!(lurid.keyword_count >= 5);
    assert_eq!(lurid.keyword_score, 1.0);
}

#[test]
fn analysis_is_reproducible_for_identical_content() {
    let scorer = Scorer::new();
    let a = scorer.analyze_content("same article body text", "http://a");
    let b = scorer.analyze_content("same article body text", "http://a");
    assert_eq!(a.verdict, b.verdict);
    assert_eq!(a.details, b.details);
}

#[test]
fn analysis_produces_all_detail_fields() {
    let report = Scorer::new().analyze_content(&"word ".repeat(500), "http://example.com");
    let details = report.details.expect("details present");
    assert!(details.theta_max > 0.0);
    assert!(details.y_max > 0.0);
    assert!(details.j_raw > 0.0);
    assert!(details.seo_factor > 0.0);
    assert_eq!(report.content_length, 2500);
}
