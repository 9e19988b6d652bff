use crate::result::RecommendationEntry;
use std::collections::HashSet;

/// NaN scores rank below every real score.
fn sort_key(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}

/// Order by final score descending, ties by product id ascending, keep the
/// best entry per product and truncate to `top_n`.
pub fn rank(mut entries: Vec<RecommendationEntry>, top_n: usize) -> Vec<RecommendationEntry> {
    entries.sort_by(|a, b| {
        sort_key(b.final_score)
            .total_cmp(&sort_key(a.final_score))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });

    let mut seen = HashSet::new();
    entries.retain(|entry| seen.insert(entry.product_id.clone()));
    entries.truncate(top_n);
    entries
}
