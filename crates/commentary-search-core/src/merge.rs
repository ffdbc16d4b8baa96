//! Dense + sparse candidate merge.
//!
//! # Merge Algorithm
//!
//! 1. Concatenate dense hits, then sparse hits.
//! 2. Drop hits whose text is empty after trimming.
//! 3. Deduplicate by text: the first occurrence claims the slot; a later
//!    duplicate replaces it only with a strictly higher score.
//! 4. Stable sort by score, descending. Ties keep first-seen order.
//!
//! This is a deduplication policy, not score fusion. Dense (cosine) and
//! sparse (lexical dot product) scores are not on a shared scale, so the
//! post-merge order is an approximation. The reranker produces the final
//! order; the merge decides which duplicate survives and bounds the
//! candidate volume handed to it. Scores are intentionally not normalized.

use std::collections::HashMap;

use crate::models::RetrievedHit;

/// Merge dense and sparse hits into a deduplicated, score-sorted list.
///
/// The output holds at most `dense.len() + sparse.len()` entries and never
/// two entries with the same text.
pub fn merge_hits(dense: Vec<RetrievedHit>, sparse: Vec<RetrievedHit>) -> Vec<RetrievedHit> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<RetrievedHit> = Vec::with_capacity(dense.len() + sparse.len());

    for hit in dense.into_iter().chain(sparse) {
        let key = hit.text.trim();
        if key.is_empty() {
            continue;
        }
        match slots.get(key) {
            Some(&slot) => {
                if hit.score > merged[slot].score {
                    merged[slot] = hit;
                }
            }
            None => {
                slots.insert(key.to_string(), merged.len());
                merged.push(hit);
            }
        }
    }

    // `sort_by` is stable, which is what keeps cross-method ties in input order.
    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HitSource;

    fn hit(text: &str, score: f64, source: HitSource) -> RetrievedHit {
        RetrievedHit {
            text: text.to_string(),
            score,
            link: None,
            page: None,
            title: None,
            source,
        }
    }

    fn texts(hits: &[RetrievedHit]) -> Vec<&str> {
        hits.iter().map(|h| h.text.as_str()).collect()
    }

    #[test]
    fn test_duplicate_keeps_max_score() {
        let merged = merge_hits(
            vec![hit("A", 0.8, HitSource::Dense)],
            vec![hit("A", 0.95, HitSource::Sparse)],
        );
        assert_eq!(merged.len(), 1);
        assert!((merged[0].score - 0.95).abs() < 1e-9);
        assert_eq!(merged[0].source, HitSource::Sparse);
    }

    #[test]
    fn test_duplicate_lower_score_discarded() {
        let merged = merge_hits(
            vec![hit("A", 0.9, HitSource::Dense)],
            vec![hit("A", 0.2, HitSource::Sparse)],
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, HitSource::Dense);
    }

    #[test]
    fn test_equal_score_duplicate_keeps_first() {
        let merged = merge_hits(
            vec![hit("A", 0.5, HitSource::Dense)],
            vec![hit("A", 0.5, HitSource::Sparse)],
        );
        assert_eq!(merged[0].source, HitSource::Dense);
    }

    #[test]
    fn test_blank_text_dropped() {
        let merged = merge_hits(
            vec![hit("", 0.99, HitSource::Dense), hit("   \t", 0.98, HitSource::Dense)],
            vec![hit("real", 0.1, HitSource::Sparse)],
        );
        assert_eq!(texts(&merged), vec!["real"]);
    }

    #[test]
    fn test_stable_tie_order() {
        let merged = merge_hits(
            vec![hit("a", 0.9, HitSource::Dense)],
            vec![hit("b", 0.5, HitSource::Sparse), hit("c", 0.9, HitSource::Sparse)],
        );
        assert_eq!(texts(&merged), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_no_duplicate_texts_in_output() {
        let dense: Vec<_> = (0..10)
            .map(|i| hit(&format!("t{}", i % 4), i as f64 / 10.0, HitSource::Dense))
            .collect();
        let sparse: Vec<_> = (0..10)
            .map(|i| hit(&format!("t{}", i % 6), 1.0 - i as f64 / 10.0, HitSource::Sparse))
            .collect();
        let merged = merge_hits(dense, sparse);
        let mut seen = std::collections::HashSet::new();
        for h in &merged {
            assert!(seen.insert(h.text.clone()), "duplicate {}", h.text);
        }
        assert_eq!(merged.len(), 6);
        for w in merged.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
    }

    #[test]
    fn test_nan_score_sorts_without_panic() {
        let merged = merge_hits(
            vec![hit("a", 0.2, HitSource::Dense), hit("n", f64::NAN, HitSource::Dense)],
            vec![hit("b", 0.7, HitSource::Sparse)],
        );
        let finite: Vec<_> = merged.iter().filter(|h| !h.score.is_nan()).collect();
        assert_eq!(merged.len(), 3);
        assert_eq!(finite[0].text, "b");
        assert_eq!(finite[1].text, "a");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge_hits(Vec::new(), Vec::new()).is_empty());
    }
}
