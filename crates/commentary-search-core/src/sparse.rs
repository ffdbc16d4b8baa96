//! Sparse vector construction from per-token weights.
//!
//! Sparse encoders report weights per *decoded* token. Several decoded
//! tokens can map back to the same vocabulary id (sub-word pieces,
//! normalization), so weights are summed per id rather than overwritten.
//! The encoder already keeps the max weight per decoded token; summing
//! per id on top of that is intentional and must stay even though it
//! looks redundant.

use std::collections::HashMap;

use crate::embedding::SparseEncoder;
use crate::models::SparseVector;

/// Build a [`SparseVector`] from token weights.
///
/// `resolve` maps a token to its vocabulary id. Tokens that do not
/// resolve are skipped, as are weights that are negative or not finite.
/// Entries keep the order in which each id was first seen.
///
/// An empty or fully unresolvable input yields an empty vector.
///
/// # Example
///
/// ```rust
/// use commentary_search_core::sparse::build_sparse_vector;
///
/// let weights = vec![("t1".to_string(), 0.2), ("t2".to_string(), 0.3)];
/// let v = build_sparse_vector(weights, |_| Some(7));
/// assert_eq!(v.indices, vec![7]);
/// assert!((v.values[0] - 0.5).abs() < 1e-6);
/// ```
pub fn build_sparse_vector<I, S, F>(weights: I, resolve: F) -> SparseVector
where
    I: IntoIterator<Item = (S, f32)>,
    S: AsRef<str>,
    F: Fn(&str) -> Option<u32>,
{
    let mut slots: HashMap<u32, usize> = HashMap::new();
    let mut vector = SparseVector::default();

    for (token, weight) in weights {
        if !weight.is_finite() || weight < 0.0 {
            continue;
        }
        let Some(id) = resolve(token.as_ref()) else {
            continue;
        };
        match slots.get(&id) {
            Some(&slot) => vector.values[slot] += weight,
            None => {
                slots.insert(id, vector.indices.len());
                vector.indices.push(id);
                vector.values.push(weight);
            }
        }
    }

    vector
}

/// Build a sparse vector using an encoder's own vocabulary.
pub fn sparse_vector_for<E>(encoder: &E, weights: Vec<(String, f32)>) -> SparseVector
where
    E: SparseEncoder + ?Sized,
{
    build_sparse_vector(weights, |token| encoder.token_id(token))
}
