//! TF-IDF vectorization against the model's fixed vocabulary.
//!
//! Term frequency is `count / max(1, total_tokens)`, where the denominator
//! counts every token including out-of-vocabulary ones. No L2
//! normalization: the SVM weights were fit on raw TF×IDF values.

use std::collections::HashMap;

use crate::model::Model;
use crate::text::tokenize_with_range;

/// Count in-vocabulary tokens. Returns the counts and the total token
/// count before filtering.
pub(crate) fn term_counts<'a>(
    tokens: &'a [String],
    vocabulary: &HashMap<String, usize>,
) -> (HashMap<&'a str, u32>, usize) {
    let mut counts = HashMap::new();
    for token in tokens {
        if vocabulary.contains_key(token) {
            *counts.entry(token.as_str()).or_insert(0) += 1;
        }
    }
    (counts, tokens.len())
}

/// Dense TF-IDF vector of length `model.n_features()`.
pub fn vectorize(text: &str, model: &Model) -> Vec<f64> {
    let tokens = tokenize_with_range(text, model.ngram_range());
    let (counts, total) = term_counts(&tokens, model.vocabulary());
    let doc_length = total.max(1) as f64;

    let idf = model.idf();
    let mut vector = vec![0.0; model.n_features()];
    for (token, count) in counts {
        let idx = model.vocabulary()[token];
        let tf = count as f64 / doc_length;
        vector[idx] = tf * idf[idx];
    }

    vector
}
