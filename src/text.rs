//! Title normalization and n-gram tokenization.
//!
//! Output must line up token-for-token with the vocabulary the model was
//! exported with, so both steps are fixed: lowercase, NFD, drop combining
//! diacritics (U+0300..=U+036F), then split on ASCII word characters.

use unicode_normalization::UnicodeNormalization;

/// Unigrams followed by bigrams.
pub const DEFAULT_NGRAM_RANGE: [usize; 2] = [1, 2];

const COMBINING_MARKS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Lowercase and strip accents: `"Déjà vu"` becomes `"deja vu"`.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !COMBINING_MARKS.contains(c))
        .collect()
}

/// Split normalized text into runs of `[A-Za-z0-9_]`.
///
/// Anything else separates words, including letters outside ASCII that
/// survived accent stripping (`ß`, `œ`, CJK, emoji).
pub(crate) fn words(normalized: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();

    for ch in normalized.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            current.push(ch);
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Word n-grams for every `n` in `lo..=hi`, grouped by ascending `n`, each
/// group in sliding-window order. Duplicates are kept.
pub(crate) fn ngrams(words: &[String], lo: usize, hi: usize) -> Vec<String> {
    let mut grams = Vec::new();

    for n in lo.max(1)..=hi {
        if n > words.len() {
            break;
        }
        grams.extend(words.windows(n).map(|window| window.join(" ")));
    }

    grams
}

/// Tokenize a title into unigrams followed by bigrams.
///
/// `"Les chats noirs"` yields
/// `["les", "chats", "noirs", "les chats", "chats noirs"]`.
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_with_range(text, DEFAULT_NGRAM_RANGE)
}

/// Tokenize with an explicit n-gram range, as declared by the model artifact.
pub fn tokenize_with_range(text: &str, ngram_range: [usize; 2]) -> Vec<String> {
    let words = words(&normalize(text));
    ngrams(&words, ngram_range[0], ngram_range[1])
}
