//! Duplicate and typo heuristics for catalog names

use crate::search::fuzz::partial_ratio;

/// Partial-ratio score at which two names count as the same entity
pub const DUPLICATE_THRESHOLD: u8 = 85;

/// Genre names shorter than this tolerate a single edit
const SHORT_GENRE_LEN: usize = 8;

/// Lowercase, drop `(...)` asides and punctuation, collapse whitespace
///
/// `"Symphony No. 5 (Fate)"` and `"symphony no 5"` normalize alike.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;

    for c in name.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            c if c.is_alphanumeric() => out.extend(c.to_lowercase()),
            _ => out.push(' '),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Probably the same composer or work under slightly different spelling
pub fn is_probable_duplicate(a: &str, b: &str) -> bool {
    let a = normalize_name(a);
    let b = normalize_name(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    partial_ratio(&a, &b) >= DUPLICATE_THRESHOLD
}

/// Edits tolerated before a genre name counts as new
pub fn genre_typo_threshold(name: &str) -> usize {
    if name.chars().count() < SHORT_GENRE_LEN {
        1
    } else {
        2
    }
}

/// Case-insensitive edit distance between two genre names
pub fn genre_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// `candidate` is within typo distance of `existing`, but not equal to it
pub fn is_genre_typo(candidate: &str, existing: &str) -> bool {
    let distance = genre_distance(candidate, existing);
    distance > 0 && distance <= genre_typo_threshold(candidate)
}
