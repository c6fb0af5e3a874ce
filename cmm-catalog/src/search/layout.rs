//! Keyboard layout swap (QWERTY <-> ЙЦУКЕН)
//!
//! Fixes queries typed with the wrong layout active: `",f["` is what
//! "бах" looks like on a US keyboard, and `"ифср"` is "bach" on a Russian
//! one.

const LATIN: &str = "qwertyuiop[]asdfghjkl;'zxcvbnm,.`";
const CYRILLIC: &str = "йцукенгшщзхъфывапролджэячсмитьбюё";

/// Swap every key between the two layouts, in both directions
///
/// Characters with no counterpart (digits, spaces) pass through.
pub fn swap_layout(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if let Some(pos) = LATIN.chars().position(|l| l == c) {
                CYRILLIC.chars().nth(pos).unwrap_or(c)
            } else if let Some(pos) = CYRILLIC.chars().position(|r| r == c) {
                LATIN.chars().nth(pos).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}
