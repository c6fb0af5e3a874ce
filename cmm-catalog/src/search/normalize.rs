//! Text normalization for fuzzy matching

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase, strip diacritics, and split into alphanumeric runs
///
/// Letter runs and digit runs become separate tokens, so `"Op.27No2"`
/// yields `["op", "27", "no", "2"]`. Everything else is a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for c in folded.chars() {
        if c.is_alphanumeric() {
            let is_digit = c.is_numeric();
            if !current.is_empty() && is_digit != current_is_digit {
                tokens.push(std::mem::take(&mut current));
            }
            current_is_digit = is_digit;
            current.push(c);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Normalized text as a single space-joined string
pub fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}

/// Normalize and concatenate several optional fields
pub fn searchable_text<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    fields
        .into_iter()
        .flatten()
        .map(normalize)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_diacritics_and_case() {
        assert_eq!(tokenize("Antonín DVOŘÁK"), vec!["antonin", "dvorak"]);
    }

    #[test]
    fn test_tokenize_splits_letters_from_digits() {
        assert_eq!(tokenize("Op.27No2"), vec!["op", "27", "no", "2"]);
        assert_eq!(tokenize("BWV 1007"), vec!["bwv", "1007"]);
    }

    #[test]
    fn test_tokenize_cyrillic() {
        assert_eq!(tokenize("Симфония 5"), vec!["симфония", "5"]);
        // Ё and Й lose their marks
        assert_eq!(tokenize("Ёлка Йога"), vec!["елка", "иога"]);
    }

    #[test]
    fn test_tokenize_empty_and_punctuation() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" -- ,, ").is_empty());
    }

    #[test]
    fn test_searchable_text_skips_missing_fields() {
        let text = searchable_text([Some("Бах"), None, Some("J. S. Bach")]);
        assert_eq!(text, "бах j s bach");
    }
}
