//! Slug derivation
//!
//! Turns headers and tag names into URL-safe identifiers. Text is put in
//! compatibility decomposition (NFKD) so accents split off their base letter
//! and ligatures or full-width forms become plain ASCII. Whatever is still
//! outside `[a-z0-9_-]` afterwards is dropped, and whitespace/hyphen runs
//! become a single hyphen.

use unicode_normalization::UnicodeNormalization;

/// Derive a slug from arbitrary text.
///
/// `ł` has no decomposition and is folded to `l` by hand.
///
/// # Examples
///
/// ```
/// use motoapi::services::slugify;
///
/// assert_eq!(slugify("Nowe Audi RS6 – pierwsza jazda!"), "nowe-audi-rs6-pierwsza-jazda");
/// assert_eq!(slugify("Łódź Rally"), "lodz-rally");
/// ```
pub fn slugify(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    let folded = text.chars().map(|c| match c {
        'ł' | 'Ł' => 'l',
        other => other,
    });
    for c in folded.nfkd() {
        if !c.is_ascii() {
            continue;
        }
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c.is_ascii_whitespace() {
            kept.push(c);
        }
    }

    let mut slug = String::with_capacity(kept.len());
    let mut in_separator = false;
    for c in kept.chars() {
        if c == '-' || c.is_ascii_whitespace() {
            if !in_separator {
                slug.push('-');
                in_separator = true;
            }
        } else {
            slug.push(c);
            in_separator = false;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_header() {
        assert_eq!(slugify("Test header"), "test-header");
        assert_eq!(slugify("  Hello   World  "), "hello-world");
    }

    #[test]
    fn test_polish_letters() {
        assert_eq!(
            slugify("Zażółć gęślą jaźń"),
            "zazolc-gesla-jazn"
        );
        assert_eq!(slugify("ŁÓDŹ"), "lodz");
    }

    #[test]
    fn test_compatibility_forms_folded() {
        assert_eq!(slugify("Ștefan Țiriac"), "stefan-tiriac");
        assert_eq!(slugify("ﬁat １２６p"), "fiat-126p");
        assert_eq!(slugify("Citroën C³"), "citroen-c3");
    }

    #[test]
    fn test_letters_without_decomposition_dropped() {
        assert_eq!(slugify("Straße"), "strae");
        assert_eq!(slugify("Ærø"), "r");
    }

    #[test]
    fn test_punctuation_removed() {
        assert_eq!(slugify("BMW M3 (G80): test!"), "bmw-m3-g80-test");
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn test_edges_stripped() {
        assert_eq!(slugify("--_hello_--"), "hello");
        assert_eq!(slugify("_ a _"), "a");
    }

    #[test]
    fn test_non_latin_dropped() {
        assert_eq!(slugify("東京 Motor Show"), "motor-show");
        assert_eq!(slugify("🚗🚗"), "");
        assert_eq!(slugify(""), "");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A slug only contains lowercase ASCII letters, digits, '_' and single inner hyphens
        #[test]
        fn slug_charset(text in "\\PC{0,60}") {
            let slug = slugify(&text);
            prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            prop_assert!(!slug.starts_with('_') && !slug.ends_with('_'));
        }

        /// Slugifying a slug changes nothing
        #[test]
        fn slug_idempotent(text in "\\PC{0,60}") {
            let once = slugify(&text);
            prop_assert_eq!(slugify(&once), once.clone());
        }
    }
}
