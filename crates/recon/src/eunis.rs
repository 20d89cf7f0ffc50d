//! EUNIS level-3 normalization of free-text habitat fields.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// A letter-digit code with an optional decimal part, or a bare level-1 letter.
static EUNIS_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[ABCJ][0-9](?:\.[0-9]*)?|\b[ABCJ]\b").expect("EUNIS pattern is a valid literal")
});

/// Level-2 codes that survive the level-2 filter (deep-sea habitats).
pub const KEEP_LEVEL2: &[&str] = &["A6"];

/// Output when a field holds no level-3 EUNIS code.
pub const VOID: &str = "Void";

const JOINER: &str = "+";

/// Reduce a habitat field to its distinct level-3 codes, sorted and joined
/// with `+`. Codes are truncated to four characters; shorter level-1/2 codes
/// are dropped unless kept explicitly. Non-EUNIS text yields [`VOID`].
pub fn to_level3(hab_type: &str) -> String {
    let codes: BTreeSet<&str> = EUNIS_CODE
        .find_iter(hab_type)
        .map(|m| truncate(m.as_str(), 4))
        .filter(|c| c.len() > 3 || KEEP_LEVEL2.contains(c))
        .collect();

    if codes.is_empty() {
        return VOID.to_string();
    }
    codes.into_iter().collect::<Vec<_>>().join(JOINER)
}

// Matches are ASCII, so byte slicing is safe.
fn truncate(code: &str, max: usize) -> &str {
    if code.len() > max { &code[..max] } else { code }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_and_dedups() {
        assert_eq!(to_level3("A5.231"), "A5.2");
        assert_eq!(to_level3("A5.23/A5.27"), "A5.2");
    }

    #[test]
    fn sorted_join() {
        assert_eq!(to_level3("A5.4 + A3.1 or A4.2"), "A3.1+A4.2+A5.4");
    }

    #[test]
    fn level2_dropped_except_deep_sea() {
        assert_eq!(to_level3("A5"), VOID);
        assert_eq!(to_level3("A6"), "A6");
        assert_eq!(to_level3("A5/A5.1"), "A5.1");
        assert_eq!(to_level3("A6.1/A6"), "A6+A6.1");
    }

    #[test]
    fn non_eunis_is_void() {
        assert_eq!(to_level3("deep sea coarse sediment"), VOID);
        assert_eq!(to_level3(""), VOID);
        assert_eq!(to_level3("A"), VOID);
    }

    #[test]
    fn needs_word_boundary() {
        // "XA5.1" has no boundary before the letter.
        assert_eq!(to_level3("XA5.1"), VOID);
        assert_eq!(to_level3("B3.1&A2.3"), "A2.3+B3.1");
    }
}
