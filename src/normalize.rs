//! Shared normalization functions for catalog reconciliation.
//! Title variant stripping is the grouping key for canonical selection;
//! the folding helpers feed sort keys and similarity scoring.
//!
//! CRITICAL: Changing the variant vocabulary changes which recordings are
//! grouped together, and therefore which titles get published.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Performance-variant suffix: a parenthesized marker at the end of a title.
/// ASCII and full-width parentheses, case-insensitive.
///
/// Vocabulary (and only this vocabulary):
/// - chorus only: "(サビ)", "(サビのみ)", "(Chorus Only)"
/// - short version: "(short)", "(short ver.)", "(ショートver)"
/// - one phrase: "(ワンフレーズ)", "(1フレーズ)", "(one phrase)"
/// - TV size: "(TV size)", "(TVサイズ)", "(TV ver.)"
/// - edit / mix: "(edit)", "(mix)"
/// - full version: "(full)", "(full ver)", "(フルver)"
pub static VARIANT_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    let markers = [
        r"サビ(?:のみ|だけ)?",
        r"chorus(?:[\s\-]*only)?",
        r"short(?:[\s\-]*(?:ver\.?|version|size))?",
        r"ショート(?:[\s\-]*(?:ver\.?|version|バージョン))?",
        r"(?:one|1|ワン)[\s\-]*(?:phrase|フレーズ)",
        r"tv[\s\-]*(?:size|サイズ|ver\.?|version)",
        r"edit",
        r"mix",
        r"full(?:[\s\-]*(?:ver\.?|version|size))?",
        r"フル(?:[\s\-]*(?:ver\.?|version|バージョン|サイズ))?",
    ];
    Regex::new(&format!(
        r"(?i)\s*[\(（]\s*(?:{})\s*[\)）]$",
        markers.join("|")
    ))
    .unwrap()
});

/// Regex to collapse runs of whitespace into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ============================================================================
// TITLE NORMALIZATION
// ============================================================================

/// Result of stripping variant markers from a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTitle {
    pub text: String,
    pub is_variant: bool,
}

/// Strip trailing performance-variant markers from a title.
///
/// Stacked markers ("Song (short) (edit)") are all removed, so applying
/// this to its own output never changes the text. A title consisting of
/// nothing but a marker is left as is.
pub fn normalize_title(title: &str) -> NormalizedTitle {
    let mut text = title.trim();
    let mut is_variant = false;

    while let Some(m) = VARIANT_SUFFIX.find(text) {
        let rest = text[..m.start()].trim_end();
        if rest.is_empty() {
            break;
        }
        text = rest;
        is_variant = true;
    }

    NormalizedTitle {
        text: text.to_string(),
        is_variant,
    }
}

// ============================================================================
// FOLDING HELPERS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to lowercase ASCII: NFKD, drop combining marks, then
/// transliterate what remains (kana, kanji, Cyrillic, ...).
/// e.g., "Beyoncé" → "beyonce", "Кино" → "kino"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let folded = any_ascii(&stripped).to_lowercase();
    MULTI_SPACE.replace_all(folded.trim(), " ").to_string()
}

/// Fold case and character width without changing the script, for
/// similarity comparison. e.g., "ＬｉＳＡ" → "lisa"
pub fn fold_for_comparison(s: &str) -> String {
    let folded: String = s.nfkc().flat_map(char::to_lowercase).collect();
    MULTI_SPACE.replace_all(folded.trim(), " ").to_string()
}

// ============================================================================
// TESTS
// ============================================================================
