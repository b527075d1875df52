//! Content filtering: profanity detection and filename sanitization.
//!
//! Stateless apart from the enabled flag; safe to share across tasks.

use censor::Censor;
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Characters that are not allowed in filename components.
static FORBIDDEN_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("forbidden-chars pattern is valid"));

/// Profanity predicate and filename sanitizer.
///
/// When disabled, `contains_profanity` always returns false and
/// `clean_filename` only strips forbidden characters.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    enabled: bool,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ContentFilter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Whether profanity filtering is active.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Check a piece of text against the word list.
    pub fn contains_profanity(&self, text: &str) -> bool {
        if !self.enabled {
            return false;
        }
        Censor::Standard.check(text)
    }

    /// Clean a filename component: strip characters that are invalid in
    /// filenames, censor profane substrings when enabled, then trim.
    ///
    /// Never fails; an input made entirely of forbidden characters yields
    /// an empty string.
    pub fn clean_filename(&self, name: &str) -> String {
        let clean = FORBIDDEN_CHARS.replace_all(name, "");
        let clean = if self.enabled {
            Censor::Standard.censor(&clean)
        } else {
            clean.into_owned()
        };
        clean.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_filename_strips_forbidden_chars() {
        let filter = ContentFilter::new(false);
        assert_eq!(filter.clean_filename("Test: Song?"), "Test Song");
        assert_eq!(filter.clean_filename(r"a/b\c|d"), "abcd");
        assert_eq!(filter.clean_filename("<>:\"/\\|?*"), "");
    }

    #[test]
    fn test_clean_filename_never_contains_forbidden_chars() {
        let filter = ContentFilter::default();
        let inputs = ["", "normal name", "<<<???>>>", r"Test/Artist\Name", "a*b"];
        for input in inputs {
            let cleaned = filter.clean_filename(input);
            assert!(
                !cleaned.contains(|c| "<>:\"/\\|?*".contains(c)),
                "input {input:?} produced {cleaned:?}"
            );
        }
    }

    #[test]
    fn test_clean_filename_trims() {
        let filter = ContentFilter::new(false);
        assert_eq!(filter.clean_filename("  spaced  "), "spaced");
    }

    #[test]
    fn test_disabled_filter_reports_no_profanity() {
        let filter = ContentFilter::new(false);
        assert!(!filter.contains_profanity("fuck"));
    }

    #[test]
    fn test_enabled_filter_detects_profanity() {
        let filter = ContentFilter::new(true);
        assert!(filter.contains_profanity("some fucking title"));
        assert!(!filter.contains_profanity("a perfectly clean title"));
    }

    #[test]
    fn test_enabled_filter_censors_filenames() {
        let filter = ContentFilter::new(true);
        let cleaned = filter.clean_filename("shit song");
        assert!(!cleaned.contains("shit"), "got {cleaned:?}");
        assert!(cleaned.contains('*'));
    }
}
