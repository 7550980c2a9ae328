//! Brand mention detection over free-text answers.

use regex::Regex;

/// Separators tolerated between the words of a brand variant, including none.
const SEPARATOR: &str = r"[\s\-_.]*";

/// Case-insensitive matcher compiled once from the catalog's brand variants.
///
/// Each variant is split into alphanumeric words; the words must appear in
/// order with any run of whitespace, hyphens, underscores or dots between
/// them. `"fleet tec"` therefore matches `FleetTEC`, `Fleet-Tec` and
/// `fleet  tec`. There is no word-boundary requirement.
#[derive(Debug, Clone)]
pub struct MentionDetector {
    pattern: Option<Regex>,
}

impl MentionDetector {
    /// Compile a detector from brand variants. Blank variants are ignored; a
    /// detector without usable variants never reports a mention.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] if the combined pattern exceeds the regex
    /// engine's size limits.
    pub fn new<S: AsRef<str>>(variants: &[S]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = variants
            .iter()
            .filter_map(|v| variant_pattern(v.as_ref()))
            .collect();

        if alternatives.is_empty() {
            tracing::warn!("no usable brand variants; every answer will count as a non-mention");
            return Ok(Self { pattern: None });
        }

        let pattern = Regex::new(&format!("(?i)(?:{})", alternatives.join("|")))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// `true` if any variant occurs in `response_text`.
    #[must_use]
    pub fn detect(&self, response_text: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|re| re.is_match(response_text))
    }
}

fn variant_pattern(variant: &str) -> Option<String> {
    let words: Vec<String> = variant
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleettec() -> MentionDetector {
        MentionDetector::new(&["fleettec", "fleet tec", "fleettech", "fleet tech"]).unwrap()
    }

    #[test]
    fn matching_ignores_case() {
        let detector = MentionDetector::new(&["fleettec"]).unwrap();
        assert!(detector.detect("FleetTEC is great"));
        assert!(detector.detect("fleettec is great"));
        assert!(detector.detect("FLEETTEC"));
    }

    #[test]
    fn separators_between_words_are_tolerated() {
        let detector = fleettec();
        assert!(detector.detect("Try Fleet-Tec for upfits."));
        assert!(detector.detect("fleet  tec"));
        assert!(detector.detect("fleet_tech solutions"));
        assert!(detector.detect("fleet.tec"));
    }

    #[test]
    fn single_word_variant_matches_spaced_text_only_via_multiword_variant() {
        let detector = MentionDetector::new(&["fleettec"]).unwrap();
        assert!(!detector.detect("fleet tec"));

        let detector = MentionDetector::new(&["fleet tec"]).unwrap();
        assert!(detector.detect("fleettec"));
    }

    #[test]
    fn substring_match_has_no_word_boundary() {
        let detector = fleettec();
        assert!(detector.detect("see www.fleettec.com"));
        assert!(detector.detect("#FleetTechLife"));
    }

    #[test]
    fn unrelated_text_is_not_a_mention() {
        let detector = fleettec();
        assert!(!detector.detect("Our fleet uses technology from several vendors."));
        assert!(!detector.detect(""));
    }

    #[test]
    fn regex_metacharacters_in_variants_are_literal() {
        let detector = MentionDetector::new(&["a+b (co)"]).unwrap();
        assert!(detector.detect("A B Co"));
        assert!(!detector.detect("aaab"));
    }

    #[test]
    fn blank_variants_match_nothing() {
        let detector = MentionDetector::new(&["", "  ", "--"]).unwrap();
        assert!(!detector.detect("anything at all"));

        let empty: [&str; 0] = [];
        let detector = MentionDetector::new(&empty).unwrap();
        assert!(!detector.detect("fleettec"));
    }

    #[test]
    fn detection_is_deterministic() {
        let detector = fleettec();
        let text = "Vendors include Acme and Fleet Tech.";
        assert_eq!(detector.detect(text), detector.detect(text));
    }
}
