//! Tag matching for free-text search queries
//!
//! Turns a query such as `"Armbar from No-Gi"` into the canonical names of
//! the known tags it mentions. Multi-word tags are claimed first, longest
//! first, so their words are not matched again as standalone tags.

use std::collections::{HashMap, HashSet};

/// Words never matched as standalone tags
pub const STOP_WORDS: [&str; 10] = ["from", "in", "on", "at", "the", "a", "an", "of", "and", "with"];

/// Lower-case `text` and split it into tokens, treating every
/// non-alphanumeric character as a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalized lookup form of a tag name (`"No-Gi"` → `"no gi"`)
pub fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}

#[derive(Debug, Clone)]
struct KnownTag {
    canonical: String,
    tokens: Vec<String>,
    normalized: String,
}

/// Matches queries against a fixed set of known tag names.
#[derive(Debug, Clone, Default)]
pub struct TagMatcher {
    /// Multi-word tags, longest normalized text first
    phrases: Vec<KnownTag>,
    /// Single-word tags keyed by normalized text
    words: HashMap<String, String>,
}

impl TagMatcher {
    /// Build a matcher from canonical tag names.
    ///
    /// When two names normalize to the same text the first one wins.
    pub fn new<I, S>(tag_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut phrases = Vec::new();
        let mut words = HashMap::new();

        for name in tag_names {
            let canonical = name.as_ref().trim();
            let tokens = tokenize(canonical);
            if tokens.is_empty() {
                continue;
            }
            let normalized = tokens.join(" ");
            if !seen.insert(normalized.clone()) {
                continue;
            }

            if tokens.len() == 1 {
                words.insert(normalized, canonical.to_string());
            } else {
                phrases.push(KnownTag {
                    canonical: canonical.to_string(),
                    tokens,
                    normalized,
                });
            }
        }

        phrases.sort_by(|a, b| {
            b.normalized
                .len()
                .cmp(&a.normalized.len())
                .then_with(|| a.normalized.cmp(&b.normalized))
        });

        Self { phrases, words }
    }

    /// Number of distinct known tags
    pub fn len(&self) -> usize {
        self.phrases.len() + self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Canonical names of the tags referenced by `query`, in discovery order.
    pub fn match_query(&self, query: &str) -> Vec<String> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut consumed: HashSet<&str> = HashSet::new();
        let mut matched: Vec<String> = Vec::new();

        for phrase in &self.phrases {
            if phrase.tokens.iter().any(|t| consumed.contains(t.as_str())) {
                continue;
            }
            if contains_sequence(&tokens, &phrase.tokens) {
                consumed.extend(phrase.tokens.iter().map(String::as_str));
                push_unique(&mut matched, &phrase.canonical);
            }
        }

        for token in &tokens {
            if consumed.contains(token.as_str()) || STOP_WORDS.contains(&token.as_str()) {
                continue;
            }
            if let Some(canonical) = self.words.get(token) {
                push_unique(&mut matched, canonical);
            }
        }

        matched
    }
}

/// Whether `needle` occurs as a run of whole tokens in `tokens`.
///
/// Matching on tokens rather than raw text keeps `gi` from hitting `beginner`.
fn contains_sequence(tokens: &[String], needle: &[String]) -> bool {
    needle.len() <= tokens.len() && tokens.windows(needle.len()).any(|window| window == needle)
}

fn push_unique(matched: &mut Vec<String>, name: &str) {
    if !matched.iter().any(|m| m == name) {
        matched.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(tags: &[&str]) -> TagMatcher {
        TagMatcher::new(tags.iter().copied())
    }

    #[test]
    fn test_multi_word_tag_consumes_its_words() {
        let m = matcher(&["no gi", "armbar", "gi"]);
        assert_eq!(m.match_query("Armbar from No-Gi"), vec!["no gi", "armbar"]);
    }

    #[test]
    fn test_empty_and_unknown_queries() {
        let m = matcher(&["no gi", "armbar", "gi"]);
        assert!(m.match_query("").is_empty());
        assert!(m.match_query("   ,,, ").is_empty());
        assert!(m.match_query("omoplata").is_empty());
    }

    #[test]
    fn test_stop_words_are_never_tags() {
        let m = matcher(&["the", "mount"]);
        assert_eq!(m.match_query("the mount"), vec!["mount"]);
    }

    #[test]
    fn test_canonical_spelling_is_preserved() {
        let m = matcher(&["No_Gi", "Kimura"]);
        assert_eq!(m.match_query("kimura no-gi"), vec!["No_Gi", "Kimura"]);
    }

    #[test]
    fn test_longer_phrase_wins_over_contained_phrase() {
        let m = matcher(&["half guard", "deep half guard", "guard"]);
        assert_eq!(m.match_query("deep half guard sweep"), vec!["deep half guard"]);
    }

    #[test]
    fn test_phrase_sharing_a_claimed_word_is_skipped() {
        let m = matcher(&["half guard", "closed guard"]);
        assert_eq!(m.match_query("half guard to closed guard"), vec!["closed guard"]);
    }

    #[test]
    fn test_claimed_word_is_not_matched_again_alone() {
        let m = matcher(&["no gi", "gi"]);
        assert_eq!(m.match_query("no gi versus gi"), vec!["no gi"]);
        assert_eq!(m.match_query("gi then no gi"), vec!["no gi"]);
    }

    #[test]
    fn test_duplicates_suppressed() {
        let m = matcher(&["armbar"]);
        assert_eq!(m.match_query("armbar, ARMBAR armbar"), vec!["armbar"]);
    }

    #[test]
    fn test_phrase_must_be_contiguous() {
        let m = matcher(&["no gi", "gi"]);
        assert_eq!(m.match_query("no sweep gi"), vec!["gi"]);
    }

    #[test]
    fn test_substring_inside_word_does_not_match() {
        let m = matcher(&["gi"]);
        assert!(m.match_query("beginner").is_empty());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  No-Gi, "), "no gi");
        assert_eq!(normalize("x_guard"), "x guard");
    }
}
