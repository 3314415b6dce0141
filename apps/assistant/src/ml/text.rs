//! Text normalisation for the ranking model.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ml::compile_regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| compile_regex(r"\s+"));
static DISALLOWED: Lazy<Regex> = Lazy::new(|| compile_regex(r"[^\w\s.,!?;:]"));

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

const STEMS: &[(&str, &str)] = &[
    ("engineering", "engineer"),
    ("developer", "develop"),
    ("manager", "manage"),
    ("analyst", "analy"),
    ("designer", "design"),
];

/// Lowercases, collapses whitespace and drops everything except word
/// characters, whitespace and `.,!?;:`.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = WHITESPACE.replace_all(&lowered, " ");
    DISALLOWED.replace_all(&collapsed, "").trim().to_string()
}

const EDGE_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

/// Whitespace split, with the punctuation `clean_text` keeps trimmed from
/// either end of each token.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|t| t.trim_matches(EDGE_PUNCTUATION))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn remove_stopwords(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Fixed lookup stemming for a handful of job-title words.
pub fn stem_words(tokens: Vec<String>) -> Vec<String> {
    tokens
        .into_iter()
        .map(|t| {
            STEMS
                .iter()
                .find(|(word, _)| *word == t)
                .map(|(_, stem)| stem.to_string())
                .unwrap_or(t)
        })
        .collect()
}

/// clean → tokenize → stopwords → stem.
pub fn preprocess(text: &str) -> Vec<String> {
    stem_words(remove_stopwords(tokenize(&clean_text(text))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_keeps_basic_punctuation() {
        assert_eq!(
            clean_text("  Senior   Engineer (Remote) -- $150k!\n\tApply: now."),
            "senior engineer remote  150k! apply: now."
        );
    }

    #[test]
    fn test_preprocess_pipeline() {
        assert_eq!(
            preprocess("The Data Analyst and the Product Designer"),
            vec!["data", "analy", "product", "design"]
        );
    }

    #[test]
    fn test_stems_only_exact_tokens() {
        assert_eq!(
            stem_words(vec!["managers".into(), "manager".into()]),
            vec!["managers", "manage"]
        );
    }

    #[test]
    fn test_trailing_punctuation_does_not_block_stemming() {
        assert_eq!(
            preprocess("Hiring: manager, designer. Apply!"),
            vec!["hiring", "manage", "design", "apply"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(preprocess("   ").is_empty());
    }
}
