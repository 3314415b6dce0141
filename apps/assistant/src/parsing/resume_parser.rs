//! Resume text extraction and field heuristics. Skills are matched against a
//! fixed, categorised vocabulary; nothing here calls the model.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::ml::compile_regex;

const MAX_NAME_CHARS: usize = 60;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"));
static PHONE: Lazy<Regex> = Lazy::new(|| {
    compile_regex(r"(?:\+\d{1,2}\s?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}")
});
static YEARS_OF_EXPERIENCE: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"(?i)(\d{1,2})\+?\s*(?:years?|yrs?)(?:\s+of)?\s+experience"));

const SKILL_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "programming",
        &["python", "java", "javascript", "typescript", "c++", "c#", "go", "rust", "ruby", "scala", "kotlin", "swift"],
    ),
    (
        "ml",
        &["machine learning", "deep learning", "nlp", "computer vision", "tensorflow", "pytorch", "scikit-learn"],
    ),
    (
        "cloud",
        &["aws", "azure", "gcp", "docker", "kubernetes", "terraform"],
    ),
    (
        "databases",
        &["sql", "mysql", "postgresql", "mongodb", "redis", "elasticsearch"],
    ),
];

const EDUCATION_KEYWORDS: &[&str] = &[
    "bachelor", "master", "phd", "ph.d", "b.sc", "m.sc", "b.s.", "m.s.", "mba", "university", "college", "degree",
];

#[derive(Debug, Error)]
pub enum ResumeParseError {
    #[error("Could not extract text from PDF: {0}")]
    Pdf(String),

    #[error("Resume contains no text")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedResume {
    pub name: Option<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    /// Category → skills found, in vocabulary order. Every category is present.
    pub skills: BTreeMap<String, Vec<String>>,
    pub education: Vec<String>,
    /// Largest "N years experience" claim, if any.
    pub years_experience: Option<u32>,
    pub word_count: usize,
}

/// Text of an uploaded file: PDF when the name or magic bytes say so,
/// otherwise lossy UTF-8.
pub fn extract_text(file_name: Option<&str>, bytes: &[u8]) -> Result<String, ResumeParseError> {
    let is_pdf = bytes.starts_with(b"%PDF")
        || file_name.is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"));

    let text = if is_pdf {
        debug!("Extracting text from PDF ({} bytes)", bytes.len());
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ResumeParseError::Pdf(e.to_string()))?
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    };

    if text.trim().is_empty() {
        return Err(ResumeParseError::Empty);
    }
    Ok(text)
}

pub fn parse_resume(text: &str) -> ParsedResume {
    ParsedResume {
        name: extract_name(text),
        emails: unique_matches(&EMAIL, text),
        phones: unique_matches(&PHONE, text),
        skills: extract_skills(text),
        education: extract_education(text),
        years_experience: YEARS_OF_EXPERIENCE
            .captures_iter(text)
            .filter_map(|c| c[1].parse::<u32>().ok())
            .max(),
        word_count: text.split_whitespace().count(),
    }
}

/// The first short non-blank line, unless that line is contact details.
fn extract_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| line.chars().count() <= MAX_NAME_CHARS)
        .filter(|line| !EMAIL.is_match(line) && !PHONE.is_match(line))
        .map(str::to_string)
}

pub fn extract_skills(text: &str) -> BTreeMap<String, Vec<String>> {
    let lower = text.to_lowercase();
    SKILL_CATEGORIES
        .iter()
        .map(|(category, vocabulary)| {
            let found = vocabulary
                .iter()
                .filter(|skill| contains_term(&lower, skill))
                .map(|skill| skill.to_string())
                .collect();
            (category.to_string(), found)
        })
        .collect()
}

/// Whole-term match: the characters around the term must not be alphanumeric.
fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn extract_education(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            let lower = line.to_lowercase();
            EDUCATION_KEYWORDS.iter().any(|k| contains_term(&lower, k))
        })
        .map(str::to_string)
        .collect()
}

fn unique_matches(pattern: &Regex, text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in pattern.find_iter(text) {
        let value = m.as_str().trim().to_string();
        if !found.contains(&value) {
            found.push(value);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Jane Doe\n\
        jane.doe@example.com | (555) 123-4567\n\
        Senior Software Engineer with 7+ years of experience\n\
        Skills: Python, Rust, Go, AWS, Kubernetes, PostgreSQL, Machine Learning\n\
        Education: B.Sc. Computer Science, University of Toronto\n\
        Contact again at jane.doe@example.com\n";

    #[test]
    fn test_regexes_compile() {
        assert!(EMAIL.is_match("a@b.io"));
        assert!(PHONE.is_match("555-123-4567"));
        assert!(YEARS_OF_EXPERIENCE.is_match("3 years experience"));
    }

    #[test]
    fn test_parse_resume_fields() {
        let parsed = parse_resume(RESUME);
        assert_eq!(parsed.name.as_deref(), Some("Jane Doe"));
        assert_eq!(parsed.emails, vec!["jane.doe@example.com"]);
        assert_eq!(parsed.phones, vec!["(555) 123-4567"]);
        assert_eq!(parsed.years_experience, Some(7));
        assert_eq!(
            parsed.education,
            vec!["Education: B.Sc. Computer Science, University of Toronto"]
        );
        assert!(parsed.word_count > 20);
    }

    #[test]
    fn test_skills_are_categorised() {
        let skills = extract_skills("John Doe\nSoftware Engineer\nPython, Java, AWS");
        assert_eq!(skills["programming"], vec!["python", "java"]);
        assert_eq!(skills["cloud"], vec!["aws"]);
        assert!(skills["ml"].is_empty());
        assert!(skills["databases"].is_empty());
    }

    #[test]
    fn test_skill_terms_need_boundaries() {
        let skills = extract_skills("JavaScript, Google, Gopher");
        assert_eq!(skills["programming"], vec!["javascript"]);
    }

    #[test]
    fn test_plain_text_upload() {
        let text = extract_text(Some("cv.txt"), b"Jane Doe\nRust").unwrap();
        assert_eq!(text, "Jane Doe\nRust");
    }

    #[test]
    fn test_blank_upload_is_rejected() {
        assert!(matches!(
            extract_text(Some("cv.txt"), b"  \n "),
            Err(ResumeParseError::Empty)
        ));
    }

    #[test]
    fn test_name_skips_contact_only_first_line() {
        let parsed = parse_resume("jane@example.com\nJane Doe");
        assert!(parsed.name.is_none());
    }
}
