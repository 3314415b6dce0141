use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::ml::compile_regex;

pub const UNKNOWN_TITLE: &str = "Unknown Position";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_LOCATION: &str = "Location not specified";
pub const UNKNOWN_SALARY: &str = "Salary not specified";

const MAX_TITLE_CHARS: usize = 100;

static LOCATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:remote|hybrid|onsite)\b",
        // "Austin, TX"
        r"\b[A-Z][a-z]+,\s*[A-Z]{2}\b",
        r"(?i)\b(?:san francisco|new york|los angeles|chicago|austin)\b",
    ]
    .into_iter()
    .map(compile_regex)
    .collect()
});

const AMOUNT: &str = r"\$\d{1,3}(?:,\d{3})*(?:\.\d{2})?";

static SALARY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"{AMOUNT}\s*-\s*{AMOUNT}"),
        format!(r"(?i){AMOUNT}\s*(?:per year|annually|annual)"),
        format!(r"(?i){AMOUNT}\s*(?:per hour|hourly)"),
    ]
    .iter()
    .map(|p| compile_regex(p))
    .collect()
});

const REQUIREMENT_KEYWORDS: &[&str] = &["requirement", "qualification", "must have", "should have"];
const RESPONSIBILITY_KEYWORDS: &[&str] = &["responsibility", "duty", "role", "will"];
const BENEFIT_KEYWORDS: &[&str] = &["benefit", "perk", "advantage", "offer"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub requirements: Vec<String>,
    pub responsibilities: Vec<String>,
    pub benefits: Vec<String>,
}

pub fn parse_job(text: &str) -> ParsedJob {
    ParsedJob {
        title: extract_title(text),
        company: UNKNOWN_COMPANY.to_string(),
        location: first_match(&LOCATION_PATTERNS, text).unwrap_or_else(|| UNKNOWN_LOCATION.into()),
        salary: first_match(&SALARY_PATTERNS, text).unwrap_or_else(|| UNKNOWN_SALARY.into()),
        requirements: lines_mentioning(text, REQUIREMENT_KEYWORDS),
        responsibilities: lines_mentioning(text, RESPONSIBILITY_KEYWORDS),
        benefits: lines_mentioning(text, BENEFIT_KEYWORDS),
    }
}

/// First non-blank line shorter than 100 characters.
pub fn extract_title(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && line.chars().count() < MAX_TITLE_CHARS)
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

/// The first pattern that matches anywhere wins.
fn first_match(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|p| p.find(text))
        .map(|m| m.as_str().to_string())
}

fn lines_mentioning(text: &str, keywords: &[&str]) -> Vec<String> {
    text.lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .map(|line| line.trim().to_string())
        .collect()
}
