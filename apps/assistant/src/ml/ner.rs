//! Named-entity recognition. Entities come from the language model; skills
//! come from fixed patterns and need no model at all.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm_client::prompts::{json_system, render};
use crate::llm_client::{LanguageModel, LlmError};
use crate::ml::compile_regex;

const NER_SYSTEM: &str = "You are a named-entity recognizer for recruiting documents.";

const NER_PROMPT_TEMPLATE: &str = r#"Extract the named entities from the text below.
Use these labels: PERSON, ORG, GPE, DATE, MONEY, PRODUCT, WORK_OF_ART, NORP.
Copy each entity's text exactly as it appears.

Text:
"""
{text}
"""

Return a JSON object with this EXACT schema:
{"entities": [{"text": "Acme Corp", "label": "ORG"}]}"#;

static SKILL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:python|java|javascript|typescript|react|angular|vue)\b",
        r"(?i)\b(?:machine learning|deep learning|ai|nlp|computer vision)\b",
        r"(?i)\b(?:aws|azure|gcp|docker|kubernetes|terraform)\b",
        r"(?i)\b(?:sql|mysql|postgresql|mongodb|redis)\b",
    ]
    .into_iter()
    .map(compile_regex)
    .collect()
});

/// An entity span. `start` and `end` are character offsets into the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Deserialize)]
struct EntityList {
    #[serde(default)]
    entities: Vec<LabeledText>,
}

#[derive(Debug, Deserialize)]
struct LabeledText {
    text: String,
    label: String,
}

#[derive(Clone)]
pub struct NerModel {
    llm: Arc<dyn LanguageModel>,
}

impl NerModel {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Entities in order of appearance. Entities the model reports that do not
    /// occur verbatim in `text` are dropped; repeated mentions are located in turn.
    pub async fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, LlmError> {
        let prompt = render(NER_PROMPT_TEMPLATE, &[("text", text)]);
        let list: EntityList = self
            .llm
            .call_json(&prompt, &json_system(NER_SYSTEM))
            .await?;

        let mut entities = Vec::new();
        let mut search_from: HashMap<String, usize> = HashMap::new();
        for candidate in list.entities {
            if candidate.text.is_empty() {
                continue;
            }
            let from = search_from.get(&candidate.text).copied().unwrap_or(0);
            let Some(offset) = text[from..].find(&candidate.text) else {
                debug!("Dropping entity not found in text: {}", candidate.text);
                continue;
            };
            let byte_start = from + offset;
            let byte_end = byte_start + candidate.text.len();
            search_from.insert(candidate.text.clone(), byte_end);

            let start = text[..byte_start].chars().count();
            entities.push(Entity {
                start,
                end: start + candidate.text.chars().count(),
                text: candidate.text,
                label: candidate.label,
            });
        }
        entities.sort_by_key(|e| e.start);
        Ok(entities)
    }
}

/// Skills matched by the fixed patterns, lowercased and deduplicated in order
/// of first appearance.
pub fn extract_skills(text: &str) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for pattern in SKILL_PATTERNS.iter() {
        for found in pattern.find_iter(text) {
            let skill = found.as_str().to_lowercase();
            if !skills.contains(&skill) {
                skills.push(skill);
            }
        }
    }
    skills
}
