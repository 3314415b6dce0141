use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::agents::prompts::{RESUME_ANALYSIS_PROMPT_TEMPLATE, RESUME_ANALYSIS_SYSTEM};
use crate::llm_client::prompts::render;
use crate::llm_client::{LanguageModel, LlmError};

/// Free-text assessment of a resume. `sections` is a best-effort split of the
/// model output on `## ` headings; the output shape is not validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeAnalysis {
    pub raw: String,
    pub sections: Vec<AnalysisSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSection {
    pub heading: String,
    pub body: String,
}

impl ResumeAnalysis {
    pub fn from_text(raw: String) -> Self {
        let sections = split_sections(&raw);
        Self { raw, sections }
    }
}

fn split_sections(text: &str) -> Vec<AnalysisSection> {
    let mut sections: Vec<AnalysisSection> = Vec::new();
    for line in text.lines() {
        if let Some(heading) = line.trim_start().strip_prefix("## ") {
            sections.push(AnalysisSection {
                heading: heading.trim().to_string(),
                body: String::new(),
            });
        } else if let Some(current) = sections.last_mut() {
            if !current.body.is_empty() {
                current.body.push('\n');
            }
            current.body.push_str(line);
        }
    }
    for section in &mut sections {
        section.body = section.body.trim().to_string();
    }
    sections
}

/// Stateless resume assessor.
#[derive(Clone)]
pub struct ResumeAnalyzer {
    llm: Arc<dyn LanguageModel>,
}

impl ResumeAnalyzer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn analyze(&self, resume_text: &str) -> Result<ResumeAnalysis, LlmError> {
        info!("Analyzing resume ({} chars)", resume_text.len());
        let prompt = render(
            RESUME_ANALYSIS_PROMPT_TEMPLATE,
            &[("resume_text", resume_text)],
        );
        let raw = self.llm.complete(&prompt, RESUME_ANALYSIS_SYSTEM).await?;
        Ok(ResumeAnalysis::from_text(raw))
    }
}
