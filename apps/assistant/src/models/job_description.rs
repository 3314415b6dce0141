use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated job description. The model fills every field except
/// `created_at`, which is stamped at parse time when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescription {
    pub title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, alias = "type")]
    pub job_type: String,
    #[serde(default)]
    pub salary_range: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub preferred_qualifications: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub application_process: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl JobDescription {
    pub fn to_markdown(&self) -> String {
        let mut md = format!("# {}\n\n", self.title);
        md.push_str(&format!(
            "**Department:** {} | **Location:** {} | **Type:** {}\n\n",
            self.department, self.location, self.job_type
        ));
        md.push_str(&format!("**Salary Range:** {}\n\n", self.salary_range));

        md.push_str("## Job Summary\n");
        md.push_str(&format!("{}\n\n", self.summary));

        push_list(&mut md, "Key Responsibilities", &self.responsibilities);
        push_list(&mut md, "Requirements", &self.requirements);
        // Optional sections are omitted entirely when empty
        if !self.preferred_qualifications.is_empty() {
            push_list(&mut md, "Preferred Qualifications", &self.preferred_qualifications);
        }
        if !self.benefits.is_empty() {
            push_list(&mut md, "Benefits", &self.benefits);
        }

        md.push_str("## Application Process\n");
        md.push_str(&format!("{}\n", self.application_process));
        md
    }
}

fn push_list(md: &mut String, heading: &str, items: &[String]) {
    md.push_str(&format!("## {heading}\n"));
    for item in items {
        md.push_str(&format!("- {item}\n"));
    }
    md.push('\n');
}
