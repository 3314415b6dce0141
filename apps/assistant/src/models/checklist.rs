use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistStep {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// A generated hiring checklist. `role` and `created_at` are overwritten by the
/// checklist agent after parsing, so the model may omit them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiringChecklist {
    #[serde(default)]
    pub steps: Vec<ChecklistStep>,
    #[serde(default)]
    pub estimated_timeline: String,
    #[serde(default)]
    pub resources_needed: Vec<String>,
    #[serde(default)]
    pub success_metrics: Vec<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl HiringChecklist {
    pub fn to_markdown(&self) -> String {
        let mut md = format!("# Hiring Process Checklist for {}\n\n", self.role);
        md.push_str(&format!(
            "**Estimated Timeline:** {}\n\n",
            self.estimated_timeline
        ));

        md.push_str("## Process Steps\n");
        for (i, step) in self.steps.iter().enumerate() {
            md.push_str(&format!("{}. **{}** - {}\n", i + 1, step.name, step.description));
            if let Some(timeline) = &step.timeline {
                md.push_str(&format!("   - Timeline: {timeline}\n"));
            }
            if let Some(owner) = &step.owner {
                md.push_str(&format!("   - Owner: {owner}\n"));
            }
            md.push('\n');
        }

        if !self.resources_needed.is_empty() {
            md.push_str("## Resources Needed\n");
            for resource in &self.resources_needed {
                md.push_str(&format!("- {resource}\n"));
            }
            md.push('\n');
        }

        if !self.success_metrics.is_empty() {
            md.push_str("## Success Metrics\n");
            for metric in &self.success_metrics {
                md.push_str(&format!("- {metric}\n"));
            }
        }

        md.push_str(&format!(
            "\n*Generated on {}*",
            self.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ));
        md
    }
}
