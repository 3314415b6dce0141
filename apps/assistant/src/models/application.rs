use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const ACTION_SUBMITTED: &str = "submitted";
pub const ACTION_UPDATED: &str = "updated";
pub const ACTION_NOTE_ADDED: &str = "note_added";

/// The known application statuses. Records keep the status as a plain string so
/// files written by other tools with unfamiliar statuses still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    Interviewing,
    Rejected,
    Offered,
    Accepted,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Rejected,
        ApplicationStatus::Offered,
        ApplicationStatus::Accepted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Interviewing => "Interviewing",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Offered => "Offered",
            ApplicationStatus::Accepted => "Accepted",
        }
    }

    /// Days until the next follow-up after moving into this status.
    /// `None` leaves the existing follow-up untouched.
    pub fn followup_days(&self) -> Option<i64> {
        match self {
            ApplicationStatus::Interviewing => Some(3),
            ApplicationStatus::Applied => Some(7),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDateTime,
    pub status: String,
    #[serde(default)]
    pub notes: String,
    pub action: String,
}

/// One tracked job application, as persisted in the applications JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: u64,
    pub user_id: String,
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub job_type: String,
    pub application_date: NaiveDateTime,
    pub status: String,
    pub resume_match: f64,
    pub next_followup: Option<NaiveDateTime>,
    pub salary_range: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Job details supplied when recording a new application. Every field is
/// optional and falls back to a placeholder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPosting {
    pub id: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "type")]
    pub job_type: Option<String>,
    pub salary_range: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(
            "interviewing".parse::<ApplicationStatus>(),
            Ok(ApplicationStatus::Interviewing)
        );
        assert_eq!(" Offered ".parse::<ApplicationStatus>(), Ok(ApplicationStatus::Offered));
        assert!("Ghosted".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_followup_days_per_status() {
        assert_eq!(ApplicationStatus::Interviewing.followup_days(), Some(3));
        assert_eq!(ApplicationStatus::Applied.followup_days(), Some(7));
        assert_eq!(ApplicationStatus::Rejected.followup_days(), None);
        assert_eq!(ApplicationStatus::Accepted.followup_days(), None);
    }

    #[test]
    fn test_application_reads_isoformat_dates_with_microseconds() {
        let json = r#"{
            "id": 1,
            "user_id": "u1",
            "job_id": "job_1",
            "job_title": "Analyst",
            "company": "Acme",
            "location": "Austin, TX",
            "job_type": "Full-time",
            "application_date": "2024-03-01T09:15:30.123456",
            "status": "Withdrawn",
            "resume_match": 0.82,
            "next_followup": null,
            "salary_range": "Not specified",
            "notes": "",
            "history": []
        }"#;
        let app: JobApplication = serde_json::from_str(json).unwrap();
        assert_eq!(app.status, "Withdrawn");
        assert!(app.next_followup.is_none());
        assert_eq!(app.application_date.format("%Y-%m-%d").to_string(), "2024-03-01");
    }
}
