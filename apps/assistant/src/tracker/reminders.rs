//! Follow-up reminders: scans the tracker for due follow-ups and emails the
//! applicant, then pushes the follow-up out a week.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::application::JobApplication;
use crate::tracker::{now, ApplicationTracker, TrackerError};

const RESCHEDULE_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Invalid SMTP settings: {0}")]
    Settings(String),

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Could not build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

fn default_recipient_domain() -> String {
    "example.com".to_string()
}

/// Mail relay credentials, read from a JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    #[serde(default = "default_recipient_domain")]
    pub recipient_domain: String,
}

impl SmtpSettings {
    /// Returns `None` when the settings file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ReminderError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ReminderError::Settings(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ReminderError::Settings(format!("{}: {e}", path.display())))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub fn compose_reminder(app: &JobApplication, recipient_domain: &str) -> ReminderEmail {
    let body = format!(
        "Hello,\n\n\
         This is a reminder to follow up on your job application for {title} at {company}.\n\n\
         Application Details:\n\
         - Position: {title}\n\
         - Company: {company}\n\
         - Applied on: {applied}\n\
         - Current Status: {status}\n\n\
         Suggested follow-up actions:\n\
         1. Send a polite email to the hiring manager\n\
         2. Connect with company employees on LinkedIn\n\
         3. Prepare for a potential interview\n\n\
         Best of luck!\n\n\
         Sincerely,\n\
         Your AI HR Assistant\n",
        title = app.job_title,
        company = app.company,
        applied = app.application_date.format("%Y-%m-%d"),
        status = app.status,
    );

    ReminderEmail {
        to: format!("{}@{}", app.user_id, recipient_domain),
        subject: format!(
            "Follow-up Reminder: {} at {}",
            app.job_title, app.company
        ),
        body,
    }
}

/// Outbound mail. The SMTP relay is the production implementation.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &ReminderEmail) -> Result<(), ReminderError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, ReminderError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_server)?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: settings.from_email.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &ReminderEmail) -> Result<(), ReminderError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;

        self.transport.send(message).await?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReminderReport {
    pub sent: Vec<u64>,
    pub failed: Vec<u64>,
}

pub struct ReminderService {
    mailer: Arc<dyn Mailer>,
    recipient_domain: String,
}

impl ReminderService {
    pub fn new(mailer: Arc<dyn Mailer>, recipient_domain: impl Into<String>) -> Self {
        Self {
            mailer,
            recipient_domain: recipient_domain.into(),
        }
    }

    /// Emails every due follow-up. Successful sends push the follow-up out by a
    /// week; failures are logged and left due for the next pass.
    pub async fn process_due_reminders(
        &self,
        tracker: &mut ApplicationTracker,
    ) -> Result<ReminderReport, ReminderError> {
        self.process_due_reminders_at(tracker, now()).await
    }

    async fn process_due_reminders_at(
        &self,
        tracker: &mut ApplicationTracker,
        now: NaiveDateTime,
    ) -> Result<ReminderReport, ReminderError> {
        let due: Vec<JobApplication> = tracker
            .due_followups(now.date())
            .into_iter()
            .cloned()
            .collect();
        info!("{} follow-up reminder(s) due", due.len());

        let mut report = ReminderReport::default();
        for app in due {
            let email = compose_reminder(&app, &self.recipient_domain);
            match self.mailer.send(&email).await {
                Ok(()) => {
                    info!("Sent reminder to {} for {}", email.to, app.job_title);
                    tracker.reschedule_followup(app.id, now + Duration::days(RESCHEDULE_DAYS))?;
                    report.sent.push(app.id);
                }
                Err(e) => {
                    warn!("Failed to send reminder for application {}: {e}", app.id);
                    report.failed.push(app.id);
                }
            }
        }
        Ok(report)
    }

    /// Runs one pass per day at `at` (local time), forever.
    pub async fn run_daily(&self, applications_path: &Path, at: NaiveTime) {
        info!("Reminder system started. Checking for due reminders daily at {at}.");
        let mut tracker = ApplicationTracker::open(applications_path);
        loop {
            let current = now();
            let next = next_run_after(current, at);
            let wait = (next - current).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            tracker.reload();
            match self.process_due_reminders(&mut tracker).await {
                Ok(report) => info!(
                    "Reminder pass complete: {} sent, {} failed",
                    report.sent.len(),
                    report.failed.len()
                ),
                Err(e) => warn!("Reminder pass aborted: {e}"),
            }
        }
    }
}

/// The next moment at or after `now` whose wall-clock time is `at`, strictly in
/// the future.
pub fn next_run_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::models::application::JobPosting;

    struct RecordingMailer {
        sent: Mutex<Vec<ReminderEmail>>,
        reject_to: Option<String>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &ReminderEmail) -> Result<(), ReminderError> {
            if self.reject_to.as_deref() == Some(email.to.as_str()) {
                return Err(ReminderError::Settings("relay refused".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn at(date: &str, hh: u32) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(hh, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_next_run_is_later_today_or_tomorrow() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(next_run_after(at("2024-02-01", 8), nine), at("2024-02-01", 9));
        assert_eq!(next_run_after(at("2024-02-01", 9), nine), at("2024-02-02", 9));
        assert_eq!(next_run_after(at("2024-02-01", 17), nine), at("2024-02-02", 9));
    }

    #[test]
    fn test_compose_reminder_addresses_user_domain() {
        let dir = TempDir::new().unwrap();
        let mut tracker = ApplicationTracker::open(dir.path().join("a.json"));
        let app = tracker
            .add_application(
                "jdoe",
                &JobPosting {
                    title: Some("Data Analyst".to_string()),
                    company: Some("Globex".to_string()),
                    ..JobPosting::default()
                },
                0.7,
            )
            .unwrap();

        let email = compose_reminder(&app, "example.com");
        assert_eq!(email.to, "jdoe@example.com");
        assert_eq!(email.subject, "Follow-up Reminder: Data Analyst at Globex");
        assert!(email.body.contains("- Current Status: Applied"));
    }

    #[test]
    fn test_missing_settings_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(SmtpSettings::load(&dir.path().join("smtp.json")).unwrap().is_none());
    }

    #[test]
    fn test_settings_default_recipient_domain() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("smtp.json");
        std::fs::write(
            &path,
            r#"{"smtp_server": "smtp.example.com", "smtp_port": 587,
                "username": "bot", "password": "pw", "from_email": "bot@example.com"}"#,
        )
        .unwrap();
        let settings = SmtpSettings::load(&path).unwrap().unwrap();
        assert_eq!(settings.recipient_domain, "example.com");
        assert_eq!(settings.smtp_port, 587);
    }

    #[tokio::test]
    async fn test_due_reminders_are_sent_and_rescheduled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("applications.json");
        let mut tracker = ApplicationTracker::open(&path);
        for user in ["alice", "bob", "carol"] {
            tracker
                .add_application(user, &JobPosting::default(), 0.5)
                .unwrap();
        }
        let now = at("2024-04-10", 9);
        tracker.reschedule_followup(1, at("2024-04-09", 9)).unwrap();
        tracker.reschedule_followup(2, at("2024-04-10", 15)).unwrap();
        tracker.reschedule_followup(3, at("2024-04-12", 9)).unwrap();

        let mailer = Arc::new(RecordingMailer {
            sent: Mutex::new(vec![]),
            reject_to: Some("bob@example.com".to_string()),
        });
        let service = ReminderService::new(mailer.clone(), "example.com");

        let report = service
            .process_due_reminders_at(&mut tracker, now)
            .await
            .unwrap();

        assert_eq!(report.sent, vec![1]);
        assert_eq!(report.failed, vec![2]);
        assert_eq!(mailer.sent.lock().unwrap()[0].to, "alice@example.com");

        let reloaded = ApplicationTracker::open(&path);
        assert_eq!(reloaded.get(1).unwrap().next_followup, Some(at("2024-04-17", 9)));
        assert_eq!(reloaded.get(2).unwrap().next_followup, Some(at("2024-04-10", 15)));
        assert_eq!(reloaded.get(3).unwrap().next_followup, Some(at("2024-04-12", 9)));
    }
}
