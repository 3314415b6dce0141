//! Application tracker: CRUD over a single JSON array file.
//!
//! The file is read once when the tracker is opened. Every mutation rewrites
//! the whole file through a temp file in the same directory, then renames it
//! into place. Callers sharing a tracker across tasks wrap it in a mutex.

pub mod reminders;
pub mod stats;

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::application::{
    ApplicationStatus, HistoryEntry, JobApplication, JobPosting, ACTION_NOTE_ADDED,
    ACTION_SUBMITTED,
};

pub use stats::ApplicationStats;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Application {0} not found")]
    NotFound(u64),

    #[error("Unknown application status: {0}")]
    UnknownStatus(String),
}

/// An application whose follow-up falls inside the requested window.
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingFollowup {
    #[serde(flatten)]
    pub application: JobApplication,
    pub days_until_followup: i64,
    pub followup_date: NaiveDate,
}

pub struct ApplicationTracker {
    path: PathBuf,
    applications: Vec<JobApplication>,
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl ApplicationTracker {
    /// Opens the tracker at `path`. A missing or unreadable file yields an
    /// empty tracker. Malformed content is copied aside to `<name>.bak`; the
    /// file itself is not written until the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let applications = load_applications(&path);
        info!(
            "Loaded {} application(s) from {}",
            applications.len(),
            path.display()
        );
        Self { path, applications }
    }

    #[cfg(test)]
    pub fn applications(&self) -> &[JobApplication] {
        &self.applications
    }

    /// Re-reads the backing file, discarding in-memory state.
    pub fn reload(&mut self) {
        self.applications = load_applications(&self.path);
    }

    fn save(&self) -> Result<(), TrackerError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.applications)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Records a new application. The id is the current count + 1, or one past
    /// the highest loaded id when records were skipped on load.
    pub fn add_application(
        &mut self,
        user_id: &str,
        posting: &JobPosting,
        resume_match: f64,
    ) -> Result<JobApplication, TrackerError> {
        self.add_application_at(user_id, posting, resume_match, now())
    }

    fn add_application_at(
        &mut self,
        user_id: &str,
        posting: &JobPosting,
        resume_match: f64,
        now: NaiveDateTime,
    ) -> Result<JobApplication, TrackerError> {
        let highest = self.applications.iter().map(|a| a.id).max().unwrap_or(0);
        let id = highest.max(self.applications.len() as u64) + 1;
        let status = ApplicationStatus::Applied;
        let or = |value: &Option<String>, fallback: &str| {
            value.clone().unwrap_or_else(|| fallback.to_string())
        };

        let application = JobApplication {
            id,
            user_id: user_id.to_string(),
            job_id: posting.id.clone().unwrap_or_else(|| format!("job_{id}")),
            job_title: or(&posting.title, "Unknown Position"),
            company: or(&posting.company, "Unknown Company"),
            location: or(&posting.location, "Not specified"),
            job_type: or(&posting.job_type, "Full-time"),
            application_date: now,
            status: status.to_string(),
            resume_match,
            next_followup: status.followup_days().map(|d| now + Duration::days(d)),
            salary_range: or(&posting.salary_range, "Not specified"),
            notes: String::new(),
            history: vec![HistoryEntry {
                date: now,
                status: status.to_string(),
                notes: "Application submitted".to_string(),
                action: ACTION_SUBMITTED.to_string(),
            }],
        };

        self.applications.push(application.clone());
        self.save()?;
        info!("Recorded application {} for user {}", id, user_id);
        Ok(application)
    }

    pub fn get(&self, id: u64) -> Option<&JobApplication> {
        self.applications.iter().find(|a| a.id == id)
    }

    pub fn user_applications(&self, user_id: &str) -> Vec<&JobApplication> {
        self.applications
            .iter()
            .filter(|a| a.user_id == user_id)
            .collect()
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut JobApplication, TrackerError> {
        self.applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(TrackerError::NotFound(id))
    }

    /// Sets the status, appends a history entry and reschedules the follow-up
    /// for statuses that carry one. Repeated updates are not deduplicated.
    pub fn update_status(
        &mut self,
        id: u64,
        status: ApplicationStatus,
        notes: &str,
        action: &str,
    ) -> Result<JobApplication, TrackerError> {
        self.update_status_at(id, status, notes, action, now())
    }

    fn update_status_at(
        &mut self,
        id: u64,
        status: ApplicationStatus,
        notes: &str,
        action: &str,
        now: NaiveDateTime,
    ) -> Result<JobApplication, TrackerError> {
        let app = self.get_mut(id)?;
        app.status = status.to_string();
        if !notes.is_empty() {
            app.notes = notes.to_string();
        }
        app.history.push(HistoryEntry {
            date: now,
            status: status.to_string(),
            notes: notes.to_string(),
            action: action.to_string(),
        });
        if let Some(days) = status.followup_days() {
            app.next_followup = Some(now + Duration::days(days));
        }

        let updated = app.clone();
        self.save()?;
        Ok(updated)
    }

    pub fn add_note(&mut self, id: u64, note: &str) -> Result<JobApplication, TrackerError> {
        let now = now();
        let app = self.get_mut(id)?;
        app.notes = note.to_string();
        let status = app.status.clone();
        app.history.push(HistoryEntry {
            date: now,
            status,
            notes: note.to_string(),
            action: ACTION_NOTE_ADDED.to_string(),
        });

        let updated = app.clone();
        self.save()?;
        Ok(updated)
    }

    /// Moves the follow-up date without touching status or history.
    pub fn reschedule_followup(
        &mut self,
        id: u64,
        when: NaiveDateTime,
    ) -> Result<(), TrackerError> {
        self.get_mut(id)?.next_followup = Some(when);
        self.save()
    }

    pub fn upcoming_followups(&self, user_id: &str, days_ahead: i64) -> Vec<UpcomingFollowup> {
        self.upcoming_followups_on(user_id, days_ahead, now().date())
    }

    fn upcoming_followups_on(
        &self,
        user_id: &str,
        days_ahead: i64,
        today: NaiveDate,
    ) -> Vec<UpcomingFollowup> {
        let mut upcoming: Vec<UpcomingFollowup> = self
            .user_applications(user_id)
            .into_iter()
            .filter_map(|app| {
                let followup_date = app.next_followup?.date();
                let days_until = (followup_date - today).num_days();
                (0..=days_ahead)
                    .contains(&days_until)
                    .then(|| UpcomingFollowup {
                        application: app.clone(),
                        days_until_followup: days_until,
                        followup_date,
                    })
            })
            .collect();

        upcoming.sort_by_key(|u| u.days_until_followup);
        upcoming
    }

    /// Applications across all users whose follow-up is on or before `today`.
    pub fn due_followups(&self, today: NaiveDate) -> Vec<&JobApplication> {
        self.applications
            .iter()
            .filter(|a| a.next_followup.is_some_and(|f| f.date() <= today))
            .collect()
    }

    pub fn applications_by_status(&self, user_id: &str) -> BTreeMap<String, Vec<JobApplication>> {
        let mut groups: BTreeMap<String, Vec<JobApplication>> = BTreeMap::new();
        for app in self.user_applications(user_id) {
            groups
                .entry(app.status.clone())
                .or_default()
                .push(app.clone());
        }
        groups
    }

    pub fn stats(&self, user_id: &str) -> ApplicationStats {
        stats::compute_stats(&self.user_applications(user_id), now())
    }
}

/// Reads the applications file record by record. Records that do not
/// deserialize are logged and skipped. When anything was dropped, the file is
/// copied to `<name>.bak` first so the next save cannot destroy it.
fn load_applications(path: &Path) -> Vec<JobApplication> {
    if !path.exists() {
        return Vec::new();
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Could not read {}: {e}; starting empty", path.display());
            return Vec::new();
        }
    };

    let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(
                "Malformed applications file {}: {e}; starting empty",
                path.display()
            );
            backup_file(path);
            return Vec::new();
        }
    };

    let total = records.len();
    let applications: Vec<JobApplication> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(application) => Some(application),
            Err(e) => {
                warn!(
                    "Skipping application record {index} in {}: {e}",
                    path.display()
                );
                None
            }
        })
        .collect();

    if applications.len() < total {
        backup_file(path);
    }
    applications
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

fn backup_file(path: &Path) {
    let backup = backup_path(path);
    match fs::copy(path, &backup) {
        Ok(_) => warn!("Kept a copy of {} at {}", path.display(), backup.display()),
        Err(e) => warn!("Could not back up {}: {e}", path.display()),
    }
}
