use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::models::application::JobApplication;

const RECENT_ACTIVITY_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Mean resume match as a percentage, one decimal. Zero scores are ignored.
    pub avg_match_score: f64,
    /// Applications submitted in the last 30 days.
    pub recent_activity: usize,
}

pub fn compute_stats(applications: &[&JobApplication], now: NaiveDateTime) -> ApplicationStats {
    let mut by_status = BTreeMap::new();
    for app in applications {
        *by_status.entry(app.status.clone()).or_insert(0) += 1;
    }

    let scores: Vec<f64> = applications
        .iter()
        .map(|a| a.resume_match)
        .filter(|score| *score != 0.0)
        .collect();
    let avg = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    let cutoff = now - Duration::days(RECENT_ACTIVITY_DAYS);
    let recent_activity = applications
        .iter()
        .filter(|a| a.application_date >= cutoff)
        .count();

    ApplicationStats {
        total: applications.len(),
        by_status,
        avg_match_score: round_one_decimal(avg * 100.0),
        recent_activity,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
