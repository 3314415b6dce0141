pub mod application;
pub mod checklist;
pub mod job_description;
