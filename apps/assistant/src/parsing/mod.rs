//! Heuristic, model-free parsers for job postings and resumes.

pub mod job_parser;
pub mod resume_parser;
