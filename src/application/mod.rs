//! Application Layer
//!
//! Use cases that orchestrate domain services through ports.

mod submission_service;

pub use submission_service::{SubmissionError, SubmissionService};
