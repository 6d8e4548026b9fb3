//! casker-intake Library
//!
//! Exposes the casker intake components for use in integration tests
//! and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{SubmissionError, SubmissionService};
pub use config::load_config;
pub use domain::entities::{CaskerRecord, IconFile, NewRecord, Submission, SubmissionReceipt};
pub use domain::ports::{Provisioner, RecordStore, ServiceControl};
pub use domain::services::{AllocationError, PortAllocator};
pub use domain::value_objects::{IconPolicy, PortRange};
