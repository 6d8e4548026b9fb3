//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the casker domain.
//! They have no external dependencies beyond serialization.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A casker record as stored in the remote collection.
///
/// Each record represents one submitted casker and the port it was
/// assigned. Only `port` matters to the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaskerRecord {
    /// Identifier assigned by the record store
    pub id: String,
    /// Casker name, also the path segment of its public URL
    pub name: String,
    /// Contact email of the submitter
    pub email: String,
    /// Assigned port
    pub port: u16,
    /// Whether the casker is active
    pub active: bool,
    /// Stored icon file names
    #[serde(default)]
    pub icon: Vec<String>,
}

/// An uploaded icon file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl IconFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }
}

/// Fields collected from the submission form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub icons: Vec<IconFile>,
}

impl Submission {
    pub fn new(name: impl Into<String>, email: impl Into<String>, icons: Vec<IconFile>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            icons,
        }
    }

    /// Check the fields the form itself requires.
    ///
    /// Returns a user-facing reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        if self.email.trim().is_empty() {
            return Err("email is required".to_string());
        }
        if self.icons.is_empty() {
            return Err("at least one icon file is required".to_string());
        }
        Ok(())
    }
}

/// Fields sent to the record store when creating a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub name: String,
    pub email: String,
    pub active: bool,
    pub port: u16,
    pub icons: Vec<IconFile>,
}

impl NewRecord {
    /// New records are always created active.
    pub fn new(name: &str, email: &str, port: u16, icons: Vec<IconFile>) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            active: true,
            port,
            icons,
        }
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    /// Port assigned to every record of the submission
    pub port: u16,
    /// Ids of the created records, in creation order
    pub record_ids: Vec<String>,
    /// Per-user public URL
    pub url: String,
}
