//! Record Store Port
//!
//! Defines the interface for the remote collection that holds caskers.
//! Implementations may talk to PocketBase or keep records in memory.

use crate::domain::entities::{CaskerRecord, NewRecord};
use crate::domain::value_objects::SortSpec;
use async_trait::async_trait;

/// Remote collection of casker records.
///
/// This is an outbound port that abstracts the backend-as-a-service
/// holding the records. The application layer reads the full record set
/// before allocating a port and writes one record per create call.
/// No lock is held between a read and a later write.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every record in the collection.
    ///
    /// The sort is a request to the store; callers must not rely on it.
    async fn fetch_all(&self, sort: &SortSpec) -> Result<Vec<CaskerRecord>, StoreError>;

    /// Create a record and return it as stored.
    async fn create(&self, record: NewRecord) -> Result<CaskerRecord, StoreError>;
}

/// Failures reported by a record store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    /// The store answered with an error status
    #[error("record store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// The store answered with a body we could not decode
    #[error("invalid response from record store: {0}")]
    InvalidResponse(String),
}
