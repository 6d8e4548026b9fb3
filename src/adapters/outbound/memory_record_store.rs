//! In-Memory Record Store
//!
//! Implements RecordStore using DashMap for lock-free concurrent access.
//! Used for local runs without a PocketBase instance and in tests.

use crate::domain::entities::{CaskerRecord, NewRecord};
use crate::domain::ports::{RecordStore, StoreError};
use crate::domain::value_objects::{SortDirection, SortSpec};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// DashMap-backed record store.
///
/// Records live for the lifetime of the process.
pub struct InMemoryRecordStore {
    records: Arc<DashMap<String, CaskerRecord>>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
        }
    }

    /// Create a store pre-populated with records.
    pub fn with_records(records: Vec<CaskerRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.records.insert(record.id.clone(), record);
        }
        store
    }

    /// Get the number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// PocketBase-style 15 character id.
    fn new_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()[..15].to_string()
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_all(&self, sort: &SortSpec) -> Result<Vec<CaskerRecord>, StoreError> {
        let mut records: Vec<CaskerRecord> =
            self.records.iter().map(|entry| entry.value().clone()).collect();

        if sort.field == "port" {
            records.sort_by_key(|r| r.port);
        } else {
            records.sort_by(|a, b| a.id.cmp(&b.id));
        }
        if sort.direction == SortDirection::Descending {
            records.reverse();
        }

        Ok(records)
    }

    async fn create(&self, record: NewRecord) -> Result<CaskerRecord, StoreError> {
        let stored = CaskerRecord {
            id: Self::new_id(),
            name: record.name,
            email: record.email,
            port: record.port,
            active: record.active,
            icon: record.icons.into_iter().map(|i| i.file_name).collect(),
        };

        self.records.insert(stored.id.clone(), stored.clone());
        tracing::debug!("stored record {} in memory (port {})", stored.id, stored.port);

        Ok(stored)
    }
}
