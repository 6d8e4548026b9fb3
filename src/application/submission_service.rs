//! Submission Service - Main application use case
//!
//! Orchestrates a casker submission: reading the existing records,
//! allocating a port, creating records and provisioning them.
//! This is the primary interface for the inbound adapter.

use crate::domain::entities::{CaskerRecord, IconFile, NewRecord, Submission, SubmissionReceipt};
use crate::domain::ports::{ProvisionError, Provisioner, RecordStore, StoreError};
use crate::domain::services::{AllocationError, DeploymentTemplates, PortAllocator};
use crate::domain::value_objects::{IconPolicy, PortRange, SortSpec};
use std::sync::Arc;

/// Submission service - main application use case.
///
/// This service orchestrates one submission:
/// 1. Validates the form fields
/// 2. Fetches every existing record and allocates the first free port
/// 3. Creates the record(s) according to the icon policy
/// 4. Provisions each created record when a provisioner is configured
///
/// Nothing is reserved between steps 2 and 3. Two submissions that read
/// the same snapshot are given the same port.
pub struct SubmissionService {
    store: Arc<dyn RecordStore>,
    provisioner: Option<Arc<dyn Provisioner>>,
    port_range: PortRange,
    icon_policy: IconPolicy,
    public_base_url: String,
}

impl SubmissionService {
    /// Create a new submission service.
    pub fn new(
        store: Arc<dyn RecordStore>,
        provisioner: Option<Arc<dyn Provisioner>>,
        port_range: PortRange,
        icon_policy: IconPolicy,
        public_base_url: String,
    ) -> Self {
        Self {
            store,
            provisioner,
            port_range,
            icon_policy,
            public_base_url,
        }
    }

    /// Compute the port the next submission would get.
    ///
    /// Reads the full record set on every call; nothing is cached or reserved.
    pub async fn next_port(&self) -> Result<u16, SubmissionError> {
        let records = self
            .store
            .fetch_all(&SortSpec::by_port_desc())
            .await
            .map_err(SubmissionError::Fetch)?;

        let port = PortAllocator::allocate(&self.port_range, &records)?;

        tracing::debug!(
            "allocated port {} from {} existing records (range {})",
            port,
            records.len(),
            self.port_range
        );

        Ok(port)
    }

    /// Handle one submission end to end.
    ///
    /// Records are created sequentially. The first failed create stops
    /// the submission; records created before it are kept and reported
    /// in the error.
    pub async fn submit(&self, submission: Submission) -> Result<SubmissionReceipt, SubmissionError> {
        if let Err(reason) = submission.validate() {
            tracing::warn!("rejected submission: {}", reason);
            return Err(SubmissionError::Invalid(reason));
        }

        let name = submission.name.trim().to_string();

        // The name ends up in paths, unit names and nginx config.
        if self.provisioner.is_some() && !DeploymentTemplates::is_safe_name(&name) {
            let reason = format!(
                "name may only contain letters, digits, '-' and '_' (at most {} characters)",
                DeploymentTemplates::MAX_NAME_LEN
            );
            tracing::warn!("rejected submission {:?}: {}", name, reason);
            return Err(SubmissionError::Invalid(reason));
        }

        let port = match self.next_port().await {
            Ok(port) => port,
            Err(e) => {
                tracing::error!("submission for {} aborted: {}", name, e);
                return Err(e);
            }
        };

        let mut created: Vec<(CaskerRecord, Option<IconFile>)> = Vec::new();

        for record in self.build_records(&submission, port) {
            let icon = record.icons.first().cloned();
            match self.store.create(record).await {
                Ok(stored) => {
                    tracing::debug!("created record {} for {} on port {}", stored.id, name, port);
                    created.push((stored, icon));
                }
                Err(e) => {
                    tracing::error!(
                        "creating record for {} failed after {} succeeded: {}",
                        name,
                        created.len(),
                        e
                    );
                    return Err(SubmissionError::Create {
                        created: created.into_iter().map(|(r, _)| r.id).collect(),
                        source: e,
                    });
                }
            }
        }

        if let Some(provisioner) = &self.provisioner {
            for (record, icon) in &created {
                if let Err(e) = provisioner.provision(record, icon.as_ref()).await {
                    tracing::error!("provisioning {} failed: {}", record.name, e);
                    return Err(SubmissionError::Provision {
                        name: record.name.clone(),
                        source: e,
                    });
                }
            }
        }

        let receipt = SubmissionReceipt {
            port,
            record_ids: created.into_iter().map(|(r, _)| r.id).collect(),
            url: self.public_url(&name),
        };

        tracing::info!(
            "casker {} submitted on port {} ({} records)",
            name,
            port,
            receipt.record_ids.len()
        );

        Ok(receipt)
    }

    /// Per-user URL for a casker name.
    ///
    /// The name is appended as one percent-encoded path segment.
    pub fn public_url(&self, name: &str) -> String {
        match reqwest::Url::parse(&self.public_base_url) {
            Ok(mut url) => {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().push(name);
                }
                url.to_string()
            }
            Err(e) => {
                tracing::warn!("invalid public base URL {}: {}", self.public_base_url, e);
                format!("{}/{}", self.public_base_url.trim_end_matches('/'), name)
            }
        }
    }

    /// Get the configured allocation range.
    pub fn port_range(&self) -> &PortRange {
        &self.port_range
    }

    /// Get the configured icon policy.
    pub fn icon_policy(&self) -> IconPolicy {
        self.icon_policy
    }

    fn build_records(&self, submission: &Submission, port: u16) -> Vec<NewRecord> {
        let name = submission.name.trim();
        let email = submission.email.trim();

        match self.icon_policy {
            IconPolicy::RecordPerFile => submission
                .icons
                .iter()
                .map(|icon| NewRecord::new(name, email, port, vec![icon.clone()]))
                .collect(),
            IconPolicy::SingleRecord => {
                vec![NewRecord::new(name, email, port, submission.icons.clone())]
            }
        }
    }
}

/// Failures of the submission flow.
///
/// Every variant is turned into one user-visible message at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("invalid submission: {0}")]
    Invalid(String),
    #[error("failed to fetch existing records: {0}")]
    Fetch(#[source] StoreError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("failed to create record: {source}")]
    Create {
        /// Ids of records created before the failure; they are not rolled back
        created: Vec<String>,
        #[source]
        source: StoreError,
    },
    #[error("failed to provision casker {name}: {source}")]
    Provision {
        name: String,
        #[source]
        source: ProvisionError,
    },
}

impl SubmissionError {
    /// Single notification shown to the submitter.
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(reason) => format!("Submission rejected: {}.", reason),
            Self::Fetch(_) => {
                "Could not reach the record store, please try again later.".to_string()
            }
            Self::Allocation(_) => "No free port is left for new caskers.".to_string(),
            Self::Create { created, .. } if created.is_empty() => {
                "Could not save your submission, please try again later.".to_string()
            }
            Self::Create { created, .. } => format!(
                "Your submission was only partially saved ({} record(s) created).",
                created.len()
            ),
            Self::Provision { name, .. } => {
                format!("Casker {} was saved but could not be deployed.", name)
            }
        }
    }
}
