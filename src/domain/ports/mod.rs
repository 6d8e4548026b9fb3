mod provisioner;
mod record_store;

pub use provisioner::{ProvisionError, Provisioner, ServiceControl};
pub use record_store::{RecordStore, StoreError};
