mod fs_provisioner;
mod memory_record_store;
mod pocketbase_record_store;
mod systemctl_service_control;

pub use fs_provisioner::{FsProvisioner, ProvisionConfig};
pub use memory_record_store::InMemoryRecordStore;
pub use pocketbase_record_store::{PocketBaseConfig, PocketBaseRecordStore};
pub use systemctl_service_control::SystemctlServiceControl;
