mod deployment;
mod port_allocator;

pub use deployment::DeploymentTemplates;
pub use port_allocator::{AllocationError, PortAllocator};
