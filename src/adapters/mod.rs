//! Adapters
//!
//! Inbound adapters receive requests (HTTP API), outbound adapters talk
//! to the record store and the host the caskers are deployed on.

pub mod inbound;
pub mod outbound;
