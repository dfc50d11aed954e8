//! Terraform provider for Rancher Kubernetes Engine clusters
//!
//! Converts between the flat resource state Terraform exchanges with the
//! provider and the typed cluster configuration in `rke_common`, and serves
//! the `rke_cluster` resource over the plugin protocol.

pub mod logging;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod structure;

pub use provider::RkeProvider;
pub use resources::{ResourceData, ResourceState, StateWriter};
