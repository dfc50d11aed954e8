//! Role-based host groups
//!
//! The engine addresses nodes through four groups derived from the node list.
//! Groups are recomputed from the nodes every time they are needed.

use crate::config::{RkeConfigNode, CONTROL_ROLE, ETCD_ROLE, WORKER_ROLE};

/// A node as seen by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Host {
    pub config: RkeConfigNode,
}

impl Host {
    pub fn node_name(&self) -> &str {
        &self.config.node_name
    }

    pub fn address(&self) -> &str {
        &self.config.address
    }
}

impl From<&RkeConfigNode> for Host {
    fn from(node: &RkeConfigNode) -> Self {
        Self {
            config: node.clone(),
        }
    }
}

/// Nodes partitioned by role, each group in node list order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostGroups {
    pub etcd: Vec<Host>,
    pub control_plane: Vec<Host>,
    pub worker: Vec<Host>,
    /// Nodes carrying none of the etcd, controlplane or worker roles
    pub inactive: Vec<Host>,
}

impl HostGroups {
    /// Classify nodes by their role tags. Roles are independent, so a node can
    /// land in several groups; unknown role names are ignored.
    pub fn classify(nodes: &[RkeConfigNode]) -> Self {
        let mut groups = Self::default();

        for node in nodes {
            let mut active = false;
            if node.has_role(ETCD_ROLE) {
                groups.etcd.push(Host::from(node));
                active = true;
            }
            if node.has_role(CONTROL_ROLE) {
                groups.control_plane.push(Host::from(node));
                active = true;
            }
            if node.has_role(WORKER_ROLE) {
                groups.worker.push(Host::from(node));
                active = true;
            }
            if !active {
                groups.inactive.push(Host::from(node));
            }
        }

        tracing::debug!(
            etcd = groups.etcd.len(),
            control_plane = groups.control_plane.len(),
            worker = groups.worker.len(),
            inactive = groups.inactive.len(),
            "Classified hosts"
        );

        groups
    }
}
