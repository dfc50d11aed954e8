//! The cluster aggregate handed to and returned by the provisioning engine

use crate::config::RancherKubernetesEngineConfig;
use crate::hosts::HostGroups;
use crate::pki::CertificatePki;
use std::collections::BTreeMap;

/// Name the engine gives a cluster when none is configured
pub const DEFAULT_CLUSTER_NAME: &str = "local";

/// A cluster: its configuration, issued certificates and cluster-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cluster {
    pub config: RancherKubernetesEngineConfig,
    /// Certificate bundles keyed by logical certificate id
    pub certificates: BTreeMap<String, CertificatePki>,
    pub cluster_domain: String,
    pub cluster_cidr: String,
    pub cluster_dns_server: String,
}

impl Cluster {
    /// Build a cluster from its configuration. Cluster-wide settings are taken
    /// from the kubelet and controller services.
    pub fn new(config: RancherKubernetesEngineConfig) -> Self {
        let cluster_domain = config.services.kubelet.cluster_domain.clone();
        let cluster_dns_server = config.services.kubelet.cluster_dns_server.clone();
        let cluster_cidr = config.services.kube_controller.cluster_cidr.clone();

        Self {
            config,
            certificates: BTreeMap::new(),
            cluster_domain,
            cluster_cidr,
            cluster_dns_server,
        }
    }

    pub fn name(&self) -> &str {
        if self.config.cluster_name.is_empty() {
            DEFAULT_CLUSTER_NAME
        } else {
            &self.config.cluster_name
        }
    }

    /// Host groups derived from the current node list
    pub fn host_groups(&self) -> HostGroups {
        HostGroups::classify(&self.config.nodes)
    }
}
