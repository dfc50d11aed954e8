//! RKE cluster configuration types
//!
//! Mirrors the `cluster.yml` consumed by the provisioning engine. Field names
//! on the serde side follow the engine's YAML keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node role: runs an etcd member
pub const ETCD_ROLE: &str = "etcd";
/// Node role: runs the kubernetes control plane
pub const CONTROL_ROLE: &str = "controlplane";
/// Node role: runs workloads
pub const WORKER_ROLE: &str = "worker";

/// A single cluster node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RkeConfigNode {
    pub node_name: String,
    pub address: String,
    pub port: String, // decimal, kept as text like the engine does
    pub internal_address: String,
    pub role: Vec<String>,
    pub hostname_override: String,
    pub user: String,
    pub docker_socket: String,
    pub ssh_agent_auth: bool,
    pub ssh_key: String,
    pub ssh_key_path: String,
    pub labels: BTreeMap<String, String>,
}

impl RkeConfigNode {
    pub fn has_role(&self, role: &str) -> bool {
        self.role.iter().any(|r| r == role)
    }
}

/// Fields shared by every kubernetes service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseService {
    pub image: String,
    pub extra_args: BTreeMap<String, String>,
    pub extra_binds: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtcdService {
    #[serde(flatten)]
    pub base: BaseService,
    pub external_urls: Vec<String>,
    pub ca_cert: String,
    pub cert: String,
    pub key: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeApiService {
    #[serde(flatten)]
    pub base: BaseService,
    pub service_cluster_ip_range: String,
    pub pod_security_policy: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeControllerService {
    #[serde(flatten)]
    pub base: BaseService,
    pub cluster_cidr: String,
    pub service_cluster_ip_range: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerService {
    #[serde(flatten)]
    pub base: BaseService,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeletService {
    #[serde(flatten)]
    pub base: BaseService,
    pub cluster_domain: String,
    pub infra_container_image: String,
    pub cluster_dns_server: String,
    pub fail_swap_on: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeproxyService {
    #[serde(flatten)]
    pub base: BaseService,
}

/// The kubernetes services deployed on the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RkeConfigServices {
    pub etcd: EtcdService,
    pub kube_api: KubeApiService,
    pub kube_controller: KubeControllerService,
    pub scheduler: SchedulerService,
    pub kubelet: KubeletService,
    pub kubeproxy: KubeproxyService,
}

/// Network plugin configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub plugin: String,
    pub options: BTreeMap<String, String>,
}

/// Authentication strategy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthnConfig {
    pub strategy: String,
    pub options: BTreeMap<String, String>,
    pub sans: Vec<String>,
}

/// Authorization mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    pub mode: String,
    pub options: BTreeMap<String, String>,
}

/// Image overrides for every system component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RkeSystemImages {
    pub etcd: String,
    pub alpine: String,
    pub nginx_proxy: String,
    pub cert_downloader: String,
    pub kubernetes_services_sidecar: String,
    pub kube_dns: String,
    pub dnsmasq: String,
    pub kube_dns_sidecar: String,
    pub kube_dns_autoscaler: String,
    pub kubernetes: String,
    pub flannel: String,
    pub flannel_cni: String,
    pub calico_node: String,
    pub calico_cni: String,
    pub calico_controllers: String,
    pub calico_ctl: String,
    pub canal_node: String,
    pub canal_cni: String,
    pub canal_flannel: String,
    pub weave_node: String,
    pub weave_cni: String,
    pub pod_infra_container: String,
    pub ingress: String,
    pub ingress_backend: String,
    pub dashboard: String,
    pub heapster: String,
    pub grafana: String,
    pub influxdb: String,
    pub tiller: String,
}

impl RkeSystemImages {
    /// Every image slot, keyed by its configuration name
    pub fn slots(&self) -> [(&'static str, &String); 29] {
        [
            ("etcd", &self.etcd),
            ("alpine", &self.alpine),
            ("nginx_proxy", &self.nginx_proxy),
            ("cert_downloader", &self.cert_downloader),
            ("kubernetes_services_sidecar", &self.kubernetes_services_sidecar),
            ("kube_dns", &self.kube_dns),
            ("dnsmasq", &self.dnsmasq),
            ("kube_dns_sidecar", &self.kube_dns_sidecar),
            ("kube_dns_autoscaler", &self.kube_dns_autoscaler),
            ("kubernetes", &self.kubernetes),
            ("flannel", &self.flannel),
            ("flannel_cni", &self.flannel_cni),
            ("calico_node", &self.calico_node),
            ("calico_cni", &self.calico_cni),
            ("calico_controllers", &self.calico_controllers),
            ("calico_ctl", &self.calico_ctl),
            ("canal_node", &self.canal_node),
            ("canal_cni", &self.canal_cni),
            ("canal_flannel", &self.canal_flannel),
            ("weave_node", &self.weave_node),
            ("weave_cni", &self.weave_cni),
            ("pod_infra_container", &self.pod_infra_container),
            ("ingress", &self.ingress),
            ("ingress_backend", &self.ingress_backend),
            ("dashboard", &self.dashboard),
            ("heapster", &self.heapster),
            ("grafana", &self.grafana),
            ("influxdb", &self.influxdb),
            ("tiller", &self.tiller),
        ]
    }

    /// Mutable access to an image slot by configuration name
    pub fn slot_mut(&mut self, name: &str) -> Option<&mut String> {
        let slot = match name {
            "etcd" => &mut self.etcd,
            "alpine" => &mut self.alpine,
            "nginx_proxy" => &mut self.nginx_proxy,
            "cert_downloader" => &mut self.cert_downloader,
            "kubernetes_services_sidecar" => &mut self.kubernetes_services_sidecar,
            "kube_dns" => &mut self.kube_dns,
            "dnsmasq" => &mut self.dnsmasq,
            "kube_dns_sidecar" => &mut self.kube_dns_sidecar,
            "kube_dns_autoscaler" => &mut self.kube_dns_autoscaler,
            "kubernetes" => &mut self.kubernetes,
            "flannel" => &mut self.flannel,
            "flannel_cni" => &mut self.flannel_cni,
            "calico_node" => &mut self.calico_node,
            "calico_cni" => &mut self.calico_cni,
            "calico_controllers" => &mut self.calico_controllers,
            "calico_ctl" => &mut self.calico_ctl,
            "canal_node" => &mut self.canal_node,
            "canal_cni" => &mut self.canal_cni,
            "canal_flannel" => &mut self.canal_flannel,
            "weave_node" => &mut self.weave_node,
            "weave_cni" => &mut self.weave_cni,
            "pod_infra_container" => &mut self.pod_infra_container,
            "ingress" => &mut self.ingress,
            "ingress_backend" => &mut self.ingress_backend,
            "dashboard" => &mut self.dashboard,
            "heapster" => &mut self.heapster,
            "grafana" => &mut self.grafana,
            "influxdb" => &mut self.influxdb,
            "tiller" => &mut self.tiller,
            _ => return None,
        };
        Some(slot)
    }
}

/// Credentials for a private image registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateRegistry {
    pub url: String,
    pub user: String,
    pub password: String,
}

/// Ingress controller configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    pub provider: String,
    pub options: BTreeMap<String, String>,
    pub node_selector: BTreeMap<String, String>,
}

/// Cloud provider integration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudProvider {
    pub name: String,
    pub cloud_config: BTreeMap<String, String>,
}

/// Complete cluster configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RancherKubernetesEngineConfig {
    pub nodes: Vec<RkeConfigNode>,
    pub services: RkeConfigServices,
    pub network: NetworkConfig,
    pub authentication: AuthnConfig,
    pub addons: String,
    pub addons_include: Vec<String>,
    pub system_images: RkeSystemImages,
    pub ssh_key_path: String,
    pub ssh_agent_auth: bool,
    pub authorization: AuthzConfig,
    pub ignore_docker_version: bool,
    pub kubernetes_version: String,
    pub private_registries: Vec<PrivateRegistry>,
    pub ingress: IngressConfig,
    pub cluster_name: String,
    pub cloud_provider: CloudProvider,
}
