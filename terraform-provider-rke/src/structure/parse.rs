//! Flat resource state -> typed cluster configuration

use super::{
    get_block, get_block_list, get_bool, get_int, get_string, get_string_list, get_string_map,
    Block,
};
use crate::resources::ResourceData;
use rke_common::pki::{decode_certificate, decode_private_key};
use rke_common::{
    AuthnConfig, AuthzConfig, BaseService, CertificatePki, CloudProvider, Cluster, Error,
    EtcdService, Host, IngressConfig, KubeApiService, KubeControllerService, KubeletService,
    KubeproxyService, NetworkConfig, PrivateRegistry, RancherKubernetesEngineConfig,
    RkeConfigNode, RkeConfigServices, RkeSystemImages, Result, SchedulerService,
};
use std::collections::BTreeMap;

pub fn parse_resource_rke_config_nodes<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Vec<RkeConfigNode>> {
    get_block_list(d, "nodes")?
        .into_iter()
        .map(parse_node)
        .collect()
}

fn parse_node(block: &Block) -> Result<RkeConfigNode> {
    Ok(RkeConfigNode {
        node_name: get_string(block, "node_name")?,
        address: get_string(block, "address")?,
        port: get_int(block, "port")?
            .map(|port| port.to_string())
            .unwrap_or_default(),
        internal_address: get_string(block, "internal_address")?,
        role: get_string_list(block, "role")?,
        hostname_override: get_string(block, "hostname_override")?,
        user: get_string(block, "user")?,
        docker_socket: get_string(block, "docker_socket")?,
        ssh_agent_auth: get_bool(block, "ssh_agent_auth")?,
        ssh_key: get_string(block, "ssh_key")?,
        ssh_key_path: get_string(block, "ssh_key_path")?,
        labels: get_string_map(block, "labels")?,
    })
}

fn parse_base_service(block: &Block) -> Result<BaseService> {
    Ok(BaseService {
        image: get_string(block, "image")?,
        extra_args: get_string_map(block, "extra_args")?,
        extra_binds: get_string_list(block, "extra_binds")?,
    })
}

pub fn parse_resource_etcd_service<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Option<EtcdService>> {
    let Some(block) = get_block(d, "services_etcd")? else {
        return Ok(None);
    };
    Ok(Some(EtcdService {
        base: parse_base_service(block)?,
        external_urls: get_string_list(block, "external_urls")?,
        ca_cert: get_string(block, "ca_cert")?,
        cert: get_string(block, "cert")?,
        key: get_string(block, "key")?,
        path: get_string(block, "path")?,
    }))
}

pub fn parse_resource_kube_api_service<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Option<KubeApiService>> {
    let Some(block) = get_block(d, "services_kube_api")? else {
        return Ok(None);
    };
    Ok(Some(KubeApiService {
        base: parse_base_service(block)?,
        service_cluster_ip_range: get_string(block, "service_cluster_ip_range")?,
        pod_security_policy: get_bool(block, "pod_security_policy")?,
    }))
}

pub fn parse_resource_kube_controller_service<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Option<KubeControllerService>> {
    let Some(block) = get_block(d, "services_kube_controller")? else {
        return Ok(None);
    };
    Ok(Some(KubeControllerService {
        base: parse_base_service(block)?,
        cluster_cidr: get_string(block, "cluster_cidr")?,
        service_cluster_ip_range: get_string(block, "service_cluster_ip_range")?,
    }))
}

pub fn parse_resource_scheduler_service<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Option<SchedulerService>> {
    get_block(d, "services_scheduler")?
        .map(|block| {
            Ok(SchedulerService {
                base: parse_base_service(block)?,
            })
        })
        .transpose()
}

pub fn parse_resource_kubelet_service<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Option<KubeletService>> {
    let Some(block) = get_block(d, "services_kubelet")? else {
        return Ok(None);
    };
    Ok(Some(KubeletService {
        base: parse_base_service(block)?,
        cluster_domain: get_string(block, "cluster_domain")?,
        infra_container_image: get_string(block, "infra_container_image")?,
        cluster_dns_server: get_string(block, "cluster_dns_server")?,
        fail_swap_on: get_bool(block, "fail_swap_on")?,
    }))
}

pub fn parse_resource_kubeproxy_service<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Option<KubeproxyService>> {
    get_block(d, "services_kubeproxy")?
        .map(|block| {
            Ok(KubeproxyService {
                base: parse_base_service(block)?,
            })
        })
        .transpose()
}

/// All six services; omitted blocks become default services
pub fn parse_resource_services<D: ResourceData + ?Sized>(d: &D) -> Result<RkeConfigServices> {
    Ok(RkeConfigServices {
        etcd: parse_resource_etcd_service(d)?.unwrap_or_default(),
        kube_api: parse_resource_kube_api_service(d)?.unwrap_or_default(),
        kube_controller: parse_resource_kube_controller_service(d)?.unwrap_or_default(),
        scheduler: parse_resource_scheduler_service(d)?.unwrap_or_default(),
        kubelet: parse_resource_kubelet_service(d)?.unwrap_or_default(),
        kubeproxy: parse_resource_kubeproxy_service(d)?.unwrap_or_default(),
    })
}

pub fn parse_resource_network<D: ResourceData + ?Sized>(d: &D) -> Result<Option<NetworkConfig>> {
    let Some(block) = get_block(d, "network")? else {
        return Ok(None);
    };
    Ok(Some(NetworkConfig {
        plugin: get_string(block, "plugin")?,
        options: get_string_map(block, "options")?,
    }))
}

pub fn parse_resource_authentication<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Option<AuthnConfig>> {
    let Some(block) = get_block(d, "authentication")? else {
        return Ok(None);
    };
    Ok(Some(AuthnConfig {
        strategy: get_string(block, "strategy")?,
        options: get_string_map(block, "options")?,
        sans: get_string_list(block, "sans")?,
    }))
}

pub fn parse_resource_authorization<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Option<AuthzConfig>> {
    let Some(block) = get_block(d, "authorization")? else {
        return Ok(None);
    };
    Ok(Some(AuthzConfig {
        mode: get_string(block, "mode")?,
        options: get_string_map(block, "options")?,
    }))
}

pub fn parse_resource_addons<D: ResourceData + ?Sized>(d: &D) -> Result<String> {
    get_string(d, "addons")
}

pub fn parse_resource_addons_include<D: ResourceData + ?Sized>(d: &D) -> Result<Vec<String>> {
    get_string_list(d, "addons_include")
}

/// Image overrides; keys outside the known slots are ignored
pub fn parse_resource_system_images<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Option<RkeSystemImages>> {
    let Some(block) = get_block(d, "system_images")? else {
        return Ok(None);
    };

    let mut images = RkeSystemImages::default();
    for key in block.keys() {
        if let Some(slot) = images.slot_mut(key) {
            *slot = get_string(block, key)?;
        }
    }
    Ok(Some(images))
}

pub fn parse_resource_ssh_key_path<D: ResourceData + ?Sized>(d: &D) -> Result<String> {
    get_string(d, "ssh_key_path")
}

pub fn parse_resource_ssh_agent_auth<D: ResourceData + ?Sized>(d: &D) -> Result<bool> {
    get_bool(d, "ssh_agent_auth")
}

pub fn parse_resource_ignore_docker_version<D: ResourceData + ?Sized>(d: &D) -> Result<bool> {
    get_bool(d, "ignore_docker_version")
}

pub fn parse_resource_version<D: ResourceData + ?Sized>(d: &D) -> Result<String> {
    get_string(d, "kubernetes_version")
}

pub fn parse_resource_private_registries<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Vec<PrivateRegistry>> {
    get_block_list(d, "private_registries")?
        .into_iter()
        .map(|block| {
            Ok(PrivateRegistry {
                url: get_string(block, "url")?,
                user: get_string(block, "user")?,
                password: get_string(block, "password")?,
            })
        })
        .collect()
}

pub fn parse_resource_ingress<D: ResourceData + ?Sized>(d: &D) -> Result<Option<IngressConfig>> {
    let Some(block) = get_block(d, "ingress")? else {
        return Ok(None);
    };
    Ok(Some(IngressConfig {
        provider: get_string(block, "provider")?,
        options: get_string_map(block, "options")?,
        node_selector: get_string_map(block, "node_selector")?,
    }))
}

pub fn parse_resource_cluster_name<D: ResourceData + ?Sized>(d: &D) -> Result<String> {
    get_string(d, "cluster_name")
}

pub fn parse_resource_cloud_provider<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<Option<CloudProvider>> {
    let Some(block) = get_block(d, "cloud_provider")? else {
        return Ok(None);
    };
    Ok(Some(CloudProvider {
        name: get_string(block, "name")?,
        cloud_config: get_string_map(block, "cloud_config")?,
    }))
}

/// Certificate bundles keyed by their `id`, with PEM material decoded
pub fn parse_resource_certificates<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<BTreeMap<String, CertificatePki>> {
    let mut certificates = BTreeMap::new();

    for block in get_block_list(d, "certificates")? {
        let id = get_string(block, "id")?;
        if id.is_empty() {
            return Err(Error::MissingField("certificates.id".to_string()));
        }

        let certificate = match get_string(block, "certificate")? {
            pem if pem.is_empty() => None,
            pem => Some(decode_certificate(&pem)?),
        };
        let key = match get_string(block, "key")? {
            pem if pem.is_empty() => None,
            pem => Some(decode_private_key(&pem)?),
        };

        let bundle = CertificatePki {
            certificate,
            key,
            config: get_string(block, "config")?,
            name: get_string(block, "name")?,
            common_name: get_string(block, "common_name")?,
            ou_name: get_string(block, "ou_name")?,
            env_name: get_string(block, "env_name")?,
            path: get_string(block, "path")?,
            key_env_name: get_string(block, "key_env_name")?,
            key_path: get_string(block, "key_path")?,
            config_env_name: get_string(block, "config_env_name")?,
            config_path: get_string(block, "config_path")?,
        };
        certificates.insert(id, bundle);
    }

    Ok(certificates)
}

/// One host group (`etcd_hosts`, `worker_hosts`, `control_plane_hosts` or
/// `inactive_hosts`); only name and address are carried
pub fn parse_resource_hosts<D: ResourceData + ?Sized>(d: &D, key: &str) -> Result<Vec<Host>> {
    get_block_list(d, key)?
        .into_iter()
        .map(|block| {
            Ok(Host {
                config: RkeConfigNode {
                    node_name: get_string(block, "node_name")?,
                    address: get_string(block, "address")?,
                    ..Default::default()
                },
            })
        })
        .collect()
}

pub fn parse_resource_cluster_domain<D: ResourceData + ?Sized>(d: &D) -> Result<String> {
    get_string(d, "cluster_domain")
}

pub fn parse_resource_cluster_cidr<D: ResourceData + ?Sized>(d: &D) -> Result<String> {
    get_string(d, "cluster_cidr")
}

pub fn parse_resource_cluster_dns_server<D: ResourceData + ?Sized>(d: &D) -> Result<String> {
    get_string(d, "cluster_dns_server")
}

/// The full configuration; omitted blocks become default values
pub fn parse_resource_rke_config<D: ResourceData + ?Sized>(
    d: &D,
) -> Result<RancherKubernetesEngineConfig> {
    let config = RancherKubernetesEngineConfig {
        nodes: parse_resource_rke_config_nodes(d)?,
        services: parse_resource_services(d)?,
        network: parse_resource_network(d)?.unwrap_or_default(),
        authentication: parse_resource_authentication(d)?.unwrap_or_default(),
        addons: parse_resource_addons(d)?,
        addons_include: parse_resource_addons_include(d)?,
        system_images: parse_resource_system_images(d)?.unwrap_or_default(),
        ssh_key_path: parse_resource_ssh_key_path(d)?,
        ssh_agent_auth: parse_resource_ssh_agent_auth(d)?,
        authorization: parse_resource_authorization(d)?.unwrap_or_default(),
        ignore_docker_version: parse_resource_ignore_docker_version(d)?,
        kubernetes_version: parse_resource_version(d)?,
        private_registries: parse_resource_private_registries(d)?,
        ingress: parse_resource_ingress(d)?.unwrap_or_default(),
        cluster_name: parse_resource_cluster_name(d)?,
        cloud_provider: parse_resource_cloud_provider(d)?.unwrap_or_default(),
    };

    tracing::debug!(
        nodes = config.nodes.len(),
        registries = config.private_registries.len(),
        "Parsed cluster configuration"
    );

    Ok(config)
}

/// A cluster from configuration plus whatever computed state is present.
/// Cluster-wide settings in state override the values derived from services.
pub fn parse_resource_cluster<D: ResourceData + ?Sized>(d: &D) -> Result<Cluster> {
    let mut cluster = Cluster::new(parse_resource_rke_config(d)?);
    cluster.certificates = parse_resource_certificates(d)?;

    let overrides = [
        (&mut cluster.cluster_domain, parse_resource_cluster_domain(d)?),
        (&mut cluster.cluster_cidr, parse_resource_cluster_cidr(d)?),
        (&mut cluster.cluster_dns_server, parse_resource_cluster_dns_server(d)?),
    ];
    for (field, value) in overrides {
        if !value.is_empty() {
            *field = value;
        }
    }

    Ok(cluster)
}
