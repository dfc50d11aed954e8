//! Typed cluster -> flat resource state

use super::{is_zero, Block};
use crate::resources::StateWriter;
use rke_common::pki::{encode_certificate, encode_private_key};
use rke_common::{
    BaseService, CertificatePki, Cluster, Error, Host, RkeConfigNode, RkeConfigServices, Result,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Write every domain of `cluster` into `d`, stopping at the first failed
/// write. Zero values are skipped. The id is left to the caller.
pub fn cluster_to_state<W: StateWriter + ?Sized>(cluster: &Cluster, d: &mut W) -> Result<()> {
    let config = &cluster.config;
    let groups = cluster.host_groups();

    let nodes = config
        .nodes
        .iter()
        .map(node_block)
        .collect::<Result<Vec<_>>>()?;

    let mut services = services_blocks(&config.services);
    let mut take_service = |key: &str| services.remove(key).unwrap_or(Value::Null);

    let fields = vec![
        ("nodes", Value::from(nodes)),
        ("services_etcd", take_service("services_etcd")),
        ("services_kube_api", take_service("services_kube_api")),
        ("services_kube_controller", take_service("services_kube_controller")),
        ("services_scheduler", take_service("services_scheduler")),
        ("services_kubelet", take_service("services_kubelet")),
        ("services_kubeproxy", take_service("services_kubeproxy")),
        (
            "network",
            single([
                ("plugin", Value::from(config.network.plugin.as_str())),
                ("options", string_map(&config.network.options)),
            ]),
        ),
        (
            "authentication",
            single([
                ("strategy", Value::from(config.authentication.strategy.as_str())),
                ("options", string_map(&config.authentication.options)),
                ("sans", Value::from(config.authentication.sans.clone())),
            ]),
        ),
        ("addons", Value::from(config.addons.as_str())),
        ("addons_include", Value::from(config.addons_include.clone())),
        (
            "system_images",
            single(
                config
                    .system_images
                    .slots()
                    .map(|(name, image)| (name, Value::from(image.as_str()))),
            ),
        ),
        ("ssh_key_path", Value::from(config.ssh_key_path.as_str())),
        ("ssh_agent_auth", Value::from(config.ssh_agent_auth)),
        (
            "authorization",
            single([
                ("mode", Value::from(config.authorization.mode.as_str())),
                ("options", string_map(&config.authorization.options)),
            ]),
        ),
        ("ignore_docker_version", Value::from(config.ignore_docker_version)),
        ("kubernetes_version", Value::from(config.kubernetes_version.as_str())),
        (
            "private_registries",
            Value::from(
                config
                    .private_registries
                    .iter()
                    .map(|registry| {
                        block([
                            ("url", Value::from(registry.url.as_str())),
                            ("user", Value::from(registry.user.as_str())),
                            ("password", Value::from(registry.password.as_str())),
                        ])
                    })
                    .collect::<Vec<_>>(),
            ),
        ),
        (
            "ingress",
            single([
                ("provider", Value::from(config.ingress.provider.as_str())),
                ("options", string_map(&config.ingress.options)),
                ("node_selector", string_map(&config.ingress.node_selector)),
            ]),
        ),
        ("cluster_name", Value::from(config.cluster_name.as_str())),
        (
            "cloud_provider",
            single([
                ("name", Value::from(config.cloud_provider.name.as_str())),
                ("cloud_config", string_map(&config.cloud_provider.cloud_config)),
            ]),
        ),
        ("certificates", certificates_value(&cluster.certificates)),
        ("cluster_domain", Value::from(cluster.cluster_domain.as_str())),
        ("cluster_cidr", Value::from(cluster.cluster_cidr.as_str())),
        ("cluster_dns_server", Value::from(cluster.cluster_dns_server.as_str())),
        ("etcd_hosts", hosts_value(&groups.etcd)),
        ("worker_hosts", hosts_value(&groups.worker)),
        ("control_plane_hosts", hosts_value(&groups.control_plane)),
        ("inactive_hosts", hosts_value(&groups.inactive)),
    ];

    let mut written = 0;
    for (key, value) in fields {
        if is_zero(&value) {
            continue;
        }
        d.set(key, value)?;
        written += 1;
    }

    tracing::debug!(cluster = cluster.name(), keys = written, "Serialized cluster state");
    Ok(())
}

/// A nested block holding only the non-zero fields
fn block<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
    let entries: Block = fields
        .into_iter()
        .filter(|(_, value)| !is_zero(value))
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    Value::Object(entries)
}

/// A single-occurrence block as a one-element list; null when every field is zero
fn single<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Value {
    match block(fields) {
        value if is_zero(&value) => Value::Null,
        value => Value::Array(vec![value]),
    }
}

fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
            .collect(),
    )
}

fn node_block(node: &RkeConfigNode) -> Result<Value> {
    let port = match node.port.as_str() {
        "" => Value::Null,
        text => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| Error::InvalidPort {
                address: node.address.clone(),
                port: node.port.clone(),
            })?,
    };

    Ok(block([
        ("node_name", Value::from(node.node_name.as_str())),
        ("address", Value::from(node.address.as_str())),
        ("port", port),
        ("internal_address", Value::from(node.internal_address.as_str())),
        ("role", Value::from(node.role.clone())),
        ("hostname_override", Value::from(node.hostname_override.as_str())),
        ("user", Value::from(node.user.as_str())),
        ("docker_socket", Value::from(node.docker_socket.as_str())),
        ("ssh_agent_auth", Value::from(node.ssh_agent_auth)),
        ("ssh_key", Value::from(node.ssh_key.as_str())),
        ("ssh_key_path", Value::from(node.ssh_key_path.as_str())),
        ("labels", string_map(&node.labels)),
    ]))
}

fn base_fields(base: &BaseService) -> [(&'static str, Value); 3] {
    [
        ("image", Value::from(base.image.as_str())),
        ("extra_args", string_map(&base.extra_args)),
        ("extra_binds", Value::from(base.extra_binds.clone())),
    ]
}

fn services_blocks(services: &RkeConfigServices) -> BTreeMap<&'static str, Value> {
    let etcd = &services.etcd;
    let kube_api = &services.kube_api;
    let kube_controller = &services.kube_controller;
    let kubelet = &services.kubelet;

    BTreeMap::from([
        (
            "services_etcd",
            single(base_fields(&etcd.base).into_iter().chain([
                ("external_urls", Value::from(etcd.external_urls.clone())),
                ("ca_cert", Value::from(etcd.ca_cert.as_str())),
                ("cert", Value::from(etcd.cert.as_str())),
                ("key", Value::from(etcd.key.as_str())),
                ("path", Value::from(etcd.path.as_str())),
            ])),
        ),
        (
            "services_kube_api",
            single(base_fields(&kube_api.base).into_iter().chain([
                (
                    "service_cluster_ip_range",
                    Value::from(kube_api.service_cluster_ip_range.as_str()),
                ),
                ("pod_security_policy", Value::from(kube_api.pod_security_policy)),
            ])),
        ),
        (
            "services_kube_controller",
            single(base_fields(&kube_controller.base).into_iter().chain([
                ("cluster_cidr", Value::from(kube_controller.cluster_cidr.as_str())),
                (
                    "service_cluster_ip_range",
                    Value::from(kube_controller.service_cluster_ip_range.as_str()),
                ),
            ])),
        ),
        ("services_scheduler", single(base_fields(&services.scheduler.base))),
        (
            "services_kubelet",
            single(base_fields(&kubelet.base).into_iter().chain([
                ("cluster_domain", Value::from(kubelet.cluster_domain.as_str())),
                (
                    "infra_container_image",
                    Value::from(kubelet.infra_container_image.as_str()),
                ),
                ("cluster_dns_server", Value::from(kubelet.cluster_dns_server.as_str())),
                ("fail_swap_on", Value::from(kubelet.fail_swap_on)),
            ])),
        ),
        ("services_kubeproxy", single(base_fields(&services.kubeproxy.base))),
    ])
}

/// Bundles as a list ordered by id, the id carried on each element
fn certificates_value(certificates: &BTreeMap<String, CertificatePki>) -> Value {
    Value::from(
        certificates
            .iter()
            .map(|(id, pki)| {
                let certificate = pki
                    .certificate
                    .as_ref()
                    .map(encode_certificate)
                    .unwrap_or_default();
                let key = pki.key.as_ref().map(encode_private_key).unwrap_or_default();

                block([
                    ("id", Value::from(id.as_str())),
                    ("certificate", Value::from(certificate)),
                    ("key", Value::from(key)),
                    ("config", Value::from(pki.config.as_str())),
                    ("name", Value::from(pki.name.as_str())),
                    ("common_name", Value::from(pki.common_name.as_str())),
                    ("ou_name", Value::from(pki.ou_name.as_str())),
                    ("env_name", Value::from(pki.env_name.as_str())),
                    ("path", Value::from(pki.path.as_str())),
                    ("key_env_name", Value::from(pki.key_env_name.as_str())),
                    ("key_path", Value::from(pki.key_path.as_str())),
                    ("config_env_name", Value::from(pki.config_env_name.as_str())),
                    ("config_path", Value::from(pki.config_path.as_str())),
                ])
            })
            .collect::<Vec<_>>(),
    )
}

fn hosts_value(hosts: &[Host]) -> Value {
    Value::from(
        hosts
            .iter()
            .map(|host| {
                block([
                    ("node_name", Value::from(host.node_name())),
                    ("address", Value::from(host.address())),
                ])
            })
            .collect::<Vec<_>>(),
    )
}
