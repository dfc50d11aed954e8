//! The `rke_cluster` resource

use super::{Resource, ResourceResult, ResourceState, StateWriter};
use crate::schema::{
    AttributeType, Diagnostic, NestedBlock, ResourceSchema, SchemaAttribute, SchemaBlock,
};
use crate::structure::{cluster_to_state, parse_resource_cluster};
use rke_common::{Cluster, RkeSystemImages};

/// Provisioning engine behind the resource
pub trait ClusterDriver: Send + Sync {
    /// Bring the cluster to the given configuration and return the cluster as
    /// provisioned (with issued certificates)
    fn up(&self, cluster: Cluster) -> anyhow::Result<Cluster>;

    /// Tear the cluster down
    fn remove(&self, cluster: &Cluster) -> anyhow::Result<()>;
}

/// Driver that provisions nothing and hands the cluster back unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDriver;

impl ClusterDriver for NoopDriver {
    fn up(&self, cluster: Cluster) -> anyhow::Result<Cluster> {
        Ok(cluster)
    }

    fn remove(&self, _cluster: &Cluster) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct RkeClusterResource {
    driver: Box<dyn ClusterDriver>,
}

impl RkeClusterResource {
    pub fn new(driver: Box<dyn ClusterDriver>) -> Self {
        Self { driver }
    }

    /// Parse and provision `planned`, returning the resulting state
    fn apply(&self, planned: &ResourceState, action: &str) -> ResourceResult<ResourceState> {
        let cluster = parse(planned)?;
        let name = cluster.name().to_string();
        tracing::info!(cluster = %name, nodes = cluster.config.nodes.len(), "{} cluster", action);

        let cluster = self.driver.up(cluster).map_err(|e| {
            tracing::warn!(cluster = %name, "Failed to {} cluster: {:#}", action.to_lowercase(), e);
            vec![Diagnostic::error(&format!("Failed to {} cluster", action.to_lowercase()))
                .with_detail(&format!("{:#}", e))]
        })?;

        let mut state = ResourceState::new();
        cluster_to_state(&cluster, &mut state)
            .map_err(|e| vec![Diagnostic::from_error("Failed to write cluster state", &e)])?;
        state.set_id(cluster.name());
        Ok(state)
    }
}

impl Default for RkeClusterResource {
    fn default() -> Self {
        Self::new(Box::new(NoopDriver))
    }
}

fn parse(state: &ResourceState) -> ResourceResult<Cluster> {
    parse_resource_cluster(state)
        .map_err(|e| vec![Diagnostic::from_error("Invalid cluster configuration", &e)])
}

fn string_map() -> SchemaAttribute {
    SchemaAttribute::map(AttributeType::String).optional()
}

fn string_list() -> SchemaAttribute {
    SchemaAttribute::list(AttributeType::String).optional()
}

fn node_block() -> SchemaBlock {
    SchemaBlock::new()
        .with_attribute("node_name", SchemaAttribute::string().optional())
        .with_attribute(
            "address",
            SchemaAttribute::string()
                .with_description("Address the engine connects to over SSH")
                .required(),
        )
        .with_attribute("port", SchemaAttribute::number().optional())
        .with_attribute("internal_address", SchemaAttribute::string().optional())
        .with_attribute(
            "role",
            SchemaAttribute::list(AttributeType::String)
                .with_description("Any of etcd, controlplane and worker")
                .required(),
        )
        .with_attribute("hostname_override", SchemaAttribute::string().optional())
        .with_attribute("user", SchemaAttribute::string().optional())
        .with_attribute("docker_socket", SchemaAttribute::string().optional())
        .with_attribute("ssh_agent_auth", SchemaAttribute::bool().optional())
        .with_attribute("ssh_key", SchemaAttribute::string().optional().sensitive())
        .with_attribute("ssh_key_path", SchemaAttribute::string().optional())
        .with_attribute("labels", string_map())
}

/// Fields every service block carries
fn service_block() -> SchemaBlock {
    SchemaBlock::new()
        .with_attribute("image", SchemaAttribute::string().optional())
        .with_attribute("extra_args", string_map())
        .with_attribute("extra_binds", string_list())
}

fn system_images_block() -> SchemaBlock {
    RkeSystemImages::default()
        .slots()
        .iter()
        .fold(SchemaBlock::new(), |block, (name, _)| {
            block.with_attribute(name, SchemaAttribute::string().optional())
        })
}

fn certificate_type() -> AttributeType {
    AttributeType::string_object(&[
        "id",
        "certificate",
        "key",
        "config",
        "name",
        "common_name",
        "ou_name",
        "env_name",
        "path",
        "key_env_name",
        "key_path",
        "config_env_name",
        "config_path",
    ])
}

fn hosts_attribute(description: &str) -> SchemaAttribute {
    SchemaAttribute::list(AttributeType::string_object(&["node_name", "address"]))
        .with_description(description)
        .computed()
}

impl Resource for RkeClusterResource {
    fn type_name(&self) -> &str {
        "rke_cluster"
    }

    fn schema(&self) -> ResourceSchema {
        let block = SchemaBlock::new()
            .with_attribute("id", SchemaAttribute::string().computed())
            .with_block("nodes", NestedBlock::list(node_block()).with_min_items(1))
            .with_block(
                "services_etcd",
                NestedBlock::single(
                    service_block()
                        .with_attribute("external_urls", string_list())
                        .with_attribute("ca_cert", SchemaAttribute::string().optional())
                        .with_attribute("cert", SchemaAttribute::string().optional())
                        .with_attribute("key", SchemaAttribute::string().optional().sensitive())
                        .with_attribute("path", SchemaAttribute::string().optional()),
                ),
            )
            .with_block(
                "services_kube_api",
                NestedBlock::single(
                    service_block()
                        .with_attribute(
                            "service_cluster_ip_range",
                            SchemaAttribute::string().optional(),
                        )
                        .with_attribute("pod_security_policy", SchemaAttribute::bool().optional()),
                ),
            )
            .with_block(
                "services_kube_controller",
                NestedBlock::single(
                    service_block()
                        .with_attribute("cluster_cidr", SchemaAttribute::string().optional())
                        .with_attribute(
                            "service_cluster_ip_range",
                            SchemaAttribute::string().optional(),
                        ),
                ),
            )
            .with_block("services_scheduler", NestedBlock::single(service_block()))
            .with_block(
                "services_kubelet",
                NestedBlock::single(
                    service_block()
                        .with_attribute("cluster_domain", SchemaAttribute::string().optional())
                        .with_attribute(
                            "infra_container_image",
                            SchemaAttribute::string().optional(),
                        )
                        .with_attribute("cluster_dns_server", SchemaAttribute::string().optional())
                        .with_attribute("fail_swap_on", SchemaAttribute::bool().optional()),
                ),
            )
            .with_block("services_kubeproxy", NestedBlock::single(service_block()))
            .with_block(
                "network",
                NestedBlock::single(
                    SchemaBlock::new()
                        .with_attribute("plugin", SchemaAttribute::string().optional())
                        .with_attribute("options", string_map()),
                ),
            )
            .with_block(
                "authentication",
                NestedBlock::single(
                    SchemaBlock::new()
                        .with_attribute("strategy", SchemaAttribute::string().optional())
                        .with_attribute("options", string_map())
                        .with_attribute("sans", string_list()),
                ),
            )
            .with_attribute(
                "addons",
                SchemaAttribute::string()
                    .with_description("Kubernetes manifests deployed after the cluster is up")
                    .optional(),
            )
            .with_attribute("addons_include", string_list())
            .with_block("system_images", NestedBlock::single(system_images_block()))
            .with_attribute("ssh_key_path", SchemaAttribute::string().optional())
            .with_attribute("ssh_agent_auth", SchemaAttribute::bool().optional())
            .with_block(
                "authorization",
                NestedBlock::single(
                    SchemaBlock::new()
                        .with_attribute("mode", SchemaAttribute::string().optional())
                        .with_attribute("options", string_map()),
                ),
            )
            .with_attribute("ignore_docker_version", SchemaAttribute::bool().optional())
            .with_attribute("kubernetes_version", SchemaAttribute::string().optional())
            .with_block(
                "private_registries",
                NestedBlock::list(
                    SchemaBlock::new()
                        .with_attribute("url", SchemaAttribute::string().required())
                        .with_attribute("user", SchemaAttribute::string().optional())
                        .with_attribute(
                            "password",
                            SchemaAttribute::string().optional().sensitive(),
                        ),
                ),
            )
            .with_block(
                "ingress",
                NestedBlock::single(
                    SchemaBlock::new()
                        .with_attribute("provider", SchemaAttribute::string().optional())
                        .with_attribute("options", string_map())
                        .with_attribute("node_selector", string_map()),
                ),
            )
            .with_attribute(
                "cluster_name",
                SchemaAttribute::string()
                    .with_description("Cluster name, also the resource id (default \"local\")")
                    .optional(),
            )
            .with_block(
                "cloud_provider",
                NestedBlock::single(
                    SchemaBlock::new()
                        .with_attribute("name", SchemaAttribute::string().optional())
                        .with_attribute("cloud_config", string_map()),
                ),
            )
            .with_attribute(
                "certificates",
                SchemaAttribute::list(certificate_type())
                    .with_description("Certificates issued for the cluster, PEM encoded")
                    .computed()
                    .sensitive(),
            )
            .with_attribute(
                "cluster_domain",
                SchemaAttribute::string().optional().computed(),
            )
            .with_attribute("cluster_cidr", SchemaAttribute::string().optional().computed())
            .with_attribute(
                "cluster_dns_server",
                SchemaAttribute::string().optional().computed(),
            )
            .with_attribute("etcd_hosts", hosts_attribute("Nodes with the etcd role"))
            .with_attribute(
                "control_plane_hosts",
                hosts_attribute("Nodes with the controlplane role"),
            )
            .with_attribute("worker_hosts", hosts_attribute("Nodes with the worker role"))
            .with_attribute(
                "inactive_hosts",
                hosts_attribute("Nodes without a recognized role"),
            )
            .with_description("Manages a Rancher Kubernetes Engine cluster");

        ResourceSchema::new(1, block)
    }

    fn validate(&self, config: &ResourceState) -> Vec<Diagnostic> {
        match parse(config) {
            Ok(_) => Vec::new(),
            Err(diagnostics) => diagnostics,
        }
    }

    fn create(&self, planned: &ResourceState) -> ResourceResult<ResourceState> {
        self.apply(planned, "Create")
    }

    fn read(&self, current: &ResourceState) -> ResourceResult<ResourceState> {
        if current.is_empty() {
            return Ok(ResourceState::new());
        }

        let cluster = parse(current)?;
        let mut state = ResourceState::new();
        cluster_to_state(&cluster, &mut state)
            .map_err(|e| vec![Diagnostic::from_error("Failed to write cluster state", &e)])?;
        state.set_id(current.id().unwrap_or_else(|| cluster.name()));

        tracing::debug!(cluster = cluster.name(), "Refreshed cluster state");
        Ok(state)
    }

    fn update(
        &self,
        current: &ResourceState,
        planned: &ResourceState,
    ) -> ResourceResult<ResourceState> {
        tracing::debug!(id = current.id().unwrap_or_default(), "Updating cluster");
        self.apply(planned, "Update")
    }

    fn delete(&self, current: &ResourceState) -> ResourceResult<()> {
        let cluster = parse(current)?;
        tracing::info!(cluster = cluster.name(), "Removing cluster");

        self.driver.remove(&cluster).map_err(|e| {
            tracing::warn!(cluster = cluster.name(), "Failed to remove cluster: {:#}", e);
            vec![Diagnostic::error("Failed to remove cluster").with_detail(&format!("{:#}", e))]
        })
    }

    fn plan_change(
        &self,
        _current: Option<&ResourceState>,
        proposed: &ResourceState,
    ) -> ResourceResult<ResourceState> {
        parse(proposed)?;
        Ok(proposed.clone())
    }
}
