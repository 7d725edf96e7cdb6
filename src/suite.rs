// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The smoke test suite: which probes run, in what order, and which are fatal.

use crate::config::Config;
use crate::context::RunContext;
use crate::error::Result;
use crate::kubernetes::{
    components, create_namespace, delete_namespace, deployments, etcd, pods, secrets, services,
};
use crate::orchestrator::{OrchestrationPlan, Probe, ProbeStep};
use futures::future::{BoxFuture, FutureExt};
use kube::Client;
use std::sync::Arc;

/// Named probe sets selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Profile {
    /// Namespace and pod logs only
    Minimal,
    /// Every probe
    Full,
}

/// Cluster checks the suite knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    ComponentStatus,
    CreateNamespace,
    PodLogs,
    Deployment,
    ClusterIpService,
    NodePortService,
    Secret,
    SecretEncryption,
    DeleteNamespace,
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Check::ComponentStatus => "component-status",
            Check::CreateNamespace => "create-namespace",
            Check::PodLogs => "pod-logs",
            Check::Deployment => "deployment",
            Check::ClusterIpService => "cluster-ip-service",
            Check::NodePortService => "node-port-service",
            Check::Secret => "secret",
            Check::SecretEncryption => "secret-encryption",
            Check::DeleteNamespace => "delete-namespace",
        }
    }

    /// Later checks cannot run meaningfully once these fail
    pub fn is_fatal(&self) -> bool {
        matches!(self, Check::ComponentStatus | Check::CreateNamespace)
    }
}

impl Profile {
    pub fn checks(&self) -> &'static [Check] {
        match self {
            Profile::Minimal => &[Check::CreateNamespace, Check::PodLogs],
            Profile::Full => &[
                Check::ComponentStatus,
                Check::CreateNamespace,
                Check::PodLogs,
                Check::Deployment,
                Check::ClusterIpService,
                Check::NodePortService,
                Check::Secret,
                Check::SecretEncryption,
            ],
        }
    }
}

/// Shared client and configuration the probes run against
#[derive(Clone)]
pub struct Suite {
    client: Client,
    config: Arc<Config>,
}

impl Suite {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    async fn run_check(&self, check: Check, ctx: &RunContext) -> Result<()> {
        let client = &self.client;
        let config = &self.config;
        let ns = config.namespace.as_str();

        match check {
            Check::ComponentStatus => components::check_component_status(client).await,
            Check::CreateNamespace => create_namespace(client, ctx, ns).await,
            Check::PodLogs => pods::pod_logs(client, ctx, ns).await,
            Check::Deployment => {
                deployments::create_deployment(client, ctx, ns, &config.deployment_name).await
            }
            Check::ClusterIpService => {
                services::create_service(client, ctx, ns, &config.service_name).await
            }
            Check::NodePortService => {
                services::create_node_port_service(client, ctx, ns, &config.node_port_service_name)
                    .await
            }
            Check::Secret => {
                secrets::create_secret(
                    client,
                    ns,
                    &config.secret_name,
                    &config.secret_key,
                    &config.secret_value,
                )
                .await
            }
            Check::SecretEncryption => {
                etcd::verify_secret_encryption(client, ctx, &config.etcd, ns, &config.secret_name)
                    .await
            }
            Check::DeleteNamespace => delete_namespace(client, ns).await,
        }
    }

    fn step(&self, check: Check) -> ProbeStep {
        ProbeStep::new(
            check.name(),
            check.is_fatal(),
            SuiteProbe {
                suite: self.clone(),
                check,
            },
        )
    }

    /// Plan for a profile; namespace deletion is the teardown
    pub fn plan(&self, profile: Profile) -> OrchestrationPlan {
        profile
            .checks()
            .iter()
            .fold(OrchestrationPlan::builder(), |builder, check| {
                builder.step(self.step(*check))
            })
            .teardown_step(self.step(Check::DeleteNamespace))
            .build()
    }
}

struct SuiteProbe {
    suite: Suite,
    check: Check,
}

impl Probe for SuiteProbe {
    /// Every check is bounded by the run deadline, including those that take no context
    fn run<'a>(&'a self, ctx: &'a RunContext) -> BoxFuture<'a, Result<()>> {
        async move { ctx.run(self.suite.run_check(self.check, ctx)).await? }.boxed()
    }
}
