// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deadline-bounded polling until a cluster resource reaches a desired state.

use crate::backoff::BackoffConfig;
use crate::constants::defaults;
use crate::context::RunContext;
use crate::error::{Result, SmoketestError};
use std::fmt;
use std::future::Future;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument};

/// Kind of resource `wait_for` can be asked to wait on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    Namespace,
    Pod,
    Deployment,
    StatefulSet,
    PersistentVolumeClaim,
    ConfigMap,
    Secret,
    /// A kind name outside the supported set
    Unrecognized(String),
}

impl ResourceKind {
    /// Map a kind name (case-insensitive, singular) onto a kind
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "namespace" => ResourceKind::Namespace,
            "pod" => ResourceKind::Pod,
            "deployment" => ResourceKind::Deployment,
            "statefulset" => ResourceKind::StatefulSet,
            "persistentvolumeclaim" | "pvc" => ResourceKind::PersistentVolumeClaim,
            "configmap" => ResourceKind::ConfigMap,
            "secret" => ResourceKind::Secret,
            _ => ResourceKind::Unrecognized(name.to_string()),
        }
    }

    /// Resolve the predicate this kind is checked with.
    ///
    /// Only pods and deployments can be waited on; the remaining kinds are
    /// terminal errors so callers fail fast instead of polling forever.
    pub fn predicate(&self, options: &WaitOptions) -> Result<Predicate> {
        match self {
            ResourceKind::Deployment => Ok(Predicate::DeploymentAvailable {
                name: options
                    .deployment_name
                    .clone()
                    .unwrap_or_else(|| defaults::DEPLOYMENT_NAME.to_string()),
                replicas: options.num_ready,
            }),
            ResourceKind::Pod => Ok(Predicate::PodPhase {
                name: options.pod_name.clone(),
                phase: options.phase,
            }),
            ResourceKind::Unrecognized(name) => {
                Err(SmoketestError::UnknownResourceKind(name.clone()))
            }
            ResourceKind::Namespace
            | ResourceKind::StatefulSet
            | ResourceKind::PersistentVolumeClaim
            | ResourceKind::ConfigMap
            | ResourceKind::Secret => Err(SmoketestError::NotImplemented(self.to_string())),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Namespace => "Namespace",
            ResourceKind::Pod => "Pod",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::StatefulSet => "StatefulSet",
            ResourceKind::PersistentVolumeClaim => "PersistentVolumeClaim",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Secret => "Secret",
            ResourceKind::Unrecognized(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

/// Pod phase a pod wait is satisfied by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetPhase {
    #[default]
    Running,
    /// All containers exited successfully (`Succeeded` on the API)
    Completed,
}

impl TargetPhase {
    /// The `status.phase` value reported by the API server
    pub fn as_api_phase(&self) -> &'static str {
        match self {
            TargetPhase::Running => "Running",
            TargetPhase::Completed => "Succeeded",
        }
    }
}

/// Optional conditions for a wait; unset fields keep their defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitOptions {
    /// Desired number of available deployment replicas
    pub num_ready: i32,
    pub pod_name: Option<String>,
    /// Deployment to watch, defaults to the smoke test deployment
    pub deployment_name: Option<String>,
    pub phase: TargetPhase,
}

impl WaitOptions {
    pub fn with_num_ready(mut self, n: i32) -> Self {
        self.num_ready = n;
        self
    }

    pub fn with_pod_name(mut self, name: impl Into<String>) -> Self {
        self.pod_name = Some(name.into());
        self
    }

    pub fn with_deployment_name(mut self, name: impl Into<String>) -> Self {
        self.deployment_name = Some(name.into());
        self
    }

    pub fn with_phase(mut self, phase: TargetPhase) -> Self {
        self.phase = phase;
        self
    }
}

/// What a single wait is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSpec {
    pub kind: ResourceKind,
    pub options: WaitOptions,
    pub backoff: BackoffConfig,
}

impl PollSpec {
    pub fn new(kind: ResourceKind, options: WaitOptions) -> Self {
        Self {
            kind,
            options,
            backoff: BackoffConfig::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }
}

/// A check against current cluster state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `status.availableReplicas` equals `replicas`
    DeploymentAvailable { name: String, replicas: i32 },
    /// `status.phase` equals the target phase
    PodPhase {
        name: Option<String>,
        phase: TargetPhase,
    },
}

impl Predicate {
    pub fn deployment_satisfied(&self, available_replicas: Option<i32>) -> bool {
        match self {
            Predicate::DeploymentAvailable { replicas, .. } => {
                available_replicas.unwrap_or(0) == *replicas
            }
            _ => false,
        }
    }

    pub fn pod_satisfied(&self, phase: Option<&str>) -> bool {
        match self {
            Predicate::PodPhase { phase: target, .. } => phase == Some(target.as_api_phase()),
            _ => false,
        }
    }
}

/// Reads current state and reports whether a predicate holds.
///
/// Errors returned here are treated as transient by [`wait_for`].
pub trait ConditionSource {
    fn evaluate(&self, predicate: &Predicate) -> impl Future<Output = Result<bool>> + Send;
}

/// Wait until `spec` is satisfied on the cluster `source` reads from.
///
/// Returns the context error once `ctx` expires or is cancelled, and fails
/// immediately for kinds that cannot be waited on.
#[instrument(skip(ctx, source), fields(kind = %spec.kind))]
pub async fn wait_for<S>(ctx: &RunContext, source: &S, spec: &PollSpec) -> Result<()>
where
    S: ConditionSource + Sync,
{
    let predicate = spec.kind.predicate(&spec.options)?;
    let mut backoff = spec.backoff.build();
    let started = Instant::now();

    loop {
        let delay = backoff.next();
        tokio::select! {
            biased;
            err = ctx.done() => return Err(err.into()),
            _ = sleep(delay) => {}
        }

        // the timer and the deadline can fire together
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        match ctx.run(source.evaluate(&predicate)).await? {
            Ok(true) => {
                debug!(
                    "{} condition satisfied after {:?} ({} attempts)",
                    spec.kind,
                    started.elapsed(),
                    backoff.attempt()
                );
                return Ok(());
            }
            Ok(false) => {
                debug!("waiting for {}: {:?}", spec.kind, started.elapsed());
            }
            Err(e) => {
                debug!("query for {} failed, retrying: {}", spec.kind, e);
            }
        }
    }
}
