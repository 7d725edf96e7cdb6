// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Condition checks that read live state from the API server

use crate::error::{Result, SmoketestError};
use crate::wait::{ConditionSource, Predicate};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};
use std::future::Future;
use tracing::trace;

/// Evaluates wait predicates against objects in a single namespace.
///
/// Every evaluation re-reads the object; nothing is cached.
#[derive(Clone)]
pub struct KubeConditions {
    client: Client,
    namespace: String,
}

impl KubeConditions {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    async fn check(&self, predicate: &Predicate) -> Result<bool> {
        match predicate {
            Predicate::DeploymentAvailable { name, .. } => {
                let deployments: Api<Deployment> =
                    Api::namespaced(self.client.clone(), &self.namespace);
                let deployment = deployments.get(name).await?;
                let available = deployment.status.and_then(|s| s.available_replicas);
                trace!("deployment {} has {:?} available replicas", name, available);
                Ok(predicate.deployment_satisfied(available))
            }
            Predicate::PodPhase { name, .. } => {
                let Some(name) = name else {
                    return Err(SmoketestError::PodError(
                        "no pod name given to wait for".to_string(),
                    ));
                };
                let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
                let pod = pods.get(name).await?;
                let phase = pod.status.and_then(|s| s.phase);
                trace!("pod {} is in phase {:?}", name, phase);
                Ok(predicate.pod_satisfied(phase.as_deref()))
            }
        }
    }
}

impl ConditionSource for KubeConditions {
    fn evaluate(&self, predicate: &Predicate) -> impl Future<Output = Result<bool>> + Send {
        self.check(predicate)
    }
}
