// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Deployment probe: confirms the controller-manager and scheduler do their job

use crate::constants::labels;
use crate::context::RunContext;
use crate::error::{Result, SmoketestError};
use crate::kubernetes::KubeConditions;
use crate::wait::{wait_for, PollSpec, ResourceKind, WaitOptions};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

const REPLICAS: i32 = 2;
const MIN_READY_SECONDS: i32 = 7;

fn app_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(labels::APP.to_string(), labels::APP_VALUE.to_string())])
}

/// The nginx deployment the service probes route to
pub fn smoketest_deployment(name: &str) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([(
                labels::TEST_NAME.to_string(),
                "deployment".to_string(),
            )])),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(REPLICAS),
            min_ready_seconds: Some(MIN_READY_SECONDS),
            selector: LabelSelector {
                match_labels: Some(app_labels()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(app_labels()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "webserver".to_string(),
                        image: Some("nginx".to_string()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Create the test deployment unless it exists, then wait for all replicas to be available
#[instrument(skip(client, ctx))]
pub async fn create_deployment(
    client: &Client,
    ctx: &RunContext,
    namespace: &str,
    name: &str,
) -> Result<()> {
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);

    match deployments.get(name).await {
        Ok(_) => {
            debug!("Using existing deployment {}", name);
            return Ok(());
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {}
        Err(e) => {
            return Err(SmoketestError::DeploymentError(format!(
                "Failed to check deployment {}: {}",
                name, e
            )))
        }
    }

    debug!("Creating deployment {}", name);
    deployments
        .create(&PostParams::default(), &smoketest_deployment(name))
        .await
        .map_err(|e| {
            SmoketestError::DeploymentError(format!("Failed to create deployment {}: {}", name, e))
        })?;

    let conditions = KubeConditions::new(client.clone(), namespace);
    let spec = PollSpec::new(
        ResourceKind::Deployment,
        WaitOptions::default()
            .with_deployment_name(name)
            .with_num_ready(REPLICAS),
    );
    if let Err(e) = wait_for(ctx, &conditions, &spec).await {
        warn!("Deployment {} did not become available: {}", name, e);
        return Err(e);
    }

    info!("Successfully created deployment {}", name);
    Ok(())
}
