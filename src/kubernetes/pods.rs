// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod creation and log retrieval

use crate::constants::{labels, LOG_TAIL_LINES};
use crate::context::RunContext;
use crate::error::{Result, SmoketestError};
use crate::kubernetes::KubeConditions;
use crate::wait::{wait_for, PollSpec, ResourceKind, WaitOptions};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use kube::{
    api::{ListParams, LogParams, ObjectMeta, PostParams},
    Api, Client, ResourceExt,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

const DEFAULT_IMAGE: &str = "alpine";
const POD_LOGS_TEST: &str = "PodLogs";

/// What a test pod runs
#[derive(Debug, Clone, Default)]
pub struct PodTemplate {
    /// Mandatory; the lowercased name becomes the pod name
    pub test_name: String,
    pub image: Option<String>,
    pub command: Vec<String>,
    pub args: Vec<String>,
}

impl PodTemplate {
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            ..Default::default()
        }
    }

    /// Build the pod object, filling in the default image and the date loop
    pub fn to_pod(&self, namespace: &str) -> Result<Pod> {
        if self.test_name.is_empty() {
            return Err(SmoketestError::PodError(
                "must specify a test name when creating a pod".to_string(),
            ));
        }

        let (command, args) = if self.command.is_empty() && self.args.is_empty() {
            (
                vec!["/bin/sh".to_string()],
                vec![
                    "-c".to_string(),
                    "trap 'exit' SIGTERM SIGKILL SIGINT SIGQUIT; while true; do echo `date`; sleep 1; done"
                        .to_string(),
                ],
            )
        } else {
            (self.command.clone(), self.args.clone())
        };

        Ok(Pod {
            metadata: ObjectMeta {
                name: Some(self.test_name.to_lowercase()),
                namespace: Some(namespace.to_string()),
                labels: Some(BTreeMap::from([(
                    labels::TEST_NAME.to_string(),
                    self.test_name.clone(),
                )])),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "yolo".to_string(),
                    image: Some(
                        self.image
                            .clone()
                            .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
                    ),
                    image_pull_policy: Some("Always".to_string()),
                    command: Some(command),
                    args: Some(args),
                    ..Default::default()
                }],
                restart_policy: Some("Never".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

/// Create a test pod, reusing it when a pod of that name already exists
#[instrument(skip(client, template), fields(test = %template.test_name))]
pub async fn create_pod(client: &Client, namespace: &str, template: &PodTemplate) -> Result<Pod> {
    let pod = template.to_pod(namespace)?;
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let name = pod.name_any();

    match pods.get(&name).await {
        Ok(existing) => {
            debug!("Pod {} already exists, reusing it", name);
            return Ok(existing);
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {}
        Err(e) => return Err(e.into()),
    }

    let created = pods.create(&PostParams::default(), &pod).await?;
    debug!("Pod {} created", created.name_any());
    Ok(created)
}

/// Run a pod, wait for it to be running and read the tail of its logs
#[instrument(skip(client, ctx))]
pub async fn pod_logs(client: &Client, ctx: &RunContext, namespace: &str) -> Result<()> {
    let pod = create_pod(client, namespace, &PodTemplate::new(POD_LOGS_TEST)).await?;

    let conditions = KubeConditions::new(client.clone(), namespace);
    let spec = PollSpec::new(
        ResourceKind::Pod,
        WaitOptions::default().with_pod_name(pod.name_any()),
    );
    wait_for(ctx, &conditions, &spec).await?;

    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let pod_list = pods.list(&ListParams::default()).await?;
    let Some(first) = pod_list.items.first() else {
        return Err(SmoketestError::PodError(format!(
            "no pods found in namespace {}",
            namespace
        )));
    };

    let lines = get_pod_logs(client, namespace, &first.name_any()).await?;
    info!("Read {} log lines from pod {}", lines.len(), first.name_any());
    for line in &lines {
        debug!("{}", line);
    }

    Ok(())
}

/// Fetch the last log lines of a pod
#[instrument(skip(client))]
pub async fn get_pod_logs(client: &Client, namespace: &str, pod_name: &str) -> Result<Vec<String>> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let params = LogParams {
        tail_lines: Some(LOG_TAIL_LINES),
        ..Default::default()
    };

    let logs = pods.logs(pod_name, &params).await?;
    Ok(logs.lines().map(str::to_string).collect())
}
