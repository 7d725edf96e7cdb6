// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One-shot shell jobs used to test services from inside the cluster

use crate::error::Result;
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client, ResourceExt,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, error, instrument};

const JOB_PREFIX: &str = "smoketest-";

/// A random, DNS-safe job name
pub fn random_job_name() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("{}{}", JOB_PREFIX, suffix)
}

/// Busybox job running `/bin/sh -c <script>` once
pub fn shell_job(name: &str, script: &str) -> Job {
    Job {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(JobSpec {
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    restart_policy: Some("Never".to_string()),
                    containers: vec![Container {
                        name: "box".to_string(),
                        image: Some("busybox".to_string()),
                        command: Some(vec!["/bin/sh".to_string(), "-c".to_string()]),
                        args: Some(vec![script.to_string()]),
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

/// Create a job that runs `script` and exits
#[instrument(skip(client))]
pub async fn create_job(client: &Client, namespace: &str, script: &str) -> Result<Job> {
    let name = random_job_name();
    debug!("Creating test job {}, running: /bin/sh -c {:?}", name, script);

    let jobs: Api<Job> = Api::namespaced(client.clone(), namespace);
    let job = jobs
        .create(&PostParams::default(), &shell_job(&name, script))
        .await
        .inspect_err(|e| error!("Failed to create job {}: {}", name, e))?;

    debug!("Successfully created job {}", job.name_any());
    Ok(job)
}
