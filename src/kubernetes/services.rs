// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Service probes: verify virtual IPs (kube-proxy and routing) and NodePorts work

use crate::constants::{labels, poll};
use crate::context::RunContext;
use crate::error::{Result, SmoketestError};
use crate::kubernetes::jobs::create_job;
use crate::kubernetes::pods::get_pod_logs;
use crate::kubernetes::KubeConditions;
use crate::wait::{wait_for, PollSpec, ResourceKind, TargetPhase, WaitOptions};
use k8s_openapi::api::core::v1::{Node, Pod, Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::{
    api::{ListParams, ObjectMeta, PostParams},
    Api, Client, ResourceExt,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, instrument, trace};

const HTTP_PORT_NAME: &str = "http";
const NODE_PORT_NAME: &str = "http-np";
const SUCCESS_MARKER: &str = "Success";

/// Kind of service a probe creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    ClusterIp,
    NodePort,
}

impl ServiceKind {
    fn api_type(&self) -> &'static str {
        match self {
            ServiceKind::ClusterIp => "ClusterIP",
            ServiceKind::NodePort => "NodePort",
        }
    }

    fn port_name(&self) -> &'static str {
        match self {
            ServiceKind::ClusterIp => HTTP_PORT_NAME,
            ServiceKind::NodePort => NODE_PORT_NAME,
        }
    }
}

/// Service on port 80 in front of the smoke test deployment
pub fn smoketest_service(name: &str, kind: ServiceKind) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([
                (labels::APP.to_string(), labels::APP_VALUE.to_string()),
                (labels::PART_OF.to_string(), labels::APP_VALUE.to_string()),
            ])),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(BTreeMap::from([(
                labels::APP.to_string(),
                labels::APP_VALUE.to_string(),
            )])),
            type_: Some(kind.api_type().to_string()),
            ports: Some(vec![ServicePort {
                name: Some(kind.port_name().to_string()),
                port: 80,
                target_port: Some(IntOrString::Int(80)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Create the service unless it exists. Returns `true` when it was created by this call.
async fn ensure_service(client: &Client, namespace: &str, name: &str, kind: ServiceKind) -> Result<bool> {
    let services: Api<Service> = Api::namespaced(client.clone(), namespace);

    match services.get(name).await {
        Ok(_) => {
            debug!("Service {} already exists, not creating a new one", name);
            return Ok(false);
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {}
        Err(e) => {
            return Err(SmoketestError::ServiceError(format!(
                "Failed to check service {}: {}",
                name, e
            )))
        }
    }

    debug!("Attempting to create {} service {}", kind.api_type(), name);
    services
        .create(&PostParams::default(), &smoketest_service(name, kind))
        .await
        .map_err(|e| {
            error!("Failed to create service {}: {}", name, e);
            SmoketestError::ServiceError(format!("Failed to create service {}: {}", name, e))
        })?;
    debug!("Successfully created service {}", name);
    Ok(true)
}

/// Create a ClusterIP service and fetch it from inside the cluster
#[instrument(skip(client, ctx))]
pub async fn create_service(client: &Client, ctx: &RunContext, namespace: &str, name: &str) -> Result<()> {
    if !ensure_service(client, namespace, name, ServiceKind::ClusterIp).await? {
        return Ok(());
    }
    test_service(client, ctx, namespace, name).await
}

/// Run a job that fetches the service and check it reported success
#[instrument(skip(client, ctx))]
pub async fn test_service(client: &Client, ctx: &RunContext, namespace: &str, name: &str) -> Result<()> {
    debug!("Start testing service {}", name);

    let script = format!(
        "wget -o /dev/null -O /dev/null {} && echo \"{}\" || echo \"Failed\"",
        name, SUCCESS_MARKER
    );
    let job = create_job(client, namespace, &script).await?;
    let pod_name = find_job_pod(client, namespace, &job.name_any()).await?;

    let conditions = KubeConditions::new(client.clone(), namespace);
    let spec = PollSpec::new(
        ResourceKind::Pod,
        WaitOptions::default()
            .with_pod_name(pod_name.clone())
            .with_phase(TargetPhase::Completed),
    );
    wait_for(ctx, &conditions, &spec).await?;

    let output = get_pod_logs(client, namespace, &pod_name).await?;
    if !output_reports_success(&output) {
        return Err(SmoketestError::ServiceError(format!(
            "test failed, did not find \"{}\" in output: {:?}",
            SUCCESS_MARKER, output
        )));
    }

    Ok(())
}

/// Pods of a fresh job can take a few seconds to be scheduled
async fn find_job_pod(client: &Client, namespace: &str, job_name: &str) -> Result<String> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let lp = ListParams::default().labels(&format!("{}={}", labels::JOB_NAME, job_name));

    for attempt in 1..=poll::JOB_POD_LOOKUP_ATTEMPTS {
        let pod_list = pods.list(&lp).await?;
        if let Some(pod) = pod_list.items.first() {
            return Ok(pod.name_any());
        }
        trace!("No pod for job {} yet (attempt {})", job_name, attempt);
        if attempt < poll::JOB_POD_LOOKUP_ATTEMPTS {
            sleep(Duration::from_secs(1)).await;
        }
    }

    Err(SmoketestError::ServiceError(format!(
        "no pod found for job {}",
        job_name
    )))
}

fn output_reports_success(lines: &[String]) -> bool {
    lines.join(" ").contains(SUCCESS_MARKER)
}

/// Create a NodePort service and call it through a node address
#[instrument(skip(client, ctx))]
pub async fn create_node_port_service(
    client: &Client,
    ctx: &RunContext,
    namespace: &str,
    name: &str,
) -> Result<()> {
    if !ensure_service(client, namespace, name, ServiceKind::NodePort).await? {
        return Ok(());
    }
    test_node_port_service(client, ctx, namespace, name).await
}

/// Call the NodePort on the first node and expect a 200
#[instrument(skip(client, ctx))]
pub async fn test_node_port_service(
    client: &Client,
    ctx: &RunContext,
    namespace: &str,
    name: &str,
) -> Result<()> {
    debug!("Start testing service {}", name);

    let nodes: Api<Node> = Api::all(client.clone());
    let node_list = nodes.list(&ListParams::default()).await?;
    let address = node_list
        .items
        .first()
        .and_then(|node| candidate_addresses(node).into_iter().next())
        .ok_or_else(|| SmoketestError::ServiceError("no node address found".to_string()))?;

    // the port is picked by the API server, read it back
    let services: Api<Service> = Api::namespaced(client.clone(), namespace);
    let service = services.get(name).await?;
    let node_port = node_port(&service).ok_or_else(|| {
        SmoketestError::ServiceError(format!("service {} has no {} node port", name, NODE_PORT_NAME))
    })?;

    let url = format!("http://{}:{}", address, node_port);
    trace!("{} url: {}", name, url);

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(1))
        .timeout(Duration::from_secs(5))
        .build()?;

    let mut retries = poll::NODE_PORT_RETRIES;
    let response = loop {
        match ctx.run(http.get(&url).send()).await? {
            Ok(response) => break response,
            Err(e) if retries > 0 => {
                retries -= 1;
                trace!("Request failed: {}, retrying.. will retry {} more times", e, retries);
                ctx.run(sleep(Duration::from_secs(1))).await?;
            }
            Err(e) => return Err(e.into()),
        }
    };

    expect_ok(&url, response.status())?;

    match response.text().await {
        Ok(body) => trace!("{}", body),
        Err(e) => debug!("Failed to read response body: {}", e),
    }
    Ok(())
}

/// Only a plain 200 counts, other 2xx codes included
fn expect_ok(url: &str, status: reqwest::StatusCode) -> Result<()> {
    if status != reqwest::StatusCode::OK {
        return Err(SmoketestError::ServiceError(format!(
            "{} returned {}",
            url, status
        )));
    }
    Ok(())
}

/// Node addresses usable to reach a NodePort, hostnames excluded
pub fn candidate_addresses(node: &Node) -> Vec<String> {
    node.status
        .as_ref()
        .and_then(|s| s.addresses.as_ref())
        .map(|addresses| {
            addresses
                .iter()
                .filter(|a| a.type_ != "Hostname")
                .map(|a| a.address.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// The node port allocated to the `http-np` port of a service
pub fn node_port(service: &Service) -> Option<i32> {
    service
        .spec
        .as_ref()
        .and_then(|s| s.ports.as_ref())
        .and_then(|ports| ports.iter().find(|p| p.name.as_deref() == Some(NODE_PORT_NAME)))
        .and_then(|p| p.node_port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{node_list_json, pod_json, service_json, MockService};

    const NS: &str = "kube-smoketest";
    const SERVICES_PATH: &str = "/api/v1/namespaces/kube-smoketest/services";

    #[test]
    fn test_cluster_ip_service_shape() {
        let service = smoketest_service("smoketest-service", ServiceKind::ClusterIp);
        let spec = service.spec.unwrap();

        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        let port = &spec.ports.as_ref().unwrap()[0];
        assert_eq!(port.name.as_deref(), Some("http"));
        assert_eq!(port.port, 80);
        assert_eq!(port.target_port, Some(IntOrString::Int(80)));
        assert_eq!(
            spec.selector.unwrap().get(labels::APP).map(String::as_str),
            Some("smoketest")
        );
    }

    #[test]
    fn test_node_port_service_shape() {
        let service = smoketest_service("smoketest-service-np", ServiceKind::NodePort);
        let spec = service.spec.unwrap();

        assert_eq!(spec.type_.as_deref(), Some("NodePort"));
        assert_eq!(spec.ports.unwrap()[0].name.as_deref(), Some("http-np"));
    }

    #[test]
    fn test_candidate_addresses_skip_hostnames() {
        let nodes: k8s_openapi::List<Node> = serde_json::from_str(&node_list_json(&[&[
            ("Hostname", "worker-0"),
            ("InternalIP", "10.0.0.4"),
            ("ExternalIP", "203.0.113.7"),
        ]]))
        .unwrap();

        assert_eq!(
            candidate_addresses(&nodes.items[0]),
            vec!["10.0.0.4".to_string(), "203.0.113.7".to_string()]
        );
    }

    #[test]
    fn test_node_port_lookup() {
        let with_port: Service =
            serde_json::from_str(&service_json(NS, "smoketest-service-np", Some(31080))).unwrap();
        let without_port: Service =
            serde_json::from_str(&service_json(NS, "smoketest-service", None)).unwrap();

        assert_eq!(node_port(&with_port), Some(31080));
        assert_eq!(node_port(&without_port), None);
    }

    #[test]
    fn test_node_port_requires_200() {
        let url = "http://10.0.0.4:31080";

        assert!(expect_ok(url, reqwest::StatusCode::OK).is_ok());
        for status in [
            reqwest::StatusCode::NO_CONTENT,
            reqwest::StatusCode::ACCEPTED,
            reqwest::StatusCode::NOT_FOUND,
        ] {
            let err = expect_ok(url, status).unwrap_err();
            assert!(matches!(err, SmoketestError::ServiceError(ref m) if m.contains(url)));
        }
    }

    #[test]
    fn test_output_reports_success() {
        assert!(output_reports_success(&["Connecting".to_string(), "Success".to_string()]));
        assert!(!output_reports_success(&["Failed".to_string()]));
        assert!(!output_reports_success(&[]));
    }

    #[tokio::test]
    async fn test_existing_service_is_not_retested() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/kube-smoketest/services/smoketest-service",
            200,
            &service_json(NS, "smoketest-service", None),
        );
        let client = mock.clone().into_client();
        let ctx = RunContext::with_deadline_in(Duration::from_secs(10));

        create_service(&client, &ctx, NS, "smoketest-service").await.unwrap();

        assert_eq!(mock.request_count("POST", SERVICES_PATH), 0);
        assert_eq!(
            mock.request_count("POST", "/apis/batch/v1/namespaces/kube-smoketest/jobs"),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_is_tested_through_job() {
        let mock = MockService::new()
            .on_post(
                SERVICES_PATH,
                201,
                &service_json(NS, "smoketest-service", None),
            )
            .on_post(
                "/apis/batch/v1/namespaces/kube-smoketest/jobs",
                201,
                &crate::test_utils::job_json(NS, "smoketest-abcd1234"),
            )
            .on_get(
                "/api/v1/namespaces/kube-smoketest/pods",
                200,
                &crate::test_utils::pod_list_json(NS, &["smoketest-abcd1234-x1"]),
            )
            .on_get(
                "/api/v1/namespaces/kube-smoketest/pods/smoketest-abcd1234-x1",
                200,
                &pod_json(NS, "smoketest-abcd1234-x1", "Succeeded"),
            )
            .on_get(
                "/api/v1/namespaces/kube-smoketest/pods/smoketest-abcd1234-x1/log",
                200,
                "Connecting to smoketest-service\nSuccess\n",
            );
        let client = mock.into_client();
        let ctx = RunContext::with_deadline_in(Duration::from_secs(60));

        create_service(&client, &ctx, NS, "smoketest-service").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_failure_output_is_an_error() {
        let mock = MockService::new()
            .on_post(
                "/apis/batch/v1/namespaces/kube-smoketest/jobs",
                201,
                &crate::test_utils::job_json(NS, "smoketest-abcd1234"),
            )
            .on_get(
                "/api/v1/namespaces/kube-smoketest/pods",
                200,
                &crate::test_utils::pod_list_json(NS, &["smoketest-abcd1234-x1"]),
            )
            .on_get(
                "/api/v1/namespaces/kube-smoketest/pods/smoketest-abcd1234-x1",
                200,
                &pod_json(NS, "smoketest-abcd1234-x1", "Succeeded"),
            )
            .on_get(
                "/api/v1/namespaces/kube-smoketest/pods/smoketest-abcd1234-x1/log",
                200,
                "Failed\n",
            );
        let client = mock.into_client();
        let ctx = RunContext::with_deadline_in(Duration::from_secs(60));

        let err = test_service(&client, &ctx, NS, "smoketest-service")
            .await
            .unwrap_err();
        assert!(matches!(err, SmoketestError::ServiceError(ref m) if m.contains("Success")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_job_pod_is_an_error() {
        let mock = MockService::new().on_get(
            "/api/v1/namespaces/kube-smoketest/pods",
            200,
            &crate::test_utils::pod_list_json(NS, &[]),
        );
        let client = mock.clone().into_client();

        let err = find_job_pod(&client, NS, "smoketest-abcd1234").await.unwrap_err();

        assert!(matches!(err, SmoketestError::ServiceError(_)));
        assert_eq!(
            mock.request_count("GET", "/api/v1/namespaces/kube-smoketest/pods"),
            3
        );
    }
}
