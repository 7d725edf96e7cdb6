// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;

type Route = (String, String);

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// A route may hold a sequence of responses; they are served in order and the
/// last one keeps being served once the others are used up.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<Route, VecDeque<(u16, String)>>>>,
    requests: Arc<Mutex<Vec<Route>>>,
    latency: Option<Duration>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            latency: None,
        }
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, vec![(status, body.to_string())])
    }

    /// Add a sequence of responses for GET requests matching the path
    pub fn on_get_sequence(self, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.on("GET", path, responses)
    }

    /// Add a response for POST requests matching the path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, vec![(status, body.to_string())])
    }

    /// Add a response for DELETE requests matching the path
    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, vec![(status, body.to_string())])
    }

    fn on(self, method: &str, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), responses.into());
        self
    }

    /// Delay every response, to simulate an API server that hangs
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Number of requests seen for a method and exact path
    pub fn request_count(&self, method: &str, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();

        // Exact match first, then the longest registered prefix
        let exact = (method.to_string(), path.to_string());
        let key = if responses.contains_key(&exact) {
            exact
        } else {
            responses
                .keys()
                .filter(|(m, p)| m == method && path.starts_with(p.as_str()))
                .max_by_key(|(_, p)| p.len())
                .cloned()?
        };

        let queue = responses.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));
        let response = self.find_response(&method, &path);
        let latency = self.latency;

        Box::pin(async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            let (status, body) =
                response.unwrap_or_else(|| (404, not_found_json("resource", &path)));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a mock pod JSON response in the given phase
pub fn pod_json(namespace: &str, name: &str, phase: &str) -> String {
    serde_json::to_string(&pod_value(namespace, name, phase)).unwrap()
}

/// Create a mock pod list JSON response
pub fn pod_list_json(namespace: &str, names: &[&str]) -> String {
    let items: Vec<_> = names
        .iter()
        .map(|name| pod_value(namespace, name, "Running"))
        .collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "PodList",
        "metadata": {},
        "items": items
    })
    .to_string()
}

fn pod_value(namespace: &str, name: &str, phase: &str) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("{}-uid", name)
        },
        "spec": {
            "containers": [{ "name": "yolo", "image": "alpine" }]
        },
        "status": { "phase": phase }
    })
}

/// Create a mock deployment JSON response with the given available replica count
pub fn deployment_json(namespace: &str, name: &str, available: Option<i32>) -> String {
    let status = match available {
        Some(n) => serde_json::json!({ "availableReplicas": n }),
        None => serde_json::json!({}),
    };
    serde_json::json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid"
        },
        "spec": {
            "replicas": 2,
            "selector": { "matchLabels": { "app": "smoketest" } },
            "template": {
                "metadata": { "labels": { "app": "smoketest" } },
                "spec": { "containers": [{ "name": "webserver", "image": "nginx" }] }
            }
        },
        "status": status
    })
    .to_string()
}

/// Create a mock service JSON response
pub fn service_json(namespace: &str, name: &str, node_port: Option<i32>) -> String {
    let mut port = serde_json::json!({ "name": "http", "port": 80, "protocol": "TCP" });
    if let Some(node_port) = node_port {
        port["name"] = serde_json::json!("http-np");
        port["nodePort"] = serde_json::json!(node_port);
    }
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid"
        },
        "spec": {
            "selector": { "app": "smoketest" },
            "ports": [port]
        }
    })
    .to_string()
}

/// Create a mock secret JSON response
pub fn secret_json(namespace: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid"
        },
        "type": "Opaque",
        "data": { "user": "YWRtaW4=" }
    })
    .to_string()
}

/// Create a mock job JSON response
pub fn job_json(namespace: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "batch/v1",
        "kind": "Job",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "test-uid"
        },
        "spec": {
            "template": {
                "spec": {
                    "restartPolicy": "Never",
                    "containers": [{ "name": "box", "image": "busybox" }]
                }
            }
        }
    })
    .to_string()
}

/// Create a mock node list JSON response, one node per address set
pub fn node_list_json(nodes: &[&[(&str, &str)]]) -> String {
    let items: Vec<_> = nodes
        .iter()
        .enumerate()
        .map(|(i, addresses)| {
            let addresses: Vec<_> = addresses
                .iter()
                .map(|(kind, address)| serde_json::json!({ "type": kind, "address": address }))
                .collect();
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "Node",
                "metadata": { "name": format!("node-{}", i) },
                "status": { "addresses": addresses }
            })
        })
        .collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "NodeList",
        "metadata": {},
        "items": items
    })
    .to_string()
}

/// Create a mock component status list JSON response
pub fn component_status_list_json(components: &[(&str, &str)]) -> String {
    let items: Vec<_> = components
        .iter()
        .map(|(name, healthy)| {
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "ComponentStatus",
                "metadata": { "name": name },
                "conditions": [{ "type": "Healthy", "status": healthy, "message": "ok" }]
            })
        })
        .collect();
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "ComponentStatusList",
        "metadata": {},
        "items": items
    })
    .to_string()
}

/// Create a mock v1 Status response, as returned by deletes
pub fn status_json() -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Success",
        "code": 200
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// Create a 500 internal error response
pub fn server_error_json() -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": "etcdserver: request timed out",
        "reason": "InternalError",
        "code": 500
    })
    .to_string()
}
