// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Encryption-at-rest check: reads the test secret straight from etcd.
//!
//! Only stacked control planes are supported, etcd is expected on the
//! InternalIP of every control-plane node. Requests go through the etcd v3
//! JSON gateway, so keys and values travel base64 encoded.

use crate::config::EtcdConfig;
use crate::constants::{labels, ENCRYPTION_MARKER};
use crate::context::RunContext;
use crate::error::{Result, SmoketestError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use k8s_openapi::api::core::v1::Node;
use kube::{api::ListParams, Api, Client};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument, trace, warn};

const MEMBER_LIST_PATH: &str = "/v3/cluster/member/list";
const RANGE_PATH: &str = "/v3/kv/range";

#[derive(Debug, Default, Deserialize)]
pub struct RangeResponse {
    #[serde(default)]
    pub kvs: Vec<KeyValue>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeyValue {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Key the API server stores a secret under
pub fn registry_key(namespace: &str, name: &str) -> String {
    format!("/registry/secrets/{}/{}", namespace, name)
}

/// Body of a v3 range request for a single key
pub fn range_request(key: &str) -> serde_json::Value {
    serde_json::json!({ "key": STANDARD.encode(key) })
}

/// Decode the base64 values of a range response
pub fn decode_values(response: &RangeResponse) -> Result<Vec<Vec<u8>>> {
    response
        .kvs
        .iter()
        .map(|kv| {
            STANDARD
                .decode(&kv.value)
                .map_err(|e| SmoketestError::EtcdError(format!("invalid value encoding: {}", e)))
        })
        .collect()
}

/// Whether a stored value carries the encryption provider prefix
pub fn is_encrypted(value: &[u8]) -> bool {
    let marker = ENCRYPTION_MARKER.as_bytes();
    value.windows(marker.len()).any(|w| w == marker)
}

fn internal_ips(node: &Node) -> impl Iterator<Item = &str> {
    node.status
        .iter()
        .filter_map(|s| s.addresses.as_ref())
        .flatten()
        .filter(|a| a.type_ == "InternalIP")
        .map(|a| a.address.as_str())
}

/// etcd client URLs of all control-plane nodes
#[instrument(skip(client))]
pub async fn etcd_endpoints(client: &Client, port: u16) -> Result<Vec<String>> {
    let nodes: Api<Node> = Api::all(client.clone());

    let mut control_plane = nodes
        .list(&ListParams::default().labels(labels::CONTROL_PLANE_NODE))
        .await?
        .items;
    if control_plane.is_empty() {
        debug!("No nodes labelled {}, trying {}", labels::CONTROL_PLANE_NODE, labels::MASTER_NODE);
        control_plane = nodes
            .list(&ListParams::default().labels(labels::MASTER_NODE))
            .await?
            .items;
    }

    let endpoints: Vec<String> = control_plane
        .iter()
        .flat_map(internal_ips)
        .map(|ip| format!("https://{}:{}", ip, port))
        .collect();
    trace!("list of etcd endpoints found: {:?}", endpoints);
    Ok(endpoints)
}

async fn read_pem(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        SmoketestError::EtcdError(format!(
            "failed to read {}: {}; please ensure etcd.ca, etcd.crt and etcd.key are present",
            path.display(),
            e
        ))
    })
}

/// HTTP client presenting the etcd client certificate
pub async fn etcd_http_client(config: &EtcdConfig) -> Result<reqwest::Client> {
    debug!(
        "configuring etcd client with ca={} cert={} key={}",
        config.ca.display(),
        config.cert.display(),
        config.key.display()
    );
    let ca = read_pem(&config.ca).await?;
    let mut identity = read_pem(&config.cert).await?;
    identity.push(b'\n');
    identity.extend(read_pem(&config.key).await?);

    let ca = reqwest::Certificate::from_pem(&ca)
        .map_err(|e| SmoketestError::EtcdError(format!("invalid etcd CA: {}", e)))?;
    let identity = reqwest::Identity::from_pem(&identity)
        .map_err(|e| SmoketestError::EtcdError(format!("invalid etcd cert/key: {}", e)))?;

    let http = reqwest::Client::builder()
        .add_root_certificate(ca)
        .identity(identity)
        .connect_timeout(Duration::from_secs(1))
        .timeout(Duration::from_secs(5))
        .build()?;
    Ok(http)
}

async fn post_json<T: for<'de> Deserialize<'de>>(
    http: &reqwest::Client,
    url: &str,
    body: &serde_json::Value,
) -> std::result::Result<T, reqwest::Error> {
    http.post(url)
        .json(body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// First endpoint that answers a member list call
async fn reachable_endpoint<'a>(
    http: &reqwest::Client,
    ctx: &RunContext,
    endpoints: &'a [String],
) -> Result<&'a str> {
    let mut last_error = None;
    for endpoint in endpoints {
        let url = format!("{}{}", endpoint, MEMBER_LIST_PATH);
        match ctx
            .run(post_json::<serde_json::Value>(http, &url, &serde_json::json!({})))
            .await?
        {
            Ok(members) => {
                trace!("etcd members: {}", members);
                return Ok(endpoint);
            }
            Err(e) => {
                debug!("etcd endpoint {} not usable: {}", endpoint, e);
                last_error = Some(e);
            }
        }
    }

    Err(SmoketestError::EtcdError(format!(
        "failed to get etcd members using endpoint/s {:?}: {}",
        endpoints,
        last_error.map_or_else(|| "no endpoints".to_string(), |e| e.to_string())
    )))
}

/// Read the secret from etcd and warn when it is stored unencrypted
#[instrument(skip(client, ctx, config))]
pub async fn verify_secret_encryption(
    client: &Client,
    ctx: &RunContext,
    config: &EtcdConfig,
    namespace: &str,
    secret_name: &str,
) -> Result<()> {
    debug!("start verifying secret is encrypted");
    let endpoints = etcd_endpoints(client, config.port).await?;
    if endpoints.is_empty() {
        return Err(SmoketestError::EtcdError(
            "no control-plane nodes with an InternalIP found".to_string(),
        ));
    }

    let http = etcd_http_client(config).await?;
    let endpoint = reachable_endpoint(&http, ctx, &endpoints).await?;

    let key = registry_key(namespace, secret_name);
    let url = format!("{}{}", endpoint, RANGE_PATH);
    let response: RangeResponse = ctx
        .run(post_json(&http, &url, &range_request(&key)))
        .await?
        .map_err(|e| SmoketestError::EtcdError(format!("failed to get etcd key {}: {}", key, e)))?;

    for value in decode_values(&response)? {
        trace!("secret contents: {}", String::from_utf8_lossy(&value));
        if !is_encrypted(&value) {
            warn!("the kubernetes secret {:?} is not encrypted at rest", secret_name);
        }
    }

    Ok(())
}
