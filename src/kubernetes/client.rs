// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client creation from a kubeconfig file

use crate::config::Config;
use crate::error::{Result, SmoketestError};
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Client,
};
use std::path::Path;
use tracing::{info, instrument};

/// Create a Kubernetes client from the kubeconfig the configuration points at
#[instrument(skip(config), fields(kubeconfig = %config.kubeconfig.display()))]
pub async fn create_client(config: &Config) -> Result<Client> {
    let kubeconfig = read_kubeconfig(&config.kubeconfig).await?;
    let client = create_client_from_kubeconfig(&kubeconfig).await?;
    info!("Connected to Kubernetes cluster");
    Ok(client)
}

async fn read_kubeconfig(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        SmoketestError::KubeconfigError(format!(
            "Failed to read kubeconfig {}: {}",
            path.display(),
            e
        ))
    })
}

/// Create a Kubernetes client from a kubeconfig string
async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| SmoketestError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                SmoketestError::KubeconfigError(format!("Failed to create config: {}", e))
            })?;

    Client::try_from(client_config)
        .map_err(|e| SmoketestError::KubeconfigError(format!("Failed to create client: {}", e)))
}
