// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test namespace creation and teardown

use crate::constants::poll::NAMESPACE_INTERVAL_SECS;
use crate::context::RunContext;
use crate::error::{Result, SmoketestError};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{DeleteParams, ObjectMeta, PostParams},
    Api, Client,
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Create the test namespace unless it already exists, then wait until it can be read back
#[instrument(skip(client, ctx))]
pub async fn create_namespace(client: &Client, ctx: &RunContext, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.get(namespace).await {
        Ok(_) => {
            info!("Namespace {} exists, not creating", namespace);
            return Ok(());
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {}
        Err(e) => {
            return Err(SmoketestError::NamespaceError(format!(
                "Failed to check namespace {}: {}",
                namespace, e
            )))
        }
    }

    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    namespaces
        .create(&PostParams::default(), &ns)
        .await
        .map_err(|e| {
            warn!("Failed to create namespace {}: {}", namespace, e);
            SmoketestError::NamespaceError(format!(
                "Failed to create namespace {}: {}",
                namespace, e
            ))
        })?;

    loop {
        tokio::select! {
            biased;
            err = ctx.done() => return Err(err.into()),
            _ = sleep(Duration::from_secs(NAMESPACE_INTERVAL_SECS)) => {}
        }
        match namespaces.get(namespace).await {
            Ok(_) => break,
            Err(e) => debug!("Namespace {} not readable yet: {}", namespace, e),
        }
    }

    info!("Namespace {} created", namespace);
    Ok(())
}

/// Delete the test namespace
#[instrument(skip(client))]
pub async fn delete_namespace(client: &Client, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    namespaces
        .delete(namespace, &DeleteParams::default())
        .await
        .map_err(|e| {
            warn!("Failed to delete namespace {}: {}", namespace, e);
            SmoketestError::NamespaceError(format!(
                "Failed to delete namespace {}: {}",
                namespace, e
            ))
        })?;

    info!("Namespace {} deleted", namespace);
    Ok(())
}
