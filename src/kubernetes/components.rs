// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Control plane component health

use crate::error::{Result, SmoketestError};
use k8s_openapi::api::core::v1::ComponentStatus;
use kube::{api::ListParams, Api, Client, ResourceExt};
use tracing::{debug, instrument, warn};

/// List component statuses and fail on any component reporting unhealthy
#[instrument(skip(client))]
pub async fn check_component_status(client: &Client) -> Result<()> {
    let components: Api<ComponentStatus> = Api::all(client.clone());
    let statuses = components
        .list(&ListParams::default())
        .await
        .map_err(|e| {
            SmoketestError::ComponentStatusError(format!("Failed to list component statuses: {}", e))
        })?;

    let mut unhealthy = Vec::new();
    for status in &statuses.items {
        let name = status.name_any();
        for cond in status.conditions.iter().flatten() {
            debug!(
                "component={} health={} msg={:?} error={:?}",
                name, cond.status, cond.message, cond.error
            );
            if cond.type_ == "Healthy" && cond.status != "True" {
                warn!("Component {} is not healthy", name);
                unhealthy.push(name.clone());
            }
        }
    }

    if !unhealthy.is_empty() {
        return Err(SmoketestError::ComponentStatusError(format!(
            "unhealthy components: {}",
            unhealthy.join(", ")
        )));
    }
    Ok(())
}
