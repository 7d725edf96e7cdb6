// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret probe

use crate::error::{Result, SmoketestError};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::{
    api::{ObjectMeta, PostParams},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// An Opaque secret holding a single key
pub fn smoketest_secret(name: &str, key: &str, value: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(BTreeMap::from([(
            key.to_string(),
            ByteString(value.as_bytes().to_vec()),
        )])),
        ..Default::default()
    }
}

/// Create the test secret unless it exists
#[instrument(skip(client, value))]
pub async fn create_secret(
    client: &Client,
    namespace: &str,
    name: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);

    match secrets.get(name).await {
        Ok(_) => {
            debug!("Secret {} already exists, not creating a new one", name);
            return Ok(());
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {}
        Err(e) => {
            return Err(SmoketestError::SecretError(format!(
                "Failed to check secret {}: {}",
                name, e
            )))
        }
    }

    secrets
        .create(&PostParams::default(), &smoketest_secret(name, key, value))
        .await
        .map_err(|e| {
            SmoketestError::SecretError(format!("Failed to create secret {}: {}", name, e))
        })?;

    info!("Successfully created secret {}", name);
    Ok(())
}
