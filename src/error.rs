// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

use crate::context::ContextError;

#[derive(Error, Debug)]
pub enum SmoketestError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("context cancelled")]
    Cancelled,

    #[error("unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("not yet implemented: waiting for {0}")]
    NotImplemented(String),

    #[error("Component status check failed: {0}")]
    ComponentStatusError(String),

    #[error("Namespace operation failed: {0}")]
    NamespaceError(String),

    #[error("Pod check failed: {0}")]
    PodError(String),

    #[error("Deployment check failed: {0}")]
    DeploymentError(String),

    #[error("Service check failed: {0}")]
    ServiceError(String),

    #[error("Secret check failed: {0}")]
    SecretError(String),

    #[error("etcd inspection failed: {0}")]
    EtcdError(String),
}

impl From<ContextError> for SmoketestError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::DeadlineExceeded => SmoketestError::DeadlineExceeded,
            ContextError::Cancelled => SmoketestError::Cancelled,
        }
    }
}

impl SmoketestError {
    /// True for errors produced by an expired or cancelled run context
    pub fn is_context_error(&self) -> bool {
        matches!(
            self,
            SmoketestError::DeadlineExceeded | SmoketestError::Cancelled
        )
    }
}

pub type Result<T> = std::result::Result<T, SmoketestError>;
