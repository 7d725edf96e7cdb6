// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes client creation and the cluster probes that exercise it.

pub mod client;
pub mod components;
pub mod conditions;
pub mod deployments;
pub mod etcd;
pub mod jobs;
pub mod namespaces;
pub mod pods;
pub mod secrets;
pub mod services;

pub use client::create_client;
pub use conditions::KubeConditions;
pub use namespaces::{create_namespace, delete_namespace};
