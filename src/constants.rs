// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Default values for [`crate::config::Config`]
pub mod defaults {
    /// Namespace every smoke test resource is created in
    pub const NAMESPACE: &str = "kube-smoketest";
    pub const DEPLOYMENT_NAME: &str = "smoketest";
    pub const SERVICE_NAME: &str = "smoketest-service";
    pub const NODE_PORT_SERVICE_NAME: &str = "smoketest-service-np";
    pub const SECRET_NAME: &str = "smoketest-secret";
    pub const SECRET_KEY: &str = "user";
    pub const SECRET_VALUE: &str = "admin";
    /// Overall run deadline in seconds
    pub const RUN_TIMEOUT_SECS: u64 = 300;
    pub const ETCD_PORT: u16 = 2379;
    pub const ETCD_CA: &str = "./etcd.ca";
    pub const ETCD_CERT: &str = "./etcd.crt";
    pub const ETCD_KEY: &str = "./etcd.key";
}

/// Condition polling configuration
pub mod poll {
    /// Lower bound of the backoff band in milliseconds
    pub const BACKOFF_MIN_MILLIS: u64 = 1_000;
    /// Upper bound of the backoff band in milliseconds
    pub const BACKOFF_MAX_MILLIS: u64 = 5_000;
    /// Fixed interval used while waiting for a new namespace to be readable
    pub const NAMESPACE_INTERVAL_SECS: u64 = 2;
    /// How often to look for the pod a test job spawned
    pub const JOB_POD_LOOKUP_ATTEMPTS: u32 = 3;
    /// How often to retry the NodePort HTTP request after the first failure
    pub const NODE_PORT_RETRIES: u32 = 3;
}

/// Label keys and values put on (or read from) smoke test resources
pub mod labels {
    pub const TEST_NAME: &str = "testName";
    pub const APP: &str = "app";
    pub const APP_VALUE: &str = "smoketest";
    pub const PART_OF: &str = "part-of";
    pub const JOB_NAME: &str = "job-name";
    pub const CONTROL_PLANE_NODE: &str = "node-role.kubernetes.io/control-plane";
    pub const MASTER_NODE: &str = "node-role.kubernetes.io/master";
}

/// Number of log lines fetched from test pods
pub const LOG_TAIL_LINES: i64 = 10;

/// Marker the API server prefixes encrypted values with in etcd
pub const ENCRYPTION_MARKER: &str = ":enc:";
