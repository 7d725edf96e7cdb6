// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Smoke test configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Namespace all test resources are created in
    pub namespace: String,
    pub deployment_name: String,
    pub service_name: String,
    pub node_port_service_name: String,
    pub secret_name: String,
    pub secret_key: String,
    pub secret_value: String,
    /// Path to the kubeconfig used to reach the cluster
    pub kubeconfig: PathBuf,
    pub etcd: EtcdConfig,
    /// Overall deadline for the whole run
    pub run_timeout: Duration,
    /// Leave test resources in place after the run
    pub debug: bool,
}

/// Client TLS material and port used to inspect etcd directly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtcdConfig {
    pub port: u16,
    pub ca: PathBuf,
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for EtcdConfig {
    fn default() -> Self {
        Self {
            port: defaults::ETCD_PORT,
            ca: PathBuf::from(defaults::ETCD_CA),
            cert: PathBuf::from(defaults::ETCD_CERT),
            key: PathBuf::from(defaults::ETCD_KEY),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: defaults::NAMESPACE.to_string(),
            deployment_name: defaults::DEPLOYMENT_NAME.to_string(),
            service_name: defaults::SERVICE_NAME.to_string(),
            node_port_service_name: defaults::NODE_PORT_SERVICE_NAME.to_string(),
            secret_name: defaults::SECRET_NAME.to_string(),
            secret_key: defaults::SECRET_KEY.to_string(),
            secret_value: defaults::SECRET_VALUE.to_string(),
            kubeconfig: default_kubeconfig_path(),
            etcd: EtcdConfig::default(),
            run_timeout: Duration::from_secs(defaults::RUN_TIMEOUT_SECS),
            debug: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(namespace) = env::var("SMOKETEST_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Ok(kubeconfig) = env::var("KUBECONFIG") {
            if !kubeconfig.is_empty() {
                config.kubeconfig = PathBuf::from(kubeconfig);
            }
        }
        if let Ok(port) = env::var("SMOKETEST_ETCD_PORT") {
            config.etcd.port = port
                .parse()
                .with_context(|| format!("SMOKETEST_ETCD_PORT is not a valid port: {}", port))?;
        }
        if let Ok(ca) = env::var("SMOKETEST_ETCD_CA") {
            config.etcd.ca = PathBuf::from(ca);
        }
        if let Ok(cert) = env::var("SMOKETEST_ETCD_CERT") {
            config.etcd.cert = PathBuf::from(cert);
        }
        if let Ok(key) = env::var("SMOKETEST_ETCD_KEY") {
            config.etcd.key = PathBuf::from(key);
        }

        Ok(config)
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }
}

fn default_kubeconfig_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".kube")
        .join("config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.namespace, "kube-smoketest");
        assert_eq!(config.deployment_name, "smoketest");
        assert_eq!(config.service_name, "smoketest-service");
        assert_eq!(config.node_port_service_name, "smoketest-service-np");
        assert_eq!(config.secret_name, "smoketest-secret");
        assert_eq!(config.run_timeout, Duration::from_secs(300));
        assert_eq!(config.etcd.port, 2379);
        assert!(config.kubeconfig.ends_with(".kube/config"));
        assert!(!config.debug);
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_debug(true)
            .with_run_timeout(Duration::from_secs(30));

        assert!(config.debug);
        assert_eq!(config.run_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_independent_configs_do_not_share_state() {
        let mut first = Config::default();
        first.namespace = "smoke-a".to_string();
        let second = Config::default();

        assert_eq!(first.namespace, "smoke-a");
        assert_eq!(second.namespace, "kube-smoketest");
    }
}
