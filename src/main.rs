// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kube_smoketest::cli::Cli;
use kube_smoketest::config::Config;
use kube_smoketest::context::RunContext;
use kube_smoketest::kubernetes::create_client;
use kube_smoketest::orchestrator::Orchestrator;
use kube_smoketest::suite::Suite;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?
        .with_debug(cli.debug)
        .with_run_timeout(cli.run_timeout());
    info!(
        "Starting smoke tests: namespace={}, profile={:?}, timeout={:?}",
        config.namespace, cli.profile, config.run_timeout
    );

    let client = create_client(&config).await?;
    let ctx = RunContext::with_deadline_in(config.run_timeout);
    let orchestrator = Orchestrator::new(config.debug);

    let plan = Suite::new(client, config).plan(cli.profile);
    let report = orchestrator.run(&ctx, &plan).await;

    std::process::exit(report.exit_code());
}
