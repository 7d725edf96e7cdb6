// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command line flags.

use crate::constants::defaults;
use crate::suite::Profile;
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "kube-smoketest", version, about = "Run smoke tests against a Kubernetes cluster")]
pub struct Cli {
    /// Do not delete the test namespace at the end of the run. Before re-running,
    /// delete the namespace manually and wait for it to be gone.
    #[arg(long)]
    pub debug: bool,

    /// Overall deadline for the whole run, in seconds
    #[arg(long, default_value_t = defaults::RUN_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Which set of probes to run
    #[arg(long, value_enum, default_value_t = Profile::Full)]
    pub profile: Profile,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Default log filter when RUST_LOG is not set
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["kube-smoketest"]);

        assert!(!cli.debug);
        assert_eq!(cli.run_timeout(), Duration::from_secs(300));
        assert_eq!(cli.profile, Profile::Full);
        assert_eq!(cli.log_level(), "info");
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "kube-smoketest",
            "--debug",
            "--timeout",
            "60",
            "--profile",
            "minimal",
            "-vv",
        ]);

        assert!(cli.debug);
        assert_eq!(cli.run_timeout(), Duration::from_secs(60));
        assert_eq!(cli.profile, Profile::Minimal);
        assert_eq!(cli.log_level(), "trace");
    }
}
