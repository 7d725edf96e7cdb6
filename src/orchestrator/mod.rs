// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sequential execution of a probe plan with fatal/non-fatal failure policy.

pub mod aggregate;
pub mod plan;

pub use aggregate::{ErrorAggregate, ProbeFailure};
pub use plan::{OrchestrationPlan, PlanBuilder, Probe, ProbeStep};

use crate::context::RunContext;
use crate::error::SmoketestError;
use tracing::{error, info, warn};

/// Outcome of one executed probe
#[derive(Debug)]
pub struct ProbeResult {
    pub name: String,
    pub fatal: bool,
    pub error: Option<SmoketestError>,
}

impl ProbeResult {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-probe pass/fail signal kept in the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeStatus {
    pub name: String,
    pub fatal: bool,
    pub passed: bool,
}

/// Finalized result of a run
#[derive(Debug)]
pub struct RunReport {
    failures: ErrorAggregate,
    statuses: Vec<ProbeStatus>,
    aborted: bool,
}

impl RunReport {
    pub fn failures(&self) -> &ErrorAggregate {
        &self.failures
    }

    /// Every probe that ran, in execution order
    pub fn statuses(&self) -> &[ProbeStatus] {
        &self.statuses
    }

    pub fn executed(&self) -> Vec<&str> {
        self.statuses.iter().map(|s| s.name.as_str()).collect()
    }

    /// True when a fatal failure or an expired context cut the plan short
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn last_failed_on_context(&self) -> bool {
        match self.statuses.last() {
            Some(status) if !status.passed => self
                .failures
                .all()
                .last()
                .is_some_and(|f| f.error.is_context_error()),
            _ => false,
        }
    }

    /// Process exit code: the number of recorded failures
    pub fn exit_code(&self) -> i32 {
        i32::try_from(self.failures.len()).unwrap_or(i32::MAX)
    }
}

/// Runs plans one probe at a time
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    skip_teardown: bool,
}

impl Orchestrator {
    /// `skip_teardown` is the debug switch: leave created resources in place
    pub fn new(skip_teardown: bool) -> Self {
        Self { skip_teardown }
    }

    pub async fn run(&self, ctx: &RunContext, plan: &OrchestrationPlan) -> RunReport {
        let mut report = RunReport {
            failures: ErrorAggregate::new(),
            statuses: Vec::with_capacity(plan.steps().len() + 1),
            aborted: false,
        };

        for step in plan.steps() {
            if stop_when_done(ctx, &mut report, &step.name) {
                break;
            }

            let result = self.execute(ctx, step).await;
            let fatal_failure = result.fatal && !result.passed();
            record(&mut report, result);

            if fatal_failure {
                error!("Probe '{}' is fatal, aborting remaining probes", step.name);
                report.aborted = true;
                break;
            }
        }

        if !report.aborted {
            match plan.teardown() {
                Some(step) if self.skip_teardown => {
                    info!("Debug mode set, skipping teardown '{}'", step.name);
                }
                Some(step) => {
                    if !stop_when_done(ctx, &mut report, &step.name) {
                        let result = self.execute(ctx, step).await;
                        record(&mut report, result);
                    }
                }
                None => {}
            }
        }

        if report.is_success() {
            info!("All {} probes passed", report.statuses.len());
        } else {
            error!(
                "fatal: too many errors found, expected: 0, actual: {}",
                report.failures.len()
            );
            for failure in report.failures.iter() {
                error!("  {}", failure);
            }
        }

        report
    }

    async fn execute(&self, ctx: &RunContext, step: &ProbeStep) -> ProbeResult {
        info!("Running probe '{}'", step.name);
        let error = step.run(ctx).await.err();

        match &error {
            None => info!("Probe '{}' passed", step.name),
            Some(e) => error!("Probe '{}' failed: {}", step.name, e),
        }

        ProbeResult {
            name: step.name.clone(),
            fatal: step.fatal,
            error,
        }
    }
}

/// Abort the run when the context is done before `next` starts.
///
/// The expiry counts as one failure. It is charged to `next`, which is logged
/// as not started, unless the previous probe already failed on the context.
fn stop_when_done(ctx: &RunContext, report: &mut RunReport, next: &str) -> bool {
    let Some(err) = ctx.err() else {
        return false;
    };
    report.aborted = true;

    if report.last_failed_on_context() {
        warn!("Probe '{}' not started: {}", next, err);
    } else {
        warn!("Probe '{}' not started, run context done: {}", next, err);
        report.failures.append(next.to_string(), err.into());
    }
    true
}

fn record(report: &mut RunReport, result: ProbeResult) {
    report.statuses.push(ProbeStatus {
        name: result.name.clone(),
        fatal: result.fatal,
        passed: result.passed(),
    });
    if let Some(error) = result.error {
        report.failures.append(result.name, error);
    }
}
