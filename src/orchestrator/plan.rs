// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Declarative, ordered list of probes for one run.

use crate::context::RunContext;
use crate::error::Result;
use futures::future::BoxFuture;
use std::fmt;

/// A unit of work exercising one cluster feature
pub trait Probe: Send + Sync {
    fn run<'a>(&'a self, ctx: &'a RunContext) -> BoxFuture<'a, Result<()>>;
}

/// Adapter so plain closures can be used as probes
struct FnProbe<F>(F);

impl<F> Probe for FnProbe<F>
where
    F: for<'a> Fn(&'a RunContext) -> BoxFuture<'a, Result<()>> + Send + Sync,
{
    fn run<'a>(&'a self, ctx: &'a RunContext) -> BoxFuture<'a, Result<()>> {
        (self.0)(ctx)
    }
}

/// A probe together with its name and failure policy
pub struct ProbeStep {
    pub name: String,
    /// Abort the remaining plan when this probe fails
    pub fatal: bool,
    probe: Box<dyn Probe>,
}

impl ProbeStep {
    pub fn new(name: impl Into<String>, fatal: bool, probe: impl Probe + 'static) -> Self {
        Self {
            name: name.into(),
            fatal,
            probe: Box::new(probe),
        }
    }

    pub fn from_fn<F>(name: impl Into<String>, fatal: bool, f: F) -> Self
    where
        F: for<'a> Fn(&'a RunContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        Self::new(name, fatal, FnProbe(f))
    }

    pub(crate) fn run<'a>(&'a self, ctx: &'a RunContext) -> BoxFuture<'a, Result<()>> {
        self.probe.run(ctx)
    }
}

impl fmt::Debug for ProbeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeStep")
            .field("name", &self.name)
            .field("fatal", &self.fatal)
            .finish()
    }
}

/// Ordered probes plus an optional trailing teardown
#[derive(Debug, Default)]
pub struct OrchestrationPlan {
    steps: Vec<ProbeStep>,
    teardown: Option<ProbeStep>,
}

impl OrchestrationPlan {
    pub fn builder() -> PlanBuilder {
        PlanBuilder::default()
    }

    pub fn steps(&self) -> &[ProbeStep] {
        &self.steps
    }

    pub fn teardown(&self) -> Option<&ProbeStep> {
        self.teardown.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct PlanBuilder {
    steps: Vec<ProbeStep>,
    teardown: Option<ProbeStep>,
}

impl PlanBuilder {
    pub fn step(mut self, step: ProbeStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Teardown failures are always recorded as non-fatal
    pub fn teardown(mut self, name: impl Into<String>, probe: impl Probe + 'static) -> Self {
        self.teardown = Some(ProbeStep::new(name, false, probe));
        self
    }

    pub fn teardown_step(mut self, mut step: ProbeStep) -> Self {
        step.fatal = false;
        self.teardown = Some(step);
        self
    }

    pub fn build(self) -> OrchestrationPlan {
        OrchestrationPlan {
            steps: self.steps,
            teardown: self.teardown,
        }
    }
}
