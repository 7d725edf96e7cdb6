// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Ordered collection of probe failures for one run.

use crate::error::SmoketestError;
use std::fmt;

/// A recorded failure together with the probe that produced it
#[derive(Debug)]
pub struct ProbeFailure {
    pub probe: String,
    pub error: SmoketestError,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.probe, self.error)
    }
}

/// Append-only list of failures, in the order the probes ran.
///
/// An empty aggregate is the only success state.
#[derive(Debug, Default)]
pub struct ErrorAggregate {
    failures: Vec<ProbeFailure>,
}

impl ErrorAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, probe: impl Into<String>, error: SmoketestError) {
        self.failures.push(ProbeFailure {
            probe: probe.into(),
            error,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn all(&self) -> &[ProbeFailure] {
        &self.failures
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProbeFailure> {
        self.failures.iter()
    }

    /// Names of the failed probes, in order
    pub fn probes(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.probe.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a ErrorAggregate {
    type Item = &'a ProbeFailure;
    type IntoIter = std::slice::Iter<'a, ProbeFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}
