// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan/dispatch cycle
//!
//! One cycle walks every rule independently: match files, fan them out to
//! each of the rule's remotes in order, then clean up according to the
//! cleanup policy. Nothing a single rule, remote, or file does can abort
//! the cycle for other rules.

use crate::cleanup::Ledger;
use crate::error::DispatchError;
use crate::registry::{HandlerRegistry, RemoteRegistry};
use srcdsup_core::{
    CleanupPolicy, FileResult, MatchedFile, RemoteDestination, RuleMatcher, UploadRule,
};
use std::fmt;
use std::sync::Arc;

/// Where the orchestrator is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Scanning,
    Dispatching,
    CleaningUp,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Scanning => write!(f, "scanning"),
            Phase::Dispatching => write!(f, "dispatching"),
            Phase::CleaningUp => write!(f, "cleaning_up"),
        }
    }
}

/// What happened to one rule during a cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleReport {
    pub rule: String,
    /// Files offered after ordering and hold back
    pub matched: usize,
    /// Files sent to at least one handler
    pub dispatched: usize,
    /// Delivered outcomes, counted per file and remote
    pub delivered: usize,
    /// Failed outcomes, counted per file and remote
    pub failed: usize,
    /// Files some remote left for a later cycle
    pub deferred: usize,
    /// Files removed from disk
    pub removed: usize,
    /// Why the rule was skipped this cycle
    pub aborted: Option<String>,
}

impl RuleReport {
    fn new(rule: &UploadRule) -> Self {
        Self {
            rule: rule.name.clone(),
            ..Self::default()
        }
    }
}

/// Result of one scan cycle across all rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub rules: Vec<RuleReport>,
}

impl CycleReport {
    pub fn rule(&self, name: &str) -> Option<&RuleReport> {
        self.rules.iter().find(|r| r.rule == name)
    }

    pub fn delivered(&self) -> usize {
        self.rules.iter().map(|r| r.delivered).sum()
    }

    pub fn failed(&self) -> usize {
        self.rules.iter().map(|r| r.failed).sum()
    }

    pub fn removed(&self) -> usize {
        self.rules.iter().map(|r| r.removed).sum()
    }

    pub fn aborted(&self) -> usize {
        self.rules.iter().filter(|r| r.aborted.is_some()).count()
    }
}

/// Drives scan cycles over a fixed set of rules
pub struct Orchestrator {
    rules: Vec<UploadRule>,
    remotes: Arc<RemoteRegistry>,
    handlers: HandlerRegistry,
    matcher: RuleMatcher,
    cleanup: CleanupPolicy,
    phase: Phase,
}

impl Orchestrator {
    pub fn new(
        rules: Vec<UploadRule>,
        remotes: Arc<RemoteRegistry>,
        handlers: HandlerRegistry,
        cleanup: CleanupPolicy,
    ) -> Self {
        Self {
            rules,
            remotes,
            handlers,
            matcher: RuleMatcher::new(),
            cleanup,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rules(&self) -> &[UploadRule] {
        &self.rules
    }

    fn enter(&mut self, phase: Phase) {
        tracing::trace!(from = %self.phase, to = %phase, "phase");
        self.phase = phase;
    }

    /// Run one full cycle over every rule
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        for index in 0..self.rules.len() {
            let rule = self.rules[index].clone();
            let rule_report = self.process_rule(&rule).await;
            if let Some(reason) = &rule_report.aborted {
                tracing::error!(rule = %rule.name, error = %reason, "rule skipped this cycle");
            }
            report.rules.push(rule_report);
        }
        self.enter(Phase::Idle);
        report
    }

    async fn process_rule(&mut self, rule: &UploadRule) -> RuleReport {
        let mut report = RuleReport::new(rule);

        self.enter(Phase::Scanning);
        let files = match self.matcher.resolve(rule) {
            Ok(files) => files,
            Err(e) => {
                report.aborted = Some(DispatchError::from(e).to_string());
                return report;
            }
        };
        report.matched = files.len();
        if files.is_empty() {
            return report;
        }

        // Every remote must resolve before anything is sent
        let targets = match self.resolve_targets(rule) {
            Ok(t) => t,
            Err(e) => {
                report.aborted = Some(e.to_string());
                return report;
            }
        };

        let mut ledger = Ledger::new(targets.len());
        let eligible = screen_metadata(rule, files, &mut ledger);
        report.dispatched = eligible.len();

        self.enter(Phase::Dispatching);
        for (remote, handler) in &targets {
            if eligible.is_empty() {
                break;
            }
            match handler.deliver(rule, remote, &eligible).await {
                Ok(results) => {
                    log_results(rule, remote, &results);
                    ledger.record(&eligible, &results);
                }
                Err(e) => {
                    tracing::error!(
                        rule = %rule.name,
                        remote = %remote.name,
                        error = %e,
                        "remote failed, continuing with next"
                    );
                    ledger.record_batch_failure(&eligible, &e.to_string());
                }
            }
        }

        self.enter(Phase::CleaningUp);
        report.delivered = ledger.delivered_count();
        report.failed = ledger.failed_count();
        report.deferred = ledger.deferred_count();
        report.removed = ledger.clean_up(rule, self.cleanup);
        report
    }

    fn resolve_targets(
        &self,
        rule: &UploadRule,
    ) -> Result<Vec<(RemoteDestination, Arc<dyn srcdsup_adapters::UploadHandler>)>, DispatchError>
    {
        self.remotes
            .resolve_all(&rule.remotes)?
            .into_iter()
            .map(|remote| {
                let handler = self.handlers.for_remote(remote)?;
                Ok((remote.clone(), handler))
            })
            .collect()
    }
}

/// Fail files whose required sidecar is missing; the rest go out
fn screen_metadata(
    rule: &UploadRule,
    files: Vec<MatchedFile>,
    ledger: &mut Ledger,
) -> Vec<MatchedFile> {
    if !rule.require_metadata {
        return files;
    }
    let (eligible, missing): (Vec<_>, Vec<_>) =
        files.into_iter().partition(|f| f.sidecar.is_some());
    for file in &missing {
        tracing::error!(
            rule = %rule.name,
            file = %file.path.display(),
            "required sidecar metadata missing"
        );
        ledger.record_data_error(&file.path);
    }
    eligible
}

fn log_results(rule: &UploadRule, remote: &RemoteDestination, results: &[FileResult]) {
    for result in results {
        if !result.outcome.is_delivered() {
            tracing::warn!(
                rule = %rule.name,
                remote = %remote.name,
                file = %result.path.display(),
                outcome = %result.outcome,
                "file not delivered"
            );
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
