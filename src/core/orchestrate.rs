//! Orchestrator: runs the requested operations over every discovered store.
//!
//! One store failing never stops the rest. Stores are handled one at a time by
//! default; with `parallel` each distinct path gets its own rayon task, which
//! keeps the one-operation-per-path rule since discovery never yields a path
//! twice and the mutator refuses overlapping claims anyway.

use crate::core::backup::{MutationContext, Mutator};
use crate::core::console::{Reporter, compact_line, shorten_id};
use crate::core::outcome::{MutationOutcome, OutcomeStatus, RunSummary};
use crate::core::store::{DiscoveredStore, Operation};
use rayon::prelude::*;

const DETAIL_CHARS: usize = 160;

pub struct Orchestrator<'a> {
    mutator: Mutator,
    ctx: MutationContext<'a>,
    reporter: &'a dyn Reporter,
    parallel: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(ctx: MutationContext<'a>, reporter: &'a dyn Reporter) -> Self {
        Self {
            mutator: Mutator::new(),
            ctx,
            reporter,
            parallel: false,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, stores: &[DiscoveredStore<'_>], ops: &[Operation]) -> RunSummary {
        let outcomes: Vec<MutationOutcome> = if self.parallel {
            stores
                .par_iter()
                .map(|store| self.process(store, ops))
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        } else {
            stores
                .iter()
                .flat_map(|store| self.process(store, ops))
                .collect()
        };
        RunSummary::from_outcomes(outcomes)
    }

    fn process(&self, store: &DiscoveredStore<'_>, ops: &[Operation]) -> Vec<MutationOutcome> {
        let mut out = Vec::with_capacity(ops.len());
        for &op in ops {
            if store.format.supports(op) && store.descriptor.supports(op) {
                self.reporter.info(&format!(
                    "{} {} ({}): {}",
                    capitalized(op.as_str()),
                    store.descriptor.name,
                    store.format,
                    store.path.display()
                ));
            }
            let outcome = self.mutator.guarded(store, op, &self.ctx, self.reporter);
            self.report(&outcome);
            out.push(outcome);
        }
        out
    }

    fn report(&self, outcome: &MutationOutcome) {
        let name = outcome
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match outcome.status {
            OutcomeStatus::Success => match outcome.operation {
                Operation::Purge => self.reporter.success(&format!(
                    "Removed {} target entries from {}",
                    outcome.affected, name
                )),
                Operation::Regenerate => {
                    for change in &outcome.changes {
                        self.reporter.info(&format!(
                            "{}: {} -> {}",
                            change.field,
                            shorten_id(&change.old),
                            shorten_id(&change.new)
                        ));
                    }
                    self.reporter.success(&format!(
                        "Regenerated {} identifier(s) in {}",
                        outcome.affected, name
                    ));
                }
            },
            OutcomeStatus::NoOp => self
                .reporter
                .info(&format!("No target entries found in {}", name)),
            OutcomeStatus::FailedRestored | OutcomeStatus::FailedUnrecoverable => {
                let detail = outcome.detail.as_deref().unwrap_or("unknown error");
                self.reporter.error(&format!(
                    "{} failed on {} ({}): {}",
                    capitalized(outcome.operation.as_str()),
                    name,
                    outcome.status,
                    compact_line(detail, DETAIL_CHARS)
                ));
            }
            OutcomeStatus::Unsupported => {}
        }
    }
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
