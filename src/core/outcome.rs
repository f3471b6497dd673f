//! Per-store results and the aggregate the CLI reports.

use crate::core::store::{DiscoveredStore, Operation, StoreFormat};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Success,
    NoOp,
    /// Failed, and the store is byte-identical to its pre-run content.
    FailedRestored,
    /// Failed, and the store could not be put back; its state is undefined.
    FailedUnrecoverable,
    /// The operation has nothing to address in this store's format.
    Unsupported,
}

impl OutcomeStatus {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OutcomeStatus::FailedRestored | OutcomeStatus::FailedUnrecoverable
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::NoOp => "no-op",
            OutcomeStatus::FailedRestored => "failed-restored",
            OutcomeStatus::FailedUnrecoverable => "failed-unrecoverable",
            OutcomeStatus::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One identifier field rewritten by `regenerate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MutationOutcome {
    pub app: String,
    pub path: PathBuf,
    pub format: StoreFormat,
    pub operation: Operation,
    pub status: OutcomeStatus,
    pub affected: usize,
    pub detail: Option<String>,
    pub warnings: Vec<String>,
    pub changes: Vec<FieldChange>,
}

impl MutationOutcome {
    pub fn new(store: &DiscoveredStore<'_>, operation: Operation, status: OutcomeStatus) -> Self {
        Self {
            app: store.descriptor.name.clone(),
            path: store.path.clone(),
            format: store.format,
            operation,
            status,
            affected: 0,
            detail: None,
            warnings: Vec::new(),
            changes: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<MutationOutcome>,
    pub succeeded: usize,
    pub no_op: usize,
    pub failed: usize,
    pub unsupported: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: Vec<MutationOutcome>) -> Self {
        let count = |s: OutcomeStatus| outcomes.iter().filter(|o| o.status == s).count();
        let succeeded = count(OutcomeStatus::Success);
        let no_op = count(OutcomeStatus::NoOp);
        let unsupported = count(OutcomeStatus::Unsupported);
        let failed = outcomes.iter().filter(|o| o.status.is_failure()).count();
        Self {
            outcomes,
            succeeded,
            no_op,
            failed,
            unsupported,
        }
    }

    /// Outcomes where the operation actually applied to the store's format.
    pub fn targeted(&self) -> usize {
        self.outcomes.len() - self.unsupported
    }

    pub fn all_failed(&self) -> bool {
        self.targeted() > 0 && self.failed == self.targeted()
    }

    pub fn total_affected(&self) -> usize {
        self.outcomes.iter().map(|o| o.affected).sum()
    }
}
