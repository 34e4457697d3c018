//! Per-step reporting for compensation runs.

use serde::{Deserialize, Serialize};

/// Outcome of one compensation sub-step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepReport {
    /// The step ran and succeeded in this invocation.
    Succeeded,

    /// Nothing to do: not applicable, or already done by a prior attempt.
    Skipped,

    /// The step ran and failed; the remaining steps were still attempted.
    Failed { reason: String },
}

impl StepReport {
    /// Returns true if the step failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, StepReport::Failed { .. })
    }
}

impl std::fmt::Display for StepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepReport::Succeeded => write!(f, "succeeded"),
            StepReport::Skipped => write!(f, "skipped"),
            StepReport::Failed { reason } => write!(f, "failed ({reason})"),
        }
    }
}

/// Report of a compensation run: which of the refund, stock-release, and
/// status-transition sub-steps succeeded, so an operator or retry can
/// complete just the remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationReport {
    /// What triggered the compensation.
    pub cause: String,

    /// Refunding the charge.
    pub refund: StepReport,

    /// Releasing reserved stock back to the ledger.
    pub stock_release: StepReport,

    /// Transitioning and persisting the order status.
    pub status_update: StepReport,
}

impl CompensationReport {
    /// Creates a report with every step marked skipped.
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            refund: StepReport::Skipped,
            stock_release: StepReport::Skipped,
            status_update: StepReport::Skipped,
        }
    }

    /// Returns true if no step failed.
    pub fn is_clean(&self) -> bool {
        !self.refund.is_failure()
            && !self.stock_release.is_failure()
            && !self.status_update.is_failure()
    }

    /// Returns the names of the failed steps.
    pub fn failed_steps(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.refund.is_failure() {
            failed.push("refund");
        }
        if self.stock_release.is_failure() {
            failed.push("stock_release");
        }
        if self.status_update.is_failure() {
            failed.push("status_update");
        }
        failed
    }
}

impl std::fmt::Display for CompensationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: refund {}, stock release {}, status update {}",
            self.cause, self.refund, self.stock_release, self.status_update
        )
    }
}
