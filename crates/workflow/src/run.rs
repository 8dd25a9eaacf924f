//! Progress record of one workflow run.

use common::ProductId;

use crate::state::WorkflowState;

/// Tracks a single run of the creation workflow: which steps completed,
/// which stock decrements must be undone, and why it failed.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRun {
    state: WorkflowState,
    completed_steps: Vec<&'static str>,
    /// Stock decrements applied so far, in application order.
    reservations: Vec<(ProductId, u32)>,
    failed_step: Option<&'static str>,
    failure_reason: Option<String>,
}

impl WorkflowRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn completed_steps(&self) -> &[&'static str] {
        &self.completed_steps
    }

    pub fn failed_step(&self) -> Option<&'static str> {
        self.failed_step
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub(crate) fn start(&mut self) {
        if self.state.can_run() {
            self.state = WorkflowState::Running;
        }
    }

    pub(crate) fn record_reservation(&mut self, product_id: ProductId, quantity: u32) {
        self.reservations.push((product_id, quantity));
    }

    pub(crate) fn step_completed(&mut self, step: &'static str) {
        self.completed_steps.push(step);
    }

    /// Moves to `Compensating` and returns the decrements to undo,
    /// most recent first.
    pub(crate) fn step_failed(
        &mut self,
        step: &'static str,
        reason: impl Into<String>,
    ) -> Vec<(ProductId, u32)> {
        if !self.state.can_compensate() {
            return Vec::new();
        }
        self.state = WorkflowState::Compensating;
        self.failed_step = Some(step);
        self.failure_reason = Some(reason.into());
        self.reservations.iter().rev().copied().collect()
    }

    pub(crate) fn compensated(&mut self) {
        if self.state == WorkflowState::Compensating {
            self.state = WorkflowState::Failed;
        }
    }

    pub(crate) fn complete(&mut self) {
        if self.state == WorkflowState::Running {
            self.state = WorkflowState::Completed;
        }
    }
}
