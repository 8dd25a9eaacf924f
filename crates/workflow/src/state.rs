//! Workflow state machine.

use serde::{Deserialize, Serialize};

/// The state of a multi-step workflow run.
///
/// State transitions:
/// ```text
/// NotStarted ──► Running ──┬──► Completed
///                          └──► Compensating ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkflowState {
    /// No step has run yet.
    #[default]
    NotStarted,

    /// Steps are being executed.
    Running,

    /// A step failed and completed steps are being undone.
    Compensating,

    /// All steps completed successfully (terminal state).
    Completed,

    /// Compensation finished after a failure (terminal state).
    Failed,
}

impl WorkflowState {
    /// Returns true if the workflow can begin running.
    pub fn can_run(&self) -> bool {
        matches!(self, WorkflowState::NotStarted)
    }

    /// Returns true if the workflow can begin compensation.
    pub fn can_compensate(&self) -> bool {
        matches!(self, WorkflowState::Running)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Completed | WorkflowState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::NotStarted => "NotStarted",
            WorkflowState::Running => "Running",
            WorkflowState::Compensating => "Compensating",
            WorkflowState::Completed => "Completed",
            WorkflowState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_not_started() {
        assert_eq!(WorkflowState::default(), WorkflowState::NotStarted);
    }

    #[test]
    fn test_can_run() {
        assert!(WorkflowState::NotStarted.can_run());
        assert!(!WorkflowState::Running.can_run());
        assert!(!WorkflowState::Compensating.can_run());
        assert!(!WorkflowState::Completed.can_run());
        assert!(!WorkflowState::Failed.can_run());
    }

    #[test]
    fn test_can_compensate() {
        assert!(!WorkflowState::NotStarted.can_compensate());
        assert!(WorkflowState::Running.can_compensate());
        assert!(!WorkflowState::Compensating.can_compensate());
        assert!(!WorkflowState::Completed.can_compensate());
        assert!(!WorkflowState::Failed.can_compensate());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!WorkflowState::NotStarted.is_terminal());
        assert!(!WorkflowState::Running.is_terminal());
        assert!(!WorkflowState::Compensating.is_terminal());
        assert!(WorkflowState::Completed.is_terminal());
        assert!(WorkflowState::Failed.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(WorkflowState::NotStarted.to_string(), "NotStarted");
        assert_eq!(WorkflowState::Compensating.to_string(), "Compensating");
        assert_eq!(WorkflowState::Failed.to_string(), "Failed");
    }
}
