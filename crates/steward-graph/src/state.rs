use serde::{Deserialize, Serialize};

/// Lifecycle of one exchange.
///
/// `Idle -> Running -> {AwaitingToolOutputs -> Running, Completed, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    AwaitingToolOutputs,
    Completed,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Idle, Failed)
                | (Running, AwaitingToolOutputs)
                | (Running, Completed)
                | (Running, Failed)
                | (AwaitingToolOutputs, Running)
                | (AwaitingToolOutputs, Failed)
        )
    }

    /// Move to `next`. Terminal states never change.
    pub fn advance(self, next: RunState) -> RunState {
        if self.can_transition_to(next) {
            tracing::trace!(from = ?self, to = ?next, "run state");
            next
        } else {
            debug_assert!(false, "invalid run state transition {:?} -> {:?}", self, next);
            tracing::warn!(from = ?self, to = ?next, "ignored invalid run state transition");
            self
        }
    }
}
