use serde::{Deserialize, Serialize};

/// Lifecycle of one production event inside the deduction engine.
///
/// `Received -> Resolving -> Applying -> Committed`, with `Failed` terminal
/// and reachable from any non-terminal state. An accepted event runs to
/// full commit or full failure; there is no partial-cancel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionState {
    Received,
    Resolving,
    Applying,
    Committed,
    Failed,
}

impl DeductionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Failed)
    }

    /// Legal forward transitions.
    pub fn can_transition_to(self, next: Self) -> bool {
        use DeductionState::*;
        matches!(
            (self, next),
            (Received, Resolving) | (Resolving, Applying) | (Applying, Committed)
        ) || (!self.is_terminal() && next == Failed)
    }
}
