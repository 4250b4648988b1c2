// Run phase state machine with validation

use super::RunPhase;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseTransitionError {
    #[error("Invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition { from: RunPhase, to: RunPhase },

    #[error("Run already in terminal phase: {0:?}")]
    AlreadyTerminal(RunPhase),
}

/// Validates if a run can move from one phase to another.
///
/// `initialized -> completed` and `initialized -> error` are the only
/// moves. Terminal phases are final; runs are never re-entered.
pub fn can_transition(from: RunPhase, to: RunPhase) -> bool {
    matches!(
        (from, to),
        (RunPhase::Initialized, RunPhase::Completed) | (RunPhase::Initialized, RunPhase::Error)
    )
}

/// Validates and performs a phase transition
pub fn transition_phase(
    current: RunPhase,
    target: RunPhase,
) -> Result<RunPhase, PhaseTransitionError> {
    if is_terminal_phase(current) {
        return Err(PhaseTransitionError::AlreadyTerminal(current));
    }

    if !can_transition(current, target) {
        return Err(PhaseTransitionError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    Ok(target)
}

/// Check if a phase is terminal
pub fn is_terminal_phase(phase: RunPhase) -> bool {
    matches!(phase, RunPhase::Completed | RunPhase::Error)
}
