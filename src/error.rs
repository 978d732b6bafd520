//! Engine error kinds. None of these ever reach the player: the coordinator
//! logs them and degrades to a no-op.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("cell ({x}, {y}) is outside the board")]
    OutOfBounds { x: usize, y: usize },
    #[error("cell ({x}, {y}) holds no chip")]
    EmptyCell { x: usize, y: usize },
    #[error("gesture released without a valid neighbour")]
    InvalidSwapTarget,
    #[error("a detonation is already in flight")]
    DetonationInFlight,
    #[error("the board is animating")]
    Busy,
}
