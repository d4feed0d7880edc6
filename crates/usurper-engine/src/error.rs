//! Error types for the protocol engine.

use usurper_protocol::{ActionKind, Role, Stage};

/// Local precondition failures. None of these send a request: the player
/// is told what went wrong and the engine stays on its current state.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The game has not started (or no snapshot has arrived yet).
    #[error("the game has not started")]
    NotStarted,

    /// The game is over; no further actions are possible.
    #[error("the game is over")]
    GameOver,

    /// A turn action was attempted out of turn.
    #[error("it is not your turn")]
    NotYourTurn,

    /// A targeted action was submitted without a target.
    #[error("{0} requires a target")]
    MissingTarget(ActionKind),

    /// A reaction was attempted with no negotiation in flight.
    #[error("no pending action to react to")]
    NoPendingAction,

    /// The response verb does not fit the pending stage.
    #[error("cannot {verb} during the {stage:?} stage")]
    WrongStage {
        verb: &'static str,
        stage: Stage,
    },

    /// A challenge was raised against an unchallengeable action.
    #[error("{0} cannot be challenged")]
    NotChallengeable(ActionKind),

    /// A block was raised with a role that cannot block this action, or
    /// by a player who is not a legal blocker for it.
    #[error("{role} cannot block {action} here")]
    IllegalBlock { action: ActionKind, role: Role },

    /// A card was selected by a player the authority is not waiting on.
    #[error("the authority is not waiting on you")]
    NotAwaited,

    /// The selected card index does not exist in the local hand.
    #[error("card index {index} out of range for a hand of {hand}")]
    CardIndexOutOfRange { index: usize, hand: usize },
}
