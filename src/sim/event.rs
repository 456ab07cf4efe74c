/// Events raised by a simulation step. The sim never touches the
/// terminal or the speaker; presentation reacts to these instead.
///
/// Actor ids are stable for the lifetime of a level (the ghost can be
/// removed and respawned, so vector indices are not).
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GameEvent {
    /// An actor left the ground by jumping.
    JumpStarted { actor: usize },
    /// An airborne actor touched down.
    Landed { actor: usize },
    /// The player's control moved from one actor to another.
    PossessionChanged { from: usize, to: usize },
    /// An actor fell out of the level.
    Killed { actor: usize },
    /// The active actor reached the exit. Raised at most once per level.
    ExitReached,
}
