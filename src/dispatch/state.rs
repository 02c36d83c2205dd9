//! Suspension state machine.
//!
//! A single atomic backs the whole per-request lifecycle; every
//! transition is a compare-and-swap, so racing callers resolve to
//! exactly one winner without locks.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    /// Handler executing on the request task; no response yet.
    Active = 0,
    /// `suspend()` was called; a completion handle owns finalization.
    Suspended = 1,
    /// Exactly one caller is running the finalize routine.
    Completing = 2,
    /// Response written, resource released. Terminal.
    Completed = 3,
    /// Finalization faulted; resource released anyway. Terminal.
    Failed = 4,
}

impl State {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => State::Active,
            1 => State::Suspended,
            2 => State::Completing,
            3 => State::Completed,
            _ => State::Failed,
        }
    }
}

/// Atomic holder for [`State`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(State::Active as u8))
    }

    /// Current state (racy by nature; use [`transition`](Self::transition)
    /// for decisions).
    pub fn get(&self) -> State {
        State::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Single-winner transition: succeeds only if the state is exactly
    /// `from`, in which case it becomes `to`.
    pub fn transition(&self, from: State, to: State) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Unconditional store; only the finalize winner moves into the
    /// terminal states.
    pub fn store(&self, state: State) {
        self.0.store(state as u8, Ordering::Release);
    }
}
