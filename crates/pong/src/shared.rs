//! Lock-guarded game shared between the game and mirror loops
//!
//! The game loop is the only writer of the game itself; the mirror loop
//! copies snapshots out and writes back nothing but the hardware inputs.
//! Every accessor holds the lock only for the duration of the copy or the
//! closure, never across hardware I/O.

use crate::game::{Game, HardwareInputs, Snapshot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
pub struct SharedGame {
    inner: Arc<Mutex<Game>>,
}

impl SharedGame {
    pub fn new(game: Game) -> Self {
        Self {
            inner: Arc::new(Mutex::new(game)),
        }
    }

    // A panic in one loop must not take the other down with it
    fn lock(&self) -> MutexGuard<'_, Game> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn set_inputs(&self, inputs: HardwareInputs) {
        self.lock().set_inputs(inputs);
    }

    /// Run `f` with exclusive access to the game
    pub fn update<R>(&self, f: impl FnOnce(&mut Game) -> R) -> R {
        f(&mut self.lock())
    }
}
