//! Cooperative cancellation for the session's loops

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// How often [`ShutdownToken::wait_or_interrupt`] checks the interrupt flag
const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// Cloneable cancellation flag that sleeping loops wake up on
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown and wake every waiter
    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for up to `timeout`, returning early on cancellation
    ///
    /// Returns `true` if the token has been cancelled.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Sleep until cancelled, `limit` runs out, or `interrupted` is raised
    ///
    /// `interrupted` is set from a signal handler, which cannot touch the
    /// token's lock, so it is polled and turned into a cancel here. Without
    /// a limit this only returns on cancellation.
    pub fn wait_or_interrupt(&self, limit: Option<Duration>, interrupted: &AtomicBool) {
        let deadline = limit.map(|limit| Instant::now() + limit);
        loop {
            if interrupted.load(Ordering::SeqCst) {
                debug!("interrupted");
                self.cancel();
                return;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return;
                    }
                    left.min(INTERRUPT_POLL)
                }
                None => INTERRUPT_POLL,
            };
            if self.wait(slice) {
                return;
            }
        }
    }

    /// Cancel once a line is read from `input`
    ///
    /// End of input and read errors leave the token alone, so a detached
    /// stdin does not end the session. Returns whether the token was
    /// cancelled.
    pub fn cancel_on_line(&self, input: impl BufRead) -> bool {
        match input.lines().next() {
            Some(Ok(_)) => {
                self.cancel();
                true
            }
            Some(Err(e)) => {
                debug!("stdin unreadable: {e}");
                false
            }
            None => {
                debug!("stdin closed");
                false
            }
        }
    }
}
