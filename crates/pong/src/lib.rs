//! FPGA Pong - two-player Pong mirrored onto a DE2i-150 board
//!
//! The game runs headless; its state is shown on the board instead of a
//! window:
//!
//! - red and green LEDs follow the ball, or signal menu/pause/winner
//! - the two seven-segment displays show the scores
//! - push buttons and switches start, pause and steer the game
//!
//! ## Architecture
//!
//! - **Game** (`game/`): ball physics, paddles, scoring and the state machine
//! - **Mirror** (`mirror`): snapshot to LED/display words, board input reads
//! - **Session** (`session`): the 60 Hz game loop and the 30 Hz mirror loop
//! - **Shared state** (`shared`, `shutdown`): lock-guarded game, cancellation
//!
//! Register access itself lives in the [`de2i`] crate.

pub mod config;
mod error;
pub mod game;
pub mod geometry;
pub mod mirror;
pub mod session;
pub mod shared;
pub mod shutdown;

// Re-exports for convenience
pub use config::{GameConfig, SessionConfig};
pub use error::{PongError, PongResult};
pub use game::{Game, GameState, HardwareInputs, Player, Snapshot};
pub use mirror::{Mirror, MirrorStats, OutputFrame};
pub use session::{Session, SessionReport};
pub use shared::SharedGame;
pub use shutdown::ShutdownToken;
