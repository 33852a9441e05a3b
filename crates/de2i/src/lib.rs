//! # DE2i - FPGA board register access
//!
//! A small hardware abstraction layer for the DE2i-150 development board as
//! exposed by its PCI character device driver.
//!
//! ## Features
//!
//! - **Registers**: Typed identifiers for LEDs, displays, switches and push buttons
//! - **Board**: Select-then-transfer framing for every register access
//! - **Display**: Active-low seven-segment digit patterns
//! - **LEDs**: Common LED bank masks
//! - **Simulation**: An in-memory device for tests and boards left at home
//!
//! ## Quick Start
//!
//! ```no_run
//! use de2i::prelude::*;
//!
//! let mut board = Board::open_or_absent(DEFAULT_DEVICE);
//!
//! board.write(Register::RedLeds, leds::ALTERNATING)?;
//! board.write(Register::LeftDisplay, display::digit_pattern(3))?;
//!
//! if let Some(switches) = board.read(Register::Switches)? {
//!     println!("switches: {switches:#010x}");
//! }
//! # Ok::<(), de2i::HardwareError>(())
//! ```
//!
//! ## Modules
//!
//! - [`register`] - Register identifiers and select codes
//! - [`board`] - Device handle and access framing
//! - [`io`] - Raw device trait and the character device implementation
//! - [`display`] - Seven-segment patterns
//! - [`leds`] - LED masks
//! - [`sim`] - Simulated device
//! - [`diagnostic`] - Visible pattern test

pub mod board;
pub mod diagnostic;
pub mod display;
mod error;
pub mod io;
pub mod leds;
pub mod register;
pub mod sim;

pub use board::{Board, FaultCounters};
pub use error::{HardwareError, HardwareResult};
pub use io::{CharDevice, RegisterIo};
pub use register::{Direction, Register};

/// Device node created by the board's driver
pub const DEFAULT_DEVICE: &str = "/dev/de2i-150";

/// Convenient re-exports for common usage
///
/// Import everything you need with:
/// ```
/// use de2i::prelude::*;
/// ```
pub mod prelude {
    pub use crate::board::Board;
    pub use crate::display;
    pub use crate::leds;
    pub use crate::register::Register;
    pub use crate::{HardwareError, HardwareResult, DEFAULT_DEVICE};
}
