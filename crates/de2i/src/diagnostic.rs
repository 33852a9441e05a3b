//! Visible hardware pattern test
//!
//! Lights distinctive patterns so a person at the bench can confirm the
//! driver and wiring work: alternating red LEDs, the complementary green
//! pattern, then `8` on both displays. Each step is held for `hold` so it
//! can be seen. Not part of normal startup.

use crate::board::Board;
use crate::error::HardwareError;
use crate::register::Register;
use crate::{display, leds};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// One pattern written during the test
#[derive(Debug)]
pub struct Step {
    pub register: Register,
    pub value: u32,
    pub outcome: Result<(), HardwareError>,
}

/// Outcome of [`pattern_test`]
#[derive(Debug, Default)]
pub struct DiagnosticReport {
    pub steps: Vec<Step>,
}

impl DiagnosticReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.outcome.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.outcome.is_err())
    }
}

/// Run the pattern sequence
///
/// Failed steps are recorded and the remaining steps still run.
pub fn pattern_test(board: &mut Board, hold: Duration) -> DiagnosticReport {
    let stages: [&[(Register, u32)]; 3] = [
        &[(Register::RedLeds, leds::ALTERNATING_ODD)],
        &[(Register::GreenLeds, leds::ALTERNATING)],
        &[
            (Register::LeftDisplay, display::digit_pattern(8)),
            (Register::RightDisplay, display::digit_pattern(8)),
        ],
    ];

    let mut report = DiagnosticReport::default();
    for (i, stage) in stages.iter().enumerate() {
        for &(register, value) in *stage {
            let outcome = board.write(register, value);
            match &outcome {
                Ok(()) => info!("{register} <- {value:#010x}"),
                Err(e) => warn!("{register} pattern failed: {e}"),
            }
            report.steps.push(Step {
                register,
                value,
                outcome,
            });
        }
        if i + 1 < stages.len() && !hold.is_zero() {
            thread::sleep(hold);
        }
    }
    report
}
