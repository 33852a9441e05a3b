//! Mirrors the game onto the board's LEDs and displays
//!
//! Each cycle turns a [`Snapshot`] into an [`OutputFrame`] (four 32-bit
//! words) and writes it through the [`Board`], one select+write pair per
//! register. Hardware faults are counted and logged by the board and never
//! reach the caller; the next cycle simply tries again.
//!
//! | State   | Red LEDs                 | Green LEDs               |
//! |---------|--------------------------|--------------------------|
//! | Menu    | off                      | alternating              |
//! | Playing | ball x scaled to 0..32   | ball y scaled to 0..32   |
//! | Paused  | all                      | off                      |
//! | Over    | all if player 2 won      | all if player 1 won      |
//!
//! The displays show the last digit of each player's score.

use crate::config::GameConfig;
use crate::game::{GameState, HardwareInputs, Player, Snapshot};
use de2i::{display, leds, Board, FaultCounters, Register};
use tracing::info;

/// Values for the four output registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFrame {
    pub red: u32,
    pub green: u32,
    pub left: u32,
    pub right: u32,
}

impl OutputFrame {
    /// Everything dark
    pub const CLEAR: OutputFrame = OutputFrame {
        red: leds::OFF,
        green: leds::OFF,
        left: display::BLANK,
        right: display::BLANK,
    };

    pub fn from_snapshot(snapshot: &Snapshot, config: &GameConfig) -> Self {
        let (red, green) = match snapshot.state {
            GameState::Menu => (leds::OFF, leds::ALTERNATING),
            GameState::Playing => (
                scale(snapshot.ball.x, config.width),
                scale(snapshot.ball.y, config.height),
            ),
            GameState::Paused => (leds::ALL, leds::OFF),
            GameState::Over => match snapshot.winner {
                Some(Player::One) => (leds::OFF, leds::ALL),
                _ => (leds::ALL, leds::OFF),
            },
        };

        Self {
            red,
            green,
            left: display::digit_pattern(snapshot.player1.score),
            right: display::digit_pattern(snapshot.player2.score),
        }
    }

    /// Register writes in the order they are issued
    pub fn writes(&self) -> [(Register, u32); 4] {
        [
            (Register::RedLeds, self.red),
            (Register::GreenLeds, self.green),
            (Register::LeftDisplay, self.left),
            (Register::RightDisplay, self.right),
        ]
    }
}

/// `floor(position / extent * 32)`; negative positions saturate to 0
fn scale(position: f32, extent: f32) -> u32 {
    (position / extent * 32.0) as u32
}

/// Totals reported when the mirror shuts down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub cycles: u64,
    pub faults: FaultCounters,
}

/// State-to-hardware mirror
#[derive(Debug)]
pub struct Mirror {
    board: Board,
    config: GameConfig,
    cycles: u64,
}

impl Mirror {
    /// Take over `board` and blank its outputs
    pub fn new(board: Board, config: GameConfig) -> Self {
        let mut mirror = Self {
            board,
            config,
            cycles: 0,
        };
        if mirror.board.is_present() {
            info!("clearing board outputs");
        }
        mirror.clear();
        mirror
    }

    pub fn is_hardware_present(&self) -> bool {
        self.board.is_present()
    }

    /// Write the outputs for `snapshot`
    pub fn mirror_once(&mut self, snapshot: &Snapshot) {
        let frame = OutputFrame::from_snapshot(snapshot, &self.config);
        self.push(&frame);
        self.cycles += 1;
    }

    /// Refresh `inputs` from the switches and push buttons
    ///
    /// A value is only replaced by a successful read; after a failure the
    /// previous reading stays in place.
    pub fn read_inputs(&mut self, inputs: &mut HardwareInputs) {
        if let Ok(Some(switches)) = self.board.read(Register::Switches) {
            inputs.switches = switches;
        }
        if let Ok(Some(buttons)) = self.board.read(Register::PushButtons) {
            inputs.buttons = buttons;
        }
    }

    /// Best-effort blanking of every output
    pub fn clear(&mut self) {
        self.push(&OutputFrame::CLEAR);
    }

    pub fn stats(&self) -> MirrorStats {
        MirrorStats {
            cycles: self.cycles,
            faults: self.board.faults(),
        }
    }

    /// Blank the outputs and release the board
    pub fn shutdown(mut self) -> MirrorStats {
        if self.board.is_present() {
            info!("cleaning up FPGA outputs");
        }
        self.clear();
        self.close()
    }

    /// Release the board as it is, without another clear
    pub fn close(self) -> MirrorStats {
        let stats = self.stats();
        self.board.close();
        stats
    }

    fn push(&mut self, frame: &OutputFrame) {
        for (register, value) in frame.writes() {
            // Failures are logged and counted by the board
            let _ = self.board.write(register, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Ball, Paddle};
    use de2i::sim::{Access, Fault, SimHandle, SimulatedDevice};
    use pretty_assertions::assert_eq;

    fn snapshot(state: GameState) -> Snapshot {
        Snapshot {
            state,
            ball: Ball {
                x: 400.0,
                y: 300.0,
                vel_x: 3.0,
                vel_y: 3.0,
            },
            player1: Paddle {
                x: 50.0,
                y: 250.0,
                score: 3,
            },
            player2: Paddle {
                x: 730.0,
                y: 250.0,
                score: 12,
            },
            winner: None,
            inputs: HardwareInputs::default(),
        }
    }

    fn simulated() -> (Mirror, SimHandle) {
        let (device, handle) = SimulatedDevice::new();
        let mirror = Mirror::new(Board::with_io(Box::new(device)), GameConfig::default());
        handle.clear_log();
        (mirror, handle)
    }

    #[test]
    fn test_menu_frame() {
        let config = GameConfig::default();
        let mut snap = snapshot(GameState::Menu);
        for (x, score) in [(0.0, 0), (799.0, 7), (123.4, 42)] {
            snap.ball.x = x;
            snap.player1.score = score;
            let frame = OutputFrame::from_snapshot(&snap, &config);
            assert_eq!((frame.red, frame.green), (0, 0x5555_5555));
        }
    }

    #[test]
    fn test_playing_frame_scales_ball_position() {
        let config = GameConfig::default();
        let mut snap = snapshot(GameState::Playing);
        for (x, y, red, green) in [
            (0.0, 0.0, 0, 0),
            (400.0, 300.0, 16, 16),
            (799.0, 599.0, 31, 31),
            (24.9, 18.7, 0, 0),
            (25.0, 18.75, 1, 1),
            (612.5, 450.0, 24, 24),
            (-2.0, 10.0, 0, 0),
        ] {
            snap.ball.x = x;
            snap.ball.y = y;
            let frame = OutputFrame::from_snapshot(&snap, &config);
            assert_eq!((frame.red, frame.green), (red, green), "ball at ({x}, {y})");
        }
    }

    #[test]
    fn test_paused_frame() {
        let snap = snapshot(GameState::Paused);
        let frame = OutputFrame::from_snapshot(&snap, &GameConfig::default());
        assert_eq!((frame.red, frame.green), (0xFFFF_FFFF, 0));
    }

    #[test]
    fn test_over_frame_shows_winner() {
        let config = GameConfig::default();
        let mut snap = snapshot(GameState::Over);

        snap.winner = Some(Player::One);
        let frame = OutputFrame::from_snapshot(&snap, &config);
        assert_eq!((frame.red, frame.green), (0, 0xFFFF_FFFF));

        snap.winner = Some(Player::Two);
        let frame = OutputFrame::from_snapshot(&snap, &config);
        assert_eq!((frame.red, frame.green), (0xFFFF_FFFF, 0));
    }

    #[test]
    fn test_displays_follow_scores_in_every_state() {
        let config = GameConfig::default();
        for state in [GameState::Menu, GameState::Playing, GameState::Paused, GameState::Over] {
            let frame = OutputFrame::from_snapshot(&snapshot(state), &config);
            assert_eq!(frame.left, display::DIGITS[3]);
            // 12 aliases to 2
            assert_eq!(frame.right, display::DIGITS[2]);
        }
    }

    #[test]
    fn test_absent_board_is_silent() {
        let mut mirror = Mirror::new(Board::absent(), GameConfig::default());
        assert!(!mirror.is_hardware_present());

        let held = HardwareInputs {
            switches: 0x3,
            buttons: 0xE,
        };
        let mut inputs = held;
        mirror.mirror_once(&snapshot(GameState::Playing));
        mirror.read_inputs(&mut inputs);

        assert_eq!(inputs, held);
        assert_eq!(mirror.stats().faults, FaultCounters::default());
        assert_eq!(mirror.shutdown().cycles, 1);
    }

    #[test]
    fn test_every_transfer_directly_follows_its_select() {
        let (mut mirror, handle) = simulated();
        handle.inject(Register::GreenLeds, Fault::Select);
        handle.inject(Register::PushButtons, Fault::Transfer);

        let mut inputs = HardwareInputs::default();
        for state in [GameState::Menu, GameState::Playing, GameState::Paused, GameState::Over] {
            for _ in 0..5 {
                mirror.read_inputs(&mut inputs);
                mirror.mirror_once(&snapshot(state));
            }
        }

        let log = handle.log();
        let mut transfers = 0;
        for (i, access) in log.iter().enumerate() {
            if access.is_transfer() {
                assert!(i > 0, "transfer without select: {access:?}");
                assert_eq!(log[i - 1], Access::Select(access.register()));
                transfers += 1;
            } else if let Some(next) = log.get(i + 1) {
                // At most one transfer per select
                if next.is_transfer() {
                    assert!(log.get(i + 2).is_none_or(|a| !a.is_transfer()));
                }
            }
        }
        // 20 cycles, 6 registers each, green selects always fail
        assert_eq!(transfers, 20 * 5);
    }

    #[test]
    fn test_failed_select_spares_other_registers() {
        let (mut mirror, handle) = simulated();
        handle.inject(Register::RedLeds, Fault::Select);

        let mut snap = snapshot(GameState::Playing);
        snap.ball.x = 612.5;
        snap.ball.y = 150.0;
        mirror.mirror_once(&snap);

        assert_eq!(handle.output(Register::RedLeds), 0);
        assert_eq!(handle.output(Register::GreenLeds), 8);
        assert_eq!(handle.output(Register::LeftDisplay), display::DIGITS[3]);
        assert_eq!(handle.output(Register::RightDisplay), display::DIGITS[2]);
        assert_eq!(
            handle.log(),
            vec![
                Access::Select(Register::RedLeds),
                Access::Select(Register::GreenLeds),
                Access::Write(Register::GreenLeds, 8),
                Access::Select(Register::LeftDisplay),
                Access::Write(Register::LeftDisplay, display::DIGITS[3]),
                Access::Select(Register::RightDisplay),
                Access::Write(Register::RightDisplay, display::DIGITS[2]),
            ]
        );
        assert_eq!(mirror.stats().faults.selects, 1);

        // Next cycle is a fresh attempt
        handle.clear_faults();
        mirror.mirror_once(&snap);
        assert_eq!(handle.output(Register::RedLeds), 24);
    }

    #[test]
    fn test_read_inputs_keeps_stale_value_on_failure() {
        let (mut mirror, handle) = simulated();
        handle.set_input(Register::Switches, 0b10);
        handle.set_input(Register::PushButtons, 0b1110);

        let first = HardwareInputs {
            switches: 0b10,
            buttons: 0b1110,
        };
        let mut inputs = HardwareInputs::default();
        mirror.read_inputs(&mut inputs);
        assert_eq!(inputs, first);
        assert_eq!(
            &handle.log()[..4],
            &[
                Access::Select(Register::Switches),
                Access::Read(Register::Switches),
                Access::Select(Register::PushButtons),
                Access::Read(Register::PushButtons),
            ]
        );

        handle.set_input(Register::Switches, 0b01);
        handle.set_input(Register::PushButtons, 0b1111);
        handle.inject(Register::Switches, Fault::Short(1));
        handle.inject(Register::PushButtons, Fault::Select);
        mirror.read_inputs(&mut inputs);
        assert_eq!(inputs, first);
    }

    #[test]
    fn test_startup_and_teardown_clear_outputs() {
        let (device, handle) = SimulatedDevice::new();
        let mut mirror = Mirror::new(Board::with_io(Box::new(device)), GameConfig::default());
        assert_eq!(handle.output(Register::LeftDisplay), display::BLANK);
        assert_eq!(handle.output(Register::RightDisplay), display::BLANK);

        mirror.mirror_once(&snapshot(GameState::Paused));
        assert_eq!(handle.output(Register::RedLeds), leds::ALL);

        handle.clear_log();
        let stats = mirror.shutdown();
        assert_eq!(stats.cycles, 1);
        assert_eq!(
            handle.log(),
            vec![
                Access::Select(Register::RedLeds),
                Access::Write(Register::RedLeds, 0),
                Access::Select(Register::GreenLeds),
                Access::Write(Register::GreenLeds, 0),
                Access::Select(Register::LeftDisplay),
                Access::Write(Register::LeftDisplay, display::BLANK),
                Access::Select(Register::RightDisplay),
                Access::Write(Register::RightDisplay, display::BLANK),
            ]
        );
    }

    #[test]
    fn test_clear_failures_are_not_fatal() {
        let (device, handle) = SimulatedDevice::new();
        for register in Register::OUTPUTS {
            handle.inject(register, Fault::Transfer);
        }
        let mirror = Mirror::new(Board::with_io(Box::new(device)), GameConfig::default());
        let stats = mirror.shutdown();
        assert_eq!(stats.faults.transfers, 8);
    }

    #[test]
    fn test_close_after_startup_clears_once() {
        let (device, handle) = SimulatedDevice::new();
        handle.inject(Register::GreenLeds, Fault::Select);

        let stats = Mirror::new(Board::with_io(Box::new(device)), GameConfig::default()).close();

        assert_eq!(handle.log().len(), 7);
        assert_eq!(handle.output(Register::RedLeds), leds::OFF);
        assert_eq!(handle.output(Register::RightDisplay), display::BLANK);
        assert_eq!(stats.faults.failures(), 1);
        assert_eq!(stats.faults.completed, 3);
    }
}
