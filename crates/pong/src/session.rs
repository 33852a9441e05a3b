//! Game and hardware loops
//!
//! A [`Session`] runs two threads over one [`SharedGame`]:
//!
//! - **game** (default 60 Hz): decodes the board inputs, applies them and
//!   steps the physics. The only writer of game state.
//! - **mirror** (default 30 Hz): copies a snapshot out under the lock,
//!   releases it, then reads the inputs and writes the outputs. The lock is
//!   taken again only to store the inputs, so slow device calls never hold
//!   up the game loop.
//!
//! Both loops sleep on a [`ShutdownToken`] and exit as soon as it is
//! cancelled. The mirror blanks the board on its way out.
//!
//! Device calls have no timeout: a device that hangs inside a call blocks
//! the mirror thread, and [`Session::stop`] with it.

use crate::config::SessionConfig;
use crate::error::{PongError, PongResult};
use crate::game::{Game, InputDecoder, Snapshot};
use crate::mirror::{Mirror, MirrorStats};
use crate::shared::SharedGame;
use crate::shutdown::ShutdownToken;
use de2i::Board;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const GAME_THREAD: &str = "game";
const MIRROR_THREAD: &str = "mirror";

/// Fixed-rate scheduler with absolute deadlines
///
/// Deadlines advance by exactly one period per tick, so jitter does not
/// accumulate. A loop that falls behind skips the missed ticks instead of
/// running them back to back.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now(),
        }
    }

    /// Sleep until the next tick; `false` once `token` is cancelled
    pub fn wait(&mut self, token: &ShutdownToken) -> bool {
        self.next += self.period;
        let now = Instant::now();
        if self.next < now {
            self.next = now;
        }
        !token.wait(self.next.saturating_duration_since(now))
    }
}

/// Summary of a finished session
#[derive(Debug, Clone, Copy)]
pub struct SessionReport {
    /// Game frames stepped
    pub frames: u64,
    pub mirror: MirrorStats,
    /// The game as it was when the session stopped
    pub last: Snapshot,
}

/// A running game with its hardware mirror
#[derive(Debug)]
pub struct Session {
    shared: SharedGame,
    token: ShutdownToken,
    game_thread: JoinHandle<u64>,
    mirror_thread: JoinHandle<MirrorStats>,
}

impl Session {
    /// Spawn the game and mirror loops
    ///
    /// `board` may be absent; the game then runs without hardware.
    pub fn start(config: SessionConfig, board: Board) -> PongResult<Session> {
        config.validate()?;

        let mut game = Game::new(config.game.clone());
        if config.autostart {
            game.start();
        }
        let shared = SharedGame::new(game);
        let token = ShutdownToken::new();
        let mirror = Mirror::new(board, config.game.clone());
        if !mirror.is_hardware_present() {
            info!("no FPGA board: hardware mirror disabled");
        }

        let game_thread = {
            let shared = shared.clone();
            let token = token.clone();
            let period = config.game_period();
            thread::Builder::new()
                .name(GAME_THREAD.to_string())
                .spawn(move || run_game_loop(&shared, &token, period))?
        };

        let mirror_thread = {
            let shared = shared.clone();
            let token = token.clone();
            let period = config.mirror_period();
            thread::Builder::new()
                .name(MIRROR_THREAD.to_string())
                .spawn(move || run_mirror_loop(mirror, &shared, &token, period))
        };
        let mirror_thread = match mirror_thread {
            Ok(handle) => handle,
            Err(e) => {
                token.cancel();
                let _ = game_thread.join();
                return Err(e.into());
            }
        };

        info!(
            "session started: game {} Hz, mirror {} Hz",
            config.game_hz, config.mirror_hz
        );
        Ok(Session {
            shared,
            token,
            game_thread,
            mirror_thread,
        })
    }

    pub fn shared(&self) -> &SharedGame {
        &self.shared
    }

    /// Token that stops the session when cancelled
    pub fn token(&self) -> ShutdownToken {
        self.token.clone()
    }

    /// Cancel both loops and wait for them to finish
    pub fn stop(self) -> PongResult<SessionReport> {
        self.token.cancel();

        let frames = self.game_thread.join();
        let mirror = self.mirror_thread.join();
        let frames = frames.map_err(|_| PongError::ThreadPanicked { name: GAME_THREAD })?;
        let mirror = mirror.map_err(|_| PongError::ThreadPanicked {
            name: MIRROR_THREAD,
        })?;

        let report = SessionReport {
            frames,
            mirror,
            last: self.shared.snapshot(),
        };
        info!(
            "session stopped after {} frames and {} mirror cycles ({} hardware faults)",
            report.frames,
            report.mirror.cycles,
            report.mirror.faults.failures()
        );
        Ok(report)
    }
}

fn run_game_loop(shared: &SharedGame, token: &ShutdownToken, period: Duration) -> u64 {
    debug!("game thread started");
    let mut decoder = InputDecoder::new();
    let mut ticker = Ticker::new(period);
    let mut frames = 0;

    while !token.is_cancelled() {
        shared.update(|game| {
            let controls = decoder.decode(game);
            game.apply(&controls);
            game.step();
        });
        frames += 1;

        if !ticker.wait(token) {
            break;
        }
    }
    debug!("game thread finished after {frames} frames");
    frames
}

fn run_mirror_loop(
    mut mirror: Mirror,
    shared: &SharedGame,
    token: &ShutdownToken,
    period: Duration,
) -> MirrorStats {
    debug!("mirror thread started");
    let mut ticker = Ticker::new(period);

    while !token.is_cancelled() {
        let snapshot = shared.snapshot();

        let mut inputs = snapshot.inputs;
        mirror.read_inputs(&mut inputs);
        if inputs != snapshot.inputs {
            shared.set_inputs(inputs);
        }
        mirror.mirror_once(&snapshot);

        if !ticker.wait(token) {
            break;
        }
    }

    let stats = mirror.shutdown();
    debug!("mirror thread finished after {} cycles", stats.cycles);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::controls::{key, switch};
    use crate::game::{GameState, HardwareInputs};
    use de2i::sim::SimulatedDevice;
    use de2i::{display, Register, RegisterIo};
    use std::io;

    fn fast_config() -> SessionConfig {
        SessionConfig {
            game_hz: 500,
            mirror_hz: 250,
            ..SessionConfig::default()
        }
    }

    /// Simulated board whose every select takes `delay`
    struct SlowDevice {
        inner: SimulatedDevice,
        delay: Duration,
    }

    impl RegisterIo for SlowDevice {
        fn select(&mut self, register: Register) -> io::Result<()> {
            thread::sleep(self.delay);
            self.inner.select(register)
        }

        fn write(&mut self, value: u32) -> io::Result<usize> {
            self.inner.write(value)
        }

        fn read(&mut self, value: &mut u32) -> io::Result<usize> {
            self.inner.read(value)
        }
    }

    /// Poll `check` until it holds or a generous deadline passes
    fn eventually(mut check: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_ticker_skips_missed_ticks() {
        let token = ShutdownToken::new();
        let mut ticker = Ticker::new(Duration::from_millis(1));
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        assert!(ticker.wait(&token));
        assert!(ticker.wait(&token));
        assert!(started.elapsed() < Duration::from_millis(15));
    }

    #[test]
    fn test_ticker_stops_on_cancel() {
        let token = ShutdownToken::new();
        token.cancel();
        let mut ticker = Ticker::new(Duration::from_secs(60));
        assert!(!ticker.wait(&token));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SessionConfig {
            game_hz: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            Session::start(config, Board::absent()),
            Err(PongError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_session_without_hardware() {
        let config = SessionConfig {
            autostart: true,
            ..fast_config()
        };
        let session = Session::start(config, Board::absent()).unwrap();
        assert!(eventually(|| session.shared().snapshot().ball.x != 400.0));

        let report = session.stop().unwrap();
        assert!(report.frames > 0);
        assert_eq!(report.last.state, GameState::Playing);
        assert_eq!(report.mirror.faults.failures(), 0);
    }

    #[test]
    fn test_session_mirrors_and_reads_board() {
        let (device, handle) = SimulatedDevice::quiet();
        handle.set_input(Register::PushButtons, HardwareInputs::BUTTONS_RELEASED);
        handle.set_input(Register::Switches, switch::FAST_SERVE);

        let session = Session::start(fast_config(), Board::with_io(Box::new(device))).unwrap();

        // Menu pattern reaches the green LEDs, switches reach the game
        assert!(eventually(|| handle.output(Register::GreenLeds) == 0x5555_5555));
        assert!(eventually(|| session.shared().snapshot().inputs.switches == switch::FAST_SERVE));
        assert!(eventually(|| handle.output(Register::LeftDisplay) == display::digit_pattern(0)));

        let press = HardwareInputs::BUTTONS_RELEASED & !key::START;
        let release = || {
            handle.set_input(Register::PushButtons, HardwareInputs::BUTTONS_RELEASED);
            assert!(eventually(|| {
                session.shared().snapshot().inputs.buttons == HardwareInputs::BUTTONS_RELEASED
            }));
            // Let the game loop see the release before the next press
            thread::sleep(Duration::from_millis(50));
        };

        // Press KEY0 to start playing
        handle.set_input(Register::PushButtons, press);
        assert!(eventually(|| session.shared().snapshot().state == GameState::Playing));
        release();

        // Press again to pause: red bank fully lit
        handle.set_input(Register::PushButtons, press);
        assert!(eventually(|| session.shared().snapshot().state == GameState::Paused));
        assert!(eventually(|| handle.output(Register::RedLeds) == 0xFFFF_FFFF));

        let report = session.stop().unwrap();
        assert!(report.mirror.cycles > 0);

        // Board blanked on the way out
        assert_eq!(handle.output(Register::RedLeds), 0);
        assert_eq!(handle.output(Register::GreenLeds), 0);
        assert_eq!(handle.output(Register::LeftDisplay), display::BLANK);
        assert_eq!(handle.output(Register::RightDisplay), display::BLANK);
    }

    #[test]
    fn test_slow_hardware_does_not_stall_game_loop() {
        let (inner, handle) = SimulatedDevice::quiet();
        handle.set_input(Register::PushButtons, HardwareInputs::BUTTONS_RELEASED);
        let device = SlowDevice {
            inner,
            delay: Duration::from_millis(50),
        };
        let config = SessionConfig {
            autostart: true,
            ..SessionConfig::default()
        };

        let session = Session::start(config, Board::with_io(Box::new(device))).unwrap();
        thread::sleep(Duration::from_millis(600));
        let report = session.stop().unwrap();

        // A mirror cycle spends 300ms in selects; the 60 Hz game keeps going
        assert!(report.frames >= 18, "only {} frames", report.frames);
        assert!(
            report.frames > 4 * report.mirror.cycles,
            "{} frames for {} mirror cycles",
            report.frames,
            report.mirror.cycles
        );
        assert_eq!(report.last.state, GameState::Playing);
    }
}
