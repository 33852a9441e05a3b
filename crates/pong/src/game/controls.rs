//! Player input from the board
//!
//! The push buttons are active-low, like most board inputs: a cleared bit
//! means the key is held. Mapping:
//!
//! | Input | Action                                  |
//! |-------|-----------------------------------------|
//! | KEY0  | start / pause / resume (on press)       |
//! | KEY1  | new game after game over (on press)     |
//! | KEY2  | player 2 up (held)                      |
//! | KEY3  | player 2 down (held)                    |
//! | SW0   | fast serve                              |
//! | SW1   | player 2 on autopilot                   |
//!
//! Player 1 is always steered by the autopilot.

use super::{Ball, Game, HardwareInputs, Paddle, Player};
use crate::config::GameConfig;

/// Push-button bits (active-high after decoding)
pub mod key {
    pub const START: u32 = 1 << 0;
    pub const RESET: u32 = 1 << 1;
    pub const P2_UP: u32 = 1 << 2;
    pub const P2_DOWN: u32 = 1 << 3;
    /// Every key the board has
    pub const MASK: u32 = 0xF;
}

/// Switch bits
pub mod switch {
    pub const FAST_SERVE: u32 = 1 << 0;
    pub const P2_AUTOPILOT: u32 = 1 << 1;
}

/// Input for one game frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub p1_up: bool,
    pub p1_down: bool,
    pub p2_up: bool,
    pub p2_down: bool,
    /// Start, pause or resume (one-shot)
    pub toggle: bool,
    /// New game after game over (one-shot)
    pub reset: bool,
    pub fast_serve: bool,
}

/// Turns raw board inputs into [`Controls`], tracking key edges
#[derive(Debug, Default)]
pub struct InputDecoder {
    held: u32,
}

impl InputDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys held in `inputs`, active-high
    pub fn keys(inputs: HardwareInputs) -> u32 {
        !inputs.buttons & key::MASK
    }

    /// Decode one frame of input for `game`
    pub fn decode(&mut self, game: &Game) -> Controls {
        let inputs = game.inputs();
        let held = Self::keys(inputs);
        let pressed = held & !self.held;
        self.held = held;

        let config = game.config();
        let ball = game.ball();
        let (p1_up, p1_down) = autopilot(game.paddle(Player::One), Player::One, ball, config);
        let (p2_up, p2_down) = if inputs.switches & switch::P2_AUTOPILOT != 0 {
            autopilot(game.paddle(Player::Two), Player::Two, ball, config)
        } else {
            (held & key::P2_UP != 0, held & key::P2_DOWN != 0)
        };

        Controls {
            p1_up,
            p1_down,
            p2_up,
            p2_down,
            toggle: pressed & key::START != 0,
            reset: pressed & key::RESET != 0,
            fast_serve: inputs.switches & switch::FAST_SERVE != 0,
        }
    }
}

/// Steer `paddle` towards the ball while it approaches
///
/// Returns `(up, down)`. The paddle holds still while the ball moves away or
/// its centre is within one paddle step of the ball's.
pub fn autopilot(paddle: &Paddle, side: Player, ball: &Ball, config: &GameConfig) -> (bool, bool) {
    let approaching = match side {
        Player::One => ball.vel_x < 0.0,
        Player::Two => ball.vel_x > 0.0,
    };
    if !approaching {
        return (false, false);
    }

    let paddle_center = paddle.y + config.paddle_height / 2.0;
    let ball_center = ball.y + config.ball_size / 2.0;
    let offset = ball_center - paddle_center;
    (offset < -config.paddle_speed, offset > config.paddle_speed)
}
