//! Headless Pong engine
//!
//! [`Game`] owns the ball, both paddles, the scores and the
//! menu/playing/paused/over state machine. It is stepped by the game loop;
//! everything else (rendering, the hardware mirror) works on a [`Snapshot`]
//! copied out of it.

pub mod controls;

use crate::config::GameConfig;
use crate::geometry::Rect;
use std::fmt;
use tracing::{debug, info};

pub use controls::{Controls, InputDecoder};

/// Top-level game state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Menu,
    Playing,
    Paused,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => f.write_str("player 1"),
            Player::Two => f.write_str("player 2"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub score: u32,
}

/// Raw switch and push-button words last read from the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareInputs {
    pub switches: u32,
    /// Active-low: a cleared bit is a pressed button
    pub buttons: u32,
}

impl HardwareInputs {
    /// Push-button word with every button released
    pub const BUTTONS_RELEASED: u32 = 0xF;
}

impl Default for HardwareInputs {
    fn default() -> Self {
        Self {
            switches: 0,
            buttons: Self::BUTTONS_RELEASED,
        }
    }
}

/// Read-only copy of the game at one instant
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    pub state: GameState,
    pub ball: Ball,
    pub player1: Paddle,
    pub player2: Paddle,
    pub winner: Option<Player>,
    pub inputs: HardwareInputs,
}

/// The game itself
#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    state: GameState,
    ball: Ball,
    player1: Paddle,
    player2: Paddle,
    winner: Option<Player>,
    inputs: HardwareInputs,
    fast_serve: bool,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let mut game = Self {
            config,
            state: GameState::Menu,
            ball: Ball::default(),
            player1: Paddle::default(),
            player2: Paddle::default(),
            winner: None,
            inputs: HardwareInputs::default(),
            fast_serve: false,
        };
        game.reset();
        game
    }

    /// Back to the menu with a centred ball and zeroed scores
    ///
    /// Hardware inputs are kept; they belong to the mirror.
    pub fn reset(&mut self) {
        let c = &self.config;
        let paddle_y = c.height / 2.0 - c.paddle_height / 2.0;

        self.state = GameState::Menu;
        self.winner = None;
        self.ball = Ball {
            x: c.width / 2.0,
            y: c.height / 2.0,
            vel_x: c.ball_speed,
            vel_y: c.ball_speed,
        };
        self.player1 = Paddle {
            x: c.paddle_margin,
            y: paddle_y,
            score: 0,
        };
        self.player2 = Paddle {
            x: c.width - c.paddle_margin - c.paddle_width,
            y: paddle_y,
            score: 0,
        };
    }

    /// Leave the menu and serve
    pub fn start(&mut self) {
        if self.state == GameState::Menu {
            self.state = GameState::Playing;
            info!("game started");
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn paddle(&self, player: Player) -> &Paddle {
        match player {
            Player::One => &self.player1,
            Player::Two => &self.player2,
        }
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn inputs(&self) -> HardwareInputs {
        self.inputs
    }

    pub fn set_inputs(&mut self, inputs: HardwareInputs) {
        self.inputs = inputs;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            ball: self.ball,
            player1: self.player1,
            player2: self.player2,
            winner: self.winner,
            inputs: self.inputs,
        }
    }

    pub fn ball_rect(&self) -> Rect {
        Rect::new(self.ball.x, self.ball.y, self.config.ball_size, self.config.ball_size)
    }

    pub fn paddle_rect(&self, player: Player) -> Rect {
        let paddle = self.paddle(player);
        Rect::new(paddle.x, paddle.y, self.config.paddle_width, self.config.paddle_height)
    }

    /// Apply one frame of player input
    pub fn apply(&mut self, controls: &Controls) {
        let c = &self.config;
        let max_y = c.height - c.paddle_height;
        move_paddle(&mut self.player1, controls.p1_up, controls.p1_down, c.paddle_speed, max_y);
        move_paddle(&mut self.player2, controls.p2_up, controls.p2_down, c.paddle_speed, max_y);
        self.fast_serve = controls.fast_serve;

        if controls.toggle {
            let next = match self.state {
                GameState::Menu | GameState::Paused => GameState::Playing,
                GameState::Playing => GameState::Paused,
                GameState::Over => GameState::Over,
            };
            if next != self.state {
                debug!("state {:?} -> {:?}", self.state, next);
                self.state = next;
            }
        }

        if controls.reset && self.state == GameState::Over {
            info!("new game");
            self.reset();
        }
    }

    /// Advance the ball by one frame
    pub fn step(&mut self) {
        if self.state != GameState::Playing {
            return;
        }

        self.ball.x += self.ball.vel_x;
        self.ball.y += self.ball.vel_y;

        let floor = self.config.height - self.config.ball_size;
        if self.ball.y <= 0.0 {
            self.ball.vel_y = self.ball.vel_y.abs();
        } else if self.ball.y >= floor {
            self.ball.vel_y = -self.ball.vel_y.abs();
        }

        let ball = self.ball_rect();
        if self.ball.vel_x < 0.0 && ball.intersects(&self.paddle_rect(Player::One)) {
            self.ball.vel_x = -self.ball.vel_x;
        } else if self.ball.vel_x > 0.0 && ball.intersects(&self.paddle_rect(Player::Two)) {
            self.ball.vel_x = -self.ball.vel_x;
        }

        if self.ball.x < 0.0 {
            self.point(Player::Two);
        } else if self.ball.x > self.config.width {
            self.point(Player::One);
        }
    }

    fn serve_speed(&self) -> f32 {
        if self.fast_serve {
            self.config.ball_speed * 2.0
        } else {
            self.config.ball_speed
        }
    }

    fn point(&mut self, scorer: Player) {
        let speed = self.serve_speed();
        let paddle = match scorer {
            Player::One => &mut self.player1,
            Player::Two => &mut self.player2,
        };
        paddle.score += 1;
        let score = paddle.score;

        // Serve towards the player who conceded
        self.ball.x = self.config.width / 2.0;
        self.ball.y = self.config.height / 2.0;
        self.ball.vel_x = match scorer {
            Player::One => -speed,
            Player::Two => speed,
        };
        self.ball.vel_y = self.ball.vel_y.signum() * speed;

        info!(
            "{scorer} scores ({}-{})",
            self.player1.score, self.player2.score
        );

        if score >= self.config.winning_score {
            self.state = GameState::Over;
            self.winner = Some(scorer);
            info!("game over: {scorer} wins");
        }
    }
}

fn move_paddle(paddle: &mut Paddle, up: bool, down: bool, speed: f32, max_y: f32) {
    if up && paddle.y > 0.0 {
        paddle.y = (paddle.y - speed).max(0.0);
    }
    if down && paddle.y < max_y {
        paddle.y = (paddle.y + speed).min(max_y);
    }
}
