//! Game and session configuration

use crate::error::{PongError, PongResult};
use std::time::Duration;

/// Playfield geometry and game rules
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Playfield width in pixels
    pub width: f32,
    /// Playfield height in pixels
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    /// Distance between a paddle and its side wall
    pub paddle_margin: f32,
    /// Ball edge length (the ball is square)
    pub ball_size: f32,
    /// Paddle movement per frame
    pub paddle_speed: f32,
    /// Ball movement per frame on each axis
    pub ball_speed: f32,
    /// Points needed to win
    pub winning_score: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            paddle_width: 20.0,
            paddle_height: 100.0,
            paddle_margin: 50.0,
            ball_size: 15.0,
            paddle_speed: 5.0,
            ball_speed: 3.0,
            winning_score: 5,
        }
    }
}

/// Configuration of a running game with its hardware mirror
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub game: GameConfig,
    /// Physics and input rate
    pub game_hz: u32,
    /// Hardware mirror rate
    pub mirror_hz: u32,
    /// Skip the menu and serve immediately
    pub autostart: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            game_hz: 60,
            mirror_hz: 30,
            autostart: false,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> PongResult<()> {
        if self.game_hz == 0 || self.mirror_hz == 0 {
            return Err(PongError::invalid_config("loop rates must be at least 1 Hz"));
        }
        let game = &self.game;
        if game.width <= 0.0 || game.height <= 0.0 {
            return Err(PongError::invalid_config(format!(
                "playfield must not be empty ({}x{})",
                game.width, game.height
            )));
        }
        if game.paddle_height >= game.height || game.ball_size >= game.height {
            return Err(PongError::invalid_config("paddle and ball must fit in the playfield"));
        }
        if game.winning_score == 0 {
            return Err(PongError::invalid_config("winning score must be at least 1"));
        }
        Ok(())
    }

    pub fn game_period(&self) -> Duration {
        period(self.game_hz)
    }

    pub fn mirror_period(&self) -> Duration {
        period(self.mirror_hz)
    }
}

fn period(hz: u32) -> Duration {
    Duration::from_secs(1) / hz.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SessionConfig::default();
        config.validate().unwrap();
        assert_eq!(config.game_period(), Duration::from_micros(16_666) + Duration::from_nanos(666));
        assert_eq!(config.mirror_period(), Duration::from_nanos(33_333_333));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = SessionConfig {
            mirror_hz: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(PongError::InvalidConfig { .. })));

        config.mirror_hz = 30;
        config.game.winning_score = 0;
        assert!(config.validate().is_err());

        config.game.winning_score = 5;
        config.game.height = 0.0;
        assert!(config.validate().is_err());
    }
}
