//! Host configuration read from the environment.

use container_core::rng::random_seed;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Summary,
}

impl FromStr for ReportFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ReportFormat::Json),
            "summary" => Ok(ReportFormat::Summary),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub players: usize,
    /// Base seed; game `n` plays with `{seed}-{n}`
    pub seed: String,
    pub games: usize,
    pub max_moves: usize,
    pub report: ReportFormat,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            players: 4,
            seed: random_seed(),
            games: 1,
            max_moves: 5000,
            report: ReportFormat::Summary,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let players = match lookup("CONTAINER_PLAYERS") {
            Some(value) => match value.parse::<usize>() {
                Ok(n) if (2..=5).contains(&n) => n,
                _ => return Err(invalid("CONTAINER_PLAYERS", "a number from 2 to 5", value)),
            },
            None => defaults.players,
        };

        Ok(Self {
            players,
            seed: lookup("CONTAINER_SEED")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.seed),
            games: positive(&lookup, "CONTAINER_GAMES", defaults.games)?,
            max_moves: positive(&lookup, "CONTAINER_MAX_MOVES", defaults.max_moves)?,
            report: match lookup("CONTAINER_REPORT") {
                Some(value) => value
                    .parse()
                    .map_err(|()| invalid("CONTAINER_REPORT", "json or summary", value))?,
                None => defaults.report,
            },
        })
    }

    /// Seed of the `index`th game
    pub fn game_seed(&self, index: usize) -> String {
        if self.games == 1 {
            self.seed.clone()
        } else {
            format!("{}-{}", self.seed, index)
        }
    }
}

fn positive<F>(lookup: &F, var: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => match value.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(invalid(var, "a positive number", value)),
        },
        None => Ok(default),
    }
}

fn invalid(var: &'static str, expected: &'static str, value: String) -> ConfigError {
    ConfigError::Invalid {
        var,
        expected,
        value,
    }
}
