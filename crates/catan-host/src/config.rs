//! Host settings read from the environment.

use catan_rules::GameConfig;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{name} must be at least 1")]
    NotPositive { name: &'static str },
}

/// Listener address plus the game settings used for rooms created without
/// their own config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub addr: SocketAddr,
    pub game: GameConfig,
}

impl HostConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = parse_var(&lookup, "SERVER_ADDR")?.unwrap_or_else(default_addr);

        let mut game = GameConfig::default();
        if let Some(vp) = parse_positive(&lookup, "CATAN_VICTORY_POINTS")? {
            game.victory_points_to_win = vp;
        }
        if let Some(min) = parse_positive(&lookup, "CATAN_LONGEST_ROAD_MIN")? {
            game.longest_road_min = min;
        }
        if let Some(min) = parse_positive(&lookup, "CATAN_LARGEST_ARMY_MIN")? {
            game.largest_army_min = min;
        }

        Ok(Self { addr, game })
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            game: GameConfig::default(),
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

fn parse_positive<F>(lookup: &F, name: &'static str) -> Result<Option<u32>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_var::<F, u32>(lookup, name)? {
        Some(0) => Err(ConfigError::NotPositive { name }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HostConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let config = HostConfig::from_lookup(lookup(&[
            ("SERVER_ADDR", "127.0.0.1:9000"),
            ("CATAN_VICTORY_POINTS", "12"),
            ("CATAN_LARGEST_ARMY_MIN", " 4 "),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.game.victory_points_to_win, 12);
        assert_eq!(config.game.largest_army_min, 4);
        assert_eq!(config.game.longest_road_min, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert_eq!(
            HostConfig::from_lookup(lookup(&[("CATAN_LONGEST_ROAD_MIN", "five")])),
            Err(ConfigError::InvalidValue {
                name: "CATAN_LONGEST_ROAD_MIN",
                value: "five".into()
            })
        );
        assert_eq!(
            HostConfig::from_lookup(lookup(&[("CATAN_VICTORY_POINTS", "0")])),
            Err(ConfigError::NotPositive {
                name: "CATAN_VICTORY_POINTS"
            })
        );
        assert!(HostConfig::from_lookup(lookup(&[("SERVER_ADDR", "nowhere")])).is_err());
    }
}
