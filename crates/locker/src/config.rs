//! Configuration for a locker's retry policy

use crate::delay::{Delay, ExponentialDelay, FixedDelay};
use crate::locker::DEFAULT_MAX_ATTEMPTS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy of a [`Locker`](crate::Locker).
///
/// Deserializes from any serde format; missing fields take their defaults.
///
/// ```toml
/// max_attempts = 10
///
/// [delay]
/// kind = "exponential"
/// initial_delay_ms = 5
/// max_delay_ms = 500
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockerConfig {
    /// Maximum number of acquire attempts
    pub max_attempts: u32,

    /// Wait strategy between attempts
    pub delay: DelayConfig,
}

impl Default for LockerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DelayConfig::default(),
        }
    }
}

impl LockerConfig {
    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `LOCKER_MAX_ATTEMPTS` for the maximum number of attempts
    /// - `LOCKER_DELAY_MS` for a fixed delay in milliseconds
    ///
    /// Unset or unparsable variables leave the default in place.
    pub fn from_env() -> Self {
        use std::env;

        let mut config = Self::default();

        if let Ok(max_attempts_str) = env::var("LOCKER_MAX_ATTEMPTS")
            && let Ok(max_attempts) = max_attempts_str.parse::<u32>()
        {
            config.max_attempts = max_attempts;
        }

        if let Ok(delay_str) = env::var("LOCKER_DELAY_MS")
            && let Ok(delay_ms) = delay_str.parse::<u64>()
        {
            config.delay = DelayConfig::Fixed { delay_ms };
        }

        config
    }
}

/// Serializable description of a [`Delay`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DelayConfig {
    /// See [`FixedDelay`].
    Fixed {
        /// Delay in milliseconds
        #[serde(default = "default_fixed_delay_ms")]
        delay_ms: u64,
    },

    /// See [`ExponentialDelay`].
    Exponential {
        /// First delay in milliseconds
        #[serde(default = "default_fixed_delay_ms")]
        initial_delay_ms: u64,
        /// Upper bound in milliseconds
        #[serde(default = "default_max_delay_ms")]
        max_delay_ms: u64,
        /// Growth factor
        #[serde(default = "default_multiplier")]
        multiplier: f64,
        /// Jitter factor (0.0 to 1.0)
        #[serde(default)]
        jitter: f64,
    },
}

fn default_fixed_delay_ms() -> u64 {
    5
}

fn default_max_delay_ms() -> u64 {
    1_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for DelayConfig {
    fn default() -> Self {
        DelayConfig::Fixed {
            delay_ms: default_fixed_delay_ms(),
        }
    }
}

impl DelayConfig {
    /// Build the delay strategy this configuration describes.
    pub fn build_delay(&self) -> Box<dyn Delay> {
        match *self {
            DelayConfig::Fixed { delay_ms } => {
                Box::new(FixedDelay::new(Duration::from_millis(delay_ms)))
            }
            DelayConfig::Exponential {
                initial_delay_ms,
                max_delay_ms,
                multiplier,
                jitter,
            } => Box::new(
                ExponentialDelay::builder()
                    .initial_delay(Duration::from_millis(initial_delay_ms))
                    .max_delay(Duration::from_millis(max_delay_ms))
                    .multiplier(multiplier)
                    .jitter(jitter)
                    .build(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LockerConfig::default();
        assert_eq!(config.max_attempts, 6);
        assert_eq!(config.delay, DelayConfig::Fixed { delay_ms: 5 });

        let mut delay = config.delay.build_delay();
        assert_eq!(delay.next(), Duration::from_millis(5));
    }

    #[test]
    fn test_parse_empty_toml() {
        let config: LockerConfig = toml::from_str("").unwrap();
        assert_eq!(config, LockerConfig::default());
    }

    #[test]
    fn test_parse_fixed_toml() {
        let config: LockerConfig = toml::from_str(
            r#"
            max_attempts = 3

            [delay]
            kind = "fixed"
            delay_ms = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.delay, DelayConfig::Fixed { delay_ms: 25 });
    }

    #[test]
    fn test_parse_exponential_toml() {
        let config: LockerConfig = toml::from_str(
            r#"
            [delay]
            kind = "exponential"
            initial_delay_ms = 10
            max_delay_ms = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.max_attempts, 6);
        assert_eq!(
            config.delay,
            DelayConfig::Exponential {
                initial_delay_ms: 10,
                max_delay_ms: 30,
                multiplier: 2.0,
                jitter: 0.0,
            }
        );

        let mut delay = config.delay.build_delay();
        assert_eq!(delay.next(), Duration::from_millis(10));
        assert_eq!(delay.next(), Duration::from_millis(20));
        assert_eq!(delay.next(), Duration::from_millis(30));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result: Result<LockerConfig, _> = toml::from_str(
            r#"
            [delay]
            kind = "fibonacci"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("LOCKER_MAX_ATTEMPTS", Some("12")),
                ("LOCKER_DELAY_MS", Some("40")),
            ],
            || {
                let config = LockerConfig::from_env();
                assert_eq!(config.max_attempts, 12);
                assert_eq!(config.delay, DelayConfig::Fixed { delay_ms: 40 });
            },
        );
    }

    #[test]
    fn test_from_env_ignores_garbage() {
        temp_env::with_vars(
            [
                ("LOCKER_MAX_ATTEMPTS", Some("many")),
                ("LOCKER_DELAY_MS", None),
            ],
            || {
                assert_eq!(LockerConfig::from_env(), LockerConfig::default());
            },
        );
    }
}
