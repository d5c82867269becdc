//! Container configuration.
//!
//! Configuration can be built in code, read from environment variables, or,
//! with the `config` feature, deserialized from JSON.

use std::env;
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Default limit on the depth of one resolution chain.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Tuning knobs of a [`Container`](crate::Container).
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Container, ContainerConfig};
///
/// let config = ContainerConfig::default().cycle_tolerance(1).max_depth(64);
/// assert_eq!(config.cycle_tolerance, 1);
///
/// let container = Container::with_config(config);
/// assert_eq!(container.config().max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// How many times a bean id may already be active in a resolution chain
    /// before re-entering it is reported as a cycle. `0` rejects any
    /// recurrence.
    pub cycle_tolerance: usize,
    /// Maximum number of beans under construction in one resolution chain.
    pub max_depth: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            cycle_tolerance: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ContainerConfig {
    /// Sets the cycle tolerance.
    pub fn cycle_tolerance(mut self, tolerance: usize) -> Self {
        self.cycle_tolerance = tolerance;
        self
    }

    /// Sets the maximum resolution depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Reads `<PREFIX>_CYCLE_TOLERANCE` and `<PREFIX>_MAX_DEPTH`.
    ///
    /// Missing variables keep their defaults; unparseable ones are logged and
    /// ignored.
    pub fn from_env(prefix: &str) -> Self {
        let prefix = prefix.to_uppercase();
        let mut config = Self::default();
        if let Some(tolerance) = read_usize(&format!("{prefix}_CYCLE_TOLERANCE")) {
            config.cycle_tolerance = tolerance;
        }
        if let Some(depth) = read_usize(&format!("{prefix}_MAX_DEPTH")) {
            config.max_depth = depth;
        }
        config
    }

    /// Parses a JSON document such as `{"cycle_tolerance": 1}`.
    ///
    /// Absent fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn read_usize(key: &str) -> Option<usize> {
    let value = env::var(key).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(key, value = %value, error = %err, "ignoring invalid container setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict() {
        let config = ContainerConfig::default();
        assert_eq!(config.cycle_tolerance, 0);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn environment_overrides() {
        env::set_var("IOCTEST_CYCLE_TOLERANCE", "2");
        env::set_var("IOCTEST_MAX_DEPTH", "not-a-number");

        let config = ContainerConfig::from_env("ioctest");
        assert_eq!(config.cycle_tolerance, 2);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);

        env::remove_var("IOCTEST_CYCLE_TOLERANCE");
        env::remove_var("IOCTEST_MAX_DEPTH");
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_with_partial_fields() {
        let config = ContainerConfig::from_json(r#"{"max_depth": 16}"#).unwrap();
        assert_eq!(config, ContainerConfig::default().max_depth(16));
        assert!(ContainerConfig::from_json("[]").is_err());
    }
}
