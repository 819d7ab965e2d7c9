//! Tuning file loaded by the command-line adapter.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use gridwise_system_clusters::ClusterTuning;
use gridwise_system_motion::MotionTuning;
use serde::Deserialize;

/// Aggregated tuning for every system the adapter drives.
///
/// ```toml
/// [motion]
/// max_speed = 2
/// preferred_speed = 8
///
/// [clusters]
/// cluster_distance = 13
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// Movement budgets handed to the motion planner.
    pub(crate) motion: MotionTuning,
    /// Link distance used by the clustering pass.
    pub(crate) clusters: ClusterTuning,
}

impl Config {
    /// Reads the TOML file when provided, falling back to defaults otherwise.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse tuning toml contents")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_keep_defaults() {
        let config = Config::parse("[motion]\npreferred_speed = 8\n").expect("valid toml");
        assert_eq!(config.motion.max_speed, MotionTuning::default().max_speed);
        assert_eq!(config.motion.preferred_speed, 8);
        assert_eq!(config.clusters, ClusterTuning::default());
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(Config::parse("[pathing]\nspeed = 3\n").is_err());
    }

    #[test]
    fn absent_path_yields_defaults() {
        assert_eq!(Config::load(None).expect("defaults"), Config::default());
    }
}
