//! Scheduler configuration and per-instance settings.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Behavior system configuration, usually loaded from a YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorSystemConfig {
    /// Global seed for per-agent RNG streams
    pub seed: u64,

    /// Maximum nesting of node updates (sub-trees included)
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,

    /// Cap on tree periods run by a single scheduler tick (at least 1)
    #[serde(default = "default_max_updates_per_tick")]
    pub max_updates_per_tick: u32,

    /// Update rate multiplier applied to new instances
    #[serde(default = "default_rate_scale")]
    pub default_rate_scale: f32,

    /// Restart trees when the root finishes instead of stopping
    pub looping: bool,
}

fn default_max_call_depth() -> usize {
    100
}
fn default_max_updates_per_tick() -> u32 {
    8
}
fn default_rate_scale() -> f32 {
    1.0
}

impl Default for BehaviorSystemConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_call_depth: default_max_call_depth(),
            max_updates_per_tick: default_max_updates_per_tick(),
            default_rate_scale: default_rate_scale(),
            looping: false,
        }
    }
}

impl BehaviorSystemConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn settings(&self) -> BehaviorSettings {
        BehaviorSettings {
            update_rate_scale: self.default_rate_scale,
            looping: self.looping,
            seed: self.seed,
            max_call_depth: self.max_call_depth,
            max_updates_per_tick: self.max_updates_per_tick.max(1),
        }
    }
}

/// Settings of one behavior instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSettings {
    /// Multiplier on elapsed time; `0` freezes the tree.
    pub update_rate_scale: f32,
    pub looping: bool,
    pub seed: u64,
    pub max_call_depth: usize,
    pub max_updates_per_tick: u32,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        BehaviorSystemConfig::default().settings()
    }
}
