use serde::Deserialize;

use crate::{
    error::NavigatorError,
    models::{ARRIVAL_INSTRUCTION, PLACEHOLDER_INSTRUCTION},
};

pub const PLACEHOLDER_ENV: &str = "NAV_PLACEHOLDER_INSTRUCTION";
pub const ARRIVAL_ENV: &str = "NAV_ARRIVAL_INSTRUCTION";
pub const SPATIAL_INDEX_THRESHOLD_ENV: &str = "NAV_SPATIAL_INDEX_THRESHOLD";

/// Routes shorter than this are scanned linearly.
pub const DEFAULT_SPATIAL_INDEX_THRESHOLD: usize = 512;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NavigatorConfig {
    /// Shown until both a route and a fix are available.
    #[serde(default = "default_placeholder")]
    pub placeholder_instruction: String,
    /// Shown once the user is projected past the last step.
    #[serde(default = "default_arrival")]
    pub arrival_instruction: String,
    /// Minimum flattened path length at which a k-d tree replaces the linear scan.
    #[serde(default = "default_spatial_index_threshold")]
    pub spatial_index_threshold: usize,
}

fn default_placeholder() -> String {
    PLACEHOLDER_INSTRUCTION.to_string()
}

fn default_arrival() -> String {
    ARRIVAL_INSTRUCTION.to_string()
}

fn default_spatial_index_threshold() -> usize {
    DEFAULT_SPATIAL_INDEX_THRESHOLD
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            placeholder_instruction: default_placeholder(),
            arrival_instruction: default_arrival(),
            spatial_index_threshold: default_spatial_index_threshold(),
        }
    }
}

impl NavigatorConfig {
    pub fn from_env() -> Result<Self, NavigatorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value source, falling back to defaults for missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NavigatorError> {
        let mut config = Self::default();
        if let Some(placeholder) = lookup(PLACEHOLDER_ENV) {
            config.placeholder_instruction = placeholder;
        }
        if let Some(arrival) = lookup(ARRIVAL_ENV) {
            config.arrival_instruction = arrival;
        }
        if let Some(raw) = lookup(SPATIAL_INDEX_THRESHOLD_ENV) {
            config.spatial_index_threshold = raw.trim().parse().map_err(|_| {
                NavigatorError::Config(format!(
                    "{SPATIAL_INDEX_THRESHOLD_ENV} must be a non-negative integer, got {raw:?}"
                ))
            })?;
        }
        Ok(config)
    }
}
