//! World configuration.

use serde::Deserialize;

/// World-level settings, read from the `world` section of the node config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldSettings {
    /// Simulated milliseconds per wall-clock millisecond.
    #[serde(default = "default_time_compression")]
    pub time_compression: u64,

    /// Planet generation bounds.
    #[serde(default)]
    pub planet: PlanetSettings,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            time_compression: default_time_compression(),
            planet: PlanetSettings::default(),
        }
    }
}

/// Bounds for generated planet dimensions.
///
/// Width and height are drawn independently from
/// `min_dimension..=max_dimension`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PlanetSettings {
    /// Smallest width or height.
    #[serde(default = "default_min_dimension")]
    pub min_dimension: u32,

    /// Largest width or height.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

impl Default for PlanetSettings {
    fn default() -> Self {
        Self {
            min_dimension: default_min_dimension(),
            max_dimension: default_max_dimension(),
        }
    }
}

impl PlanetSettings {
    /// Settings producing planets with both sides in `min..=max`.
    pub const fn new(min_dimension: u32, max_dimension: u32) -> Self {
        Self {
            min_dimension,
            max_dimension,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_time_compression() -> u64 {
    100
}

const fn default_min_dimension() -> u32 {
    1_000
}

const fn default_max_dimension() -> u32 {
    5_000
}
