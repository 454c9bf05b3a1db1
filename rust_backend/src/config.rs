//! Solver configuration file support.
//!
//! This module reads the tuning knobs of the solver, the target-window
//! sampler and the twilight calculator from a TOML file. Every field has a
//! default, so an empty file (or no file) yields the standard behaviour.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{VisibilityError, VisibilityResult};

/// Visibility configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisibilityConfig {
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub target_window: TargetWindowSettings,
    #[serde(default)]
    pub twilight: TwilightSettings,
}

/// Circumstance solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Stop refining once a bracket spans at most this many seconds.
    #[serde(default = "default_tolerance_seconds")]
    pub tolerance_seconds: u32,
    /// Target bracket width, in seconds, of each successive refinement round.
    #[serde(default = "default_round_seconds")]
    pub round_seconds: Vec<u32>,
}

/// Target window sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetWindowSettings {
    #[serde(default = "default_sample_minutes")]
    pub sample_minutes: u32,
}

/// Twilight calculator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwilightSettings {
    /// Resolution used when the night is too shallow for hourly samples.
    #[serde(default = "default_resample_minutes")]
    pub resample_minutes: u32,
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u32,
    /// Refraction-adjusted altitude of the Sun's centre at sunset.
    #[serde(default = "default_sunset_altitude")]
    pub sunset_altitude: f64,
}

fn default_tolerance_seconds() -> u32 {
    1
}

fn default_round_seconds() -> Vec<u32> {
    vec![600, 60, 10, 2, 1]
}

fn default_sample_minutes() -> u32 {
    10
}

fn default_resample_minutes() -> u32 {
    5
}

fn default_cache_ttl_hours() -> u32 {
    12
}

fn default_sunset_altitude() -> f64 {
    -(50.0 / 60.0)
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance_seconds: default_tolerance_seconds(),
            round_seconds: default_round_seconds(),
        }
    }
}

impl Default for TargetWindowSettings {
    fn default() -> Self {
        Self {
            sample_minutes: default_sample_minutes(),
        }
    }
}

impl Default for TwilightSettings {
    fn default() -> Self {
        Self {
            resample_minutes: default_resample_minutes(),
            cache_ttl_hours: default_cache_ttl_hours(),
            sunset_altitude: default_sunset_altitude(),
        }
    }
}

impl VisibilityConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(VisibilityConfig)` if the file parses and validates
    /// * `Err(VisibilityError::Configuration)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> VisibilityResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            VisibilityError::Configuration(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> VisibilityResult<Self> {
        let config: VisibilityConfig = toml::from_str(content).map_err(|e| {
            VisibilityError::Configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `visibility.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> VisibilityResult<Self> {
        let search_paths = [
            PathBuf::from("visibility.toml"),
            PathBuf::from("rust_backend/visibility.toml"),
            PathBuf::from("../visibility.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::debug!("loading visibility config from {}", path.display());
                return Self::from_file(&path);
            }
        }

        Err(VisibilityError::Configuration(
            "No visibility.toml found in standard locations".to_string(),
        ))
    }

    /// Check the invariants the solver and calculators rely on.
    pub fn validate(&self) -> VisibilityResult<()> {
        if self.solver.tolerance_seconds < 1 {
            return Err(VisibilityError::Configuration(
                "solver.tolerance_seconds must be at least 1".to_string(),
            ));
        }
        if self.solver.round_seconds.is_empty() {
            return Err(VisibilityError::Configuration(
                "solver.round_seconds must not be empty".to_string(),
            ));
        }
        if self.solver.round_seconds.contains(&0) {
            return Err(VisibilityError::Configuration(
                "solver.round_seconds entries must be positive".to_string(),
            ));
        }
        if self
            .solver
            .round_seconds
            .windows(2)
            .any(|pair| pair[1] >= pair[0])
        {
            return Err(VisibilityError::Configuration(
                "solver.round_seconds must be strictly decreasing".to_string(),
            ));
        }
        if self.target_window.sample_minutes == 0 {
            return Err(VisibilityError::Configuration(
                "target_window.sample_minutes must be positive".to_string(),
            ));
        }
        if self.twilight.resample_minutes == 0 {
            return Err(VisibilityError::Configuration(
                "twilight.resample_minutes must be positive".to_string(),
            ));
        }
        if self.twilight.cache_ttl_hours == 0 {
            return Err(VisibilityError::Configuration(
                "twilight.cache_ttl_hours must be positive".to_string(),
            ));
        }
        if !(-5.0..=0.0).contains(&self.twilight.sunset_altitude) {
            return Err(VisibilityError::Configuration(format!(
                "twilight.sunset_altitude {} must lie within [-5, 0]",
                self.twilight.sunset_altitude
            )));
        }
        Ok(())
    }
}
