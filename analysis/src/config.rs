//! Analysis configuration.
//!
//! The constants that shape the analysis live here with their defaults.
//! A JSON file may override any subset of them:
//!
//! ```json
//! { "startYear": 2016, "excludedRegions": ["Sikkim"] }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Regions without retail coverage for the whole default window.
pub const DEFAULT_EXCLUDED_REGIONS: [&str; 3] = ["Chhattisgarh", "Manipur", "Sikkim"];

/// First year of the long window.
pub const DEFAULT_START_YEAR: i32 = 2014;

/// First year of the post-shock window.
pub const DEFAULT_POST_SHOCK_START: i32 = 2020;

/// Share of regions the wholesale split must cover to be analyzed.
pub const DEFAULT_WHOLESALE_MIN_REGION_SHARE: f64 = 0.25;

/// Rows shown at each end of a ranking.
pub const DEFAULT_TOP_N: usize = 5;

/// Options for an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Regions removed before any aggregation
    pub excluded_regions: Vec<String>,

    /// Records before this year are removed
    pub start_year: i32,

    /// First year of the post-shock window
    pub post_shock_start: i32,

    /// Minimum share of regions present in the wholesale split
    pub wholesale_min_region_share: f64,

    /// Rows at each end of a ranking
    pub top_n: usize,

    /// Fail instead of warn on unit / price type mismatches
    pub strict_units: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            excluded_regions: DEFAULT_EXCLUDED_REGIONS.iter().map(|r| r.to_string()).collect(),
            start_year: DEFAULT_START_YEAR,
            post_shock_start: DEFAULT_POST_SHOCK_START,
            wholesale_min_region_share: DEFAULT_WHOLESALE_MIN_REGION_SHARE,
            top_n: DEFAULT_TOP_N,
            strict_units: false,
        }
    }
}

impl AnalysisConfig {
    /// Load a config file. Keys absent from the file keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that cannot produce a meaningful run.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(1000..=9999).contains(&self.start_year) {
            return Err(ConfigError::Invalid(format!(
                "startYear must be a four-digit year, got {}",
                self.start_year
            )));
        }
        if self.post_shock_start < self.start_year {
            return Err(ConfigError::Invalid(format!(
                "postShockStart ({}) is before startYear ({})",
                self.post_shock_start, self.start_year
            )));
        }
        if !(0.0..=1.0).contains(&self.wholesale_min_region_share) {
            return Err(ConfigError::Invalid(format!(
                "wholesaleMinRegionShare must be within 0..=1, got {}",
                self.wholesale_min_region_share
            )));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("topN must be at least 1".to_string()));
        }
        Ok(())
    }
}
