use std::path::Path;

use anyhow::Result;
use chart_model::MIN_WINDOW_SIZE;
use serde::{Deserialize, Serialize};

/// Tunable constants for metric extraction.
///
/// The defaults are the empirically chosen values the signals were
/// calibrated against; override them from a JSON file when experimenting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    /// Window length in seconds
    pub window_size: f64,
    /// Same-lane gap (seconds) below which a repeat counts as a jack
    pub jack_threshold: f64,
    /// Jack score for a zero gap
    pub jack_max_score: f64,
    /// Multiplier for a jack inside a repeated identical chord
    pub code_jack_factor: f64,
    /// Outlier threshold in standard deviations above the mean nps
    pub outlier_sigma: f64,
    /// Fraction of the excess kept above the outlier threshold
    pub outlier_compression: f64,
    pub roll_factor: f64,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            window_size: 1.0,
            jack_threshold: 0.2,
            jack_max_score: 25.0,
            code_jack_factor: 0.5,
            outlier_sigma: 3.0,
            outlier_compression: 0.5,
            roll_factor: 0.1,
        }
    }
}

impl MetricConfig {
    /// Clamp every field to a usable range; non-finite values fall back to defaults.
    pub fn validate(&mut self) {
        let defaults = Self::default();
        self.window_size =
            sanitize(self.window_size, defaults.window_size).clamp(MIN_WINDOW_SIZE, 60.0);
        self.jack_threshold = sanitize(self.jack_threshold, defaults.jack_threshold).clamp(0.01, 2.0);
        self.jack_max_score =
            sanitize(self.jack_max_score, defaults.jack_max_score).clamp(0.0, 1000.0);
        self.code_jack_factor =
            sanitize(self.code_jack_factor, defaults.code_jack_factor).clamp(0.0, 1.0);
        self.outlier_sigma = sanitize(self.outlier_sigma, defaults.outlier_sigma).clamp(0.0, 100.0);
        self.outlier_compression =
            sanitize(self.outlier_compression, defaults.outlier_compression).clamp(0.0, 1.0);
        self.roll_factor = sanitize(self.roll_factor, defaults.roll_factor).clamp(0.0, 100.0);
    }

    /// Read config from a JSON file. Missing fields take their defaults.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut config: MetricConfig = serde_json::from_str(&data)?;
        config.validate();
        Ok(config)
    }

    /// Write config to a JSON file.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn sanitize(value: f64, default: f64) -> f64 {
    if value.is_finite() { value } else { default }
}
