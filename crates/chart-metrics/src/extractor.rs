use chart_model::Chart;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::MetricConfig;
use crate::signal;
use crate::window::WindowedNotes;

/// Seven equal-length per-window signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricVectors {
    pub window_size: f64,
    pub nps: Vec<f64>,
    pub ln_strain: Vec<f64>,
    pub jack_pen: Vec<f64>,
    pub roll_pen: Vec<f64>,
    pub alt_cost: Vec<f64>,
    pub hand_strain: Vec<f64>,
    pub chord_strain: Vec<f64>,
}

impl MetricVectors {
    /// Number of windows
    pub fn len(&self) -> usize {
        self.nps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nps.is_empty()
    }

    /// Signals by name, in a fixed order
    pub fn signals(&self) -> [(&'static str, &[f64]); 7] {
        [
            ("nps", self.nps.as_slice()),
            ("ln_strain", self.ln_strain.as_slice()),
            ("jack_pen", self.jack_pen.as_slice()),
            ("roll_pen", self.roll_pen.as_slice()),
            ("alt_cost", self.alt_cost.as_slice()),
            ("hand_strain", self.hand_strain.as_slice()),
            ("chord_strain", self.chord_strain.as_slice()),
        ]
    }
}

/// Computes [`MetricVectors`] for one chart at a time. Holds no chart state.
#[derive(Debug, Clone, Default)]
pub struct MetricExtractor {
    config: MetricConfig,
}

impl MetricExtractor {
    /// The config is validated first, so a zero or negative window size is clamped.
    pub fn new(mut config: MetricConfig) -> Self {
        config.validate();
        Self { config }
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    pub fn extract(&self, chart: &Chart) -> MetricVectors {
        let config = &self.config;
        let windows = WindowedNotes::from_chart(chart, config.window_size);

        let mut nps = signal::nps(&windows);
        let threshold =
            signal::dampen_outliers(&mut nps, config.outlier_sigma, config.outlier_compression);
        let ln_strain = signal::ln_strain(&chart.notes, &windows);
        let jack_pen = signal::jack_pen(&windows, config);
        let roll_pen = signal::roll_pen(&windows, &nps, config.roll_factor);
        let balance = signal::hand_balance(&windows, &chart.meta.hands);
        let chord_strain = signal::chord_strain(&windows);

        debug!(
            "extracted {} windows of {}s (nps outlier threshold {:?})",
            windows.len(),
            config.window_size,
            threshold
        );

        MetricVectors {
            window_size: config.window_size,
            nps,
            ln_strain,
            jack_pen,
            roll_pen,
            alt_cost: balance.alt_cost,
            hand_strain: balance.hand_strain,
            chord_strain,
        }
    }
}
