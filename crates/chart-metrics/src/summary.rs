use chart_model::Chart;
use serde::{Deserialize, Serialize};

use crate::signal;
use crate::window::{WindowedNotes, group_chords};

/// Half-width of the local density window around each note, in seconds
const LOCAL_RADIUS: f64 = 0.5;

/// Whole-chart density statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSummary {
    pub total_notes: usize,
    pub total_holds: usize,
    /// Notes per second over the whole chart
    pub global_nps: f64,
    /// Most notes within half a second either side of any note
    pub peak_local_nps: usize,
    /// Population std of per-window action counts
    pub nps_std: f64,
    /// Mean notes per distinct timestamp
    pub chord_mean: f64,
}

impl ChartSummary {
    pub fn from_chart(chart: &Chart, window_size: f64) -> Self {
        let times: Vec<f64> = chart.notes.iter().map(|n| n.time).collect();
        let windows = WindowedNotes::from_chart(chart, window_size);
        let counts = signal::distinct_timestamps(&windows);
        let chords = group_chords(&chart.notes).len();

        Self {
            total_notes: chart.total_notes(),
            total_holds: chart.total_holds(),
            global_nps: chart.total_notes() as f64 / chart.meta.duration,
            peak_local_nps: peak_local_density(&times),
            nps_std: population_std(&counts),
            chord_mean: if chords == 0 {
                0.0
            } else {
                chart.total_notes() as f64 / chords as f64
            },
        }
    }
}

/// Max count of notes in `[t - r, t + r)` over every note time `t`; `times` sorted
fn peak_local_density(times: &[f64]) -> usize {
    let mut lo = 0;
    let mut hi = 0;
    let mut peak = 0;
    for &t in times {
        while times[lo] < t - LOCAL_RADIUS {
            lo += 1;
        }
        while hi < times.len() && times[hi] < t + LOCAL_RADIUS {
            hi += 1;
        }
        peak = peak.max(hi - lo);
    }
    peak
}

fn population_std(counts: &[usize]) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<usize>() as f64 / n;
    let variance = counts
        .iter()
        .map(|&c| (c as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt()
}
