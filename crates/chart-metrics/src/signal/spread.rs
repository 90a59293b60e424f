use chart_model::Note;

use crate::window::WindowedNotes;

/// `variance(lanes) * nps * factor`: wide lane spread at high density
pub fn roll_pen(windows: &WindowedNotes, nps: &[f64], factor: f64) -> Vec<f64> {
    windows
        .iter()
        .zip(nps)
        .map(|(notes, &density)| lane_variance(notes) * density * factor)
        .collect()
}

fn lane_variance(notes: &[Note]) -> f64 {
    if notes.is_empty() {
        return 0.0;
    }
    let n = notes.len() as f64;
    let mean = notes.iter().map(|note| note.lane as f64).sum::<f64>() / n;
    notes
        .iter()
        .map(|note| (note.lane as f64 - mean).powi(2))
        .sum::<f64>()
        / n
}
