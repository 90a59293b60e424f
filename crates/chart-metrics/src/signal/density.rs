use crate::window::{WindowedNotes, group_chords};

/// Distinct timestamps per window (a chord is one action)
pub fn distinct_timestamps(windows: &WindowedNotes) -> Vec<usize> {
    windows.iter().map(|notes| group_chords(notes).len()).collect()
}

/// Actions per second for each window, before outlier dampening
pub fn nps(windows: &WindowedNotes) -> Vec<f64> {
    let size = windows.window_size();
    distinct_timestamps(windows)
        .into_iter()
        .map(|count| count as f64 / size)
        .collect()
}

/// Compress values above `mean + sigma * std` of the non-zero entries.
///
/// Returns the threshold when any non-zero value exists. Values above it
/// become `threshold + compression * (value - threshold)`.
pub fn dampen_outliers(values: &mut [f64], sigma: f64, compression: f64) -> Option<f64> {
    let non_zero: Vec<f64> = values.iter().copied().filter(|&v| v > 0.0).collect();
    if non_zero.is_empty() {
        return None;
    }
    let n = non_zero.len() as f64;
    let mean = non_zero.iter().sum::<f64>() / n;
    let variance = non_zero.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let threshold = mean + sigma * variance.sqrt();

    for value in values.iter_mut().filter(|v| **v > threshold) {
        *value = threshold + compression * (*value - threshold);
    }
    Some(threshold)
}

/// `ln(1 + sum(c - 1))` over the chords of each window
pub fn chord_strain(windows: &WindowedNotes) -> Vec<f64> {
    windows
        .iter()
        .map(|notes| {
            let extra: usize = group_chords(notes)
                .iter()
                .map(|chord| chord.size().saturating_sub(1))
                .sum();
            (extra as f64).ln_1p()
        })
        .collect()
}
