use std::collections::HashMap;

use crate::config::MetricConfig;
use crate::window::WindowedNotes;

/// Fastest same-lane repeat in each window, scored linearly below the threshold.
///
/// Repeats inside two identical multi-lane chords ("code jacks") are scaled
/// by `code_jack_factor`. Lane history does not carry across windows.
pub fn jack_pen(windows: &WindowedNotes, config: &MetricConfig) -> Vec<f64> {
    (0..windows.len())
        .map(|i| {
            let chords = windows.chords(i);
            let mut last_chord: HashMap<u32, usize> = HashMap::new();
            let mut worst: f64 = 0.0;

            for (ci, chord) in chords.iter().enumerate() {
                for &lane in &chord.lanes {
                    if let Some(prev) = last_chord.insert(lane, ci) {
                        let previous = &chords[prev];
                        let gap = chord.time - previous.time;
                        if gap >= config.jack_threshold {
                            continue;
                        }
                        let mut score = config.jack_max_score * (config.jack_threshold - gap)
                            / config.jack_threshold;
                        if chord.size() > 1 && chord.lanes == previous.lanes {
                            score *= config.code_jack_factor;
                        }
                        worst = worst.max(score);
                    }
                }
            }
            worst
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_model::Note;

    fn windows(notes: &[Note], count: usize) -> WindowedNotes {
        WindowedNotes::new(notes, 0.0, 1.0, count)
    }

    #[test]
    fn test_single_lane_jack() {
        let notes = vec![Note::tap(2, 0.0), Note::tap(2, 0.1), Note::tap(2, 0.5)];
        let pen = jack_pen(&windows(&notes, 1), &MetricConfig::default());
        assert!((pen[0] - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_slow_repeat_scores_zero() {
        let notes = vec![Note::tap(0, 0.0), Note::tap(0, 0.2), Note::tap(1, 0.25)];
        let pen = jack_pen(&windows(&notes, 1), &MetricConfig::default());
        assert_eq!(pen, vec![0.0]);
    }

    #[test]
    fn test_code_jack_halved() {
        let notes = vec![
            Note::tap(0, 0.0),
            Note::tap(3, 0.0),
            Note::tap(0, 0.1),
            Note::tap(3, 0.1),
        ];
        let pen = jack_pen(&windows(&notes, 1), &MetricConfig::default());
        assert!((pen[0] - 6.25).abs() < 1e-9);
    }

    #[test]
    fn test_different_chord_shape_not_halved() {
        let notes = vec![
            Note::tap(0, 0.0),
            Note::tap(3, 0.0),
            Note::tap(0, 0.1),
            Note::tap(4, 0.1),
        ];
        let pen = jack_pen(&windows(&notes, 1), &MetricConfig::default());
        assert!((pen[0] - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_history_resets_per_window() {
        let notes = vec![Note::tap(0, 0.95), Note::tap(0, 1.05)];
        let pen = jack_pen(&windows(&notes, 2), &MetricConfig::default());
        assert_eq!(pen, vec![0.0, 0.0]);
    }
}
