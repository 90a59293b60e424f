use serde::{Deserialize, Serialize};

use crate::error::ChartError;
use crate::layout::HandSplit;
use crate::note::Note;

/// Minimum reported duration in seconds
pub const MIN_DURATION: f64 = 1.0;
/// Longest accepted chart span in seconds (three hours)
pub const MAX_DURATION: f64 = 3.0 * 60.0 * 60.0;
/// Smallest window length metric windows are cut at
pub const MIN_WINDOW_SIZE: f64 = 0.05;

/// Clamp a window length to `MIN_WINDOW_SIZE` or more; non-finite lengths become one second
pub fn sanitize_window_size(window_size: f64) -> f64 {
    if window_size.is_finite() {
        window_size.max(MIN_WINDOW_SIZE)
    } else {
        1.0
    }
}

/// Source encoding a chart was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChartFormat {
    /// Measure/channel grid (bms, bme, bml, pms)
    #[default]
    Grid,
    /// Absolute-timestamp hit objects (osu!mania)
    Osu,
}

impl ChartFormat {
    /// Guess the format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "bms" | "bme" | "bml" | "pms" => Some(Self::Grid),
            "osu" => Some(Self::Osu),
            _ => None,
        }
    }
}

/// Chart-level metadata shared by both encodings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartMeta {
    pub key_count: u32,
    pub is_dual_side: bool,
    pub layout_name: String,
    /// Span from the first note to the last event, floored at `MIN_DURATION`
    pub duration: f64,
    /// Time of the first note; metric windows are anchored here
    pub start_time: f64,
    pub format: ChartFormat,
    pub title: String,
    pub artist: String,
    pub initial_bpm: f64,
    pub md5: String,
    pub sha256: String,
    pub hands: HandSplit,
}

impl Default for ChartMeta {
    fn default() -> Self {
        Self {
            key_count: 7,
            is_dual_side: false,
            layout_name: String::new(),
            duration: MIN_DURATION,
            start_time: 0.0,
            format: ChartFormat::Grid,
            title: String::new(),
            artist: String::new(),
            initial_bpm: 130.0,
            md5: String::new(),
            sha256: String::new(),
            hands: HandSplit::default(),
        }
    }
}

impl ChartMeta {
    /// Number of fixed-size windows covering the chart.
    ///
    /// The window length goes through [`sanitize_window_size`] and the duration
    /// is capped at `MAX_DURATION`, so the count stays bounded.
    pub fn window_count(&self, window_size: f64) -> usize {
        let duration = self.duration.min(MAX_DURATION);
        (duration / sanitize_window_size(window_size)).ceil().max(1.0) as usize
    }
}

/// A fully resolved chart: metadata plus the time-sorted canonical notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub meta: ChartMeta,
    pub notes: Vec<Note>,
}

impl Chart {
    /// Build a chart from a sorted note stream, filling in `start_time` and `duration`.
    ///
    /// Fails when the stream is empty or the span is negative, non-finite or
    /// longer than `MAX_DURATION`.
    pub fn from_notes(mut meta: ChartMeta, notes: Vec<Note>) -> Result<Self, ChartError> {
        let first = notes.first().ok_or(ChartError::EmptyChart)?.time;
        let last = notes
            .iter()
            .map(Note::end_time)
            .fold(f64::NEG_INFINITY, f64::max);

        let span = last - first;
        if !(0.0..=MAX_DURATION).contains(&span) {
            return Err(ChartError::InvalidDuration(span));
        }

        meta.start_time = first;
        meta.duration = span.max(MIN_DURATION);
        Ok(Self { meta, notes })
    }

    pub fn total_notes(&self) -> usize {
        self.notes.len()
    }

    pub fn total_holds(&self) -> usize {
        self.notes.iter().filter(|n| n.is_hold()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_notes_duration_includes_hold_end() {
        let notes = vec![Note::tap(0, 2.0), Note::hold(1, 3.0, 6.5)];
        let chart = Chart::from_notes(ChartMeta::default(), notes).unwrap();
        assert!((chart.meta.start_time - 2.0).abs() < 1e-9);
        assert!((chart.meta.duration - 4.5).abs() < 1e-9);
        assert_eq!(chart.total_holds(), 1);
    }

    #[test]
    fn test_from_notes_duration_floor() {
        let notes = vec![Note::tap(0, 5.0), Note::tap(1, 5.0)];
        let chart = Chart::from_notes(ChartMeta::default(), notes).unwrap();
        assert_eq!(chart.meta.duration, MIN_DURATION);
        assert_eq!(chart.meta.window_count(1.0), 1);
    }

    #[test]
    fn test_from_notes_empty() {
        let err = Chart::from_notes(ChartMeta::default(), Vec::new()).unwrap_err();
        assert!(matches!(err, ChartError::EmptyChart));
    }

    #[test]
    fn test_from_notes_non_finite() {
        let notes = vec![Note::tap(0, 0.0), Note::tap(0, f64::INFINITY)];
        let err = Chart::from_notes(ChartMeta::default(), notes).unwrap_err();
        assert!(matches!(err, ChartError::InvalidDuration(_)));
    }

    #[test]
    fn test_from_notes_too_long() {
        let notes = vec![Note::tap(0, 0.0), Note::tap(0, MAX_DURATION + 1.0)];
        let err = Chart::from_notes(ChartMeta::default(), notes).unwrap_err();
        assert!(matches!(err, ChartError::InvalidDuration(_)));

        let notes = vec![Note::tap(0, 0.0), Note::tap(0, MAX_DURATION)];
        assert!(Chart::from_notes(ChartMeta::default(), notes).is_ok());
    }

    #[test]
    fn test_window_count_bounded() {
        let meta = ChartMeta {
            duration: 1e300,
            ..Default::default()
        };
        assert_eq!(meta.window_count(1.0), 10_800);
        let meta = ChartMeta {
            duration: 10.0,
            ..Default::default()
        };
        assert_eq!(meta.window_count(0.0), 200);
        assert_eq!(meta.window_count(-2.0), 200);
        assert_eq!(meta.window_count(f64::NAN), 10);
        assert_eq!(meta.window_count(f64::INFINITY), 10);
    }

    #[test]
    fn test_window_count_rounds_up() {
        let meta = ChartMeta {
            duration: 7.6,
            ..Default::default()
        };
        assert_eq!(meta.window_count(1.0), 8);
        assert_eq!(meta.window_count(0.5), 16);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ChartFormat::from_extension("BME"), Some(ChartFormat::Grid));
        assert_eq!(ChartFormat::from_extension("pms"), Some(ChartFormat::Grid));
        assert_eq!(ChartFormat::from_extension("osu"), Some(ChartFormat::Osu));
        assert_eq!(ChartFormat::from_extension("bmson"), None);
    }
}
