// osu!mania reader: sectioned text with absolute millisecond timestamps

use log::{debug, trace};

use crate::error::ChartError;
use crate::layout::LaneLayout;
use crate::longnote::{EventRole, LaneEvent, resolve_long_notes};
use crate::model::{Chart, ChartFormat, ChartMeta};
use crate::reader::FormatReader;

/// Width of the osu! play field in osu!pixels
pub const FIELD_WIDTH: f64 = 512.0;
/// Key count assumed when `CircleSize` is missing or unreadable
pub const DEFAULT_KEY_COUNT: u32 = 4;
pub const MAX_KEY_COUNT: u32 = 18;

const HOLD_FLAG: u32 = 128;

/// One hit object line, times in milliseconds.
///
/// Fields are read as integers; a fractional or exponent time rejects the line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitObject {
    pub x: f64,
    pub time_ms: f64,
    /// Present for holds with a readable end time
    pub end_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OsuSource {
    pub key_count: u32,
    pub title: String,
    pub artist: String,
    /// From the first uninherited timing point
    pub initial_bpm: Option<f64>,
    pub hit_objects: Vec<HitObject>,
}

impl Default for OsuSource {
    fn default() -> Self {
        Self {
            key_count: DEFAULT_KEY_COUNT,
            title: String::new(),
            artist: String::new(),
            initial_bpm: None,
            hit_objects: Vec::new(),
        }
    }
}

impl OsuSource {
    /// Column for a horizontal coordinate: `floor(x * k / 512)`
    pub fn lane_for(&self, x: f64) -> u32 {
        let x = x.clamp(0.0, FIELD_WIDTH);
        let lane = (x * self.key_count as f64 / FIELD_WIDTH).floor() as u32;
        lane.min(self.key_count.max(1) - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    General,
    Metadata,
    Difficulty,
    TimingPoints,
    HitObjects,
    Other,
}

impl Section {
    fn from_header(name: &str) -> Self {
        match name {
            "General" => Self::General,
            "Metadata" => Self::Metadata,
            "Difficulty" => Self::Difficulty,
            "TimingPoints" => Self::TimingPoints,
            "HitObjects" => Self::HitObjects,
            _ => Self::Other,
        }
    }
}

/// Reader for the timestamp encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct OsuReader;

impl OsuReader {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &str) -> OsuSource {
        let mut source = OsuSource::default();
        let mut section = Section::Other;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Section::from_header(name.trim());
                continue;
            }

            match section {
                Section::General => {
                    if let Some(("Mode", mode)) = split_key_value(line) {
                        if mode != "3" {
                            debug!("osu file declares Mode {mode}, reading as mania anyway");
                        }
                    }
                }
                Section::Metadata => match split_key_value(line) {
                    Some(("Title", value)) => source.title = value.to_string(),
                    Some(("Artist", value)) => source.artist = value.to_string(),
                    _ => {}
                },
                Section::Difficulty => {
                    if let Some(("CircleSize", value)) = split_key_value(line) {
                        if let Some(k) = parse_key_count(value) {
                            source.key_count = k;
                        }
                    }
                }
                Section::TimingPoints => {
                    if source.initial_bpm.is_none() {
                        source.initial_bpm = parse_timing_point_bpm(line);
                    }
                }
                Section::HitObjects => match parse_hit_object(line) {
                    Some(object) => source.hit_objects.push(object),
                    None => trace!("skipping hit object line: {line}"),
                },
                Section::Other => {}
            }
        }

        debug!(
            "osu source: {}K, {} hit objects",
            source.key_count,
            source.hit_objects.len()
        );
        source
    }
}

impl FormatReader for OsuReader {
    fn format(&self) -> ChartFormat {
        ChartFormat::Osu
    }

    fn read_str(&self, content: &str) -> Result<Chart, ChartError> {
        let source = self.parse(content);
        let layout = LaneLayout::osu(source.key_count);

        let events = source
            .hit_objects
            .iter()
            .map(|object| {
                let role = match object.end_ms {
                    Some(end_ms) => EventRole::Span {
                        end_time: end_ms / 1000.0,
                    },
                    None => EventRole::Tap,
                };
                LaneEvent {
                    time: object.time_ms / 1000.0,
                    lane: source.lane_for(object.x),
                    role,
                }
            })
            .collect();
        let notes = resolve_long_notes(events);

        let mut meta = ChartMeta {
            key_count: layout.key_count,
            is_dual_side: layout.is_dual_side,
            layout_name: layout.name,
            format: self.format(),
            title: source.title,
            artist: source.artist,
            hands: layout.hands,
            ..Default::default()
        };
        if let Some(bpm) = source.initial_bpm {
            meta.initial_bpm = bpm;
        }
        Chart::from_notes(meta, notes)
    }
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

fn parse_key_count(value: &str) -> Option<u32> {
    let k: f64 = value.parse().ok()?;
    if !k.is_finite() || k < 1.0 {
        return None;
    }
    Some((k.trunc() as u32).min(MAX_KEY_COUNT))
}

/// `time,beatLength,meter,sampleSet,sampleIndex,volume,uninherited,effects`
fn parse_timing_point_bpm(line: &str) -> Option<f64> {
    let mut fields = line.split(',');
    let _time = fields.next()?;
    let beat_length: f64 = fields.next()?.trim().parse().ok()?;
    // Inherited points carry a negative slider-velocity multiplier instead
    let uninherited = fields.nth(4).map(|f| f.trim() != "0").unwrap_or(true);
    if !uninherited || !beat_length.is_finite() || beat_length <= 0.0 {
        return None;
    }
    Some(60_000.0 / beat_length)
}

/// `x,y,time,type,hitSound,extras`
fn parse_hit_object(line: &str) -> Option<HitObject> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 4 {
        return None;
    }
    let x: i32 = fields[0].parse().ok()?;
    let time_ms: i64 = fields[2].parse().ok()?;
    let type_flags: u32 = fields[3].parse().ok()?;

    let end_ms = if type_flags & HOLD_FLAG != 0 {
        fields
            .get(5)
            .and_then(|extras| extras.split(':').next())
            .and_then(|end| end.parse::<i64>().ok())
            .map(|end| end as f64)
    } else {
        None
    };

    Some(HitObject {
        x: x as f64,
        time_ms: time_ms as f64,
        end_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{Note, NoteKind};

    const SAMPLE: &str = "osu file format v14

[General]
Mode: 3

[Metadata]
Title:Sample Song
Artist:Sample Artist

[Difficulty]
CircleSize:4
OverallDifficulty:8

[TimingPoints]
500,-100,4,1,0,100,0,0
1000,400,4,1,0,100,1,0

[HitObjects]
64,192,1000,1,0,0:0:0:0:
192,192,1000,1,0,0:0:0:0:
320,192,1500,128,0,2500:0:0:0:0:
448,192,2000,1,0,0:0:0:0:
";

    #[test]
    fn test_parse_sections() {
        let source = OsuReader::new().parse(SAMPLE);
        assert_eq!(source.key_count, 4);
        assert_eq!(source.title, "Sample Song");
        assert_eq!(source.artist, "Sample Artist");
        assert_eq!(source.initial_bpm, Some(150.0));
        assert_eq!(source.hit_objects.len(), 4);
        assert_eq!(source.hit_objects[2].end_ms, Some(2500.0));
    }

    #[test]
    fn test_read_chart() {
        let chart = OsuReader::new().read_str(SAMPLE).unwrap();
        assert_eq!(chart.meta.format, ChartFormat::Osu);
        assert_eq!(chart.meta.key_count, 4);
        assert_eq!(chart.meta.layout_name, "4K");
        assert_eq!(
            chart.notes,
            vec![
                Note::tap(0, 1.0),
                Note::tap(1, 1.0),
                Note::hold(2, 1.5, 2.5),
                Note::tap(3, 2.0),
            ]
        );
        assert!((chart.meta.duration - 1.5).abs() < 1e-9);
        assert!((chart.meta.start_time - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_lane_for_clamps() {
        let source = OsuSource {
            key_count: 7,
            ..Default::default()
        };
        assert_eq!(source.lane_for(-20.0), 0);
        assert_eq!(source.lane_for(36.0), 0);
        assert_eq!(source.lane_for(256.0), 3);
        assert_eq!(source.lane_for(512.0), 6);
        assert_eq!(source.lane_for(9000.0), 6);
    }

    #[test]
    fn test_hold_without_end_degrades() {
        let chart = OsuReader::new()
            .read_str("[Difficulty]\nCircleSize:4\n[HitObjects]\n64,192,1000,128,0\n192,192,1000,128,0,900:0:0:0:0:\n")
            .unwrap();
        assert_eq!(chart.notes.len(), 2);
        assert!(chart.notes.iter().all(|n| n.kind == NoteKind::Tap));
    }

    #[test]
    fn test_missing_circle_size_defaults() {
        let source = OsuReader::new().parse("[Difficulty]\nCircleSize:abc\n[HitObjects]\n0,0,0,1,0\n");
        assert_eq!(source.key_count, DEFAULT_KEY_COUNT);
        assert_eq!(source.hit_objects.len(), 1);
    }

    #[test]
    fn test_malformed_hit_objects_skipped() {
        let source = OsuReader::new().parse("[HitObjects]\n1,2\nx,192,100,1,0\n64,192,abc,1,0\n64,192,100,1,0\n");
        assert_eq!(source.hit_objects.len(), 1);
    }

    #[test]
    fn test_non_integer_times_skipped() {
        let source = OsuReader::new().parse(
            "[HitObjects]\n64,192,1e300,1,0\n64,192,250.5,1,0\n64,192,99999999999999999999999,1,0\n192,192,500,1,0\n",
        );
        assert_eq!(source.hit_objects.len(), 1);
        assert_eq!(source.hit_objects[0].time_ms, 500.0);
    }

    #[test]
    fn test_no_hit_objects_is_error() {
        let err = OsuReader::new().read_str("[Difficulty]\nCircleSize:7\n").unwrap_err();
        assert!(matches!(err, ChartError::EmptyChart));
    }
}
