// Measure/channel grid reader (bms, bme, bml, pms)

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use log::{debug, trace};

use crate::error::ChartError;
use crate::layout::{LaneLayout, fold_channel, is_hold_channel};
use crate::longnote::{EventRole, LaneEvent, resolve_long_notes};
use crate::model::{Chart, ChartFormat, ChartMeta};
use crate::reader::FormatReader;
use crate::timing::TimingResolver;

/// Initial tempo when `#BPM` is missing or invalid
pub const DEFAULT_BPM: f64 = 130.0;

pub const CHANNEL_MEASURE_LENGTH: u16 = 0x02;
pub const CHANNEL_BPM_INLINE: u16 = 0x03;
pub const CHANNEL_BPM_TABLE: u16 = 0x08;
pub const CHANNEL_STOP: u16 = 0x09;

/// A two-character object code, stored upper-cased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectCode([u8; 2]);

impl ObjectCode {
    pub const EMPTY: ObjectCode = ObjectCode([b'0', b'0']);

    /// Parse exactly two ASCII alphanumerics
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_alphanumeric) {
            return None;
        }
        Some(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Table index interpretation (`00`..`ZZ`)
    pub fn as_base36(&self) -> Option<u16> {
        let high = base36_digit(self.0[0])?;
        let low = base36_digit(self.0[1])?;
        Some(high * 36 + low)
    }

    /// Inline tempo interpretation (`00`..`FF`)
    pub fn as_hex(&self) -> Option<u16> {
        let high = hex_digit(self.0[0])?;
        let low = hex_digit(self.0[1])?;
        Some(high * 16 + low)
    }
}

impl std::fmt::Display for ObjectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.0[0] as char, self.0[1] as char)
    }
}

/// Exact fractional position `num / den` inside a measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    num: u32,
    den: u32,
}

impl Position {
    pub const START: Position = Position { num: 0, den: 1 };
    pub const END: Position = Position { num: 1, den: 1 };

    /// `index / count`, reduced. Returns `None` for a zero count.
    pub fn new(index: u32, count: u32) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let g = gcd(index, count);
        Some(Self {
            num: index / g,
            den: count / g,
        })
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num as u64 * other.den as u64).cmp(&(other.num as u64 * self.den as u64))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One non-empty object code on a channel line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub measure: u32,
    /// Channel code read as two hex digits (`#00116` -> 0x16)
    pub channel: u16,
    pub position: Position,
    pub value: ObjectCode,
}

/// Everything the grid reader extracts from the text, before timing
#[derive(Debug, Clone, PartialEq)]
pub struct GridSource {
    pub events: Vec<RawEvent>,
    /// `#BPMxx` definitions keyed by base-36 index
    pub bpm_table: HashMap<u16, f64>,
    /// `#STOPxx` definitions in 1/192-measure ticks, keyed by base-36 index
    pub stop_table: HashMap<u16, f64>,
    /// Channel 02 multipliers per measure
    pub measure_lengths: HashMap<u32, f64>,
    pub lnobj: Option<ObjectCode>,
    pub initial_bpm: f64,
    pub title: String,
    pub artist: String,
    /// `#PLAYER` value; 2 and 3 mark dual-side play
    pub player: u32,
}

impl Default for GridSource {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            bpm_table: HashMap::new(),
            stop_table: HashMap::new(),
            measure_lengths: HashMap::new(),
            lnobj: None,
            initial_bpm: DEFAULT_BPM,
            title: String::new(),
            artist: String::new(),
            player: 1,
        }
    }
}

impl GridSource {
    /// Playable channels in use, hold channels folded onto their tap twins
    pub fn used_channels(&self) -> BTreeSet<u16> {
        self.events
            .iter()
            .filter_map(|e| fold_channel(e.channel))
            .collect()
    }

    pub fn measure_length(&self, measure: u32) -> f64 {
        self.measure_lengths.get(&measure).copied().unwrap_or(1.0)
    }
}

/// Tracks #RANDOM state with optional fixed selections
struct RandomResolver {
    /// Pre-selected values, consumed in order
    selected: Vec<i32>,
    count: usize,
}

impl RandomResolver {
    fn new(selected: Vec<i32>) -> Self {
        Self { selected, count: 0 }
    }

    /// Resolve the next #RANDOM; falls back to the first branch
    fn next(&mut self) -> i32 {
        let value = self.selected.get(self.count).copied().unwrap_or(1);
        self.count += 1;
        value
    }
}

struct RandomState {
    value: i32,
    active: bool,
    matched: bool,
}

/// Reader for the grid encoding
#[derive(Debug, Clone, Default)]
pub struct GridReader {
    selected_randoms: Vec<i32>,
}

impl GridReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the outcome of each `#RANDOM` in file order
    pub fn with_randoms(selected_randoms: Vec<i32>) -> Self {
        Self { selected_randoms }
    }

    /// Extract events and header tables. Never fails: unknown or malformed
    /// lines are skipped.
    pub fn parse(&self, content: &str) -> GridSource {
        let mut source = GridSource::default();
        let mut random_stack: Vec<RandomState> = Vec::new();
        let mut random_resolver = RandomResolver::new(self.selected_randoms.clone());

        for line in content.lines() {
            let line = line.trim();
            let Some(rest) = line.strip_prefix('#') else {
                continue;
            };
            let (key, value) = split_header(rest);
            let key = key.to_ascii_uppercase();

            match key.as_str() {
                "RANDOM" => {
                    // A #RANDOM in a skipped branch never draws a selection
                    let state = if random_stack.iter().all(|s| s.active) {
                        RandomState {
                            value: random_resolver.next(),
                            active: true,
                            matched: false,
                        }
                    } else {
                        RandomState {
                            value: 0,
                            active: false,
                            matched: true,
                        }
                    };
                    random_stack.push(state);
                    continue;
                }
                "IF" => {
                    if let Some(state) = random_stack.last_mut() {
                        let target: i32 = value.parse().unwrap_or(0);
                        state.active = !state.matched && target == state.value;
                        state.matched |= state.active;
                    }
                    continue;
                }
                "ELSE" => {
                    if let Some(state) = random_stack.last_mut() {
                        state.active = !state.matched;
                        state.matched = true;
                    }
                    continue;
                }
                "ENDIF" => {
                    if let Some(state) = random_stack.last_mut() {
                        state.active = true;
                        state.matched = false;
                    }
                    continue;
                }
                "ENDRANDOM" => {
                    random_stack.pop();
                    continue;
                }
                _ => {}
            }

            // Skip lines inside inactive #IF blocks
            if random_stack.iter().any(|s| !s.active) {
                continue;
            }

            if let Some((measure, channel, data)) = split_channel_line(rest) {
                self.parse_channel(&mut source, measure, channel, data);
                continue;
            }

            match key.as_str() {
                "TITLE" => source.title = value.to_string(),
                "ARTIST" => source.artist = value.to_string(),
                "PLAYER" => source.player = value.parse().unwrap_or(1),
                "BPM" => {
                    if let Some(bpm) = parse_positive(value) {
                        source.initial_bpm = bpm;
                    }
                }
                "LNOBJ" => source.lnobj = ObjectCode::parse(value),
                _ => {
                    if let Some(id) = indexed_key(&key, "BPM") {
                        if let Some(bpm) = parse_positive(value) {
                            source.bpm_table.insert(id, bpm);
                        }
                    } else if let Some(id) = indexed_key(&key, "STOP") {
                        if let Some(ticks) = parse_positive(value) {
                            source.stop_table.insert(id, ticks);
                        }
                    } else {
                        trace!("skipping header line: #{rest}");
                    }
                }
            }
        }

        debug!(
            "grid source: {} events, {} bpm defs, {} stop defs, lnobj={:?}",
            source.events.len(),
            source.bpm_table.len(),
            source.stop_table.len(),
            source.lnobj.map(|c| c.to_string())
        );
        source
    }

    fn parse_channel(&self, source: &mut GridSource, measure: u32, channel: u16, data: &str) {
        if channel == CHANNEL_MEASURE_LENGTH {
            if let Some(length) = parse_positive(data) {
                source.measure_lengths.insert(measure, length);
            }
            return;
        }
        if !is_timing_channel(channel) && fold_channel(channel).is_none() {
            return;
        }

        let data = data.trim();
        let count = (data.len() / 2) as u32;
        for i in 0..count {
            let Some(code) = data.get(i as usize * 2..i as usize * 2 + 2) else {
                break;
            };
            let Some(value) = ObjectCode::parse(code) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            if let Some(position) = Position::new(i, count) {
                source.events.push(RawEvent {
                    measure,
                    channel,
                    position,
                    value,
                });
            }
        }
    }
}

impl FormatReader for GridReader {
    fn format(&self) -> ChartFormat {
        ChartFormat::Grid
    }

    fn read_str(&self, content: &str) -> Result<Chart, ChartError> {
        let source = self.parse(content);
        let layout = LaneLayout::detect_for_player(&source.used_channels(), source.player);
        let timing = TimingResolver::resolve(&source, &layout);
        debug!(
            "grid timing: {} events, last measure ends at {:.3}s, final tempo {} BPM",
            timing.events.len(),
            timing.end_time,
            timing.final_bpm
        );

        let lane_events = timing
            .events
            .iter()
            .map(|e| {
                let role = if is_hold_channel(e.channel) {
                    EventRole::HoldBoundary
                } else if source.lnobj == Some(e.value) {
                    EventRole::TailMarker
                } else {
                    EventRole::Tap
                };
                LaneEvent {
                    time: e.time,
                    lane: e.lane,
                    role,
                }
            })
            .collect();
        let notes = resolve_long_notes(lane_events);

        let meta = ChartMeta {
            key_count: layout.key_count,
            is_dual_side: layout.is_dual_side,
            layout_name: layout.name.clone(),
            format: self.format(),
            title: source.title,
            artist: source.artist,
            initial_bpm: source.initial_bpm,
            hands: layout.hands.clone(),
            ..Default::default()
        };
        Chart::from_notes(meta, notes)
    }
}

fn is_timing_channel(channel: u16) -> bool {
    matches!(
        channel,
        CHANNEL_BPM_INLINE | CHANNEL_BPM_TABLE | CHANNEL_STOP
    )
}

/// Split `KEY value` at the first whitespace
fn split_header(rest: &str) -> (&str, &str) {
    match rest.split_once(|c: char| c.is_ascii_whitespace()) {
        Some((key, value)) => (key, value.trim()),
        None => (rest, ""),
    }
}

/// `MMMCC:data` with a decimal measure and a hex channel
fn split_channel_line(rest: &str) -> Option<(u32, u16, &str)> {
    let bytes = rest.as_bytes();
    if bytes.len() < 6 || bytes[5] != b':' {
        return None;
    }
    if !bytes[..3].iter().all(u8::is_ascii_digit) {
        return None;
    }
    let measure: u32 = rest[..3].parse().ok()?;
    let channel = hex_digit(bytes[3])? * 16 + hex_digit(bytes[4])?;
    Some((measure, channel, &rest[6..]))
}

/// `BPMxx` / `STOPxx` style keys with a base-36 index suffix
fn indexed_key(key: &str, prefix: &str) -> Option<u16> {
    let suffix = key.strip_prefix(prefix)?;
    ObjectCode::parse(suffix)?.as_base36()
}

fn parse_positive(value: &str) -> Option<f64> {
    let v: f64 = value.trim().parse().ok()?;
    (v.is_finite() && v > 0.0).then_some(v)
}

fn base36_digit(b: u8) -> Option<u16> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u16),
        b'A'..=b'Z' => Some((b - b'A' + 10) as u16),
        b'a'..=b'z' => Some((b - b'a' + 10) as u16),
        _ => None,
    }
}

fn hex_digit(b: u8) -> Option<u16> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u16),
        b'A'..=b'F' => Some((b - b'A' + 10) as u16),
        b'a'..=b'f' => Some((b - b'a' + 10) as u16),
        _ => None,
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}
