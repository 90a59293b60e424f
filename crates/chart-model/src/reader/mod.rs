// Format readers: one per source encoding

pub mod grid;
pub mod osu;

pub use grid::{GridReader, GridSource, ObjectCode, Position, RawEvent};
pub use osu::{HitObject, OsuReader, OsuSource};

use crate::error::ChartError;
use crate::model::{Chart, ChartFormat};

/// Turns decoded chart text into a resolved [`Chart`]
pub trait FormatReader {
    fn format(&self) -> ChartFormat;

    /// Parse and resolve. Malformed input is skipped; only an empty or
    /// unmeasurable note stream is an error.
    fn read_str(&self, content: &str) -> Result<Chart, ChartError>;
}
