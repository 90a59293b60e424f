// Chart data model: format readers, timing, lane layouts, long-note pairing

mod decode;
mod error;
pub mod layout;
mod longnote;
mod model;
mod note;
pub mod reader;
mod timing;

pub use decode::{ChartDecoder, compute_hashes, decode_text};
pub use error::ChartError;
pub use layout::{HandSlot, HandSplit, LaneLayout};
pub use longnote::{EventRole, LaneEvent, resolve_long_notes};
pub use model::{
    Chart, ChartFormat, ChartMeta, MAX_DURATION, MIN_DURATION, MIN_WINDOW_SIZE, sanitize_window_size,
};
pub use note::{Note, NoteKind};
pub use reader::{FormatReader, GridReader, OsuReader};
pub use timing::{ResolvedTiming, TimedEvent, TimingResolver};
