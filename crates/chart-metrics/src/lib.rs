// Windowed difficulty signals over the canonical note stream

mod config;
mod extractor;
pub mod signal;
mod summary;
mod window;

pub use config::MetricConfig;
pub use extractor::{MetricExtractor, MetricVectors};
pub use summary::ChartSummary;
pub use window::{Chord, WindowedNotes, group_chords};
