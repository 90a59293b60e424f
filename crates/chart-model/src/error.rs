use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Failed to read chart file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported chart format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Chart contains no playable notes")]
    EmptyChart,

    #[error("Invalid chart duration: {0}")]
    InvalidDuration(f64),
}
