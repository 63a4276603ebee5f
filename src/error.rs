//! Error types for the MIDI → score pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Reading the input or writing the output failed
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not a valid Standard MIDI File
    #[error("Failed to parse MIDI: {0}")]
    Midi(#[from] midly::Error),

    /// A note lies outside the pitch window and the layout asks to reject it
    #[error("Note {pitch} at tick {tick} is outside the supported pitch range")]
    PitchOutOfRange { pitch: u8, tick: u64 },

    /// Layout values that cannot produce a drawable page
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Layout file or canvas dump could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Output format could not be determined
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
