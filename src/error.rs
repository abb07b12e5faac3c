//! Error types for building and serializing topologies.

use std::{io, num::ParseFloatError, path::PathBuf};

use thiserror::Error;

use crate::codec::Format;

/// Errors raised while building, reading or writing a graph.
#[derive(Error, Debug)]
pub enum Error {
    /// A latency record is missing a required field.
    #[error("record {record} is missing required field `{field}`")]
    MalformedRecord { record: usize, field: &'static str },

    /// A latency field isn't a finite floating-point number.
    #[error("record {record} has a non-numeric `{field}` value {value:?}")]
    NumericParse {
        record: usize,
        field: &'static str,
        value: String,
        /// Absent when the value parsed but isn't finite.
        #[source]
        source: Option<ParseFloatError>,
    },

    /// The requested serialization format isn't one of the supported formats.
    #[error("unsupported graph format '{0}'")]
    UnsupportedFormat(String),

    /// The underlying file or stream couldn't be opened, read or written.
    #[error("I/O error{}: {source}", on_path(.path))]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: io::Error,
    },

    /// The content isn't a valid graph in the declared format.
    #[error("invalid {format} graph: {message}")]
    Parse { format: Format, message: String },

    /// The graph can't be represented in the requested format.
    #[error("cannot encode graph as {format}: {message}")]
    Encode { format: Format, message: String },

    /// The latency CSV couldn't be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn parse(format: Format, message: impl ToString) -> Self {
        Self::Parse {
            format,
            message: message.to_string(),
        }
    }

    pub(crate) fn encode(format: Format, message: impl ToString) -> Self {
        Self::Encode {
            format,
            message: message.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<Option<PathBuf>>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn on_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" on {}", p.display()))
        .unwrap_or_default()
}

/// Result type with the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
