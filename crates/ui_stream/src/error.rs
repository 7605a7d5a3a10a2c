use std::io;

use thiserror::Error;

/// Failure to deliver one event downstream.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to serialize {event_type} event: {source}")]
    Serialize {
        event_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {event_type} event: {source}")]
    Write {
        event_type: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("failed to flush {event_type} event: {source}")]
    Flush {
        event_type: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Reasons a translation stops before reaching the end of its input.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to read agent output at line {line_number}: {source}")]
    Read {
        line_number: usize,
        #[source]
        source: io::Error,
    },
    #[error("translation cancelled after {lines_read} lines")]
    Cancelled { lines_read: usize },
    #[error(transparent)]
    Emit(#[from] EmitError),
}
