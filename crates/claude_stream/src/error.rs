use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("stream-json line is empty")]
    EmptyInput,
    #[error("failed to decode stream-json envelope: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("stream-json line {line_number}: {message}")]
pub struct EnvelopeLineError {
    pub line_number: usize,
    pub message: String,
}
