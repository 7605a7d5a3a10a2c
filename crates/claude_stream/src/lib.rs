#![forbid(unsafe_code)]
//! Typed model of the line-delimited JSON stream that the Claude Code CLI writes with
//! `--output-format stream-json`.
//!
//! This crate performs no I/O. It provides:
//! - [`parse_envelope`] for decoding one upstream line into an [`Envelope`].
//! - Extractors that pull tool use, result and error blocks out of message content while
//!   filling in missing identifiers and names.
//! - [`normalize_usage`] for mapping raw token counters to the downstream usage breakdown.

mod envelope;
mod error;
mod extract;
mod stream_json;
mod usage;

pub use envelope::{
    BlockKind, ContentBlock, ContentDelta, DeltaKind, Envelope, EnvelopeKind, MessageContent,
    RawUsage, StreamEventDetails, StreamEventKind,
};
pub use error::{EnvelopeError, EnvelopeLineError};
pub use extract::{
    extract_tool_errors, extract_tool_results, extract_tool_uses, generate_id, non_empty,
    ToolError, ToolResult, ToolUse, UNKNOWN_TOOL_NAME,
};
pub use stream_json::{parse_envelope, parse_envelope_lines, EnvelopeLine, EnvelopeLineOutcome};
pub use usage::{normalize_usage, InputTokens, OutputTokens, UsageStats};
