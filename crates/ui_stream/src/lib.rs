#![forbid(unsafe_code)]
//! Translates the Claude Code CLI's stream-json output into a server-sent-events stream of
//! UI-level events (text, reasoning, tool lifecycle, finish).
//!
//! The crate is split into:
//! - [`Translator`]: a sans-IO core that maps one envelope to zero or more [`OutputEvent`]s.
//! - [`StreamTranslator`]: blocking and tokio drivers that frame lines, honour cancellation
//!   and write `data: <json>\n\n` frames, flushing after each one.
//! - [`LifecycleTracker`]: per-stream tool and content-part bookkeeping.

mod config;
mod emitter;
mod error;
mod event;
mod ingest;
mod reader;
mod tracker;
mod translator;

pub use config::{IngestLimits, TranslatorConfig};
pub use emitter::{encode_frame, AsyncSseEmitter, SseEmitter};
pub use error::{EmitError, StreamError};
pub use event::{
    ErrorPayload, Finish, FinishMetadata, FinishReason, OutputEvent, PartDelta, PartRef,
    ProviderMetadata, ResponseMetadata, StreamStart, ToolCall, ToolError, ToolInputStart,
    ToolMetadata, ToolResult, Warning,
};
pub use ingest::{StreamSummary, StreamTranslator};
pub use reader::{AsyncBoundedLineReader, BoundedLine, SyncBoundedLineReader};
pub use tracker::{LifecycleTracker, PendingCall, ToolInvocationState};
pub use translator::{Completion, Step, TokenUsage, Translator};

pub use tokio_util::sync::CancellationToken;
