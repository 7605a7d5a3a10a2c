use std::io::{Read, Write};

use claude_stream::{parse_envelope, EnvelopeError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::emitter::{AsyncSseEmitter, SseEmitter};
use crate::event::{FinishReason, OutputEvent};
use crate::reader::{AsyncBoundedLineReader, BoundedLine, SyncBoundedLineReader};
use crate::translator::{Completion, Step, TokenUsage, Translator};
use crate::{StreamError, TranslatorConfig};

type UsageCallback = Box<dyn FnMut(TokenUsage) + Send>;

/// Outcome of a translation that ran to the end of its input or to a `result` envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Lines taken from the reader, including skipped and blank ones.
    pub lines_read: usize,
    /// Lines dropped because they were oversized, not UTF-8, or not a valid envelope.
    pub lines_skipped: usize,
    pub events_emitted: usize,
    /// `None` when the input ended without a `result` envelope.
    pub finish_reason: Option<FinishReason>,
}

/// Drives one upstream stream through a [`Translator`] and writes SSE frames downstream.
///
/// `stream-start` is emitted before any input is read. Reading stops at the `result`
/// envelope; the `finish` event is written before the usage callback runs. Cancellation is
/// checked once per line and aborts with [`StreamError::Cancelled`].
pub struct StreamTranslator {
    config: TranslatorConfig,
    on_token_usage: Option<UsageCallback>,
}

impl StreamTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self {
            config,
            on_token_usage: None,
        }
    }

    /// Invoked once per stream with the `result` envelope's token counts, if it had any.
    pub fn on_token_usage(mut self, callback: impl FnMut(TokenUsage) + Send + 'static) -> Self {
        self.on_token_usage = Some(Box::new(callback));
        self
    }

    pub fn translate_stream<R, W>(
        mut self,
        reader: R,
        writer: W,
        cancel: &CancellationToken,
    ) -> Result<StreamSummary, StreamError>
    where
        R: Read,
        W: Write,
    {
        let lines = SyncBoundedLineReader::new(reader, self.config.limits.max_line_bytes);
        let mut emitter = SseEmitter::new(writer);
        let mut translator = Translator::new(self.config.clone());
        let mut summary = StreamSummary::default();
        let mut pending = Vec::new();

        translator.start(&mut pending);
        for event in pending.drain(..) {
            emitter.emit(&event)?;
        }

        for record in lines {
            if cancel.is_cancelled() {
                return Err(cancelled(&summary));
            }
            let step = process_record(&mut translator, record, &mut summary, &mut pending)?;
            for event in pending.drain(..) {
                emitter.emit(&event)?;
            }
            if let Step::Finished(completion) = step {
                summary.events_emitted = emitter.emitted();
                return Ok(self.complete(summary, completion));
            }
        }

        translator.finish_without_result(&mut pending);
        for event in pending.drain(..) {
            emitter.emit(&event)?;
        }
        summary.events_emitted = emitter.emitted();
        warn!(target: "ui_stream::ingest", lines_read = summary.lines_read, "agent output ended without a result envelope");
        Ok(summary)
    }

    pub async fn translate_stream_async<R, W>(
        mut self,
        reader: R,
        writer: W,
        cancel: &CancellationToken,
    ) -> Result<StreamSummary, StreamError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = AsyncBoundedLineReader::new(reader, self.config.limits.max_line_bytes);
        let mut emitter = AsyncSseEmitter::new(writer);
        let mut translator = Translator::new(self.config.clone());
        let mut summary = StreamSummary::default();
        let mut pending = Vec::new();

        translator.start(&mut pending);
        for event in pending.drain(..) {
            emitter.emit(&event).await?;
        }

        while let Some(record) = lines.next_line().await {
            if cancel.is_cancelled() {
                return Err(cancelled(&summary));
            }
            let step = process_record(&mut translator, record, &mut summary, &mut pending)?;
            for event in pending.drain(..) {
                emitter.emit(&event).await?;
            }
            if let Step::Finished(completion) = step {
                summary.events_emitted = emitter.emitted();
                return Ok(self.complete(summary, completion));
            }
        }

        translator.finish_without_result(&mut pending);
        for event in pending.drain(..) {
            emitter.emit(&event).await?;
        }
        summary.events_emitted = emitter.emitted();
        warn!(target: "ui_stream::ingest", lines_read = summary.lines_read, "agent output ended without a result envelope");
        Ok(summary)
    }

    fn complete(&mut self, mut summary: StreamSummary, completion: Completion) -> StreamSummary {
        summary.finish_reason = Some(completion.finish_reason);
        if let (Some(usage), Some(callback)) =
            (completion.token_usage, self.on_token_usage.as_mut())
        {
            callback(usage);
        }
        info!(
            target: "ui_stream::ingest",
            finish_reason = ?completion.finish_reason,
            lines_read = summary.lines_read,
            lines_skipped = summary.lines_skipped,
            events = summary.events_emitted,
            "stream finished"
        );
        summary
    }
}

fn cancelled(summary: &StreamSummary) -> StreamError {
    debug!(target: "ui_stream::ingest", lines_read = summary.lines_read, "translation cancelled");
    StreamError::Cancelled {
        lines_read: summary.lines_read,
    }
}

/// Decodes one framed line and feeds it to the translator. Undecodable lines are counted
/// and skipped; only read failures end the stream.
fn process_record(
    translator: &mut Translator,
    record: BoundedLine,
    summary: &mut StreamSummary,
    out: &mut Vec<OutputEvent>,
) -> Result<Step, StreamError> {
    summary.lines_read += 1;
    let (line_number, bytes) = match record {
        BoundedLine::Line { line_number, bytes } => (line_number, bytes),
        BoundedLine::LineTooLong {
            line_number,
            observed_bytes,
            max_line_bytes,
        } => {
            summary.lines_skipped += 1;
            warn!(target: "ui_stream::ingest", line_number, observed_bytes, max_line_bytes, "oversized line skipped");
            return Ok(Step::Continue);
        }
        BoundedLine::IoError {
            line_number,
            source,
        } => return Err(StreamError::Read { line_number, source }),
    };

    let Ok(line) = std::str::from_utf8(&bytes) else {
        summary.lines_skipped += 1;
        debug!(target: "ui_stream::ingest", line_number, "non-UTF-8 line skipped");
        return Ok(Step::Continue);
    };

    match parse_envelope(line) {
        Ok(envelope) => Ok(translator.handle(&envelope, out)),
        Err(EnvelopeError::EmptyInput) => Ok(Step::Continue),
        Err(err) => {
            summary.lines_skipped += 1;
            debug!(target: "ui_stream::ingest", line_number, error = %err, "undecodable line skipped");
            Ok(Step::Continue)
        }
    }
}
