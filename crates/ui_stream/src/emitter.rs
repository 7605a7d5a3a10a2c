use std::io::Write;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::{EmitError, OutputEvent};

/// Frames one event as a server-sent-events record: `data: <json>\n\n`.
pub fn encode_frame(event: &OutputEvent) -> Result<Vec<u8>, EmitError> {
    let json = serde_json::to_vec(event).map_err(|source| EmitError::Serialize {
        event_type: event.event_type(),
        source,
    })?;
    let mut frame = Vec::with_capacity(json.len() + 8);
    frame.extend_from_slice(b"data: ");
    frame.extend_from_slice(&json);
    frame.extend_from_slice(b"\n\n");
    Ok(frame)
}

/// Writes framed events to a blocking sink, flushing after every event.
pub struct SseEmitter<W> {
    writer: W,
    emitted: usize,
}

impl<W: Write> SseEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            emitted: 0,
        }
    }

    pub fn emit(&mut self, event: &OutputEvent) -> Result<(), EmitError> {
        let event_type = event.event_type();
        let frame = encode_frame(event)?;
        self.writer
            .write_all(&frame)
            .map_err(|source| EmitError::Write { event_type, source })?;
        self.writer
            .flush()
            .map_err(|source| EmitError::Flush { event_type, source })?;
        self.emitted += 1;
        trace!(target: "ui_stream::emitter", event_type, bytes = frame.len(), "event emitted");
        Ok(())
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Async counterpart of [`SseEmitter`].
pub struct AsyncSseEmitter<W> {
    writer: W,
    emitted: usize,
}

impl<W: AsyncWrite + Unpin> AsyncSseEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            emitted: 0,
        }
    }

    pub async fn emit(&mut self, event: &OutputEvent) -> Result<(), EmitError> {
        let event_type = event.event_type();
        let frame = encode_frame(event)?;
        self.writer
            .write_all(&frame)
            .await
            .map_err(|source| EmitError::Write { event_type, source })?;
        self.writer
            .flush()
            .await
            .map_err(|source| EmitError::Flush { event_type, source })?;
        self.emitted += 1;
        trace!(target: "ui_stream::emitter", event_type, bytes = frame.len(), "event emitted");
        Ok(())
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::PartRef;

    #[test]
    fn frames_are_data_prefixed_and_blank_line_terminated() {
        let frame = encode_frame(&OutputEvent::TextEnd(PartRef::new("p1"))).unwrap();
        assert_eq!(
            String::from_utf8(frame).unwrap(),
            "data: {\"type\":\"text-end\",\"data\":{\"id\":\"p1\"}}\n\n"
        );
    }

    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_name_the_event() {
        let mut emitter = SseEmitter::new(ClosedSink);
        let err = emitter
            .emit(&OutputEvent::error("boom"))
            .unwrap_err();
        assert!(matches!(err, EmitError::Write { event_type: "error", .. }));
        assert_eq!(emitter.emitted(), 0);
    }

    struct StalledSink;

    impl Write for StalledSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "proxy stalled"))
        }
    }

    #[test]
    fn flush_failures_are_not_counted_as_emitted() {
        let mut emitter = SseEmitter::new(StalledSink);
        let err = emitter
            .emit(&OutputEvent::TextEnd(PartRef::new("p1")))
            .unwrap_err();
        assert!(matches!(err, EmitError::Flush { event_type: "text-end", .. }));
        assert_eq!(emitter.emitted(), 0);
    }

    #[tokio::test]
    async fn async_emitter_writes_the_same_frames() {
        let event = OutputEvent::TextEnd(PartRef::new("p1"));
        let mut emitter = AsyncSseEmitter::new(Vec::new());
        emitter.emit(&event).await.unwrap();
        assert_eq!(emitter.emitted(), 1);
        assert_eq!(emitter.into_inner(), encode_frame(&event).unwrap());
    }
}
