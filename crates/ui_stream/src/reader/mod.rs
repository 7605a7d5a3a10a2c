//! Newline framing with a per-line byte cap.
//!
//! Lines longer than the cap are discarded while they stream past and surface as
//! [`BoundedLine::LineTooLong`], so a single runaway line cannot exhaust memory or end the
//! stream.

use std::io;

mod sync;
mod tokio;

pub use self::sync::SyncBoundedLineReader;
pub use self::tokio::AsyncBoundedLineReader;

pub(crate) const CHUNK_SIZE_BYTES: usize = 8192;

#[derive(Debug)]
pub enum BoundedLine {
    Line {
        line_number: usize,
        bytes: Vec<u8>,
    },
    LineTooLong {
        line_number: usize,
        observed_bytes: usize,
        max_line_bytes: usize,
    },
    IoError {
        line_number: usize,
        source: io::Error,
    },
}

/// Assembles lines out of arbitrarily sized chunks. Shared by the blocking and async readers.
#[derive(Debug)]
pub(crate) struct LineAssembler {
    max_line_bytes: usize,
    current_line: Vec<u8>,
    observed_bytes: usize,
    discarding: bool,
    line_number: usize,
}

impl LineAssembler {
    pub(crate) fn new(max_line_bytes: usize) -> Self {
        Self {
            max_line_bytes,
            current_line: Vec::new(),
            observed_bytes: 0,
            discarding: false,
            line_number: 0,
        }
    }

    /// Consumes `chunk` up to and including the first newline.
    ///
    /// Returns the number of bytes consumed and the completed line, if the chunk contained
    /// a newline.
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> (usize, Option<BoundedLine>) {
        match chunk.iter().position(|b| *b == b'\n') {
            Some(newline_idx) => {
                self.append(&chunk[..newline_idx]);
                (newline_idx + 1, Some(self.finish_line()))
            }
            None => {
                self.append(chunk);
                (chunk.len(), None)
            }
        }
    }

    /// Flushes a final unterminated line at end of input.
    pub(crate) fn finish(&mut self) -> Option<BoundedLine> {
        if self.discarding || !self.current_line.is_empty() {
            Some(self.finish_line())
        } else {
            None
        }
    }

    pub(crate) fn io_error(&mut self, source: io::Error) -> BoundedLine {
        self.line_number += 1;
        BoundedLine::IoError {
            line_number: self.line_number,
            source,
        }
    }

    fn append(&mut self, segment: &[u8]) {
        self.observed_bytes = self.observed_bytes.saturating_add(segment.len());
        if self.discarding {
            return;
        }
        if self.observed_bytes > self.max_line_bytes {
            self.discarding = true;
            self.current_line = Vec::new();
            return;
        }
        self.current_line.extend_from_slice(segment);
    }

    fn finish_line(&mut self) -> BoundedLine {
        self.line_number += 1;
        let line_number = self.line_number;
        let observed_bytes = std::mem::take(&mut self.observed_bytes);

        if std::mem::take(&mut self.discarding) {
            return BoundedLine::LineTooLong {
                line_number,
                observed_bytes,
                max_line_bytes: self.max_line_bytes,
            };
        }

        BoundedLine::Line {
            line_number,
            bytes: std::mem::take(&mut self.current_line),
        }
    }
}
