use crate::{Envelope, EnvelopeError, EnvelopeLineError};

/// Decodes one stream-json line into an [`Envelope`].
///
/// - A trailing `\r` is ignored.
/// - Returns [`EnvelopeError::EmptyInput`] for empty or whitespace-only lines.
/// - Returns [`EnvelopeError::Decode`] when the line is not a JSON object of the expected shape.
pub fn parse_envelope(line: &str) -> Result<Envelope, EnvelopeError> {
    let line = line.trim_end_matches('\r');
    if line.chars().all(char::is_whitespace) {
        return Err(EnvelopeError::EmptyInput);
    }
    serde_json::from_str(line).map_err(|source| EnvelopeError::Decode { source })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeLine {
    pub line_number: usize,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub enum EnvelopeLineOutcome {
    Ok {
        line: EnvelopeLine,
        envelope: Box<Envelope>,
    },
    Err {
        line: EnvelopeLine,
        error: EnvelopeLineError,
    },
}

/// Decodes a captured stream-json transcript. Blank lines are skipped; every other line
/// yields exactly one outcome, numbered from 1.
pub fn parse_envelope_lines(text: &str) -> Vec<EnvelopeLineOutcome> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_number = idx + 1;
        let raw = raw.trim_end_matches('\r');
        if raw.trim().is_empty() {
            continue;
        }
        let line = EnvelopeLine {
            line_number,
            raw: raw.to_string(),
        };
        match parse_envelope(&line.raw) {
            Ok(envelope) => out.push(EnvelopeLineOutcome::Ok {
                line,
                envelope: Box::new(envelope),
            }),
            Err(err) => out.push(EnvelopeLineOutcome::Err {
                line,
                error: EnvelopeLineError {
                    line_number,
                    message: err.to_string(),
                },
            }),
        }
    }
    out
}
