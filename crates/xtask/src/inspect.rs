use std::{collections::BTreeMap, fs, io, path::PathBuf};

use clap::Parser;
use claude_stream::{
    extract_tool_errors, extract_tool_results, extract_tool_uses, parse_envelope_lines,
    EnvelopeKind, EnvelopeLineOutcome,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Parser)]
pub struct Args {
    /// Captured `--output-format stream-json` transcript (one envelope per line).
    pub transcript: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to render report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub envelopes: BTreeMap<&'static str, usize>,
    pub tool_uses: usize,
    pub tool_results: usize,
    pub tool_errors: usize,
    pub session_id: Option<String>,
    pub result_subtype: Option<String>,
    pub decode_errors: Vec<DecodeError>,
}

#[derive(Debug, Serialize)]
pub struct DecodeError {
    pub line_number: usize,
    pub message: String,
}

pub fn run(args: Args) -> Result<(), Error> {
    let text = fs::read_to_string(&args.transcript).map_err(|source| Error::Read {
        path: args.transcript.clone(),
        source,
    })?;
    let report = build_report(&text);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", args.transcript.display());
    for (kind, count) in &report.envelopes {
        println!("  {kind:<14} {count}");
    }
    println!(
        "  tools: {} used, {} results, {} errors",
        report.tool_uses, report.tool_results, report.tool_errors
    );
    if let Some(session_id) = &report.session_id {
        println!("  session: {session_id}");
    }
    match &report.result_subtype {
        Some(subtype) => println!("  result: {subtype}"),
        None => println!("  result: missing"),
    }
    for err in &report.decode_errors {
        println!("  line {}: {}", err.line_number, err.message);
    }
    Ok(())
}

fn build_report(text: &str) -> Report {
    let mut report = Report::default();
    for outcome in parse_envelope_lines(text) {
        let envelope = match outcome {
            EnvelopeLineOutcome::Ok { envelope, .. } => envelope,
            EnvelopeLineOutcome::Err { error, .. } => {
                report.decode_errors.push(DecodeError {
                    line_number: error.line_number,
                    message: error.message,
                });
                continue;
            }
        };

        *report.envelopes.entry(kind_label(envelope.kind)).or_default() += 1;
        if report.session_id.is_none() {
            report.session_id = envelope.session_id.clone();
        }
        if envelope.kind == EnvelopeKind::Result && report.result_subtype.is_none() {
            report.result_subtype = Some(envelope.subtype.clone().unwrap_or_default());
        }
        if let Some(message) = &envelope.message {
            report.tool_uses += extract_tool_uses(&message.content).len();
            report.tool_results += extract_tool_results(&message.content).len();
            report.tool_errors += extract_tool_errors(&message.content).len();
        }
    }
    report
}

fn kind_label(kind: EnvelopeKind) -> &'static str {
    match kind {
        EnvelopeKind::StreamEvent => "stream_event",
        EnvelopeKind::Assistant => "assistant",
        EnvelopeKind::User => "user",
        EnvelopeKind::Result => "result",
        EnvelopeKind::System => "system",
        EnvelopeKind::Unknown => "unknown",
    }
}
