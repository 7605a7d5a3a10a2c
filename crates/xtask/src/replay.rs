use std::{
    fs::{self, File},
    io::{self, BufReader, Write},
    path::{Path, PathBuf},
};

use clap::Parser;
use thiserror::Error;
use tracing::info;
use ui_stream::{
    CancellationToken, OutputEvent, SseEmitter, StreamError, StreamTranslator, TranslatorConfig,
};

#[derive(Debug, Parser)]
pub struct Args {
    /// Captured `--output-format stream-json` transcript (one envelope per line).
    pub transcript: PathBuf,

    /// TOML file with translator settings; omitted keys keep their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write frames here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid translator config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Stream(#[from] StreamError),
}

pub fn run(args: Args) -> Result<(), Error> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => TranslatorConfig::default(),
    };

    let transcript = File::open(&args.transcript).map_err(|source| Error::Read {
        path: args.transcript.clone(),
        source,
    })?;
    let mut writer: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(File::create(path).map_err(|source| Error::Create {
            path: path.clone(),
            source,
        })?),
        None => Box::new(io::stdout().lock()),
    };

    let outcome = StreamTranslator::new(config).translate_stream(
        BufReader::new(transcript),
        &mut writer,
        &CancellationToken::new(),
    );
    let summary = match outcome {
        Ok(summary) => summary,
        Err(StreamError::Emit(err)) => return Err(StreamError::Emit(err).into()),
        Err(err) => {
            // Only emit failures leave the sink unusable.
            SseEmitter::new(&mut writer)
                .emit(&OutputEvent::error(err.to_string()))
                .map_err(StreamError::from)?;
            return Err(err.into());
        }
    };
    info!(
        transcript = %args.transcript.display(),
        lines_read = summary.lines_read,
        lines_skipped = summary.lines_skipped,
        events = summary.events_emitted,
        finish_reason = ?summary.finish_reason,
        "replay complete"
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<TranslatorConfig, Error> {
    let text = fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| Error::Config {
        path: path.to_path_buf(),
        source,
    })
}
