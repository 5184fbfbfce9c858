//! Command-line entry point: transcript file in, JSON record out.
//!
//! Every run prints exactly one well-formed record. Missing or unreadable
//! input becomes a failure record, never a crash.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use bonnetje::core::{ExtractionConfig, ExtractionError, TextLine};
use bonnetje::llm::{HttpInferenceClient, InferenceClient};
use bonnetje::pipeline::{DocumentRecord, process_transcript};
use bonnetje::vat::{VatRegistry, ViesClient};

#[derive(Parser)]
#[command(
    name = "bonnetje",
    version,
    about = "Extract a structured fiscal record from a receipt/invoice OCR transcript"
)]
struct Args {
    /// Transcript file: a JSON array of {"text", "confidence"} objects, or
    /// plain text with one line per recognized line.
    transcript: Option<PathBuf>,

    /// Skip VIES registry validation.
    #[arg(long)]
    no_vies: bool,

    /// Skip LLM-assisted extraction.
    #[arg(long)]
    no_llm: bool,

    /// Pretty-print the output record.
    #[arg(long)]
    pretty: bool,
}

/// One entry of a JSON transcript file.
#[derive(Deserialize)]
struct InputLine {
    text: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ExtractionConfig::default();
    let record = run(&args, &config).await;

    let json = if args.pretty {
        serde_json::to_string_pretty(&record)
    } else {
        serde_json::to_string(&record)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(err) => {
            // Should be unreachable for these types; still emit a record.
            println!(
                "{{\"success\":false,\"error\":\"serialization failed: {err}\",\"confidence\":0.0}}"
            );
        }
    }
    if !record.is_success() {
        std::process::exit(1);
    }
}

async fn run(args: &Args, config: &ExtractionConfig) -> DocumentRecord {
    let Some(path) = &args.transcript else {
        return DocumentRecord::failure(
            &ExtractionError::Transcript("no transcript path provided".into()),
            None,
        );
    };

    let lines = match load_transcript(path) {
        Ok(lines) => lines,
        Err(err) => {
            return DocumentRecord::failure(
                &err,
                Some(serde_json::json!({ "path": path.display().to_string() })),
            );
        }
    };

    let registry = if args.no_vies {
        None
    } else {
        match ViesClient::new(config) {
            Ok(client) => Some(client),
            Err(err) => {
                warn!(error = %err, "registry client unavailable");
                None
            }
        }
    };
    let inference = if args.no_llm {
        None
    } else {
        match HttpInferenceClient::new(config) {
            Ok(client) => Some(client),
            Err(err) => {
                warn!(error = %err, "inference client unavailable");
                None
            }
        }
    };

    process_transcript(
        &lines,
        config,
        registry.as_ref().map(|c| c as &dyn VatRegistry),
        inference.as_ref().map(|c| c as &dyn InferenceClient),
    )
    .await
}

fn load_transcript(path: &Path) -> Result<Vec<TextLine>, ExtractionError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ExtractionError::Transcript(format!("cannot read {}: {e}", path.display())))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let entries: Vec<InputLine> = serde_json::from_str(&raw)
            .map_err(|e| ExtractionError::Transcript(format!("invalid transcript JSON: {e}")))?;
        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(i, e)| TextLine::new(e.text, e.confidence, i))
            .collect())
    } else {
        Ok(raw
            .lines()
            .filter(|l| !l.trim().is_empty())
            .enumerate()
            .map(|(i, l)| TextLine::new(l, 1.0, i))
            .collect())
    }
}
