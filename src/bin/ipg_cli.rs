//! Command line runner for the binding engine.
//!
//! # Usage
//!
//! ```bash
//! # Batch: one JSON request per line, one JSON result per line
//! echo '{"text":"Вага Pylontech US5000","entities":[{"label":"MODEL","text":"US5000","start":15,"end":21}]}' \
//!     | ipg_cli process
//!
//! # Single query with spans as LABEL:START:END
//! ipg_cli query "Вага Pylontech US5000" --span MODEL:15:21 --span MANUFACTURER:5:14
//!
//! # Registry statistics
//! ipg_cli registries
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use ipg_core::{EngineConfig, EntitySpan, Pipeline, QueryRequest};

#[derive(Parser)]
#[command(name = "ipg_cli")]
#[command(version = "0.1.0")]
#[command(about = "Entity-parameter binding and query classification")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file
    #[arg(long, global = true, env = "IPG_CONFIG", default_value = "config/ipg.yaml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Process JSON Lines requests ({"text": ..., "entities": [...]})
    Process {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Pretty-print each result instead of one line per result
        #[arg(long)]
        pretty: bool,
    },

    /// Process a single question
    Query {
        /// Question text
        text: String,

        /// NER span as LABEL:START:END (character offsets), repeatable
        #[arg(long = "span")]
        spans: Vec<String>,
    },

    /// Load the registries and print their sizes
    Registries,
}

// =============================================================================
// MAIN
// =============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ipg_core=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = EngineConfig::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    let pipeline = Pipeline::from_config(&config).context("building pipeline")?;

    match cli.command {
        Commands::Process { file, pretty } => cmd_process(&pipeline, file, pretty),
        Commands::Query { text, spans } => cmd_query(&pipeline, &text, &spans),
        Commands::Registries => cmd_registries(&pipeline),
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_process(pipeline: &Pipeline, file: Option<PathBuf>, pretty: bool) -> Result<()> {
    let reader: Box<dyn BufRead> = match file {
        Some(path) => Box::new(BufReader::new(
            File::open(&path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut requests = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.context("reading input")?;
        if line.trim().is_empty() {
            continue;
        }
        let request: QueryRequest = serde_json::from_str(&line)
            .with_context(|| format!("line {}: invalid request", lineno + 1))?;
        requests.push(request);
    }

    let results = pipeline.process_batch(&requests);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for result in &results {
        let json = if pretty {
            serde_json::to_string_pretty(result)?
        } else {
            serde_json::to_string(result)?
        };
        writeln!(out, "{}", json)?;
    }
    Ok(())
}

fn cmd_query(pipeline: &Pipeline, text: &str, spans: &[String]) -> Result<()> {
    let spans = spans
        .iter()
        .map(|s| parse_span(text, s))
        .collect::<Result<Vec<_>>>()?;
    let result = pipeline.process(text, &spans);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_registries(pipeline: &Pipeline) -> Result<()> {
    let registry = pipeline.registry();
    let summary = serde_json::json!({
        "parameter_keys": registry.glossary.key_count(),
        "parameter_synonyms": registry.glossary.len(),
        "manufacturer_variants": registry.synonyms.manufacturer_count(),
        "equipment_type_variants": registry.synonyms.equipment_type_count(),
        "canonical_models": registry.models.len(),
        "active_model_metadata": registry.metadata.len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Parse `LABEL:START:END`; the span text is cut from the question.
fn parse_span(text: &str, arg: &str) -> Result<EntitySpan> {
    let parts: Vec<&str> = arg.split(':').collect();
    let [label, start, end] = parts.as_slice() else {
        bail!("span '{}' is not LABEL:START:END", arg);
    };
    let start: usize = start
        .parse()
        .with_context(|| format!("span '{}': bad start", arg))?;
    let end: usize = end
        .parse()
        .with_context(|| format!("span '{}': bad end", arg))?;
    let mention: String = text
        .chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect();
    Ok(EntitySpan::new(label, &mention, start, end))
}
