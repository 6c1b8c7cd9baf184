//! Graphlink CLI: links record groups into a JSON-LD graph document.
//!
//! Usage:
//!   graphlink -i archivalResources=arc.json -i entities=entities.json -o out/
//!   graphlink --config graphlink.yaml -n https://example.org/vocab -v out/vocab

use clap::Parser;
use graphlink::{Config, FileSink, InputSpec, JsonFileSource, Overrides, Pipeline, RunReport};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "graphlink",
    version,
    about = "Link typed records into a JSON-LD graph and infer its vocabulary"
)]
struct Cli {
    /// YAML config file (default: graphlink/graphlink.yaml in the config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory for the graph document; stdout if omitted
    #[arg(short, long)]
    output_path: Option<PathBuf>,
    /// Directory for the vocabulary document
    #[arg(short = 'v', long = "vocab-crate")]
    vocab_path: Option<PathBuf>,
    /// Namespace IRI for minted vocabulary terms
    #[arg(short, long)]
    namespace: Option<String>,
    /// JSON-LD term dictionary
    #[arg(short, long)]
    dictionary: Option<PathBuf>,
    /// JSON-LD file of extension terms
    #[arg(short, long)]
    extension_terms: Option<PathBuf>,
    /// Record group to read, as group=path or path (repeatable)
    #[arg(short, long = "input")]
    inputs: Vec<InputSpec>,
    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// Log debug detail
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            output_path: self.output_path.clone(),
            vocab_path: self.vocab_path.clone(),
            namespace: self.namespace.clone(),
            dictionary: self.dictionary.clone(),
            extension_terms: self.extension_terms.clone(),
            inputs: self.inputs.clone(),
        }
    }

    fn default_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<RunReport, String> {
    let mut config = Config::discover(cli.config.as_deref()).map_err(|e| format!("Failed to load config: {}", e))?;
    config.apply(cli.overrides());
    if config.inputs.is_empty() {
        return Err("no inputs given (use -i group=path or list inputs in the config file)".to_string());
    }
    if config.namespace.is_some() != config.vocab_path.is_some() {
        tracing::warn!("vocabulary inference needs both --namespace and --vocab-crate; skipping it");
    }

    let pipeline = Pipeline::from_config(&config).await.map_err(|e| e.to_string())?;
    let mut source = JsonFileSource::new(config.inputs.clone());
    let sink = FileSink::new(config.output_path.clone(), config.vocab_path.clone());
    pipeline.run(&mut source, &sink).await.map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.default_level());

    let code = match run(cli).await {
        Ok(report) => {
            tracing::info!(
                groups = report.groups,
                records = report.records_ingested,
                skipped = report.records_skipped,
                relationships = report.links.relationships,
                rewritten = report.rewrite.values_rewritten,
                "done"
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(code);
}
