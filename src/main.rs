use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use mdpress::{Config, Error, Result};
use tracing::{debug, info_span};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdpress")]
#[command(about = "Convert Markdown files to paginated PDF or HTML")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Output file (defaults to input name with the format's extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Pdf)]
    format: Format,

    /// TOML file with document and theme settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log parser and renderer decisions
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pdf,
    Html,
    Typst,
    Json,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Html => "html",
            Format::Typst => "typ",
            Format::Json => "json",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(&cli) {
        Ok(output) => println!("Created {}", output.display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<PathBuf> {
    let markdown = read(&cli.input)?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::compiled_default(),
    };

    // The parser logs each diagnostic itself; the span tags those lines with the file
    let outcome = info_span!("parse", file = %cli.input.display())
        .in_scope(|| mdpress::parse_with_diagnostics(&markdown));
    debug!(
        blocks = outcome.document.len(),
        diagnostics = outcome.diagnostics.len(),
        "parsed input"
    );
    let doc = &outcome.document;

    let bytes = match cli.format {
        Format::Pdf => mdpress::document_to_pdf(doc, &config)?,
        Format::Html => mdpress::document_to_html(doc, &config).into_bytes(),
        Format::Typst => mdpress::document_to_typst(doc, &config).into_bytes(),
        Format::Json => mdpress::document_to_json(doc)?.into_bytes(),
    };

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension(cli.format.extension()));

    debug!(path = %output.display(), bytes = bytes.len(), "writing output");
    fs::write(&output, bytes).map_err(|source| Error::Write {
        path: output.clone(),
        source,
    })?;

    Ok(output)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}
