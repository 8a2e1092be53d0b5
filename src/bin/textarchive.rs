//! textarchive CLI
//!
//! Convert message board archives to and from JSON or YAML, reformat them and
//! check them for structural problems.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use textarchive::{
    from_json, from_yaml, has_errors, normalize_newlines, to_json, to_yaml, Decoder, Document,
    Encoder, FieldValue, FormatConfig, LineEnding, ReferencePolicy, Severity, ValidationConfig, Validator,
};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "textarchive")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Message board archive text tool")]
struct Cli {
    /// More log output on stderr (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an archive to JSON
    Json {
        /// Archive file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Convert an archive to YAML
    Yaml {
        /// Archive file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Write archive text from a JSON or YAML document
    Render {
        /// JSON or YAML file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Output archive file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Input format (default: from the file extension, else JSON)
        #[arg(short = 'f', long, value_enum)]
        from: Option<DataFormat>,

        /// Line terminator for the archive text
        #[arg(long, value_enum, default_value = "lf")]
        line_ending: LineEnding,
    },

    /// Decode and re-encode an archive in canonical form
    Fmt {
        /// Archive file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,

        /// Output archive file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Line terminator for the archive text
        #[arg(long, value_enum, default_value = "lf")]
        line_ending: LineEnding,
    },

    /// Summarize an archive: top-level fields and nested section counts
    #[command(name = "show", visible_alias = "t")]
    Show {
        /// Archive file (default: stdin)
        #[arg(short = 'i', long)]
        input: Option<PathBuf>,
    },

    /// Report structural problems and rule violations
    Check {
        /// Archive files and directories (directories are searched for .txt files)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,

        /// How to treat category InSub values that match no category ID
        #[arg(long, value_enum, default_value = "warn")]
        insub: ReferencePolicy,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum DataFormat {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Json { input, output, pretty } => {
            let document = decode_input(input.as_deref())?;
            let json = to_json(&document, pretty)?;
            write_output(output.as_deref(), &format!("{}\n", json))?;
        }
        Commands::Yaml { input, output } => {
            let document = decode_input(input.as_deref())?;
            write_output(output.as_deref(), &to_yaml(&document)?)?;
        }
        Commands::Render { input, output, from, line_ending } => {
            render(input.as_deref(), output.as_deref(), from, line_ending)?;
        }
        Commands::Fmt { input, output, line_ending } => {
            let document = decode_input(input.as_deref())?;
            encode_output(output.as_deref(), &document, line_ending)?;
        }
        Commands::Show { input } => {
            let document = decode_input(input.as_deref())?;
            print!("{}", summarize(&document));
        }
        Commands::Check { inputs, strict, insub } => {
            let failed = check(&inputs, strict, insub)?;
            if failed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn read_input(input: Option<&Path>) -> Result<String> {
    let text = if let Some(path) = input {
        fs::read_to_string(path).with_context(|| format!("Failed to read: {}", path.display()))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        buffer
    };
    Ok(text)
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    if let Some(path) = output {
        fs::write(path, text).with_context(|| format!("Failed to write: {}", path.display()))?;
        info!("wrote {}", path.display());
    } else {
        io::stdout().write_all(text.as_bytes())?;
    }
    Ok(())
}

/// Decode archive text, logging every diagnostic
fn decode_input(input: Option<&Path>) -> Result<Document> {
    let text = read_input(input)?;
    let parsed = Decoder::new().decode(&normalize_newlines(&text));
    let source = input.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());
    for diagnostic in &parsed.diagnostics {
        if diagnostic.severity() >= Severity::Warning {
            warn!("{}: {}", source, diagnostic);
        } else {
            debug!("{}: {}", source, diagnostic);
        }
    }
    Ok(parsed.document)
}

fn encode_output(output: Option<&Path>, document: &Document, line_ending: LineEnding) -> Result<()> {
    let encoder = Encoder::with_config(FormatConfig::default().with_line_ending(line_ending));
    let text = encoder.encode(document)?;
    write_output(output, &text)
}

fn render(
    input: Option<&Path>,
    output: Option<&Path>,
    from: Option<DataFormat>,
    line_ending: LineEnding,
) -> Result<()> {
    let format = from.unwrap_or_else(|| infer_format(input));
    let text = read_input(input)?;
    let document = match format {
        DataFormat::Json => from_json(&text),
        DataFormat::Yaml => from_yaml(&text),
    }
    .with_context(|| format!("Failed to load {:?} document", format))?;
    encode_output(output, &document, line_ending)
}

/// Plain-text overview: each top-level section with its text fields and the
/// number of sections nested under every path
fn summarize(document: &Document) -> String {
    let mut out = String::new();
    for (name, sections) in document.iter() {
        for (index, section) in sections.iter().enumerate() {
            out.push_str(&format!("{}[{}]\n", name, index));
            for (key, value) in section.iter() {
                match value {
                    FieldValue::Scalar(text) => out.push_str(&format!("  {}: {}\n", key, text)),
                    FieldValue::MultiLineText(text) => {
                        out.push_str(&format!("  {}: ({} lines)\n", key, text.lines().count()))
                    }
                    FieldValue::Sections(_) => {}
                }
            }
            for (path, count) in section.outline() {
                out.push_str(&format!("  {}: {} section(s)\n", path, count));
            }
        }
    }
    out
}

fn infer_format(input: Option<&Path>) -> DataFormat {
    match input.and_then(Path::extension).and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            DataFormat::Yaml
        }
        _ => DataFormat::Json,
    }
}

/// Check every archive, printing problems; returns true when any input failed
fn check(inputs: &[PathBuf], strict: bool, insub: ReferencePolicy) -> Result<bool> {
    let validator = Validator::with_config(ValidationConfig::default().with_insub(insub));
    let decoder = Decoder::new();
    let mut failed = 0;
    let files = collect_archives(inputs)?;

    for path in &files {
        let parsed = decoder.decode_file(path)?;
        let findings = validator.validate(&parsed.document);

        for diagnostic in &parsed.diagnostics {
            println!("{}: {}", path.display(), diagnostic);
        }
        for finding in &findings {
            println!("{}: {}", path.display(), finding);
        }

        let bad = has_errors(&findings)
            || (strict
                && (!parsed.is_well_formed()
                    || findings.iter().any(|f| f.severity >= Severity::Warning)));
        if bad {
            failed += 1;
        }
        debug!(
            diagnostics = parsed.diagnostics.len(),
            findings = findings.len(),
            "checked {}",
            path.display()
        );
    }

    info!("checked {} archive(s), {} failed", files.len(), failed);
    Ok(failed > 0)
}

fn collect_archives(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in walkdir::WalkDir::new(input).sort_by_file_name() {
                let entry = entry.with_context(|| format!("Failed to walk: {}", input.display()))?;
                let is_archive = entry
                    .path()
                    .extension()
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("txt"));
                if entry.file_type().is_file() && is_archive {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}
