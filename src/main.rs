use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use riskscan::config::{self, RiskscanConfig};
use riskscan::extract::Extractor;
use riskscan::output::{json as json_out, table};
use riskscan::report::export::ReportExport;
use riskscan::sanitize::Sanitizer;
use riskscan::transcript::{self, Format, TranscriptMessage};

#[derive(Parser)]
#[command(name = "riskscan", version, about = "Supplier risk and compliance-action reports from agent chat transcripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to config file (default: ~/.riskscan/config.toml)
    #[arg(long, global = true, env = "RISKSCAN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct Input {
    /// Transcript files or glob patterns, concatenated in order
    paths: Vec<String>,

    /// Read the transcript from stdin
    #[arg(long)]
    stdin: bool,

    /// Force format: json, jsonl, yaml
    #[arg(long)]
    format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the supplier risk report for a transcript
    Report {
        #[command(flatten)]
        input: Input,
    },

    /// Write the report to a file
    Export {
        #[command(flatten)]
        input: Input,

        /// Export format: json or text
        #[arg(long = "as", default_value = "json")]
        as_format: String,

        /// Output file (default: compliance_report_<timestamp>.<ext>)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show messages as a chat view would display them
    Sanitize {
        #[command(flatten)]
        input: Input,

        /// Only show the message at this position
        #[arg(long)]
        index: Option<usize>,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config template if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

fn load_transcript(input: &Input) -> Result<Vec<TranscriptMessage>> {
    let format = input
        .format
        .as_deref()
        .map(|f| Format::from_str(f).with_context(|| format!("Unknown format: {f}. Use: json, jsonl, yaml")))
        .transpose()?;

    if input.stdin {
        transcript::load_stdin(format)
    } else if input.paths.is_empty() {
        bail!("No paths provided. Use --stdin to read from stdin.");
    } else {
        transcript::load_paths(&input.paths, format)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;

    match cli.command {
        Commands::Report { input } => {
            let config = RiskscanConfig::load(cli.config.as_deref())?;
            let messages = load_transcript(&input)?;
            let report = Extractor::new(&config)?.generate_report(&messages);

            if json_output {
                json_out::print_json(&ReportExport::now(&report, messages.len()))?;
            } else {
                table::print_report(&report, messages.len());
            }
        }

        Commands::Export { input, as_format, out } => {
            let (extension, is_json) = match as_format.to_lowercase().as_str() {
                "json" => ("json", true),
                "text" | "txt" => ("txt", false),
                other => bail!("Unknown export format: {other}. Use: json, text"),
            };

            let config = RiskscanConfig::load(cli.config.as_deref())?;
            let messages = load_transcript(&input)?;
            let report = Extractor::new(&config)?.generate_report(&messages);
            let export = ReportExport::now(&report, messages.len());

            let body = if is_json {
                export.to_json().context("Failed to serialize report")?
            } else {
                export.to_text()
            };
            let path = out.unwrap_or_else(|| PathBuf::from(export.default_filename(extension)));
            std::fs::write(&path, body)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;

            if json_output {
                json_out::print_json(&serde_json::json!({
                    "path": path.display().to_string(),
                    "report_metadata": export.report_metadata,
                }))?;
            } else {
                println!(
                    "Wrote {} supplier{} and {} action{} to {}",
                    export.report_metadata.suppliers_at_risk_count,
                    if export.report_metadata.suppliers_at_risk_count == 1 { "" } else { "s" },
                    export.report_metadata.compliance_actions_count,
                    if export.report_metadata.compliance_actions_count == 1 { "" } else { "s" },
                    path.display()
                );
            }
        }

        Commands::Sanitize { input, index } => {
            let config = RiskscanConfig::load(cli.config.as_deref())?;
            let messages = load_transcript(&input)?;
            let sanitizer = Sanitizer::new(&config.limits);

            if let Some(i) = index {
                if i >= messages.len() {
                    bail!("Message index {i} out of range (transcript has {} messages)", messages.len());
                }
            }

            let selected: Vec<(usize, &TranscriptMessage)> = messages
                .iter()
                .enumerate()
                .filter(|(i, _)| index.map_or(true, |want| want == *i))
                .collect();

            if json_output {
                let rendered: Vec<_> = selected
                    .iter()
                    .map(|(i, m)| {
                        serde_json::json!({
                            "index": i,
                            "role": m.role,
                            "sanitized": sanitizer.sanitize_message(m),
                        })
                    })
                    .collect();
                json_out::print_json(&rendered)?;
            } else {
                for (i, m) in selected {
                    table::print_sanitized(i, m.role, &sanitizer.sanitize_message(m));
                }
            }
        }

        Commands::Config { action } => {
            let path = match cli.config {
                Some(p) => p,
                None => config::config_path()?,
            };
            match action {
                ConfigAction::Init => {
                    if config::init_config(&path)? {
                        println!("Created {}", path.display());
                    } else {
                        println!("Config already exists: {}", path.display());
                    }
                }
                ConfigAction::Show => {
                    let config = if path.exists() {
                        RiskscanConfig::load(Some(&path))?
                    } else {
                        RiskscanConfig::default()
                    };
                    if json_output {
                        json_out::print_json(&config)?;
                    } else {
                        print!("{}", config.display()?);
                    }
                }
                ConfigAction::Path => println!("{}", path.display()),
            }
        }
    }

    Ok(())
}
