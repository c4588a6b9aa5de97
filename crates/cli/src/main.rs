mod commands;
mod config;
mod manifest;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use commands::calculate::{cmd_calculate, CalculateArgs};
use commands::heirs::cmd_heirs;
use commands::rules::cmd_rules;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Islamic inheritance (faraid) calculator.
#[derive(Parser)]
#[command(name = "mirath", version, about = "Islamic inheritance (faraid) calculator")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Emit debug logs on stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Distribute an estate among the given heirs
    Calculate {
        /// Request JSON file (a single request or an array of requests)
        #[arg(long, conflicts_with_all = ["madhab", "total", "funeral", "debts", "bequest", "heir"])]
        input: Option<PathBuf>,
        /// School of jurisprudence (hanafi, maliki, shafii, hanbali)
        #[arg(long)]
        madhab: Option<String>,
        /// Gross estate value
        #[arg(long)]
        total: Option<String>,
        /// Funeral costs deducted before distribution
        #[arg(long)]
        funeral: Option<String>,
        /// Debts deducted before distribution
        #[arg(long)]
        debts: Option<String>,
        /// Bequest deducted before distribution
        #[arg(long)]
        bequest: Option<String>,
        /// Heir and count as key=count (repeatable), e.g. --heir son=2
        #[arg(long = "heir", value_parser = parse_heir)]
        heir: Vec<(String, i64)>,
        /// Print the audit step log
        #[arg(long)]
        steps: bool,
    },

    /// Print the rule set of one school, or all of them
    Rules {
        /// School to print; all schools when omitted
        #[arg(long)]
        madhab: Option<String>,
    },

    /// List the recognised heir keys
    Heirs,
}

/// Parse `key=count` for `--heir`.
fn parse_heir(raw: &str) -> Result<(String, i64), String> {
    let (key, count) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=count, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing heir key in '{}'", raw));
    }
    let count = count
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid count in '{}': {}", raw, e))?;
    Ok((key.to_string(), count))
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cfg = match config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Calculate {
            input,
            madhab,
            total,
            funeral,
            debts,
            bequest,
            heir,
            steps,
        } => {
            let args = CalculateArgs {
                input,
                madhab,
                total,
                funeral,
                debts,
                bequest,
                heirs: heir,
                steps,
            };
            cmd_calculate(&args, &cfg, cli.output, cli.quiet);
        }
        Commands::Rules { madhab } => {
            cmd_rules(madhab.as_deref(), cli.output, cli.quiet);
        }
        Commands::Heirs => {
            cmd_heirs(cli.output, cli.quiet);
        }
    }
}

/// Report an error in the selected format on stderr.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
