use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};

mod config;
mod logging;
mod pipeline;

use config::Config;
use pipeline::{Artifact, PipelineOptions};

const DEFAULT_CSV: &str = "scans/nmap-parsed.csv";
const DEFAULT_HEATMAP: &str = "scans/nmap-heatmap.png";
/// `--heatmap` value that disables image output.
const HEATMAP_OFF: &str = "none";

#[derive(Debug, Parser)]
#[command(name = "portgrid", version, about = "Parse Nmap output into CSV and an optional open-port heatmap")]
struct Cli {
    /// Path to Nmap XML (-oX) or normal output file
    #[arg(short = 'i', long, value_name = "FILE")]
    input: PathBuf,
    /// CSV output path [default: scans/nmap-parsed.csv]
    #[arg(short = 'o', long = "out-csv", value_name = "FILE")]
    out_csv: Option<PathBuf>,
    /// PNG heatmap output path; use 'none' to skip [default: scans/nmap-heatmap.png]
    #[arg(long, value_name = "FILE|none")]
    heatmap: Option<String>,
    /// Also write a JSON document with summary counts and all records
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,
    /// Also write a plain-text summary report
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,
    /// TrueType font for heatmap labels (else $PORTGRID_FONT or a system font)
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,
    /// Optional config file (YAML). If omitted, loads ./portgrid.yaml if present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Log level for stderr diagnostics (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn heatmap_target(value: &str) -> Option<PathBuf> {
    if value.eq_ignore_ascii_case(HEATMAP_OFF) { None } else { Some(PathBuf::from(value)) }
}

/// CLI flags win over the config file, which wins over built-in defaults.
fn resolve_options(cli: Cli, cfg: Config) -> PipelineOptions {
    let heatmap = cli.heatmap.or(cfg.heatmap).unwrap_or_else(|| DEFAULT_HEATMAP.to_string());
    PipelineOptions {
        input: cli.input,
        out_csv: cli.out_csv.or(cfg.out_csv).unwrap_or_else(|| PathBuf::from(DEFAULT_CSV)),
        heatmap: heatmap_target(&heatmap),
        json: cli.json.or(cfg.json),
        summary: cli.summary.or(cfg.summary),
        font: cli.font.or(cfg.font),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    let cfg = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c.unwrap_or_default(),
        Err(e) => {
            warn!("{:#}; continuing with defaults", e);
            Config::default()
        }
    };
    let opts = resolve_options(cli, cfg);

    let report = match pipeline::run(&opts) {
        Ok(r) => r,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    if let Some(path) = report.csv.written() {
        println!("[ok] wrote {} rows -> {}", report.rows, path.display());
    }
    for (what, artifact) in [("heatmap", &report.heatmap), ("json", &report.json), ("summary", &report.summary)] {
        if let Some(path) = artifact.as_ref().and_then(Artifact::written) {
            println!("[ok] wrote {} -> {}", what, path.display());
        }
    }
    ExitCode::from(report.exit_code())
}
