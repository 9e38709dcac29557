//! Parse one input file and produce every requested artifact.

use heatmap::{OpenPortMatrix, RenderOutcome, RendererCapability};
use nmap_xml::XmlParseError;
use portgrid_core::Record;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Structured,
    Freeform,
}

impl InputKind {
    /// `.xml` (any case) selects the XML reader; everything else is a transcript.
    pub fn for_path(path: &Path) -> Self {
        let is_xml = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase().ends_with(".xml"))
            .unwrap_or(false);
        if is_xml { InputKind::Structured } else { InputKind::Freeform }
    }
}

/// Failures that abort the whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("parse failed: {0}")]
    Structured(#[from] XmlParseError),
    #[error("parse failed: {}: {source}", path.display())]
    Freeform {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::InputNotFound(_) => 2,
            PipelineError::Structured(_) | PipelineError::Freeform { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub input: PathBuf,
    pub out_csv: PathBuf,
    /// `None` when the heatmap is disabled.
    pub heatmap: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub font: Option<PathBuf>,
}

/// What happened to one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Written(PathBuf),
    Skipped(String),
    Failed(String),
}

impl Artifact {
    pub fn written(&self) -> Option<&Path> {
        match self {
            Artifact::Written(p) => Some(p.as_path()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub rows: usize,
    pub csv: Artifact,
    pub heatmap: Option<Artifact>,
    pub json: Option<Artifact>,
    pub summary: Option<Artifact>,
}

impl PipelineReport {
    /// The table is the contract: only its failure makes the run fail.
    pub fn exit_code(&self) -> u8 {
        if matches!(self.csv, Artifact::Failed(_)) { 1 } else { 0 }
    }
}

pub fn run(opts: &PipelineOptions) -> Result<PipelineReport, PipelineError> {
    run_with_renderer(opts, heatmap::probe_renderer)
}

/// Like [`run`] with a caller-supplied renderer probe. The probe is invoked
/// at most once, and only when a heatmap was requested.
pub fn run_with_renderer<F>(opts: &PipelineOptions, probe: F) -> Result<PipelineReport, PipelineError>
where
    F: FnOnce(Option<&Path>) -> RendererCapability,
{
    if !opts.input.is_file() {
        return Err(PipelineError::InputNotFound(opts.input.clone()));
    }
    let kind = InputKind::for_path(&opts.input);
    debug!(input = %opts.input.display(), ?kind, "parsing");
    let records = parse(&opts.input, kind)?;
    if records.is_empty() {
        warn!("no rows parsed. Check input format.");
    }

    let csv = match report::write_csv(&records, &opts.out_csv) {
        Ok(_) => Artifact::Written(opts.out_csv.clone()),
        Err(e) => {
            error!("{}", e);
            Artifact::Failed(e.to_string())
        }
    };

    let heatmap = opts.heatmap.as_deref().map(|path| {
        let capability = probe(opts.font.as_deref());
        render_heatmap(&records, path, &capability)
    });

    let source = opts.input.display().to_string();
    let timestamp = report::now_rfc3339();
    let json = opts.json.as_deref().map(|path| {
        let envelope = report::ScanEnvelope::new(&records, &source, timestamp.clone());
        soft_artifact("json", path, report::write_json(&envelope, path))
    });
    let summary = opts
        .summary
        .as_deref()
        .map(|path| soft_artifact("summary", path, report::write_summary(&records, &source, &timestamp, path)));

    Ok(PipelineReport { rows: records.len(), csv, heatmap, json, summary })
}

fn parse(input: &Path, kind: InputKind) -> Result<Vec<Record>, PipelineError> {
    match kind {
        InputKind::Structured => Ok(nmap_xml::parse_file(input)?),
        InputKind::Freeform => nmap_text::parse_file(input).map_err(|source| PipelineError::Freeform { path: input.to_path_buf(), source }),
    }
}

fn render_heatmap(records: &[Record], path: &Path, capability: &RendererCapability) -> Artifact {
    let matrix = OpenPortMatrix::from_records(records);
    match heatmap::render_png(&matrix, path, capability) {
        Ok(RenderOutcome::Written) => Artifact::Written(path.to_path_buf()),
        Ok(RenderOutcome::Skipped(reason)) => {
            warn!("heatmap skipped: {}", reason);
            Artifact::Skipped(reason)
        }
        Err(e) => {
            warn!("heatmap not written: {}", e);
            Artifact::Failed(e.to_string())
        }
    }
}

fn soft_artifact(what: &str, path: &Path, res: Result<(), report::ReportError>) -> Artifact {
    match res {
        Ok(()) => Artifact::Written(path.to_path_buf()),
        Err(e) => {
            warn!("{} not written: {}", what, e);
            Artifact::Failed(e.to_string())
        }
    }
}
