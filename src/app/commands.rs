//! Subcommand handlers. Each returns the text to print on success.

use super::cli::{Cli, Command, CutoutArg};
use super::studio::Studio;
use crate::domain::{
    rehydrate, Branding, Document, DocumentError, OutlineItem, RehydrateMode, Stage,
};
use crate::persistence::{export_archive, validate_key, DocumentStore};
use crate::pipeline::{notice_channel, PipelineController, PipelineNotice, PipelineRunner};
use crate::segmentation::{color_key, decode_png, encode_png, flood_fill};
use crate::state_machine::{DocumentCommand, DocumentStateMachine};
use crate::structured_logger::StructuredLogger;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub async fn run_cli(cli: Cli) -> Result<()> {
    let output = match cli.command {
        Command::Cutout {
            input,
            output,
            method,
            tolerance,
        } => cutout_file(&input, &output, method, tolerance)?,
        Command::Validate { file, lenient } => validate_file(&file, lenient)?,
        command => {
            let studio = Studio::open(cli.home, cli.config)?;
            dispatch(&studio, command).await?
        }
    };
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

async fn dispatch(studio: &Studio, command: Command) -> Result<String> {
    match command {
        Command::New {
            key,
            name,
            slides,
            brand,
            tone,
            approve,
            force,
        } => {
            let request = NewDocument {
                name: name.unwrap_or_else(|| key.clone()),
                slides,
                brand,
                tone,
                approve,
            };
            create_document(studio, &key, request, force).await
        }
        Command::Run { key } => run_pipeline(studio, &key).await,
        Command::Apply { key, command } => apply_command(studio, &key, &command).await,
        Command::Export { key, output } => {
            let path = match output {
                Some(path) => path,
                None => studio.paths.export_path(&key)?,
            };
            export_document(studio, &key, &path).await
        }
        Command::Show { key: Some(key), json } => show_document(studio, &key, json).await,
        Command::Show { key: None, .. } => list_documents(studio).await,
        Command::Cutout { .. } | Command::Validate { .. } => Ok(String::new()),
    }
}

pub(crate) struct NewDocument {
    pub name: String,
    pub slides: Vec<String>,
    pub brand: Option<String>,
    pub tone: Option<String>,
    pub approve: bool,
}

pub(crate) async fn create_document(
    studio: &Studio,
    key: &str,
    request: NewDocument,
    force: bool,
) -> Result<String> {
    validate_key(key)?;
    if !force && studio.store.get(key).await?.is_some() {
        anyhow::bail!("A document is already stored under '{}' (use --force to replace it)", key);
    }

    let (mut machine, _snapshots) =
        DocumentStateMachine::new(Document::new(&request.name), studio.logger(key)?);
    if request.brand.is_some() || request.tone.is_some() {
        machine.apply(DocumentCommand::UpdateBranding {
            branding: Branding {
                brand_name: request.brand.unwrap_or_default(),
                tone: request.tone.unwrap_or_default(),
                ..Branding::default()
            },
        });
    }
    let items = request
        .slides
        .into_iter()
        .map(|title| OutlineItem {
            title,
            summary: String::new(),
        })
        .collect();
    machine.apply(DocumentCommand::SetOutline { items });
    if request.approve {
        machine.apply(DocumentCommand::ApproveStage {
            stage: Stage::Strategy,
        });
    }

    studio.store.set(key, machine.document()).await?;
    let document = machine.document();
    Ok(format!(
        "Created '{}' ({} slides) at stage {}",
        key,
        document.slides.len(),
        document.current_stage
    ))
}

pub(crate) async fn run_pipeline(studio: &Studio, key: &str) -> Result<String> {
    let document = studio.load(key).await?;
    let logger = studio.logger(key)?;
    logger.increment_run_id();

    let (notices, _) = notice_channel();
    let gateway = Arc::new(studio.gateway(notices.clone()));
    let runner = PipelineRunner::new(
        gateway,
        studio.cutout_plan(),
        studio.config.pipeline.clone(),
        notices,
    );
    let relay = tokio::spawn(relay_notices(runner.subscribe(), Arc::clone(&logger)));

    let controller = PipelineController::new();
    let interrupt = {
        let controller = controller.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, aborting at the next checkpoint");
                controller.abort();
            }
        })
    };

    let (mut machine, _snapshots) = DocumentStateMachine::new(document, logger);
    let outcome = runner.run(&mut machine, controller.token()).await;
    interrupt.abort();
    drop(runner);
    let _ = relay.await;

    studio.store.set(key, machine.document()).await?;
    let summary = serde_json::to_string_pretty(outcome.summary())?;
    Ok(format!("{}\n{}", outcome.status_line(), summary))
}

/// Mirrors pipeline notices into the structured log until the channel closes.
async fn relay_notices(
    mut notices: tokio::sync::broadcast::Receiver<PipelineNotice>,
    logger: Arc<StructuredLogger>,
) {
    loop {
        match notices.recv().await {
            Ok(notice) => {
                tracing::debug!(?notice, "pipeline notice");
                logger.log_notice(&notice);
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "notice relay fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

pub(crate) async fn apply_command(studio: &Studio, key: &str, raw: &str) -> Result<String> {
    let command: DocumentCommand =
        serde_json::from_str(raw).context("Failed to parse command JSON")?;
    let document = studio.load(key).await?;
    let (mut machine, _snapshots) = DocumentStateMachine::new(document, studio.logger(key)?);

    let outcome = machine.apply(command.clone());
    if !outcome.changed {
        return Ok(format!("{} did not apply; document unchanged", command.name()));
    }
    studio.store.set(key, machine.document()).await?;

    let mut output = format!("{} applied", command.name());
    for event in &outcome.events {
        let _ = write!(output, "\n  {}", serde_json::to_string(event)?);
    }
    Ok(output)
}

pub(crate) async fn export_document(studio: &Studio, key: &str, path: &Path) -> Result<String> {
    let document = studio.load(key).await?;
    let manifest = export_archive(&document, path, studio.config.archive.event_tail)?;
    Ok(format!(
        "Exported '{}' to {} ({} files, {} log entries)",
        key,
        path.display(),
        manifest.files.len(),
        manifest.events_included
    ))
}

pub(crate) async fn show_document(studio: &Studio, key: &str, json: bool) -> Result<String> {
    let document = studio.load(key).await?;
    if json {
        return Ok(serde_json::to_string_pretty(&document)?);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{} ({})", document.name, document.id);
    let _ = writeln!(output, "Active stage: {}", document.current_stage);
    for record in &document.stages {
        let _ = writeln!(
            output,
            "  {:<9} {:?} (revision {}, approvals {})",
            record.stage.to_string(),
            record.status,
            record.revision,
            record.approvals
        );
    }
    let _ = write!(
        output,
        "Slides: {}  Assets: {}  Log entries: {}",
        document.slides.len(),
        document.assets.len(),
        document.event_log.len()
    );
    Ok(output)
}

pub(crate) async fn list_documents(studio: &Studio) -> Result<String> {
    let keys = studio.store.keys().await?;
    if keys.is_empty() {
        return Ok("No documents stored".to_string());
    }
    Ok(keys.join("\n"))
}

pub(crate) fn cutout_file(
    input: &Path,
    output: &Path,
    method: CutoutArg,
    tolerance: Option<u32>,
) -> Result<String> {
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let image = decode_png(&bytes)?;
    let tolerance = tolerance.unwrap_or(crate::segmentation::DEFAULT_TOLERANCE);
    let segmented = match method {
        CutoutArg::FloodFill => flood_fill(&image, tolerance)?,
        CutoutArg::ColorKey => color_key(&image, tolerance)?,
    };
    if !segmented.is_partial() {
        tracing::warn!(
            removed = segmented.removed,
            "cutout removed nothing or everything; try another tolerance"
        );
    }
    std::fs::write(output, encode_png(&segmented.image)?)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let (width, height) = image.dimensions();
    Ok(format!(
        "Removed {} of {} pixels, wrote {}",
        segmented.removed,
        u64::from(width) * u64::from(height),
        output.display()
    ))
}

pub(crate) fn validate_file(file: &Path, lenient: bool) -> Result<String> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Not valid JSON: {}", file.display()))?;
    let mode = if lenient {
        RehydrateMode::Lenient
    } else {
        RehydrateMode::Strict
    };

    match rehydrate(value, mode) {
        Ok(rehydrated) if rehydrated.degraded => {
            let mut output = format!(
                "Recovered '{}' with {} issue(s):",
                rehydrated.document.name,
                rehydrated.issues.len()
            );
            for issue in &rehydrated.issues {
                let _ = write!(output, "\n  {}", issue);
            }
            Ok(output)
        }
        Ok(rehydrated) => Ok(format!("'{}' is valid", rehydrated.document.name)),
        Err(DocumentError::Invalid { issues }) => {
            let listing: Vec<String> = issues.iter().map(|i| format!("  {}", i)).collect();
            anyhow::bail!(
                "{} failed validation:\n{}",
                file.display(),
                listing.join("\n")
            )
        }
        Err(e) => Err(e).with_context(|| format!("{} was rejected", file.display())),
    }
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
