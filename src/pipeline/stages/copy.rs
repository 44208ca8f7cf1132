//! Stage 3: headline and body copy per slide.

use super::{StageContext, StageReport};
use crate::domain::{Document, SlideId, Stage};
use crate::generation::GenerationKind;
use crate::pipeline::batch::process_batch;
use crate::pipeline::errors::PipelineError;
use crate::pipeline::notices::PipelineNotice;
use crate::state_machine::DocumentCommand;

/// Copy fields requested for every slide.
pub const COPY_FIELDS: [&str; 2] = ["headline", "body"];

pub(in crate::pipeline) async fn run_copy(
    ctx: &mut StageContext<'_>,
) -> Result<StageReport, PipelineError> {
    ctx.require_editable(Stage::Copy)?;

    let requests: Vec<(SlideId, String)> = {
        let document = ctx.machine.document();
        document
            .slides
            .iter()
            .enumerate()
            .map(|(index, slide)| (slide.id.clone(), copy_prompt(document, index)))
            .collect()
    };
    let mut report = StageReport {
        requested: requests.len(),
        ..StageReport::default()
    };

    let gateway = ctx.gateway;
    let machine = &mut *ctx.machine;
    let mut commands = 0;
    let summary = process_batch(
        requests,
        ctx.config.copy_concurrency,
        ctx.token,
        move |_, (slide_id, prompt)| async move {
            let kind = GenerationKind::Copy {
                fields: COPY_FIELDS.iter().map(|f| f.to_string()).collect(),
            };
            let fields = gateway.generate(kind, prompt).await?.into_copy()?;
            Ok((slide_id, fields))
        },
        |_, (slide_id, fields)| {
            for (field, text) in fields {
                let command = DocumentCommand::UpdateTextContent {
                    slide_id: slide_id.clone(),
                    field,
                    text,
                };
                if machine.apply(command).changed {
                    commands += 1;
                }
            }
            Ok(())
        },
    )
    .await?;

    ctx.notify(PipelineNotice::BatchFinished {
        stage: Stage::Copy,
        total: summary.total,
        succeeded: summary.succeeded,
        failed: summary.failed,
        chunks: summary.chunks,
    });
    report.produced = summary.succeeded;
    report.commands = commands;

    ctx.approve(Stage::Copy, &mut report);
    if ctx.dispatch(DocumentCommand::SetActiveStage {
        stage: Stage::Publish,
    }) {
        report.commands += 1;
    }
    Ok(report)
}

/// The slide title first, then its outline summary and the brand tone.
fn copy_prompt(document: &Document, index: usize) -> String {
    let mut prompt = document
        .slides
        .get(index)
        .map(|s| s.title.clone())
        .unwrap_or_default();
    if let Some(item) = document.outline.get(index) {
        if !item.summary.is_empty() {
            prompt.push('\n');
            prompt.push_str(&item.summary);
        }
    }
    if !document.branding.tone.is_empty() {
        prompt.push_str(&format!("\nTone: {}", document.branding.tone));
    }
    prompt
}
