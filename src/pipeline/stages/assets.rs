//! Stage 1: concept generation, one image per concept, optional cutout.

use super::{StageContext, StageReport};
use crate::domain::{
    Asset, AssetId, AssetImage, CutoutMethod, Document, ImageData, Stage,
};
use crate::generation::{ConceptSpec, GenerationGateway, GenerationKind};
use crate::pipeline::batch::process_batch;
use crate::pipeline::cutout::CutoutPlan;
use crate::pipeline::errors::PipelineError;
use crate::pipeline::notices::PipelineNotice;
use crate::segmentation::{decode_png, encode_png};
use crate::state_machine::DocumentCommand;
use tokio::sync::broadcast;

pub(in crate::pipeline) async fn run_assets(
    ctx: &mut StageContext<'_>,
) -> Result<StageReport, PipelineError> {
    ctx.require_editable(Stage::Assets)?;
    ctx.token.checkpoint().await?;

    let count = ctx.config.concept_count;
    let prompt = concept_prompt(ctx.machine.document());
    let concepts: Vec<ConceptSpec> = ctx
        .gateway
        .generate(GenerationKind::Concepts { count }, prompt)
        .await?
        .into_concepts()?
        .into_iter()
        .take(count)
        .collect();

    let mut report = StageReport {
        requested: concepts.len(),
        ..StageReport::default()
    };
    let job = ImageJob {
        gateway: ctx.gateway,
        plan: ctx.cutout,
        notices: ctx.notices,
        size: ctx.config.image_size,
        auto_cutout: ctx.machine.document().settings.is_enabled("auto_cutout"),
    };

    let mut produced: Vec<Asset> = Vec::new();
    let mut degraded = 0;
    let summary = process_batch(
        concepts,
        ctx.config.image_concurrency,
        ctx.token,
        |_, concept| job.produce(concept),
        |_, (asset, was_degraded)| {
            degraded += usize::from(was_degraded);
            produced.push(asset);
            Ok(())
        },
    )
    .await?;

    ctx.notify(PipelineNotice::BatchFinished {
        stage: Stage::Assets,
        total: summary.total,
        succeeded: summary.succeeded,
        failed: summary.failed,
        chunks: summary.chunks,
    });
    report.produced = produced.len();
    report.degraded = degraded;

    if !produced.is_empty() && ctx.dispatch(DocumentCommand::AddAssets { assets: produced }) {
        report.commands += 1;
    }
    ctx.approve(Stage::Assets, &mut report);
    Ok(report)
}

/// Shared inputs for per-concept image work.
struct ImageJob<'a> {
    gateway: &'a GenerationGateway,
    plan: &'a CutoutPlan,
    notices: &'a broadcast::Sender<PipelineNotice>,
    size: u32,
    auto_cutout: bool,
}

impl ImageJob<'_> {
    /// Generates the concept's image and, when asked for, removes its
    /// background. Returns the asset and whether the cutout degraded.
    async fn produce(&self, concept: ConceptSpec) -> Result<(Asset, bool), PipelineError> {
        let png = self
            .gateway
            .generate(
                GenerationKind::Image {
                    width: self.size,
                    height: self.size,
                },
                concept.description.clone(),
            )
            .await?
            .into_image()?;
        let pixels = decode_png(&png)?;
        let (width, height) = pixels.dimensions();

        let wants_cutout =
            concept.cutout && self.auto_cutout && self.plan.preferred != CutoutMethod::None;
        let (png, cutout, degraded) = if wants_cutout {
            let result = self.plan.apply(pixels).await;
            if result.degraded {
                let _ = self.notices.send(PipelineNotice::CutoutDegraded {
                    concept: concept.description.clone(),
                    method: format!("{:?}", result.method),
                });
            }
            (encode_png(&result.image)?, result.method, result.degraded)
        } else {
            (png, CutoutMethod::None, false)
        };

        let asset = Asset {
            id: AssetId::generate(),
            kind: concept.kind,
            concept: concept.description,
            image: Some(AssetImage {
                width,
                height,
                data: ImageData::Inline { png },
            }),
            cutout,
        };
        Ok((asset, degraded))
    }
}

fn concept_prompt(document: &Document) -> String {
    let mut prompt = if document.branding.brand_name.is_empty() {
        document.name.clone()
    } else {
        document.branding.brand_name.clone()
    };
    if !document.branding.tone.is_empty() {
        prompt.push_str(&format!("\nTone: {}", document.branding.tone));
    }
    for item in &document.outline {
        prompt.push_str(&format!("\n- {}", item.title));
    }
    prompt
}
