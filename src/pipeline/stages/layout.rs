//! Stage 2: kit background on every slide, seeded stamp placement, text layout.

use super::{StageContext, StageReport};
use crate::domain::{
    AssetKind, SlideId, Stage, TextAlign, TextAnchor, TextPlacement, BACKGROUND_ZONE, STAMP_ZONE,
};
use crate::pipeline::errors::PipelineError;
use crate::state_machine::DocumentCommand;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub(in crate::pipeline) async fn run_layout(
    ctx: &mut StageContext<'_>,
) -> Result<StageReport, PipelineError> {
    ctx.require_editable(Stage::Layout)?;
    ctx.token.checkpoint().await?;

    let document = ctx.machine.document();
    let background = document
        .first_asset_of(AssetKind::Background)
        .map(|a| a.id.clone());
    let stamp = if document.settings.is_enabled("stamps") {
        document.first_asset_of(AssetKind::Stamp).map(|a| a.id.clone())
    } else {
        None
    };
    let slide_ids: Vec<SlideId> = document.slides.iter().map(|s| s.id.clone()).collect();

    let probability = ctx.config.stamp_probability.clamp(0.0, 1.0);
    let mut rng = StdRng::seed_from_u64(ctx.config.layout_seed);
    let last = slide_ids.len().saturating_sub(1);
    let mut report = StageReport {
        requested: slide_ids.len(),
        ..StageReport::default()
    };

    for (index, slide_id) in slide_ids.into_iter().enumerate() {
        let mut commands = Vec::new();
        if let Some(asset_id) = &background {
            commands.push(DocumentCommand::UpdateZone {
                slide_id: slide_id.clone(),
                zone: BACKGROUND_ZONE.to_string(),
                asset_id: Some(asset_id.clone()),
            });
        }
        let interior = index > 0 && index < last;
        if let (true, Some(asset_id)) = (interior, &stamp) {
            if rng.gen_bool(probability) {
                commands.push(DocumentCommand::UpdateZone {
                    slide_id: slide_id.clone(),
                    zone: STAMP_ZONE.to_string(),
                    asset_id: Some(asset_id.clone()),
                });
            }
        }
        commands.push(DocumentCommand::UpdateTextLayout {
            slide_id,
            placement: placement_for(index, last),
        });

        if ctx.dispatch(DocumentCommand::Batch { commands }) {
            report.commands += 1;
            report.produced += 1;
        }
    }

    ctx.approve(Stage::Layout, &mut report);
    Ok(report)
}

/// Title and closing slides are centred; content slides read top-left.
fn placement_for(index: usize, last: usize) -> TextPlacement {
    if index == 0 {
        TextPlacement {
            align: TextAlign::Center,
            anchor: TextAnchor::Middle,
        }
    } else if index == last {
        TextPlacement {
            align: TextAlign::Center,
            anchor: TextAnchor::Bottom,
        }
    } else {
        TextPlacement {
            align: TextAlign::Left,
            anchor: TextAnchor::Top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_for_title_and_closing() {
        assert_eq!(placement_for(0, 4).anchor, TextAnchor::Middle);
        assert_eq!(placement_for(4, 4).anchor, TextAnchor::Bottom);
        assert_eq!(placement_for(2, 4).align, TextAlign::Left);
        // A single slide is the title slide
        assert_eq!(placement_for(0, 0).anchor, TextAnchor::Middle);
    }
}
