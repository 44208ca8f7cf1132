//! Slide handler: zones, text layout, copy and variant selection.
//!
//! Every command here targets the slide's active variant. Copy edits belong to
//! the Copy stage; everything else belongs to Layout.

use super::commands::DocumentCommand;
use super::events::StateEvent;
use super::transition::{touch_stage, Edit};
use crate::domain::{Document, SlideId, Stage, Variant};

/// Smallest element edge, in percent of the canvas.
const MIN_EXTENT: f32 = 1.0;

pub(super) fn apply(doc: &Document, command: &DocumentCommand) -> Option<Edit> {
    use DocumentCommand::*;
    match command {
        UpdateZone {
            slide_id,
            zone,
            asset_id,
        } => {
            if let Some(id) = asset_id {
                doc.asset(id)?;
            }
            edit_variant(doc, slide_id, Stage::Layout, |variant| {
                let target = variant.zones.get_mut(zone)?;
                if target.asset_id == *asset_id {
                    return None;
                }
                target.asset_id = asset_id.clone();
                Some(())
            })
        }

        MoveElement { slide_id, zone, x, y } => {
            if !x.is_finite() || !y.is_finite() {
                return None;
            }
            let (x, y) = (x.clamp(0.0, 100.0), y.clamp(0.0, 100.0));
            edit_variant(doc, slide_id, Stage::Layout, |variant| {
                let rect = &mut variant.zones.get_mut(zone)?.rect;
                if rect.x == x && rect.y == y {
                    return None;
                }
                rect.x = x;
                rect.y = y;
                Some(())
            })
        }

        ResizeElement {
            slide_id,
            zone,
            width,
            height,
        } => {
            if !width.is_finite() || !height.is_finite() {
                return None;
            }
            let width = width.clamp(MIN_EXTENT, 100.0);
            let height = height.clamp(MIN_EXTENT, 100.0);
            edit_variant(doc, slide_id, Stage::Layout, |variant| {
                let rect = &mut variant.zones.get_mut(zone)?.rect;
                if rect.width == width && rect.height == height {
                    return None;
                }
                rect.width = width;
                rect.height = height;
                Some(())
            })
        }

        UpdateTextLayout {
            slide_id,
            placement,
        } => edit_variant(doc, slide_id, Stage::Layout, |variant| {
            if variant.text.placement == *placement {
                return None;
            }
            variant.text.placement = *placement;
            Some(())
        }),

        UpdateTextContent {
            slide_id,
            field,
            text,
        } => {
            if field.trim().is_empty() {
                return None;
            }
            let edit = edit_variant(doc, slide_id, Stage::Copy, |variant| {
                if variant.text.fields.get(field) == Some(text) {
                    return None;
                }
                variant.text.fields.insert(field.clone(), text.clone());
                Some(())
            })?;
            Some(edit.with_event(StateEvent::CopyUpdated {
                slide_id: slide_id.clone(),
                field: field.clone(),
            }))
        }

        SelectVariant { slide_id, index } => {
            if !doc.is_editable(Stage::Layout) {
                return None;
            }
            let slide = doc.slide(slide_id)?;
            if *index >= slide.variants.len() || slide.active_variant == *index {
                return None;
            }
            let mut next = doc.clone();
            if let Some(slide) = next.slide_mut(slide_id) {
                slide.active_variant = *index;
            }
            let mut events = Vec::new();
            touch_stage(&mut next, Stage::Layout, &mut events);
            Some(Edit {
                document: next,
                events,
            }
            .with_event(StateEvent::SlideUpdated {
                slide_id: slide_id.clone(),
            }))
        }

        _ => None,
    }
}

/// Runs `mutate` on a copy of the slide's active variant. `mutate` returns
/// `None` to signal that nothing changed.
fn edit_variant<F>(doc: &Document, slide_id: &SlideId, stage: Stage, mutate: F) -> Option<Edit>
where
    F: FnOnce(&mut Variant) -> Option<()>,
{
    if !doc.is_editable(stage) {
        return None;
    }
    let mut variant = doc.slide(slide_id)?.active()?.clone();
    mutate(&mut variant)?;

    let mut next = doc.clone();
    let slide = next.slide_mut(slide_id)?;
    *slide.active_mut()? = variant;

    let mut events = Vec::new();
    touch_stage(&mut next, stage, &mut events);
    let edit = Edit {
        document: next,
        events,
    };
    Some(match stage {
        Stage::Copy => edit,
        _ => edit.with_event(StateEvent::SlideUpdated {
            slide_id: slide_id.clone(),
        }),
    })
}
