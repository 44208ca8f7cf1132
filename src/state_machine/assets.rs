//! Asset handler: the asset collection lifecycle.

use super::commands::DocumentCommand;
use super::events::StateEvent;
use super::transition::{touch_stage, Edit};
use crate::domain::{AssetId, Document, Stage};
use std::collections::HashSet;

pub(super) fn apply(doc: &Document, command: &DocumentCommand) -> Option<Edit> {
    if !doc.is_editable(Stage::Assets) {
        return None;
    }

    match command {
        DocumentCommand::AddAssets { assets } => {
            let mut seen: HashSet<&AssetId> = doc.assets.iter().map(|a| &a.id).collect();
            let fresh: Vec<_> = assets.iter().filter(|a| seen.insert(&a.id)).cloned().collect();
            if fresh.is_empty() {
                return None;
            }
            let ids = fresh.iter().map(|a| a.id.clone()).collect();
            let mut next = doc.clone();
            next.assets.extend(fresh);
            let mut events = Vec::new();
            touch_stage(&mut next, Stage::Assets, &mut events);
            Some(Edit {
                document: next,
                events,
            }
            .with_event(StateEvent::AssetsAdded { ids }))
        }

        DocumentCommand::RemoveAsset { asset_id } => {
            doc.asset(asset_id)?;
            let mut next = doc.clone();
            next.assets.retain(|a| &a.id != asset_id);

            // Zones may not dangle.
            let mut zones_cleared = 0;
            for variant in next.slides.iter_mut().flat_map(|s| s.variants.iter_mut()) {
                for zone in variant.zones.values_mut() {
                    if zone.asset_id.as_ref() == Some(asset_id) {
                        zone.asset_id = None;
                        zones_cleared += 1;
                    }
                }
            }

            let mut events = Vec::new();
            touch_stage(&mut next, Stage::Assets, &mut events);
            Some(Edit {
                document: next,
                events,
            }
            .with_event(StateEvent::AssetRemoved {
                id: asset_id.clone(),
                zones_cleared,
            }))
        }

        DocumentCommand::ReplaceAssetImage {
            asset_id,
            image,
            cutout,
        } => {
            let current = doc.asset(asset_id)?;
            if current.image.as_ref() == Some(image) && current.cutout == *cutout {
                return None;
            }
            let mut next = doc.clone();
            if let Some(asset) = next.assets.iter_mut().find(|a| &a.id == asset_id) {
                asset.image = Some(image.clone());
                asset.cutout = *cutout;
            }
            let mut events = Vec::new();
            touch_stage(&mut next, Stage::Assets, &mut events);
            Some(Edit {
                document: next,
                events,
            }
            .with_event(StateEvent::AssetImageReplaced {
                id: asset_id.clone(),
            }))
        }

        _ => None,
    }
}
