//! Workflow handler: stage gating, strategy content and metadata.

use super::commands::DocumentCommand;
use super::events::StateEvent;
use super::transition::{touch_stage, Edit};
use crate::domain::{Document, Slide, Stage, StageStatus};

/// Oldest log entries are dropped beyond this many.
pub const MAX_EVENT_LOG: usize = 500;

pub(super) fn apply(doc: &Document, command: &DocumentCommand) -> Option<Edit> {
    use DocumentCommand::*;
    match command {
        ApproveStage { stage } => approve_stage(doc, *stage),
        UnlockStage { stage } => unlock_stage(doc, *stage),
        ApproveAll => approve_all(doc),
        SetActiveStage { stage } => set_active_stage(doc, *stage),

        UpdateBranding { branding } => {
            if !doc.is_editable(Stage::Strategy) || doc.branding == *branding {
                return None;
            }
            let mut next = doc.clone();
            next.branding = branding.clone();
            let mut events = Vec::new();
            touch_stage(&mut next, Stage::Strategy, &mut events);
            let slides = next.slides.len();
            Some(Edit {
                document: next,
                events,
            }
            .with_event(StateEvent::StrategyUpdated { slides }))
        }

        SetOutline { items } => {
            if !doc.is_editable(Stage::Strategy) || doc.outline == *items {
                return None;
            }
            let mut next = doc.clone();
            next.outline = items.clone();
            // Keep existing slides (and their ids) by position, retitled.
            let mut slides: Vec<Slide> = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match doc.slides.get(i) {
                    Some(existing) => {
                        let mut slide = existing.clone();
                        slide.title = item.title.clone();
                        slides.push(slide);
                    }
                    None => slides.push(Slide::from_outline(item)),
                }
            }
            next.slides = slides;
            let mut events = Vec::new();
            touch_stage(&mut next, Stage::Strategy, &mut events);
            let slides = next.slides.len();
            Some(Edit {
                document: next,
                events,
            }
            .with_event(StateEvent::StrategyUpdated { slides }))
        }

        RenameProject { name } => {
            let name = name.trim();
            if name.is_empty() || doc.name == name {
                return None;
            }
            let mut next = doc.clone();
            next.name = name.to_string();
            Some(Edit::new(next).with_event(StateEvent::ProjectRenamed {
                name: name.to_string(),
            }))
        }

        ToggleAiSetting { setting, enabled } => {
            if doc.settings.toggles.get(setting) == Some(enabled) {
                return None;
            }
            let mut next = doc.clone();
            next.settings.toggles.insert(setting.clone(), *enabled);
            Some(Edit::new(next).with_event(StateEvent::SettingsChanged))
        }

        UpdateSettings { settings } => {
            if doc.settings == *settings {
                return None;
            }
            let mut next = doc.clone();
            next.settings = settings.clone();
            Some(Edit::new(next).with_event(StateEvent::SettingsChanged))
        }

        AppendLog { entry } => {
            let mut next = doc.clone();
            next.event_log.push(entry.clone());
            if next.event_log.len() > MAX_EVENT_LOG {
                let excess = next.event_log.len() - MAX_EVENT_LOG;
                next.event_log.drain(..excess);
            }
            Some(Edit::new(next).with_event(StateEvent::LogAppended))
        }

        _ => None,
    }
}

/// Marks `stage` approved, opens the next stage if it is locked, and advances
/// the active pointer (capped at the last stage).
fn approve_stage(doc: &Document, stage: Stage) -> Option<Edit> {
    let from = doc.stage_status(stage);
    if !from.is_editable() {
        return None;
    }

    let mut next = doc.clone();
    let mut events = Vec::new();
    if let Some(record) = next.stage_record_mut(stage) {
        record.status = StageStatus::Approved;
        record.approvals += 1;
    }
    events.push(StateEvent::StageStatusChanged {
        stage,
        from,
        to: StageStatus::Approved,
    });

    if let Some(following) = stage.next() {
        if let Some(record) = next.stage_record_mut(following) {
            if record.status == StageStatus::Locked {
                record.status = StageStatus::Open;
                events.push(StateEvent::StageStatusChanged {
                    stage: following,
                    from: StageStatus::Locked,
                    to: StageStatus::Open,
                });
            }
        }
    }

    let target = stage.next().unwrap_or(Stage::LAST);
    if next.current_stage != target {
        events.push(StateEvent::ActiveStageChanged {
            from: next.current_stage,
            to: target,
        });
        next.current_stage = target;
    }

    Some(Edit {
        document: next,
        events,
    })
}

/// Demotes an approved stage to open. Neighbors are untouched.
fn unlock_stage(doc: &Document, stage: Stage) -> Option<Edit> {
    if doc.stage_status(stage) != StageStatus::Approved {
        return None;
    }
    let mut next = doc.clone();
    if let Some(record) = next.stage_record_mut(stage) {
        record.status = StageStatus::Open;
    }
    Some(Edit::new(next).with_event(StateEvent::StageStatusChanged {
        stage,
        from: StageStatus::Approved,
        to: StageStatus::Open,
    }))
}

fn approve_all(doc: &Document) -> Option<Edit> {
    let all_approved = Stage::ALL
        .iter()
        .all(|s| doc.stage_status(*s) == StageStatus::Approved);
    if all_approved && doc.current_stage == Stage::LAST {
        return None;
    }

    let mut next = doc.clone();
    let mut events = Vec::new();
    for record in next.stages.iter_mut() {
        if record.status != StageStatus::Approved {
            events.push(StateEvent::StageStatusChanged {
                stage: record.stage,
                from: record.status,
                to: StageStatus::Approved,
            });
            record.status = StageStatus::Approved;
            record.approvals += 1;
        }
    }
    if next.current_stage != Stage::LAST {
        events.push(StateEvent::ActiveStageChanged {
            from: next.current_stage,
            to: Stage::LAST,
        });
        next.current_stage = Stage::LAST;
    }
    Some(Edit {
        document: next,
        events,
    })
}

fn set_active_stage(doc: &Document, stage: Stage) -> Option<Edit> {
    if doc.current_stage == stage || doc.stage_status(stage) == StageStatus::Locked {
        return None;
    }
    let mut next = doc.clone();
    let from = next.current_stage;
    next.current_stage = stage;
    Some(Edit::new(next).with_event(StateEvent::ActiveStageChanged { from, to: stage }))
}
