use super::*;
use crate::domain::{
    AssetKind, CutoutMethod, Document, OutlineItem, StageStatus, BACKGROUND_ZONE, STAMP_ZONE,
};
use crate::generation::{
    GenerationError, GenerationOutput, GenerationRequest, GenerationService, OfflineGenerator,
    RetryPolicy,
};
use crate::generation::ModelSelection;
use crate::pipeline::control::PipelineController;
use crate::state_machine::DocumentSnapshot;
use crate::structured_logger::StructuredLogger;
use async_trait::async_trait;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

/// Always reports an exhausted quota.
struct QuotaSpent;

#[async_trait]
impl GenerationService for QuotaSpent {
    fn name(&self) -> &str {
        "quota-spent"
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        Err(GenerationError::QuotaExhausted {
            message: "daily limit reached".to_string(),
        })
    }
}

fn outline(titles: &[&str]) -> Vec<OutlineItem> {
    titles
        .iter()
        .map(|t| OutlineItem {
            title: t.to_string(),
            summary: format!("About {}", t),
        })
        .collect()
}

/// A machine whose Strategy stage is approved over a five-slide outline.
fn strategy_done() -> (DocumentStateMachine, watch::Receiver<DocumentSnapshot>, TempDir) {
    let temp = TempDir::new().unwrap();
    let logger = Arc::new(StructuredLogger::new("pipeline-test", &temp.path().join("logs")).unwrap());
    let (mut machine, rx) = DocumentStateMachine::new(Document::new("Launch deck"), logger);
    machine.apply(DocumentCommand::SetOutline {
        items: outline(&["Welcome", "Problem", "Solution", "Pricing", "Thanks"]),
    });
    machine.apply(DocumentCommand::ApproveStage {
        stage: Stage::Strategy,
    });
    (machine, rx, temp)
}

fn runner(
    primary: Option<Arc<dyn GenerationService>>,
) -> (PipelineRunner, Arc<GenerationGateway>, broadcast::Receiver<PipelineNotice>) {
    let (tx, rx) = broadcast::channel(256);
    let gateway = Arc::new(GenerationGateway::new(
        primary,
        Arc::new(OfflineGenerator::new()),
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        },
        ModelSelection {
            text_model: "text".to_string(),
            image_model: "image".to_string(),
        },
        tx.clone(),
    ));
    let plan = CutoutPlan {
        preferred: CutoutMethod::FloodFill,
        neural: None,
        tolerance: 60,
    };
    let config = PipelineConfig {
        image_size: 48,
        stamp_probability: 0.5,
        ..PipelineConfig::default()
    };
    let runner = PipelineRunner::new(Arc::clone(&gateway), plan, config, tx);
    (runner, gateway, rx)
}

fn drain(rx: &mut broadcast::Receiver<PipelineNotice>) -> Vec<PipelineNotice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}

fn stamp_pattern(document: &Document) -> Vec<bool> {
    document
        .slides
        .iter()
        .map(|s| s.active().unwrap().zones[STAMP_ZONE].asset_id.is_some())
        .collect()
}

#[tokio::test]
async fn test_full_run_reaches_publish() {
    let (mut machine, _rx, _temp) = strategy_done();
    let (runner, _gateway, mut notices) = runner(None);
    let controller = PipelineController::new();

    let outcome = runner.run(&mut machine, controller.token()).await;

    assert!(matches!(outcome, PipelineOutcome::Completed(_)), "{:?}", outcome);
    assert_eq!(controller.status(), PipelineStatus::Completed);

    let doc = machine.document();
    assert_eq!(doc.current_stage, Stage::Publish);
    for stage in [Stage::Assets, Stage::Layout, Stage::Copy] {
        assert_eq!(doc.stage_status(stage), StageStatus::Approved);
    }
    assert_eq!(doc.assets.len(), 4);

    let background = doc.first_asset_of(AssetKind::Background).unwrap();
    assert_eq!(background.cutout, CutoutMethod::None);
    let stamp = doc.first_asset_of(AssetKind::Stamp).unwrap();
    assert_eq!(stamp.cutout, CutoutMethod::FloodFill);

    for slide in &doc.slides {
        let variant = slide.active().unwrap();
        assert_eq!(variant.zones[BACKGROUND_ZONE].asset_id.as_ref(), Some(&background.id));
        assert!(variant.text.fields.contains_key("headline"));
        assert!(variant.text.fields.contains_key("body"));
    }
    let pattern = stamp_pattern(doc);
    assert!(!pattern[0]);
    assert!(!pattern[pattern.len() - 1]);

    let summary = outcome.summary();
    assert_eq!(summary.assets.produced, 4);
    assert_eq!(summary.layout.produced, 5);
    assert_eq!(summary.copy.produced, 5);

    let last = doc.event_log.last().unwrap();
    assert!(last.message.starts_with("Pipeline completed"));

    let notices = drain(&mut notices);
    assert_eq!(
        notices.first(),
        Some(&PipelineNotice::StatusChanged {
            status: "running".to_string()
        })
    );
    assert_eq!(
        notices.last(),
        Some(&PipelineNotice::StatusChanged {
            status: "completed".to_string()
        })
    );
    let batches = notices
        .iter()
        .filter(|n| matches!(n, PipelineNotice::BatchFinished { .. }))
        .count();
    assert_eq!(batches, 2);
}

#[tokio::test]
async fn test_stamp_placement_is_reproducible() {
    let (mut first, _rx1, _t1) = strategy_done();
    let (mut second, _rx2, _t2) = strategy_done();
    let (runner, _gateway, _notices) = runner(None);

    runner.run(&mut first, PipelineController::new().token()).await;
    runner.run(&mut second, PipelineController::new().token()).await;

    assert_eq!(stamp_pattern(first.document()), stamp_pattern(second.document()));
}

#[tokio::test]
async fn test_stamps_toggle_off_leaves_stamp_zones_empty() {
    let (mut machine, _rx, _temp) = strategy_done();
    machine.apply(DocumentCommand::ToggleAiSetting {
        setting: "stamps".to_string(),
        enabled: false,
    });
    let (runner, _gateway, _notices) = runner(None);

    runner.run(&mut machine, PipelineController::new().token()).await;

    assert!(stamp_pattern(machine.document()).iter().all(|placed| !placed));
}

#[tokio::test]
async fn test_abort_before_start_changes_nothing() {
    let (mut machine, _rx, _temp) = strategy_done();
    let (runner, _gateway, _notices) = runner(None);
    let controller = PipelineController::new();
    controller.abort();

    let outcome = runner.run(&mut machine, controller.token()).await;

    assert!(matches!(outcome, PipelineOutcome::Aborted(_)));
    assert_eq!(controller.status(), PipelineStatus::Aborted);
    let doc = machine.document();
    assert!(doc.assets.is_empty());
    assert_eq!(doc.stage_status(Stage::Assets), StageStatus::Open);
    assert_eq!(doc.event_log.last().unwrap().message, "Pipeline aborted");
}

#[tokio::test]
async fn test_quota_fails_run_then_offline_completes() {
    let (mut machine, _rx, _temp) = strategy_done();
    let (runner, gateway, mut notices) = runner(Some(Arc::new(QuotaSpent)));

    let outcome = runner.run(&mut machine, PipelineController::new().token()).await;
    match &outcome {
        PipelineOutcome::Failed { message, .. } => assert!(message.contains("quota")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(gateway.is_offline());
    let notices = drain(&mut notices);
    assert!(notices
        .iter()
        .any(|n| matches!(n, PipelineNotice::FallbackEngaged { .. })));
    assert!(machine.document().assets.is_empty());

    let outcome = runner.run(&mut machine, PipelineController::new().token()).await;
    assert!(matches!(outcome, PipelineOutcome::Completed(_)));
    assert_eq!(machine.document().current_stage, Stage::Publish);
}

#[tokio::test]
async fn test_locked_assets_stage_fails() {
    let temp = TempDir::new().unwrap();
    let logger = Arc::new(StructuredLogger::new("pipeline-test", temp.path()).unwrap());
    let (mut machine, _rx) = DocumentStateMachine::new(Document::new("Fresh"), logger);
    let (runner, _gateway, _notices) = runner(None);

    let outcome = runner.run(&mut machine, PipelineController::new().token()).await;

    match outcome {
        PipelineOutcome::Failed { message, summary } => {
            assert!(message.contains("not editable"));
            assert_eq!(summary, RunSummary::default());
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(machine.document().event_log.last().unwrap().level, LogLevel::Error);
}

#[tokio::test]
async fn test_pause_holds_until_resume() {
    let (mut machine, _rx, _temp) = strategy_done();
    let (runner, _gateway, _notices) = runner(None);
    let controller = PipelineController::new();
    controller.pause();
    let mut status = controller.subscribe_status();

    let resumer = async {
        status
            .wait_for(|s| *s == PipelineStatus::Paused)
            .await
            .unwrap();
        controller.resume();
    };
    let (outcome, ()) = tokio::join!(runner.run(&mut machine, controller.token()), resumer);

    assert!(matches!(outcome, PipelineOutcome::Completed(_)));
}
