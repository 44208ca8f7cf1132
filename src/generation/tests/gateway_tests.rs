use super::*;
use crate::generation::OfflineGenerator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Replays a fixed script of results, then keeps failing.
struct Scripted {
    script: Mutex<VecDeque<Result<GenerationOutput, GenerationError>>>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl Scripted {
    fn new(script: Vec<Result<GenerationOutput, GenerationError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationService for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        self.calls.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GenerationError::Failed {
                    message: "script exhausted".to_string(),
                })
            })
    }
}

fn gateway(
    primary: Option<Arc<dyn GenerationService>>,
) -> (GenerationGateway, broadcast::Receiver<PipelineNotice>) {
    let (tx, rx) = broadcast::channel(16);
    let gateway = GenerationGateway::new(
        primary,
        Arc::new(OfflineGenerator::new()),
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
        },
        ModelSelection {
            text_model: "text-1".to_string(),
            image_model: "image-1".to_string(),
        },
        tx,
    );
    (gateway, rx)
}

fn copy_kind() -> GenerationKind {
    GenerationKind::Copy {
        fields: vec!["headline".to_string()],
    }
}

fn copy_output(text: &str) -> GenerationOutput {
    GenerationOutput::Copy {
        fields: [("headline".to_string(), text.to_string())].into(),
    }
}

#[tokio::test]
async fn test_no_primary_starts_offline() {
    let (gateway, _rx) = gateway(None);
    assert!(gateway.is_offline());
    assert_eq!(gateway.active_service(), "offline");
    let out = gateway
        .generate(copy_kind(), "Hello".to_string())
        .await
        .unwrap();
    assert_eq!(out, copy_output("Hello"));
}

#[tokio::test]
async fn test_primary_used_with_model_for_kind() {
    let primary = Scripted::new(vec![Ok(copy_output("from primary"))]);
    let (gateway, _rx) = gateway(Some(primary.clone()));
    assert_eq!(gateway.active_service(), "scripted");

    let out = gateway
        .generate(copy_kind(), "prompt".to_string())
        .await
        .unwrap();
    assert_eq!(out, copy_output("from primary"));
    assert_eq!(primary.calls.lock().unwrap()[0].model, "text-1");
}

#[tokio::test]
async fn test_overload_is_retried() {
    let busy = || {
        Err(GenerationError::Overloaded {
            message: "busy".to_string(),
        })
    };
    let primary = Scripted::new(vec![busy(), busy(), Ok(copy_output("third time"))]);
    let (gateway, _rx) = gateway(Some(primary.clone()));

    let out = gateway.generate(copy_kind(), "p".to_string()).await.unwrap();
    assert_eq!(out, copy_output("third time"));
    assert_eq!(primary.call_count(), 3);
    assert!(!gateway.is_offline());
}

#[tokio::test]
async fn test_quota_switches_to_offline() {
    let primary = Scripted::new(vec![Err(GenerationError::QuotaExhausted {
        message: "daily limit".to_string(),
    })]);
    let (gateway, mut rx) = gateway(Some(primary.clone()));

    let err = gateway
        .generate(copy_kind(), "p".to_string())
        .await
        .unwrap_err();
    assert!(err.is_quota());
    assert!(gateway.is_offline());
    assert_eq!(primary.call_count(), 1);

    assert!(matches!(
        rx.recv().await.unwrap(),
        PipelineNotice::QuotaExhausted { .. }
    ));
    match rx.recv().await.unwrap() {
        PipelineNotice::FallbackEngaged { reason } => assert!(reason.contains("daily limit")),
        other => panic!("unexpected notice: {:?}", other),
    }

    // Later calls never reach the primary
    let out = gateway
        .generate(copy_kind(), "After".to_string())
        .await
        .unwrap();
    assert_eq!(out, copy_output("After"));
    assert_eq!(primary.call_count(), 1);
}

#[tokio::test]
async fn test_item_failure_does_not_switch_mode() {
    let primary = Scripted::new(vec![Err(GenerationError::Failed {
        message: "nope".to_string(),
    })]);
    let (gateway, mut rx) = gateway(Some(primary));
    assert!(gateway.generate(copy_kind(), "p".to_string()).await.is_err());
    assert!(!gateway.is_offline());
    assert!(rx.try_recv().is_err());
}
