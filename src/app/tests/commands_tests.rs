use super::*;
use crate::domain::{StageStatus, BACKGROUND_ZONE};
use crate::persistence::read_manifest;
use image::{Rgba, RgbaImage};
use tempfile::TempDir;

fn studio() -> (Studio, TempDir) {
    let temp = TempDir::new().unwrap();
    let yaml = "pipeline:\n  image_size: 40\n  concept_count: 3\n";
    std::fs::write(temp.path().join("studio.yaml"), yaml).unwrap();
    let studio = Studio::open(Some(temp.path().to_path_buf()), None).unwrap();
    (studio, temp)
}

fn request(approve: bool) -> NewDocument {
    NewDocument {
        name: "Launch deck".to_string(),
        slides: vec!["Welcome".into(), "Problem".into(), "Thanks".into()],
        brand: Some("Acme".to_string()),
        tone: None,
        approve,
    }
}

#[tokio::test]
async fn test_studio_reads_config_from_home() {
    let (studio, _temp) = studio();
    assert_eq!(studio.config.pipeline.image_size, 40);
    assert_eq!(studio.config.pipeline.concept_count, 3);
    assert_eq!(studio.config.pipeline.copy_concurrency, 2);
}

#[tokio::test]
async fn test_new_then_refuse_duplicate() {
    let (studio, _temp) = studio();
    let output = create_document(&studio, "launch", request(false), false)
        .await
        .unwrap();
    assert!(output.contains("3 slides"));

    let doc = studio.load("launch").await.unwrap();
    assert_eq!(doc.branding.brand_name, "Acme");
    assert_eq!(doc.current_stage, Stage::Strategy);

    assert!(create_document(&studio, "launch", request(false), false)
        .await
        .is_err());
    assert!(create_document(&studio, "launch", request(true), true)
        .await
        .is_ok());
    assert_eq!(studio.load("launch").await.unwrap().current_stage, Stage::Assets);
}

#[tokio::test]
async fn test_run_pipeline_persists_result() {
    let (studio, temp) = studio();
    create_document(&studio, "launch", request(true), false)
        .await
        .unwrap();

    let output = run_pipeline(&studio, "launch").await.unwrap();
    assert!(output.starts_with("Pipeline completed"), "{}", output);

    let doc = studio.load("launch").await.unwrap();
    assert_eq!(doc.current_stage, Stage::Publish);
    assert_eq!(doc.assets.len(), 3);
    assert_eq!(doc.stage_status(Stage::Copy), StageStatus::Approved);
    let background = doc.slides[0].active().unwrap().zones[BACKGROUND_ZONE]
        .asset_id
        .clone();
    assert!(background.is_some());

    let log = std::fs::read_to_string(temp.path().join("logs").join("events.jsonl")).unwrap();
    assert!(log.contains("\"Pipeline\""));
}

#[tokio::test]
async fn test_run_on_unapproved_strategy_fails_cleanly() {
    let (studio, _temp) = studio();
    create_document(&studio, "draft", request(false), false)
        .await
        .unwrap();

    let output = run_pipeline(&studio, "draft").await.unwrap();
    assert!(output.starts_with("Pipeline failed"), "{}", output);
    assert!(studio.load("draft").await.unwrap().assets.is_empty());
}

#[tokio::test]
async fn test_apply_command_json() {
    let (studio, _temp) = studio();
    create_document(&studio, "deck", request(false), false)
        .await
        .unwrap();

    let output = apply_command(&studio, "deck", r#"{"type":"ApproveStage","payload":{"stage":1}}"#)
        .await
        .unwrap();
    assert!(output.starts_with("ApproveStage applied"));
    assert_eq!(studio.load("deck").await.unwrap().current_stage, Stage::Assets);

    let output = apply_command(&studio, "deck", r#"{"type":"ApproveStage","payload":{"stage":4}}"#)
        .await
        .unwrap();
    assert!(output.contains("did not apply"));

    assert!(apply_command(&studio, "deck", "{not json").await.is_err());
}

#[tokio::test]
async fn test_show_and_list() {
    let (studio, _temp) = studio();
    assert_eq!(list_documents(&studio).await.unwrap(), "No documents stored");

    create_document(&studio, "deck", request(false), false)
        .await
        .unwrap();
    assert_eq!(list_documents(&studio).await.unwrap(), "deck");

    let summary = show_document(&studio, "deck", false).await.unwrap();
    assert!(summary.starts_with("Launch deck"));
    assert!(summary.contains("Slides: 3"));

    let json = show_document(&studio, "deck", true).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["name"], "Launch deck");

    assert!(show_document(&studio, "missing", false).await.is_err());
}

#[tokio::test]
async fn test_export_writes_archive() {
    let (studio, temp) = studio();
    create_document(&studio, "deck", request(true), false)
        .await
        .unwrap();
    run_pipeline(&studio, "deck").await.unwrap();

    let path = temp.path().join("deck.zip");
    let output = export_document(&studio, "deck", &path).await.unwrap();
    assert!(output.contains("deck.zip"));

    let manifest = read_manifest(&path).unwrap();
    // document.json, events.json and one PNG per asset
    assert_eq!(manifest.files.len(), 5);
}

#[test]
fn test_cutout_file_removes_white_border() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.png");
    let output = temp.path().join("out.png");
    let image = RgbaImage::from_fn(20, 20, |x, y| {
        if (5..15).contains(&x) && (5..15).contains(&y) {
            Rgba([200, 20, 20, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    std::fs::write(&input, encode_png(&image).unwrap()).unwrap();

    let report = cutout_file(&input, &output, CutoutArg::FloodFill, None).unwrap();
    assert!(report.starts_with("Removed 300 of 400"), "{}", report);

    let result = decode_png(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(result.get_pixel(0, 0)[3], 0);
    assert_eq!(result.get_pixel(10, 10)[3], 255);
}

#[test]
fn test_validate_file_modes() {
    let temp = TempDir::new().unwrap();
    let good = temp.path().join("good.json");
    std::fs::write(&good, serde_json::to_string(&Document::new("Fine")).unwrap()).unwrap();
    assert_eq!(validate_file(&good, false).unwrap(), "'Fine' is valid");

    let bad = temp.path().join("bad.json");
    std::fs::write(&bad, r#"{"name":"Broken","current_stage":9}"#).unwrap();
    let err = validate_file(&bad, false).unwrap_err();
    assert!(err.to_string().contains("failed validation"));

    let recovered = validate_file(&bad, true).unwrap();
    assert!(recovered.starts_with("Recovered 'Broken'"));
}
