use super::*;
use tempfile::TempDir;

#[test]
fn test_default_config_matches_serde_defaults() {
    let embedded = StudioConfig::default_config().unwrap();
    assert_eq!(embedded, StudioConfig::default());
}

#[test]
fn test_defaults() {
    let config = StudioConfig::default();
    assert_eq!(config.generation.max_attempts, 5);
    assert_eq!(config.generation.base_delay_ms, 500);
    assert_eq!(config.generation.mode, GenerationMode::Offline);
    assert_eq!(config.pipeline.concept_count, 4);
    assert_eq!(config.pipeline.image_concurrency, 1);
    assert_eq!(config.pipeline.copy_concurrency, 2);
    assert_eq!(config.pipeline.stamp_probability, 0.35);
    assert_eq!(config.pipeline.layout_seed, 7);
    assert_eq!(config.pipeline.cutout, CutoutMethod::FloodFill);
    assert_eq!(config.segmentation.tolerance, 60);
    assert_eq!(config.archive.event_tail, 100);
}

#[test]
fn test_partial_yaml_fills_defaults() {
    let yaml = r#"
pipeline:
  copy_concurrency: 3
  cutout: color_key
generation:
  mode: online
"#;
    let config: StudioConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.pipeline.copy_concurrency, 3);
    assert_eq!(config.pipeline.cutout, CutoutMethod::ColorKey);
    assert_eq!(config.pipeline.image_concurrency, 1);
    assert_eq!(config.generation.mode, GenerationMode::Online);
    assert_eq!(config.generation.text_model, "text-standard");
}

#[test]
fn test_empty_yaml_is_default() {
    let config: StudioConfig = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config, StudioConfig::default());
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = StudioConfig::default();
    config.pipeline.copy_concurrency = 0;
    assert!(config.validate().is_err());

    let mut config = StudioConfig::default();
    config.pipeline.stamp_probability = 1.5;
    assert!(config.validate().is_err());

    let mut config = StudioConfig::default();
    config.generation.max_attempts = 0;
    assert!(config.validate().is_err());

    let mut config = StudioConfig::default();
    config.segmentation.tolerance = 70_000;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("segmentation.tolerance"));

    let mut config = StudioConfig::default();
    config.segmentation.tolerance = crate::segmentation::MAX_TOLERANCE;
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("studio.yaml");
    std::fs::write(&path, "segmentation:\n  tolerance: 30\n").unwrap();

    let config = StudioConfig::load(&path).unwrap();
    assert_eq!(config.segmentation.tolerance, 30);

    std::fs::write(&path, "pipeline:\n  stamp_probability: -1\n").unwrap();
    assert!(StudioConfig::load(&path).is_err());
}

#[test]
fn test_load_or_default_without_file() {
    let temp = TempDir::new().unwrap();
    let config = StudioConfig::load_or_default(&temp.path().join("missing.yaml")).unwrap();
    assert_eq!(config, StudioConfig::default());
}

#[test]
fn test_retry_policy_from_config() {
    let policy = StudioConfig::default().generation.retry_policy();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.base_delay, Duration::from_millis(500));
}
