//! Simulated generation used offline and after a quota fallback.
//!
//! Output is a pure function of the request, so runs are reproducible.

use super::errors::GenerationError;
use super::service::GenerationService;
use super::types::{ConceptSpec, GenerationKind, GenerationOutput, GenerationRequest};
use crate::domain::AssetKind;
use crate::segmentation::encode_png;
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Clone, Default)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GenerationService for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        match &request.kind {
            GenerationKind::Concepts { count } => Ok(GenerationOutput::Concepts {
                concepts: concepts(&request.prompt, *count),
            }),
            GenerationKind::Image { width, height } => {
                let png = encode_png(&motif(&request.prompt, *width, *height)).map_err(|e| {
                    GenerationError::Failed {
                        message: e.to_string(),
                    }
                })?;
                Ok(GenerationOutput::Image { png })
            }
            GenerationKind::Copy { fields } => Ok(GenerationOutput::Copy {
                fields: copy(&request.prompt, fields),
            }),
        }
    }
}

/// One background first, then a stamp, then illustrations.
fn concepts(prompt: &str, count: usize) -> Vec<ConceptSpec> {
    let subject = first_line(prompt);
    (0..count)
        .map(|i| {
            let kind = match i {
                0 => AssetKind::Background,
                1 => AssetKind::Stamp,
                _ => AssetKind::Illustration,
            };
            let description = match kind {
                AssetKind::Background => format!("Soft textured backdrop for {}", subject),
                AssetKind::Stamp => format!("Round emblem for {}", subject),
                AssetKind::Illustration => format!("Spot illustration {} for {}", i - 1, subject),
            };
            ConceptSpec {
                kind,
                description,
                cutout: kind != AssetKind::Background,
            }
        })
        .collect()
}

/// A filled disc on a white page, tinted from the prompt's digest.
fn motif(prompt: &str, width: u32, height: u32) -> RgbaImage {
    let digest = Sha256::digest(prompt.as_bytes());
    let ink = Rgba([digest[0] / 2, digest[1] / 2, digest[2] / 2, 255]);
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let radius = width.min(height) as f32 * 0.3;
    RgbaImage::from_fn(width, height, |x, y| {
        let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
        if dx * dx + dy * dy <= radius * radius {
            ink
        } else {
            PAPER
        }
    })
}

fn copy(prompt: &str, fields: &[String]) -> BTreeMap<String, String> {
    let subject = first_line(prompt);
    fields
        .iter()
        .map(|field| {
            let text = match field.as_str() {
                "headline" => subject.to_string(),
                "body" => format!("Key points about {}.", subject.to_lowercase()),
                other => format!("{}: {}", other, subject),
            };
            (field.clone(), text)
        })
        .collect()
}

fn first_line(prompt: &str) -> &str {
    prompt.lines().next().unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::decode_png;

    fn request(kind: GenerationKind, prompt: &str) -> GenerationRequest {
        GenerationRequest {
            kind,
            prompt: prompt.to_string(),
            model: "offline".to_string(),
        }
    }

    #[tokio::test]
    async fn test_concepts_mix_kinds() {
        let out = OfflineGenerator::new()
            .generate(&request(GenerationKind::Concepts { count: 4 }, "Quarterly review"))
            .await
            .unwrap()
            .into_concepts()
            .unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out[0].kind, AssetKind::Background);
        assert!(!out[0].cutout);
        assert_eq!(out[1].kind, AssetKind::Stamp);
        assert!(out[1].cutout);
        assert_eq!(out[3].kind, AssetKind::Illustration);
    }

    #[tokio::test]
    async fn test_image_is_deterministic_png() {
        let generator = OfflineGenerator::new();
        let req = request(
            GenerationKind::Image {
                width: 32,
                height: 24,
            },
            "emblem",
        );
        let a = generator.generate(&req).await.unwrap().into_image().unwrap();
        let b = generator.generate(&req).await.unwrap().into_image().unwrap();
        assert_eq!(a, b);

        let decoded = decode_png(&a).unwrap();
        assert_eq!(decoded.dimensions(), (32, 24));
        assert_eq!(*decoded.get_pixel(0, 0), PAPER);
        assert_ne!(*decoded.get_pixel(16, 12), PAPER);
    }

    #[tokio::test]
    async fn test_copy_fills_requested_fields() {
        let fields = vec!["headline".to_string(), "body".to_string()];
        let out = OfflineGenerator::new()
            .generate(&request(GenerationKind::Copy { fields }, "Roadmap\nextra"))
            .await
            .unwrap()
            .into_copy()
            .unwrap();
        assert_eq!(out["headline"], "Roadmap");
        assert_eq!(out["body"], "Key points about roadmap.");
    }
}
