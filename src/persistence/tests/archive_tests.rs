use super::*;
use crate::domain::{Asset, AssetId, AssetImage, AssetKind, CutoutMethod, LogLevel};
use tempfile::TempDir;

fn asset(id: &str, png: Option<Vec<u8>>) -> Asset {
    Asset {
        id: AssetId::from(id),
        kind: AssetKind::Stamp,
        concept: "emblem".to_string(),
        image: png.map(|png| AssetImage {
            width: 2,
            height: 2,
            data: ImageData::Inline { png },
        }),
        cutout: CutoutMethod::FloodFill,
    }
}

fn document_with_log(entries: usize) -> Document {
    let mut doc = Document::new("Export me");
    for i in 0..entries {
        doc.event_log
            .push(EventLogEntry::new(LogLevel::Info, format!("entry {}", i)));
    }
    doc
}

#[test]
fn test_prepare_externalises_inline_images() {
    let mut doc = document_with_log(0);
    doc.assets.push(asset("asset-1", Some(vec![1, 2, 3])));
    doc.assets.push(asset("asset-2", None));
    doc.history.record(&Document::new("before"));

    let bundle = prepare_export(&doc, 10);

    assert_eq!(bundle.images, vec![("assets/asset-1.png".to_string(), vec![1, 2, 3])]);
    let image = bundle.document.assets[0].image.as_ref().unwrap();
    assert_eq!(
        image.data,
        ImageData::File {
            path: "assets/asset-1.png".to_string()
        }
    );
    assert!(bundle.document.assets[1].image.is_none());
    assert!(!bundle.document.history.can_undo());
    // The live document is untouched
    assert!(matches!(
        doc.assets[0].image.as_ref().unwrap().data,
        ImageData::Inline { .. }
    ));
}

#[test]
fn test_prepare_keeps_event_tail() {
    let doc = document_with_log(12);
    let bundle = prepare_export(&doc, 5);

    assert!(bundle.document.event_log.is_empty());
    assert_eq!(bundle.events.len(), 5);
    assert_eq!(bundle.events[0].message, "entry 7");
    assert_eq!(bundle.events_dropped, 7);

    let short = prepare_export(&document_with_log(3), 5);
    assert_eq!(short.events.len(), 3);
    assert_eq!(short.events_dropped, 0);
}

#[test]
fn test_unsafe_asset_ids_become_safe_paths() {
    let mut doc = document_with_log(0);
    doc.assets.push(asset("../../etc/x", Some(vec![9])));

    let bundle = prepare_export(&doc, 0);
    assert_eq!(bundle.images[0].0, "assets/______etc_x.png");
}

#[test]
fn test_colliding_asset_stems_are_suffixed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("deck.zip");
    let mut doc = document_with_log(0);
    doc.assets.push(asset("a.b", Some(vec![1])));
    doc.assets.push(asset("a_b", Some(vec![2])));
    doc.assets.push(asset("a_b", Some(vec![3])));
    doc.assets.push(asset("a_b-2", Some(vec![4])));

    let bundle = prepare_export(&doc, 0);
    let names: Vec<&str> = bundle.images.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "assets/a_b.png",
            "assets/a_b-2.png",
            "assets/a_b-3.png",
            "assets/a_b-2-2.png"
        ]
    );

    let manifest = export_archive(&doc, &path, 0).unwrap();
    assert_eq!(manifest.files.len(), 6);
}

#[test]
fn test_export_writes_all_entries() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out").join("deck.zip");
    let mut doc = document_with_log(4);
    doc.assets.push(asset("asset-1", Some(vec![7; 32])));

    let manifest = export_archive(&doc, &path, 2).unwrap();

    let names: Vec<&str> = manifest.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["document.json", "assets/asset-1.png", "events.json"]);
    assert_eq!(manifest.events_included, 2);
    assert_eq!(manifest.events_dropped, 2);
    assert_eq!(manifest.document_id, doc.id.to_string());
    assert_eq!(manifest.files[1].size, 32);
    assert_eq!(manifest.files[1].sha256.len(), 64);

    assert_eq!(read_manifest(&path).unwrap(), manifest);

    let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
    let mut document_json = String::new();
    archive
        .by_name("document.json")
        .unwrap()
        .read_to_string(&mut document_json)
        .unwrap();
    let exported: Document = serde_json::from_str(&document_json).unwrap();
    assert_eq!(exported.id, doc.id);
    assert!(exported.event_log.is_empty());

    let mut png = Vec::new();
    archive
        .by_name("assets/asset-1.png")
        .unwrap()
        .read_to_end(&mut png)
        .unwrap();
    assert_eq!(png, vec![7; 32]);
}

#[test]
fn test_read_manifest_rejects_non_archive() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("plain.zip");
    std::fs::write(&path, "not a zip").unwrap();
    assert!(read_manifest(&path).is_err());
}
