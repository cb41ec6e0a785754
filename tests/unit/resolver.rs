#[path = "../support/mod.rs"]
mod support;

use line_responder::catalog::ReplyCatalog;
use line_responder::config::DEFAULT_VIDEO_PREVIEW_URL;
use line_responder::media::{MediaKind, MediaStore};
use line_responder::resolver::ReplyResolver;
use line_responder::types::{ContentDescriptor, ContentProvider, InboundMessage};
use line_responder::{Error, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use support::{sample_catalog_json, RecordingPlatform};
use tempfile::TempDir;

const BASE_URL: &str = "https://bot.example.com";

fn resolver_with(platform: Arc<RecordingPlatform>) -> (ReplyResolver, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let catalog = ReplyCatalog::from_json_str(sample_catalog_json()).unwrap();
    let media = MediaStore::new(dir.path(), Some(BASE_URL.to_string()));
    let resolver = ReplyResolver::new(
        Arc::new(catalog),
        media,
        platform,
        DEFAULT_VIDEO_PREVIEW_URL,
    );
    (resolver, dir)
}

fn message(value: Value) -> InboundMessage {
    serde_json::from_value(value).unwrap()
}

async fn resolve_json(resolver: &ReplyResolver, msg: &InboundMessage) -> Result<Vec<Value>> {
    let replies = resolver.resolve(msg).await?;
    Ok(replies
        .iter()
        .map(|r| serde_json::to_value(r).unwrap())
        .collect())
}

#[tokio::test]
async fn test_catalog_hit_returns_payloads_unchanged() {
    let (resolver, _dir) = resolver_with(Arc::new(RecordingPlatform::new()));
    let expected: Value = serde_json::from_str(sample_catalog_json()).unwrap();

    for key in ["Confirm template", "測試1"] {
        let msg = message(json!({"id": "1", "type": "text", "text": key}));
        let replies = resolve_json(&resolver, &msg).await.unwrap();
        let wanted = match &expected[key] {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        assert_eq!(replies, wanted, "payloads for {key}");
    }
}

#[tokio::test]
async fn test_catalog_miss_echoes_verbatim() {
    let (resolver, _dir) = resolver_with(Arc::new(RecordingPlatform::new()));
    for text in ["hello", "confirm template", "  spaced  ", "多行\n文字", ""] {
        let msg = message(json!({"id": "1", "type": "text", "text": text}));
        let replies = resolve_json(&resolver, &msg).await.unwrap();
        assert_eq!(replies, vec![json!({"type": "text", "text": text})]);
    }
}

#[tokio::test]
async fn test_external_image_passes_urls_through_without_fetch() {
    let platform = Arc::new(RecordingPlatform::new());
    let (resolver, _dir) = resolver_with(platform.clone());
    let msg = message(json!({
        "id": "325708",
        "type": "image",
        "contentProvider": {
            "type": "external",
            "originalContentUrl": "https://cdn.example.com/u1.jpg",
            "previewImageUrl": "https://cdn.example.com/u2.jpg"
        }
    }));

    let replies = resolve_json(&resolver, &msg).await.unwrap();
    assert_eq!(
        replies,
        vec![json!({
            "type": "image",
            "originalContentUrl": "https://cdn.example.com/u1.jpg",
            "previewImageUrl": "https://cdn.example.com/u2.jpg"
        })]
    );
    assert!(platform.fetches().is_empty());
}

#[tokio::test]
async fn test_platform_image_is_rehosted() {
    let platform = Arc::new(RecordingPlatform::new().with_content("M123", &[b"jpeg"]));
    let (resolver, dir) = resolver_with(platform.clone());
    let msg = message(json!({"id": "M123", "type": "image", "contentProvider": {"type": "line"}}));

    let replies = resolve_json(&resolver, &msg).await.unwrap();
    let url = format!("{BASE_URL}/downloaded/M123.jpg");
    assert_eq!(
        replies,
        vec![json!({"type": "image", "originalContentUrl": url, "previewImageUrl": url})]
    );
    assert_eq!(platform.fetches(), vec!["M123".to_string()]);
    assert_eq!(std::fs::read(dir.path().join("M123.jpg")).unwrap(), b"jpeg".to_vec());
}

#[tokio::test]
async fn test_platform_video_uses_placeholder_preview() {
    let platform = Arc::new(RecordingPlatform::new().with_content("V9", &[b"mp4"]));
    let (resolver, dir) = resolver_with(platform);
    let msg = message(json!({
        "id": "V9", "type": "video", "duration": 60000, "contentProvider": {"type": "line"}
    }));

    let replies = resolve_json(&resolver, &msg).await.unwrap();
    assert_eq!(
        replies,
        vec![json!({
            "type": "video",
            "originalContentUrl": format!("{BASE_URL}/downloaded/V9.mp4"),
            "previewImageUrl": DEFAULT_VIDEO_PREVIEW_URL
        })]
    );
    assert!(dir.path().join("V9.mp4").exists());
}

#[tokio::test]
async fn test_platform_audio_keeps_duration() {
    let platform = Arc::new(RecordingPlatform::new().with_content("A7", &[b"m4a"]));
    let (resolver, dir) = resolver_with(platform);
    let msg = message(json!({
        "id": "A7", "type": "audio", "duration": 27000, "contentProvider": {"type": "line"}
    }));

    let replies = resolve_json(&resolver, &msg).await.unwrap();
    assert_eq!(
        replies,
        vec![json!({
            "type": "audio",
            "originalContentUrl": format!("{BASE_URL}/downloaded/A7.m4a"),
            "duration": 27000
        })]
    );
    assert!(dir.path().join("A7.m4a").exists());
}

#[tokio::test]
async fn test_external_media_missing_previews() {
    let platform = Arc::new(RecordingPlatform::new());
    let (resolver, _dir) = resolver_with(platform.clone());

    let image = message(json!({
        "id": "1", "type": "image",
        "contentProvider": {"type": "external", "originalContentUrl": "https://cdn.example.com/i.jpg"}
    }));
    let replies = resolve_json(&resolver, &image).await.unwrap();
    assert_eq!(replies[0]["previewImageUrl"], "https://cdn.example.com/i.jpg");

    let video = message(json!({
        "id": "2", "type": "video",
        "contentProvider": {"type": "external", "originalContentUrl": "https://cdn.example.com/v.mp4"}
    }));
    let replies = resolve_json(&resolver, &video).await.unwrap();
    assert_eq!(replies[0]["previewImageUrl"], DEFAULT_VIDEO_PREVIEW_URL);

    let audio = message(json!({
        "id": "3", "type": "audio", "duration": 1500,
        "contentProvider": {"type": "external", "originalContentUrl": "https://cdn.example.com/a.m4a"}
    }));
    let replies = resolve_json(&resolver, &audio).await.unwrap();
    assert_eq!(
        replies,
        vec![json!({"type": "audio", "originalContentUrl": "https://cdn.example.com/a.m4a", "duration": 1500})]
    );

    assert!(platform.fetches().is_empty());
}

#[tokio::test]
async fn test_location_round_trip() {
    let (resolver, _dir) = resolver_with(Arc::new(RecordingPlatform::new()));
    let msg = message(json!({
        "id": "325708",
        "type": "location",
        "title": "my location",
        "address": "〒150-0002 東京都渋谷区渋谷２丁目２１−１",
        "latitude": 35.65910807942215,
        "longitude": 139.70372892916203
    }));

    let replies = resolve_json(&resolver, &msg).await.unwrap();
    assert_eq!(
        replies,
        vec![json!({
            "type": "location",
            "title": "my location",
            "address": "〒150-0002 東京都渋谷区渋谷２丁目２１−１",
            "latitude": 35.65910807942215,
            "longitude": 139.70372892916203
        })]
    );
}

#[tokio::test]
async fn test_location_coordinates_keep_their_text() {
    let (resolver, _dir) = resolver_with(Arc::new(RecordingPlatform::new()));
    let msg: InboundMessage = serde_json::from_str(
        r#"{"id": "325708", "type": "location", "title": "my location",
            "latitude": 35.65910807942215, "longitude": 139.70372892916203}"#,
    )
    .unwrap();

    let replies = resolver.resolve(&msg).await.unwrap();
    let rendered = serde_json::to_string(&replies[0]).unwrap();
    assert_eq!(
        rendered,
        r#"{"type":"location","title":"my location","latitude":35.65910807942215,"longitude":139.70372892916203}"#
    );
}

#[tokio::test]
async fn test_sticker_round_trip() {
    let (resolver, _dir) = resolver_with(Arc::new(RecordingPlatform::new()));
    let msg = message(json!({
        "id": "325708", "type": "sticker", "packageId": "446", "stickerId": "1988",
        "stickerResourceType": "ANIMATION"
    }));

    let replies = resolve_json(&resolver, &msg).await.unwrap();
    assert_eq!(
        replies,
        vec![json!({"type": "sticker", "packageId": "446", "stickerId": "1988"})]
    );
}

#[tokio::test]
async fn test_unknown_message_kind_is_unrecognized() {
    let (resolver, _dir) = resolver_with(Arc::new(RecordingPlatform::new()));
    let msg = message(json!({"id": "1", "type": "file", "fileName": "a.pdf"}));
    let err = resolver.resolve(&msg).await.unwrap_err();
    assert!(matches!(err, Error::UnrecognizedKind { .. }));
}

#[tokio::test]
async fn test_missing_content_is_fetch_failure() {
    let platform = Arc::new(RecordingPlatform::new());
    let (resolver, _dir) = resolver_with(platform.clone());
    let msg = message(json!({"id": "gone", "type": "image", "contentProvider": {"type": "line"}}));
    let err = resolver.resolve(&msg).await.unwrap_err();
    assert!(matches!(err, Error::ContentFetch { .. }));
    assert_eq!(platform.fetches(), vec!["gone".to_string()]);
}

#[tokio::test]
async fn test_resolve_content_descriptor_variants() {
    let platform = Arc::new(RecordingPlatform::new().with_content("X1", &[b"x"]));
    let (resolver, _dir) = resolver_with(platform);

    let rehosted = resolver
        .resolve_content("X1", MediaKind::Audio, &ContentProvider::Line)
        .await
        .unwrap();
    assert_eq!(
        rehosted,
        ContentDescriptor::Rehosted {
            original: format!("{BASE_URL}/downloaded/X1.m4a"),
            preview: None,
        }
    );

    let external = resolver
        .resolve_content(
            "X2",
            MediaKind::Image,
            &ContentProvider::External {
                original_content_url: "https://cdn.example.com/o.jpg".to_string(),
                preview_image_url: Some("https://cdn.example.com/p.jpg".to_string()),
            },
        )
        .await
        .unwrap();
    assert!(!external.is_rehosted());
    assert_eq!(external.preview(), Some("https://cdn.example.com/p.jpg"));
}
