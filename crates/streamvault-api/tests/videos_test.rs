mod helpers;

use axum::http::StatusCode;
use helpers::{api_path, setup_test_app, setup_test_app_with, upload_form, upload_video, video_bytes, CopyTranscoder};

#[tokio::test]
async fn test_upload_derives_available_tiers() {
    let app = setup_test_app().await;

    let video = upload_video(&app, "Demo", video_bytes(64 * 1024), "clip.mp4", "video/mp4").await;

    assert_eq!(video["title"], "Demo");
    assert_eq!(video["original_file_name"], "clip.mp4");
    assert_eq!(video["content_type"], "video/mp4");
    assert_eq!(video["file_size_bytes"], 64 * 1024);
    assert_eq!(video["available_qualities"], serde_json::json!(["original", "720p"]));
    // Storage paths never leave the server
    assert!(video.get("original_path").is_none());

    // Original plus the 720p artifact; the failed 1080p encode left nothing behind.
    let files = app.stored_files();
    assert_eq!(files.len(), 2, "unexpected files: {:?}", files);
    assert!(files
        .iter()
        .any(|f| f.to_string_lossy().ends_with("_720p.mp4")));
    assert!(!files
        .iter()
        .any(|f| f.to_string_lossy().contains("_1080p")));
}

#[tokio::test]
async fn test_get_video_lists_stream_urls() {
    let app = setup_test_app().await;
    let video = upload_video(&app, "Demo", video_bytes(1024), "clip.mp4", "video/mp4").await;
    let id = video["id"].as_str().unwrap();

    let response = app.server.get(&api_path(&format!("/videos/{}", id))).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["video"]["id"], id);
    assert_eq!(
        body["available_qualities"],
        serde_json::json!({
            "original": format!("/api/videos/{}/stream", id),
            "720p": format!("/api/videos/{}/stream?quality=720p", id),
        })
    );
}

#[tokio::test]
async fn test_stream_resolves_quality_with_fallback() {
    let app = setup_test_app().await;
    let data = video_bytes(32 * 1024);
    let video = upload_video(&app, "Holiday", data.clone(), "holiday.mov", "video/quicktime").await;
    let id = video["id"].as_str().unwrap();
    let stream_path = api_path(&format!("/videos/{}/stream", id));

    // No quality: the original with its declared type
    let response = app.server.get(&stream_path).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "video/quicktime");
    assert_eq!(
        response.header("content-disposition"),
        "inline; filename=\"holiday.mov\""
    );
    assert_eq!(response.header("content-length"), data.len().to_string().as_str());
    assert_eq!(response.as_bytes().as_ref(), data.as_slice());

    // Derived tier: fixed transcoded type
    let response = app
        .server
        .get(&stream_path)
        .add_query_param("quality", "720p")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "video/mp4");
    assert_eq!(response.as_bytes().as_ref(), data.as_slice());

    // Failed and unknown tiers fall back to the original
    for quality in ["1080p", "4k"] {
        let response = app
            .server
            .get(&stream_path)
            .add_query_param("quality", quality)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.header("content-type"), "video/quicktime");
    }
}

#[tokio::test]
async fn test_stream_missing_file_is_not_found() {
    let app = setup_test_app().await;
    let video = upload_video(&app, "Demo", video_bytes(1024), "clip.mp4", "video/mp4").await;
    let id = video["id"].as_str().unwrap();

    for file in app.stored_files() {
        std::fs::remove_file(file).unwrap();
    }

    let response = app
        .server
        .get(&api_path(&format!("/videos/{}/stream", id)))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_upload_rejects_non_video() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post(&api_path("/videos/upload"))
        .multipart(upload_form("Notes", b"hello".to_vec(), "notes.txt", "text/plain"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["error"], "File must be a video");
    assert_eq!(body["recoverable"], false);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_rejects_empty_file_and_missing_fields() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post(&api_path("/videos/upload"))
        .multipart(upload_form("Empty", Vec::new(), "empty.mp4", "video/mp4"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post(&api_path("/videos/upload"))
        .multipart(axum_test::multipart::MultipartForm::new().add_text("title", "No file"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "No file provided");

    let part = axum_test::multipart::Part::bytes(bytes::Bytes::from(video_bytes(16)))
        .file_name("clip.mp4")
        .mime_type("video/mp4");
    let response = app
        .server
        .post(&api_path("/videos/upload"))
        .multipart(axum_test::multipart::MultipartForm::new().add_part("file", part))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let list: serde_json::Value = app.server.get(&api_path("/videos")).await.json();
    assert_eq!(list, serde_json::json!([]));
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_too_large_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .server
        .post(&api_path("/videos/upload"))
        .multipart(upload_form(
            "Big",
            video_bytes(1024 * 1024 + 1),
            "big.mp4",
            "video/mp4",
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_delete_removes_record_and_files() {
    let app = setup_test_app().await;
    let video = upload_video(&app, "Demo", video_bytes(2048), "clip.mp4", "video/mp4").await;
    let id = video["id"].as_str().unwrap();
    assert_eq!(app.stored_files().len(), 2);

    let response = app
        .server
        .delete(&api_path(&format!("/videos/{}", id)))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert!(app.stored_files().is_empty());

    let response = app.server.get(&api_path(&format!("/videos/{}", id))).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app
        .server
        .get(&api_path(&format!("/videos/{}/stream", id)))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    // Deleting again is still a success
    let response = app
        .server
        .delete(&api_path(&format!("/videos/{}", id)))
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_get_unknown_video() {
    let app = setup_test_app().await;

    let response = app
        .server
        .get(&api_path(&format!("/videos/{}", uuid::Uuid::new_v4())))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["error"], "Video not found");

    let response = app.server.get(&api_path("/videos/not-a-uuid")).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let app = setup_test_app().await;
    let first = upload_video(&app, "First", video_bytes(512), "a.mp4", "video/mp4").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = upload_video(&app, "Second", video_bytes(512), "b.mp4", "video/mp4").await;

    let list: serde_json::Value = app.server.get(&api_path("/videos")).await.json();
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap())
        .collect();

    assert_eq!(
        ids,
        vec![second["id"].as_str().unwrap(), first["id"].as_str().unwrap()]
    );
}

#[tokio::test]
async fn test_every_tier_failing_still_uploads() {
    let app = setup_test_app_with(CopyTranscoder::failing(&["720p", "1080p"])).await;

    let video = upload_video(&app, "Demo", video_bytes(1024), "clip.mp4", "video/mp4").await;

    assert_eq!(video["available_qualities"], serde_json::json!(["original"]));
    assert_eq!(app.stored_files().len(), 1);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = setup_test_app().await;

    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "alive");

    let response = app.server.get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let doc: serde_json::Value = response.json();
    assert!(doc["paths"]["/api/videos/upload"].is_object());
}
