use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use nightcore_backend::config::AppConfig;
use nightcore_backend::services::expiry::ExpiryService;
use nightcore_backend::services::storage::{ArtifactStore, LocalArtifactStore};
use nightcore_backend::services::transform::{AudioTransform, NightcoreTransform};
use nightcore_backend::services::upload_log::UploadLog;
use nightcore_backend::{AppState, create_app};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

fn test_state(dir: &TempDir, delete_delay: Duration) -> AppState {
    let config = AppConfig {
        storage_dir: dir.path().join("storage"),
        upload_log: dir.path().join("upload.log"),
        delete_delay,
        ..AppConfig::default()
    };

    let storage: Arc<dyn ArtifactStore> =
        Arc::new(LocalArtifactStore::new(config.storage_dir.clone()));
    let transform: Arc<dyn AudioTransform> = Arc::new(NightcoreTransform::new(config.tones));
    let expiry = ExpiryService::new(storage.clone(), config.delete_delay);
    let upload_log = Arc::new(UploadLog::new(config.upload_log.clone(), config.timezone));

    AppState {
        config,
        storage,
        transform,
        expiry,
        upload_log,
    }
}

/// Half a second of 440 Hz mono sine, 16-bit WAV.
fn sine_wav() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
    for i in 0..22050 {
        let t = i as f32 / 44100.0;
        let sample = (2.0 * std::f32::consts::PI * 440.0 * t).sin();
        writer.write_sample((sample * 0.5 * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
    cursor.into_inner()
}

fn multipart_request(field: &str, filename: Option<&str>, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    match filename {
        Some(name) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
        ),
    }
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn stored_artifacts(state: &AppState) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(mut entries) = tokio::fs::read_dir(&state.config.storage_dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names
}

#[tokio::test]
async fn test_missing_file_part() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, Duration::from_secs(60));
    let app = create_app(state.clone());

    let response = app
        .oneshot(multipart_request("notes", None, b"text, not a file"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"No file part");
    assert!(stored_artifacts(&state).await.is_empty());
    assert_eq!(state.expiry.pending(), 0);
}

#[tokio::test]
async fn test_empty_filename() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, Duration::from_secs(60));
    let app = create_app(state.clone());

    let response = app
        .oneshot(multipart_request("audiofile", Some(""), b""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"No selected file");
    assert!(stored_artifacts(&state).await.is_empty());
}

#[tokio::test]
async fn test_invalid_file_type() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, Duration::from_secs(60));
    let app = create_app(state.clone());

    let response = app
        .oneshot(multipart_request(
            "audiofile",
            Some("notes.txt"),
            b"plain text pretending to be a song",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"Invalid file type");
    assert!(stored_artifacts(&state).await.is_empty());
    assert_eq!(state.expiry.pending(), 0);
}

#[tokio::test]
async fn test_upload_success() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, Duration::from_secs(60));
    let app = create_app(state.clone());

    let response = app
        .oneshot(multipart_request("audiofile", Some("song.wav"), &sine_wav()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "audio/mp3"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(disposition, "attachment; filename=\"nightcore_song.wav\"");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(!body.is_empty());
    // MP3 frame sync
    assert_eq!(body[0], 0xFF);

    assert!(state.storage.exists("nightcore_song.wav").await);
    assert_eq!(state.expiry.pending(), 1);

    let log = tokio::fs::read_to_string(&state.config.upload_log)
        .await
        .unwrap();
    assert!(log.starts_with("Uploaded \"song.wav\" @ "));
}

#[tokio::test]
async fn test_transform_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, Duration::from_secs(60));
    let app = create_app(state.clone());

    let response = app
        .oneshot(multipart_request(
            "audiofile",
            Some("broken.mp3"),
            b"an audio filename over bytes no decoder recognizes",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("Audio processing failed"));

    assert!(stored_artifacts(&state).await.is_empty());
    assert_eq!(state.expiry.pending(), 0);
}

// Two uploads of the same filename inside the deletion window share one
// storage path and one expiry timer. Which request's bytes win is
// intentionally unspecified (last writer wins); the assertions below
// only pin down what IS guaranteed.
#[tokio::test]
async fn test_same_filename_uploads_coalesce() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir, Duration::from_secs(60));
    let app = create_app(state.clone());

    let wav = sine_wav();
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(multipart_request("audiofile", Some("song.wav"), &wav))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(stored_artifacts(&state).await, vec!["nightcore_song.wav"]);
    assert_eq!(state.expiry.pending(), 1);
}
