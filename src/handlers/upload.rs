use crate::AppState;
use crate::error::{AppError, ErrorBody};
use crate::utils::validation::{is_audio_filename, sanitize_filename};
use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tokio_util::io::ReaderStream;

/// Multipart field name the upload form posts the audio under.
const AUDIO_FIELD: &str = "audiofile";

const NO_FILE_PART: &str = "No file part";
const NO_SELECTED_FILE: &str = "No selected file";
const INVALID_FILE_TYPE: &str = "Invalid file type";

#[utoipa::path(
    post,
    path = "/upload",
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "Audio file in the `audiofile` field"
    ),
    responses(
        (status = 200, description = "Transformed audio attachment, or a plain-text validation message"),
        (status = 422, description = "Input could not be decoded or encoded", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    tag = "audio"
)]
pub async fn upload_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut part: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        // a plain form value under this name is not a file part
        let Some(original) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if original.is_empty() {
            return Ok(validation_reply(NO_SELECTED_FILE));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        part = Some((original, data));
    }

    let Some((original, data)) = part else {
        return Ok(validation_reply(NO_FILE_PART));
    };

    let filename = sanitize_filename(&original);
    if filename.is_empty() {
        return Ok(validation_reply(NO_SELECTED_FILE));
    }
    if !is_audio_filename(&filename) {
        return Ok(validation_reply(INVALID_FILE_TYPE));
    }

    tracing::info!("Transforming \"{}\" ({} bytes)", original, data.len());

    // CPU-bound: decode, resample, and encode off the request thread
    let transform = state.transform.clone();
    let rendered = tokio::task::spawn_blocking(move || transform.apply(&data)?.export())
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("transform task panicked: {e}")))??;

    let artifact = format!("nightcore_{}", filename);
    state.storage.put(&artifact, &rendered).await?;

    if let Err(e) = state.upload_log.record(&original).await {
        tracing::warn!("Failed to append upload log: {}", e);
    }

    // deletion fires whether or not the download below completes
    state.expiry.schedule(artifact.clone());

    let file = state.storage.open(&artifact).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let headers = [
        (header::CONTENT_TYPE, "audio/mp3".to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&artifact)),
    ];

    Ok((headers, body).into_response())
}

/// Validation failures answer 200 with a bare message, not an error status.
fn validation_reply(message: &'static str) -> Response {
    (StatusCode::OK, message).into_response()
}

/// `attachment` disposition, with an RFC 5987 `filename*` parameter when
/// the name is not plain ASCII.
fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        let fallback: String = filename
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            utf8_percent_encode(filename, NON_ALPHANUMERIC)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("nightcore_song.mp3"),
            "attachment; filename=\"nightcore_song.mp3\""
        );
    }

    #[test]
    fn test_content_disposition_unicode() {
        let value = content_disposition("nightcore_日本.mp3");
        assert!(value.starts_with("attachment; filename=\"nightcore___.mp3\""));
        assert!(value.contains("filename*=UTF-8''"));
        assert!(value.is_ascii());
    }
}
