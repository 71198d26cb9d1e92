use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::ErrorResponse;
use crate::server::state::AppState;
use crate::server::temp_audio::TempAudioFile;

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio";

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript: String,
}

struct AudioUpload {
    filename: String,
    data: Bytes,
}

/// Why an upload was turned away before reaching the transcriber.
enum UploadRejection {
    NoAudioPart,
    NoSelectedFile,
    Multipart { status: StatusCode, message: String },
}

impl IntoResponse for UploadRejection {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::NoAudioPart => (StatusCode::BAD_REQUEST, "No audio part".to_string()),
            Self::NoSelectedFile => (StatusCode::BAD_REQUEST, "No selected file".to_string()),
            Self::Multipart { status, message } => {
                (status, format!("Failed to read multipart: {message}"))
            }
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<MultipartError> for UploadRejection {
    fn from(e: MultipartError) -> Self {
        Self::Multipart {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

impl From<MultipartRejection> for UploadRejection {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Multipart {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// `POST /upload-audio`: transcribe the `audio` file part and return the text.
///
/// The upload is written to a request-scoped temp file that is removed when
/// this handler returns, whatever the outcome.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_audio_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let upload = match read_audio_part(multipart).await {
        Ok(upload) => upload,
        Err(rejection) => {
            if let UploadRejection::Multipart { message, .. } = &rejection {
                tracing::warn!(error = %message, "Failed to read multipart");
            } else {
                tracing::warn!("Upload request without a usable audio file");
            }
            return rejection.into_response();
        }
    };

    tracing::debug!(filename = %upload.filename, bytes = upload.data.len(), "Audio upload received");

    let temp_file = match TempAudioFile::create(&state.upload_dir, &upload.filename, &upload.data).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(error = %e, "Failed to save uploaded audio");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to save uploaded audio: {e}"),
                }),
            )
                .into_response();
        }
    };

    match state.transcriber.transcribe(temp_file.path()).await {
        Ok(transcript) => {
            tracing::info!(chars = transcript.len(), "Transcript returned");
            (StatusCode::OK, Json(TranscriptResponse { transcript })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Transcription failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Finds the `audio` file part. A part named `audio` without a filename is a
/// plain form value and is skipped.
async fn read_audio_part(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<AudioUpload, UploadRejection> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if filename.is_empty() {
            return Err(UploadRejection::NoSelectedFile);
        }

        let data = field.bytes().await?;
        return Ok(AudioUpload { filename, data });
    }

    Err(UploadRejection::NoAudioPart)
}
