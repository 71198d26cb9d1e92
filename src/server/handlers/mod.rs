mod health;
mod upload_audio;

pub use health::health_handler;
pub use upload_audio::upload_audio_handler;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
