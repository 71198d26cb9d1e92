use std::path::PathBuf;
use std::sync::Arc;

use crate::transcription::Transcriber;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub transcriber: Arc<dyn Transcriber>,
    pub upload_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(transcriber: Arc<dyn Transcriber>, upload_dir: PathBuf) -> Self {
        Self {
            transcriber,
            upload_dir: Arc::new(upload_dir),
        }
    }
}
