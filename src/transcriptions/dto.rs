use serde::{Deserialize, Serialize};

use crate::transcriptions::repo_types::TranscriptionItem;

/// Body posted by the transcription worker.
#[derive(Debug, Deserialize)]
pub struct AddTranscriptionRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub jobid: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTranscriptionRequest {
    #[serde(default)]
    pub jobid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameTranscriptionRequest {
    #[serde(default)]
    pub jobid: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptionListResponse {
    pub email: String,
    pub transcriptions: Vec<TranscriptionItem>,
}
