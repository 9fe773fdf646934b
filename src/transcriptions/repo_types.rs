use serde::Serialize;
use sqlx::FromRow;

/// Metadata of one transcription job.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Transcription {
    pub job_id: String,
    pub owner_email: String,
    pub created_at: i64,
    pub filename: String,
}

/// Result of the service-side insert, decided inside one transaction.
#[derive(Debug, PartialEq)]
pub enum AddOutcome {
    Added(Transcription),
    DuplicateJob,
    UnknownOwner,
}

#[derive(Debug, Serialize)]
pub struct TranscriptionItem {
    pub jobid: String,
    pub filename: String,
    pub created_at: i64,
}

impl From<Transcription> for TranscriptionItem {
    fn from(t: Transcription) -> Self {
        Self {
            jobid: t.job_id,
            filename: t.filename,
            created_at: t.created_at,
        }
    }
}
