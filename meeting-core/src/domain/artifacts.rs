use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Revision;

/// Platform-reported file kind. Transcript files are `Transcript` and
/// `Timeline`; everything else belongs to the recording (spec §4.7:
/// "transcript files are those with file_type in {TRANSCRIPT, TIMELINE},
/// recording files are all others").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileType {
    Transcript,
    Timeline,
    Video,
    Audio,
    ChatFile,
    #[serde(other)]
    Other,
}

impl FileType {
    pub fn is_transcript_file(self) -> bool {
        matches!(self, FileType::Transcript | FileType::Timeline)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingFile {
    pub file_type: FileType,
    pub download_url: String,
    pub file_size: u64,
}

/// Keyed by the platform's per-session UUID, one record per key (spec §3:
/// "One record per platform UUID (idempotency key)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PastMeetingRecording {
    pub uid: String,
    pub past_meeting_uid: String,
    pub platform_meeting_id: String,
    pub platform_meeting_instance_id: String,
    pub session_start_time: DateTime<Utc>,
    pub session_end_time: DateTime<Utc>,
    pub files: Vec<RecordingFile>,
    pub revision: Revision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PastMeetingTranscript {
    pub uid: String,
    pub past_meeting_uid: String,
    pub platform_meeting_id: String,
    pub platform_meeting_instance_id: String,
    pub session_start_time: DateTime<Utc>,
    pub session_end_time: DateTime<Utc>,
    pub files: Vec<RecordingFile>,
    pub revision: Revision,
}

/// Requires-approval / approved / email_sent are carried from the meeting's
/// platform config at creation time ("summary.completed").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PastMeetingSummary {
    pub uid: String,
    pub past_meeting_uid: String,
    pub platform_meeting_id: String,
    pub platform_meeting_instance_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub doc_url: Option<String>,
    pub requires_approval: bool,
    pub approved: bool,
    pub email_sent: bool,
    pub revision: Revision,
}
