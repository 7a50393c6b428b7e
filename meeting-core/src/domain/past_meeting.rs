use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Committee, Platform, Revision};

/// One platform-side continuous period within a [`PastMeeting`], identified
/// by the platform's per-instance UUID (spec §3, GLOSSARY "Session").
/// Duplicate `uid`s are never appended; the aggregator (C7) always
/// overwrites the matching session in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// A historical record of one realized instance of a meeting (spec §3,
/// "PastMeeting"). Invariant: `(platform_meeting_id, occurrence_id)`
/// uniquely identifies a `PastMeeting` (enforced by the repository's
/// secondary index, C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PastMeeting {
    pub uid: String,
    pub meeting_uid: String,
    pub occurrence_id: String,
    pub scheduled_start_time: DateTime<Utc>,
    pub scheduled_end_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub timezone: String,
    pub title: String,
    pub description: String,
    pub committees: Vec<Committee>,
    pub platform: Platform,
    pub platform_meeting_id: String,
    pub sessions: Vec<Session>,
    pub recording_uids: Vec<String>,
    pub transcript_uids: Vec<String>,
    pub summary_uids: Vec<String>,
    pub revision: Revision,
}

impl PastMeeting {
    pub fn session_mut(&mut self, uid: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.uid == uid)
    }

    /// Overwrite the session with matching `uid` in place, or append a new
    /// one ("overwrite it in place; if absent, append").
    pub fn upsert_session(&mut self, session: Session) {
        if let Some(existing) = self.session_mut(&session.uid) {
            *existing = session;
        } else {
            self.sessions.push(session);
        }
    }

    pub fn has_recording(&self, uid: &str) -> bool {
        self.recording_uids.iter().any(|u| u == uid)
    }

    pub fn has_transcript(&self, uid: &str) -> bool {
        self.transcript_uids.iter().any(|u| u == uid)
    }

    pub fn has_summary(&self, uid: &str) -> bool {
        self.summary_uids.iter().any(|u| u == uid)
    }
}
