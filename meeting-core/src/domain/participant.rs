use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Revision;

/// One join/leave window for a [`PastMeetingParticipant`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSession {
    pub uid: String,
    pub join_time: Option<DateTime<Utc>>,
    pub leave_time: Option<DateTime<Utc>>,
    pub leave_reason: Option<String>,
}

/// A realized attendee captured after the fact (spec §3,
/// "PastMeetingParticipant"). Invariant: at most one participant per
/// `(past_meeting_uid, email)`, compared case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PastMeetingParticipant {
    pub uid: String,
    pub past_meeting_uid: String,
    pub meeting_uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_invited: bool,
    pub is_attended: bool,
    pub sessions: Vec<ParticipantSession>,
    pub revision: Revision,
}

impl PastMeetingParticipant {
    pub fn email_key(&self) -> String {
        self.email.to_ascii_lowercase()
    }

    pub fn full_name_key(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).to_ascii_lowercase()
    }

    pub fn session_mut(&mut self, uid: &str) -> Option<&mut ParticipantSession> {
        self.sessions.iter_mut().find(|s| s.uid == uid)
    }
}
