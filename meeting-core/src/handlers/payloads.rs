//! Typed per-subject payload structs ("Dynamic JSON re-marshal
//! of a generic 'data' field ... in a typed implementation, deserialize the
//! envelope into a sum type tagged by event kind, with per-variant typed
//! payload").
//!
//! Every handler in this module parses the raw message bytes into one of
//! these structs rather than holding onto an untyped [`serde_json::Value`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::Meeting;
use crate::errors::{CoreError, Result};

/// Parse `bytes` as JSON into `T`, mapping a parse failure to
/// [`crate::errors::Kind::Validation`] ("malformed payload").
pub fn parse_json<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|err| CoreError::wrap(crate::errors::Kind::Validation, "malformed payload", err))
}

// --- meeting.get_title -----------------------------------------------------

/// `meeting.get_title` carries only a UUID byte string, not a JSON envelope
/// ("input is a UUID byte string"). No struct to parse — the
/// handler validates the raw bytes directly.
pub fn parse_meeting_uid(bytes: &[u8]) -> Result<uuid::Uuid> {
    let raw = std::str::from_utf8(bytes)
        .map_err(|_| CoreError::validation("meeting uid is not valid utf-8"))?;
    uuid::Uuid::parse_str(raw.trim())
        .map_err(|_| CoreError::validation(format!("'{raw}' is not a valid UUID")))
}

// --- meeting.* lifecycle ----------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MeetingDeletedPayload {
    pub meeting_uid: String,
}

#[derive(Debug, Deserialize)]
pub struct MeetingCreatedPayload {
    pub meeting: Meeting,
}

#[derive(Debug, Deserialize)]
pub struct MeetingUpdatedPayload {
    pub previous: Meeting,
    pub updated: Meeting,
    /// Field name -> new value, empty when nothing user-visible changed
    /// ("If `changes` map is non-empty ...").
    #[serde(default)]
    pub changes: HashMap<String, Value>,
}

// --- committee_member.* -----------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CommitteeMemberCreatedPayload {
    pub committee_uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub voting_status: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitteeMemberUpdatedPayload {
    pub committee_uid: String,
    pub old_email: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub voting_status: String,
}

#[derive(Debug, Deserialize)]
pub struct CommitteeMemberDeletedPayload {
    pub committee_uid: String,
    pub email: String,
}

// --- project_settings.updated ------------------------------------------------

/// Roles whose membership changes drive organizer cleanup ("for each role
/// in {writer, meeting_coordinator}").
#[derive(Debug, Deserialize)]
pub struct ProjectSettingsUpdatedPayload {
    pub project_uid: String,
    #[serde(default)]
    pub removed_writers: Vec<String>,
    #[serde(default)]
    pub removed_meeting_coordinators: Vec<String>,
}

impl ProjectSettingsUpdatedPayload {
    /// Usernames removed from *any* organizer-granting role, deduplicated
    /// ("compute the usernames removed from that role").
    pub fn removed_organizer_usernames(&self) -> Vec<String> {
        let mut removed: Vec<String> = self
            .removed_writers
            .iter()
            .chain(self.removed_meeting_coordinators.iter())
            .cloned()
            .collect();
        removed.sort();
        removed.dedup();
        removed
    }
}

// --- zoom.webhook.* envelope -------------------------------------------------

/// Generic envelope every Zoom webhook is wrapped in ("the generic
/// envelope has `{event_type, event_ts, payload.object}`"). `object` stays
/// untyped here and is converted to a per-subject typed payload by the
/// handler, since its shape depends on which subject the dispatcher already
/// routed on ("deserialize the envelope into a sum type tagged by
/// event kind, with per-variant typed payload").
#[derive(Debug, Deserialize)]
pub struct ZoomEnvelope {
    pub event_type: String,
    pub event_ts: DateTime<Utc>,
    pub payload: ZoomEnvelopeBody,
}

#[derive(Debug, Deserialize)]
pub struct ZoomEnvelopeBody {
    pub object: Value,
}

impl ZoomEnvelope {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        parse_json(bytes)
    }

    pub fn object_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        serde_json::from_value(self.payload.object.clone()).map_err(|err| {
            CoreError::wrap(
                crate::errors::Kind::Validation,
                format!("malformed {} object", self.event_type),
                err,
            )
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ZoomMeetingStartedObject {
    pub id: String,
    pub uuid: String,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ZoomMeetingEndedObject {
    pub id: String,
    pub uuid: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ZoomMeetingDeletedObject {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ZoomParticipantJoinedObject {
    pub id: String,
    /// The actual (possibly rescheduled) start time of this instance, used
    /// for occurrence binding.
    pub start_time: DateTime<Utc>,
    pub participant: ZoomParticipantJoined,
}

#[derive(Debug, Deserialize)]
pub struct ZoomParticipantJoined {
    pub participant_uuid: String,
    pub user_name: String,
    pub email: Option<String>,
    pub join_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ZoomParticipantLeftObject {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub participant: ZoomParticipantLeft,
}

#[derive(Debug, Deserialize)]
pub struct ZoomParticipantLeft {
    pub participant_uuid: String,
    pub user_name: String,
    pub email: Option<String>,
    pub leave_time: DateTime<Utc>,
    pub leave_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ZoomRecordingCompletedObject {
    pub id: String,
    pub uuid: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub recording_files: Vec<ZoomRecordingFileObject>,
}

#[derive(Debug, Deserialize)]
pub struct ZoomRecordingFileObject {
    pub file_type: String,
    pub download_url: String,
    pub file_size: u64,
}

#[derive(Debug, Deserialize)]
pub struct ZoomTranscriptCompletedObject {
    pub id: String,
    pub uuid: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub recording_files: Vec<ZoomRecordingFileObject>,
}

#[derive(Debug, Deserialize)]
pub struct ZoomSummaryCompletedObject {
    pub id: String,
    pub uuid: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub summary_title: String,
    pub summary_content: String,
    pub summary_doc_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zoom_envelope_and_object() {
        let raw = serde_json::json!({
            "event_type": "meeting.started",
            "event_ts": "2024-03-01T10:01:07Z",
            "payload": {
                "object": {
                    "id": "99",
                    "uuid": "u1",
                    "start_time": "2024-03-01T10:01:07Z",
                }
            }
        });
        let envelope = ZoomEnvelope::parse(raw.to_string().as_bytes()).unwrap();
        assert_eq!(envelope.event_type, "meeting.started");
        let object: ZoomMeetingStartedObject = envelope.object_as().unwrap();
        assert_eq!(object.id, "99");
        assert_eq!(object.uuid, "u1");
    }

    #[test]
    fn meeting_uid_rejects_non_uuid_input() {
        let err = parse_meeting_uid(b"not-a-uuid").unwrap_err();
        assert_eq!(err.kind(), crate::errors::Kind::Validation);
    }

    #[test]
    fn meeting_uid_accepts_valid_uuid() {
        let uid = uuid::Uuid::new_v4();
        let parsed = parse_meeting_uid(uid.to_string().as_bytes()).unwrap();
        assert_eq!(parsed, uid);
    }

    #[test]
    fn removed_organizer_usernames_dedupes_across_roles() {
        let payload = ProjectSettingsUpdatedPayload {
            project_uid: "p1".into(),
            removed_writers: vec!["u2".into(), "u3".into()],
            removed_meeting_coordinators: vec!["u3".into()],
        };
        assert_eq!(payload.removed_organizer_usernames(), vec!["u2", "u3"]);
    }
}
