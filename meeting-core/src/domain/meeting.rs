use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Occurrence, Recurrence, Revision};

/// Public/private visibility, which together with `restricted` determines
/// access propagation and the committee-deletion conversion
/// policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingType {
    Board,
    Maintainers,
    Marketing,
    TechnicalSteeringCommittee,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Zoom,
}

/// Zoom-specific settings nested under `Meeting.platform_config` (spec §3:
/// "platform_config (tagged by platform: for Zoom = ...)"). `meeting_id` is
/// a `String`: Zoom's platform meeting IDs are documented as 10-11 digit
/// numbers that do not reliably fit `u32`, and the original implementation
/// (see `original_source`) treats them as opaque strings throughout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoomConfig {
    pub meeting_id: String,
    pub passcode: Option<String>,
    pub ai_summary_require_approval: bool,
}

/// One committee attached to a meeting, with the voting statuses eligible
/// for automatic registrant propagation. An empty
/// `allowed_voting_statuses` means "all statuses allowed".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Committee {
    pub committee_uid: String,
    pub allowed_voting_statuses: BTreeSet<String>,
}

impl Committee {
    pub fn allows(&self, voting_status: &str) -> bool {
        self.allowed_voting_statuses.is_empty()
            || self.allowed_voting_statuses.contains(voting_status)
    }
}

/// The scheduled meeting template ("Meeting (Base)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub uid: String,
    pub project_uid: String,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub timezone: String,
    pub recurrence: Option<Recurrence>,
    pub committees: Vec<Committee>,
    pub visibility: Visibility,
    pub restricted: bool,
    pub meeting_type: MeetingType,
    pub platform: Platform,
    pub zoom_config: ZoomConfig,
    pub early_join_minutes: u32,
    pub recording_enabled: bool,
    pub transcript_enabled: bool,
    pub youtube_upload_enabled: bool,
    pub artifact_visibility: Visibility,
    pub password: Option<String>,
    /// Materialized cache; may be stale relative to a fresh C3 computation
    /// ("the cache in `Meeting.occurrences` may be stale").
    pub occurrences: Vec<Occurrence>,
    pub revision: Revision,
}

impl Meeting {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn committee(&self, committee_uid: &str) -> Option<&Committee> {
        self.committees.iter().find(|c| c.committee_uid == committee_uid)
    }
}

/// Mutable operator list, a sibling aggregate keyed by the meeting uid with
/// its own revision ("Meeting Settings").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingSettings {
    pub meeting_uid: String,
    pub organizers: Vec<String>,
    pub revision: Revision,
}
