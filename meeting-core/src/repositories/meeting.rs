use async_trait::async_trait;

use crate::domain::{Meeting, MeetingSettings, Revision};
use crate::errors::{CoreError, Result};

use super::memory::{Revisioned, Store};

impl Revisioned for Meeting {
    fn revision(&self) -> Revision {
        self.revision
    }
    fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }
}

impl Revisioned for MeetingSettings {
    fn revision(&self) -> Revision {
        self.revision
    }
    fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }
}

/// Contract for the `Meeting` aggregate. Narrow to what the
/// lifecycle handler (C9) and committee sync (C8) actually need — not a
/// general-purpose query surface.
#[async_trait]
pub trait MeetingRepository: Send + Sync {
    async fn create(&self, meeting: Meeting) -> Result<Meeting>;
    async fn exists(&self, uid: &str) -> Result<bool>;
    async fn get(&self, uid: &str) -> Result<Meeting>;
    async fn update(&self, uid: &str, expected_revision: Revision, meeting: Meeting) -> Result<Meeting>;
    async fn delete(&self, uid: &str, expected_revision: Revision) -> Result<()>;
    async fn list_by_committee(&self, committee_uid: &str) -> Result<Vec<Meeting>>;
    async fn list_by_project(&self, project_uid: &str) -> Result<Vec<Meeting>>;
    /// Look up the scheduled meeting template by the platform's own meeting
    /// id ("list_by_platform_meeting_id"), the only thing a Zoom
    /// webhook payload carries.
    async fn get_by_platform_meeting_id(&self, platform_meeting_id: &str) -> Result<Option<Meeting>>;
}

#[derive(Default)]
pub struct InMemoryMeetingRepository {
    store: Store<Meeting>,
}

impl InMemoryMeetingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MeetingRepository for InMemoryMeetingRepository {
    async fn create(&self, meeting: Meeting) -> Result<Meeting> {
        self.store.create(meeting.uid.clone(), meeting)
    }

    async fn exists(&self, uid: &str) -> Result<bool> {
        Ok(self.store.exists(uid))
    }

    async fn get(&self, uid: &str) -> Result<Meeting> {
        self.store
            .get(uid)
            .ok_or_else(|| CoreError::not_found(format!("meeting {uid} not found")))
    }

    async fn update(&self, uid: &str, expected_revision: Revision, meeting: Meeting) -> Result<Meeting> {
        self.store.update(uid, expected_revision, meeting)
    }

    async fn delete(&self, uid: &str, expected_revision: Revision) -> Result<()> {
        self.store.delete(uid, expected_revision)
    }

    async fn list_by_committee(&self, committee_uid: &str) -> Result<Vec<Meeting>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .filter(|m| m.committee(committee_uid).is_some())
            .collect())
    }

    async fn list_by_project(&self, project_uid: &str) -> Result<Vec<Meeting>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .filter(|m| m.project_uid == project_uid)
            .collect())
    }

    async fn get_by_platform_meeting_id(&self, platform_meeting_id: &str) -> Result<Option<Meeting>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .find(|m| m.zoom_config.meeting_id == platform_meeting_id))
    }
}

/// Contract for the `MeetingSettings` sibling aggregate ("Meeting
/// Settings"), keyed 1:1 with the meeting it belongs to.
#[async_trait]
pub trait MeetingSettingsRepository: Send + Sync {
    async fn create(&self, settings: MeetingSettings) -> Result<MeetingSettings>;
    async fn get(&self, meeting_uid: &str) -> Result<MeetingSettings>;
    async fn update(
        &self,
        meeting_uid: &str,
        expected_revision: Revision,
        settings: MeetingSettings,
    ) -> Result<MeetingSettings>;
    async fn delete(&self, meeting_uid: &str, expected_revision: Revision) -> Result<()>;
}

#[derive(Default)]
pub struct InMemoryMeetingSettingsRepository {
    store: Store<MeetingSettings>,
}

impl InMemoryMeetingSettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MeetingSettingsRepository for InMemoryMeetingSettingsRepository {
    async fn create(&self, settings: MeetingSettings) -> Result<MeetingSettings> {
        self.store.create(settings.meeting_uid.clone(), settings)
    }

    async fn get(&self, meeting_uid: &str) -> Result<MeetingSettings> {
        self.store
            .get(meeting_uid)
            .ok_or_else(|| CoreError::not_found(format!("meeting settings {meeting_uid} not found")))
    }

    async fn update(
        &self,
        meeting_uid: &str,
        expected_revision: Revision,
        settings: MeetingSettings,
    ) -> Result<MeetingSettings> {
        self.store.update(meeting_uid, expected_revision, settings)
    }

    async fn delete(&self, meeting_uid: &str, expected_revision: Revision) -> Result<()> {
        self.store.delete(meeting_uid, expected_revision)
    }
}
