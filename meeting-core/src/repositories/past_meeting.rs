use async_trait::async_trait;

use crate::domain::{PastMeeting, Revision};
use crate::errors::{CoreError, Result};

use super::memory::{Revisioned, Store};

impl Revisioned for PastMeeting {
    fn revision(&self) -> Revision {
        self.revision
    }
    fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }
}

/// Contract for the `PastMeeting` aggregate. Invariant:
/// `(platform_meeting_id, occurrence_id)` uniquely identifies a record —
/// [`get_by_platform_meeting_id_and_occurrence`] is how the past-meeting
/// aggregator (C7) finds the record to upsert into.
#[async_trait]
pub trait PastMeetingRepository: Send + Sync {
    async fn create(&self, past_meeting: PastMeeting) -> Result<PastMeeting>;
    async fn get(&self, uid: &str) -> Result<PastMeeting>;
    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        past_meeting: PastMeeting,
    ) -> Result<PastMeeting>;
    async fn delete(&self, uid: &str, expected_revision: Revision) -> Result<()>;
    async fn list_by_meeting(&self, meeting_uid: &str) -> Result<Vec<PastMeeting>>;
    async fn get_by_platform_meeting_id_and_occurrence(
        &self,
        platform_meeting_id: &str,
        occurrence_id: &str,
    ) -> Result<Option<PastMeeting>>;
}

#[derive(Default)]
pub struct InMemoryPastMeetingRepository {
    store: Store<PastMeeting>,
}

impl InMemoryPastMeetingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PastMeetingRepository for InMemoryPastMeetingRepository {
    async fn create(&self, past_meeting: PastMeeting) -> Result<PastMeeting> {
        if self
            .get_by_platform_meeting_id_and_occurrence(
                &past_meeting.platform_meeting_id,
                &past_meeting.occurrence_id,
            )
            .await?
            .is_some()
        {
            return Err(CoreError::conflict(format!(
                "past meeting already exists for platform meeting {} occurrence {}",
                past_meeting.platform_meeting_id, past_meeting.occurrence_id
            )));
        }
        self.store.create(past_meeting.uid.clone(), past_meeting)
    }

    async fn get(&self, uid: &str) -> Result<PastMeeting> {
        self.store
            .get(uid)
            .ok_or_else(|| CoreError::not_found(format!("past meeting {uid} not found")))
    }

    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        past_meeting: PastMeeting,
    ) -> Result<PastMeeting> {
        self.store.update(uid, expected_revision, past_meeting)
    }

    async fn delete(&self, uid: &str, expected_revision: Revision) -> Result<()> {
        self.store.delete(uid, expected_revision)
    }

    async fn list_by_meeting(&self, meeting_uid: &str) -> Result<Vec<PastMeeting>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .filter(|p| p.meeting_uid == meeting_uid)
            .collect())
    }

    async fn get_by_platform_meeting_id_and_occurrence(
        &self,
        platform_meeting_id: &str,
        occurrence_id: &str,
    ) -> Result<Option<PastMeeting>> {
        Ok(self.store.all().into_iter().find(|p| {
            p.platform_meeting_id == platform_meeting_id && p.occurrence_id == occurrence_id
        }))
    }
}
