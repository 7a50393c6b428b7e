use async_trait::async_trait;

use crate::domain::{PastMeetingRecording, PastMeetingSummary, PastMeetingTranscript, Revision};
use crate::errors::{CoreError, Result};

use super::memory::{Revisioned, Store};

impl Revisioned for PastMeetingRecording {
    fn revision(&self) -> Revision {
        self.revision
    }
    fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }
}

impl Revisioned for PastMeetingTranscript {
    fn revision(&self) -> Revision {
        self.revision
    }
    fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }
}

impl Revisioned for PastMeetingSummary {
    fn revision(&self) -> Revision {
        self.revision
    }
    fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }
}

/// Contract for the `PastMeetingRecording` aggregate. One
/// record per platform session UUID (idempotency key).
#[async_trait]
pub trait PastMeetingRecordingRepository: Send + Sync {
    async fn create(&self, recording: PastMeetingRecording) -> Result<PastMeetingRecording>;
    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        recording: PastMeetingRecording,
    ) -> Result<PastMeetingRecording>;
    async fn list_by_past_meeting(&self, past_meeting_uid: &str) -> Result<Vec<PastMeetingRecording>>;
    async fn get_by_platform_meeting_instance_id(
        &self,
        instance_id: &str,
    ) -> Result<Option<PastMeetingRecording>>;
}

#[derive(Default)]
pub struct InMemoryPastMeetingRecordingRepository {
    store: Store<PastMeetingRecording>,
}

impl InMemoryPastMeetingRecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PastMeetingRecordingRepository for InMemoryPastMeetingRecordingRepository {
    async fn create(&self, recording: PastMeetingRecording) -> Result<PastMeetingRecording> {
        self.store.create(recording.uid.clone(), recording)
    }

    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        recording: PastMeetingRecording,
    ) -> Result<PastMeetingRecording> {
        self.store.update(uid, expected_revision, recording)
    }

    async fn list_by_past_meeting(
        &self,
        past_meeting_uid: &str,
    ) -> Result<Vec<PastMeetingRecording>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .filter(|r| r.past_meeting_uid == past_meeting_uid)
            .collect())
    }

    async fn get_by_platform_meeting_instance_id(
        &self,
        instance_id: &str,
    ) -> Result<Option<PastMeetingRecording>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .find(|r| r.platform_meeting_instance_id == instance_id))
    }
}

/// Contract for the `PastMeetingTranscript` aggregate.
#[async_trait]
pub trait PastMeetingTranscriptRepository: Send + Sync {
    async fn create(&self, transcript: PastMeetingTranscript) -> Result<PastMeetingTranscript>;
    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        transcript: PastMeetingTranscript,
    ) -> Result<PastMeetingTranscript>;
    async fn list_by_past_meeting(
        &self,
        past_meeting_uid: &str,
    ) -> Result<Vec<PastMeetingTranscript>>;
    async fn get_by_platform_meeting_instance_id(
        &self,
        instance_id: &str,
    ) -> Result<Option<PastMeetingTranscript>>;
}

#[derive(Default)]
pub struct InMemoryPastMeetingTranscriptRepository {
    store: Store<PastMeetingTranscript>,
}

impl InMemoryPastMeetingTranscriptRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PastMeetingTranscriptRepository for InMemoryPastMeetingTranscriptRepository {
    async fn create(&self, transcript: PastMeetingTranscript) -> Result<PastMeetingTranscript> {
        self.store.create(transcript.uid.clone(), transcript)
    }

    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        transcript: PastMeetingTranscript,
    ) -> Result<PastMeetingTranscript> {
        self.store.update(uid, expected_revision, transcript)
    }

    async fn list_by_past_meeting(
        &self,
        past_meeting_uid: &str,
    ) -> Result<Vec<PastMeetingTranscript>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .filter(|t| t.past_meeting_uid == past_meeting_uid)
            .collect())
    }

    async fn get_by_platform_meeting_instance_id(
        &self,
        instance_id: &str,
    ) -> Result<Option<PastMeetingTranscript>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .find(|t| t.platform_meeting_instance_id == instance_id))
    }
}

/// Contract for the `PastMeetingSummary` aggregate.
#[async_trait]
pub trait PastMeetingSummaryRepository: Send + Sync {
    async fn create(&self, summary: PastMeetingSummary) -> Result<PastMeetingSummary>;
    async fn get(&self, uid: &str) -> Result<PastMeetingSummary>;
    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        summary: PastMeetingSummary,
    ) -> Result<PastMeetingSummary>;
    async fn list_by_past_meeting(&self, past_meeting_uid: &str) -> Result<Vec<PastMeetingSummary>>;
    async fn get_by_platform_meeting_instance_id(
        &self,
        instance_id: &str,
    ) -> Result<Option<PastMeetingSummary>>;
}

#[derive(Default)]
pub struct InMemoryPastMeetingSummaryRepository {
    store: Store<PastMeetingSummary>,
}

impl InMemoryPastMeetingSummaryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PastMeetingSummaryRepository for InMemoryPastMeetingSummaryRepository {
    async fn create(&self, summary: PastMeetingSummary) -> Result<PastMeetingSummary> {
        self.store.create(summary.uid.clone(), summary)
    }

    async fn get(&self, uid: &str) -> Result<PastMeetingSummary> {
        self.store
            .get(uid)
            .ok_or_else(|| CoreError::not_found(format!("past meeting summary {uid} not found")))
    }

    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        summary: PastMeetingSummary,
    ) -> Result<PastMeetingSummary> {
        self.store.update(uid, expected_revision, summary)
    }

    async fn list_by_past_meeting(&self, past_meeting_uid: &str) -> Result<Vec<PastMeetingSummary>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .filter(|s| s.past_meeting_uid == past_meeting_uid)
            .collect())
    }

    async fn get_by_platform_meeting_instance_id(
        &self,
        instance_id: &str,
    ) -> Result<Option<PastMeetingSummary>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .find(|s| s.platform_meeting_instance_id == instance_id))
    }
}
