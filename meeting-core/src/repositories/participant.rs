use async_trait::async_trait;

use crate::domain::{PastMeetingParticipant, Revision};
use crate::errors::{CoreError, Result};

use super::memory::{Revisioned, Store};

impl Revisioned for PastMeetingParticipant {
    fn revision(&self) -> Revision {
        self.revision
    }
    fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }
}

/// Contract for the `PastMeetingParticipant` aggregate.
/// Invariant: at most one participant per `(past_meeting_uid, email)`,
/// compared case-insensitively.
#[async_trait]
pub trait PastMeetingParticipantRepository: Send + Sync {
    async fn create(&self, participant: PastMeetingParticipant) -> Result<PastMeetingParticipant>;
    async fn get(&self, uid: &str) -> Result<PastMeetingParticipant>;
    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        participant: PastMeetingParticipant,
    ) -> Result<PastMeetingParticipant>;
    async fn list_by_past_meeting(&self, past_meeting_uid: &str) -> Result<Vec<PastMeetingParticipant>>;
    async fn get_by_past_meeting_and_email(
        &self,
        past_meeting_uid: &str,
        email: &str,
    ) -> Result<Option<PastMeetingParticipant>>;
}

#[derive(Default)]
pub struct InMemoryPastMeetingParticipantRepository {
    store: Store<PastMeetingParticipant>,
}

impl InMemoryPastMeetingParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PastMeetingParticipantRepository for InMemoryPastMeetingParticipantRepository {
    async fn create(&self, participant: PastMeetingParticipant) -> Result<PastMeetingParticipant> {
        if self
            .get_by_past_meeting_and_email(&participant.past_meeting_uid, &participant.email)
            .await?
            .is_some()
        {
            return Err(CoreError::conflict(format!(
                "participant already exists for past meeting {} and email {}",
                participant.past_meeting_uid, participant.email
            )));
        }
        self.store.create(participant.uid.clone(), participant)
    }

    async fn get(&self, uid: &str) -> Result<PastMeetingParticipant> {
        self.store
            .get(uid)
            .ok_or_else(|| CoreError::not_found(format!("past meeting participant {uid} not found")))
    }

    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        participant: PastMeetingParticipant,
    ) -> Result<PastMeetingParticipant> {
        self.store.update(uid, expected_revision, participant)
    }

    async fn list_by_past_meeting(
        &self,
        past_meeting_uid: &str,
    ) -> Result<Vec<PastMeetingParticipant>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .filter(|p| p.past_meeting_uid == past_meeting_uid)
            .collect())
    }

    async fn get_by_past_meeting_and_email(
        &self,
        past_meeting_uid: &str,
        email: &str,
    ) -> Result<Option<PastMeetingParticipant>> {
        let email_key = email.to_ascii_lowercase();
        Ok(self
            .store
            .all()
            .into_iter()
            .find(|p| p.past_meeting_uid == past_meeting_uid && p.email_key() == email_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(uid: &str, past_meeting_uid: &str, email: &str) -> PastMeetingParticipant {
        PastMeetingParticipant {
            uid: uid.into(),
            past_meeting_uid: past_meeting_uid.into(),
            meeting_uid: "m1".into(),
            email: email.into(),
            first_name: "A".into(),
            last_name: "B".into(),
            is_invited: true,
            is_attended: true,
            sessions: vec![],
            revision: Revision::NONE,
        }
    }

    #[tokio::test]
    async fn duplicate_email_per_past_meeting_is_rejected() {
        let repo = InMemoryPastMeetingParticipantRepository::new();
        repo.create(participant("p1", "pm1", "Alice@Example.com"))
            .await
            .unwrap();
        let err = repo
            .create(participant("p2", "pm1", "alice@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::Kind::Conflict);
    }

    #[tokio::test]
    async fn list_by_past_meeting_returns_only_matching() {
        let repo = InMemoryPastMeetingParticipantRepository::new();
        repo.create(participant("p1", "pm1", "a@example.com"))
            .await
            .unwrap();
        repo.create(participant("p2", "pm2", "b@example.com"))
            .await
            .unwrap();
        assert_eq!(repo.list_by_past_meeting("pm1").await.unwrap().len(), 1);
    }
}
