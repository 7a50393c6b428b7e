use async_trait::async_trait;

use crate::domain::{Registrant, Revision};
use crate::errors::{CoreError, Result};

use super::memory::{Revisioned, Store};

impl Revisioned for Registrant {
    fn revision(&self) -> Revision {
        self.revision
    }
    fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }
}

/// Contract for the `Registrant` aggregate. Invariant: at
/// most one registrant per `(meeting_uid, email)`, compared
/// case-insensitively — enforced by [`InMemoryRegistrantRepository::create`]
/// here, and expected of any other backing implementation.
#[async_trait]
pub trait RegistrantRepository: Send + Sync {
    async fn create(&self, registrant: Registrant) -> Result<Registrant>;
    async fn get(&self, uid: &str) -> Result<Registrant>;
    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        registrant: Registrant,
    ) -> Result<Registrant>;
    async fn delete(&self, uid: &str, expected_revision: Revision) -> Result<()>;
    /// Delete with no revision precondition (spec.md §4.9, `meeting.deleted`:
    /// "for each, delete (skip revision check)") — teardown must not fail
    /// just because a concurrent handler mutated this registrant after the
    /// `list_by_meeting` read that produced it.
    async fn delete_skip_revision_check(&self, uid: &str) -> Result<()>;
    async fn list_by_meeting(&self, meeting_uid: &str) -> Result<Vec<Registrant>>;
    async fn get_by_meeting_and_email(
        &self,
        meeting_uid: &str,
        email: &str,
    ) -> Result<Option<Registrant>>;
}

#[derive(Default)]
pub struct InMemoryRegistrantRepository {
    store: Store<Registrant>,
}

impl InMemoryRegistrantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrantRepository for InMemoryRegistrantRepository {
    async fn create(&self, registrant: Registrant) -> Result<Registrant> {
        if self
            .get_by_meeting_and_email(&registrant.meeting_uid, &registrant.email)
            .await?
            .is_some()
        {
            return Err(CoreError::conflict(format!(
                "registrant already exists for meeting {} and email {}",
                registrant.meeting_uid, registrant.email
            )));
        }
        self.store.create(registrant.uid.clone(), registrant)
    }

    async fn get(&self, uid: &str) -> Result<Registrant> {
        self.store
            .get(uid)
            .ok_or_else(|| CoreError::not_found(format!("registrant {uid} not found")))
    }

    async fn update(
        &self,
        uid: &str,
        expected_revision: Revision,
        registrant: Registrant,
    ) -> Result<Registrant> {
        self.store.update(uid, expected_revision, registrant)
    }

    async fn delete(&self, uid: &str, expected_revision: Revision) -> Result<()> {
        self.store.delete(uid, expected_revision)
    }

    async fn delete_skip_revision_check(&self, uid: &str) -> Result<()> {
        self.store.delete_unconditional(uid)
    }

    async fn list_by_meeting(&self, meeting_uid: &str) -> Result<Vec<Registrant>> {
        Ok(self
            .store
            .all()
            .into_iter()
            .filter(|r| r.meeting_uid == meeting_uid)
            .collect())
    }

    async fn get_by_meeting_and_email(
        &self,
        meeting_uid: &str,
        email: &str,
    ) -> Result<Option<Registrant>> {
        let email_key = email.to_ascii_lowercase();
        Ok(self
            .store
            .all()
            .into_iter()
            .find(|r| r.meeting_uid == meeting_uid && r.email_key() == email_key))
    }
}
