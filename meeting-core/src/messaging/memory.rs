use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::domain::Meeting;
use crate::errors::{CoreError, Result};

use super::{AccessSender, CommitteeMember, ExternalLookup, IndexSender, LifecycleEventSender, WebhookEventSender};

/// One recorded emission, for test assertions against what the engine fanned
/// out, flattened into a single enum for easy pattern matching in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    IndexUpsert { target: String, document: Value, sync: bool },
    IndexDelete { target: String, id: String, sync: bool },
    AccessPut { subject_id: String, resource_id: String, relation: String, sync: bool },
    AccessRemove { subject_id: String, resource_id: String, relation: String, sync: bool },
    InvitationEmail { email: String, meeting_uid: String, sync: bool },
    UpdatedInvitationEmail {
        email: String,
        meeting_uid: String,
        meeting_snapshot: Value,
        changed_fields: HashMap<String, Value>,
        sync: bool,
    },
    CancellationEmail { email: String, meeting_uid: String, sync: bool },
    WebhookEvent { event_type: String, payload: Value, sync: bool },
}

/// Fixture-backed implementation of every messaging trait (C5), used by
/// tests and the default crate wiring. Every emission is appended to
/// `sent()` in order; external-lookup responses are seeded via the
/// `seed_*` methods.
#[derive(Default)]
pub struct InMemoryMessagingClient {
    sent: RwLock<Vec<SentMessage>>,
    project_names: RwLock<HashMap<String, String>>,
    project_logos: RwLock<HashMap<String, String>>,
    project_slugs: RwLock<HashMap<String, String>>,
    committee_names: RwLock<HashMap<String, String>>,
    committee_members: RwLock<HashMap<String, Vec<CommitteeMember>>>,
    email_to_username: RwLock<HashMap<String, String>>,
}

impl InMemoryMessagingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().clone()
    }

    pub fn clear(&self) {
        self.sent.write().clear();
    }

    pub fn seed_project_name(&self, project_uid: impl Into<String>, name: impl Into<String>) {
        self.project_names.write().insert(project_uid.into(), name.into());
    }

    pub fn seed_project_logo(&self, project_uid: impl Into<String>, logo_url: impl Into<String>) {
        self.project_logos.write().insert(project_uid.into(), logo_url.into());
    }

    pub fn seed_project_slug(&self, project_uid: impl Into<String>, slug: impl Into<String>) {
        self.project_slugs.write().insert(project_uid.into(), slug.into());
    }

    pub fn seed_committee_name(&self, committee_uid: impl Into<String>, name: impl Into<String>) {
        self.committee_names.write().insert(committee_uid.into(), name.into());
    }

    pub fn seed_committee_members(&self, committee_uid: impl Into<String>, members: Vec<CommitteeMember>) {
        self.committee_members.write().insert(committee_uid.into(), members);
    }

    pub fn seed_email_to_username(&self, email: impl Into<String>, username: impl Into<String>) {
        self.email_to_username.write().insert(email.into(), username.into());
    }
}

#[async_trait]
impl IndexSender for InMemoryMessagingClient {
    async fn index_upsert(&self, target: &str, document: Value, sync: bool) -> Result<()> {
        self.sent.write().push(SentMessage::IndexUpsert {
            target: target.to_string(),
            document,
            sync,
        });
        Ok(())
    }

    async fn index_delete(&self, target: &str, id: &str, sync: bool) -> Result<()> {
        self.sent.write().push(SentMessage::IndexDelete {
            target: target.to_string(),
            id: id.to_string(),
            sync,
        });
        Ok(())
    }
}

#[async_trait]
impl AccessSender for InMemoryMessagingClient {
    async fn access_put(&self, subject_id: &str, resource_id: &str, relation: &str, sync: bool) -> Result<()> {
        self.sent.write().push(SentMessage::AccessPut {
            subject_id: subject_id.to_string(),
            resource_id: resource_id.to_string(),
            relation: relation.to_string(),
            sync,
        });
        Ok(())
    }

    async fn access_remove(&self, subject_id: &str, resource_id: &str, relation: &str, sync: bool) -> Result<()> {
        self.sent.write().push(SentMessage::AccessRemove {
            subject_id: subject_id.to_string(),
            resource_id: resource_id.to_string(),
            relation: relation.to_string(),
            sync,
        });
        Ok(())
    }
}

#[async_trait]
impl LifecycleEventSender for InMemoryMessagingClient {
    async fn send_invitation_email(&self, email: &str, meeting_uid: &str, sync: bool) -> Result<()> {
        self.sent.write().push(SentMessage::InvitationEmail {
            email: email.to_string(),
            meeting_uid: meeting_uid.to_string(),
            sync,
        });
        Ok(())
    }

    async fn send_updated_invitation_email(
        &self,
        email: &str,
        meeting: &Meeting,
        changed_fields: &HashMap<String, Value>,
        sync: bool,
    ) -> Result<()> {
        self.sent.write().push(SentMessage::UpdatedInvitationEmail {
            email: email.to_string(),
            meeting_uid: meeting.uid.clone(),
            meeting_snapshot: serde_json::to_value(meeting).unwrap_or(Value::Null),
            changed_fields: changed_fields.clone(),
            sync,
        });
        Ok(())
    }

    async fn send_cancellation_email(&self, email: &str, meeting_uid: &str, sync: bool) -> Result<()> {
        self.sent.write().push(SentMessage::CancellationEmail {
            email: email.to_string(),
            meeting_uid: meeting_uid.to_string(),
            sync,
        });
        Ok(())
    }
}

#[async_trait]
impl WebhookEventSender for InMemoryMessagingClient {
    async fn send_webhook_event(&self, event_type: &str, payload: Value, sync: bool) -> Result<()> {
        self.sent.write().push(SentMessage::WebhookEvent {
            event_type: event_type.to_string(),
            payload,
            sync,
        });
        Ok(())
    }
}

#[async_trait]
impl ExternalLookup for InMemoryMessagingClient {
    async fn get_project_name(&self, project_uid: &str) -> Result<String> {
        self.project_names
            .read()
            .get(project_uid)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("project {project_uid} not found")))
    }

    async fn get_project_logo(&self, project_uid: &str) -> Result<String> {
        self.project_logos
            .read()
            .get(project_uid)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("project {project_uid} not found")))
    }

    async fn get_project_slug(&self, project_uid: &str) -> Result<String> {
        self.project_slugs
            .read()
            .get(project_uid)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("project {project_uid} not found")))
    }

    async fn get_committee_name(&self, committee_uid: &str) -> Result<String> {
        self.committee_names
            .read()
            .get(committee_uid)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("committee {committee_uid} not found")))
    }

    async fn get_committee_members(&self, committee_uid: &str) -> Result<Vec<CommitteeMember>> {
        Ok(self.committee_members.read().get(committee_uid).cloned().unwrap_or_default())
    }

    async fn email_to_username_lookup(&self, email: &str) -> Result<Option<String>> {
        Ok(self.email_to_username.read().get(&email.to_ascii_lowercase()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn index_upsert_is_recorded() {
        let client = InMemoryMessagingClient::new();
        client
            .index_upsert("meetings", serde_json::json!({"uid": "m1"}), false)
            .await
            .unwrap();
        let sent = client.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], SentMessage::IndexUpsert { target, sync, .. } if target == "meetings" && !sync));
    }

    #[tokio::test]
    async fn seeded_committee_members_round_trip() {
        let client = InMemoryMessagingClient::new();
        client.seed_committee_members(
            "c1",
            vec![CommitteeMember {
                email: "a@example.com".into(),
                first_name: "A".into(),
                last_name: "B".into(),
                voting_status: "voting".into(),
            }],
        );
        let members = client.get_committee_members("c1").await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].email, "a@example.com");
    }

    #[tokio::test]
    async fn unseeded_project_name_is_not_found() {
        let client = InMemoryMessagingClient::new();
        let err = client.get_project_name("missing").await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::Kind::NotFound);
    }

    #[tokio::test]
    async fn seeded_project_logo_and_slug_round_trip() {
        let client = InMemoryMessagingClient::new();
        client.seed_project_logo("p1", "https://example.com/logo.png");
        client.seed_project_slug("p1", "my-project");
        assert_eq!(
            client.get_project_logo("p1").await.unwrap(),
            "https://example.com/logo.png"
        );
        assert_eq!(client.get_project_slug("p1").await.unwrap(), "my-project");
    }

    #[tokio::test]
    async fn seeded_committee_name_round_trips() {
        let client = InMemoryMessagingClient::new();
        client.seed_committee_name("c1", "Technical Steering Committee");
        assert_eq!(
            client.get_committee_name("c1").await.unwrap(),
            "Technical Steering Committee"
        );
    }

    #[tokio::test]
    async fn unseeded_project_logo_slug_and_committee_name_are_not_found() {
        let client = InMemoryMessagingClient::new();
        assert_eq!(
            client.get_project_logo("missing").await.unwrap_err().kind(),
            crate::errors::Kind::NotFound
        );
        assert_eq!(
            client.get_project_slug("missing").await.unwrap_err().kind(),
            crate::errors::Kind::NotFound
        );
        assert_eq!(
            client.get_committee_name("missing").await.unwrap_err().kind(),
            crate::errors::Kind::NotFound
        );
    }
}
