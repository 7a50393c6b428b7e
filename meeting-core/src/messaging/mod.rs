//! Messaging fan-out (C5): narrow capability traits for each aggregate ×
//! effect the engine emits, rather than one catch-all "sender" interface.
//! Every operation takes a `sync` flag: `true` awaits the
//! broker's acknowledgement (pre-commit read-your-writes), `false` enqueues
//! fire-and-forget (the common post-commit fan-out case).

mod memory;
mod metered;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::Meeting;
use crate::errors::Result;

pub use memory::{InMemoryMessagingClient, SentMessage};
pub use metered::{MeteredAccessSender, MeteredIndexSender, MeteredLifecycleEventSender, MeteredWebhookEventSender};

/// A member of a committee, as reported by the external committee registry
/// ("fetch its current members").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitteeMember {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub voting_status: String,
}

/// Search-index fan-out ("index-create/update, index-delete").
#[async_trait]
pub trait IndexSender: Send + Sync {
    async fn index_upsert(&self, target: &str, document: Value, sync: bool) -> Result<()>;
    async fn index_delete(&self, target: &str, id: &str, sync: bool) -> Result<()>;
}

/// Authorization-store fan-out ("access-put, access-delete").
#[async_trait]
pub trait AccessSender: Send + Sync {
    async fn access_put(&self, subject_id: &str, resource_id: &str, relation: &str, sync: bool) -> Result<()>;
    async fn access_remove(&self, subject_id: &str, resource_id: &str, relation: &str, sync: bool) -> Result<()>;
}

/// Email notifications driven by meeting lifecycle transitions.
#[async_trait]
pub trait LifecycleEventSender: Send + Sync {
    async fn send_invitation_email(&self, email: &str, meeting_uid: &str, sync: bool) -> Result<()>;
    /// Sent when `meeting.updated` carries a non-empty `changes` map
    /// (spec.md §4.9: "send an 'updated invitation' email with the current
    /// meeting snapshot and the map of changed fields"). `changed_fields`
    /// carries the new value of each changed field, not just its name.
    async fn send_updated_invitation_email(
        &self,
        email: &str,
        meeting: &Meeting,
        changed_fields: &HashMap<String, Value>,
        sync: bool,
    ) -> Result<()>;
    async fn send_cancellation_email(&self, email: &str, meeting_uid: &str, sync: bool) -> Result<()>;
}

/// Outbound webhook notifications for external subscribers ("webhook-event").
#[async_trait]
pub trait WebhookEventSender: Send + Sync {
    async fn send_webhook_event(&self, event_type: &str, payload: Value, sync: bool) -> Result<()>;
}

/// Request-reply lookups against the project and committee registries
/// ("External-lookup operations ... are request-reply with a
/// timeout").
#[async_trait]
pub trait ExternalLookup: Send + Sync {
    async fn get_project_name(&self, project_uid: &str) -> Result<String>;
    async fn get_project_logo(&self, project_uid: &str) -> Result<String>;
    async fn get_project_slug(&self, project_uid: &str) -> Result<String>;
    async fn get_committee_name(&self, committee_uid: &str) -> Result<String>;
    async fn get_committee_members(&self, committee_uid: &str) -> Result<Vec<CommitteeMember>>;
    async fn email_to_username_lookup(&self, email: &str) -> Result<Option<String>>;
}
