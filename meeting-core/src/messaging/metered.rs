//! Metered decorators (A3) wrapping the C5 fan-out traits to record
//! `meeting_core_fanout_total{effect, outcome}` without touching call sites
//! in the handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::Meeting;
use crate::errors::Result;
use crate::observability::metrics as obs_metrics;

use super::{AccessSender, IndexSender, LifecycleEventSender, WebhookEventSender};

fn outcome<T>(result: &Result<T>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "error"
    }
}

/// Wraps an [`IndexSender`], recording the `index` effect.
pub struct MeteredIndexSender<T>(pub Arc<T>);

#[async_trait]
impl<T: IndexSender> IndexSender for MeteredIndexSender<T> {
    async fn index_upsert(&self, target: &str, document: Value, sync: bool) -> Result<()> {
        let result = self.0.index_upsert(target, document, sync).await;
        obs_metrics::record_fanout("index", outcome(&result));
        result
    }

    async fn index_delete(&self, target: &str, id: &str, sync: bool) -> Result<()> {
        let result = self.0.index_delete(target, id, sync).await;
        obs_metrics::record_fanout("index", outcome(&result));
        result
    }
}

/// Wraps an [`AccessSender`], recording the `access` effect.
pub struct MeteredAccessSender<T>(pub Arc<T>);

#[async_trait]
impl<T: AccessSender> AccessSender for MeteredAccessSender<T> {
    async fn access_put(&self, subject_id: &str, resource_id: &str, relation: &str, sync: bool) -> Result<()> {
        let result = self.0.access_put(subject_id, resource_id, relation, sync).await;
        obs_metrics::record_fanout("access", outcome(&result));
        result
    }

    async fn access_remove(&self, subject_id: &str, resource_id: &str, relation: &str, sync: bool) -> Result<()> {
        let result = self.0.access_remove(subject_id, resource_id, relation, sync).await;
        obs_metrics::record_fanout("access", outcome(&result));
        result
    }
}

/// Wraps a [`LifecycleEventSender`], recording the `email` effect.
pub struct MeteredLifecycleEventSender<T>(pub Arc<T>);

#[async_trait]
impl<T: LifecycleEventSender> LifecycleEventSender for MeteredLifecycleEventSender<T> {
    async fn send_invitation_email(&self, email: &str, meeting_uid: &str, sync: bool) -> Result<()> {
        let result = self.0.send_invitation_email(email, meeting_uid, sync).await;
        obs_metrics::record_fanout("email", outcome(&result));
        result
    }

    async fn send_updated_invitation_email(
        &self,
        email: &str,
        meeting: &Meeting,
        changed_fields: &HashMap<String, Value>,
        sync: bool,
    ) -> Result<()> {
        let result = self
            .0
            .send_updated_invitation_email(email, meeting, changed_fields, sync)
            .await;
        obs_metrics::record_fanout("email", outcome(&result));
        result
    }

    async fn send_cancellation_email(&self, email: &str, meeting_uid: &str, sync: bool) -> Result<()> {
        let result = self.0.send_cancellation_email(email, meeting_uid, sync).await;
        obs_metrics::record_fanout("email", outcome(&result));
        result
    }
}

/// Wraps a [`WebhookEventSender`], recording the `webhook` effect.
pub struct MeteredWebhookEventSender<T>(pub Arc<T>);

#[async_trait]
impl<T: WebhookEventSender> WebhookEventSender for MeteredWebhookEventSender<T> {
    async fn send_webhook_event(&self, event_type: &str, payload: Value, sync: bool) -> Result<()> {
        let result = self.0.send_webhook_event(event_type, payload, sync).await;
        obs_metrics::record_fanout("webhook", outcome(&result));
        result
    }
}
