//! Meeting lifecycle handler (C9): the request/reply `meeting.get_title`
//! lookup plus the three meeting lifecycle event subjects.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::domain::Meeting;
use crate::errors::Result;
use crate::messaging::{AccessSender, IndexSender, LifecycleEventSender};
use crate::repositories::{MeetingRepository, RegistrantRepository};
use crate::worker_pool::{self, WorkerPool};

use super::committee_sync::CommitteeSync;
use super::payloads::{parse_meeting_uid, MeetingCreatedPayload, MeetingDeletedPayload, MeetingUpdatedPayload};

pub struct MeetingLifecycleHandler {
    meetings: Arc<dyn MeetingRepository>,
    registrants: Arc<dyn RegistrantRepository>,
    index: Arc<dyn IndexSender>,
    access: Arc<dyn AccessSender>,
    lifecycle: Arc<dyn LifecycleEventSender>,
    committee_sync: Arc<CommitteeSync>,
    worker_pool: WorkerPool,
}

impl MeetingLifecycleHandler {
    pub fn new(
        meetings: Arc<dyn MeetingRepository>,
        registrants: Arc<dyn RegistrantRepository>,
        index: Arc<dyn IndexSender>,
        access: Arc<dyn AccessSender>,
        lifecycle: Arc<dyn LifecycleEventSender>,
        committee_sync: Arc<CommitteeSync>,
        worker_pool: WorkerPool,
    ) -> Self {
        Self {
            meetings,
            registrants,
            index,
            access,
            lifecycle,
            committee_sync,
            worker_pool,
        }
    }

    /// Resolve the only field this request/reply subject exposes. A
    /// compile-time match rather than runtime reflection over `Meeting`'s
    /// fields.
    fn requested_field(meeting: &Meeting) -> Vec<u8> {
        meeting.title.clone().into_bytes()
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_meeting_get_title(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let meeting_uid = parse_meeting_uid(payload)?;
        let meeting = self.meetings.get(&meeting_uid.to_string()).await?;
        Ok(Some(Self::requested_field(&meeting)))
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_meeting_deleted(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let event: MeetingDeletedPayload = super::payloads::parse_json(payload)?;
        let registrants = self.registrants.list_by_meeting(&event.meeting_uid).await?;
        if registrants.is_empty() {
            return Ok(None);
        }

        let tasks = registrants.into_iter().map(|registrant| {
            let registrants_repo = self.registrants.clone();
            let index = self.index.clone();
            let access = self.access.clone();
            let lifecycle = self.lifecycle.clone();
            let meeting_uid = event.meeting_uid.clone();
            worker_pool::boxed(async move {
                registrants_repo.delete_skip_revision_check(&registrant.uid).await?;
                index.index_delete("meeting_registrant", &registrant.uid, false).await?;
                access.access_remove(&registrant.uid, &meeting_uid, "registrant", false).await?;
                lifecycle.send_cancellation_email(&registrant.email, &meeting_uid, false).await?;
                Ok(())
            })
        });

        if let Some(err) = self.worker_pool.run_until_first_error(CancellationToken::new(), tasks).await {
            return Err(err);
        }
        Ok(None)
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_meeting_created(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let event: MeetingCreatedPayload = super::payloads::parse_json(payload)?;
        self.committee_sync.sync_meeting_committees(&event.meeting, &[]).await?;
        Ok(None)
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_meeting_updated(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let event: MeetingUpdatedPayload = super::payloads::parse_json(payload)?;

        if !event.changes.is_empty() {
            let registrants = self.registrants.list_by_meeting(&event.updated.uid).await?;

            let tasks = registrants.into_iter().map(|registrant| {
                let lifecycle = self.lifecycle.clone();
                let meeting = event.updated.clone();
                let changed_fields = event.changes.clone();
                worker_pool::boxed(async move {
                    lifecycle
                        .send_updated_invitation_email(&registrant.email, &meeting, &changed_fields, false)
                        .await
                })
            });
            if let Some(err) = self.worker_pool.run_until_first_error(CancellationToken::new(), tasks).await {
                return Err(err);
            }
        }

        self.committee_sync
            .sync_meeting_committees(&event.updated, &event.previous.committees)
            .await?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::domain::{MeetingType, Platform, Registrant, RegistrantType, Revision, Visibility, ZoomConfig};
    use crate::messaging::InMemoryMessagingClient;
    use crate::repositories::{InMemoryMeetingRepository, InMemoryMeetingSettingsRepository, InMemoryRegistrantRepository};
    use chrono::Utc;

    fn meeting(uid: &str) -> Meeting {
        Meeting {
            uid: uid.into(),
            project_uid: "p1".into(),
            title: "Board Meeting".into(),
            description: "d".into(),
            start_time: Utc::now(),
            duration_minutes: 30,
            timezone: "UTC".into(),
            recurrence: None,
            committees: vec![],
            visibility: Visibility::Public,
            restricted: false,
            meeting_type: MeetingType::Other,
            platform: Platform::Zoom,
            zoom_config: ZoomConfig {
                meeting_id: "1".into(),
                passcode: None,
                ai_summary_require_approval: false,
            },
            early_join_minutes: 0,
            recording_enabled: false,
            transcript_enabled: false,
            youtube_upload_enabled: false,
            artifact_visibility: Visibility::Public,
            password: None,
            occurrences: vec![],
            revision: Revision(1),
        }
    }

    fn harness() -> (MeetingLifecycleHandler, Arc<InMemoryMeetingRepository>, Arc<InMemoryRegistrantRepository>, Arc<InMemoryMessagingClient>) {
        let meetings = Arc::new(InMemoryMeetingRepository::new());
        let registrants = Arc::new(InMemoryRegistrantRepository::new());
        let settings = Arc::new(InMemoryMeetingSettingsRepository::new());
        let messaging = Arc::new(InMemoryMessagingClient::new());
        let committee_sync = Arc::new(CommitteeSync::new(
            meetings.clone(),
            registrants.clone(),
            settings,
            messaging.clone(),
            messaging.clone(),
            messaging.clone(),
            messaging.clone(),
            WorkerPool::new(4),
            CoreConfig::default(),
        ));
        let handler = MeetingLifecycleHandler::new(
            meetings.clone(),
            registrants.clone(),
            messaging.clone(),
            messaging.clone(),
            messaging.clone(),
            committee_sync,
            WorkerPool::new(4),
        );
        (handler, meetings, registrants, messaging)
    }

    #[tokio::test]
    async fn get_title_returns_title_bytes() {
        let (handler, meetings, _registrants, _messaging) = harness();
        let m = meeting("11111111-1111-1111-1111-111111111111");
        meetings.create(m.clone()).await.unwrap();
        let reply = handler.handle_meeting_get_title(m.uid.as_bytes()).await.unwrap();
        assert_eq!(reply.unwrap(), b"Board Meeting".to_vec());
    }

    #[tokio::test]
    async fn get_title_rejects_malformed_uuid() {
        let (handler, _meetings, _registrants, _messaging) = harness();
        let err = handler.handle_meeting_get_title(b"nope").await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::Kind::Validation);
    }

    #[tokio::test]
    async fn meeting_deleted_removes_all_registrants() {
        let (handler, meetings, registrants, messaging) = harness();
        let m = meeting("m1");
        meetings.create(m).await.unwrap();
        registrants
            .create(Registrant {
                uid: "r1".into(),
                meeting_uid: "m1".into(),
                email: "a@example.com".into(),
                first_name: "A".into(),
                last_name: "B".into(),
                username: None,
                host: false,
                registrant_type: RegistrantType::Direct,
                committee_uid: None,
                org_name: None,
                job_title: None,
                revision: Revision::NONE,
            })
            .await
            .unwrap();

        let event = serde_json::json!({ "meeting_uid": "m1" }).to_string();
        handler.handle_meeting_deleted(event.as_bytes()).await.unwrap();
        assert!(registrants.get("r1").await.is_err());
        assert_eq!(messaging.sent().len(), 3);
    }

    #[tokio::test]
    async fn meeting_deleted_succeeds_despite_concurrent_registrant_mutation() {
        let (handler, meetings, registrants, _messaging) = harness();
        let m = meeting("m1");
        meetings.create(m).await.unwrap();
        let created = registrants
            .create(Registrant {
                uid: "r1".into(),
                meeting_uid: "m1".into(),
                email: "a@example.com".into(),
                first_name: "A".into(),
                last_name: "B".into(),
                username: None,
                host: false,
                registrant_type: RegistrantType::Direct,
                committee_uid: None,
                org_name: None,
                job_title: None,
                revision: Revision::NONE,
            })
            .await
            .unwrap();

        // Simulate a concurrent handler (e.g. committee sync) mutating this
        // registrant between the `list_by_meeting` read and the teardown
        // delete below, so the revision `list_by_meeting` observed is stale.
        registrants
            .update(&created.uid, created.revision, created.clone())
            .await
            .unwrap();

        let event = serde_json::json!({ "meeting_uid": "m1" }).to_string();
        handler.handle_meeting_deleted(event.as_bytes()).await.unwrap();
        assert!(registrants.get("r1").await.is_err());
    }

    #[tokio::test]
    async fn meeting_deleted_on_empty_registrants_is_a_no_op() {
        let (handler, meetings, _registrants, _messaging) = harness();
        meetings.create(meeting("m1")).await.unwrap();
        let event = serde_json::json!({ "meeting_uid": "m1" }).to_string();
        let result = handler.handle_meeting_deleted(event.as_bytes()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn meeting_updated_sends_invitation_updates_when_changes_present() {
        let (handler, meetings, registrants, messaging) = harness();
        let m = meeting("m1");
        meetings.create(m.clone()).await.unwrap();
        registrants
            .create(Registrant {
                uid: "r1".into(),
                meeting_uid: "m1".into(),
                email: "a@example.com".into(),
                first_name: "A".into(),
                last_name: "B".into(),
                username: None,
                host: false,
                registrant_type: RegistrantType::Direct,
                committee_uid: None,
                org_name: None,
                job_title: None,
                revision: Revision::NONE,
            })
            .await
            .unwrap();

        let mut updated = m.clone();
        updated.title = "New Title".into();
        let event = serde_json::json!({
            "previous": m,
            "updated": updated,
            "changes": { "title": "New Title" },
        })
        .to_string();
        handler.handle_meeting_updated(event.as_bytes()).await.unwrap();
        let sent = messaging.sent();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            crate::messaging::SentMessage::UpdatedInvitationEmail {
                meeting_uid,
                meeting_snapshot,
                changed_fields,
                ..
            } => {
                assert_eq!(meeting_uid, "m1");
                assert_eq!(meeting_snapshot["title"], "New Title");
                assert_eq!(changed_fields.get("title").unwrap(), "New Title");
            }
            other => panic!("expected UpdatedInvitationEmail, got {other:?}"),
        }
    }
}
