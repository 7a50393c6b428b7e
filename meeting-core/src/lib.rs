//! Event-driven meeting-lifecycle reconciliation core.
//!
//! This crate owns the engine described by the module table in `DESIGN.md`:
//! domain types and revisioned repository contracts (C3/C4), a bounded
//! worker pool (C1), a tagged error taxonomy (C2), typed messaging fan-out
//! (C5), the occurrence calculator/binder (C6), the three event-driven
//! handlers (C7/C8/C9), and the subject dispatcher that routes messages to
//! them (C10). The pub/sub transport, the key-value store's wire protocol,
//! and HTTP/REST are external collaborators the core consumes through the
//! narrow traits in [`repositories`] and [`messaging`], not things this
//! crate implements.

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod messaging;
pub mod observability;
pub mod occurrence;
pub mod repositories;
pub mod worker_pool;

use std::sync::Arc;

use config::CoreConfig;
use dispatch::SubjectDispatcher;
use handlers::{CommitteeSync, MeetingLifecycleHandler, PastMeetingAggregator};
use messaging::{
    AccessSender, ExternalLookup, IndexSender, LifecycleEventSender, WebhookEventSender,
};
use repositories::{
    MeetingRepository, MeetingSettingsRepository, PastMeetingParticipantRepository,
    PastMeetingRecordingRepository, PastMeetingRepository, PastMeetingSummaryRepository,
    PastMeetingTranscriptRepository, RegistrantRepository,
};
use worker_pool::WorkerPool;

/// Every repository contract the engine needs, grouped for one-shot
/// construction: one trait per aggregate, no catch-all store.
pub struct Repositories {
    pub meetings: Arc<dyn MeetingRepository>,
    pub meeting_settings: Arc<dyn MeetingSettingsRepository>,
    pub registrants: Arc<dyn RegistrantRepository>,
    pub past_meetings: Arc<dyn PastMeetingRepository>,
    pub participants: Arc<dyn PastMeetingParticipantRepository>,
    pub recordings: Arc<dyn PastMeetingRecordingRepository>,
    pub transcripts: Arc<dyn PastMeetingTranscriptRepository>,
    pub summaries: Arc<dyn PastMeetingSummaryRepository>,
}

/// Every messaging contract the engine needs. Callers are
/// expected to hand in the metered decorators from [`messaging::metered`]
/// when they want `meeting_core_fanout_total` populated; the engine itself
/// is agnostic to whether a sender is metered.
pub struct MessagingClients {
    pub index: Arc<dyn IndexSender>,
    pub access: Arc<dyn AccessSender>,
    pub lifecycle: Arc<dyn LifecycleEventSender>,
    pub webhook: Arc<dyn WebhookEventSender>,
    pub external: Arc<dyn ExternalLookup>,
}

/// The assembled engine: the three handlers (C7/C8/C9) behind one dispatcher
/// (C10), sharing one worker pool (C1) and one config (A1).
pub struct Core {
    pub dispatcher: SubjectDispatcher,
    pub past_meeting_aggregator: Arc<PastMeetingAggregator>,
    pub committee_sync: Arc<CommitteeSync>,
    pub meeting_lifecycle: Arc<MeetingLifecycleHandler>,
}

impl Core {
    /// Wire repositories and messaging clients into the three handlers and
    /// register every consumed subject against its handler.
    pub fn new(repos: Repositories, messaging: MessagingClients, config: CoreConfig) -> Self {
        let worker_pool = WorkerPool::new(config.worker_pool_size);

        let past_meeting_aggregator = Arc::new(PastMeetingAggregator::new(
            repos.meetings.clone(),
            repos.past_meetings,
            repos.registrants.clone(),
            repos.participants,
            repos.recordings,
            repos.transcripts,
            repos.summaries,
            worker_pool.clone(),
            config.clone(),
        ));

        let committee_sync = Arc::new(CommitteeSync::new(
            repos.meetings.clone(),
            repos.registrants.clone(),
            repos.meeting_settings,
            messaging.index.clone(),
            messaging.access.clone(),
            messaging.lifecycle.clone(),
            messaging.external,
            worker_pool.clone(),
            config.clone(),
        ));

        let meeting_lifecycle = Arc::new(MeetingLifecycleHandler::new(
            repos.meetings,
            repos.registrants,
            messaging.index,
            messaging.access,
            messaging.lifecycle,
            committee_sync.clone(),
            worker_pool,
        ));

        let mut dispatcher = SubjectDispatcher::new();
        register_routes(&mut dispatcher, &past_meeting_aggregator, &committee_sync, &meeting_lifecycle);

        Self {
            dispatcher,
            past_meeting_aggregator,
            committee_sync,
            meeting_lifecycle,
        }
    }
}

/// Bind every consumed subject to its handler. The one reply-expecting
/// subject is `meeting.get_title`; everything else is fire-and-forget.
fn register_routes(
    dispatcher: &mut SubjectDispatcher,
    past_meeting: &Arc<PastMeetingAggregator>,
    committee: &Arc<CommitteeSync>,
    lifecycle: &Arc<MeetingLifecycleHandler>,
) {
    let h = lifecycle.clone();
    dispatcher.register("meeting.get_title", true, move |payload| {
        let h = h.clone();
        async move { h.handle_meeting_get_title(&payload).await }
    });

    let h = lifecycle.clone();
    dispatcher.register("meeting.deleted", false, move |payload| {
        let h = h.clone();
        async move { h.handle_meeting_deleted(&payload).await }
    });

    let h = lifecycle.clone();
    dispatcher.register("meeting.created", false, move |payload| {
        let h = h.clone();
        async move { h.handle_meeting_created(&payload).await }
    });

    let h = lifecycle.clone();
    dispatcher.register("meeting.updated", false, move |payload| {
        let h = h.clone();
        async move { h.handle_meeting_updated(&payload).await }
    });

    let h = committee.clone();
    dispatcher.register("committee_member.created", false, move |payload| {
        let h = h.clone();
        async move { h.handle_committee_member_created(&payload).await }
    });

    let h = committee.clone();
    dispatcher.register("committee_member.updated", false, move |payload| {
        let h = h.clone();
        async move { h.handle_committee_member_updated(&payload).await }
    });

    let h = committee.clone();
    dispatcher.register("committee_member.deleted", false, move |payload| {
        let h = h.clone();
        async move { h.handle_committee_member_deleted(&payload).await }
    });

    let h = committee.clone();
    dispatcher.register("project_settings.updated", false, move |payload| {
        let h = h.clone();
        async move { h.handle_project_settings_updated(&payload).await }
    });

    let h = past_meeting.clone();
    dispatcher.register("zoom.webhook.meeting.started", false, move |payload| {
        let h = h.clone();
        async move { h.handle_meeting_started(&payload).await }
    });

    let h = past_meeting.clone();
    dispatcher.register("zoom.webhook.meeting.ended", false, move |payload| {
        let h = h.clone();
        async move { h.handle_meeting_ended(&payload).await }
    });

    let h = past_meeting.clone();
    dispatcher.register("zoom.webhook.meeting.deleted", false, move |payload| {
        let h = h.clone();
        async move { h.handle_webhook_meeting_deleted(&payload).await }
    });

    let h = past_meeting.clone();
    dispatcher.register(
        "zoom.webhook.meeting.participant_joined",
        false,
        move |payload| {
            let h = h.clone();
            async move { h.handle_participant_joined(&payload).await }
        },
    );

    let h = past_meeting.clone();
    dispatcher.register(
        "zoom.webhook.meeting.participant_left",
        false,
        move |payload| {
            let h = h.clone();
            async move { h.handle_participant_left(&payload).await }
        },
    );

    let h = past_meeting.clone();
    dispatcher.register("zoom.webhook.recording.completed", false, move |payload| {
        let h = h.clone();
        async move { h.handle_recording_completed(&payload).await }
    });

    let h = past_meeting.clone();
    dispatcher.register(
        "zoom.webhook.recording.transcript_completed",
        false,
        move |payload| {
            let h = h.clone();
            async move { h.handle_transcript_completed(&payload).await }
        },
    );

    let h = past_meeting.clone();
    dispatcher.register(
        "zoom.webhook.meeting.summary_completed",
        false,
        move |payload| {
            let h = h.clone();
            async move { h.handle_summary_completed(&payload).await }
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch::{DispatchOutcome, Message};
    use messaging::InMemoryMessagingClient;
    use repositories::{
        InMemoryMeetingRepository, InMemoryMeetingSettingsRepository,
        InMemoryPastMeetingParticipantRepository, InMemoryPastMeetingRecordingRepository,
        InMemoryPastMeetingRepository, InMemoryPastMeetingSummaryRepository,
        InMemoryPastMeetingTranscriptRepository, InMemoryRegistrantRepository,
    };

    fn build_core() -> Core {
        let repos = Repositories {
            meetings: Arc::new(InMemoryMeetingRepository::new()),
            meeting_settings: Arc::new(InMemoryMeetingSettingsRepository::new()),
            registrants: Arc::new(InMemoryRegistrantRepository::new()),
            past_meetings: Arc::new(InMemoryPastMeetingRepository::new()),
            participants: Arc::new(InMemoryPastMeetingParticipantRepository::new()),
            recordings: Arc::new(InMemoryPastMeetingRecordingRepository::new()),
            transcripts: Arc::new(InMemoryPastMeetingTranscriptRepository::new()),
            summaries: Arc::new(InMemoryPastMeetingSummaryRepository::new()),
        };
        let memory = Arc::new(InMemoryMessagingClient::new());
        let messaging = MessagingClients {
            index: Arc::new(messaging::MeteredIndexSender(memory.clone())),
            access: Arc::new(messaging::MeteredAccessSender(memory.clone())),
            lifecycle: Arc::new(messaging::MeteredLifecycleEventSender(memory.clone())),
            webhook: Arc::new(messaging::MeteredWebhookEventSender(memory.clone())),
            external: memory,
        };
        Core::new(repos, messaging, CoreConfig::default())
    }

    #[tokio::test]
    async fn dispatcher_routes_every_documented_subject_without_panicking() {
        let core = build_core();
        let subjects = [
            "meeting.get_title",
            "meeting.deleted",
            "meeting.created",
            "meeting.updated",
            "committee_member.created",
            "committee_member.updated",
            "committee_member.deleted",
            "project_settings.updated",
            "zoom.webhook.meeting.started",
            "zoom.webhook.meeting.ended",
            "zoom.webhook.meeting.deleted",
            "zoom.webhook.meeting.participant_joined",
            "zoom.webhook.meeting.participant_left",
            "zoom.webhook.recording.completed",
            "zoom.webhook.recording.transcript_completed",
            "zoom.webhook.meeting.summary_completed",
        ];
        // Malformed payloads on every registered subject are a Validation
        // error, which both reply and fire-and-forget subjects ack nil for.
        for subject in subjects {
            let outcome = core
                .dispatcher
                .dispatch(Message::new(subject, b"not json".to_vec()))
                .await;
            assert_eq!(outcome, DispatchOutcome::Acked { reply: None }, "{subject}");
        }
    }

    #[tokio::test]
    async fn unknown_subject_is_acked_nil() {
        let core = build_core();
        let outcome = core
            .dispatcher
            .dispatch(Message::new("unknown.subject", vec![]))
            .await;
        assert_eq!(outcome, DispatchOutcome::Acked { reply: None });
    }
}
