//! Bootstrap entry point.
//!
//! The pub/sub broker and the key-value store's wire protocol are external
//! collaborators this crate does not implement (see the crate root docs):
//! this binary wires the engine to the in-memory fakes used elsewhere in the
//! crate and blocks until shutdown, so that `meeting_core::Core` is
//! reachable as a standalone process while a real transport integration is
//! plugged in around it.

use std::sync::Arc;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meeting_core::config::CoreConfig;
use meeting_core::messaging::{
    InMemoryMessagingClient, MeteredAccessSender, MeteredIndexSender, MeteredLifecycleEventSender,
    MeteredWebhookEventSender,
};
use meeting_core::repositories::{
    InMemoryMeetingRepository, InMemoryMeetingSettingsRepository,
    InMemoryPastMeetingParticipantRepository, InMemoryPastMeetingRecordingRepository,
    InMemoryPastMeetingRepository, InMemoryPastMeetingSummaryRepository,
    InMemoryPastMeetingTranscriptRepository, InMemoryRegistrantRepository,
};
use meeting_core::{Core, MessagingClients, Repositories};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meeting_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting meeting core");

    let config = CoreConfig::from_env()?;
    info!(instance_id = %config.instance_id, worker_pool_size = config.worker_pool_size, "configuration loaded");

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

    let fakes = Arc::new(InMemoryMessagingClient::new());
    let messaging = MessagingClients {
        index: Arc::new(MeteredIndexSender(fakes.clone())),
        access: Arc::new(MeteredAccessSender(fakes.clone())),
        lifecycle: Arc::new(MeteredLifecycleEventSender(fakes.clone())),
        webhook: Arc::new(MeteredWebhookEventSender(fakes.clone())),
        external: fakes,
    };

    let core = Core::new(repos, messaging, config);
    info!(ready = core.dispatcher.ready(), "meeting core dispatcher wired");

    signal::ctrl_c().await?;
    info!("shutdown signal received");

    Ok(())
}
