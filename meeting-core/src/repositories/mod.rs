//! Repository contracts (C4): one narrow `async_trait` per aggregate rather
//! than a single catch-all store, each with an in-memory implementation
//! used in tests and by the default wiring in [`crate::Core`].

mod artifacts;
mod meeting;
pub mod memory;
mod participant;
mod past_meeting;
mod registrant;

pub use artifacts::{
    InMemoryPastMeetingRecordingRepository, InMemoryPastMeetingSummaryRepository,
    InMemoryPastMeetingTranscriptRepository, PastMeetingRecordingRepository,
    PastMeetingSummaryRepository, PastMeetingTranscriptRepository,
};
pub use meeting::{
    InMemoryMeetingRepository, InMemoryMeetingSettingsRepository, MeetingRepository,
    MeetingSettingsRepository,
};
pub use participant::{InMemoryPastMeetingParticipantRepository, PastMeetingParticipantRepository};
pub use past_meeting::{InMemoryPastMeetingRepository, PastMeetingRepository};
pub use registrant::{InMemoryRegistrantRepository, RegistrantRepository};
