//! Core data model: the entity set the reconciliation engine reads
//! and mutates through the repository contracts (C4).

mod artifacts;
mod meeting;
mod occurrence;
mod participant;
mod past_meeting;
mod recurrence;
mod registrant;
mod revision;

pub use artifacts::{
    FileType, PastMeetingRecording, PastMeetingSummary, PastMeetingTranscript, RecordingFile,
};
pub use meeting::{
    Committee, Meeting, MeetingSettings, MeetingType, Platform, Visibility, ZoomConfig,
};
pub use occurrence::Occurrence;
pub use participant::{ParticipantSession, PastMeetingParticipant};
pub use past_meeting::{PastMeeting, Session};
pub use recurrence::{EndCondition, MonthlyRule, Recurrence, RecurrenceType, WeeklyDays};
pub use registrant::{Registrant, RegistrantType};
pub use revision::Revision;
