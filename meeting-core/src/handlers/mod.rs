//! Typed per-subject handlers (C7, C8, C9) that the subject dispatcher (C10)
//! routes messages to.

pub mod committee_sync;
pub mod meeting_lifecycle;
pub mod past_meeting;
pub mod payloads;

pub use committee_sync::CommitteeSync;
pub use meeting_lifecycle::MeetingLifecycleHandler;
pub use past_meeting::PastMeetingAggregator;
