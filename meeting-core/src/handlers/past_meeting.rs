//! Past-meeting aggregator (C7): merges the eight Zoom webhook lifecycle
//! subjects into a single coherent [`PastMeeting`] aggregate.
//!
//! Every entry point binds the webhook's `(platform_meeting_id,
//! actual_start_time)` to a canonical occurrence id via [`crate::occurrence`]
//! (C6) before touching the store, so repeated or out-of-order deliveries
//! for the same instance collapse onto one record.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::domain::{
    FileType, Meeting, PastMeeting, PastMeetingParticipant, PastMeetingRecording,
    PastMeetingSummary, PastMeetingTranscript, ParticipantSession, RecordingFile, Revision,
    Session,
};
use crate::errors::{CoreError, Kind, Result};
use crate::observability::metrics as obs_metrics;
use crate::occurrence;
use crate::repositories::{
    MeetingRepository, PastMeetingParticipantRepository, PastMeetingRecordingRepository,
    PastMeetingRepository, PastMeetingSummaryRepository, PastMeetingTranscriptRepository,
    RegistrantRepository,
};
use crate::worker_pool::{self, WorkerPool};

use super::payloads::{
    ZoomEnvelope, ZoomMeetingDeletedObject, ZoomMeetingEndedObject, ZoomMeetingStartedObject,
    ZoomParticipantJoinedObject, ZoomParticipantLeftObject, ZoomRecordingCompletedObject,
    ZoomRecordingFileObject, ZoomSummaryCompletedObject, ZoomTranscriptCompletedObject,
};

/// Strip a trailing `(Org Name)` suffix Zoom appends to display names (spec
/// §4.7, "after stripping `(…)` organization suffix from platform display
/// name").
fn strip_org_suffix(display_name: &str) -> String {
    match display_name.find('(') {
        Some(idx) => display_name[..idx].trim().to_string(),
        None => display_name.trim().to_string(),
    }
}

/// Split a display name into first/last on the first whitespace boundary.
fn split_display_name(display_name: &str) -> (String, String) {
    let trimmed = display_name.trim();
    match trimmed.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

fn parse_file_type(raw: &str) -> FileType {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).unwrap_or(FileType::Other)
}

fn split_files(files: &[ZoomRecordingFileObject]) -> (Vec<RecordingFile>, Vec<RecordingFile>) {
    let mut recording_files = Vec::new();
    let mut transcript_files = Vec::new();
    for file in files {
        let file_type = parse_file_type(&file.file_type);
        let converted = RecordingFile {
            file_type,
            download_url: file.download_url.clone(),
            file_size: file.file_size,
        };
        if file_type.is_transcript_file() {
            transcript_files.push(converted);
        } else {
            recording_files.push(converted);
        }
    }
    (recording_files, transcript_files)
}

fn occurrence_start_time(occurrence_id: &str) -> Result<DateTime<Utc>> {
    let secs: i64 = occurrence_id
        .parse()
        .map_err(|_| CoreError::internal(format!("occurrence_id '{occurrence_id}' is not a unix timestamp")))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| CoreError::internal(format!("occurrence_id '{occurrence_id}' out of range")))
}

/// Matches an existing participant by case-insensitive email first, falling
/// back to a case-insensitive full-name match ("participant.joined").
fn match_participant<'a>(
    existing: &'a [PastMeetingParticipant],
    email: &Option<String>,
    display_name: &str,
) -> Option<&'a PastMeetingParticipant> {
    if let Some(email) = email {
        let email_key = email.to_ascii_lowercase();
        if let Some(found) = existing.iter().find(|p| p.email_key() == email_key) {
            return Some(found);
        }
    }
    let full_name_key = strip_org_suffix(display_name).to_ascii_lowercase();
    existing.iter().find(|p| p.full_name_key() == full_name_key)
}

pub struct PastMeetingAggregator {
    meetings: Arc<dyn MeetingRepository>,
    past_meetings: Arc<dyn PastMeetingRepository>,
    registrants: Arc<dyn RegistrantRepository>,
    participants: Arc<dyn PastMeetingParticipantRepository>,
    recordings: Arc<dyn PastMeetingRecordingRepository>,
    transcripts: Arc<dyn PastMeetingTranscriptRepository>,
    summaries: Arc<dyn PastMeetingSummaryRepository>,
    worker_pool: WorkerPool,
    config: CoreConfig,
}

impl PastMeetingAggregator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        meetings: Arc<dyn MeetingRepository>,
        past_meetings: Arc<dyn PastMeetingRepository>,
        registrants: Arc<dyn RegistrantRepository>,
        participants: Arc<dyn PastMeetingParticipantRepository>,
        recordings: Arc<dyn PastMeetingRecordingRepository>,
        transcripts: Arc<dyn PastMeetingTranscriptRepository>,
        summaries: Arc<dyn PastMeetingSummaryRepository>,
        worker_pool: WorkerPool,
        config: CoreConfig,
    ) -> Self {
        Self {
            meetings,
            past_meetings,
            registrants,
            participants,
            recordings,
            transcripts,
            summaries,
            worker_pool,
            config,
        }
    }

    fn bind(&self, meeting: &Meeting, actual_start_time: DateTime<Utc>) -> Result<String> {
        occurrence::bind(
            meeting,
            actual_start_time,
            self.config.occurrence_binder_search_window_days,
            self.config.occurrence_binder_candidate_limit,
        )
    }

    async fn find_meeting(&self, platform_meeting_id: &str) -> Result<Option<Meeting>> {
        self.meetings.get_by_platform_meeting_id(platform_meeting_id).await
    }

    fn new_past_meeting(&self, meeting: &Meeting, occurrence_id: &str, session: Session) -> Result<PastMeeting> {
        let scheduled_start_time = occurrence_start_time(occurrence_id)?;
        let scheduled_end_time = scheduled_start_time + Duration::minutes(meeting.duration_minutes as i64);
        Ok(PastMeeting {
            uid: Uuid::new_v4().to_string(),
            meeting_uid: meeting.uid.clone(),
            occurrence_id: occurrence_id.to_string(),
            scheduled_start_time,
            scheduled_end_time,
            duration_minutes: meeting.duration_minutes,
            timezone: meeting.timezone.clone(),
            title: meeting.title.clone(),
            description: meeting.description.clone(),
            committees: meeting.committees.clone(),
            platform: meeting.platform,
            platform_meeting_id: meeting.zoom_config.meeting_id.clone(),
            sessions: vec![session],
            recording_uids: vec![],
            transcript_uids: vec![],
            summary_uids: vec![],
            revision: Revision::NONE,
        })
    }

    /// Create one [`PastMeetingParticipant`] per current registrant of the
    /// meeting, concurrently with collect-all semantics.
    async fn materialize_participants(&self, past_meeting: &PastMeeting) {
        let registrants = match self.registrants.list_by_meeting(&past_meeting.meeting_uid).await {
            Ok(registrants) => registrants,
            Err(err) => {
                warn!(error = %err, "failed to list registrants while materializing past meeting participants");
                return;
            }
        };
        if registrants.is_empty() {
            return;
        }

        let tasks = registrants.into_iter().map(|registrant| {
            let participants = self.participants.clone();
            let past_meeting_uid = past_meeting.uid.clone();
            let meeting_uid = past_meeting.meeting_uid.clone();
            worker_pool::boxed(async move {
                let participant = PastMeetingParticipant {
                    uid: Uuid::new_v4().to_string(),
                    past_meeting_uid,
                    meeting_uid,
                    email: registrant.email,
                    first_name: registrant.first_name,
                    last_name: registrant.last_name,
                    is_invited: true,
                    is_attended: false,
                    sessions: vec![],
                    revision: Revision::NONE,
                };
                participants.create(participant).await.map(|_| ())
            })
        });

        let errors = self.worker_pool.run_all(CancellationToken::new(), tasks).await;
        for error in errors {
            warn!(error = %error, "failed to materialize a past meeting participant");
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_meeting_started(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let envelope = ZoomEnvelope::parse(payload)?;
        let object: ZoomMeetingStartedObject = envelope.object_as()?;

        let Some(meeting) = self.find_meeting(&object.id).await? else {
            warn!(platform_meeting_id = %object.id, "meeting.started for unknown platform meeting; dropping");
            return Ok(None);
        };
        let occurrence_id = self.bind(&meeting, object.start_time)?;
        let session = Session {
            uid: object.uuid.clone(),
            start_time: Some(object.start_time),
            end_time: None,
        };

        let mut attempts = 0u32;
        loop {
            let existing = self
                .past_meetings
                .get_by_platform_meeting_id_and_occurrence(&meeting.zoom_config.meeting_id, &occurrence_id)
                .await?;
            match existing {
                None => {
                    let past_meeting = self.new_past_meeting(&meeting, &occurrence_id, session.clone())?;
                    match self.past_meetings.create(past_meeting).await {
                        Ok(created) => {
                            self.materialize_participants(&created).await;
                            return Ok(None);
                        }
                        Err(err) if err.kind() == Kind::Conflict && attempts < self.config.conflict_retry_limit => {
                            attempts += 1;
                            obs_metrics::record_conflict_retry("past_meeting");
                            continue;
                        }
                        Err(err) => return Err(err),
                    }
                }
                Some(mut past_meeting) => {
                    past_meeting.upsert_session(session.clone());
                    let expected = past_meeting.revision;
                    match self.past_meetings.update(&past_meeting.uid, expected, past_meeting).await {
                        Ok(_) => return Ok(None),
                        Err(err) if err.kind() == Kind::Conflict && attempts < self.config.conflict_retry_limit => {
                            attempts += 1;
                            obs_metrics::record_conflict_retry("past_meeting");
                            continue;
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_meeting_ended(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let envelope = ZoomEnvelope::parse(payload)?;
        let object: ZoomMeetingEndedObject = envelope.object_as()?;

        let Some(meeting) = self.find_meeting(&object.id).await? else {
            warn!(platform_meeting_id = %object.id, "meeting.ended for unknown platform meeting; dropping");
            return Ok(None);
        };
        let occurrence_id = self.bind(&meeting, object.start_time)?;

        let mut attempts = 0u32;
        loop {
            let existing = self
                .past_meetings
                .get_by_platform_meeting_id_and_occurrence(&meeting.zoom_config.meeting_id, &occurrence_id)
                .await?;
            match existing {
                None => {
                    // meeting.started was missed: perform the full create path,
                    // then stamp end_time on the freshly created session.
                    let session = Session {
                        uid: object.uuid.clone(),
                        start_time: Some(object.start_time),
                        end_time: Some(object.end_time),
                    };
                    let past_meeting = self.new_past_meeting(&meeting, &occurrence_id, session)?;
                    match self.past_meetings.create(past_meeting).await {
                        Ok(created) => {
                            self.materialize_participants(&created).await;
                            return Ok(None);
                        }
                        Err(err) if err.kind() == Kind::Conflict && attempts < self.config.conflict_retry_limit => {
                            attempts += 1;
                            obs_metrics::record_conflict_retry("past_meeting");
                            continue;
                        }
                        Err(err) => return Err(err),
                    }
                }
                Some(mut past_meeting) => {
                    if let Some(session) = past_meeting.session_mut(&object.uuid) {
                        session.end_time = Some(object.end_time);
                        if session.start_time.is_none() {
                            session.start_time = Some(object.start_time);
                        }
                    } else {
                        past_meeting.sessions.push(Session {
                            uid: object.uuid.clone(),
                            start_time: Some(object.start_time),
                            end_time: Some(object.end_time),
                        });
                    }
                    let expected = past_meeting.revision;
                    match self.past_meetings.update(&past_meeting.uid, expected, past_meeting).await {
                        Ok(_) => return Ok(None),
                        Err(err) if err.kind() == Kind::Conflict && attempts < self.config.conflict_retry_limit => {
                            attempts += 1;
                            obs_metrics::record_conflict_retry("past_meeting");
                            continue;
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_webhook_meeting_deleted(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let envelope = ZoomEnvelope::parse(payload)?;
        let object: ZoomMeetingDeletedObject = envelope.object_as()?;
        tracing::info!(platform_meeting_id = %object.id, "zoom webhook meeting.deleted received; no state change");
        Ok(None)
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_participant_joined(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let envelope = ZoomEnvelope::parse(payload)?;
        let object: ZoomParticipantJoinedObject = envelope.object_as()?;

        let Some(meeting) = self.find_meeting(&object.id).await? else {
            warn!(platform_meeting_id = %object.id, "participant.joined for unknown platform meeting; dropping");
            return Ok(None);
        };
        let occurrence_id = self.bind(&meeting, object.start_time)?;
        let Some(past_meeting) = self
            .past_meetings
            .get_by_platform_meeting_id_and_occurrence(&meeting.zoom_config.meeting_id, &occurrence_id)
            .await?
        else {
            warn!("participant.joined for unknown past meeting; dropping");
            return Ok(None);
        };

        let display_name = strip_org_suffix(&object.participant.user_name);
        let existing = self.participants.list_by_past_meeting(&past_meeting.uid).await?;

        if let Some(found) = match_participant(&existing, &object.participant.email, &display_name) {
            let mut updated = found.clone();
            updated.is_attended = true;
            if updated.session_mut(&object.participant.participant_uuid).is_none() {
                updated.sessions.push(ParticipantSession {
                    uid: object.participant.participant_uuid.clone(),
                    join_time: Some(object.participant.join_time),
                    leave_time: None,
                    leave_reason: None,
                });
            }
            let expected = updated.revision;
            self.participants.update(&updated.uid, expected, updated).await?;
            return Ok(None);
        }

        let (email, first_name, last_name, is_invited) = self
            .resolve_identity(&meeting.uid, &object.participant.email, &display_name, &object.participant.participant_uuid)
            .await?;

        let participant = PastMeetingParticipant {
            uid: Uuid::new_v4().to_string(),
            past_meeting_uid: past_meeting.uid.clone(),
            meeting_uid: meeting.uid.clone(),
            email,
            first_name,
            last_name,
            is_invited,
            is_attended: true,
            sessions: vec![ParticipantSession {
                uid: object.participant.participant_uuid.clone(),
                join_time: Some(object.participant.join_time),
                leave_time: None,
                leave_reason: None,
            }],
            revision: Revision::NONE,
        };
        self.participants.create(participant).await?;
        Ok(None)
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_participant_left(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let envelope = ZoomEnvelope::parse(payload)?;
        let object: ZoomParticipantLeftObject = envelope.object_as()?;

        let Some(meeting) = self.find_meeting(&object.id).await? else {
            warn!(platform_meeting_id = %object.id, "participant.left for unknown platform meeting; dropping");
            return Ok(None);
        };
        let occurrence_id = self.bind(&meeting, object.start_time)?;
        let Some(past_meeting) = self
            .past_meetings
            .get_by_platform_meeting_id_and_occurrence(&meeting.zoom_config.meeting_id, &occurrence_id)
            .await?
        else {
            warn!("participant.left for unknown past meeting; dropping");
            return Ok(None);
        };

        let display_name = strip_org_suffix(&object.participant.user_name);
        let existing = self.participants.list_by_past_meeting(&past_meeting.uid).await?;

        if let Some(found) = match_participant(&existing, &object.participant.email, &display_name) {
            let mut updated = found.clone();
            if let Some(session) = updated.session_mut(&object.participant.participant_uuid) {
                session.leave_time = Some(object.participant.leave_time);
                session.leave_reason = object.participant.leave_reason.clone();
            } else {
                updated.sessions.push(ParticipantSession {
                    uid: object.participant.participant_uuid.clone(),
                    join_time: None,
                    leave_time: Some(object.participant.leave_time),
                    leave_reason: object.participant.leave_reason.clone(),
                });
            }
            let expected = updated.revision;
            self.participants.update(&updated.uid, expected, updated).await?;
            return Ok(None);
        }

        let (email, first_name, last_name, is_invited) = self
            .resolve_identity(&meeting.uid, &object.participant.email, &display_name, &object.participant.participant_uuid)
            .await?;

        let estimated_join_time = object.participant.leave_time - Duration::minutes(meeting.duration_minutes as i64);
        let participant = PastMeetingParticipant {
            uid: Uuid::new_v4().to_string(),
            past_meeting_uid: past_meeting.uid.clone(),
            meeting_uid: meeting.uid.clone(),
            email,
            first_name,
            last_name,
            is_invited,
            is_attended: true,
            sessions: vec![ParticipantSession {
                uid: object.participant.participant_uuid.clone(),
                join_time: Some(estimated_join_time),
                leave_time: Some(object.participant.leave_time),
                leave_reason: object.participant.leave_reason.clone(),
            }],
            revision: Revision::NONE,
        };
        self.participants.create(participant).await?;
        Ok(None)
    }

    /// Resolve identity for a newly-seen participant: a registrant match by
    /// email wins; otherwise the display name is parsed into first/last
    ///. Participants without a reported email get a stable
    /// synthetic address keyed on their platform session uuid so the
    /// per-past-meeting email uniqueness invariant still holds.
    async fn resolve_identity(
        &self,
        meeting_uid: &str,
        email: &Option<String>,
        display_name: &str,
        participant_uuid: &str,
    ) -> Result<(String, String, String, bool)> {
        if let Some(email) = email {
            if let Some(registrant) = self.registrants.get_by_meeting_and_email(meeting_uid, email).await? {
                return Ok((registrant.email, registrant.first_name, registrant.last_name, true));
            }
            let (first_name, last_name) = split_display_name(display_name);
            return Ok((email.clone(), first_name, last_name, false));
        }
        let (first_name, last_name) = split_display_name(display_name);
        let synthetic_email = format!("unknown-{participant_uuid}@zoom.invalid");
        Ok((synthetic_email, first_name, last_name, false))
    }

    async fn append_recording_uid(&self, past_meeting_uid: &str, recording_uid: &str) {
        self.append_artifact_uid(past_meeting_uid, recording_uid, |pm| &mut pm.recording_uids, |pm, uid| pm.has_recording(uid))
            .await;
    }

    async fn append_transcript_uid(&self, past_meeting_uid: &str, transcript_uid: &str) {
        self.append_artifact_uid(past_meeting_uid, transcript_uid, |pm| &mut pm.transcript_uids, |pm, uid| pm.has_transcript(uid))
            .await;
    }

    async fn append_summary_uid(&self, past_meeting_uid: &str, summary_uid: &str) {
        self.append_artifact_uid(past_meeting_uid, summary_uid, |pm| &mut pm.summary_uids, |pm, uid| pm.has_summary(uid))
            .await;
    }

    /// Best-effort, conflict-tolerant append of a derived artifact uid onto
    /// the parent [`PastMeeting`] ("best-effort, conflict-tolerant").
    async fn append_artifact_uid(
        &self,
        past_meeting_uid: &str,
        uid: &str,
        field: impl Fn(&mut PastMeeting) -> &mut Vec<String>,
        already_present: impl Fn(&PastMeeting, &str) -> bool,
    ) {
        for _ in 0..=self.config.conflict_retry_limit {
            let mut past_meeting = match self.past_meetings.get(past_meeting_uid).await {
                Ok(pm) => pm,
                Err(err) => {
                    warn!(error = %err, "failed to re-read past meeting for artifact append");
                    return;
                }
            };
            if already_present(&past_meeting, uid) {
                return;
            }
            field(&mut past_meeting).push(uid.to_string());
            let expected = past_meeting.revision;
            match self.past_meetings.update(past_meeting_uid, expected, past_meeting).await {
                Ok(_) => return,
                Err(err) if err.kind() == Kind::Conflict => {
                    obs_metrics::record_conflict_retry("past_meeting");
                    continue;
                }
                Err(err) => {
                    warn!(error = %err, "failed to append artifact uid to past meeting");
                    return;
                }
            }
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_recording_completed(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let envelope = ZoomEnvelope::parse(payload)?;
        let object: ZoomRecordingCompletedObject = envelope.object_as()?;

        let Some(meeting) = self.find_meeting(&object.id).await? else {
            warn!(platform_meeting_id = %object.id, "recording.completed for unknown platform meeting; dropping");
            return Ok(None);
        };
        let occurrence_id = self.bind(&meeting, object.start_time)?;
        let Some(past_meeting) = self
            .past_meetings
            .get_by_platform_meeting_id_and_occurrence(&meeting.zoom_config.meeting_id, &occurrence_id)
            .await?
        else {
            warn!("recording.completed for unknown past meeting; dropping");
            return Ok(None);
        };

        if self
            .recordings
            .get_by_platform_meeting_instance_id(&object.uuid)
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let (files, _) = split_files(&object.recording_files);
        let recording = PastMeetingRecording {
            uid: Uuid::new_v4().to_string(),
            past_meeting_uid: past_meeting.uid.clone(),
            platform_meeting_id: object.id.clone(),
            platform_meeting_instance_id: object.uuid.clone(),
            session_start_time: object.start_time,
            session_end_time: object.end_time,
            files,
            revision: Revision::NONE,
        };
        let created = self.recordings.create(recording).await?;
        self.append_recording_uid(&past_meeting.uid, &created.uid).await;
        Ok(None)
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_transcript_completed(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let envelope = ZoomEnvelope::parse(payload)?;
        let object: ZoomTranscriptCompletedObject = envelope.object_as()?;

        let Some(meeting) = self.find_meeting(&object.id).await? else {
            warn!(platform_meeting_id = %object.id, "transcript.completed for unknown platform meeting; dropping");
            return Ok(None);
        };
        let occurrence_id = self.bind(&meeting, object.start_time)?;
        let Some(past_meeting) = self
            .past_meetings
            .get_by_platform_meeting_id_and_occurrence(&meeting.zoom_config.meeting_id, &occurrence_id)
            .await?
        else {
            warn!("transcript.completed for unknown past meeting; dropping");
            return Ok(None);
        };

        if self
            .transcripts
            .get_by_platform_meeting_instance_id(&object.uuid)
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let (_, files) = split_files(&object.recording_files);
        let transcript = PastMeetingTranscript {
            uid: Uuid::new_v4().to_string(),
            past_meeting_uid: past_meeting.uid.clone(),
            platform_meeting_id: object.id.clone(),
            platform_meeting_instance_id: object.uuid.clone(),
            session_start_time: object.start_time,
            session_end_time: object.end_time,
            files,
            revision: Revision::NONE,
        };
        let created = self.transcripts.create(transcript).await?;
        self.append_transcript_uid(&past_meeting.uid, &created.uid).await;
        Ok(None)
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_summary_completed(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let envelope = ZoomEnvelope::parse(payload)?;
        let object: ZoomSummaryCompletedObject = envelope.object_as()?;

        let Some(meeting) = self.find_meeting(&object.id).await? else {
            warn!(platform_meeting_id = %object.id, "summary.completed for unknown platform meeting; dropping");
            return Ok(None);
        };
        let occurrence_id = self.bind(&meeting, object.start_time)?;
        let Some(past_meeting) = self
            .past_meetings
            .get_by_platform_meeting_id_and_occurrence(&meeting.zoom_config.meeting_id, &occurrence_id)
            .await?
        else {
            warn!("summary.completed for unknown past meeting; dropping");
            return Ok(None);
        };

        let existing_summaries = self.summaries.list_by_past_meeting(&past_meeting.uid).await?;
        if existing_summaries
            .iter()
            .any(|s| s.platform_meeting_instance_id == object.uuid)
        {
            return Ok(None);
        }

        let summary = PastMeetingSummary {
            uid: Uuid::new_v4().to_string(),
            past_meeting_uid: past_meeting.uid.clone(),
            platform_meeting_id: object.id.clone(),
            platform_meeting_instance_id: object.uuid.clone(),
            start_time: object.start_time,
            end_time: object.end_time,
            title: object.summary_title.clone(),
            content: object.summary_content.clone(),
            doc_url: object.summary_doc_url.clone(),
            requires_approval: meeting.zoom_config.ai_summary_require_approval,
            approved: false,
            email_sent: false,
            revision: Revision::NONE,
        };
        let created = self.summaries.create(summary).await?;
        self.append_summary_uid(&past_meeting.uid, &created.uid).await;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        EndCondition, MeetingType, Platform, Recurrence, RecurrenceType, RegistrantType,
        Visibility, WeeklyDays, ZoomConfig,
    };
    use crate::repositories::{
        InMemoryMeetingRepository, InMemoryPastMeetingParticipantRepository,
        InMemoryPastMeetingRecordingRepository, InMemoryPastMeetingRepository,
        InMemoryPastMeetingSummaryRepository, InMemoryPastMeetingTranscriptRepository,
        InMemoryRegistrantRepository,
    };
    use chrono::{TimeZone, Weekday};

    fn non_recurring_meeting() -> Meeting {
        Meeting {
            uid: "m1".into(),
            project_uid: "p1".into(),
            title: "Board Meeting".into(),
            description: "d".into(),
            start_time: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
            duration_minutes: 60,
            timezone: "UTC".into(),
            recurrence: None,
            committees: vec![],
            visibility: Visibility::Public,
            restricted: false,
            meeting_type: MeetingType::Board,
            platform: Platform::Zoom,
            zoom_config: ZoomConfig {
                meeting_id: "99".into(),
                passcode: None,
                ai_summary_require_approval: true,
            },
            early_join_minutes: 0,
            recording_enabled: true,
            transcript_enabled: true,
            youtube_upload_enabled: false,
            artifact_visibility: Visibility::Public,
            password: None,
            occurrences: vec![],
            revision: Revision(1),
        }
    }

    fn recurring_meeting() -> Meeting {
        let mut meeting = non_recurring_meeting();
        meeting.uid = "m2".into();
        meeting.zoom_config.meeting_id = "100".into();
        meeting.start_time = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        meeting.recurrence = Some(Recurrence {
            recurrence_type: RecurrenceType::Weekly,
            repeat_interval: 1,
            weekly_days: Some(WeeklyDays::single(Weekday::Mon)),
            monthly_rule: None,
            end_condition: EndCondition::None,
        });
        meeting
    }

    struct Harness {
        meetings: Arc<InMemoryMeetingRepository>,
        registrants: Arc<InMemoryRegistrantRepository>,
        aggregator: PastMeetingAggregator,
    }

    impl Harness {
        fn new() -> Self {
            let meetings = Arc::new(InMemoryMeetingRepository::new());
            let past_meetings = Arc::new(InMemoryPastMeetingRepository::new());
            let registrants = Arc::new(InMemoryRegistrantRepository::new());
            let participants = Arc::new(InMemoryPastMeetingParticipantRepository::new());
            let recordings = Arc::new(InMemoryPastMeetingRecordingRepository::new());
            let transcripts = Arc::new(InMemoryPastMeetingTranscriptRepository::new());
            let summaries = Arc::new(InMemoryPastMeetingSummaryRepository::new());
            let aggregator = PastMeetingAggregator::new(
                meetings.clone(),
                past_meetings,
                registrants.clone(),
                participants,
                recordings,
                transcripts,
                summaries,
                WorkerPool::new(4),
                CoreConfig::default(),
            );
            Self {
                meetings,
                registrants,
                aggregator,
            }
        }

        fn past_meetings(&self) -> Arc<dyn PastMeetingRepository> {
            self.aggregator.past_meetings.clone()
        }

        fn participants(&self) -> Arc<dyn PastMeetingParticipantRepository> {
            self.aggregator.participants.clone()
        }
    }

    fn zoom_envelope(event_type: &str, object: serde_json::Value) -> Vec<u8> {
        serde_json::json!({
            "event_type": event_type,
            "event_ts": "2024-03-01T10:01:07Z",
            "payload": { "object": object },
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn scenario_s1_non_recurring_happy_path() {
        let harness = Harness::new();
        harness.meetings.create(non_recurring_meeting()).await.unwrap();

        let started = zoom_envelope(
            "meeting.started",
            serde_json::json!({ "id": "99", "uuid": "u1", "start_time": "2024-03-01T10:01:07Z" }),
        );
        harness.aggregator.handle_meeting_started(&started).await.unwrap();

        let past_meetings = harness.past_meetings().list_by_meeting("m1").await.unwrap();
        assert_eq!(past_meetings.len(), 1);
        let pm = &past_meetings[0];
        assert_eq!(pm.occurrence_id, "1709287200");
        assert_eq!(pm.sessions.len(), 1);
        assert_eq!(pm.sessions[0].uid, "u1");
        assert!(pm.sessions[0].end_time.is_none());

        let ended = zoom_envelope(
            "meeting.ended",
            serde_json::json!({
                "id": "99", "uuid": "u1",
                "start_time": "2024-03-01T10:01:07Z",
                "end_time": "2024-03-01T11:00:00Z",
            }),
        );
        harness.aggregator.handle_meeting_ended(&ended).await.unwrap();
        let pm = harness.past_meetings().get(&pm.uid).await.unwrap();
        assert_eq!(pm.sessions.len(), 1);
        assert!(pm.sessions[0].end_time.is_some());
    }

    #[tokio::test]
    async fn scenario_s2_duplicate_started_is_idempotent() {
        let harness = Harness::new();
        harness.meetings.create(non_recurring_meeting()).await.unwrap();
        let started = zoom_envelope(
            "meeting.started",
            serde_json::json!({ "id": "99", "uuid": "u1", "start_time": "2024-03-01T10:01:07Z" }),
        );
        harness.aggregator.handle_meeting_started(&started).await.unwrap();
        harness.aggregator.handle_meeting_started(&started).await.unwrap();

        let past_meetings = harness.past_meetings().list_by_meeting("m1").await.unwrap();
        assert_eq!(past_meetings.len(), 1);
        assert_eq!(past_meetings[0].sessions.len(), 1);
    }

    #[tokio::test]
    async fn scenario_s3_recurring_binds_nearest_occurrence() {
        let harness = Harness::new();
        harness.meetings.create(recurring_meeting()).await.unwrap();
        let started = zoom_envelope(
            "meeting.started",
            serde_json::json!({ "id": "100", "uuid": "u1", "start_time": "2024-01-15T10:03:00Z" }),
        );
        harness.aggregator.handle_meeting_started(&started).await.unwrap();
        let past_meetings = harness.past_meetings().list_by_meeting("m2").await.unwrap();
        assert_eq!(past_meetings[0].occurrence_id, "1705312800");
    }

    #[tokio::test]
    async fn unknown_platform_meeting_is_dropped_not_errored() {
        let harness = Harness::new();
        let started = zoom_envelope(
            "meeting.started",
            serde_json::json!({ "id": "does-not-exist", "uuid": "u1", "start_time": "2024-03-01T10:01:07Z" }),
        );
        let result = harness.aggregator.handle_meeting_started(&started).await;
        assert!(result.is_ok());
        assert!(harness.past_meetings().list_by_meeting("m1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scenario_s4_participant_rename_and_leave() {
        let harness = Harness::new();
        harness.meetings.create(non_recurring_meeting()).await.unwrap();
        harness
            .registrants
            .create(crate::domain::Registrant {
                uid: "r1".into(),
                meeting_uid: "m1".into(),
                email: "a@x.io".into(),
                first_name: "Ada".into(),
                last_name: "L".into(),
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

        let started = zoom_envelope(
            "meeting.started",
            serde_json::json!({ "id": "99", "uuid": "u1", "start_time": "2024-03-01T10:01:07Z" }),
        );
        harness.aggregator.handle_meeting_started(&started).await.unwrap();

        let joined = zoom_envelope(
            "meeting.participant_joined",
            serde_json::json!({
                "id": "99",
                "start_time": "2024-03-01T10:01:07Z",
                "participant": {
                    "participant_uuid": "p-uuid-1",
                    "user_name": "Ada L (Corp)",
                    "email": "a@x.io",
                    "join_time": "2024-03-01T10:02:00Z",
                }
            }),
        );
        harness.aggregator.handle_participant_joined(&joined).await.unwrap();

        let past_meeting = harness.past_meetings().list_by_meeting("m1").await.unwrap().remove(0);
        let participants = harness.participants().list_by_past_meeting(&past_meeting.uid).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert!(participants[0].is_invited);
        assert!(participants[0].is_attended);
        assert_eq!(participants[0].first_name, "Ada");
        assert_eq!(participants[0].sessions.len(), 1);

        let left = zoom_envelope(
            "meeting.participant_left",
            serde_json::json!({
                "id": "99",
                "start_time": "2024-03-01T10:01:07Z",
                "participant": {
                    "participant_uuid": "p-uuid-1",
                    "user_name": "Ada L (Corp)",
                    "email": "a@x.io",
                    "leave_time": "2024-03-01T10:30:00Z",
                    "leave_reason": "left",
                }
            }),
        );
        harness.aggregator.handle_participant_left(&left).await.unwrap();
        let participants = harness.participants().list_by_past_meeting(&past_meeting.uid).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert!(participants[0].sessions[0].leave_time.is_some());
    }

    #[tokio::test]
    async fn duplicate_recording_uuid_is_a_no_op() {
        let harness = Harness::new();
        harness.meetings.create(non_recurring_meeting()).await.unwrap();
        let started = zoom_envelope(
            "meeting.started",
            serde_json::json!({ "id": "99", "uuid": "u1", "start_time": "2024-03-01T10:01:07Z" }),
        );
        harness.aggregator.handle_meeting_started(&started).await.unwrap();

        let recording = zoom_envelope(
            "recording.completed",
            serde_json::json!({
                "id": "99", "uuid": "instance-1",
                "start_time": "2024-03-01T10:01:07Z",
                "end_time": "2024-03-01T11:00:00Z",
                "recording_files": [
                    { "file_type": "MP4", "download_url": "https://x/1", "file_size": 100 },
                    { "file_type": "TRANSCRIPT", "download_url": "https://x/2", "file_size": 50 },
                ],
            }),
        );
        harness.aggregator.handle_recording_completed(&recording).await.unwrap();
        harness.aggregator.handle_recording_completed(&recording).await.unwrap();

        let past_meeting = harness.past_meetings().list_by_meeting("m1").await.unwrap().remove(0);
        assert_eq!(past_meeting.recording_uids.len(), 1);
    }
}
