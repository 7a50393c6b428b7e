//! Committee / project sync (C8): keeps registrants consistent with
//! committee membership and meeting organizer lists consistent with project
//! role membership.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::domain::{Committee, Meeting, Registrant, RegistrantType, Revision, Visibility};
use crate::errors::{Kind, Result};
use crate::observability::metrics as obs_metrics;
use crate::messaging::{AccessSender, CommitteeMember, ExternalLookup, IndexSender, LifecycleEventSender};
use crate::repositories::{MeetingRepository, MeetingSettingsRepository, RegistrantRepository};
use crate::worker_pool::{self, WorkerPool};

use super::payloads::{
    parse_json, CommitteeMemberCreatedPayload, CommitteeMemberDeletedPayload,
    CommitteeMemberUpdatedPayload, ProjectSettingsUpdatedPayload,
};

pub struct CommitteeSync {
    meetings: Arc<dyn MeetingRepository>,
    registrants: Arc<dyn RegistrantRepository>,
    settings: Arc<dyn MeetingSettingsRepository>,
    index: Arc<dyn IndexSender>,
    access: Arc<dyn AccessSender>,
    lifecycle: Arc<dyn LifecycleEventSender>,
    external: Arc<dyn ExternalLookup>,
    worker_pool: WorkerPool,
    config: CoreConfig,
}

impl CommitteeSync {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        meetings: Arc<dyn MeetingRepository>,
        registrants: Arc<dyn RegistrantRepository>,
        settings: Arc<dyn MeetingSettingsRepository>,
        index: Arc<dyn IndexSender>,
        access: Arc<dyn AccessSender>,
        lifecycle: Arc<dyn LifecycleEventSender>,
        external: Arc<dyn ExternalLookup>,
        worker_pool: WorkerPool,
        config: CoreConfig,
    ) -> Self {
        Self {
            meetings,
            registrants,
            settings,
            index,
            access,
            lifecycle,
            external,
            worker_pool,
            config,
        }
    }

    async fn add_registrant_if_eligible(&self, meeting_uid: &str, committee_uid: &str, member: &CommitteeMember) -> Result<()> {
        let registrant = Registrant {
            uid: Uuid::new_v4().to_string(),
            meeting_uid: meeting_uid.to_string(),
            email: member.email.clone(),
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
            username: None,
            host: false,
            registrant_type: RegistrantType::Committee,
            committee_uid: Some(committee_uid.to_string()),
            org_name: None,
            job_title: None,
            revision: Revision::NONE,
        };
        match self.registrants.create(registrant).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == Kind::Conflict => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Apply the meeting-visibility-dependent removal policy for one
    /// committee registrant ("committee_member.deleted"):
    /// public meetings keep the person invited as a direct registrant,
    /// private meetings drop them entirely.
    async fn apply_removal_policy(&self, meeting: &Meeting, registrant: Registrant) -> Result<()> {
        match meeting.visibility {
            Visibility::Public => {
                let mut converted = registrant;
                converted.registrant_type = RegistrantType::Direct;
                converted.committee_uid = None;
                let expected = converted.revision;
                self.registrants.update(&converted.uid, expected, converted).await?;
                Ok(())
            }
            Visibility::Private => {
                let expected = registrant.revision;
                self.registrants.delete(&registrant.uid, expected).await?;
                self.index.index_delete("meeting_registrant", &registrant.uid, false).await?;
                self.access.access_remove(&registrant.uid, &meeting.uid, "registrant", false).await?;
                self.lifecycle.send_cancellation_email(&registrant.email, &meeting.uid, false).await?;
                Ok(())
            }
        }
    }

    async fn remove_committee_registrant(&self, meeting: &Meeting, committee_uid: &str, email: &str) -> Result<()> {
        let Some(registrant) = self.registrants.get_by_meeting_and_email(&meeting.uid, email).await? else {
            return Ok(());
        };
        if registrant.registrant_type != RegistrantType::Committee
            || registrant.committee_uid.as_deref() != Some(committee_uid)
        {
            return Ok(());
        }
        self.apply_removal_policy(meeting, registrant).await
    }

    async fn add_all_eligible_members(&self, meeting: &Meeting, committee: &Committee) -> Result<()> {
        let members = self.external.get_committee_members(&committee.committee_uid).await?;
        let tasks = members
            .into_iter()
            .filter(|member| committee.allows(&member.voting_status))
            .map(|member| {
                let meeting_uid = meeting.uid.clone();
                let committee_uid = committee.committee_uid.clone();
                let this = self.clone_refs();
                worker_pool::boxed(async move { this.add_registrant_if_eligible(&meeting_uid, &committee_uid, &member).await })
            });
        let errors = self.worker_pool.run_all(CancellationToken::new(), tasks).await;
        for err in errors {
            warn!(error = %err, "failed to add an eligible committee member as registrant");
        }
        Ok(())
    }

    async fn remove_all_members_of_committee(&self, meeting: &Meeting, committee_uid: &str) -> Result<()> {
        let registrants = self.registrants.list_by_meeting(&meeting.uid).await?;
        let tasks = registrants
            .into_iter()
            .filter(|r| r.registrant_type == RegistrantType::Committee && r.committee_uid.as_deref() == Some(committee_uid))
            .map(|registrant| {
                let this = self.clone_refs();
                let meeting = meeting.clone();
                worker_pool::boxed(async move { this.apply_removal_policy(&meeting, registrant).await })
            });
        let errors = self.worker_pool.run_all(CancellationToken::new(), tasks).await;
        for err in errors {
            warn!(error = %err, "failed to remove a committee registrant");
        }
        Ok(())
    }

    async fn reconcile_eligibility(&self, meeting: &Meeting, committee: &Committee) -> Result<()> {
        let members = self.external.get_committee_members(&committee.committee_uid).await?;
        let existing = self.registrants.list_by_meeting(&meeting.uid).await?;
        let existing_committee_emails: std::collections::HashSet<String> = existing
            .iter()
            .filter(|r| r.registrant_type == RegistrantType::Committee && r.committee_uid.as_deref() == Some(committee.committee_uid.as_str()))
            .map(|r| r.email_key())
            .collect();

        for member in &members {
            let eligible = committee.allows(&member.voting_status);
            let has_registrant = existing_committee_emails.contains(&member.email.to_ascii_lowercase());
            if eligible && !has_registrant {
                if let Err(err) = self.add_registrant_if_eligible(&meeting.uid, &committee.committee_uid, member).await {
                    warn!(error = %err, "failed to add newly eligible committee member");
                }
            } else if !eligible && has_registrant {
                if let Err(err) = self.remove_committee_registrant(meeting, &committee.committee_uid, &member.email).await {
                    warn!(error = %err, "failed to remove newly ineligible committee member");
                }
            }
        }
        Ok(())
    }

    /// Reconcile a meeting's registrants against a diff of its committee
    /// list ("meeting.created / meeting.updated (committee
    /// aspect)"). `previous_committees` is empty for a brand new meeting.
    #[instrument(skip(self, meeting, previous_committees))]
    pub async fn sync_meeting_committees(&self, meeting: &Meeting, previous_committees: &[Committee]) -> Result<()> {
        for committee in &meeting.committees {
            match previous_committees.iter().find(|c| c.committee_uid == committee.committee_uid) {
                None => self.add_all_eligible_members(meeting, committee).await?,
                Some(prev) if prev.allowed_voting_statuses != committee.allowed_voting_statuses => {
                    self.reconcile_eligibility(meeting, committee).await?
                }
                _ => {}
            }
        }
        for committee in previous_committees {
            if meeting.committee(&committee.committee_uid).is_none() {
                self.remove_all_members_of_committee(meeting, &committee.committee_uid).await?;
            }
        }
        Ok(())
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_committee_member_created(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let event: CommitteeMemberCreatedPayload = parse_json(payload)?;
        let meetings = self.meetings.list_by_committee(&event.committee_uid).await?;
        let member = CommitteeMember {
            email: event.email,
            first_name: event.first_name,
            last_name: event.last_name,
            voting_status: event.voting_status,
        };

        let tasks = meetings.into_iter().map(|meeting| {
            let this = self.clone_refs();
            let committee_uid = event.committee_uid.clone();
            let member = member.clone();
            worker_pool::boxed(async move {
                let Some(committee) = meeting.committee(&committee_uid).cloned() else {
                    return Ok(());
                };
                if committee.allows(&member.voting_status) {
                    this.add_registrant_if_eligible(&meeting.uid, &committee_uid, &member).await?;
                }
                Ok(())
            })
        });
        let errors = self.worker_pool.run_all(CancellationToken::new(), tasks).await;
        for err in errors {
            warn!(error = %err, "committee_member.created fan-out failed for one meeting");
        }
        Ok(None)
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_committee_member_updated(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let event: CommitteeMemberUpdatedPayload = parse_json(payload)?;
        if event.old_email.eq_ignore_ascii_case(&event.email) {
            return Ok(None);
        }
        let meetings = self.meetings.list_by_committee(&event.committee_uid).await?;

        let tasks = meetings.into_iter().map(|meeting| {
            let this = self.clone_refs();
            let old_email = event.old_email.clone();
            let new_email = event.email.clone();
            let first_name = event.first_name.clone();
            let last_name = event.last_name.clone();
            let committee_uid = event.committee_uid.clone();
            worker_pool::boxed(async move {
                let Some(mut registrant) = this.registrants.get_by_meeting_and_email(&meeting.uid, &old_email).await? else {
                    return Ok(());
                };
                if registrant.registrant_type != RegistrantType::Committee
                    || registrant.committee_uid.as_deref() != Some(committee_uid.as_str())
                {
                    return Ok(());
                }
                registrant.email = new_email;
                registrant.first_name = first_name;
                registrant.last_name = last_name;
                let expected = registrant.revision;
                this.registrants.update(&registrant.uid, expected, registrant).await?;
                Ok(())
            })
        });
        let errors = self.worker_pool.run_all(CancellationToken::new(), tasks).await;
        for err in errors {
            warn!(error = %err, "committee_member.updated fan-out failed for one meeting");
        }
        Ok(None)
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_committee_member_deleted(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let event: CommitteeMemberDeletedPayload = parse_json(payload)?;
        let meetings = self.meetings.list_by_committee(&event.committee_uid).await?;

        let tasks = meetings.into_iter().map(|meeting| {
            let this = self.clone_refs();
            let committee_uid = event.committee_uid.clone();
            let email = event.email.clone();
            worker_pool::boxed(async move { this.remove_committee_registrant(&meeting, &committee_uid, &email).await })
        });
        let errors = self.worker_pool.run_all(CancellationToken::new(), tasks).await;
        for err in errors {
            warn!(error = %err, "committee_member.deleted fan-out failed for one meeting");
        }
        Ok(None)
    }

    #[instrument(skip(self, payload))]
    pub async fn handle_project_settings_updated(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        let event: ProjectSettingsUpdatedPayload = parse_json(payload)?;
        let removed = event.removed_organizer_usernames();
        if removed.is_empty() {
            return Ok(None);
        }
        let meetings = self.meetings.list_by_project(&event.project_uid).await?;

        let tasks = meetings.into_iter().map(|meeting| {
            let this = self.clone_refs();
            let removed = removed.clone();
            worker_pool::boxed(async move {
                for _ in 0..=this.config.conflict_retry_limit {
                    let mut settings = match this.settings.get(&meeting.uid).await {
                        Ok(settings) => settings,
                        Err(err) if err.kind() == Kind::NotFound => return Ok(()),
                        Err(err) => return Err(err),
                    };
                    let before = settings.organizers.len();
                    settings.organizers.retain(|username| !removed.contains(username));
                    if settings.organizers.len() == before {
                        return Ok(());
                    }
                    let expected = settings.revision;
                    match this.settings.update(&meeting.uid, expected, settings).await {
                        Ok(_) => return Ok(()),
                        Err(err) if err.kind() == Kind::Conflict => {
                            obs_metrics::record_conflict_retry("meeting_settings");
                            continue;
                        }
                        Err(err) => return Err(err),
                    }
                }
                Ok(())
            })
        });
        let errors = self.worker_pool.run_all(CancellationToken::new(), tasks).await;
        for err in errors {
            warn!(error = %err, "project_settings.updated organizer cleanup failed for one meeting");
        }
        Ok(None)
    }

    fn clone_refs(&self) -> Self {
        Self {
            meetings: self.meetings.clone(),
            registrants: self.registrants.clone(),
            settings: self.settings.clone(),
            index: self.index.clone(),
            access: self.access.clone(),
            lifecycle: self.lifecycle.clone(),
            external: self.external.clone(),
            worker_pool: self.worker_pool.clone(),
            config: self.config.clone(),
        }
    }
}
