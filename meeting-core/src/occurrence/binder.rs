//! Occurrence binder (C6): maps a platform webhook's `(platform_meeting_id,
//! actual_start_time)` onto the canonical `occurrence_id` of a recurring
//! meeting, so repeated or rescheduled webhooks for the same instance
//! collapse onto one [`crate::domain::PastMeeting`].

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Meeting, Occurrence};
use crate::errors::Result;
use crate::observability::metrics as obs_metrics;

use super::calculator;

/// Bind `actual_start_time` to the occurrence of `meeting` it most likely
/// belongs to.
///
/// 1. Non-recurring meetings bind to `unix_seconds(meeting.start_time)`.
/// 2. Otherwise, ask the calculator for up to `candidate_limit` occurrences
///    starting `search_window_days` before `actual_start_time`.
/// 3. If none are found, fall back to step 1's formula.
/// 4. Otherwise return the occurrence minimizing the distance to
///    `actual_start_time`, ties broken by earliest `start_time`.
pub fn bind(
    meeting: &Meeting,
    actual_start_time: DateTime<Utc>,
    search_window_days: i64,
    candidate_limit: usize,
) -> Result<String> {
    if !meeting.is_recurring() {
        obs_metrics::record_occurrence_bind("exact");
        return Ok(Occurrence::occurrence_id_for(meeting.start_time));
    }

    let from = actual_start_time - Duration::days(search_window_days);
    let candidates = calculator::occurrences_from_date(meeting, from, candidate_limit)?;

    let Some(nearest) = nearest_occurrence(&candidates, actual_start_time) else {
        obs_metrics::record_occurrence_bind("fallback");
        return Ok(Occurrence::occurrence_id_for(meeting.start_time));
    };

    obs_metrics::record_occurrence_bind(if nearest.start_time == actual_start_time { "exact" } else { "nearest" });
    Ok(nearest.occurrence_id.clone())
}

fn nearest_occurrence<'a>(
    candidates: &'a [Occurrence],
    actual_start_time: DateTime<Utc>,
) -> Option<&'a Occurrence> {
    candidates.iter().min_by(|a, b| {
        let da = (a.start_time - actual_start_time).num_milliseconds().abs();
        let db = (b.start_time - actual_start_time).num_milliseconds().abs();
        da.cmp(&db).then_with(|| a.start_time.cmp(&b.start_time))
    })
}
