//! Occurrence calculator (C3): expands a [`Recurrence`] rule into a bounded
//! sequence of [`Occurrence`]s.
//!
//! Computation happens in the meeting's IANA timezone so that DST
//! transitions shift the wall-clock start time by the platform's standard
//! rule — we operate on the *naive* local date/time and only
//! convert to UTC at the end, rather than adding fixed-length `Duration`s to
//! a UTC instant (which would drift the wall-clock hour across a DST
//! boundary).

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::domain::{EndCondition, Meeting, MonthlyRule, Occurrence, RecurrenceType, WeeklyDays};
use crate::errors::{CoreError, Result};

/// Weekly-days bitmask resolved for generation: falls back to "the single
/// weekday of the anchor date" when the meeting did not specify one.
#[derive(Debug, Clone, Copy)]
struct ResolvedWeeklyDays(WeeklyDays);

impl ResolvedWeeklyDays {
    fn resolve(weekly_days: Option<WeeklyDays>, anchor: NaiveDate) -> Self {
        ResolvedWeeklyDays(weekly_days.unwrap_or_else(|| WeeklyDays::single(anchor.weekday())))
    }

    fn contains(self, weekday: Weekday) -> bool {
        self.0.contains(weekday)
    }
}

/// Safety cap on raw candidate generation so a pathological rule (e.g. a
/// monthly rule whose day never occurs) cannot loop forever while still
/// searching for `limit` qualifying occurrences.
const MAX_CANDIDATES_SCANNED: usize = 10_000;

/// Expand `meeting.recurrence` starting at `meeting.start_time`, producing
/// at most `limit` occurrences.
pub fn occurrences_from_start(meeting: &Meeting, limit: usize) -> Result<Vec<Occurrence>> {
    occurrences_from_date(meeting, meeting.start_time, limit)
}

/// Same as [`occurrences_from_start`], restricted to occurrences whose
/// `start_time >= from`.
pub fn occurrences_from_date(
    meeting: &Meeting,
    from: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<Occurrence>> {
    let limit = limit.max(1);

    let Some(recurrence) = &meeting.recurrence else {
        // Non-recurring meetings yield exactly one occurrence equal to
        // start_time.
        let occurrence = Occurrence::new(meeting.start_time, 0);
        return Ok(if occurrence.start_time >= from {
            vec![occurrence]
        } else {
            vec![]
        });
    };

    let tz = Tz::from_str(&meeting.timezone)
        .map_err(|_| CoreError::validation(format!("invalid timezone: {}", meeting.timezone)))?;

    let local_start = meeting.start_time.with_timezone(&tz);
    let start_date = local_start.date_naive();
    let wall_clock_time = local_start.time();
    let interval = recurrence.interval();

    let max_count = match &recurrence.end_condition {
        EndCondition::EndTimesCount(count) => Some(*count as usize),
        _ => None,
    };
    let end_date_time = match &recurrence.end_condition {
        EndCondition::EndDateTime(dt) => Some(*dt),
        _ => None,
    };

    let mut results = Vec::with_capacity(limit.min(256));
    let mut global_index: u32 = 0;
    let mut scanned = 0usize;

    let resolved_weekly_days = ResolvedWeeklyDays::resolve(recurrence.weekly_days, start_date);
    for candidate_date in candidate_dates(
        recurrence.recurrence_type,
        start_date,
        interval,
        resolved_weekly_days,
        &recurrence.monthly_rule,
    ) {
        if scanned >= MAX_CANDIDATES_SCANNED || results.len() >= limit {
            break;
        }
        scanned += 1;

        if candidate_date < start_date {
            continue;
        }

        if let Some(max_count) = max_count {
            if global_index as usize >= max_count {
                break;
            }
        }

        let naive = NaiveDateTime::new(candidate_date, wall_clock_time);
        let local_dt = localize(tz, naive);
        let utc_dt = local_dt.with_timezone(&Utc);

        if let Some(end_date_time) = end_date_time {
            if utc_dt > end_date_time {
                break;
            }
        }

        let include = utc_dt >= from;
        if include {
            results.push(Occurrence::new(utc_dt, global_index));
        }
        global_index += 1;
    }

    Ok(results)
}

/// Resolve an ambiguous or nonexistent local wall-clock time to a concrete
/// instant: ambiguous (fall-back DST transition) prefers the earlier
/// instant; nonexistent (spring-forward gap) is shifted forward by an hour,
/// matching the common "meeting starts an hour later" platform behavior.
fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earlier, _later) => earlier,
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) => dt,
                LocalResult::Ambiguous(earlier, _later) => earlier,
                LocalResult::None => Tz::UTC.from_utc_datetime(&naive).with_timezone(&tz),
            }
        }
    }
}

fn add_months(date: NaiveDate, months: i64) -> NaiveDate {
    let total_months = date.year() as i64 * 12 + (date.month() as i64 - 1) + months;
    let year = (total_months.div_euclid(12)) as i32;
    let month = (total_months.rem_euclid(12)) as u32 + 1;
    let days_in_month = days_in_month(year, month);
    let day = date.day().min(days_in_month);
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let this_month_first = NaiveDate::from_ymd_opt(year, month, 1);
    match (this_month_first, next_month_first) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 28,
    }
}

/// Returns an iterator over candidate dates, in ascending order, for the
/// given recurrence shape. The iterator is internally bounded by
/// `MAX_CANDIDATES_SCANNED` via the caller's loop, not by itself.
fn candidate_dates(
    recurrence_type: RecurrenceType,
    start_date: NaiveDate,
    interval: u32,
    weekly_days: ResolvedWeeklyDays,
    monthly_rule: &Option<MonthlyRule>,
) -> Box<dyn Iterator<Item = NaiveDate>> {
    match recurrence_type {
        RecurrenceType::Daily => {
            let interval = interval as i64;
            Box::new((0..).map(move |n: i64| start_date + Duration::days(n * interval)))
        }
        RecurrenceType::Weekly => {
            let days = weekly_days;
            let week_start = start_date - Duration::days(start_date.weekday().num_days_from_monday() as i64);
            let interval = interval as i64;
            Box::new(
                (0..)
                    .flat_map(move |week_index: i64| {
                        let week_anchor = week_start + Duration::days(week_index * interval * 7);
                        (0..7i64).filter_map(move |offset| {
                            let weekday = weekday_from_offset(offset);
                            if days.contains(weekday) {
                                Some(week_anchor + Duration::days(offset))
                            } else {
                                None
                            }
                        })
                    }),
            )
        }
        RecurrenceType::Monthly => {
            let interval = interval as i64;
            match monthly_rule.clone() {
                Some(MonthlyRule::DayOfMonth { monthly_day }) => {
                    Box::new((0..).map(move |n: i64| {
                        let anchor = add_months(start_date, n * interval);
                        let day = (monthly_day as u32).max(1).min(days_in_month(anchor.year(), anchor.month()));
                        NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), day).unwrap_or(anchor)
                    }))
                }
                Some(MonthlyRule::OrdinalWeekday { monthly_week, weekday }) => {
                    Box::new((0..).filter_map(move |n: i64| {
                        let anchor = add_months(start_date, n * interval);
                        nth_weekday_of_month(anchor.year(), anchor.month(), weekday, monthly_week)
                    }))
                }
                None => Box::new((0..).map(move |n: i64| add_months(start_date, n * interval))),
            }
        }
    }
}

fn weekday_from_offset(offset: i64) -> Weekday {
    Weekday::try_from(offset.rem_euclid(7) as u8).unwrap_or(Weekday::Mon)
}

/// `ordinal` in `1..=4` counts from the start of the month; `-1` means the
/// last occurrence of `weekday` in the month ("ordinal-week").
fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, ordinal: i8) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let first_weekday_offset = (weekday.num_days_from_monday() as i64
        - first.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    let first_match = first + Duration::days(first_weekday_offset);

    if ordinal > 0 {
        let candidate = first_match + Duration::days(7 * (ordinal as i64 - 1));
        if candidate.month() == month {
            Some(candidate)
        } else {
            None
        }
    } else {
        // Walk forward from the first match, keep the last one still in-month.
        let mut last = first_match;
        loop {
            let next = last + Duration::days(7);
            if next.month() != month {
                break;
            }
            last = next;
        }
        Some(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        EndCondition, Meeting, MeetingSettings, MeetingType, Platform, Recurrence, RecurrenceType,
        Revision, Visibility, WeeklyDays, ZoomConfig,
    };
    use chrono::TimeZone;

    fn base_meeting(start: DateTime<Utc>, recurrence: Option<Recurrence>, timezone: &str) -> Meeting {
        Meeting {
            uid: "m1".into(),
            project_uid: "p1".into(),
            title: "t".into(),
            description: "d".into(),
            start_time: start,
            duration_minutes: 60,
            timezone: timezone.into(),
            recurrence,
            committees: vec![],
            visibility: Visibility::Public,
            restricted: false,
            meeting_type: MeetingType::Other,
            platform: Platform::Zoom,
            zoom_config: ZoomConfig {
                meeting_id: "99".into(),
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

    #[test]
    fn non_recurring_yields_exactly_one_occurrence_equal_to_start() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let meeting = base_meeting(start, None, "UTC");
        let occurrences = occurrences_from_start(&meeting, 10).unwrap();
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].start_time, start);
        assert_eq!(occurrences[0].occurrence_id, start.timestamp().to_string());
    }

    #[test]
    fn weekly_recurrence_matches_scenario_s3() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let recurrence = Recurrence {
            recurrence_type: RecurrenceType::Weekly,
            repeat_interval: 1,
            weekly_days: Some(WeeklyDays::single(Weekday::Mon)),
            monthly_rule: None,
            end_condition: EndCondition::None,
        };
        let meeting = base_meeting(start, Some(recurrence), "UTC");
        let occurrences = occurrences_from_start(&meeting, 10).unwrap();
        let jan_15 = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        assert!(occurrences.iter().any(|o| o.start_time == jan_15));
        assert!(occurrences.iter().any(|o| o.occurrence_id == "1705312800"));
    }

    #[test]
    fn daily_recurrence_respects_end_times_count() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let recurrence = Recurrence {
            recurrence_type: RecurrenceType::Daily,
            repeat_interval: 1,
            weekly_days: None,
            monthly_rule: None,
            end_condition: EndCondition::EndTimesCount(3),
        };
        let meeting = base_meeting(start, Some(recurrence), "UTC");
        let occurrences = occurrences_from_start(&meeting, 100).unwrap();
        assert_eq!(occurrences.len(), 3);
    }

    #[test]
    fn monthly_day_of_month_clamps_short_months() {
        let start = Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap();
        let recurrence = Recurrence {
            recurrence_type: RecurrenceType::Monthly,
            repeat_interval: 1,
            weekly_days: None,
            monthly_rule: Some(MonthlyRule::DayOfMonth { monthly_day: 31 }),
            end_condition: EndCondition::EndTimesCount(3),
        };
        let meeting = base_meeting(start, Some(recurrence), "UTC");
        let occurrences = occurrences_from_start(&meeting, 100).unwrap();
        assert_eq!(occurrences.len(), 3);
        // February clamps to the 29th (2024 is a leap year).
        assert_eq!(occurrences[1].start_time.day(), 29);
        assert_eq!(occurrences[1].start_time.month(), 2);
    }

    #[test]
    fn occurrences_from_date_filters_by_start_time() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let recurrence = Recurrence {
            recurrence_type: RecurrenceType::Daily,
            repeat_interval: 1,
            weekly_days: None,
            monthly_rule: None,
            end_condition: EndCondition::None,
        };
        let meeting = base_meeting(start, Some(recurrence), "UTC");
        let from = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let occurrences = occurrences_from_date(&meeting, from, 5).unwrap();
        assert_eq!(occurrences.len(), 5);
        assert!(occurrences[0].start_time >= from);
    }

    #[test]
    fn invalid_timezone_is_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let recurrence = Recurrence {
            recurrence_type: RecurrenceType::Daily,
            repeat_interval: 1,
            weekly_days: None,
            monthly_rule: None,
            end_condition: EndCondition::None,
        };
        let meeting = base_meeting(start, Some(recurrence), "Not/A_Zone");
        let result = occurrences_from_start(&meeting, 10);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), crate::errors::Kind::Validation);
    }

    #[test]
    fn dst_transition_preserves_wall_clock_hour() {
        // America/New_York springs forward on 2024-03-10 at 02:00 local.
        let start = Tz::from_str("America/New_York")
            .unwrap()
            .with_ymd_and_hms(2024, 3, 3, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let recurrence = Recurrence {
            recurrence_type: RecurrenceType::Weekly,
            repeat_interval: 1,
            weekly_days: Some(WeeklyDays::single(Weekday::Sun)),
            monthly_rule: None,
            end_condition: EndCondition::EndTimesCount(3),
        };
        let meeting = base_meeting(start, Some(recurrence), "America/New_York");
        let occurrences = occurrences_from_start(&meeting, 10).unwrap();
        assert_eq!(occurrences.len(), 3);
        for occ in &occurrences {
            let local = occ.start_time.with_timezone(&Tz::from_str("America/New_York").unwrap());
            assert_eq!(local.time(), chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        }
    }
}
