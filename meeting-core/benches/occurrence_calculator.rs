//! Benchmarks for the occurrence calculator (C3): expanding a recurrence
//! rule is on the hot path of every webhook that needs occurrence binding
//! (C6), so regressions here show up directly in handler latency.

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use meeting_core::domain::{
    EndCondition, Meeting, MeetingType, Platform, Recurrence, RecurrenceType, Revision,
    Visibility, WeeklyDays, ZoomConfig,
};
use meeting_core::occurrence::calculator::occurrences_from_start;

fn weekly_meeting(timezone: &str) -> Meeting {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    Meeting {
        uid: "bench-meeting".into(),
        project_uid: "bench-project".into(),
        title: "Bench Meeting".into(),
        description: String::new(),
        start_time: start,
        duration_minutes: 60,
        timezone: timezone.into(),
        recurrence: Some(Recurrence {
            recurrence_type: RecurrenceType::Weekly,
            repeat_interval: 1,
            weekly_days: Some(WeeklyDays::single(chrono::Weekday::Mon)),
            monthly_rule: None,
            end_condition: EndCondition::None,
        }),
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

fn bench_occurrences_from_start(c: &mut Criterion) {
    let mut group = c.benchmark_group("occurrences_from_start");
    for timezone in ["UTC", "America/New_York"] {
        let meeting = weekly_meeting(timezone);
        for limit in [10usize, 100, 1_000] {
            group.bench_with_input(
                BenchmarkId::new(timezone, limit),
                &limit,
                |b, &limit| {
                    b.iter(|| occurrences_from_start(&meeting, limit).unwrap());
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_occurrences_from_start);
criterion_main!(benches);
