use attendance_risk::db::{self, RecordSource};
use attendance_risk::models::{
    AttendanceRecord, AttendanceStatus, MarkedBy, RiskLevel, SessionTally, SessionType,
};
use attendance_risk::risk::{predicted_end_percentage, risk_level_for};
use attendance_risk::{classify, compute_stats, EmptyRecordPolicy, EngineConfig};
use chrono::NaiveDate;
use proptest::prelude::*;

fn record(
    id: usize,
    student_id: &str,
    session_type: SessionType,
    status: AttendanceStatus,
) -> AttendanceRecord {
    AttendanceRecord {
        id: id.to_string(),
        student_id: student_id.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        session_type,
        subject: "Operating Systems".to_string(),
        status,
        marked_by: MarkedBy::Manual,
    }
}

#[test]
fn end_to_end_high_risk_student() {
    let records = vec![
        record(1, "X", SessionType::Theoretical, AttendanceStatus::Present),
        record(2, "X", SessionType::Theoretical, AttendanceStatus::Absent),
        record(3, "X", SessionType::Practical, AttendanceStatus::Late),
    ];

    let stats = compute_stats(&records, "X", &EmptyRecordPolicy::demo());
    assert_eq!(stats.total_classes, 3);
    assert_eq!(stats.attended, 2);
    assert_eq!(stats.percentage, 67);
    assert_eq!(stats.theoretical, SessionTally::new(2, 1));
    assert_eq!(stats.practical, SessionTally::new(1, 1));

    let prediction = classify(&stats, "X");
    assert_eq!(prediction.student_id, "X");
    assert_eq!(prediction.risk_level, RiskLevel::High);
    assert_eq!(prediction.attendance_percentage, 67);
    assert_eq!(prediction.predicted_end_percentage, 62);
    assert_eq!(
        prediction.alerts,
        vec!["Warning: Attendance approaching minimum threshold"]
    );
    assert_eq!(
        prediction.recommendations,
        vec![
            "Improve attendance to avoid academic penalties",
            "Plan ahead to avoid missing classes",
        ]
    );
}

#[test]
fn seven_of_eight_rounds_to_88() {
    let records: Vec<_> = (0..8)
        .map(|i| {
            let status = if i == 0 {
                AttendanceStatus::Absent
            } else {
                AttendanceStatus::Present
            };
            record(i, "Y", SessionType::Theoretical, status)
        })
        .collect();

    let stats = compute_stats(&records, "Y", &EmptyRecordPolicy::Zero);
    assert_eq!(stats.percentage, 88);
}

#[test]
fn empty_student_gets_configured_fallback() {
    let stats = compute_stats(&[], "nobody", &EngineConfig::default().empty_records);
    assert_eq!(stats.attended, 38);
    assert_eq!(stats.total_classes, 45);
    assert_eq!(stats.percentage, 84);

    let prediction = classify(&stats, "nobody");
    assert_eq!(prediction.risk_level, RiskLevel::Medium);
    assert_eq!(prediction.predicted_end_percentage, 79);
}

#[test]
fn boundary_scenarios() {
    let expected = [
        (59, RiskLevel::Critical),
        (60, RiskLevel::High),
        (74, RiskLevel::High),
        (75, RiskLevel::Medium),
        (84, RiskLevel::Medium),
        (85, RiskLevel::Low),
    ];
    for (percentage, level) in expected {
        assert_eq!(risk_level_for(percentage), level, "at {percentage}%");
    }
}

#[test]
fn seed_students_classify_as_on_the_dashboard() {
    let store = db::seed();
    let policy = EmptyRecordPolicy::demo();
    let level = |id: &str| {
        let stats = compute_stats(store.attendance_records(), id, &policy);
        classify(&stats, id).risk_level
    };

    assert_eq!(level("2"), RiskLevel::High);
    assert_eq!(level("3"), RiskLevel::Low);
    assert_eq!(level("4"), RiskLevel::Critical);
    assert_eq!(level("9"), RiskLevel::Medium);
}

fn arb_record(students: &'static [&'static str]) -> impl Strategy<Value = AttendanceRecord> {
    (
        0..students.len(),
        prop_oneof![Just(SessionType::Theoretical), Just(SessionType::Practical)],
        prop_oneof![
            Just(AttendanceStatus::Present),
            Just(AttendanceStatus::Absent),
            Just(AttendanceStatus::Late),
            Just(AttendanceStatus::Excused),
        ],
    )
        .prop_map(move |(student, session_type, status)| {
            record(0, students[student], session_type, status)
        })
}

proptest! {
    #[test]
    fn session_tallies_sum_to_totals(
        records in prop::collection::vec(arb_record(&["A", "B", "C"]), 1..60)
    ) {
        let student_id = records[0].student_id.clone();
        let stats = compute_stats(&records, &student_id, &EmptyRecordPolicy::Zero);

        prop_assert_eq!(stats.attended, stats.theoretical.attended + stats.practical.attended);
        prop_assert_eq!(stats.total_classes, stats.theoretical.total + stats.practical.total);
        prop_assert!(stats.attended <= stats.total_classes);

        let expected_total = records.iter().filter(|r| r.student_id == student_id).count() as u32;
        prop_assert_eq!(stats.total_classes, expected_total);

        let exact = 100.0 * f64::from(stats.attended) / f64::from(stats.total_classes);
        prop_assert_eq!(u32::from(stats.percentage), (exact + 0.5).floor() as u32);
    }

    #[test]
    fn lower_percentage_is_never_less_severe(p1 in 0u8..=100, p2 in 0u8..=100) {
        let (low, high) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
        prop_assert!(risk_level_for(low) >= risk_level_for(high));
    }

    #[test]
    fn projection_is_five_points_lower_floored_at_zero(p in 0u8..=100) {
        prop_assert_eq!(i32::from(predicted_end_percentage(p)), (i32::from(p) - 5).max(0));
    }
}
