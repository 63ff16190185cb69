use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{AttendanceRecord, AttendanceStats, SessionTally, SessionType};

/// What to report for a student with no records at all.
///
/// The dashboard this engine backs shows a seeded demo snapshot instead of
/// zeros, so `Fallback` with [`EmptyRecordPolicy::demo`] is the default.
/// Configurations that want "no data" to read as 0 % pick `Zero`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EmptyRecordPolicy {
    Fallback {
        theoretical: SessionTally,
        practical: SessionTally,
    },
    Zero,
}

impl EmptyRecordPolicy {
    /// Theory 26/30 and practical 12/15, i.e. 38 of 45 classes at 84 %.
    pub fn demo() -> Self {
        EmptyRecordPolicy::Fallback {
            theoretical: SessionTally::new(30, 26),
            practical: SessionTally::new(15, 12),
        }
    }

    pub fn stats(&self) -> AttendanceStats {
        match *self {
            EmptyRecordPolicy::Fallback {
                theoretical,
                practical,
            } => AttendanceStats::from_tallies(theoretical, practical),
            EmptyRecordPolicy::Zero => {
                AttendanceStats::from_tallies(SessionTally::default(), SessionTally::default())
            }
        }
    }
}

impl Default for EmptyRecordPolicy {
    fn default() -> Self {
        Self::demo()
    }
}

/// Tallies one student's records by session type. `None` when the student
/// has no records.
pub fn tally(records: &[AttendanceRecord], student_id: &str) -> Option<AttendanceStats> {
    let mut theoretical = SessionTally::default();
    let mut practical = SessionTally::default();

    let own = records.iter().filter(|r| r.student_id == student_id);
    for record in own {
        let entry = match record.session_type {
            SessionType::Theoretical => &mut theoretical,
            SessionType::Practical => &mut practical,
        };
        entry.total += 1;
        if record.status.counts_as_attended() {
            entry.attended += 1;
        }
    }

    if theoretical.total + practical.total == 0 {
        return None;
    }

    Some(AttendanceStats::from_tallies(theoretical, practical))
}

/// Attendance stats for `student_id`, falling back to `policy` when the
/// student has no records.
pub fn compute_stats(
    records: &[AttendanceRecord],
    student_id: &str,
    policy: &EmptyRecordPolicy,
) -> AttendanceStats {
    tally(records, student_id).unwrap_or_else(|| {
        debug!(student_id, ?policy, "no attendance records, using empty-record policy");
        policy.stats()
    })
}

/// Classes the student may still miss before absences exceed
/// `max_absence_ratio` of the classes held so far.
pub fn classes_can_miss(stats: &AttendanceStats, max_absence_ratio: f64) -> u32 {
    let allowed = (f64::from(stats.total_classes) * max_absence_ratio).floor() as u32;
    let missed = stats.total_classes.saturating_sub(stats.attended);
    allowed.saturating_sub(missed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, MarkedBy};
    use chrono::NaiveDate;

    fn record(
        student_id: &str,
        session_type: SessionType,
        status: AttendanceStatus,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("{student_id}-{session_type}-{status}"),
            student_id: student_id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            session_type,
            subject: "Data Structures".to_string(),
            status,
            marked_by: MarkedBy::Ble,
        }
    }

    #[test]
    fn counts_late_as_attended_and_excused_as_missed() {
        let records = vec![
            record("2", SessionType::Theoretical, AttendanceStatus::Present),
            record("2", SessionType::Theoretical, AttendanceStatus::Excused),
            record("2", SessionType::Practical, AttendanceStatus::Late),
            record("2", SessionType::Practical, AttendanceStatus::Absent),
        ];

        let stats = compute_stats(&records, "2", &EmptyRecordPolicy::demo());
        assert_eq!(stats.total_classes, 4);
        assert_eq!(stats.attended, 2);
        assert_eq!(stats.percentage, 50);
        assert_eq!(stats.theoretical, SessionTally::new(2, 1));
        assert_eq!(stats.practical, SessionTally::new(2, 1));
    }

    #[test]
    fn ignores_other_students() {
        let records = vec![
            record("2", SessionType::Theoretical, AttendanceStatus::Present),
            record("3", SessionType::Theoretical, AttendanceStatus::Absent),
            record("3", SessionType::Practical, AttendanceStatus::Absent),
        ];

        let stats = tally(&records, "2").unwrap();
        assert_eq!(stats.total_classes, 1);
        assert_eq!(stats.percentage, 100);
    }

    #[test]
    fn empty_student_uses_demo_snapshot() {
        let records = vec![
            record("2", SessionType::Theoretical, AttendanceStatus::Present),
        ];

        let stats = compute_stats(&records, "missing", &EmptyRecordPolicy::demo());
        assert_eq!(stats.total_classes, 45);
        assert_eq!(stats.attended, 38);
        assert_eq!(stats.percentage, 84);
        assert_eq!(stats.theoretical, SessionTally::new(30, 26));
        assert_eq!(stats.practical, SessionTally::new(15, 12));
    }

    #[test]
    fn zero_policy_reports_nothing_held() {
        let stats = compute_stats(&[], "2", &EmptyRecordPolicy::Zero);
        assert_eq!(stats.total_classes, 0);
        assert_eq!(stats.attended, 0);
        assert_eq!(stats.percentage, 0);
    }

    #[test]
    fn a_student_who_attended_nothing_is_not_given_the_fallback() {
        let records = vec![
            record("4", SessionType::Theoretical, AttendanceStatus::Absent),
        ];

        let stats = compute_stats(&records, "4", &EmptyRecordPolicy::demo());
        assert_eq!(stats.total_classes, 1);
        assert_eq!(stats.attended, 0);
        assert_eq!(stats.percentage, 0);
    }

    #[test]
    fn allowance_uses_a_quarter_of_classes_by_default() {
        let stats = EmptyRecordPolicy::demo().stats();
        // floor(45 * 0.25) = 11 allowed, 7 already missed
        assert_eq!(classes_can_miss(&stats, 0.25), 4);

        let behind =
            AttendanceStats::from_tallies(SessionTally::new(10, 5), SessionTally::default());
        assert_eq!(classes_can_miss(&behind, 0.25), 0);
    }
}
