use crate::models::{AttendanceRecord, AttendanceStats, RiskLevel, RiskPrediction, User};
use crate::stats::{compute_stats, EmptyRecordPolicy};

/// Lower bounds (inclusive) of the high, medium and low tiers.
pub const HIGH_RISK_FLOOR: u8 = 60;
pub const MEDIUM_RISK_FLOOR: u8 = 75;
pub const LOW_RISK_FLOOR: u8 = 85;

/// Points subtracted from the current percentage for the end-of-term
/// projection. A flat placeholder, not a forecast.
pub const PROJECTED_DROP: u8 = 5;

pub fn risk_level_for(percentage: u8) -> RiskLevel {
    match percentage {
        p if p < HIGH_RISK_FLOOR => RiskLevel::Critical,
        p if p < MEDIUM_RISK_FLOOR => RiskLevel::High,
        p if p < LOW_RISK_FLOOR => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

pub fn predicted_end_percentage(percentage: u8) -> u8 {
    percentage.saturating_sub(PROJECTED_DROP)
}

fn alerts_for(level: RiskLevel) -> &'static [&'static str] {
    match level {
        RiskLevel::Critical => &[
            "Critical: Attendance below minimum requirement!",
            "Risk of being debarred from exams",
        ],
        RiskLevel::High => &["Warning: Attendance approaching minimum threshold"],
        RiskLevel::Medium => &["Notice: Room for improvement in attendance"],
        RiskLevel::Low => &[],
    }
}

fn recommendations_for(level: RiskLevel) -> &'static [&'static str] {
    match level {
        RiskLevel::Critical => &[
            "Attend all remaining classes without fail",
            "Meet with academic advisor immediately",
        ],
        RiskLevel::High => &[
            "Improve attendance to avoid academic penalties",
            "Plan ahead to avoid missing classes",
        ],
        RiskLevel::Medium => &["Maintain consistency in class attendance"],
        RiskLevel::Low => &["Keep up the excellent attendance!"],
    }
}

pub fn classify(stats: &AttendanceStats, student_id: &str) -> RiskPrediction {
    let risk_level = risk_level_for(stats.percentage);

    RiskPrediction {
        student_id: student_id.to_string(),
        risk_level,
        attendance_percentage: stats.percentage,
        predicted_end_percentage: predicted_end_percentage(stats.percentage),
        alerts: alerts_for(risk_level)
            .iter()
            .map(|s| s.to_string())
            .collect(),
        recommendations: recommendations_for(risk_level)
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

/// Students at `High` or `Critical` risk, most severe first. Students with
/// the same level keep their roster order.
pub fn at_risk_students(
    students: &[User],
    records: &[AttendanceRecord],
    policy: &EmptyRecordPolicy,
) -> Vec<(User, RiskPrediction)> {
    let mut flagged: Vec<(User, RiskPrediction)> = students
        .iter()
        .map(|student| {
            let stats = compute_stats(records, &student.id, policy);
            (student.clone(), classify(&stats, &student.id))
        })
        .filter(|(_, prediction)| prediction.risk_level >= RiskLevel::High)
        .collect();

    flagged.sort_by(|a, b| b.1.risk_level.cmp(&a.1.risk_level));
    flagged
}
