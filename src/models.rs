use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseEnumError;

/// Closed string enumerations share the same lowercase wire names for
/// serde, `Display` and `FromStr`.
macro_rules! wire_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(ParseEnumError::new($kind, s)),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Theoretical,
    Practical,
}

wire_enum!(SessionType, "session type", {
    Theoretical => "theoretical",
    Practical => "practical",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

wire_enum!(AttendanceStatus, "attendance status", {
    Present => "present",
    Absent => "absent",
    Late => "late",
    Excused => "excused",
});

impl AttendanceStatus {
    /// Late arrivals count as attendance. Excused absences stay in the
    /// denominator without counting as attended.
    pub fn counts_as_attended(self) -> bool {
        match self {
            AttendanceStatus::Present | AttendanceStatus::Late => true,
            AttendanceStatus::Absent | AttendanceStatus::Excused => false,
        }
    }
}

/// Provenance of a record. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkedBy {
    Ble,
    Manual,
    Task,
}

wire_enum!(MarkedBy, "marking method", {
    Ble => "ble",
    Manual => "manual",
    Task => "task",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub session_type: SessionType,
    pub subject: String,
    pub status: AttendanceStatus,
    pub marked_by: MarkedBy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTally {
    pub total: u32,
    pub attended: u32,
}

impl SessionTally {
    /// `attended` is capped at `total`.
    pub fn new(total: u32, attended: u32) -> Self {
        Self {
            total,
            attended: attended.min(total),
        }
    }

    /// Rounded attendance for this session type, `None` when nothing was held.
    pub fn percentage(&self) -> Option<u8> {
        if self.total == 0 {
            None
        } else {
            Some(rounded_percentage(self.attended, self.total))
        }
    }
}

/// `round(100 * attended / total)` with halves rounded up, in integer
/// arithmetic. `total` must be non-zero.
pub(crate) fn rounded_percentage(attended: u32, total: u32) -> u8 {
    let attended = u64::from(attended.min(total));
    let total = u64::from(total);
    ((200 * attended + total) / (2 * total)) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub total_classes: u32,
    pub attended: u32,
    pub percentage: u8,
    pub theoretical: SessionTally,
    pub practical: SessionTally,
}

impl AttendanceStats {
    /// Builds stats whose totals are the sum of the two session tallies.
    /// Each tally's attended count is capped at its total and the sums
    /// saturate at `u32::MAX`.
    pub fn from_tallies(theoretical: SessionTally, practical: SessionTally) -> Self {
        let theoretical = SessionTally::new(theoretical.total, theoretical.attended);
        let practical = SessionTally::new(practical.total, practical.attended);
        let total_classes = theoretical.total.saturating_add(practical.total);
        let attended = theoretical.attended.saturating_add(practical.attended);
        let percentage = if total_classes == 0 {
            0
        } else {
            rounded_percentage(attended, total_classes)
        };

        Self {
            total_classes,
            attended,
            percentage,
            theoretical,
            practical,
        }
    }
}

/// Severity tiers, ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

wire_enum!(RiskLevel, "risk level", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskPrediction {
    pub student_id: String,
    pub risk_level: RiskLevel,
    pub attendance_percentage: u8,
    pub predicted_end_percentage: u8,
    pub alerts: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Teacher,
    Student,
}

wire_enum!(UserRole, "role", {
    Teacher => "teacher",
    Student => "student",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// Institutional student number, e.g. `STU2024001`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Medical,
    Personal,
    Emergency,
    Other,
}

wire_enum!(LeaveType, "leave type", {
    Medical => "medical",
    Personal => "personal",
    Emergency => "emergency",
    Other => "other",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

wire_enum!(LeaveStatus, "leave status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub leave_type: LeaveType,
    pub proof_document: Option<String>,
    pub status: LeaveStatus,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Exam,
    Assignment,
    Holiday,
    Event,
}

wire_enum!(EventType, "event type", {
    Exam => "exam",
    Assignment => "assignment",
    Holiday => "holiday",
    Event => "event",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub event_type: EventType,
}
