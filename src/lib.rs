//! Attendance aggregation and rule-based risk classification for a
//! classroom attendance dashboard.
//!
//! The two pure entry points are [`stats::compute_stats`] and
//! [`risk::classify`]; the rest is the record source, account and leave
//! plumbing around them.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod risk;
pub mod session;
pub mod stats;
pub mod summary;

pub use config::EngineConfig;
pub use models::{AttendanceRecord, AttendanceStats, RiskLevel, RiskPrediction};
pub use risk::classify;
pub use stats::{compute_stats, EmptyRecordPolicy};
