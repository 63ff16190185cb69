use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Event, EventType, LeaveRequest, LeaveStatus, User};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeaveCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventTypeCount {
    pub event_type: EventType,
    pub count: usize,
}

pub fn leave_counts<'a>(leaves: impl IntoIterator<Item = &'a LeaveRequest>) -> LeaveCounts {
    let mut counts = LeaveCounts::default();

    for leave in leaves {
        match leave.status {
            LeaveStatus::Pending => counts.pending += 1,
            LeaveStatus::Approved => counts.approved += 1,
            LeaveStatus::Rejected => counts.rejected += 1,
        }
        counts.total += 1;
    }

    counts
}

/// One entry per event type, in declaration order, zero counts included.
pub fn event_counts(events: &[Event]) -> Vec<EventTypeCount> {
    EventType::ALL
        .iter()
        .map(|&event_type| EventTypeCount {
            event_type,
            count: events.iter().filter(|e| e.event_type == event_type).count(),
        })
        .collect()
}

/// Events on or after `today`, soonest first.
pub fn upcoming_events(events: &[Event], today: NaiveDate) -> Vec<Event> {
    let mut upcoming: Vec<Event> = events
        .iter()
        .filter(|e| e.date >= today)
        .cloned()
        .collect();
    upcoming.sort_by(|a, b| {
        a.date.cmp(&b.date).then_with(|| a.title.cmp(&b.title))
    });
    upcoming
}

/// Case-insensitive match on name or student number.
pub fn search_students<'a>(students: &'a [User], query: &str) -> Vec<&'a User> {
    let needle = query.trim().to_lowercase();

    students
        .iter()
        .filter(|student| {
            needle.is_empty()
                || student.name.to_lowercase().contains(&needle)
                || student
                    .student_id
                    .as_deref()
                    .is_some_and(|number| number.to_lowercase().contains(&needle))
        })
        .collect()
}
