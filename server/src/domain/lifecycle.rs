//! Event status transitions and mutation preconditions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::clock::parse_event_date;
use super::error::{ConflictKind, CoreError, CoreResult};
use super::event::{CreateEventInput, EventChanges, EventStatus, NewEvent, UpdateEventInput};

pub const ALL_STATUSES: [EventStatus; 4] = [
    EventStatus::Pending,
    EventStatus::Approved,
    EventStatus::Rejected,
    EventStatus::Cancelled,
];

/// Whether `from -> to` is a defined transition. Approval and rejection are
/// driven by moderation; the core itself only ever cancels.
pub fn can_transition(from: EventStatus, to: EventStatus) -> bool {
    matches!(
        (from, to),
        (EventStatus::Pending, EventStatus::Approved)
            | (EventStatus::Pending, EventStatus::Rejected)
            | (EventStatus::Pending, EventStatus::Cancelled)
            | (EventStatus::Approved, EventStatus::Cancelled)
    )
}

/// Statuses from which `to` is reachable in one step.
pub fn sources_of(to: EventStatus) -> Vec<EventStatus> {
    ALL_STATUSES
        .into_iter()
        .filter(|from| can_transition(*from, to))
        .collect()
}

/// An event accepts edits while it still has somewhere to go.
pub fn is_editable(status: EventStatus) -> bool {
    ALL_STATUSES.iter().any(|to| can_transition(status, *to))
}

/// Statuses in which an event accepts edits.
pub fn editable_statuses() -> Vec<EventStatus> {
    ALL_STATUSES
        .into_iter()
        .filter(|status| is_editable(*status))
        .collect()
}

pub fn ensure_editable(status: EventStatus) -> CoreResult<()> {
    if is_editable(status) {
        Ok(())
    } else {
        Err(CoreError::Conflict(ConflictKind::Terminal))
    }
}

pub fn ensure_cancellable(status: EventStatus) -> CoreResult<()> {
    if can_transition(status, EventStatus::Cancelled) {
        return Ok(());
    }
    Err(CoreError::Conflict(match status {
        EventStatus::Cancelled => ConflictKind::AlreadyCancelled,
        EventStatus::Rejected => ConflictKind::Rejected,
        EventStatus::Pending | EventStatus::Approved => ConflictKind::Terminal,
    }))
}

pub fn ensure_joinable(status: EventStatus) -> CoreResult<()> {
    if status == EventStatus::Approved {
        Ok(())
    } else {
        Err(CoreError::Conflict(ConflictKind::NotJoinable))
    }
}

pub fn validate_new_event(
    input: CreateEventInput,
    organizer_id: Uuid,
    now: DateTime<Utc>,
) -> CoreResult<NewEvent> {
    let title = required_text("title", &input.title)?;
    let location = required_text("location", &input.location)?;
    let max_slots = positive_slots(input.max_slots)?;
    let date = parse_event_date(&input.date, now)?;

    Ok(NewEvent {
        organizer_id,
        title,
        description: input.description,
        location,
        date,
        max_slots,
    })
}

/// Validates an edit against the event's current confirmed count.
///
/// Capacity is checked before the date so a request that is wrong on both
/// counts reports the capacity problem.
pub fn validate_changes(
    input: UpdateEventInput,
    confirmed_count: i64,
    now: DateTime<Utc>,
) -> CoreResult<EventChanges> {
    let title = input
        .title
        .as_deref()
        .map(|title| required_text("title", title))
        .transpose()?;
    let location = input
        .location
        .as_deref()
        .map(|location| required_text("location", location))
        .transpose()?;

    let max_slots = match input.max_slots {
        Some(requested) => {
            let requested = positive_slots(requested)?;
            ensure_capacity_covers(requested, confirmed_count)?;
            Some(requested)
        }
        None => None,
    };

    let date = input
        .date
        .as_deref()
        .map(|date| parse_event_date(date, now))
        .transpose()?;

    Ok(EventChanges {
        title,
        description: input.description,
        location,
        date,
        max_slots,
    })
}

pub fn ensure_capacity_covers(max_slots: i32, confirmed_count: i64) -> CoreResult<()> {
    if i64::from(max_slots) < confirmed_count {
        return Err(CoreError::Unprocessable(format!(
            "maxSlots ({}) cannot be lower than the {} confirmed participants",
            max_slots, confirmed_count
        )));
    }
    Ok(())
}

fn required_text(field: &str, value: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn positive_slots(max_slots: i32) -> CoreResult<i32> {
    if max_slots < 1 {
        return Err(CoreError::InvalidInput(
            "maxSlots must be a positive integer".to_string(),
        ));
    }
    Ok(max_slots)
}
