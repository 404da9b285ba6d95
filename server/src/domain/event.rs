use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "PENDING",
            EventStatus::Approved => "APPROVED",
            EventStatus::Rejected => "REJECTED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub date: DateTime<Utc>,
    pub max_slots: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}

/// An event together with how many of its enrollments are confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    pub confirmed_count: i64,
}

/// Request body for creating an event, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub date: String,
    pub max_slots: i32,
}

/// Request body for editing an event. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub max_slots: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub date: DateTime<Utc>,
    pub max_slots: i32,
}

/// Validated edit, ready to be applied by a repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub max_slots: Option<i32>,
}

impl EventChanges {
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(max_slots) = self.max_slots {
            event.max_slots = max_slots;
        }
    }
}

/// Which events a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    All,
    Approved,
    /// Approved events plus the given organizer's pending ones.
    ApprovedOrOwnPending(Uuid),
}

impl EventScope {
    pub fn includes(&self, event: &Event) -> bool {
        match self {
            EventScope::All => true,
            EventScope::Approved => event.status == EventStatus::Approved,
            EventScope::ApprovedOrOwnPending(organizer_id) => {
                event.status == EventStatus::Approved
                    || (event.status == EventStatus::Pending
                        && event.organizer_id == *organizer_id)
            }
        }
    }
}
