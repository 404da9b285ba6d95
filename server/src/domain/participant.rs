use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participant_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl ParticipantStatus {
    /// Pending enrollments are seat claims awaiting moderation, so they
    /// occupy capacity at join time along with confirmed ones.
    pub fn holds_seat(&self) -> bool {
        matches!(self, ParticipantStatus::Pending | ParticipantStatus::Confirmed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEventInput {
    pub car_id: Uuid,
}

#[derive(Debug, Clone, Copy)]
pub struct NewEnrollment {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
}

/// Which enrollments a participant listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantFilter {
    All,
    ConfirmedOnly,
}

impl ParticipantFilter {
    pub fn includes(&self, participant: &Participant) -> bool {
        match self {
            ParticipantFilter::All => true,
            ParticipantFilter::ConfirmedOnly => {
                participant.status == ParticipantStatus::Confirmed
            }
        }
    }
}
