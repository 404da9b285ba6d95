//! Storage contracts the core depends on.
//!
//! The conditional operations (`update_if`, `transition_if`, `enroll`) must
//! evaluate their predicate and apply their write as one indivisible step
//! against every concurrent caller, including callers in other processes.
//! Nothing above this layer takes locks.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::event::{Event, EventChanges, EventDetail, EventScope, EventStatus, NewEvent};
use crate::domain::participant::{NewEnrollment, Participant, ParticipantFilter};
use crate::domain::CoreResult;

pub mod memory;
pub mod postgres;

/// Result of a write that only happens while a predicate holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Conditional<T> {
    Applied(T),
    /// The predicate did not hold (or the row is gone); nothing was written.
    Rejected,
}

/// Result of the atomic compare-and-insert behind a join.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollOutcome {
    Enrolled(Participant),
    EventMissing,
    NotJoinable(EventStatus),
    Full,
    Duplicate,
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn insert(&self, event: NewEvent) -> CoreResult<Event>;

    async fn find_by_id(&self, event_id: Uuid) -> CoreResult<Option<EventDetail>>;

    /// Events in `scope` ordered by date, plus the total size of the scope.
    async fn list(
        &self,
        scope: EventScope,
        skip: i64,
        take: i64,
    ) -> CoreResult<(Vec<EventDetail>, i64)>;

    /// Applies `changes` only if the stored status is in `allowed` and, when
    /// `max_slots` changes, the confirmed count still fits under it.
    async fn update_if(
        &self,
        event_id: Uuid,
        changes: &EventChanges,
        allowed: &[EventStatus],
    ) -> CoreResult<Conditional<Event>>;

    /// Moves the event to `to` only if its stored status is in `from`.
    async fn transition_if(
        &self,
        event_id: Uuid,
        from: &[EventStatus],
        to: EventStatus,
    ) -> CoreResult<Conditional<Event>>;
}

#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Inserts a `PENDING` enrollment if, at the moment of the write, the
    /// event exists and is approved, holds fewer seat claims than
    /// `max_slots`, and has no row for this user.
    async fn enroll(&self, enrollment: NewEnrollment) -> CoreResult<EnrollOutcome>;

    async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> CoreResult<Option<Participant>>;

    /// Enrollments that currently hold a seat (pending or confirmed).
    async fn count_seats_held(&self, event_id: Uuid) -> CoreResult<i64>;

    /// Enrollments ordered by join time, plus the total matching `filter`.
    async fn list_for_event(
        &self,
        event_id: Uuid,
        filter: ParticipantFilter,
        skip: i64,
        take: i64,
    ) -> CoreResult<(Vec<Participant>, i64)>;
}

/// Read side of the asset (vehicle) ownership collaborator.
#[async_trait]
pub trait AssetDirectory: Send + Sync {
    async fn owner_of(&self, asset_id: Uuid) -> CoreResult<Option<Uuid>>;
}
