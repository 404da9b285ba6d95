//! In-process store honoring the same atomicity contract as Postgres.
//!
//! Every conditional operation runs under one table lock, which plays the
//! role of the database's row lock. Used by tests and local demos; it is not
//! shared across processes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AssetDirectory, Conditional, EnrollOutcome, EventRepository, ParticipantRepository};
use crate::domain::event::{Event, EventChanges, EventDetail, EventScope, EventStatus, NewEvent};
use crate::domain::participant::{
    NewEnrollment, Participant, ParticipantFilter, ParticipantStatus,
};
use crate::domain::CoreResult;

#[derive(Default)]
struct Tables {
    events: HashMap<Uuid, Event>,
    participants: Vec<Participant>,
    cars: HashMap<Uuid, Uuid>,
}

impl Tables {
    fn confirmed_count(&self, event_id: Uuid) -> i64 {
        self.participants
            .iter()
            .filter(|p| p.event_id == event_id && p.status == ParticipantStatus::Confirmed)
            .count() as i64
    }

    fn seats_held(&self, event_id: Uuid) -> i64 {
        self.participants
            .iter()
            .filter(|p| p.event_id == event_id && p.status.holds_seat())
            .count() as i64
    }

    fn detail(&self, event: &Event) -> EventDetail {
        EventDetail {
            event: event.clone(),
            confirmed_count: self.confirmed_count(event.id),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call, for exercising caller deadlines.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn lock(&self) -> tokio::sync::MutexGuard<'_, Tables> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.tables.lock().await
    }

    /// Registers a vehicle owned by `owner_id` and returns its id.
    pub async fn add_car(&self, owner_id: Uuid) -> Uuid {
        let car_id = Uuid::new_v4();
        self.tables.lock().await.cars.insert(car_id, owner_id);
        car_id
    }

    /// Stands in for the moderation collaborator on events.
    pub async fn moderate_event(&self, event_id: Uuid, status: EventStatus) -> bool {
        match self.tables.lock().await.events.get_mut(&event_id) {
            Some(event) => {
                event.status = status;
                true
            }
            None => false,
        }
    }

    /// Stands in for the moderation collaborator on enrollments.
    pub async fn moderate_participant(
        &self,
        participant_id: Uuid,
        status: ParticipantStatus,
    ) -> bool {
        let mut tables = self.tables.lock().await;
        match tables.participants.iter_mut().find(|p| p.id == participant_id) {
            Some(participant) => {
                participant.status = status;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn insert(&self, event: NewEvent) -> CoreResult<Event> {
        let mut tables = self.lock().await;
        let created = Event {
            id: Uuid::new_v4(),
            organizer_id: event.organizer_id,
            title: event.title,
            description: event.description,
            location: event.location,
            date: event.date,
            max_slots: event.max_slots,
            status: EventStatus::Pending,
            created_at: Utc::now(),
        };
        tables.events.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, event_id: Uuid) -> CoreResult<Option<EventDetail>> {
        let tables = self.lock().await;
        Ok(tables.events.get(&event_id).map(|event| tables.detail(event)))
    }

    async fn list(
        &self,
        scope: EventScope,
        skip: i64,
        take: i64,
    ) -> CoreResult<(Vec<EventDetail>, i64)> {
        let tables = self.lock().await;
        let mut matching: Vec<&Event> = tables
            .events
            .values()
            .filter(|event| scope.includes(event))
            .collect();
        matching.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(take.max(0) as usize)
            .map(|event| tables.detail(event))
            .collect();

        Ok((page, total))
    }

    async fn update_if(
        &self,
        event_id: Uuid,
        changes: &EventChanges,
        allowed: &[EventStatus],
    ) -> CoreResult<Conditional<Event>> {
        let mut tables = self.lock().await;
        let confirmed = tables.confirmed_count(event_id);

        let Some(event) = tables.events.get_mut(&event_id) else {
            return Ok(Conditional::Rejected);
        };
        if !allowed.contains(&event.status) {
            return Ok(Conditional::Rejected);
        }
        if let Some(max_slots) = changes.max_slots {
            if i64::from(max_slots) < confirmed {
                return Ok(Conditional::Rejected);
            }
        }

        changes.apply_to(event);
        Ok(Conditional::Applied(event.clone()))
    }

    async fn transition_if(
        &self,
        event_id: Uuid,
        from: &[EventStatus],
        to: EventStatus,
    ) -> CoreResult<Conditional<Event>> {
        let mut tables = self.lock().await;
        match tables.events.get_mut(&event_id) {
            Some(event) if from.contains(&event.status) => {
                event.status = to;
                Ok(Conditional::Applied(event.clone()))
            }
            _ => Ok(Conditional::Rejected),
        }
    }
}

#[async_trait]
impl ParticipantRepository for MemoryStore {
    async fn enroll(&self, enrollment: NewEnrollment) -> CoreResult<EnrollOutcome> {
        let mut tables = self.lock().await;

        let Some(event) = tables.events.get(&enrollment.event_id) else {
            return Ok(EnrollOutcome::EventMissing);
        };
        if event.status != EventStatus::Approved {
            return Ok(EnrollOutcome::NotJoinable(event.status));
        }
        if tables.seats_held(enrollment.event_id) >= i64::from(event.max_slots) {
            return Ok(EnrollOutcome::Full);
        }
        let duplicate = tables
            .participants
            .iter()
            .any(|p| p.event_id == enrollment.event_id && p.user_id == enrollment.user_id);
        if duplicate {
            return Ok(EnrollOutcome::Duplicate);
        }

        let participant = Participant {
            id: Uuid::new_v4(),
            event_id: enrollment.event_id,
            user_id: enrollment.user_id,
            car_id: enrollment.car_id,
            status: ParticipantStatus::Pending,
            joined_at: Utc::now(),
        };
        tables.participants.push(participant.clone());

        Ok(EnrollOutcome::Enrolled(participant))
    }

    async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> CoreResult<Option<Participant>> {
        let tables = self.lock().await;
        Ok(tables
            .participants
            .iter()
            .find(|p| p.event_id == event_id && p.user_id == user_id)
            .cloned())
    }

    async fn count_seats_held(&self, event_id: Uuid) -> CoreResult<i64> {
        Ok(self.lock().await.seats_held(event_id))
    }

    async fn list_for_event(
        &self,
        event_id: Uuid,
        filter: ParticipantFilter,
        skip: i64,
        take: i64,
    ) -> CoreResult<(Vec<Participant>, i64)> {
        let tables = self.lock().await;
        // Rows are appended in join order.
        let matching: Vec<&Participant> = tables
            .participants
            .iter()
            .filter(|p| p.event_id == event_id && filter.includes(p))
            .collect();

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(take.max(0) as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }
}

#[async_trait]
impl AssetDirectory for MemoryStore {
    async fn owner_of(&self, asset_id: Uuid) -> CoreResult<Option<Uuid>> {
        Ok(self.lock().await.cars.get(&asset_id).copied())
    }
}
