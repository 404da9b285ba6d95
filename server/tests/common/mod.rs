#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use gridlock_server::domain::clock::FixedClock;
use gridlock_server::domain::event::{CreateEventInput, Event, EventStatus};
use gridlock_server::domain::participant::{Participant, ParticipantStatus};
use gridlock_server::domain::{Requester, Role};
use gridlock_server::repository::memory::MemoryStore;
use gridlock_server::services::{CoreContext, EnrollmentService, EventService};
use uuid::Uuid;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap()
}

pub fn organizer() -> Requester {
    Requester::new(Uuid::new_v4(), Role::Organizer)
}

pub fn participant() -> Requester {
    Requester::new(Uuid::new_v4(), Role::Participant)
}

pub fn admin() -> Requester {
    Requester::new(Uuid::new_v4(), Role::Admin)
}

pub fn event_input(max_slots: i32) -> CreateEventInput {
    CreateEventInput {
        title: "Sunday drive".to_string(),
        description: Some("Coastal road, breakfast stop".to_string()),
        location: "Santos".to_string(),
        date: "2030-06-01T10:00:00Z".to_string(),
        max_slots,
    }
}

#[derive(Clone)]
pub struct Harness {
    pub store: MemoryStore,
    pub events: EventService,
    pub enrollment: EnrollmentService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), Duration::from_secs(5))
    }

    pub fn with_store(store: MemoryStore, deadline: Duration) -> Self {
        let shared = Arc::new(store.clone());
        let ctx = CoreContext::new(
            shared.clone(),
            shared.clone(),
            shared,
            Arc::new(FixedClock(now())),
            deadline,
        );
        Self {
            store,
            events: EventService::new(ctx.clone()),
            enrollment: EnrollmentService::new(ctx),
        }
    }

    pub async fn event_with_status(
        &self,
        owner: &Requester,
        max_slots: i32,
        status: EventStatus,
    ) -> Event {
        let mut event = self
            .events
            .create(owner, event_input(max_slots))
            .await
            .expect("event should be created");
        if status != EventStatus::Pending {
            assert!(self.store.moderate_event(event.id, status).await);
            event.status = status;
        }
        event
    }

    pub async fn approved_event(&self, owner: &Requester, max_slots: i32) -> Event {
        self.event_with_status(owner, max_slots, EventStatus::Approved)
            .await
    }

    /// Joins with a freshly registered car and returns the enrollment.
    pub async fn join(&self, user: &Requester, event_id: Uuid) -> Participant {
        let car_id = self.store.add_car(user.id).await;
        self.enrollment
            .join(user, event_id, car_id)
            .await
            .expect("join should succeed")
    }

    pub async fn confirmed_participant(&self, event_id: Uuid) -> Participant {
        let enrolled = self.join(&participant(), event_id).await;
        assert!(
            self.store
                .moderate_participant(enrolled.id, ParticipantStatus::Confirmed)
                .await
        );
        enrolled
    }
}
