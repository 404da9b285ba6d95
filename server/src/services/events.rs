use tracing::{info, instrument};
use uuid::Uuid;

use super::CoreContext;
use crate::domain::event::{
    CreateEventInput, Event, EventChanges, EventDetail, EventStatus, UpdateEventInput,
};
use crate::domain::lifecycle;
use crate::domain::policy::{self, Requester};
use crate::domain::{CoreError, CoreResult};
use crate::repository::Conditional;

/// Event reads and organizer-side mutations.
#[derive(Clone)]
pub struct EventService {
    ctx: CoreContext,
}

impl EventService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Creates a `PENDING` event owned by the requester.
    ///
    /// Role gating (organizers and admins only) happens at the boundary, see
    /// [`policy::can_create_events`].
    #[instrument(
        skip(self, requester, input),
        fields(user_id = %requester.id, role = %requester.role)
    )]
    pub async fn create(
        &self,
        requester: &Requester,
        input: CreateEventInput,
    ) -> CoreResult<Event> {
        let new_event = lifecycle::validate_new_event(input, requester.id, self.ctx.clock.now())?;
        let event = self
            .ctx
            .call("events.insert", self.ctx.events.insert(new_event))
            .await?;

        info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    pub async fn list(
        &self,
        requester: &Requester,
        skip: i64,
        take: i64,
    ) -> CoreResult<(Vec<EventDetail>, i64)> {
        let scope = policy::event_scope(requester);
        self.ctx
            .call("events.list", self.ctx.events.list(scope, skip, take))
            .await
    }

    pub async fn get(&self, requester: &Requester, event_id: Uuid) -> CoreResult<EventDetail> {
        let detail = self.load(event_id).await?;
        policy::ensure_visible(requester, &detail.event)?;
        Ok(detail)
    }

    #[instrument(
        skip(self, requester, input),
        fields(user_id = %requester.id, role = %requester.role)
    )]
    pub async fn update(
        &self,
        requester: &Requester,
        event_id: Uuid,
        input: UpdateEventInput,
    ) -> CoreResult<Event> {
        let detail = self.load(event_id).await?;
        policy::ensure_editable(requester, &detail.event)?;

        let changes =
            lifecycle::validate_changes(input, detail.confirmed_count, self.ctx.clock.now())?;

        let outcome = self
            .ctx
            .call(
                "events.update_if",
                self.ctx
                    .events
                    .update_if(event_id, &changes, &lifecycle::editable_statuses()),
            )
            .await?;

        match outcome {
            Conditional::Applied(event) => {
                info!(%event_id, "Event updated");
                Ok(event)
            }
            Conditional::Rejected => Err(self.explain_rejected_update(event_id, &changes).await),
        }
    }

    /// Cancels a pending or approved event. Cancelling twice is a conflict.
    #[instrument(skip(self, requester), fields(user_id = %requester.id, role = %requester.role))]
    pub async fn cancel(&self, requester: &Requester, event_id: Uuid) -> CoreResult<Event> {
        let detail = self.load(event_id).await?;
        policy::ensure_deletable(requester, &detail.event)?;

        let from = lifecycle::sources_of(EventStatus::Cancelled);
        let outcome = self
            .ctx
            .call(
                "events.transition_if",
                self.ctx
                    .events
                    .transition_if(event_id, &from, EventStatus::Cancelled),
            )
            .await?;

        match outcome {
            Conditional::Applied(event) => {
                info!(%event_id, "Event cancelled");
                Ok(event)
            }
            // Lost a race with another writer; report what it left behind.
            Conditional::Rejected => {
                let current = self.load(event_id).await?;
                lifecycle::ensure_cancellable(current.event.status)?;
                Err(changed_underneath(event_id))
            }
        }
    }

    async fn load(&self, event_id: Uuid) -> CoreResult<EventDetail> {
        self.ctx
            .call("events.find_by_id", self.ctx.events.find_by_id(event_id))
            .await?
            .ok_or(CoreError::NotFound)
    }

    async fn explain_rejected_update(&self, event_id: Uuid, changes: &EventChanges) -> CoreError {
        let current = match self.load(event_id).await {
            Ok(current) => current,
            Err(err) => return err,
        };
        if let Err(err) = lifecycle::ensure_editable(current.event.status) {
            return err;
        }
        if let Some(max_slots) = changes.max_slots {
            let confirmed = current.confirmed_count;
            if let Err(err) = lifecycle::ensure_capacity_covers(max_slots, confirmed) {
                return err;
            }
        }
        changed_underneath(event_id)
    }
}

fn changed_underneath(event_id: Uuid) -> CoreError {
    CoreError::Unavailable(format!("event {} changed during the request; retry", event_id))
}
