//! Capacity-safe enrollment.
//!
//! A join runs the cheap checks first against a plain read so the common
//! failures come back in a fixed order (hidden, not joinable, full,
//! duplicate, unowned car). Those reads are advisory. The repository's
//! `enroll` re-checks status, seats and uniqueness inside one atomic unit,
//! and only its answer decides whether a row is written.

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::CoreContext;
use crate::domain::lifecycle;
use crate::domain::participant::{NewEnrollment, Participant};
use crate::domain::policy::{self, Requester};
use crate::domain::{ConflictKind, CoreError, CoreResult};
use crate::repository::EnrollOutcome;

#[derive(Clone)]
pub struct EnrollmentService {
    ctx: CoreContext,
}

impl EnrollmentService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Enrolls the requester in `event_id` with the car `car_id`.
    ///
    /// At most `max_slots` seat-holding enrollments ever exist for an event,
    /// however many joins race. Losers get `Conflict(Full)`.
    #[instrument(skip(self, requester), fields(user_id = %requester.id, role = %requester.role))]
    pub async fn join(
        &self,
        requester: &Requester,
        event_id: Uuid,
        car_id: Uuid,
    ) -> CoreResult<Participant> {
        let detail = self
            .ctx
            .call("events.find_by_id", self.ctx.events.find_by_id(event_id))
            .await?
            .ok_or(CoreError::NotFound)?;
        policy::ensure_visible(requester, &detail.event)?;
        lifecycle::ensure_joinable(detail.event.status)?;

        let held = self
            .ctx
            .call(
                "participants.count_seats_held",
                self.ctx.participants.count_seats_held(event_id),
            )
            .await?;
        if held >= i64::from(detail.event.max_slots) {
            return Err(CoreError::Conflict(ConflictKind::Full));
        }

        let existing = self
            .ctx
            .call(
                "participants.find_by_event_and_user",
                self.ctx
                    .participants
                    .find_by_event_and_user(event_id, requester.id),
            )
            .await?;
        if existing.is_some() {
            return Err(CoreError::Conflict(ConflictKind::Duplicate));
        }

        let owner = self
            .ctx
            .call("assets.owner_of", self.ctx.assets.owner_of(car_id))
            .await?;
        if owner != Some(requester.id) {
            return Err(CoreError::Unprocessable(
                "car not found or not owned by the requester".to_string(),
            ));
        }

        let enrollment = NewEnrollment {
            event_id,
            user_id: requester.id,
            car_id,
        };
        let outcome = self
            .ctx
            .call("participants.enroll", self.ctx.participants.enroll(enrollment))
            .await?;

        match outcome {
            EnrollOutcome::Enrolled(participant) => {
                info!(%event_id, participant_id = %participant.id, "Enrollment created");
                Ok(participant)
            }
            EnrollOutcome::EventMissing => Err(CoreError::NotFound),
            EnrollOutcome::NotJoinable(status) => {
                warn!(%event_id, status = status.as_str(), "Event left APPROVED during join");
                Err(CoreError::Conflict(ConflictKind::NotJoinable))
            }
            EnrollOutcome::Full => {
                info!(%event_id, "Join lost the race for the last seat");
                Err(CoreError::Conflict(ConflictKind::Full))
            }
            EnrollOutcome::Duplicate => Err(CoreError::Conflict(ConflictKind::Duplicate)),
        }
    }

    /// Enrollments of a visible event. Participants only see confirmed rows.
    pub async fn list_participants(
        &self,
        requester: &Requester,
        event_id: Uuid,
        skip: i64,
        take: i64,
    ) -> CoreResult<(Vec<Participant>, i64)> {
        let detail = self
            .ctx
            .call("events.find_by_id", self.ctx.events.find_by_id(event_id))
            .await?
            .ok_or(CoreError::NotFound)?;
        policy::ensure_visible(requester, &detail.event)?;

        let filter = policy::participant_filter(requester.role);
        self.ctx
            .call(
                "participants.list_for_event",
                self.ctx
                    .participants
                    .list_for_event(event_id, filter, skip, take),
            )
            .await
    }
}
