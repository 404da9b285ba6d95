use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::{AssetDirectory, Conditional, EnrollOutcome, EventRepository, ParticipantRepository};
use crate::config::Config;
use crate::domain::event::{Event, EventChanges, EventDetail, EventScope, EventStatus, NewEvent};
use crate::domain::participant::{NewEnrollment, Participant, ParticipantFilter};
use crate::domain::CoreResult;

const EVENT_RETURNING: &str =
    "id, organizer_id, title, description, location, date, max_slots, status, created_at";

const PARTICIPANT_RETURNING: &str = "id, event_id, user_id, car_id, status, joined_at";

/// Builds the shared pool. Connections are handed out per call, so the pool
/// is the only handle threaded through the request path.
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(&config.database_url)?;
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_millis(config.database_acquire_timeout_ms))
        .connect_with(options)
        .await
}

fn status_names(statuses: &[EventStatus]) -> Vec<String> {
    statuses.iter().map(|status| status.as_str().to_string()).collect()
}

#[derive(Clone)]
pub struct EventRepositoryImpl {
    pool: PgPool,
}

impl EventRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for EventRepositoryImpl {
    async fn insert(&self, event: NewEvent) -> CoreResult<Event> {
        let sql = format!(
            r#"
            INSERT INTO events
                (id, organizer_id, title, description, location, date, max_slots, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'PENDING')
            RETURNING {EVENT_RETURNING}
            "#
        );

        let created = sqlx::query_as::<_, Event>(&sql)
            .bind(Uuid::new_v4())
            .bind(event.organizer_id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.location)
            .bind(event.date)
            .bind(event.max_slots)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_id(&self, event_id: Uuid) -> CoreResult<Option<EventDetail>> {
        let detail = sqlx::query_as::<_, EventDetail>(
            r#"
            SELECT e.id, e.organizer_id, e.title, e.description, e.location, e.date,
                   e.max_slots, e.status, e.created_at,
                   (SELECT COUNT(*) FROM event_participants p
                     WHERE p.event_id = e.id AND p.status = 'CONFIRMED') AS confirmed_count
            FROM events e
            WHERE e.id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detail)
    }

    async fn list(
        &self,
        scope: EventScope,
        skip: i64,
        take: i64,
    ) -> CoreResult<(Vec<EventDetail>, i64)> {
        let (everything, own_pending) = match scope {
            EventScope::All => (true, None),
            EventScope::Approved => (false, None),
            EventScope::ApprovedOrOwnPending(organizer_id) => (false, Some(organizer_id)),
        };

        // Page and total come from one snapshot.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let events = sqlx::query_as::<_, EventDetail>(
            r#"
            SELECT e.id, e.organizer_id, e.title, e.description, e.location, e.date,
                   e.max_slots, e.status, e.created_at,
                   (SELECT COUNT(*) FROM event_participants p
                     WHERE p.event_id = e.id AND p.status = 'CONFIRMED') AS confirmed_count
            FROM events e
            WHERE $1
               OR e.status = 'APPROVED'
               OR (e.status = 'PENDING' AND e.organizer_id = $2)
            ORDER BY e.date ASC, e.id ASC
            OFFSET $3
            LIMIT $4
            "#,
        )
        .bind(everything)
        .bind(own_pending)
        .bind(skip)
        .bind(take)
        .fetch_all(&mut *tx)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM events e
            WHERE $1
               OR e.status = 'APPROVED'
               OR (e.status = 'PENDING' AND e.organizer_id = $2)
            "#,
        )
        .bind(everything)
        .bind(own_pending)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((events, total))
    }

    async fn update_if(
        &self,
        event_id: Uuid,
        changes: &EventChanges,
        allowed: &[EventStatus],
    ) -> CoreResult<Conditional<Event>> {
        let mut tx = self.pool.begin().await?;

        // Same row lock the join path takes, so a shrink and a join never
        // interleave.
        let locked: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM events WHERE id = $1 AND status::text = ANY($2) FOR UPDATE",
        )
        .bind(event_id)
        .bind(status_names(allowed))
        .fetch_optional(&mut *tx)
        .await?;

        if locked.is_none() {
            return Ok(Conditional::Rejected);
        }

        let sql = format!(
            r#"
            UPDATE events e
            SET title = COALESCE($2, e.title),
                description = COALESCE($3, e.description),
                location = COALESCE($4, e.location),
                date = COALESCE($5, e.date),
                max_slots = COALESCE($6, e.max_slots)
            WHERE e.id = $1
              AND ($6::int IS NULL OR $6::int >= (
                    SELECT COUNT(*) FROM event_participants p
                     WHERE p.event_id = e.id AND p.status = 'CONFIRMED'))
            RETURNING {EVENT_RETURNING}
            "#
        );

        let updated = sqlx::query_as::<_, Event>(&sql)
            .bind(event_id)
            .bind(&changes.title)
            .bind(&changes.description)
            .bind(&changes.location)
            .bind(changes.date)
            .bind(changes.max_slots)
            .fetch_optional(&mut *tx)
            .await?;

        match updated {
            Some(event) => {
                tx.commit().await?;
                Ok(Conditional::Applied(event))
            }
            None => Ok(Conditional::Rejected),
        }
    }

    async fn transition_if(
        &self,
        event_id: Uuid,
        from: &[EventStatus],
        to: EventStatus,
    ) -> CoreResult<Conditional<Event>> {
        let sql = format!(
            r#"
            UPDATE events
            SET status = $2
            WHERE id = $1 AND status::text = ANY($3)
            RETURNING {EVENT_RETURNING}
            "#
        );

        let updated = sqlx::query_as::<_, Event>(&sql)
            .bind(event_id)
            .bind(to)
            .bind(status_names(from))
            .fetch_optional(&self.pool)
            .await?;

        Ok(match updated {
            Some(event) => Conditional::Applied(event),
            None => Conditional::Rejected,
        })
    }
}

#[derive(Clone)]
pub struct ParticipantRepositoryImpl {
    pool: PgPool,
}

impl ParticipantRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for ParticipantRepositoryImpl {
    async fn enroll(&self, enrollment: NewEnrollment) -> CoreResult<EnrollOutcome> {
        let mut tx = self.pool.begin().await?;

        // Locking the event row serializes every join on this event across
        // all server processes until commit. Dropping the transaction on any
        // early return rolls it back.
        let event: Option<(EventStatus, i32)> = sqlx::query_as(
            "SELECT status, max_slots FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(enrollment.event_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((status, max_slots)) = event else {
            return Ok(EnrollOutcome::EventMissing);
        };

        if status != EventStatus::Approved {
            return Ok(EnrollOutcome::NotJoinable(status));
        }

        let held: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM event_participants
            WHERE event_id = $1 AND status IN ('PENDING', 'CONFIRMED')
            "#,
        )
        .bind(enrollment.event_id)
        .fetch_one(&mut *tx)
        .await?;

        if held >= i64::from(max_slots) {
            return Ok(EnrollOutcome::Full);
        }

        let sql = format!(
            r#"
            INSERT INTO event_participants (id, event_id, user_id, car_id, status)
            VALUES ($1, $2, $3, $4, 'PENDING')
            ON CONFLICT (event_id, user_id) DO NOTHING
            RETURNING {PARTICIPANT_RETURNING}
            "#
        );

        let inserted = sqlx::query_as::<_, Participant>(&sql)
            .bind(Uuid::new_v4())
            .bind(enrollment.event_id)
            .bind(enrollment.user_id)
            .bind(enrollment.car_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(participant) = inserted else {
            return Ok(EnrollOutcome::Duplicate);
        };

        tx.commit().await?;

        Ok(EnrollOutcome::Enrolled(participant))
    }

    async fn find_by_event_and_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> CoreResult<Option<Participant>> {
        let sql = format!(
            r#"
            SELECT {PARTICIPANT_RETURNING}
            FROM event_participants
            WHERE event_id = $1 AND user_id = $2
            "#
        );
        let participant = sqlx::query_as::<_, Participant>(&sql)
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(participant)
    }

    async fn count_seats_held(&self, event_id: Uuid) -> CoreResult<i64> {
        let held = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM event_participants
            WHERE event_id = $1 AND status IN ('PENDING', 'CONFIRMED')
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(held)
    }

    async fn list_for_event(
        &self,
        event_id: Uuid,
        filter: ParticipantFilter,
        skip: i64,
        take: i64,
    ) -> CoreResult<(Vec<Participant>, i64)> {
        let confirmed_only = filter == ParticipantFilter::ConfirmedOnly;

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            r#"
            SELECT {PARTICIPANT_RETURNING}
            FROM event_participants
            WHERE event_id = $1 AND (NOT $2 OR status = 'CONFIRMED')
            ORDER BY joined_at ASC, id ASC
            OFFSET $3
            LIMIT $4
            "#
        );
        let participants = sqlx::query_as::<_, Participant>(&sql)
            .bind(event_id)
            .bind(confirmed_only)
            .bind(skip)
            .bind(take)
            .fetch_all(&mut *tx)
            .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM event_participants
            WHERE event_id = $1 AND (NOT $2 OR status = 'CONFIRMED')
            "#,
        )
        .bind(event_id)
        .bind(confirmed_only)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((participants, total))
    }
}

#[derive(Clone)]
pub struct AssetDirectoryImpl {
    pool: PgPool,
}

impl AssetDirectoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetDirectory for AssetDirectoryImpl {
    async fn owner_of(&self, asset_id: Uuid) -> CoreResult<Option<Uuid>> {
        let owner = sqlx::query_scalar("SELECT owner_id FROM cars WHERE id = $1")
            .bind(asset_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }
}
