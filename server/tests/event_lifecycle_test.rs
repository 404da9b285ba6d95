mod common;

use std::time::Duration;

use common::{admin, event_input, organizer, participant, Harness};
use gridlock_server::domain::event::{EventStatus, UpdateEventInput};
use gridlock_server::domain::participant::ParticipantStatus;
use gridlock_server::domain::{ConflictKind, CoreError};
use gridlock_server::repository::memory::MemoryStore;
use uuid::Uuid;

fn shrink_to(max_slots: i32) -> UpdateEventInput {
    UpdateEventInput {
        max_slots: Some(max_slots),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_created_events_start_pending_and_owned() {
    let harness = Harness::new();
    let owner = organizer();
    let event = harness.events.create(&owner, event_input(8)).await.unwrap();

    assert_eq!(event.status, EventStatus::Pending);
    assert_eq!(event.organizer_id, owner.id);
    assert_eq!(event.max_slots, 8);
}

#[tokio::test]
async fn test_create_rejects_past_dates() {
    let harness = Harness::new();
    let mut input = event_input(8);
    input.date = "2029-12-31T23:59:59Z".into();

    let err = harness.events.create(&organizer(), input).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn test_hidden_event_is_indistinguishable_from_missing() {
    let harness = Harness::new();
    let pending = harness
        .event_with_status(&organizer(), 5, EventStatus::Pending)
        .await;
    let stranger = participant();

    let hidden = harness.events.get(&stranger, pending.id).await.unwrap_err();
    let missing = harness.events.get(&stranger, Uuid::new_v4()).await.unwrap_err();

    assert!(matches!(hidden, CoreError::NotFound));
    assert_eq!(hidden.to_string(), missing.to_string());
}

#[tokio::test]
async fn test_visibility_by_role() {
    let harness = Harness::new();
    let owner = organizer();
    let pending = harness
        .event_with_status(&owner, 5, EventStatus::Pending)
        .await;

    assert!(harness.events.get(&owner, pending.id).await.is_ok());
    assert!(harness.events.get(&admin(), pending.id).await.is_ok());
    assert!(harness.events.get(&organizer(), pending.id).await.is_err());

    let rejected = harness
        .event_with_status(&owner, 5, EventStatus::Rejected)
        .await;
    assert!(harness.events.get(&owner, rejected.id).await.is_err());
    assert!(harness.events.get(&admin(), rejected.id).await.is_ok());
}

#[tokio::test]
async fn test_listing_is_scoped_by_role() {
    let harness = Harness::new();
    let owner = organizer();
    harness.approved_event(&owner, 5).await;
    harness
        .event_with_status(&owner, 5, EventStatus::Pending)
        .await;
    harness
        .event_with_status(&organizer(), 5, EventStatus::Pending)
        .await;
    harness
        .event_with_status(&owner, 5, EventStatus::Cancelled)
        .await;

    let (_, as_participant) = harness.events.list(&participant(), 0, 20).await.unwrap();
    let (_, as_owner) = harness.events.list(&owner, 0, 20).await.unwrap();
    let (_, as_admin) = harness.events.list(&admin(), 0, 20).await.unwrap();

    assert_eq!(as_participant, 1);
    assert_eq!(as_owner, 2);
    assert_eq!(as_admin, 4);

    let (page, total) = harness.events.list(&admin(), 3, 2).await.unwrap();
    assert_eq!(total, 4);
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_shrinking_below_confirmed_fails_without_mutation() {
    let harness = Harness::new();
    let owner = organizer();
    let event = harness.approved_event(&owner, 5).await;
    harness.confirmed_participant(event.id).await;
    harness.confirmed_participant(event.id).await;
    harness.confirmed_participant(event.id).await;

    let err = harness
        .events
        .update(&owner, event.id, shrink_to(2))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unprocessable(_)));

    let stored = harness.events.get(&owner, event.id).await.unwrap();
    assert_eq!(stored.event.max_slots, 5);
    assert_eq!(stored.confirmed_count, 3);

    let updated = harness
        .events
        .update(&owner, event.id, shrink_to(3))
        .await
        .unwrap();
    assert_eq!(updated.max_slots, 3);
}

#[tokio::test]
async fn test_pending_enrollments_do_not_block_shrinking() {
    let harness = Harness::new();
    let owner = organizer();
    let event = harness.approved_event(&owner, 5).await;
    harness.join(&participant(), event.id).await;
    harness.join(&participant(), event.id).await;

    let updated = harness
        .events
        .update(&owner, event.id, shrink_to(1))
        .await
        .unwrap();
    assert_eq!(updated.max_slots, 1);
}

#[tokio::test]
async fn test_update_applies_partial_changes() {
    let harness = Harness::new();
    let owner = organizer();
    let event = harness.approved_event(&owner, 5).await;

    let input = UpdateEventInput {
        title: Some("Sunset drive".into()),
        date: Some("2030-07-01T18:00:00-03:00".into()),
        ..Default::default()
    };
    let updated = harness.events.update(&owner, event.id, input).await.unwrap();

    assert_eq!(updated.title, "Sunset drive");
    assert_eq!(updated.location, event.location);
    assert_eq!(updated.date.to_rfc3339(), "2030-07-01T21:00:00+00:00");
}

#[tokio::test]
async fn test_update_rejects_past_date() {
    let harness = Harness::new();
    let owner = organizer();
    let event = harness.approved_event(&owner, 5).await;

    let input = UpdateEventInput {
        date: Some("2020-01-01".into()),
        ..Default::default()
    };
    let err = harness.events.update(&owner, event.id, input).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn test_non_owner_mutation_reports_not_found() {
    let harness = Harness::new();
    let event = harness.approved_event(&organizer(), 5).await;
    let other = organizer();

    let err = harness
        .events
        .update(&other, event.id, shrink_to(6))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound));

    let err = harness.events.cancel(&other, event.id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound));

    assert!(harness.events.cancel(&admin(), event.id).await.is_ok());
}

#[tokio::test]
async fn test_terminal_events_reject_edits() {
    let harness = Harness::new();
    let owner = organizer();
    for status in [EventStatus::Cancelled, EventStatus::Rejected] {
        let event = harness.event_with_status(&owner, 5, status).await;
        let err = harness
            .events
            .update(&owner, event.id, shrink_to(6))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(ConflictKind::Terminal)));
    }
}

#[tokio::test]
async fn test_cancel_transitions() {
    let harness = Harness::new();
    let owner = organizer();

    for status in [EventStatus::Pending, EventStatus::Approved] {
        let event = harness.event_with_status(&owner, 5, status).await;
        let cancelled = harness.events.cancel(&owner, event.id).await.unwrap();
        assert_eq!(cancelled.status, EventStatus::Cancelled);

        let again = harness.events.cancel(&owner, event.id).await.unwrap_err();
        assert!(matches!(
            again,
            CoreError::Conflict(ConflictKind::AlreadyCancelled)
        ));
    }

    let rejected = harness
        .event_with_status(&owner, 5, EventStatus::Rejected)
        .await;
    let err = harness.events.cancel(&owner, rejected.id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(ConflictKind::Rejected)));
}

#[tokio::test]
async fn test_join_precondition_order() {
    let harness = Harness::new();
    let owner = organizer();
    let user = participant();
    let car_id = harness.store.add_car(user.id).await;

    // Hidden pending event
    let pending = harness
        .event_with_status(&owner, 1, EventStatus::Pending)
        .await;
    let err = harness.enrollment.join(&user, pending.id, car_id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound));

    // Visible to its owner but not open
    let owner_car = harness.store.add_car(owner.id).await;
    let err = harness
        .enrollment
        .join(&owner, pending.id, owner_car)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(ConflictKind::NotJoinable)));

    // Someone else's car
    let event = harness.approved_event(&owner, 2).await;
    let err = harness
        .enrollment
        .join(&user, event.id, owner_car)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unprocessable(_)));

    // Unknown car
    let err = harness
        .enrollment
        .join(&user, event.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unprocessable(_)));

    let enrolled = harness.enrollment.join(&user, event.id, car_id).await.unwrap();
    assert_eq!(enrolled.status, ParticipantStatus::Pending);
    assert_eq!(enrolled.car_id, car_id);

    let err = harness.enrollment.join(&user, event.id, car_id).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(ConflictKind::Duplicate)));

    harness.join(&participant(), event.id).await;
    let late = participant();
    let late_car = harness.store.add_car(late.id).await;
    let err = harness.enrollment.join(&late, event.id, late_car).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(ConflictKind::Full)));
}

#[tokio::test]
async fn test_cancelled_event_is_not_joinable() {
    let harness = Harness::new();
    let owner = organizer();
    let event = harness.approved_event(&owner, 5).await;
    harness.events.cancel(&owner, event.id).await.unwrap();

    let user = participant();
    let car_id = harness.store.add_car(user.id).await;
    // Cancelled events are invisible to participants.
    let err = harness.enrollment.join(&user, event.id, car_id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound));

    let staff = admin();
    let staff_car = harness.store.add_car(staff.id).await;
    let err = harness.enrollment.join(&staff, event.id, staff_car).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(ConflictKind::NotJoinable)));
}

#[tokio::test]
async fn test_participant_listing_hides_unconfirmed_rows_from_participants() {
    let harness = Harness::new();
    let owner = organizer();
    let event = harness.approved_event(&owner, 5).await;
    let confirmed = harness.confirmed_participant(event.id).await;
    harness.join(&participant(), event.id).await;

    let (rows, total) = harness
        .enrollment
        .list_participants(&participant(), event.id, 0, 20)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].id, confirmed.id);

    let (rows, total) = harness
        .enrollment
        .list_participants(&owner, event.id, 0, 20)
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_participant_listing_of_hidden_event_is_not_found() {
    let harness = Harness::new();
    let pending = harness
        .event_with_status(&organizer(), 5, EventStatus::Pending)
        .await;

    let err = harness
        .enrollment
        .list_participants(&participant(), pending.id, 0, 20)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound));
}

#[tokio::test]
async fn test_slow_storage_surfaces_as_unavailable() {
    let harness = Harness::with_store(
        MemoryStore::new().with_latency(Duration::from_millis(200)),
        Duration::from_millis(20),
    );

    let err = harness
        .events
        .get(&admin(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Unavailable(_)));
    assert!(err.is_retryable());
}
