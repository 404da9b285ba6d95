//! Who may see and change which events.
//!
//! Every rule here is a pure predicate over the requester and the stored
//! event; callers turn a `false` into [`CoreError::NotFound`] so that hidden
//! events are indistinguishable from missing ones.

use uuid::Uuid;

use super::error::{CoreError, CoreResult};
use super::event::{Event, EventScope, EventStatus};
use super::lifecycle;
use super::participant::ParticipantFilter;
use super::role::Role;

/// Identity and role supplied by the trusted identity source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: Uuid,
    pub role: Role,
}

impl Requester {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    fn owns(&self, event: &Event) -> bool {
        event.organizer_id == self.id
    }
}

/// Rights a requester holds over one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub visible: bool,
    pub editable: bool,
    pub deletable: bool,
}

pub fn access(requester: &Requester, event: &Event) -> Access {
    let steward = is_steward(requester, event);
    Access {
        visible: can_view(requester, event),
        editable: steward && lifecycle::is_editable(event.status),
        deletable: steward && lifecycle::can_transition(event.status, EventStatus::Cancelled),
    }
}

pub fn can_view(requester: &Requester, event: &Event) -> bool {
    match (requester.role, event.status) {
        (Role::Admin, _) => true,
        (_, EventStatus::Approved) => true,
        (Role::Organizer, EventStatus::Pending) => requester.owns(event),
        _ => false,
    }
}

/// Admins and the owning organizer may manage an event, lifecycle permitting.
pub fn is_steward(requester: &Requester, event: &Event) -> bool {
    requester.role == Role::Admin || requester.owns(event)
}

pub fn can_create_events(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Organizer)
}

pub fn event_scope(requester: &Requester) -> EventScope {
    match requester.role {
        Role::Admin => EventScope::All,
        Role::Organizer => EventScope::ApprovedOrOwnPending(requester.id),
        Role::Participant => EventScope::Approved,
    }
}

pub fn participant_filter(role: Role) -> ParticipantFilter {
    match role {
        Role::Participant => ParticipantFilter::ConfirmedOnly,
        Role::Organizer | Role::Admin => ParticipantFilter::All,
    }
}

pub fn ensure_visible(requester: &Requester, event: &Event) -> Result<(), CoreError> {
    if can_view(requester, event) {
        Ok(())
    } else {
        Err(CoreError::NotFound)
    }
}

/// Strangers get `NotFound`; stewards of a closed event get the lifecycle
/// conflict.
pub fn ensure_editable(requester: &Requester, event: &Event) -> CoreResult<()> {
    if access(requester, event).editable {
        return Ok(());
    }
    ensure_steward(requester, event)?;
    lifecycle::ensure_editable(event.status)
}

pub fn ensure_deletable(requester: &Requester, event: &Event) -> CoreResult<()> {
    if access(requester, event).deletable {
        return Ok(());
    }
    ensure_steward(requester, event)?;
    lifecycle::ensure_cancellable(event.status)
}

fn ensure_steward(requester: &Requester, event: &Event) -> CoreResult<()> {
    if is_steward(requester, event) {
        Ok(())
    } else {
        Err(CoreError::NotFound)
    }
}
