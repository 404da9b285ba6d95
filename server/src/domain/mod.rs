pub mod clock;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod participant;
pub mod policy;
pub mod role;

pub use error::{ConflictKind, CoreError, CoreResult};
pub use event::{Event, EventDetail, EventStatus};
pub use participant::{Participant, ParticipantStatus};
pub use policy::Requester;
pub use role::Role;
