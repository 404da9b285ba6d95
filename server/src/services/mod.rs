use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::clock::Clock;
use crate::domain::{CoreError, CoreResult};
use crate::repository::{AssetDirectory, EventRepository, ParticipantRepository};

pub mod enrollment;
pub mod events;

pub use enrollment::EnrollmentService;
pub use events::EventService;

/// Handle to every collaborator the core talks to.
///
/// Built once at startup and cloned into each request; nothing in the core
/// reaches for global state.
#[derive(Clone)]
pub struct CoreContext {
    pub events: Arc<dyn EventRepository>,
    pub participants: Arc<dyn ParticipantRepository>,
    pub assets: Arc<dyn AssetDirectory>,
    pub clock: Arc<dyn Clock>,
    deadline: Duration,
}

impl CoreContext {
    pub fn new(
        events: Arc<dyn EventRepository>,
        participants: Arc<dyn ParticipantRepository>,
        assets: Arc<dyn AssetDirectory>,
        clock: Arc<dyn Clock>,
        deadline: Duration,
    ) -> Self {
        Self {
            events,
            participants,
            assets,
            clock,
            deadline,
        }
    }

    /// Runs one repository call under the configured deadline.
    ///
    /// An expired deadline drops the call's future, which rolls back any open
    /// transaction, and reports [`CoreError::Unavailable`].
    pub(crate) async fn call<T, F>(&self, operation: &'static str, call: F) -> CoreResult<T>
    where
        F: Future<Output = CoreResult<T>>,
    {
        match tokio::time::timeout(self.deadline, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, deadline = ?self.deadline, "Repository call timed out");
                Err(CoreError::Unavailable(format!(
                    "{} timed out after {}ms",
                    operation,
                    self.deadline.as_millis()
                )))
            }
        }
    }
}
