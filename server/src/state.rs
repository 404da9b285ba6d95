use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::domain::clock::SystemClock;
use crate::repository::memory::MemoryStore;
use crate::repository::postgres::{
    AssetDirectoryImpl, EventRepositoryImpl, ParticipantRepositoryImpl,
};
use crate::services::{CoreContext, EnrollmentService, EventService};

#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub enrollment: EnrollmentService,
}

impl AppState {
    pub fn new(ctx: CoreContext) -> Self {
        Self {
            events: EventService::new(ctx.clone()),
            enrollment: EnrollmentService::new(ctx),
        }
    }

    pub fn postgres(pool: PgPool, config: &Config) -> Self {
        Self::new(CoreContext::new(
            Arc::new(EventRepositoryImpl::new(pool.clone())),
            Arc::new(ParticipantRepositoryImpl::new(pool.clone())),
            Arc::new(AssetDirectoryImpl::new(pool)),
            Arc::new(SystemClock),
            config.repository_timeout(),
        ))
    }

    pub fn in_memory(store: MemoryStore, config: &Config) -> Self {
        let store = Arc::new(store);
        Self::new(CoreContext::new(
            store.clone(),
            store.clone(),
            store,
            Arc::new(SystemClock),
            config.repository_timeout(),
        ))
    }
}
