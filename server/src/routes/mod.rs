use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::events::{
    cancel_event, create_event, get_event, join_event, list_events, list_participants,
    update_event,
};
use crate::handlers::health_check;
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let events = Router::new()
        .route("/", post(create_event).get(list_events))
        .route(
            "/:id",
            get(get_event).put(update_event).delete(cancel_event),
        )
        .route("/:id/join", post(join_event))
        .route("/:id/participants", get(list_participants));

    Router::new()
        .route("/health", get(health_check))
        .nest("/events", events)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config))
        .layer(create_cors_layer(config))
}
