use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::identity::CurrentUser;
use crate::domain::event::{CreateEventInput, UpdateEventInput};
use crate::domain::participant::JoinEventInput;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::pagination::PageQuery;
use crate::utils::response::{created, paginated, success};

pub async fn create_event(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateEventInput>,
) -> Result<Response, AppError> {
    user.require_event_creator()?;
    let event = state.events.create(user.requester(), input).await?;
    Ok(created(event, "Event created"))
}

pub async fn list_events(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Response, AppError> {
    let window = query.window();
    let (events, total) = state
        .events
        .list(user.requester(), window.skip, window.limit)
        .await?;
    Ok(paginated(events, total, window))
}

pub async fn get_event(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let event = state.events.get(user.requester(), event_id).await?;
    Ok(success(event, "Event found"))
}

pub async fn update_event(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateEventInput>,
) -> Result<Response, AppError> {
    let event = state.events.update(user.requester(), event_id, input).await?;
    Ok(success(event, "Event updated"))
}

pub async fn cancel_event(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let event = state.events.cancel(user.requester(), event_id).await?;
    Ok(success(event, "Event cancelled"))
}

pub async fn join_event(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<JoinEventInput>,
) -> Result<Response, AppError> {
    let participant = state
        .enrollment
        .join(user.requester(), event_id, input.car_id)
        .await?;
    Ok(created(participant, "Enrollment requested"))
}

pub async fn list_participants(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Response, AppError> {
    let window = query.window();
    let (participants, total) = state
        .enrollment
        .list_participants(user.requester(), event_id, window.skip, window.limit)
        .await?;
    Ok(paginated(participants, total, window))
}
