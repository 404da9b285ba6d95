use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::policy::{self, Requester};
use crate::domain::Role;
use crate::utils::error::AppError;

/// Set by the authenticating gateway in front of this service; trusted as-is.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Requester identity taken from the gateway headers.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Requester);

impl CurrentUser {
    pub fn requester(&self) -> &Requester {
        &self.0
    }

    pub fn require_event_creator(&self) -> Result<(), AppError> {
        if policy::can_create_events(self.0.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only organizers and admins can create events".to_string(),
            ))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header_value(parts, USER_ID_HEADER)
            .ok_or_else(|| AppError::AuthError("Missing requester identity".to_string()))?
            .parse::<Uuid>()
            .map_err(|_| AppError::AuthError("Malformed requester identity".to_string()))?;

        let role = header_value(parts, USER_ROLE_HEADER)
            .ok_or_else(|| AppError::AuthError("Missing requester role".to_string()))?
            .parse::<Role>()
            .map_err(AppError::AuthError)?;

        Ok(CurrentUser(Requester::new(id, role)))
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
