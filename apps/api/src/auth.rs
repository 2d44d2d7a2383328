use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::models::actor::ActorRole;
use crate::state::AppState;

/// The resolved caller identity: `{id, role}`.
///
/// Session issuance and token validation live in the auth service; by the time
/// a request reaches this API the caller is identified by the `X-Actor-Id`
/// header, which we resolve against the actors table.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor {
    pub id: i64,
    pub role: ActorRole,
}

impl CurrentActor {
    pub fn is_student(&self) -> bool {
        self.role == ActorRole::Student
    }

    pub fn is_company(&self) -> bool {
        self.role == ActorRole::Company
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id: i64 = parts
            .headers
            .get("x-actor-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or(AppError::Unauthorized)?;

        let row: Option<(i64, ActorRole)> =
            sqlx::query_as("SELECT id, role FROM actors WHERE id = $1")
                .bind(id)
                .fetch_optional(&state.db)
                .await?;

        let (id, role) = row.ok_or(AppError::Unauthorized)?;
        Ok(CurrentActor { id, role })
    }
}
