//! Experience posts: student-authored entries on the student's own profile
//! page. Visible to either role, managed only by the owning student, and
//! never part of feed visibility.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentActor;
use crate::errors::AppError;
use crate::media::to_public_url;
use crate::models::post::ExperiencePostRow;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperiencePostResponse {
    pub id: i64,
    pub student_user_id: i64,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn experience_response(post: ExperiencePostRow, media_base: &str) -> ExperiencePostResponse {
    ExperiencePostResponse {
        image_url: to_public_url(media_base, post.image_path.as_deref()),
        id: post.id,
        student_user_id: post.student_actor_id,
        title: post.title,
        description: post.description,
        category: post.category,
        created_at: post.created_at,
    }
}

fn require_student(actor: &CurrentActor) -> Result<(), AppError> {
    if actor.is_student() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only students can manage profile posts".to_string(),
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperiencePostCreateRequest {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
}

/// POST /profile-posts
pub async fn create_experience_post(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(req): Json<ExperiencePostCreateRequest>,
) -> Result<Json<ExperiencePostResponse>, AppError> {
    require_student(&actor)?;

    let post: ExperiencePostRow = sqlx::query_as(
        "INSERT INTO experience_posts (student_actor_id, title, description, category)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(actor.id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.category)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(experience_response(post, &state.config.media_base_url)))
}

/// GET /profile-posts/me
pub async fn list_my_experience_posts(
    State(state): State<AppState>,
    actor: CurrentActor,
) -> Result<Json<Vec<ExperiencePostResponse>>, AppError> {
    require_student(&actor)?;
    list_experience_posts(State(state), actor, Path(actor.id)).await
}

/// GET /profile-posts/:student_user_id
pub async fn list_experience_posts(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Path(student_user_id): Path<i64>,
) -> Result<Json<Vec<ExperiencePostResponse>>, AppError> {
    let posts: Vec<ExperiencePostRow> = sqlx::query_as(
        "SELECT * FROM experience_posts
         WHERE student_actor_id = $1 AND is_active
         ORDER BY created_at DESC",
    )
    .bind(student_user_id)
    .fetch_all(&state.db)
    .await?;

    let base = &state.config.media_base_url;
    Ok(Json(
        posts
            .into_iter()
            .map(|p| experience_response(p, base))
            .collect(),
    ))
}

/// DELETE /profile-posts/:post_id
pub async fn delete_experience_post(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_student(&actor)?;

    let post: Option<ExperiencePostRow> =
        sqlx::query_as("SELECT * FROM experience_posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&state.db)
            .await?;
    let post = post
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound("Profile post not found".to_string()))?;

    if post.student_actor_id != actor.id {
        return Err(AppError::Forbidden("Not allowed".to_string()));
    }

    sqlx::query("UPDATE experience_posts SET is_active = FALSE WHERE id = $1")
        .bind(post_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
