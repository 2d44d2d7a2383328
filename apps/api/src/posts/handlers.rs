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
use crate::models::post::OpportunityPostRow;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub company_user_id: i64,
    pub company_name: Option<String>,
    pub company_profile_image_url: Option<String>,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub department: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

async fn company_display(
    db: &sqlx::PgPool,
    company_actor_id: i64,
) -> Result<(Option<String>, Option<String>), AppError> {
    let row: Option<(Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT cp.company_name, a.profile_image_path
         FROM actors a
         LEFT JOIN company_profiles cp ON cp.actor_id = a.id
         WHERE a.id = $1",
    )
    .bind(company_actor_id)
    .fetch_optional(db)
    .await?;
    Ok(row.unwrap_or((None, None)))
}

fn post_response(
    post: OpportunityPostRow,
    company_name: Option<String>,
    company_image_path: Option<&str>,
    media_base: &str,
) -> PostResponse {
    PostResponse {
        company_profile_image_url: to_public_url(media_base, company_image_path),
        image_url: to_public_url(media_base, post.image_path.as_deref()),
        id: post.id,
        company_user_id: post.company_actor_id,
        company_name,
        title: post.title,
        description: post.description,
        location: post.location,
        department: post.department,
        created_at: post.created_at,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCreateRequest {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub department: Option<String>,
}

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(req): Json<PostCreateRequest>,
) -> Result<Json<PostResponse>, AppError> {
    if !actor.is_company() {
        return Err(AppError::Forbidden(
            "Only companies can create posts".to_string(),
        ));
    }

    let post: OpportunityPostRow = sqlx::query_as(
        "INSERT INTO opportunity_posts (company_actor_id, title, description, location, department)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(actor.id)
    .bind(&req.title)
    .bind(&req.description)
    .bind(&req.location)
    .bind(&req.department)
    .fetch_one(&state.db)
    .await?;

    let (company_name, image_path) = company_display(&state.db, actor.id).await?;
    Ok(Json(post_response(
        post,
        company_name,
        image_path.as_deref(),
        &state.config.media_base_url,
    )))
}

/// GET /posts/me
pub async fn list_my_posts(
    State(state): State<AppState>,
    actor: CurrentActor,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    if !actor.is_company() {
        return Err(AppError::Forbidden(
            "Only companies can view their posts".to_string(),
        ));
    }
    list_company_posts(State(state), actor, Path(actor.id)).await
}

/// GET /posts/company/:company_user_id
pub async fn list_company_posts(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Path(company_user_id): Path<i64>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let posts: Vec<OpportunityPostRow> = sqlx::query_as(
        "SELECT * FROM opportunity_posts
         WHERE company_actor_id = $1 AND is_active
         ORDER BY created_at DESC",
    )
    .bind(company_user_id)
    .fetch_all(&state.db)
    .await?;

    let (company_name, image_path) = company_display(&state.db, company_user_id).await?;
    let base = &state.config.media_base_url;
    Ok(Json(
        posts
            .into_iter()
            .map(|p| post_response(p, company_name.clone(), image_path.as_deref(), base))
            .collect(),
    ))
}

/// DELETE /posts/:post_id
///
/// Soft delete: decisions and applications keep their target, the post just
/// stops appearing in feeds and rejects new decisions.
pub async fn delete_post(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(post_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !actor.is_company() {
        return Err(AppError::Forbidden(
            "Only companies can delete posts".to_string(),
        ));
    }

    let post: Option<OpportunityPostRow> =
        sqlx::query_as("SELECT * FROM opportunity_posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&state.db)
            .await?;
    let post = post
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    if post.company_actor_id != actor.id {
        return Err(AppError::Forbidden("Not allowed".to_string()));
    }

    sqlx::query("UPDATE opportunity_posts SET is_active = FALSE WHERE id = $1")
        .bind(post_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
