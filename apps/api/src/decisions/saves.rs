//! Save/unsave endpoints. Saving shares the ledger row with decisions but is
//! an independent axis: it never triggers reconciliation.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::CurrentActor;
use crate::decisions::ledger;
use crate::errors::AppError;
use crate::models::actor::{ActorRole, ActorRow};
use crate::profiles::cards;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSaveRequest {
    pub post_id: i64,
    pub saved: bool,
}

/// POST /saves/student/post
pub async fn set_saved_post(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(req): Json<StudentSaveRequest>,
) -> Result<Json<Value>, AppError> {
    if !actor.is_student() {
        return Err(AppError::Forbidden(
            "Only students can save posts".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM opportunity_posts WHERE id = $1")
        .bind(req.post_id)
        .fetch_optional(&mut *tx)
        .await?;
    let post_id = exists.ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    ledger::set_post_saved(&mut tx, actor.id, post_id, req.saved).await?;

    tx.commit().await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPostItem {
    pub post_id: i64,
    pub company_user_id: i64,
    pub company_name: Option<String>,
    pub title: String,
    pub location: Option<String>,
    pub department: Option<String>,
    pub description: String,
    pub saved_at: Option<DateTime<Utc>>,
}

/// GET /saves/student/posts
pub async fn list_saved_posts(
    State(state): State<AppState>,
    actor: CurrentActor,
) -> Result<Json<Vec<SavedPostItem>>, AppError> {
    if !actor.is_student() {
        return Err(AppError::Forbidden(
            "Only students can view saved posts".to_string(),
        ));
    }

    let rows: Vec<SavedPostRow> = sqlx::query_as(
        r#"
        SELECT p.id AS post_id, p.company_actor_id, cp.company_name,
               p.title, p.location, p.department, p.description, pd.saved_at
        FROM post_decisions pd
        JOIN opportunity_posts p ON p.id = pd.post_id
        LEFT JOIN company_profiles cp ON cp.actor_id = p.company_actor_id
        WHERE pd.student_actor_id = $1 AND pd.saved
        ORDER BY pd.saved_at DESC NULLS LAST
        "#,
    )
    .bind(actor.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|r| SavedPostItem {
                post_id: r.post_id,
                company_user_id: r.company_actor_id,
                company_name: r.company_name,
                title: r.title,
                location: r.location,
                department: r.department,
                description: r.description,
                saved_at: r.saved_at,
            })
            .collect(),
    ))
}

#[derive(sqlx::FromRow)]
struct SavedPostRow {
    post_id: i64,
    company_actor_id: i64,
    company_name: Option<String>,
    title: String,
    location: Option<String>,
    department: Option<String>,
    description: String,
    saved_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySaveRequest {
    #[serde(default)]
    pub student_user_id: Option<i64>,
    #[serde(default)]
    pub student_post_id: Option<i64>,
    pub saved: bool,
}

/// POST /saves/company/student-post
///
/// Accepts either the card id or the student id; the latter resolves the
/// student's card, creating it from profile fields if it does not exist yet.
pub async fn set_saved_card(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(req): Json<CompanySaveRequest>,
) -> Result<Json<Value>, AppError> {
    if !actor.is_company() {
        return Err(AppError::Forbidden(
            "Only companies can save students".to_string(),
        ));
    }

    let mut tx = state.db.begin().await?;

    let card_id = if let Some(card_id) = req.student_post_id {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM profile_cards WHERE id = $1")
            .bind(card_id)
            .fetch_optional(&mut *tx)
            .await?;
        found.ok_or_else(|| AppError::NotFound("Student card not found".to_string()))?
    } else if let Some(student_id) = req.student_user_id {
        let student: Option<ActorRow> = sqlx::query_as("SELECT * FROM actors WHERE id = $1")
            .bind(student_id)
            .fetch_optional(&mut *tx)
            .await?;
        let student = student
            .filter(|a| a.role == ActorRole::Student)
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;
        cards::ensure_profile_card(&mut tx, student.id).await?.id
    } else {
        return Err(AppError::Validation(
            "Provide studentUserId or studentPostId".to_string(),
        ));
    };

    ledger::set_card_saved(&mut tx, actor.id, card_id, req.saved).await?;

    tx.commit().await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCardItem {
    pub student_post_id: i64,
    pub student_user_id: i64,
    pub student_username: String,
    pub student_name: Option<String>,
    pub student_surname: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub description: String,
    pub skills: Option<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

/// GET /saves/company/student-posts
pub async fn list_saved_cards(
    State(state): State<AppState>,
    actor: CurrentActor,
) -> Result<Json<Vec<SavedCardItem>>, AppError> {
    if !actor.is_company() {
        return Err(AppError::Forbidden(
            "Only companies can view saved students".to_string(),
        ));
    }

    let rows: Vec<SavedCardRow> = sqlx::query_as(
        r#"
        SELECT pc.id AS card_id, a.id AS student_id, a.username, a.name, a.surname,
               sp.university, sp.department, COALESCE(sp.bio, '') AS description,
               sp.skills, cd.saved_at
        FROM card_decisions cd
        JOIN profile_cards pc ON pc.id = cd.card_id
        JOIN actors a ON a.id = pc.student_actor_id
        LEFT JOIN student_profiles sp ON sp.actor_id = a.id
        WHERE cd.company_actor_id = $1 AND cd.saved
        ORDER BY cd.saved_at DESC NULLS LAST
        "#,
    )
    .bind(actor.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(
        rows.into_iter()
            .map(|r| SavedCardItem {
                student_post_id: r.card_id,
                student_user_id: r.student_id,
                student_username: r.username,
                student_name: r.name,
                student_surname: r.surname,
                university: r.university,
                department: r.department,
                description: r.description,
                skills: r.skills,
                saved_at: r.saved_at,
            })
            .collect(),
    ))
}

#[derive(sqlx::FromRow)]
struct SavedCardRow {
    card_id: i64,
    student_id: i64,
    username: String,
    name: Option<String>,
    surname: Option<String>,
    university: Option<String>,
    department: Option<String>,
    description: String,
    skills: Option<String>,
    saved_at: Option<DateTime<Utc>>,
}
