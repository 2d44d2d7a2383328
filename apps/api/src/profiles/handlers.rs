use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentActor;
use crate::errors::AppError;
use crate::media::to_public_url;
use crate::models::actor::{ActorRole, ActorRow, StudentProfileRow};
use crate::profiles::cards;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfileResponse {
    pub user_id: i64,
    pub username: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub profile_image_url: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub studies: Option<String>,
    pub experience: Option<String>,
}

async fn load_student(
    db: &sqlx::PgPool,
    student_actor_id: i64,
) -> Result<(ActorRow, Option<StudentProfileRow>), AppError> {
    let actor: Option<ActorRow> =
        sqlx::query_as("SELECT * FROM actors WHERE id = $1 AND role = 'STUDENT'")
            .bind(student_actor_id)
            .fetch_optional(db)
            .await?;
    let actor = actor.ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    let profile: Option<StudentProfileRow> =
        sqlx::query_as("SELECT * FROM student_profiles WHERE actor_id = $1")
            .bind(student_actor_id)
            .fetch_optional(db)
            .await?;
    Ok((actor, profile))
}

fn student_response(
    actor: ActorRow,
    profile: Option<StudentProfileRow>,
    media_base: &str,
) -> StudentProfileResponse {
    StudentProfileResponse {
        profile_image_url: to_public_url(media_base, actor.profile_image_path.as_deref()),
        user_id: actor.id,
        username: actor.username,
        name: actor.name,
        surname: actor.surname,
        university: profile.as_ref().and_then(|p| p.university.clone()),
        department: profile.as_ref().and_then(|p| p.department.clone()),
        bio: profile.as_ref().and_then(|p| p.bio.clone()),
        skills: profile.as_ref().and_then(|p| p.skills.clone()),
        studies: profile.as_ref().and_then(|p| p.studies.clone()),
        experience: profile.and_then(|p| p.experience),
    }
}

/// GET /profiles/students/:student_user_id
pub async fn get_student_profile(
    State(state): State<AppState>,
    _actor: CurrentActor,
    Path(student_user_id): Path<i64>,
) -> Result<Json<StudentProfileResponse>, AppError> {
    let (actor, profile) = load_student(&state.db, student_user_id).await?;
    Ok(Json(student_response(
        actor,
        profile,
        &state.config.media_base_url,
    )))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub company_name: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub studies: Option<String>,
    pub experience: Option<String>,
}

/// PUT /profiles/me
///
/// Updates the caller's profile. For students the profile card is regenerated
/// in the same transaction so feed text and profile never diverge.
pub async fn update_my_profile(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut tx = state.db.begin().await?;

    sqlx::query("UPDATE actors SET name = $1, surname = $2 WHERE id = $3")
        .bind(&req.name)
        .bind(&req.surname)
        .bind(actor.id)
        .execute(&mut *tx)
        .await?;

    match actor.role {
        ActorRole::Student => {
            sqlx::query(
                "INSERT INTO student_profiles
                     (actor_id, university, department, bio, skills, studies, experience)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (actor_id) DO UPDATE
                     SET university = EXCLUDED.university,
                         department = EXCLUDED.department,
                         bio = EXCLUDED.bio,
                         skills = EXCLUDED.skills,
                         studies = EXCLUDED.studies,
                         experience = EXCLUDED.experience",
            )
            .bind(actor.id)
            .bind(&req.university)
            .bind(&req.department)
            .bind(&req.bio)
            .bind(&req.skills)
            .bind(&req.studies)
            .bind(&req.experience)
            .execute(&mut *tx)
            .await?;

            cards::refresh_profile_card(&mut tx, actor.id).await?;
        }
        ActorRole::Company => {
            sqlx::query(
                "INSERT INTO company_profiles (actor_id, company_name)
                 VALUES ($1, $2)
                 ON CONFLICT (actor_id) DO UPDATE
                     SET company_name = EXCLUDED.company_name",
            )
            .bind(actor.id)
            .bind(&req.company_name)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    info!(actor_id = actor.id, "profile updated");
    Ok(Json(serde_json::json!({ "ok": true })))
}
