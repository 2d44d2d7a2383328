use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::CurrentActor;
use crate::errors::AppError;
use crate::feed::department::normalize_department;
use crate::feed::visibility::{
    self, CompanyLedgerEntry, StudentApplicationEntry, StudentLedgerEntry,
};
use crate::media::to_public_url;
use crate::models::application::ApplicationStatus;
use crate::models::decision::DecisionState;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct FeedQuery {
    pub department: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFeedItem {
    pub id: i64,
    pub company_user_id: i64,
    pub company_name: Option<String>,
    pub company_profile_image_url: Option<String>,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub department: Option<String>,
    pub image_url: Option<String>,
    pub saved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct StudentFeedRow {
    id: i64,
    company_actor_id: i64,
    title: String,
    description: String,
    location: Option<String>,
    department: Option<String>,
    image_path: Option<String>,
    created_at: DateTime<Utc>,
    company_name: Option<String>,
    company_image_path: Option<String>,
}

/// GET /feed/student
pub async fn student_feed(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PostFeedItem>>, AppError> {
    if !actor.is_student() {
        return Err(AppError::Forbidden(
            "Only students have this feed".to_string(),
        ));
    }

    let department = normalize_department(query.department.as_deref());
    debug!(?department, "student feed filter");

    let ledger: Vec<(i64, DecisionState, bool)> = sqlx::query_as(
        "SELECT post_id, decision, saved FROM post_decisions WHERE student_actor_id = $1",
    )
    .bind(actor.id)
    .fetch_all(&state.db)
    .await?;

    let applications: Vec<(i64, ApplicationStatus)> =
        sqlx::query_as("SELECT post_id, status FROM applications WHERE student_actor_id = $1")
            .bind(actor.id)
            .fetch_all(&state.db)
            .await?;

    let ledger_entries: Vec<StudentLedgerEntry> = ledger
        .iter()
        .map(|&(post_id, decision, _)| StudentLedgerEntry { post_id, decision })
        .collect();
    let app_entries: Vec<StudentApplicationEntry> = applications
        .iter()
        .map(|&(post_id, status)| StudentApplicationEntry { post_id, status })
        .collect();
    let excluded: Vec<i64> = visibility::excluded_post_ids(&ledger_entries, &app_entries)
        .into_iter()
        .collect();

    let saved_posts: HashMap<i64, bool> = ledger
        .into_iter()
        .map(|(post_id, _, saved)| (post_id, saved))
        .collect();

    let mut sql = String::from(
        "SELECT p.id, p.company_actor_id, p.title, p.description, p.location, p.department,
                p.image_path, p.created_at, cp.company_name,
                a.profile_image_path AS company_image_path
         FROM opportunity_posts p
         JOIN actors a ON a.id = p.company_actor_id
         LEFT JOIN company_profiles cp ON cp.actor_id = p.company_actor_id
         WHERE p.is_active AND p.id <> ALL($1)",
    );
    if department.is_some() {
        sql.push_str(" AND lower(trim(p.department)) = $2");
    }
    sql.push_str(" ORDER BY p.created_at DESC LIMIT 50");

    let mut query = sqlx::query_as::<_, StudentFeedRow>(&sql).bind(&excluded);
    if let Some(dept) = &department {
        query = query.bind(dept);
    }
    let rows = query.fetch_all(&state.db).await?;

    let base = &state.config.media_base_url;
    Ok(Json(
        rows.into_iter()
            .map(|r| PostFeedItem {
                saved: saved_posts.get(&r.id).copied().unwrap_or(false),
                company_profile_image_url: to_public_url(base, r.company_image_path.as_deref()),
                image_url: to_public_url(base, r.image_path.as_deref()),
                id: r.id,
                company_user_id: r.company_actor_id,
                company_name: r.company_name,
                title: r.title,
                description: r.description,
                location: r.location,
                department: r.department,
                created_at: r.created_at,
            })
            .collect(),
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFeedItem {
    pub id: i64,
    pub student_user_id: i64,
    pub student_username: String,
    pub student_name: Option<String>,
    pub student_surname: Option<String>,
    pub student_profile_image_url: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub description: String,
    pub location: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CompanyFeedRow {
    id: i64,
    student_actor_id: i64,
    title: Option<String>,
    description: String,
    location: Option<String>,
    image_path: Option<String>,
    created_at: DateTime<Utc>,
    username: String,
    name: Option<String>,
    surname: Option<String>,
    student_image_path: Option<String>,
    university: Option<String>,
    student_department: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CardLedgerRow {
    card_id: i64,
    decision: DecisionState,
    decided_at: Option<DateTime<Utc>>,
    card_fresh_at: DateTime<Utc>,
    student_engaged: bool,
}

/// GET /feed/company
pub async fn company_feed(
    State(state): State<AppState>,
    actor: CurrentActor,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<CardFeedItem>>, AppError> {
    if !actor.is_company() {
        return Err(AppError::Forbidden(
            "Only companies have this feed".to_string(),
        ));
    }

    let department = normalize_department(query.department.as_deref());
    debug!(?department, "company feed filter");

    let ledger: Vec<CardLedgerRow> = sqlx::query_as(
        r#"
        SELECT cd.card_id, cd.decision, cd.decided_at,
               COALESCE(pc.updated_at, pc.created_at) AS card_fresh_at,
               EXISTS (
                   SELECT 1 FROM post_decisions pd
                   WHERE pd.student_actor_id = pc.student_actor_id
                     AND pd.decision <> 'NONE'
               ) AS student_engaged
        FROM card_decisions cd
        JOIN profile_cards pc ON pc.id = cd.card_id
        WHERE cd.company_actor_id = $1 AND cd.decision <> 'NONE'
        "#,
    )
    .bind(actor.id)
    .fetch_all(&state.db)
    .await?;

    let entries: Vec<CompanyLedgerEntry> = ledger
        .iter()
        .map(|r| CompanyLedgerEntry {
            card_id: r.card_id,
            decision: r.decision,
            decided_at: r.decided_at,
            card_fresh_at: r.card_fresh_at,
            student_engaged: r.student_engaged,
        })
        .collect();
    let excluded: Vec<i64> = visibility::excluded_card_ids(&entries).into_iter().collect();

    let mut sql = String::from(
        "SELECT pc.id, pc.student_actor_id, pc.title, pc.description, pc.location,
                pc.image_path, pc.created_at, a.username, a.name, a.surname,
                a.profile_image_path AS student_image_path,
                sp.university, sp.department AS student_department
         FROM profile_cards pc
         JOIN actors a ON a.id = pc.student_actor_id
         LEFT JOIN student_profiles sp ON sp.actor_id = pc.student_actor_id
         WHERE pc.is_active AND pc.id <> ALL($1)",
    );
    if department.is_some() {
        sql.push_str(" AND lower(trim(sp.department)) = $2");
    }
    sql.push_str(" ORDER BY pc.created_at DESC LIMIT 50");

    let mut query = sqlx::query_as::<_, CompanyFeedRow>(&sql).bind(&excluded);
    if let Some(dept) = &department {
        query = query.bind(dept);
    }
    let rows = query.fetch_all(&state.db).await?;

    let base = &state.config.media_base_url;
    Ok(Json(
        rows.into_iter()
            .map(|r| CardFeedItem {
                student_profile_image_url: to_public_url(base, r.student_image_path.as_deref()),
                image_url: to_public_url(base, r.image_path.as_deref()),
                id: r.id,
                student_user_id: r.student_actor_id,
                student_username: r.username,
                student_name: r.name,
                student_surname: r.surname,
                university: r.university,
                department: r.student_department,
                title: r.title,
                description: r.description,
                location: r.location,
                created_at: r.created_at,
            })
            .collect(),
    ))
}
