use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::CurrentActor;
use crate::chat::store;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::chat::MessageKind;
use crate::reconcile::engine;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListItem {
    pub application_id: i64,
    pub status: ApplicationStatus,
    pub conversation_id: i64,
    pub post_id: i64,
    pub post_title: String,
    pub other_party_name: String,
    pub last_message: Option<String>,
    pub unread_count: i64,
    pub last_message_id: Option<i64>,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// GET /applications
///
/// The caller's applications, newest-updated first, each with its
/// conversation, last-message preview and the caller's unread count.
pub async fn list_applications(
    State(state): State<AppState>,
    actor: CurrentActor,
) -> Result<Json<Vec<ApplicationListItem>>, AppError> {
    let mut conn = state.db.acquire().await?;

    let sql = if actor.is_student() {
        "SELECT * FROM applications WHERE student_actor_id = $1 ORDER BY updated_at DESC LIMIT 50"
    } else {
        "SELECT * FROM applications WHERE company_actor_id = $1 ORDER BY updated_at DESC LIMIT 50"
    };
    let apps: Vec<ApplicationRow> = sqlx::query_as(sql).bind(actor.id).fetch_all(&mut *conn).await?;

    let mut out = Vec::with_capacity(apps.len());
    for app in apps {
        let conversation_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM conversations WHERE application_id = $1")
                .bind(app.id)
                .fetch_optional(&mut *conn)
                .await?;
        let conversation_id = conversation_id.ok_or_else(|| {
            AppError::Internal(anyhow!("application {} has no conversation", app.id))
        })?;

        let post_title: Option<String> =
            sqlx::query_scalar("SELECT title FROM opportunity_posts WHERE id = $1")
                .bind(app.post_id)
                .fetch_optional(&mut *conn)
                .await?;

        let other_party_name: String = if actor.is_student() {
            sqlx::query_scalar(
                "SELECT COALESCE(cp.company_name, a.username)
                 FROM actors a
                 LEFT JOIN company_profiles cp ON cp.actor_id = a.id
                 WHERE a.id = $1",
            )
            .bind(app.company_actor_id)
            .fetch_optional(&mut *conn)
            .await?
            .unwrap_or_else(|| "Company".to_string())
        } else {
            sqlx::query_scalar("SELECT username FROM actors WHERE id = $1")
                .bind(app.student_actor_id)
                .fetch_optional(&mut *conn)
                .await?
                .unwrap_or_else(|| "Student".to_string())
        };

        let last_message: Option<(i64, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, text, created_at FROM messages
             WHERE conversation_id = $1 ORDER BY seq DESC LIMIT 1",
        )
        .bind(conversation_id)
        .fetch_optional(&mut *conn)
        .await?;

        // Backfill seeds the cursor to the current latest message so a
        // conversation that predates read tracking does not open with a
        // flood of unread history.
        let participant = store::ensure_participant(
            &mut conn,
            conversation_id,
            actor.id,
            last_message.as_ref().map(|(id, _, _)| *id),
        )
        .await?;
        let unread_count = store::unread_count(
            &mut conn,
            conversation_id,
            actor.id,
            participant.last_read_message_id,
        )
        .await?;

        out.push(ApplicationListItem {
            application_id: app.id,
            status: app.status,
            conversation_id,
            post_id: app.post_id,
            post_title: post_title.unwrap_or_else(|| "Internship".to_string()),
            other_party_name,
            last_message: last_message.as_ref().map(|(_, text, _)| text.clone()),
            unread_count,
            last_message_id: last_message.as_ref().map(|(id, _, _)| *id),
            last_message_at: last_message.as_ref().map(|(_, _, at)| *at),
        });
    }

    Ok(Json(out))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub status: String,
}

/// POST /applications/:id/status
///
/// Owning company settles the application. Accepts the internal vocabulary or
/// the LIKE/PASS shorthand some clients still send.
pub async fn set_status(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(application_id): Path<i64>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let new_status = match req.status.trim().to_ascii_uppercase().as_str() {
        "ACCEPTED" | "LIKE" => ApplicationStatus::Accepted,
        "DECLINED" | "PASS" => ApplicationStatus::Declined,
        other => {
            return Err(AppError::Validation(format!(
                "Unsupported status '{other}'"
            )))
        }
    };

    let mut tx = state.db.begin().await?;

    let app: Option<ApplicationRow> =
        sqlx::query_as("SELECT * FROM applications WHERE id = $1 FOR UPDATE")
            .bind(application_id)
            .fetch_optional(&mut *tx)
            .await?;
    let app = app.ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    if !actor.is_company() || app.company_actor_id != actor.id {
        return Err(AppError::Forbidden(
            "Only the owning company can update status".to_string(),
        ));
    }

    if app.status == new_status {
        return Ok(Json(json!({ "ok": true })));
    }

    sqlx::query("UPDATE applications SET status = $1, updated_at = now() WHERE id = $2")
        .bind(new_status)
        .bind(application_id)
        .execute(&mut *tx)
        .await?;

    let conversation_id: Option<i64> =
        sqlx::query_scalar("SELECT id FROM conversations WHERE application_id = $1")
            .bind(application_id)
            .fetch_optional(&mut *tx)
            .await?;
    let conversation_id = conversation_id.ok_or_else(|| {
        AppError::Internal(anyhow!("application {application_id} has no conversation"))
    })?;

    store::append_message(
        &mut tx,
        conversation_id,
        MessageKind::System,
        None,
        engine::system_text(new_status),
    )
    .await?;

    tx.commit().await?;
    info!(application_id, ?new_status, "application status set by company");
    Ok(Json(json!({ "ok": true })))
}
