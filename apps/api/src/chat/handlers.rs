use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentActor;
use crate::chat::store;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::chat::{MessageKind, MessageRow};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: i64,
    pub kind: MessageKind,
    pub sender_actor_id: Option<i64>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub from_company: bool,
    pub is_system: bool,
}

/// `fromCompany` is derived by comparing the sender against the application's
/// party ids, not from anything stored on the message.
fn message_response(m: MessageRow, app: &ApplicationRow) -> MessageResponse {
    MessageResponse {
        from_company: m.sender_actor_id == Some(app.company_actor_id),
        is_system: m.kind == MessageKind::System,
        id: m.id,
        kind: m.kind,
        sender_actor_id: m.sender_actor_id,
        text: m.text,
        created_at: m.created_at,
    }
}

fn require_party(app: &ApplicationRow, actor: &CurrentActor) -> Result<(), AppError> {
    if app.student_actor_id == actor.id || app.company_actor_id == actor.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not a party to this conversation".to_string(),
        ))
    }
}

/// GET /conversations/:id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(conversation_id): Path<i64>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let ctx = store::load_context(&mut conn, conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;
    require_party(&ctx.application, &actor)?;

    let messages = store::list_messages(&mut conn, conversation_id).await?;
    Ok(Json(
        messages
            .into_iter()
            .map(|m| message_response(m, &ctx.application))
            .collect(),
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub text: String,
}

/// POST /conversations/:id/messages
pub async fn send_message(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(conversation_id): Path<i64>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut tx = state.db.begin().await?;

    let ctx = store::load_context(&mut tx, conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;
    require_party(&ctx.application, &actor)?;

    if ctx.application.status == ApplicationStatus::Declined {
        return Err(AppError::Conflict("Conversation declined".to_string()));
    }

    let msg = store::append_message(
        &mut tx,
        conversation_id,
        MessageKind::User,
        Some(actor.id),
        &req.text,
    )
    .await?;

    // Self-authored messages are implicitly read; a lazily backfilled
    // participant row lands directly on the new message.
    store::set_cursor(&mut tx, conversation_id, actor.id, msg.id).await?;

    tx.commit().await?;
    Ok(Json(message_response(msg, &ctx.application)))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    #[serde(default)]
    pub last_read_message_id: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub conversation_id: i64,
    pub unread_count: i64,
    pub last_read_message_id: Option<i64>,
}

/// POST /conversations/:id/read
///
/// With an explicit `lastReadMessageId` the cursor moves there (the id must
/// belong to this conversation); without one it moves to the latest message.
/// An empty conversation leaves any existing cursor untouched.
pub async fn mark_read(
    State(state): State<AppState>,
    actor: CurrentActor,
    Path(conversation_id): Path<i64>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let mut tx = state.db.begin().await?;

    let ctx = store::load_context(&mut tx, conversation_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".to_string()))?;
    require_party(&ctx.application, &actor)?;

    let target = match req.last_read_message_id {
        Some(id) => {
            if !store::message_belongs(&mut tx, conversation_id, id).await? {
                return Err(AppError::Validation(
                    "lastReadMessageId does not belong to this conversation".to_string(),
                ));
            }
            Some(id)
        }
        None => store::latest_message_id(&mut tx, conversation_id).await?,
    };

    let participant = match target {
        Some(message_id) => store::set_cursor(&mut tx, conversation_id, actor.id, message_id).await?,
        None => store::ensure_participant(&mut tx, conversation_id, actor.id, None).await?,
    };

    let unread = store::unread_count(
        &mut tx,
        conversation_id,
        actor.id,
        participant.last_read_message_id,
    )
    .await?;

    tx.commit().await?;
    Ok(Json(MarkReadResponse {
        conversation_id,
        unread_count: unread,
        last_read_message_id: participant.last_read_message_id,
    }))
}
