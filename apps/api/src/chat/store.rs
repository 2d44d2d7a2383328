//! Conversation/message persistence. All functions run on the caller's
//! connection or transaction so reconciliation and chat writes share one
//! commit boundary.

use anyhow::anyhow;
use sqlx::PgConnection;

use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::models::chat::{MessageKind, MessageRow, ParticipantRow};

/// A conversation resolved together with its owning application. The
/// application carries the two party ids and the status, which is everything
/// access control and message annotation need.
pub struct ConversationContext {
    pub conversation_id: i64,
    pub application: ApplicationRow,
}

pub async fn load_context(
    conn: &mut PgConnection,
    conversation_id: i64,
) -> Result<Option<ConversationContext>, AppError> {
    let application_id: Option<i64> =
        sqlx::query_scalar("SELECT application_id FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some(application_id) = application_id else {
        return Ok(None);
    };

    // The 1:1 invariant is enforced by the engine; a dangling reference here
    // is a data-integrity violation, not a user error.
    let application =
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(application_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow!(
                    "conversation {conversation_id} references missing application {application_id}"
                ))
            })?;

    Ok(Some(ConversationContext {
        conversation_id,
        application,
    }))
}

/// Appends a message with the next per-conversation sequence number.
///
/// Takes the conversation row lock before reading the current maximum, so
/// every writer (user sends and status-transition SYSTEM messages alike)
/// serializes on the same lock. No other code path allocates a sequence
/// number.
pub async fn append_message(
    conn: &mut PgConnection,
    conversation_id: i64,
    kind: MessageKind,
    sender_actor_id: Option<i64>,
    text: &str,
) -> Result<MessageRow, AppError> {
    sqlx::query("SELECT id FROM conversations WHERE id = $1 FOR UPDATE")
        .bind(conversation_id)
        .execute(&mut *conn)
        .await?;

    let seq: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE conversation_id = $1",
    )
    .bind(conversation_id)
    .fetch_one(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, MessageRow>(
        "INSERT INTO messages (conversation_id, seq, kind, sender_actor_id, text)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(conversation_id)
    .bind(seq)
    .bind(kind)
    .bind(sender_actor_id)
    .bind(text)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row)
}

pub async fn list_messages(
    conn: &mut PgConnection,
    conversation_id: i64,
) -> Result<Vec<MessageRow>, AppError> {
    let rows = sqlx::query_as::<_, MessageRow>(
        "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY seq ASC",
    )
    .bind(conversation_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn latest_message_id(
    conn: &mut PgConnection,
    conversation_id: i64,
) -> Result<Option<i64>, AppError> {
    let id = sqlx::query_scalar(
        "SELECT id FROM messages WHERE conversation_id = $1 ORDER BY seq DESC LIMIT 1",
    )
    .bind(conversation_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn message_belongs(
    conn: &mut PgConnection,
    conversation_id: i64,
    message_id: i64,
) -> Result<bool, AppError> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT id FROM messages WHERE id = $1 AND conversation_id = $2")
            .bind(message_id)
            .bind(conversation_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(found.is_some())
}

/// Gets or creates the participant row. A conversation created before read
/// tracking existed gets its cursor seeded to `seed_message_id` (the current
/// latest message) so the backfill does not manufacture unread history.
pub async fn ensure_participant(
    conn: &mut PgConnection,
    conversation_id: i64,
    actor_id: i64,
    seed_message_id: Option<i64>,
) -> Result<ParticipantRow, AppError> {
    sqlx::query(
        "INSERT INTO conversation_participants (conversation_id, actor_id, last_read_message_id)
         VALUES ($1, $2, $3)
         ON CONFLICT (conversation_id, actor_id) DO NOTHING",
    )
    .bind(conversation_id)
    .bind(actor_id)
    .bind(seed_message_id)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, ParticipantRow>(
        "SELECT * FROM conversation_participants
         WHERE conversation_id = $1 AND actor_id = $2",
    )
    .bind(conversation_id)
    .bind(actor_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Sets the participant's read cursor to an explicit message id, creating the
/// participant row if it is missing.
pub async fn set_cursor(
    conn: &mut PgConnection,
    conversation_id: i64,
    actor_id: i64,
    message_id: i64,
) -> Result<ParticipantRow, AppError> {
    let row = sqlx::query_as::<_, ParticipantRow>(
        "INSERT INTO conversation_participants (conversation_id, actor_id, last_read_message_id)
         VALUES ($1, $2, $3)
         ON CONFLICT (conversation_id, actor_id)
         DO UPDATE SET last_read_message_id = EXCLUDED.last_read_message_id, updated_at = now()
         RETURNING *",
    )
    .bind(conversation_id)
    .bind(actor_id)
    .bind(message_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Unread rule: messages strictly newer than the cursor, authored by someone
/// else. SYSTEM messages (no sender) never count; a missing cursor counts
/// from the beginning. Comparison goes through the per-conversation
/// sequence, not id allocation order.
pub fn unread_total(
    messages: &[(i64, Option<i64>)],
    viewer_actor_id: i64,
    cursor_seq: Option<i64>,
) -> i64 {
    let cursor = cursor_seq.unwrap_or(0);
    messages
        .iter()
        .filter(|(seq, sender)| match sender {
            Some(s) => *s != viewer_actor_id && *seq > cursor,
            None => false,
        })
        .count() as i64
}

pub async fn unread_count(
    conn: &mut PgConnection,
    conversation_id: i64,
    viewer_actor_id: i64,
    last_read_message_id: Option<i64>,
) -> Result<i64, AppError> {
    let cursor_seq: Option<i64> = match last_read_message_id {
        Some(id) => {
            sqlx::query_scalar("SELECT seq FROM messages WHERE id = $1 AND conversation_id = $2")
                .bind(id)
                .bind(conversation_id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => None,
    };

    let messages: Vec<(i64, Option<i64>)> =
        sqlx::query_as("SELECT seq, sender_actor_id FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .fetch_all(&mut *conn)
            .await?;

    Ok(unread_total(&messages, viewer_actor_id, cursor_seq))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWER: i64 = 1;
    const OTHER: i64 = 2;

    #[test]
    fn test_missing_cursor_counts_all_foreign_messages() {
        let messages = [(1, None), (2, Some(OTHER)), (3, Some(OTHER))];
        assert_eq!(unread_total(&messages, VIEWER, None), 2);
    }

    #[test]
    fn test_system_messages_never_count() {
        let messages = [(1, None), (2, None)];
        assert_eq!(unread_total(&messages, VIEWER, None), 0);
    }

    #[test]
    fn test_own_messages_never_count() {
        let messages = [(1, Some(VIEWER)), (2, Some(VIEWER)), (3, Some(OTHER))];
        assert_eq!(unread_total(&messages, VIEWER, None), 1);
    }

    #[test]
    fn test_cursor_at_latest_yields_zero() {
        let messages = [(1, None), (2, Some(OTHER)), (3, Some(OTHER))];
        assert_eq!(unread_total(&messages, VIEWER, Some(3)), 0);
    }

    #[test]
    fn test_partial_cursor_counts_only_newer() {
        let messages = [(1, Some(OTHER)), (2, Some(OTHER)), (3, Some(VIEWER)), (4, Some(OTHER))];
        assert_eq!(unread_total(&messages, VIEWER, Some(1)), 2);
    }
}
