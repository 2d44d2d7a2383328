use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_kind", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    System,
    User,
}

#[derive(Debug, Clone, FromRow)]
pub struct ConversationRow {
    pub id: i64,
    pub application_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Append-only message log. `seq` is monotonic per conversation and is the
/// ordering/unread contract; SYSTEM messages carry no sender.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub conversation_id: i64,
    pub seq: i64,
    pub kind: MessageKind,
    pub sender_actor_id: Option<i64>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Per-participant read cursor. Lazily backfilled for conversations that
/// predate read tracking.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantRow {
    pub id: i64,
    pub conversation_id: i64,
    pub actor_id: i64,
    pub last_read_message_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}
