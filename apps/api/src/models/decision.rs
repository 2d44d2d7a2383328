use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "decision_state", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionState {
    None,
    Like,
    Pass,
}

/// Student -> OpportunityPost ledger row. Unique per (student, post); created
/// lazily on first interaction and updated in place afterwards. `saved` and
/// `decision` are orthogonal axes on the same row.
#[derive(Debug, Clone, FromRow)]
pub struct PostDecisionRow {
    pub id: i64,
    pub student_actor_id: i64,
    pub post_id: i64,
    pub decision: DecisionState,
    pub saved: bool,
    pub saved_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Company -> ProfileCard ledger row. Unique per (company, card).
#[derive(Debug, Clone, FromRow)]
pub struct CardDecisionRow {
    pub id: i64,
    pub company_actor_id: i64,
    pub card_id: i64,
    pub decision: DecisionState,
    pub saved: bool,
    pub saved_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
}
