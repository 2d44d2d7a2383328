//! Decision Ledger: one row per (actor, target), created lazily on first
//! interaction and overwritten in place afterwards — never duplicated.
//! Uniqueness is enforced by the storage constraint, not check-then-insert.

use sqlx::PgConnection;

use crate::models::decision::{CardDecisionRow, DecisionState, PostDecisionRow};

pub async fn upsert_post_decision(
    conn: &mut PgConnection,
    student_id: i64,
    post_id: i64,
    decision: DecisionState,
) -> Result<PostDecisionRow, sqlx::Error> {
    sqlx::query_as::<_, PostDecisionRow>(
        r#"
        INSERT INTO post_decisions (student_actor_id, post_id, decision, decided_at)
        VALUES ($1, $2, $3, now())
        ON CONFLICT (student_actor_id, post_id)
        DO UPDATE SET decision = EXCLUDED.decision, decided_at = EXCLUDED.decided_at
        RETURNING *
        "#,
    )
    .bind(student_id)
    .bind(post_id)
    .bind(decision)
    .fetch_one(conn)
    .await
}

pub async fn upsert_card_decision(
    conn: &mut PgConnection,
    company_id: i64,
    card_id: i64,
    decision: DecisionState,
) -> Result<CardDecisionRow, sqlx::Error> {
    sqlx::query_as::<_, CardDecisionRow>(
        r#"
        INSERT INTO card_decisions (company_actor_id, card_id, decision, decided_at)
        VALUES ($1, $2, $3, now())
        ON CONFLICT (company_actor_id, card_id)
        DO UPDATE SET decision = EXCLUDED.decision, decided_at = EXCLUDED.decided_at
        RETURNING *
        "#,
    )
    .bind(company_id)
    .bind(card_id)
    .bind(decision)
    .fetch_one(conn)
    .await
}

/// Save and decision are orthogonal axes on the same ledger row; toggling the
/// save flag leaves `decision`/`decided_at` untouched.
pub async fn set_post_saved(
    conn: &mut PgConnection,
    student_id: i64,
    post_id: i64,
    saved: bool,
) -> Result<PostDecisionRow, sqlx::Error> {
    sqlx::query_as::<_, PostDecisionRow>(
        r#"
        INSERT INTO post_decisions (student_actor_id, post_id, saved, saved_at)
        VALUES ($1, $2, $3, CASE WHEN $3 THEN now() END)
        ON CONFLICT (student_actor_id, post_id)
        DO UPDATE SET saved = EXCLUDED.saved, saved_at = EXCLUDED.saved_at
        RETURNING *
        "#,
    )
    .bind(student_id)
    .bind(post_id)
    .bind(saved)
    .fetch_one(conn)
    .await
}

pub async fn set_card_saved(
    conn: &mut PgConnection,
    company_id: i64,
    card_id: i64,
    saved: bool,
) -> Result<CardDecisionRow, sqlx::Error> {
    sqlx::query_as::<_, CardDecisionRow>(
        r#"
        INSERT INTO card_decisions (company_actor_id, card_id, saved, saved_at)
        VALUES ($1, $2, $3, CASE WHEN $3 THEN now() END)
        ON CONFLICT (company_actor_id, card_id)
        DO UPDATE SET saved = EXCLUDED.saved, saved_at = EXCLUDED.saved_at
        RETURNING *
        "#,
    )
    .bind(company_id)
    .bind(card_id)
    .bind(saved)
    .fetch_one(conn)
    .await
}
