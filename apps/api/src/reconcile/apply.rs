//! Transactional side of reconciliation. Each function runs on the caller's
//! open transaction: the ledger upsert, the snapshot reads, and every effect
//! commit together, so a concurrent reader never observes an application
//! without its conversation.
//!
//! Concurrent decisions on the same pair serialize on the application row
//! (`FOR UPDATE`); creation races converge through the
//! (post_id, student_actor_id) unique constraint.

use anyhow::anyhow;
use sqlx::PgConnection;
use tracing::info;

use crate::chat::store;
use crate::errors::AppError;
use crate::models::application::ApplicationStatus;
use crate::models::chat::MessageKind;
use crate::models::decision::DecisionState;
use crate::reconcile::engine::{self, ApplicationSnapshot, Effect};

/// Runs the reconciliation rules after a student decision on a post.
pub async fn reconcile_student_decision(
    conn: &mut PgConnection,
    student_id: i64,
    post_id: i64,
    company_id: i64,
    decision: DecisionState,
) -> Result<(), AppError> {
    let company_passed_card: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM card_decisions cd
            JOIN profile_cards pc ON pc.id = cd.card_id
            WHERE pc.student_actor_id = $1
              AND cd.company_actor_id = $2
              AND cd.decision = 'PASS'
        )
        "#,
    )
    .bind(student_id)
    .bind(company_id)
    .fetch_one(&mut *conn)
    .await?;

    let existing: Option<ApplicationSnapshot> = sqlx::query_as::<_, (i64, ApplicationStatus)>(
        "SELECT id, status FROM applications
         WHERE post_id = $1 AND student_actor_id = $2
         FOR UPDATE",
    )
    .bind(post_id)
    .bind(student_id)
    .fetch_optional(&mut *conn)
    .await?
    .map(|(id, status)| ApplicationSnapshot { id, status });

    let effect = engine::on_student_decision(post_id, decision, company_passed_card, existing);
    apply_effect(conn, student_id, company_id, effect).await
}

/// Runs the reconciliation rules after a company decision on a student's card.
pub async fn reconcile_company_decision(
    conn: &mut PgConnection,
    company_id: i64,
    student_id: i64,
    decision: DecisionState,
) -> Result<(), AppError> {
    let pending: Option<ApplicationSnapshot> = sqlx::query_as::<_, (i64, ApplicationStatus)>(
        "SELECT id, status FROM applications
         WHERE company_actor_id = $1 AND student_actor_id = $2 AND status = 'PENDING'
         ORDER BY updated_at DESC
         LIMIT 1
         FOR UPDATE",
    )
    .bind(company_id)
    .bind(student_id)
    .fetch_optional(&mut *conn)
    .await?
    .map(|(id, status)| ApplicationSnapshot { id, status });

    // Tie-break inherited from the product: most recent decision wins,
    // then the newer ledger row.
    let latest_passed_post: Option<i64> = if pending.is_none() {
        sqlx::query_scalar(
            r#"
            SELECT pd.post_id
            FROM post_decisions pd
            JOIN opportunity_posts p ON p.id = pd.post_id
            WHERE pd.student_actor_id = $1
              AND pd.decision = 'PASS'
              AND p.company_actor_id = $2
            ORDER BY pd.decided_at DESC NULLS LAST, pd.id DESC
            LIMIT 1
            "#,
        )
        .bind(student_id)
        .bind(company_id)
        .fetch_optional(&mut *conn)
        .await?
    } else {
        None
    };

    let effect = engine::on_company_decision(decision, pending, latest_passed_post);
    apply_effect(conn, student_id, company_id, effect).await
}

async fn apply_effect(
    conn: &mut PgConnection,
    student_id: i64,
    company_id: i64,
    effect: Option<Effect>,
) -> Result<(), AppError> {
    match effect {
        None => Ok(()),
        Some(Effect::Create { post_id, status }) => {
            create_application_if_absent(conn, post_id, student_id, company_id, status).await?;
            Ok(())
        }
        Some(Effect::Transition { application_id, to }) => {
            transition_application(conn, application_id, to).await
        }
    }
}

/// Creates the application together with its conversation, seed SYSTEM message
/// and both read cursors. Returns `None` when the (post, student) application
/// already exists — a replayed decision or a lost creation race — in which
/// case nothing is written.
pub async fn create_application_if_absent(
    conn: &mut PgConnection,
    post_id: i64,
    student_id: i64,
    company_id: i64,
    status: ApplicationStatus,
) -> Result<Option<i64>, AppError> {
    let inserted: Option<i64> = sqlx::query_scalar(
        "INSERT INTO applications (post_id, student_actor_id, company_actor_id, status)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (post_id, student_actor_id) DO NOTHING
         RETURNING id",
    )
    .bind(post_id)
    .bind(student_id)
    .bind(company_id)
    .bind(status)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(application_id) = inserted else {
        return Ok(None);
    };

    let conversation_id: i64 =
        sqlx::query_scalar("INSERT INTO conversations (application_id) VALUES ($1) RETURNING id")
            .bind(application_id)
            .fetch_one(&mut *conn)
            .await?;

    let seed = store::append_message(
        &mut *conn,
        conversation_id,
        MessageKind::System,
        None,
        engine::system_text(status),
    )
    .await?;

    // Both cursors start at the seed message so neither side opens with a
    // false unread badge.
    for actor_id in [student_id, company_id] {
        sqlx::query(
            "INSERT INTO conversation_participants (conversation_id, actor_id, last_read_message_id)
             VALUES ($1, $2, $3)",
        )
        .bind(conversation_id)
        .bind(actor_id)
        .bind(seed.id)
        .execute(&mut *conn)
        .await?;
    }

    info!(application_id, conversation_id, ?status, "application created");
    Ok(Some(application_id))
}

/// Moves a PENDING application to its settled status and appends the matching
/// SYSTEM message. A row that is no longer PENDING is left untouched: the
/// other side settled it first and the outcome stands.
pub async fn transition_application(
    conn: &mut PgConnection,
    application_id: i64,
    to: ApplicationStatus,
) -> Result<(), AppError> {
    let updated = sqlx::query(
        "UPDATE applications SET status = $1, updated_at = now()
         WHERE id = $2 AND status = 'PENDING'",
    )
    .bind(to)
    .bind(application_id)
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(());
    }

    let conversation_id: Option<i64> =
        sqlx::query_scalar("SELECT id FROM conversations WHERE application_id = $1")
            .bind(application_id)
            .fetch_optional(&mut *conn)
            .await?;
    let conversation_id = conversation_id.ok_or_else(|| {
        AppError::Internal(anyhow!("application {application_id} has no conversation"))
    })?;

    store::append_message(
        conn,
        conversation_id,
        MessageKind::System,
        None,
        engine::system_text(to),
    )
    .await?;

    info!(application_id, ?to, "application transitioned");
    Ok(())
}
