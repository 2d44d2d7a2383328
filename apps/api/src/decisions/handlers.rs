use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentActor;
use crate::decisions::ledger;
use crate::errors::AppError;
use crate::models::decision::DecisionState;
use crate::models::post::{OpportunityPostRow, ProfileCardRow};
use crate::reconcile::apply;
use crate::state::AppState;

fn require_swipe(decision: DecisionState) -> Result<(), AppError> {
    if decision == DecisionState::None {
        return Err(AppError::Validation(
            "decision must be LIKE or PASS".to_string(),
        ));
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDecisionRequest {
    pub post_id: i64,
    pub decision: DecisionState,
}

/// POST /decisions/student/post
///
/// Records the student's LIKE/PASS on a post, then reconciles: the ledger
/// upsert and every reconciliation side effect commit in one transaction.
pub async fn student_decision_post(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(req): Json<StudentDecisionRequest>,
) -> Result<Json<Value>, AppError> {
    if !actor.is_student() {
        return Err(AppError::Forbidden(
            "Only students can decide on posts".to_string(),
        ));
    }
    require_swipe(req.decision)?;

    let mut tx = state.db.begin().await?;

    let post = sqlx::query_as::<_, OpportunityPostRow>(
        "SELECT * FROM opportunity_posts WHERE id = $1",
    )
    .bind(req.post_id)
    .fetch_optional(&mut *tx)
    .await?
    .filter(|p| p.is_active)
    .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    ledger::upsert_post_decision(&mut tx, actor.id, post.id, req.decision).await?;
    apply::reconcile_student_decision(
        &mut tx,
        actor.id,
        post.id,
        post.company_actor_id,
        req.decision,
    )
    .await?;

    tx.commit().await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCardDecisionRequest {
    pub student_post_id: i64,
    pub decision: DecisionState,
}

/// POST /decisions/company/student-post
pub async fn company_decision_card(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(req): Json<CompanyCardDecisionRequest>,
) -> Result<Json<Value>, AppError> {
    if !actor.is_company() {
        return Err(AppError::Forbidden(
            "Only companies can decide on student cards".to_string(),
        ));
    }
    require_swipe(req.decision)?;

    let mut tx = state.db.begin().await?;

    let card = sqlx::query_as::<_, ProfileCardRow>("SELECT * FROM profile_cards WHERE id = $1")
        .bind(req.student_post_id)
        .fetch_optional(&mut *tx)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| AppError::NotFound("Student card not found".to_string()))?;

    record_card_decision(&mut tx, &actor, &card, req.decision).await?;

    tx.commit().await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStudentDecisionRequest {
    pub student_user_id: i64,
    pub decision: DecisionState,
}

/// POST /decisions/company/student
///
/// Convenience variant keyed by the student id; resolves their profile card.
pub async fn company_decision_student(
    State(state): State<AppState>,
    actor: CurrentActor,
    Json(req): Json<CompanyStudentDecisionRequest>,
) -> Result<Json<Value>, AppError> {
    if !actor.is_company() {
        return Err(AppError::Forbidden(
            "Only companies can decide on students".to_string(),
        ));
    }
    require_swipe(req.decision)?;

    let mut tx = state.db.begin().await?;

    let card = sqlx::query_as::<_, ProfileCardRow>(
        "SELECT * FROM profile_cards WHERE student_actor_id = $1",
    )
    .bind(req.student_user_id)
    .fetch_optional(&mut *tx)
    .await?
    .filter(|c| c.is_active)
    .ok_or_else(|| AppError::NotFound("Student card not found".to_string()))?;

    record_card_decision(&mut tx, &actor, &card, req.decision).await?;

    tx.commit().await?;
    Ok(Json(json!({ "ok": true })))
}

async fn record_card_decision(
    tx: &mut sqlx::PgConnection,
    actor: &CurrentActor,
    card: &ProfileCardRow,
    decision: DecisionState,
) -> Result<(), AppError> {
    ledger::upsert_card_decision(tx, actor.id, card.id, decision).await?;
    apply::reconcile_company_decision(tx, actor.id, card.student_actor_id, decision).await
}
