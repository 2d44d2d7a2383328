use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A company-authored internship opening shown in the student feed.
/// Soft-deleted via `is_active` so decisions and applications keep their target.
#[derive(Debug, Clone, FromRow)]
pub struct OpportunityPostRow {
    pub id: i64,
    pub company_actor_id: i64,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub department: Option<String>,
    pub image_path: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A student-authored post shown on the student's own profile page
/// (seminars, experiences). Not part of the company feed.
#[derive(Debug, Clone, FromRow)]
pub struct ExperiencePostRow {
    pub id: i64,
    pub student_actor_id: i64,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub image_path: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// The student-profile card shown in the company feed. One active card per
/// student; regenerated whenever the owning profile changes. `updated_at` is
/// the freshness timestamp the visibility rules compare PASS decisions against.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileCardRow {
    pub id: i64,
    pub student_actor_id: i64,
    pub title: Option<String>,
    pub description: String,
    pub location: Option<String>,
    pub image_path: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
