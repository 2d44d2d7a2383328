use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "actor_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ActorRole {
    Student,
    Company,
}

#[derive(Debug, Clone, FromRow)]
pub struct ActorRow {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub role: ActorRole,
    pub profile_image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct StudentProfileRow {
    pub actor_id: i64,
    pub university: Option<String>,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub studies: Option<String>,
    pub experience: Option<String>,
}
