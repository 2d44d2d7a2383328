//! Profile-card generation. Each student owns at most one card; it is derived
//! from the profile and regenerated on every profile update so the company
//! feed never shows stale text. The `updated_at` bump is what lets a refreshed
//! card re-enter feeds a company already passed on.

use sqlx::PgConnection;

use crate::errors::AppError;
use crate::models::actor::{ActorRow, StudentProfileRow};
use crate::models::post::ProfileCardRow;

pub struct CardSource<'a> {
    pub name: Option<&'a str>,
    pub surname: Option<&'a str>,
    pub university: Option<&'a str>,
    pub department: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub skills: Option<&'a str>,
    pub studies: Option<&'a str>,
    pub experience: Option<&'a str>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Derive the card title and description from profile fields.
pub fn compose_card(source: &CardSource<'_>) -> (String, String) {
    let title = if let Some(studies) = non_blank(source.studies) {
        studies.to_string()
    } else {
        match (non_blank(source.name), non_blank(source.surname)) {
            (Some(name), Some(surname)) => format!("{name} {surname}"),
            (Some(name), None) => name.to_string(),
            (None, Some(surname)) => surname.to_string(),
            (None, None) => "Student Profile".to_string(),
        }
    };

    let mut lines = Vec::new();
    if let Some(bio) = non_blank(source.bio) {
        lines.push(bio.to_string());
    }
    if let Some(skills) = non_blank(source.skills) {
        lines.push(format!("Skills: {skills}"));
    }
    if let Some(studies) = non_blank(source.studies) {
        lines.push(format!("Studies: {studies}"));
    }
    if let Some(experience) = non_blank(source.experience) {
        lines.push(format!("Experience: {experience}"));
    }
    if let Some(university) = non_blank(source.university) {
        match non_blank(source.department) {
            Some(department) => lines.push(format!("University: {university} ({department})")),
            None => lines.push(format!("University: {university}")),
        }
    }

    let description = if lines.is_empty() {
        "Student profile".to_string()
    } else {
        lines.join("\n")
    };

    (title, description)
}

async fn load_source(
    conn: &mut PgConnection,
    student_actor_id: i64,
) -> Result<(ActorRow, Option<StudentProfileRow>), AppError> {
    let actor: Option<ActorRow> = sqlx::query_as("SELECT * FROM actors WHERE id = $1")
        .bind(student_actor_id)
        .fetch_optional(&mut *conn)
        .await?;
    let actor = actor.ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    let profile: Option<StudentProfileRow> =
        sqlx::query_as("SELECT * FROM student_profiles WHERE actor_id = $1")
            .bind(student_actor_id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok((actor, profile))
}

fn composed(actor: &ActorRow, profile: Option<&StudentProfileRow>) -> (String, String) {
    compose_card(&CardSource {
        name: actor.name.as_deref(),
        surname: actor.surname.as_deref(),
        university: profile.and_then(|p| p.university.as_deref()),
        department: profile.and_then(|p| p.department.as_deref()),
        bio: profile.and_then(|p| p.bio.as_deref()),
        skills: profile.and_then(|p| p.skills.as_deref()),
        studies: profile.and_then(|p| p.studies.as_deref()),
        experience: profile.and_then(|p| p.experience.as_deref()),
    })
}

/// Return the student's card, generating one from the profile if absent.
pub async fn ensure_profile_card(
    conn: &mut PgConnection,
    student_actor_id: i64,
) -> Result<ProfileCardRow, AppError> {
    let existing: Option<ProfileCardRow> =
        sqlx::query_as("SELECT * FROM profile_cards WHERE student_actor_id = $1")
            .bind(student_actor_id)
            .fetch_optional(&mut *conn)
            .await?;
    if let Some(card) = existing {
        return Ok(card);
    }

    let (actor, profile) = load_source(&mut *conn, student_actor_id).await?;
    let (title, description) = composed(&actor, profile.as_ref());

    // Concurrent ensure for the same student resolves to the first insert.
    sqlx::query(
        "INSERT INTO profile_cards (student_actor_id, title, description, image_path)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (student_actor_id) DO NOTHING",
    )
    .bind(student_actor_id)
    .bind(&title)
    .bind(&description)
    .bind(&actor.profile_image_path)
    .execute(&mut *conn)
    .await?;

    let card: ProfileCardRow =
        sqlx::query_as("SELECT * FROM profile_cards WHERE student_actor_id = $1")
            .bind(student_actor_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(card)
}

/// Regenerate the card after a profile change, bumping `updated_at`.
pub async fn refresh_profile_card(
    conn: &mut PgConnection,
    student_actor_id: i64,
) -> Result<ProfileCardRow, AppError> {
    let (actor, profile) = load_source(&mut *conn, student_actor_id).await?;
    let (title, description) = composed(&actor, profile.as_ref());

    let card: ProfileCardRow = sqlx::query_as(
        "INSERT INTO profile_cards (student_actor_id, title, description, image_path)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (student_actor_id) DO UPDATE
             SET title = EXCLUDED.title,
                 description = EXCLUDED.description,
                 image_path = EXCLUDED.image_path,
                 is_active = TRUE,
                 updated_at = now()
         RETURNING *",
    )
    .bind(student_actor_id)
    .bind(&title)
    .bind(&description)
    .bind(&actor.profile_image_path)
    .fetch_one(&mut *conn)
    .await?;
    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> CardSource<'static> {
        CardSource {
            name: None,
            surname: None,
            university: None,
            department: None,
            bio: None,
            skills: None,
            studies: None,
            experience: None,
        }
    }

    #[test]
    fn title_prefers_studies() {
        let source = CardSource {
            studies: Some("Computer Engineering"),
            name: Some("Ada"),
            surname: Some("Lovelace"),
            ..empty()
        };
        let (title, _) = compose_card(&source);
        assert_eq!(title, "Computer Engineering");
    }

    #[test]
    fn title_falls_back_to_full_name_then_placeholder() {
        let source = CardSource {
            name: Some("Ada"),
            surname: Some("Lovelace"),
            ..empty()
        };
        assert_eq!(compose_card(&source).0, "Ada Lovelace");
        assert_eq!(compose_card(&empty()).0, "Student Profile");
    }

    #[test]
    fn description_joins_present_lines() {
        let source = CardSource {
            bio: Some("Curious builder"),
            skills: Some("Rust, SQL"),
            university: Some("ITU"),
            department: Some("CS"),
            ..empty()
        };
        let (_, description) = compose_card(&source);
        assert_eq!(
            description,
            "Curious builder\nSkills: Rust, SQL\nUniversity: ITU (CS)"
        );
    }

    #[test]
    fn blank_fields_are_skipped() {
        let source = CardSource {
            bio: Some("   "),
            skills: Some(""),
            ..empty()
        };
        let (_, description) = compose_card(&source);
        assert_eq!(description, "Student profile");
    }

    #[test]
    fn university_without_department_has_no_parens() {
        let source = CardSource {
            university: Some("ITU"),
            ..empty()
        };
        assert_eq!(compose_card(&source).1, "University: ITU");
    }
}
