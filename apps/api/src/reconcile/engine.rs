//! Pure reconciliation rules: one decision event plus a snapshot of the
//! relevant application state in, one planned effect out. All storage side
//! effects live in `apply`; everything here is directly unit-testable.
//!
//! The two decision streams arrive independently, so the rules are written
//! per-direction:
//!
//! - a student LIKE alone is enough to open an ACCEPTED chat, unless the
//!   company already PASSed the student's card, in which case any student
//!   decision resolves to DECLINED;
//! - a company decision settles an existing PENDING application, or, when the
//!   student PASSed first, opens a DECLINED conversation so both sides get the
//!   "not a match" message; a company acting first otherwise stays dormant.

use crate::models::application::ApplicationStatus;
use crate::models::decision::DecisionState;

pub const PENDING_TEXT: &str = "Message still pending";
pub const ACCEPTED_TEXT: &str = "Ready to connect?";
pub const DECLINED_TEXT: &str = "Unfortunately this was not a match, keep searching!";

/// Fixed system-message copy for a target status. Every status transition
/// appends exactly one SYSTEM message with this text.
pub fn system_text(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => PENDING_TEXT,
        ApplicationStatus::Accepted => ACCEPTED_TEXT,
        ApplicationStatus::Declined => DECLINED_TEXT,
    }
}

/// The slice of an application row the rules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicationSnapshot {
    pub id: i64,
    pub status: ApplicationStatus,
}

/// Planned storage effect. `Create` is create-if-absent: the applier treats an
/// already-existing application for the same (post, student) as a no-op, so
/// replaying the same decision never duplicates conversations or messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Create {
        post_id: i64,
        status: ApplicationStatus,
    },
    Transition {
        application_id: i64,
        to: ApplicationStatus,
    },
}

/// Rules for a student decision on a post.
///
/// `existing` is the application for (this post, this student), if any.
/// `company_passed_card` is whether the post's company has PASSed the
/// student's profile card, regardless of which post.
pub fn on_student_decision(
    post_id: i64,
    decision: DecisionState,
    company_passed_card: bool,
    existing: Option<ApplicationSnapshot>,
) -> Option<Effect> {
    if company_passed_card {
        // The company already rejected the person; any further student
        // interest resolves straight to a non-match, skipping PENDING.
        return match existing {
            None => Some(Effect::Create {
                post_id,
                status: ApplicationStatus::Declined,
            }),
            Some(app) if app.status == ApplicationStatus::Pending => Some(Effect::Transition {
                application_id: app.id,
                to: ApplicationStatus::Declined,
            }),
            // Settled applications are never reopened by reconciliation.
            Some(_) => None,
        };
    }

    match decision {
        DecisionState::Like if existing.is_none() => Some(Effect::Create {
            post_id,
            status: ApplicationStatus::Accepted,
        }),
        // PASS never creates an application; an existing one is left as-is.
        _ => None,
    }
}

/// Rules for a company decision on a student's card.
///
/// `pending_application` is the PENDING application between this company and
/// this student, if one exists. `latest_passed_post` is the most recently
/// PASSed post of this company by this student, consulted only when no
/// application exists yet.
pub fn on_company_decision(
    decision: DecisionState,
    pending_application: Option<ApplicationSnapshot>,
    latest_passed_post: Option<i64>,
) -> Option<Effect> {
    let target = match decision {
        DecisionState::Like => ApplicationStatus::Accepted,
        DecisionState::Pass => ApplicationStatus::Declined,
        DecisionState::None => return None,
    };

    if let Some(app) = pending_application {
        if app.status == target {
            return None;
        }
        return Some(Effect::Transition {
            application_id: app.id,
            to: target,
        });
    }

    // Student PASSed first and the company is now reacting: open a declined
    // conversation so both sides get the symmetric "not a match" message.
    latest_passed_post.map(|post_id| Effect::Create {
        post_id,
        status: ApplicationStatus::Declined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(id: i64) -> ApplicationSnapshot {
        ApplicationSnapshot {
            id,
            status: ApplicationStatus::Pending,
        }
    }

    #[test]
    fn test_student_like_creates_accepted() {
        let effect = on_student_decision(7, DecisionState::Like, false, None);
        assert_eq!(
            effect,
            Some(Effect::Create {
                post_id: 7,
                status: ApplicationStatus::Accepted
            })
        );
    }

    #[test]
    fn test_student_like_is_idempotent() {
        let existing = ApplicationSnapshot {
            id: 1,
            status: ApplicationStatus::Accepted,
        };
        assert_eq!(
            on_student_decision(7, DecisionState::Like, false, Some(existing)),
            None
        );
    }

    #[test]
    fn test_student_pass_creates_nothing() {
        assert_eq!(on_student_decision(7, DecisionState::Pass, false, None), None);
    }

    #[test]
    fn test_company_pass_forces_declined_on_any_student_decision() {
        for decision in [DecisionState::Like, DecisionState::Pass] {
            assert_eq!(
                on_student_decision(7, decision, true, None),
                Some(Effect::Create {
                    post_id: 7,
                    status: ApplicationStatus::Declined
                })
            );
        }
    }

    #[test]
    fn test_company_pass_declines_pending_application() {
        assert_eq!(
            on_student_decision(7, DecisionState::Like, true, Some(pending(3))),
            Some(Effect::Transition {
                application_id: 3,
                to: ApplicationStatus::Declined
            })
        );
    }

    #[test]
    fn test_settled_application_not_reopened() {
        let declined = ApplicationSnapshot {
            id: 3,
            status: ApplicationStatus::Declined,
        };
        assert_eq!(
            on_student_decision(7, DecisionState::Like, true, Some(declined)),
            None
        );
    }

    #[test]
    fn test_company_like_accepts_pending() {
        assert_eq!(
            on_company_decision(DecisionState::Like, Some(pending(5)), None),
            Some(Effect::Transition {
                application_id: 5,
                to: ApplicationStatus::Accepted
            })
        );
    }

    #[test]
    fn test_company_pass_declines_pending() {
        assert_eq!(
            on_company_decision(DecisionState::Pass, Some(pending(5)), Some(9)),
            Some(Effect::Transition {
                application_id: 5,
                to: ApplicationStatus::Declined
            })
        );
    }

    #[test]
    fn test_company_reaction_to_student_pass_creates_declined() {
        assert_eq!(
            on_company_decision(DecisionState::Like, None, Some(9)),
            Some(Effect::Create {
                post_id: 9,
                status: ApplicationStatus::Declined
            })
        );
    }

    #[test]
    fn test_company_acting_first_is_dormant() {
        assert_eq!(on_company_decision(DecisionState::Pass, None, None), None);
        assert_eq!(on_company_decision(DecisionState::Like, None, None), None);
    }

    #[test]
    fn test_none_decision_is_noop() {
        assert_eq!(on_company_decision(DecisionState::None, Some(pending(5)), Some(9)), None);
    }

    #[test]
    fn test_system_text_per_status() {
        assert_eq!(system_text(ApplicationStatus::Pending), PENDING_TEXT);
        assert_eq!(system_text(ApplicationStatus::Accepted), ACCEPTED_TEXT);
        assert_eq!(system_text(ApplicationStatus::Declined), DECLINED_TEXT);
    }
}
