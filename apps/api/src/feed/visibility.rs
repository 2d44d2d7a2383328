//! Pure feed-visibility rules. The handlers fetch the viewer's ledger and
//! application rows, compute the exclusion set here, and push only the id
//! list back into the catalog query. Read-only: nothing here mutates state.
//!
//! The two directions are deliberately asymmetric:
//! - a student's LIKE keeps the post visible while the application is still
//!   PENDING; only their own PASS or a settled application hides it;
//! - a company's LIKE hides a card once the student has engaged at all, and a
//!   company's PASS hides the card only while the PASS is current — a profile
//!   update after the PASS re-surfaces the card for re-evaluation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::models::application::ApplicationStatus;
use crate::models::decision::DecisionState;

/// The student's own ledger row for one post.
#[derive(Debug, Clone, Copy)]
pub struct StudentLedgerEntry {
    pub post_id: i64,
    pub decision: DecisionState,
}

/// One of the student's applications, reduced to the visibility inputs.
#[derive(Debug, Clone, Copy)]
pub struct StudentApplicationEntry {
    pub post_id: i64,
    pub status: ApplicationStatus,
}

/// Posts hidden from the student: PASSed by them, or resolved by the company
/// (application no longer PENDING) regardless of the student's own decision.
pub fn excluded_post_ids(
    ledger: &[StudentLedgerEntry],
    applications: &[StudentApplicationEntry],
) -> HashSet<i64> {
    let mut excluded = HashSet::new();
    for entry in ledger {
        if entry.decision == DecisionState::Pass {
            excluded.insert(entry.post_id);
        }
    }
    for app in applications {
        if app.status != ApplicationStatus::Pending {
            excluded.insert(app.post_id);
        }
    }
    excluded
}

/// The company's ledger row for one card, joined with what the rules need:
/// when the card last changed and whether its student has made any decision.
#[derive(Debug, Clone, Copy)]
pub struct CompanyLedgerEntry {
    pub card_id: i64,
    pub decision: DecisionState,
    pub decided_at: Option<DateTime<Utc>>,
    /// `coalesce(updated_at, created_at)` of the card.
    pub card_fresh_at: DateTime<Utc>,
    /// Whether the card's student has any non-NONE post decision.
    pub student_engaged: bool,
}

/// Cards hidden from the company feed.
pub fn excluded_card_ids(ledger: &[CompanyLedgerEntry]) -> HashSet<i64> {
    let mut excluded = HashSet::new();
    for entry in ledger {
        let hide = match entry.decision {
            // A PASS holds only against the profile it judged; a later
            // profile update re-enters the card.
            DecisionState::Pass => match entry.decided_at {
                Some(decided_at) => entry.card_fresh_at <= decided_at,
                None => false,
            },
            // LIKE hides only once mutual engagement exists.
            DecisionState::Like => entry.student_engaged,
            DecisionState::None => false,
        };
        if hide {
            excluded.insert(entry.card_id);
        }
    }
    excluded
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_student_pass_hides_post() {
        let ledger = [StudentLedgerEntry {
            post_id: 1,
            decision: DecisionState::Pass,
        }];
        assert!(excluded_post_ids(&ledger, &[]).contains(&1));
    }

    #[test]
    fn test_student_like_with_pending_application_stays_visible() {
        let ledger = [StudentLedgerEntry {
            post_id: 1,
            decision: DecisionState::Like,
        }];
        let apps = [StudentApplicationEntry {
            post_id: 1,
            status: ApplicationStatus::Pending,
        }];
        assert!(excluded_post_ids(&ledger, &apps).is_empty());
    }

    #[test]
    fn test_resolved_application_hides_post_regardless_of_decision() {
        for status in [ApplicationStatus::Accepted, ApplicationStatus::Declined] {
            let apps = [StudentApplicationEntry { post_id: 4, status }];
            assert!(excluded_post_ids(&[], &apps).contains(&4));
        }
    }

    #[test]
    fn test_company_pass_hides_while_current() {
        let ledger = [CompanyLedgerEntry {
            card_id: 9,
            decision: DecisionState::Pass,
            decided_at: Some(at(200)),
            card_fresh_at: at(100),
            student_engaged: false,
        }];
        assert!(excluded_card_ids(&ledger).contains(&9));
    }

    #[test]
    fn test_profile_update_after_pass_resurfaces_card() {
        let ledger = [CompanyLedgerEntry {
            card_id: 9,
            decision: DecisionState::Pass,
            decided_at: Some(at(200)),
            card_fresh_at: at(300),
            student_engaged: false,
        }];
        assert!(excluded_card_ids(&ledger).is_empty());
    }

    #[test]
    fn test_company_like_hides_only_after_student_engages() {
        let mut entry = CompanyLedgerEntry {
            card_id: 3,
            decision: DecisionState::Like,
            decided_at: Some(at(50)),
            card_fresh_at: at(10),
            student_engaged: false,
        };
        assert!(excluded_card_ids(&[entry]).is_empty());

        entry.student_engaged = true;
        assert!(excluded_card_ids(&[entry]).contains(&3));
    }

    #[test]
    fn test_none_decision_never_hides() {
        let ledger = [CompanyLedgerEntry {
            card_id: 5,
            decision: DecisionState::None,
            decided_at: None,
            card_fresh_at: at(10),
            student_engaged: true,
        }];
        assert!(excluded_card_ids(&ledger).is_empty());
    }
}
