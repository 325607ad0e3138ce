//! Badge progress resolution.
//!
//! Derives, for one member, the state and completion percentage of each
//! badge from the badge's criteria and the member's award records. Nothing
//! is stored: progress is recomputed on every view from a snapshot the
//! caller has already fetched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::badges::model::{
    validate_member_id, AssignmentStatus, BadgeDefinition, CriterionStatus, MemberBadgeAward,
    MemberCriterionAward, LEGACY_CRITERION_ID,
};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STATE_LOCKED: &str = "locked";
pub const STATE_IN_PROGRESS: &str = "in_progress";
pub const STATE_COMPLETE: &str = "complete";
pub const STATE_REVOKED: &str = "revoked";

/// All valid badge state strings.
pub const VALID_BADGE_STATES: &[&str] =
    &[STATE_LOCKED, STATE_IN_PROGRESS, STATE_COMPLETE, STATE_REVOKED];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Derived state of a badge for one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeState {
    Locked,
    InProgress,
    Complete,
    Revoked,
}

impl BadgeState {
    /// Convert from a string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATE_LOCKED => Ok(Self::Locked),
            STATE_IN_PROGRESS => Ok(Self::InProgress),
            STATE_COMPLETE => Ok(Self::Complete),
            STATE_REVOKED => Ok(Self::Revoked),
            _ => Err(format!(
                "Invalid badge state '{s}'. Must be one of: {}",
                VALID_BADGE_STATES.join(", ")
            )),
        }
    }

    /// Convert to the string value used in widget payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => STATE_LOCKED,
            Self::InProgress => STATE_IN_PROGRESS,
            Self::Complete => STATE_COMPLETE,
            Self::Revoked => STATE_REVOKED,
        }
    }
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// Resolved status of one criterion, in badge order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionProgress {
    /// `0` for legacy free-text criteria.
    pub criterion_id: DbId,
    pub label: String,
    pub description: String,
    pub status: CriterionStatus,
    /// Legacy criteria are listed for display but can never be awarded.
    pub awardable: bool,
}

/// Derived progress of one badge for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeProgress {
    pub member_id: DbId,
    pub badge_id: DbId,
    pub label: String,
    pub summary: String,
    pub description: String,
    pub state: BadgeState,
    pub progress_pct: u8,
    pub awarded_count: usize,
    pub total_criteria: usize,
    pub criteria: Vec<CriterionProgress>,
    pub assignment: AssignmentStatus,
    pub awarded_at: Option<Timestamp>,
}

/// A member's award records as fetched for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAwardSnapshot {
    #[serde(default)]
    pub badge_awards: Vec<MemberBadgeAward>,
    #[serde(default)]
    pub criterion_awards: Vec<MemberCriterionAward>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Compute the progress percentage from total and awarded criteria counts.
///
/// Returns 0 if `total_criteria` is 0.
pub fn compute_progress_pct(total_criteria: usize, awarded_count: usize) -> u8 {
    if total_criteria == 0 {
        return 0;
    }
    let pct = (awarded_count as f64 / total_criteria as f64 * 100.0).round();
    pct.min(100.0) as u8
}

/// Resolve one badge for one member.
///
/// `criterion_awards` maps criterion id to the member's award status; ids
/// that are absent resolve to `Pending`. `assignment` is the member's
/// badge-level record, if any.
pub fn resolve_badge_progress(
    member_id: DbId,
    badge: &BadgeDefinition,
    criterion_awards: &HashMap<DbId, CriterionStatus>,
    assignment: Option<&MemberBadgeAward>,
) -> BadgeProgress {
    let criteria = collect_criteria(badge, criterion_awards);

    let total_criteria = criteria.len();
    let awarded_count = criteria
        .iter()
        .filter(|c| c.status == CriterionStatus::Awarded)
        .count();

    let assignment_status = assignment.map(|a| a.status).unwrap_or_default();

    let (mut state, progress_pct) = if total_criteria > 0 {
        if awarded_count >= total_criteria {
            (BadgeState::Complete, 100)
        } else if awarded_count > 0 {
            (
                BadgeState::InProgress,
                compute_progress_pct(total_criteria, awarded_count),
            )
        } else {
            (BadgeState::Locked, 0)
        }
    } else if assignment_status == AssignmentStatus::Awarded {
        (BadgeState::Complete, 100)
    } else {
        (BadgeState::Locked, 0)
    };

    // A revoked badge keeps the progress already shown.
    if state != BadgeState::Complete && assignment_status == AssignmentStatus::Revoked {
        state = BadgeState::Revoked;
    }

    tracing::debug!(
        member_id,
        badge_id = badge.id,
        state = state.as_str(),
        progress_pct,
        awarded_count,
        total_criteria,
        "Resolved badge progress"
    );

    BadgeProgress {
        member_id,
        badge_id: badge.id,
        label: badge.label.clone(),
        summary: badge.summary.clone(),
        description: badge.description.clone(),
        state,
        progress_pct,
        awarded_count,
        total_criteria,
        criteria,
        assignment: assignment_status,
        awarded_at: assignment.and_then(|a| a.awarded_at),
    }
}

/// Resolve every badge of the catalog for one member.
///
/// `badges` must already be limited to active badges in display order (see
/// [`crate::badges::model::select_active_badges`]). Records in `snapshot`
/// that belong to another member are ignored. When the snapshot holds more
/// than one record for the same badge or criterion, the last one wins.
pub fn resolve_member_badges(
    member_id: DbId,
    badges: &[BadgeDefinition],
    snapshot: &MemberAwardSnapshot,
) -> Result<Vec<BadgeProgress>, CoreError> {
    validate_member_id(member_id)?;

    let mut criterion_awards: HashMap<DbId, CriterionStatus> = HashMap::new();
    for award in &snapshot.criterion_awards {
        if award.member_id != member_id {
            tracing::warn!(
                member_id,
                other_member_id = award.member_id,
                criterion_id = award.criterion_id,
                "Ignoring criterion award for another member"
            );
            continue;
        }
        criterion_awards.insert(award.criterion_id, award.status);
    }

    let mut badge_awards: HashMap<DbId, &MemberBadgeAward> = HashMap::new();
    for award in &snapshot.badge_awards {
        if award.member_id != member_id {
            tracing::warn!(
                member_id,
                other_member_id = award.member_id,
                badge_id = award.badge_id,
                "Ignoring badge assignment for another member"
            );
            continue;
        }
        badge_awards.insert(award.badge_id, award);
    }

    let progress: Vec<BadgeProgress> = badges
        .iter()
        .map(|badge| {
            resolve_badge_progress(
                member_id,
                badge,
                &criterion_awards,
                badge_awards.get(&badge.id).copied(),
            )
        })
        .collect();

    tracing::debug!(member_id, badge_count = progress.len(), "Resolved member badges");

    Ok(progress)
}

/// Live criteria in badge order, or the legacy labels when the badge has
/// no criterion records at all.
fn collect_criteria(
    badge: &BadgeDefinition,
    criterion_awards: &HashMap<DbId, CriterionStatus>,
) -> Vec<CriterionProgress> {
    if badge.criteria.is_empty() {
        return badge
            .legacy_criteria
            .iter()
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .map(|label| CriterionProgress {
                criterion_id: LEGACY_CRITERION_ID,
                label: label.to_string(),
                description: String::new(),
                status: CriterionStatus::Pending,
                awardable: false,
            })
            .collect();
    }

    badge
        .criteria
        .iter()
        .filter(|c| c.is_live())
        .map(|c| {
            let (status, awardable) = if c.id == LEGACY_CRITERION_ID {
                (CriterionStatus::Pending, false)
            } else {
                (
                    criterion_awards.get(&c.id).copied().unwrap_or_default(),
                    true,
                )
            };
            CriterionProgress {
                criterion_id: c.id,
                label: c.label.clone(),
                description: c.description.clone(),
                status,
                awardable,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::model::Criterion;

    const MEMBER: DbId = 42;

    fn criterion(id: DbId, badge_id: DbId) -> Criterion {
        Criterion {
            id,
            badge_id,
            label: format!("Critère {id}"),
            description: String::new(),
            sort_order: 0,
            archived: false,
        }
    }

    fn badge_with(id: DbId, criterion_ids: &[DbId]) -> BadgeDefinition {
        BadgeDefinition {
            id,
            label: format!("Badge {id}"),
            summary: String::new(),
            description: String::new(),
            criteria: criterion_ids.iter().map(|&c| criterion(c, id)).collect(),
            legacy_criteria: vec![],
            active: true,
            display_order: 0,
        }
    }

    fn awards(entries: &[(DbId, CriterionStatus)]) -> HashMap<DbId, CriterionStatus> {
        entries.iter().copied().collect()
    }

    fn assignment(badge_id: DbId, status: AssignmentStatus) -> MemberBadgeAward {
        MemberBadgeAward {
            member_id: MEMBER,
            badge_id,
            status,
            awarded_at: None,
        }
    }

    // -- compute_progress_pct -------------------------------------------------

    #[test]
    fn pct_zero_total_returns_zero() {
        assert_eq!(compute_progress_pct(0, 0), 0);
    }

    #[test]
    fn pct_rounds_to_nearest() {
        assert_eq!(compute_progress_pct(3, 1), 33);
        assert_eq!(compute_progress_pct(3, 2), 67);
        assert_eq!(compute_progress_pct(8, 1), 13); // 12.5 rounds up
    }

    #[test]
    fn pct_never_exceeds_100() {
        assert_eq!(compute_progress_pct(2, 7), 100);
    }

    // -- BadgeState -----------------------------------------------------------

    #[test]
    fn badge_state_round_trip() {
        for state in &[
            BadgeState::Locked,
            BadgeState::InProgress,
            BadgeState::Complete,
            BadgeState::Revoked,
        ] {
            assert_eq!(BadgeState::from_str_value(state.as_str()).unwrap(), *state);
        }
        assert!(BadgeState::from_str_value("done").is_err());
    }

    // -- resolve_badge_progress -----------------------------------------------

    #[test]
    fn no_criteria_no_assignment_is_locked() {
        let badge = badge_with(1, &[]);
        let p = resolve_badge_progress(MEMBER, &badge, &HashMap::new(), None);
        assert_eq!(p.state, BadgeState::Locked);
        assert_eq!(p.progress_pct, 0);
        assert_eq!(p.total_criteria, 0);
        assert!(p.criteria.is_empty());
    }

    #[test]
    fn no_criteria_awarded_assignment_is_complete() {
        let badge = badge_with(1, &[]);
        let a = assignment(1, AssignmentStatus::Awarded);
        let p = resolve_badge_progress(MEMBER, &badge, &HashMap::new(), Some(&a));
        assert_eq!(p.state, BadgeState::Complete);
        assert_eq!(p.progress_pct, 100);
    }

    #[test]
    fn no_awards_is_locked() {
        let badge = badge_with(1, &[10, 11, 12]);
        let p = resolve_badge_progress(MEMBER, &badge, &HashMap::new(), None);
        assert_eq!(p.state, BadgeState::Locked);
        assert_eq!(p.progress_pct, 0);
        assert_eq!(p.total_criteria, 3);
        assert!(p
            .criteria
            .iter()
            .all(|c| c.status == CriterionStatus::Pending && c.awardable));
    }

    #[test]
    fn partial_awards_is_in_progress() {
        let badge = badge_with(1, &[10, 11, 12]);
        let a = awards(&[(10, CriterionStatus::Awarded), (11, CriterionStatus::Revoked)]);
        let p = resolve_badge_progress(MEMBER, &badge, &a, None);
        assert_eq!(p.state, BadgeState::InProgress);
        assert_eq!(p.awarded_count, 1);
        assert_eq!(p.progress_pct, 33);
        assert_eq!(p.criteria[1].status, CriterionStatus::Revoked);
        assert_eq!(p.criteria[2].status, CriterionStatus::Pending);
    }

    #[test]
    fn all_awarded_is_complete() {
        let badge = badge_with(1, &[10, 11]);
        let a = awards(&[(10, CriterionStatus::Awarded), (11, CriterionStatus::Awarded)]);
        let p = resolve_badge_progress(MEMBER, &badge, &a, None);
        assert_eq!(p.state, BadgeState::Complete);
        assert_eq!(p.progress_pct, 100);
    }

    #[test]
    fn criteria_keep_badge_order() {
        let badge = badge_with(1, &[30, 10, 20]);
        let p = resolve_badge_progress(MEMBER, &badge, &HashMap::new(), None);
        let ids: Vec<DbId> = p.criteria.iter().map(|c| c.criterion_id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn archived_criteria_excluded() {
        let mut badge = badge_with(1, &[10, 11, 12]);
        badge.criteria[2].archived = true;
        let a = awards(&[
            (10, CriterionStatus::Awarded),
            (11, CriterionStatus::Awarded),
            (12, CriterionStatus::Pending),
        ]);
        let p = resolve_badge_progress(MEMBER, &badge, &a, None);
        assert_eq!(p.total_criteria, 2);
        assert_eq!(p.criteria.len(), 2);
        assert_eq!(p.state, BadgeState::Complete);
    }

    #[test]
    fn all_criteria_archived_does_not_fall_back_to_legacy() {
        let mut badge = badge_with(1, &[10]);
        badge.criteria[0].archived = true;
        badge.legacy_criteria = vec!["Ancien critère".to_string()];
        let p = resolve_badge_progress(MEMBER, &badge, &HashMap::new(), None);
        assert_eq!(p.total_criteria, 0);
        assert_eq!(p.state, BadgeState::Locked);
    }

    #[test]
    fn revoked_assignment_keeps_progress() {
        let badge = badge_with(1, &[10, 11, 12, 13, 14]);
        let a = awards(&[(10, CriterionStatus::Awarded), (11, CriterionStatus::Awarded)]);
        let r = assignment(1, AssignmentStatus::Revoked);
        let p = resolve_badge_progress(MEMBER, &badge, &a, Some(&r));
        assert_eq!(p.state, BadgeState::Revoked);
        assert_eq!(p.progress_pct, 40);
        assert_eq!(p.assignment, AssignmentStatus::Revoked);
    }

    #[test]
    fn revoked_assignment_on_locked_badge() {
        let badge = badge_with(1, &[10]);
        let r = assignment(1, AssignmentStatus::Revoked);
        let p = resolve_badge_progress(MEMBER, &badge, &HashMap::new(), Some(&r));
        assert_eq!(p.state, BadgeState::Revoked);
        assert_eq!(p.progress_pct, 0);
    }

    #[test]
    fn revoked_assignment_does_not_override_complete() {
        let badge = badge_with(1, &[10]);
        let a = awards(&[(10, CriterionStatus::Awarded)]);
        let r = assignment(1, AssignmentStatus::Revoked);
        let p = resolve_badge_progress(MEMBER, &badge, &a, Some(&r));
        assert_eq!(p.state, BadgeState::Complete);
        assert_eq!(p.progress_pct, 100);
    }

    #[test]
    fn awarded_assignment_does_not_complete_badge_with_criteria() {
        let badge = badge_with(1, &[10, 11]);
        let a = assignment(1, AssignmentStatus::Awarded);
        let p = resolve_badge_progress(MEMBER, &badge, &HashMap::new(), Some(&a));
        assert_eq!(p.state, BadgeState::Locked);
        assert_eq!(p.assignment, AssignmentStatus::Awarded);
    }

    #[test]
    fn legacy_fallback_criteria_are_pending() {
        let mut badge = badge_with(1, &[]);
        badge.legacy_criteria = vec![
            "Participer à une sortie".to_string(),
            "   ".to_string(),
            "Animer un atelier".to_string(),
        ];
        let a = awards(&[(LEGACY_CRITERION_ID, CriterionStatus::Awarded)]);
        let p = resolve_badge_progress(MEMBER, &badge, &a, None);
        assert_eq!(p.total_criteria, 2);
        assert_eq!(p.awarded_count, 0);
        assert_eq!(p.state, BadgeState::Locked);
        assert!(p
            .criteria
            .iter()
            .all(|c| c.criterion_id == 0 && !c.awardable && c.status == CriterionStatus::Pending));
    }

    #[test]
    fn criterion_record_with_id_zero_never_awarded() {
        let badge = badge_with(1, &[0, 10]);
        let a = awards(&[(0, CriterionStatus::Awarded), (10, CriterionStatus::Awarded)]);
        let p = resolve_badge_progress(MEMBER, &badge, &a, None);
        assert_eq!(p.total_criteria, 2);
        assert_eq!(p.awarded_count, 1);
        assert_eq!(p.state, BadgeState::InProgress);
        assert_eq!(p.progress_pct, 50);
    }

    // -- resolve_member_badges ------------------------------------------------

    #[test]
    fn invalid_member_rejected() {
        let result = resolve_member_badges(0, &[], &MemberAwardSnapshot::default());
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn foreign_member_awards_ignored() {
        let badges = vec![badge_with(1, &[10])];
        let snapshot = MemberAwardSnapshot {
            badge_awards: vec![MemberBadgeAward {
                member_id: 7,
                badge_id: 1,
                status: AssignmentStatus::Revoked,
                awarded_at: None,
            }],
            criterion_awards: vec![MemberCriterionAward {
                member_id: 7,
                criterion_id: 10,
                status: CriterionStatus::Awarded,
            }],
        };
        let progress = resolve_member_badges(MEMBER, &badges, &snapshot).unwrap();
        assert_eq!(progress[0].state, BadgeState::Locked);
        assert_eq!(progress[0].assignment, AssignmentStatus::None);
    }

    #[test]
    fn last_duplicate_award_wins() {
        let badges = vec![badge_with(1, &[10])];
        let snapshot = MemberAwardSnapshot {
            badge_awards: vec![],
            criterion_awards: vec![
                MemberCriterionAward {
                    member_id: MEMBER,
                    criterion_id: 10,
                    status: CriterionStatus::Awarded,
                },
                MemberCriterionAward {
                    member_id: MEMBER,
                    criterion_id: 10,
                    status: CriterionStatus::Revoked,
                },
            ],
        };
        let progress = resolve_member_badges(MEMBER, &badges, &snapshot).unwrap();
        assert_eq!(progress[0].criteria[0].status, CriterionStatus::Revoked);
        assert_eq!(progress[0].state, BadgeState::Locked);
    }

    #[test]
    fn one_result_per_badge_in_input_order() {
        let badges = vec![badge_with(3, &[30]), badge_with(1, &[10]), badge_with(2, &[])];
        let progress =
            resolve_member_badges(MEMBER, &badges, &MemberAwardSnapshot::default()).unwrap();
        let ids: Vec<DbId> = progress.iter().map(|p| p.badge_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert!(progress.iter().all(|p| p.member_id == MEMBER));
    }
}
