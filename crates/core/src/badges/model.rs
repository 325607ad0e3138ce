//! Badge catalog and member award records.
//!
//! These mirror the rows the plugin stores for badges, their criteria, and
//! the per-member assignment and criterion award tables. Status columns are
//! stored as lowercase strings; the enums here map to and from them.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Stored award status values (criterion and badge level).
pub const STATUS_AWARDED: &str = "awarded";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_REVOKED: &str = "revoked";
pub const STATUS_NONE: &str = "none";

/// All valid criterion award status strings.
pub const VALID_CRITERION_STATUSES: &[&str] =
    &[STATUS_AWARDED, STATUS_PENDING, STATUS_REVOKED];

/// All valid badge assignment status strings.
pub const VALID_ASSIGNMENT_STATUSES: &[&str] = &[STATUS_AWARDED, STATUS_REVOKED, STATUS_NONE];

/// Criterion id used for legacy free-text criteria that have no record.
pub const LEGACY_CRITERION_ID: DbId = 0;

/// Maximum length of a badge or criterion label.
pub const MAX_LABEL_LENGTH: usize = 200;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// A member's status for a single criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionStatus {
    Awarded,
    #[default]
    Pending,
    Revoked,
}

impl CriterionStatus {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATUS_AWARDED => Ok(Self::Awarded),
            STATUS_PENDING => Ok(Self::Pending),
            STATUS_REVOKED => Ok(Self::Revoked),
            _ => Err(format!(
                "Invalid criterion status '{s}'. Must be one of: {}",
                VALID_CRITERION_STATUSES.join(", ")
            )),
        }
    }

    /// Lenient conversion for stored rows: anything unrecognised is `Pending`.
    pub fn from_stored(s: &str) -> Self {
        Self::from_str_value(s.trim()).unwrap_or_default()
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Awarded => STATUS_AWARDED,
            Self::Pending => STATUS_PENDING,
            Self::Revoked => STATUS_REVOKED,
        }
    }
}

/// A member's badge-level assignment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Awarded,
    Revoked,
    #[default]
    None,
}

impl AssignmentStatus {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATUS_AWARDED => Ok(Self::Awarded),
            STATUS_REVOKED => Ok(Self::Revoked),
            STATUS_NONE => Ok(Self::None),
            _ => Err(format!(
                "Invalid assignment status '{s}'. Must be one of: {}",
                VALID_ASSIGNMENT_STATUSES.join(", ")
            )),
        }
    }

    /// Lenient conversion for stored rows: anything unrecognised is `None`.
    pub fn from_stored(s: &str) -> Self {
        Self::from_str_value(s.trim()).unwrap_or_default()
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Awarded => STATUS_AWARDED,
            Self::Revoked => STATUS_REVOKED,
            Self::None => STATUS_NONE,
        }
    }
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// A single qualifying condition within a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: DbId,
    pub badge_id: DbId,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub archived: bool,
}

impl Criterion {
    /// Whether this criterion takes part in live progress computation.
    pub fn is_live(&self) -> bool {
        !self.archived
    }
}

/// An awardable recognition and its ordered criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: DbId,
    pub label: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    /// Free-text criteria kept from before criteria had their own records.
    #[serde(default)]
    pub legacy_criteria: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub display_order: i32,
}

fn default_active() -> bool {
    true
}

/// Badge-level assignment for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberBadgeAward {
    pub member_id: DbId,
    pub badge_id: DbId,
    pub status: AssignmentStatus,
    pub awarded_at: Option<Timestamp>,
}

/// Criterion-level award for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCriterionAward {
    pub member_id: DbId,
    pub criterion_id: DbId,
    pub status: CriterionStatus,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split a stored free-text criteria block into labels, one per line.
///
/// Lines are trimmed and empty lines dropped.
pub fn parse_legacy_criteria(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Keep active badges, ordered by display order then id.
pub fn select_active_badges(badges: &[BadgeDefinition]) -> Vec<&BadgeDefinition> {
    let mut active: Vec<&BadgeDefinition> = badges.iter().filter(|b| b.active).collect();
    active.sort_by_key(|b| (b.display_order, b.id));
    active
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that a member id refers to a real member.
pub fn validate_member_id(member_id: DbId) -> Result<(), CoreError> {
    if member_id <= 0 {
        return Err(CoreError::Validation(format!(
            "member_id must be a positive integer, got {member_id}"
        )));
    }
    Ok(())
}

/// Validate a badge definition as entered by an administrator.
///
/// Checks the label, criterion labels, criterion ownership and that no
/// criterion id is used twice.
pub fn validate_badge_definition(badge: &BadgeDefinition) -> Result<(), CoreError> {
    validate_label("Badge label", &badge.label)?;

    let mut seen: Vec<DbId> = Vec::with_capacity(badge.criteria.len());
    for criterion in &badge.criteria {
        if criterion.id <= 0 {
            return Err(CoreError::Validation(format!(
                "Criterion id must be positive, got {}",
                criterion.id
            )));
        }
        if criterion.badge_id != badge.id {
            return Err(CoreError::Validation(format!(
                "Criterion {} belongs to badge {}, not {}",
                criterion.id, criterion.badge_id, badge.id
            )));
        }
        if seen.contains(&criterion.id) {
            return Err(CoreError::Validation(format!(
                "Duplicate criterion id {} in badge {}",
                criterion.id, badge.id
            )));
        }
        seen.push(criterion.id);
        validate_label("Criterion label", &criterion.label)?;
    }
    Ok(())
}

fn validate_label(what: &str, label: &str) -> Result<(), CoreError> {
    if label.trim().is_empty() {
        return Err(CoreError::Validation(format!("{what} must not be empty")));
    }
    if label.chars().count() > MAX_LABEL_LENGTH {
        return Err(CoreError::Validation(format!(
            "{what} exceeds maximum length of {MAX_LABEL_LENGTH}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
