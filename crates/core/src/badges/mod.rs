//! Member badges: definitions, progress resolution and widget payloads.
//!
//! Everything here is pure. Badge definitions and the member's awards are
//! pre-loaded by the caller; the resolver derives per-badge state fresh on
//! every call.

pub mod model;
pub mod progress;
pub mod summary;
pub mod widget;

pub use model::{
    AssignmentStatus, BadgeDefinition, Criterion, CriterionStatus, MemberBadgeAward,
    MemberCriterionAward,
};
pub use progress::{
    compute_progress_pct, resolve_badge_progress, resolve_member_badges, BadgeProgress,
    BadgeState, CriterionProgress, MemberAwardSnapshot,
};
pub use summary::{summarize_badges, BadgeSummary};
pub use widget::{BadgeCard, BadgeDisplayConfig, BadgeWidgetPayload};
