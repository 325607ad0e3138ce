//! Per-state badge counts for the member summary view.

use serde::Serialize;

use crate::badges::progress::{BadgeProgress, BadgeState};

/// Summary of badge states across a member's catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BadgeSummary {
    pub total: usize,
    pub complete: usize,
    pub in_progress: usize,
    pub revoked: usize,
    pub locked: usize,
}

impl BadgeSummary {
    /// Build a summary from explicit counts.
    ///
    /// `locked` is whatever remains of `total`, never negative.
    pub fn from_counts(total: usize, complete: usize, in_progress: usize, revoked: usize) -> Self {
        let locked = total
            .saturating_sub(complete)
            .saturating_sub(in_progress)
            .saturating_sub(revoked);
        Self {
            total,
            complete,
            in_progress,
            revoked,
            locked,
        }
    }
}

/// Count resolved badges per state.
pub fn summarize_badges(progress: &[BadgeProgress]) -> BadgeSummary {
    let count = |state: BadgeState| progress.iter().filter(|p| p.state == state).count();
    BadgeSummary::from_counts(
        progress.len(),
        count(BadgeState::Complete),
        count(BadgeState::InProgress),
        count(BadgeState::Revoked),
    )
}
