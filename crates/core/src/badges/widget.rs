//! Badge widget payload builders.
//!
//! Turns resolved [`BadgeProgress`] into the JSON configuration read by the
//! client-side badge widget. Labels come from an explicit
//! [`BadgeDisplayConfig`] supplied by the host; this module never escapes or
//! renders markup.

use serde::{Deserialize, Serialize};

use crate::badges::model::CriterionStatus;
use crate::badges::progress::{BadgeProgress, BadgeState};
use crate::badges::summary::{summarize_badges, BadgeSummary};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Display label for each badge state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateLabels {
    pub locked: String,
    pub in_progress: String,
    pub complete: String,
    pub revoked: String,
}

impl Default for StateLabels {
    fn default() -> Self {
        Self {
            locked: "Verrouillé".to_string(),
            in_progress: "En cours".to_string(),
            complete: "Obtenu".to_string(),
            revoked: "À refaire".to_string(),
        }
    }
}

/// Display label for each criterion status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriterionLabels {
    pub awarded: String,
    pub pending: String,
    pub revoked: String,
}

impl Default for CriterionLabels {
    fn default() -> Self {
        Self {
            awarded: "Validé".to_string(),
            pending: "En attente".to_string(),
            revoked: "Retiré".to_string(),
        }
    }
}

/// Singular and plural form of a counted noun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Noun {
    pub singular: String,
    pub plural: String,
}

impl Noun {
    fn new(singular: &str, plural: &str) -> Self {
        Self {
            singular: singular.to_string(),
            plural: plural.to_string(),
        }
    }

    /// Pick the form for `n`. Zero and one take the singular.
    pub fn for_count(&self, n: usize) -> &str {
        if n <= 1 {
            &self.singular
        } else {
            &self.plural
        }
    }
}

/// Labels used by the badge widget.
///
/// Missing keys in a JSON document fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeDisplayConfig {
    pub states: StateLabels,
    pub criteria: CriterionLabels,
    pub criterion_noun: Noun,
    pub badge_noun: Noun,
    /// Shown instead of the widget when no member is logged in.
    pub login_notice: String,
}

impl Default for BadgeDisplayConfig {
    fn default() -> Self {
        Self {
            states: StateLabels::default(),
            criteria: CriterionLabels::default(),
            criterion_noun: Noun::new("critère", "critères"),
            badge_noun: Noun::new("badge", "badges"),
            login_notice: "Connectez-vous pour consulter vos badges.".to_string(),
        }
    }
}

impl BadgeDisplayConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid badge display config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations with empty labels.
    pub fn validate(&self) -> Result<(), CoreError> {
        let labels = [
            ("states.locked", &self.states.locked),
            ("states.in_progress", &self.states.in_progress),
            ("states.complete", &self.states.complete),
            ("states.revoked", &self.states.revoked),
            ("criteria.awarded", &self.criteria.awarded),
            ("criteria.pending", &self.criteria.pending),
            ("criteria.revoked", &self.criteria.revoked),
            ("criterion_noun.singular", &self.criterion_noun.singular),
            ("criterion_noun.plural", &self.criterion_noun.plural),
            ("badge_noun.singular", &self.badge_noun.singular),
            ("badge_noun.plural", &self.badge_noun.plural),
            ("login_notice", &self.login_notice),
        ];
        for (key, value) in labels {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "Badge display label '{key}' must not be empty"
                )));
            }
        }
        Ok(())
    }

    pub fn state_label(&self, state: BadgeState) -> &str {
        match state {
            BadgeState::Locked => &self.states.locked,
            BadgeState::InProgress => &self.states.in_progress,
            BadgeState::Complete => &self.states.complete,
            BadgeState::Revoked => &self.states.revoked,
        }
    }

    pub fn criterion_label(&self, status: CriterionStatus) -> &str {
        match status {
            CriterionStatus::Awarded => &self.criteria.awarded,
            CriterionStatus::Pending => &self.criteria.pending,
            CriterionStatus::Revoked => &self.criteria.revoked,
        }
    }
}

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// One criterion row on a badge card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionCard {
    pub criterion_id: DbId,
    pub label: String,
    pub description: String,
    pub status: CriterionStatus,
    pub status_label: String,
}

/// One badge as shown by the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeCard {
    pub badge_id: DbId,
    pub label: String,
    pub summary: String,
    pub description: String,
    pub state: BadgeState,
    pub state_label: String,
    pub progress_pct: u8,
    pub awarded_count: usize,
    pub total_criteria: usize,
    pub count_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awarded_at: Option<Timestamp>,
    pub criteria: Vec<CriterionCard>,
}

/// A labelled count in the summary strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub state: BadgeState,
    pub count: usize,
    pub label: String,
}

/// Summary strip shown above the cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub counts: BadgeSummary,
    pub total_label: String,
    pub entries: Vec<SummaryEntry>,
}

/// Full configuration object embedded in the page for the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeWidgetPayload {
    pub member_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub summary: SummaryView,
    pub badges: Vec<BadgeCard>,
}

impl BadgeWidgetPayload {
    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        serde_json::to_value(self)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize badge widget: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Format a count with its noun, e.g. `"3 badges"`.
pub fn format_count(n: usize, noun: &Noun) -> String {
    format!("{n} {}", noun.for_count(n))
}

/// Build the card for one resolved badge.
pub fn build_badge_card(progress: &BadgeProgress, config: &BadgeDisplayConfig) -> BadgeCard {
    let count_label = format!(
        "{} / {} {}",
        progress.awarded_count,
        progress.total_criteria,
        config.criterion_noun.for_count(progress.total_criteria)
    );

    BadgeCard {
        badge_id: progress.badge_id,
        label: progress.label.clone(),
        summary: progress.summary.clone(),
        description: progress.description.clone(),
        state: progress.state,
        state_label: config.state_label(progress.state).to_string(),
        progress_pct: progress.progress_pct.min(100),
        awarded_count: progress.awarded_count,
        total_criteria: progress.total_criteria,
        count_label,
        awarded_at: progress.awarded_at,
        criteria: progress
            .criteria
            .iter()
            .map(|c| CriterionCard {
                criterion_id: c.criterion_id,
                label: c.label.clone(),
                description: c.description.clone(),
                status: c.status,
                status_label: config.criterion_label(c.status).to_string(),
            })
            .collect(),
    }
}

/// Build the summary strip from a roll-up.
pub fn build_summary_view(summary: BadgeSummary, config: &BadgeDisplayConfig) -> SummaryView {
    let entries = [
        (BadgeState::Complete, summary.complete),
        (BadgeState::InProgress, summary.in_progress),
        (BadgeState::Revoked, summary.revoked),
        (BadgeState::Locked, summary.locked),
    ]
    .into_iter()
    .map(|(state, count)| SummaryEntry {
        state,
        count,
        label: config.state_label(state).to_string(),
    })
    .collect();

    SummaryView {
        counts: summary,
        total_label: format_count(summary.total, &config.badge_noun),
        entries,
    }
}

/// Build the widget payload for a logged-in member.
pub fn build_widget_payload(
    member_id: DbId,
    progress: &[BadgeProgress],
    config: &BadgeDisplayConfig,
) -> BadgeWidgetPayload {
    BadgeWidgetPayload {
        member_id: Some(member_id),
        notice: None,
        summary: build_summary_view(summarize_badges(progress), config),
        badges: progress
            .iter()
            .map(|p| build_badge_card(p, config))
            .collect(),
    }
}

/// Build the payload shown when nobody is logged in.
pub fn build_anonymous_payload(config: &BadgeDisplayConfig) -> BadgeWidgetPayload {
    BadgeWidgetPayload {
        member_id: None,
        notice: Some(config.login_notice.clone()),
        summary: build_summary_view(BadgeSummary::default(), config),
        badges: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
