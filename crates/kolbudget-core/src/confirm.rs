//! Destructive actions held until the user confirms or cancels.
//!
//! ```text
//!            request            confirm / cancel
//!   Idle ───────────────▶ Pending ─────────────────▶ Idle
//!                          │  ▲
//!                          └──┘ request (replaces)
//! ```

use crate::model::{CalculationId, LevelId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    RemoveLevel { id: LevelId },
    DeleteCalculation { id: CalculationId, name: String },
}

impl PendingAction {
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::RemoveLevel { .. } => "Delete Level",
            Self::DeleteCalculation { .. } => "Delete Saved Calculation",
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::RemoveLevel { .. } => {
                "Are you sure you want to delete this KOL level? This action cannot be undone."
                    .to_string()
            }
            Self::DeleteCalculation { name, .. } => {
                format!("Are you sure you want to delete \"{name}\"? This is permanent.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfirmState {
    #[default]
    Idle,
    Pending(PendingAction),
}

impl ConfirmState {
    /// Hold `action` for confirmation, returning any action it displaced.
    pub fn request(&mut self, action: PendingAction) -> Option<PendingAction> {
        match std::mem::replace(self, Self::Pending(action)) {
            Self::Idle => None,
            Self::Pending(previous) => Some(previous),
        }
    }

    /// Leave the pending state, handing back the action to apply.
    pub fn confirm(&mut self) -> Option<PendingAction> {
        self.take()
    }

    /// Leave the pending state, discarding the action.
    pub fn cancel(&mut self) -> Option<PendingAction> {
        self.take()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&PendingAction> {
        match self {
            Self::Idle => None,
            Self::Pending(action) => Some(action),
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    fn take(&mut self) -> Option<PendingAction> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Pending(action) => Some(action),
        }
    }
}
