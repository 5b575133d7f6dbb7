//! The controller a presentation layer drives.
//!
//! A [`Session`] exclusively owns the working set and the saved-calculation
//! collection. Every user action is a synchronous method call that runs to
//! completion; results the user should see go to the single notification
//! slot, destructive actions wait in [`ConfirmState`].

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::aggregate::Summary;
use crate::config::BudgetConfig;
use crate::confirm::{ConfirmState, PendingAction};
use crate::error::ErrorCode;
use crate::model::defaults::default_levels;
use crate::model::{
    CalculationId, InvalidLevel, Level, LevelEdit, LevelField, LevelId, NewLevel,
    SavedCalculation,
};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::store::port::validate_key;
use crate::store::{
    self, CalculationStore, FileStore, KeyValueStore, LoadReport, PersistError, SaveError,
};
use crate::working_set::WorkingSet;

pub const MSG_LOADED_RECENT: &str = "Loaded most recent calculation.";
pub const MSG_LEVEL_ADDED: &str = "KOL level added.";
pub const MSG_LEVEL_REMOVED: &str = "KOL level removed.";
pub const MSG_INVALID_LEVEL: &str = "Please fill in a valid name and count.";
pub const MSG_EMPTY_NAME: &str = "Please provide a name for the calculation.";
pub const MSG_WRITE_FAILED: &str = "Error: Could not save data.";

/// An action the session rejected. The session is unchanged and remains
/// usable; the user has already been notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidLevel(#[from] InvalidLevel),
    #[error(transparent)]
    Save(#[from] SaveError),
}

impl SessionError {
    #[must_use]
    pub const fn code(self) -> ErrorCode {
        match self {
            Self::InvalidLevel(_) => ErrorCode::InvalidLevel,
            Self::Save(err) => err.code(),
        }
    }
}

pub struct Session<S> {
    store: CalculationStore<S>,
    saved: Vec<SavedCalculation>,
    working: WorkingSet,
    confirm_state: ConfirmState,
    notifier: Notifier,
    startup: LoadReport,
}

impl Session<FileStore> {
    /// Open a file-backed session using `config`.
    ///
    /// # Errors
    ///
    /// Fails when no data directory can be determined or the configured key
    /// is not a valid storage key. Storage problems after that point never
    /// fail the session.
    pub fn open(config: &BudgetConfig) -> anyhow::Result<Self> {
        let dir = config
            .data_dir()
            .context("No data directory available; set KOLBUDGET_DATA_DIR")?;
        validate_key(&config.storage.key)
            .with_context(|| format!("Invalid storage key in config: {}", config.storage.key))?;

        let store = CalculationStore::new(FileStore::new(dir))
            .with_key(config.storage.key.clone())
            .with_capacity(config.store.capacity);
        Ok(Self::start_with(store, Notifier::new(config.notifications.duration())))
    }
}

impl<S: KeyValueStore> Session<S> {
    /// Start with the default notification duration.
    pub fn start(store: CalculationStore<S>) -> Self {
        Self::start_with(store, Notifier::default())
    }

    /// Load persisted calculations and pick the working set: the most recent
    /// snapshot if there is one, otherwise the default tiers.
    pub fn start_with(mut store: CalculationStore<S>, notifier: Notifier) -> Self {
        let (saved, startup) = store.open();
        let mut session = Self {
            store,
            saved,
            working: WorkingSet::default(),
            confirm_state: ConfirmState::Idle,
            notifier,
            startup,
        };

        let recent = store::list_by_recency(&session.saved)
            .first()
            .map(|entry| (entry.id().clone(), entry.levels().to_vec()));
        match recent {
            Some((id, levels)) => {
                tracing::info!(%id, levels = levels.len(), "restored most recent calculation");
                session.working.replace(levels);
                session.info(MSG_LOADED_RECENT);
            }
            None => {
                tracing::info!(source = ?session.startup.source, "seeding default levels");
                session.working.replace(default_levels());
            }
        }
        session
    }

    #[must_use]
    pub fn levels(&self) -> &[Level] {
        self.working.levels()
    }

    #[must_use]
    pub const fn working_set(&self) -> &WorkingSet {
        &self.working
    }

    /// Totals for the current working set, recomputed on every call.
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.working.summary()
    }

    /// Saved calculations in stored (insertion) order.
    #[must_use]
    pub fn saved(&self) -> &[SavedCalculation] {
        &self.saved
    }

    /// Saved calculations newest-first, for the load/delete list.
    #[must_use]
    pub fn saved_by_recency(&self) -> Vec<&SavedCalculation> {
        store::list_by_recency(&self.saved)
    }

    #[must_use]
    pub const fn startup_report(&self) -> &LoadReport {
        &self.startup
    }

    #[must_use]
    pub const fn notification(&self) -> Option<&Notification> {
        self.notifier.current()
    }

    #[must_use]
    pub const fn confirmation(&self) -> &ConfirmState {
        &self.confirm_state
    }

    /// Append a level from the "add" form.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidLevel`] for a blank name or zero count.
    pub fn add_level(&mut self, new: NewLevel) -> Result<LevelId, SessionError> {
        match self.working.add(new) {
            Ok(id) => {
                tracing::debug!(%id, "level added");
                self.info(MSG_LEVEL_ADDED);
                Ok(id)
            }
            Err(err) => {
                tracing::debug!(error = %err, "level rejected");
                self.info(MSG_INVALID_LEVEL);
                Err(err.into())
            }
        }
    }

    /// Apply a single-field edit. Unknown ids are ignored.
    pub fn update_level(&mut self, id: &LevelId, edit: &LevelEdit) -> bool {
        let applied = self.working.update(id, edit);
        if applied {
            tracing::debug!(%id, field = edit.field().as_str(), "level updated");
        }
        applied
    }

    /// Apply raw form text to one field, coercing numbers.
    pub fn update_level_input(&mut self, id: &LevelId, field: LevelField, raw: &str) -> bool {
        self.update_level(id, &LevelEdit::from_input(field, raw))
    }

    /// Ask to remove a level. Nothing is removed until [`confirm`](Self::confirm).
    pub fn request_remove_level(&mut self, id: &LevelId) -> Option<&PendingAction> {
        if !self.working.contains(id) {
            tracing::debug!(%id, "remove requested for unknown level");
            return None;
        }
        self.hold(PendingAction::RemoveLevel { id: id.clone() })
    }

    /// Ask to delete a saved calculation. Nothing is deleted until
    /// [`confirm`](Self::confirm).
    pub fn request_delete_calculation(&mut self, id: &CalculationId) -> Option<&PendingAction> {
        let Some(entry) = store::find(&self.saved, id) else {
            tracing::debug!(%id, "delete requested for unknown calculation");
            return None;
        };
        let action = PendingAction::DeleteCalculation {
            id: id.clone(),
            name: entry.name().to_string(),
        };
        self.hold(action)
    }

    fn hold(&mut self, action: PendingAction) -> Option<&PendingAction> {
        if let Some(replaced) = self.confirm_state.request(action) {
            tracing::debug!(?replaced, "pending action replaced");
        }
        self.confirm_state.pending()
    }

    /// Apply the pending action. Returns it, or `None` when nothing was
    /// pending.
    pub fn confirm(&mut self) -> Option<PendingAction> {
        let action = self.confirm_state.confirm()?;
        match &action {
            PendingAction::RemoveLevel { id } => {
                if self.working.remove(id).is_some() {
                    tracing::debug!(%id, "level removed");
                    self.info(MSG_LEVEL_REMOVED);
                }
            }
            PendingAction::DeleteCalculation { id, name } => {
                let applied = self.store.delete(&mut self.saved, id);
                if applied.value.is_some() {
                    self.info(format!("Calculation \"{name}\" deleted."));
                }
                self.report_write(applied.write_error.as_ref());
            }
        }
        Some(action)
    }

    /// Drop the pending action without applying it.
    pub fn cancel(&mut self) -> Option<PendingAction> {
        let action = self.confirm_state.cancel();
        if let Some(action) = &action {
            tracing::debug!(?action, "pending action cancelled");
        }
        action
    }

    /// Snapshot the working set under `name`.
    ///
    /// # Errors
    ///
    /// [`SessionError::Save`] when `name` is blank; nothing is stored.
    pub fn save(&mut self, name: &str) -> Result<CalculationId, SessionError> {
        match self.store.save(&mut self.saved, name, self.working.levels()) {
            Ok(applied) => {
                self.info(format!("Calculation \"{name}\" saved."));
                self.report_write(applied.write_error.as_ref());
                Ok(applied.value.id)
            }
            Err(err) => {
                self.info(MSG_EMPTY_NAME);
                Err(err.into())
            }
        }
    }

    /// Replace the working set with a copy of a saved calculation's levels.
    /// Returns `false` (and changes nothing) for an unknown id.
    pub fn load(&mut self, id: &CalculationId) -> bool {
        let Some(entry) = store::find(&self.saved, id) else {
            tracing::debug!(%id, "load requested for unknown calculation");
            return false;
        };
        let levels = entry.levels().to_vec();
        let message = format!("Calculation \"{}\" loaded.", entry.name());
        tracing::info!(%id, levels = levels.len(), "calculation loaded");
        self.working.replace(levels);
        self.info(message);
        true
    }

    /// Close the visible notification early.
    pub fn dismiss_notification(&mut self) -> Option<Notification> {
        self.notifier.dismiss()
    }

    /// Advance notification expiry to the store clock's current time.
    pub fn tick(&mut self) -> Option<Notification> {
        let now = self.now();
        self.notifier.tick(now)
    }

    fn now(&self) -> DateTime<Utc> {
        self.store.now()
    }

    fn info(&mut self, message: impl Into<String>) {
        let now = self.now();
        self.notifier.show(NotificationKind::Info, message, now);
    }

    fn report_write(&mut self, error: Option<&PersistError>) {
        if let Some(err) = error {
            tracing::warn!(code = %err.code(), error = %err, "saved calculations not persisted");
            let now = self.now();
            self.notifier.show(NotificationKind::Error, MSG_WRITE_FAILED, now);
        }
    }
}
