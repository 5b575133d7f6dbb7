//! The ordered, editable collection of levels a user is currently planning.
//!
//! Row order is insertion order and is what the presentation layer shows.

use crate::aggregate::{Summary, summarize};
use crate::model::{InvalidLevel, Level, LevelEdit, LevelId, NewLevel};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkingSet {
    levels: Vec<Level>,
}

impl WorkingSet {
    #[must_use]
    pub const fn new(levels: Vec<Level>) -> Self {
        Self { levels }
    }

    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &LevelId) -> Option<&Level> {
        self.levels.iter().find(|level| &level.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &LevelId) -> bool {
        self.get(id).is_some()
    }

    /// Append a validated level under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLevel`] without touching the set when the name is
    /// blank or the count is zero.
    pub fn add(&mut self, new: NewLevel) -> Result<LevelId, InvalidLevel> {
        new.validate()?;
        let level = Level::from_new(new);
        let id = level.id.clone();
        self.levels.push(level);
        Ok(id)
    }

    /// Replace one field of the level with `id`. Returns `false` (and changes
    /// nothing) when no level has that id.
    pub fn update(&mut self, id: &LevelId, edit: &LevelEdit) -> bool {
        match self.levels.iter_mut().find(|level| &level.id == id) {
            Some(slot) => {
                *slot = slot.edited(edit);
                true
            }
            None => false,
        }
    }

    /// Remove the level with `id`, returning it. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &LevelId) -> Option<Level> {
        let index = self.levels.iter().position(|level| &level.id == id)?;
        Some(self.levels.remove(index))
    }

    /// Swap in a whole new sequence (used when loading a snapshot).
    pub fn replace(&mut self, levels: Vec<Level>) {
        self.levels = levels;
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        summarize(&self.levels)
    }
}
