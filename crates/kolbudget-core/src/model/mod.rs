//! Persisted entities: KOL levels and saved calculations.

pub mod calculation;
pub mod coerce;
pub mod defaults;
pub mod level;

pub use calculation::{CalculationId, SavedCalculation};
pub use level::{InvalidLevel, Level, LevelEdit, LevelField, LevelId, LevelTotals, NewLevel, Span};
