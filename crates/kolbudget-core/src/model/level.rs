use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::coerce::{deserialize_amount, parse_amount};

/// Opaque identifier of a KOL level. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(String);

impl LevelId {
    /// Mint a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LevelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive `[min, max]` pair.
///
/// No ordering between the bounds is enforced; `min <= max` is the intended
/// usage but a user is free to type them the other way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T> Span<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

/// One tier of KOLs sharing a headcount and per-unit cost/selling ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub id: LevelId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub count: u64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub cost_min: u64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub cost_max: u64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub selling_min: u64,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub selling_max: u64,
}

impl Level {
    /// Materialize a [`NewLevel`] under a freshly generated id.
    #[must_use]
    pub fn from_new(new: NewLevel) -> Self {
        Self::with_id(LevelId::generate(), new)
    }

    #[must_use]
    pub fn with_id(id: LevelId, new: NewLevel) -> Self {
        Self {
            id,
            name: new.name,
            count: new.count,
            cost_min: new.cost_min,
            cost_max: new.cost_max,
            selling_min: new.selling_min,
            selling_max: new.selling_max,
        }
    }

    /// Return a copy with exactly one field replaced.
    #[must_use]
    pub fn edited(&self, edit: &LevelEdit) -> Self {
        let mut next = self.clone();
        match edit {
            LevelEdit::Name(name) => next.name.clone_from(name),
            LevelEdit::Count(v) => next.count = *v,
            LevelEdit::CostMin(v) => next.cost_min = *v,
            LevelEdit::CostMax(v) => next.cost_max = *v,
            LevelEdit::SellingMin(v) => next.selling_min = *v,
            LevelEdit::SellingMax(v) => next.selling_max = *v,
        }
        next
    }

    /// `[count * costMin, count * costMax]`
    #[must_use]
    pub const fn cost_total(&self) -> Span<u64> {
        Span::new(
            self.count.saturating_mul(self.cost_min),
            self.count.saturating_mul(self.cost_max),
        )
    }

    /// `[count * sellingMin, count * sellingMax]`
    #[must_use]
    pub const fn selling_total(&self) -> Span<u64> {
        Span::new(
            self.count.saturating_mul(self.selling_min),
            self.count.saturating_mul(self.selling_max),
        )
    }

    /// Widest plausible profit spread: lowest selling against highest cost,
    /// and highest selling against lowest cost.
    #[must_use]
    pub fn profit_total(&self) -> Span<i64> {
        profit_span(self.cost_total(), self.selling_total())
    }

    #[must_use]
    pub fn totals(&self) -> LevelTotals {
        let cost = self.cost_total();
        let selling = self.selling_total();
        LevelTotals {
            cost,
            selling,
            profit: profit_span(cost, selling),
        }
    }
}

/// Derived per-level totals. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelTotals {
    pub cost: Span<u64>,
    pub selling: Span<u64>,
    pub profit: Span<i64>,
}

pub(crate) fn profit_span(cost: Span<u64>, selling: Span<u64>) -> Span<i64> {
    Span::new(
        signed_difference(selling.min, cost.max),
        signed_difference(selling.max, cost.min),
    )
}

/// `a - b` as a signed value, clamped to the `i64` range.
pub(crate) fn signed_difference(a: u64, b: u64) -> i64 {
    let diff = i128::from(a) - i128::from(b);
    i64::try_from(diff).unwrap_or(if diff.is_negative() { i64::MIN } else { i64::MAX })
}

/// A level as entered in the "add" form, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewLevel {
    pub name: String,
    pub count: u64,
    pub cost_min: u64,
    pub cost_max: u64,
    pub selling_min: u64,
    pub selling_max: u64,
}

impl NewLevel {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        count: u64,
        cost: Span<u64>,
        selling: Span<u64>,
    ) -> Self {
        Self {
            name: name.into(),
            count,
            cost_min: cost.min,
            cost_max: cost.max,
            selling_min: selling.min,
            selling_max: selling.max,
        }
    }

    /// A new level needs a non-blank name and at least one KOL.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLevel`] naming the first rule that failed.
    pub fn validate(&self) -> Result<(), InvalidLevel> {
        if self.name.trim().is_empty() {
            return Err(InvalidLevel::BlankName);
        }
        if self.count == 0 {
            return Err(InvalidLevel::ZeroCount);
        }
        Ok(())
    }
}

/// Reason a [`NewLevel`] was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidLevel {
    #[error("level name must not be blank")]
    BlankName,
    #[error("level count must be at least 1")]
    ZeroCount,
}

/// Editable fields of a [`Level`], named as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelField {
    Name,
    Count,
    CostMin,
    CostMax,
    SellingMin,
    SellingMax,
}

impl LevelField {
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::Count,
        Self::CostMin,
        Self::CostMax,
        Self::SellingMin,
        Self::SellingMax,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Count => "count",
            Self::CostMin => "costMin",
            Self::CostMax => "costMax",
            Self::SellingMin => "sellingMin",
            Self::SellingMax => "sellingMax",
        }
    }
}

impl fmt::Display for LevelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown field name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for LevelField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// A single-field update to a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelEdit {
    Name(String),
    Count(u64),
    CostMin(u64),
    CostMax(u64),
    SellingMin(u64),
    SellingMax(u64),
}

impl LevelEdit {
    /// Build an edit from raw form text. Numeric fields never fail; text that
    /// does not start with digits becomes `0`.
    #[must_use]
    pub fn from_input(field: LevelField, raw: &str) -> Self {
        match field {
            LevelField::Name => Self::Name(raw.to_string()),
            LevelField::Count => Self::Count(parse_amount(raw)),
            LevelField::CostMin => Self::CostMin(parse_amount(raw)),
            LevelField::CostMax => Self::CostMax(parse_amount(raw)),
            LevelField::SellingMin => Self::SellingMin(parse_amount(raw)),
            LevelField::SellingMax => Self::SellingMax(parse_amount(raw)),
        }
    }

    #[must_use]
    pub const fn field(&self) -> LevelField {
        match self {
            Self::Name(_) => LevelField::Name,
            Self::Count(_) => LevelField::Count,
            Self::CostMin(_) => LevelField::CostMin,
            Self::CostMax(_) => LevelField::CostMax,
            Self::SellingMin(_) => LevelField::SellingMin,
            Self::SellingMax(_) => LevelField::SellingMax,
        }
    }
}
