//! Folding a level sequence into campaign-wide budget totals.

use serde::Serialize;

use crate::model::level::{Level, Span, profit_span};

/// Campaign-wide totals derived from the working set.
///
/// `profit` pairs the pessimistic and optimistic ends:
/// `[selling.min - cost.max, selling.max - cost.min]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_kols: u64,
    pub cost: Span<u64>,
    pub selling: Span<u64>,
    pub profit: Span<i64>,
}

impl Summary {
    /// True when the low end of the profit range is below zero.
    #[must_use]
    pub const fn is_loss_possible(&self) -> bool {
        self.profit.min < 0
    }
}

/// Aggregate `levels` into a [`Summary`]. Pure; an empty slice yields all
/// zeros.
#[must_use]
pub fn summarize(levels: &[Level]) -> Summary {
    let (total_kols, cost, selling) = levels.iter().fold(
        (0_u64, Span::<u64>::default(), Span::<u64>::default()),
        |(kols, cost, selling), level| {
            let level_cost = level.cost_total();
            let level_selling = level.selling_total();
            (
                kols.saturating_add(level.count),
                Span::new(
                    cost.min.saturating_add(level_cost.min),
                    cost.max.saturating_add(level_cost.max),
                ),
                Span::new(
                    selling.min.saturating_add(level_selling.min),
                    selling.max.saturating_add(level_selling.max),
                ),
            )
        },
    );

    Summary {
        total_kols,
        cost,
        selling,
        profit: profit_span(cost, selling),
    }
}
