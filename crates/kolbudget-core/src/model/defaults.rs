use super::level::{Level, NewLevel, Span};

/// The three starter tiers shown to a first-time user, one KOL each.
#[must_use]
pub fn default_new_levels() -> Vec<NewLevel> {
    vec![
        NewLevel::new(
            "KOC (<10k followers)",
            1,
            Span::new(800, 1500),
            Span::new(1600, 3000),
        ),
        NewLevel::new(
            "Micro (10-50K followers)",
            1,
            Span::new(2000, 11_000),
            Span::new(4000, 22_000),
        ),
        NewLevel::new(
            "Macro (100K-500K followers)",
            1,
            Span::new(31_000, 86_000),
            Span::new(62_000, 172_000),
        ),
    ]
}

/// Default tiers materialized with fresh ids.
#[must_use]
pub fn default_levels() -> Vec<Level> {
    default_new_levels().into_iter().map(Level::from_new).collect()
}
