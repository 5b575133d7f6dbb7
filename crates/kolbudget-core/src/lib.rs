//! kolbudget-core library.
//!
//! Budget planning for KOL (influencer) campaigns: tiers of KOLs with cost and
//! selling ranges, campaign-wide totals, and a bounded list of named
//! snapshots persisted through a key-value port.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per concern, each mapped to a stable
//!   [`error::ErrorCode`]; `anyhow::Result` only at configuration boundaries.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`). The library
//!   never installs a subscriber.

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod confirm;
pub mod display;
pub mod error;
pub mod model;
pub mod notify;
pub mod session;
pub mod store;
pub mod working_set;

pub use aggregate::{Summary, summarize};
pub use session::{Session, SessionError};
