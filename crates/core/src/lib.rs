//! `lootsplit-core` — domain building blocks shared by the loot crates.
//!
//! This crate contains **pure domain** primitives (no IO, no storage).

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::{DomainError, DomainResult};
pub use id::{AssignmentId, BoardId, ItemId, RequestId, UserId};
