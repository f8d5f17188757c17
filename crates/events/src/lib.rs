//! Domain events emitted by loot aggregates.

pub mod event;

pub use event::Event;
