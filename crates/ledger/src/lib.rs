//! Loot board domain module (event-sourced).
//!
//! Tracks a guild's dropped items, member requests and recorded assignments as
//! deterministic domain logic (no IO, no storage, no realtime delivery). Allocation
//! suggestions come from `lootsplit-allocation` and are never applied on their own.

pub mod board;
pub mod command;
pub mod event;

pub use board::{Assignment, BoardItem, BoardRequest, ItemProgress, LootBoard};
pub use command::{
    AddItem, AddRequest, AssignLoot, ClearAll, DecrementRequest, LootCommand, RemoveAssignment,
    RemoveItem, RemoveRequest, SetRequestsEnabled, UpdateItem,
};
pub use event::{
    AssignmentRemoved, BoardCleared, ItemAdded, ItemQuantityMerged, ItemRemoved, ItemUpdated,
    LootAssigned, LootEvent, RequestAdded, RequestDecremented, RequestRemoved, RequestsToggled,
};
