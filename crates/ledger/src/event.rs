use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use lootsplit_core::{AssignmentId, ItemId, RequestId, UserId};
use lootsplit_events::Event;

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u64,
    pub date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemQuantityMerged (a repeat drop folded into an existing item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuantityMerged {
    pub item_id: ItemId,
    pub added: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdated {
    pub item_id: ItemId,
    pub name: Option<String>,
    pub quantity: Option<u64>,
    pub date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestsToggled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestsToggled {
    pub enabled: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestAdded {
    pub request_id: RequestId,
    pub item_id: ItemId,
    pub member_name: String,
    pub quantity: u64,
    pub requester: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRemoved {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RequestDecremented. `remaining` is always > 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDecremented {
    pub request_id: RequestId,
    pub remaining: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LootAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootAssigned {
    pub assignment_id: AssignmentId,
    pub item_id: ItemId,
    pub assignee_name: String,
    pub quantity: u64,
    pub assigned_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AssignmentRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRemoved {
    pub assignment_id: AssignmentId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BoardCleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCleared {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LootEvent {
    ItemAdded(ItemAdded),
    ItemQuantityMerged(ItemQuantityMerged),
    ItemUpdated(ItemUpdated),
    ItemRemoved(ItemRemoved),
    RequestsToggled(RequestsToggled),
    RequestAdded(RequestAdded),
    RequestRemoved(RequestRemoved),
    RequestDecremented(RequestDecremented),
    LootAssigned(LootAssigned),
    AssignmentRemoved(AssignmentRemoved),
    BoardCleared(BoardCleared),
}

impl Event for LootEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LootEvent::ItemAdded(_) => "loot.item.added",
            LootEvent::ItemQuantityMerged(_) => "loot.item.quantity_merged",
            LootEvent::ItemUpdated(_) => "loot.item.updated",
            LootEvent::ItemRemoved(_) => "loot.item.removed",
            LootEvent::RequestsToggled(_) => "loot.settings.requests_toggled",
            LootEvent::RequestAdded(_) => "loot.request.added",
            LootEvent::RequestRemoved(_) => "loot.request.removed",
            LootEvent::RequestDecremented(_) => "loot.request.decremented",
            LootEvent::LootAssigned(_) => "loot.assignment.added",
            LootEvent::AssignmentRemoved(_) => "loot.assignment.removed",
            LootEvent::BoardCleared(_) => "loot.board.cleared",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LootEvent::ItemAdded(e) => e.occurred_at,
            LootEvent::ItemQuantityMerged(e) => e.occurred_at,
            LootEvent::ItemUpdated(e) => e.occurred_at,
            LootEvent::ItemRemoved(e) => e.occurred_at,
            LootEvent::RequestsToggled(e) => e.occurred_at,
            LootEvent::RequestAdded(e) => e.occurred_at,
            LootEvent::RequestRemoved(e) => e.occurred_at,
            LootEvent::RequestDecremented(e) => e.occurred_at,
            LootEvent::LootAssigned(e) => e.occurred_at,
            LootEvent::AssignmentRemoved(e) => e.occurred_at,
            LootEvent::BoardCleared(e) => e.occurred_at,
        }
    }
}
