use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use lootsplit_core::{AssignmentId, ItemId, RequestId, UserId};

/// Command: AddItem. Merges into an existing item with the same date and name
/// (case-insensitive) instead of creating a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u64,
    pub date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateItem. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItem {
    pub item_id: ItemId,
    pub name: Option<String>,
    pub quantity: Option<u64>,
    pub date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveItem (drops its requests and assignments too).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveItem {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetRequestsEnabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRequestsEnabled {
    pub enabled: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddRequest. Always creates a new request, even for a repeat requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRequest {
    pub request_id: RequestId,
    pub item_id: ItemId,
    pub member_name: String,
    pub quantity: u64,
    pub requester: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveRequest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveRequest {
    pub request_id: RequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DecrementRequest. A request decremented to zero is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecrementRequest {
    pub request_id: RequestId,
    pub by: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignLoot. Records an assignment and takes the units off the item's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignLoot {
    pub assignment_id: AssignmentId,
    pub item_id: ItemId,
    pub assignee_name: String,
    pub quantity: u64,
    pub assigned_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveAssignment. Stock is not restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveAssignment {
    pub assignment_id: AssignmentId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ClearAll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearAll {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LootCommand {
    AddItem(AddItem),
    UpdateItem(UpdateItem),
    RemoveItem(RemoveItem),
    SetRequestsEnabled(SetRequestsEnabled),
    AddRequest(AddRequest),
    RemoveRequest(RemoveRequest),
    DecrementRequest(DecrementRequest),
    AssignLoot(AssignLoot),
    RemoveAssignment(RemoveAssignment),
    ClearAll(ClearAll),
}

impl LootCommand {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            LootCommand::AddItem(_) => "add_item",
            LootCommand::UpdateItem(_) => "update_item",
            LootCommand::RemoveItem(_) => "remove_item",
            LootCommand::SetRequestsEnabled(_) => "set_requests_enabled",
            LootCommand::AddRequest(_) => "add_request",
            LootCommand::RemoveRequest(_) => "remove_request",
            LootCommand::DecrementRequest(_) => "decrement_request",
            LootCommand::AssignLoot(_) => "assign_loot",
            LootCommand::RemoveAssignment(_) => "remove_assignment",
            LootCommand::ClearAll(_) => "clear_all",
        }
    }
}
