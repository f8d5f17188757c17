use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lootsplit_core::{ItemId, RequestId};

/// Point-in-time view of an item, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: String,
    /// Units on hand at the moment of computation.
    pub quantity: u64,
    pub created_at: DateTime<Utc>,
}

/// Point-in-time view of a single request.
///
/// Requests are never merged: two requests by the same member for the same item
/// are two demand events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub id: RequestId,
    pub item_id: ItemId,
    pub member_name: String,
    /// Requested units. Values <= 0 count as no demand.
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl RequestSnapshot {
    /// Demand contributed by this request (negative quantities clamp to zero).
    pub fn demand(&self) -> u64 {
        u64::try_from(self.quantity).unwrap_or(0)
    }
}
