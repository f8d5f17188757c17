use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use lootsplit_allocation::{
    ItemSnapshot, MemberTotals, RequestSnapshot, Split, compute_split, summarize_by_member,
};
use lootsplit_core::{
    Aggregate, AggregateRoot, AssignmentId, BoardId, DomainError, DomainResult, ItemId, RequestId, UserId,
};
use lootsplit_events::Event;

use crate::command::{
    AddItem, AddRequest, AssignLoot, ClearAll, DecrementRequest, LootCommand, RemoveAssignment,
    RemoveItem, RemoveRequest, SetRequestsEnabled, UpdateItem,
};
use crate::event::{
    AssignmentRemoved, BoardCleared, ItemAdded, ItemQuantityMerged, ItemRemoved, ItemUpdated,
    LootAssigned, LootEvent, RequestAdded, RequestDecremented, RequestRemoved, RequestsToggled,
};

/// An item on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardItem {
    pub id: ItemId,
    pub name: String,
    /// Units on hand (not yet assigned).
    pub quantity: u64,
    /// Day the item dropped.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// A member's request for units of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRequest {
    pub id: RequestId,
    pub item_id: ItemId,
    pub member_name: String,
    pub quantity: u64,
    pub requester: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Units recorded as handed to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub item_id: ItemId,
    pub assignee_name: String,
    pub quantity: u64,
    pub assigned_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Stock vs. recorded assignments vs. outstanding requests for one item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProgress {
    pub on_hand: u64,
    pub assigned: u64,
    pub requested: u64,
}

/// Aggregate root: LootBoard.
///
/// One board per guild. Items, requests and assignments are kept in the order
/// their events were applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootBoard {
    id: BoardId,
    items: Vec<BoardItem>,
    requests: Vec<BoardRequest>,
    assignments: Vec<Assignment>,
    requests_enabled: bool,
    version: u64,
}

impl LootBoard {
    /// Create an empty board (requests enabled) for rehydration.
    pub fn empty(id: BoardId) -> Self {
        Self {
            id,
            items: Vec::new(),
            requests: Vec::new(),
            assignments: Vec::new(),
            requests_enabled: true,
            version: 0,
        }
    }

    pub fn requests_enabled(&self) -> bool {
        self.requests_enabled
    }

    pub fn board_items(&self) -> &[BoardItem] {
        &self.items
    }

    pub fn board_requests(&self) -> &[BoardRequest] {
        &self.requests
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn item(&self, item_id: ItemId) -> Option<&BoardItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn request(&self, request_id: RequestId) -> Option<&BoardRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }

    /// Items as allocation input.
    pub fn items(&self) -> Vec<ItemSnapshot> {
        self.items
            .iter()
            .map(|i| ItemSnapshot {
                id: i.id,
                name: i.name.clone(),
                quantity: i.quantity,
                created_at: i.created_at,
            })
            .collect()
    }

    /// Requests as allocation input.
    pub fn requests(&self) -> Vec<RequestSnapshot> {
        self.requests
            .iter()
            .map(|r| RequestSnapshot {
                id: r.id,
                item_id: r.item_id,
                member_name: r.member_name.clone(),
                quantity: i64::try_from(r.quantity).unwrap_or(i64::MAX),
                created_at: r.created_at,
            })
            .collect()
    }

    /// Round-robin suggestion over current stock and requests.
    pub fn suggested_split(&self) -> Split {
        compute_split(&self.items(), &self.requests())
    }

    /// Suggested units per member across the whole board.
    pub fn suggested_totals(&self) -> MemberTotals {
        summarize_by_member(&self.items(), &self.requests())
    }

    pub fn item_progress(&self, item_id: ItemId) -> Option<ItemProgress> {
        let item = self.item(item_id)?;
        let assigned = self
            .assignments
            .iter()
            .filter(|a| a.item_id == item_id)
            .map(|a| a.quantity)
            .sum();
        let requested = self
            .requests
            .iter()
            .filter(|r| r.item_id == item_id)
            .map(|r| r.quantity)
            .sum();
        Some(ItemProgress {
            on_hand: item.quantity,
            assigned,
            requested,
        })
    }

    /// Recorded units per assignee, by name.
    pub fn assignment_totals(&self) -> BTreeMap<String, u64> {
        let mut totals = BTreeMap::new();
        for a in &self.assignments {
            *totals.entry(a.assignee_name.clone()).or_insert(0) += a.quantity;
        }
        totals
    }

    /// Newest assignments first. Ties go to the one recorded last.
    pub fn recent_assignments(&self, limit: usize) -> Vec<&Assignment> {
        let mut recent: Vec<&Assignment> = self.assignments.iter().rev().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        recent
    }

    /// Newest requests first. Ties go to the one recorded last.
    pub fn recent_requests(&self, limit: usize) -> Vec<&BoardRequest> {
        newest_first(self.requests.iter(), limit)
    }

    /// One member's requests, newest first.
    pub fn member_requests(&self, member_name: &str, limit: usize) -> Vec<&BoardRequest> {
        newest_first(
            self.requests.iter().filter(|r| r.member_name == member_name),
            limit,
        )
    }
}

fn newest_first<'a>(
    requests: impl DoubleEndedIterator<Item = &'a BoardRequest>,
    limit: usize,
) -> Vec<&'a BoardRequest> {
    let mut recent: Vec<&BoardRequest> = requests.rev().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(limit);
    recent
}

impl AggregateRoot for LootBoard {
    type Id = BoardId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for LootBoard {
    type Command = LootCommand;
    type Event = LootEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LootEvent::ItemAdded(e) => {
                self.items.push(BoardItem {
                    id: e.item_id,
                    name: e.name.clone(),
                    quantity: e.quantity,
                    date: e.date,
                    created_at: e.occurred_at,
                });
            }
            LootEvent::ItemQuantityMerged(e) => {
                if let Some(item) = self.item_mut(e.item_id) {
                    item.quantity = item.quantity.saturating_add(e.added);
                }
            }
            LootEvent::ItemUpdated(e) => {
                if let Some(item) = self.item_mut(e.item_id) {
                    if let Some(name) = &e.name {
                        item.name = name.clone();
                    }
                    if let Some(quantity) = e.quantity {
                        item.quantity = quantity;
                    }
                    if let Some(date) = e.date {
                        item.date = date;
                    }
                }
            }
            LootEvent::ItemRemoved(e) => {
                self.items.retain(|i| i.id != e.item_id);
                self.requests.retain(|r| r.item_id != e.item_id);
                self.assignments.retain(|a| a.item_id != e.item_id);
            }
            LootEvent::RequestsToggled(e) => {
                self.requests_enabled = e.enabled;
            }
            LootEvent::RequestAdded(e) => {
                self.requests.push(BoardRequest {
                    id: e.request_id,
                    item_id: e.item_id,
                    member_name: e.member_name.clone(),
                    quantity: e.quantity,
                    requester: e.requester,
                    created_at: e.occurred_at,
                });
            }
            LootEvent::RequestRemoved(e) => {
                self.requests.retain(|r| r.id != e.request_id);
            }
            LootEvent::RequestDecremented(e) => {
                if let Some(request) = self.requests.iter_mut().find(|r| r.id == e.request_id) {
                    request.quantity = e.remaining;
                }
            }
            LootEvent::LootAssigned(e) => {
                self.assignments.push(Assignment {
                    id: e.assignment_id,
                    item_id: e.item_id,
                    assignee_name: e.assignee_name.clone(),
                    quantity: e.quantity,
                    assigned_by: e.assigned_by,
                    created_at: e.occurred_at,
                });
                if let Some(item) = self.item_mut(e.item_id) {
                    item.quantity = item.quantity.saturating_sub(e.quantity);
                }
            }
            LootEvent::AssignmentRemoved(e) => {
                self.assignments.retain(|a| a.id != e.assignment_id);
            }
            LootEvent::BoardCleared(_) => {
                self.items.clear();
                self.requests.clear();
                self.assignments.clear();
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
        trace!(
            board_id = %self.id,
            event_type = event.event_type(),
            version = self.version,
            "applied loot event"
        );
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let result = match command {
            LootCommand::AddItem(cmd) => self.handle_add_item(cmd),
            LootCommand::UpdateItem(cmd) => self.handle_update_item(cmd),
            LootCommand::RemoveItem(cmd) => self.handle_remove_item(cmd),
            LootCommand::SetRequestsEnabled(cmd) => self.handle_set_requests_enabled(cmd),
            LootCommand::AddRequest(cmd) => self.handle_add_request(cmd),
            LootCommand::RemoveRequest(cmd) => self.handle_remove_request(cmd),
            LootCommand::DecrementRequest(cmd) => self.handle_decrement_request(cmd),
            LootCommand::AssignLoot(cmd) => self.handle_assign_loot(cmd),
            LootCommand::RemoveAssignment(cmd) => self.handle_remove_assignment(cmd),
            LootCommand::ClearAll(cmd) => self.handle_clear_all(cmd),
        };

        if let Err(err) = &result {
            debug!(board_id = %self.id, command = command.name(), error = %err, "loot command rejected");
        }
        result
    }
}

impl LootBoard {
    fn item_mut(&mut self, item_id: ItemId) -> Option<&mut BoardItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    fn require_item(&self, item_id: ItemId) -> DomainResult<&BoardItem> {
        self.item(item_id).ok_or_else(DomainError::not_found)
    }

    fn require_name(name: &str, what: &str) -> DomainResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation(format!("{what} cannot be empty")));
        }
        Ok(trimmed.to_string())
    }

    fn handle_add_item(&self, cmd: &AddItem) -> DomainResult<Vec<LootEvent>> {
        if self.item(cmd.item_id).is_some() {
            return Err(DomainError::conflict("item already exists"));
        }
        let name = Self::require_name(&cmd.name, "item name")?;

        let folded = name.to_lowercase();
        let same_drop = self
            .items
            .iter()
            .find(|i| i.date == cmd.date && i.name.to_lowercase() == folded);

        if let Some(existing) = same_drop {
            return Ok(vec![LootEvent::ItemQuantityMerged(ItemQuantityMerged {
                item_id: existing.id,
                added: cmd.quantity,
                occurred_at: cmd.occurred_at,
            })]);
        }

        Ok(vec![LootEvent::ItemAdded(ItemAdded {
            item_id: cmd.item_id,
            name,
            quantity: cmd.quantity,
            date: cmd.date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_item(&self, cmd: &UpdateItem) -> DomainResult<Vec<LootEvent>> {
        self.require_item(cmd.item_id)?;
        if cmd.name.is_none() && cmd.quantity.is_none() && cmd.date.is_none() {
            return Err(DomainError::validation("nothing to update"));
        }
        let name = match &cmd.name {
            Some(name) => Some(Self::require_name(name, "item name")?),
            None => None,
        };

        Ok(vec![LootEvent::ItemUpdated(ItemUpdated {
            item_id: cmd.item_id,
            name,
            quantity: cmd.quantity,
            date: cmd.date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_item(&self, cmd: &RemoveItem) -> DomainResult<Vec<LootEvent>> {
        self.require_item(cmd.item_id)?;
        Ok(vec![LootEvent::ItemRemoved(ItemRemoved {
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_requests_enabled(
        &self,
        cmd: &SetRequestsEnabled,
    ) -> DomainResult<Vec<LootEvent>> {
        if self.requests_enabled == cmd.enabled {
            return Err(DomainError::validation(if cmd.enabled {
                "requests are already enabled"
            } else {
                "requests are already disabled"
            }));
        }
        Ok(vec![LootEvent::RequestsToggled(RequestsToggled {
            enabled: cmd.enabled,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_request(&self, cmd: &AddRequest) -> DomainResult<Vec<LootEvent>> {
        if !self.requests_enabled {
            return Err(DomainError::conflict("requests are currently disabled"));
        }
        if self.request(cmd.request_id).is_some() {
            return Err(DomainError::conflict("request already exists"));
        }
        self.require_item(cmd.item_id)?;
        let member_name = Self::require_name(&cmd.member_name, "member name")?;
        if cmd.quantity == 0 {
            return Err(DomainError::validation("requested quantity must be positive"));
        }

        Ok(vec![LootEvent::RequestAdded(RequestAdded {
            request_id: cmd.request_id,
            item_id: cmd.item_id,
            member_name,
            quantity: cmd.quantity,
            requester: cmd.requester,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_request(&self, cmd: &RemoveRequest) -> DomainResult<Vec<LootEvent>> {
        self.request(cmd.request_id).ok_or_else(DomainError::not_found)?;
        Ok(vec![LootEvent::RequestRemoved(RequestRemoved {
            request_id: cmd.request_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_decrement_request(
        &self,
        cmd: &DecrementRequest,
    ) -> DomainResult<Vec<LootEvent>> {
        let request = self.request(cmd.request_id).ok_or_else(DomainError::not_found)?;
        if cmd.by == 0 {
            return Err(DomainError::validation("decrement must be positive"));
        }

        let remaining = request.quantity.saturating_sub(cmd.by);
        if remaining == 0 {
            return Ok(vec![LootEvent::RequestRemoved(RequestRemoved {
                request_id: cmd.request_id,
                occurred_at: cmd.occurred_at,
            })]);
        }
        Ok(vec![LootEvent::RequestDecremented(RequestDecremented {
            request_id: cmd.request_id,
            remaining,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign_loot(&self, cmd: &AssignLoot) -> DomainResult<Vec<LootEvent>> {
        if self.assignments.iter().any(|a| a.id == cmd.assignment_id) {
            return Err(DomainError::conflict("assignment already exists"));
        }
        let item = self.require_item(cmd.item_id)?;
        let assignee_name = Self::require_name(&cmd.assignee_name, "assignee name")?;
        if cmd.quantity == 0 {
            return Err(DomainError::validation("assigned quantity must be positive"));
        }
        if cmd.quantity > item.quantity {
            return Err(DomainError::invariant(format!(
                "cannot assign {} units, only {} on hand",
                cmd.quantity, item.quantity
            )));
        }

        Ok(vec![LootEvent::LootAssigned(LootAssigned {
            assignment_id: cmd.assignment_id,
            item_id: cmd.item_id,
            assignee_name,
            quantity: cmd.quantity,
            assigned_by: cmd.assigned_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_assignment(
        &self,
        cmd: &RemoveAssignment,
    ) -> DomainResult<Vec<LootEvent>> {
        if !self.assignments.iter().any(|a| a.id == cmd.assignment_id) {
            return Err(DomainError::not_found());
        }
        Ok(vec![LootEvent::AssignmentRemoved(AssignmentRemoved {
            assignment_id: cmd.assignment_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_clear_all(&self, cmd: &ClearAll) -> DomainResult<Vec<LootEvent>> {
        Ok(vec![LootEvent::BoardCleared(BoardCleared {
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_board() -> LootBoard {
        LootBoard::empty(BoardId::new())
    }

    fn test_time(offset_secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::seconds(offset_secs)
    }

    fn raid_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    fn add_item(board: &mut LootBoard, name: &str, quantity: u64) -> ItemId {
        let item_id = ItemId::new();
        board
            .execute(&LootCommand::AddItem(AddItem {
                item_id,
                name: name.to_string(),
                quantity,
                date: raid_day(),
                occurred_at: test_time(0),
            }))
            .unwrap();
        item_id
    }

    fn add_request(board: &mut LootBoard, item_id: ItemId, member: &str, quantity: u64, at: i64) -> RequestId {
        let request_id = RequestId::new();
        board
            .execute(&LootCommand::AddRequest(AddRequest {
                request_id,
                item_id,
                member_name: member.to_string(),
                quantity,
                requester: None,
                occurred_at: test_time(at),
            }))
            .unwrap();
        request_id
    }

    fn assign(item_id: ItemId, assignee: &str, quantity: u64, at: i64) -> LootCommand {
        LootCommand::AssignLoot(AssignLoot {
            assignment_id: AssignmentId::new(),
            item_id,
            assignee_name: assignee.to_string(),
            quantity,
            assigned_by: Some(UserId::new()),
            occurred_at: test_time(at),
        })
    }

    #[test]
    fn add_item_emits_item_added_with_trimmed_name() {
        let board = test_board();
        let item_id = ItemId::new();
        let events = board
            .handle(&LootCommand::AddItem(AddItem {
                item_id,
                name: "  Dragon Scale ".to_string(),
                quantity: 3,
                date: raid_day(),
                occurred_at: test_time(0),
            }))
            .unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            LootEvent::ItemAdded(e) => {
                assert_eq!(e.item_id, item_id);
                assert_eq!(e.name, "Dragon Scale");
                assert_eq!(e.quantity, 3);
            }
            _ => panic!("Expected ItemAdded event"),
        }
    }

    #[test]
    fn add_item_rejects_blank_name() {
        let board = test_board();
        let err = board
            .handle(&LootCommand::AddItem(AddItem {
                item_id: ItemId::new(),
                name: "   ".to_string(),
                quantity: 1,
                date: raid_day(),
                occurred_at: test_time(0),
            }))
            .unwrap_err();

        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for blank name"),
        }
    }

    #[test]
    fn same_drop_on_same_day_merges_case_insensitively() {
        let mut board = test_board();
        let first = add_item(&mut board, "Dragon Scale", 2);

        let events = board
            .execute(&LootCommand::AddItem(AddItem {
                item_id: ItemId::new(),
                name: "dragon SCALE".to_string(),
                quantity: 3,
                date: raid_day(),
                occurred_at: test_time(5),
            }))
            .unwrap();

        assert!(matches!(&events[0], LootEvent::ItemQuantityMerged(e) if e.item_id == first && e.added == 3));
        assert_eq!(board.board_items().len(), 1);
        assert_eq!(board.item(first).unwrap().quantity, 5);
    }

    #[test]
    fn same_name_on_another_day_is_a_new_item() {
        let mut board = test_board();
        add_item(&mut board, "Dragon Scale", 2);

        board
            .execute(&LootCommand::AddItem(AddItem {
                item_id: ItemId::new(),
                name: "Dragon Scale".to_string(),
                quantity: 1,
                date: raid_day().succ_opt().unwrap(),
                occurred_at: test_time(5),
            }))
            .unwrap();

        assert_eq!(board.board_items().len(), 2);
    }

    #[test]
    fn add_item_with_existing_id_conflicts() {
        let mut board = test_board();
        let item_id = add_item(&mut board, "Rune", 1);

        let err = board
            .handle(&LootCommand::AddItem(AddItem {
                item_id,
                name: "Other".to_string(),
                quantity: 1,
                date: raid_day(),
                occurred_at: test_time(1),
            }))
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn update_item_changes_only_given_fields() {
        let mut board = test_board();
        let item_id = add_item(&mut board, "Rune", 4);

        board
            .execute(&LootCommand::UpdateItem(UpdateItem {
                item_id,
                name: None,
                quantity: Some(9),
                date: None,
                occurred_at: test_time(1),
            }))
            .unwrap();

        let item = board.item(item_id).unwrap();
        assert_eq!(item.name, "Rune");
        assert_eq!(item.quantity, 9);
        assert_eq!(item.date, raid_day());
    }

    #[test]
    fn update_item_rejects_empty_patch_and_unknown_item() {
        let mut board = test_board();
        let item_id = add_item(&mut board, "Rune", 4);

        let empty = board
            .handle(&LootCommand::UpdateItem(UpdateItem {
                item_id,
                name: None,
                quantity: None,
                date: None,
                occurred_at: test_time(1),
            }))
            .unwrap_err();
        assert!(matches!(empty, DomainError::Validation(_)));

        let missing = board
            .handle(&LootCommand::UpdateItem(UpdateItem {
                item_id: ItemId::new(),
                name: Some("X".to_string()),
                quantity: None,
                date: None,
                occurred_at: test_time(1),
            }))
            .unwrap_err();
        assert_eq!(missing, DomainError::NotFound);
    }

    #[test]
    fn remove_item_cascades_requests_and_assignments() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 4);
        let scale = add_item(&mut board, "Scale", 1);
        add_request(&mut board, rune, "Alice", 2, 1);
        add_request(&mut board, scale, "Bob", 1, 2);
        board.execute(&assign(rune, "Alice", 1, 3)).unwrap();

        board
            .execute(&LootCommand::RemoveItem(RemoveItem {
                item_id: rune,
                occurred_at: test_time(4),
            }))
            .unwrap();

        assert!(board.item(rune).is_none());
        assert_eq!(board.board_requests().len(), 1);
        assert_eq!(board.board_requests()[0].item_id, scale);
        assert!(board.assignments().is_empty());
    }

    #[test]
    fn requests_are_never_merged() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 4);
        add_request(&mut board, rune, "Alice", 1, 1);
        add_request(&mut board, rune, "Alice", 2, 2);

        assert_eq!(board.board_requests().len(), 2);
        assert_eq!(board.item_progress(rune).unwrap().requested, 3);
    }

    #[test]
    fn add_request_rejected_while_requests_disabled() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 4);
        board
            .execute(&LootCommand::SetRequestsEnabled(SetRequestsEnabled {
                enabled: false,
                occurred_at: test_time(1),
            }))
            .unwrap();
        assert!(!board.requests_enabled());

        let err = board
            .handle(&LootCommand::AddRequest(AddRequest {
                request_id: RequestId::new(),
                item_id: rune,
                member_name: "Alice".to_string(),
                quantity: 1,
                requester: None,
                occurred_at: test_time(2),
            }))
            .unwrap_err();

        match err {
            DomainError::Conflict(msg) if msg.contains("disabled") => {}
            other => panic!("Expected Conflict for disabled requests, got {other:?}"),
        }
    }

    #[test]
    fn toggling_requests_to_current_value_is_rejected() {
        let board = test_board();
        let err = board
            .handle(&LootCommand::SetRequestsEnabled(SetRequestsEnabled {
                enabled: true,
                occurred_at: test_time(0),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn add_request_validates_member_quantity_and_item() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 4);

        let request = |item_id, member_name: &str, quantity| {
            LootCommand::AddRequest(AddRequest {
                request_id: RequestId::new(),
                item_id,
                member_name: member_name.to_string(),
                quantity,
                requester: None,
                occurred_at: test_time(1),
            })
        };

        assert!(matches!(board.handle(&request(rune, " ", 1)), Err(DomainError::Validation(_))));
        assert!(matches!(board.handle(&request(rune, "Alice", 0)), Err(DomainError::Validation(_))));
        assert_eq!(board.handle(&request(ItemId::new(), "Alice", 1)), Err(DomainError::NotFound));
    }

    #[test]
    fn decrement_request_reduces_then_removes() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 4);
        let request_id = add_request(&mut board, rune, "Alice", 3, 1);

        let events = board
            .execute(&LootCommand::DecrementRequest(DecrementRequest {
                request_id,
                by: 2,
                occurred_at: test_time(2),
            }))
            .unwrap();
        assert!(matches!(&events[0], LootEvent::RequestDecremented(e) if e.remaining == 1));
        assert_eq!(board.request(request_id).unwrap().quantity, 1);

        let events = board
            .execute(&LootCommand::DecrementRequest(DecrementRequest {
                request_id,
                by: 5,
                occurred_at: test_time(3),
            }))
            .unwrap();
        assert!(matches!(&events[0], LootEvent::RequestRemoved(_)));
        assert!(board.request(request_id).is_none());
    }

    #[test]
    fn decrement_by_zero_is_rejected() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 4);
        let request_id = add_request(&mut board, rune, "Alice", 3, 1);

        let err = board
            .handle(&LootCommand::DecrementRequest(DecrementRequest {
                request_id,
                by: 0,
                occurred_at: test_time(2),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn remove_unknown_request_is_not_found() {
        let board = test_board();
        let err = board
            .handle(&LootCommand::RemoveRequest(RemoveRequest {
                request_id: RequestId::new(),
                occurred_at: test_time(0),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn assign_loot_takes_units_off_stock() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 5);

        board.execute(&assign(rune, "Alice", 2, 1)).unwrap();

        let progress = board.item_progress(rune).unwrap();
        assert_eq!(progress.on_hand, 3);
        assert_eq!(progress.assigned, 2);
    }

    #[test]
    fn assign_loot_cannot_exceed_stock() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 2);

        let err = board.handle(&assign(rune, "Alice", 3, 1)).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("on hand") => {}
            other => panic!("Expected invariant violation, got {other:?}"),
        }
        assert_eq!(board.item(rune).unwrap().quantity, 2);
    }

    #[test]
    fn removing_assignment_does_not_restore_stock() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 2);
        let cmd = assign(rune, "Alice", 1, 1);
        let LootCommand::AssignLoot(ref inner) = cmd else { unreachable!() };
        let assignment_id = inner.assignment_id;
        board.execute(&cmd).unwrap();

        board
            .execute(&LootCommand::RemoveAssignment(RemoveAssignment {
                assignment_id,
                occurred_at: test_time(2),
            }))
            .unwrap();

        assert!(board.assignments().is_empty());
        assert_eq!(board.item(rune).unwrap().quantity, 1);
    }

    #[test]
    fn clear_all_empties_board_but_keeps_settings() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 2);
        add_request(&mut board, rune, "Alice", 1, 1);
        board.execute(&assign(rune, "Bob", 1, 2)).unwrap();
        board
            .execute(&LootCommand::SetRequestsEnabled(SetRequestsEnabled {
                enabled: false,
                occurred_at: test_time(3),
            }))
            .unwrap();

        board
            .execute(&LootCommand::ClearAll(ClearAll {
                occurred_at: test_time(4),
            }))
            .unwrap();

        assert!(board.board_items().is_empty());
        assert!(board.board_requests().is_empty());
        assert!(board.assignments().is_empty());
        assert!(!board.requests_enabled());
    }

    #[test]
    fn version_tracks_applied_events() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 2);
        add_request(&mut board, rune, "Alice", 1, 1);
        assert_eq!(board.version(), 2);

        // Rejected commands apply nothing.
        let _ = board.execute(&assign(rune, "Alice", 10, 2));
        assert_eq!(board.version(), 2);
    }

    #[test]
    fn suggested_split_follows_request_order_and_stock() {
        let mut board = test_board();
        let scale = add_item(&mut board, "Dragon Scale", 3);
        add_request(&mut board, scale, "Bob", 5, 2);
        add_request(&mut board, scale, "Alice", 5, 1);

        let split = board.suggested_split();
        let alloc = &split[&scale];
        assert_eq!(alloc.quantity_for("Alice"), 2);
        assert_eq!(alloc.quantity_for("Bob"), 1);
        assert_eq!(alloc.leftover, 0);

        // Suggestions are not applied.
        assert!(board.assignments().is_empty());
        assert_eq!(board.item(scale).unwrap().quantity, 3);

        let totals = board.suggested_totals();
        assert_eq!(totals.get("Alice"), Some(&2));
        assert_eq!(totals.get("Bob"), Some(&1));
    }

    #[test]
    fn assignment_totals_and_recent_assignments() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 10);
        board.execute(&assign(rune, "Bob", 1, 1)).unwrap();
        board.execute(&assign(rune, "Alice", 2, 3)).unwrap();
        board.execute(&assign(rune, "Bob", 3, 2)).unwrap();

        let totals = board.assignment_totals();
        assert_eq!(totals.get("Alice"), Some(&2));
        assert_eq!(totals.get("Bob"), Some(&4));

        let recent: Vec<(&str, u64)> = board
            .recent_assignments(2)
            .iter()
            .map(|a| (a.assignee_name.as_str(), a.quantity))
            .collect();
        assert_eq!(recent, vec![("Alice", 2), ("Bob", 3)]);
    }

    #[test]
    fn recent_requests_newest_first_with_limit() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 10);
        let scale = add_item(&mut board, "Scale", 1);
        let oldest = add_request(&mut board, rune, "Alice", 1, 1);
        let newest = add_request(&mut board, scale, "Bob", 2, 5);
        let middle = add_request(&mut board, rune, "Carol", 3, 3);

        let recent: Vec<RequestId> = board.recent_requests(2).iter().map(|r| r.id).collect();
        assert_eq!(recent, vec![newest, middle]);

        let all: Vec<RequestId> = board.recent_requests(10).iter().map(|r| r.id).collect();
        assert_eq!(all, vec![newest, middle, oldest]);

        assert!(board.recent_requests(0).is_empty());
    }

    #[test]
    fn recent_requests_tie_goes_to_last_recorded() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 10);
        let first = add_request(&mut board, rune, "Alice", 1, 4);
        let second = add_request(&mut board, rune, "Bob", 1, 4);

        let recent: Vec<RequestId> = board.recent_requests(2).iter().map(|r| r.id).collect();
        assert_eq!(recent, vec![second, first]);
    }

    #[test]
    fn member_requests_filters_by_name_newest_first() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 10);
        let scale = add_item(&mut board, "Scale", 1);
        let a1 = add_request(&mut board, rune, "Alice", 1, 1);
        add_request(&mut board, rune, "Bob", 1, 2);
        let a2 = add_request(&mut board, scale, "Alice", 2, 3);
        let a3 = add_request(&mut board, rune, "Alice", 1, 3);

        let mine: Vec<RequestId> = board.member_requests("Alice", 10).iter().map(|r| r.id).collect();
        assert_eq!(mine, vec![a3, a2, a1]);

        let capped: Vec<RequestId> = board.member_requests("Alice", 1).iter().map(|r| r.id).collect();
        assert_eq!(capped, vec![a3]);

        assert!(board.member_requests("alice", 10).is_empty());
        assert!(board.member_requests("Nobody", 10).is_empty());
    }

    #[test]
    fn events_carry_command_time_and_schema_version() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 5);

        let requested = board
            .execute(&LootCommand::AddRequest(AddRequest {
                request_id: RequestId::new(),
                item_id: rune,
                member_name: "Alice".to_string(),
                quantity: 2,
                requester: None,
                occurred_at: test_time(7),
            }))
            .unwrap();
        let assigned = board.execute(&assign(rune, "Alice", 1, 9)).unwrap();
        let cleared = board
            .execute(&LootCommand::ClearAll(ClearAll {
                occurred_at: test_time(11),
            }))
            .unwrap();

        let stamps: Vec<(&str, DateTime<Utc>, u32)> = requested
            .iter()
            .chain(&assigned)
            .chain(&cleared)
            .map(|e| (e.event_type(), e.occurred_at(), e.version()))
            .collect();
        assert_eq!(
            stamps,
            vec![
                ("loot.request.added", test_time(7), 1),
                ("loot.assignment.added", test_time(9), 1),
                ("loot.board.cleared", test_time(11), 1),
            ]
        );
    }

    #[test]
    fn snapshots_preserve_creation_order() {
        let mut board = test_board();
        let rune = add_item(&mut board, "Rune", 1);
        let scale = add_item(&mut board, "Scale", 1);
        add_request(&mut board, scale, "Alice", 1, 1);
        add_request(&mut board, rune, "Bob", 2, 2);

        let items: Vec<ItemId> = board.items().iter().map(|i| i.id).collect();
        assert_eq!(items, vec![rune, scale]);

        let requests: Vec<(ItemId, i64)> = board.requests().iter().map(|r| (r.item_id, r.quantity)).collect();
        assert_eq!(requests, vec![(scale, 1), (rune, 2)]);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: stock never goes negative, and accepted assignments plus
            /// remaining stock always equal what was dropped.
            #[test]
            fn assignments_conserve_stock(
                initial in 0u64..50,
                attempts in prop::collection::vec(0u64..15, 0..20)
            ) {
                let mut board = test_board();
                let rune = add_item(&mut board, "Rune", initial);

                for (n, quantity) in attempts.into_iter().enumerate() {
                    let _ = board.execute(&assign(rune, "Alice", quantity, n as i64));
                    let progress = board.item_progress(rune).unwrap();
                    prop_assert_eq!(progress.on_hand + progress.assigned, initial);
                }
            }

            /// Property: handle() never mutates state, and is deterministic.
            #[test]
            fn handle_is_pure(quantity in 0u64..20, requested in 0u64..20) {
                let mut board = test_board();
                let rune = add_item(&mut board, "Rune", quantity);
                let before = board.clone();

                let cmd = LootCommand::AddRequest(AddRequest {
                    request_id: RequestId::new(),
                    item_id: rune,
                    member_name: "Alice".to_string(),
                    quantity: requested,
                    requester: None,
                    occurred_at: test_time(1),
                });

                let first = board.handle(&cmd);
                let second = board.handle(&cmd);

                prop_assert_eq!(&board, &before);
                prop_assert_eq!(first, second);
            }

            /// Property: every accepted request is kept as its own entry.
            #[test]
            fn each_request_is_kept(quantities in prop::collection::vec(1u64..10, 0..12)) {
                let mut board = test_board();
                let rune = add_item(&mut board, "Rune", 5);

                for (n, &quantity) in quantities.iter().enumerate() {
                    add_request(&mut board, rune, "Alice", quantity, n as i64);
                }

                prop_assert_eq!(board.board_requests().len(), quantities.len());
                prop_assert_eq!(
                    board.item_progress(rune).unwrap().requested,
                    quantities.iter().sum::<u64>()
                );
            }
        }
    }
}
