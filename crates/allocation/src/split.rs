use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use lootsplit_core::ItemId;

use crate::snapshot::{ItemSnapshot, RequestSnapshot};

/// Units of one item suggested for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberShare {
    pub member_name: String,
    pub quantity: u64,
}

/// Suggested distribution of a single item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAllocation {
    /// Members receiving at least one unit, sorted by name.
    pub assignments: Vec<MemberShare>,
    /// Units nobody asked for.
    pub leftover: u64,
}

impl ItemAllocation {
    /// Total units handed out for this item.
    pub fn allocated(&self) -> u64 {
        self.assignments.iter().map(|a| a.quantity).sum()
    }

    /// Units suggested for `member_name` (0 if absent).
    pub fn quantity_for(&self, member_name: &str) -> u64 {
        self.assignments
            .iter()
            .find(|a| a.member_name == member_name)
            .map(|a| a.quantity)
            .unwrap_or(0)
    }
}

/// Per-item allocation, keyed by item id. Items without requests are absent.
pub type Split = BTreeMap<ItemId, ItemAllocation>;

/// Allocated units per member across all items.
pub type MemberTotals = BTreeMap<String, u64>;

/// Remaining demand and running allocation for one requester of one item.
#[derive(Debug)]
struct Demand<'a> {
    member_name: &'a str,
    remaining: u64,
    allocated: u64,
}

/// Compute the round-robin split for every item that has at least one request.
///
/// Requests referencing an item not in `items` are ignored. If `items` contains
/// the same id twice, the later entry wins.
pub fn compute_split(items: &[ItemSnapshot], requests: &[RequestSnapshot]) -> Split {
    let mut by_item: HashMap<ItemId, Vec<&RequestSnapshot>> = HashMap::new();
    for request in requests {
        by_item.entry(request.item_id).or_default().push(request);
    }

    let mut out = Split::new();
    for item in items {
        let Some(item_requests) = by_item.get(&item.id) else {
            continue;
        };

        let allocation = allocate_item(item, item_requests);
        debug!(
            item_id = %item.id,
            item = %item.name,
            on_hand = item.quantity,
            requests = item_requests.len(),
            recipients = allocation.assignments.len(),
            leftover = allocation.leftover,
            "computed item split"
        );
        out.insert(item.id, allocation);
    }
    out
}

/// Sum suggested units per member across all items.
pub fn summarize_by_member(items: &[ItemSnapshot], requests: &[RequestSnapshot]) -> MemberTotals {
    let mut totals = MemberTotals::new();
    for allocation in compute_split(items, requests).values() {
        for share in &allocation.assignments {
            *totals.entry(share.member_name.clone()).or_insert(0) += share.quantity;
        }
    }
    totals
}

fn allocate_item(item: &ItemSnapshot, requests: &[&RequestSnapshot]) -> ItemAllocation {
    // Stable: equal timestamps keep input order.
    let mut ordered = requests.to_vec();
    ordered.sort_by_key(|r| r.created_at);

    let mut demand: Vec<Demand<'_>> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for request in ordered {
        let name = request.member_name.as_str();
        match slot.get(name).copied() {
            Some(i) => demand[i].remaining = demand[i].remaining.saturating_add(request.demand()),
            None => {
                slot.insert(name, demand.len());
                demand.push(Demand {
                    member_name: name,
                    remaining: request.demand(),
                    allocated: 0,
                });
            }
        }
    }

    let leftover = round_robin(item.quantity, &mut demand);

    let mut assignments: Vec<MemberShare> = demand
        .into_iter()
        .filter(|d| d.allocated > 0)
        .map(|d| MemberShare {
            member_name: d.member_name.to_string(),
            quantity: d.allocated,
        })
        .collect();
    assignments.sort_by(|a, b| a.member_name.cmp(&b.member_name));

    ItemAllocation {
        assignments,
        leftover,
    }
}

/// Hand out `on_hand` units one at a time in demand order. Returns the unallocated pool.
///
/// Consecutive full rounds (every active requester gets a unit, nobody runs out
/// mid-round) are handed out in one step, so the cost depends on the number of
/// requesters rather than on the quantities involved.
fn round_robin(on_hand: u64, demand: &mut [Demand<'_>]) -> u64 {
    let mut pool = on_hand;
    let mut round: u64 = 0;

    while pool > 0 {
        let active = demand.iter().filter(|d| d.remaining > 0).count() as u64;
        if active == 0 {
            break;
        }
        let min_remaining = demand
            .iter()
            .filter(|d| d.remaining > 0)
            .map(|d| d.remaining)
            .min()
            .unwrap_or(0);

        let full_rounds = (pool / active).min(min_remaining);
        if full_rounds > 0 {
            for d in demand.iter_mut().filter(|d| d.remaining > 0) {
                d.remaining -= full_rounds;
                d.allocated += full_rounds;
            }
            pool -= full_rounds * active;
            round += full_rounds;
            trace!(round, full_rounds, active, pool, "allocation rounds");
            continue;
        }

        // Fewer units than active requesters: one partial round, earliest first.
        for d in demand.iter_mut().filter(|d| d.remaining > 0) {
            d.remaining -= 1;
            d.allocated += 1;
            pool -= 1;
            if pool == 0 {
                break;
            }
        }
        round += 1;
        trace!(round, active, pool, "partial allocation round");
    }
    pool
}
