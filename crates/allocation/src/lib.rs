//! Fair-share loot allocation.
//!
//! Given a snapshot of items (with their on-hand quantity) and the request log,
//! compute how many units each requester receives per item using round-robin,
//! one unit at a time, in order of each requester's first request.
//!
//! Everything here is pure: no IO, no shared state, no mutation of the inputs.
//! Results are suggestions; callers decide whether to record them as assignments.

pub mod snapshot;
pub mod split;

pub use snapshot::{ItemSnapshot, RequestSnapshot};
pub use split::{ItemAllocation, MemberShare, MemberTotals, Split, compute_split, summarize_by_member};
