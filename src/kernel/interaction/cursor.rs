//! Cursor claim arbitration.
//!
//! Claims are keyed by an opaque per-claimant token; the effective cursor is
//! the highest-priority live claim, ties going to the most recently
//! inserted. Re-claiming a token refreshes its recency.

use compact_str::CompactString;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorClaim {
    pub cursor: CompactString,
    pub priority: i32,
    seq: u64,
}

#[derive(Debug, Default)]
pub(super) struct CursorClaims {
    claims: FxHashMap<CompactString, CursorClaim>,
    next_seq: u64,
}

impl CursorClaims {
    pub fn set(&mut self, token: &str, cursor: &str, priority: i32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.claims.insert(
            CompactString::from(token),
            CursorClaim {
                cursor: CompactString::from(cursor),
                priority,
                seq,
            },
        );
    }

    pub fn remove(&mut self, token: &str) -> bool {
        self.claims.remove(token).is_some()
    }

    pub fn clear(&mut self) {
        self.claims.clear();
    }

    pub fn best(&self) -> Option<&CursorClaim> {
        self.claims.values().max_by_key(|claim| (claim.priority, claim.seq))
    }
}
