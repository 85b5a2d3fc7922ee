//! Eviction Policy Module
//!
//! Picks which entries to drop when an insertion would exceed the size budget.
//!
//! Victims are taken in ascending hit count; among equal hit counts the oldest
//! insertion goes first.

use crate::cache::CacheEntry;

// == Eviction Plan ==
/// Keys chosen for removal, in removal order, and the bytes they free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionPlan {
    /// Keys to remove, least valuable first
    pub victims: Vec<String>,
    /// Sum of the victims' sizes
    pub freed_bytes: usize,
    /// True when `freed_bytes` reaches the requested amount
    pub satisfied: bool,
}

// == Plan Eviction ==
/// Orders the given entries least-valuable first and takes them until
/// `needed_bytes` would be freed.
///
/// When even all entries together fall short, the plan lists every entry and
/// `satisfied` is false.
pub fn plan_eviction<'a, V: 'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a CacheEntry<V>)>,
    needed_bytes: usize,
) -> EvictionPlan {
    let mut candidates: Vec<(&String, u64, u64, usize)> = entries
        .into_iter()
        .map(|(key, entry)| (key, entry.hit_count, entry.sequence, entry.size_bytes))
        .collect();
    candidates.sort_by_key(|&(_, hit_count, sequence, _)| (hit_count, sequence));

    let mut victims = Vec::new();
    let mut freed_bytes = 0usize;

    for (key, _, _, size_bytes) in candidates {
        if freed_bytes >= needed_bytes {
            break;
        }
        victims.push(key.clone());
        freed_bytes += size_bytes;
    }

    EvictionPlan {
        victims,
        freed_bytes,
        satisfied: freed_bytes >= needed_bytes,
    }
}
