//! Tombstone-aware last-writer-wins merge.

use std::collections::{BTreeSet, HashMap};

use crate::models::{Record, RecordId};

/// Result of merging a remote snapshot with the local records.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    /// Newest first
    pub records: Vec<Record>,
    /// Remote rows dropped because their id is tombstoned
    pub suppressed: usize,
    /// Local records that replaced or added to the remote snapshot
    pub local_wins: usize,
}

impl Merged {
    /// Oldest-first copy, the order rows are written to the remote table.
    pub fn oldest_first(&self) -> Vec<Record> {
        self.records.iter().rev().cloned().collect()
    }
}

/// Merge `remote` and `local` into one id-unique set.
///
/// Tombstoned ids are removed from the remote snapshot before anything else,
/// whatever their `created_at`. A local record then replaces the entry for its
/// id only when strictly newer; ties keep the remote entry.
pub fn merge_records(
    remote: Vec<Record>,
    tombstones: &BTreeSet<RecordId>,
    local: Vec<Record>,
) -> Merged {
    let mut by_id: HashMap<RecordId, Record> = HashMap::with_capacity(remote.len() + local.len());
    let mut suppressed = 0;

    for record in remote {
        if tombstones.contains(&record.id) {
            suppressed += 1;
            continue;
        }
        insert_newer(&mut by_id, record);
    }

    let mut local_wins = 0;
    for record in local {
        if insert_newer(&mut by_id, record) {
            local_wins += 1;
        }
    }

    let mut records: Vec<Record> = by_id.into_values().collect();
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    Merged {
        records,
        suppressed,
        local_wins,
    }
}

fn insert_newer(by_id: &mut HashMap<RecordId, Record>, record: Record) -> bool {
    match by_id.get(&record.id) {
        Some(existing) if record.created_at <= existing.created_at => false,
        _ => {
            by_id.insert(record.id.clone(), record);
            true
        }
    }
}
