//! Per-test contribution serialization (`contrib/<history_index>.bin`).
//!
//! Each history node with a non-empty contribution map gets its own archive
//! member so tests can be loaded (or skipped) independently:
//!
//! ```text
//! +---------+-----------+-------+-----------+-------+
//! | entries | delta_idx | count | delta_idx | count | ...
//! +---------+-----------+-------+-----------+-------+
//! ```
//!
//! All fields are varints. Entries are sorted by ascending global cover-item
//! index and the index is delta-encoded against its predecessor, so a test
//! touching items 0 and 100000 costs a handful of bytes, not a range
//! proportional to the gap. A test with no entries contributes no member.

use crate::error::{CodecError, Error};
use crate::varint;
use crate::MEMBER_CONTRIB_DIR;
use coverdb_model::Database;
use std::collections::BTreeMap;
use tracing::warn;

/// The archive member name for one history node's contributions.
pub fn member_name(history: u32) -> String {
    format!("{MEMBER_CONTRIB_DIR}{history}.bin")
}

/// Parses a `contrib/<idx>.bin` member name back to its history index.
pub fn parse_member_name(name: &str) -> Option<u32> {
    name.strip_prefix(MEMBER_CONTRIB_DIR)?
        .strip_suffix(".bin")?
        .parse()
        .ok()
}

/// Serializes one history node's contribution map. The map iterates in
/// ascending item order, which the delta encoding relies on.
pub fn serialize(entries: &BTreeMap<u64, u64>) -> Vec<u8> {
    let mut buf = Vec::new();
    varint::write(entries.len() as u64, &mut buf);
    let mut prev = 0;
    for (&idx, &count) in entries {
        varint::write(idx - prev, &mut buf);
        varint::write(count, &mut buf);
        prev = idx;
    }
    buf
}

/// Decodes one member into (item index, count) pairs.
pub fn deserialize(data: &[u8]) -> Result<Vec<(u64, u64)>, CodecError> {
    let (num_entries, mut offset) = varint::read(data, 0)?;
    let mut entries = Vec::new();
    let mut prev = 0u64;
    for _ in 0..num_entries {
        let (delta, next) = varint::read(data, offset)?;
        let (count, next) = varint::read(data, next)?;
        offset = next;
        let idx = prev + delta;
        entries.push((idx, count));
        prev = idx;
    }
    Ok(entries)
}

/// Applies one decoded member onto the database's contribution table.
pub fn apply(db: &mut Database, member: &str, history: u32, data: &[u8]) -> Result<(), Error> {
    if history as usize >= db.history.len() {
        warn!(member, history, "contribution member for an unknown history node, skipped");
        return Ok(());
    }
    let entries = deserialize(data).map_err(|e| Error::member(member, e))?;
    let item_count = db.item_count();
    for (idx, count) in entries {
        if idx >= item_count {
            warn!(member, idx, "contribution entry references an item index out of range");
            continue;
        }
        db.record_contribution(history, idx, count);
    }
    Ok(())
}
