//! Sparse cover-item flag serialization (`item_flags.bin`).
//!
//! The scope tree does not carry per-item flags; the rare items with a
//! non-zero flag word (exclusions, type qualifiers) are stored here as
//! delta-encoded pairs over the ascending global item index:
//!
//! ```text
//! +---------+---------+-----------+-------+-----------+-------+
//! | version | entries | delta_idx | flags | delta_idx | flags | ...
//! +---------+---------+-----------+-------+-----------+-------+
//! ```
//!
//! All fields are varints. The member is omitted when every flag is zero.

use crate::error::{CodecError, Error};
use crate::varint;
use crate::MEMBER_ITEM_FLAGS;
use coverdb_model::Database;
use std::collections::BTreeMap;
use tracing::warn;

const VERSION: u64 = 1;

/// Returns empty bytes when no cover item carries flags.
pub fn serialize(db: &Database) -> Vec<u8> {
    let mut entries = Vec::new();
    db.for_each_item(|idx, item| {
        if item.flags != 0 {
            entries.push((idx, item.flags));
        }
    });
    if entries.is_empty() {
        return Vec::new();
    }

    let mut buf = Vec::new();
    varint::write(VERSION, &mut buf);
    varint::write(entries.len() as u64, &mut buf);
    let mut prev = 0;
    for (idx, flags) in entries {
        varint::write(idx - prev, &mut buf);
        varint::write(u64::from(flags), &mut buf);
        prev = idx;
    }
    buf
}

/// Applies stored flags onto the materialized tree.
pub fn apply(db: &mut Database, data: &[u8]) -> Result<(), Error> {
    if data.is_empty() {
        return Ok(());
    }
    let (version, offset) = varint::read(data, 0).map_err(|e| Error::member(MEMBER_ITEM_FLAGS, e))?;
    if version != VERSION {
        return Err(Error::UnsupportedVersion {
            member: MEMBER_ITEM_FLAGS.to_string(),
            version: version as u32,
        });
    }
    let decoded = decode(data, offset).map_err(|e| Error::member(MEMBER_ITEM_FLAGS, e))?;
    let mut by_idx: BTreeMap<u64, u32> = decoded.into_iter().collect();
    db.for_each_item_mut(|idx, item| {
        if let Some(flags) = by_idx.remove(&idx) {
            item.flags = flags;
        }
    });
    for idx in by_idx.keys() {
        warn!(idx, "item-flags entry references an item index out of range");
    }
    Ok(())
}

fn decode(data: &[u8], offset: usize) -> Result<Vec<(u64, u32)>, CodecError> {
    let (count, mut offset) = varint::read(data, offset)?;
    let mut entries = Vec::new();
    let mut prev = 0u64;
    for _ in 0..count {
        let (delta, next) = varint::read(data, offset)?;
        let (flags, next) = varint::read(data, next)?;
        offset = next;
        let idx = prev + delta;
        entries.push((idx, flags as u32));
        prev = idx;
    }
    Ok(entries)
}
