//! Scope tag serialization (`tags.json`).
//!
//! Sparse: only scopes with at least one tag are included, addressed by
//! depth-first index.

use crate::error::Error;
use crate::MEMBER_TAGS;
use coverdb_model::Database;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

const VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Entry {
    idx: u64,
    tags: BTreeSet<String>,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    version: u32,
    #[serde(default)]
    entries: Vec<Entry>,
}

/// Returns empty bytes when no scope carries a tag.
pub fn serialize(db: &Database) -> Result<Vec<u8>, Error> {
    let mut entries = Vec::new();
    db.for_each_scope(|idx, scope| {
        if !scope.tags.is_empty() {
            entries.push(Entry {
                idx,
                tags: scope.tags.clone(),
            });
        }
    });
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    let payload = Payload {
        version: VERSION,
        entries,
    };
    serde_json::to_vec(&payload).map_err(|e| Error::json(MEMBER_TAGS, e))
}

/// Applies stored tags onto the materialized tree.
pub fn apply(db: &mut Database, data: &[u8]) -> Result<(), Error> {
    if data.is_empty() {
        return Ok(());
    }
    let payload: Payload = serde_json::from_slice(data).map_err(|e| Error::json(MEMBER_TAGS, e))?;
    if payload.version != VERSION {
        return Err(Error::UnsupportedVersion {
            member: MEMBER_TAGS.to_string(),
            version: payload.version,
        });
    }

    let mut by_idx: BTreeMap<u64, BTreeSet<String>> = BTreeMap::new();
    for entry in payload.entries {
        by_idx.entry(entry.idx).or_default().extend(entry.tags);
    }
    db.for_each_scope_mut(|idx, scope| {
        if let Some(tags) = by_idx.remove(&idx) {
            scope.tags.extend(tags);
        }
    });
    for idx in by_idx.keys() {
        warn!(idx, "tags entry references a scope index out of range");
    }
    Ok(())
}
