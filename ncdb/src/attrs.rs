//! User-defined attribute serialization (`attrs.json`).
//!
//! Sparse: only scopes with at least one attribute produce an entry, plus an
//! optional block of database-global attributes. Scope entries address the
//! tree by depth-first index.

use crate::error::Error;
use crate::MEMBER_ATTRS;
use coverdb_model::Database;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

const VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ScopeEntry {
    idx: u64,
    attrs: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    version: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    scopes: Vec<ScopeEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    global: BTreeMap<String, String>,
}

/// Returns empty bytes when no attribute is set anywhere.
pub fn serialize(db: &Database) -> Result<Vec<u8>, Error> {
    let mut scopes = Vec::new();
    db.for_each_scope(|idx, scope| {
        if !scope.attrs.is_empty() {
            scopes.push(ScopeEntry {
                idx,
                attrs: scope.attrs.clone(),
            });
        }
    });
    if scopes.is_empty() && db.attrs.is_empty() {
        return Ok(Vec::new());
    }
    let payload = Payload {
        version: VERSION,
        scopes,
        global: db.attrs.clone(),
    };
    serde_json::to_vec(&payload).map_err(|e| Error::json(MEMBER_ATTRS, e))
}

/// Applies stored attributes onto the materialized tree.
pub fn apply(db: &mut Database, data: &[u8]) -> Result<(), Error> {
    if data.is_empty() {
        return Ok(());
    }
    let payload: Payload =
        serde_json::from_slice(data).map_err(|e| Error::json(MEMBER_ATTRS, e))?;
    if payload.version != VERSION {
        return Err(Error::UnsupportedVersion {
            member: MEMBER_ATTRS.to_string(),
            version: payload.version,
        });
    }

    let mut by_idx: BTreeMap<u64, BTreeMap<String, String>> = BTreeMap::new();
    for entry in payload.scopes {
        by_idx.entry(entry.idx).or_default().extend(entry.attrs);
    }
    db.for_each_scope_mut(|idx, scope| {
        if let Some(attrs) = by_idx.remove(&idx) {
            scope.attrs.extend(attrs);
        }
    });
    for idx in by_idx.keys() {
        warn!(idx, "attrs entry references a scope index out of range");
    }
    db.attrs.extend(payload.global);
    Ok(())
}
