//! String-property override serialization (`properties.json`).
//!
//! Entries are kind-tagged: `"scope"` entries address the tree by depth-first
//! scope index, `"item"` entries by global cover-item index. Only explicitly
//! set properties are stored; an entry with an unknown kind or property code
//! is skipped (it may come from a newer writer), never fatal.

use crate::error::Error;
use crate::MEMBER_PROPERTIES;
use coverdb_model::{Database, StrProperty};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

const VERSION: u32 = 1;

const KIND_SCOPE: &str = "scope";
const KIND_ITEM: &str = "item";

#[derive(Serialize, Deserialize)]
struct Entry {
    kind: String,
    idx: u64,
    key: u32,
    value: String,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    version: u32,
    #[serde(default)]
    entries: Vec<Entry>,
}

/// Returns empty bytes when no property override is set anywhere.
pub fn serialize(db: &Database) -> Result<Vec<u8>, Error> {
    let mut entries = Vec::new();
    db.for_each_scope(|idx, scope| {
        for (&key, value) in &scope.properties {
            entries.push(Entry {
                kind: KIND_SCOPE.to_string(),
                idx,
                key: key.code(),
                value: value.clone(),
            });
        }
    });
    db.for_each_item(|idx, item| {
        for (&key, value) in &item.properties {
            entries.push(Entry {
                kind: KIND_ITEM.to_string(),
                idx,
                key: key.code(),
                value: value.clone(),
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
    serde_json::to_vec(&payload).map_err(|e| Error::json(MEMBER_PROPERTIES, e))
}

/// Applies stored property overrides onto the materialized tree.
pub fn apply(db: &mut Database, data: &[u8]) -> Result<(), Error> {
    if data.is_empty() {
        return Ok(());
    }
    let payload: Payload =
        serde_json::from_slice(data).map_err(|e| Error::json(MEMBER_PROPERTIES, e))?;
    if payload.version != VERSION {
        return Err(Error::UnsupportedVersion {
            member: MEMBER_PROPERTIES.to_string(),
            version: payload.version,
        });
    }

    let mut scope_props: BTreeMap<u64, Vec<(StrProperty, String)>> = BTreeMap::new();
    let mut item_props: BTreeMap<u64, Vec<(StrProperty, String)>> = BTreeMap::new();
    for entry in payload.entries {
        let Some(key) = StrProperty::from_code(entry.key) else {
            warn!(key = entry.key, "unknown property code, entry skipped");
            continue;
        };
        match entry.kind.as_str() {
            KIND_SCOPE => scope_props
                .entry(entry.idx)
                .or_default()
                .push((key, entry.value)),
            KIND_ITEM => item_props
                .entry(entry.idx)
                .or_default()
                .push((key, entry.value)),
            other => warn!(kind = other, "unknown property entry kind, skipped"),
        }
    }

    db.for_each_scope_mut(|idx, scope| {
        if let Some(props) = scope_props.remove(&idx) {
            scope.properties.extend(props);
        }
    });
    db.for_each_item_mut(|idx, item| {
        if let Some(props) = item_props.remove(&idx) {
            item.properties.extend(props);
        }
    });
    for idx in scope_props.keys() {
        warn!(idx, "property entry references a scope index out of range");
    }
    for idx in item_props.keys() {
        warn!(idx, "property entry references an item index out of range");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverdb_model::{CoverItem, CoverKind, Scope, ScopeKind};

    fn sample() -> Database {
        let mut db = Database::new();
        let top = db.add_root(Scope::new(ScopeKind::Covergroup, "cg"));
        let cp = top.add_child(Scope::new(ScopeKind::Coverpoint, "cp"));
        cp.add_item(CoverItem::new(CoverKind::CvgBin, "low", 1));
        cp.add_item(CoverItem::new(CoverKind::CvgBin, "high", 0));
        db
    }

    #[test]
    fn test_round_trip() {
        let mut db = sample();
        db.roots[0]
            .properties
            .insert(StrProperty::Comment, "top-level covergroup".to_string());
        db.roots[0].children[0].items[1]
            .properties
            .insert(StrProperty::Comment, "never hit in smoke".to_string());

        let bytes = serialize(&db).unwrap();
        let mut decoded = sample();
        apply(&mut decoded, &bytes).unwrap();

        assert_eq!(
            decoded.roots[0].properties.get(&StrProperty::Comment).unwrap(),
            "top-level covergroup"
        );
        assert_eq!(
            decoded.roots[0].children[0].items[1]
                .properties
                .get(&StrProperty::Comment)
                .unwrap(),
            "never hit in smoke"
        );
        // The untouched item stays empty.
        assert!(decoded.roots[0].children[0].items[0].properties.is_empty());
    }

    #[test]
    fn test_omission_when_empty() {
        assert!(serialize(&sample()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_kind_and_key_are_skipped() {
        let payload = br#"{"version":1,"entries":[
            {"kind":"history","idx":0,"key":12,"value":"x"},
            {"kind":"scope","idx":0,"key":9999,"value":"y"},
            {"kind":"scope","idx":0,"key":12,"value":"kept"}]}"#;
        let mut db = sample();
        apply(&mut db, payload).unwrap();
        assert_eq!(db.roots[0].properties.get(&StrProperty::Comment).unwrap(), "kept");
        assert_eq!(db.roots[0].properties.len(), 1);
    }
}
