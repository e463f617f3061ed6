//! Toggle-scope metadata serialization (`toggle.json`).
//!
//! Persists per-toggle-scope fields the scope tree does not carry: the
//! canonical hierarchical signal name, the toggle kind, and the signal
//! direction. Only values diverging from the computed defaults (canonical
//! name = scope name, kind = NET, direction = INTERNAL) are stored; when
//! every toggle scope is default the member is omitted.

use crate::error::Error;
use crate::MEMBER_TOGGLE;
use coverdb_model::{Database, ScopeKind, ToggleDir, ToggleKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

const VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Entry {
    idx: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    canonical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dir: Option<u8>,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    version: u32,
    #[serde(default)]
    entries: Vec<Entry>,
}

/// Returns empty bytes when every toggle scope carries default metadata.
pub fn serialize(db: &Database) -> Result<Vec<u8>, Error> {
    let mut entries = Vec::new();
    db.for_each_scope(|idx, scope| {
        if scope.kind != ScopeKind::Toggle {
            return;
        }
        let canonical =
            (scope.canonical_name() != scope.name).then(|| scope.canonical_name().to_string());
        let kind = (scope.toggle_kind() != ToggleKind::default())
            .then(|| scope.toggle_kind().code());
        let dir =
            (scope.toggle_dir() != ToggleDir::default()).then(|| scope.toggle_dir().code());
        if canonical.is_some() || kind.is_some() || dir.is_some() {
            entries.push(Entry {
                idx,
                canonical,
                kind,
                dir,
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
    serde_json::to_vec(&payload).map_err(|e| Error::json(MEMBER_TOGGLE, e))
}

/// Applies stored toggle metadata onto toggle scopes.
pub fn apply(db: &mut Database, data: &[u8]) -> Result<(), Error> {
    if data.is_empty() {
        return Ok(());
    }
    let payload: Payload =
        serde_json::from_slice(data).map_err(|e| Error::json(MEMBER_TOGGLE, e))?;
    if payload.version != VERSION {
        return Err(Error::UnsupportedVersion {
            member: MEMBER_TOGGLE.to_string(),
            version: payload.version,
        });
    }

    let mut by_idx: BTreeMap<u64, Entry> = BTreeMap::new();
    for entry in payload.entries {
        by_idx.insert(entry.idx, entry);
    }
    db.for_each_scope_mut(|idx, scope| {
        let Some(entry) = by_idx.remove(&idx) else {
            return;
        };
        if scope.kind != ScopeKind::Toggle {
            warn!(idx, "toggle entry addresses a non-toggle scope, skipped");
            return;
        }
        if let Some(canonical) = entry.canonical {
            scope.toggle.canonical = Some(canonical);
        }
        if let Some(code) = entry.kind {
            match ToggleKind::from_code(code) {
                Some(kind) => scope.toggle.kind = Some(kind),
                None => warn!(code, "unknown toggle kind code, field skipped"),
            }
        }
        if let Some(code) = entry.dir {
            match ToggleDir::from_code(code) {
                Some(dir) => scope.toggle.dir = Some(dir),
                None => warn!(code, "unknown toggle direction code, field skipped"),
            }
        }
    });
    for idx in by_idx.keys() {
        warn!(idx, "toggle entry references a scope index out of range");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverdb_model::Scope;

    fn toggle_db() -> Database {
        let mut db = Database::new();
        let top = db.add_root(Scope::new(ScopeKind::Instance, "top"));
        top.add_child(Scope::new(ScopeKind::Toggle, "clk"));
        top.add_child(Scope::new(ScopeKind::Toggle, "data"));
        db
    }

    #[test]
    fn test_all_defaults_serialize_to_nothing() {
        assert!(serialize(&toggle_db()).unwrap().is_empty());

        // Explicit values equal to the defaults are still default data.
        let mut db = toggle_db();
        db.roots[0].children[0].toggle.kind = Some(ToggleKind::Net);
        db.roots[0].children[0].toggle.dir = Some(ToggleDir::Internal);
        assert!(serialize(&db).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_of_divergent_metadata() {
        let mut db = toggle_db();
        {
            let clk = &mut db.roots[0].children[0];
            clk.toggle.canonical = Some("top.u_core.clk".to_string());
            clk.toggle.dir = Some(ToggleDir::In);
        }
        {
            let data = &mut db.roots[0].children[1];
            data.toggle.kind = Some(ToggleKind::Reg);
        }

        let bytes = serialize(&db).unwrap();
        let mut decoded = toggle_db();
        apply(&mut decoded, &bytes).unwrap();

        let clk = &decoded.roots[0].children[0];
        assert_eq!(clk.canonical_name(), "top.u_core.clk");
        assert_eq!(clk.toggle_dir(), ToggleDir::In);
        assert_eq!(clk.toggle_kind(), ToggleKind::Net);

        let data = &decoded.roots[0].children[1];
        assert_eq!(data.canonical_name(), "data");
        assert_eq!(data.toggle_kind(), ToggleKind::Reg);
    }

    #[test]
    fn test_bad_entries_skipped() {
        let payload = br#"{"version":1,"entries":[
            {"idx":0,"canonical":"x"},
            {"idx":9,"kind":2},
            {"idx":1,"kind":99,"dir":2}]}"#;
        let mut db = toggle_db();
        apply(&mut db, payload).unwrap();
        // idx 0 is the instance scope: skipped. idx 1 is "clk": the unknown
        // kind code is dropped but the direction still applies.
        let clk = &db.roots[0].children[0];
        assert_eq!(clk.toggle_kind(), ToggleKind::Net);
        assert_eq!(clk.toggle_dir(), ToggleDir::In);
    }
}
