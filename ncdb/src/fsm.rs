//! FSM state-index override serialization (`fsm.json`).
//!
//! State and transition names, and their hit counts, are already carried by
//! the scope tree as FSMBIN items inside FSM_STATES / FSM_TRANS sub-scopes.
//! The only data stored here is the numeric state index when it differs from
//! the state's canonical position (0, 1, 2, ... in bin order) — the common
//! sequential case serializes to nothing and the member is omitted.

use crate::error::Error;
use crate::MEMBER_FSM;
use coverdb_model::{Database, Scope, ScopeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

const VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StateEntry {
    name: String,
    index: u32,
}

#[derive(Serialize, Deserialize)]
struct FsmEntry {
    idx: u64,
    states: Vec<StateEntry>,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    version: u32,
    #[serde(default)]
    entries: Vec<FsmEntry>,
}

fn state_names(scope: &Scope) -> Option<&Scope> {
    scope
        .children
        .iter()
        .find(|child| child.kind == ScopeKind::FsmStates)
}

/// Returns empty bytes when every FSM state index equals its canonical
/// position.
pub fn serialize(db: &Database) -> Result<Vec<u8>, Error> {
    let mut entries = Vec::new();
    db.for_each_scope(|idx, scope| {
        if scope.kind != ScopeKind::Fsm {
            return;
        }
        let Some(states) = state_names(scope) else {
            return;
        };
        let mut divergent = Vec::new();
        for (pos, item) in states.items.iter().enumerate() {
            let effective = scope
                .fsm_state_index(&item.name)
                .unwrap_or(pos as u32);
            if effective != pos as u32 {
                divergent.push(StateEntry {
                    name: item.name.clone(),
                    index: effective,
                });
            }
        }
        if !divergent.is_empty() {
            entries.push(FsmEntry {
                idx,
                states: divergent,
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
    serde_json::to_vec(&payload).map_err(|e| Error::json(MEMBER_FSM, e))
}

/// Applies stored state-index overrides onto FSM scopes.
pub fn apply(db: &mut Database, data: &[u8]) -> Result<(), Error> {
    if data.is_empty() {
        return Ok(());
    }
    let payload: Payload = serde_json::from_slice(data).map_err(|e| Error::json(MEMBER_FSM, e))?;
    if payload.version != VERSION {
        return Err(Error::UnsupportedVersion {
            member: MEMBER_FSM.to_string(),
            version: payload.version,
        });
    }

    let mut by_idx: BTreeMap<u64, Vec<StateEntry>> = BTreeMap::new();
    for entry in payload.entries {
        by_idx.entry(entry.idx).or_default().extend(entry.states);
    }
    db.for_each_scope_mut(|idx, scope| {
        let Some(states) = by_idx.remove(&idx) else {
            return;
        };
        if scope.kind != ScopeKind::Fsm {
            warn!(idx, "fsm entry addresses a non-FSM scope, skipped");
            return;
        }
        let known: Vec<String> = state_names(scope)
            .map(|s| s.items.iter().map(|i| i.name.clone()).collect())
            .unwrap_or_default();
        for state in states {
            if known.iter().any(|name| *name == state.name) {
                scope.fsm_state_overrides.insert(state.name, state.index);
            } else {
                warn!(idx, state = %state.name, "fsm entry names an unknown state, skipped");
            }
        }
    });
    for idx in by_idx.keys() {
        warn!(idx, "fsm entry references a scope index out of range");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverdb_model::{CoverItem, CoverKind};

    fn fsm_db() -> Database {
        let mut db = Database::new();
        let fsm = db.add_root(Scope::new(ScopeKind::Fsm, "ctrl"));
        let states = fsm.add_child(Scope::new(ScopeKind::FsmStates, "states"));
        states.add_item(CoverItem::new(CoverKind::FsmBin, "IDLE", 9));
        states.add_item(CoverItem::new(CoverKind::FsmBin, "RUN", 4));
        states.add_item(CoverItem::new(CoverKind::FsmBin, "DONE", 2));
        let trans = fsm.add_child(Scope::new(ScopeKind::FsmTrans, "trans"));
        trans.add_item(CoverItem::new(CoverKind::FsmBin, "IDLE->RUN", 4));
        db
    }

    #[test]
    fn test_sequential_indices_serialize_to_nothing() {
        assert!(serialize(&fsm_db()).unwrap().is_empty());

        // Overrides equal to the canonical position are still default data.
        let mut db = fsm_db();
        db.roots[0].fsm_state_overrides.insert("RUN".to_string(), 1);
        assert!(serialize(&db).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_of_divergent_indices() {
        let mut db = fsm_db();
        // RTL enumeration values: IDLE=0, RUN=5, DONE=6.
        db.roots[0].fsm_state_overrides.insert("RUN".to_string(), 5);
        db.roots[0].fsm_state_overrides.insert("DONE".to_string(), 6);

        let bytes = serialize(&db).unwrap();
        let mut decoded = fsm_db();
        apply(&mut decoded, &bytes).unwrap();

        assert_eq!(decoded.roots[0].fsm_state_index("IDLE"), Some(0));
        assert_eq!(decoded.roots[0].fsm_state_index("RUN"), Some(5));
        assert_eq!(decoded.roots[0].fsm_state_index("DONE"), Some(6));
    }

    #[test]
    fn test_unknown_state_and_scope_skipped() {
        let payload = br#"{"version":1,"entries":[
            {"idx":0,"states":[{"name":"GHOST","index":9},{"name":"RUN","index":3}]},
            {"idx":42,"states":[{"name":"IDLE","index":1}]}]}"#;
        let mut db = fsm_db();
        apply(&mut db, payload).unwrap();
        assert_eq!(db.roots[0].fsm_state_index("RUN"), Some(3));
        assert!(!db.roots[0].fsm_state_overrides.contains_key("GHOST"));
    }
}
