//! Formal verification result serialization (`formal.json`).
//!
//! Stores per-coveritem formal results (status, proof radius, witness file
//! path) addressed by global cover-item index. Entries whose every field is
//! the default are dropped; when nothing remains the member is omitted.

use crate::error::Error;
use crate::MEMBER_FORMAL;
use coverdb_model::{Database, FormalInfo, FormalStatus};
use serde::{Deserialize, Serialize};
use tracing::warn;

const VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Entry {
    idx: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    radius: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    witness: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    version: u32,
    #[serde(default)]
    entries: Vec<Entry>,
}

/// Returns empty bytes when no cover item carries non-default formal data.
pub fn serialize(db: &Database) -> Result<Vec<u8>, Error> {
    let mut entries = Vec::new();
    for (&idx, info) in &db.formal {
        if info.is_default() {
            continue;
        }
        entries.push(Entry {
            idx,
            status: (info.status != FormalStatus::None).then(|| info.status.code()),
            radius: info.radius,
            witness: info.witness.clone(),
        });
    }
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    let payload = Payload {
        version: VERSION,
        entries,
    };
    serde_json::to_vec(&payload).map_err(|e| Error::json(MEMBER_FORMAL, e))
}

/// Applies stored formal results onto the database.
pub fn apply(db: &mut Database, data: &[u8]) -> Result<(), Error> {
    if data.is_empty() {
        return Ok(());
    }
    let payload: Payload =
        serde_json::from_slice(data).map_err(|e| Error::json(MEMBER_FORMAL, e))?;
    if payload.version != VERSION {
        return Err(Error::UnsupportedVersion {
            member: MEMBER_FORMAL.to_string(),
            version: payload.version,
        });
    }

    let item_count = db.item_count();
    for entry in payload.entries {
        if entry.idx >= item_count {
            warn!(idx = entry.idx, "formal entry references an item index out of range");
            continue;
        }
        let status = match entry.status {
            None => FormalStatus::None,
            Some(code) => match FormalStatus::from_code(code) {
                Some(status) => status,
                None => {
                    warn!(code, "unknown formal status code, entry skipped");
                    continue;
                }
            },
        };
        db.set_formal(
            entry.idx,
            FormalInfo {
                status,
                radius: entry.radius,
                witness: entry.witness,
            },
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverdb_model::{CoverItem, CoverKind, Scope, ScopeKind};

    fn assert_db() -> Database {
        let mut db = Database::new();
        let a = db.add_root(Scope::new(ScopeKind::Assert, "a_req_ack"));
        a.add_item(CoverItem::new(CoverKind::AssertBin, "fail", 0));
        let c = db.add_root(Scope::new(ScopeKind::Cover, "c_burst"));
        c.add_item(CoverItem::new(CoverKind::CoverBin, "pass", 3));
        db
    }

    #[test]
    fn test_round_trip() {
        let mut db = assert_db();
        db.set_formal(
            0,
            FormalInfo {
                status: FormalStatus::Proof,
                radius: Some(25),
                witness: None,
            },
        );
        db.set_formal(
            1,
            FormalInfo {
                status: FormalStatus::Inconclusive,
                radius: None,
                witness: Some("traces/burst.vcd".to_string()),
            },
        );

        let bytes = serialize(&db).unwrap();
        let mut decoded = assert_db();
        apply(&mut decoded, &bytes).unwrap();
        assert_eq!(decoded.formal, db.formal);
    }

    #[test]
    fn test_omission_when_all_default() {
        let db = assert_db();
        assert!(serialize(&db).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_and_unknown_status_skipped() {
        let payload = br#"{"version":1,"entries":[
            {"idx":50,"status":2},
            {"idx":0,"status":99},
            {"idx":1,"status":1}]}"#;
        let mut db = assert_db();
        apply(&mut db, payload).unwrap();
        assert_eq!(db.formal.len(), 1);
        assert_eq!(db.formal.get(&1).unwrap().status, FormalStatus::Failure);
    }
}
