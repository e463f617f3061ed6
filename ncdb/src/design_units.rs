//! Design-unit lookup index (`design_units.json`).
//!
//! Maps design-unit names (module/package/program/interface definitions) to
//! their depth-first scope indices so tools can find them without scanning
//! the whole tree. The member is a pure cache: [DesignUnitIndex::from_scan]
//! rebuilds the identical index from the tree, so readers treat the member
//! as optional and both constructors expose the same lookup surface.

use crate::error::Error;
use crate::MEMBER_DESIGN_UNITS;
use coverdb_model::Database;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

const VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Unit {
    name: String,
    idx: u64,
    #[serde(rename = "type")]
    kind: u64,
}

#[derive(Serialize, Deserialize)]
struct Payload {
    version: u32,
    #[serde(default)]
    units: Vec<Unit>,
}

/// Name → depth-first scope index for every design-unit scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignUnitIndex {
    map: BTreeMap<String, u64>,
}

impl DesignUnitIndex {
    /// Builds the index by scanning the tree. Always available.
    pub fn from_scan(db: &Database) -> Self {
        let mut map = BTreeMap::new();
        db.for_each_scope(|idx, scope| {
            if scope.kind.is_design_unit() {
                map.insert(scope.name.clone(), idx);
            }
        });
        Self { map }
    }

    /// Builds the index from the cache member, validating each entry against
    /// the materialized tree: an entry whose index is out of range or does
    /// not point at a design-unit scope is dropped.
    pub fn from_cache(data: &[u8], db: &Database) -> Result<Self, Error> {
        let payload: Payload =
            serde_json::from_slice(data).map_err(|e| Error::json(MEMBER_DESIGN_UNITS, e))?;
        if payload.version != VERSION {
            return Err(Error::UnsupportedVersion {
                member: MEMBER_DESIGN_UNITS.to_string(),
                version: payload.version,
            });
        }

        let mut kinds = BTreeMap::new();
        db.for_each_scope(|idx, scope| {
            kinds.insert(idx, scope.kind);
        });
        let mut map = BTreeMap::new();
        for unit in payload.units {
            match kinds.get(&unit.idx) {
                Some(kind) if kind.is_design_unit() => {
                    map.insert(unit.name, unit.idx);
                }
                Some(_) => {
                    warn!(idx = unit.idx, name = %unit.name, "design-unit entry points at a non-DU scope, dropped");
                }
                None => {
                    warn!(idx = unit.idx, name = %unit.name, "design-unit entry out of range, dropped");
                }
            }
        }
        Ok(Self { map })
    }

    /// The depth-first scope index of the named design unit.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.map.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.map.iter().map(|(name, &idx)| (name.as_str(), idx))
    }
}

/// Returns empty bytes when the tree contains no design-unit scope.
pub fn serialize(db: &Database) -> Result<Vec<u8>, Error> {
    let mut units = Vec::new();
    db.for_each_scope(|idx, scope| {
        if scope.kind.is_design_unit() {
            units.push(Unit {
                name: scope.name.clone(),
                idx,
                kind: scope.kind.code(),
            });
        }
    });
    if units.is_empty() {
        return Ok(Vec::new());
    }
    let payload = Payload {
        version: VERSION,
        units,
    };
    serde_json::to_vec(&payload).map_err(|e| Error::json(MEMBER_DESIGN_UNITS, e))
}
