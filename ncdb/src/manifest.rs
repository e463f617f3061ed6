//! Archive manifest (`manifest.json`).
//!
//! Carries format identity, summary statistics, and a hash of the
//! uncompressed scope-tree bytes. Two archives with equal schema hashes have
//! byte-identical trees, which lets a merge engine add their count streams
//! element-wise without parsing either tree.

use crate::error::Error;
use crate::MEMBER_MANIFEST;
use coverdb_model::{Database, HistoryKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Format identity string every NCDB manifest must carry.
pub const FORMAT: &str = "NCDB";
/// Encoding version written by this implementation.
pub const VERSION: &str = "1.0";
const GENERATOR: &str = "coverdb-ncdb";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub format: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub created: String,
    #[serde(default = "default_separator")]
    pub path_separator: String,
    #[serde(default)]
    pub scope_count: u64,
    #[serde(default)]
    pub coveritem_count: u64,
    #[serde(default)]
    pub test_count: u64,
    #[serde(default)]
    pub total_hits: u64,
    #[serde(default)]
    pub covered_bins: u64,
    #[serde(default)]
    pub schema_hash: String,
    #[serde(default)]
    pub generator: String,
}

fn default_separator() -> String {
    "/".to_string()
}

impl Manifest {
    /// Builds a manifest from the database and its serialized members.
    pub fn build(db: &Database, scope_tree: &[u8], counts: &[u64]) -> Self {
        let total_hits = counts.iter().fold(0u64, |acc, &c| acc.saturating_add(c));
        let covered_bins = counts.iter().filter(|&&c| c > 0).count() as u64;
        let test_count = db
            .history
            .iter()
            .filter(|node| node.kind == HistoryKind::Test)
            .count() as u64;
        Self {
            format: FORMAT.to_string(),
            version: VERSION.to_string(),
            created: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            path_separator: db.path_separator.to_string(),
            scope_count: db.scope_count(),
            coveritem_count: counts.len() as u64,
            test_count,
            total_hits,
            covered_bins,
            schema_hash: Self::schema_hash(scope_tree),
            generator: GENERATOR.to_string(),
        }
    }

    /// SHA-256 of the uncompressed scope-tree bytes, `sha256:`-prefixed.
    pub fn schema_hash(scope_tree: &[u8]) -> String {
        let digest = Sha256::digest(scope_tree);
        let mut hash = String::with_capacity(7 + digest.len() * 2);
        hash.push_str("sha256:");
        for byte in digest {
            hash.push_str(&format!("{byte:02x}"));
        }
        hash
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec_pretty(self).map_err(|e| Error::json(MEMBER_MANIFEST, e))
    }

    /// Parses the manifest and rejects any format other than NCDB.
    pub fn deserialize(data: &[u8]) -> Result<Self, Error> {
        let manifest: Self =
            serde_json::from_slice(data).map_err(|e| Error::json(MEMBER_MANIFEST, e))?;
        if manifest.format != FORMAT {
            return Err(Error::Format(manifest.format));
        }
        Ok(manifest)
    }
}
