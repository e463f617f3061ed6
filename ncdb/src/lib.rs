//! Compact ZIP-packaged binary archive format for coverage databases.
//!
//! # Overview
//!
//! NCDB persists a full [coverdb_model::Database] as a multi-member ZIP
//! archive. The hierarchy is encoded by a custom tree serialization with
//! presence bitfields and a toggle-pair compression shortcut; hit counts and
//! per-test contributions travel in independent varint/delta streams; every
//! orthogonal facet (attributes, tags, formal results, FSM indices, toggle
//! metadata, ...) has its own sub-codec whose member appears in the archive
//! only when it carries non-default data.
//!
//! # Members
//!
//! ```text
//! manifest.json       format identity, statistics, schema hash
//! strings.bin         interned scope/bin names
//! files.bin           interned (path, workdir) source files
//! scope_tree.bin      depth-first structural encoding (no counts)
//! counts.bin          hit counts, depth-first order, lock-step with the tree
//! history.json        test/merge metadata
//! attrs.json          per-scope + global attributes          (optional)
//! tags.json           per-scope tag sets                     (optional)
//! properties.json     string-property overrides              (optional)
//! toggle.json         divergent toggle metadata              (optional)
//! fsm.json            divergent FSM state indices            (optional)
//! formal.json         formal verification results            (optional)
//! design_units.json   name -> scope-index cache, rebuildable (optional)
//! item_flags.bin      sparse cover-item flags                (optional)
//! contrib/<i>.bin     per-test contribution map, one member per test
//! ```
//!
//! A member's presence signals "this facet has data"; readers treat every
//! non-mandatory member as optional. Structural decode failures are fatal
//! and name the failing member and byte offset; an out-of-range index inside
//! a feature member only skips that entry.
//!
//! # Example
//!
//! ```
//! use coverdb_model::{CoverItem, CoverKind, Database, Scope, ScopeKind};
//! use std::io::Cursor;
//!
//! let mut db = Database::new();
//! let top = db.add_root(Scope::new(ScopeKind::Instance, "top"));
//! top.add_item(CoverItem::new(CoverKind::StmtBin, "s0", 3));
//!
//! let mut buf = Cursor::new(Vec::new());
//! coverdb_ncdb::write(&db, &mut buf).unwrap();
//! let decoded = coverdb_ncdb::read(Cursor::new(buf.into_inner())).unwrap();
//! assert_eq!(decoded.database, db);
//! ```

pub mod attrs;
pub mod contrib;
pub mod counts;
pub mod design_units;
pub mod detect;
pub mod error;
pub mod formal;
pub mod fsm;
pub mod history;
pub mod item_flags;
pub mod manifest;
pub mod properties;
pub mod reader;
pub mod strings;
pub mod tags;
pub mod toggle;
pub mod tree;
pub mod varint;
pub mod writer;

pub use design_units::DesignUnitIndex;
pub use detect::{detect, FileFormat};
pub use error::{CodecError, Error};
pub use manifest::Manifest;
pub use reader::{read, read_path, DecodedArchive};
pub use writer::{write, write_path};

/// Archive member names, in their fixed layout order.
pub const MEMBER_MANIFEST: &str = "manifest.json";
pub const MEMBER_STRINGS: &str = "strings.bin";
pub const MEMBER_FILES: &str = "files.bin";
pub const MEMBER_SCOPE_TREE: &str = "scope_tree.bin";
pub const MEMBER_COUNTS: &str = "counts.bin";
pub const MEMBER_HISTORY: &str = "history.json";
pub const MEMBER_ATTRS: &str = "attrs.json";
pub const MEMBER_TAGS: &str = "tags.json";
pub const MEMBER_PROPERTIES: &str = "properties.json";
pub const MEMBER_TOGGLE: &str = "toggle.json";
pub const MEMBER_FSM: &str = "fsm.json";
pub const MEMBER_FORMAL: &str = "formal.json";
pub const MEMBER_DESIGN_UNITS: &str = "design_units.json";
pub const MEMBER_ITEM_FLAGS: &str = "item_flags.bin";
/// Directory prefix for per-test contribution members.
pub const MEMBER_CONTRIB_DIR: &str = "contrib/";
