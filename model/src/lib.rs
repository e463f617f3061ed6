//! In-memory coverage-database graph shared by all storage backends.
//!
//! # Overview
//!
//! This crate defines the generic coverage-database graph of the UCIS data
//! model: a tree of [Scope]s carrying ordered [CoverItem]s, a table of
//! [HistoryNode]s describing the test runs that produced the data, an
//! interned [SourceFile] table, and the sparse per-test contribution table.
//!
//! The graph is a pure in-memory structure with no knowledge of any on-disk
//! format. Storage backends (the NCDB archive codec, and the SQL/XML/YAML
//! backends that live outside this workspace) produce and consume this graph;
//! merge and reporting layers consume it read-only.
//!
//! # Addressing
//!
//! A fixed depth-first traversal order over scopes is canonical. Every
//! index-addressed consumer (feature codecs, the contribution table, the
//! formal-result table) refers to scopes by their position in that order and
//! to coveritems by the global position of the item in the same walk. See
//! [Database::for_each_scope] and [Database::for_each_item].

mod database;
mod history;
mod scope;
mod types;

pub use database::{Database, FormalInfo};
pub use history::{HistoryKind, HistoryNode, TestStatus};
pub use scope::{CoverItem, Scope, SourceInfo, ToggleInfo, TOGGLE_BIN_FALL, TOGGLE_BIN_RISE};
pub use types::{CoverKind, FormalStatus, ScopeKind, SourceFile, StrProperty, ToggleDir, ToggleKind};
