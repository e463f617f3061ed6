//! The top-level coverage database.

use crate::history::HistoryNode;
use crate::scope::{CoverItem, Scope};
use crate::types::{FormalStatus, SourceFile};
use std::collections::BTreeMap;

/// Formal verification data attached to one cover item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormalInfo {
    pub status: FormalStatus,
    pub radius: Option<u32>,
    pub witness: Option<String>,
}

impl FormalInfo {
    /// Whether every field carries its default value.
    pub fn is_default(&self) -> bool {
        self.status == FormalStatus::None && self.radius.is_none() && self.witness.is_none()
    }
}

/// A complete in-memory coverage database.
///
/// Scope and cover-item addressing is positional: the fixed depth-first walk
/// over `roots` (parents before children, siblings in order) assigns every
/// scope a zero-based index, and the same walk assigns every cover item a
/// zero-based global index. The contribution and formal tables, and every
/// index-addressed storage facet, use these indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub roots: Vec<Scope>,
    pub files: Vec<SourceFile>,
    pub history: Vec<HistoryNode>,
    /// history-node index -> { global cover-item index -> count }.
    pub contributions: BTreeMap<u32, BTreeMap<u64, u64>>,
    /// global cover-item index -> formal result.
    pub formal: BTreeMap<u64, FormalInfo>,
    /// Database-global attributes.
    pub attrs: BTreeMap<String, String>,
    pub path_separator: char,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            files: Vec::new(),
            history: Vec::new(),
            contributions: BTreeMap::new(),
            formal: BTreeMap::new(),
            attrs: BTreeMap::new(),
            path_separator: '/',
        }
    }

    /// Appends a root scope and returns a mutable reference to it.
    pub fn add_root(&mut self, scope: Scope) -> &mut Scope {
        self.roots.push(scope);
        self.roots.last_mut().unwrap()
    }

    /// Interns a source file, returning the existing index when an identical
    /// (path, workdir) record is already present.
    pub fn intern_file(&mut self, file: SourceFile) -> u32 {
        if let Some(idx) = self.files.iter().position(|f| *f == file) {
            return idx as u32;
        }
        self.files.push(file);
        (self.files.len() - 1) as u32
    }

    /// Visits every scope in canonical depth-first order with its index.
    pub fn for_each_scope<F: FnMut(u64, &Scope)>(&self, mut f: F) {
        fn visit<F: FnMut(u64, &Scope)>(scope: &Scope, next: &mut u64, f: &mut F) {
            f(*next, scope);
            *next += 1;
            for child in &scope.children {
                visit(child, next, f);
            }
        }
        let mut next = 0;
        for root in &self.roots {
            visit(root, &mut next, &mut f);
        }
    }

    /// Mutable variant of [Database::for_each_scope].
    pub fn for_each_scope_mut<F: FnMut(u64, &mut Scope)>(&mut self, mut f: F) {
        fn visit<F: FnMut(u64, &mut Scope)>(scope: &mut Scope, next: &mut u64, f: &mut F) {
            f(*next, scope);
            *next += 1;
            for child in &mut scope.children {
                visit(child, next, f);
            }
        }
        let mut next = 0;
        for root in &mut self.roots {
            visit(root, &mut next, &mut f);
        }
    }

    /// Visits every cover item in canonical depth-first order with its global
    /// index.
    pub fn for_each_item<F: FnMut(u64, &CoverItem)>(&self, mut f: F) {
        let mut next = 0u64;
        self.for_each_scope(|_, scope| {
            for item in &scope.items {
                f(next, item);
                next += 1;
            }
        });
    }

    /// Mutable variant of [Database::for_each_item].
    pub fn for_each_item_mut<F: FnMut(u64, &mut CoverItem)>(&mut self, mut f: F) {
        let mut next = 0u64;
        self.for_each_scope_mut(|_, scope| {
            for item in &mut scope.items {
                f(next, item);
                next += 1;
            }
        });
    }

    /// Total number of scopes.
    pub fn scope_count(&self) -> u64 {
        let mut count = 0;
        self.for_each_scope(|_, _| count += 1);
        count
    }

    /// Total number of cover items.
    pub fn item_count(&self) -> u64 {
        let mut count = 0;
        self.for_each_item(|_, _| count += 1);
        count
    }

    /// Adds `count` to the contribution of history node `history` for the
    /// cover item at global index `item`.
    pub fn record_contribution(&mut self, history: u32, item: u64, count: u64) {
        *self
            .contributions
            .entry(history)
            .or_default()
            .entry(item)
            .or_insert(0) += count;
    }

    /// The contribution of one history node to one cover item, if recorded.
    pub fn contribution(&self, history: u32, item: u64) -> Option<u64> {
        self.contributions.get(&history)?.get(&item).copied()
    }

    /// Attaches formal data to the cover item at global index `item`.
    /// Fully-default data removes any existing entry.
    pub fn set_formal(&mut self, item: u64, info: FormalInfo) {
        if info.is_default() {
            self.formal.remove(&item);
        } else {
            self.formal.insert(item, info);
        }
    }
}
