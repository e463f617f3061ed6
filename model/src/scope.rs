//! Scopes and cover items.

use crate::types::{CoverKind, ScopeKind, StrProperty, ToggleDir, ToggleKind};
use std::collections::{BTreeMap, BTreeSet};

/// Implicit bin name for the rising (`0 -> 1`) transition of a toggle pair.
pub const TOGGLE_BIN_RISE: &str = "0->1";

/// Implicit bin name for the falling (`1 -> 0`) transition of a toggle pair.
pub const TOGGLE_BIN_FALL: &str = "1->0";

/// A source location attached to a scope.
///
/// `file` indexes the database's [crate::SourceFile] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceInfo {
    pub file: u32,
    pub line: u32,
    pub token: u32,
}

/// Toggle metadata stored on a `ScopeKind::Toggle` scope.
///
/// Every field is an override: `None` means "use the computed default"
/// (canonical name = the scope name, kind = [ToggleKind::Net], direction =
/// [ToggleDir::Internal]). Effective values are exposed through
/// [Scope::canonical_name], [Scope::toggle_kind], and [Scope::toggle_dir].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleInfo {
    pub canonical: Option<String>,
    pub kind: Option<ToggleKind>,
    pub dir: Option<ToggleDir>,
}

impl ToggleInfo {
    /// Whether every field is the computed default.
    pub fn is_default(&self) -> bool {
        self.canonical.is_none()
            && self.kind.unwrap_or_default() == ToggleKind::default()
            && self.dir.unwrap_or_default() == ToggleDir::default()
    }
}

/// A single coverage bin: a named, typed, unsigned hit counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverItem {
    pub kind: CoverKind,
    pub name: String,
    /// Hit count. Unbounded magnitude as far as the model is concerned;
    /// backends must preserve values beyond `u32::MAX`.
    pub count: u64,
    pub flags: u32,
    /// Sparse string-property overrides, keyed by property identifier.
    pub properties: BTreeMap<StrProperty, String>,
}

impl CoverItem {
    pub fn new(kind: CoverKind, name: impl Into<String>, count: u64) -> Self {
        Self {
            kind,
            name: name.into(),
            count,
            flags: 0,
            properties: BTreeMap::new(),
        }
    }
}

/// A hierarchical coverage container.
///
/// Children and cover items are ordered; that order is part of the canonical
/// depth-first addressing every index-based consumer relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: String,
    pub weight: u32,
    pub flags: u32,
    pub goal: Option<u32>,
    pub source: Option<SourceInfo>,
    /// User-defined attributes (sparse).
    pub attrs: BTreeMap<String, String>,
    /// Free-text tags (sparse).
    pub tags: BTreeSet<String>,
    /// Sparse string-property overrides.
    pub properties: BTreeMap<StrProperty, String>,
    /// Toggle metadata; only meaningful on `ScopeKind::Toggle` scopes.
    pub toggle: ToggleInfo,
    /// FSM state-index overrides keyed by state name; only meaningful on
    /// `ScopeKind::Fsm` scopes. A state absent from this map has its
    /// canonical positional index (see [Scope::fsm_state_index]).
    pub fsm_state_overrides: BTreeMap<String, u32>,
    pub items: Vec<CoverItem>,
    pub children: Vec<Scope>,
}

impl Scope {
    pub fn new(kind: ScopeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            weight: 1,
            flags: 0,
            goal: None,
            source: None,
            attrs: BTreeMap::new(),
            tags: BTreeSet::new(),
            properties: BTreeMap::new(),
            toggle: ToggleInfo::default(),
            fsm_state_overrides: BTreeMap::new(),
            items: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Appends a child scope and returns a mutable reference to it.
    pub fn add_child(&mut self, child: Scope) -> &mut Scope {
        self.children.push(child);
        self.children.last_mut().unwrap()
    }

    /// Appends a cover item.
    pub fn add_item(&mut self, item: CoverItem) {
        self.items.push(item);
    }

    /// Whether this scope matches the toggle-pair pattern: a BRANCH scope
    /// with no child scopes and exactly two TOGGLEBIN items named
    /// [TOGGLE_BIN_RISE] then [TOGGLE_BIN_FALL], in that order.
    pub fn is_toggle_pair(&self) -> bool {
        self.kind == ScopeKind::Branch
            && self.children.is_empty()
            && self.items.len() == 2
            && self.items[0].kind == CoverKind::ToggleBin
            && self.items[1].kind == CoverKind::ToggleBin
            && self.items[0].name == TOGGLE_BIN_RISE
            && self.items[1].name == TOGGLE_BIN_FALL
    }

    /// Effective canonical signal name for a toggle scope: the stored
    /// override, or the scope name.
    pub fn canonical_name(&self) -> &str {
        self.toggle.canonical.as_deref().unwrap_or(&self.name)
    }

    /// Effective toggle kind (override or [ToggleKind::Net]).
    pub fn toggle_kind(&self) -> ToggleKind {
        self.toggle.kind.unwrap_or_default()
    }

    /// Effective toggle direction (override or [ToggleDir::Internal]).
    pub fn toggle_dir(&self) -> ToggleDir {
        self.toggle.dir.unwrap_or_default()
    }

    /// Effective numeric index of an FSM state: the stored override, or the
    /// position of the identically-named bin in the FSM_STATES child scope.
    ///
    /// Returns `None` when this scope has no FSM_STATES child or the state
    /// name is unknown.
    pub fn fsm_state_index(&self, state: &str) -> Option<u32> {
        if let Some(idx) = self.fsm_state_overrides.get(state) {
            return Some(*idx);
        }
        let states = self
            .children
            .iter()
            .find(|child| child.kind == ScopeKind::FsmStates)?;
        states
            .items
            .iter()
            .position(|item| item.name == state)
            .map(|pos| pos as u32)
    }
}
