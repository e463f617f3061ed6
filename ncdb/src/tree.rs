//! Scope-tree serialization.
//!
//! Encodes the scope hierarchy depth-first, structure only: hit counts live
//! in the counts member and are pulled in lock-step during decode. Each scope
//! is one record:
//!
//! ```text
//! REGULAR:      +-----+------+------+--------+-------+----------+
//!               | tag | kind | name | weight | flags | presence |
//!               +-----+------+------+--------+-------+----------+
//!               [file line token] [goal]
//!               +-------+--------------------+--------+-----------+
//!               | items | item_kind + names  | childs | child ... |
//!               +-------+--------------------+--------+-----------+
//! TOGGLE_PAIR:  +-----+------+
//!               | tag | name |
//!               +-----+------+
//! ```
//!
//! All integers are varints; names are string-table indices. The presence
//! bitfield keeps the common "no source info" case down to a single zero
//! byte. A BRANCH scope qualifies for the `TOGGLE_PAIR` shortcut iff it has
//! no child scopes and exactly two TOGGLEBIN items named `"0->1"` then
//! `"1->0"`; the record then implies both bins and consumes two counts.
//!
//! Unknown record tags, scope/cover kind codes, and presence bits are hard
//! decode errors so that format-version skew surfaces instead of being
//! silently skipped.

use crate::counts::CountsReader;
use crate::error::CodecError;
use crate::strings::{FileTable, StringTable};
use crate::varint;
use coverdb_model::{
    CoverItem, CoverKind, Database, Scope, ScopeKind, SourceInfo, TOGGLE_BIN_FALL, TOGGLE_BIN_RISE,
};
use tracing::warn;

/// Record tag for a fully-described scope.
pub const TAG_REGULAR: u8 = 0x00;
/// Record tag for the compact toggle-pair form.
pub const TAG_TOGGLE_PAIR: u8 = 0x01;

const PRESENCE_SOURCE: u64 = 0x01;
const PRESENCE_GOAL: u64 = 0x02;
const PRESENCE_MASK: u64 = PRESENCE_SOURCE | PRESENCE_GOAL;

/// Serializes the scope hierarchy of `db`.
///
/// Populates `strings` with every scope and item name, `files` with every
/// referenced source file (first-use order), and returns the tree bytes plus
/// the depth-first count list for the counts member. Never fails for a valid
/// in-memory graph.
pub struct TreeWriter<'a> {
    strings: &'a mut StringTable,
    files: &'a mut FileTable,
    counts: Vec<u64>,
    buf: Vec<u8>,
}

impl<'a> TreeWriter<'a> {
    pub fn new(strings: &'a mut StringTable, files: &'a mut FileTable) -> Self {
        Self {
            strings,
            files,
            counts: Vec::new(),
            buf: Vec::new(),
        }
    }

    /// Walks `db` depth-first and returns `(tree_bytes, counts)`.
    pub fn write(mut self, db: &Database) -> (Vec<u8>, Vec<u64>) {
        for root in &db.roots {
            self.write_scope(root, db);
        }
        (self.buf, self.counts)
    }

    fn write_scope(&mut self, scope: &Scope, db: &Database) {
        if scope.is_toggle_pair() {
            self.buf.push(TAG_TOGGLE_PAIR);
            let name = self.strings.intern(&scope.name);
            varint::write(u64::from(name), &mut self.buf);
            self.counts.push(scope.items[0].count);
            self.counts.push(scope.items[1].count);
            return;
        }

        self.buf.push(TAG_REGULAR);
        varint::write(scope.kind.code(), &mut self.buf);
        let name = self.strings.intern(&scope.name);
        varint::write(u64::from(name), &mut self.buf);
        varint::write(u64::from(scope.weight), &mut self.buf);
        varint::write(u64::from(scope.flags), &mut self.buf);

        // A source reference is only kept when it resolves in the database's
        // file table.
        let source = scope
            .source
            .and_then(|src| db.files.get(src.file as usize).map(|file| (src, file)));
        let mut presence = 0;
        if source.is_some() {
            presence |= PRESENCE_SOURCE;
        }
        if scope.goal.is_some() {
            presence |= PRESENCE_GOAL;
        }
        varint::write(presence, &mut self.buf);
        if let Some((src, file)) = source {
            let file_id = self.files.intern(file);
            varint::write(u64::from(file_id), &mut self.buf);
            varint::write(u64::from(src.line), &mut self.buf);
            varint::write(u64::from(src.token), &mut self.buf);
        }
        if let Some(goal) = scope.goal {
            varint::write(u64::from(goal), &mut self.buf);
        }

        varint::write(scope.items.len() as u64, &mut self.buf);
        if !scope.items.is_empty() {
            // One dominant cover kind per scope; individual items inherit it
            // on decode.
            varint::write(scope.items[0].kind.code(), &mut self.buf);
            for item in &scope.items {
                let name = self.strings.intern(&item.name);
                varint::write(u64::from(name), &mut self.buf);
                self.counts.push(item.count);
            }
        }

        varint::write(scope.children.len() as u64, &mut self.buf);
        for child in &scope.children {
            self.write_scope(child, db);
        }
    }
}

/// Rebuilds the scope hierarchy from tree bytes, pulling hit counts from
/// `counts` in lock-step.
pub struct TreeReader<'a> {
    strings: &'a StringTable,
    file_count: usize,
}

impl<'a> TreeReader<'a> {
    pub fn new(strings: &'a StringTable, file_count: usize) -> Self {
        Self {
            strings,
            file_count,
        }
    }

    /// Decodes every root record in `data`.
    pub fn read(
        &self,
        data: &[u8],
        counts: &mut CountsReader,
    ) -> Result<Vec<Scope>, CodecError> {
        let mut roots = Vec::new();
        let mut offset = 0;
        while offset < data.len() {
            let (scope, next) = self.read_scope(data, offset, counts)?;
            roots.push(scope);
            offset = next;
        }
        Ok(roots)
    }

    fn read_scope(
        &self,
        data: &[u8],
        offset: usize,
        counts: &mut CountsReader,
    ) -> Result<(Scope, usize), CodecError> {
        let Some(&tag) = data.get(offset) else {
            return Err(CodecError::EndOfBuffer(offset));
        };
        match tag {
            TAG_TOGGLE_PAIR => self.read_toggle_pair(data, offset + 1, counts),
            TAG_REGULAR => self.read_regular(data, offset + 1, counts),
            _ => Err(CodecError::UnknownTag { tag, offset }),
        }
    }

    fn read_toggle_pair(
        &self,
        data: &[u8],
        offset: usize,
        counts: &mut CountsReader,
    ) -> Result<(Scope, usize), CodecError> {
        let (name, offset) = self.read_name(data, offset)?;
        let rise = counts.next()?;
        let fall = counts.next()?;

        let mut scope = Scope::new(ScopeKind::Branch, name);
        scope.add_item(CoverItem::new(CoverKind::ToggleBin, TOGGLE_BIN_RISE, rise));
        scope.add_item(CoverItem::new(CoverKind::ToggleBin, TOGGLE_BIN_FALL, fall));
        Ok((scope, offset))
    }

    fn read_regular(
        &self,
        data: &[u8],
        offset: usize,
        counts: &mut CountsReader,
    ) -> Result<(Scope, usize), CodecError> {
        let kind_at = offset;
        let (kind_code, offset) = varint::read(data, offset)?;
        let kind = ScopeKind::from_code(kind_code).ok_or(CodecError::UnknownScopeKind {
            code: kind_code,
            offset: kind_at,
        })?;
        let (name, offset) = self.read_name(data, offset)?;
        let (weight, offset) = varint::read(data, offset)?;
        let (flags, offset) = varint::read(data, offset)?;

        let presence_at = offset;
        let (presence, mut offset) = varint::read(data, offset)?;
        if presence & !PRESENCE_MASK != 0 {
            return Err(CodecError::UnknownPresenceBits {
                bits: presence,
                offset: presence_at,
            });
        }

        let mut scope = Scope::new(kind, name);
        scope.weight = weight as u32;
        scope.flags = flags as u32;

        if presence & PRESENCE_SOURCE != 0 {
            let file_at = offset;
            let (file, next) = varint::read(data, offset)?;
            let (line, next) = varint::read(data, next)?;
            let (token, next) = varint::read(data, next)?;
            offset = next;
            if (file as usize) < self.file_count {
                scope.source = Some(SourceInfo {
                    file: file as u32,
                    line: line as u32,
                    token: token as u32,
                });
            } else {
                // A dangling file reference loses the location but not the
                // scope.
                warn!(file, offset = file_at, "source file index out of range");
            }
        }
        if presence & PRESENCE_GOAL != 0 {
            let (goal, next) = varint::read(data, offset)?;
            offset = next;
            scope.goal = Some(goal as u32);
        }

        let (num_items, mut offset) = varint::read(data, offset)?;
        if num_items > 0 {
            let item_kind_at = offset;
            let (item_code, next) = varint::read(data, offset)?;
            offset = next;
            let item_kind = CoverKind::from_code(item_code).ok_or(CodecError::UnknownCoverKind {
                code: item_code,
                offset: item_kind_at,
            })?;
            for _ in 0..num_items {
                let (item_name, next) = self.read_name(data, offset)?;
                offset = next;
                let count = counts.next()?;
                scope.add_item(CoverItem::new(item_kind, item_name, count));
            }
        }

        let (num_children, mut offset) = varint::read(data, offset)?;
        for _ in 0..num_children {
            let (child, next) = self.read_scope(data, offset, counts)?;
            scope.children.push(child);
            offset = next;
        }

        Ok((scope, offset))
    }

    fn read_name(&self, data: &[u8], offset: usize) -> Result<(String, usize), CodecError> {
        let (index, next) = varint::read(data, offset)?;
        let name = self
            .strings
            .get(index)
            .ok_or(CodecError::StringIndexOutOfRange { index, offset })?;
        Ok((name.to_string(), next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counts;
    use coverdb_model::SourceFile;

    fn round_trip(db: &Database) -> Vec<Scope> {
        let mut strings = StringTable::new();
        let mut files = FileTable::new();
        let (tree, count_list) = TreeWriter::new(&mut strings, &mut files).write(db);
        let count_bytes = counts::serialize(&count_list);
        let mut reader = CountsReader::parse(&count_bytes).unwrap();
        let roots = TreeReader::new(&strings, files.len())
            .read(&tree, &mut reader)
            .unwrap();
        assert_eq!(reader.remaining(), 0);
        roots
    }

    #[test]
    fn test_empty_database() {
        let db = Database::new();
        assert!(round_trip(&db).is_empty());
    }

    #[test]
    fn test_regular_scope_fields() {
        let mut db = Database::new();
        let file = db.intern_file(SourceFile::new("rtl/top.sv"));
        let mut top = Scope::new(ScopeKind::Instance, "top");
        top.weight = 3;
        top.flags = 0x11;
        top.goal = Some(90);
        top.source = Some(SourceInfo {
            file,
            line: 42,
            token: 7,
        });
        db.add_root(top);

        let roots = round_trip(&db);
        assert_eq!(roots.len(), 1);
        let top = &roots[0];
        assert_eq!(top.kind, ScopeKind::Instance);
        assert_eq!(top.name, "top");
        assert_eq!(top.weight, 3);
        assert_eq!(top.flags, 0x11);
        assert_eq!(top.goal, Some(90));
        assert_eq!(
            top.source,
            Some(SourceInfo {
                file: 0,
                line: 42,
                token: 7
            })
        );
    }

    #[test]
    fn test_no_source_info_stays_absent() {
        let mut db = Database::new();
        db.add_root(Scope::new(ScopeKind::Package, "pkg"));
        let roots = round_trip(&db);
        assert_eq!(roots[0].source, None);
        assert_eq!(roots[0].goal, None);
    }

    #[test]
    fn test_items_and_counts_lock_step() {
        let mut db = Database::new();
        let top = db.add_root(Scope::new(ScopeKind::Instance, "top"));
        let blk = top.add_child(Scope::new(ScopeKind::Block, "blk"));
        blk.add_item(CoverItem::new(CoverKind::StmtBin, "s0", 1));
        blk.add_item(CoverItem::new(CoverKind::StmtBin, "s1", u64::from(u32::MAX) + 17));
        blk.add_item(CoverItem::new(CoverKind::StmtBin, "s2", 0));

        let roots = round_trip(&db);
        let blk = &roots[0].children[0];
        assert_eq!(blk.items.len(), 3);
        assert_eq!(blk.items[0].count, 1);
        assert_eq!(blk.items[1].count, u64::from(u32::MAX) + 17);
        assert_eq!(blk.items[2].count, 0);
        assert_eq!(blk.items[1].kind, CoverKind::StmtBin);
    }

    #[test]
    fn test_toggle_pair_compact_form() {
        let mut db = Database::new();
        let top = db.add_root(Scope::new(ScopeKind::Toggle, "sig"));
        let mut pair = Scope::new(ScopeKind::Branch, "sig");
        pair.add_item(CoverItem::new(CoverKind::ToggleBin, TOGGLE_BIN_RISE, 5));
        pair.add_item(CoverItem::new(CoverKind::ToggleBin, TOGGLE_BIN_FALL, 3));
        top.add_child(pair);

        let mut strings = StringTable::new();
        let mut files = FileTable::new();
        let (tree, count_list) = TreeWriter::new(&mut strings, &mut files).write(&db);
        // Both counts still flow through the stream.
        assert_eq!(count_list, vec![5, 3]);

        // The pair record is tag + name index: strictly smaller than the
        // same shape encoded with regular bin names.
        let mut regular = Database::new();
        let top = regular.add_root(Scope::new(ScopeKind::Toggle, "sig"));
        let mut branch = Scope::new(ScopeKind::Branch, "sig");
        branch.add_item(CoverItem::new(CoverKind::ToggleBin, "taken", 5));
        branch.add_item(CoverItem::new(CoverKind::ToggleBin, "not_taken", 3));
        top.add_child(branch);
        let mut strings2 = StringTable::new();
        let mut files2 = FileTable::new();
        let (tree2, _) = TreeWriter::new(&mut strings2, &mut files2).write(&regular);
        assert!(tree.len() < tree2.len());

        let roots = round_trip(&db);
        let pair = &roots[0].children[0];
        assert_eq!(pair.kind, ScopeKind::Branch);
        assert_eq!(pair.items.len(), 2);
        assert_eq!(pair.items[0].name, TOGGLE_BIN_RISE);
        assert_eq!(pair.items[0].count, 5);
        assert_eq!(pair.items[1].name, TOGGLE_BIN_FALL);
        assert_eq!(pair.items[1].count, 3);
        assert!(pair.items.iter().all(|i| i.kind == CoverKind::ToggleBin));
    }

    #[test]
    fn test_branch_without_pair_names_is_regular() {
        let mut db = Database::new();
        let mut branch = Scope::new(ScopeKind::Branch, "if_stmt");
        branch.add_item(CoverItem::new(CoverKind::BranchBin, "taken", 2));
        branch.add_item(CoverItem::new(CoverKind::BranchBin, "not_taken", 0));
        db.add_root(branch);

        let roots = round_trip(&db);
        let branch = &roots[0];
        assert_eq!(branch.items[0].name, "taken");
        assert_eq!(branch.items[0].count, 2);
        assert_eq!(branch.items[1].name, "not_taken");
        assert_eq!(branch.items[1].count, 0);
        assert_eq!(branch.items[0].kind, CoverKind::BranchBin);
    }

    #[test]
    fn test_deep_chain() {
        let mut db = Database::new();
        let mut current = db.add_root(Scope::new(ScopeKind::Instance, "level0"));
        for depth in 1..100 {
            current = current.add_child(Scope::new(ScopeKind::Instance, format!("level{depth}")));
        }

        let roots = round_trip(&db);
        let mut scope = &roots[0];
        for depth in 0..100 {
            assert_eq!(scope.name, format!("level{depth}"));
            if depth < 99 {
                scope = &scope.children[0];
            }
        }
    }

    #[test]
    fn test_wide_fan_out() {
        let mut db = Database::new();
        let top = db.add_root(Scope::new(ScopeKind::Instance, "top"));
        for i in 0..1000u64 {
            let mut child = Scope::new(ScopeKind::Block, format!("child{i}"));
            child.add_item(CoverItem::new(CoverKind::StmtBin, "s", i));
            top.add_child(child);
        }

        let roots = round_trip(&db);
        assert_eq!(roots[0].children.len(), 1000);
        for (i, child) in roots[0].children.iter().enumerate() {
            assert_eq!(child.name, format!("child{i}"));
            assert_eq!(child.items[0].count, i as u64);
        }
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let strings = StringTable::new();
        let reader = TreeReader::new(&strings, 0);
        let mut counts = CountsReader::parse(&[]).unwrap();
        let err = reader.read(&[0x7F], &mut counts).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownTag {
                tag: 0x7F,
                offset: 0
            }
        );
    }

    #[test]
    fn test_unknown_scope_kind_is_fatal() {
        let mut strings = StringTable::new();
        strings.intern("x");
        let mut data = vec![TAG_REGULAR];
        varint::write(0x3, &mut data); // not a valid scope kind code
        varint::write(1, &mut data);
        let reader = TreeReader::new(&strings, 0);
        let mut counts = CountsReader::parse(&[]).unwrap();
        assert!(matches!(
            reader.read(&data, &mut counts),
            Err(CodecError::UnknownScopeKind { code: 0x3, .. })
        ));
    }

    #[test]
    fn test_unknown_presence_bits_are_fatal() {
        let mut strings = StringTable::new();
        strings.intern("x");
        let mut data = vec![TAG_REGULAR];
        varint::write(ScopeKind::Block.code(), &mut data);
        varint::write(1, &mut data); // name
        varint::write(1, &mut data); // weight
        varint::write(0, &mut data); // flags
        varint::write(0x80, &mut data); // presence with an unknown bit
        let reader = TreeReader::new(&strings, 0);
        let mut counts = CountsReader::parse(&[]).unwrap();
        assert!(matches!(
            reader.read(&data, &mut counts),
            Err(CodecError::UnknownPresenceBits { bits: 0x80, .. })
        ));
    }

    #[test]
    fn test_desync_surfaces_as_counts_exhausted() {
        let mut db = Database::new();
        let top = db.add_root(Scope::new(ScopeKind::Block, "top"));
        top.add_item(CoverItem::new(CoverKind::StmtBin, "s0", 4));

        let mut strings = StringTable::new();
        let mut files = FileTable::new();
        let (tree, _) = TreeWriter::new(&mut strings, &mut files).write(&db);
        // Pair the tree with an empty counts stream.
        let mut counts = CountsReader::parse(&[]).unwrap();
        let err = TreeReader::new(&strings, 0)
            .read(&tree, &mut counts)
            .unwrap_err();
        assert_eq!(err, CodecError::CountsExhausted { consumed: 0 });
    }
}
