//! Archive writer.
//!
//! Walks the database depth-first once (building the string/file tables, the
//! tree member, and the count list as side effects of the same walk, so all
//! index-addressed members agree), then lays members out in a fixed order:
//! manifest, strings, files, scope tree, counts, history, then each feature
//! member only when it has non-default data, then one `contrib/<idx>.bin`
//! per contributing test.
//!
//! Encoding never fails for a valid in-memory graph; every error this module
//! returns comes from the underlying archive or I/O layer.

use crate::error::Error;
use crate::strings::{FileTable, StringTable};
use crate::tree::TreeWriter;
use crate::{
    attrs, contrib, counts, design_units, formal, fsm, history, item_flags, manifest::Manifest,
    properties, tags, toggle,
};
use crate::{
    MEMBER_ATTRS, MEMBER_COUNTS, MEMBER_DESIGN_UNITS, MEMBER_FILES, MEMBER_FORMAL, MEMBER_FSM,
    MEMBER_HISTORY, MEMBER_ITEM_FLAGS, MEMBER_MANIFEST, MEMBER_PROPERTIES, MEMBER_SCOPE_TREE,
    MEMBER_STRINGS, MEMBER_TAGS, MEMBER_TOGGLE,
};
use coverdb_model::Database;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn put<W: Write + Seek>(zip: &mut ZipWriter<W>, name: &str, bytes: &[u8]) -> Result<(), Error> {
    debug!(member = name, size = bytes.len(), "writing archive member");
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(name, options)?;
    zip.write_all(bytes)?;
    Ok(())
}

fn put_optional<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
) -> Result<(), Error> {
    if bytes.is_empty() {
        debug!(member = name, "facet has no data, member omitted");
        return Ok(());
    }
    put(zip, name, bytes)
}

/// Serializes `db` as an NCDB archive into `writer`.
pub fn write<W: Write + Seek>(db: &Database, writer: W) -> Result<(), Error> {
    let mut strings = StringTable::new();
    let mut files = FileTable::new();
    let (tree, count_list) = TreeWriter::new(&mut strings, &mut files).write(db);
    let count_bytes = counts::serialize(&count_list);
    let manifest = Manifest::build(db, &tree, &count_list);

    let mut zip = ZipWriter::new(writer);
    put(&mut zip, MEMBER_MANIFEST, &manifest.serialize()?)?;
    put(&mut zip, MEMBER_STRINGS, &strings.serialize())?;
    put(&mut zip, MEMBER_FILES, &files.serialize())?;
    put(&mut zip, MEMBER_SCOPE_TREE, &tree)?;
    put(&mut zip, MEMBER_COUNTS, &count_bytes)?;
    put(&mut zip, MEMBER_HISTORY, &history::serialize(&db.history)?)?;

    put_optional(&mut zip, MEMBER_ATTRS, &attrs::serialize(db)?)?;
    put_optional(&mut zip, MEMBER_TAGS, &tags::serialize(db)?)?;
    put_optional(&mut zip, MEMBER_PROPERTIES, &properties::serialize(db)?)?;
    put_optional(&mut zip, MEMBER_TOGGLE, &toggle::serialize(db)?)?;
    put_optional(&mut zip, MEMBER_FSM, &fsm::serialize(db)?)?;
    put_optional(&mut zip, MEMBER_FORMAL, &formal::serialize(db)?)?;
    put_optional(&mut zip, MEMBER_DESIGN_UNITS, &design_units::serialize(db)?)?;
    put_optional(&mut zip, MEMBER_ITEM_FLAGS, &item_flags::serialize(db))?;

    for (&history_idx, entries) in &db.contributions {
        if entries.is_empty() {
            continue;
        }
        put(
            &mut zip,
            &contrib::member_name(history_idx),
            &contrib::serialize(entries),
        )?;
    }

    zip.finish()?;
    Ok(())
}

/// Serializes `db` to a new archive file at `path`.
pub fn write_path(db: &Database, path: impl AsRef<Path>) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write(db, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverdb_model::{CoverItem, CoverKind, Scope, ScopeKind};
    use std::io::Cursor;
    use zip::ZipArchive;

    fn member_names(db: &Database) -> Vec<String> {
        let mut buf = Cursor::new(Vec::new());
        write(db, &mut buf).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(buf.into_inner())).unwrap();
        // by_index preserves the order members were written in.
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_mandatory_members_only_for_plain_database() {
        let mut db = Database::new();
        let top = db.add_root(Scope::new(ScopeKind::Block, "top"));
        top.add_item(CoverItem::new(CoverKind::StmtBin, "s", 1));

        let names = member_names(&db);
        assert_eq!(
            names,
            vec![
                MEMBER_MANIFEST,
                MEMBER_STRINGS,
                MEMBER_FILES,
                MEMBER_SCOPE_TREE,
                MEMBER_COUNTS,
                MEMBER_HISTORY,
            ]
        );
    }

    #[test]
    fn test_members_appear_with_data() {
        let mut db = Database::new();
        let top = db.add_root(Scope::new(ScopeKind::Block, "top"));
        top.add_item(CoverItem::new(CoverKind::StmtBin, "s", 1));
        top.tags.insert("smoke".to_string());
        db.history.push(coverdb_model::HistoryNode::test("t0"));
        db.record_contribution(0, 0, 1);

        let names = member_names(&db);
        assert!(names.contains(&MEMBER_TAGS.to_string()));
        assert!(names.contains(&"contrib/0.bin".to_string()));
        assert!(!names.contains(&MEMBER_ATTRS.to_string()));
        assert!(!names.contains(&MEMBER_FORMAL.to_string()));
    }
}
