//! Archive reader.
//!
//! Decoding order mirrors the member dependency order: manifest (format
//! check), string/file tables, then the scope tree pulled in lock-step with
//! the counts stream to materialize the tree, then every feature member that
//! is present, applied onto the tree by depth-first index. The design-unit
//! index is rebuilt from its cache member when present, by tree scan when
//! not — absence of any optional member is the empty/default state, never an
//! error.

use crate::counts::CountsReader;
use crate::design_units::DesignUnitIndex;
use crate::error::{CodecError, Error};
use crate::manifest::Manifest;
use crate::strings::{FileTable, StringTable};
use crate::tree::TreeReader;
use crate::{attrs, contrib, formal, fsm, history, item_flags, properties, tags, toggle};
use crate::{
    MEMBER_ATTRS, MEMBER_CONTRIB_DIR, MEMBER_COUNTS, MEMBER_DESIGN_UNITS, MEMBER_FILES,
    MEMBER_FORMAL, MEMBER_FSM, MEMBER_HISTORY, MEMBER_ITEM_FLAGS, MEMBER_MANIFEST,
    MEMBER_PROPERTIES, MEMBER_SCOPE_TREE, MEMBER_STRINGS, MEMBER_TAGS, MEMBER_TOGGLE,
};
use coverdb_model::Database;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

/// A fully decoded archive: the database plus the design-unit lookup index
/// ([DesignUnitIndex::from_cache] of the cache member when present,
/// [DesignUnitIndex::from_scan] otherwise).
#[derive(Debug)]
pub struct DecodedArchive {
    pub database: Database,
    pub design_units: DesignUnitIndex,
}

fn member<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, Error> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    debug!(member = name, size = bytes.len(), "read archive member");
    Ok(Some(bytes))
}

fn required<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>, Error> {
    member(archive, name)?.ok_or_else(|| Error::MissingMember(name.to_string()))
}

/// Decodes an NCDB archive from `reader`.
pub fn read<R: Read + Seek>(reader: R) -> Result<DecodedArchive, Error> {
    let mut archive = ZipArchive::new(reader)?;

    let manifest = Manifest::deserialize(&required(&mut archive, MEMBER_MANIFEST)?)?;
    let strings = StringTable::deserialize(&required(&mut archive, MEMBER_STRINGS)?)
        .map_err(|e| Error::member(MEMBER_STRINGS, e))?;
    let files = match member(&mut archive, MEMBER_FILES)? {
        Some(bytes) => {
            FileTable::deserialize(&bytes).map_err(|e| Error::member(MEMBER_FILES, e))?
        }
        None => FileTable::new(),
    };

    // Materialize the tree, pulling hit counts in lock-step.
    let count_bytes = required(&mut archive, MEMBER_COUNTS)?;
    let mut count_stream =
        CountsReader::parse(&count_bytes).map_err(|e| Error::member(MEMBER_COUNTS, e))?;
    let tree_bytes = required(&mut archive, MEMBER_SCOPE_TREE)?;
    let roots = TreeReader::new(&strings, files.len())
        .read(&tree_bytes, &mut count_stream)
        .map_err(|e| Error::member(MEMBER_SCOPE_TREE, e))?;
    if count_stream.remaining() > 0 {
        return Err(Error::member(
            MEMBER_COUNTS,
            CodecError::CountsLeftOver {
                left: count_stream.remaining(),
            },
        ));
    }

    let mut db = Database::new();
    db.roots = roots;
    db.files = files.into_files();
    db.path_separator = manifest.path_separator.chars().next().unwrap_or('/');
    if let Some(bytes) = member(&mut archive, MEMBER_HISTORY)? {
        db.history = history::deserialize(&bytes)?;
    }

    // Feature facets, applied by depth-first index against the now-complete
    // tree. A missing member is simply that facet's default state.
    if let Some(bytes) = member(&mut archive, MEMBER_ATTRS)? {
        attrs::apply(&mut db, &bytes)?;
    }
    if let Some(bytes) = member(&mut archive, MEMBER_TAGS)? {
        tags::apply(&mut db, &bytes)?;
    }
    if let Some(bytes) = member(&mut archive, MEMBER_PROPERTIES)? {
        properties::apply(&mut db, &bytes)?;
    }
    if let Some(bytes) = member(&mut archive, MEMBER_TOGGLE)? {
        toggle::apply(&mut db, &bytes)?;
    }
    if let Some(bytes) = member(&mut archive, MEMBER_FSM)? {
        fsm::apply(&mut db, &bytes)?;
    }
    if let Some(bytes) = member(&mut archive, MEMBER_FORMAL)? {
        formal::apply(&mut db, &bytes)?;
    }
    if let Some(bytes) = member(&mut archive, MEMBER_ITEM_FLAGS)? {
        item_flags::apply(&mut db, &bytes)?;
    }

    // Per-test contributions.
    let contrib_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with(MEMBER_CONTRIB_DIR))
        .map(str::to_string)
        .collect();
    for name in contrib_names {
        let Some(history_idx) = contrib::parse_member_name(&name) else {
            warn!(member = %name, "unparseable contribution member name, skipped");
            continue;
        };
        if let Some(bytes) = member(&mut archive, &name)? {
            contrib::apply(&mut db, &name, history_idx, &bytes)?;
        }
    }

    // Derived index: cache when present, tree scan when absent.
    let design_units = match member(&mut archive, MEMBER_DESIGN_UNITS)? {
        Some(bytes) => DesignUnitIndex::from_cache(&bytes, &db)?,
        None => DesignUnitIndex::from_scan(&db),
    };

    Ok(DecodedArchive {
        database: db,
        design_units,
    })
}

/// Decodes the NCDB archive file at `path`.
pub fn read_path(path: impl AsRef<Path>) -> Result<DecodedArchive, Error> {
    let file = File::open(path)?;
    read(BufReader::new(file))
}
