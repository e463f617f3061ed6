//! Coverage-file format discrimination.
//!
//! `.cdb` files come in two physical shapes: a SQLite database (the SQL
//! backend, outside this crate) or an NCDB ZIP archive. Both are recognized
//! from the first bytes; anything else — including a ZIP without an NCDB
//! manifest — is reported as unknown rather than an error, so callers can
//! route the file to another backend or reject it themselves.

use crate::error::Error;
use crate::manifest::Manifest;
use crate::MEMBER_MANIFEST;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use zip::ZipArchive;

const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\x00";
const ZIP_LOCAL_HEADER: &[u8; 4] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8; 4] = b"PK\x05\x06";

/// The physical format of a coverage file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Sqlite,
    Ncdb,
    Unknown,
}

/// Identifies the format of the file at `path`.
///
/// I/O failures opening or reading the file propagate; a file that merely
/// fails the probes is [FileFormat::Unknown].
pub fn detect(path: impl AsRef<Path>) -> Result<FileFormat, Error> {
    let mut file = BufReader::new(File::open(path)?);
    let mut header = Vec::with_capacity(16);
    file.by_ref().take(16).read_to_end(&mut header)?;

    if header.len() >= 16 && header[..16] == SQLITE_MAGIC[..] {
        return Ok(FileFormat::Sqlite);
    }
    if header.len() >= 4
        && (header[..4] == ZIP_LOCAL_HEADER[..] || header[..4] == ZIP_EMPTY_ARCHIVE[..])
    {
        file.seek(SeekFrom::Start(0))?;
        if is_ncdb_archive(file) {
            return Ok(FileFormat::Ncdb);
        }
    }
    Ok(FileFormat::Unknown)
}

fn is_ncdb_archive<R: Read + Seek>(reader: R) -> bool {
    let Ok(mut archive) = ZipArchive::new(reader) else {
        return false;
    };
    let Ok(mut member) = archive.by_name(MEMBER_MANIFEST) else {
        return false;
    };
    let mut bytes = Vec::new();
    if member.read_to_end(&mut bytes).is_err() {
        return false;
    }
    Manifest::deserialize(&bytes).is_ok()
}
