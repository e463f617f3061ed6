//! Interning tables for names and source files.
//!
//! Strings are stored once; every other member references them by integer
//! index. Both tables share the same wire shape:
//!
//! ```text
//! +-------+-------+---------+-------+---------+
//! | count | len_0 | bytes_0 | len_1 | bytes_1 | ...
//! +-------+-------+---------+-------+---------+
//! ```
//!
//! where every integer is a varint and payloads are UTF-8. The file table
//! serializes two length-prefixed fields per record (path, then workdir; an
//! absent workdir is length zero).

use crate::error::CodecError;
use crate::varint;
use coverdb_model::SourceFile;
use std::collections::HashMap;

/// Deduplicating name dictionary. Index 0 is always the empty string.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<String>,
    index: HashMap<String, u32>,
}

impl StringTable {
    pub fn new() -> Self {
        let mut table = Self::default();
        table.intern("");
        table
    }

    /// Returns the index for `s`, appending it if not already present.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), idx);
        idx
    }

    /// The string at `idx`, if in range.
    pub fn get(&self, idx: u64) -> Option<&str> {
        self.strings.get(usize::try_from(idx).ok()?).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        varint::write(self.strings.len() as u64, &mut buf);
        for s in &self.strings {
            varint::write(s.len() as u64, &mut buf);
            buf.extend_from_slice(s.as_bytes());
        }
        buf
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, CodecError> {
        let mut table = Self::default();
        let (count, mut offset) = varint::read(data, 0)?;
        for _ in 0..count {
            let (s, next) = read_string(data, offset)?;
            offset = next;
            // Intern (not push) so indices stay stable even if a corrupt
            // table repeats a value.
            table.intern(&s);
        }
        Ok(table)
    }
}

/// Deduplicating (path, workdir) dictionary for source-file references.
#[derive(Debug, Clone, Default)]
pub struct FileTable {
    files: Vec<SourceFile>,
    index: HashMap<(String, String), u32>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index for `file`, appending it if not already present.
    pub fn intern(&mut self, file: &SourceFile) -> u32 {
        let key = (file.path.clone(), file.workdir.clone());
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.files.len() as u32;
        self.files.push(file.clone());
        self.index.insert(key, idx);
        idx
    }

    pub fn get(&self, idx: u64) -> Option<&SourceFile> {
        self.files.get(usize::try_from(idx).ok()?)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Consumes the table, yielding the records in index order.
    pub fn into_files(self) -> Vec<SourceFile> {
        self.files
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        varint::write(self.files.len() as u64, &mut buf);
        for file in &self.files {
            varint::write(file.path.len() as u64, &mut buf);
            buf.extend_from_slice(file.path.as_bytes());
            varint::write(file.workdir.len() as u64, &mut buf);
            buf.extend_from_slice(file.workdir.as_bytes());
        }
        buf
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, CodecError> {
        let mut table = Self::new();
        let (count, mut offset) = varint::read(data, 0)?;
        for _ in 0..count {
            let (path, next) = read_string(data, offset)?;
            let (workdir, next) = read_string(data, next)?;
            offset = next;
            table.intern(&SourceFile { path, workdir });
        }
        Ok(table)
    }
}

fn read_string(data: &[u8], offset: usize) -> Result<(String, usize), CodecError> {
    let (len, start) = varint::read(data, offset)?;
    let len = usize::try_from(len).map_err(|_| CodecError::EndOfBuffer(start))?;
    let end = start
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or(CodecError::EndOfBuffer(data.len()))?;
    let s = std::str::from_utf8(&data[start..end]).map_err(|_| CodecError::InvalidUtf8(start))?;
    Ok((s.to_string(), end))
}
