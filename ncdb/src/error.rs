//! Error types for archive encoding and decoding.

use thiserror::Error;

/// A structural decode failure inside one binary member.
///
/// Every variant carries the byte offset at which decoding failed; the
/// containing [Error::Member] adds the archive member name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of buffer at offset {0}")]
    EndOfBuffer(usize),
    #[error("invalid varint at offset {0}")]
    InvalidVarint(usize),
    #[error("invalid utf-8 string at offset {0}")]
    InvalidUtf8(usize),
    #[error("unknown record tag {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },
    #[error("unknown scope kind {code:#x} at offset {offset}")]
    UnknownScopeKind { code: u64, offset: usize },
    #[error("unknown cover kind {code:#x} at offset {offset}")]
    UnknownCoverKind { code: u64, offset: usize },
    #[error("unknown presence bits {bits:#x} at offset {offset}")]
    UnknownPresenceBits { bits: u64, offset: usize },
    #[error("unknown counts mode {0}")]
    UnknownCountsMode(u8),
    #[error("string index {index} out of range at offset {offset}")]
    StringIndexOutOfRange { index: u64, offset: usize },
    #[error("count stream exhausted after {consumed} values")]
    CountsExhausted { consumed: u64 },
    #[error("{left} count values left unconsumed after tree decode")]
    CountsLeftOver { left: u64 },
}

/// Error type for archive operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A structural failure decoding the named archive member.
    #[error("member {member}: {source}")]
    Member {
        member: String,
        #[source]
        source: CodecError,
    },
    /// A JSON member failed to parse.
    #[error("member {member}: {source}")]
    Json {
        member: String,
        #[source]
        source: serde_json::Error,
    },
    /// A member declared a payload version this implementation does not know.
    #[error("member {member}: unsupported version {version}")]
    UnsupportedVersion { member: String, version: u32 },
    /// The manifest names a format other than NCDB.
    #[error("not an NCDB archive (manifest format {0:?})")]
    Format(String),
    /// A member every archive must carry is absent.
    #[error("missing required member {0}")]
    MissingMember(String),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a [CodecError] with the archive member it occurred in.
    pub(crate) fn member(member: &str, source: CodecError) -> Self {
        Self::Member {
            member: member.to_string(),
            source,
        }
    }

    /// Wraps a JSON parse failure with the archive member it occurred in.
    pub(crate) fn json(member: &str, source: serde_json::Error) -> Self {
        Self::Json {
            member: member.to_string(),
            source,
        }
    }
}
