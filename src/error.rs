//! Error types for tzdata database operations

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TzDataError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("bad tzdata magic: {0:02x?}")]
    BadMagic(Vec<u8>),

    #[error("truncated header: only {0} bytes available")]
    TruncatedHeader(usize),

    #[error("{section} section [{start}, {end}) out of bounds for file of {file_size} bytes")]
    SectionOutOfBounds {
        section: &'static str,
        start: u64,
        end: u64,
        file_size: u64,
    },

    #[error("record length {length} for \"{id}\" below minimum of 44 bytes")]
    RecordTooShort { id: String, length: u32 },

    #[error("invalid index format: {0}")]
    InvalidIndexFormat(String),

    #[error("zone id at entry {0} is not ASCII")]
    NonAsciiId(usize),

    #[error("invalid zone record for \"{id}\": {reason}")]
    InvalidZoneRecord { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, TzDataError>;
