//! Constructed time-zone records and the record-construction seam

use crate::error::{Result, TzDataError};
use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;

/// Minimum record length: the size of a TZif file header.
pub const MIN_RECORD_LEN: u32 = 44;

/// A constructed time-zone record.
///
/// Zone objects are expensive to build and mutable once constructed, so the
/// cache keeps a template and hands out clones. Cloning yields an
/// independently mutable copy; the rule payload itself is an immutable blob
/// shared between clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneInfo {
    id: String,
    raw_offset_secs: i32,
    rule_data: Bytes,
}

impl ZoneInfo {
    pub fn new(id: impl Into<String>, raw_offset_secs: i32, rule_data: Bytes) -> Self {
        Self {
            id: id.into(),
            raw_offset_secs,
            rule_data,
        }
    }

    /// A fixed zero-offset zone with no rule data, used by the fallback
    /// database for its sentinel entry.
    pub fn fixed_utc(id: impl Into<String>) -> Self {
        Self::new(id, 0, Bytes::new())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Base (non-daylight-saving) offset from UTC, in seconds.
    pub fn raw_offset_secs(&self) -> i32 {
        self.raw_offset_secs
    }

    pub fn set_raw_offset_secs(&mut self, secs: i32) {
        self.raw_offset_secs = secs;
    }

    /// The zone's raw rule bytes, opaque to this crate.
    pub fn rule_data(&self) -> &[u8] {
        &self.rule_data
    }
}

/// Builds a [`ZoneInfo`] from one record's raw bytes.
///
/// This is the seam for the external rule engine: implementations receive the
/// exact byte range the index attributes to `id` and may fail on malformed
/// data. Failures are never cached.
pub trait ZoneCompiler: Send + Sync {
    fn compile(&self, id: &str, data: &[u8]) -> Result<ZoneInfo>;
}

/// Default compiler: validates the TZif header and extracts the base UTC
/// offset from the type table.
///
/// Transition rules are not computed here; the payload stays opaque. Only the
/// 44-byte header and the first standard-time type entry are examined.
#[derive(Debug, Default, Clone, Copy)]
pub struct TzfileCompiler;

impl TzfileCompiler {
    fn bad(id: &str, reason: impl Into<String>) -> TzDataError {
        TzDataError::InvalidZoneRecord {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

impl ZoneCompiler for TzfileCompiler {
    fn compile(&self, id: &str, data: &[u8]) -> Result<ZoneInfo> {
        if data.len() < MIN_RECORD_LEN as usize {
            return Err(Self::bad(id, format!("{} bytes, shorter than tzhead", data.len())));
        }
        if &data[0..4] != b"TZif" {
            return Err(Self::bad(id, "missing TZif magic"));
        }

        // tzhead: 4-byte magic, 1-byte version, 15 reserved, then six
        // big-endian u32 counts ending at byte 44.
        let time_count = BigEndian::read_u32(&data[32..36]) as usize;
        let type_count = BigEndian::read_u32(&data[36..40]) as usize;
        if type_count == 0 {
            return Err(Self::bad(id, "no type entries"));
        }

        // v1 data block: timecnt 4-byte transitions, timecnt type indices,
        // then typecnt 6-byte ttinfo entries (utoff, isdst, desigidx).
        let types_start = 44 + time_count * 5;
        let types_end = types_start + type_count * 6;
        if data.len() < types_end {
            return Err(Self::bad(id, "type table extends past record"));
        }

        // Raw offset is the first standard-time type's utoff, matching what
        // the platform rule engine reports as the base offset.
        let mut raw_offset_secs = BigEndian::read_i32(&data[types_start..types_start + 4]);
        for i in 0..type_count {
            let entry = &data[types_start + i * 6..types_start + i * 6 + 6];
            if entry[4] == 0 {
                raw_offset_secs = BigEndian::read_i32(&entry[0..4]);
                break;
            }
        }

        Ok(ZoneInfo::new(
            id,
            raw_offset_secs,
            Bytes::copy_from_slice(data),
        ))
    }
}
