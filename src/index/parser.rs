//! Parser for the concatenated tzdata header and index sections

use crate::buffer::TzCursor;
use crate::error::{Result, TzDataError};
use crate::zone::MIN_RECORD_LEN;
use tracing::{debug, trace};

/// Fixed width of a zone id field in the index.
const SIZEOF_TZNAME: usize = 40;
/// Index entry stride: name field plus three 32-bit integers.
const ENTRY_STRIDE: usize = SIZEOF_TZNAME + 3 * 4;
/// Header: 12-byte version block plus three section offsets.
const HEADER_LEN: usize = 12 + 3 * 4;

/// Result of parsing one tzdata file, minus the mapped buffer that backs it.
#[derive(Debug)]
pub(crate) struct ParsedTzData {
    pub version: String,
    pub zone_tab: String,
    pub ids: Vec<String>,
    pub byte_offsets: Vec<u32>,
    pub byte_lengths: Vec<u32>,
}

/// Parse the full contents of a tzdata file.
///
/// Layout (all integers big-endian): a 12-byte `"tzdata<version>\0"` block,
/// three section offsets, then the index, data, and zone-table sections.
pub(crate) fn parse(data: &[u8]) -> Result<ParsedTzData> {
    if data.len() < HEADER_LEN {
        return Err(TzDataError::TruncatedHeader(data.len()));
    }

    let mut cursor = TzCursor::new(data);
    let mut version_block = [0u8; 12];
    cursor.read_exact(&mut version_block)?;
    if &version_block[0..6] != b"tzdata" || version_block[11] != 0 {
        return Err(TzDataError::BadMagic(version_block.to_vec()));
    }
    let version = std::str::from_utf8(&version_block[6..11])
        .map_err(|_| TzDataError::BadMagic(version_block.to_vec()))?
        .to_string();

    let index_offset = cursor.read_u32()?;
    let data_offset = cursor.read_u32()?;
    let zonetab_offset = cursor.read_u32()?;

    debug!(
        "tzdata {}: index at {}, data at {}, zonetab at {}",
        version, index_offset, data_offset, zonetab_offset
    );

    if data_offset < index_offset || zonetab_offset < data_offset {
        return Err(TzDataError::InvalidIndexFormat(format!(
            "section offsets out of order: {index_offset}, {data_offset}, {zonetab_offset}"
        )));
    }
    if zonetab_offset as usize > data.len() {
        return Err(TzDataError::SectionOutOfBounds {
            section: "zonetab",
            start: zonetab_offset as u64,
            end: zonetab_offset as u64,
            file_size: data.len() as u64,
        });
    }

    let (ids, byte_offsets, byte_lengths) =
        parse_index(data, index_offset as usize, data_offset as usize)?;

    // Zone-table text runs from its offset to end of file, kept verbatim.
    let zone_tab = String::from_utf8_lossy(&data[zonetab_offset as usize..]).into_owned();

    Ok(ParsedTzData {
        version,
        zone_tab,
        ids,
        byte_offsets,
        byte_lengths,
    })
}

fn parse_index(
    data: &[u8],
    index_offset: usize,
    data_offset: usize,
) -> Result<(Vec<String>, Vec<u32>, Vec<u32>)> {
    // Truncating division: a trailing partial entry is ignored, matching the
    // file format contract.
    let entry_count = (data_offset - index_offset) / ENTRY_STRIDE;
    if index_offset + entry_count * ENTRY_STRIDE > data.len() {
        return Err(TzDataError::SectionOutOfBounds {
            section: "index",
            start: index_offset as u64,
            end: (index_offset + entry_count * ENTRY_STRIDE) as u64,
            file_size: data.len() as u64,
        });
    }

    let mut ids = Vec::with_capacity(entry_count);
    let mut byte_offsets = Vec::with_capacity(entry_count);
    let mut byte_lengths = Vec::with_capacity(entry_count);

    let mut cursor = TzCursor::new(data);
    cursor.seek(index_offset as u64)?;

    let mut name_bytes = [0u8; SIZEOF_TZNAME];
    for i in 0..entry_count {
        cursor.read_exact(&mut name_bytes)?;

        // The name field is NUL-padded; stop at the first zero byte.
        let name_len = name_bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SIZEOF_TZNAME);
        let name = &name_bytes[..name_len];
        if !name.is_ascii() {
            return Err(TzDataError::NonAsciiId(i));
        }
        let id = std::str::from_utf8(name)
            .map_err(|_| TzDataError::NonAsciiId(i))?
            .to_string();

        // Stored offsets are relative to the data section.
        let relative_offset = cursor.read_u32()?;
        let absolute_offset = (data_offset as u32)
            .checked_add(relative_offset)
            .ok_or_else(|| {
                TzDataError::InvalidIndexFormat(format!(
                    "record offset {relative_offset} for \"{id}\" overflows the data section"
                ))
            })?;

        let length = cursor.read_u32()?;
        if length < MIN_RECORD_LEN {
            return Err(TzDataError::RecordTooShort { id, length });
        }

        // 4 reserved bytes per entry.
        cursor.skip(4)?;

        trace!("entry {}: {} at {} ({} bytes)", i, id, absolute_offset, length);

        ids.push(id);
        byte_offsets.push(absolute_offset);
        byte_lengths.push(length);
    }

    debug!("parsed {} index entries", entry_count);
    Ok((ids, byte_offsets, byte_lengths))
}
