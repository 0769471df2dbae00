//! In-memory index over one concatenated tzdata file

mod parser;

use crate::buffer::MappedTzFile;
use crate::error::Result;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Parsed, immutable representation of one tzdata database file.
///
/// Owns the memory map that backs it; the map is released when the index is
/// dropped. The fallback index has no backing map at all. The only mutation
/// after construction is the one-shot raw-offset cache fill.
pub struct TzIndex {
    version: String,
    zone_tab: String,
    /// Zone ids, sorted ascending by the file producer; binary search relies
    /// on that ordering.
    ids: Vec<String>,
    /// Absolute byte offset of each zone's record, parallel to `ids`.
    byte_offsets: Vec<u32>,
    /// Record length of each zone, parallel to `ids`.
    byte_lengths: Vec<u32>,
    /// Base UTC offset per id, populated at most once on demand.
    raw_offsets: OnceLock<Vec<i32>>,
    mapped: Option<MappedTzFile>,
}

impl TzIndex {
    /// Memory-map and parse the tzdata file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let mapped = MappedTzFile::open(path)?;
        let parsed = parser::parse(mapped.slice(0, mapped.len() as usize, "file")?)?;

        debug!(
            "loaded tzdata {} from {:?}: {} zones",
            parsed.version,
            path,
            parsed.ids.len()
        );

        Ok(Self {
            version: parsed.version,
            zone_tab: parsed.zone_tab,
            ids: parsed.ids,
            byte_offsets: parsed.byte_offsets,
            byte_lengths: parsed.byte_lengths,
            raw_offsets: OnceLock::new(),
            mapped: Some(mapped),
        })
    }

    /// Single-entry emergency index used when no tzdata file can be loaded.
    ///
    /// Has no backing file; the sentinel zone is synthesized directly instead
    /// of being read from a buffer.
    pub(crate) fn fallback() -> Self {
        let raw_offsets = OnceLock::new();
        raw_offsets.set(vec![0]).ok();

        Self {
            version: "missing".to_string(),
            zone_tab: "# Emergency fallback data.\n".to_string(),
            ids: vec!["GMT".to_string()],
            byte_offsets: vec![0],
            byte_lengths: vec![0],
            raw_offsets,
            mapped: None,
        }
    }

    /// Binary search for `id`, returning its position in the sorted id list.
    pub fn find(&self, id: &str) -> Option<usize> {
        self.ids.binary_search_by(|probe| probe.as_str().cmp(id)).ok()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn zone_tab(&self) -> &str {
        &self.zone_tab
    }

    /// True when this index is the synthetic fallback with no backing file.
    pub fn is_fallback(&self) -> bool {
        self.mapped.is_none()
    }

    /// Absolute byte position of `id`'s record in the mapped file.
    pub fn byte_offset_of(&self, id: &str) -> Option<u64> {
        self.find(id).map(|pos| self.byte_offsets[pos] as u64)
    }

    /// Raw bytes of the record at `pos`, or `None` when there is no backing
    /// file (the fallback index).
    pub(crate) fn record_bytes(&self, pos: usize) -> Result<Option<&[u8]>> {
        let Some(mapped) = &self.mapped else {
            return Ok(None);
        };
        let bytes = mapped.slice(
            self.byte_offsets[pos] as u64,
            self.byte_lengths[pos] as usize,
            "record",
        )?;
        Ok(Some(bytes))
    }

    /// Raw UTC offsets, one per id, computing them with `build` on first use.
    ///
    /// `build` runs at most once for the lifetime of the index; concurrent
    /// callers block until the first population finishes.
    pub(crate) fn raw_offsets_or_init(&self, build: impl FnOnce() -> Vec<i32>) -> &[i32] {
        self.raw_offsets.get_or_init(build)
    }
}
