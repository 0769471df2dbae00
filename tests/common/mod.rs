//! Shared fixtures: synthetic tzdata files and an instrumented compiler

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tempfile::NamedTempFile;
use zoneinfo_db::{Result, TzfileCompiler, ZoneCompiler, ZoneInfo};

static TRACING: Once = Once::new();

/// Route crate logs through the test harness so load/parse diagnostics show
/// up in failing test output.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

const SIZEOF_TZNAME: usize = 40;
const ENTRY_STRIDE: usize = SIZEOF_TZNAME + 3 * 4;
const HEADER_LEN: usize = 12 + 3 * 4;

/// Minimal TZif record whose only type entry carries `offset_secs`.
pub fn tzif_record(offset_secs: i32) -> Vec<u8> {
    let mut data = vec![0u8; 44];
    data[0..4].copy_from_slice(b"TZif");
    data[39] = 1; // typecnt = 1
    data.extend_from_slice(&offset_secs.to_be_bytes());
    data.extend_from_slice(&[0, 0]); // isdst, desigidx
    data
}

/// Serialize a well-formed tzdata image from (id, record) pairs. Ids must
/// already be sorted.
pub fn build_tzdata(version: &str, zone_tab: &str, entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    assert_eq!(version.len(), 5);

    let index_offset = HEADER_LEN;
    let data_offset = index_offset + entries.len() * ENTRY_STRIDE;
    let data_size: usize = entries.iter().map(|(_, rec)| rec.len()).sum();
    let zonetab_offset = data_offset + data_size;

    let mut out = Vec::new();
    out.extend_from_slice(b"tzdata");
    out.extend_from_slice(version.as_bytes());
    out.push(0);
    out.extend_from_slice(&(index_offset as u32).to_be_bytes());
    out.extend_from_slice(&(data_offset as u32).to_be_bytes());
    out.extend_from_slice(&(zonetab_offset as u32).to_be_bytes());

    let mut relative = 0u32;
    for (id, rec) in entries {
        let mut name = [0u8; SIZEOF_TZNAME];
        name[..id.len()].copy_from_slice(id.as_bytes());
        out.extend_from_slice(&name);
        out.extend_from_slice(&relative.to_be_bytes());
        out.extend_from_slice(&(rec.len() as u32).to_be_bytes());
        out.extend_from_slice(&[0u8; 4]);
        relative += rec.len() as u32;
    }
    for (_, rec) in entries {
        out.extend_from_slice(rec);
    }
    out.extend_from_slice(zone_tab.as_bytes());
    out
}

/// Write `contents` to a temp file and keep the handle alive.
pub fn write_temp(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

/// Wraps the real compiler and counts how many constructions ran.
pub struct CountingCompiler {
    inner: TzfileCompiler,
    pub builds: AtomicUsize,
}

impl CountingCompiler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: TzfileCompiler,
            builds: AtomicUsize::new(0),
        })
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ZoneCompiler for CountingCompiler {
    fn compile(&self, id: &str, data: &[u8]) -> Result<ZoneInfo> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.inner.compile(id, data)
    }
}

/// A path that can never be opened.
pub fn missing_path() -> &'static Path {
    Path::new("/nonexistent/tzdata/fixture")
}
