//! Database facade: loading, fallback, and the public lookup surface

use crate::cache::ZoneCache;
use crate::config::TzDataConfig;
use crate::error::{Result, TzDataError};
use crate::index::TzIndex;
use crate::zone::{TzfileCompiler, ZoneCompiler, ZoneInfo};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

static INSTANCE: OnceLock<TzData> = OnceLock::new();

/// One loaded (or fallback) tzdata database.
///
/// Holds the parsed index, the bounded zone cache, and the compiler that
/// turns raw record bytes into zone objects. All methods are safe to call
/// from multiple threads.
pub struct TzData {
    index: TzIndex,
    cache: ZoneCache,
    compiler: Arc<dyn ZoneCompiler>,
}

impl TzData {
    fn new(index: TzIndex, cache_size: usize, compiler: Arc<dyn ZoneCompiler>) -> Self {
        Self {
            index,
            cache: ZoneCache::new(cache_size),
            compiler,
        }
    }

    /// Load the tzdata file at `path`, or `None` if it cannot be mapped or
    /// parsed.
    pub fn load(path: impl AsRef<Path>, compiler: Arc<dyn ZoneCompiler>) -> Option<Self> {
        Self::load_sized(path, crate::cache::DEFAULT_CACHE_SIZE, compiler)
    }

    fn load_sized(
        path: impl AsRef<Path>,
        cache_size: usize,
        compiler: Arc<dyn ZoneCompiler>,
    ) -> Option<Self> {
        let path = path.as_ref();
        match TzIndex::load(path) {
            Ok(index) => Some(Self::new(index, cache_size, compiler)),
            Err(TzDataError::Io(e)) => {
                debug!("could not open tzdata file {:?}: {}", path, e);
                None
            }
            Err(e) => {
                warn!("tzdata file {:?} was present but invalid: {}", path, e);
                None
            }
        }
    }

    /// Try each candidate path in order and return the first database that
    /// parses; if none do, fall back to a single-entry GMT database.
    ///
    /// Never fails: the caller always gets a usable database.
    pub fn load_with_fallback<P: AsRef<Path>>(
        paths: &[P],
        compiler: Arc<dyn ZoneCompiler>,
    ) -> Self {
        Self::load_with_fallback_sized(paths, crate::cache::DEFAULT_CACHE_SIZE, compiler)
    }

    /// Load per `config`, falling back to the GMT database when every
    /// candidate fails.
    pub fn from_config(config: &TzDataConfig, compiler: Arc<dyn ZoneCompiler>) -> Self {
        Self::load_with_fallback_sized(&config.candidate_paths, config.cache_size, compiler)
    }

    fn load_with_fallback_sized<P: AsRef<Path>>(
        paths: &[P],
        cache_size: usize,
        compiler: Arc<dyn ZoneCompiler>,
    ) -> Self {
        for path in paths {
            if let Some(data) = Self::load_sized(path, cache_size, Arc::clone(&compiler)) {
                return data;
            }
        }

        warn!("couldn't find any usable tzdata, using emergency fallback");
        Self::new(TzIndex::fallback(), cache_size, compiler)
    }

    /// The process-wide database, loaded on first use from
    /// [`TzDataConfig::default`] with the built-in compiler.
    pub fn instance() -> &'static TzData {
        INSTANCE.get_or_init(|| {
            info!("initializing process-wide tzdata database");
            Self::from_config(&TzDataConfig::default(), Arc::new(TzfileCompiler))
        })
    }

    /// Initialize the process-wide database explicitly. The first
    /// initializer wins; later calls (including [`TzData::instance`]) return
    /// the existing instance.
    pub fn init_instance(
        config: &TzDataConfig,
        compiler: Arc<dyn ZoneCompiler>,
    ) -> &'static TzData {
        INSTANCE.get_or_init(|| Self::from_config(config, compiler))
    }

    /// All zone ids, sorted ascending. Returns a copy; callers cannot
    /// disturb the index's internal order.
    pub fn available_ids(&self) -> Vec<String> {
        self.index.ids().to_vec()
    }

    /// The ids whose raw UTC offset equals `raw_offset_secs`, in index
    /// order. The first call pays one zone construction per id to populate
    /// the raw-offset cache.
    pub fn available_ids_with_raw_offset(&self, raw_offset_secs: i32) -> Vec<String> {
        let offsets = self.raw_utc_offsets();
        self.index
            .ids()
            .iter()
            .zip(offsets)
            .filter(|&(_, &offset)| offset == raw_offset_secs)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn version(&self) -> &str {
        self.index.version()
    }

    pub fn zone_tab(&self) -> &str {
        self.index.zone_tab()
    }

    /// Direct access to the parsed index, visible for testing.
    pub fn index(&self) -> &TzIndex {
        &self.index
    }

    /// Build (or fetch from cache) the zone object for `id`.
    ///
    /// Returns `Ok(None)` for an unknown id; a malformed record for a known
    /// id is an error. Each call hands out an independently mutable clone.
    pub fn make_time_zone(&self, id: &str) -> Result<Option<ZoneInfo>> {
        let Some(pos) = self.index.find(id) else {
            return Ok(None);
        };
        self.cached_zone(pos, id).map(Some)
    }

    /// True iff `id` names a zone whose record constructs successfully.
    ///
    /// This performs a full construction on a cache miss; a record that
    /// fails to construct counts as absent.
    pub fn has_time_zone(&self, id: &str) -> bool {
        matches!(self.make_time_zone(id), Ok(Some(_)))
    }

    /// Raw UTC offsets, one per id. Populated at most once per database;
    /// concurrent first callers block until population finishes.
    pub fn raw_utc_offsets(&self) -> &[i32] {
        self.index.raw_offsets_or_init(|| {
            debug!("populating raw UTC offsets for {} zones", self.index.len());
            self.index
                .ids()
                .iter()
                .enumerate()
                .map(|(pos, id)| match self.cached_zone(pos, id) {
                    Ok(zone) => zone.raw_offset_secs(),
                    Err(e) => {
                        warn!("could not construct zone {} for raw offset: {}", id, e);
                        0
                    }
                })
                .collect()
        })
    }

    fn cached_zone(&self, pos: usize, id: &str) -> Result<ZoneInfo> {
        self.cache.get_or_try_build(id, || {
            match self.index.record_bytes(pos)? {
                Some(bytes) => self.compiler.compile(id, bytes),
                // Fallback index: no backing file, synthesize the sentinel.
                None => Ok(ZoneInfo::fixed_utc(id)),
            }
        })
    }

    /// Read only the 12-byte header of the file at `path` and return its
    /// version string.
    ///
    /// Much cheaper than a full load, and makes no guarantee the rest of the
    /// file is well formed. Used to probe a candidate file before committing
    /// to it.
    pub fn rules_version(path: impl AsRef<Path>) -> Result<String> {
        let mut file = File::open(path.as_ref())?;
        let mut header = Vec::with_capacity(12);
        file.by_ref().take(12).read_to_end(&mut header)?;
        if header.len() < 12 {
            return Err(TzDataError::TruncatedHeader(header.len()));
        }
        if &header[0..6] != b"tzdata" || header[11] != 0 {
            return Err(TzDataError::BadMagic(header));
        }
        let version = std::str::from_utf8(&header[6..11])
            .map_err(|_| TzDataError::BadMagic(header.clone()))?;
        Ok(version.to_string())
    }
}
