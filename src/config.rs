//! Candidate-path resolution for the default database instance

use std::env;
use std::path::PathBuf;

use crate::cache::DEFAULT_CACHE_SIZE;

/// Configuration for loading a tzdata database.
#[derive(Debug, Clone)]
pub struct TzDataConfig {
    /// Candidate tzdata files, tried in order; the first that parses wins.
    pub candidate_paths: Vec<PathBuf>,
    /// Number of constructed zone templates to retain.
    pub cache_size: usize,
}

impl Default for TzDataConfig {
    /// Two candidates: the writable update area first, then the bundled
    /// read-only copy, each overridable through the environment.
    fn default() -> Self {
        let data_dir = env::var("TZDATA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/data/misc/zoneinfo"));
        let root_dir = env::var("TZDATA_ROOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/usr/share/zoneinfo"));

        Self {
            candidate_paths: vec![
                data_dir.join("current").join("tzdata"),
                root_dir.join("tzdata"),
            ],
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}
