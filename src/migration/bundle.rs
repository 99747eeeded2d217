use std::path::PathBuf;

use crate::migration::error::MigrationResult;
use crate::traits::{Clock, FileSystem};

/// Timestamp layout shared by bundle and log file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Stores exported bundles verbatim under the data directory
pub struct BundleStore<'a> {
    fs: &'a dyn FileSystem,
    clock: &'a dyn Clock,
    dir: PathBuf,
}

impl<'a> BundleStore<'a> {
    pub fn new(fs: &'a dyn FileSystem, clock: &'a dyn Clock, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            clock,
            dir: dir.into(),
        }
    }

    /// `quicksight_asset_bundle-<NNN>-<timestamp>.qs` for batch `index`
    pub fn file_name(&self, index: usize) -> String {
        format!(
            "quicksight_asset_bundle-{:03}-{}.qs",
            index,
            self.clock.now().format(FILE_TIMESTAMP_FORMAT)
        )
    }

    pub fn save(&self, index: usize, bytes: &[u8]) -> MigrationResult<PathBuf> {
        let path = self.dir.join(self.file_name(index));
        self.fs.write_bytes(&path, bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved asset bundle");
        Ok(path)
    }
}
