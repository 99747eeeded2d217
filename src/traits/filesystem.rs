use anyhow::{Context, Result};
#[cfg(test)]
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::{Arc, RwLock};

/// Trait for filesystem operations to enable testing with mocks
pub trait FileSystem: Send + Sync {
    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Read raw file contents
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write string contents to file
    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.write_bytes(path, contents.as_bytes())
    }

    /// Write raw contents to file, creating parent directories
    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Create directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Move a file, creating the destination's parent directory
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Read directory entries
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Real filesystem implementation using std::fs
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))
    }

    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create parent directory: {:?}", parent))?;
        }

        std::fs::write(path, contents).with_context(|| format!("Failed to write file: {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create parent directory: {:?}", parent))?;
        }

        std::fs::rename(from, to)
            .with_context(|| format!("Failed to move {:?} to {:?}", from, to))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)
            .with_context(|| format!("Failed to read directory: {:?}", path))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            paths.push(entry.path());
        }

        Ok(paths)
    }
}

/// Mock filesystem implementation for testing (in-memory)
#[cfg(test)]
pub struct MockFileSystem {
    files: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
    directories: Arc<RwLock<HashSet<PathBuf>>>,
    read_only: bool,
}

#[cfg(test)]
impl MockFileSystem {
    /// Create new empty mock filesystem
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            directories: Arc::new(RwLock::new(HashSet::new())),
            read_only: false,
        }
    }

    /// Mock filesystem on which every file write fails
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::new()
        }
    }

    /// Get captured file contents for testing assertions
    pub fn get_file_contents(&self, path: &Path) -> Option<String> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Check if file was written
    pub fn has_file(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    /// List all files in mock filesystem
    pub fn list_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.files.read().unwrap().keys().cloned().collect();
        files.sort();
        files
    }

    /// List files whose parent is `dir`
    pub fn files_in(&self, dir: &Path) -> Vec<PathBuf> {
        self.list_files()
            .into_iter()
            .filter(|p| p.parent() == Some(dir))
            .collect()
    }
}

#[cfg(test)]
impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).with_context(|| format!("File is not valid UTF-8: {:?}", path))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .with_context(|| format!("File not found in mock filesystem: {:?}", path))
    }

    fn write_bytes(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if self.read_only {
            anyhow::bail!("Read-only mock filesystem: {:?}", path);
        }

        // Ensure all parent directories exist in mock (recursively)
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }

        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut directories = self.directories.write().unwrap();
        directories.insert(path.to_path_buf());

        // Also add parent directories
        let mut current = path;
        while let Some(parent) = current.parent() {
            directories.insert(parent.to_path_buf());
            current = parent;
        }

        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let contents = self
            .files
            .write()
            .unwrap()
            .remove(from)
            .with_context(|| format!("File not found in mock filesystem: {:?}", from))?;

        self.write_bytes(to, &contents)
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
            || self.directories.read().unwrap().contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !self.exists(path) {
            anyhow::bail!("Directory not found in mock filesystem: {:?}", path);
        }

        let files = self.files.read().unwrap();
        let directories = self.directories.read().unwrap();

        let mut entries = Vec::new();

        // Add direct child files
        for file_path in files.keys() {
            if file_path.parent() == Some(path) {
                entries.push(file_path.clone());
            }
        }

        // Add direct child directories
        for dir_path in directories.iter() {
            if dir_path.parent() == Some(path) {
                entries.push(dir_path.clone());
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_write_creates_parent_directories() {
        let fs = MockFileSystem::new();
        let file = PathBuf::from("/data/retry/arns-1.txt");

        fs.write(&file, "arn:aws:quicksight:us-east-1:1:dashboard/a\n")
            .unwrap();

        assert!(fs.is_file(&file));
        assert!(fs.exists(Path::new("/data/retry")));
        assert!(fs.exists(Path::new("/data")));
    }

    #[test]
    fn test_mock_bytes_round_trip_verbatim() {
        let fs = MockFileSystem::new();
        let file = PathBuf::from("/data/bundle.qs");
        let payload = vec![0u8, 159, 146, 150, 255];

        fs.write_bytes(&file, &payload).unwrap();

        assert_eq!(fs.read(&file).unwrap(), payload);
        assert!(fs.read_to_string(&file).is_err());
    }

    #[test]
    fn test_mock_rename_moves_file() {
        let fs = MockFileSystem::new();
        let from = PathBuf::from("/data/retry/arns-1.txt");
        let to = PathBuf::from("/data/retry/done/arns-1.txt");
        fs.write(&from, "x").unwrap();

        fs.rename(&from, &to).unwrap();

        assert!(!fs.has_file(&from));
        assert_eq!(fs.get_file_contents(&to).as_deref(), Some("x"));
    }

    #[test]
    fn test_mock_read_dir_lists_direct_children_only() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("/data/a.qs"), "a").unwrap();
        fs.write(Path::new("/data/retry/arns-1.txt"), "b").unwrap();

        let mut entries = fs.read_dir(Path::new("/data")).unwrap();
        entries.sort();

        assert_eq!(
            entries,
            vec![PathBuf::from("/data/a.qs"), PathBuf::from("/data/retry")]
        );
        assert!(fs.read_dir(Path::new("/missing")).is_err());
    }

    #[test]
    fn test_real_filesystem_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFileSystem;
        let file = dir.path().join("nested").join("bundle.qs");

        fs.write_bytes(&file, b"PK\x03\x04").unwrap();

        assert!(fs.is_file(&file));
        assert_eq!(fs.read(&file).unwrap(), b"PK\x03\x04");
        assert_eq!(fs.read_dir(&dir.path().join("nested")).unwrap(), vec![file]);
    }
}
