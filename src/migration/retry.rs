//! Retry queue for failed export batches.
//!
//! Each failed batch becomes one append-only text file in the retry
//! directory named `arns-<unix-millis>.txt`: an optional `# job <id>`
//! header followed by one ARN per line. Files that were resubmitted
//! successfully move to `done/`.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::migration::error::{MigrationError, MigrationResult};
use crate::traits::FileSystem;

const FILE_PREFIX: &str = "arns-";
const FILE_SUFFIX: &str = ".txt";
const JOB_HEADER: &str = "# job ";
const DONE_DIR: &str = "done";

#[derive(Debug, Clone, PartialEq)]
pub struct RetryRecord {
    pub created_at: DateTime<Utc>,
    pub job_id: Option<String>,
    pub resource_arns: Vec<String>,
}

impl RetryRecord {
    pub fn new(created_at: DateTime<Utc>, job_id: &str, resource_arns: Vec<String>) -> Self {
        Self {
            created_at,
            job_id: Some(job_id.to_string()),
            resource_arns,
        }
    }

    fn render(&self) -> String {
        let mut body = String::new();
        if let Some(job_id) = &self.job_id {
            body.push_str(JOB_HEADER);
            body.push_str(job_id);
            body.push('\n');
        }
        for arn in &self.resource_arns {
            body.push_str(arn);
            body.push('\n');
        }
        body
    }

    fn parse(created_at: DateTime<Utc>, contents: &str) -> Self {
        let mut job_id = None;
        let mut resource_arns = Vec::new();

        for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(id) = line.strip_prefix(JOB_HEADER) {
                job_id = Some(id.trim().to_string());
            } else if !line.starts_with('#') {
                resource_arns.push(line.to_string());
            }
        }

        Self {
            created_at,
            job_id,
            resource_arns,
        }
    }
}

/// A retry file waiting for resubmission
#[derive(Debug, Clone)]
pub struct PendingRetry {
    pub path: PathBuf,
    pub record: RetryRecord,
}

/// Persist order encoded in a retry file name: the creation millis and
/// the collision counter (`arns-<millis>-<n>.txt`, 0 when absent)
fn sequence_of(path: &Path) -> Option<(i64, u32)> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    let (millis, counter) = match stem.split_once('-') {
        Some((millis, counter)) => (millis, counter.parse::<u32>().ok()?),
        None => (stem, 0),
    };
    Some((millis.parse::<i64>().ok()?, counter))
}

pub struct RetryQueue<'a> {
    fs: &'a dyn FileSystem,
    dir: PathBuf,
}

impl<'a> RetryQueue<'a> {
    pub fn new(fs: &'a dyn FileSystem, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `record` to a new file and return its path. Existing files are
    /// never overwritten.
    pub fn persist(&self, record: &RetryRecord) -> MigrationResult<PathBuf> {
        self.fs.create_dir_all(&self.dir)?;

        let millis = record.created_at.timestamp_millis();
        let mut path = self.dir.join(format!("{}{}{}", FILE_PREFIX, millis, FILE_SUFFIX));
        let mut attempt = 1;
        while self.fs.exists(&path) || self.fs.exists(&self.done_path(&path)) {
            path = self
                .dir
                .join(format!("{}{}-{}{}", FILE_PREFIX, millis, attempt, FILE_SUFFIX));
            attempt += 1;
        }

        self.fs.write(&path, &record.render())?;
        tracing::warn!(
            path = %path.display(),
            arns = record.resource_arns.len(),
            "Persisted retry record"
        );
        Ok(path)
    }

    /// Every retry file in the queue, oldest first
    pub fn pending(&self) -> MigrationResult<Vec<PendingRetry>> {
        if !self.fs.exists(&self.dir) {
            return Ok(Vec::new());
        }

        let mut files: Vec<((i64, u32), DateTime<Utc>, PathBuf)> = self
            .fs
            .read_dir(&self.dir)?
            .into_iter()
            .filter(|p| self.fs.is_file(p))
            .filter_map(|p| {
                let sequence = sequence_of(&p)?;
                let created_at = DateTime::<Utc>::from_timestamp_millis(sequence.0)?;
                Some((sequence, created_at, p))
            })
            .collect();
        files.sort_by_key(|(sequence, _, _)| *sequence);

        files
            .into_iter()
            .map(|(_, created_at, path)| {
                let contents = self.fs.read_to_string(&path)?;
                Ok(PendingRetry {
                    record: RetryRecord::parse(created_at, &contents),
                    path,
                })
            })
            .collect()
    }

    /// Move a resubmitted file into `done/`
    pub fn mark_done(&self, path: &Path) -> MigrationResult<PathBuf> {
        if !self.fs.is_file(path) {
            return Err(MigrationError::FileSystem(format!(
                "Retry file not found: {}",
                path.display()
            )));
        }

        let target = self.done_path(path);
        self.fs.rename(path, &target)?;
        Ok(target)
    }

    fn done_path(&self, path: &Path) -> PathBuf {
        let name = path.file_name().map(PathBuf::from).unwrap_or_default();
        self.dir.join(DONE_DIR).join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockFileSystem, RealFileSystem};
    use tempfile::TempDir;

    fn record(millis: i64, arns: &[&str]) -> RetryRecord {
        RetryRecord::new(
            DateTime::<Utc>::from_timestamp_millis(millis).unwrap(),
            "qsmigrate-export-1",
            arns.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_persist_writes_one_arn_per_line() {
        let fs = MockFileSystem::new();
        let queue = RetryQueue::new(&fs, "data/retry");

        let path = queue
            .persist(&record(1_714_555_800_123, &["arn:a", "arn:b"]))
            .unwrap();

        assert_eq!(path, PathBuf::from("data/retry/arns-1714555800123.txt"));
        assert_eq!(
            fs.get_file_contents(&path).unwrap(),
            "# job qsmigrate-export-1\narn:a\narn:b\n"
        );
    }

    #[test]
    fn test_persist_never_overwrites() {
        let fs = MockFileSystem::new();
        let queue = RetryQueue::new(&fs, "data/retry");

        let first = queue.persist(&record(5, &["arn:a"])).unwrap();
        let second = queue.persist(&record(5, &["arn:b"])).unwrap();

        assert_ne!(first, second);
        assert_eq!(second, PathBuf::from("data/retry/arns-5-1.txt"));
        assert_eq!(fs.files_in(Path::new("data/retry")).len(), 2);
    }

    #[test]
    fn test_pending_reads_oldest_first_and_skips_other_files() {
        let fs = MockFileSystem::new();
        let queue = RetryQueue::new(&fs, "data/retry");
        queue.persist(&record(2_000, &["arn:late"])).unwrap();
        queue.persist(&record(1_000, &["arn:early"])).unwrap();
        fs.write(Path::new("data/retry/notes.md"), "ignore me").unwrap();

        let pending = queue.pending().unwrap();

        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].record.resource_arns, vec!["arn:early"]);
        assert_eq!(pending[0].record.job_id.as_deref(), Some("qsmigrate-export-1"));
        assert_eq!(pending[1].record.created_at.timestamp_millis(), 2_000);
    }

    #[test]
    fn test_pending_keeps_persist_order_within_one_millisecond() {
        let fs = MockFileSystem::new();
        let queue = RetryQueue::new(&fs, "data/retry");
        let expected: Vec<String> = (0..12).map(|i| format!("arn:{}", i)).collect();
        for arn in &expected {
            queue.persist(&record(5, &[arn.as_str()])).unwrap();
        }

        let order: Vec<String> = queue
            .pending()
            .unwrap()
            .into_iter()
            .flat_map(|p| p.record.resource_arns)
            .collect();

        assert_eq!(order, expected);
    }

    #[test]
    fn test_sequence_of_parses_collision_counter() {
        assert_eq!(sequence_of(Path::new("r/arns-5.txt")), Some((5, 0)));
        assert_eq!(sequence_of(Path::new("r/arns-5-11.txt")), Some((5, 11)));
        assert_eq!(sequence_of(Path::new("r/arns-5-x.txt")), None);
        assert_eq!(sequence_of(Path::new("r/notes.md")), None);
    }

    #[test]
    fn test_pending_without_directory_is_empty() {
        let fs = MockFileSystem::new();
        assert!(RetryQueue::new(&fs, "missing").pending().unwrap().is_empty());
    }

    #[test]
    fn test_mark_done_moves_file() {
        let fs = MockFileSystem::new();
        let queue = RetryQueue::new(&fs, "data/retry");
        let path = queue.persist(&record(42, &["arn:a"])).unwrap();

        let done = queue.mark_done(&path).unwrap();

        assert_eq!(done, PathBuf::from("data/retry/done/arns-42.txt"));
        assert!(!fs.has_file(&path));
        assert!(queue.pending().unwrap().is_empty());

        // A later failure at the same millisecond does not collide with done/
        let again = queue.persist(&record(42, &["arn:b"])).unwrap();
        assert_eq!(again, PathBuf::from("data/retry/arns-42-1.txt"));
    }

    #[test]
    fn test_plain_arn_list_without_header() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("retry/arns-77.txt"), "arn:x\n\narn:y\n").unwrap();

        let pending = RetryQueue::new(&fs, "retry").pending().unwrap();

        assert_eq!(pending[0].record.job_id, None);
        assert_eq!(pending[0].record.resource_arns, vec!["arn:x", "arn:y"]);
    }

    #[test]
    fn test_real_filesystem_queue() {
        let temp = TempDir::new().unwrap();
        let fs = RealFileSystem;
        let queue = RetryQueue::new(&fs, temp.path().join("retry"));

        let path = queue.persist(&record(9_000, &["arn:a"])).unwrap();
        assert!(path.exists());

        let pending = queue.pending().unwrap();
        assert_eq!(pending.len(), 1);

        queue.mark_done(&pending[0].path).unwrap();
        assert!(temp.path().join("retry/done/arns-9000.txt").exists());
        assert!(queue.pending().unwrap().is_empty());
    }
}
