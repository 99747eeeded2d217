//! Run configuration: an optional YAML file overlaid with CLI flags.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::migration::batch::DEFAULT_BATCH_SIZE;
use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::job::JobSettings;
use crate::migration::selector::SelectionPolicy;
use crate::traits::FileSystem;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_LOG_DIR: &str = "log";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 30 * 60;

/// Contents of a `--config` YAML file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub source_region: Option<String>,
    #[serde(default)]
    pub target_region: Option<String>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,
    #[serde(default)]
    pub skip_folders: Option<bool>,
    #[serde(default)]
    pub selection: Option<SelectionPolicy>,
}

impl ConfigFile {
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let content = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

/// Read a selection policy from its own YAML file
pub fn load_selection(fs: &dyn FileSystem, path: &Path) -> Result<SelectionPolicy> {
    let content = fs
        .read_to_string(path)
        .with_context(|| format!("Failed to read selection file: {:?}", path))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse selection file: {:?}", path))
}

/// Values given on the command line; `Some` wins over the config file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub account_id: Option<String>,
    pub source_region: Option<String>,
    pub target_region: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub poll_interval_secs: Option<u64>,
    pub job_timeout_secs: Option<u64>,
    pub skip_folders: bool,
    pub selection: Option<SelectionPolicy>,
}

/// Resolved settings for one migration run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationConfig {
    /// Filled from STS when neither the file nor the CLI provides it
    pub account_id: Option<String>,
    pub source_region: String,
    pub target_region: String,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub batch_size: usize,
    pub poll_interval_secs: u64,
    pub job_timeout_secs: u64,
    pub skip_folders: bool,
    pub selection: Option<SelectionPolicy>,
}

impl MigrationConfig {
    pub fn resolve(file: ConfigFile, overrides: ConfigOverrides) -> Result<Self> {
        let config = Self {
            account_id: overrides.account_id.or(file.account_id),
            source_region: overrides
                .source_region
                .or(file.source_region)
                .unwrap_or_default(),
            target_region: overrides
                .target_region
                .or(file.target_region)
                .unwrap_or_default(),
            data_dir: overrides
                .data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            log_dir: overrides
                .log_dir
                .or(file.log_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            batch_size: overrides
                .batch_size
                .or(file.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            poll_interval_secs: overrides
                .poll_interval_secs
                .or(file.poll_interval_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            job_timeout_secs: overrides
                .job_timeout_secs
                .or(file.job_timeout_secs)
                .unwrap_or(DEFAULT_JOB_TIMEOUT_SECS),
            skip_folders: overrides.skip_folders || file.skip_folders.unwrap_or(false),
            selection: overrides.selection.or(file.selection),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_region.trim().is_empty() {
            anyhow::bail!("Source region must not be empty");
        }
        if self.target_region.trim().is_empty() {
            anyhow::bail!("Target region must not be empty");
        }
        if self.batch_size == 0 {
            anyhow::bail!("Batch size must be greater than zero");
        }
        if self.poll_interval_secs == 0 {
            anyhow::bail!("Poll interval must be greater than zero");
        }
        if self.job_timeout_secs == 0 {
            anyhow::bail!("Job timeout must be greater than zero");
        }
        Ok(())
    }

    /// The selection policy; a migration cannot run without one
    pub fn selection(&self) -> MigrationResult<&SelectionPolicy> {
        self.selection.as_ref().ok_or_else(|| {
            MigrationError::InvalidInput(
                "a selection policy is required: pass --all, --selection <FILE>, \
                 or set `selection` in the config file"
                    .to_string(),
            )
        })
    }

    pub fn retry_dir(&self) -> PathBuf {
        self.data_dir.join("retry")
    }

    pub fn job_settings(&self) -> JobSettings {
        JobSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.job_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockFileSystem;

    fn regions() -> ConfigOverrides {
        ConfigOverrides {
            source_region: Some("us-east-1".to_string()),
            target_region: Some("ap-southeast-3".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::resolve(ConfigFile::default(), regions()).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.log_dir, PathBuf::from("log"));
        assert_eq!(config.retry_dir(), PathBuf::from("data/retry"));
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.job_settings(), JobSettings::default());
        assert!(!config.skip_folders);
        assert!(config.selection().is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let fs = MockFileSystem::new();
        fs.write(
            Path::new("qsmigrate.yaml"),
            r#"
account_id: "111122223333"
source_region: eu-west-1
target_region: eu-central-1
batch_size: 50
poll_interval_secs: 5
selection:
  mode: all
"#,
        )
        .unwrap();
        let file = ConfigFile::load(&fs, Path::new("qsmigrate.yaml")).unwrap();

        let overrides = ConfigOverrides {
            batch_size: Some(25),
            ..regions()
        };
        let config = MigrationConfig::resolve(file, overrides).unwrap();

        assert_eq!(config.account_id.as_deref(), Some("111122223333"));
        assert_eq!(config.source_region, "us-east-1");
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.selection().unwrap(), &SelectionPolicy::All);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_batch = ConfigOverrides {
            batch_size: Some(0),
            ..regions()
        };
        assert!(MigrationConfig::resolve(ConfigFile::default(), zero_batch).is_err());

        let zero_poll = ConfigOverrides {
            poll_interval_secs: Some(0),
            ..regions()
        };
        assert!(MigrationConfig::resolve(ConfigFile::default(), zero_poll).is_err());

        let err = MigrationConfig::resolve(ConfigFile::default(), ConfigOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("Source region"));
    }

    #[test]
    fn test_unknown_config_keys_are_rejected() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("bad.yaml"), "batch_sise: 10\n").unwrap();

        assert!(ConfigFile::load(&fs, Path::new("bad.yaml")).is_err());
    }

    #[test]
    fn test_load_selection_file() {
        let fs = MockFileSystem::new();
        fs.write(
            Path::new("selection.yaml"),
            "mode: by_name\ndata_sources: [data-test12345]\ndata_source_type: ATHENA\n",
        )
        .unwrap();

        let policy = load_selection(&fs, Path::new("selection.yaml")).unwrap();

        assert!(matches!(policy, SelectionPolicy::ByName { .. }));
        assert!(load_selection(&fs, Path::new("missing.yaml")).is_err());
    }
}
