pub mod clean;
pub mod inventory;
pub mod migrate;
pub mod retry;

pub use clean::CleanCommand;
pub use inventory::InventoryCommand;
pub use migrate::MigrateCommand;
pub use retry::RetryCommand;

use anyhow::Result;
use std::path::Path;

use crate::config::{ConfigFile, ConfigOverrides, MigrationConfig, load_selection};
use crate::context::Context;
use crate::migration::selector::SelectionPolicy;

/// Where a run's selection policy comes from on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionSource<'a> {
    pub all: bool,
    pub file: Option<&'a Path>,
}

/// Merge the optional config file, the selection flags and the CLI
/// overrides into one validated configuration
pub fn resolve_config(
    ctx: &Context,
    config_path: Option<&Path>,
    selection: SelectionSource<'_>,
    mut overrides: ConfigOverrides,
) -> Result<MigrationConfig> {
    let file = match config_path {
        Some(path) => ConfigFile::load(&*ctx.fs, path)?,
        None => ConfigFile::default(),
    };

    overrides.selection = match (selection.all, selection.file) {
        (true, _) => Some(SelectionPolicy::All),
        (false, Some(path)) => Some(load_selection(&*ctx.fs, path)?),
        (false, None) => None,
    };

    MigrationConfig::resolve(file, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{FileSystem, MockClock, MockFileSystem, MockOutput, MockUserInput};
    use std::sync::Arc;

    fn context(fs: Arc<MockFileSystem>) -> Context {
        Context::test_with(
            fs,
            Arc::new(MockUserInput::new()),
            Arc::new(MockOutput::new()),
            Arc::new(MockClock::new()),
        )
    }

    fn regions() -> ConfigOverrides {
        ConfigOverrides {
            source_region: Some("us-east-1".to_string()),
            target_region: Some("eu-west-1".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn test_all_flag_wins_over_config_selection() {
        let fs = Arc::new(MockFileSystem::new());
        fs.write(
            Path::new("qsmigrate.yaml"),
            "selection:\n  mode: by_arn\n  arns: [\"arn:aws:quicksight:us-east-1:1:dashboard/x\"]\n",
        )
        .unwrap();
        let ctx = context(fs);

        let config = resolve_config(
            &ctx,
            Some(Path::new("qsmigrate.yaml")),
            SelectionSource {
                all: true,
                file: None,
            },
            regions(),
        )
        .unwrap();

        assert_eq!(config.selection, Some(SelectionPolicy::All));
    }

    #[test]
    fn test_selection_file_is_loaded() {
        let fs = Arc::new(MockFileSystem::new());
        fs.write(
            Path::new("pick.yaml"),
            "mode: by_name\ndashboards: [Sales]\n",
        )
        .unwrap();
        let ctx = context(fs);

        let config = resolve_config(
            &ctx,
            None,
            SelectionSource {
                all: false,
                file: Some(Path::new("pick.yaml")),
            },
            regions(),
        )
        .unwrap();

        assert!(matches!(
            config.selection,
            Some(SelectionPolicy::ByName { ref dashboards, .. }) if dashboards == &vec!["Sales".to_string()]
        ));
    }

    #[test]
    fn test_config_selection_is_kept_without_flags() {
        let fs = Arc::new(MockFileSystem::new());
        fs.write(Path::new("qsmigrate.yaml"), "selection:\n  mode: all\n")
            .unwrap();
        let ctx = context(fs);

        let config = resolve_config(
            &ctx,
            Some(Path::new("qsmigrate.yaml")),
            SelectionSource::default(),
            regions(),
        )
        .unwrap();

        assert_eq!(config.selection, Some(SelectionPolicy::All));
    }
}
