use anyhow::{Context as _, Result};
use std::path::Path;

use crate::aws::{self, HttpDownloader, SdkQuickSightApi};
use crate::commands::{SelectionSource, resolve_config};
use crate::config::{ConfigOverrides, MigrationConfig};
use crate::context::Context;
use crate::logging;
use crate::migration::{ArtifactDownloader, Coordinator, QuickSightApi, RunSummary};

/// Handles the 'migrate' command
pub struct MigrateCommand;

impl MigrateCommand {
    pub fn execute(
        ctx: &Context,
        config_path: Option<&Path>,
        selection: SelectionSource<'_>,
        overrides: ConfigOverrides,
    ) -> Result<()> {
        let config = resolve_config(ctx, config_path, selection, overrides)?;
        // Fail before any remote call
        config.selection()?;

        let log_path = logging::log_file_path(
            &config.log_dir,
            "migration",
            &[&config.source_region, &config.target_region],
            ctx.clock.now(),
        );
        let _guard = logging::init(&log_path)?;
        ctx.output
            .dimmed(&format!("Logging to {}", log_path.display()));

        let account_id =
            aws::account_id_or_caller(config.account_id.as_deref(), &config.source_region)?;
        let source = SdkQuickSightApi::connect(&account_id, &config.source_region)?;
        let target = SdkQuickSightApi::connect(&account_id, &config.target_region)?;
        let downloader = HttpDownloader::new()?;

        Self::run(ctx, &config, &source, &target, &downloader)?;
        Ok(())
    }

    pub fn run(
        ctx: &Context,
        config: &MigrationConfig,
        source: &dyn QuickSightApi,
        target: &dyn QuickSightApi,
        downloader: &dyn ArtifactDownloader,
    ) -> Result<RunSummary> {
        ctx.fs
            .create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", config.data_dir))?;

        tracing::info!(
            source = %config.source_region,
            target = %config.target_region,
            batch_size = config.batch_size,
            "Starting migration"
        );

        let summary = Coordinator::new(config, source, target, downloader, ctx)
            .run()
            .context("Migration aborted")?;

        let path = summary.write(&*ctx.fs, &config.log_dir)?;
        ctx.output
            .dimmed(&format!("Run summary written to {}", path.display()));

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::migration::api::{MockDownloader, MockQuickSightApi};
    use crate::migration::model::{DashboardSummary, ResourceClass};
    use crate::migration::selector::SelectionPolicy;
    use crate::traits::{MockClock, MockFileSystem, MockOutput, MockUserInput};
    use std::sync::Arc;

    fn config(selection: Option<SelectionPolicy>) -> MigrationConfig {
        MigrationConfig::resolve(
            ConfigFile::default(),
            ConfigOverrides {
                source_region: Some("us-east-1".to_string()),
                target_region: Some("eu-west-1".to_string()),
                skip_folders: true,
                selection,
                ..ConfigOverrides::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_run_writes_bundles_and_summary() {
        let fs = Arc::new(MockFileSystem::new());
        let output = Arc::new(MockOutput::new());
        let ctx = Context::test_with(
            fs.clone(),
            Arc::new(MockUserInput::new()),
            output.clone(),
            Arc::new(MockClock::new()),
        );
        let source = MockQuickSightApi::new("us-east-1");
        let dashboard = DashboardSummary {
            id: "sales".to_string(),
            arn: source.arn("dashboard", "sales"),
            name: "Sales".to_string(),
        };
        let source = source.with_pages(ResourceClass::Dashboard, vec![vec![dashboard.into()]]);
        let target = MockQuickSightApi::new("eu-west-1");

        let summary = MigrateCommand::run(
            &ctx,
            &config(Some(SelectionPolicy::All)),
            &source,
            &target,
            &MockDownloader::new(b"zip"),
        )
        .unwrap();

        assert_eq!(summary.batches_imported, 1);
        assert_eq!(fs.files_in(Path::new("data")).len(), 1);
        assert_eq!(fs.files_in(Path::new("log")).len(), 1);
        assert!(output.to_text().contains("Run summary written to"));
    }

    #[test]
    fn test_run_without_selection_fails() {
        let ctx = Context::test();
        let source = MockQuickSightApi::new("us-east-1");
        let target = MockQuickSightApi::new("eu-west-1");

        let err = MigrateCommand::run(
            &ctx,
            &config(None),
            &source,
            &target,
            &MockDownloader::new(b"zip"),
        )
        .unwrap_err();

        assert!(format!("{:#}", err).contains("selection policy is required"));
    }
}
