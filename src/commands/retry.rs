use anyhow::{Context as _, Result};
use std::path::Path;

use crate::aws::{self, HttpDownloader, SdkQuickSightApi};
use crate::commands::{SelectionSource, resolve_config};
use crate::config::{ConfigOverrides, MigrationConfig};
use crate::context::Context;
use crate::logging;
use crate::migration::{ArtifactDownloader, Coordinator, QuickSightApi, ResubmitSummary};

/// Handles the 'retry' command - resubmits batches whose export failed
pub struct RetryCommand;

impl RetryCommand {
    pub fn execute(
        ctx: &Context,
        config_path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<()> {
        let config = resolve_config(ctx, config_path, SelectionSource::default(), overrides)?;

        let log_path = logging::log_file_path(
            &config.log_dir,
            "retry",
            &[&config.source_region, &config.target_region],
            ctx.clock.now(),
        );
        let _guard = logging::init(&log_path)?;

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
    ) -> Result<ResubmitSummary> {
        let summary = Coordinator::new(config, source, target, downloader, ctx)
            .resubmit()
            .context("Failed to resubmit retry queue")?;

        ctx.output.blank();
        if summary.files == 0 {
            ctx.output.info("Retry queue is empty");
        } else if summary.failed > 0 {
            ctx.output.warning(&format!(
                "{} of {} retry file(s) still pending",
                summary.failed, summary.files
            ));
        } else {
            ctx.output.success(&format!(
                "All {} retry file(s) resubmitted",
                summary.resubmitted
            ));
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::migration::api::{MockDownloader, MockQuickSightApi};
    use crate::traits::{FileSystem, MockClock, MockFileSystem, MockOutput, MockUserInput};
    use std::sync::Arc;

    fn config() -> MigrationConfig {
        MigrationConfig::resolve(
            ConfigFile::default(),
            ConfigOverrides {
                source_region: Some("us-east-1".to_string()),
                target_region: Some("eu-west-1".to_string()),
                ..ConfigOverrides::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_retry_does_not_need_a_selection() {
        let fs = Arc::new(MockFileSystem::new());
        let output = Arc::new(MockOutput::new());
        let ctx = Context::test_with(
            fs.clone(),
            Arc::new(MockUserInput::new()),
            output.clone(),
            Arc::new(MockClock::new()),
        );
        fs.write(
            Path::new("data/retry/arns-1714555800000.txt"),
            "# job qsmigrate-export-1\narn:aws:quicksight:us-east-1:1:dashboard/sales\n",
        )
        .unwrap();
        let source = MockQuickSightApi::new("us-east-1");
        let target = MockQuickSightApi::new("eu-west-1");

        let summary =
            RetryCommand::run(&ctx, &config(), &source, &target, &MockDownloader::new(b"zip"))
                .unwrap();

        assert_eq!(summary.resubmitted, 1);
        assert_eq!(
            source.export_requests()[0].resource_arns,
            vec!["arn:aws:quicksight:us-east-1:1:dashboard/sales".to_string()]
        );
        assert!(fs.has_file(Path::new("data/retry/done/arns-1714555800000.txt")));
        assert!(output.to_text().contains("All 1 retry file(s) resubmitted"));
    }

    #[test]
    fn test_empty_queue() {
        let output = Arc::new(MockOutput::new());
        let ctx = Context::test_with(
            Arc::new(MockFileSystem::new()),
            Arc::new(MockUserInput::new()),
            output.clone(),
            Arc::new(MockClock::new()),
        );
        let source = MockQuickSightApi::new("us-east-1");
        let target = MockQuickSightApi::new("eu-west-1");

        let summary =
            RetryCommand::run(&ctx, &config(), &source, &target, &MockDownloader::new(b"zip"))
                .unwrap();

        assert_eq!(summary.files, 0);
        assert!(output.to_text().contains("Retry queue is empty"));
    }
}
