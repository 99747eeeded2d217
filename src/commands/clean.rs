use anyhow::{Context as _, Result};
use std::path::Path;

use crate::aws::{self, SdkQuickSightApi};
use crate::context::Context;
use crate::logging;
use crate::migration::model::ResourceClass;
use crate::migration::{Cleaner, CleanupReport, QuickSightApi};

/// Handles the 'clean' command - deletes every migratable asset in a region
pub struct CleanCommand;

impl CleanCommand {
    pub fn execute(
        ctx: &Context,
        region: &str,
        account_id: Option<&str>,
        yes: bool,
        log_dir: &Path,
    ) -> Result<()> {
        let log_path = logging::log_file_path(log_dir, "clean", &[region], ctx.clock.now());
        let _guard = logging::init(&log_path)?;

        let account_id = aws::account_id_or_caller(account_id, region)?;
        let api = SdkQuickSightApi::connect(&account_id, region)?;

        Self::run(ctx, &api, yes)?;
        Ok(())
    }

    /// Returns `None` when nothing was deleted because the plan was empty
    /// or the deletion was not confirmed
    pub fn run(ctx: &Context, api: &dyn QuickSightApi, yes: bool) -> Result<Option<CleanupReport>> {
        let cleaner = Cleaner::new(api, &*ctx.output);

        ctx.output.section("QuickSight Cleanup");
        ctx.output.key_value("Region", api.region());

        let plan = cleaner
            .plan()
            .with_context(|| format!("Failed to list assets in {}", api.region()))?;

        for class in ResourceClass::BUNDLE_ORDER
            .into_iter()
            .chain([ResourceClass::Folder])
        {
            ctx.output
                .key_value(class.display_name(), &plan.count(class).to_string());
        }

        if plan.is_empty() {
            ctx.output.info("Nothing to delete");
            return Ok(None);
        }

        let confirmed = yes
            || ctx.input.confirm(
                &format!(
                    "Permanently delete {} resources in {}?",
                    plan.len(),
                    api.region()
                ),
                false,
            )?;
        if !confirmed {
            ctx.output
                .warning("Dry run: nothing was deleted. Pass --yes to delete.");
            return Ok(None);
        }

        let report = cleaner.execute(&plan);
        ctx.output.blank();
        ctx.output.key_value("Deleted", &report.deleted.to_string());
        ctx.output
            .key_value("Already deleted", &report.missing.to_string());
        ctx.output.key_value("Failed", &report.failed.to_string());

        if report.failed > 0 {
            anyhow::bail!("{} deletion(s) failed in {}", report.failed, api.region());
        }

        ctx.output.success("Cleanup completed");
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::api::MockQuickSightApi;
    use crate::migration::model::DashboardSummary;
    use crate::traits::{MockClock, MockFileSystem, MockOutput, MockUserInput};
    use std::sync::Arc;

    fn context(input: MockUserInput, output: Arc<MockOutput>) -> Context {
        Context::test_with(
            Arc::new(MockFileSystem::new()),
            Arc::new(input),
            output,
            Arc::new(MockClock::new()),
        )
    }

    fn region_with_dashboard() -> MockQuickSightApi {
        let api = MockQuickSightApi::new("ap-southeast-3");
        let dashboard = DashboardSummary {
            id: "sales".to_string(),
            arn: api.arn("dashboard", "sales"),
            name: "Sales".to_string(),
        };
        api.with_pages(ResourceClass::Dashboard, vec![vec![dashboard.into()]])
            .with_folder("finance", "Finance", None)
    }

    #[test]
    fn test_yes_deletes_without_prompt() {
        let output = Arc::new(MockOutput::new());
        let ctx = context(MockUserInput::new(), output.clone());
        let api = region_with_dashboard();

        let report = CleanCommand::run(&ctx, &api, true).unwrap().unwrap();

        assert_eq!(report.deleted, 2);
        assert_eq!(api.deleted().len(), 2);
    }

    #[test]
    fn test_declined_prompt_is_a_dry_run() {
        let output = Arc::new(MockOutput::new());
        let ctx = context(MockUserInput::with_confirmations(vec![false]), output.clone());
        let api = region_with_dashboard();

        let report = CleanCommand::run(&ctx, &api, false).unwrap();

        assert!(report.is_none());
        assert!(api.deleted().is_empty());
        assert!(output.warned_about("Dry run"));
    }

    #[test]
    fn test_confirmed_prompt_deletes() {
        let output = Arc::new(MockOutput::new());
        let ctx = context(MockUserInput::with_confirmations(vec![true]), output);
        let api = region_with_dashboard();

        let report = CleanCommand::run(&ctx, &api, false).unwrap().unwrap();

        assert_eq!(report.deleted, 2);
    }

    #[test]
    fn test_empty_region_needs_no_confirmation() {
        let output = Arc::new(MockOutput::new());
        let ctx = context(MockUserInput::new(), output);
        let api = MockQuickSightApi::new("ap-southeast-3");

        assert!(CleanCommand::run(&ctx, &api, false).unwrap().is_none());
    }

    #[test]
    fn test_failed_deletions_fail_the_command() {
        let output = Arc::new(MockOutput::new());
        let ctx = context(MockUserInput::new(), output);
        let api = region_with_dashboard().failing("DeleteDashboard");

        let err = CleanCommand::run(&ctx, &api, true).unwrap_err();

        assert!(err.to_string().contains("1 deletion(s) failed"));
        assert_eq!(api.deleted().len(), 1);
    }
}
