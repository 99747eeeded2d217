//! End-to-end migration between two regions.
//!
//! inventory -> selection -> dependency-ordered ARNs -> batches ->
//! (export, save, import) per batch -> folder reconciliation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::MigrationConfig;
use crate::context::Context;
use crate::migration::api::{ArtifactDownloader, QuickSightApi};
use crate::migration::batch::batch;
use crate::migration::bundle::{BundleStore, FILE_TIMESTAMP_FORMAT};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::folders::{FolderReconciler, FolderReport};
use crate::migration::inventory::{Inventory, InventorySnapshot};
use crate::migration::job::JobDriver;
use crate::migration::model::ResourceClass;
use crate::migration::retry::RetryQueue;
use crate::migration::selector::select;

/// Outcome of one `run`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source_region: String,
    pub target_region: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Selected assets per class
    pub assets: BTreeMap<ResourceClass, usize>,
    pub batches_total: usize,
    pub batches_exported: usize,
    pub batches_failed: usize,
    pub batches_imported: usize,
    pub bundles: Vec<PathBuf>,
    pub retry_files: usize,
    pub folders: Option<FolderReport>,
}

impl RunSummary {
    /// Write the summary as pretty JSON to `<dir>/summary-<src>-<tgt>-<ts>.json`
    pub fn write(&self, fs: &dyn crate::traits::FileSystem, dir: &Path) -> MigrationResult<PathBuf> {
        let path = dir.join(format!(
            "summary-{}-{}-{}.json",
            self.source_region,
            self.target_region,
            self.started_at.format(FILE_TIMESTAMP_FORMAT)
        ));
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MigrationError::InvalidInput(format!("cannot serialize summary: {}", e)))?;
        fs.write(&path, &json)?;
        Ok(path)
    }
}

/// Outcome of a retry-queue resubmission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResubmitSummary {
    pub files: usize,
    pub resubmitted: usize,
    pub failed: usize,
}

pub struct Coordinator<'a> {
    config: &'a MigrationConfig,
    source: &'a dyn QuickSightApi,
    target: &'a dyn QuickSightApi,
    downloader: &'a dyn ArtifactDownloader,
    ctx: &'a Context,
}

impl<'a> Coordinator<'a> {
    pub fn new(
        config: &'a MigrationConfig,
        source: &'a dyn QuickSightApi,
        target: &'a dyn QuickSightApi,
        downloader: &'a dyn ArtifactDownloader,
        ctx: &'a Context,
    ) -> Self {
        Self {
            config,
            source,
            target,
            downloader,
            ctx,
        }
    }

    fn exporter(&self) -> JobDriver<'_> {
        JobDriver::new(
            self.source,
            &*self.ctx.clock,
            &*self.ctx.output,
            self.config.job_settings(),
        )
    }

    fn importer(&self) -> JobDriver<'_> {
        JobDriver::new(
            self.target,
            &*self.ctx.clock,
            &*self.ctx.output,
            self.config.job_settings(),
        )
    }

    fn bundles(&self) -> BundleStore<'_> {
        BundleStore::new(&*self.ctx.fs, &*self.ctx.clock, &self.config.data_dir)
    }

    fn retry_queue(&self) -> RetryQueue<'_> {
        RetryQueue::new(&*self.ctx.fs, self.config.retry_dir())
    }

    /// Source inventory narrowed to the configured selection
    pub fn select_assets(&self) -> MigrationResult<InventorySnapshot> {
        let policy = self.config.selection()?;
        let snapshot = Inventory::new(self.source).snapshot()?;

        let mut selected = InventorySnapshot::default();
        for class in ResourceClass::ALL {
            let predicate = policy.predicate_for(class);
            selected.insert(class, select(snapshot.get(class), |a| predicate.matches(a)));
        }
        Ok(selected)
    }

    /// Run a full migration.
    ///
    /// A batch whose export fails or times out is recorded in the retry
    /// queue and skipped. A failed import, a bundle that cannot be saved, or
    /// a retry record that cannot be written stops the run.
    pub fn run(&self) -> MigrationResult<RunSummary> {
        let output = &*self.ctx.output;
        let policy = self.config.selection()?;

        output.section("QuickSight Migration");
        output.key_value("Source", self.source.region());
        output.key_value("Target", self.target.region());
        output.key_value("Selection", &policy.describe());
        output.key_value("Batch size", &self.config.batch_size.to_string());

        let mut summary = RunSummary {
            source_region: self.source.region().to_string(),
            target_region: self.target.region().to_string(),
            started_at: self.ctx.clock.now(),
            finished_at: None,
            assets: BTreeMap::new(),
            batches_total: 0,
            batches_exported: 0,
            batches_failed: 0,
            batches_imported: 0,
            bundles: Vec::new(),
            retry_files: 0,
            folders: None,
        };

        output.subsection("Inventory");
        let selected = self.select_assets()?;
        for class in ResourceClass::ALL {
            let count = selected.count(class);
            summary.assets.insert(class, count);
            output.key_value(class.display_name(), &count.to_string());
        }

        let arns = selected.ordered_arns();
        let batches = batch(&arns, self.config.batch_size)?;
        summary.batches_total = batches.len();

        output.subsection("Asset bundles");
        if batches.is_empty() {
            output.info("No assets selected for export");
        }

        let exporter = self.exporter();
        let importer = self.importer();
        let store = self.bundles();
        let retry = self.retry_queue();

        for (index, arns) in batches.iter().enumerate() {
            output.info(&format!(
                "Batch {}/{}: exporting {} resources",
                index + 1,
                batches.len(),
                arns.len()
            ));

            let job = match exporter.export(index, arns, self.downloader, Some(&retry)) {
                Ok(job) => job,
                // Recoverable export errors only come back once the retry
                // record is on disk
                Err(err) if err.is_batch_recoverable() => {
                    summary.batches_failed += 1;
                    summary.retry_files += 1;
                    output.warning(&format!("Batch {} export failed: {}", index + 1, err));
                    continue;
                }
                Err(err) => return Err(err),
            };
            summary.batches_exported += 1;

            let bundle = job.artifact.unwrap_or_default();
            let path = store.save(index, &bundle)?;
            output.dimmed(&format!("Bundle saved to {}", path.display()));
            summary.bundles.push(path);

            importer.import(&bundle)?;
            summary.batches_imported += 1;
            output.success(&format!("Batch {} imported into {}", index + 1, self.target.region()));
        }

        if self.config.skip_folders {
            output.dimmed("Skipping folder migration");
        } else {
            let report = FolderReconciler::new(self.source, self.target, output).migrate()?;
            summary.folders = Some(report);
        }

        summary.finished_at = Some(self.ctx.clock.now());
        self.report(&summary);
        Ok(summary)
    }

    /// Re-export and import every batch in the retry queue, oldest first.
    /// Files whose batch goes through are moved to `done/`. A failed export
    /// leaves its file queued and moves on; a failed import stops the
    /// resubmission like it stops `run`, leaving that file and every later
    /// one queued.
    pub fn resubmit(&self) -> MigrationResult<ResubmitSummary> {
        let output = &*self.ctx.output;
        let retry = self.retry_queue();
        let pending = retry.pending()?;
        let mut summary = ResubmitSummary {
            files: pending.len(),
            ..ResubmitSummary::default()
        };

        output.section("Retry Queue");
        output.key_value("Directory", &retry.dir().display().to_string());
        output.key_value("Pending", &pending.len().to_string());

        let exporter = self.exporter();
        let importer = self.importer();
        let store = self.bundles();

        for (index, entry) in pending.iter().enumerate() {
            let name = entry.path.display().to_string();
            if entry.record.resource_arns.is_empty() {
                output.warning(&format!("{} lists no ARNs", name));
                retry.mark_done(&entry.path)?;
                continue;
            }

            let outcome = exporter
                .export(index, &entry.record.resource_arns, self.downloader, None)
                .and_then(|job| {
                    let bundle = job.artifact.unwrap_or_default();
                    store.save(index, &bundle)?;
                    importer.import(&bundle)
                });

            match outcome {
                Ok(_) => {
                    retry.mark_done(&entry.path)?;
                    summary.resubmitted += 1;
                    output.success(&format!(
                        "Resubmitted {} ({} resources)",
                        name,
                        entry.record.resource_arns.len()
                    ));
                }
                Err(err) if err.is_batch_recoverable() => {
                    summary.failed += 1;
                    output.warning(&format!("Retry of {} failed: {}", name, err));
                }
                Err(err) => {
                    output.error(&format!("Retry of {} aborted: {}", name, err));
                    return Err(err);
                }
            }
        }

        Ok(summary)
    }

    fn report(&self, summary: &RunSummary) {
        let output = &*self.ctx.output;

        output.section("Summary");
        output.key_value("Batches", &summary.batches_total.to_string());
        output.key_value("Exported", &summary.batches_exported.to_string());
        output.key_value("Imported", &summary.batches_imported.to_string());
        output.key_value("Failed", &summary.batches_failed.to_string());
        if let Some(folders) = &summary.folders {
            output.key_value(
                "Folders",
                &format!("{} created, {} existing", folders.created, folders.existing),
            );
            output.key_value(
                "Memberships",
                &format!(
                    "{} created, {} existing, {} skipped",
                    folders.memberships_created, folders.memberships_existing, folders.skipped
                ),
            );
        }

        if summary.retry_files > 0 {
            output.warning(&format!(
                "{} batch(es) saved to {} for `qsmigrate retry`",
                summary.retry_files,
                self.config.retry_dir().display()
            ));
        } else {
            output.success("Migration completed");
        }
    }
}
