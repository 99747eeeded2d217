//! Removal of every migratable asset from one account/region.
//!
//! Dependents go first: dashboards, analyses, datasets, data sources, then
//! folders from the leaves up.

use serde::Serialize;

use crate::migration::api::QuickSightApi;
use crate::migration::error::MigrationResult;
use crate::migration::folders::{load_folders, sort_for_deletion};
use crate::migration::inventory::Inventory;
use crate::migration::model::{AssetSummary, FolderRecord, ResourceClass};
use crate::traits::Output;

/// What a cleanup would delete, in deletion order
#[derive(Debug, Clone, Default)]
pub struct CleanupPlan {
    pub assets: Vec<AssetSummary>,
    pub folders: Vec<FolderRecord>,
}

impl CleanupPlan {
    pub fn len(&self) -> usize {
        self.assets.len() + self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, class: ResourceClass) -> usize {
        match class {
            ResourceClass::Folder => self.folders.len(),
            _ => self.assets.iter().filter(|a| a.class() == class).count(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: usize,
    /// Already gone when the delete call ran
    pub missing: usize,
    pub failed: usize,
}

pub struct Cleaner<'a> {
    api: &'a dyn QuickSightApi,
    output: &'a dyn Output,
}

impl<'a> Cleaner<'a> {
    pub fn new(api: &'a dyn QuickSightApi, output: &'a dyn Output) -> Self {
        Self { api, output }
    }

    /// List everything that would be deleted. Unlike a migration inventory,
    /// failed and parameterless assets are included.
    pub fn plan(&self) -> MigrationResult<CleanupPlan> {
        let inventory = Inventory::new(self.api);
        let mut assets = Vec::new();

        for class in ResourceClass::BUNDLE_ORDER {
            for asset in inventory.list_unfiltered(class) {
                assets.push(asset?);
            }
        }

        Ok(CleanupPlan {
            assets,
            folders: sort_for_deletion(load_folders(self.api)?),
        })
    }

    pub fn execute(&self, plan: &CleanupPlan) -> CleanupReport {
        let mut report = CleanupReport::default();

        let targets = plan
            .assets
            .iter()
            .map(|a| (a.class(), a.id(), a.name()))
            .chain(
                plan.folders
                    .iter()
                    .map(|f| (ResourceClass::Folder, f.folder_id.as_str(), f.name.as_str())),
            );

        for (class, id, name) in targets {
            match self.api.delete_asset(class, id) {
                Ok(()) => {
                    report.deleted += 1;
                    tracing::info!(class = %class, id, "Deleted asset");
                    self.output
                        .dimmed(&format!("Deleted {} {} ({})", class, name, id));
                }
                Err(err) if err.is_not_found() => {
                    report.missing += 1;
                    self.output
                        .warning(&format!("{} {} ({}) was already deleted", class, name, id));
                }
                Err(err) => {
                    report.failed += 1;
                    self.output
                        .error(&format!("Failed to delete {} {} ({}): {}", class, name, id, err));
                }
            }
        }

        report
    }
}
