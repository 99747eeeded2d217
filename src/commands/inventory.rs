use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::aws::{self, SdkQuickSightApi};
use crate::context::Context;
use crate::logging;
use crate::migration::model::ResourceClass;
use crate::migration::report::write_inventory_csv;
use crate::migration::{Inventory, InventorySnapshot, MigrationResult, QuickSightApi};

/// Handles the 'inventory' command - lists every asset in a region to CSV
pub struct InventoryCommand;

impl InventoryCommand {
    pub fn execute(
        ctx: &Context,
        region: &str,
        account_id: Option<&str>,
        data_dir: &Path,
        log_dir: &Path,
    ) -> Result<()> {
        let log_path = logging::log_file_path(log_dir, "inventory", &[region], ctx.clock.now());
        let _guard = logging::init(&log_path)?;

        let account_id = aws::account_id_or_caller(account_id, region)?;
        let api = SdkQuickSightApi::connect(&account_id, region)?;

        Self::run(ctx, &api, data_dir)?;
        Ok(())
    }

    /// List all five classes, unfiltered, and write the CSV listing
    pub fn run(ctx: &Context, api: &dyn QuickSightApi, data_dir: &Path) -> Result<PathBuf> {
        ctx.output.section("QuickSight Inventory");
        ctx.output.key_value("Region", api.region());

        let snapshot = Self::snapshot(api)
            .with_context(|| format!("Failed to list assets in {}", api.region()))?;

        for class in ResourceClass::ALL {
            ctx.output
                .key_value(class.display_name(), &snapshot.count(class).to_string());
        }

        let path = write_inventory_csv(&*ctx.fs, data_dir, api.region(), &snapshot)?;
        ctx.output
            .success(&format!("Inventory written to {}", path.display()));
        Ok(path)
    }

    fn snapshot(api: &dyn QuickSightApi) -> MigrationResult<InventorySnapshot> {
        let inventory = Inventory::new(api);
        let mut snapshot = InventorySnapshot::default();
        for class in ResourceClass::ALL {
            let assets = inventory
                .list_unfiltered(class)
                .collect::<MigrationResult<Vec<_>>>()?;
            snapshot.insert(class, assets);
        }
        Ok(snapshot)
    }
}
