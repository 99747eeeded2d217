//! Inventory listing export.

use std::path::{Path, PathBuf};

use crate::migration::error::MigrationResult;
use crate::migration::inventory::InventorySnapshot;
use crate::traits::FileSystem;

const CSV_HEADER: &str = "asset_type,name,arn";

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render one `asset_type,name,arn` row per asset, classes in inventory order
pub fn inventory_csv(snapshot: &InventorySnapshot) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');

    for asset in snapshot.iter() {
        csv.push_str(&format!(
            "{},{},{}\n",
            asset.class().as_str(),
            csv_field(asset.name()),
            csv_field(asset.arn())
        ));
    }

    csv
}

/// Write the listing to `<dir>/qs_list_assets-<region>.csv`
pub fn write_inventory_csv(
    fs: &dyn FileSystem,
    dir: &Path,
    region: &str,
    snapshot: &InventorySnapshot,
) -> MigrationResult<PathBuf> {
    let path = dir.join(format!("qs_list_assets-{}.csv", region));
    fs.write(&path, &inventory_csv(snapshot))?;
    Ok(path)
}
