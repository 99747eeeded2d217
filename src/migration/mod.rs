//! Cross-region migration of QuickSight assets.

pub mod api;
pub mod arn;
pub mod batch;
pub mod bundle;
pub mod cleanup;
pub mod coordinator;
pub mod error;
pub mod folders;
pub mod inventory;
pub mod job;
pub mod model;
pub mod report;
pub mod retry;
pub mod selector;

pub use api::{ArtifactDownloader, QuickSightApi};
pub use cleanup::{Cleaner, CleanupPlan, CleanupReport};
pub use coordinator::{Coordinator, ResubmitSummary, RunSummary};
pub use error::{MigrationError, MigrationResult};
pub use inventory::{Inventory, InventorySnapshot};
