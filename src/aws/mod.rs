//! AWS-backed implementations of the migration seams.

mod download;
mod quicksight;

pub use download::HttpDownloader;
pub use quicksight::SdkQuickSightApi;

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use tokio::runtime::Runtime;

/// Runtime the SDK clients block on; the orchestrator itself is synchronous
pub(crate) fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

pub(crate) async fn load_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// Account id of the calling credentials, via STS `GetCallerIdentity`
pub fn resolve_account_id(region: &str) -> Result<String> {
    let runtime = runtime()?;
    runtime.block_on(async {
        let config = load_config(region).await;
        let client = aws_sdk_sts::Client::new(&config);
        let identity = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("{}", aws_sdk_sts::error::DisplayErrorContext(&e)))
            .context("Failed to resolve AWS account id")?;

        identity
            .account()
            .map(str::to_string)
            .context("GetCallerIdentity returned no account id")
    })
}

/// Use `configured` when given, otherwise ask STS
pub fn account_id_or_caller(configured: Option<&str>, region: &str) -> Result<String> {
    match configured {
        Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
        _ => {
            let id = resolve_account_id(region)?;
            tracing::info!(account_id = %id, "Resolved account id from caller identity");
            Ok(id)
        }
    }
}
