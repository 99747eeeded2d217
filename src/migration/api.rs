//! The remote QuickSight surface the orchestrator talks to.
//!
//! `QuickSightApi` is synchronous; the SDK-backed implementation blocks on
//! its own runtime. Every call is fallible and maps service failures into
//! `MigrationError`, with already-exists and not-found kept distinguishable.

use crate::migration::error::MigrationResult;
use crate::migration::model::{
    AssetSummary, FolderMember, FolderRecord, FolderType, JobDescription, MemberType, Permission,
    ResourceClass,
};

/// One page of a paginated list call
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token; `None` on the last page
    pub next_token: Option<String>,
}

/// Folder member inclusion mode for exports: the whole subtree
pub const INCLUDE_FOLDER_MEMBERS: &str = "RECURSE";

/// Bundle format for exports
pub const EXPORT_FORMAT: &str = "QUICKSIGHT_JSON";

/// Import failure action: undo everything the job created
pub const FAILURE_ACTION: &str = "ROLLBACK";

/// Parameters of an asset bundle export submission
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJobRequest {
    pub job_id: String,
    pub resource_arns: Vec<String>,
    pub include_all_dependencies: bool,
    pub include_permissions: bool,
    pub include_folder_memberships: bool,
    pub include_folder_members: &'static str,
    pub include_tags: bool,
    pub format: &'static str,
}

impl ExportJobRequest {
    /// Export of `resource_arns` with their full dependency closure,
    /// permissions, folder memberships and tags
    pub fn new(job_id: impl Into<String>, resource_arns: Vec<String>) -> Self {
        Self {
            job_id: job_id.into(),
            resource_arns,
            include_all_dependencies: true,
            include_permissions: true,
            include_folder_memberships: true,
            include_folder_members: INCLUDE_FOLDER_MEMBERS,
            include_tags: true,
            format: EXPORT_FORMAT,
        }
    }
}

/// Parameters of an asset bundle import submission
#[derive(Debug, Clone, PartialEq)]
pub struct ImportJobRequest {
    pub job_id: String,
    pub body: Vec<u8>,
    pub failure_action: &'static str,
}

impl ImportJobRequest {
    pub fn new(job_id: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            job_id: job_id.into(),
            body,
            failure_action: FAILURE_ACTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateFolderRequest {
    pub folder_id: String,
    pub name: String,
    pub folder_type: FolderType,
    pub parent_folder_arn: Option<String>,
    pub permissions: Vec<Permission>,
}

/// Service operation name used when listing `class`
pub fn list_operation(class: ResourceClass) -> &'static str {
    match class {
        ResourceClass::DataSource => "ListDataSources",
        ResourceClass::DataSet => "ListDataSets",
        ResourceClass::Analysis => "ListAnalyses",
        ResourceClass::Dashboard => "ListDashboards",
        ResourceClass::Folder => "ListFolders",
    }
}

/// Service operation name used when deleting an asset of `class`
pub fn delete_operation(class: ResourceClass) -> &'static str {
    match class {
        ResourceClass::DataSource => "DeleteDataSource",
        ResourceClass::DataSet => "DeleteDataSet",
        ResourceClass::Analysis => "DeleteAnalysis",
        ResourceClass::Dashboard => "DeleteDashboard",
        ResourceClass::Folder => "DeleteFolder",
    }
}

/// Remote QuickSight operations, scoped to one account and region
pub trait QuickSightApi: Send + Sync {
    /// Region this client talks to
    fn region(&self) -> &str;

    /// Fetch one page of `class`, starting at `next_token`
    fn list_page(
        &self,
        class: ResourceClass,
        next_token: Option<&str>,
    ) -> MigrationResult<Page<AssetSummary>>;

    /// Describe a folder. `Ok(None)` when it does not exist. Permissions
    /// are left empty; see `describe_folder_resolved_permissions`.
    fn describe_folder(&self, folder_id: &str) -> MigrationResult<Option<FolderRecord>>;

    /// Effective folder ACL after inheritance
    fn describe_folder_resolved_permissions(
        &self,
        folder_id: &str,
    ) -> MigrationResult<Vec<Permission>>;

    /// Fetch one page of a folder's direct members
    fn list_folder_members(
        &self,
        folder_id: &str,
        next_token: Option<&str>,
    ) -> MigrationResult<Page<FolderMember>>;

    /// Create a folder, returning its ARN
    fn create_folder(&self, request: &CreateFolderRequest) -> MigrationResult<String>;

    fn create_folder_membership(
        &self,
        folder_id: &str,
        member_id: &str,
        member_type: MemberType,
    ) -> MigrationResult<()>;

    fn start_export_job(&self, request: &ExportJobRequest) -> MigrationResult<()>;

    fn describe_export_job(&self, job_id: &str) -> MigrationResult<JobDescription>;

    fn start_import_job(&self, request: &ImportJobRequest) -> MigrationResult<()>;

    fn describe_import_job(&self, job_id: &str) -> MigrationResult<JobDescription>;

    /// Delete one asset. Analyses are removed without a recovery window.
    fn delete_asset(&self, class: ResourceClass, id: &str) -> MigrationResult<()>;
}

/// Fetches the one-time export artifact URL
pub trait ArtifactDownloader: Send + Sync {
    fn download(&self, url: &str) -> MigrationResult<Vec<u8>>;
}

#[cfg(test)]
pub use mock::{MockDownloader, MockQuickSightApi};
