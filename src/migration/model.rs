//! Typed records for QuickSight assets, folders and jobs.
//!
//! Each resource class keeps only the fields migration decisions need; the
//! remote adapter projects API responses into these structs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::migration::arn::Arn;
use crate::migration::error::MigrationResult;

/// Resource classes the inventory can list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    DataSource,
    DataSet,
    Analysis,
    Dashboard,
    Folder,
}

impl ResourceClass {
    /// All classes in inventory order
    pub const ALL: [ResourceClass; 5] = [
        ResourceClass::DataSource,
        ResourceClass::DataSet,
        ResourceClass::Analysis,
        ResourceClass::Dashboard,
        ResourceClass::Folder,
    ];

    /// Classes that travel inside asset bundles, in dependency order:
    /// dependents first so each chunk's export pulls in its closure
    pub const BUNDLE_ORDER: [ResourceClass; 4] = [
        ResourceClass::Dashboard,
        ResourceClass::Analysis,
        ResourceClass::DataSet,
        ResourceClass::DataSource,
    ];

    /// Plural identifier used in reports and CSV exports
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::DataSource => "data_sources",
            ResourceClass::DataSet => "data_sets",
            ResourceClass::Analysis => "analyses",
            ResourceClass::Dashboard => "dashboards",
            ResourceClass::Folder => "folders",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceClass::DataSource => "Data Sources",
            ResourceClass::DataSet => "Data Sets",
            ResourceClass::Analysis => "Analyses",
            ResourceClass::Dashboard => "Dashboards",
            ResourceClass::Folder => "Folders",
        }
    }

    /// Whether records with a transitional or failed status are dropped
    pub fn filters_status(&self) -> bool {
        matches!(self, ResourceClass::DataSource | ResourceClass::Analysis)
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status reported for data sources and analyses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetStatus {
    CreationInProgress,
    CreationSuccessful,
    CreationFailed,
    UpdateInProgress,
    UpdateSuccessful,
    UpdateFailed,
    Deleted,
    Other(String),
}

impl AssetStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "CREATION_IN_PROGRESS" => AssetStatus::CreationInProgress,
            "CREATION_SUCCESSFUL" => AssetStatus::CreationSuccessful,
            "CREATION_FAILED" => AssetStatus::CreationFailed,
            "UPDATE_IN_PROGRESS" => AssetStatus::UpdateInProgress,
            "UPDATE_SUCCESSFUL" => AssetStatus::UpdateSuccessful,
            "UPDATE_FAILED" => AssetStatus::UpdateFailed,
            "DELETED" => AssetStatus::Deleted,
            other => AssetStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AssetStatus::CreationInProgress => "CREATION_IN_PROGRESS",
            AssetStatus::CreationSuccessful => "CREATION_SUCCESSFUL",
            AssetStatus::CreationFailed => "CREATION_FAILED",
            AssetStatus::UpdateInProgress => "UPDATE_IN_PROGRESS",
            AssetStatus::UpdateSuccessful => "UPDATE_SUCCESSFUL",
            AssetStatus::UpdateFailed => "UPDATE_FAILED",
            AssetStatus::Deleted => "DELETED",
            AssetStatus::Other(value) => value,
        }
    }

    /// Fully created or updated
    pub fn is_successful(&self) -> bool {
        matches!(
            self,
            AssetStatus::CreationSuccessful | AssetStatus::UpdateSuccessful
        )
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceSummary {
    pub id: String,
    pub arn: String,
    pub name: String,
    /// Connector type such as ATHENA or S3
    pub source_type: Option<String>,
    pub status: Option<AssetStatus>,
    /// Whether the source carries connection parameters. Uploaded-file
    /// sources have none and cannot be bundled.
    pub has_parameters: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSetSummary {
    pub id: String,
    pub arn: String,
    pub name: String,
    /// SPICE or DIRECT_QUERY
    pub import_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub status: Option<AssetStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub id: String,
    pub arn: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub folder_type: Option<FolderType>,
}

/// One listed asset, as returned by a paginated inventory read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSummary {
    DataSource(DataSourceSummary),
    DataSet(DataSetSummary),
    Analysis(AnalysisSummary),
    Dashboard(DashboardSummary),
    Folder(FolderSummary),
}

impl AssetSummary {
    pub fn class(&self) -> ResourceClass {
        match self {
            AssetSummary::DataSource(_) => ResourceClass::DataSource,
            AssetSummary::DataSet(_) => ResourceClass::DataSet,
            AssetSummary::Analysis(_) => ResourceClass::Analysis,
            AssetSummary::Dashboard(_) => ResourceClass::Dashboard,
            AssetSummary::Folder(_) => ResourceClass::Folder,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            AssetSummary::DataSource(s) => &s.id,
            AssetSummary::DataSet(s) => &s.id,
            AssetSummary::Analysis(s) => &s.id,
            AssetSummary::Dashboard(s) => &s.id,
            AssetSummary::Folder(s) => &s.id,
        }
    }

    pub fn arn(&self) -> &str {
        match self {
            AssetSummary::DataSource(s) => &s.arn,
            AssetSummary::DataSet(s) => &s.arn,
            AssetSummary::Analysis(s) => &s.arn,
            AssetSummary::Dashboard(s) => &s.arn,
            AssetSummary::Folder(s) => &s.arn,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AssetSummary::DataSource(s) => &s.name,
            AssetSummary::DataSet(s) => &s.name,
            AssetSummary::Analysis(s) => &s.name,
            AssetSummary::Dashboard(s) => &s.name,
            AssetSummary::Folder(s) => &s.name,
        }
    }

    /// Remote status, for the classes that report one
    pub fn status(&self) -> Option<&AssetStatus> {
        match self {
            AssetSummary::DataSource(s) => s.status.as_ref(),
            AssetSummary::Analysis(s) => s.status.as_ref(),
            _ => None,
        }
    }
}

impl From<DataSourceSummary> for AssetSummary {
    fn from(value: DataSourceSummary) -> Self {
        AssetSummary::DataSource(value)
    }
}

impl From<DataSetSummary> for AssetSummary {
    fn from(value: DataSetSummary) -> Self {
        AssetSummary::DataSet(value)
    }
}

impl From<AnalysisSummary> for AssetSummary {
    fn from(value: AnalysisSummary) -> Self {
        AssetSummary::Analysis(value)
    }
}

impl From<DashboardSummary> for AssetSummary {
    fn from(value: DashboardSummary) -> Self {
        AssetSummary::Dashboard(value)
    }
}

impl From<FolderSummary> for AssetSummary {
    fn from(value: FolderSummary) -> Self {
        AssetSummary::Folder(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FolderType {
    Restricted,
    Shared,
}

impl FolderType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "RESTRICTED" => Some(FolderType::Restricted),
            "SHARED" => Some(FolderType::Shared),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FolderType::Restricted => "RESTRICTED",
            FolderType::Shared => "SHARED",
        }
    }
}

/// A principal and the actions granted to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub principal: String,
    pub actions: Vec<String>,
}

/// Full detail for one folder, including its resolved permissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRecord {
    pub folder_id: String,
    pub arn: String,
    pub name: String,
    pub folder_type: FolderType,
    /// Ancestor folder ARNs, root first; empty for a root folder
    pub folder_path: Vec<String>,
    pub permissions: Vec<Permission>,
}

impl FolderRecord {
    pub fn depth(&self) -> usize {
        self.folder_path.len()
    }

    /// ARN of the immediate parent, if any
    pub fn parent_arn(&self) -> Option<&str> {
        self.folder_path.last().map(String::as_str)
    }

    /// Folder id of the immediate parent, derived from its ARN
    pub fn parent_id(&self) -> MigrationResult<Option<String>> {
        match self.parent_arn() {
            Some(arn) => Ok(Some(Arn::parse(arn)?.resource_id)),
            None => Ok(None),
        }
    }
}

/// Asset types a folder can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberType {
    Dashboard,
    Analysis,
    Dataset,
    Datasource,
    Topic,
}

impl MemberType {
    /// Map an ARN resource-type segment (`dashboard`, `datasource`, ...)
    pub fn from_resource_type(segment: &str) -> Option<Self> {
        match segment.to_ascii_lowercase().as_str() {
            "dashboard" => Some(MemberType::Dashboard),
            "analysis" => Some(MemberType::Analysis),
            "dataset" => Some(MemberType::Dataset),
            "datasource" => Some(MemberType::Datasource),
            "topic" => Some(MemberType::Topic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberType::Dashboard => "DASHBOARD",
            MemberType::Analysis => "ANALYSIS",
            MemberType::Dataset => "DATASET",
            MemberType::Datasource => "DATASOURCE",
            MemberType::Topic => "TOPIC",
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direct member of a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderMember {
    pub member_id: String,
    pub member_arn: String,
}

impl FolderMember {
    pub fn member_type(&self) -> MigrationResult<MemberType> {
        Arn::parse(&self.member_arn)?.member_type()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    Export,
    Import,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Export => f.write_str("export"),
            JobKind::Import => f.write_str("import"),
        }
    }
}

/// Asset bundle job status
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Accepted by the service, not yet observed by a poll
    Submitted,
    QueuedForImmediateExecution,
    InProgress,
    Successful,
    Failed,
    FailedRollbackInProgress,
    FailedRollbackCompleted,
    FailedRollbackError,
    Other(String),
}

impl JobStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "SUBMITTED" => JobStatus::Submitted,
            "QUEUED_FOR_IMMEDIATE_EXECUTION" => JobStatus::QueuedForImmediateExecution,
            "IN_PROGRESS" => JobStatus::InProgress,
            "SUCCESSFUL" => JobStatus::Successful,
            "FAILED" => JobStatus::Failed,
            "FAILED_ROLLBACK_IN_PROGRESS" => JobStatus::FailedRollbackInProgress,
            "FAILED_ROLLBACK_COMPLETED" => JobStatus::FailedRollbackCompleted,
            "FAILED_ROLLBACK_ERROR" => JobStatus::FailedRollbackError,
            other => JobStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Submitted => "SUBMITTED",
            JobStatus::QueuedForImmediateExecution => "QUEUED_FOR_IMMEDIATE_EXECUTION",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Successful => "SUCCESSFUL",
            JobStatus::Failed => "FAILED",
            JobStatus::FailedRollbackInProgress => "FAILED_ROLLBACK_IN_PROGRESS",
            JobStatus::FailedRollbackCompleted => "FAILED_ROLLBACK_COMPLETED",
            JobStatus::FailedRollbackError => "FAILED_ROLLBACK_ERROR",
            JobStatus::Other(value) => value,
        }
    }

    /// Whether polling stops at this status for the given job kind.
    ///
    /// Exports end in SUCCESSFUL or FAILED. Imports additionally end in the
    /// two rollback outcomes; FAILED_ROLLBACK_IN_PROGRESS is still moving.
    pub fn is_terminal(&self, kind: JobKind) -> bool {
        match kind {
            JobKind::Export => matches!(self, JobStatus::Successful | JobStatus::Failed),
            JobKind::Import => matches!(
                self,
                JobStatus::Successful
                    | JobStatus::Failed
                    | JobStatus::FailedRollbackCompleted
                    | JobStatus::FailedRollbackError
            ),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error detail reported by the service for a failed job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobError {
    pub arn: Option<String>,
    pub error_type: Option<String>,
    pub message: String,
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error_type) = &self.error_type {
            write!(f, "[{}] ", error_type)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(arn) = &self.arn {
            write!(f, " ({})", arn)?;
        }
        Ok(())
    }
}

/// Snapshot of a job as returned by a describe call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription {
    pub job_id: String,
    pub status: JobStatus,
    pub resource_arns: Vec<String>,
    /// One-time artifact URL, present on successful exports
    pub download_url: Option<String>,
    pub errors: Vec<JobError>,
}

/// A finished export or import job
#[derive(Debug, Clone)]
pub struct MigrationJob {
    pub job_id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub resource_arns: Vec<String>,
    /// Bundle bytes; present only after a successful export
    pub artifact: Option<Vec<u8>>,
}
