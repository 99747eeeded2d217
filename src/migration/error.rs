use std::fmt;
use std::time::Duration;

use crate::migration::model::{JobError, JobKind, JobStatus};

/// Error types for migration operations
#[derive(Debug)]
pub enum MigrationError {
    /// A list, describe, create, delete or job-control call failed
    RemoteCallFailed { operation: String, message: String },

    /// Create call collided with an existing resource
    ResourceAlreadyExists { resource: String },

    /// Describe or delete call found nothing
    ResourceNotFound { resource: String },

    /// Export job reached FAILED, or succeeded without a download URL
    ExportFailed {
        job_id: String,
        status: JobStatus,
        errors: Vec<JobError>,
    },

    /// Import job reached a failing terminal state
    ImportFailed {
        job_id: String,
        status: JobStatus,
        errors: Vec<JobError>,
    },

    /// Job did not reach a terminal state before the deadline
    JobTimedOut {
        job_id: String,
        kind: JobKind,
        waited: Duration,
    },

    /// Export failed and its ARNs could not be written to the retry queue
    RetryNotSaved {
        job_id: String,
        resource_arns: Vec<String>,
        export: Box<MigrationError>,
        cause: Box<MigrationError>,
    },

    /// String did not follow the ARN grammar
    InvalidArn(String),

    /// ARN resource-type segment with no membership type
    UnknownMemberType(String),

    /// Invalid input or parameter
    InvalidInput(String),

    /// File system operation failed
    FileSystem(String),

    /// General I/O error
    Io(std::io::Error),
}

impl MigrationError {
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        MigrationError::RemoteCallFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, MigrationError::ResourceAlreadyExists { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MigrationError::ResourceNotFound { .. })
    }

    /// Errors the coordinator absorbs at the batch boundary
    pub fn is_batch_recoverable(&self) -> bool {
        matches!(
            self,
            MigrationError::ExportFailed { .. }
                | MigrationError::JobTimedOut {
                    kind: JobKind::Export,
                    ..
                }
                | MigrationError::RemoteCallFailed { .. }
        )
    }
}

fn write_job_errors(f: &mut fmt::Formatter<'_>, errors: &[JobError]) -> fmt::Result {
    if errors.is_empty() {
        return Ok(());
    }

    let details = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    write!(f, ": {}", details)
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::RemoteCallFailed { operation, message } => {
                write!(f, "Remote call '{}' failed: {}", operation, message)
            }
            MigrationError::ResourceAlreadyExists { resource } => {
                write!(f, "Resource already exists: {}", resource)
            }
            MigrationError::ResourceNotFound { resource } => {
                write!(f, "Resource not found: {}", resource)
            }
            MigrationError::ExportFailed {
                job_id,
                status,
                errors,
            } => {
                write!(f, "Asset export job '{}' ended with {}", job_id, status)?;
                write_job_errors(f, errors)
            }
            MigrationError::ImportFailed {
                job_id,
                status,
                errors,
            } => {
                write!(f, "Asset import job '{}' ended with {}", job_id, status)?;
                write_job_errors(f, errors)
            }
            MigrationError::JobTimedOut {
                job_id,
                kind,
                waited,
            } => {
                write!(
                    f,
                    "Asset {} job '{}' did not finish within {}s",
                    kind,
                    job_id,
                    waited.as_secs()
                )
            }
            MigrationError::RetryNotSaved {
                job_id,
                resource_arns,
                export,
                cause,
            } => {
                write!(
                    f,
                    "{}; the {} ARN(s) of job '{}' could not be saved for retry: {}",
                    export,
                    resource_arns.len(),
                    job_id,
                    cause
                )
            }
            MigrationError::InvalidArn(arn) => {
                write!(f, "Invalid ARN: '{}'", arn)
            }
            MigrationError::UnknownMemberType(segment) => {
                write!(f, "Unknown folder member type: '{}'", segment)
            }
            MigrationError::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
            MigrationError::FileSystem(msg) => {
                write!(f, "File system error: {}", msg)
            }
            MigrationError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for MigrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MigrationError::Io(err) => Some(err),
            MigrationError::RetryNotSaved { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        MigrationError::Io(err)
    }
}

impl From<anyhow::Error> for MigrationError {
    fn from(err: anyhow::Error) -> Self {
        MigrationError::FileSystem(format!("{:#}", err))
    }
}

/// Result type for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_failed_display_includes_status_and_errors() {
        let err = MigrationError::ExportFailed {
            job_id: "qsmigrate-export-1".to_string(),
            status: JobStatus::Failed,
            errors: vec![JobError {
                arn: None,
                error_type: Some("LimitExceeded".to_string()),
                message: "too many resources".to_string(),
            }],
        };

        assert_eq!(
            err.to_string(),
            "Asset export job 'qsmigrate-export-1' ended with FAILED: [LimitExceeded] too many resources"
        );
    }

    #[test]
    fn test_import_failed_display_without_errors() {
        let err = MigrationError::ImportFailed {
            job_id: "qsmigrate-import-1".to_string(),
            status: JobStatus::FailedRollbackCompleted,
            errors: vec![],
        };

        assert_eq!(
            err.to_string(),
            "Asset import job 'qsmigrate-import-1' ended with FAILED_ROLLBACK_COMPLETED"
        );
    }

    #[test]
    fn test_batch_recoverable_classification() {
        assert!(MigrationError::remote("StartAssetBundleExportJob", "throttled").is_batch_recoverable());
        assert!(
            MigrationError::JobTimedOut {
                job_id: "x".to_string(),
                kind: JobKind::Export,
                waited: Duration::from_secs(5),
            }
            .is_batch_recoverable()
        );
        assert!(
            !MigrationError::JobTimedOut {
                job_id: "x".to_string(),
                kind: JobKind::Import,
                waited: Duration::from_secs(5),
            }
            .is_batch_recoverable()
        );
        assert!(
            !MigrationError::ImportFailed {
                job_id: "x".to_string(),
                status: JobStatus::Failed,
                errors: vec![],
            }
            .is_batch_recoverable()
        );
    }

    #[test]
    fn test_unsaved_retry_is_not_recoverable() {
        let err = MigrationError::RetryNotSaved {
            job_id: "qsmigrate-export-1".to_string(),
            resource_arns: vec!["arn:a".to_string(), "arn:b".to_string()],
            export: Box::new(MigrationError::remote("StartAssetBundleExportJob", "throttled")),
            cause: Box::new(MigrationError::FileSystem("read-only".to_string())),
        };

        assert!(!err.is_batch_recoverable());
        assert!(err.to_string().contains("the 2 ARN(s) of job 'qsmigrate-export-1' could not be saved"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let err: MigrationError = std::io::Error::other("disk full").into();
        assert!(err.to_string().contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
