//! Asset bundle job lifecycle: submit, poll until terminal, branch.

use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::migration::api::{ArtifactDownloader, ExportJobRequest, ImportJobRequest, QuickSightApi};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::model::{JobDescription, JobError, JobKind, JobStatus, MigrationJob};
use crate::migration::retry::{RetryQueue, RetryRecord};
use crate::traits::{Clock, Output};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSettings {
    pub poll_interval: Duration,
    /// Give up on a job that is not terminal after this long
    pub timeout: Duration,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_JOB_TIMEOUT,
        }
    }
}

fn new_job_id(kind: JobKind) -> String {
    format!("qsmigrate-{}-{}", kind, Uuid::new_v4())
}

/// Drives export or import jobs against one account/region, one at a time
pub struct JobDriver<'a> {
    api: &'a dyn QuickSightApi,
    clock: &'a dyn Clock,
    output: &'a dyn Output,
    settings: JobSettings,
}

impl<'a> JobDriver<'a> {
    pub fn new(
        api: &'a dyn QuickSightApi,
        clock: &'a dyn Clock,
        output: &'a dyn Output,
        settings: JobSettings,
    ) -> Self {
        Self {
            api,
            clock,
            output,
            settings,
        }
    }

    /// Export `arns` as one bundle and download it.
    ///
    /// With a retry queue, any failure (submission, FAILED, timeout,
    /// download) leaves a retry record behind before the error is returned.
    /// If that record cannot be written the result is `RetryNotSaved`,
    /// which carries the batch ARNs and is never recoverable.
    pub fn export(
        &self,
        batch_index: usize,
        arns: &[String],
        downloader: &dyn ArtifactDownloader,
        retry: Option<&RetryQueue<'_>>,
    ) -> MigrationResult<MigrationJob> {
        let job_id = new_job_id(JobKind::Export);

        match self.run_export(&job_id, batch_index, arns, downloader) {
            Ok(job) => Ok(job),
            Err(err) => {
                let Some(retry) = retry else {
                    return Err(err);
                };
                let record = RetryRecord::new(self.clock.now(), &job_id, arns.to_vec());
                match retry.persist(&record) {
                    Ok(path) => {
                        self.output.dimmed(&format!(
                            "Saved {} ARNs for retry: {}",
                            arns.len(),
                            path.display()
                        ));
                        Err(err)
                    }
                    Err(persist_err) => {
                        tracing::error!(
                            job_id = %job_id,
                            arns = ?arns,
                            error = %persist_err,
                            "Could not save retry record"
                        );
                        self.output.error(&format!(
                            "Could not save retry record for job {}: {}",
                            job_id, persist_err
                        ));
                        Err(MigrationError::RetryNotSaved {
                            job_id,
                            resource_arns: arns.to_vec(),
                            export: Box::new(err),
                            cause: Box::new(persist_err),
                        })
                    }
                }
            }
        }
    }

    fn run_export(
        &self,
        job_id: &str,
        batch_index: usize,
        arns: &[String],
        downloader: &dyn ArtifactDownloader,
    ) -> MigrationResult<MigrationJob> {
        let request = ExportJobRequest::new(job_id, arns.to_vec());
        self.api.start_export_job(&request)?;
        tracing::info!(job_id, batch = batch_index, arns = arns.len(), "Submitted export job");
        self.output.dimmed(&format!(
            "Export job {} submitted ({} resources)",
            job_id,
            arns.len()
        ));

        let description = self.poll(JobKind::Export, job_id, |id| {
            self.api.describe_export_job(id)
        })?;

        if description.status != JobStatus::Successful {
            return Err(MigrationError::ExportFailed {
                job_id: job_id.to_string(),
                status: description.status,
                errors: description.errors,
            });
        }

        let url = valid_download_url(&description)?;
        let artifact = downloader.download(url.as_str())?;
        tracing::info!(job_id, bytes = artifact.len(), "Downloaded asset bundle");

        Ok(MigrationJob {
            job_id: job_id.to_string(),
            kind: JobKind::Export,
            status: description.status,
            resource_arns: arns.to_vec(),
            artifact: Some(artifact),
        })
    }

    /// Import a bundle, rolling back on failure
    pub fn import(&self, bundle: &[u8]) -> MigrationResult<MigrationJob> {
        let job_id = new_job_id(JobKind::Import);
        let request = ImportJobRequest::new(&job_id, bundle.to_vec());
        self.api.start_import_job(&request)?;
        tracing::info!(job_id = %job_id, bytes = bundle.len(), "Submitted import job");
        self.output.dimmed(&format!("Import job {} submitted", job_id));

        let description = self.poll(JobKind::Import, &job_id, |id| {
            self.api.describe_import_job(id)
        })?;

        if description.status != JobStatus::Successful {
            return Err(MigrationError::ImportFailed {
                job_id,
                status: description.status,
                errors: description.errors,
            });
        }

        Ok(MigrationJob {
            job_id,
            kind: JobKind::Import,
            status: description.status,
            resource_arns: description.resource_arns,
            artifact: None,
        })
    }

    /// Describe until the status is terminal for `kind`, sleeping
    /// `poll_interval` between reads
    fn poll(
        &self,
        kind: JobKind,
        job_id: &str,
        describe: impl Fn(&str) -> MigrationResult<JobDescription>,
    ) -> MigrationResult<JobDescription> {
        let started = self.clock.now();

        loop {
            let description = describe(job_id)?;
            tracing::debug!(job_id, kind = %kind, status = %description.status, "Polled job");

            if description.status.is_terminal(kind) {
                tracing::info!(job_id, kind = %kind, status = %description.status, "Job finished");
                return Ok(description);
            }

            let waited = (self.clock.now() - started).to_std().unwrap_or_default();
            if waited >= self.settings.timeout {
                tracing::warn!(job_id, kind = %kind, waited_secs = waited.as_secs(), "Job timed out");
                return Err(MigrationError::JobTimedOut {
                    job_id: job_id.to_string(),
                    kind,
                    waited,
                });
            }

            self.clock.sleep(self.settings.poll_interval);
        }
    }
}

fn valid_download_url(description: &JobDescription) -> MigrationResult<Url> {
    let failed = |message: String| MigrationError::ExportFailed {
        job_id: description.job_id.clone(),
        status: description.status.clone(),
        errors: vec![JobError {
            arn: None,
            error_type: None,
            message,
        }],
    };

    let raw = description
        .download_url
        .as_deref()
        .ok_or_else(|| failed("export succeeded without a download URL".to_string()))?;

    Url::parse(raw).map_err(|e| failed(format!("invalid download URL: {}", e)))
}
