use anyhow::Result;
use aws_sdk_quicksight::Client;
use aws_sdk_quicksight::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_quicksight::primitives::Blob;
use aws_sdk_quicksight::types as sdk;
use std::fmt::Debug;
use tokio::runtime::Runtime;

use crate::migration::api::{
    CreateFolderRequest, ExportJobRequest, ImportJobRequest, Page, QuickSightApi,
    delete_operation, list_operation,
};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::model::{
    AnalysisSummary, AssetStatus, AssetSummary, DashboardSummary, DataSetSummary,
    DataSourceSummary, FolderMember, FolderRecord, FolderSummary, FolderType, JobDescription,
    JobError, JobStatus, MemberType, Permission, ResourceClass,
};

/// `QuickSightApi` over the AWS SDK for one account and region
pub struct SdkQuickSightApi {
    runtime: Runtime,
    client: Client,
    account_id: String,
    region: String,
}

impl SdkQuickSightApi {
    pub fn connect(account_id: &str, region: &str) -> Result<Self> {
        let runtime = super::runtime()?;
        let config = runtime.block_on(super::load_config(region));

        tracing::debug!(region, account_id, "Connected QuickSight client");
        Ok(Self {
            runtime,
            client: Client::new(&config),
            account_id: account_id.to_string(),
            region: region.to_string(),
        })
    }

    fn list_data_sources(&self, token: Option<&str>) -> MigrationResult<Page<AssetSummary>> {
        let resp = self
            .runtime
            .block_on(
                self.client
                    .list_data_sources()
                    .aws_account_id(&self.account_id)
                    .set_next_token(token.map(str::to_string))
                    .send(),
            )
            .map_err(|e| service_error("ListDataSources", &self.region, e))?;

        Ok(Page {
            items: resp.data_sources().iter().map(data_source_summary).collect(),
            next_token: resp.next_token().map(str::to_string),
        })
    }

    fn list_data_sets(&self, token: Option<&str>) -> MigrationResult<Page<AssetSummary>> {
        let resp = self
            .runtime
            .block_on(
                self.client
                    .list_data_sets()
                    .aws_account_id(&self.account_id)
                    .set_next_token(token.map(str::to_string))
                    .send(),
            )
            .map_err(|e| service_error("ListDataSets", &self.region, e))?;

        let items: Vec<AssetSummary> = resp
            .data_set_summaries()
            .iter()
            .map(|d| {
                DataSetSummary {
                    id: d.data_set_id().unwrap_or_default().to_string(),
                    arn: d.arn().unwrap_or_default().to_string(),
                    name: d.name().unwrap_or_default().to_string(),
                    import_mode: d.import_mode().map(|m| m.as_str().to_string()),
                }
                .into()
            })
            .collect();

        Ok(Page {
            items,
            next_token: resp.next_token().map(str::to_string),
        })
    }

    fn list_analyses(&self, token: Option<&str>) -> MigrationResult<Page<AssetSummary>> {
        let resp = self
            .runtime
            .block_on(
                self.client
                    .list_analyses()
                    .aws_account_id(&self.account_id)
                    .set_next_token(token.map(str::to_string))
                    .send(),
            )
            .map_err(|e| service_error("ListAnalyses", &self.region, e))?;

        let items: Vec<AssetSummary> = resp
            .analysis_summary_list()
            .iter()
            .map(|a| {
                AnalysisSummary {
                    id: a.analysis_id().unwrap_or_default().to_string(),
                    arn: a.arn().unwrap_or_default().to_string(),
                    name: a.name().unwrap_or_default().to_string(),
                    status: a.status().map(|s| AssetStatus::parse(s.as_str())),
                }
                .into()
            })
            .collect();

        Ok(Page {
            items,
            next_token: resp.next_token().map(str::to_string),
        })
    }

    fn list_dashboards(&self, token: Option<&str>) -> MigrationResult<Page<AssetSummary>> {
        let resp = self
            .runtime
            .block_on(
                self.client
                    .list_dashboards()
                    .aws_account_id(&self.account_id)
                    .set_next_token(token.map(str::to_string))
                    .send(),
            )
            .map_err(|e| service_error("ListDashboards", &self.region, e))?;

        let items: Vec<AssetSummary> = resp
            .dashboard_summary_list()
            .iter()
            .map(|d| {
                DashboardSummary {
                    id: d.dashboard_id().unwrap_or_default().to_string(),
                    arn: d.arn().unwrap_or_default().to_string(),
                    name: d.name().unwrap_or_default().to_string(),
                }
                .into()
            })
            .collect();

        Ok(Page {
            items,
            next_token: resp.next_token().map(str::to_string),
        })
    }

    fn list_folders(&self, token: Option<&str>) -> MigrationResult<Page<AssetSummary>> {
        let resp = self
            .runtime
            .block_on(
                self.client
                    .list_folders()
                    .aws_account_id(&self.account_id)
                    .set_next_token(token.map(str::to_string))
                    .send(),
            )
            .map_err(|e| service_error("ListFolders", &self.region, e))?;

        let items: Vec<AssetSummary> = resp
            .folder_summary_list()
            .iter()
            .map(|f| {
                FolderSummary {
                    id: f.folder_id().unwrap_or_default().to_string(),
                    arn: f.arn().unwrap_or_default().to_string(),
                    name: f.name().unwrap_or_default().to_string(),
                    folder_type: f.folder_type().and_then(|t| FolderType::parse(t.as_str())),
                }
                .into()
            })
            .collect();

        Ok(Page {
            items,
            next_token: resp.next_token().map(str::to_string),
        })
    }
}

/// Map an SDK failure. Existence conflicts and missing resources keep
/// their own variants; everything else is a failed remote call.
fn service_error<E, R>(operation: &str, resource: &str, err: SdkError<E, R>) -> MigrationError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug,
{
    match err.code() {
        Some("ResourceExistsException") => MigrationError::ResourceAlreadyExists {
            resource: resource.to_string(),
        },
        Some("ResourceNotFoundException") => MigrationError::ResourceNotFound {
            resource: resource.to_string(),
        },
        _ => MigrationError::remote(operation, DisplayErrorContext(&err).to_string()),
    }
}

fn data_source_summary(source: &sdk::DataSource) -> AssetSummary {
    DataSourceSummary {
        id: source.data_source_id().unwrap_or_default().to_string(),
        arn: source.arn().unwrap_or_default().to_string(),
        name: source.name().unwrap_or_default().to_string(),
        source_type: source.r#type().map(|t| t.as_str().to_string()),
        status: source.status().map(|s| AssetStatus::parse(s.as_str())),
        has_parameters: source.data_source_parameters().is_some(),
    }
    .into()
}

fn permission(p: &sdk::ResourcePermission) -> Permission {
    Permission {
        principal: p.principal().to_string(),
        actions: p.actions().to_vec(),
    }
}

fn sdk_permission(p: &Permission) -> MigrationResult<sdk::ResourcePermission> {
    sdk::ResourcePermission::builder()
        .principal(&p.principal)
        .set_actions(Some(p.actions.clone()))
        .build()
        .map_err(|e| MigrationError::InvalidInput(format!("invalid permission: {}", e)))
}

fn folder_record(folder: &sdk::Folder) -> FolderRecord {
    FolderRecord {
        folder_id: folder.folder_id().unwrap_or_default().to_string(),
        arn: folder.arn().unwrap_or_default().to_string(),
        name: folder.name().unwrap_or_default().to_string(),
        folder_type: folder
            .folder_type()
            .and_then(|t| FolderType::parse(t.as_str()))
            .unwrap_or(FolderType::Restricted),
        folder_path: folder.folder_path().to_vec(),
        permissions: Vec::new(),
    }
}

fn job_error(arn: Option<&str>, error_type: Option<&str>, message: Option<&str>) -> JobError {
    JobError {
        arn: arn.map(str::to_string),
        error_type: error_type.map(str::to_string),
        message: message.unwrap_or_default().to_string(),
    }
}

impl QuickSightApi for SdkQuickSightApi {
    fn region(&self) -> &str {
        &self.region
    }

    fn list_page(
        &self,
        class: ResourceClass,
        next_token: Option<&str>,
    ) -> MigrationResult<Page<AssetSummary>> {
        tracing::trace!(operation = list_operation(class), ?next_token, "Listing page");
        match class {
            ResourceClass::DataSource => self.list_data_sources(next_token),
            ResourceClass::DataSet => self.list_data_sets(next_token),
            ResourceClass::Analysis => self.list_analyses(next_token),
            ResourceClass::Dashboard => self.list_dashboards(next_token),
            ResourceClass::Folder => self.list_folders(next_token),
        }
    }

    fn describe_folder(&self, folder_id: &str) -> MigrationResult<Option<FolderRecord>> {
        let result = self.runtime.block_on(
            self.client
                .describe_folder()
                .aws_account_id(&self.account_id)
                .folder_id(folder_id)
                .send(),
        );

        match result {
            Ok(resp) => Ok(resp.folder().map(folder_record)),
            Err(err) => match service_error("DescribeFolder", folder_id, err) {
                MigrationError::ResourceNotFound { .. } => Ok(None),
                other => Err(other),
            },
        }
    }

    fn describe_folder_resolved_permissions(
        &self,
        folder_id: &str,
    ) -> MigrationResult<Vec<Permission>> {
        let resp = self
            .runtime
            .block_on(
                self.client
                    .describe_folder_resolved_permissions()
                    .aws_account_id(&self.account_id)
                    .folder_id(folder_id)
                    .send(),
            )
            .map_err(|e| service_error("DescribeFolderResolvedPermissions", folder_id, e))?;

        Ok(resp.permissions().iter().map(permission).collect())
    }

    fn list_folder_members(
        &self,
        folder_id: &str,
        next_token: Option<&str>,
    ) -> MigrationResult<Page<FolderMember>> {
        let resp = self
            .runtime
            .block_on(
                self.client
                    .list_folder_members()
                    .aws_account_id(&self.account_id)
                    .folder_id(folder_id)
                    .set_next_token(next_token.map(str::to_string))
                    .send(),
            )
            .map_err(|e| service_error("ListFolderMembers", folder_id, e))?;

        let items = resp
            .folder_member_list()
            .iter()
            .map(|m| FolderMember {
                member_id: m.member_id().unwrap_or_default().to_string(),
                member_arn: m.member_arn().unwrap_or_default().to_string(),
            })
            .collect();

        Ok(Page {
            items,
            next_token: resp.next_token().map(str::to_string),
        })
    }

    fn create_folder(&self, request: &CreateFolderRequest) -> MigrationResult<String> {
        let permissions = if request.permissions.is_empty() {
            None
        } else {
            Some(
                request
                    .permissions
                    .iter()
                    .map(sdk_permission)
                    .collect::<MigrationResult<Vec<_>>>()?,
            )
        };

        let resp = self
            .runtime
            .block_on(
                self.client
                    .create_folder()
                    .aws_account_id(&self.account_id)
                    .folder_id(&request.folder_id)
                    .name(&request.name)
                    .folder_type(sdk::FolderType::from(request.folder_type.as_str()))
                    .set_parent_folder_arn(request.parent_folder_arn.clone())
                    .set_permissions(permissions)
                    .send(),
            )
            .map_err(|e| service_error("CreateFolder", &request.folder_id, e))?;

        Ok(resp.arn().unwrap_or_default().to_string())
    }

    fn create_folder_membership(
        &self,
        folder_id: &str,
        member_id: &str,
        member_type: MemberType,
    ) -> MigrationResult<()> {
        self.runtime
            .block_on(
                self.client
                    .create_folder_membership()
                    .aws_account_id(&self.account_id)
                    .folder_id(folder_id)
                    .member_id(member_id)
                    .member_type(sdk::MemberType::from(member_type.as_str()))
                    .send(),
            )
            .map_err(|e| {
                service_error(
                    "CreateFolderMembership",
                    &format!("{}/{}", folder_id, member_id),
                    e,
                )
            })?;
        Ok(())
    }

    fn start_export_job(&self, request: &ExportJobRequest) -> MigrationResult<()> {
        self.runtime
            .block_on(
                self.client
                    .start_asset_bundle_export_job()
                    .aws_account_id(&self.account_id)
                    .asset_bundle_export_job_id(&request.job_id)
                    .set_resource_arns(Some(request.resource_arns.clone()))
                    .include_all_dependencies(request.include_all_dependencies)
                    .include_permissions(request.include_permissions)
                    .include_folder_memberships(request.include_folder_memberships)
                    .include_folder_members(sdk::IncludeFolderMembers::from(
                        request.include_folder_members,
                    ))
                    .include_tags(request.include_tags)
                    .export_format(sdk::AssetBundleExportFormat::from(request.format))
                    .send(),
            )
            .map_err(|e| service_error("StartAssetBundleExportJob", &request.job_id, e))?;
        Ok(())
    }

    fn describe_export_job(&self, job_id: &str) -> MigrationResult<JobDescription> {
        let resp = self
            .runtime
            .block_on(
                self.client
                    .describe_asset_bundle_export_job()
                    .aws_account_id(&self.account_id)
                    .asset_bundle_export_job_id(job_id)
                    .send(),
            )
            .map_err(|e| service_error("DescribeAssetBundleExportJob", job_id, e))?;

        Ok(JobDescription {
            job_id: job_id.to_string(),
            status: resp
                .job_status()
                .map(|s| JobStatus::parse(s.as_str()))
                .unwrap_or(JobStatus::Submitted),
            resource_arns: resp.resource_arns().to_vec(),
            download_url: resp.download_url().map(str::to_string),
            errors: resp
                .errors()
                .iter()
                .map(|e| job_error(e.arn(), e.r#type(), e.message()))
                .collect(),
        })
    }

    fn start_import_job(&self, request: &ImportJobRequest) -> MigrationResult<()> {
        let source = sdk::AssetBundleImportSource::builder()
            .body(Blob::new(request.body.clone()))
            .build();

        self.runtime
            .block_on(
                self.client
                    .start_asset_bundle_import_job()
                    .aws_account_id(&self.account_id)
                    .asset_bundle_import_job_id(&request.job_id)
                    .asset_bundle_import_source(source)
                    .failure_action(sdk::AssetBundleImportFailureAction::from(
                        request.failure_action,
                    ))
                    .send(),
            )
            .map_err(|e| service_error("StartAssetBundleImportJob", &request.job_id, e))?;
        Ok(())
    }

    fn describe_import_job(&self, job_id: &str) -> MigrationResult<JobDescription> {
        let resp = self
            .runtime
            .block_on(
                self.client
                    .describe_asset_bundle_import_job()
                    .aws_account_id(&self.account_id)
                    .asset_bundle_import_job_id(job_id)
                    .send(),
            )
            .map_err(|e| service_error("DescribeAssetBundleImportJob", job_id, e))?;

        Ok(JobDescription {
            job_id: job_id.to_string(),
            status: resp
                .job_status()
                .map(|s| JobStatus::parse(s.as_str()))
                .unwrap_or(JobStatus::Submitted),
            resource_arns: Vec::new(),
            download_url: None,
            errors: resp
                .errors()
                .iter()
                .map(|e| job_error(e.arn(), e.r#type(), e.message()))
                .collect(),
        })
    }

    fn delete_asset(&self, class: ResourceClass, id: &str) -> MigrationResult<()> {
        let account = self.account_id.as_str();
        let operation = delete_operation(class);

        match class {
            ResourceClass::Dashboard => self
                .runtime
                .block_on(
                    self.client
                        .delete_dashboard()
                        .aws_account_id(account)
                        .dashboard_id(id)
                        .send(),
                )
                .map(|_| ())
                .map_err(|e| service_error(operation, id, e)),
            ResourceClass::Analysis => self
                .runtime
                .block_on(
                    self.client
                        .delete_analysis()
                        .aws_account_id(account)
                        .analysis_id(id)
                        .force_delete_without_recovery(true)
                        .send(),
                )
                .map(|_| ())
                .map_err(|e| service_error(operation, id, e)),
            ResourceClass::DataSet => self
                .runtime
                .block_on(
                    self.client
                        .delete_data_set()
                        .aws_account_id(account)
                        .data_set_id(id)
                        .send(),
                )
                .map(|_| ())
                .map_err(|e| service_error(operation, id, e)),
            ResourceClass::DataSource => self
                .runtime
                .block_on(
                    self.client
                        .delete_data_source()
                        .aws_account_id(account)
                        .data_source_id(id)
                        .send(),
                )
                .map(|_| ())
                .map_err(|e| service_error(operation, id, e)),
            ResourceClass::Folder => self
                .runtime
                .block_on(
                    self.client
                        .delete_folder()
                        .aws_account_id(account)
                        .folder_id(id)
                        .send(),
                )
                .map(|_| ())
                .map_err(|e| service_error(operation, id, e)),
        }
    }
}
