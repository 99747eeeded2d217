//! Folder hierarchy reconciliation.
//!
//! Source folders are read with their resolved permissions, ordered so
//! every parent is handled before its children, and recreated on the
//! target with the same ids. Resources that already exist on the target
//! are reported and skipped, so a second run over the same pair of regions
//! changes nothing.

use serde::Serialize;
use std::cmp::Reverse;

use crate::migration::api::{CreateFolderRequest, QuickSightApi};
use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::inventory::{Inventory, Paginator};
use crate::migration::model::{FolderMember, FolderRecord, ResourceClass};
use crate::traits::Output;

/// Every folder of an account, with resolved permissions, in list order
pub fn load_folders(api: &dyn QuickSightApi) -> MigrationResult<Vec<FolderRecord>> {
    let mut folders = Vec::new();

    for summary in Inventory::new(api).list(ResourceClass::Folder) {
        let summary = summary?;
        let Some(mut record) = api.describe_folder(summary.id())? else {
            tracing::warn!(folder_id = summary.id(), "Folder disappeared before describe");
            continue;
        };
        record.permissions = api.describe_folder_resolved_permissions(&record.folder_id)?;
        folders.push(record);
    }

    Ok(folders)
}

/// Ascending depth; folders of equal depth keep their relative order
pub fn sort_for_creation(mut folders: Vec<FolderRecord>) -> Vec<FolderRecord> {
    folders.sort_by_key(FolderRecord::depth);
    folders
}

/// Descending depth, so children go before their parents
pub fn sort_for_deletion(mut folders: Vec<FolderRecord>) -> Vec<FolderRecord> {
    folders.sort_by_key(|f| Reverse(f.depth()));
    folders
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderReport {
    pub created: usize,
    pub existing: usize,
    pub memberships_created: usize,
    pub memberships_existing: usize,
    /// Members with no recognised membership type
    pub skipped: usize,
    /// Folders or memberships whose remote call failed
    pub failed: usize,
}

enum FolderOutcome {
    Created,
    Existing,
}

pub struct FolderReconciler<'a> {
    source: &'a dyn QuickSightApi,
    target: &'a dyn QuickSightApi,
    output: &'a dyn Output,
}

impl<'a> FolderReconciler<'a> {
    pub fn new(
        source: &'a dyn QuickSightApi,
        target: &'a dyn QuickSightApi,
        output: &'a dyn Output,
    ) -> Self {
        Self {
            source,
            target,
            output,
        }
    }

    /// Recreate the source folder forest and its memberships on the target.
    ///
    /// Fails only when the source folders cannot be read; problems with a
    /// single folder or member are reported and counted.
    pub fn migrate(&self) -> MigrationResult<FolderReport> {
        let folders = sort_for_creation(load_folders(self.source)?);
        let mut report = FolderReport::default();

        self.output.subsection("Folders");
        self.output.info(&format!("Reconciling {} folders...", folders.len()));

        for folder in &folders {
            match self.create_folder(folder) {
                Ok(FolderOutcome::Created) => {
                    report.created += 1;
                    self.output
                        .success(&format!("Created folder {} ({})", folder.name, folder.folder_id));
                }
                Ok(FolderOutcome::Existing) => {
                    report.existing += 1;
                    self.output.warning(&format!(
                        "Folder {} ({}) already exists on target",
                        folder.name, folder.folder_id
                    ));
                }
                Err(err) => {
                    report.failed += 1;
                    self.output.error(&format!(
                        "Failed to create folder {} ({}): {}",
                        folder.name, folder.folder_id, err
                    ));
                    continue;
                }
            }

            self.copy_members(folder, &mut report);
        }

        tracing::info!(
            created = report.created,
            existing = report.existing,
            memberships_created = report.memberships_created,
            memberships_existing = report.memberships_existing,
            skipped = report.skipped,
            failed = report.failed,
            "Folder reconciliation finished"
        );
        Ok(report)
    }

    /// Target ARN of the folder's parent, or `None` to create it as a root
    fn resolve_parent(&self, folder: &FolderRecord) -> MigrationResult<Option<String>> {
        let parent_id = match folder.parent_id() {
            Ok(Some(id)) => id,
            Ok(None) => return Ok(None),
            Err(err) => {
                self.output.warning(&format!(
                    "Folder {}: cannot read parent ARN ({}); creating it as a root folder",
                    folder.folder_id, err
                ));
                return Ok(None);
            }
        };

        match self.target.describe_folder(&parent_id)? {
            Some(parent) => Ok(Some(parent.arn)),
            None => {
                self.output.warning(&format!(
                    "Folder {}: parent {} not found on target; creating it as a root folder",
                    folder.folder_id, parent_id
                ));
                Ok(None)
            }
        }
    }

    fn create_folder(&self, folder: &FolderRecord) -> MigrationResult<FolderOutcome> {
        let request = CreateFolderRequest {
            folder_id: folder.folder_id.clone(),
            name: folder.name.clone(),
            folder_type: folder.folder_type,
            parent_folder_arn: self.resolve_parent(folder)?,
            permissions: folder.permissions.clone(),
        };

        match self.target.create_folder(&request) {
            Ok(arn) => {
                tracing::info!(folder_id = %folder.folder_id, arn = %arn, "Created folder");
                Ok(FolderOutcome::Created)
            }
            Err(err) if err.is_already_exists() => Ok(FolderOutcome::Existing),
            Err(err) => Err(err),
        }
    }

    fn members(&self, folder_id: &str) -> MigrationResult<Vec<FolderMember>> {
        let source = self.source;
        Paginator::new(move |token| source.list_folder_members(folder_id, token)).collect()
    }

    fn copy_members(&self, folder: &FolderRecord, report: &mut FolderReport) {
        let members = match self.members(&folder.folder_id) {
            Ok(members) => members,
            Err(err) => {
                report.failed += 1;
                self.output.error(&format!(
                    "Failed to list members of folder {}: {}",
                    folder.folder_id, err
                ));
                return;
            }
        };

        for member in members {
            let member_type = match member.member_type() {
                Ok(member_type) => member_type,
                Err(err) => {
                    report.skipped += 1;
                    self.output.warning(&format!(
                        "Skipping member {} of folder {}: {}",
                        member.member_arn, folder.folder_id, err
                    ));
                    continue;
                }
            };

            match self.target.create_folder_membership(
                &folder.folder_id,
                &member.member_id,
                member_type,
            ) {
                Ok(()) => {
                    report.memberships_created += 1;
                    tracing::info!(
                        folder_id = %folder.folder_id,
                        member_id = %member.member_id,
                        member_type = %member_type,
                        "Created folder membership"
                    );
                }
                Err(MigrationError::ResourceAlreadyExists { .. }) => {
                    report.memberships_existing += 1;
                    self.output.warning(&format!(
                        "{} {} is already a member of folder {}",
                        member_type, member.member_id, folder.folder_id
                    ));
                }
                Err(err) => {
                    report.failed += 1;
                    self.output.error(&format!(
                        "Failed to add {} {} to folder {}: {}",
                        member_type, member.member_id, folder.folder_id, err
                    ));
                }
            }
        }
    }
}
