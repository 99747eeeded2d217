//! ARN parsing.
//!
//! Grammar handled here:
//!
//! ```text
//! arn:<partition>:<service>:<region>:<account>:<resource-type>/<resource-id>
//! ```
//!
//! QuickSight encodes the asset type as the `resource-type` segment, which
//! is how folder members get their membership type and how a folder path
//! entry yields the parent folder id.

use std::fmt;
use std::str::FromStr;

use crate::migration::error::{MigrationError, MigrationResult};
use crate::migration::model::MemberType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    pub resource_type: String,
    pub resource_id: String,
}

impl Arn {
    pub fn parse(value: &str) -> MigrationResult<Self> {
        let invalid = || MigrationError::InvalidArn(value.to_string());

        let mut parts = value.splitn(6, ':');
        let prefix = parts.next().ok_or_else(invalid)?;
        if prefix != "arn" {
            return Err(invalid());
        }

        let partition = parts.next().ok_or_else(invalid)?;
        let service = parts.next().ok_or_else(invalid)?;
        let region = parts.next().ok_or_else(invalid)?;
        let account = parts.next().ok_or_else(invalid)?;
        let resource = parts.next().ok_or_else(invalid)?;

        if partition.is_empty() || service.is_empty() {
            return Err(invalid());
        }

        let (resource_type, resource_id) = resource.split_once('/').ok_or_else(invalid)?;
        if resource_type.is_empty() || resource_id.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account: account.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
        })
    }

    /// Membership type encoded by the resource-type segment
    pub fn member_type(&self) -> MigrationResult<MemberType> {
        MemberType::from_resource_type(&self.resource_type)
            .ok_or_else(|| MigrationError::UnknownMemberType(self.resource_type.clone()))
    }
}

impl FromStr for Arn {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Arn::parse(s)
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}/{}",
            self.partition,
            self.service,
            self.region,
            self.account,
            self.resource_type,
            self.resource_id
        )
    }
}
