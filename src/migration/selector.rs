//! Asset selection.
//!
//! A `SelectionPolicy` comes from configuration and turns into one
//! `Predicate` per resource class. `select` keeps input order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::migration::model::{AssetSummary, ResourceClass};

/// Composable record predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Keep every record that carries an ARN
    All,
    NameEquals(String),
    NameIn(BTreeSet<String>),
    ArnIn(BTreeSet<String>),
    /// Data sources whose connector type matches, e.g. ATHENA
    SourceType(String),
    /// Datasets whose import mode matches, e.g. SPICE
    ImportMode(String),
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn matches(&self, asset: &AssetSummary) -> bool {
        match self {
            Predicate::All => !asset.arn().is_empty(),
            Predicate::NameEquals(name) => asset.name() == name,
            Predicate::NameIn(names) => names.contains(asset.name()),
            Predicate::ArnIn(arns) => arns.contains(asset.arn()),
            Predicate::SourceType(expected) => match asset {
                AssetSummary::DataSource(source) => {
                    source.source_type.as_deref() == Some(expected.as_str())
                }
                _ => false,
            },
            Predicate::ImportMode(expected) => match asset {
                AssetSummary::DataSet(set) => set.import_mode.as_deref() == Some(expected.as_str()),
                _ => false,
            },
            Predicate::And(all) => all.iter().all(|p| p.matches(asset)),
        }
    }

    pub fn name_in<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.len() == 1
            && let Some(name) = names.pop_first()
        {
            return Predicate::NameEquals(name);
        }
        Predicate::NameIn(names)
    }
}

/// Keep the records accepted by `keep`, in input order
pub fn select<T: Clone>(records: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    records.iter().filter(|r| keep(r)).cloned().collect()
}

/// Which assets a run migrates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Every eligible asset of every class
    All,
    /// Assets picked by name, per class
    ByName {
        #[serde(default)]
        data_sources: Vec<String>,
        #[serde(default)]
        data_sets: Vec<String>,
        #[serde(default)]
        analyses: Vec<String>,
        #[serde(default)]
        dashboards: Vec<String>,
        /// Restrict named data sources to this connector type
        #[serde(default)]
        data_source_type: Option<String>,
        /// Restrict named datasets to this import mode
        #[serde(default)]
        data_set_import_mode: Option<String>,
    },
    /// Assets picked by ARN, whatever their class
    ByArn { arns: Vec<String> },
}

impl SelectionPolicy {
    /// Predicate applied to records of `class`.
    ///
    /// Folders are always kept; which folders exist on the target is
    /// decided by the folder reconciler, not the bundle selection.
    pub fn predicate_for(&self, class: ResourceClass) -> Predicate {
        if class == ResourceClass::Folder {
            return Predicate::All;
        }

        match self {
            SelectionPolicy::All => Predicate::All,
            SelectionPolicy::ByArn { arns } => Predicate::ArnIn(arns.iter().cloned().collect()),
            SelectionPolicy::ByName {
                data_sources,
                data_sets,
                analyses,
                dashboards,
                data_source_type,
                data_set_import_mode,
            } => match class {
                ResourceClass::DataSource => {
                    let names = Predicate::name_in(data_sources.iter().cloned());
                    match data_source_type {
                        Some(kind) => {
                            Predicate::And(vec![Predicate::SourceType(kind.clone()), names])
                        }
                        None => names,
                    }
                }
                ResourceClass::DataSet => {
                    let names = Predicate::name_in(data_sets.iter().cloned());
                    match data_set_import_mode {
                        Some(mode) => Predicate::And(vec![Predicate::ImportMode(mode.clone()), names]),
                        None => names,
                    }
                }
                ResourceClass::Analysis => Predicate::name_in(analyses.iter().cloned()),
                ResourceClass::Dashboard => Predicate::name_in(dashboards.iter().cloned()),
                ResourceClass::Folder => Predicate::All,
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SelectionPolicy::All => "all assets".to_string(),
            SelectionPolicy::ByName {
                data_sources,
                data_sets,
                analyses,
                dashboards,
                ..
            } => format!(
                "by name ({} data sources, {} datasets, {} analyses, {} dashboards)",
                data_sources.len(),
                data_sets.len(),
                analyses.len(),
                dashboards.len()
            ),
            SelectionPolicy::ByArn { arns } => format!("by ARN ({} assets)", arns.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::model::{DashboardSummary, DataSetSummary, DataSourceSummary};

    fn source(name: &str, kind: &str) -> AssetSummary {
        DataSourceSummary {
            id: name.to_string(),
            arn: format!("arn:aws:quicksight:us-east-1:111122223333:datasource/{}", name),
            name: name.to_string(),
            source_type: Some(kind.to_string()),
            status: None,
            has_parameters: true,
        }
        .into()
    }

    fn data_set(name: &str, mode: &str) -> AssetSummary {
        DataSetSummary {
            id: name.to_string(),
            arn: format!("arn:aws:quicksight:us-east-1:111122223333:dataset/{}", name),
            name: name.to_string(),
            import_mode: Some(mode.to_string()),
        }
        .into()
    }

    fn dashboard(name: &str) -> AssetSummary {
        DashboardSummary {
            id: name.to_string(),
            arn: format!("arn:aws:quicksight:us-east-1:111122223333:dashboard/{}", name),
            name: name.to_string(),
        }
        .into()
    }

    #[test]
    fn test_select_preserves_order() {
        let records = vec![dashboard("c"), dashboard("a"), dashboard("b"), dashboard("a2")];
        let predicate = Predicate::name_in(["a", "b", "a2"]);

        let kept = select(&records, |r| predicate.matches(r));
        let names: Vec<&str> = kept.iter().map(|r| r.name()).collect();

        assert_eq!(names, vec!["a", "b", "a2"]);
    }

    #[test]
    fn test_all_keeps_records_with_arns() {
        let mut blank = dashboard("x");
        if let AssetSummary::Dashboard(d) = &mut blank {
            d.arn.clear();
        }
        let records = vec![dashboard("a"), blank];

        assert_eq!(select(&records, |r| Predicate::All.matches(r)).len(), 1);
    }

    #[test]
    fn test_data_source_type_and_name() {
        let policy = SelectionPolicy::ByName {
            data_sources: vec!["data-test12345".to_string()],
            data_sets: vec![],
            analyses: vec![],
            dashboards: vec![],
            data_source_type: Some("ATHENA".to_string()),
            data_set_import_mode: None,
        };
        let predicate = policy.predicate_for(ResourceClass::DataSource);

        assert!(predicate.matches(&source("data-test12345", "ATHENA")));
        assert!(!predicate.matches(&source("data-test12345", "S3")));
        assert!(!predicate.matches(&source("other", "ATHENA")));
    }

    #[test]
    fn test_data_set_import_mode_and_name() {
        let policy = SelectionPolicy::ByName {
            data_sources: vec![],
            data_sets: vec!["netflix_data".to_string()],
            analyses: vec![],
            dashboards: vec![],
            data_source_type: None,
            data_set_import_mode: Some("SPICE".to_string()),
        };
        let predicate = policy.predicate_for(ResourceClass::DataSet);

        assert!(predicate.matches(&data_set("netflix_data", "SPICE")));
        assert!(!predicate.matches(&data_set("netflix_data", "DIRECT_QUERY")));
    }

    #[test]
    fn test_policy_from_yaml() {
        let yaml = r#"
mode: by_name
dashboards:
  - Sales Overview
analyses:
  - Sales Analysis
"#;
        let policy: SelectionPolicy = serde_yaml::from_str(yaml).unwrap();

        assert!(policy.predicate_for(ResourceClass::Dashboard).matches(&dashboard("Sales Overview")));
        assert!(!policy.predicate_for(ResourceClass::Dashboard).matches(&dashboard("Other")));
        assert!(!policy.predicate_for(ResourceClass::DataSet).matches(&data_set("x", "SPICE")));
        assert_eq!(policy.predicate_for(ResourceClass::Folder), Predicate::All);

        let all: SelectionPolicy = serde_yaml::from_str("mode: all").unwrap();
        assert_eq!(all, SelectionPolicy::All);
    }

    #[test]
    fn test_single_name_becomes_equality() {
        assert_eq!(
            Predicate::name_in(["Sales"]),
            Predicate::NameEquals("Sales".to_string())
        );
        assert!(matches!(Predicate::name_in(["a", "b"]), Predicate::NameIn(_)));
        assert!(matches!(Predicate::name_in(Vec::<String>::new()), Predicate::NameIn(_)));
    }

    #[test]
    fn test_by_arn_policy() {
        let wanted = dashboard("keep");
        let policy = SelectionPolicy::ByArn {
            arns: vec![wanted.arn().to_string()],
        };
        let predicate = policy.predicate_for(ResourceClass::Dashboard);

        assert!(predicate.matches(&wanted));
        assert!(!predicate.matches(&dashboard("drop")));
        assert_eq!(policy.describe(), "by ARN (1 assets)");
    }
}
