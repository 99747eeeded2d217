//! Paginated inventory reads.
//!
//! `Inventory::list` walks every page of a resource class lazily and drops
//! records that cannot be bundled. Each call starts from the first page, so
//! a listing can be restarted by calling `list` again.

use std::collections::VecDeque;

use crate::migration::api::{Page, QuickSightApi};
use crate::migration::error::MigrationResult;
use crate::migration::model::{AssetSummary, ResourceClass};

type PageFetcher<'a, T> = Box<dyn FnMut(Option<&str>) -> MigrationResult<Page<T>> + 'a>;

/// Iterator over the concatenated items of a token-chained listing.
///
/// Stops after the page without a continuation token. A failed fetch is
/// yielded once as an error and ends the sequence.
pub struct Paginator<'a, T> {
    fetch: PageFetcher<'a, T>,
    buffer: VecDeque<T>,
    next_token: Option<String>,
    done: bool,
}

impl<'a, T> Paginator<'a, T> {
    pub fn new(fetch: impl FnMut(Option<&str>) -> MigrationResult<Page<T>> + 'a) -> Self {
        Self {
            fetch: Box::new(fetch),
            buffer: VecDeque::new(),
            next_token: None,
            done: false,
        }
    }
}

impl<T> Iterator for Paginator<'_, T> {
    type Item = MigrationResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }

            match (self.fetch)(self.next_token.as_deref()) {
                Ok(page) => {
                    self.buffer.extend(page.items);
                    self.next_token = page.next_token;
                    if self.next_token.is_none() {
                        self.done = true;
                    }
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Whether a listed record can take part in a migration.
///
/// Data sources and analyses must be fully created or updated when they
/// report a status; data sources also need connection parameters.
pub fn is_eligible(asset: &AssetSummary) -> bool {
    if asset.class().filters_status()
        && let Some(status) = asset.status()
        && !status.is_successful()
    {
        return false;
    }

    match asset {
        AssetSummary::DataSource(source) => source.has_parameters,
        _ => true,
    }
}

/// Filtered listing of one resource class
pub struct InventoryPages<'a> {
    pages: Paginator<'a, AssetSummary>,
}

impl Iterator for InventoryPages<'_> {
    type Item = MigrationResult<AssetSummary>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.pages.next()? {
                Ok(asset) if !is_eligible(&asset) => {
                    tracing::debug!(
                        class = %asset.class(),
                        arn = asset.arn(),
                        status = asset.status().map(|s| s.as_str()).unwrap_or("-"),
                        "Skipping ineligible asset"
                    );
                    continue;
                }
                other => return Some(other),
            }
        }
    }
}

/// Reads the asset inventory of one account and region
pub struct Inventory<'a> {
    api: &'a dyn QuickSightApi,
}

impl<'a> Inventory<'a> {
    pub fn new(api: &'a dyn QuickSightApi) -> Self {
        Self { api }
    }

    /// Every page of `class` without the eligibility filter
    pub fn list_unfiltered(&self, class: ResourceClass) -> Paginator<'a, AssetSummary> {
        let api = self.api;
        Paginator::new(move |token| api.list_page(class, token))
    }

    /// Every eligible record of `class`, in remote order
    pub fn list(&self, class: ResourceClass) -> InventoryPages<'a> {
        InventoryPages {
            pages: self.list_unfiltered(class),
        }
    }

    /// Collect every eligible record of `class`, failing on the first error
    pub fn collect(&self, class: ResourceClass) -> MigrationResult<Vec<AssetSummary>> {
        self.list(class).collect()
    }

    /// Collect all five classes
    pub fn snapshot(&self) -> MigrationResult<InventorySnapshot> {
        let mut snapshot = InventorySnapshot::default();
        for class in ResourceClass::ALL {
            let assets = self.collect(class)?;
            tracing::info!(class = %class, count = assets.len(), region = self.api.region(), "Listed assets");
            snapshot.insert(class, assets);
        }
        Ok(snapshot)
    }
}

/// Inventory of every class at one point in time
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    pub data_sources: Vec<AssetSummary>,
    pub data_sets: Vec<AssetSummary>,
    pub analyses: Vec<AssetSummary>,
    pub dashboards: Vec<AssetSummary>,
    pub folders: Vec<AssetSummary>,
}

impl InventorySnapshot {
    pub fn get(&self, class: ResourceClass) -> &[AssetSummary] {
        match class {
            ResourceClass::DataSource => &self.data_sources,
            ResourceClass::DataSet => &self.data_sets,
            ResourceClass::Analysis => &self.analyses,
            ResourceClass::Dashboard => &self.dashboards,
            ResourceClass::Folder => &self.folders,
        }
    }

    pub fn insert(&mut self, class: ResourceClass, assets: Vec<AssetSummary>) {
        let slot = match class {
            ResourceClass::DataSource => &mut self.data_sources,
            ResourceClass::DataSet => &mut self.data_sets,
            ResourceClass::Analysis => &mut self.analyses,
            ResourceClass::Dashboard => &mut self.dashboards,
            ResourceClass::Folder => &mut self.folders,
        };
        *slot = assets;
    }

    /// Bundle ARNs: dashboards, analyses, datasets, then data sources
    pub fn ordered_arns(&self) -> Vec<String> {
        ResourceClass::BUNDLE_ORDER
            .iter()
            .flat_map(|class| self.get(*class).iter().map(|a| a.arn().to_string()))
            .collect()
    }

    pub fn count(&self, class: ResourceClass) -> usize {
        self.get(class).len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetSummary> {
        ResourceClass::ALL
            .into_iter()
            .flat_map(move |class| self.get(class).iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::api::MockQuickSightApi;
    use crate::migration::error::MigrationError;
    use crate::migration::model::{
        AnalysisSummary, AssetStatus, DashboardSummary, DataSetSummary, DataSourceSummary,
    };

    fn dashboard(id: &str) -> AssetSummary {
        DashboardSummary {
            id: id.to_string(),
            arn: format!("arn:aws:quicksight:us-east-1:111122223333:dashboard/{}", id),
            name: format!("Dashboard {}", id),
        }
        .into()
    }

    fn analysis(id: &str, status: Option<AssetStatus>) -> AssetSummary {
        AnalysisSummary {
            id: id.to_string(),
            arn: format!("arn:aws:quicksight:us-east-1:111122223333:analysis/{}", id),
            name: format!("Analysis {}", id),
            status,
        }
        .into()
    }

    fn data_source(id: &str, has_parameters: bool) -> AssetSummary {
        DataSourceSummary {
            id: id.to_string(),
            arn: format!("arn:aws:quicksight:us-east-1:111122223333:datasource/{}", id),
            name: format!("Source {}", id),
            source_type: Some("ATHENA".to_string()),
            status: Some(AssetStatus::CreationSuccessful),
            has_parameters,
        }
        .into()
    }

    fn data_set(id: &str) -> AssetSummary {
        DataSetSummary {
            id: id.to_string(),
            arn: format!("arn:aws:quicksight:us-east-1:111122223333:dataset/{}", id),
            name: format!("Set {}", id),
            import_mode: Some("SPICE".to_string()),
        }
        .into()
    }

    #[test]
    fn test_list_concatenates_every_page_split() {
        let ids: Vec<String> = (0..7).map(|i| format!("d{}", i)).collect();

        for split in [vec![7], vec![1, 6], vec![3, 3, 1], vec![0, 4, 0, 3], vec![1; 7]] {
            let mut pages: Vec<Vec<AssetSummary>> = Vec::new();
            let mut offset = 0;
            for size in &split {
                pages.push(ids[offset..offset + size].iter().map(|id| dashboard(id)).collect());
                offset += size;
            }
            let page_count = pages.len();
            let api = MockQuickSightApi::new("us-east-1").with_pages(ResourceClass::Dashboard, pages);

            let listed: Vec<String> = Inventory::new(&api)
                .collect(ResourceClass::Dashboard)
                .unwrap()
                .iter()
                .map(|a| a.id().to_string())
                .collect();

            assert_eq!(listed, ids, "split {:?}", split);
            assert_eq!(api.list_calls(ResourceClass::Dashboard), page_count);
        }
    }

    #[test]
    fn test_list_is_lazy_and_restartable() {
        let api = MockQuickSightApi::new("us-east-1").with_pages(
            ResourceClass::Dashboard,
            vec![vec![dashboard("a")], vec![dashboard("b")]],
        );
        let inventory = Inventory::new(&api);

        let first = inventory.list(ResourceClass::Dashboard).next().unwrap().unwrap();
        assert_eq!(first.id(), "a");
        assert_eq!(api.list_calls(ResourceClass::Dashboard), 1);

        let all = inventory.collect(ResourceClass::Dashboard).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(api.list_calls(ResourceClass::Dashboard), 3);
    }

    #[test]
    fn test_status_filter_keeps_successful_and_absent() {
        let api = MockQuickSightApi::new("us-east-1").with_pages(
            ResourceClass::Analysis,
            vec![vec![
                analysis("ok", Some(AssetStatus::CreationSuccessful)),
                analysis("broken", Some(AssetStatus::CreationFailed)),
                analysis("unknown", None),
            ]],
        );

        let kept: Vec<String> = Inventory::new(&api)
            .collect(ResourceClass::Analysis)
            .unwrap()
            .iter()
            .map(|a| a.id().to_string())
            .collect();

        assert_eq!(kept, vec!["ok", "unknown"]);
    }

    #[test]
    fn test_failed_data_sources_are_dropped_even_with_parameters() {
        let with_status = |id: &str, status: AssetStatus| -> AssetSummary {
            match data_source(id, true) {
                AssetSummary::DataSource(source) => DataSourceSummary {
                    status: Some(status),
                    ..source
                }
                .into(),
                other => other,
            }
        };
        let api = MockQuickSightApi::new("us-east-1").with_pages(
            ResourceClass::DataSource,
            vec![vec![
                with_status("broken", AssetStatus::CreationFailed),
                with_status("updated", AssetStatus::UpdateSuccessful),
            ]],
        );

        let kept: Vec<String> = Inventory::new(&api)
            .collect(ResourceClass::DataSource)
            .unwrap()
            .iter()
            .map(|a| a.id().to_string())
            .collect();

        assert_eq!(kept, vec!["updated"]);
    }

    #[test]
    fn test_data_sources_without_parameters_are_dropped() {
        let api = MockQuickSightApi::new("us-east-1").with_pages(
            ResourceClass::DataSource,
            vec![vec![data_source("athena", true), data_source("upload", false)]],
        );
        let inventory = Inventory::new(&api);

        let kept = inventory.collect(ResourceClass::DataSource).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), "athena");

        let everything: Vec<_> = inventory
            .list_unfiltered(ResourceClass::DataSource)
            .collect::<MigrationResult<_>>()
            .unwrap();
        assert_eq!(everything.len(), 2);
    }

    #[test]
    fn test_remote_failure_ends_the_sequence() {
        let api = MockQuickSightApi::new("us-east-1")
            .with_pages(
                ResourceClass::Dashboard,
                vec![vec![dashboard("a")], vec![dashboard("b")], vec![dashboard("c")]],
            )
            .with_failing_page(ResourceClass::Dashboard, 1);

        let results: Vec<_> = Inventory::new(&api).list(ResourceClass::Dashboard).collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().id(), "a");
        assert!(matches!(
            results[1],
            Err(MigrationError::RemoteCallFailed { .. })
        ));
        assert_eq!(api.list_calls(ResourceClass::Dashboard), 2);
    }

    #[test]
    fn test_snapshot_orders_bundle_arns_by_dependency() {
        let api = MockQuickSightApi::new("us-east-1")
            .with_pages(ResourceClass::DataSource, vec![vec![data_source("s1", true)]])
            .with_pages(ResourceClass::DataSet, vec![vec![data_set("ds1")]])
            .with_pages(
                ResourceClass::Analysis,
                vec![vec![analysis("a1", Some(AssetStatus::UpdateSuccessful))]],
            )
            .with_pages(ResourceClass::Dashboard, vec![vec![dashboard("db1")]])
            .with_folder("f1", "Finance", None);

        let snapshot = Inventory::new(&api).snapshot().unwrap();
        let ids: Vec<String> = snapshot
            .ordered_arns()
            .iter()
            .map(|arn| arn.rsplit('/').next().unwrap().to_string())
            .collect();

        assert_eq!(ids, vec!["db1", "a1", "ds1", "s1"]);
        assert_eq!(snapshot.count(ResourceClass::Folder), 1);
        assert_eq!(snapshot.iter().count(), 5);
    }
}
