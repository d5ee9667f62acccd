// Copyright 2025 Cowboy AI, LLC.

//! Catalog composed of other catalogs

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{CatalogState, ComposablePartCatalog, PartsView};
use crate::definition::import::ImportDefinition;
use crate::definition::part::{ComposablePartDefinition, ExportMatch};
use crate::element::CompositionElement;
use crate::errors::CompositionResult;

/// A catalog whose parts are those of its child catalogs, in child order
///
/// Queries are delegated so that each child keeps its own candidate
/// selection, which lets an [`AggregateCatalog`] mix indexed and plain
/// catalogs without losing the index.
pub struct AggregateCatalog {
    state: CatalogState,
    catalogs: Vec<Arc<dyn ComposablePartCatalog>>,
}

impl AggregateCatalog {
    /// Aggregate `catalogs` in the given order
    pub fn new(catalogs: impl IntoIterator<Item = Arc<dyn ComposablePartCatalog>>) -> Self {
        let catalogs: Vec<_> = catalogs.into_iter().collect();
        debug!(catalogs = catalogs.len(), "aggregate catalog created");
        Self {
            state: CatalogState::new("AggregateCatalog"),
            catalogs,
        }
    }

    /// The child catalogs
    pub fn catalogs(&self) -> &[Arc<dyn ComposablePartCatalog>] {
        &self.catalogs
    }
}

impl ComposablePartCatalog for AggregateCatalog {
    fn state(&self) -> &CatalogState {
        &self.state
    }

    fn enumerate_parts(&self) -> CompositionResult<Vec<Arc<dyn ComposablePartDefinition>>> {
        let mut parts = Vec::new();
        for catalog in &self.catalogs {
            parts.extend(catalog.parts()?.iter().cloned());
        }
        Ok(parts)
    }

    /// The memoized view of every child's parts
    ///
    /// Fails once this catalog or any child has been disposed, even after
    /// the view was first built.
    fn parts(&self) -> CompositionResult<PartsView> {
        self.state.ensure_not_disposed()?;
        for catalog in &self.catalogs {
            catalog.state().ensure_not_disposed()?;
        }
        self.state.parts_view(|| self.enumerate_parts())
    }

    fn get_exports(&self, import: &dyn ImportDefinition) -> CompositionResult<Vec<ExportMatch>> {
        self.state.ensure_not_disposed()?;

        let mut matches: Vec<ExportMatch> = Vec::new();
        for catalog in &self.catalogs {
            let found = catalog.get_exports(import)?;
            if found.is_empty() {
                continue;
            }
            if matches.is_empty() {
                matches = found;
            } else {
                matches.extend(found);
            }
        }

        trace!(
            catalog = self.state.name(),
            contract = import.contract_name(),
            children = self.catalogs.len(),
            matches = matches.len(),
            "catalog query"
        );
        Ok(matches)
    }

    fn dispose(&self) {
        if self.state.dispose() {
            for catalog in &self.catalogs {
                catalog.dispose();
            }
        }
    }
}

impl CompositionElement for AggregateCatalog {
    fn display_name(&self) -> String {
        format!("AggregateCatalog (Catalogs = {})", self.catalogs.len())
    }
}

impl fmt::Debug for AggregateCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateCatalog")
            .field("state", &self.state)
            .field("catalogs", &self.catalogs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ContractIndexedCatalog, PartCatalog};
    use crate::definition::contract::ContractBasedImportDefinition;
    use crate::definition::export::ExportDefinition;
    use crate::definition::part::PartDefinition;

    fn part(name: &str, contract: &str) -> Arc<dyn ComposablePartDefinition> {
        PartDefinition::new(name)
            .with_export(ExportDefinition::for_contract(contract).unwrap())
            .into_shared()
    }

    fn aggregate() -> (AggregateCatalog, Arc<dyn ComposablePartCatalog>, Arc<dyn ComposablePartCatalog>) {
        let plain: Arc<dyn ComposablePartCatalog> =
            Arc::new(PartCatalog::new(vec![part("P1", "Logger"), part("P2", "Cache")]));
        let indexed: Arc<dyn ComposablePartCatalog> =
            Arc::new(ContractIndexedCatalog::new(vec![part("P3", "Logger")]));
        let aggregate = AggregateCatalog::new(vec![Arc::clone(&plain), Arc::clone(&indexed)]);
        (aggregate, plain, indexed)
    }

    /// Test parts and matches follow child order
    ///
    /// ```mermaid
    /// graph LR
    ///     A[AggregateCatalog] --> C1[PartCatalog P1 P2]
    ///     A --> C2[ContractIndexedCatalog P3]
    /// ```
    #[test]
    fn test_child_order() {
        let (aggregate, _, _) = aggregate();

        let names: Vec<String> = aggregate
            .parts()
            .unwrap()
            .iter()
            .map(|p| p.display_name())
            .collect();
        assert_eq!(names, vec!["P1", "P2", "P3"]);

        let import = ContractBasedImportDefinition::new("Logger").unwrap();
        let found: Vec<String> = aggregate
            .get_exports(&import)
            .unwrap()
            .iter()
            .map(|m| m.part().display_name())
            .collect();
        assert_eq!(found, vec!["P1", "P3"]);
    }

    #[test]
    fn test_dispose_cascades() {
        let (aggregate, plain, indexed) = aggregate();
        aggregate.dispose();

        assert!(aggregate.is_disposed());
        assert!(plain.is_disposed());
        assert!(indexed.is_disposed());

        let import = ContractBasedImportDefinition::new("Logger").unwrap();
        assert!(aggregate.get_exports(&import).unwrap_err().is_disposed());
    }

    #[test]
    fn test_disposed_child_fails_query() {
        let (aggregate, plain, _) = aggregate();
        plain.dispose();

        let import = ContractBasedImportDefinition::new("Logger").unwrap();
        assert!(aggregate.get_exports(&import).unwrap_err().is_disposed());
        assert!(!aggregate.is_disposed());
    }

    /// Test the memoized view is not served after a child is disposed
    #[test]
    fn test_disposed_child_fails_memoized_parts() {
        let (aggregate, _, indexed) = aggregate();
        assert_eq!(aggregate.parts().unwrap().len(), 3);

        indexed.dispose();

        assert!(aggregate.parts().unwrap_err().is_disposed());
        let import = ContractBasedImportDefinition::new("Logger").unwrap();
        assert!(aggregate.get_exports(&import).unwrap_err().is_disposed());
    }
}
