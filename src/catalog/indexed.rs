// Copyright 2025 Cowboy AI, LLC.

//! Catalog indexed by export contract name
//!
//! Candidate selection looks the import's contract name up in an index
//! built once at construction. Imports with an empty contract name fall
//! back to every part. The index assumes an import only matches exports
//! whose contract name equals its own, which holds for every
//! [`ContractBasedImportDefinition`](crate::ContractBasedImportDefinition).

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::{CatalogState, ComposablePartCatalog, PartsView};
use crate::definition::import::ImportDefinition;
use crate::definition::part::ComposablePartDefinition;
use crate::element::CompositionElement;
use crate::errors::CompositionResult;

/// A catalog that pre-filters candidate parts by contract name
pub struct ContractIndexedCatalog {
    state: CatalogState,
    parts: Vec<Arc<dyn ComposablePartDefinition>>,
    index: IndexMap<String, PartsView>,
    no_candidates: PartsView,
}

impl ContractIndexedCatalog {
    /// Create a catalog and build its contract index
    pub fn new(parts: impl IntoIterator<Item = Arc<dyn ComposablePartDefinition>>) -> Self {
        let parts: Vec<_> = parts.into_iter().collect();

        let mut buckets: IndexMap<String, Vec<Arc<dyn ComposablePartDefinition>>> = IndexMap::new();
        for part in &parts {
            for export in part.export_definitions() {
                let bucket = buckets.entry(export.contract_name().to_string()).or_default();
                if !bucket.last().is_some_and(|last| Arc::ptr_eq(last, part)) {
                    bucket.push(Arc::clone(part));
                }
            }
        }
        let index: IndexMap<String, PartsView> = buckets
            .into_iter()
            .map(|(contract, bucket)| (contract, Arc::new(bucket)))
            .collect();

        debug!(
            parts = parts.len(),
            contracts = index.len(),
            "contract indexed catalog created"
        );

        Self {
            state: CatalogState::new("ContractIndexedCatalog"),
            parts,
            index,
            no_candidates: Arc::new(Vec::new()),
        }
    }

    /// Contract names present in the catalog, in first-seen order
    pub fn contract_names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }
}

impl ComposablePartCatalog for ContractIndexedCatalog {
    fn state(&self) -> &CatalogState {
        &self.state
    }

    fn enumerate_parts(&self) -> CompositionResult<Vec<Arc<dyn ComposablePartDefinition>>> {
        Ok(self.parts.clone())
    }

    fn candidate_parts(&self, import: &dyn ImportDefinition) -> CompositionResult<PartsView> {
        self.state.ensure_not_disposed()?;
        let contract_name = import.contract_name();
        if contract_name.is_empty() {
            return self.parts();
        }
        Ok(self
            .index
            .get(contract_name)
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::clone(&self.no_candidates)))
    }
}

impl CompositionElement for ContractIndexedCatalog {
    fn display_name(&self) -> String {
        format!(
            "ContractIndexedCatalog (Parts = {}, Contracts = {})",
            self.parts.len(),
            self.index.len()
        )
    }
}

impl fmt::Debug for ContractIndexedCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractIndexedCatalog")
            .field("state", &self.state)
            .field("parts", &self.parts.len())
            .field("contracts", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::contract::ContractBasedImportDefinition;
    use crate::definition::export::ExportDefinition;
    use crate::definition::import::{Constraint, PredicateImportDefinition};
    use crate::definition::part::PartDefinition;
    use crate::policy::ImportCardinality;

    fn catalog() -> ContractIndexedCatalog {
        let a = PartDefinition::new("A")
            .with_export(ExportDefinition::for_contract("Logger").unwrap())
            .with_export(ExportDefinition::for_contract("Logger").unwrap())
            .into_shared();
        let b = PartDefinition::new("B")
            .with_export(ExportDefinition::for_contract("Cache").unwrap())
            .into_shared();
        let c = PartDefinition::new("C")
            .with_export(ExportDefinition::for_contract("Logger").unwrap())
            .into_shared();
        ContractIndexedCatalog::new(vec![a, b, c])
    }

    /// Test candidates come from the index, deduplicated and in order
    #[test]
    fn test_candidates_by_contract() {
        let catalog = catalog();
        let import = ContractBasedImportDefinition::new("Logger").unwrap();

        let candidates = catalog.candidate_parts(&import).unwrap();
        let names: Vec<String> = candidates.iter().map(|p| p.display_name()).collect();
        assert_eq!(names, vec!["A", "C"]);

        let matches = catalog.get_exports(&import).unwrap();
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_unknown_contract_shares_empty_view() {
        let catalog = catalog();
        let first = catalog
            .candidate_parts(&ContractBasedImportDefinition::new("Nope").unwrap())
            .unwrap();
        let second = catalog
            .candidate_parts(&ContractBasedImportDefinition::new("Other").unwrap())
            .unwrap();
        assert!(first.is_empty());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_empty_contract_scans_everything() {
        let catalog = catalog();
        let import = PredicateImportDefinition::new(
            Constraint::new("any", |_| true),
            "",
            ImportCardinality::ZeroOrMore,
            false,
            true,
        );
        assert_eq!(catalog.candidate_parts(&import).unwrap().len(), 3);
        assert_eq!(catalog.get_exports(&import).unwrap().len(), 4);
    }

    #[test]
    fn test_contract_names() {
        let catalog = catalog();
        let names: Vec<&str> = catalog.contract_names().collect();
        assert_eq!(names, vec!["Logger", "Cache"]);
    }

    #[test]
    fn test_disposed_candidates() {
        let catalog = catalog();
        catalog.dispose();
        let import = ContractBasedImportDefinition::new("Logger").unwrap();
        assert!(catalog.candidate_parts(&import).unwrap_err().is_disposed());
    }
}
