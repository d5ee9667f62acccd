// Copyright 2025 Cowboy AI, LLC.

//! Part catalogs
//!
//! A catalog is a collection of part definitions that can be queried by
//! import. Implementors supply [`ComposablePartCatalog::state`] and
//! [`ComposablePartCatalog::enumerate_parts`]; everything else has a
//! default that may be overridden. [`ComposablePartCatalog::candidate_parts`]
//! is the seam for catalogs that can pre-filter by contract.
//!
//! ```mermaid
//! graph TD
//!     Q[get_exports import] --> C[candidate_parts]
//!     C --> P1[part 1 get_exports]
//!     C --> P2[part 2 get_exports]
//!     P1 --> A[aggregate in order]
//!     P2 --> A
//! ```
//!
//! Catalogs report what exists; enforcing the import's cardinality is left
//! to the caller.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, trace};

use crate::definition::import::ImportDefinition;
use crate::definition::part::{ComposablePartDefinition, ExportMatch, PartDefinitionExt};
use crate::errors::{CompositionError, CompositionResult};
use crate::publish::Published;

pub mod aggregate;
pub mod filtered;
pub mod indexed;
pub mod part_catalog;

pub use aggregate::AggregateCatalog;
pub use filtered::{FilteredCatalog, PartFilter};
pub use indexed::ContractIndexedCatalog;
pub use part_catalog::PartCatalog;

/// A shared, immutable snapshot of part definitions
pub type PartsView = Arc<Vec<Arc<dyn ComposablePartDefinition>>>;

/// Disposal flag and memoized parts view shared by catalog implementations
pub struct CatalogState {
    name: &'static str,
    disposed: AtomicBool,
    parts: Published<Vec<Arc<dyn ComposablePartDefinition>>>,
}

impl CatalogState {
    /// Create the state for a catalog called `name`
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            disposed: AtomicBool::new(false),
            parts: Published::new(),
        }
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fail if the catalog has been disposed
    pub fn ensure_not_disposed(&self) -> CompositionResult<()> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(CompositionError::disposed(self.name));
        }
        Ok(())
    }

    /// Mark the catalog disposed; returns `true` on the first call only
    pub fn dispose(&self) -> bool {
        let first = !self.disposed.swap(true, Ordering::AcqRel);
        if first {
            info!(catalog = self.name, "catalog disposed");
        }
        first
    }

    /// Whether the catalog has been disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// The memoized parts view, computed by `enumerate` on first use
    pub fn parts_view<F>(&self, enumerate: F) -> CompositionResult<PartsView>
    where
        F: FnOnce() -> CompositionResult<Vec<Arc<dyn ComposablePartDefinition>>>,
    {
        self.ensure_not_disposed()?;
        self.parts.get_or_try_publish(enumerate)
    }
}

impl fmt::Debug for CatalogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogState")
            .field("name", &self.name)
            .field("disposed", &self.is_disposed())
            .field("parts_materialized", &self.parts.is_published())
            .finish()
    }
}

/// A queryable collection of part definitions
pub trait ComposablePartCatalog: Send + Sync {
    /// Shared catalog state
    fn state(&self) -> &CatalogState;

    /// Enumerate the part definitions; called once per catalog to build the
    /// memoized [`PartsView`]
    fn enumerate_parts(&self) -> CompositionResult<Vec<Arc<dyn ComposablePartDefinition>>>;

    /// Every part definition in enumeration order
    ///
    /// # Errors
    ///
    /// Fails with [`CompositionError::ObjectDisposed`] after [`ComposablePartCatalog::dispose`]
    fn parts(&self) -> CompositionResult<PartsView> {
        self.state().parts_view(|| self.enumerate_parts())
    }

    /// Parts that may hold exports satisfying `import`; all parts by default
    fn candidate_parts(&self, _import: &dyn ImportDefinition) -> CompositionResult<PartsView> {
        self.parts()
    }

    /// `(part, export)` pairs across the catalog that satisfy `import`
    ///
    /// Results follow candidate order, then declaration order within each
    /// part. Nothing is allocated until the first match.
    fn get_exports(&self, import: &dyn ImportDefinition) -> CompositionResult<Vec<ExportMatch>> {
        self.state().ensure_not_disposed()?;
        let candidates = self.candidate_parts(import)?;

        let mut matches: Vec<ExportMatch> = Vec::new();
        for part in candidates.iter() {
            let found = part.get_exports(import)?;
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
            catalog = self.state().name(),
            contract = import.contract_name(),
            candidates = candidates.len(),
            matches = matches.len(),
            "catalog query"
        );
        Ok(matches)
    }

    /// Dispose the catalog; every later query fails
    fn dispose(&self) {
        self.state().dispose();
    }

    /// Whether the catalog has been disposed
    fn is_disposed(&self) -> bool {
        self.state().is_disposed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::contract::ContractBasedImportDefinition;
    use crate::definition::export::ExportDefinition;
    use crate::definition::part::PartDefinition;
    use std::sync::atomic::AtomicUsize;

    /// A catalog that counts how often it is enumerated
    struct CountingCatalog {
        state: CatalogState,
        enumerations: AtomicUsize,
    }

    impl ComposablePartCatalog for CountingCatalog {
        fn state(&self) -> &CatalogState {
            &self.state
        }

        fn enumerate_parts(&self) -> CompositionResult<Vec<Arc<dyn ComposablePartDefinition>>> {
            self.enumerations.fetch_add(1, Ordering::SeqCst);
            Ok(vec![PartDefinition::new("Logger")
                .with_export(ExportDefinition::for_contract("Logger")?)
                .into_shared()])
        }
    }

    fn counting() -> CountingCatalog {
        CountingCatalog {
            state: CatalogState::new("CountingCatalog"),
            enumerations: AtomicUsize::new(0),
        }
    }

    /// Test the parts view is computed once and shared
    #[test]
    fn test_parts_memoized() {
        let catalog = counting();
        let first = catalog.parts().unwrap();
        let second = catalog.parts().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(catalog.enumerations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_get_exports() {
        let catalog = counting();
        let import = ContractBasedImportDefinition::new("Logger").unwrap();
        assert_eq!(catalog.get_exports(&import).unwrap().len(), 1);
    }

    /// Test disposal is one-way and every query fails afterwards
    #[test]
    fn test_disposed_fails_fast() {
        let catalog = counting();
        let import = ContractBasedImportDefinition::new("Logger").unwrap();
        catalog.parts().unwrap();

        assert!(catalog.state().dispose());
        assert!(!catalog.state().dispose());
        assert!(catalog.is_disposed());

        for _ in 0..3 {
            assert!(catalog.parts().unwrap_err().is_disposed());
            assert!(catalog.get_exports(&import).unwrap_err().is_disposed());
        }
    }
}
