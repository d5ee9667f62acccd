// Copyright 2025 Cowboy AI, LLC.

//! Catalog view restricted by a part filter

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{CatalogState, ComposablePartCatalog};
use crate::definition::part::ComposablePartDefinition;
use crate::element::CompositionElement;
use crate::errors::CompositionResult;

/// Predicate deciding whether a part is visible through a [`FilteredCatalog`]
pub type PartFilter = Arc<dyn Fn(&dyn ComposablePartDefinition) -> bool + Send + Sync>;

/// The parts of an inner catalog that pass a filter
///
/// The inner catalog is shared, not owned; disposing the filtered view
/// leaves the inner catalog usable.
pub struct FilteredCatalog {
    state: CatalogState,
    inner: Arc<dyn ComposablePartCatalog>,
    filter: PartFilter,
    negated: bool,
}

impl FilteredCatalog {
    /// Keep the parts of `inner` for which `filter` returns `true`
    pub fn new<F>(inner: Arc<dyn ComposablePartCatalog>, filter: F) -> Self
    where
        F: Fn(&dyn ComposablePartDefinition) -> bool + Send + Sync + 'static,
    {
        Self::from_parts(inner, Arc::new(filter), false)
    }

    /// Keep the parts of `inner` that carry `key` in their metadata
    pub fn with_metadata_key(inner: Arc<dyn ComposablePartCatalog>, key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(inner, move |part| part.metadata().contains_key(&key))
    }

    /// The parts of the same inner catalog this view rejects
    pub fn complement(&self) -> Self {
        Self::from_parts(Arc::clone(&self.inner), Arc::clone(&self.filter), !self.negated)
    }

    fn from_parts(inner: Arc<dyn ComposablePartCatalog>, filter: PartFilter, negated: bool) -> Self {
        debug!(negated, "filtered catalog created");
        Self {
            state: CatalogState::new("FilteredCatalog"),
            inner,
            filter,
            negated,
        }
    }

    fn accepts(&self, part: &dyn ComposablePartDefinition) -> bool {
        (self.filter)(part) != self.negated
    }
}

impl ComposablePartCatalog for FilteredCatalog {
    fn state(&self) -> &CatalogState {
        &self.state
    }

    fn enumerate_parts(&self) -> CompositionResult<Vec<Arc<dyn ComposablePartDefinition>>> {
        Ok(self
            .inner
            .parts()?
            .iter()
            .filter(|&part| self.accepts(&**part))
            .cloned()
            .collect())
    }
}

impl CompositionElement for FilteredCatalog {
    fn display_name(&self) -> String {
        if self.negated {
            "FilteredCatalog (Complement)".to_string()
        } else {
            "FilteredCatalog".to_string()
        }
    }
}

impl fmt::Debug for FilteredCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredCatalog")
            .field("state", &self.state)
            .field("negated", &self.negated)
            .finish()
    }
}
