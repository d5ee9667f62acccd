// Copyright 2025 Cowboy AI, LLC.

//! In-memory catalog of part definitions

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{CatalogState, ComposablePartCatalog};
use crate::definition::part::ComposablePartDefinition;
use crate::element::CompositionElement;
use crate::errors::CompositionResult;

/// A catalog over a fixed, ordered list of part definitions
pub struct PartCatalog {
    state: CatalogState,
    parts: Vec<Arc<dyn ComposablePartDefinition>>,
}

impl PartCatalog {
    /// Create a catalog holding `parts` in the given order
    pub fn new(parts: impl IntoIterator<Item = Arc<dyn ComposablePartDefinition>>) -> Self {
        let parts: Vec<_> = parts.into_iter().collect();
        debug!(parts = parts.len(), "part catalog created");
        Self {
            state: CatalogState::new("PartCatalog"),
            parts,
        }
    }

    /// An empty catalog
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl ComposablePartCatalog for PartCatalog {
    fn state(&self) -> &CatalogState {
        &self.state
    }

    fn enumerate_parts(&self) -> CompositionResult<Vec<Arc<dyn ComposablePartDefinition>>> {
        Ok(self.parts.clone())
    }
}

impl CompositionElement for PartCatalog {
    fn display_name(&self) -> String {
        format!("PartCatalog (Parts = {})", self.parts.len())
    }
}

impl fmt::Debug for PartCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartCatalog")
            .field("state", &self.state)
            .field("parts", &self.parts)
            .finish()
    }
}
