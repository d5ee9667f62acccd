// Copyright 2025 Cowboy AI, LLC.

//! Export definitions

use std::fmt;
use std::sync::Arc;

use crate::errors::{CompositionError, CompositionResult};
use crate::metadata::{Metadata, MetadataValue, CREATION_POLICY_METADATA_KEY};
use crate::policy::CreationPolicy;

/// An immutable (contract name, metadata) pair describing one capability
///
/// Clones share identity: two handles are equal only when they refer to the
/// same definition, never because their contents happen to match.
#[derive(Clone)]
pub struct ExportDefinition {
    inner: Arc<ExportDefinitionInner>,
}

struct ExportDefinitionInner {
    contract_name: String,
    metadata: Metadata,
}

impl ExportDefinition {
    /// Create an export definition
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if `contract_name` is empty
    pub fn new(contract_name: impl Into<String>, metadata: Metadata) -> CompositionResult<Self> {
        let contract_name = contract_name.into();
        if contract_name.is_empty() {
            return Err(CompositionError::invalid_argument(
                "contract_name",
                "export contract name must not be empty",
            ));
        }
        Ok(Self {
            inner: Arc::new(ExportDefinitionInner {
                contract_name,
                metadata,
            }),
        })
    }

    /// Create an export definition with no metadata
    pub fn for_contract(contract_name: impl Into<String>) -> CompositionResult<Self> {
        Self::new(contract_name, Metadata::empty())
    }

    /// The contract name
    pub fn contract_name(&self) -> &str {
        &self.inner.contract_name
    }

    /// The metadata
    pub fn metadata(&self) -> &Metadata {
        &self.inner.metadata
    }

    /// The declared creation policy, if the metadata carries a recognized one
    pub fn creation_policy(&self) -> Option<CreationPolicy> {
        self.metadata()
            .get(CREATION_POLICY_METADATA_KEY)
            .and_then(MetadataValue::as_creation_policy)
    }

    /// A new definition with the same contract and one extra metadata entry
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self {
            inner: Arc::new(ExportDefinitionInner {
                contract_name: self.inner.contract_name.clone(),
                metadata: self.inner.metadata.with(key, value),
            }),
        }
    }

    /// Whether both handles refer to the same definition
    pub fn ptr_eq(&self, other: &ExportDefinition) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ExportDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ExportDefinition {}

impl fmt::Display for ExportDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.contract_name())
    }
}

impl fmt::Debug for ExportDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportDefinition")
            .field("contract_name", &self.contract_name())
            .field("metadata", self.metadata())
            .finish()
    }
}
