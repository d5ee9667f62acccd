// Copyright 2025 Cowboy AI, LLC.

//! Declarative catalog manifests
//!
//! A manifest describes parts, their exports and their imports as data, so a
//! host can build a catalog from configuration instead of code.
//!
//! ```json
//! {
//!   "indexed": true,
//!   "parts": [{
//!     "name": "ConsoleLogger",
//!     "exports": [{ "contract_name": "Logging.ILogger", "metadata": { "Level": "Info" } }],
//!     "imports": [{ "contract_name": "Formatting.IFormatter", "cardinality": "ZeroOrOne" }]
//!   }]
//! }
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{ComposablePartCatalog, ContractIndexedCatalog, PartCatalog};
use crate::definition::contract::ContractBasedImportDefinition;
use crate::definition::export::ExportDefinition;
use crate::definition::part::{ComposablePartDefinition, PartDefinition};
use crate::element::CompositionElementInfo;
use crate::errors::{CompositionError, CompositionResult};
use crate::metadata::{Metadata, MetadataType};
use crate::policy::{CreationPolicy, ImportCardinality};

/// A whole catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// Parts in catalog order
    #[serde(default)]
    pub parts: Vec<PartManifest>,
    /// Build a [`ContractIndexedCatalog`] instead of a [`PartCatalog`]
    #[serde(default)]
    pub indexed: bool,
}

/// One part definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartManifest {
    /// Display name of the part
    pub name: String,
    /// Where the part was declared, for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Part metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation policy of the part; overrides one given in `metadata`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_policy: Option<CreationPolicy>,
    /// Exports in declaration order
    #[serde(default)]
    pub exports: Vec<ExportManifest>,
    /// Imports in declaration order
    #[serde(default)]
    pub imports: Vec<ImportManifest>,
}

/// One export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Contract name; must not be empty
    pub contract_name: String,
    /// Export metadata
    #[serde(default)]
    pub metadata: Metadata,
}

/// One contract-based import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportManifest {
    /// Contract name; must not be empty
    pub contract_name: String,
    /// Required `ExportTypeIdentity`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_type_identity: Option<String>,
    /// Required metadata keys and their types
    #[serde(default)]
    pub required_metadata: IndexMap<String, MetadataType>,
    /// How many exports the import accepts
    #[serde(default)]
    pub cardinality: ImportCardinality,
    /// Required creation policy
    #[serde(default)]
    pub creation_policy: CreationPolicy,
    /// Whether the import may be satisfied again after composition
    #[serde(default)]
    pub recomposable: bool,
    /// Whether the import must be satisfied before activation
    #[serde(default = "default_prerequisite")]
    pub prerequisite: bool,
}

fn default_prerequisite() -> bool {
    true
}

impl CatalogManifest {
    /// Parse a manifest from JSON text
    pub fn from_json(json: &str) -> CompositionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a manifest from an already decoded JSON value
    pub fn from_value(value: serde_json::Value) -> CompositionResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize the manifest as pretty JSON
    pub fn to_json(&self) -> CompositionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the part definitions, validating every entry
    ///
    /// # Errors
    ///
    /// The same argument errors as building the definitions in code, wrapped
    /// with the position of the offending part
    pub fn part_definitions(&self) -> CompositionResult<Vec<Arc<dyn ComposablePartDefinition>>> {
        self.parts
            .iter()
            .enumerate()
            .map(|(index, part)| {
                part.to_definition().map_err(|err| {
                    CompositionError::Manifest(format!("part {index} ({}): {err}", part.name))
                })
            })
            .collect()
    }

    /// Build the catalog the manifest describes
    pub fn into_catalog(self) -> CompositionResult<Arc<dyn ComposablePartCatalog>> {
        let parts = self.part_definitions()?;
        debug!(parts = parts.len(), indexed = self.indexed, "catalog built from manifest");
        if self.indexed {
            Ok(Arc::new(ContractIndexedCatalog::new(parts)))
        } else {
            Ok(Arc::new(PartCatalog::new(parts)))
        }
    }
}

impl PartManifest {
    /// Build the part definition
    pub fn to_definition(&self) -> CompositionResult<Arc<dyn ComposablePartDefinition>> {
        if self.name.is_empty() {
            return Err(CompositionError::invalid_argument("name", "part name must not be empty"));
        }
        let mut part = PartDefinition::new(self.name.clone()).with_metadata(self.metadata.clone());
        if let Some(policy) = self.creation_policy {
            part = part.with_creation_policy(policy);
        }
        if let Some(origin) = &self.origin {
            part = part.with_origin(CompositionElementInfo::new(origin.clone()));
        }
        for export in &self.exports {
            part = part.with_export(export.to_definition()?);
        }
        for import in &self.imports {
            part = part.with_import(import.to_definition()?);
        }
        Ok(part.into_shared())
    }
}

impl ExportManifest {
    /// Build the export definition
    pub fn to_definition(&self) -> CompositionResult<ExportDefinition> {
        ExportDefinition::new(self.contract_name.clone(), self.metadata.clone())
    }
}

impl ImportManifest {
    /// Build the import definition
    ///
    /// Required metadata is checked here rather than on first match.
    pub fn to_definition(&self) -> CompositionResult<ContractBasedImportDefinition> {
        let mut import = ContractBasedImportDefinition::new(self.contract_name.clone())?
            .with_cardinality(self.cardinality)
            .with_required_creation_policy(self.creation_policy)
            .recomposable(self.recomposable)
            .prerequisite(self.prerequisite);
        if let Some(identity) = &self.required_type_identity {
            import = import.with_required_type_identity(identity.clone());
        }
        for (key, required_type) in &self.required_metadata {
            import = import.with_required_metadata(key.clone(), required_type.clone());
        }
        import.required_metadata()?;
        Ok(import)
    }
}
