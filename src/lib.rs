//! # CIM Composition
//!
//! Export/import contract matching for composable part catalogs.
//!
//! A catalog holds *part definitions*. Each part declares *exports* (contracts
//! it offers) and *imports* (contracts it needs). Given an import, a catalog
//! answers which `(part, export)` pairs satisfy it:
//! - **Definitions**: [`ExportDefinition`], [`ImportDefinition`],
//!   [`ContractBasedImportDefinition`], [`PartDefinition`]
//! - **Catalogs**: [`PartCatalog`], [`ContractIndexedCatalog`],
//!   [`AggregateCatalog`], [`FilteredCatalog`]
//! - **Values**: [`Export`] with memoized, lazily produced values
//! - **Delegates**: [`ExportedDelegate`] binding exported methods to a shape
//! - **Manifests**: [`CatalogManifest`] for catalogs declared as data
//!
//! ## Design Principles
//!
//! 1. **Immutable definitions**: definitions never change after construction
//!    and are freely shared across threads
//! 2. **Lazy, publish-once caches**: constraints, part lists and export values
//!    are computed on first use and published without locks
//! 3. **Ordered results**: matches follow catalog order, then declaration order
//! 4. **No allocation for misses**: an unmatched query returns an empty `Vec`
//!
//! ```
//! use std::sync::Arc;
//! use cim_composition::{
//!     ComposablePartCatalog, ContractBasedImportDefinition, ExportDefinition, PartCatalog,
//!     PartDefinition,
//! };
//!
//! let logger = PartDefinition::new("ConsoleLogger")
//!     .with_export(ExportDefinition::for_contract("Logging.ILogger")?)
//!     .into_shared();
//! let catalog = PartCatalog::new(vec![Arc::clone(&logger)]);
//!
//! let import = ContractBasedImportDefinition::new("Logging.ILogger")?;
//! let matches = catalog.get_exports(&import)?;
//! assert_eq!(matches.len(), 1);
//! assert!(matches[0].is_from(&logger));
//! # Ok::<(), cim_composition::CompositionError>(())
//! ```

#![warn(missing_docs)]

mod delegate;
mod element;
mod errors;
mod export;
mod metadata;
mod policy;
mod publish;
pub mod catalog;
pub mod definition;
pub mod manifest;

// Re-export core types
pub use catalog::{
    AggregateCatalog, CatalogState, ComposablePartCatalog, ContractIndexedCatalog,
    FilteredCatalog, PartCatalog, PartFilter, PartsView,
};
pub use definition::{
    ComposablePart, ComposablePartDefinition, Constraint, ContractBasedImportDefinition,
    ExportDefinition, ExportMatch, ImportDefinition, InstancePart, PartDefinition,
    PartDefinitionExt, PartFactory, PredicateImportDefinition, RequiredMetadataItem,
};
pub use delegate::{
    BoundDelegate, DelegateShape, DelegateSignature, DelegateTarget, ExportedDelegate,
    MethodDescriptor,
};
pub use element::{CompositionElement, CompositionElementInfo};
pub use errors::{ComposablePartError, CompositionError, CompositionResult};
pub use export::{Export, ExportedObject};
pub use manifest::{CatalogManifest, ExportManifest, ImportManifest, PartManifest};
pub use metadata::{
    Metadata, MetadataType, MetadataValue, CREATION_POLICY_METADATA_KEY,
    EXPORT_TYPE_IDENTITY_METADATA_KEY,
};
pub use policy::{CreationPolicy, ImportCardinality};
pub use publish::Published;
