// Copyright 2025 Cowboy AI, LLC.

//! Export, import and part definitions
//!
//! ```mermaid
//! graph LR
//!     I[ImportDefinition] -->|is_constraint_satisfied_by| E[ExportDefinition]
//!     P[ComposablePartDefinition] -->|owns| E
//!     P -->|owns| I
//! ```

pub mod contract;
pub mod export;
pub mod import;
pub mod part;

pub use contract::{ContractBasedImportDefinition, RequiredMetadataItem};
pub use export::ExportDefinition;
pub use import::{Constraint, ImportDefinition, PredicateImportDefinition};
pub use part::{
    ComposablePart, ComposablePartDefinition, ExportMatch, InstancePart, PartDefinition,
    PartDefinitionExt, PartFactory,
};
