// Copyright 2025 Cowboy AI, LLC.

//! Import definitions and constraints
//!
//! An import states what a part requires. Its [`Constraint`] is a
//! deterministic predicate over [`ExportDefinition`]s; catalogs only ever
//! ask the import whether an export satisfies it, never the reverse.

use std::fmt;
use std::sync::Arc;

use crate::definition::export::ExportDefinition;
use crate::errors::{CompositionError, CompositionResult};
use crate::metadata::Metadata;
use crate::policy::ImportCardinality;

type Predicate = dyn Fn(&ExportDefinition) -> bool + Send + Sync;

/// A compiled import constraint with its textual form
///
/// Cloning shares the compiled predicate.
#[derive(Clone)]
pub struct Constraint {
    description: Arc<str>,
    predicate: Arc<Predicate>,
}

impl Constraint {
    /// Compile a constraint from a predicate and a description of it
    pub fn new<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ExportDefinition) -> bool + Send + Sync + 'static,
    {
        Self {
            description: Arc::from(description.into()),
            predicate: Arc::new(predicate),
        }
    }

    /// A constraint matching exports with exactly this contract name
    pub fn contract_name(contract_name: impl Into<String>) -> Self {
        let contract_name = contract_name.into();
        let description = format!("exportDefinition => (exportDefinition.ContractName == {contract_name:?})");
        Self::new(description, move |export| export.contract_name() == contract_name)
    }

    /// Evaluate the constraint
    pub fn is_satisfied_by(&self, export: &ExportDefinition) -> bool {
        (self.predicate)(export)
    }

    /// The textual form of the constraint
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether both handles share the same compiled predicate
    pub fn ptr_eq(&self, other: &Constraint) -> bool {
        Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constraint").field(&self.description).finish()
    }
}

/// A requirement a part places on the exports it will receive
///
/// Every member has a default so that implementors only supply what they
/// refine. An implementation that provides neither [`ImportDefinition::constraint`]
/// nor its own [`ImportDefinition::is_constraint_satisfied_by`] fails with
/// [`CompositionError::NotOverridden`] on first use.
pub trait ImportDefinition: Send + Sync {
    /// Contract name; empty means any contract
    fn contract_name(&self) -> &str {
        ""
    }

    /// How many exports the import expects
    fn cardinality(&self) -> ImportCardinality {
        ImportCardinality::ExactlyOne
    }

    /// Whether bound exports may change after initial composition
    fn is_recomposable(&self) -> bool {
        false
    }

    /// Whether the import must be satisfied before the part is used
    fn is_prerequisite(&self) -> bool {
        true
    }

    /// Metadata describing the import itself
    fn metadata(&self) -> &Metadata {
        Metadata::empty_ref()
    }

    /// The constraint exports must satisfy
    fn constraint(&self) -> CompositionResult<Constraint> {
        Err(CompositionError::not_overridden("ImportDefinition::constraint"))
    }

    /// Whether `export` satisfies this import
    fn is_constraint_satisfied_by(&self, export: &ExportDefinition) -> CompositionResult<bool> {
        Ok(self.constraint()?.is_satisfied_by(export))
    }

    /// Text used when rendering the import for diagnostics
    fn describe(&self) -> String {
        match self.constraint() {
            Ok(constraint) => constraint.description().to_string(),
            Err(_) => self.contract_name().to_string(),
        }
    }
}

impl fmt::Display for dyn ImportDefinition + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Debug for dyn ImportDefinition + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportDefinition")
            .field("contract_name", &self.contract_name())
            .field("cardinality", &self.cardinality())
            .field("constraint", &self.describe())
            .finish()
    }
}

/// An import defined directly by a constraint
pub struct PredicateImportDefinition {
    constraint: Constraint,
    contract_name: String,
    cardinality: ImportCardinality,
    is_recomposable: bool,
    is_prerequisite: bool,
    metadata: Metadata,
}

impl PredicateImportDefinition {
    /// Create an import from a constraint
    ///
    /// `contract_name` may be empty, in which case indexed catalogs consider
    /// every part a candidate.
    pub fn new(
        constraint: Constraint,
        contract_name: impl Into<String>,
        cardinality: ImportCardinality,
        is_recomposable: bool,
        is_prerequisite: bool,
    ) -> Self {
        Self {
            constraint,
            contract_name: contract_name.into(),
            cardinality,
            is_recomposable,
            is_prerequisite,
            metadata: Metadata::empty(),
        }
    }

    /// Create an import from a raw cardinality value
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::InvalidCardinality`] if `cardinality` is
    /// not one of the three legal values
    pub fn from_raw_cardinality(
        constraint: Constraint,
        contract_name: impl Into<String>,
        cardinality: i64,
        is_recomposable: bool,
        is_prerequisite: bool,
    ) -> CompositionResult<Self> {
        let cardinality = ImportCardinality::try_from(cardinality)?;
        Ok(Self::new(
            constraint,
            contract_name,
            cardinality,
            is_recomposable,
            is_prerequisite,
        ))
    }

    /// Attach metadata to the import
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl ImportDefinition for PredicateImportDefinition {
    fn contract_name(&self) -> &str {
        &self.contract_name
    }

    fn cardinality(&self) -> ImportCardinality {
        self.cardinality
    }

    fn is_recomposable(&self) -> bool {
        self.is_recomposable
    }

    fn is_prerequisite(&self) -> bool {
        self.is_prerequisite
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn constraint(&self) -> CompositionResult<Constraint> {
        Ok(self.constraint.clone())
    }

    fn is_constraint_satisfied_by(&self, export: &ExportDefinition) -> CompositionResult<bool> {
        Ok(self.constraint.is_satisfied_by(export))
    }
}
