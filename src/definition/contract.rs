// Copyright 2025 Cowboy AI, LLC.

//! Contract-based import definitions
//!
//! The constraint of a [`ContractBasedImportDefinition`] is synthesized from
//! four fields. Matching checks them cheapest first and stops at the first
//! failure:
//!
//! 1. contract name, compared ordinally
//! 2. required type identity against [`EXPORT_TYPE_IDENTITY_METADATA_KEY`]
//! 3. every required metadata key, with a kind check on its value
//! 4. required creation policy against [`CREATION_POLICY_METADATA_KEY`]

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::definition::export::ExportDefinition;
use crate::definition::import::{Constraint, ImportDefinition};
use crate::errors::{CompositionError, CompositionResult};
use crate::metadata::{
    Metadata, MetadataType, CREATION_POLICY_METADATA_KEY, EXPORT_TYPE_IDENTITY_METADATA_KEY,
};
use crate::policy::{CreationPolicy, ImportCardinality};
use crate::publish::Published;

/// A metadata key an export must carry, and the type its value must have
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredMetadataItem {
    key: String,
    required_type: MetadataType,
}

impl RequiredMetadataItem {
    /// Create a requirement
    pub fn new(key: impl Into<String>, required_type: MetadataType) -> Self {
        Self {
            key: key.into(),
            required_type,
        }
    }

    /// The metadata key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The type the value must have
    pub fn required_type(&self) -> &MetadataType {
        &self.required_type
    }
}

#[derive(Clone)]
struct ContractRequirements {
    contract_name: String,
    required_type_identity: Option<String>,
    required_metadata: Vec<RequiredMetadataItem>,
    required_creation_policy: CreationPolicy,
}

impl ContractRequirements {
    fn matches(&self, export: &ExportDefinition) -> bool {
        if export.contract_name() != self.contract_name {
            return false;
        }

        if let Some(identity) = self.required_type_identity.as_deref() {
            if !identity.is_empty() && export.metadata().type_identity() != Some(identity) {
                return false;
            }
        }

        if !self.required_metadata.iter().all(|item| {
            export
                .metadata()
                .get(&item.key)
                .is_some_and(|value| item.required_type.is_instance(value))
        }) {
            return false;
        }

        self.matches_creation_policy(export)
    }

    fn matches_creation_policy(&self, export: &ExportDefinition) -> bool {
        if self.required_creation_policy == CreationPolicy::Any {
            return true;
        }
        match export.metadata().get(CREATION_POLICY_METADATA_KEY) {
            None => true,
            Some(value) => match value.as_creation_policy() {
                Some(declared) => declared.is_compatible_with(self.required_creation_policy),
                None => {
                    warn!(
                        contract = export.contract_name(),
                        value = %value,
                        "unrecognized creation policy in export metadata"
                    );
                    false
                }
            },
        }
    }

    fn describe(&self) -> String {
        let mut clauses = vec![format!(
            "(exportDefinition.ContractName == {:?})",
            self.contract_name
        )];

        if let Some(identity) = self.required_type_identity.as_deref().filter(|s| !s.is_empty()) {
            clauses.push(format!(
                "(exportDefinition.Metadata[{EXPORT_TYPE_IDENTITY_METADATA_KEY:?}] == {identity:?})"
            ));
        }

        for item in &self.required_metadata {
            clauses.push(format!(
                "exportDefinition.Metadata.ContainsKey({:?})",
                item.key
            ));
            clauses.push(format!(
                "(exportDefinition.Metadata[{:?}] is {})",
                item.key, item.required_type
            ));
        }

        if self.required_creation_policy != CreationPolicy::Any {
            clauses.push(format!(
                "exportDefinition.Metadata[{CREATION_POLICY_METADATA_KEY:?}] in [Any, {}]",
                self.required_creation_policy
            ));
        }

        format!("exportDefinition => {}", clauses.join(" && "))
    }
}

/// An import matched by contract name, type identity, metadata and policy
///
/// Required metadata is validated once, on first use, rather than at
/// construction. The synthesized [`Constraint`] is built on first access and
/// shared afterwards.
pub struct ContractBasedImportDefinition {
    requirements: Arc<ContractRequirements>,
    cardinality: ImportCardinality,
    is_recomposable: bool,
    is_prerequisite: bool,
    metadata: Metadata,
    metadata_validated: AtomicBool,
    constraint: Published<Constraint>,
}

impl ContractBasedImportDefinition {
    /// Create an import for `contract_name` with default settings
    ///
    /// Defaults: no type identity, no required metadata, `ExactlyOne`,
    /// not recomposable, prerequisite, creation policy `Any`.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if `contract_name` is empty
    pub fn new(contract_name: impl Into<String>) -> CompositionResult<Self> {
        let contract_name = contract_name.into();
        if contract_name.is_empty() {
            return Err(CompositionError::invalid_argument(
                "contract_name",
                "import contract name must not be empty",
            ));
        }
        Ok(Self {
            requirements: Arc::new(ContractRequirements {
                contract_name,
                required_type_identity: None,
                required_metadata: Vec::new(),
                required_creation_policy: CreationPolicy::Any,
            }),
            cardinality: ImportCardinality::ExactlyOne,
            is_recomposable: false,
            is_prerequisite: true,
            metadata: Metadata::empty(),
            metadata_validated: AtomicBool::new(false),
            constraint: Published::new(),
        })
    }

    fn requirements_mut(&mut self) -> &mut ContractRequirements {
        self.constraint = Published::new();
        *self.metadata_validated.get_mut() = false;
        Arc::make_mut(&mut self.requirements)
    }

    /// Require the export's type identity
    pub fn with_required_type_identity(mut self, identity: impl Into<String>) -> Self {
        self.requirements_mut().required_type_identity = Some(identity.into());
        self
    }

    /// Require a metadata key with a value of the given type
    pub fn with_required_metadata(
        mut self,
        key: impl Into<String>,
        required_type: MetadataType,
    ) -> Self {
        self.requirements_mut()
            .required_metadata
            .push(RequiredMetadataItem::new(key, required_type));
        self
    }

    /// Require a creation policy
    pub fn with_required_creation_policy(mut self, policy: CreationPolicy) -> Self {
        self.requirements_mut().required_creation_policy = policy;
        self
    }

    /// Set the cardinality
    pub fn with_cardinality(mut self, cardinality: ImportCardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Mark the import recomposable
    pub fn recomposable(mut self, is_recomposable: bool) -> Self {
        self.is_recomposable = is_recomposable;
        self
    }

    /// Mark the import as a prerequisite
    pub fn prerequisite(mut self, is_prerequisite: bool) -> Self {
        self.is_prerequisite = is_prerequisite;
        self
    }

    /// Attach metadata describing the import
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The required type identity, if any
    pub fn required_type_identity(&self) -> Option<&str> {
        self.requirements.required_type_identity.as_deref()
    }

    /// The required creation policy
    pub fn required_creation_policy(&self) -> CreationPolicy {
        self.requirements.required_creation_policy
    }

    /// The required metadata, validated on first call
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::NullRequiredMetadataElement`] for the
    /// first entry with an empty key
    pub fn required_metadata(&self) -> CompositionResult<&[RequiredMetadataItem]> {
        if !self.metadata_validated.load(Ordering::Acquire) {
            self.validate_required_metadata()?;
            // A racing reader may validate too; validation is pure.
            self.metadata_validated.store(true, Ordering::Release);
        }
        Ok(&self.requirements.required_metadata)
    }

    fn validate_required_metadata(&self) -> CompositionResult<()> {
        for (index, item) in self.requirements.required_metadata.iter().enumerate() {
            if item.key.is_empty() {
                warn!(
                    contract = %self.requirements.contract_name,
                    index,
                    "required metadata element has no key"
                );
                return Err(CompositionError::NullRequiredMetadataElement { index });
            }
        }
        Ok(())
    }
}

impl ImportDefinition for ContractBasedImportDefinition {
    fn contract_name(&self) -> &str {
        &self.requirements.contract_name
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
        self.required_metadata()?;
        let constraint = self.constraint.get_or_publish(|| {
            let requirements = Arc::clone(&self.requirements);
            Constraint::new(requirements.describe(), move |export| {
                requirements.matches(export)
            })
        });
        Ok(Constraint::clone(&constraint))
    }

    fn is_constraint_satisfied_by(&self, export: &ExportDefinition) -> CompositionResult<bool> {
        self.required_metadata()?;
        Ok(self.requirements.matches(export))
    }

    fn describe(&self) -> String {
        self.requirements.describe()
    }
}

impl fmt::Display for ContractBasedImportDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.requirements.describe())
    }
}

impl fmt::Debug for ContractBasedImportDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractBasedImportDefinition")
            .field("contract_name", &self.requirements.contract_name)
            .field("required_type_identity", &self.requirements.required_type_identity)
            .field("required_metadata", &self.requirements.required_metadata)
            .field("required_creation_policy", &self.requirements.required_creation_policy)
            .field("cardinality", &self.cardinality)
            .finish()
    }
}
