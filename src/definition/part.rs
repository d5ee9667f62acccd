// Copyright 2025 Cowboy AI, LLC.

//! Composable part definitions
//!
//! A part definition owns the exports and imports of one part and answers
//! which of its exports satisfy a given import. Providers implement
//! [`ComposablePartDefinition`]; [`PartDefinition`] is the in-memory
//! implementation used by catalogs built in code or from manifests.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::definition::export::ExportDefinition;
use crate::definition::import::ImportDefinition;
use crate::element::{CompositionElement, CompositionElementInfo};
use crate::errors::{CompositionError, CompositionResult};
use crate::export::{Export, ExportedObject};
use crate::metadata::{Metadata, CREATION_POLICY_METADATA_KEY};
use crate::policy::CreationPolicy;

/// An activated part produced by a part definition
pub trait ComposablePart: Send + Sync {
    /// Exports the part provides
    fn export_definitions(&self) -> &[ExportDefinition];

    /// Imports the part requires
    fn import_definitions(&self) -> &[Arc<dyn ImportDefinition>];

    /// Metadata of the part
    fn metadata(&self) -> &Metadata {
        Metadata::empty_ref()
    }

    /// Produce the value behind one of this part's exports
    fn get_exported_value(&self, definition: &ExportDefinition) -> CompositionResult<ExportedObject>;

    /// Bind exports to one of this part's imports
    fn set_import(
        &mut self,
        definition: &dyn ImportDefinition,
        exports: Vec<Export>,
    ) -> CompositionResult<()>;

    /// Called once every prerequisite import has been set
    fn activate(&mut self) -> CompositionResult<()> {
        Ok(())
    }
}

/// The static description of a part
pub trait ComposablePartDefinition: CompositionElement + Send + Sync {
    /// Exports in declaration order; must be stable for the object's lifetime
    fn export_definitions(&self) -> &[ExportDefinition];

    /// Imports in declaration order; must be stable for the object's lifetime
    fn import_definitions(&self) -> &[Arc<dyn ImportDefinition>];

    /// Metadata of the part
    fn metadata(&self) -> &Metadata {
        Metadata::empty_ref()
    }

    /// Create a new part from this definition
    fn create_part(&self) -> CompositionResult<Box<dyn ComposablePart>>;

    /// Exports of this part that satisfy `import`, in declaration order
    ///
    /// A single scan; each export is tested once. No allocation happens
    /// unless something matches.
    fn matching_exports(
        &self,
        import: &dyn ImportDefinition,
    ) -> CompositionResult<Vec<ExportDefinition>> {
        let mut matches = Vec::new();
        for export in self.export_definitions() {
            if import.is_constraint_satisfied_by(export)? {
                matches.push(export.clone());
            }
        }
        Ok(matches)
    }
}

impl fmt::Debug for dyn ComposablePartDefinition + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposablePartDefinition")
            .field("name", &self.display_name())
            .field("exports", &self.export_definitions())
            .field("imports", &self.import_definitions().len())
            .finish()
    }
}

/// A (part definition, export definition) pair returned by queries
#[derive(Clone)]
pub struct ExportMatch {
    part: Arc<dyn ComposablePartDefinition>,
    export: ExportDefinition,
}

impl ExportMatch {
    /// Pair a part with one of its exports
    pub fn new(part: Arc<dyn ComposablePartDefinition>, export: ExportDefinition) -> Self {
        Self { part, export }
    }

    /// The part definition
    pub fn part(&self) -> &Arc<dyn ComposablePartDefinition> {
        &self.part
    }

    /// The export definition
    pub fn export(&self) -> &ExportDefinition {
        &self.export
    }

    /// Whether this match refers to `part`
    pub fn is_from(&self, part: &Arc<dyn ComposablePartDefinition>) -> bool {
        Arc::ptr_eq(&self.part, part)
    }
}

impl fmt::Debug for ExportMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportMatch")
            .field("part", &self.part.display_name())
            .field("export", &self.export.contract_name())
            .finish()
    }
}

/// Queries on shared part definitions
pub trait PartDefinitionExt {
    /// `(part, export)` pairs for every export of this part that satisfies `import`
    fn get_exports(&self, import: &dyn ImportDefinition) -> CompositionResult<Vec<ExportMatch>>;
}

impl PartDefinitionExt for Arc<dyn ComposablePartDefinition> {
    fn get_exports(&self, import: &dyn ImportDefinition) -> CompositionResult<Vec<ExportMatch>> {
        Ok(self
            .matching_exports(import)?
            .into_iter()
            .map(|export| ExportMatch::new(Arc::clone(self), export))
            .collect())
    }
}

/// Builds a part from its definition
pub type PartFactory =
    Arc<dyn Fn(&PartDefinition) -> CompositionResult<Box<dyn ComposablePart>> + Send + Sync>;

/// In-memory part definition
///
/// # Example
///
/// ```
/// use cim_composition::{ExportDefinition, PartDefinition, CreationPolicy};
///
/// let part = PartDefinition::new("Logging.ConsoleLogger")
///     .with_export(ExportDefinition::for_contract("Logging.ILogger").unwrap())
///     .with_creation_policy(CreationPolicy::Shared);
///
/// assert_eq!(part.exports().len(), 1);
/// assert_eq!(
///     part.exports()[0].creation_policy(),
///     Some(CreationPolicy::Shared)
/// );
/// ```
#[derive(Clone)]
pub struct PartDefinition {
    name: String,
    origin: Option<CompositionElementInfo>,
    exports: Vec<ExportDefinition>,
    imports: Vec<Arc<dyn ImportDefinition>>,
    metadata: Metadata,
    creation_policy: Option<CreationPolicy>,
    factory: Option<PartFactory>,
}

impl PartDefinition {
    /// Create an empty definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: None,
            exports: Vec::new(),
            imports: Vec::new(),
            metadata: Metadata::empty(),
            creation_policy: None,
            factory: None,
        }
    }

    /// Add an export
    pub fn with_export(mut self, export: ExportDefinition) -> Self {
        let export = self.stamp_policy(export);
        self.exports.push(export);
        self
    }

    /// Add several exports
    pub fn with_exports(mut self, exports: impl IntoIterator<Item = ExportDefinition>) -> Self {
        for export in exports {
            self = self.with_export(export);
        }
        self
    }

    /// Add an import
    pub fn with_import(mut self, import: impl ImportDefinition + 'static) -> Self {
        self.imports.push(Arc::new(import));
        self
    }

    /// Add an already shared import
    pub fn with_shared_import(mut self, import: Arc<dyn ImportDefinition>) -> Self {
        self.imports.push(import);
        self
    }

    /// Set the part metadata
    ///
    /// A recognized creation policy in `metadata` is applied as if passed to
    /// [`PartDefinition::with_creation_policy`]. Otherwise a policy set
    /// earlier is kept.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        let declared = metadata
            .get(CREATION_POLICY_METADATA_KEY)
            .and_then(|value| value.as_creation_policy());
        self.metadata = metadata;
        match declared.or(self.creation_policy) {
            Some(policy) => self.with_creation_policy(policy),
            None => self,
        }
    }

    /// Record where the definition came from
    pub fn with_origin(mut self, origin: CompositionElementInfo) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Declare the creation policy of the part
    ///
    /// The policy is written to the part metadata and to every export that
    /// does not declare its own.
    pub fn with_creation_policy(mut self, policy: CreationPolicy) -> Self {
        self.creation_policy = Some(policy);
        self.metadata = self.metadata.with(CREATION_POLICY_METADATA_KEY, policy);
        let exports = std::mem::take(&mut self.exports);
        self.exports = exports.into_iter().map(|e| self.stamp_policy(e)).collect();
        self
    }

    /// Supply the factory used by [`ComposablePartDefinition::create_part`]
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&PartDefinition) -> CompositionResult<Box<dyn ComposablePart>> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Share the definition as a trait object
    pub fn into_shared(self) -> Arc<dyn ComposablePartDefinition> {
        Arc::new(self)
    }

    /// Name of the part
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exports in declaration order
    pub fn exports(&self) -> &[ExportDefinition] {
        &self.exports
    }

    /// The declared creation policy
    pub fn creation_policy(&self) -> CreationPolicy {
        self.creation_policy.unwrap_or_default()
    }

    fn stamp_policy(&self, export: ExportDefinition) -> ExportDefinition {
        match self.creation_policy {
            Some(policy) if !export.metadata().contains_key(CREATION_POLICY_METADATA_KEY) => {
                export.with_metadata(CREATION_POLICY_METADATA_KEY, policy)
            }
            _ => export,
        }
    }
}

impl CompositionElement for PartDefinition {
    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn origin(&self) -> Option<&dyn CompositionElement> {
        self.origin.as_ref().map(|o| o as &dyn CompositionElement)
    }
}

impl ComposablePartDefinition for PartDefinition {
    fn export_definitions(&self) -> &[ExportDefinition] {
        &self.exports
    }

    fn import_definitions(&self) -> &[Arc<dyn ImportDefinition>] {
        &self.imports
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn create_part(&self) -> CompositionResult<Box<dyn ComposablePart>> {
        match &self.factory {
            Some(factory) => factory(self),
            None => Err(CompositionError::not_overridden("create_part")),
        }
    }
}

impl fmt::Debug for PartDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartDefinition")
            .field("name", &self.name)
            .field("exports", &self.exports)
            .field("imports", &self.imports.len())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// A part whose exported values are fixed instances keyed by contract name
pub struct InstancePart {
    exports: Vec<ExportDefinition>,
    imports: Vec<Arc<dyn ImportDefinition>>,
    metadata: Metadata,
    values: IndexMap<String, ExportedObject>,
    satisfied: IndexMap<String, Vec<Export>>,
    activated: bool,
}

impl InstancePart {
    /// Create a part mirroring `definition` with no values yet
    pub fn from_definition(definition: &PartDefinition) -> Self {
        Self {
            exports: definition.exports.clone(),
            imports: definition.imports.clone(),
            metadata: definition.metadata.clone(),
            values: IndexMap::new(),
            satisfied: IndexMap::new(),
            activated: false,
        }
    }

    /// Provide the value for a contract
    pub fn with_value<T: Any + Send + Sync>(mut self, contract_name: impl Into<String>, value: T) -> Self {
        self.values
            .insert(contract_name.into(), Some(Arc::new(value) as Arc<dyn Any + Send + Sync>));
        self
    }

    /// Exports bound to the import with this contract name
    pub fn imported(&self, contract_name: &str) -> Option<&[Export]> {
        self.satisfied.get(contract_name).map(Vec::as_slice)
    }

    /// Whether [`ComposablePart::activate`] has run
    pub fn is_activated(&self) -> bool {
        self.activated
    }
}

impl ComposablePart for InstancePart {
    fn export_definitions(&self) -> &[ExportDefinition] {
        &self.exports
    }

    fn import_definitions(&self) -> &[Arc<dyn ImportDefinition>] {
        &self.imports
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn get_exported_value(&self, definition: &ExportDefinition) -> CompositionResult<ExportedObject> {
        if !self.exports.iter().any(|e| e.ptr_eq(definition)) {
            return Err(CompositionError::invalid_argument(
                "definition",
                format!("{} is not an export of this part", definition.contract_name()),
            ));
        }
        Ok(self
            .values
            .get(definition.contract_name())
            .cloned()
            .flatten())
    }

    fn set_import(
        &mut self,
        definition: &dyn ImportDefinition,
        exports: Vec<Export>,
    ) -> CompositionResult<()> {
        if !definition.cardinality().is_satisfied_by(exports.len()) {
            return Err(CompositionError::invalid_argument(
                "exports",
                format!(
                    "{} exports do not satisfy cardinality {} of {}",
                    exports.len(),
                    definition.cardinality(),
                    definition.contract_name()
                ),
            ));
        }
        self.satisfied
            .insert(definition.contract_name().to_string(), exports);
        Ok(())
    }

    fn activate(&mut self) -> CompositionResult<()> {
        self.activated = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::contract::ContractBasedImportDefinition;
    use crate::definition::import::{Constraint, PredicateImportDefinition};
    use crate::policy::ImportCardinality;

    fn logger_part() -> Arc<dyn ComposablePartDefinition> {
        PartDefinition::new("ConsoleLogger")
            .with_export(ExportDefinition::for_contract("Logger").unwrap())
            .with_export(ExportDefinition::for_contract("Writer").unwrap())
            .with_export(ExportDefinition::for_contract("Logger").unwrap())
            .into_shared()
    }

    /// Test matches follow declaration order and carry the part
    #[test]
    fn test_get_exports_order() {
        let part = logger_part();
        let import = ContractBasedImportDefinition::new("Logger").unwrap();

        let matches = part.get_exports(&import).unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0].export().ptr_eq(&part.export_definitions()[0]));
        assert!(matches[1].export().ptr_eq(&part.export_definitions()[2]));
        assert!(matches.iter().all(|m| m.is_from(&part)));
    }

    /// Test an unmatched query returns an empty, unallocated result
    #[test]
    fn test_no_match_does_not_allocate() {
        let part = logger_part();
        let import = ContractBasedImportDefinition::new("Cache").unwrap();

        let matches = part.get_exports(&import).unwrap();
        assert!(matches.is_empty());
        assert_eq!(matches.capacity(), 0);
    }

    #[test]
    fn test_import_errors_propagate() {
        struct Broken;
        impl ImportDefinition for Broken {}

        let part = logger_part();
        assert!(part.get_exports(&Broken).unwrap_err().is_programming_error());
    }

    /// Test each export is tested exactly once
    #[test]
    fn test_single_scan() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let import = PredicateImportDefinition::new(
            Constraint::new("count", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            }),
            "",
            ImportCardinality::ZeroOrMore,
            false,
            true,
        );

        logger_part().get_exports(&import).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_creation_policy_stamped_on_exports() {
        let explicit = ExportDefinition::for_contract("Cache")
            .unwrap()
            .with_metadata(CREATION_POLICY_METADATA_KEY, CreationPolicy::Any);
        let part = PartDefinition::new("Cache")
            .with_export(ExportDefinition::for_contract("Cache").unwrap())
            .with_export(explicit)
            .with_creation_policy(CreationPolicy::NonShared)
            .with_export(ExportDefinition::for_contract("Store").unwrap());

        let policies: Vec<_> = part.exports().iter().map(|e| e.creation_policy()).collect();
        assert_eq!(
            policies,
            vec![
                Some(CreationPolicy::NonShared),
                Some(CreationPolicy::Any),
                Some(CreationPolicy::NonShared)
            ]
        );
        assert_eq!(part.creation_policy(), CreationPolicy::NonShared);
    }

    /// Test a policy declared in part metadata reaches existing and later exports
    #[test]
    fn test_creation_policy_from_metadata() {
        let part = PartDefinition::new("Cache")
            .with_export(ExportDefinition::for_contract("Cache").unwrap())
            .with_metadata(Metadata::empty().with(CREATION_POLICY_METADATA_KEY, "NonShared"))
            .with_export(ExportDefinition::for_contract("Store").unwrap());

        assert_eq!(part.creation_policy(), CreationPolicy::NonShared);
        let policies: Vec<_> = part.exports().iter().map(|e| e.creation_policy()).collect();
        assert_eq!(
            policies,
            vec![Some(CreationPolicy::NonShared), Some(CreationPolicy::NonShared)]
        );

        let shared = ContractBasedImportDefinition::new("Cache")
            .unwrap()
            .with_required_creation_policy(CreationPolicy::Shared);
        assert!(part.into_shared().get_exports(&shared).unwrap().is_empty());
    }

    #[test]
    fn test_metadata_keeps_earlier_policy() {
        let part = PartDefinition::new("Cache")
            .with_creation_policy(CreationPolicy::Shared)
            .with_metadata(Metadata::empty().with("Scope", "Host"))
            .with_export(ExportDefinition::for_contract("Cache").unwrap());

        assert_eq!(part.creation_policy(), CreationPolicy::Shared);
        assert_eq!(part.exports()[0].creation_policy(), Some(CreationPolicy::Shared));
        assert!(part.metadata.contains_key("Scope"));
    }

    #[test]
    fn test_create_part_without_factory() {
        let part = PartDefinition::new("Manifested");
        let err = part.create_part().err().unwrap();
        assert!(err.is_programming_error());
    }

    /// Test the factory path with an instance part
    #[test]
    fn test_create_part_with_factory() {
        let definition = PartDefinition::new("Greeter")
            .with_export(ExportDefinition::for_contract("Greeting").unwrap())
            .with_import(ContractBasedImportDefinition::new("Name").unwrap())
            .with_factory(|def| {
                let part = InstancePart::from_definition(def).with_value("Greeting", "hello".to_string());
                Ok(Box::new(part) as Box<dyn ComposablePart>)
            });

        let mut part = definition.create_part().unwrap();
        let export = definition.exports()[0].clone();
        let value = part.get_exported_value(&export).unwrap().unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("hello"));

        let name_import = Arc::clone(&definition.import_definitions()[0]);
        let name = Export::with_value(ExportDefinition::for_contract("Name").unwrap(), "Ada".to_string());
        part.set_import(name_import.as_ref(), vec![name]).unwrap();

        let err = part.set_import(name_import.as_ref(), Vec::new()).unwrap_err();
        assert!(err.is_argument_error());

        part.activate().unwrap();
    }

    #[test]
    fn test_foreign_export_rejected() {
        let definition = PartDefinition::new("Greeter")
            .with_export(ExportDefinition::for_contract("Greeting").unwrap());
        let part = InstancePart::from_definition(&definition);
        let foreign = ExportDefinition::for_contract("Greeting").unwrap();
        assert!(part.get_exported_value(&foreign).is_err());
    }

    #[test]
    fn test_display_name_and_origin() {
        let part = PartDefinition::new("ConsoleLogger")
            .with_origin(CompositionElementInfo::new("plugins.json"));
        let info = CompositionElementInfo::capture(&part);
        assert_eq!(info.to_string(), "ConsoleLogger <- plugins.json");
    }
}
