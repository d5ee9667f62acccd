// Copyright 2025 Cowboy AI, LLC.

//! Lazily evaluated exports
//!
//! An [`Export`] binds an [`ExportDefinition`] to a producer. The value is
//! produced on first read and published with a compare-and-swap; readers
//! that race on the first read may each run the producer, but all of them
//! end up holding the single published value.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::definition::export::ExportDefinition;
use crate::errors::{CompositionError, CompositionResult};
use crate::metadata::Metadata;
use crate::publish::Published;

/// An exported value; `None` is a legitimate null value
pub type ExportedObject = Option<Arc<dyn Any + Send + Sync>>;

type Producer = dyn Fn() -> CompositionResult<ExportedObject> + Send + Sync;

struct ProducedValue(ExportedObject);

/// An export definition bound to a lazily produced value
pub struct Export {
    definition: ExportDefinition,
    producer: Box<Producer>,
    value: Published<ProducedValue>,
}

impl Export {
    /// Bind `definition` to `producer`
    ///
    /// The producer may run more than once if readers race on the first
    /// read, so it must be safe to repeat.
    pub fn new<F>(definition: ExportDefinition, producer: F) -> Self
    where
        F: Fn() -> CompositionResult<ExportedObject> + Send + Sync + 'static,
    {
        Self {
            definition,
            producer: Box::new(producer),
            value: Published::new(),
        }
    }

    /// Create an export from a contract name, metadata and producer
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error if `contract_name` is empty
    pub fn from_contract<F>(
        contract_name: impl Into<String>,
        metadata: Metadata,
        producer: F,
    ) -> CompositionResult<Self>
    where
        F: Fn() -> CompositionResult<ExportedObject> + Send + Sync + 'static,
    {
        Ok(Self::new(ExportDefinition::new(contract_name, metadata)?, producer))
    }

    /// Bind `definition` to a value that already exists
    pub fn with_value<T: Any + Send + Sync>(definition: ExportDefinition, value: T) -> Self {
        let value: Arc<dyn Any + Send + Sync> = Arc::new(value);
        Self::new(definition, move || Ok(Some(Arc::clone(&value))))
    }

    /// The export definition
    pub fn definition(&self) -> &ExportDefinition {
        &self.definition
    }

    /// Metadata of the export definition
    pub fn metadata(&self) -> &Metadata {
        self.definition.metadata()
    }

    /// The exported value, produced on first call
    ///
    /// # Errors
    ///
    /// Propagates the producer's error; nothing is published in that case
    /// and the next read tries again.
    pub fn value(&self) -> CompositionResult<ExportedObject> {
        let produced = self
            .value
            .get_or_try_publish(|| (self.producer)().map(ProducedValue))?;
        Ok(produced.0.clone())
    }

    /// The exported value downcast to `T`
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::ExportValue`] if the value is not a `T`
    pub fn value_as<T: Any + Send + Sync>(&self) -> CompositionResult<Option<Arc<T>>> {
        self.value()?
            .map(|value| {
                value.downcast::<T>().map_err(|_| {
                    CompositionError::ExportValue(format!(
                        "value exported for {} is not a {}",
                        self.definition.contract_name(),
                        type_name::<T>()
                    ))
                })
            })
            .transpose()
    }

    /// Whether the value has been produced and published
    pub fn is_value_created(&self) -> bool {
        self.value.is_published()
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Export")
            .field("definition", &self.definition)
            .field("is_value_created", &self.is_value_created())
            .finish()
    }
}
