// Copyright 2025 Cowboy AI, LLC.

//! Exported methods
//!
//! Rust has no runtime reflection, so the signature of an exported method
//! is not discovered here. The provider that scans parts describes each
//! method with a [`MethodDescriptor`]: its name, a [`DelegateSignature`]
//! built from [`MetadataType`]s, and a type-erased body. An
//! [`ExportedDelegate`] pairs that descriptor with the target instance and
//! binds it to a requested [`DelegateShape`] on demand.
//!
//! Binding never panics or errors. An incompatible shape, or an instance
//! method without a target, produces `None`.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{CompositionError, CompositionResult};
use crate::metadata::{MetadataType, MetadataValue};

/// The instance an exported method is called on
pub type DelegateTarget = Arc<dyn Any + Send + Sync>;

type MethodBody =
    dyn Fn(Option<&(dyn Any + Send + Sync)>, &[MetadataValue]) -> CompositionResult<MetadataValue>
        + Send
        + Sync;

/// Parameter and return types of a callable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegateSignature {
    parameters: Vec<MetadataType>,
    return_type: Option<MetadataType>,
}

impl DelegateSignature {
    /// Create a signature; `return_type` of `None` means no return value
    pub fn new(parameters: Vec<MetadataType>, return_type: Option<MetadataType>) -> Self {
        Self {
            parameters,
            return_type,
        }
    }

    /// Parameter types in order
    pub fn parameters(&self) -> &[MetadataType] {
        &self.parameters
    }

    /// Return type, if any
    pub fn return_type(&self) -> Option<&MetadataType> {
        self.return_type.as_ref()
    }

    /// Whether a method with this signature can be called through `shape`
    ///
    /// Parameters are contravariant: every argument the shape passes must be
    /// accepted by the method. The return type is covariant.
    pub fn is_bindable_to(&self, shape: &DelegateSignature) -> bool {
        if self.parameters.len() != shape.parameters.len() {
            return false;
        }
        let parameters_fit = self
            .parameters
            .iter()
            .zip(&shape.parameters)
            .all(|(accepted, passed)| accepted.is_assignable_from(passed));
        let return_fits = match (&shape.return_type, &self.return_type) {
            (None, None) => true,
            (Some(expected), Some(produced)) => expected.is_assignable_from(produced),
            _ => false,
        };
        parameters_fit && return_fits
    }
}

impl fmt::Display for DelegateSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ")")?;
        if let Some(ret) = &self.return_type {
            write!(f, " -> {ret}")?;
        }
        Ok(())
    }
}

/// The callable shape a consumer asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegateShape {
    /// Whatever shape the method itself has
    Any,
    /// A specific signature
    Exact(DelegateSignature),
}

/// A method description supplied by the part provider
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    signature: DelegateSignature,
    requires_target: bool,
    body: Arc<MethodBody>,
}

impl MethodDescriptor {
    /// Describe an instance method
    pub fn instance<F>(name: impl Into<String>, signature: DelegateSignature, body: F) -> Self
    where
        F: Fn(Option<&(dyn Any + Send + Sync)>, &[MetadataValue]) -> CompositionResult<MetadataValue>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            signature,
            requires_target: true,
            body: Arc::new(body),
        }
    }

    /// Describe a method that needs no target
    pub fn free<F>(name: impl Into<String>, signature: DelegateSignature, body: F) -> Self
    where
        F: Fn(&[MetadataValue]) -> CompositionResult<MetadataValue> + Send + Sync + 'static,
    {
        let body: Arc<MethodBody> =
            Arc::new(move |_: Option<&(dyn Any + Send + Sync)>, args: &[MetadataValue]| body(args));
        Self {
            name: name.into(),
            signature,
            requires_target: false,
            body,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared signature
    pub fn signature(&self) -> &DelegateSignature {
        &self.signature
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("requires_target", &self.requires_target)
            .finish()
    }
}

/// A method exported by a part, bound lazily to a callable shape
#[derive(Clone)]
pub struct ExportedDelegate {
    target: Option<DelegateTarget>,
    method: MethodDescriptor,
}

impl ExportedDelegate {
    /// Pair a target instance with a method
    pub fn new(target: Option<DelegateTarget>, method: MethodDescriptor) -> Self {
        Self { target, method }
    }

    /// The method description
    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    /// Bind the method to `shape`
    ///
    /// For [`DelegateShape::Any`] the shape is derived from the method's own
    /// parameter and return types. Returns `None` when the method cannot be
    /// called through the requested shape.
    pub fn create_delegate(&self, shape: &DelegateShape) -> Option<BoundDelegate> {
        if self.method.requires_target && self.target.is_none() {
            warn!(method = %self.method.name, "instance method exported without a target");
            return None;
        }

        let signature = match shape {
            DelegateShape::Any => self.method.signature.clone(),
            DelegateShape::Exact(requested) => {
                if !self.method.signature.is_bindable_to(requested) {
                    warn!(
                        method = %self.method.name,
                        declared = %self.method.signature,
                        requested = %requested,
                        "delegate shape incompatible with exported method"
                    );
                    return None;
                }
                requested.clone()
            }
        };

        Some(BoundDelegate {
            method_name: self.method.name.clone(),
            signature,
            target: self.target.clone(),
            body: Arc::clone(&self.method.body),
        })
    }
}

impl fmt::Debug for ExportedDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedDelegate")
            .field("has_target", &self.target.is_some())
            .field("method", &self.method)
            .finish()
    }
}

/// A method bound to a target and a concrete signature
#[derive(Clone)]
pub struct BoundDelegate {
    method_name: String,
    signature: DelegateSignature,
    target: Option<DelegateTarget>,
    body: Arc<MethodBody>,
}

impl BoundDelegate {
    /// The bound signature
    pub fn signature(&self) -> &DelegateSignature {
        &self.signature
    }

    /// Call the method
    ///
    /// # Errors
    ///
    /// Returns [`CompositionError::DelegateInvocation`] on an arity or type
    /// mismatch in either direction, and propagates errors from the body
    pub fn invoke(&self, args: &[MetadataValue]) -> CompositionResult<MetadataValue> {
        if args.len() != self.signature.parameters.len() {
            return Err(CompositionError::DelegateInvocation(format!(
                "{} expects {} arguments, got {}",
                self.method_name,
                self.signature.parameters.len(),
                args.len()
            )));
        }
        for (index, (arg, ty)) in args.iter().zip(&self.signature.parameters).enumerate() {
            if !ty.is_instance(arg) {
                return Err(CompositionError::DelegateInvocation(format!(
                    "{} argument {index} is {}, expected {ty}",
                    self.method_name,
                    arg.kind_name()
                )));
            }
        }

        let result = (self.body)(self.target.as_deref(), args)?;

        match &self.signature.return_type {
            None => Ok(MetadataValue::Null),
            Some(ty) if ty.is_instance(&result) => Ok(result),
            Some(ty) => Err(CompositionError::DelegateInvocation(format!(
                "{} returned {}, expected {ty}",
                self.method_name,
                result.kind_name()
            ))),
        }
    }
}

impl fmt::Debug for BoundDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundDelegate")
            .field("method_name", &self.method_name)
            .field("signature", &self.signature)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        step: i64,
    }

    fn add_method() -> MethodDescriptor {
        MethodDescriptor::instance(
            "Add",
            DelegateSignature::new(vec![MetadataType::Int], Some(MetadataType::Int)),
            |target, args| {
                let counter = target
                    .and_then(|t| t.downcast_ref::<Counter>())
                    .ok_or_else(|| CompositionError::DelegateInvocation("no counter".to_string()))?;
                match args {
                    [MetadataValue::Int(x)] => Ok(MetadataValue::Int(x + counter.step)),
                    _ => Err(CompositionError::DelegateInvocation("bad args".to_string())),
                }
            },
        )
    }

    /// Test the any-shape binding derives the method's own signature
    #[test]
    fn test_any_shape_derives_signature() {
        let delegate = ExportedDelegate::new(Some(Arc::new(Counter { step: 2 })), add_method());
        let bound = delegate.create_delegate(&DelegateShape::Any).unwrap();

        assert_eq!(bound.signature(), delegate.method().signature());
        assert_eq!(bound.invoke(&[MetadataValue::Int(40)]).unwrap(), MetadataValue::Int(42));
    }

    #[test]
    fn test_incompatible_shape_yields_none() {
        let delegate = ExportedDelegate::new(Some(Arc::new(Counter { step: 1 })), add_method());

        let wrong_arity = DelegateSignature::new(vec![], Some(MetadataType::Int));
        let wrong_param = DelegateSignature::new(vec![MetadataType::String], Some(MetadataType::Int));
        let void_return = DelegateSignature::new(vec![MetadataType::Int], None);

        assert!(delegate.create_delegate(&DelegateShape::Exact(wrong_arity)).is_none());
        assert!(delegate.create_delegate(&DelegateShape::Exact(wrong_param)).is_none());
        assert!(delegate.create_delegate(&DelegateShape::Exact(void_return)).is_none());
    }

    /// Test variance: a method taking `Any` binds to a shape passing `Int`
    #[test]
    fn test_compatible_shape_binds() {
        let echo = MethodDescriptor::free(
            "Echo",
            DelegateSignature::new(vec![MetadataType::Any], Some(MetadataType::Int)),
            |args| Ok(args[0].clone()),
        );
        let delegate = ExportedDelegate::new(None, echo);
        let shape = DelegateSignature::new(vec![MetadataType::Int], Some(MetadataType::Any));

        let bound = delegate.create_delegate(&DelegateShape::Exact(shape.clone())).unwrap();
        assert_eq!(bound.signature(), &shape);
        assert_eq!(bound.invoke(&[MetadataValue::Int(3)]).unwrap(), MetadataValue::Int(3));
        assert!(bound.invoke(&[MetadataValue::from("x")]).is_err());
    }

    #[test]
    fn test_instance_method_without_target() {
        let delegate = ExportedDelegate::new(None, add_method());
        assert!(delegate.create_delegate(&DelegateShape::Any).is_none());
    }

    #[test]
    fn test_invoke_checks_arguments_and_result() {
        let liar = MethodDescriptor::free(
            "Liar",
            DelegateSignature::new(vec![], Some(MetadataType::Int)),
            |_| Ok(MetadataValue::from("not an int")),
        );
        let bound = ExportedDelegate::new(None, liar)
            .create_delegate(&DelegateShape::Any)
            .unwrap();

        assert!(bound.invoke(&[MetadataValue::Int(1)]).is_err());
        assert!(matches!(
            bound.invoke(&[]),
            Err(CompositionError::DelegateInvocation(_))
        ));
    }

    #[test]
    fn test_signature_display() {
        let sig = DelegateSignature::new(
            vec![MetadataType::Int, MetadataType::nullable(MetadataType::String)],
            Some(MetadataType::Bool),
        );
        assert_eq!(sig.to_string(), "fn(Int, String?) -> Bool");
    }
}
