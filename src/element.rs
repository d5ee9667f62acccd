// Copyright 2025 Cowboy AI, LLC.

//! Composition elements used for diagnostics
//!
//! Anything that takes part in composition (part definitions, catalogs,
//! manifest entries) can describe itself through [`CompositionElement`].
//! Errors capture a [`CompositionElementInfo`] snapshot so they stay
//! `Clone` and do not keep the element alive.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An element that participates in composition
pub trait CompositionElement {
    /// Human readable name of the element
    fn display_name(&self) -> String;

    /// The element this one was created from, if any
    fn origin(&self) -> Option<&dyn CompositionElement> {
        None
    }
}

/// Owned snapshot of a composition element and its origin chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionElementInfo {
    display_name: String,
    origin: Option<Box<CompositionElementInfo>>,
}

impl CompositionElementInfo {
    /// Create a snapshot with no origin
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            origin: None,
        }
    }

    /// Set the origin of this element
    pub fn with_origin(mut self, origin: CompositionElementInfo) -> Self {
        self.origin = Some(Box::new(origin));
        self
    }

    /// Capture an element and every origin above it
    pub fn capture(element: &dyn CompositionElement) -> Self {
        Self {
            display_name: element.display_name(),
            origin: element.origin().map(|o| Box::new(Self::capture(o))),
        }
    }

    /// Name of the element
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Origin of the element
    pub fn origin(&self) -> Option<&CompositionElementInfo> {
        self.origin.as_deref()
    }
}

impl CompositionElement for CompositionElementInfo {
    fn display_name(&self) -> String {
        self.display_name.clone()
    }

    fn origin(&self) -> Option<&dyn CompositionElement> {
        self.origin
            .as_deref()
            .map(|o| o as &dyn CompositionElement)
    }
}

impl fmt::Display for CompositionElementInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)?;
        let mut origin = self.origin();
        while let Some(o) = origin {
            write!(f, " <- {}", o.display_name)?;
            origin = o.origin();
        }
        Ok(())
    }
}
