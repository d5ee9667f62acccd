// Copyright 2025 Cowboy AI, LLC.

//! Creation policies and import cardinalities

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CompositionError;

/// How instances of a part are shared between consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CreationPolicy {
    /// No preference; the part or the importer decides
    #[default]
    Any,
    /// One instance shared by every consumer
    Shared,
    /// A fresh instance per import
    NonShared,
}

impl CreationPolicy {
    /// Whether an export declaring `self` may satisfy an import requiring `required`
    pub fn is_compatible_with(self, required: CreationPolicy) -> bool {
        required == CreationPolicy::Any || self == CreationPolicy::Any || self == required
    }
}

impl fmt::Display for CreationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreationPolicy::Any => write!(f, "Any"),
            CreationPolicy::Shared => write!(f, "Shared"),
            CreationPolicy::NonShared => write!(f, "NonShared"),
        }
    }
}

impl TryFrom<i64> for CreationPolicy {
    type Error = CompositionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CreationPolicy::Any),
            1 => Ok(CreationPolicy::Shared),
            2 => Ok(CreationPolicy::NonShared),
            other => Err(CompositionError::InvalidCreationPolicy(other.to_string())),
        }
    }
}

impl FromStr for CreationPolicy {
    type Err = CompositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Any" => Ok(CreationPolicy::Any),
            "Shared" => Ok(CreationPolicy::Shared),
            "NonShared" => Ok(CreationPolicy::NonShared),
            other => Err(CompositionError::InvalidCreationPolicy(other.to_string())),
        }
    }
}

/// How many exports an import expects to bind to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImportCardinality {
    /// Zero or one export
    ZeroOrOne,
    /// Exactly one export
    #[default]
    ExactlyOne,
    /// Any number of exports
    ZeroOrMore,
}

impl ImportCardinality {
    /// Whether `count` matches satisfy this cardinality
    ///
    /// Catalogs never enforce this; it is provided for the composition
    /// engine that consumes catalog results.
    pub fn is_satisfied_by(self, count: usize) -> bool {
        match self {
            ImportCardinality::ZeroOrOne => count <= 1,
            ImportCardinality::ExactlyOne => count == 1,
            ImportCardinality::ZeroOrMore => true,
        }
    }
}

impl fmt::Display for ImportCardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportCardinality::ZeroOrOne => write!(f, "ZeroOrOne"),
            ImportCardinality::ExactlyOne => write!(f, "ExactlyOne"),
            ImportCardinality::ZeroOrMore => write!(f, "ZeroOrMore"),
        }
    }
}

impl TryFrom<i64> for ImportCardinality {
    type Error = CompositionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ImportCardinality::ZeroOrOne),
            1 => Ok(ImportCardinality::ExactlyOne),
            2 => Ok(ImportCardinality::ZeroOrMore),
            other => Err(CompositionError::InvalidCardinality(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(CreationPolicy::Any, CreationPolicy::Any => true)]
    #[test_case(CreationPolicy::Shared, CreationPolicy::Any => true)]
    #[test_case(CreationPolicy::NonShared, CreationPolicy::Any => true)]
    #[test_case(CreationPolicy::Any, CreationPolicy::Shared => true)]
    #[test_case(CreationPolicy::Shared, CreationPolicy::Shared => true)]
    #[test_case(CreationPolicy::NonShared, CreationPolicy::Shared => false)]
    #[test_case(CreationPolicy::Shared, CreationPolicy::NonShared => false)]
    #[test_case(CreationPolicy::NonShared, CreationPolicy::NonShared => true)]
    fn test_policy_compatibility(declared: CreationPolicy, required: CreationPolicy) -> bool {
        declared.is_compatible_with(required)
    }

    #[test_case(0 => Ok(ImportCardinality::ZeroOrOne))]
    #[test_case(1 => Ok(ImportCardinality::ExactlyOne))]
    #[test_case(2 => Ok(ImportCardinality::ZeroOrMore))]
    #[test_case(3 => Err(3))]
    #[test_case(-1 => Err(-1))]
    fn test_cardinality_from_raw(raw: i64) -> Result<ImportCardinality, i64> {
        ImportCardinality::try_from(raw).map_err(|e| match e {
            CompositionError::InvalidCardinality(v) => v,
            other => panic!("unexpected error {other}"),
        })
    }

    /// Test creation policy parsing is exact
    #[test]
    fn test_policy_parse() {
        assert_eq!("Shared".parse::<CreationPolicy>().unwrap(), CreationPolicy::Shared);
        assert_eq!("NonShared".parse::<CreationPolicy>().unwrap(), CreationPolicy::NonShared);
        assert!("shared".parse::<CreationPolicy>().is_err());
        assert!(CreationPolicy::try_from(5).is_err());
    }

    #[test]
    fn test_cardinality_satisfaction() {
        assert!(ImportCardinality::ExactlyOne.is_satisfied_by(1));
        assert!(!ImportCardinality::ExactlyOne.is_satisfied_by(0));
        assert!(!ImportCardinality::ExactlyOne.is_satisfied_by(2));
        assert!(ImportCardinality::ZeroOrOne.is_satisfied_by(0));
        assert!(!ImportCardinality::ZeroOrOne.is_satisfied_by(2));
        assert!(ImportCardinality::ZeroOrMore.is_satisfied_by(42));
    }

    /// Test serde representation of the enums
    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&CreationPolicy::NonShared).unwrap(), "\"NonShared\"");
        let cardinality: ImportCardinality = serde_json::from_str("\"ZeroOrMore\"").unwrap();
        assert_eq!(cardinality, ImportCardinality::ZeroOrMore);
    }
}
