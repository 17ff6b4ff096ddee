//! Tags and identifiers shared by the tree, the grammar and the value model

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tag string that names no known relationship, value or document type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: '{input}'")]
pub struct ParseTagError {
    pub kind: &'static str,
    pub input: String,
}

/// Normalizes user spelling: `has-obs_context` -> `HAS OBS CONTEXT`.
fn normalize_tag(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '_' | '-' => ' ',
            c => c.to_ascii_uppercase(),
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Relationship type as requested at the API boundary.
///
/// `Invalid` only signals a rejected request and is never stored, see
/// [`Relationship`] for the stored form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RelationshipType {
    IsRoot,
    Contains,
    HasObsContext,
    HasAcqContext,
    HasConceptMod,
    HasProperties,
    InferredFrom,
    /// Edge not yet classified, legal only inside a document subtree.
    Unknown,
    Invalid,
}

impl RelationshipType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IsRoot => "IS ROOT",
            Self::Contains => "CONTAINS",
            Self::HasObsContext => "HAS OBS CONTEXT",
            Self::HasAcqContext => "HAS ACQ CONTEXT",
            Self::HasConceptMod => "HAS CONCEPT MOD",
            Self::HasProperties => "HAS PROPERTIES",
            Self::InferredFrom => "INFERRED FROM",
            Self::Unknown => "UNKNOWN",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_tag(s).as_str() {
            "IS ROOT" | "ROOT" => Ok(Self::IsRoot),
            "CONTAINS" => Ok(Self::Contains),
            "HAS OBS CONTEXT" => Ok(Self::HasObsContext),
            "HAS ACQ CONTEXT" => Ok(Self::HasAcqContext),
            "HAS CONCEPT MOD" => Ok(Self::HasConceptMod),
            "HAS PROPERTIES" => Ok(Self::HasProperties),
            "INFERRED FROM" => Ok(Self::InferredFrom),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(ParseTagError {
                kind: "relationship type",
                input: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for RelationshipType {
    type Error = ParseTagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RelationshipType> for String {
    fn from(value: RelationshipType) -> Self {
        value.as_str().to_string()
    }
}

/// Relationship stored on a committed or detached node. Cannot be `Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    IsRoot,
    Contains,
    HasObsContext,
    HasAcqContext,
    HasConceptMod,
    HasProperties,
    InferredFrom,
    Unknown,
}

impl Relationship {
    pub const fn relationship_type(self) -> RelationshipType {
        match self {
            Self::IsRoot => RelationshipType::IsRoot,
            Self::Contains => RelationshipType::Contains,
            Self::HasObsContext => RelationshipType::HasObsContext,
            Self::HasAcqContext => RelationshipType::HasAcqContext,
            Self::HasConceptMod => RelationshipType::HasConceptMod,
            Self::HasProperties => RelationshipType::HasProperties,
            Self::InferredFrom => RelationshipType::InferredFrom,
            Self::Unknown => RelationshipType::Unknown,
        }
    }
}

impl TryFrom<RelationshipType> for Relationship {
    type Error = RelationshipType;

    fn try_from(value: RelationshipType) -> Result<Self, Self::Error> {
        match value {
            RelationshipType::IsRoot => Ok(Self::IsRoot),
            RelationshipType::Contains => Ok(Self::Contains),
            RelationshipType::HasObsContext => Ok(Self::HasObsContext),
            RelationshipType::HasAcqContext => Ok(Self::HasAcqContext),
            RelationshipType::HasConceptMod => Ok(Self::HasConceptMod),
            RelationshipType::HasProperties => Ok(Self::HasProperties),
            RelationshipType::InferredFrom => Ok(Self::InferredFrom),
            RelationshipType::Unknown => Ok(Self::Unknown),
            RelationshipType::Invalid => Err(value),
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.relationship_type().fmt(f)
    }
}

/// Value type tag of a content item. `Invalid` is an input sentinel only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    Container,
    Text,
    Code,
    Num,
    DateTime,
    Date,
    Time,
    UidRef,
    PName,
    Invalid,
}

impl ValueType {
    /// Every storable value type.
    pub const ALL: [ValueType; 9] = [
        Self::Container,
        Self::Text,
        Self::Code,
        Self::Num,
        Self::DateTime,
        Self::Date,
        Self::Time,
        Self::UidRef,
        Self::PName,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Container => "CONTAINER",
            Self::Text => "TEXT",
            Self::Code => "CODE",
            Self::Num => "NUM",
            Self::DateTime => "DATETIME",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::UidRef => "UIDREF",
            Self::PName => "PNAME",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_tag(s).replace(' ', "").as_str() {
            "CONTAINER" => Ok(Self::Container),
            "TEXT" => Ok(Self::Text),
            "CODE" => Ok(Self::Code),
            "NUM" | "NUMERIC" => Ok(Self::Num),
            "DATETIME" => Ok(Self::DateTime),
            "DATE" => Ok(Self::Date),
            "TIME" => Ok(Self::Time),
            "UIDREF" => Ok(Self::UidRef),
            "PNAME" => Ok(Self::PName),
            _ => Err(ParseTagError {
                kind: "value type",
                input: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ValueType {
    type Error = ParseTagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.as_str().to_string()
    }
}

/// Identity of a node inside the tree that owns it.
///
/// Valid ids are strictly positive; "no node" is `Option<NodeId>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(NonZeroUsize);

impl NodeId {
    pub(crate) fn new(value: NonZeroUsize) -> Self {
        Self(value)
    }

    pub fn value(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a new node goes relative to the cursor. On an empty tree every mode
/// creates the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddMode {
    /// Next sibling of the cursor node.
    #[default]
    AfterCurrent,
    /// Previous sibling of the cursor node.
    BeforeCurrent,
    /// First child of the cursor node.
    BelowCurrent,
    /// Last child of the cursor node.
    BelowCurrentAfterLastChild,
}
