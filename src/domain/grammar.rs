//! Relationship content constraints
//!
//! Decides whether a (relationship type, value type) pair may be inserted at a
//! given position. Pure and total: every combination is classified, anything
//! no table row admits is illegal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::types::{ParseTagError, RelationshipType, ValueType};
use crate::domain::types::ValueType::{Code, Container, Date, DateTime, Num, PName, Text, Time, UidRef};

/// Full document (single root with `IsRoot`) or detached fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    Document,
    Fragment,
}

/// Position of an insertion relative to the existing structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The tree is empty.
    Root,
    /// Sibling of a node that has no parent.
    TopLevel,
    /// Below a node of the given value type.
    Child(ValueType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionContext {
    pub kind: TreeKind,
    pub position: Position,
    pub constraints: Option<DocumentType>,
}

/// One row of a content constraint table: `sources --relationship--> targets`.
#[derive(Debug)]
pub struct ConstraintRow {
    pub relationship: RelationshipType,
    pub sources: &'static [ValueType],
    pub targets: &'static [ValueType],
}

const ITEMS: &[ValueType] = &[Text, Code, Num, DateTime, Date, Time, UidRef, PName];
const ITEMS_AND_CONTAINER: &[ValueType] =
    &[Text, Code, Num, DateTime, Date, Time, UidRef, PName, Container];
const TEXT_ITEMS: &[ValueType] = &[Text, Code, DateTime, Date, Time, UidRef, PName];
const TEXT_ITEMS_AND_CONTAINER: &[ValueType] =
    &[Text, Code, DateTime, Date, Time, UidRef, PName, Container];
const MODIFIERS: &[ValueType] = &[Text, Code];

const COMPREHENSIVE: &[ConstraintRow] = &[
    ConstraintRow {
        relationship: RelationshipType::Contains,
        sources: &[Container],
        targets: ITEMS_AND_CONTAINER,
    },
    ConstraintRow {
        relationship: RelationshipType::HasObsContext,
        sources: &[Container, Text, Code, Num],
        targets: ITEMS,
    },
    ConstraintRow {
        relationship: RelationshipType::HasAcqContext,
        sources: &[Container, Num],
        targets: ITEMS_AND_CONTAINER,
    },
    ConstraintRow {
        relationship: RelationshipType::HasConceptMod,
        sources: &ValueType::ALL,
        targets: MODIFIERS,
    },
    ConstraintRow {
        relationship: RelationshipType::HasProperties,
        sources: &[Text, Code, Num],
        targets: ITEMS_AND_CONTAINER,
    },
    ConstraintRow {
        relationship: RelationshipType::InferredFrom,
        sources: &[Text, Code, Num],
        targets: ITEMS_AND_CONTAINER,
    },
];

const ENHANCED: &[ConstraintRow] = &[
    ConstraintRow {
        relationship: RelationshipType::Contains,
        sources: &[Container],
        targets: ITEMS_AND_CONTAINER,
    },
    ConstraintRow {
        relationship: RelationshipType::HasObsContext,
        sources: &[Container],
        targets: ITEMS,
    },
    ConstraintRow {
        relationship: RelationshipType::HasAcqContext,
        sources: &[Container],
        targets: ITEMS,
    },
    ConstraintRow {
        relationship: RelationshipType::HasConceptMod,
        sources: &[Container, Text, Code, Num],
        targets: MODIFIERS,
    },
    ConstraintRow {
        relationship: RelationshipType::HasProperties,
        sources: &[Text, Code, Num],
        targets: ITEMS,
    },
    ConstraintRow {
        relationship: RelationshipType::InferredFrom,
        sources: &[Text, Code, Num],
        targets: ITEMS,
    },
];

const BASIC_TEXT: &[ConstraintRow] = &[
    ConstraintRow {
        relationship: RelationshipType::Contains,
        sources: &[Container],
        targets: TEXT_ITEMS_AND_CONTAINER,
    },
    ConstraintRow {
        relationship: RelationshipType::HasObsContext,
        sources: &[Container],
        targets: TEXT_ITEMS,
    },
    ConstraintRow {
        relationship: RelationshipType::HasAcqContext,
        sources: &[Container],
        targets: TEXT_ITEMS,
    },
    ConstraintRow {
        relationship: RelationshipType::HasConceptMod,
        sources: &[Container, Text, Code],
        targets: MODIFIERS,
    },
    ConstraintRow {
        relationship: RelationshipType::HasProperties,
        sources: &[Text, Code],
        targets: TEXT_ITEMS,
    },
    ConstraintRow {
        relationship: RelationshipType::InferredFrom,
        sources: &[Text, Code],
        targets: TEXT_ITEMS,
    },
];

/// Report profile whose content constraint table governs a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DocumentType {
    BasicText,
    Enhanced,
    #[default]
    Comprehensive,
}

impl DocumentType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BasicText => "basic-text",
            Self::Enhanced => "enhanced",
            Self::Comprehensive => "comprehensive",
        }
    }

    pub fn rows(self) -> &'static [ConstraintRow] {
        match self {
            Self::BasicText => BASIC_TEXT,
            Self::Enhanced => ENHANCED,
            Self::Comprehensive => COMPREHENSIVE,
        }
    }

    pub fn supports_value_type(self, value_type: ValueType) -> bool {
        match value_type {
            ValueType::Invalid => false,
            ValueType::Num => self != Self::BasicText,
            ValueType::Container
            | ValueType::Text
            | ValueType::Code
            | ValueType::DateTime
            | ValueType::Date
            | ValueType::Time
            | ValueType::UidRef
            | ValueType::PName => true,
        }
    }

    /// `source --relationship--> target` is admitted by a table row.
    pub fn allows(self, source: ValueType, relationship: RelationshipType, target: ValueType) -> bool {
        self.rows().iter().any(|row| {
            row.relationship == relationship
                && row.sources.contains(&source)
                && row.targets.contains(&target)
        })
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "basic-text" | "basic" => Ok(Self::BasicText),
            "enhanced" => Ok(Self::Enhanced),
            "comprehensive" => Ok(Self::Comprehensive),
            _ => Err(ParseTagError {
                kind: "document type",
                input: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for DocumentType {
    type Error = ParseTagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DocumentType> for String {
    fn from(value: DocumentType) -> Self {
        value.as_str().to_string()
    }
}

/// Whether `relationship`/`value_type` may be inserted in `context`.
pub fn is_legal(
    relationship: RelationshipType,
    value_type: ValueType,
    context: &InsertionContext,
) -> bool {
    if relationship == RelationshipType::Invalid || value_type == ValueType::Invalid {
        return false;
    }
    if let Some(document_type) = context.constraints {
        if !document_type.supports_value_type(value_type) {
            return false;
        }
    }
    match (context.kind, context.position) {
        (TreeKind::Document, Position::Root) => relationship == RelationshipType::IsRoot,
        (TreeKind::Document, Position::TopLevel) => false,
        (TreeKind::Document, Position::Child(parent)) => match relationship {
            RelationshipType::IsRoot | RelationshipType::Unknown | RelationshipType::Invalid => false,
            _ => allowed_below(context.constraints, parent, relationship, value_type),
        },
        (TreeKind::Fragment, Position::Root | Position::TopLevel) => true,
        (TreeKind::Fragment, Position::Child(parent)) => match relationship {
            RelationshipType::Unknown => true,
            RelationshipType::IsRoot | RelationshipType::Invalid => false,
            _ => allowed_below(context.constraints, parent, relationship, value_type),
        },
    }
}

fn allowed_below(
    constraints: Option<DocumentType>,
    parent: ValueType,
    relationship: RelationshipType,
    value_type: ValueType,
) -> bool {
    constraints.map_or(true, |document_type| {
        document_type.allows(parent, relationship, value_type)
    })
}
