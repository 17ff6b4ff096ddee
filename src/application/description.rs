//! Authoring descriptions: TOML files building trees through the public API
//!
//! ```toml
//! document_type = "enhanced"
//!
//! [[items]]
//! value_type = "CONTAINER"
//! concept = { code = "121111", scheme = "DCM", meaning = "Summary" }
//!
//! [[items.children]]
//! relationship = "CONTAINS"
//! value_type = "NUM"
//! value = "12.5"
//! units = { code = "mm", scheme = "UCUM", meaning = "millimeter" }
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    AddMode, CodedEntry, ContentItem, ContentTree, ContentValue, Continuity, DocumentSubTree,
    DocumentTree, DocumentType, RelationshipType, TreeFlavor, TreeKind, ValueType,
};
use crate::domain::value::parse_datetime;

/// Parsed description file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Description {
    pub document_type: Option<DocumentType>,
    #[serde(default)]
    pub items: Vec<ItemDescription>,
}

/// One content item with its children.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemDescription {
    pub relationship: Option<RelationshipType>,
    pub value_type: ValueType,
    pub concept: Option<CodedEntry>,
    pub value: Option<String>,
    pub code: Option<CodedEntry>,
    pub units: Option<CodedEntry>,
    pub qualifier: Option<CodedEntry>,
    pub continuity: Option<Continuity>,
    /// Observation date/time, DICOM or ISO form.
    pub observed: Option<String>,
    #[serde(default)]
    pub children: Vec<ItemDescription>,
}

impl Description {
    pub fn from_toml(content: &str) -> ApplicationResult<Self> {
        toml::from_str(content).map_err(|e| ApplicationError::Description {
            message: e.to_string(),
        })
    }

    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> ApplicationResult<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        Self::from_toml(&content)
    }

    /// Builds a full document. The file's `document_type` wins over `fallback`.
    #[instrument(level = "debug", skip(self))]
    pub fn build_document(&self, fallback: DocumentType) -> ApplicationResult<DocumentTree> {
        let document_type = self.document_type.unwrap_or(fallback);
        let mut tree = DocumentTree::new(document_type);
        self.populate(&mut tree)?;
        debug!(nodes = tree.count_nodes(), %document_type, "built document");
        Ok(tree)
    }

    /// Builds a fragment, constrained only when the file names a document type.
    #[instrument(level = "debug", skip(self))]
    pub fn build_fragment(&self) -> ApplicationResult<DocumentSubTree> {
        let mut tree = match self.document_type {
            Some(document_type) => DocumentSubTree::with_constraints(document_type),
            None => DocumentSubTree::new(),
        };
        self.populate(&mut tree)?;
        debug!(nodes = tree.count_nodes(), "built fragment");
        Ok(tree)
    }

    fn populate<F: TreeFlavor>(&self, tree: &mut ContentTree<F>) -> ApplicationResult<()> {
        if self.items.is_empty() {
            return Err(ApplicationError::Description {
                message: "no items".to_string(),
            });
        }
        let top_level = match tree.kind() {
            TreeKind::Document => Some(RelationshipType::IsRoot),
            TreeKind::Fragment => Some(RelationshipType::Unknown),
        };
        for (i, item) in self.items.iter().enumerate() {
            let location = format!("items[{i}]");
            add_item(tree, item, top_level, AddMode::AfterCurrent, &location)?;
        }
        Ok(())
    }
}

/// Adds `item` and its children. Leaves the cursor on `item`.
fn add_item<F: TreeFlavor>(
    tree: &mut ContentTree<F>,
    item: &ItemDescription,
    default_relationship: Option<RelationshipType>,
    mode: AddMode,
    location: &str,
) -> ApplicationResult<()> {
    let relationship = item
        .relationship
        .or(default_relationship)
        .ok_or_else(|| ApplicationError::Description {
            message: format!("{location}: relationship is required"),
        })?;
    let added = match &item.concept {
        Some(concept) => {
            tree.add_content_item_with_name(relationship, item.value_type, concept.clone(), mode)
        }
        None => tree.add_content_item(relationship, item.value_type, mode),
    };
    added.map_err(|e| ApplicationError::item(location, e))?;

    let current = tree
        .current_mut()
        .ok_or_else(|| ApplicationError::item(location, crate::domain::TreeError::EmptyCursor))?;
    apply_values(current, item).map_err(|e| ApplicationError::item(location, e))?;

    let child_default = match tree.kind() {
        TreeKind::Document => None,
        TreeKind::Fragment => Some(RelationshipType::Unknown),
    };
    for (i, child) in item.children.iter().enumerate() {
        let child_location = format!("{location}.children[{i}]");
        add_item(
            tree,
            child,
            child_default,
            AddMode::BelowCurrentAfterLastChild,
            &child_location,
        )?;
        tree.goto_parent();
    }
    Ok(())
}

fn apply_values(item: &mut ContentItem, description: &ItemDescription) -> crate::domain::TreeResult<()> {
    match (&description.value, &description.units) {
        (Some(value), Some(units)) => item.set_numeric_value(value, units.clone())?,
        (Some(value), None) => item.set_string_value(value)?,
        (None, Some(units)) => item.set_numeric_value("", units.clone())?,
        (None, None) => {}
    }
    if let Some(code) = &description.code {
        item.set_code_value(code.clone())?;
    }
    if let Some(qualifier) = &description.qualifier {
        item.set_numeric_value_qualifier(qualifier.clone())?;
    }
    if let Some(continuity) = description.continuity {
        item.set_value(ContentValue::Container(continuity))?;
    }
    if let Some(observed) = &description.observed {
        item.set_observation_datetime(Some(parse_datetime(observed)?));
    }
    Ok(())
}
