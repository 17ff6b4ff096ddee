//! Content items and caller-owned detached subtrees

use chrono::NaiveDateTime;

use crate::domain::code::CodedEntry;
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::types::{Relationship, RelationshipType, ValueType};
use crate::domain::value::{ContentValue, NumericValue};

/// Data of a single content item: edge to its parent, typed value and
/// optional concept name.
///
/// The relationship is fixed while the item lives inside a tree, only
/// [`DetachedItem::set_relationship`] changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    relationship: Relationship,
    value: ContentValue,
    concept_name: Option<CodedEntry>,
    observation_datetime: Option<NaiveDateTime>,
}

impl ContentItem {
    pub fn new(relationship: Relationship, value: ContentValue) -> Self {
        Self {
            relationship,
            value,
            concept_name: None,
            observation_datetime: None,
        }
    }

    /// Item with an empty value, `None` if either tag is a sentinel.
    pub fn create(relationship: RelationshipType, value_type: ValueType) -> Option<Self> {
        let relationship = Relationship::try_from(relationship).ok()?;
        let value = ContentValue::empty(value_type)?;
        Some(Self::new(relationship, value))
    }

    pub fn relationship(&self) -> Relationship {
        self.relationship
    }

    pub fn relationship_type(&self) -> RelationshipType {
        self.relationship.relationship_type()
    }

    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    pub fn value(&self) -> &ContentValue {
        &self.value
    }

    pub fn concept_name(&self) -> Option<&CodedEntry> {
        self.concept_name.as_ref()
    }

    pub fn observation_datetime(&self) -> Option<NaiveDateTime> {
        self.observation_datetime
    }

    pub fn has_concept_name(&self, concept: &CodedEntry) -> bool {
        self.concept_name.as_ref() == Some(concept)
    }

    pub fn set_concept_name(&mut self, concept_name: CodedEntry) -> TreeResult<()> {
        if !concept_name.is_valid() {
            return Err(TreeError::InvalidConceptName(concept_name.to_string()));
        }
        self.concept_name = Some(concept_name);
        Ok(())
    }

    pub fn set_observation_datetime(&mut self, observed: Option<NaiveDateTime>) {
        self.observation_datetime = observed;
    }

    /// Replaces the value, which must keep the item's value type.
    pub fn set_value(&mut self, value: ContentValue) -> TreeResult<()> {
        if value.value_type() != self.value_type() {
            return Err(TreeError::ValueTypeMismatch {
                expected: self.value_type(),
                found: value.value_type(),
            });
        }
        value.validate()?;
        self.value = value;
        Ok(())
    }

    pub fn string_value(&self) -> Option<&str> {
        self.value.string_value()
    }

    pub fn set_string_value(&mut self, value: &str) -> TreeResult<()> {
        self.value.set_string_value(value)
    }

    pub fn set_code_value(&mut self, code: CodedEntry) -> TreeResult<()> {
        if !code.is_valid() {
            return Err(TreeError::invalid_value(
                ValueType::Code,
                format!("invalid code {}", code),
            ));
        }
        match &mut self.value {
            ContentValue::Code(slot) => {
                *slot = Some(code);
                Ok(())
            }
            other => Err(TreeError::ValueTypeMismatch {
                expected: ValueType::Code,
                found: other.value_type(),
            }),
        }
    }

    pub fn numeric_value(&self) -> Option<&NumericValue> {
        match &self.value {
            ContentValue::Num(numeric) => Some(numeric),
            _ => None,
        }
    }

    fn numeric_mut(&mut self) -> TreeResult<&mut NumericValue> {
        match &mut self.value {
            ContentValue::Num(numeric) => Ok(numeric),
            other => Err(TreeError::ValueTypeMismatch {
                expected: ValueType::Num,
                found: other.value_type(),
            }),
        }
    }

    pub fn set_numeric_value(&mut self, value: &str, units: CodedEntry) -> TreeResult<()> {
        self.numeric_mut()?.set_value(value, units)
    }

    pub fn set_rational_representation(&mut self, numerator: i32, denominator: u32) -> TreeResult<()> {
        self.numeric_mut()?.set_rational(numerator, denominator)
    }

    pub fn set_floating_point_representation(&mut self, value: f64) -> TreeResult<()> {
        self.numeric_mut()?.set_floating_point(value)
    }

    pub fn set_numeric_value_qualifier(&mut self, qualifier: CodedEntry) -> TreeResult<()> {
        self.numeric_mut()?.set_qualifier(qualifier)
    }
}

/// A content item with its owned children, outside of any tree.
///
/// Produced by cloning or extracting from a tree, consumed by inserting into
/// one. Dropping it releases the whole subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedItem {
    item: ContentItem,
    children: ChildList,
}

/// Owned children of a detached item. Dropped iteratively, a deep chain
/// never recurses.
#[derive(Debug, Clone, Default, PartialEq)]
struct ChildList(Vec<DetachedItem>);

impl Drop for ChildList {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.0);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children.0);
        }
    }
}

impl DetachedItem {
    pub fn new(relationship: Relationship, value: ContentValue) -> Self {
        Self::from_item(ContentItem::new(relationship, value))
    }

    /// Empty item of the given types, `None` for a sentinel.
    pub fn create(relationship: RelationshipType, value_type: ValueType) -> Option<Self> {
        ContentItem::create(relationship, value_type).map(Self::from_item)
    }

    pub fn from_item(item: ContentItem) -> Self {
        Self {
            item,
            children: ChildList::default(),
        }
    }

    pub fn with_concept_name(mut self, concept_name: CodedEntry) -> TreeResult<Self> {
        self.item.set_concept_name(concept_name)?;
        Ok(self)
    }

    pub fn with_child(mut self, child: DetachedItem) -> Self {
        self.children.0.push(child);
        self
    }

    pub fn item(&self) -> &ContentItem {
        &self.item
    }

    pub fn item_mut(&mut self) -> &mut ContentItem {
        &mut self.item
    }

    pub fn children(&self) -> &[DetachedItem] {
        &self.children.0
    }

    pub fn push_child(&mut self, child: DetachedItem) {
        self.children.0.push(child);
    }

    pub fn set_relationship(&mut self, relationship: Relationship) {
        self.item.relationship = relationship;
    }

    /// Number of items in this subtree, including itself.
    pub fn count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children());
        }
        count
    }

    pub(crate) fn into_parts(self) -> (ContentItem, Vec<DetachedItem>) {
        let mut children = self.children;
        (self.item, std::mem::take(&mut children.0))
    }

    /// Rebuilds a subtree from its items in document order, each paired with
    /// the slot of its parent in that order (`None` for the subtree root).
    pub(crate) fn assemble(nodes: Vec<(ContentItem, Option<usize>)>) -> Option<Self> {
        let mut children: Vec<Vec<DetachedItem>> = nodes.iter().map(|_| Vec::new()).collect();
        let mut root = None;
        for (slot, (item, parent)) in nodes.into_iter().enumerate().rev() {
            let mut own = children.get_mut(slot).map(std::mem::take).unwrap_or_default();
            own.reverse();
            let node = Self {
                item,
                children: ChildList(own),
            };
            match parent.and_then(|p| children.get_mut(p)) {
                Some(siblings) => siblings.push(node),
                None => root = Some(node),
            }
        }
        root
    }
}
