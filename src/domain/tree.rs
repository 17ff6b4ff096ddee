//! Cursor-based content trees
//!
//! [`DocumentTree`] holds a complete report with a single `IS ROOT` node,
//! [`DocumentSubTree`] a fragment with any number of top-level items. Both
//! are the same [`ContentTree`] and differ only in how the grammar treats
//! their top level.

use std::fmt;
use std::marker::PhantomData;
use std::num::NonZeroUsize;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::{TreeArena, TreeNode};
use crate::domain::code::CodedEntry;
use crate::domain::error::{Rejected, TreeError, TreeResult};
use crate::domain::grammar::{is_legal, DocumentType, InsertionContext, Position, TreeKind};
use crate::domain::item::{ContentItem, DetachedItem};
use crate::domain::types::{AddMode, NodeId, RelationshipType, ValueType};

mod sealed {
    pub trait Sealed {}
}

/// Marker selecting the grammar rules for a tree's top level.
pub trait TreeFlavor: sealed::Sealed + fmt::Debug {
    const KIND: TreeKind;
}

/// Full report: exactly one root carrying `IS ROOT`.
#[derive(Debug, Clone, Copy)]
pub struct Document;

/// Detached fragment: no dedicated root, `UNKNOWN` edges accepted.
#[derive(Debug, Clone, Copy)]
pub struct Fragment;

impl sealed::Sealed for Document {}
impl sealed::Sealed for Fragment {}

impl TreeFlavor for Document {
    const KIND: TreeKind = TreeKind::Document;
}

impl TreeFlavor for Fragment {
    const KIND: TreeKind = TreeKind::Fragment;
}

pub type DocumentTree = ContentTree<Document>;
pub type DocumentSubTree = ContentTree<Fragment>;

/// Where an insertion lands.
#[derive(Debug, Clone, Copy)]
struct Target {
    parent: Option<Index>,
    at: usize,
    position: Position,
}

/// Tree of content items with a cursor.
///
/// The cursor is an arena index and is revalidated on every use. Ids come
/// from a counter that only grows, so an id never refers to two different
/// nodes during the life of a tree.
#[derive(Debug)]
pub struct ContentTree<F: TreeFlavor> {
    arena: TreeArena,
    cursor: Option<Index>,
    next_id: NonZeroUsize,
    constraints: Option<DocumentType>,
    /// Set by structural mutations: the next named search starts at the root.
    search_from_root: bool,
    _flavor: PhantomData<F>,
}

impl ContentTree<Document> {
    pub fn new(document_type: DocumentType) -> Self {
        Self::empty(Some(document_type))
    }

    pub fn document_type(&self) -> DocumentType {
        self.constraints.unwrap_or_default()
    }
}

impl Default for ContentTree<Document> {
    fn default() -> Self {
        Self::new(DocumentType::default())
    }
}

impl ContentTree<Fragment> {
    /// Fragment checked only against the structural and sentinel rules.
    pub fn new() -> Self {
        Self::empty(None)
    }

    /// Fragment whose parent/child edges also follow `document_type`.
    pub fn with_constraints(document_type: DocumentType) -> Self {
        Self::empty(Some(document_type))
    }

    /// Hands out the top-level items with their subtrees, in order.
    pub fn into_items(mut self) -> Vec<DetachedItem> {
        let roots = self.arena.roots().to_vec();
        roots
            .into_iter()
            .filter_map(|root| self.arena.detach(root))
            .collect()
    }
}

impl Default for ContentTree<Fragment> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: TreeFlavor> ContentTree<F> {
    fn empty(constraints: Option<DocumentType>) -> Self {
        Self {
            arena: TreeArena::new(),
            cursor: None,
            next_id: NonZeroUsize::MIN,
            constraints,
            search_from_root: true,
            _flavor: PhantomData,
        }
    }

    pub fn kind(&self) -> TreeKind {
        F::KIND
    }

    pub fn constraints(&self) -> Option<DocumentType> {
        self.constraints
    }

    // ---------------------------------------------------------------------
    // Insertion
    // ---------------------------------------------------------------------

    /// Creates an empty item and inserts it at `mode` relative to the cursor.
    #[instrument(level = "trace", skip(self))]
    pub fn add_content_item(
        &mut self,
        relationship: RelationshipType,
        value_type: ValueType,
        mode: AddMode,
    ) -> TreeResult<NodeId> {
        let item = DetachedItem::create(relationship, value_type).ok_or(
            TreeError::InvalidRelationshipOrValueType {
                relationship,
                value_type,
            },
        )?;
        self.insert_content_item(item, mode)
            .map_err(Rejected::into_error)
    }

    /// Like [`add_content_item`](Self::add_content_item) with a concept name,
    /// which is checked before anything else.
    #[instrument(level = "trace", skip(self))]
    pub fn add_content_item_with_name(
        &mut self,
        relationship: RelationshipType,
        value_type: ValueType,
        concept_name: CodedEntry,
        mode: AddMode,
    ) -> TreeResult<NodeId> {
        if !concept_name.is_valid() {
            return Err(TreeError::InvalidConceptName(concept_name.to_string()));
        }
        let item = DetachedItem::create(relationship, value_type)
            .ok_or(TreeError::InvalidRelationshipOrValueType {
                relationship,
                value_type,
            })?
            .with_concept_name(concept_name)?;
        self.insert_content_item(item, mode)
            .map_err(Rejected::into_error)
    }

    /// Inserts as first child of the cursor.
    #[instrument(level = "trace", skip(self))]
    pub fn add_child_content_item(
        &mut self,
        relationship: RelationshipType,
        value_type: ValueType,
        concept_name: Option<CodedEntry>,
    ) -> TreeResult<NodeId> {
        if self.cursor_index().is_none() {
            return Err(TreeError::EmptyCursor);
        }
        match concept_name {
            Some(concept_name) => self.add_content_item_with_name(
                relationship,
                value_type,
                concept_name,
                AddMode::BelowCurrent,
            ),
            None => self.add_content_item(relationship, value_type, AddMode::BelowCurrent),
        }
    }

    /// Inserts a caller-built item together with its children.
    ///
    /// On failure the item is destroyed when `delete_if_fail` is set, otherwise
    /// it comes back inside the [`Rejected`].
    #[instrument(level = "trace", skip(self, node))]
    pub fn add_content_item_node(
        &mut self,
        node: Option<DetachedItem>,
        mode: AddMode,
        delete_if_fail: bool,
    ) -> Result<NodeId, Rejected<DetachedItem>> {
        let Some(node) = node else {
            debug!("no content item given");
            return Err(Rejected::discarded(TreeError::NullNode));
        };
        match self.insert_content_item(node, mode) {
            Err(rejected) if delete_if_fail => Err(Rejected::discarded(rejected.into_error())),
            result => result,
        }
    }

    /// Inserts a caller-built item; on failure the item is always handed back.
    #[instrument(level = "trace", skip(self, node))]
    pub fn insert_content_item(
        &mut self,
        node: DetachedItem,
        mode: AddMode,
    ) -> Result<NodeId, Rejected<DetachedItem>> {
        let target = match self.target(mode) {
            Ok(target) => target,
            Err(error) => return Err(Rejected::returned(error, node)),
        };
        if let Err(error) = self.check_detached(&node, target.position) {
            return Err(Rejected::returned(error, node));
        }
        let count = node.count();
        let (idx, id) = self.link(node, target.parent, target.at);
        self.settle(idx);
        debug!(%id, count, ?mode, "inserted content item");
        Ok(id)
    }

    /// Splices every top-level item of `subtree`, in order, starting at the
    /// `mode` position. Nothing is inserted unless all of them fit.
    #[instrument(level = "trace", skip(self, subtree))]
    pub fn insert_subtree(
        &mut self,
        subtree: DocumentSubTree,
        mode: AddMode,
    ) -> Result<NodeId, Rejected<DocumentSubTree>> {
        if subtree.is_empty() {
            return Err(Rejected::returned(TreeError::NullNode, subtree));
        }
        let target = match self.target(mode) {
            Ok(target) => target,
            Err(error) => return Err(Rejected::returned(error, subtree)),
        };
        if let Err(error) = self.check_fragment(&subtree, target.position) {
            return Err(Rejected::returned(error, subtree));
        }
        let mut first = None;
        for (offset, item) in subtree.into_items().into_iter().enumerate() {
            let linked = self.link(item, target.parent, target.at + offset);
            first.get_or_insert(linked);
        }
        let Some((idx, id)) = first else {
            return Err(Rejected::discarded(TreeError::NullNode));
        };
        self.settle(idx);
        debug!(%id, "spliced subtree");
        Ok(id)
    }

    fn target(&self, mode: AddMode) -> TreeResult<Target> {
        let Some(current) = self.cursor_index() else {
            return if self.arena.is_empty() {
                Ok(Target {
                    parent: None,
                    at: 0,
                    position: Position::Root,
                })
            } else {
                Err(TreeError::EmptyCursor)
            };
        };
        let node = self.arena.get_node(current).ok_or(TreeError::EmptyCursor)?;
        let target = match mode {
            AddMode::AfterCurrent | AddMode::BeforeCurrent => {
                let offset = self
                    .arena
                    .sibling_position(current)
                    .ok_or(TreeError::EmptyCursor)?;
                let position = match node.parent.and_then(|p| self.arena.get_node(p)) {
                    Some(parent) => Position::Child(parent.item.value_type()),
                    None => Position::TopLevel,
                };
                Target {
                    parent: node.parent,
                    at: if mode == AddMode::AfterCurrent { offset + 1 } else { offset },
                    position,
                }
            }
            AddMode::BelowCurrent => Target {
                parent: Some(current),
                at: 0,
                position: Position::Child(node.item.value_type()),
            },
            AddMode::BelowCurrentAfterLastChild => Target {
                parent: Some(current),
                at: node.children.len(),
                position: Position::Child(node.item.value_type()),
            },
        };
        Ok(target)
    }

    fn context(&self, position: Position) -> InsertionContext {
        InsertionContext {
            kind: F::KIND,
            position,
            constraints: self.constraints,
        }
    }

    fn check(&self, item: &ContentItem, position: Position) -> TreeResult<()> {
        let relationship = item.relationship_type();
        let value_type = item.value_type();
        if is_legal(relationship, value_type, &self.context(position)) {
            Ok(())
        } else {
            debug!(%relationship, %value_type, ?position, "rejected by grammar");
            Err(TreeError::InvalidRelationshipOrValueType {
                relationship,
                value_type,
            })
        }
    }

    fn check_detached(&self, node: &DetachedItem, position: Position) -> TreeResult<()> {
        let mut pending = vec![(node, position)];
        while let Some((node, position)) = pending.pop() {
            self.check(node.item(), position)?;
            let below = Position::Child(node.item().value_type());
            pending.extend(node.children().iter().rev().map(|child| (child, below)));
        }
        Ok(())
    }

    fn check_fragment(&self, subtree: &DocumentSubTree, position: Position) -> TreeResult<()> {
        let following = match position {
            Position::Root => Position::TopLevel,
            other => other,
        };
        let first = subtree.arena.first_root();
        for (idx, _, node) in subtree.arena.iter() {
            let position = match node.parent.and_then(|p| subtree.arena.get_node(p)) {
                Some(parent) => Position::Child(parent.item.value_type()),
                None if Some(idx) == first => position,
                None => following,
            };
            self.check(&node.item, position)?;
        }
        Ok(())
    }

    /// Links `node` and its descendants, numbering them in document order.
    fn link(&mut self, node: DetachedItem, parent: Option<Index>, at: usize) -> (Index, NodeId) {
        let (item, children) = node.into_parts();
        let id = self.allocate_id();
        let idx = self.arena.insert_node(id, item, parent, at);
        let mut pending = Self::pending_children(children, idx);
        while let Some((node, parent, at)) = pending.pop() {
            let (item, children) = node.into_parts();
            let child_id = self.allocate_id();
            let child_idx = self.arena.insert_node(child_id, item, Some(parent), at);
            pending.extend(Self::pending_children(children, child_idx));
        }
        (idx, id)
    }

    /// Children queued for `link`, first child on top of the stack.
    fn pending_children(
        children: Vec<DetachedItem>,
        parent: Index,
    ) -> Vec<(DetachedItem, Index, usize)> {
        children
            .into_iter()
            .enumerate()
            .rev()
            .map(|(offset, child)| (child, parent, offset))
            .collect()
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Cursor placement after a structural change.
    fn settle(&mut self, idx: Index) {
        self.cursor = Some(idx);
        self.search_from_root = true;
    }

    // ---------------------------------------------------------------------
    // Cursor and navigation
    // ---------------------------------------------------------------------

    fn cursor_index(&self) -> Option<Index> {
        self.cursor.filter(|&idx| self.arena.get_node(idx).is_some())
    }

    pub fn current(&self) -> Option<&ContentItem> {
        self.current_node().map(TreeNode::item)
    }

    pub fn current_mut(&mut self) -> Option<&mut ContentItem> {
        let idx = self.cursor_index()?;
        self.arena.get_node_mut(idx).map(|node| &mut node.item)
    }

    pub fn current_node(&self) -> Option<&TreeNode> {
        self.cursor_index().and_then(|idx| self.arena.get_node(idx))
    }

    /// Id of the cursor node, `None` when the cursor is empty.
    pub fn node_id(&self) -> Option<NodeId> {
        self.current_node().map(TreeNode::id)
    }

    fn move_to(&mut self, idx: Option<Index>) -> Option<NodeId> {
        let idx = idx?;
        let id = self.arena.get_node(idx)?.id;
        self.cursor = Some(idx);
        self.search_from_root = false;
        Some(id)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn goto_root(&mut self) -> Option<NodeId> {
        self.move_to(self.arena.first_root())
    }

    /// Previous node in document order.
    #[instrument(level = "trace", skip(self))]
    pub fn goto_previous(&mut self) -> Option<NodeId> {
        let previous = self
            .cursor_index()
            .and_then(|idx| self.arena.previous_in_order(idx));
        self.move_to(previous)
    }

    /// Next node in document order.
    #[instrument(level = "trace", skip(self))]
    pub fn goto_next(&mut self) -> Option<NodeId> {
        let next = self
            .cursor_index()
            .and_then(|idx| self.arena.next_in_order(idx));
        self.move_to(next)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn goto_parent(&mut self) -> Option<NodeId> {
        let parent = self.cursor_index().and_then(|idx| self.arena.parent(idx));
        self.move_to(parent)
    }

    /// First child of the cursor node.
    #[instrument(level = "trace", skip(self))]
    pub fn goto_child(&mut self) -> Option<NodeId> {
        let child = self
            .current_node()
            .and_then(|node| node.children.first().copied());
        self.move_to(child)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn goto_next_sibling(&mut self) -> Option<NodeId> {
        self.move_to(self.sibling(|position, _| position.checked_add(1)))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn goto_previous_sibling(&mut self) -> Option<NodeId> {
        self.move_to(self.sibling(|position, _| position.checked_sub(1)))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn goto_first_sibling(&mut self) -> Option<NodeId> {
        self.move_to(self.sibling(|_, _| Some(0)))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn goto_last_sibling(&mut self) -> Option<NodeId> {
        self.move_to(self.sibling(|_, count| count.checked_sub(1)))
    }

    fn sibling(&self, pick: impl FnOnce(usize, usize) -> Option<usize>) -> Option<Index> {
        let current = self.cursor_index()?;
        let siblings = self.arena.siblings(current);
        let position = siblings.iter().position(|&sibling| sibling == current)?;
        siblings.get(pick(position, siblings.len())?).copied()
    }

    /// Moves to the node with `id` if it is still part of the tree.
    #[instrument(level = "trace", skip(self))]
    pub fn goto_node(&mut self, id: NodeId) -> Option<NodeId> {
        self.move_to(self.arena.find(id))
    }

    /// Follows a dotted 1-based sibling path such as `1.2.1`.
    #[instrument(level = "trace", skip(self))]
    pub fn goto_position(&mut self, position: &str) -> Option<NodeId> {
        let mut slots = self.arena.roots();
        let mut found = None;
        for step in position.trim().split('.') {
            let offset = step.trim().parse::<usize>().ok()?.checked_sub(1)?;
            let idx = *slots.get(offset)?;
            slots = &self.arena.get_node(idx)?.children;
            found = Some(idx);
        }
        self.move_to(found)
    }

    /// Dotted 1-based sibling path of the cursor node.
    pub fn position(&self) -> Option<String> {
        self.cursor_index()
            .and_then(|idx| self.arena.position_string(idx))
    }

    /// Nesting level of the cursor node, 1 for top level, 0 when empty.
    pub fn level(&self) -> usize {
        self.cursor_index()
            .map_or(0, |idx| self.arena.level(idx))
    }

    /// Moves forward in document order to the next node named `concept`.
    ///
    /// Continues strictly after the cursor when it was placed by navigation
    /// or an earlier search. After a structural change (insert, remove,
    /// extract, clear) the search starts over at the root, so consecutive calls
    /// walk through successive matches of the finished tree.
    #[instrument(level = "trace", skip(self))]
    pub fn goto_named_node(&mut self, concept: &CodedEntry) -> Option<NodeId> {
        let start = match self.cursor_index() {
            Some(idx) if !self.search_from_root => self.arena.next_in_order(idx),
            _ => self.arena.first_root(),
        };
        let found = self.search_from(start, concept);
        self.move_to(found)
    }

    /// Moves to the first node in document order named `concept`.
    #[instrument(level = "trace", skip(self))]
    pub fn goto_named_node_from_root(&mut self, concept: &CodedEntry) -> Option<NodeId> {
        let found = self.search_from(self.arena.first_root(), concept);
        self.move_to(found)
    }

    fn search_from(&self, start: Option<Index>, concept: &CodedEntry) -> Option<Index> {
        let mut candidate = start;
        while let Some(idx) = candidate {
            if self.arena.get_node(idx)?.item.has_concept_name(concept) {
                return Some(idx);
            }
            candidate = self.arena.next_in_order(idx);
        }
        None
    }

    // ---------------------------------------------------------------------
    // Cloning, removal, extraction
    // ---------------------------------------------------------------------

    /// Deep copy of the cursor's subtree. The copy has no ids until inserted.
    pub fn clone_current_tree_node(&self) -> Option<DetachedItem> {
        self.cursor_index()
            .and_then(|idx| self.arena.copy_subtree(idx))
    }

    /// Drops the cursor's subtree and returns the id of the new cursor node:
    /// next sibling, else previous sibling, else parent.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_current_content_item(&mut self) -> Option<NodeId> {
        let removed = self.take_current()?;
        debug!(count = removed.count(), "removed content item");
        self.node_id()
    }

    /// Detaches the cursor's subtree and hands it to the caller. The cursor
    /// moves as in [`remove_current_content_item`](Self::remove_current_content_item).
    #[instrument(level = "trace", skip(self))]
    pub fn extract_current_subtree(&mut self) -> Option<DetachedItem> {
        let extracted = self.take_current()?;
        debug!(count = extracted.count(), "extracted subtree");
        Some(extracted)
    }

    fn take_current(&mut self) -> Option<DetachedItem> {
        let current = self.cursor_index()?;
        let successor = self
            .sibling(|position, _| position.checked_add(1))
            .or_else(|| self.sibling(|position, _| position.checked_sub(1)))
            .or_else(|| self.arena.parent(current));
        let detached = self.arena.detach(current)?;
        self.cursor = successor;
        self.search_from_root = true;
        Some(detached)
    }

    /// Removes every node. Ids handed out so far are not reused.
    #[instrument(level = "trace", skip(self))]
    pub fn clear(&mut self) {
        self.arena.clear();
        self.cursor = None;
        self.search_from_root = true;
    }

    // ---------------------------------------------------------------------
    // Read access
    // ---------------------------------------------------------------------

    /// `(level, node)` pairs in document order, levels starting at 1.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TreeNode)> + '_ {
        self.arena.iter().map(|(_, level, node)| (level, node))
    }

    /// Top-level nodes in order; a non-empty document has exactly one.
    pub fn top_level(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.arena
            .roots()
            .iter()
            .filter_map(|&idx| self.arena.get_node(idx))
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.arena
            .first_root()
            .and_then(|idx| self.arena.get_node(idx))
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.find(id).and_then(|idx| self.arena.get_node(idx))
    }

    pub fn children<'a>(&'a self, node: &'a TreeNode) -> impl Iterator<Item = &'a TreeNode> + 'a {
        node.children
            .iter()
            .filter_map(|&idx| self.arena.get_node(idx))
    }

    /// Every node named `concept`, in document order. The cursor stays put.
    pub fn named_nodes<'a>(
        &'a self,
        concept: &'a CodedEntry,
    ) -> impl Iterator<Item = &'a TreeNode> + 'a {
        self.iter()
            .map(|(_, node)| node)
            .filter(move |node| node.item.has_concept_name(concept))
    }

    pub fn count_nodes(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.arena.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::ContentValue;
    use crate::util::testing;
    use rstest::{fixture, rstest};

    fn summary() -> CodedEntry {
        CodedEntry::new("121111", "DCM", "Summary")
    }

    fn distance() -> CodedEntry {
        CodedEntry::new("121206", "DCM", "Distance")
    }

    fn nos() -> CodedEntry {
        CodedEntry::new("1234", "99_PRV", "NOS")
    }

    #[fixture]
    fn document() -> DocumentTree {
        testing::init_test_setup();
        let mut tree = DocumentTree::default();
        tree.add_content_item_with_name(
            RelationshipType::IsRoot,
            ValueType::Container,
            summary(),
            AddMode::default(),
        )
        .unwrap();
        tree
    }

    #[rstest]
    #[case(RelationshipType::IsRoot, true)]
    #[case(RelationshipType::Contains, false)]
    #[case(RelationshipType::HasObsContext, false)]
    #[case(RelationshipType::Unknown, false)]
    #[case(RelationshipType::Invalid, false)]
    fn given_empty_document_when_adding_first_item_then_only_root_relationship_accepted(
        #[case] relationship: RelationshipType,
        #[case] accepted: bool,
    ) {
        let mut tree = DocumentTree::default();

        let result = tree.add_content_item(relationship, ValueType::Container, AddMode::default());

        assert_eq!(result.is_ok(), accepted);
        assert_eq!(tree.is_empty(), !accepted);
    }

    #[rstest]
    #[case(RelationshipType::Invalid, ValueType::Text)]
    #[case(RelationshipType::Contains, ValueType::Invalid)]
    #[case(RelationshipType::Invalid, ValueType::Invalid)]
    fn given_sentinel_pair_when_adding_then_both_flavors_unchanged(
        mut document: DocumentTree,
        #[case] relationship: RelationshipType,
        #[case] value_type: ValueType,
    ) {
        let before = document.node_id();
        let err = document
            .add_child_content_item(relationship, value_type, None)
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidRelationshipOrValueType { .. }));
        assert_eq!(document.node_id(), before);
        assert_eq!(document.count_nodes(), 1);

        let mut fragment = DocumentSubTree::new();
        assert!(fragment
            .add_content_item(relationship, value_type, AddMode::default())
            .is_err());
        assert!(fragment.is_empty());
        assert!(fragment.node_id().is_none());
    }

    #[rstest]
    fn given_unknown_child_when_adding_then_only_fragment_accepts(mut document: DocumentTree) {
        let mut fragment = DocumentSubTree::new();
        fragment
            .add_content_item(RelationshipType::Unknown, ValueType::Container, AddMode::default())
            .unwrap();

        assert!(fragment
            .add_child_content_item(RelationshipType::Unknown, ValueType::Text, None)
            .is_ok());
        assert!(document
            .add_child_content_item(RelationshipType::Unknown, ValueType::Text, None)
            .is_err());
        assert!(document
            .add_child_content_item(RelationshipType::Contains, ValueType::Text, None)
            .is_ok());
    }

    #[rstest]
    fn given_successful_inserts_when_checking_cursor_then_points_at_new_node(
        mut document: DocumentTree,
    ) {
        let modes = [
            AddMode::BelowCurrent,
            AddMode::AfterCurrent,
            AddMode::BeforeCurrent,
            AddMode::BelowCurrentAfterLastChild,
        ];
        for mode in modes {
            let value_type = if mode == AddMode::BelowCurrentAfterLastChild {
                ValueType::Code
            } else {
                ValueType::Text
            };
            let relationship = if mode == AddMode::BelowCurrentAfterLastChild {
                RelationshipType::HasConceptMod
            } else {
                RelationshipType::Contains
            };
            let id = document
                .add_content_item(relationship, value_type, mode)
                .unwrap();
            assert_eq!(document.node_id(), Some(id));
        }
        assert_eq!(document.count_nodes(), 5);
    }

    #[test]
    fn given_nodes_when_inserting_with_modes_then_positions_match() {
        let mut tree = DocumentTree::default();
        let root = tree
            .add_content_item(RelationshipType::IsRoot, ValueType::Container, AddMode::AfterCurrent)
            .unwrap();
        let b = tree
            .add_content_item(RelationshipType::Contains, ValueType::Text, AddMode::BelowCurrent)
            .unwrap();
        let a = tree
            .add_content_item(RelationshipType::Contains, ValueType::Text, AddMode::BeforeCurrent)
            .unwrap();
        tree.goto_root();
        let c = tree
            .add_content_item(
                RelationshipType::Contains,
                ValueType::Text,
                AddMode::BelowCurrentAfterLastChild,
            )
            .unwrap();

        let order: Vec<NodeId> = tree.iter().map(|(_, node)| node.id()).collect();
        assert_eq!(order, vec![root, a, b, c]);
        assert_eq!(tree.position().as_deref(), Some("1.3"));
        assert_eq!(tree.level(), 2);
    }

    #[rstest]
    fn given_second_root_when_adding_after_root_then_rejected(mut document: DocumentTree) {
        let result = document.add_content_item(
            RelationshipType::IsRoot,
            ValueType::Container,
            AddMode::AfterCurrent,
        );
        assert!(result.is_err());
        assert_eq!(document.count_nodes(), 1);
    }

    #[rstest]
    fn given_failing_node_when_delete_if_fail_then_destroyed_else_returned(
        mut document: DocumentTree,
    ) {
        let node = DetachedItem::create(RelationshipType::IsRoot, ValueType::Text).unwrap();

        let rejected = document
            .add_content_item_node(Some(node.clone()), AddMode::BelowCurrent, true)
            .unwrap_err();
        assert!(!rejected.is_returned());
        assert!(rejected.into_inner().is_none());

        let rejected = document
            .add_content_item_node(Some(node.clone()), AddMode::BelowCurrent, false)
            .unwrap_err();
        let mut returned = rejected.into_inner().unwrap();
        assert_eq!(returned, node);

        returned.set_relationship(crate::domain::types::Relationship::Contains);
        let id = document
            .add_content_item_node(Some(returned), AddMode::BelowCurrent, false)
            .unwrap();
        assert_eq!(document.node_id(), Some(id));
    }

    #[rstest]
    fn given_no_node_when_adding_then_null_node(mut document: DocumentTree) {
        let rejected = document
            .add_content_item_node(None, AddMode::BelowCurrent, false)
            .unwrap_err();
        assert_eq!(rejected.error(), &TreeError::NullNode);
        assert_eq!(document.count_nodes(), 1);
    }

    #[test]
    fn given_empty_tree_when_adding_child_then_empty_cursor() {
        let mut tree = DocumentTree::default();
        let err = tree
            .add_child_content_item(RelationshipType::Contains, ValueType::Text, None)
            .unwrap_err();
        assert_eq!(err, TreeError::EmptyCursor);
    }

    #[rstest]
    fn given_text_item_when_cloning_then_copy_is_independent(mut document: DocumentTree) {
        document
            .add_child_content_item(RelationshipType::Contains, ValueType::Text, Some(summary()))
            .unwrap();
        document
            .current_mut()
            .unwrap()
            .set_string_value("Sample text")
            .unwrap();

        let clone = document.clone_current_tree_node().unwrap();
        document
            .current_mut()
            .unwrap()
            .set_string_value("Changed")
            .unwrap();

        assert_eq!(clone.item().value_type(), ValueType::Text);
        assert_eq!(clone.item().string_value(), Some("Sample text"));
        assert_eq!(clone.item().concept_name(), Some(&summary()));
        assert_eq!(clone.item().relationship_type(), RelationshipType::Contains);
    }

    #[test]
    fn given_empty_cursor_when_cloning_then_none() {
        assert!(DocumentTree::default().clone_current_tree_node().is_none());
    }

    #[rstest]
    fn given_named_children_when_searching_forward_then_walks_matches(mut document: DocumentTree) {
        let n = document
            .add_child_content_item(RelationshipType::Contains, ValueType::Num, Some(distance()))
            .unwrap();
        let n1 = document
            .add_content_item_with_name(
                RelationshipType::Contains,
                ValueType::Code,
                nos(),
                AddMode::AfterCurrent,
            )
            .unwrap();
        assert_eq!(n1.value(), n.value() + 1);

        assert_eq!(document.goto_named_node(&distance()), Some(n));
        assert_eq!(document.goto_named_node(&nos()), Some(n1));
        assert_eq!(document.goto_named_node(&nos()), None);
        assert_eq!(document.goto_named_node(&distance()), None);
        assert_eq!(document.node_id(), Some(n1));
    }

    #[rstest]
    fn given_siblings_when_going_previous_then_cursor_moves_back(mut document: DocumentTree) {
        let a = document
            .add_child_content_item(RelationshipType::Contains, ValueType::Text, None)
            .unwrap();
        document
            .add_content_item(RelationshipType::Contains, ValueType::Num, AddMode::AfterCurrent)
            .unwrap();

        assert_eq!(document.goto_previous(), Some(a));
        assert_eq!(document.node_id(), Some(a));
    }

    #[rstest]
    fn given_root_cursor_when_going_previous_then_none_and_unchanged(mut document: DocumentTree) {
        let root = document.node_id();
        assert_eq!(document.goto_previous(), None);
        assert_eq!(document.node_id(), root);
    }

    #[rstest]
    fn given_removed_nodes_when_inserting_again_then_ids_not_reused(mut document: DocumentTree) {
        let first = document
            .add_child_content_item(RelationshipType::Contains, ValueType::Text, None)
            .unwrap();
        let root = document.remove_current_content_item();
        assert_eq!(root, document.root().map(TreeNode::id));
        assert!(document.node(first).is_none());

        let second = document
            .add_child_content_item(RelationshipType::Contains, ValueType::Text, None)
            .unwrap();
        assert!(second > first);
    }

    #[rstest]
    fn given_detached_subtree_when_inserting_then_numbered_in_document_order(
        mut document: DocumentTree,
    ) {
        let node = DetachedItem::new(
            crate::domain::types::Relationship::Contains,
            ContentValue::empty(ValueType::Container).unwrap(),
        )
        .with_child(DetachedItem::create(RelationshipType::Contains, ValueType::Text).unwrap())
        .with_child(DetachedItem::create(RelationshipType::Contains, ValueType::Code).unwrap());

        let id = document.insert_content_item(node, AddMode::BelowCurrent).unwrap();

        let ids: Vec<usize> = document.iter().map(|(_, node)| node.id().value()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(id.value(), 2);
        assert_eq!(document.depth(), 3);
    }

    #[rstest]
    fn given_subtree_with_unknown_descendant_when_transplanting_then_rejected_whole(
        mut document: DocumentTree,
    ) {
        let node = DetachedItem::create(RelationshipType::Contains, ValueType::Container)
            .unwrap()
            .with_child(DetachedItem::create(RelationshipType::Unknown, ValueType::Text).unwrap());

        let rejected = document
            .insert_content_item(node, AddMode::BelowCurrent)
            .unwrap_err();

        assert_eq!(
            rejected.error(),
            &TreeError::InvalidRelationshipOrValueType {
                relationship: RelationshipType::Unknown,
                value_type: ValueType::Text
            }
        );
        assert_eq!(rejected.into_inner().map(|n| n.count()), Some(2));
        assert_eq!(document.count_nodes(), 1);
    }

    #[rstest]
    fn given_fragment_when_splicing_then_all_top_level_items_inserted(mut document: DocumentTree) {
        let mut fragment = DocumentSubTree::with_constraints(DocumentType::Comprehensive);
        fragment
            .add_content_item(RelationshipType::Contains, ValueType::Text, AddMode::default())
            .unwrap();
        fragment
            .add_content_item(RelationshipType::Contains, ValueType::Num, AddMode::AfterCurrent)
            .unwrap();
        fragment
            .add_child_content_item(RelationshipType::HasConceptMod, ValueType::Code, None)
            .unwrap();

        let first = document
            .insert_subtree(fragment, AddMode::BelowCurrent)
            .unwrap();

        assert_eq!(document.node_id(), Some(first));
        assert_eq!(document.position().as_deref(), Some("1.1"));
        assert_eq!(document.count_nodes(), 4);
        assert_eq!(document.goto_position("1.2.1").map(NodeId::value), Some(4));
    }

    #[rstest]
    fn given_fragment_with_unknown_edge_when_splicing_then_returned_intact(
        mut document: DocumentTree,
    ) {
        let mut fragment = DocumentSubTree::new();
        fragment
            .add_content_item(RelationshipType::Unknown, ValueType::Text, AddMode::default())
            .unwrap();

        let rejected = document
            .insert_subtree(fragment, AddMode::BelowCurrent)
            .unwrap_err();

        assert_eq!(rejected.into_inner().map(|f| f.count_nodes()), Some(1));
        assert_eq!(document.count_nodes(), 1);
    }

    #[rstest]
    fn given_middle_child_when_extracting_then_cursor_moves_to_next_sibling(
        mut document: DocumentTree,
    ) {
        document
            .add_child_content_item(RelationshipType::Contains, ValueType::Text, None)
            .unwrap();
        let middle = document
            .add_content_item(RelationshipType::Contains, ValueType::Num, AddMode::AfterCurrent)
            .unwrap();
        let last = document
            .add_content_item(RelationshipType::Contains, ValueType::Code, AddMode::AfterCurrent)
            .unwrap();
        document.goto_node(middle).unwrap();

        let extracted = document.extract_current_subtree().unwrap();

        assert_eq!(extracted.item().value_type(), ValueType::Num);
        assert_eq!(document.node_id(), Some(last));
        assert_eq!(document.count_nodes(), 3);
    }

    #[rstest]
    fn given_cursor_on_last_sibling_when_navigating_siblings_then_wraps_within_bounds(
        mut document: DocumentTree,
    ) {
        let first = document
            .add_child_content_item(RelationshipType::Contains, ValueType::Text, None)
            .unwrap();
        let last = document
            .add_content_item(RelationshipType::Contains, ValueType::Text, AddMode::AfterCurrent)
            .unwrap();

        assert_eq!(document.goto_next_sibling(), None);
        assert_eq!(document.goto_first_sibling(), Some(first));
        assert_eq!(document.goto_previous_sibling(), None);
        assert_eq!(document.goto_last_sibling(), Some(last));
        assert_eq!(document.goto_parent(), document.root().map(TreeNode::id));
        assert_eq!(document.goto_child(), Some(first));
        assert_eq!(document.goto_next(), Some(last));
        assert_eq!(document.goto_next(), None);
    }

    #[rstest]
    fn given_tree_when_clearing_then_counter_keeps_growing(mut document: DocumentTree) {
        document.clear();
        assert!(document.is_empty());
        assert!(document.current().is_none());

        let id = document
            .add_content_item(RelationshipType::IsRoot, ValueType::Container, AddMode::default())
            .unwrap();
        assert_eq!(id.value(), 2);
    }

    #[test]
    fn given_fragment_when_converting_into_items_then_top_level_order_kept() {
        let mut fragment = DocumentSubTree::new();
        fragment
            .add_content_item(RelationshipType::Unknown, ValueType::Text, AddMode::default())
            .unwrap();
        fragment
            .add_content_item(RelationshipType::Unknown, ValueType::Code, AddMode::AfterCurrent)
            .unwrap();

        let items = fragment.into_items();

        let types: Vec<ValueType> = items.iter().map(|i| i.item().value_type()).collect();
        assert_eq!(types, vec![ValueType::Text, ValueType::Code]);
    }
}
