//! Arena storage for content item trees
//!
//! Nodes live in a generational arena and link to each other by index, a stale
//! index (node removed meanwhile) simply resolves to `None`.

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::item::{ContentItem, DetachedItem};
use crate::domain::types::NodeId;

/// Node of a committed tree.
#[derive(Debug)]
pub struct TreeNode {
    pub(crate) id: NodeId,
    pub(crate) item: ContentItem,
    /// Index of parent node in the arena, None for top-level nodes
    pub(crate) parent: Option<Index>,
    /// Indices of child nodes in the arena, in document order
    pub(crate) children: Vec<Index>,
}

impl TreeNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn item(&self) -> &ContentItem {
        &self.item
    }
}

/// Arena-based tree structure.
///
/// Top-level nodes are kept in order; a document has at most one, a fragment
/// may have several.
#[derive(Debug, Default)]
pub(crate) struct TreeArena {
    arena: Arena<TreeNode>,
    roots: Vec<Index>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.roots.clear();
    }

    pub fn first_root(&self) -> Option<Index> {
        self.roots.first().copied()
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn parent(&self, idx: Index) -> Option<Index> {
        self.get_node(idx).and_then(|node| node.parent)
    }

    /// Sibling list containing `idx`: its parent's children or the roots.
    pub fn siblings(&self, idx: Index) -> &[Index] {
        match self.parent(idx).and_then(|parent| self.get_node(parent)) {
            Some(parent) => &parent.children,
            None => &self.roots,
        }
    }

    pub fn sibling_position(&self, idx: Index) -> Option<usize> {
        self.siblings(idx).iter().position(|&sibling| sibling == idx)
    }

    /// Links a new node below `parent` (or at top level) at sibling slot `at`.
    #[instrument(level = "trace", skip(self, item))]
    pub fn insert_node(
        &mut self,
        id: NodeId,
        item: ContentItem,
        parent: Option<Index>,
        at: usize,
    ) -> Index {
        let node_idx = self.arena.insert(TreeNode {
            id,
            item,
            parent,
            children: Vec::new(),
        });
        let slots = match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        let at = at.min(slots.len());
        slots.insert(at, node_idx);
        node_idx
    }

    /// Unlinks the subtree rooted at `idx` and hands it out as a detached item.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, idx: Index) -> Option<DetachedItem> {
        let parent = self.get_node(idx)?.parent;
        let slots = match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        };
        slots.retain(|&sibling| sibling != idx);
        self.take_subtree(idx)
    }

    fn take_subtree(&mut self, idx: Index) -> Option<DetachedItem> {
        let nodes = self
            .subtree_order(idx)
            .into_iter()
            .map(|(i, parent)| self.arena.remove(i).map(|node| (node.item, parent)))
            .collect::<Option<Vec<_>>>()?;
        DetachedItem::assemble(nodes)
    }

    /// Deep copy of the subtree rooted at `idx`, without ids.
    pub fn copy_subtree(&self, idx: Index) -> Option<DetachedItem> {
        let nodes = self
            .subtree_order(idx)
            .into_iter()
            .map(|(i, parent)| self.get_node(i).map(|node| (node.item.clone(), parent)))
            .collect::<Option<Vec<_>>>()?;
        DetachedItem::assemble(nodes)
    }

    /// Subtree of `idx` in document order, each entry paired with the slot of
    /// its parent within the returned list.
    fn subtree_order(&self, idx: Index) -> Vec<(Index, Option<usize>)> {
        let mut order = Vec::new();
        let mut stack = vec![(idx, None)];
        while let Some((current, parent)) = stack.pop() {
            if let Some(node) = self.get_node(current) {
                let slot = order.len();
                for &child in node.children.iter().rev() {
                    stack.push((child, Some(slot)));
                }
                order.push((current, parent));
            }
        }
        order
    }

    /// Next node in document order (depth-first, pre-order).
    pub fn next_in_order(&self, idx: Index) -> Option<Index> {
        if let Some(&first_child) = self.get_node(idx)?.children.first() {
            return Some(first_child);
        }
        let mut current = idx;
        loop {
            let siblings = self.siblings(current);
            let position = siblings.iter().position(|&sibling| sibling == current)?;
            if let Some(&next) = siblings.get(position + 1) {
                return Some(next);
            }
            current = self.parent(current)?;
        }
    }

    /// Previous node in document order.
    pub fn previous_in_order(&self, idx: Index) -> Option<Index> {
        let position = self.sibling_position(idx)?;
        if position == 0 {
            return self.parent(idx);
        }
        let mut current = self.siblings(idx)[position - 1];
        while let Some(&last_child) = self.get_node(current)?.children.last() {
            current = last_child;
        }
        Some(current)
    }

    /// 1-based depth of `idx`, top-level nodes are on level 1.
    pub fn level(&self, idx: Index) -> usize {
        let mut level = 0;
        let mut current = Some(idx);
        while let Some(node) = current.and_then(|i| self.get_node(i)) {
            level += 1;
            current = node.parent;
        }
        level
    }

    /// Dotted 1-based sibling path, e.g. `1.2.1`.
    pub fn position_string(&self, idx: Index) -> Option<String> {
        let mut path = Vec::new();
        let mut current = Some(idx);
        while let Some(i) = current {
            path.push(self.sibling_position(i)? + 1);
            current = self.parent(i);
        }
        path.reverse();
        Some(
            path.iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join("."),
        )
    }

    pub fn find(&self, id: NodeId) -> Option<Index> {
        self.iter().find(|(_, _, node)| node.id == id).map(|(idx, _, _)| idx)
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, level, _)| level).max().unwrap_or(0)
    }
}

/// Document-order traversal yielding `(index, level, node)`.
pub(crate) struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, usize)>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let stack = arena.roots.iter().rev().map(|&root| (root, 1)).collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, level)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push((child, level + 1));
                }
                return Some((current_idx, level, node));
            }
        }
        None
    }
}
