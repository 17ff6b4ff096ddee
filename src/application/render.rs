//! Text outline of a content tree

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use termtree::Tree;
use tracing::instrument;

use crate::domain::{ContentTree, TreeFlavor, TreeNode};

/// Which parts of a node end up in its outline label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub show_ids: bool,
    pub show_relationships: bool,
    pub show_values: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            show_ids: true,
            show_relationships: true,
            show_values: true,
        }
    }
}

pub trait TreeDisplay {
    fn to_outline(&self, title: &str, settings: &RenderSettings) -> Tree<String>;
}

impl<F: TreeFlavor> TreeDisplay for ContentTree<F> {
    #[instrument(level = "debug", skip(self, settings))]
    fn to_outline(&self, title: &str, settings: &RenderSettings) -> Tree<String> {
        let leaves: Vec<_> = self
            .top_level()
            .map(|node| build_outline(self, node, settings))
            .collect();
        Tree::new(title.to_string()).with_leaves(leaves)
    }
}

fn build_outline<F: TreeFlavor>(
    tree: &ContentTree<F>,
    node: &TreeNode,
    settings: &RenderSettings,
) -> Tree<String> {
    let leaves: Vec<_> = tree
        .children(node)
        .map(|child| build_outline(tree, child, settings))
        .collect();
    Tree::new(label(node, settings)).with_leaves(leaves)
}

/// `[id] RELATIONSHIP VALUE_TYPE (code,scheme,"meaning") = value @ observed`
pub fn label(node: &TreeNode, settings: &RenderSettings) -> String {
    let item = node.item();
    let id = settings.show_ids.then(|| format!("[{}]", node.id()));
    let relationship = settings
        .show_relationships
        .then(|| item.relationship_type().to_string());
    let concept = item.concept_name().map(ToString::to_string);
    let head = id
        .into_iter()
        .chain(relationship)
        .chain(std::iter::once(item.value_type().to_string()))
        .chain(concept)
        .join(" ");
    if !settings.show_values {
        return head;
    }
    match item.observation_datetime() {
        Some(observed) => format!(
            "{} = {} @ {}",
            head,
            item.value(),
            observed.format("%Y%m%d%H%M%S")
        ),
        None => format!("{} = {}", head, item.value()),
    }
}
