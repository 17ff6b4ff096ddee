//! Cursor navigation across a small report:
//!
//! ```text
//! 1     CONTAINER (root)
//! 1.1   ├── TEXT      (Finding)
//! 1.1.1 │   └── CODE  (Finding site)
//! 1.2   ├── NUM       (Distance)
//! 1.3   └── TEXT      (Finding)
//! ```

use rstest::{fixture, rstest};

use srtree::{AddMode, CodedEntry, DocumentTree, NodeId, RelationshipType, ValueType};

fn finding() -> CodedEntry {
    CodedEntry::new("121071", "DCM", "Finding")
}

struct Report {
    tree: DocumentTree,
    ids: Vec<NodeId>,
}

#[fixture]
fn report() -> Report {
    let mut tree = DocumentTree::default();
    let mut ids = Vec::new();
    ids.push(
        tree.add_content_item(RelationshipType::IsRoot, ValueType::Container, AddMode::default())
            .unwrap(),
    );
    ids.push(
        tree.add_child_content_item(RelationshipType::Contains, ValueType::Text, Some(finding()))
            .unwrap(),
    );
    ids.push(
        tree.add_child_content_item(
            RelationshipType::HasConceptMod,
            ValueType::Code,
            Some(CodedEntry::new("363698007", "SCT", "Finding site")),
        )
        .unwrap(),
    );
    tree.goto_parent().unwrap();
    ids.push(
        tree.add_content_item_with_name(
            RelationshipType::Contains,
            ValueType::Num,
            CodedEntry::new("121206", "DCM", "Distance"),
            AddMode::AfterCurrent,
        )
        .unwrap(),
    );
    ids.push(
        tree.add_content_item_with_name(
            RelationshipType::Contains,
            ValueType::Text,
            finding(),
            AddMode::AfterCurrent,
        )
        .unwrap(),
    );
    Report { tree, ids }
}

#[rstest]
fn given_last_node_when_walking_back_then_visits_document_order_reversed(mut report: Report) {
    let mut visited = vec![report.tree.node_id().unwrap()];
    while let Some(id) = report.tree.goto_previous() {
        visited.push(id);
    }
    visited.reverse();

    assert_eq!(visited, report.ids);
    assert_eq!(report.tree.node_id(), Some(report.ids[0]));
}

#[rstest]
fn given_root_when_walking_forward_then_visits_document_order(mut report: Report) {
    let mut visited = vec![report.tree.goto_root().unwrap()];
    while let Some(id) = report.tree.goto_next() {
        visited.push(id);
    }

    assert_eq!(visited, report.ids);
}

#[rstest]
#[case("1", 0, 1)]
#[case("1.1", 1, 2)]
#[case("1.1.1", 2, 3)]
#[case("1.3", 4, 2)]
fn given_position_when_going_there_then_cursor_and_level_match(
    mut report: Report,
    #[case] position: &str,
    #[case] index: usize,
    #[case] level: usize,
) {
    let id = report.tree.goto_position(position);

    assert_eq!(id, Some(report.ids[index]));
    assert_eq!(report.tree.position().as_deref(), Some(position));
    assert_eq!(report.tree.level(), level);
}

#[rstest]
#[case("")]
#[case("0")]
#[case("2")]
#[case("1.4")]
#[case("1.x")]
fn given_bad_position_when_going_there_then_cursor_unchanged(
    mut report: Report,
    #[case] position: &str,
) {
    let before = report.tree.node_id();

    assert_eq!(report.tree.goto_position(position), None);
    assert_eq!(report.tree.node_id(), before);
}

#[rstest]
fn given_repeated_concept_when_searching_then_each_occurrence_once(mut report: Report) {
    // Search after a mutation starts at the root
    assert_eq!(report.tree.goto_named_node(&finding()), Some(report.ids[1]));
    assert_eq!(report.tree.goto_named_node(&finding()), Some(report.ids[4]));
    assert_eq!(report.tree.goto_named_node(&finding()), None);

    // From the root again, without cursor dependence
    assert_eq!(
        report.tree.goto_named_node_from_root(&finding()),
        Some(report.ids[1])
    );
    let all: Vec<NodeId> = report.tree.named_nodes(&finding()).map(|n| n.id()).collect();
    assert_eq!(all, vec![report.ids[1], report.ids[4]]);
}

#[rstest]
fn given_navigation_when_searching_then_starts_after_cursor(mut report: Report) {
    report.tree.goto_node(report.ids[3]).unwrap();

    assert_eq!(report.tree.goto_named_node(&finding()), Some(report.ids[4]));
}

#[rstest]
fn given_removed_node_when_going_to_its_id_then_none(mut report: Report) {
    // Arrange
    let removed = report.ids[1];
    report.tree.goto_node(removed).unwrap();

    // Act: subtree 1.1 goes, cursor moves to the next sibling
    let cursor = report.tree.remove_current_content_item();

    // Assert
    assert_eq!(cursor, Some(report.ids[3]));
    assert_eq!(report.tree.goto_node(removed), None);
    assert!(report.tree.node(report.ids[2]).is_none());
    assert_eq!(report.tree.count_nodes(), 3);
    assert_eq!(report.tree.node_id(), Some(report.ids[3]));
}

#[rstest]
fn given_only_root_when_removing_then_tree_empty(mut report: Report) {
    report.tree.goto_root().unwrap();

    assert_eq!(report.tree.remove_current_content_item(), None);
    assert!(report.tree.is_empty());
    assert_eq!(report.tree.level(), 0);
    assert!(report.tree.position().is_none());
}

#[rstest]
fn given_tree_when_reading_structure_then_children_and_depth_match(report: Report) {
    let root = report.tree.root().unwrap();
    let children: Vec<NodeId> = report.tree.children(root).map(|n| n.id()).collect();

    assert_eq!(children, vec![report.ids[1], report.ids[3], report.ids[4]]);
    assert_eq!(report.tree.depth(), 3);
    assert_eq!(report.tree.count_nodes(), 5);
}
