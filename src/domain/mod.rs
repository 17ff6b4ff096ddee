//! Domain layer: content items, grammar and trees
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod code;
pub mod error;
pub mod grammar;
pub mod item;
pub mod tree;
pub mod types;
pub mod value;

pub use arena::TreeNode;
pub use code::CodedEntry;
pub use error::{Rejected, TreeError, TreeResult};
pub use grammar::{is_legal, DocumentType, InsertionContext, Position, TreeKind};
pub use item::{ContentItem, DetachedItem};
pub use tree::{ContentTree, Document, DocumentSubTree, DocumentTree, Fragment, TreeFlavor};
pub use types::{AddMode, NodeId, ParseTagError, Relationship, RelationshipType, ValueType};
pub use value::{Continuity, ContentValue, NumericValue, Rational};
