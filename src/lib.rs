//! Validated, navigable content-item trees for structured reports.
//!
//! The [`domain`] layer holds the tree model and its grammar, [`application`]
//! builds trees from authoring descriptions and renders them, [`cli`] is the
//! `srtree` binary's front end.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

pub use domain::{
    AddMode, CodedEntry, ContentItem, DetachedItem, DocumentSubTree, DocumentTree, DocumentType,
    NodeId, Rejected, RelationshipType, TreeError, TreeResult, ValueType,
};
