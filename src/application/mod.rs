//! Application layer: description loading and rendering
//!
//! This layer drives the domain trees from files and settings.

pub mod description;
pub mod error;
pub mod error_ext;
pub mod render;

pub use description::{Description, ItemDescription};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use render::{RenderSettings, TreeDisplay};
