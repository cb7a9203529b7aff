//! Domain layer: the markup tree and its transformations
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod chapter;
pub mod error;
pub mod naming;
pub mod rewrite;
pub mod stylesheet;

pub use arena::{NodeId, NodeKind, XmlNode, XmlTree};
pub use chapter::ChapterNormalizer;
pub use error::{DomainError, DomainResult};
pub use naming::{file_stem, AsciiRomanizer, NameAllocator, Romanizer};
pub use stylesheet::{RuleStylesheet, Stylesheet};
