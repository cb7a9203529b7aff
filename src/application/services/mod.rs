//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem)
//! but are themselves concrete structs, not traits.

mod book;
mod resolver;
mod splitter;

pub use book::BookService;
pub use resolver::ResolverService;
pub use splitter::{IndexEntry, NodeRole, SplitReport, SplitterService, XINCLUDE_NS};
