//! Resolve, normalize and re-split cross-referencing XML table-of-contents trees.
//!
//! Layers, innermost first:
//! - [`domain`]: the arena markup tree, rewrite primitives, chapter normalization
//! - [`application`]: resolver, splitter and book services over a [`FileSystem`]
//! - [`infrastructure`]: filesystem, XML codec and service wiring
//! - [`cli`]: argument parsing and command dispatch
//!
//! [`FileSystem`]: infrastructure::traits::FileSystem

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
