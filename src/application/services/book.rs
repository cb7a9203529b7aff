//! Clean-up of a single raw book document.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::document::Document;
use crate::application::ApplicationResult;
use crate::domain::chapter::normalize_chapter_headings;
use crate::domain::{rewrite, XmlTree};
use crate::infrastructure::traits::FileSystem;

/// Tag groups, outermost first, that take the markup following them as
/// children.
const GROUPINGS: [&[&str]; 4] = [&["nikaya", "centered"], &["book"], &["chapter"], &["hangnum"]];

pub struct BookService {
    fs: Arc<dyn FileSystem>,
}

impl BookService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load `path` and restructure it. See [`BookService::clean_tree`].
    #[instrument(level = "debug", skip(self))]
    pub fn clean(&self, path: &Path) -> ApplicationResult<XmlTree> {
        let mut document = Document::load(self.fs.as_ref(), path)?;
        self.clean_tree(&mut document.tree)?;
        Ok(document.tree)
    }

    /// Lift book and nikaya names into `title`, split chapter headings into
    /// number and title, then nest the flat markup under its headings.
    pub fn clean_tree(&self, tree: &mut XmlTree) -> ApplicationResult<()> {
        rewrite::text_to_attr(tree, "book", "title")?;
        rewrite::text_to_attr(tree, "nikaya", "title")?;
        normalize_chapter_headings(tree)?;
        for tags in GROUPINGS {
            rewrite::neighbor_to_child(tree, tags)?;
        }
        debug!("cleaned book: depth {}", tree.depth());
        Ok(())
    }
}
