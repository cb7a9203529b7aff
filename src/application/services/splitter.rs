//! Splitting a resolved document into a forest of files
//!
//! Branching nodes become index files that XInclude their children; nodes
//! wrapping a single content element become chapter files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::document::Document;
use crate::application::services::ResolverService;
use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::chapter::extract_title_number;
use crate::domain::{file_stem, rewrite, NameAllocator, NodeId, Romanizer, XmlTree};
use crate::infrastructure::traits::FileSystem;

pub const XINCLUDE_NS: &str = "http://www.w3.org/2001/XInclude";
const FALLBACK_INDEX_TAG: &str = "toc";

/// What a node turns into when written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Wraps exactly one content element: written as a chapter file.
    Leaf(NodeId),
    /// Still branching: written as an index file plus a directory.
    Index,
}

/// A line of an index file: display title and the path of the written file,
/// relative to the directory the entry was written into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub title: String,
    pub nr: Option<String>,
    pub path: String,
}

/// Files written by a split, in write order.
#[derive(Debug, Default)]
pub struct SplitReport {
    pub chapters: Vec<PathBuf>,
    pub indexes: Vec<PathBuf>,
}

impl SplitReport {
    pub fn total(&self) -> usize {
        self.chapters.len() + self.indexes.len()
    }
}

pub struct SplitterService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    romanizer: Arc<dyn Romanizer>,
}

impl SplitterService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        settings: Arc<Settings>,
        romanizer: Arc<dyn Romanizer>,
    ) -> Self {
        Self {
            fs,
            settings,
            romanizer,
        }
    }

    /// Resolve `src`, collapse the wrappers left behind by inlining, and
    /// split the result into `out_dir`.
    #[instrument(level = "debug", skip(self, resolver))]
    pub fn resolve_and_split(
        &self,
        resolver: &ResolverService,
        src: &Path,
        out_dir: &Path,
    ) -> ApplicationResult<SplitReport> {
        let mut tree = resolver.open_and_replace(src)?;
        rewrite::remove_empty(&mut tree, &[self.settings.split.toc_tag.as_str()])?;
        self.split(&tree, out_dir)
    }

    /// Write every element child of the root, then the root index.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn split(&self, tree: &XmlTree, out_dir: &Path) -> ApplicationResult<SplitReport> {
        let mut report = SplitReport::default();
        self.fs
            .create_dir_all(out_dir)
            .or_write_failure(out_dir)?;

        let mut names = NameAllocator::new();
        names.reserve(&self.settings.split.root_index);
        let mut entries = Vec::new();
        for child in tree.element_children(tree.root()) {
            entries.push(self.write_out(tree, child, out_dir, 0, &mut names, &mut report)?);
        }

        let index_path = out_dir.join(&self.settings.split.root_index);
        let index = self.index_tree(FALLBACK_INDEX_TAG, None, "", &entries)?;
        report.indexes.push(self.save(index_path, index)?);
        info!("split into {} files under {}", report.total(), out_dir.display());
        Ok(report)
    }

    /// Write `node` below `dir` and return its index entry.
    pub fn write_out(
        &self,
        tree: &XmlTree,
        node: NodeId,
        dir: &Path,
        depth: usize,
        names: &mut NameAllocator,
        report: &mut SplitReport,
    ) -> ApplicationResult<IndexEntry> {
        let title = self.display_title(tree, node);
        let suffixes = ["", ".xml", self.settings.split.index_suffix.as_str()];
        let stem = names.allocate(&file_stem(self.romanizer.as_ref(), &title), &suffixes);

        match self.classify(tree, node) {
            NodeRole::Leaf(content) => {
                let mut chapter = tree.extract(content);
                let root = chapter.root();
                chapter[root].tag = self.settings.split.leaf_tag.clone();
                chapter[root].set_attr("title", title.clone());
                extract_title_number(&mut chapter, root);
                let entry = IndexEntry {
                    title: chapter[root].attr("title").unwrap_or_default().to_string(),
                    nr: chapter[root].attr("nr").map(str::to_string),
                    path: format!("{}.xml", stem),
                };

                report.chapters.push(self.save(dir.join(&entry.path), chapter)?);
                Ok(entry)
            }
            NodeRole::Index => {
                let sub_dir = dir.join(&stem);
                self.fs
                    .create_dir_all(&sub_dir)
                    .or_write_failure(&sub_dir)?;

                let mut child_names = NameAllocator::new();
                let mut entries = Vec::new();
                for child in tree.element_children(node) {
                    let entry =
                        self.write_out(tree, child, &sub_dir, depth + 1, &mut child_names, report)?;
                    entries.push(entry);
                }

                let tag = self
                    .settings
                    .split
                    .level_tags
                    .get(depth)
                    .map(String::as_str)
                    .unwrap_or(FALLBACK_INDEX_TAG);
                let index = self.index_tree(tag, Some(title.as_str()), &stem, &entries)?;
                let file = format!("{}{}", stem, self.settings.split.index_suffix);
                report.indexes.push(self.save(dir.join(&file), index)?);
                Ok(IndexEntry {
                    title,
                    nr: None,
                    path: file,
                })
            }
        }
    }

    /// Leaf when the node wraps exactly one element that is not itself a
    /// table-of-contents node.
    pub fn classify(&self, tree: &XmlTree, node: NodeId) -> NodeRole {
        match tree.element_children(node).as_slice() {
            [only] if !tree[*only].has_tag(&self.settings.split.toc_tag) => NodeRole::Leaf(*only),
            _ => NodeRole::Index,
        }
    }

    /// First present title attribute, else empty.
    pub fn display_title(&self, tree: &XmlTree, node: NodeId) -> String {
        self.settings
            .split
            .title_attrs
            .iter()
            .find_map(|attr| tree[node].attr(attr))
            .unwrap_or("")
            .to_string()
    }

    fn index_tree(
        &self,
        tag: &str,
        title: Option<&str>,
        prefix: &str,
        entries: &[IndexEntry],
    ) -> ApplicationResult<XmlTree> {
        let mut index = XmlTree::new(tag);
        let root = index.root();
        index[root].set_attr("xmlns:xi", XINCLUDE_NS);
        if let Some(title) = title {
            index[root].set_attr("title", title);
        }
        for entry in entries {
            let item = index.append_element(root, "entry")?;
            index[item].set_attr("title", entry.title.clone());
            if let Some(nr) = &entry.nr {
                index[item].set_attr("nr", nr.clone());
            }
            let include = index.append_element(item, "xi:include")?;
            let href = if prefix.is_empty() {
                entry.path.clone()
            } else {
                format!("{}/{}", prefix, entry.path)
            };
            index[include].set_attr("href", href);
        }
        Ok(index)
    }

    fn save(&self, path: PathBuf, tree: XmlTree) -> ApplicationResult<PathBuf> {
        let document = Document::new(path, tree);
        document.save(self.fs.as_ref())?;
        debug!("split: {}", document.path.display());
        Ok(document.path)
    }
}
