//! Reference resolution
//!
//! Expands every node that names another document through a reference
//! attribute into a single tree. References resolve against the directory of
//! the document that contains them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::application::document::Document;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{ChapterNormalizer, DomainError, NodeId, XmlTree};
use crate::infrastructure::traits::FileSystem;

/// Service that inlines referenced documents.
pub struct ResolverService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
    normalizer: Option<Arc<ChapterNormalizer>>,
}

impl ResolverService {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self {
            fs,
            settings,
            normalizer: None,
        }
    }

    /// Normalize every action-referenced fragment before it is inlined.
    pub fn with_normalizer(mut self, normalizer: Arc<ChapterNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Load `path` and recursively replace every reference by the root of the
    /// document it names.
    ///
    /// The reference attribute is removed and the resolved root becomes the
    /// first child of the referencing node. A node carrying both attributes
    /// receives the source fragment first, then the action fragment.
    ///
    /// # Errors
    /// - `ReadFailure` when `path` itself cannot be read
    /// - `MissingReference` when a referenced document cannot be read
    /// - `Parse` for a document that is not well-formed
    /// - `Domain(CycleDetected)` when a document (transitively) references itself
    #[instrument(level = "debug", skip(self))]
    pub fn open_and_replace(&self, path: &Path) -> ApplicationResult<XmlTree> {
        let mut active = Vec::new();
        self.resolve(path, None, &mut active)
    }

    fn resolve(
        &self,
        path: &Path,
        referenced_from: Option<&Path>,
        active: &mut Vec<PathBuf>,
    ) -> ApplicationResult<XmlTree> {
        let mut document = match referenced_from {
            None => Document::load(self.fs.as_ref(), path)?,
            Some(from) => self.load_reference(path, from)?,
        };

        let canonical = self
            .fs
            .canonicalize(path)
            .with_path_context("canonicalize", path)?;
        if active.contains(&canonical) {
            return Err(DomainError::CycleDetected(canonical).into());
        }
        active.push(canonical);

        let refs = self.referencing_nodes(&document.tree);
        debug!("{}: {} references", path.display(), refs.len());
        let base = document.base_dir().to_path_buf();
        let attrs = [
            (self.settings.references.source_attr.as_str(), false),
            (self.settings.references.action_attr.as_str(), true),
        ];

        for node in refs {
            let mut pos = 0;
            for (attr, is_action) in attrs {
                let Some(href) = document.tree[node].attrs.remove(attr) else {
                    continue;
                };
                let target = base.join(&href);
                trace!("{} -> {}", attr, target.display());
                let mut fragment = self.resolve(&target, Some(path), active)?;
                if is_action {
                    if let Some(normalizer) = &self.normalizer {
                        fragment = normalizer.normalize(&fragment)?;
                    }
                }
                let inlined = document.tree.import(&fragment, fragment.root());
                document.tree.insert(node, pos, inlined)?;
                pos += 1;
            }
        }

        active.pop();
        Ok(document.tree)
    }

    fn load_reference(&self, path: &Path, from: &Path) -> ApplicationResult<Document> {
        match Document::load(self.fs.as_ref(), path) {
            Err(ApplicationError::ReadFailure { path, source }) => {
                Err(ApplicationError::MissingReference {
                    path,
                    referenced_from: from.to_path_buf(),
                    source,
                })
            }
            other => other,
        }
    }

    /// Nodes carrying a source or action attribute, in document order.
    fn referencing_nodes(&self, tree: &XmlTree) -> Vec<NodeId> {
        let refs = &self.settings.references;
        tree.descendants(tree.root())
            .filter(|(_, node)| {
                node.is_element()
                    && (node.attrs.contains_key(&refs.source_attr)
                        || node.attrs.contains_key(&refs.action_attr))
            })
            .map(|(id, _)| id)
            .collect()
    }
}
