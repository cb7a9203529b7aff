/*
Text rendering of the table-of-contents skeleton of a resolved tree.
Only table-of-contents nodes are shown; chapter content below them is not.
 */
use termtree::Tree;
use tracing::instrument;

use crate::config::SplitConfig;
use crate::domain::{NodeId, XmlTree};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

/// A resolved tree viewed through the split settings.
pub struct TocOutline<'a> {
    tree: &'a XmlTree,
    split: &'a SplitConfig,
}

impl<'a> TocOutline<'a> {
    pub fn new(tree: &'a XmlTree, split: &'a SplitConfig) -> Self {
        Self { tree, split }
    }

    fn label(&self, id: NodeId) -> String {
        let node = &self.tree[id];
        self.split
            .title_attrs
            .iter()
            .find_map(|attr| node.attr(attr))
            .map(str::to_string)
            .unwrap_or_else(|| format!("<{}>", node.tag))
    }

    fn build(&self, id: NodeId) -> Tree<String> {
        let leaves: Vec<_> = self
            .tree
            .element_children(id)
            .into_iter()
            .filter(|&c| self.tree[c].has_tag(&self.split.toc_tag))
            .map(|c| self.build(c))
            .collect();
        Tree::new(self.label(id)).with_leaves(leaves)
    }
}

impl TreeNodeConvert for TocOutline<'_> {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        self.build(self.tree.root())
    }
}
