//! Arena-backed markup tree.
//!
//! Every element of a document lives in one generational arena. Children are
//! ordered handles, the parent is a non-owning handle maintained exclusively by
//! [`XmlTree::insert`], [`XmlTree::detach`] and [`XmlTree::remove`]. A node is
//! attached to at most one parent at a time.

use std::collections::BTreeMap;
use std::fmt;
use std::ops;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};

/// Handle to a node inside an [`XmlTree`].
pub type NodeId = Index;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    /// Comment body is stored in `text`.
    Comment,
}

/// A single markup node.
///
/// `text` is the content before the first child, `tail` the content that
/// follows this node inside its parent (before the next sibling).
#[derive(Debug, Clone)]
pub struct XmlNode {
    pub kind: NodeKind,
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: Option<String>,
    pub tail: Option<String>,
    parent: Option<Index>,
    children: Vec<Index>,
}

impl XmlNode {
    fn new(kind: NodeKind, tag: String) -> Self {
        Self {
            kind,
            tag,
            attrs: BTreeMap::new(),
            text: None,
            tail: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Copy of the payload without any links.
    fn detached_copy(&self) -> Self {
        Self {
            kind: self.kind,
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            text: self.text.clone(),
            tail: self.tail.clone(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn is_comment(&self) -> bool {
        self.kind == NodeKind::Comment
    }

    /// True for an element with the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.is_element() && self.tag == tag
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Append to the leading text, creating it when absent.
    pub fn push_text(&mut self, text: &str) {
        append_opt(&mut self.text, text);
    }

    /// Append to the tail text, creating it when absent.
    pub fn push_tail(&mut self, text: &str) {
        append_opt(&mut self.tail, text);
    }
}

fn append_opt(slot: &mut Option<String>, text: &str) {
    if text.is_empty() {
        return;
    }
    match slot {
        Some(existing) => existing.push_str(text),
        None => *slot = Some(text.to_string()),
    }
}

impl fmt::Display for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Comment => write!(f, "<!--{}-->", self.text.as_deref().unwrap_or("")),
            NodeKind::Element => {
                write!(f, "<{}", self.tag)?;
                for (k, v) in &self.attrs {
                    write!(f, " {}=\"{}\"", k, v)?;
                }
                write!(f, ">")
            }
        }
    }
}

/// Arena-based markup tree. The root is always an element.
#[derive(Debug, Clone)]
pub struct XmlTree {
    arena: Arena<XmlNode>,
    root: Index,
}

impl XmlTree {
    pub fn new(root_tag: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(XmlNode::new(NodeKind::Element, root_tag.into()));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&XmlNode> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut XmlNode> {
        self.arena.get_mut(id)
    }

    /// False once the node has been removed.
    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    /// Number of live nodes, including detached ones not yet removed.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Create an unattached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.arena.insert(XmlNode::new(NodeKind::Element, tag.into()))
    }

    /// Create an unattached comment.
    pub fn create_comment(&mut self, body: impl Into<String>) -> NodeId {
        let mut node = XmlNode::new(NodeKind::Comment, String::new());
        node.text = Some(body.into());
        self.arena.insert(node)
    }

    /// Create an element and append it to `parent`.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
    ) -> DomainResult<NodeId> {
        let id = self.create_element(tag);
        if let Err(e) = self.append(parent, id) {
            self.arena.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> DomainResult<()> {
        let pos = self.children(parent).len();
        let pos = if self.parent(child) == Some(parent) {
            pos - 1
        } else {
            pos
        };
        self.insert(parent, pos, child)
    }

    /// Move `child` to position `pos` among `parent`'s children.
    ///
    /// `pos` is interpreted after `child` has been detached from its old
    /// place, and is clamped to the number of children. Moving the root, a
    /// freed node, or a node below itself fails and leaves the tree as is.
    #[instrument(level = "trace", skip(self))]
    pub fn insert(&mut self, parent: NodeId, pos: usize, child: NodeId) -> DomainResult<()> {
        let reason = if !self.contains(child) {
            Some("node is not in the tree")
        } else if child == self.root {
            Some("the root cannot be moved")
        } else if !self.contains(parent) {
            Some("target parent is not in the tree")
        } else if self.is_ancestor(child, parent) {
            Some("a node cannot move below itself")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(DomainError::IllegalMove { reason });
        }

        self.detach(child);
        if let Some(parent_node) = self.arena.get_mut(parent) {
            let pos = pos.min(parent_node.children.len());
            parent_node.children.insert(pos, child);
        }
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// True when `ancestor` is `id` or lies on the path from `id` to the root.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    /// Unlink a node from its parent. The node and its subtree stay alive.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.arena.get_mut(id) {
            node.parent = None;
        }
    }

    /// Detach a node and free it together with its whole subtree.
    /// The root cannot be removed.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Children that are elements, skipping comments.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self[c].is_element())
            .collect()
    }

    /// Index of the node within its parent's children.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let pos = self.position(id)?;
        self.children(parent).get(pos + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let pos = self.position(id)?;
        pos.checked_sub(1)
            .and_then(|p| self.children(parent).get(p).copied())
    }

    /// Pre-order traversal of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants::new(self, id)
    }

    /// All elements whose tag is in `tags`, in document order, root included.
    pub fn find_all<S: AsRef<str>>(&self, tags: &[S]) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|(_, node)| node.is_element() && tags.iter().any(|t| t.as_ref() == node.tag))
            .map(|(id, _)| id)
            .collect()
    }

    /// All elements carrying `attr`, in document order.
    pub fn find_with_attr(&self, attr: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|(_, node)| node.is_element() && node.attrs.contains_key(attr))
            .map(|(id, _)| id)
            .collect()
    }

    /// Concatenated text below `id`: leading text, then each child's content
    /// followed by that child's tail. The tail of `id` itself is excluded.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        if node.is_comment() {
            return;
        }
        if let Some(text) = &node.text {
            out.push_str(text);
        }
        for &child in &node.children {
            self.collect_text(child, out);
            if let Some(tail) = &self[child].tail {
                out.push_str(tail);
            }
        }
    }

    /// Deep-copy the subtree at `src` of `other` into this arena.
    /// The copy is returned unattached.
    pub fn import(&mut self, other: &XmlTree, src: NodeId) -> NodeId {
        let top = self.arena.insert(other[src].detached_copy());
        let mut stack = vec![(src, top)];
        while let Some((from, to)) = stack.pop() {
            for &child in other.children(from) {
                let mut copy = other[child].detached_copy();
                copy.parent = Some(to);
                let copy = self.arena.insert(copy);
                self.arena[to].children.push(copy);
                stack.push((child, copy));
            }
        }
        top
    }

    /// Deep-copy the subtree at `id` into a new tree rooted at the copy.
    pub fn extract(&self, id: NodeId) -> XmlTree {
        let mut tree = XmlTree::new(String::new());
        let placeholder = tree.root;
        let root = tree.import(self, id);
        tree.root = root;
        tree.arena.remove(placeholder);
        tree.arena[root].tail = None;
        tree
    }

    /// Height of the tree: a lone root has depth 1.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self.root, 1usize)];
        while let Some((id, level)) = stack.pop() {
            max = max.max(level);
            for &child in self.children(id) {
                stack.push((child, level + 1));
            }
        }
        max
    }
}

impl ops::Index<NodeId> for XmlTree {
    type Output = XmlNode;

    fn index(&self, id: NodeId) -> &XmlNode {
        &self.arena[id]
    }
}

impl ops::IndexMut<NodeId> for XmlTree {
    fn index_mut(&mut self, id: NodeId) -> &mut XmlNode {
        &mut self.arena[id]
    }
}

pub struct Descendants<'a> {
    tree: &'a XmlTree,
    stack: Vec<NodeId>,
}

impl<'a> Descendants<'a> {
    fn new(tree: &'a XmlTree, start: NodeId) -> Self {
        let stack = if tree.contains(start) {
            vec![start]
        } else {
            Vec::new()
        };
        Self { tree, stack }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (NodeId, &'a XmlNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.tree.get(current) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current, node));
            }
        }
        None
    }
}
