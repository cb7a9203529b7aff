//! Structural rewrite primitives shared by every pass.
//!
//! Each primitive takes a snapshot of the nodes it will touch before mutating
//! the tree, so removal during iteration never invalidates the walk. Handles
//! that were freed by an earlier step of the same walk are skipped.

use itertools::Itertools;
use tracing::{instrument, trace};

use crate::domain::arena::{NodeId, XmlTree};
use crate::domain::error::{DomainError, DomainResult};

/// Merge `b` into `a`.
///
/// `b`'s leading text goes after `a`'s existing content (the tail of `a`'s
/// last child, or `a`'s own text when it is childless), then `b`'s children
/// are reparented onto `a`. Attributes of `b` are discarded. `b` itself is
/// left in place, empty; the caller decides whether to remove it.
pub fn merge(tree: &mut XmlTree, a: NodeId, b: NodeId) -> DomainResult<()> {
    if tree[a].tag != tree[b].tag || !tree[a].is_element() || !tree[b].is_element() {
        return Err(DomainError::malformed(
            tree[b].tag.clone(),
            format!("cannot merge into <{}>", tree[a].tag),
        ));
    }
    if let Some(text) = tree[b].text.take() {
        match tree.children(a).last().copied() {
            Some(last) => tree[last].push_tail(&text),
            None => tree[a].push_text(&text),
        }
    }
    for child in tree.children(b).to_vec() {
        tree.append(a, child)?;
    }
    tree[b].attrs.clear();
    Ok(())
}

/// Merge `node` into `survivor`, keep `node`'s tail after `survivor`, and
/// remove `node`.
pub fn absorb(tree: &mut XmlTree, survivor: NodeId, node: NodeId) -> DomainResult<()> {
    merge(tree, survivor, node)?;
    if let Some(tail) = tree[node].tail.take() {
        tree[survivor].push_tail(&tail);
    }
    tree.remove(node);
    Ok(())
}

/// Make every following sibling of a node in `tags` a child of that node,
/// stopping at the next sibling whose tag is in `tags`.
///
/// `neighbor_to_child(<a/><b/><c/>, ["a", "b"])` gives `<a/><b><c/></b>`.
#[instrument(level = "debug", skip(tree))]
pub fn neighbor_to_child(tree: &mut XmlTree, tags: &[&str]) -> DomainResult<()> {
    for node in tree.find_all(tags) {
        if !tree.contains(node) {
            continue;
        }
        while let Some(next) = tree.next_sibling(node) {
            if tree[next].is_element() && tags.contains(&tree[next].tag.as_str()) {
                break;
            }
            tree.append(node, next)?;
        }
    }
    Ok(())
}

/// Single-tag form of [`neighbor_to_child`]: a flat run of mixed markup
/// becomes nested under the preceding `tag` node. Idempotent.
pub fn siblings_to_child(tree: &mut XmlTree, tag: &str) -> DomainResult<()> {
    neighbor_to_child(tree, &[tag])
}

/// Delete every non-root element matching `tags`, including its children
/// and its tail.
#[instrument(level = "debug", skip(tree))]
pub fn remove(tree: &mut XmlTree, tags: &[&str]) {
    for node in tree.find_all(tags) {
        if node != tree.root() {
            tree.remove(node);
        }
    }
}

/// Delete a node but keep its tail text in the surrounding content.
pub fn remove_keep_tail(tree: &mut XmlTree, node: NodeId) {
    let Some(parent) = tree.parent(node) else {
        return;
    };
    if let Some(tail) = tree[node].tail.take() {
        push_before(tree, parent, node, &tail);
    }
    tree.remove(node);
}

/// Collapse redundant same-tag wrapping: an attribute-less node whose parent
/// has the same tag is replaced by its children.
#[instrument(level = "debug", skip(tree))]
pub fn remove_empty(tree: &mut XmlTree, tags: &[&str]) -> DomainResult<()> {
    for node in tree.find_all(tags) {
        let Some(parent) = tree.parent(node) else {
            continue;
        };
        if tree[node].attrs.is_empty() && tree[parent].tag == tree[node].tag {
            trace!("collapsing {}", tree[node]);
            splice_into_parent(tree, node)?;
        }
    }
    Ok(())
}

/// Move the text of every childless `tag` node into attribute `attr`.
pub fn text_to_attr(tree: &mut XmlTree, tag: &str, attr: &str) -> DomainResult<()> {
    for node in tree.find_all(&[tag]) {
        if !tree.children(node).is_empty() {
            return Err(DomainError::malformed(
                tag,
                format!("has children, cannot lift text into '{}'", attr),
            ));
        }
        let text = tree[node].text.take().unwrap_or_default();
        tree[node].set_attr(attr, text);
    }
    Ok(())
}

/// Replace every `tag` node by its content, in place.
///
/// `lift_up(<a><b>hel<c/>lo</b></a>, "b")` gives `<a>hel<c/>lo</a>`.
#[instrument(level = "debug", skip(tree))]
pub fn lift_up(tree: &mut XmlTree, tag: &str) -> DomainResult<()> {
    for node in tree.find_all(&[tag]) {
        if tree.contains(node) && tree.parent(node).is_some() {
            splice_into_parent(tree, node)?;
        }
    }
    Ok(())
}

/// Neighbours with the same tag are merged together.
///
/// `combine_siblings(<b>1</b><b>2</b><a/><b>3</b>, "b")` gives
/// `<b>12</b><a/><b>3</b>`.
#[instrument(level = "debug", skip(tree))]
pub fn combine_siblings(tree: &mut XmlTree, tag: &str) -> DomainResult<()> {
    let mut nodes = tree.find_all(&[tag]);
    nodes.reverse();
    for (node, prev) in nodes.into_iter().tuple_windows() {
        if tree.previous_sibling(node) == Some(prev) {
            absorb(tree, prev, node)?;
        }
    }
    Ok(())
}

pub fn rename(tree: &mut XmlTree, tag: &str, new_tag: &str) {
    for node in tree.find_all(&[tag]) {
        tree[node].tag = new_tag.to_string();
    }
}

/// Strip surrounding whitespace from every text and tail fragment.
pub fn trim_text(tree: &mut XmlTree) {
    let nodes: Vec<NodeId> = tree.descendants(tree.root()).map(|(id, _)| id).collect();
    for id in nodes {
        let node = &mut tree[id];
        if node.is_element() {
            node.text = trimmed(node.text.take());
        }
        node.tail = trimmed(node.tail.take());
    }
}

fn trimmed(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Replace `node` by its children at the same position. Its text is
/// appended to the slot before it, its tail to the slot after the last
/// spliced child.
pub(crate) fn splice_into_parent(tree: &mut XmlTree, node: NodeId) -> DomainResult<()> {
    let (Some(parent), Some(pos)) = (tree.parent(node), tree.position(node)) else {
        return Ok(());
    };
    if let Some(text) = tree[node].text.take() {
        push_before(tree, parent, node, &text);
    }
    for (offset, child) in tree.children(node).to_vec().into_iter().enumerate() {
        tree.insert(parent, pos + offset, child)?;
    }
    if let Some(tail) = tree[node].tail.take() {
        push_before(tree, parent, node, &tail);
    }
    tree.remove(node);
    Ok(())
}

/// Append `text` to the text slot that precedes `node` inside `parent`:
/// the previous sibling's tail, or the parent's leading text.
fn push_before(tree: &mut XmlTree, parent: NodeId, node: NodeId, text: &str) {
    match tree.previous_sibling(node) {
        Some(prev) => tree[prev].push_tail(text),
        None => tree[parent].push_text(text),
    }
}
