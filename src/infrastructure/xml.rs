//! XML codec between text and [`XmlTree`].
//!
//! Parsing drops whitespace-only text between elements, keeps it inside
//! mixed content and keeps comments. Serialization
//! writes a declaration and indents element-only content, leaving mixed
//! content as it is.

use std::fmt::Display;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;
use tracing::trace;

use crate::domain::{NodeId, XmlTree};

const INDENT: &str = "  ";

#[derive(Error, Debug)]
#[error("{message}")]
pub struct XmlError {
    pub message: String,
}

impl XmlError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn at(position: u64, cause: impl Display) -> Self {
        Self::new(format!("at byte {}: {}", position, cause))
    }
}

/// Parse a document into a tree.
pub fn parse_str(source: &str) -> Result<XmlTree, XmlError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);

    let mut tree: Option<XmlTree> = None;
    let mut stack: Vec<OpenElement> = Vec::new();

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event()
            .map_err(|e| XmlError::at(position, e))?;
        match event {
            Event::Start(e) => {
                let id = open_element(&mut tree, parent_of(&stack), &e, position)?;
                stack.push(OpenElement::new(id));
            }
            Event::Empty(e) => {
                open_element(&mut tree, parent_of(&stack), &e, position)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| XmlError::at(position, e))?;
                push_content(&mut tree, &mut stack, &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_content(&mut tree, &mut stack, &text);
            }
            Event::Comment(e) => {
                let body = String::from_utf8_lossy(&e).into_owned();
                if let (Some(tree), Some(parent)) = (tree.as_mut(), parent_of(&stack)) {
                    let id = tree.create_comment(body);
                    tree.append(parent, id).map_err(|e| XmlError::at(position, e))?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::new("unexpected end of document"));
    }
    tree.ok_or_else(|| XmlError::new("document has no root element"))
}

/// An element whose end tag has not been read yet.
struct OpenElement {
    id: NodeId,
    /// Holds non-blank character data, so blank runs are content too.
    mixed: bool,
    /// Blank runs seen before the element turned mixed, with the child whose
    /// tail they belong to.
    pending: Vec<(Option<NodeId>, String)>,
}

impl OpenElement {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            mixed: false,
            pending: Vec::new(),
        }
    }
}

fn parent_of(stack: &[OpenElement]) -> Option<NodeId> {
    stack.last().map(|open| open.id)
}

fn open_element(
    tree: &mut Option<XmlTree>,
    parent: Option<NodeId>,
    start: &BytesStart<'_>,
    position: u64,
) -> Result<NodeId, XmlError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let first = tree.is_none();
    let tree = tree.get_or_insert_with(|| XmlTree::new(tag.clone()));
    let id = if first {
        tree.root()
    } else {
        match parent {
            Some(parent) => tree
                .append_element(parent, tag)
                .map_err(|e| XmlError::at(position, e))?,
            None => {
                return Err(XmlError::at(
                    position,
                    format!("second root element <{}>", tag),
                ))
            }
        }
    };

    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::at(position, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::at(position, e))?
            .into_owned();
        tree[id].set_attr(key, value);
    }
    Ok(id)
}

/// Route character data to the open element's text, or to the tail of its
/// last child. Whitespace-only runs are held back until the element shows
/// non-blank character data and dropped if it never does.
fn push_content(tree: &mut Option<XmlTree>, stack: &mut [OpenElement], text: &str) {
    let (Some(tree), Some(open)) = (tree.as_mut(), stack.last_mut()) else {
        return;
    };
    let last = tree.children(open.id).last().copied();
    if !open.mixed {
        if text.trim().is_empty() {
            open.pending.push((last, text.to_string()));
            return;
        }
        open.mixed = true;
        for (target, blank) in open.pending.drain(..) {
            attach_text(tree, open.id, target, &blank);
        }
    }
    attach_text(tree, open.id, last, text);
}

fn attach_text(tree: &mut XmlTree, parent: NodeId, after: Option<NodeId>, text: &str) {
    match after {
        Some(child) => tree[child].push_tail(text),
        None => tree[parent].push_text(text),
    }
}

/// Serialize a tree as a standalone document.
pub fn to_string(tree: &XmlTree) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;
    write_raw(&mut writer, "\n")?;
    write_node(&mut writer, tree, tree.root(), 0)?;
    write_raw(&mut writer, "\n")?;

    let out = String::from_utf8(writer.into_inner()).map_err(write_error)?;
    trace!("serialized {} bytes", out.len());
    Ok(out)
}

fn write_error(e: impl Display) -> XmlError {
    XmlError::new(format!("cannot serialize: {}", e))
}

fn write_raw(writer: &mut Writer<Vec<u8>>, raw: &str) -> Result<(), XmlError> {
    writer
        .write_event(Event::Text(BytesText::from_escaped(raw)))
        .map_err(write_error)
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    tree: &XmlTree,
    id: NodeId,
    level: usize,
) -> Result<(), XmlError> {
    let node = &tree[id];
    if node.is_comment() {
        let body = node.text.as_deref().unwrap_or("");
        return writer
            .write_event(Event::Comment(BytesText::from_escaped(body)))
            .map_err(write_error);
    }

    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in &node.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let children = tree.children(id);
    let text = node.text.as_deref().filter(|t| !t.is_empty());
    if text.is_none() && children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_error);
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_error)?;
    }

    let indented = text.is_none() && children.iter().all(|&c| tree[c].tail.is_none());
    for &child in children {
        if indented {
            write_raw(writer, &format!("\n{}", INDENT.repeat(level + 1)))?;
        }
        write_node(writer, tree, child, level + 1)?;
        if let Some(tail) = tree[child].tail.as_deref() {
            writer
                .write_event(Event::Text(BytesText::new(tail)))
                .map_err(write_error)?;
        }
    }
    if indented && !children.is_empty() {
        write_raw(writer, &format!("\n{}", INDENT.repeat(level)))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(node.tag.as_str())))
        .map_err(write_error)
}
