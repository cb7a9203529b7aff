//! Chapter normalization: raw content fragment to canonical chapter element.

use std::sync::{Arc, OnceLock};

use itertools::Itertools;
use regex::Regex;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeId, XmlTree};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::rewrite;
use crate::domain::stylesheet::Stylesheet;

/// Wrapper tags whose information already lives in the surrounding hierarchy.
pub const WRAPPER_TAGS: [&str; 3] = ["chapter", "book", "nikaya"];
/// Heading tags, outermost first, that absorb the markup following them.
pub const SECTION_TAGS: [&str; 3] = ["chapter", "section", "subsection"];

pub const VERSE: &str = "verse";
pub const NUMBER: &str = "number";
pub const PARAGRAPH: &str = "p";
pub const CHAPTER: &str = "chapter";

/// `idx` value marking the first line of a new verse group.
const FIRST: &str = "first";

fn title_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9-]*)\. (.*)").expect("title number pattern"))
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.*)\.(.*)").expect("heading pattern"))
}

/// Turns a raw content fragment into a canonical chapter tree.
pub struct ChapterNormalizer {
    stylesheet: Arc<dyn Stylesheet>,
}

impl ChapterNormalizer {
    pub fn new(stylesheet: Arc<dyn Stylesheet>) -> Self {
        Self { stylesheet }
    }

    /// Apply the fixed transform, then the structural clean-up steps in order.
    #[instrument(level = "debug", skip_all)]
    pub fn normalize(&self, fragment: &XmlTree) -> DomainResult<XmlTree> {
        let mut tree = self.stylesheet.apply(fragment)?;

        rewrite::remove(&mut tree, &WRAPPER_TAGS);
        for tag in SECTION_TAGS {
            rewrite::siblings_to_child(&mut tree, tag)?;
        }

        merge_verses(&mut tree)?;
        lift_numbers(&mut tree)?;
        rewrite::trim_text(&mut tree);
        extract_numbers_from_titles(&mut tree);
        debug!("normalized chapter: {} nodes", tree.len());
        Ok(tree)
    }
}

/// Merge continuation verse lines into the verse they continue.
///
/// A verse is a continuation when it directly follows another verse and is
/// not marked `idx="first"`. Surviving verses lose their attributes.
pub fn merge_verses(tree: &mut XmlTree) -> DomainResult<()> {
    let mut verses = tree.find_all(&[VERSE]);
    verses.reverse();

    for (node, prev) in verses.iter().copied().tuple_windows() {
        let adjacent = tree.previous_sibling(node) == Some(prev);
        if adjacent && tree[node].attr("idx") != Some(FIRST) {
            rewrite::absorb(tree, prev, node)?;
        } else {
            tree[node].attrs.clear();
        }
    }

    if let Some(&first) = verses.last() {
        tree[first].attrs.clear();
    }
    Ok(())
}

/// Fold `number` markers into the paragraph or verse they number.
pub fn lift_numbers(tree: &mut XmlTree) -> DomainResult<()> {
    for node in tree.find_all(&[NUMBER]) {
        if !tree.contains(node) {
            continue;
        }
        let Some(parent) = tree.parent(node) else {
            continue;
        };
        let nr = tree[node]
            .attr("nr")
            .map(str::to_string)
            .ok_or_else(|| DomainError::malformed(NUMBER, "missing 'nr' attribute"))?;
        let next = tree.next_sibling(node);

        if tree[parent].has_tag(PARAGRAPH) {
            tree[parent].set_attr("nr", nr.clone());
            if let Some(tail) = tree[node].tail.take() {
                let text = tree[parent].text.take().unwrap_or_default();
                tree[parent].text = Some(tail + &text);
            }
        }
        if let Some(verse) = next.filter(|&n| tree[n].has_tag(VERSE)) {
            tree[verse].set_attr("nr", nr);
        }
        tree.remove(node);
    }
    Ok(())
}

/// Split `title="12. Introduction"` into `nr="12"` and `title="Introduction"`.
pub fn extract_numbers_from_titles(tree: &mut XmlTree) {
    for node in tree.find_with_attr("title") {
        extract_title_number(tree, node);
    }
}

/// Title-number split for a single node. Returns whether the title matched.
pub fn extract_title_number(tree: &mut XmlTree, node: NodeId) -> bool {
    let Some(title) = tree[node].attr("title") else {
        return false;
    };
    let Some(caps) = title_number_regex().captures(title) else {
        return false;
    };
    let nr = caps[1].to_string();
    let rest = caps[2].to_string();
    tree[node].set_attr("nr", nr);
    tree[node].set_attr("title", rest);
    true
}

/// Turn `<chapter>12. Name</chapter>` headings into
/// `<chapter nr="12" title="Name"/>`.
///
/// A chapter that already has children is malformed source and is reported,
/// not repaired.
pub fn normalize_chapter_headings(tree: &mut XmlTree) -> DomainResult<()> {
    for node in tree.find_all(&[CHAPTER]) {
        if !tree.children(node).is_empty() {
            return Err(DomainError::malformed(CHAPTER, "heading has children"));
        }
        let text = tree[node].text.take().unwrap_or_default();
        match heading_regex().captures(&text) {
            Some(caps) => {
                let nr = caps[1].trim().to_string();
                let title = caps[2].trim().to_string();
                tree[node].set_attr("nr", nr);
                tree[node].set_attr("title", title);
            }
            None => tree[node].set_attr("title", text.clone()),
        }
    }
    Ok(())
}
