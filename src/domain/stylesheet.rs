//! The fixed markup-to-structure transform applied before chapter clean-up.
//!
//! The transform is declarative: an ordered list of rules loaded from a TOML
//! asset. Each rule matches a tag (optionally constrained by attribute values)
//! and either renames the element, unwraps it, or drops it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::arena::{NodeId, XmlTree};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::rewrite;

const BUILTIN: &str = include_str!("../data/stylesheet.toml");

/// Apply transform T to a fragment, producing a new tree.
pub trait Stylesheet: Send + Sync {
    fn apply(&self, fragment: &XmlTree) -> DomainResult<XmlTree>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Rename,
    Unwrap,
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Element tag the rule applies to.
    #[serde(rename = "match")]
    pub tag: String,
    /// Attribute values that must all be present.
    #[serde(default)]
    pub when: BTreeMap<String, String>,
    pub action: RuleAction,
    /// New tag for `rename`.
    #[serde(default)]
    pub to: Option<String>,
    /// Attributes of the renamed element, replacing the existing ones.
    #[serde(default)]
    pub set: BTreeMap<String, String>,
    /// Move the element's text into this attribute.
    #[serde(default)]
    pub text_to: Option<String>,
}

impl Rule {
    fn matches(&self, tree: &XmlTree, id: NodeId) -> bool {
        let node = &tree[id];
        node.has_tag(&self.tag)
            && self
                .when
                .iter()
                .all(|(k, v)| node.attr(k) == Some(v.as_str()))
    }
}

fn default_root() -> String {
    "body".to_string()
}

/// Rule-driven [`Stylesheet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleStylesheet {
    /// Tag of the output root element.
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default, rename = "rule")]
    pub rules: Vec<Rule>,
}

impl RuleStylesheet {
    /// Parse and validate a stylesheet.
    pub fn from_toml(source: &str) -> DomainResult<Self> {
        let sheet: Self = toml::from_str(source).map_err(|e| DomainError::InvalidStylesheet {
            message: e.to_string(),
        })?;
        sheet.validate()?;
        debug!("loaded stylesheet with {} rules", sheet.rules.len());
        Ok(sheet)
    }

    /// Rules for VRI-style `rend` markup shipped with the crate.
    pub fn builtin() -> DomainResult<Self> {
        Self::from_toml(BUILTIN)
    }

    fn validate(&self) -> DomainResult<()> {
        for rule in &self.rules {
            if rule.action == RuleAction::Rename && rule.to.as_deref().unwrap_or("").is_empty() {
                return Err(DomainError::InvalidStylesheet {
                    message: format!("rename rule for <{}> has no 'to' tag", rule.tag),
                });
            }
        }
        Ok(())
    }

    fn rule_for(&self, tree: &XmlTree, id: NodeId) -> Option<&Rule> {
        self.rules.iter().find(|r| r.matches(tree, id))
    }
}

impl Stylesheet for RuleStylesheet {
    fn apply(&self, fragment: &XmlTree) -> DomainResult<XmlTree> {
        let mut tree = fragment.extract(fragment.root());
        let root = tree.root();
        let nodes: Vec<NodeId> = tree.descendants(root).skip(1).map(|(id, _)| id).collect();

        for id in nodes {
            if !tree.contains(id) || !tree[id].is_element() {
                continue;
            }
            let Some(rule) = self.rule_for(&tree, id) else {
                continue;
            };
            trace!("{} -> {:?}", tree[id], rule.action);
            match rule.action {
                RuleAction::Rename => rename(&mut tree, id, rule),
                RuleAction::Unwrap => rewrite::splice_into_parent(&mut tree, id)?,
                RuleAction::Drop => rewrite::remove_keep_tail(&mut tree, id),
            }
        }

        let node = &mut tree[root];
        node.tag = self.root.clone();
        node.attrs.clear();
        Ok(tree)
    }
}

/// Retag a node. With `text_to`, inline markup inside the node is flattened
/// into the attribute value.
fn rename(tree: &mut XmlTree, id: NodeId, rule: &Rule) {
    let text = rule.text_to.as_ref().map(|_| tree.text_content(id));
    if text.is_some() {
        for child in tree.children(id).to_vec() {
            tree.remove(child);
        }
    }
    let node = &mut tree[id];
    node.tag = rule.to.clone().unwrap_or_default();
    node.attrs = rule.set.clone();
    if let (Some(attr), Some(text)) = (&rule.text_to, text) {
        node.text = None;
        node.set_attr(attr.clone(), text.trim());
    }
}
