//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/tipitree/tipitree.toml`
//! 3. Explicit config file: `--config <FILE>`
//! 4. Environment variables: `TIPITREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

/// Attribute names that make a node reference another document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Reference to a further index document
    pub source_attr: String,
    /// Reference to chapter content
    pub action_attr: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            source_attr: "src".into(),
            action_attr: "action".into(),
        }
    }
}

/// Layout of split output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SplitConfig {
    /// Tag of table-of-contents nodes
    pub toc_tag: String,
    /// Attributes tried in order for a node's display title
    pub title_attrs: Vec<String>,
    /// Root tag of chapter files
    pub leaf_tag: String,
    /// Root tag of index files, by depth
    pub level_tags: Vec<String>,
    /// Suffix of index files
    pub index_suffix: String,
    /// File name of the top-level index
    pub root_index: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            toc_tag: "tree".into(),
            title_attrs: vec!["text".into(), "title".into()],
            leaf_tag: "chapter".into(),
            level_tags: vec![
                "collection".into(),
                "pitika".into(),
                "nikaya".into(),
                "book".into(),
                "chapter".into(),
            ],
            index_suffix: ".toc.xml".into(),
            root_index: "toc.xml".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawReferenceConfig {
    pub source_attr: Option<String>,
    pub action_attr: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSplitConfig {
    pub toc_tag: Option<String>,
    pub title_attrs: Option<Vec<String>>,
    pub leaf_tag: Option<String>,
    pub level_tags: Option<Vec<String>>,
    pub index_suffix: Option<String>,
    pub root_index: Option<String>,
}

/// Raw settings for intermediate parsing: `None` means "not specified,
/// inherit from the layer below".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub stylesheet: Option<PathBuf>,
    pub references: RawReferenceConfig,
    pub split: RawSplitConfig,
}

/// Unified configuration for tipitree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Rule file replacing the built-in stylesheet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<PathBuf>,
    pub references: ReferenceConfig,
    pub split: SplitConfig,
}

/// Get the XDG config directory for tipitree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tipitree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("tipitree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl ReferenceConfig {
    fn merge(&self, overlay: &RawReferenceConfig) -> Self {
        Self {
            source_attr: overlay
                .source_attr
                .clone()
                .unwrap_or_else(|| self.source_attr.clone()),
            action_attr: overlay
                .action_attr
                .clone()
                .unwrap_or_else(|| self.action_attr.clone()),
        }
    }
}

impl SplitConfig {
    /// Overlay wins field by field; arrays are replaced, not merged.
    fn merge(&self, overlay: &RawSplitConfig) -> Self {
        Self {
            toc_tag: overlay.toc_tag.clone().unwrap_or_else(|| self.toc_tag.clone()),
            title_attrs: overlay
                .title_attrs
                .clone()
                .unwrap_or_else(|| self.title_attrs.clone()),
            leaf_tag: overlay
                .leaf_tag
                .clone()
                .unwrap_or_else(|| self.leaf_tag.clone()),
            level_tags: overlay
                .level_tags
                .clone()
                .unwrap_or_else(|| self.level_tags.clone()),
            index_suffix: overlay
                .index_suffix
                .clone()
                .unwrap_or_else(|| self.index_suffix.clone()),
            root_index: overlay
                .root_index
                .clone()
                .unwrap_or_else(|| self.root_index.clone()),
        }
    }
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax. Unknown variables are left as written.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.stylesheet {
            let raw = path.to_string_lossy().into_owned();
            let expanded = shellexpand::full(&raw)
                .map(|s| s.into_owned())
                .unwrap_or(raw);
            self.stylesheet = Some(PathBuf::from(expanded));
        }
    }

    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            stylesheet: overlay
                .stylesheet
                .clone()
                .or_else(|| self.stylesheet.clone()),
            references: self.references.merge(&overlay.references),
            split: self.split.merge(&overlay.split),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file (`--config`), must exist
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/tipitree/tipitree.toml`
    /// 3. Explicit config file
    /// 4. Environment variables: `TIPITREE_*` prefix
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        Self::load_layers(global.as_deref(), config_file)
    }

    /// Layered load with an explicit global file location.
    pub fn load_layers(
        global: Option<&Path>,
        config_file: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global {
            let raw = load_raw_settings(global_path)?;
            current = current.merge_with(&raw);
        }

        // 3. Explicit config file
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        // 4. Environment variables (explicit override)
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply TIPITREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("TIPITREE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("split.title_attrs")
                .with_list_parse_key("split.level_tags"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("stylesheet") {
            settings.stylesheet = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("references.source_attr") {
            settings.references.source_attr = val;
        }
        if let Ok(val) = config.get_string("references.action_attr") {
            settings.references.action_attr = val;
        }
        if let Ok(val) = config.get_string("split.toc_tag") {
            settings.split.toc_tag = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("split.title_attrs") {
            settings.split.title_attrs = val;
        }
        if let Ok(val) = config.get_string("split.leaf_tag") {
            settings.split.leaf_tag = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("split.level_tags") {
            settings.split.level_tags = val;
        }
        if let Ok(val) = config.get_string("split.index_suffix") {
            settings.split.index_suffix = val;
        }
        if let Ok(val) = config.get_string("split.root_index") {
            settings.split.root_index = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# tipitree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/tipitree/tipitree.toml
#   File:   --config <FILE>
#   Env:    TIPITREE_* environment variables, e.g. TIPITREE_SPLIT__LEAF_TAG=chapter

# Rule file replacing the built-in stylesheet
# stylesheet = "~/.config/tipitree/stylesheet.toml"

[references]
# Attribute referencing a further index document
# source_attr = "src"

# Attribute referencing chapter content
# action_attr = "action"

[split]
# Tag of table-of-contents nodes
# toc_tag = "tree"

# Attributes tried in order for a node's display title
# title_attrs = ["text", "title"]

# Root tag of chapter files
# leaf_tag = "chapter"

# Root tag of index files, by depth
# level_tags = ["collection", "pitika", "nikaya", "book", "chapter"]

# index_suffix = ".toc.xml"
# root_index = "toc.xml"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_layers_then_uses_defaults() {
        let settings = Settings::load_layers(None, None).expect("load defaults");
        assert_eq!(settings.references.source_attr, "src");
        assert_eq!(settings.references.action_attr, "action");
        assert_eq!(settings.split.toc_tag, "tree");
        assert!(settings.stylesheet.is_none());
    }

    #[test]
    fn given_tilde_in_stylesheet_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            stylesheet: Some(PathBuf::from("~/rules.toml")),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let path = settings.stylesheet.unwrap();
        assert!(path.to_string_lossy().starts_with(&home));
        assert!(!path.to_string_lossy().contains('~'));
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_fields() {
        let base = SplitConfig::default();
        let overlay = RawSplitConfig {
            leaf_tag: Some("sutta".into()),
            level_tags: Some(vec!["a".into()]),
            ..RawSplitConfig::default()
        };

        let result = base.merge(&overlay);

        assert_eq!(result.leaf_tag, "sutta");
        assert_eq!(result.level_tags, vec!["a".to_string()]);
        assert_eq!(result.toc_tag, "tree");
        assert_eq!(result.title_attrs, base.title_attrs);
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("template parses");
        assert!(raw.stylesheet.is_none());
        assert!(raw.split.leaf_tag.is_none());
    }
}
