//! Project configuration.
//!
//! Handles loading, validating, and merging `stylebook.toml`. Stock defaults
//! describe the conventional project layout; a `stylebook.toml` in the project
//! root overrides any subset of them.
//!
//! ## Default Layout
//!
//! ```text
//! project/
//! ├── stylebook.toml               # Optional overrides
//! └── src/
//!     ├── materials/               # Reusable fragments, grouped by directory
//!     │   ├── components/
//!     │   │   ├── 01-button.html
//!     │   │   └── forms/           # Sub-collection
//!     │   │       └── input.html
//!     │   └── structures/
//!     ├── views/                   # Pages; subdirectories become view collections
//!     │   └── layouts/             # Page layouts with a {% body %} marker
//!     │       └── includes/        # Partials available to layouts
//!     ├── data/                    # Global JSON/YAML data
//!     └── docs/                    # Markdown documentation
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! layout = "default"        # Layout used when a view names none
//! dest = "dist"             # Output directory
//!
//! [sources]
//! layouts = "src/views/layouts"
//! layout_includes = "src/views/layouts/includes"
//! views = "src/views"
//! materials = ["src/materials"]
//! data = "src/data"
//! docs = "src/docs"
//!
//! [keys]                    # Names of the trees in the template context
//! materials = "materials"   # Also names the helper: {{material "..."}}
//! views = "views"
//! docs = "docs"
//!
//! [materials]
//! duplicate_ids = "warn"    # "warn" (later material wins) or "error"
//! ```
//!
//! Relative paths are resolved against the project root. Unknown keys are
//! rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "stylebook.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `stylebook.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssembleConfig {
    /// Layout used for views whose front matter names none.
    pub layout: String,
    /// Output directory for rendered views.
    pub dest: String,
    /// Where each kind of source lives.
    pub sources: SourcesConfig,
    /// Context key names for the materials, views, and docs trees.
    pub keys: KeysConfig,
    /// Material registration behavior.
    pub materials: MaterialsConfig,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            layout: "default".to_string(),
            dest: "dist".to_string(),
            sources: SourcesConfig::default(),
            keys: KeysConfig::default(),
            materials: MaterialsConfig::default(),
        }
    }
}

impl AssembleConfig {
    /// Validate values that deserialization alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.trim().is_empty() {
            return Err(ConfigError::Validation("layout must not be empty".into()));
        }
        if self.dest.trim().is_empty() {
            return Err(ConfigError::Validation("dest must not be empty".into()));
        }
        if self.sources.materials.is_empty() {
            return Err(ConfigError::Validation(
                "sources.materials must list at least one directory".into(),
            ));
        }
        let keys = [&self.keys.materials, &self.keys.views, &self.keys.docs];
        if keys.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation("keys must not be empty".into()));
        }
        if keys[0] == keys[1] || keys[0] == keys[2] || keys[1] == keys[2] {
            return Err(ConfigError::Validation("keys must be distinct".into()));
        }
        if self.keys.helper_name().is_empty() {
            return Err(ConfigError::Validation(
                "keys.materials must leave a helper name once singularized".into(),
            ));
        }
        Ok(())
    }

    /// Resolve every configured path against `root`.
    pub fn resolve(&self, root: &Path) -> ProjectPaths {
        let at = |p: &str| root.join(p);
        ProjectPaths {
            layouts: at(&self.sources.layouts),
            layout_includes: at(&self.sources.layout_includes),
            views: at(&self.sources.views),
            materials: self.sources.materials.iter().map(|p| at(p)).collect(),
            data: at(&self.sources.data),
            docs: at(&self.sources.docs),
            dest: at(&self.dest),
        }
    }
}

/// Source directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// Layout templates (not recursive).
    pub layouts: String,
    /// Partials registered for use in layouts (not recursive).
    pub layout_includes: String,
    /// Views, walked recursively; the layout directories are skipped.
    pub views: String,
    /// Material roots. Each direct subdirectory is a collection.
    pub materials: Vec<String>,
    /// Global JSON/YAML data files.
    pub data: String,
    /// Markdown docs.
    pub docs: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            layouts: "src/views/layouts".to_string(),
            layout_includes: "src/views/layouts/includes".to_string(),
            views: "src/views".to_string(),
            materials: vec!["src/materials".to_string()],
            data: "src/data".to_string(),
            docs: "src/docs".to_string(),
        }
    }
}

/// Names under which the trees appear in the template context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeysConfig {
    pub materials: String,
    pub views: String,
    pub docs: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            materials: "materials".to_string(),
            views: "views".to_string(),
            docs: "docs".to_string(),
        }
    }
}

impl KeysConfig {
    /// Name of the material helper: the singular of `materials`.
    pub fn helper_name(&self) -> &str {
        self.materials
            .strip_suffix('s')
            .unwrap_or(&self.materials)
    }
}

/// Material registration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaterialsConfig {
    /// What to do when two materials derive the same id.
    pub duplicate_ids: DuplicateIds,
}

/// Policy for two materials deriving the same id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateIds {
    /// Log a warning; the later material replaces the earlier one.
    #[default]
    Warn,
    /// Abort the run.
    Error,
}

/// Absolute locations derived from the config and the project root.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectPaths {
    pub layouts: PathBuf,
    pub layout_includes: PathBuf,
    pub views: PathBuf,
    pub materials: Vec<PathBuf>,
    pub data: PathBuf,
    pub docs: PathBuf,
    pub dest: PathBuf,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AssembleConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `stylebook.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AssembleConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AssembleConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `stylebook.toml` in `root`, on top of stock defaults.
pub fn load_config(root: &Path) -> Result<AssembleConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// A fully-commented stock `stylebook.toml`, printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Stylebook Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
# Relative paths are resolved against the directory holding this file.

# Layout used when a view's front matter has no `layout` field.
layout = "default"

# Output directory for rendered views.
dest = "dist"

# ---------------------------------------------------------------------------
# Sources
# ---------------------------------------------------------------------------
[sources]
# Layout templates. Each must contain a {% body %} marker.
layouts = "src/views/layouts"

# Partials available to layouts, registered by file name.
layout_includes = "src/views/layouts/includes"

# Views. Files in subdirectories form view collections.
views = "src/views"

# Material roots. Every direct subdirectory is a collection, and every
# directory one level below that is a sub-collection. Deeper directories are
# treated as collections of their own.
materials = ["src/materials"]

# Global data (.json, .yml, .yaml), available by file name in every template.
data = "src/data"

# Markdown documentation.
docs = "src/docs"

# ---------------------------------------------------------------------------
# Template context keys
# ---------------------------------------------------------------------------
[keys]
# The material helper is the singular of this key: {{material "forms.input"}}
materials = "materials"
views = "views"
docs = "docs"

# ---------------------------------------------------------------------------
# Materials
# ---------------------------------------------------------------------------
[materials]
# "warn": log duplicate material ids and keep the later material.
# "error": stop the build.
duplicate_ids = "warn"
"##
}
