//! Everything besides materials that feeds the template context.
//!
//! | Source           | Walk          | Keyed by                       | Lands in                     |
//! |------------------|---------------|--------------------------------|------------------------------|
//! | layouts          | one level     | `derive_name(file)`            | `ctx.layouts`                |
//! | layout includes  | one level     | `derive_name(file)`            | `ctx.layout_includes`        |
//! | views            | recursive     | `derive_name(file, true)`      | `ctx.views`, `view_sources`  |
//! | docs (`*.md`)    | one level     | `derive_name(file)`            | `ctx.docs`                   |
//! | data (json/yaml) | recursive     | `derive_name(file)`            | `ctx.data`                   |
//!
//! A missing source directory is not an error; it contributes nothing.
//! Unreadable files and unparseable data are fatal.

use crate::context::AssemblyContext;
use crate::frontmatter::{self, Matter, MatterError};
use crate::markdown::render_markdown;
use crate::materials::NOTES_FIELD;
use crate::naming::{derive_name, normalize_segment, to_title_case};
use crate::tree::{Collection, Items, Sortable, order_of};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error walking {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Matter(#[from] MatterError),
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// A view as listed in the views tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewEntry {
    pub name: String,
    pub data: Map<String, Value>,
    #[serde(skip)]
    pub sort_key: String,
}

impl Sortable for ViewEntry {
    fn order(&self) -> Option<&Value> {
        order_of(&self.data)
    }

    fn sort_key(&self) -> &str {
        &self.sort_key
    }
}

/// View collection key → collection of views.
pub type ViewTree = Items<Collection<ViewEntry>>;

/// A view file ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSource {
    pub path: PathBuf,
    /// `derive_name(path, true)`.
    pub id: String,
    pub matter: Matter,
    /// Parent directory name when the view is not directly in the views root.
    pub collection: Option<String>,
}

/// A rendered Markdown document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doc {
    pub name: String,
    pub content: String,
    #[serde(skip)]
    pub sort_key: String,
}

impl Sortable for Doc {
    fn order(&self) -> Option<&Value> {
        None
    }

    fn sort_key(&self) -> &str {
        &self.sort_key
    }
}

// ============================================================================
// Layouts and includes
// ============================================================================

/// Read every file directly inside `dir`, keyed by derived name, trimmed.
pub fn parse_layouts(dir: &Path) -> Result<BTreeMap<String, String>, SourceError> {
    let mut layouts = BTreeMap::new();
    for file in list_files(dir, false)? {
        let content = read_file(&file)?;
        tracing::debug!(path = %file.display(), "read layout");
        layouts.insert(derive_name(&file, false), content.trim().to_string());
    }
    Ok(layouts)
}

/// Layout includes are read like layouts and registered as partials later.
pub fn parse_layout_includes(dir: &Path) -> Result<BTreeMap<String, String>, SourceError> {
    parse_layouts(dir)
}

// ============================================================================
// Views
// ============================================================================

/// Every view file below `root`, skipping the directories in `exclude`.
pub fn discover_views(root: &Path, exclude: &[PathBuf]) -> Result<Vec<PathBuf>, SourceError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || (!is_hidden(e.path()) && !exclude.iter().any(|x| e.path() == x.as_path()))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| SourceError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Read views, fill `ctx.view_sources`, and build the sorted views tree.
///
/// Views in a subdirectory of `root` are listed under a collection named after
/// that directory and receive `baseurl: ".."`. Views directly in `root` are
/// rendered but not listed.
pub fn parse_views(
    ctx: &mut AssemblyContext,
    root: &Path,
    files: &[PathBuf],
) -> Result<(), SourceError> {
    ctx.views = ViewTree::default();
    ctx.view_sources.clear();

    for file in files {
        let mut matter = frontmatter::read_matter(file)?;
        let id = derive_name(file, true);
        let collection = file
            .parent()
            .filter(|dir| *dir != root)
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned());

        if let Some(collection) = &collection {
            matter
                .data
                .entry("baseurl")
                .or_insert_with(|| Value::String("..".into()));

            let mut data = matter.data.clone();
            data.remove(NOTES_FIELD);
            let group = ctx.views.entry_or_insert_with(collection, || {
                Collection::new(
                    to_title_case(&normalize_segment(collection, false)),
                    collection.clone(),
                )
            });
            group.items.insert(
                id.clone(),
                ViewEntry {
                    name: to_title_case(&derive_name(file, false)),
                    data,
                    sort_key: id.clone(),
                },
            );
        }

        tracing::debug!(path = %file.display(), id = %id, "read view");
        ctx.view_sources.push(ViewSource {
            path: file.clone(),
            id,
            matter,
            collection,
        });
    }

    ctx.views.sort();
    for group in ctx.views.values_mut() {
        group.items.sort();
    }
    Ok(())
}

// ============================================================================
// Docs and data
// ============================================================================

/// Render every `*.md` file directly inside `dir`.
pub fn parse_docs(dir: &Path) -> Result<Items<Doc>, SourceError> {
    let mut docs = Items::default();
    for file in list_files(dir, false)? {
        if !has_extension(&file, &["md"]) {
            continue;
        }
        let source = read_file(&file)?;
        let name = derive_name(&file, false);
        docs.insert(
            name.clone(),
            Doc {
                name: to_title_case(&name),
                content: render_markdown(&source),
                sort_key: derive_name(&file, true),
            },
        );
        tracing::debug!(path = %file.display(), "rendered doc");
    }
    docs.sort();
    Ok(docs)
}

/// Parse every JSON or YAML file below `dir`.
pub fn parse_data(dir: &Path) -> Result<Map<String, Value>, SourceError> {
    let mut data = Map::new();
    for file in list_files(dir, true)? {
        let value = if has_extension(&file, &["json"]) {
            let text = read_file(&file)?;
            serde_json::from_str(&text).map_err(|source| SourceError::Json {
                path: file.clone(),
                source,
            })?
        } else if has_extension(&file, &["yml", "yaml"]) {
            let text = read_file(&file)?;
            serde_yaml::from_str::<Value>(&text).map_err(|source| SourceError::Yaml {
                path: file.clone(),
                source,
            })?
        } else {
            continue;
        };
        tracing::debug!(path = %file.display(), "read data file");
        data.insert(derive_name(&file, false), value);
    }
    Ok(data)
}

// ============================================================================
// Helpers
// ============================================================================

fn list_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, SourceError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !is_hidden(e.path())) {
        let entry = entry.map_err(|source| SourceError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_file(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use serde_json::json;

    #[test]
    fn layouts_are_trimmed_and_keyed_by_name() {
        let tmp = project(&[
            ("layouts/default.html", "\n<html>{% body %}</html>\n"),
            ("layouts/includes/head.html", "<head></head>"),
        ]);
        let layouts = parse_layouts(&tmp.path().join("layouts")).unwrap();
        assert_eq!(layouts.keys().collect::<Vec<_>>(), vec!["default"]);
        assert_eq!(layouts["default"], "<html>{% body %}</html>");

        let includes = parse_layout_includes(&tmp.path().join("layouts/includes")).unwrap();
        assert_eq!(includes["head"], "<head></head>");
    }

    #[test]
    fn missing_directories_are_empty() {
        let tmp = project(&[]);
        assert!(parse_layouts(&tmp.path().join("nope")).unwrap().is_empty());
        assert!(parse_docs(&tmp.path().join("nope")).unwrap().is_empty());
        assert!(parse_data(&tmp.path().join("nope")).unwrap().is_empty());
        assert!(discover_views(&tmp.path().join("nope"), &[]).unwrap().is_empty());
    }

    #[test]
    fn views_skip_excluded_directories() {
        let tmp = project(&[
            ("views/index.html", "i"),
            ("views/layouts/default.html", "l"),
            ("views/pages/about.html", "a"),
        ]);
        let root = tmp.path().join("views");
        let files = discover_views(&root, &[root.join("layouts")]).unwrap();
        let names: Vec<_> = files.iter().map(|f| derive_name(f, true)).collect();
        assert_eq!(names, vec!["index", "about"]);
    }

    #[test]
    fn views_in_subdirectories_form_collections() {
        let tmp = project(&[
            ("views/index.html", "---\ntitle: Home\n---\ni"),
            ("views/pages/02-contact.html", "c"),
            ("views/pages/01-about.html", "---\nnotes: hidden\ntitle: About\n---\na"),
        ]);
        let root = tmp.path().join("views");
        let files = discover_views(&root, &[]).unwrap();
        let mut ctx = AssemblyContext::default();
        parse_views(&mut ctx, &root, &files).unwrap();

        assert_eq!(ctx.views.keys().collect::<Vec<_>>(), vec!["pages"]);
        let pages = ctx.views.get("pages").unwrap();
        assert_eq!(pages.name, "Pages");
        assert_eq!(pages.items.keys().collect::<Vec<_>>(), vec!["01-about", "02-contact"]);

        let about = pages.items.get("01-about").unwrap();
        assert_eq!(about.name, "About");
        assert_eq!(about.data["title"], json!("About"));
        assert_eq!(about.data["baseurl"], json!(".."));
        assert!(!about.data.contains_key("notes"));

        let index = ctx.view_sources.iter().find(|v| v.id == "index").unwrap();
        assert_eq!(index.collection, None);
        assert!(!index.matter.data.contains_key("baseurl"));
    }

    #[test]
    fn docs_render_markdown_in_file_order() {
        let tmp = project(&[
            ("docs/02-usage.md", "# Usage"),
            ("docs/01-intro.md", "Hello *there*"),
            ("docs/notes.txt", "ignored"),
        ]);
        let docs = parse_docs(&tmp.path().join("docs")).unwrap();
        assert_eq!(docs.keys().collect::<Vec<_>>(), vec!["intro", "usage"]);
        let intro = docs.get("intro").unwrap();
        assert_eq!(intro.name, "Intro");
        assert_eq!(intro.content, "<p>Hello <em>there</em></p>\n");
    }

    #[test]
    fn data_reads_json_and_yaml() {
        let tmp = project(&[
            ("data/site.json", r#"{"name": "Demo"}"#),
            ("data/nested/colors.yml", "primary: red\n"),
            ("data/readme.txt", "skip"),
        ]);
        let data = parse_data(&tmp.path().join("data")).unwrap();
        assert_eq!(data["site"], json!({"name": "Demo"}));
        assert_eq!(data["colors"], json!({"primary": "red"}));
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn bad_data_is_fatal() {
        let tmp = project(&[("data/site.json", "{oops")]);
        let err = parse_data(&tmp.path().join("data")).unwrap_err();
        assert!(matches!(err, SourceError::Json { .. }));
    }
}
