//! Cross-reference ("helix") scanning between materials.
//!
//! A material can declare the tags it exposes with a `dna` front-matter field,
//! either a single string or a list:
//!
//! ```text
//! ---
//! dna: [button, btn-primary]
//! ---
//! <button class="button btn-primary">{{label}}</button>
//! ```
//!
//! Any other material whose markup carries an element with a matching `id`,
//! `data-dna` token, or class token is linked to it. The result is attached to
//! the material's front matter under `helix`:
//!
//! - `dependents`: materials whose markup uses *this* material's tags
//! - `dependency`: materials whose tags *this* material's markup uses
//!
//! Matched tags are reported with their origin: `#id`, `data-dna=token`, or
//! `.class`. The scan is textual (see [`crate::tags`]), so it can report false
//! positives and miss references built from template expressions.

use crate::tags::{AttributeSet, extract_top_level_tags};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Front-matter field a material uses to declare its tags.
pub const DNA_FIELD: &str = "dna";

/// Front-matter field the annotation is stored under.
pub const HELIX_FIELD: &str = "helix";

/// A material taking part in the scan: its path, declared tags, and the
/// top-level elements of its body, extracted once on construction.
#[derive(Debug, Clone)]
pub struct ScanSource {
    pub path: PathBuf,
    pub dna: Vec<String>,
    pub elements: Vec<AttributeSet>,
}

impl ScanSource {
    pub fn new(path: impl Into<PathBuf>, content: &str, data: &Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            dna: declared_tags(data),
            elements: extract_top_level_tags(content),
        }
    }
}

/// One side of a cross reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelixLink {
    pub file: String,
    pub tags: Vec<String>,
}

/// Cross references for one material. Empty lists are not serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Helix {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependents: Vec<HelixLink>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependency: Vec<HelixLink>,
}

impl Helix {
    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty() && self.dependency.is_empty()
    }
}

/// Tags declared in a `dna` field: a string, or a list of strings.
///
/// Other shapes declare nothing.
pub fn declared_tags(data: &Map<String, Value>) -> Vec<String> {
    match data.get(DNA_FIELD) {
        Some(Value::String(tag)) => tag.split_whitespace().map(String::from).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(str::split_whitespace)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Compute the cross references of `target` against every other source.
///
/// Sources are compared by path; the entry in `all` with `target`'s path is
/// skipped.
pub fn scan(target: &ScanSource, all: &[ScanSource]) -> Helix {
    let mut helix = Helix::default();
    let others = move || all.iter().filter(move |other| other.path != target.path);

    if !target.dna.is_empty() {
        for other in others() {
            let tags = match_elements(&other.elements, &target.dna);
            if !tags.is_empty() {
                helix.dependents.push(HelixLink {
                    file: display_path(&other.path),
                    tags,
                });
            }
        }
    }

    for other in others().filter(|other| !other.dna.is_empty()) {
        let tags = match_elements(&target.elements, &other.dna);
        if !tags.is_empty() {
            helix.dependency.push(HelixLink {
                file: display_path(&other.path),
                tags,
            });
        }
    }

    helix
}

/// Scan `target` and return `data` with a `helix` entry when anything matched.
///
/// A diagnostic line is logged for every material with a non-empty annotation.
pub fn annotate(target: &ScanSource, all: &[ScanSource], mut data: Map<String, Value>) -> Map<String, Value> {
    let helix = scan(target, all);
    if helix.is_empty() {
        return data;
    }

    tracing::info!(
        material = %target.path.display(),
        dependents = helix.dependents.len(),
        dependency = helix.dependency.len(),
        "cross references found"
    );

    let value = serde_json::to_value(&helix).expect("helix links serialize to JSON");
    data.insert(HELIX_FIELD.to_string(), value);
    data
}

/// Matched identifiers with their origin prefix, deduplicated in first-seen order.
fn match_elements(elements: &[AttributeSet], wanted: &[String]) -> Vec<String> {
    let is_wanted = |token: &str| wanted.iter().any(|w| w == token);
    let mut found: Vec<String> = Vec::new();
    let mut push = |tag: String| {
        if !found.contains(&tag) {
            found.push(tag);
        }
    };

    for element in elements {
        if let Some(id) = element.id().filter(|id| is_wanted(*id)) {
            push(format!("#{id}"));
        }
        for token in element.dna().filter(|t| is_wanted(*t)) {
            push(format!("data-dna={token}"));
        }
        for class in element.classes().filter(|c| is_wanted(*c)) {
            push(format!(".{class}"));
        }
    }
    found
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source(path: &str, data: Value, content: &str) -> ScanSource {
        let data = data.as_object().cloned().unwrap_or_default();
        ScanSource::new(path, content, &data)
    }

    #[test]
    fn dna_as_string_or_list() {
        let one = json!({"dna": "widget"});
        let many = json!({"dna": ["widget", "gadget"]});
        let none = json!({"dna": 3});
        assert_eq!(declared_tags(one.as_object().unwrap()), vec!["widget"]);
        assert_eq!(declared_tags(many.as_object().unwrap()), vec!["widget", "gadget"]);
        assert!(declared_tags(none.as_object().unwrap()).is_empty());
    }

    #[test]
    fn dependents_found_by_class() {
        let a = source("a.html", json!({"dna": "widget"}), "<div class=\"widget\"></div>");
        let b = source("b.html", json!({}), "<section><div class=\"widget\">x</div></section>");
        let all = vec![a.clone(), b];

        let helix = scan(&a, &all);
        assert_eq!(
            helix.dependents,
            vec![HelixLink {
                file: "b.html".into(),
                tags: vec![".widget".into()]
            }]
        );
    }

    #[test]
    fn dependency_found_without_own_dna() {
        let a = source("a.html", json!({"dna": "widget"}), "<div class=\"widget\"></div>");
        let b = source("b.html", json!({}), "<div class=\"widget\"></div>");
        let all = vec![a, b.clone()];

        let helix = scan(&b, &all);
        assert!(helix.dependents.is_empty());
        assert_eq!(helix.dependency.len(), 1);
        assert_eq!(helix.dependency[0].file, "a.html");
        assert_eq!(helix.dependency[0].tags, vec![".widget"]);
    }

    #[test]
    fn no_dependency_when_tags_absent() {
        let a = source("a.html", json!({"dna": "widget"}), "<div class=\"widget\"></div>");
        let c = source("c.html", json!({}), "<div class=\"other\"></div>");
        let all = vec![a, c.clone()];

        assert!(scan(&c, &all).is_empty());
    }

    #[test]
    fn origins_are_prefixed_and_deduplicated() {
        let a = source("a.html", json!({"dna": ["hero", "cta"]}), "");
        let b = source(
            "b.html",
            json!({}),
            r#"<div id="hero" data-dna="cta hero"><a class="cta">1</a><a class="cta">2</a></div>"#,
        );
        let all = vec![a.clone(), b];

        let tags = &scan(&a, &all).dependents[0].tags;
        assert_eq!(tags, &vec!["#hero", "data-dna=cta", "data-dna=hero", ".cta"]);
    }

    #[test]
    fn elements_are_extracted_on_construction() {
        let b = source("b.html", json!({}), "<div class=\"widget\"><i></i></div><p id=\"x\"></p>");
        let tags: Vec<&str> = b.elements.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["div", "i", "p"]);
        assert_eq!(b.elements[0].classes().collect::<Vec<_>>(), vec!["widget"]);
        assert_eq!(b.elements[2].id(), Some("x"));
    }

    #[test]
    fn self_is_never_linked() {
        let a = source("a.html", json!({"dna": "widget"}), "<div class=\"widget\"></div>");
        let all = vec![a.clone()];
        assert!(scan(&a, &all).is_empty());
    }

    #[test]
    fn annotate_adds_helix_only_when_matched() {
        let a = source("a.html", json!({"dna": "widget"}), "");
        let b = source("b.html", json!({}), "<i class=\"widget\"></i>");
        let c = source("c.html", json!({}), "<i></i>");
        let all = vec![a.clone(), b, c.clone()];

        let data = annotate(&a, &all, Map::new());
        assert_eq!(
            data.get(HELIX_FIELD),
            Some(&json!({"dependents": [{"file": "b.html", "tags": [".widget"]}]}))
        );

        let untouched = annotate(&c, &all, Map::new());
        assert!(untouched.get(HELIX_FIELD).is_none());
    }
}
