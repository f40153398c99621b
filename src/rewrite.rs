//! Namespacing of a material's own placeholders.
//!
//! Materials are authored with short field names taken from their own front
//! matter:
//!
//! ```text
//! ---
//! label: Buy now
//! ---
//! <button>{{label}}</button>
//! ```
//!
//! Once every material's data is merged into one rendering context, `label`
//! from one material would collide with `label` from another. Before a
//! material is registered as a partial, each placeholder naming one of its own
//! fields is qualified with the material's namespace (its id with dots
//! replaced by hyphens):
//!
//! - `{{label}}` → `{{components-button.label}}`
//! - `{{#items}}…{{/items}}` → `{{#components-button.items}}…{{/components-button.items}}`
//!
//! Already-qualified references are left alone, so rewriting twice is the
//! same as rewriting once. Only the in-memory partial is changed.

use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// Qualify every placeholder in `content` that names a key of `local_data`.
pub fn rewrite(content: &str, local_data: &Map<String, Value>, namespace: &str) -> String {
    let mut content = content.to_string();
    for key in local_data.keys() {
        content = rewrite_key(&content, key, namespace);
    }
    content
}

fn rewrite_key(content: &str, key: &str, namespace: &str) -> String {
    // One pattern covers `{{key}}`, `{{#key}}` and `{{/key}}`.
    let pattern = format!(r"\{{\{{([#/]?)\s*{}\s*\}}\}}", regex::escape(key));
    let placeholder = Regex::new(&pattern).expect("escaped key pattern is valid");

    placeholder
        .replace_all(content, |caps: &Captures| {
            format!("{{{{{}{}.{}}}}}", &caps[1], namespace, key)
        })
        .into_owned()
}
