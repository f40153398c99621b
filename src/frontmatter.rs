//! Front-matter splitting for materials, views, and docs.
//!
//! A source file may open with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Home
//! order: 1
//! notes: |
//!   Use on landing pages only.
//! ---
//! <p>{{title}}</p>
//! ```
//!
//! The block must start on the first line. Anything else is body. An empty
//! block (or a file with no block) yields empty data; a block that is not a
//! YAML mapping is an error, since every consumer indexes it by key.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatterError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid front matter in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("front matter in {0} is not a key/value mapping")]
    NotAMapping(PathBuf),
}

/// A source file split into its front-matter data and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matter {
    pub data: Map<String, Value>,
    pub content: String,
}

const FENCE: &str = "---";

/// Read `path` and split it into front matter and body.
pub fn read_matter(path: &Path) -> Result<Matter, MatterError> {
    let source = fs::read_to_string(path).map_err(|source| MatterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_matter(&source, path)
}

/// Split `source` into front matter and body. `path` is used for errors only.
pub fn parse_matter(source: &str, path: &Path) -> Result<Matter, MatterError> {
    let Some((yaml, body)) = split(source) else {
        return Ok(Matter {
            data: Map::new(),
            content: source.to_string(),
        });
    };

    if yaml.trim().is_empty() {
        return Ok(Matter {
            data: Map::new(),
            content: body.to_string(),
        });
    }

    let value: Value = serde_yaml::from_str(yaml).map_err(|source| MatterError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    let data = match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => return Err(MatterError::NotAMapping(path.to_path_buf())),
    };

    Ok(Matter {
        data,
        content: body.to_string(),
    })
}

/// Returns `(yaml, body)` when `source` opens with a fenced block.
fn split(source: &str) -> Option<(&str, &str)> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let first_line_end = source.find('\n')?;
    if source[..first_line_end].trim_end() != FENCE {
        return None;
    }

    let rest = &source[first_line_end + 1..];
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Remove leading blank lines and trailing blank lines.
///
/// Indentation of the first content line is kept. Trailing whitespace is only
/// removed when the content ends in a line break.
pub fn trim_blank_lines(content: &str) -> &str {
    let leading_ws = content.len() - content.trim_start().len();
    let start = content[..leading_ws]
        .rfind(['\n', '\r'])
        .map(|i| i + 1)
        .unwrap_or(0);

    let body = &content[start..];
    if body.ends_with(['\n', '\r']) {
        body.trim_end()
    } else {
        body
    }
}
