//! Heuristic opening-tag scanner.
//!
//! The cross-reference scanner only needs to know, for each element in a
//! fragment, its `id`, its `data-dna` tokens, and its class list. This module
//! finds opening tags with a flat regex and pulls their attributes out. It is
//! not an HTML parser: nesting is ignored, tags inside comments or strings are
//! still reported, and attributes broken across template expressions may be
//! missed. Callers only depend on [`extract_top_level_tags`], so a real
//! tokenizer can replace this later.

use regex::Regex;
use std::sync::LazyLock;

static OPENING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z][A-Za-z0-9:_-]*)((?:\s[^<>]*?)?)\s*/?>").expect("tag pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/"'<>]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

/// Attributes of one opening tag, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
}

impl AttributeSet {
    /// Value of the first attribute named `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id").map(str::trim).filter(|v| !v.is_empty())
    }

    /// Whitespace-separated `data-dna` tokens.
    pub fn dna(&self) -> impl Iterator<Item = &str> {
        self.get("data-dna").unwrap_or_default().split_whitespace()
    }

    /// Whitespace-separated class tokens.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get("class").unwrap_or_default().split_whitespace()
    }
}

/// Every opening tag in `text`, flattened, in source order.
pub fn extract_top_level_tags(text: &str) -> Vec<AttributeSet> {
    OPENING_TAG
        .captures_iter(text)
        .map(|caps| {
            let tag = caps[1].to_ascii_lowercase();
            let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            AttributeSet {
                tag,
                attributes: parse_attributes(attrs),
            }
        })
        .collect()
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(source)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}
