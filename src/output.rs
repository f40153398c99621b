//! CLI output formatting for `check` and `build`.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every entity (collection,
//! material, view, doc) leads with its positional index and display name; the
//! identifier a template uses to reach it is shown as an indented context line.
//! This makes the output readable as an inventory of the style guide while
//! still telling authors what to type in `{{material "..."}}`.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Materials
//! 001 Structures
//!     001 Page
//!         Id: structures.page
//!     002 Footer
//!         Id: structures.footer
//! 002 Components
//!     001 Forms
//!         001 Input
//!             Id: forms.input
//!             Notes: Use inside a fieldset.
//!
//! Views
//! 001 Pages
//!     001 About
//!
//! Docs
//! 001 Intro
//!
//! Data
//!     site
//! ```
//!
//! ## Build
//!
//! ```text
//! index → index.html
//! 01-about → pages/01-about.html
//!
//! Wrote 2 pages
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::assemble::BuildReport;
use crate::context::AssemblyContext;
use crate::materials::{MaterialEntry, MaterialItem, MaterialTree};
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + display name.
///
/// ```text
/// 001 Structures
/// ```
fn entity_header(depth: usize, index: usize, name: &str) -> String {
    format!("{}{} {}", indent(depth), format_index(index), name)
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_notes(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// Header plus `Id:` and optional `Notes:` context lines for one material.
fn material_lines(depth: usize, index: usize, id: &str, entry: &MaterialEntry) -> Vec<String> {
    let mut lines = vec![
        entity_header(depth, index, &entry.name),
        format!("{}Id: {}", indent(depth + 1), id),
    ];
    let notes = strip_html_tags(&entry.notes);
    let notes = notes.split_whitespace().collect::<Vec<_>>().join(" ");
    if !notes.is_empty() {
        lines.push(format!("{}Notes: {}", indent(depth + 1), truncate_notes(&notes, 40)));
    }
    lines
}

// ============================================================================
// Check output
// ============================================================================

/// Format the materials tree.
///
/// Sub-collection members are addressed by the sub-collection key, so their
/// `Id:` line uses it instead of the top-level collection key.
pub fn format_materials_tree(tree: &MaterialTree) -> Vec<String> {
    let mut lines = vec!["Materials".to_string()];

    for (ci, (collection_key, collection)) in tree.iter().enumerate() {
        lines.push(entity_header(0, ci + 1, &collection.name));
        for (ii, (item_key, item)) in collection.items.iter().enumerate() {
            match item {
                MaterialItem::Entry(entry) => {
                    let id = format!("{collection_key}.{item_key}");
                    lines.extend(material_lines(1, ii + 1, &id, entry));
                }
                MaterialItem::Group(group) => {
                    lines.push(entity_header(1, ii + 1, &group.name));
                    for (ei, (entry_key, entry)) in group.items.iter().enumerate() {
                        let id = format!("{item_key}.{entry_key}");
                        lines.extend(material_lines(2, ei + 1, &id, entry));
                    }
                }
            }
        }
    }
    lines
}

/// Format everything `setup` found: materials, views, docs, and data keys.
pub fn format_check_output(ctx: &AssemblyContext) -> Vec<String> {
    let mut lines = format_materials_tree(&ctx.materials);

    if !ctx.views.is_empty() {
        lines.push(String::new());
        lines.push("Views".to_string());
        for (ci, (_, collection)) in ctx.views.iter().enumerate() {
            lines.push(entity_header(0, ci + 1, &collection.name));
            for (vi, (_, view)) in collection.items.iter().enumerate() {
                lines.push(entity_header(1, vi + 1, &view.name));
            }
        }
    }

    if !ctx.docs.is_empty() {
        lines.push(String::new());
        lines.push("Docs".to_string());
        for (di, (_, doc)) in ctx.docs.iter().enumerate() {
            lines.push(entity_header(0, di + 1, &doc.name));
        }
    }

    if !ctx.data.is_empty() {
        lines.push(String::new());
        lines.push("Data".to_string());
        for key in ctx.data.keys() {
            lines.push(format!("{}{}", indent(1), key));
        }
    }

    lines
}

/// Print check output to stdout.
pub fn print_check_output(ctx: &AssemblyContext) {
    for line in format_check_output(ctx) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format one line per written page, paths relative to `dest`.
pub fn format_build_output(report: &BuildReport, dest: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    for page in &report.pages {
        let id = report
            .context
            .view_sources
            .iter()
            .find(|v| v.path == page.source)
            .map(|v| v.id.as_str())
            .unwrap_or("?");
        let output = page.output.strip_prefix(dest).unwrap_or(&page.output);
        lines.push(format!("{} → {}", id, output.display()));
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    let count = report.pages.len();
    let noun = if count == 1 { "page" } else { "pages" };
    lines.push(format!("Wrote {} {}", count, noun));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport, dest: &Path) {
    for line in format_build_output(report, dest) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
