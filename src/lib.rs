//! # Stylebook
//!
//! A style-guide assembler. Your filesystem is the data source: directories of
//! reusable template fragments ("materials") become a browsable collection
//! tree, page views are rendered inside layouts, and every material is
//! reachable from every page as a partial.
//!
//! # Architecture: Setup, Then Assemble
//!
//! ```text
//! 1. Setup     src/  →  AssemblyContext   (files → trees, partials, data)
//! 2. Assemble  ctx   →  dist/             (views → wrapped, rendered HTML)
//! ```
//!
//! Setup never writes; assemble never re-reads sources. Both live on
//! [`assemble::Assembler`]. Each run starts from a fresh
//! [`context::AssemblyContext`], so nothing leaks between builds and tests can
//! run in parallel.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | Names, serials, and title case derived from file paths |
//! | [`frontmatter`] | `---` YAML front matter split from file bodies |
//! | [`tags`] | Heuristic top-level HTML tag scanner |
//! | [`helix`] | Cross-reference scan between materials (`dna` tags) |
//! | [`rewrite`] | Namespacing of a material's own placeholders |
//! | [`tree`] | Ordered two-level collection trees and the sort rule |
//! | [`materials`] | Material classification, tree building, and partial registration |
//! | [`sources`] | Layouts, layout includes, views, docs, and data files |
//! | [`context`] | Per-run state and template-context merging |
//! | [`hooks`] | Per-stage extension points |
//! | [`render`] | Handlebars registry, `material` helper, page wrapping and writing |
//! | [`assemble`] | The pipeline tying the stages together |
//! | [`config`] | `stylebook.toml` loading, merging, and validation |
//! | [`markdown`] | Markdown rendering for notes and docs |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Directory Layout Is the Tree
//!
//! A material's collection comes from its parent directory, and its
//! sub-collection from one more level of nesting below a collection root.
//! There is no manifest and no registry file. Only two levels exist; deeper
//! directories flatten into a top-level collection named after the innermost
//! directory.
//!
//! ## Namespaced Material Data
//!
//! Materials are authored with short placeholders (`{{title}}`) but composed
//! into one shared context. At registration time every placeholder naming one
//! of the material's own front-matter fields is rewritten to
//! `{{<collection>-<name>.title}}`, and the material's data is published under
//! that namespace. Two materials can both declare `title` without clashing.
//!
//! ## Heuristic Cross-References
//!
//! The [`helix`] scan looks for a material's declared `dna` tags in other
//! materials' markup with a regex tag scanner, not an HTML parser. It is a
//! browsing aid, not a dependency graph; [`tags`] isolates the heuristic so a
//! real tokenizer can replace it.
//!
//! ## NN-Prefix Ordering
//!
//! Files and directories may carry a leading `01-`, `2.`, etc. to order them.
//! The prefix is stripped from names and ids but kept in sort keys, so numbered
//! files sort by number even without an `order` front-matter field.

pub mod assemble;
pub mod config;
pub mod context;
pub mod frontmatter;
pub mod helix;
pub mod hooks;
pub mod markdown;
pub mod materials;
pub mod naming;
pub mod output;
pub mod render;
pub mod rewrite;
pub mod sources;
pub mod tags;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
