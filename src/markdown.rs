//! Markdown rendering for material notes and docs.

use pulldown_cmark::{Options, Parser, html as md_html};

/// Render Markdown to an HTML string. Tables and strikethrough are enabled.
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(source, options);
    let mut html = String::with_capacity(source.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}
