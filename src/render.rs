//! Handlebars rendering: partials, the material helper, and page output.
//!
//! A [`Renderer`] is built once per run from a parsed [`AssemblyContext`]:
//!
//! - every layout include is registered as a partial under its name;
//! - every material is registered as a partial under its id;
//! - the material helper (`material` unless `keys.materials` is renamed) is
//!   registered with a copy of the shared context layers.
//!
//! ## Material Helper
//!
//! ```text
//! {{material "components.01-button" this label="Go"}}
//! ```
//!
//! The first parameter names a material; ordering prefixes are stripped from
//! each dot-separated segment, so the on-disk key works as well as the id. The
//! optional second parameter supplies page data. The partial is rendered with
//! [`build_context`] over that data, the shared layers, and the hash arguments,
//! and written unescaped with leading whitespace removed.
//!
//! ## Sections
//!
//! Materials may use mustache-style sections over their own fields:
//!
//! ```text
//! <ul>{{#items}}<li>{{this}}</li>{{/items}}</ul>
//! ```
//!
//! Handlebars has no such form, so before a template is registered or
//! rendered every parameterless `{{#path}}…{{/path}}` block is rewritten to
//! `{{#section path}}…{{/section}}`. The `section` helper repeats its body for
//! each element of an array, renders it once for any other truthy value with
//! that value as context, and renders the `{{else}}` branch (if any) otherwise.
//! Inside an array section `@index`, `@first` and `@last` are set.
//!
//! ## Pages
//!
//! A view's body replaces the first `{% body %}` marker in its layout, and the
//! combined template is rendered once with the view's front matter as page
//! data. Output goes to `dest/<collection>/<view>.html`; a front-matter `dest`
//! must stay inside the output directory.

use crate::config::KeysConfig;
use crate::context::{AssemblyContext, build_context};
use crate::naming::strip_ordering;
use crate::sources::ViewSource;
use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext,
    RenderErrorReason, Renderable,
};
use regex::{Captures, NoExpand, Regex};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Front-matter field selecting a layout.
pub const LAYOUT_FIELD: &str = "layout";
/// Front-matter field overriding a view's output path.
pub const DEST_FIELD: &str = "dest";

/// Name of the block helper mustache-style sections are rewritten to.
pub const SECTION_HELPER: &str = "section";

/// Built-in block helpers that are never treated as sections.
const BLOCK_HELPERS: [&str; 5] = ["if", "unless", "each", "with", SECTION_HELPER];

static BODY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%\s?body\s?%\}").expect("body marker pattern is valid"));

static SECTION_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{#\s*([^\s{}#/>!*^~]+)\s*\}\}").expect("section open pattern is valid")
});

static SECTION_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{/\s*([^\s{}~]+)\s*\}\}").expect("section close pattern is valid")
});

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] handlebars::TemplateError),
    #[error("failed to render {view}: {source}")]
    Render {
        view: PathBuf,
        source: handlebars::RenderError,
    },
    #[error("layout '{layout}' not found for {view}")]
    LayoutNotFound { layout: String, view: PathBuf },
    #[error("dest '{dest}' of {view} leaves the output directory")]
    DestOutside { dest: String, view: PathBuf },
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to build template context: {0}")]
    Context(#[from] serde_json::Error),
}

/// A configured Handlebars registry plus the shared context layers.
pub struct Renderer {
    registry: Handlebars<'static>,
    shared: Arc<Map<String, Value>>,
    helper_name: String,
}

impl Renderer {
    pub fn new(ctx: &AssemblyContext, keys: &KeysConfig) -> Result<Self, RenderError> {
        let shared = Arc::new(ctx.shared_layers(keys)?);
        let helper_name = keys.helper_name().to_string();
        let mut registry = Handlebars::new();

        for (name, template) in &ctx.layout_includes {
            registry.register_partial(name, expand_sections(template, &helper_name))?;
        }
        for (id, template) in &ctx.partials {
            registry.register_partial(id, expand_sections(template, &helper_name))?;
        }
        registry.register_helper(SECTION_HELPER, Box::new(SectionHelper));
        registry.register_helper(
            keys.helper_name(),
            Box::new(MaterialHelper {
                shared: Arc::clone(&shared),
            }),
        );

        tracing::debug!(
            partials = ctx.partials.len(),
            includes = ctx.layout_includes.len(),
            helper = keys.helper_name(),
            "template registry ready"
        );
        Ok(Self {
            registry,
            shared,
            helper_name,
        })
    }

    /// Render an arbitrary template string over `data` and the shared layers.
    pub fn render_str(
        &self,
        template: &str,
        data: &Map<String, Value>,
    ) -> Result<String, handlebars::RenderError> {
        let context = build_context(&self.shared, data, &Map::new());
        let template = expand_sections(template, &self.helper_name);
        self.registry.render_template(&template, &context)
    }

    /// Wrap a view in its layout and render it.
    pub fn render_view(
        &self,
        ctx: &AssemblyContext,
        view: &ViewSource,
        default_layout: &str,
    ) -> Result<String, RenderError> {
        let layout_name = view
            .matter
            .data
            .get(LAYOUT_FIELD)
            .and_then(Value::as_str)
            .unwrap_or(default_layout);
        let layout = ctx
            .layouts
            .get(layout_name)
            .ok_or_else(|| RenderError::LayoutNotFound {
                layout: layout_name.to_string(),
                view: view.path.clone(),
            })?;

        let page = wrap_page(layout, &view.matter.content);
        self.render_str(&page, &view.matter.data)
            .map_err(|source| RenderError::Render {
                view: view.path.clone(),
                source,
            })
    }
}

/// The `{{material "id" [data] key=value}}` helper.
struct MaterialHelper {
    shared: Arc<Map<String, Value>>,
}

impl HelperDef for MaterialHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let requested = h
            .param(0)
            .and_then(|p| p.value().as_str())
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("material", 0))?;
        let name = material_key(requested);
        if !r.has_template(&name) {
            return Err(RenderErrorReason::Other(format!("material '{requested}' not found")).into());
        }

        let data = h
            .param(1)
            .and_then(|p| p.value().as_object().cloned())
            .unwrap_or_default();
        let hash: Map<String, Value> = h
            .hash()
            .iter()
            .map(|(k, v)| (k.to_string(), v.value().clone()))
            .collect();

        let context = build_context(&self.shared, &data, &hash);
        let rendered = r.render(&name, &context)?;
        out.write(rendered.trim_start())?;
        Ok(())
    }
}

/// `{{#section path}}…{{/section}}`: mustache section semantics over `path`.
struct SectionHelper;

impl HelperDef for SectionHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex(SECTION_HELPER, 0))?
            .value();
        let scopes: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other if is_truthy(other) => vec![other],
            _ => Vec::new(),
        };

        if scopes.is_empty() {
            if let Some(inverse) = h.inverse() {
                inverse.render(r, ctx, rc, out)?;
            }
            return Ok(());
        }
        let Some(template) = h.template() else {
            return Ok(());
        };

        let last = scopes.len() - 1;
        for (index, scope) in scopes.into_iter().enumerate() {
            let mut block = BlockContext::new();
            block.set_base_value(scope.clone());
            if value.is_array() {
                block.set_local_var("index", Value::from(index));
                block.set_local_var("first", Value::Bool(index == 0));
                block.set_local_var("last", Value::Bool(index == last));
            }
            rc.push_block(block);
            let rendered = template.render(r, ctx, rc, out);
            rc.pop_block();
            rendered?;
        }
        Ok(())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Rewrite parameterless `{{#path}}…{{/path}}` blocks to the section helper.
///
/// Built-in block helpers and `helper_name` are left alone, as are closing
/// tags whose path was never opened as a section.
pub fn expand_sections(template: &str, helper_name: &str) -> String {
    let is_section = |path: &str| path != helper_name && !BLOCK_HELPERS.contains(&path);
    let mut opened = HashSet::new();

    let template = SECTION_OPEN.replace_all(template, |caps: &Captures| {
        let path = &caps[1];
        if is_section(path) {
            opened.insert(path.to_string());
            format!("{{{{#{SECTION_HELPER} {path}}}}}")
        } else {
            caps[0].to_string()
        }
    });
    if opened.is_empty() {
        return template.into_owned();
    }

    SECTION_CLOSE
        .replace_all(&template, |caps: &Captures| {
            if opened.contains(&caps[1]) {
                format!("{{{{/{SECTION_HELPER}}}}}")
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Strip ordering prefixes from each dot-separated segment of a material name.
pub fn material_key(name: &str) -> String {
    name.split('.')
        .map(strip_ordering)
        .collect::<Vec<_>>()
        .join(".")
}

/// Replace the first `{% body %}` marker in `layout` with `body`, verbatim.
pub fn wrap_page(layout: &str, body: &str) -> String {
    if !BODY_MARKER.is_match(layout) {
        tracing::warn!("layout has no {{% body %}} marker; view body dropped");
    }
    BODY_MARKER.replace(layout, NoExpand(body)).into_owned()
}

/// Where a view is written below `dest`.
///
/// A string `dest` in front matter is taken relative to `dest` and may not be
/// absolute or climb out with `..`; either way the extension is `.html`.
pub fn output_path(dest: &Path, view: &ViewSource) -> Result<PathBuf, RenderError> {
    if let Some(custom) = view.matter.data.get(DEST_FIELD).and_then(Value::as_str) {
        let relative = Path::new(custom);
        if !relative.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
            return Err(RenderError::DestOutside {
                dest: custom.to_string(),
                view: view.path.clone(),
            });
        }
        return Ok(dest.join(relative).with_extension("html"));
    }
    let file = format!("{}.html", view.id);
    Ok(match &view.collection {
        Some(collection) => dest.join(collection).join(file),
        None => dest.join(file),
    })
}

/// Write `html` to `path`, creating parent directories.
pub fn write_page(path: &Path, html: &str) -> Result<(), RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, html).map_err(io_err)
}
