//! The assembly pipeline.
//!
//! ```text
//! setup()     layouts → includes → data → materials → views → docs
//! assemble()  setup() → registry → per view: wrap, render, hooks, write
//! ```
//!
//! Each call to [`Assembler::setup`] builds a fresh [`AssemblyContext`]; two
//! runs never share state. Any error aborts the run before anything is written
//! for the failing stage.

use crate::config::{self, AssembleConfig, ConfigError, ProjectPaths};
use crate::context::AssemblyContext;
use crate::hooks::{AssemblyHooks, HookChain};
use crate::materials::{self, MaterialOptions, MaterialsError};
use crate::render::{self, RenderError, Renderer};
use crate::sources::{self, SourceError};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sources(#[from] SourceError),
    #[error(transparent)]
    Materials(#[from] MaterialsError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// One page written by [`Assembler::assemble`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenPage {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Result of a full build.
#[derive(Debug)]
pub struct BuildReport {
    pub context: AssemblyContext,
    pub pages: Vec<WrittenPage>,
}

/// A project root plus its resolved configuration and registered hooks.
#[derive(Debug)]
pub struct Assembler {
    root: PathBuf,
    config: AssembleConfig,
    paths: ProjectPaths,
    hooks: HookChain,
}

impl Assembler {
    /// Load `stylebook.toml` from `root` (if any) over the stock defaults.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AssembleError> {
        let root = root.into();
        let config = config::load_config(&root)?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: impl Into<PathBuf>, config: AssembleConfig) -> Self {
        let root = root.into();
        let paths = config.resolve(&root);
        Self {
            root,
            config,
            paths,
            hooks: HookChain::default(),
        }
    }

    pub fn with_hook(mut self, hook: impl AssemblyHooks + 'static) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Override the output directory. Relative paths resolve against the
    /// current directory, as CLI paths do.
    pub fn set_dest(&mut self, dest: impl Into<PathBuf>) {
        self.paths.dest = dest.into();
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AssembleConfig {
        &self.config
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Parse every source into a fresh context. Nothing is written.
    pub fn setup(&self) -> Result<AssemblyContext, AssembleError> {
        let paths = &self.paths;
        let mut ctx = AssemblyContext {
            layouts: sources::parse_layouts(&paths.layouts)?,
            layout_includes: sources::parse_layout_includes(&paths.layout_includes)?,
            data: sources::parse_data(&paths.data)?,
            ..AssemblyContext::default()
        };

        let options = MaterialOptions {
            roots: paths.materials.clone(),
            duplicate_ids: self.config.materials.duplicate_ids,
        };
        materials::parse_materials(&mut ctx, &options, &self.hooks)?;

        let excluded = [paths.layouts.clone(), paths.layout_includes.clone()];
        let views = sources::discover_views(&paths.views, &excluded)?;
        sources::parse_views(&mut ctx, &paths.views, &views)?;

        ctx.docs = sources::parse_docs(&paths.docs)?;

        tracing::debug!(
            layouts = ctx.layouts.len(),
            materials = ctx.partials.len(),
            views = ctx.view_sources.len(),
            docs = ctx.docs.len(),
            "setup complete"
        );
        Ok(ctx)
    }

    /// Run [`setup`](Self::setup), then render and write every view.
    pub fn assemble(&self) -> Result<BuildReport, AssembleError> {
        let ctx = self.setup()?;
        let renderer = Renderer::new(&ctx, &self.config.keys)?;

        let mut pages = Vec::with_capacity(ctx.view_sources.len());
        for view in &ctx.view_sources {
            let html = renderer.render_view(&ctx, view, &self.config.layout)?;
            let html = self.hooks.on_view(&ctx, &view.path, html);
            let output = render::output_path(&self.paths.dest, view)?;
            render::write_page(&output, &html)?;
            tracing::info!(view = %view.id, output = %output.display(), "wrote page");
            pages.push(WrittenPage {
                source: view.path.clone(),
                output,
            });
        }

        Ok(BuildReport {
            context: ctx,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn setup_reads_the_default_directory_layout() {
        let tmp = project(&[
            ("src/views/layouts/default.html", "<html>{% body %}</html>"),
            ("src/views/layouts/includes/nav.html", "<nav></nav>"),
            ("src/views/index.html", "hi"),
            ("src/materials/atoms/text.html", "<p></p>"),
            ("src/data/site.yml", "name: Demo"),
            ("src/docs/intro.md", "Intro"),
        ]);
        let ctx = Assembler::new(tmp.path()).unwrap().setup().unwrap();

        assert!(ctx.layouts.contains_key("default"));
        assert!(ctx.layout_includes.contains_key("nav"));
        assert_eq!(ctx.view_sources.len(), 1);
        assert!(ctx.partials.contains_key("atoms.text"));
        assert!(ctx.data.contains_key("site"));
        assert!(ctx.docs.get("intro").is_some());
    }

    #[test]
    fn each_setup_starts_fresh() {
        let tmp = project(&[("src/materials/atoms/text.html", "<p></p>")]);
        let assembler = Assembler::new(tmp.path()).unwrap();
        let first = assembler.setup().unwrap();

        std::fs::remove_file(tmp.path().join("src/materials/atoms/text.html")).unwrap();
        let second = assembler.setup().unwrap();

        assert_eq!(first.partials.len(), 1);
        assert!(second.partials.is_empty());
        assert!(second.materials.is_empty());
    }

    #[test]
    fn config_changes_material_roots() {
        let tmp = project(&[
            ("stylebook.toml", "[sources]\nmaterials = [\"patterns\"]\n"),
            ("patterns/atoms/dot.html", "•"),
            ("src/materials/atoms/ignored.html", "x"),
        ]);
        let ctx = Assembler::new(tmp.path()).unwrap().setup().unwrap();
        assert_eq!(ctx.partials.keys().collect::<Vec<_>>(), vec!["atoms.dot"]);
    }

    #[test]
    fn invalid_config_is_reported() {
        let tmp = project(&[("stylebook.toml", "unknown_key = 1\n")]);
        let err = Assembler::new(tmp.path()).unwrap_err();
        assert!(matches!(err, AssembleError::Config(_)));
    }

    #[test]
    fn missing_layout_aborts_assembly() {
        let tmp = project(&[("src/views/index.html", "hi")]);
        let mut assembler = Assembler::new(tmp.path()).unwrap();
        assembler.set_dest(tmp.path().join("out"));
        let err = assembler.assemble().unwrap_err();
        assert!(matches!(
            err,
            AssembleError::Render(RenderError::LayoutNotFound { .. })
        ));
        assert!(!tmp.path().join("out/index.html").exists());
    }
}
