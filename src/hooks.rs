//! Extension points in the assembly pipeline.
//!
//! A hook implements any subset of [`AssemblyHooks`]; every method defaults to
//! the identity transform. Hooks run in registration order, each receiving the
//! previous hook's output.
//!
//! ```rust
//! use stylebook::hooks::AssemblyHooks;
//! use stylebook::context::AssemblyContext;
//! use stylebook::materials::Fragment;
//!
//! struct Banner;
//!
//! impl AssemblyHooks for Banner {
//!     fn on_material(&self, _ctx: &AssemblyContext, fragment: &Fragment, content: String) -> String {
//!         format!("<!-- {} -->\n{}", fragment.id, content)
//!     }
//! }
//! ```

use crate::context::AssemblyContext;
use crate::materials::Fragment;
use std::path::{Path, PathBuf};

/// Per-stage callbacks. All methods default to doing nothing.
pub trait AssemblyHooks {
    /// Adjust the list of material files before classification.
    fn before_materials(&self, _ctx: &AssemblyContext, files: Vec<PathBuf>) -> Vec<PathBuf> {
        files
    }

    /// Transform a material's namespaced content before it is registered.
    fn on_material(&self, _ctx: &AssemblyContext, _fragment: &Fragment, content: String) -> String {
        content
    }

    /// Inspect or adjust the context once materials are sorted and filtered.
    fn after_materials(&self, _ctx: &mut AssemblyContext) {}

    /// Transform a rendered view before it is written.
    fn on_view(&self, _ctx: &AssemblyContext, _view: &Path, html: String) -> String {
        html
    }
}

/// Registered hooks, applied in order.
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn AssemblyHooks>>,
}

impl HookChain {
    pub fn push(&mut self, hook: impl AssemblyHooks + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn before_materials(&self, ctx: &AssemblyContext, files: Vec<PathBuf>) -> Vec<PathBuf> {
        self.hooks
            .iter()
            .fold(files, |files, hook| hook.before_materials(ctx, files))
    }

    pub fn on_material(&self, ctx: &AssemblyContext, fragment: &Fragment, content: String) -> String {
        self.hooks
            .iter()
            .fold(content, |content, hook| hook.on_material(ctx, fragment, content))
    }

    pub fn after_materials(&self, ctx: &mut AssemblyContext) {
        for hook in &self.hooks {
            hook.after_materials(ctx);
        }
    }

    pub fn on_view(&self, ctx: &AssemblyContext, view: &Path, html: String) -> String {
        self.hooks
            .iter()
            .fold(html, |html, hook| hook.on_view(ctx, view, html))
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
