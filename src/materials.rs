//! Material discovery, classification, and partial registration.
//!
//! Materials are the reusable fragments of a style guide. Their place in the
//! browsable tree comes entirely from the directory layout under each
//! material root:
//!
//! ```text
//! src/materials/                   # Material root
//! ├── structures/                  # Collection
//! │   ├── 01-page.html             # → structures.page
//! │   └── 02-footer.html           # → structures.footer
//! └── components/                  # Collection
//!     ├── 01-button.html           # → components.button
//!     ├── __base.html              # → components.__base (partial only)
//!     └── forms/                   # Sub-collection of components
//!         └── input.html           # → forms.input
//! ```
//!
//! ## Collection Rule
//!
//! A directory directly below a material root is a *collection root*. A file
//! whose grandparent directory is a collection root belongs to a
//! sub-collection named after its parent; any other file belongs to the
//! top-level collection named after its parent. Only two levels exist:
//! `components/forms/inputs/text.html` lands in a top-level `inputs`
//! collection.
//!
//! ## Pipeline
//!
//! [`parse_materials`] runs in strict phases:
//!
//! 1. **Read**: every file's front matter and body. Any failure aborts the run
//!    before a tree exists.
//! 2. **Stub**: create every collection and sub-collection node, so the tree
//!    shape never depends on file order.
//! 3. **Populate**: per material, attach the cross-reference annotation,
//!    place its entry, record its data under its namespace, rewrite its
//!    placeholders, and register the partial.
//! 4. **Filter**: drop `__`-prefixed materials from the tree (their partials
//!    stay registered).
//! 5. **Sort**: collections, then each collection's items, then each
//!    sub-collection's items, by [`crate::tree::compare_items`].
//!
//! ## Identifiers
//!
//! A material's id is `<collection>.<name>`, where `<collection>` is its
//! parent directory and `<name>` its file name, both with ordering prefixes
//! stripped. The id names the partial; the id with dots turned into hyphens
//! namespaces its data (`structures-page`). The key keeps the file's ordering
//! prefix (`structures.01-page`).

use crate::config::DuplicateIds;
use crate::context::AssemblyContext;
use crate::frontmatter::{self, Matter, MatterError};
use crate::helix::{self, ScanSource};
use crate::hooks::HookChain;
use crate::markdown::render_markdown;
use crate::naming::{derive_name, derive_serial, namespace_for, normalize_segment, to_title_case};
use crate::rewrite::rewrite;
use crate::tree::{Collection, Items, Sortable, order_of};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Front-matter field holding Markdown notes for the tree entry.
pub const NOTES_FIELD: &str = "notes";

/// Materials whose id or name starts with this are registered but not listed.
pub const HIDDEN_PREFIX: &str = "__";

#[derive(Error, Debug)]
pub enum MaterialsError {
    #[error("IO error walking {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Matter(#[from] MatterError),
    #[error("duplicate material id {id}: {first} and {second}")]
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// One material file, fully classified.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub path: PathBuf,
    /// Front matter, including the `helix` annotation when one was found.
    pub front_matter: Map<String, Value>,
    /// Body with leading and trailing blank lines removed, before rewriting.
    pub body: String,
    /// Parent directory name, ordering prefix stripped.
    pub collection: String,
    /// Grandparent directory name when it is a collection root.
    pub parent_collection: Option<String>,
    pub is_sub_collection: bool,
    pub id: String,
    pub key: String,
    pub serial: String,
}

impl Fragment {
    pub fn namespace(&self) -> String {
        namespace_for(&self.id)
    }

    /// Front matter without the reserved `notes` field.
    pub fn local_data(&self) -> Map<String, Value> {
        let mut data = self.front_matter.clone();
        data.remove(NOTES_FIELD);
        data
    }

    pub fn is_hidden(&self) -> bool {
        self.id.starts_with(HIDDEN_PREFIX)
            || self.id.rsplit('.').next().is_some_and(|name| name.starts_with(HIDDEN_PREFIX))
    }
}

/// A material as listed in the collection tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialEntry {
    pub name: String,
    pub serial: String,
    pub notes: String,
    pub data: Map<String, Value>,
    #[serde(skip)]
    pub sort_key: String,
    #[serde(skip)]
    pub hidden: bool,
}

impl Sortable for MaterialEntry {
    fn order(&self) -> Option<&Value> {
        order_of(&self.data)
    }

    fn sort_key(&self) -> &str {
        &self.sort_key
    }
}

/// An item of a top-level collection: a material or a sub-collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MaterialItem {
    Entry(MaterialEntry),
    Group(Collection<MaterialEntry>),
}

impl Sortable for MaterialItem {
    fn order(&self) -> Option<&Value> {
        match self {
            MaterialItem::Entry(entry) => entry.order(),
            MaterialItem::Group(group) => group.order(),
        }
    }

    fn sort_key(&self) -> &str {
        match self {
            MaterialItem::Entry(entry) => entry.sort_key(),
            MaterialItem::Group(group) => group.sort_key(),
        }
    }
}

/// The browsable materials tree: collection key → collection.
pub type MaterialTree = Items<Collection<MaterialItem>>;

/// Where a file sits in the tree, computed from its path alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Parent directory name, ordering prefix stripped.
    pub collection: String,
    /// Parent directory name as on disk.
    pub collection_dir: String,
    /// `(stripped, on-disk)` grandparent name when it is a collection root.
    pub parent: Option<(String, String)>,
}

impl Placement {
    pub fn is_sub_collection(&self) -> bool {
        self.parent.is_some()
    }
}

/// Options for one materials pass.
#[derive(Debug, Clone)]
pub struct MaterialOptions {
    pub roots: Vec<PathBuf>,
    pub duplicate_ids: DuplicateIds,
}

/// Every non-hidden file below the material roots, sorted by path.
///
/// Missing roots contribute nothing.
pub fn discover_materials(roots: &[PathBuf]) -> Result<Vec<PathBuf>, MaterialsError> {
    let mut files = Vec::new();
    for root in roots.iter().filter(|r| r.is_dir()) {
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden_name(e.file_name()));
        for entry in walker {
            let entry = entry.map_err(|source| MaterialsError::Walk {
                path: root.clone(),
                source,
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Directories exactly one level below any material root.
pub fn collection_roots(roots: &[PathBuf]) -> Result<HashSet<PathBuf>, MaterialsError> {
    let mut dirs = HashSet::new();
    for root in roots.iter().filter(|r| r.is_dir()) {
        let entries = fs::read_dir(root).map_err(|source| MaterialsError::Io {
            path: root.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| MaterialsError::Io {
                path: root.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() && !is_hidden_name(entry.file_name().as_os_str()) {
                dirs.insert(path);
            }
        }
    }
    Ok(dirs)
}

/// Classify `file` against the known collection roots.
pub fn classify(file: &Path, collection_roots: &HashSet<PathBuf>) -> Placement {
    let parent_dir = file.parent().unwrap_or(Path::new(""));
    let collection_dir = dir_name(parent_dir);
    let collection = normalize_segment(&collection_dir, false);

    let parent = parent_dir
        .parent()
        .filter(|grandparent| collection_roots.contains(*grandparent))
        .map(|grandparent| {
            let raw = dir_name(grandparent);
            (normalize_segment(&raw, false), raw)
        });

    Placement {
        collection,
        collection_dir,
        parent,
    }
}

/// Create every collection and sub-collection node the placements need.
pub fn stub_tree(placements: &[Placement]) -> MaterialTree {
    let mut tree = MaterialTree::default();
    for placement in placements {
        match &placement.parent {
            Some((parent, parent_dir)) => {
                let top = tree.entry_or_insert_with(parent, || {
                    Collection::new(to_title_case(parent), parent_dir.clone())
                });
                if !matches!(top.items.get(&placement.collection), Some(MaterialItem::Group(_))) {
                    top.items.insert(
                        placement.collection.clone(),
                        MaterialItem::Group(Collection::new(
                            to_title_case(&placement.collection),
                            placement.collection_dir.clone(),
                        )),
                    );
                }
            }
            None => {
                tree.entry_or_insert_with(&placement.collection, || {
                    Collection::new(
                        to_title_case(&placement.collection),
                        placement.collection_dir.clone(),
                    )
                });
            }
        }
    }
    tree
}

/// Run the full materials pass, filling `ctx.materials`, `ctx.material_data`,
/// `ctx.partials`, and `ctx.fragments`.
pub fn parse_materials(
    ctx: &mut AssemblyContext,
    options: &MaterialOptions,
    hooks: &HookChain,
) -> Result<(), MaterialsError> {
    let files = discover_materials(&options.roots)?;
    let files = hooks.before_materials(ctx, files);
    let known_roots = collection_roots(&options.roots)?;

    // Phase 1: read everything before touching the context.
    let matters = files
        .iter()
        .map(|file| frontmatter::read_matter(file))
        .collect::<Result<Vec<Matter>, _>>()?;
    let sources: Vec<ScanSource> = files
        .iter()
        .zip(&matters)
        .map(|(file, matter)| ScanSource::new(file.clone(), &matter.content, &matter.data))
        .collect();

    // Phase 2: stubs for every observed directory combination.
    let placements: Vec<Placement> = files.iter().map(|f| classify(f, &known_roots)).collect();
    ctx.materials = stub_tree(&placements);
    ctx.material_data = Map::new();
    ctx.partials.clear();
    ctx.fragments.clear();

    // Phase 3: populate.
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for (index, (file, matter)) in files.iter().zip(matters).enumerate() {
        let placement = &placements[index];
        let front_matter = helix::annotate(&sources[index], &sources, matter.data);
        let fragment = build_fragment(file, placement, front_matter, &matter.content);

        if let Some(first) = seen.insert(fragment.id.clone(), file.clone()) {
            match options.duplicate_ids {
                DuplicateIds::Error => {
                    return Err(MaterialsError::DuplicateId {
                        id: fragment.id,
                        first,
                        second: file.clone(),
                    });
                }
                DuplicateIds::Warn => tracing::warn!(
                    id = %fragment.id,
                    first = %first.display(),
                    second = %file.display(),
                    "duplicate material id; the later material replaces the earlier one"
                ),
            }
        }

        place_entry(&mut ctx.materials, placement, &fragment);

        let local_data = fragment.local_data();
        let namespace = fragment.namespace();
        let content = rewrite(&fragment.body, &local_data, &namespace);
        let content = hooks.on_material(ctx, &fragment, content);

        ctx.material_data.insert(namespace, Value::Object(local_data));
        ctx.partials.insert(fragment.id.clone(), content);
        tracing::debug!(id = %fragment.id, path = %file.display(), "registered material");
        ctx.fragments.push(fragment);
    }

    // Phase 4 and 5.
    filter_hidden(&mut ctx.materials);
    sort_tree(&mut ctx.materials);
    hooks.after_materials(ctx);
    Ok(())
}

fn build_fragment(
    file: &Path,
    placement: &Placement,
    front_matter: Map<String, Value>,
    content: &str,
) -> Fragment {
    let name = derive_name(file, false);
    let raw_name = derive_name(file, true);
    let id = format!("{}.{}", placement.collection, name);

    Fragment {
        path: file.to_path_buf(),
        front_matter,
        body: frontmatter::trim_blank_lines(content).to_string(),
        collection: placement.collection.clone(),
        parent_collection: placement.parent.as_ref().map(|(name, _)| name.clone()),
        is_sub_collection: placement.is_sub_collection(),
        key: format!("{}.{}", placement.collection, raw_name),
        serial: derive_serial(&id),
        id,
    }
}

/// Build the tree entry for a fragment.
pub fn material_entry(fragment: &Fragment) -> MaterialEntry {
    let leaf = fragment.id.rsplit('.').next().unwrap_or(&fragment.id);
    let notes = fragment
        .front_matter
        .get(NOTES_FIELD)
        .and_then(Value::as_str)
        .map(render_markdown)
        .unwrap_or_default();

    MaterialEntry {
        name: to_title_case(leaf),
        serial: fragment.serial.clone(),
        notes,
        data: fragment.local_data(),
        sort_key: derive_name(&fragment.path, true),
        hidden: fragment.is_hidden(),
    }
}

fn place_entry(tree: &mut MaterialTree, placement: &Placement, fragment: &Fragment) {
    let leaf = fragment.id.rsplit('.').next().unwrap_or(&fragment.id).to_string();
    let entry = material_entry(fragment);

    match &placement.parent {
        Some((parent, _)) => {
            let group = tree
                .get_mut(parent)
                .and_then(|top| top.items.get_mut(&placement.collection));
            if let Some(MaterialItem::Group(group)) = group {
                group.items.insert(leaf, entry);
            }
        }
        None => {
            let Some(top) = tree.get_mut(&placement.collection) else {
                return;
            };
            if let Some(MaterialItem::Group(_)) = top.items.get(&leaf) {
                tracing::warn!(
                    path = %fragment.path.display(),
                    "material shares its name with a sub-collection; left out of the tree"
                );
                return;
            }
            top.items.insert(leaf, MaterialItem::Entry(entry));
        }
    }
}

/// Drop hidden materials, then any node emptied by that.
pub fn filter_hidden(tree: &mut MaterialTree) {
    for collection in tree.values_mut() {
        for item in collection.items.values_mut() {
            if let MaterialItem::Group(group) = item {
                group.items.retain(|_, entry| !entry.hidden);
            }
        }
        collection.items.retain(|_, item| match item {
            MaterialItem::Entry(entry) => !entry.hidden,
            MaterialItem::Group(group) => !group.items.is_empty(),
        });
    }
    tree.retain(|_, collection| !collection.items.is_empty());
}

/// Sort collections, then their items, then each sub-collection's items.
pub fn sort_tree(tree: &mut MaterialTree) {
    tree.sort();
    for collection in tree.values_mut() {
        collection.items.sort();
    }
    for collection in tree.values_mut() {
        for item in collection.items.values_mut() {
            if let MaterialItem::Group(group) = item {
                group.items.sort();
            }
        }
    }
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_hidden_name(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
