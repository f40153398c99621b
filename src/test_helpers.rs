//! Shared test utilities for the stylebook test suite.
//!
//! Provides a fixture writer plus lookup helpers that panic with the available
//! keys on a miss, so a failing assertion says what *was* there.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = project(&[
//!     ("materials/components/button.html", "<button></button>"),
//!     ("materials/components/forms/input.html", "<input>"),
//! ]);
//! // ... run parse_materials over tmp.path().join("materials") ...
//!
//! let components = find_collection(&ctx.materials, "components");
//! assert_eq!(item_keys(components), vec!["button", "forms"]);
//! let forms = find_group(components, "forms");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::materials::{MaterialEntry, MaterialItem, MaterialTree};
use crate::tree::Collection;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `(relative path, contents)` pairs into a fresh temp directory.
pub fn project(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (relative, contents) in files {
        write_file(tmp.path(), relative, contents);
    }
    tmp
}

/// Write one file below `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

// =========================================================================
// Tree lookups, panicking with the available keys on a miss
// =========================================================================

/// Find a top-level collection by key. Panics if not found.
pub fn find_collection<'a>(tree: &'a MaterialTree, key: &str) -> &'a Collection<MaterialItem> {
    tree.get(key).unwrap_or_else(|| {
        let keys = collection_keys(tree);
        panic!("collection '{key}' not found. Available: {keys:?}")
    })
}

/// Find a material entry directly inside a collection. Panics if not found
/// or if the key names a sub-collection.
pub fn find_entry<'a>(collection: &'a Collection<MaterialItem>, key: &str) -> &'a MaterialEntry {
    match collection.items.get(key) {
        Some(MaterialItem::Entry(entry)) => entry,
        Some(MaterialItem::Group(_)) => panic!("'{key}' in '{}' is a sub-collection", collection.name),
        None => {
            let keys = item_keys(collection);
            panic!("entry '{key}' not found in '{}'. Available: {keys:?}", collection.name)
        }
    }
}

/// Find a sub-collection inside a collection. Panics if not found or if the
/// key names an entry.
pub fn find_group<'a>(
    collection: &'a Collection<MaterialItem>,
    key: &str,
) -> &'a Collection<MaterialEntry> {
    match collection.items.get(key) {
        Some(MaterialItem::Group(group)) => group,
        Some(MaterialItem::Entry(_)) => panic!("'{key}' in '{}' is an entry", collection.name),
        None => {
            let keys = item_keys(collection);
            panic!("sub-collection '{key}' not found in '{}'. Available: {keys:?}", collection.name)
        }
    }
}

/// Find an entry inside a sub-collection. Panics if not found.
pub fn find_group_entry<'a>(group: &'a Collection<MaterialEntry>, key: &str) -> &'a MaterialEntry {
    group.items.get(key).unwrap_or_else(|| {
        let keys: Vec<&str> = group.items.keys().collect();
        panic!("entry '{key}' not found in '{}'. Available: {keys:?}", group.name)
    })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Top-level collection keys in tree order.
pub fn collection_keys(tree: &MaterialTree) -> Vec<&str> {
    tree.keys().collect()
}

/// Item keys of a collection in tree order.
pub fn item_keys(collection: &Collection<MaterialItem>) -> Vec<&str> {
    collection.items.keys().collect()
}
