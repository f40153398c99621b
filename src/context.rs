//! Per-run assembly state and template-context merging.
//!
//! An [`AssemblyContext`] is built from scratch by every
//! [`Assembler::setup`](crate::assemble::Assembler::setup) call and threaded
//! through each stage by reference. Nothing is shared between runs.

use crate::config::KeysConfig;
use crate::materials::{Fragment, MaterialTree};
use crate::sources::{Doc, ViewSource, ViewTree};
use crate::tree::Items;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Everything parsed from a project during one run.
#[derive(Debug, Default)]
pub struct AssemblyContext {
    /// Layout name → template with a `{% body %}` marker.
    pub layouts: BTreeMap<String, String>,
    /// Include name → partial template available to layouts.
    pub layout_includes: BTreeMap<String, String>,
    /// Browsable collection tree of materials.
    pub materials: MaterialTree,
    /// Material namespace (`collection-name`) → the material's own data.
    pub material_data: Map<String, Value>,
    /// Material id → namespaced partial template.
    pub partials: BTreeMap<String, String>,
    /// Every material, in discovery order.
    pub fragments: Vec<Fragment>,
    /// View collection tree.
    pub views: ViewTree,
    /// Every view file with its front matter, in discovery order.
    pub view_sources: Vec<ViewSource>,
    /// Doc name → rendered Markdown.
    pub docs: Items<Doc>,
    /// Data file name → parsed value.
    pub data: Map<String, Value>,
}

impl AssemblyContext {
    /// The layers every render shares: global data, material data, and the
    /// three trees under their configured keys.
    pub fn shared_layers(&self, keys: &KeysConfig) -> Result<Map<String, Value>, serde_json::Error> {
        let mut layers = Map::new();
        layers.extend(self.data.clone());
        layers.extend(self.material_data.clone());
        layers.insert(keys.materials.clone(), serde_json::to_value(&self.materials)?);
        layers.insert(keys.views.clone(), serde_json::to_value(&self.views)?);
        layers.insert(keys.docs.clone(), serde_json::to_value(&self.docs)?);
        Ok(layers)
    }
}

/// Merge a render context: `data`, then `shared`, then `hash`. Later layers
/// win on key clashes.
pub fn build_context(
    shared: &Map<String, Value>,
    data: &Map<String, Value>,
    hash: &Map<String, Value>,
) -> Value {
    let mut context = data.clone();
    context.extend(shared.iter().map(|(k, v)| (k.clone(), v.clone())));
    context.extend(hash.iter().map(|(k, v)| (k.clone(), v.clone())));
    Value::Object(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn later_layers_win() {
        let shared = map(json!({"title": "shared", "site": "S"}));
        let data = map(json!({"title": "page", "own": 1}));
        let hash = map(json!({"site": "hash"}));

        let context = build_context(&shared, &data, &hash);
        assert_eq!(context, json!({"title": "shared", "own": 1, "site": "hash"}));
    }

    #[test]
    fn shared_layers_carry_trees_under_keys() {
        let mut ctx = AssemblyContext::default();
        ctx.data.insert("site".into(), json!({"name": "Demo"}));
        ctx.material_data.insert("structures-page".into(), json!({"title": "Home"}));

        let mut keys = KeysConfig::default();
        keys.materials = "patterns".into();
        let layers = ctx.shared_layers(&keys).unwrap();

        assert_eq!(layers["site"], json!({"name": "Demo"}));
        assert_eq!(layers["structures-page"], json!({"title": "Home"}));
        assert_eq!(layers["patterns"], json!({}));
        assert_eq!(layers["views"], json!({}));
        assert_eq!(layers["docs"], json!({}));
    }
}
