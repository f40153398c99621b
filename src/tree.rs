//! Ordered two-level collection trees.
//!
//! Both the materials tree and the views tree are built from the directory
//! layout and handed to templates as nested objects:
//!
//! ```text
//! components                 ← top-level collection  {name, items}
//! ├── button                 ← entry
//! └── forms                  ← sub-collection        {name, items}
//!     ├── input              ← entry
//!     └── select             ← entry
//! ```
//!
//! Nesting stops there: a collection's items are entries or sub-collections,
//! and a sub-collection's items are entries only.
//!
//! Items are kept in a `Vec` of `(key, value)` pairs and serialized as a map
//! so templates iterate them in the sorted order.
//!
//! ## Sort Rule
//!
//! Siblings are sorted by [`compare_items`]: items whose data carries an
//! explicit `order` come first, ascending by that value (numbers before
//! strings); the rest follow, ordered by their sort key. The sort key keeps
//! ordering prefixes (`01-page`), so numbered files sort by their number even
//! without an `order` field.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Front-matter field holding an explicit sort position.
pub const ORDER_FIELD: &str = "order";

/// Items that take part in sibling sorting.
pub trait Sortable {
    /// The explicit `order` value, if any.
    fn order(&self) -> Option<&Value>;
    /// Fallback key, with ordering prefixes kept.
    fn sort_key(&self) -> &str;
}

/// Ordered `(key, value)` pairs serialized as a map.
#[derive(Debug, Clone, PartialEq)]
pub struct Items<T>(pub Vec<(String, T)>);

impl<T> Default for Items<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Items<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.0.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace `key`. Returns the replaced value.
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    /// Return the value for `key`, inserting `make()` first if missing.
    pub fn entry_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> T) -> &mut T {
        let index = match self.0.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                self.0.push((key.to_string(), make()));
                self.0.len() - 1
            }
        };
        &mut self.0[index].1
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.0.iter_mut().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &T) -> bool) {
        self.0.retain(|(k, v)| keep(k, v));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Sortable> Items<T> {
    /// Sort this level only. Nested items are not touched.
    pub fn sort(&mut self) {
        self.0.sort_by(|(_, a), (_, b)| compare_items(a, b));
    }
}

impl<T: Serialize> Serialize for Items<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A named group of items: a top-level collection or a sub-collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection<T> {
    pub name: String,
    #[serde(skip)]
    pub sort_key: String,
    pub items: Items<T>,
}

impl<T> Collection<T> {
    pub fn new(name: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sort_key: sort_key.into(),
            items: Items::default(),
        }
    }
}

impl<T> Sortable for Collection<T> {
    fn order(&self) -> Option<&Value> {
        None
    }

    fn sort_key(&self) -> &str {
        &self.sort_key
    }
}

/// Compare two siblings by the sort rule described in the module docs.
pub fn compare_items<T: Sortable>(a: &T, b: &T) -> Ordering {
    compare_order(a.order(), b.order()).then_with(|| a.sort_key().cmp(b.sort_key()))
}

fn compare_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_values(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(_), Value::String(_)) => Ordering::Less,
        (Value::String(_), Value::Number(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// The `order` value in a front-matter map, if it is a number or a string.
pub fn order_of(data: &Map<String, Value>) -> Option<&Value> {
    data.get(ORDER_FIELD)
        .filter(|v| matches!(v, Value::Number(_) | Value::String(_)))
}
