//! Identifier derivation for materials, views, layouts, and collections.
//!
//! Every file and directory in a stylebook project is named by the same
//! convention: an optional ordering prefix (`01-`, `2.`, `003-`) followed by
//! the real name. The prefix exists only to control ordering in a directory
//! listing, so it is stripped from derived names unless a caller explicitly
//! asks to keep it:
//!
//! - `materials/components/01-button.html` → `button`
//! - `materials/02-structures/` → `structures`
//! - `views/01-home.html` (views keep numbers) → `01-home`
//!
//! ## Display Titles
//!
//! [`to_title_case`] turns a derived name into the label shown in the
//! browsable collection tree: `_` and `-` become spaces and every word is
//! capitalised, so `primary-button` → "Primary Button".
//!
//! ## Serials
//!
//! [`derive_serial`] gives each material a stable token (`btr-<hex>`) safe to
//! embed in markup attributes. It is a keyed hash of the material id, so the
//! same id yields the same serial on every run and on every machine.

use hmac::{Hmac, Mac};
use regex::Regex;
use sha2::Sha256;
use std::path::Path;
use std::sync::LazyLock;

type HmacSha256 = Hmac<Sha256>;

/// Fixed key for serial derivation. Changing it changes every serial.
const SERIAL_KEY: &[u8] = b"serial";

/// Prefix carried by every serial.
pub const SERIAL_PREFIX: &str = "btr-";

static ORDERING_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9.\-]+").expect("ordering prefix pattern is valid"));

/// Derive a name from a file or directory path.
///
/// Takes the last path component, drops its extension, and replaces each
/// whitespace character with a hyphen. Unless `preserve_numbers` is set, one
/// leading run of digits, dots, and hyphens is removed:
///
/// - `"src/materials/01-button.html"` → `"button"`
/// - `"01-button.html"` with `preserve_numbers` → `"01-button"`
/// - `"big red button.html"` → `"big-red-button"`
/// - `"h1-title.html"` → `"h1-title"` (only a *leading* run is stripped)
pub fn derive_name(path: impl AsRef<Path>, preserve_numbers: bool) -> String {
    let stem = path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    normalize_segment(&stem, preserve_numbers)
}

/// Normalize a bare name segment (a directory name, say) the way
/// [`derive_name`] normalizes a file stem. No extension is removed.
pub fn normalize_segment(segment: &str, preserve_numbers: bool) -> String {
    let name: String = segment
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    if preserve_numbers {
        name
    } else {
        strip_ordering(&name).to_string()
    }
}

/// Remove one leading run of `[0-9.-]` from a single name segment.
pub fn strip_ordering(name: &str) -> &str {
    match ORDERING_PREFIX.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// Deterministic serial for a material id: `btr-` + hex HMAC-SHA256.
pub fn derive_serial(id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(SERIAL_KEY).expect("HMAC accepts keys of any length");
    mac.update(id.as_bytes());
    format!("{}{:x}", SERIAL_PREFIX, mac.finalize().into_bytes())
}

/// Title-case a derived name for display.
///
/// `_` and `-` become spaces; each word gets an upper-case first letter and a
/// lower-cased remainder.
pub fn to_title_case(name: &str) -> String {
    name.replace(['_', '-'], " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert a dotted material id to its context namespace (`a.b` → `a-b`).
pub fn namespace_for(id: &str) -> String {
    id.replace('.', "-")
}
