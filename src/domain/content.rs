//! Content trees and dotted-path access.
//!
//! A [`ContentTree`] holds one section's editable data. Trees are persistent:
//! [`ContentTree::set`] never touches the receiver, it copies every map on the
//! way down to the written key and shares everything else through `Arc`. That
//! makes snapshots cheap and keeps older snapshots immune to later edits.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub type ContentMap = BTreeMap<String, ContentValue>;

/// A single node inside a content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(Arc<str>),
    List(Arc<Vec<ContentValue>>),
    Map(Arc<ContentMap>),
}

impl ContentValue {
    pub fn text(value: impl AsRef<str>) -> Self {
        Self::Text(Arc::from(value.as_ref()))
    }

    pub fn empty_text() -> Self {
        Self::text("")
    }

    pub fn empty_list() -> Self {
        Self::List(Arc::new(Vec::new()))
    }

    pub fn list(items: Vec<ContentValue>) -> Self {
        Self::List(Arc::new(items))
    }

    pub fn map(entries: ContentMap) -> Self {
        Self::Map(Arc::new(entries))
    }

    /// Number from a float; non-finite values become `Null`.
    pub fn number(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_ref()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ContentValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ContentMap> {
        match self {
            Self::Map(map) => Some(map.as_ref()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// True for `Null`, whitespace-only text and empty collections.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Render a scalar for a text control. Collections render as empty.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => text.to_string(),
            Self::Number(number) => number.to_string(),
            Self::Bool(flag) => flag.to_string(),
            Self::Null | Self::List(_) | Self::Map(_) => String::new(),
        }
    }

    /// Copy of a map value with `key` replaced. Non-map values start from an empty map.
    pub fn with_entry(&self, key: &str, value: ContentValue) -> ContentValue {
        let mut entries = self.as_map().cloned().unwrap_or_default();
        entries.insert(key.to_string(), value);
        Self::map(entries)
    }

    /// Fully independent copy: no storage is shared with `self`.
    pub fn deep_clone(&self) -> ContentValue {
        match self {
            Self::Null => Self::Null,
            Self::Bool(flag) => Self::Bool(*flag),
            Self::Number(number) => Self::Number(number.clone()),
            Self::Text(text) => Self::text(text),
            Self::List(items) => Self::list(items.iter().map(ContentValue::deep_clone).collect()),
            Self::Map(map) => Self::map(deep_clone_map(map)),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Number(number) => Value::Number(number.clone()),
            Self::Text(text) => Value::String(text.to_string()),
            Self::List(items) => Value::Array(items.iter().map(ContentValue::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn shares_storage_with(&self, other: &ContentValue) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Arc::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => Arc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for ContentValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(flag),
            Value::Number(number) => Self::Number(number),
            Value::String(text) => Self::Text(Arc::from(text)),
            Value::Array(items) => Self::list(items.into_iter().map(ContentValue::from).collect()),
            Value::Object(map) => Self::map(
                map.into_iter()
                    .map(|(key, value)| (key, ContentValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ContentValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<bool> for ContentValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

fn deep_clone_map(map: &ContentMap) -> ContentMap {
    map.iter()
        .map(|(key, value)| (key.clone(), value.deep_clone()))
        .collect()
}

/// Split a dotted path into its keys, ignoring empty segments.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|segment| !segment.is_empty())
}

/// The editable data of one section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentTree {
    root: Arc<ContentMap>,
}

impl ContentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a JSON object. Anything else yields `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match ContentValue::from(value) {
            ContentValue::Map(root) => Some(Self { root }),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        ContentValue::Map(Arc::clone(&self.root)).to_json()
    }

    pub fn root(&self) -> &ContentMap {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Look up the value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&ContentValue> {
        let mut segments = path_segments(path);
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    /// Look up a value, falling back when the path or any ancestor is missing.
    pub fn get_or(&self, path: &str, fallback: ContentValue) -> ContentValue {
        self.get(path).cloned().unwrap_or(fallback)
    }

    /// Return a new tree with `value` stored at `path`.
    ///
    /// Missing or non-map intermediates are replaced with fresh maps. An empty
    /// path leaves the tree unchanged.
    pub fn set(&self, path: &str, value: ContentValue) -> ContentTree {
        let segments: Vec<&str> = path_segments(path).collect();
        if segments.is_empty() {
            return self.clone();
        }
        Self {
            root: Arc::new(set_in(&self.root, &segments, value)),
        }
    }

    pub fn deep_clone(&self) -> ContentTree {
        Self {
            root: Arc::new(deep_clone_map(&self.root)),
        }
    }
}

fn set_in(map: &ContentMap, segments: &[&str], value: ContentValue) -> ContentMap {
    let mut copy = map.clone();
    let Some((head, rest)) = segments.split_first() else {
        return copy;
    };

    if rest.is_empty() {
        copy.insert((*head).to_string(), value);
        return copy;
    }

    let child = match map.get(*head) {
        Some(ContentValue::Map(child)) => set_in(child, rest, value),
        _ => set_in(&ContentMap::new(), rest, value),
    };
    copy.insert((*head).to_string(), ContentValue::map(child));
    copy
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn hero() -> ContentTree {
        ContentTree::from_json(json!({
            "heading": { "primary": "Build faster", "secondary": "Ship calmer" },
            "ctaButtons": { "primary": { "text": "Start", "href": "/start" } },
            "metrics": [{ "value": "99%", "label": "Uptime" }],
        }))
        .expect("object")
    }

    #[test]
    fn set_then_get_round_trips() {
        let tree = hero();
        for path in ["heading.primary", "ctaButtons.primary.text", "brand.new.key", "flat"] {
            let updated = tree.set(path, ContentValue::text("value"));
            assert_eq!(updated.get(path), Some(&ContentValue::text("value")), "{path}");
        }
    }

    #[test]
    fn set_materializes_missing_intermediates_without_touching_original() {
        let tree = hero();
        let before = tree.clone();

        let updated = tree.set("footer.links.title", ContentValue::text("More"));

        assert_eq!(tree, before);
        assert!(tree.get("footer").is_none());
        assert_eq!(
            updated.get("footer.links.title"),
            Some(&ContentValue::text("More"))
        );
        assert!(updated.get("footer.links").and_then(ContentValue::as_map).is_some());
    }

    #[test]
    fn set_replaces_scalar_intermediates_with_maps() {
        let tree = ContentTree::new().set("title", ContentValue::text("plain"));
        let updated = tree.set("title.text", ContentValue::text("nested"));
        assert_eq!(updated.get("title.text"), Some(&ContentValue::text("nested")));
        assert_eq!(tree.get("title"), Some(&ContentValue::text("plain")));
    }

    #[test]
    fn set_shares_untouched_siblings() {
        let tree = hero();
        let updated = tree.set("heading.primary", ContentValue::text("Changed"));

        let old_metrics = tree.get("metrics").expect("metrics");
        let new_metrics = updated.get("metrics").expect("metrics");
        assert!(old_metrics.shares_storage_with(new_metrics));

        let old_secondary = tree.get("heading.secondary").expect("secondary");
        let new_secondary = updated.get("heading.secondary").expect("secondary");
        assert!(old_secondary.shares_storage_with(new_secondary));

        let old_heading = tree.get("heading").expect("heading");
        let new_heading = updated.get("heading").expect("heading");
        assert!(!old_heading.shares_storage_with(new_heading));
    }

    #[test]
    fn get_falls_back_when_path_is_missing() {
        let tree = hero();
        assert_eq!(
            tree.get_or("heading.tertiary", ContentValue::empty_text()),
            ContentValue::empty_text()
        );
        assert_eq!(
            tree.get_or("missing.deeply.nested", ContentValue::empty_list()),
            ContentValue::empty_list()
        );
        assert!(tree.get("heading.primary.too.deep").is_none());
        assert!(tree.get("").is_none());
    }

    #[test]
    fn deep_clone_shares_nothing() {
        let tree = hero();
        let copy = tree.deep_clone();
        assert_eq!(tree, copy);
        let original = tree.get("metrics").expect("metrics");
        let cloned = copy.get("metrics").expect("metrics");
        assert!(!original.shares_storage_with(cloned));
    }

    #[test]
    fn serde_round_trip_preserves_shape() {
        let tree = hero().set("flags.visible", ContentValue::Bool(true));
        let encoded = serde_json::to_string(&tree).expect("serialize");
        let decoded: ContentTree = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded, tree);
        assert_eq!(decoded.to_json()["flags"]["visible"], json!(true));
    }

    #[test]
    fn blank_values() {
        assert!(ContentValue::Null.is_blank());
        assert!(ContentValue::text("   ").is_blank());
        assert!(ContentValue::empty_list().is_blank());
        assert!(!ContentValue::Bool(false).is_blank());
        assert!(!ContentValue::number(0.0).is_blank());
    }
}
