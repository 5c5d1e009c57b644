//! Live preview: rendering through an external renderer plus two-way targeting
//! between rendered elements and schema fields.
//!
//! Every field is associated with the element path `"{section}.{field.path}"`.
//! Clicks are resolved segment by segment against those associations in schema
//! order and the first match wins:
//!
//! 1. the field path is a prefix of the clicked path (a trailing numeric segment
//!    selects a list item, the one after it an item field);
//! 2. the clicked path is a prefix of the field path;
//! 3. either path is a suffix of the other.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::application::gateway::PersistenceGateway;
use crate::cache::ChangeSubscription;
use crate::domain::content::{ContentTree, ContentValue, path_segments};
use crate::domain::schema::{FieldKind, SchemaRegistry, SectionSchema};
use crate::util::clock::Clock;

/// Turns a section's content into a visual tree.
pub trait SectionRenderer: Send + Sync {
    fn render(&self, section_id: &str, content: &ContentTree) -> VisualNode;
}

/// One rendered element.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    pub element_path: String,
    pub element_type: String,
    pub text: Option<String>,
    pub highlighted: bool,
    pub children: Vec<VisualNode>,
}

impl VisualNode {
    pub fn new(element_path: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            element_path: element_path.into(),
            element_type: element_type.into(),
            text: None,
            highlighted: false,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: VisualNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first search by element path.
    pub fn find(&self, element_path: &str) -> Option<&VisualNode> {
        if self.element_path == element_path {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find(element_path))
    }

    /// Paths of every highlighted node, in document order.
    pub fn highlighted_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.collect_highlighted(&mut paths);
        paths
    }

    fn collect_highlighted<'a>(&'a self, paths: &mut Vec<&'a str>) {
        if self.highlighted {
            paths.push(&self.element_path);
        }
        for child in &self.children {
            child.collect_highlighted(paths);
        }
    }

    fn mark(&mut self, element_path: &str) -> bool {
        if self.element_path == element_path {
            self.highlighted = true;
            return true;
        }
        self.children
            .iter_mut()
            .any(|child| child.mark(element_path))
    }
}

/// Renders every schema field as a labelled node; list items become children.
pub struct OutlineRenderer {
    registry: Arc<SchemaRegistry>,
}

impl OutlineRenderer {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }
}

impl SectionRenderer for OutlineRenderer {
    fn render(&self, section_id: &str, content: &ContentTree) -> VisualNode {
        let mut root = VisualNode::new(section_id, "section");
        let Ok(schema) = self.registry.schema(section_id) else {
            return root;
        };

        for field in schema.fields() {
            let element_path = format!("{section_id}.{}", field.path);
            let value = field.value_in(content);
            let mut node = VisualNode::new(&element_path, field.kind.as_str());
            match (&field.kind, value.as_list()) {
                (FieldKind::OrderedList, Some(items)) => {
                    for (index, item) in items.iter().enumerate() {
                        node = node.with_child(render_item(&element_path, index, item));
                    }
                }
                _ => node = node.with_text(value.display_text()),
            }
            root = root.with_child(node);
        }
        root
    }
}

fn render_item(list_path: &str, index: usize, item: &ContentValue) -> VisualNode {
    let item_path = format!("{list_path}.{index}");
    let mut node = VisualNode::new(&item_path, "item");
    if let Some(entries) = item.as_map() {
        for (key, value) in entries {
            node = node.with_child(
                VisualNode::new(format!("{item_path}.{key}"), "text").with_text(value.display_text()),
            );
        }
    }
    node
}

/// A click reported by the rendered preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewClick {
    pub element_path: String,
    pub element_type: String,
}

impl PreviewClick {
    pub fn new(element_path: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            element_path: element_path.into(),
            element_type: element_type.into(),
        }
    }
}

/// Position inside an ordered-list field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTarget {
    pub index: usize,
    pub field: Option<String>,
}

/// The field (and optionally list item) an element path resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTarget {
    pub field_id: String,
    pub group_id: String,
    pub item: Option<ItemTarget>,
}

impl FieldTarget {
    pub fn field(field_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            group_id: group_id.into(),
            item: None,
        }
    }
}

/// A transient highlight on one rendered element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub target: FieldTarget,
    pub element_path: String,
    pub expires_at: Instant,
}

#[derive(Debug, Clone)]
struct Association {
    field_id: String,
    group_id: String,
    element_path: String,
    segments: Vec<String>,
}

pub struct PreviewBridge {
    schema: Arc<SectionSchema>,
    renderer: Arc<dyn SectionRenderer>,
    clock: Arc<dyn Clock>,
    highlight_duration: Duration,
    associations: Vec<Association>,
    highlight: Option<Highlight>,
}

impl PreviewBridge {
    pub fn new(
        schema: Arc<SectionSchema>,
        renderer: Arc<dyn SectionRenderer>,
        clock: Arc<dyn Clock>,
        highlight_duration: Duration,
    ) -> Self {
        let associations = schema
            .groups
            .iter()
            .flat_map(|group| {
                let section_id = schema.id.as_str();
                group.fields.iter().map(move |field| Association {
                    field_id: field.id.clone(),
                    group_id: group.id.clone(),
                    element_path: format!("{section_id}.{}", field.path),
                    segments: path_segments(&field.path).map(str::to_string).collect(),
                })
            })
            .collect();

        Self {
            schema,
            renderer,
            clock,
            highlight_duration,
            associations,
            highlight: None,
        }
    }

    pub fn section_id(&self) -> &str {
        &self.schema.id
    }

    /// `(field id, element path)` pairs in schema order.
    pub fn associations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.associations
            .iter()
            .map(|association| (association.field_id.as_str(), association.element_path.as_str()))
    }

    /// Resolve a rendered element path to the first matching field.
    pub fn resolve(&self, element_path: &str) -> Option<FieldTarget> {
        let mut clicked: Vec<&str> = path_segments(element_path).collect();
        if clicked.first() == Some(&self.schema.id.as_str()) {
            clicked.remove(0);
        }
        if clicked.is_empty() {
            return None;
        }

        self.associations.iter().find_map(|association| {
            let field: Vec<&str> = association.segments.iter().map(String::as_str).collect();
            let target = FieldTarget::field(&association.field_id, &association.group_id);

            if clicked.starts_with(&field) {
                let rest = &clicked[field.len()..];
                let item = rest
                    .first()
                    .and_then(|segment| segment.parse::<usize>().ok())
                    .map(|index| ItemTarget {
                        index,
                        field: rest.get(1).map(|name| name.to_string()),
                    });
                return Some(FieldTarget { item, ..target });
            }
            if field.starts_with(&clicked) || clicked.ends_with(&field) || field.ends_with(&clicked)
            {
                return Some(target);
            }
            None
        })
    }

    /// Element path rendered for `target`.
    pub fn element_path_for(&self, target: &FieldTarget) -> Option<String> {
        let association = self
            .associations
            .iter()
            .find(|association| association.field_id == target.field_id)?;
        let mut path = association.element_path.clone();
        if let Some(item) = &target.item {
            path.push_str(&format!(".{}", item.index));
            if let Some(field) = &item.field {
                path.push('.');
                path.push_str(field);
            }
        }
        Some(path)
    }

    /// Highlight `target` until the highlight duration has passed.
    pub fn highlight(&mut self, target: FieldTarget) -> Option<&Highlight> {
        let element_path = self.element_path_for(&target)?;
        let expires_at = self.clock.now() + self.highlight_duration;
        debug!(
            field_id = %target.field_id,
            element_path = %element_path,
            "Preview highlight applied"
        );
        self.highlight = Some(Highlight {
            target,
            element_path,
            expires_at,
        });
        self.highlight.as_ref()
    }

    /// Highlight a whole field by id.
    pub fn highlight_field(&mut self, field_id: &str) -> Option<&Highlight> {
        let group_id = self
            .associations
            .iter()
            .find(|association| association.field_id == field_id)?
            .group_id
            .clone();
        self.highlight(FieldTarget::field(field_id, group_id))
    }

    /// The current highlight, unless it has expired.
    pub fn active_highlight(&self) -> Option<&Highlight> {
        let now = self.clock.now();
        self.highlight
            .as_ref()
            .filter(|highlight| now < highlight.expires_at)
    }

    /// Drop an expired highlight. Returns whether one was dropped.
    pub fn expire(&mut self) -> bool {
        let now = self.clock.now();
        match &self.highlight {
            Some(highlight) if now >= highlight.expires_at => {
                self.highlight = None;
                debug!("Preview highlight cleared");
                true
            }
            _ => false,
        }
    }

    pub fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    pub fn highlight_deadline(&self) -> Option<Instant> {
        self.highlight.as_ref().map(|highlight| highlight.expires_at)
    }

    /// Render `content` and mark the highlighted element.
    pub fn render(&self, content: &ContentTree) -> VisualNode {
        let mut root = self.renderer.render(&self.schema.id, content);
        if let Some(highlight) = self.active_highlight() {
            if !root.mark(&highlight.element_path) {
                debug!(
                    element_path = %highlight.element_path,
                    "Highlighted element not present in rendered preview"
                );
            }
        }
        root
    }

    /// Content handed to a freshly opened preview: the draft if present,
    /// otherwise the durable copy.
    pub fn load_handoff(&self, gateway: &PersistenceGateway) -> Option<ContentTree> {
        let section_id = self.section_id();
        gateway
            .load_draft()
            .and_then(|draft| draft.section(section_id).cloned())
            .or_else(|| gateway.load_section(section_id))
    }
}

/// A standalone preview view that follows the change signal. The draft is
/// only consulted when the window opens; refreshes read durable content.
pub struct PreviewWindow {
    bridge: PreviewBridge,
    gateway: Arc<PersistenceGateway>,
    subscription: ChangeSubscription,
    content: ContentTree,
}

impl PreviewWindow {
    /// Open a preview from the handoff slot, falling back to `defaults`.
    pub fn open(bridge: PreviewBridge, gateway: Arc<PersistenceGateway>, defaults: ContentTree) -> Self {
        let subscription = gateway.signal().subscribe();
        let content = bridge.load_handoff(&gateway).unwrap_or(defaults);
        Self {
            bridge,
            gateway,
            subscription,
            content,
        }
    }

    pub fn content(&self) -> &ContentTree {
        &self.content
    }

    /// Re-fetch durable content when the signal has moved. Returns whether
    /// the signal had moved.
    pub fn sync(&mut self) -> bool {
        if !self.subscription.has_changed(self.gateway.signal()) {
            return false;
        }
        if let Some(content) = self.gateway.load_section(self.bridge.section_id()) {
            self.content = content;
        }
        debug!(
            section = self.bridge.section_id(),
            epoch = self.subscription.seen(),
            "Preview window refreshed"
        );
        true
    }

    pub fn render(&self) -> VisualNode {
        self.bridge.render(&self.content)
    }
}
