//! The content editor: owns one section's content while it is being edited.
//!
//! Every field change runs the same pipeline: validate the new value, write it
//! into a new tree through the path accessor, then (re)arm the history-commit
//! and auto-save timers. Time never passes inside the editor by itself; the
//! host calls [`ContentEditor::tick`] whenever [`ContentEditor::next_deadline`]
//! is reached.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::error::{EditorError, PersistenceError};
use crate::application::form::{FormState, FormView, build_groups};
use crate::application::gateway::PersistenceGateway;
use crate::application::history::History;
use crate::application::preview::{
    FieldTarget, OutlineRenderer, PreviewBridge, PreviewClick, SectionRenderer, VisualNode,
};
use crate::application::timers::Debouncer;
use crate::config::EditorSettings;
use crate::domain::content::{ContentTree, ContentValue};
use crate::domain::error::DomainError;
use crate::domain::schema::{FieldDescriptor, FieldKind, SchemaRegistry, SectionSchema};
use crate::domain::validation::{ValidationReport, validate};
use crate::util::clock::Clock;

const DEFAULT_HISTORY_CAPACITY: usize = 20;
const DEFAULT_COMMIT_DEBOUNCE: Duration = Duration::from_millis(100);
const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(600);
const DEFAULT_HIGHLIGHT: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    pub history_capacity: usize,
    pub commit_debounce: Duration,
    pub autosave_debounce: Duration,
    pub highlight: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            commit_debounce: DEFAULT_COMMIT_DEBOUNCE,
            autosave_debounce: DEFAULT_AUTOSAVE_DEBOUNCE,
            highlight: DEFAULT_HIGHLIGHT,
        }
    }
}

impl From<&EditorSettings> for EditorConfig {
    fn from(settings: &EditorSettings) -> Self {
        Self {
            history_capacity: settings.history_capacity,
            commit_debounce: settings.commit_debounce,
            autosave_debounce: settings.autosave_debounce,
            highlight: settings.highlight,
        }
    }
}

/// Collaborators shared by every editor opened in one host.
#[derive(Clone)]
pub struct EditorContext {
    pub registry: Arc<SchemaRegistry>,
    pub gateway: Arc<PersistenceGateway>,
    pub renderer: Arc<dyn SectionRenderer>,
    pub clock: Arc<dyn Clock>,
    pub config: EditorConfig,
}

impl EditorContext {
    /// Context rendering previews with [`OutlineRenderer`].
    pub fn new(
        registry: Arc<SchemaRegistry>,
        gateway: Arc<PersistenceGateway>,
        clock: Arc<dyn Clock>,
        config: EditorConfig,
    ) -> Self {
        let renderer = Arc::new(OutlineRenderer::new(Arc::clone(&registry)));
        Self {
            registry,
            gateway,
            renderer,
            clock,
            config,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn SectionRenderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

/// What caused a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    Auto,
    Explicit,
}

impl SaveTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Explicit => "explicit",
        }
    }
}

impl fmt::Display for SaveTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dismissible message for the operator, raised when a save fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub trigger: SaveTrigger,
}

/// Effects of one [`ContentEditor::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub committed: bool,
    pub saved: bool,
    pub save_failed: bool,
    pub highlight_cleared: bool,
}

pub struct ContentEditor {
    context: EditorContext,
    schema: Arc<SectionSchema>,
    content: ContentTree,
    persisted: Option<ContentTree>,
    history: History<ContentTree>,
    validation: ValidationReport,
    commit_timer: Debouncer,
    autosave_timer: Debouncer,
    expanded: BTreeSet<String>,
    filter: String,
    preview: PreviewBridge,
    notice: Option<Notice>,
}

impl ContentEditor {
    /// Open `section_id` from stored content, or its built-in default.
    pub fn open(context: EditorContext, section_id: &str) -> Result<Self, DomainError> {
        let schema = context.registry.schema(section_id)?;
        let persisted = context.gateway.load_section(section_id);
        let content = persisted
            .clone()
            .unwrap_or_else(|| context.registry.default_content(section_id));

        let preview = PreviewBridge::new(
            Arc::clone(&schema),
            Arc::clone(&context.renderer),
            Arc::clone(&context.clock),
            context.config.highlight,
        );
        let expanded = schema
            .groups
            .first()
            .map(|group| group.id.clone())
            .into_iter()
            .collect();

        info!(
            section = section_id,
            from_storage = persisted.is_some(),
            "Section opened for editing"
        );

        Ok(Self {
            history: History::new(content.clone(), context.config.history_capacity),
            validation: ValidationReport::for_content(&schema, &content),
            commit_timer: Debouncer::new("history-commit", context.config.commit_debounce),
            autosave_timer: Debouncer::new("autosave", context.config.autosave_debounce),
            context,
            schema,
            content,
            persisted,
            expanded,
            filter: String::new(),
            preview,
            notice: None,
        })
    }

    pub fn section_id(&self) -> &str {
        &self.schema.id
    }

    pub fn schema(&self) -> &Arc<SectionSchema> {
        &self.schema
    }

    pub fn content(&self) -> &ContentTree {
        &self.content
    }

    pub fn validation(&self) -> &ValidationReport {
        &self.validation
    }

    pub fn history(&self) -> &History<ContentTree> {
        &self.history
    }

    pub fn errors(&self, field_id: &str) -> &[String] {
        self.validation.errors(field_id)
    }

    /// Explicit save is allowed only while every field validates.
    pub fn can_publish(&self) -> bool {
        self.validation.is_valid()
    }

    /// Whether the content differs from what was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.persisted.as_ref() != Some(&self.content)
    }

    pub fn field_value(&self, field_id: &str) -> Result<ContentValue, DomainError> {
        let field = self.schema.require_field(field_id)?;
        Ok(field.value_in(&self.content))
    }

    /// Write a new value for a field. Returns the field's violations; they
    /// never prevent the edit. A value of the wrong shape is rejected.
    pub fn update_field(
        &mut self,
        field_id: &str,
        value: ContentValue,
    ) -> Result<Vec<String>, DomainError> {
        let field = self.schema.require_field(field_id)?.clone();
        if let FieldKind::Unsupported(kind) = field.kind {
            return Err(DomainError::UnsupportedField {
                field: field.id,
                kind: kind.to_string(),
            });
        }
        if !field.kind.accepts(&value) {
            return Err(DomainError::ShapeMismatch {
                field: field.id,
                kind: field.kind.to_string(),
            });
        }
        Ok(self.apply(&field, value))
    }

    /// Append a copy of the list's default item. Returns its index.
    pub fn add_item(&mut self, field_id: &str) -> Result<usize, DomainError> {
        let (field, mut items) = self.list_items(field_id)?;
        let template = field
            .list
            .as_ref()
            .map(|template| template.default_item.deep_clone())
            .unwrap_or_else(|| ContentValue::map(Default::default()));
        items.push(template);
        let index = items.len() - 1;
        self.apply(&field, ContentValue::list(items));
        Ok(index)
    }

    pub fn remove_item(&mut self, field_id: &str, index: usize) -> Result<(), DomainError> {
        let (field, mut items) = self.list_items(field_id)?;
        check_index(&field, index, items.len())?;
        items.remove(index);
        self.apply(&field, ContentValue::list(items));
        Ok(())
    }

    /// Swap two items of a list field.
    pub fn swap_items(&mut self, field_id: &str, a: usize, b: usize) -> Result<(), DomainError> {
        let (field, mut items) = self.list_items(field_id)?;
        check_index(&field, a, items.len())?;
        check_index(&field, b, items.len())?;
        items.swap(a, b);
        self.apply(&field, ContentValue::list(items));
        Ok(())
    }

    /// Set one key of one list item.
    pub fn update_item(
        &mut self,
        field_id: &str,
        index: usize,
        item_field: &str,
        value: ContentValue,
    ) -> Result<Vec<String>, DomainError> {
        let (field, mut items) = self.list_items(field_id)?;
        check_index(&field, index, items.len())?;
        items[index] = items[index].with_entry(item_field, value);
        Ok(self.apply(&field, ContentValue::list(items)))
    }

    /// Run due timers and expire the preview highlight.
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.context.clock.now();
        let mut outcome = TickOutcome::default();

        if self.commit_timer.fire_if_due(now) {
            self.history.commit(self.content.clone());
            outcome.committed = true;
        }

        if self.autosave_timer.fire_if_due(now) {
            match self.persist(SaveTrigger::Auto) {
                Ok(()) => outcome.saved = true,
                Err(_) => outcome.save_failed = true,
            }
        }

        outcome.highlight_cleared = self.preview.expire();
        outcome
    }

    /// Earliest instant at which [`ContentEditor::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.commit_timer.deadline(),
            self.autosave_timer.deadline(),
            self.preview.highlight_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn has_pending_save(&self) -> bool {
        self.autosave_timer.is_pending()
    }

    pub fn can_undo(&self) -> bool {
        self.commit_timer.is_pending() || self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.commit_timer.is_pending() && self.history.can_redo()
    }

    /// Step back to the previous snapshot. Pending edits are committed first
    /// so they can be redone.
    pub fn undo(&mut self) -> bool {
        self.flush_commit();
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        debug!(section = %self.schema.id, cursor = self.history.cursor(), "Undo");
        self.restore(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.flush_commit();
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        debug!(section = %self.schema.id, cursor = self.history.cursor(), "Redo");
        self.restore(snapshot);
        true
    }

    /// Discard in-memory edits and reload the last persisted snapshot (or the
    /// built-in default), leaving a single history entry.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.persisted = self.context.gateway.load_section(&self.schema.id);
        let content = self
            .persisted
            .clone()
            .unwrap_or_else(|| self.context.registry.default_content(&self.schema.id));
        self.history.reset(content.clone());
        self.validation = ValidationReport::for_content(&self.schema, &content);
        self.content = content;
        self.preview.clear_highlight();
        info!(section = %self.schema.id, "Editor reset to persisted content");
    }

    /// Deep-copy the current content into a new history entry.
    pub fn duplicate_section(&mut self) {
        self.flush_commit();
        self.content = self.content.deep_clone();
        self.history.commit(self.content.clone());
        self.autosave_timer.schedule(self.context.clock.now());
        debug!(section = %self.schema.id, "Section duplicated into history");
    }

    /// Save now, bypassing the debounce. Refused while any field is invalid.
    pub fn save(&mut self) -> Result<(), EditorError> {
        self.flush_commit();
        if !self.can_publish() {
            let invalid_fields = self.validation.invalid_fields();
            debug!(section = %self.schema.id, ?invalid_fields, "Publish blocked by validation");
            return Err(EditorError::PublishBlocked { invalid_fields });
        }
        self.autosave_timer.cancel();
        self.persist(SaveTrigger::Explicit)?;
        Ok(())
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    /// Filter visible fields by a case-insensitive label/description substring.
    pub fn set_filter(&mut self, query: &str) {
        self.filter = query.trim().to_string();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn visible_fields(&self) -> Vec<&FieldDescriptor> {
        let needle = self.filter.to_lowercase();
        self.schema
            .fields()
            .filter(|field| field.matches_filter(&needle))
            .collect()
    }

    pub fn is_expanded(&self, group_id: &str) -> bool {
        self.expanded.contains(group_id)
    }

    pub fn expand_group(&mut self, group_id: &str) -> Result<(), DomainError> {
        self.require_group(group_id)?;
        self.expanded.insert(group_id.to_string());
        Ok(())
    }

    pub fn collapse_group(&mut self, group_id: &str) -> Result<(), DomainError> {
        self.require_group(group_id)?;
        self.expanded.remove(group_id);
        Ok(())
    }

    /// Flip a group's expanded state. Returns the new state.
    pub fn toggle_group(&mut self, group_id: &str) -> Result<bool, DomainError> {
        self.require_group(group_id)?;
        if self.expanded.remove(group_id) {
            Ok(false)
        } else {
            self.expanded.insert(group_id.to_string());
            Ok(true)
        }
    }

    pub fn form(&self) -> FormView {
        let groups = build_groups(&FormState {
            schema: &self.schema,
            content: &self.content,
            validation: &self.validation,
            expanded: &self.expanded,
            filter: &self.filter,
            highlight: self
                .preview
                .active_highlight()
                .map(|highlight| &highlight.target),
        });

        FormView {
            section_id: self.schema.id.clone(),
            title: self.schema.title.clone(),
            icon: self.schema.icon.clone(),
            filter: self.filter.clone(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            can_publish: self.can_publish(),
            notice: self.notice.as_ref().map(|notice| notice.message.clone()),
            groups,
        }
    }

    pub fn preview(&self) -> &PreviewBridge {
        &self.preview
    }

    /// Resolve a preview click to a field, expand its group and highlight it.
    /// A filter that hides the field is cleared. Unresolvable paths are
    /// ignored.
    pub fn handle_preview_click(&mut self, click: &PreviewClick) -> Option<FieldTarget> {
        let Some(target) = self.preview.resolve(&click.element_path) else {
            debug!(
                element_path = %click.element_path,
                element_type = %click.element_type,
                "Preview click matched no field"
            );
            return None;
        };
        let hidden = !self
            .visible_fields()
            .iter()
            .any(|field| field.id == target.field_id);
        if hidden {
            debug!(
                field = %target.field_id,
                filter = %self.filter,
                "Clearing filter hiding clicked field"
            );
            self.filter.clear();
        }
        self.expanded.insert(target.group_id.clone());
        self.preview.highlight(target.clone());
        Some(target)
    }

    pub fn render_preview(&self) -> VisualNode {
        self.preview.render(&self.content)
    }

    /// Hand the current content to a new preview through the draft slot.
    /// Returns the handoff id stamped on the draft.
    pub fn open_preview(&self) -> Result<Uuid, PersistenceError> {
        let base = self
            .context
            .gateway
            .load_draft()
            .or_else(|| self.context.gateway.load())
            .unwrap_or_default();
        let mut draft = base.with_section(&self.schema.id, self.content.clone());
        let handoff = Uuid::new_v4();
        draft.revision = Some(handoff);
        self.context.gateway.save_draft(&draft)?;
        info!(section = %self.schema.id, %handoff, "Preview draft handed off");
        Ok(handoff)
    }

    /// Switch to another section. Pending timers are cancelled, so unsaved
    /// edits of the current section are dropped.
    pub fn switch_section(&mut self, section_id: &str) -> Result<(), DomainError> {
        if section_id == self.schema.id {
            return Ok(());
        }
        self.cancel_pending();
        let next = Self::open(self.context.clone(), section_id)?;
        *self = next;
        Ok(())
    }

    /// Cancel both timers. Returns whether an auto-save was discarded.
    pub fn cancel_pending(&mut self) -> bool {
        self.commit_timer.cancel();
        let discarded = self.autosave_timer.cancel();
        if discarded {
            debug!(section = %self.schema.id, "Pending auto-save discarded");
        }
        discarded
    }

    fn apply(&mut self, field: &FieldDescriptor, value: ContentValue) -> Vec<String> {
        let messages = validate(&value, field);
        self.validation.record(&field.id, messages.clone());
        self.content = self.content.set(&field.path, value);

        let now = self.context.clock.now();
        self.commit_timer.schedule(now);
        self.autosave_timer.schedule(now);
        self.preview.highlight_field(&field.id);

        debug!(
            section = %self.schema.id,
            field = %field.id,
            violations = messages.len(),
            "Field updated"
        );
        messages
    }

    fn list_items(&self, field_id: &str) -> Result<(FieldDescriptor, Vec<ContentValue>), DomainError> {
        let field = self.schema.require_field(field_id)?;
        if field.kind != FieldKind::OrderedList {
            return Err(DomainError::not_a_list(field_id));
        }
        let items = field
            .value_in(&self.content)
            .as_list()
            .map(<[ContentValue]>::to_vec)
            .unwrap_or_default();
        Ok((field.clone(), items))
    }

    fn require_group(&self, group_id: &str) -> Result<(), DomainError> {
        self.schema
            .group_by_id(group_id)
            .map(|_| ())
            .ok_or_else(|| DomainError::unknown_group(&self.schema.id, group_id))
    }

    fn flush_commit(&mut self) {
        if self.commit_timer.cancel() {
            self.history.commit(self.content.clone());
        }
    }

    fn restore(&mut self, snapshot: ContentTree) {
        self.validation = ValidationReport::for_content(&self.schema, &snapshot);
        self.content = snapshot;
        self.autosave_timer.schedule(self.context.clock.now());
    }

    fn persist(&mut self, trigger: SaveTrigger) -> Result<(), PersistenceError> {
        let result = self
            .context
            .gateway
            .save_section(&self.schema.id, self.content.clone());
        match result {
            Ok(_) => {
                counter!("vitrine_save_total", "trigger" => trigger.as_str()).increment(1);
                self.persisted = Some(self.content.clone());
                self.notice = None;
                info!(section = %self.schema.id, %trigger, "Section saved");
                Ok(())
            }
            Err(err) => {
                counter!("vitrine_save_failed_total", "trigger" => trigger.as_str()).increment(1);
                warn!(
                    section = %self.schema.id,
                    %trigger,
                    error = %err,
                    "Saving section failed; edits kept in memory"
                );
                self.notice = Some(Notice {
                    message: format!("Changes could not be saved: {err}"),
                    trigger,
                });
                Err(err)
            }
        }
    }
}

impl Drop for ContentEditor {
    fn drop(&mut self) {
        if self.autosave_timer.is_pending() {
            debug!(section = %self.schema.id, "Editor closed with a pending auto-save");
        }
    }
}

fn check_index(field: &FieldDescriptor, index: usize, len: usize) -> Result<(), DomainError> {
    if index < len {
        Ok(())
    } else {
        Err(DomainError::IndexOutOfRange {
            field: field.id.clone(),
            index,
            len,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::form::FieldControl;
    use crate::domain::sections::{self, CONTACT, FEATURES, HERO};
    use crate::util::clock::ManualClock;

    fn context(clock: Arc<ManualClock>) -> EditorContext {
        EditorContext::new(
            Arc::new(sections::builtin().clone()),
            Arc::new(PersistenceGateway::in_memory()),
            clock,
            EditorConfig::default(),
        )
    }

    fn editor(section: &str) -> (ContentEditor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let editor = ContentEditor::open(context(clock.clone()), section).expect("open");
        (editor, clock)
    }

    #[test]
    fn opens_with_defaults_and_first_group_expanded() {
        let (editor, _) = editor(HERO);
        assert_eq!(
            editor.content(),
            &sections::builtin().default_content(HERO)
        );
        assert!(editor.is_expanded("headline"));
        assert!(!editor.is_expanded("metrics"));
        assert!(editor.can_publish());
        assert!(!editor.can_undo());
        assert!(editor.is_dirty());
    }

    #[test]
    fn unknown_section_is_rejected() {
        let clock = Arc::new(ManualClock::new());
        let err = ContentEditor::open(context(clock), "pricing")
            .err()
            .expect("unknown section");
        assert_eq!(err, DomainError::unknown_section("pricing"));
    }

    #[test]
    fn edits_commit_after_debounce() {
        let (mut editor, clock) = editor(FEATURES);
        editor
            .update_field("title", ContentValue::text("New title"))
            .expect("update");
        assert_eq!(editor.history().len(), 1);

        clock.advance_ms(99);
        assert!(!editor.tick().committed);
        clock.advance_ms(1);
        assert!(editor.tick().committed);
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn undo_flushes_pending_commit_and_restores() {
        let (mut editor, _) = editor(FEATURES);
        editor
            .update_field("title", ContentValue::text("Changed"))
            .expect("update");

        assert!(editor.can_undo());
        assert!(editor.undo());
        assert_eq!(
            editor.field_value("title").expect("title"),
            ContentValue::text("Everything in one place")
        );
        assert!(editor.redo());
        assert_eq!(
            editor.field_value("title").expect("title"),
            ContentValue::text("Changed")
        );
        assert!(!editor.redo());
    }

    #[test]
    fn undo_restores_validation_state() {
        let (mut editor, clock) = editor(FEATURES);
        editor
            .update_field("title", ContentValue::text(""))
            .expect("update");
        assert!(!editor.can_publish());
        clock.advance_ms(100);
        editor.tick();

        assert!(editor.undo());
        assert!(editor.can_publish());
        assert!(editor.errors("title").is_empty());
    }

    #[test]
    fn list_operations_replace_whole_sequence() {
        let (mut editor, _) = editor(FEATURES);

        let index = editor.add_item("items").expect("add");
        assert_eq!(index, 3);
        editor.swap_items("items", 0, 3).expect("swap");
        let items = editor.field_value("items").expect("items");
        let items = items.as_list().expect("list");
        assert_eq!(
            items[0].as_map().and_then(|item| item.get("title")),
            Some(&ContentValue::text("New feature"))
        );

        editor
            .update_item("items", 0, "title", ContentValue::text("Renamed"))
            .expect("update item");
        editor.remove_item("items", 1).expect("remove");
        let items = editor.field_value("items").expect("items");
        assert_eq!(items.as_list().map(<[ContentValue]>::len), Some(3));
    }

    #[test]
    fn list_operations_check_kind_and_bounds() {
        let (mut editor, _) = editor(FEATURES);
        assert_eq!(
            editor.add_item("title"),
            Err(DomainError::not_a_list("title"))
        );
        assert!(matches!(
            editor.remove_item("items", 7),
            Err(DomainError::IndexOutOfRange { index: 7, len: 3, .. })
        ));
    }

    #[test]
    fn removing_every_item_reports_required() {
        let (mut editor, _) = editor(FEATURES);
        for _ in 0..3 {
            editor.remove_item("items", 0).expect("remove");
        }
        assert_eq!(
            editor.errors("items"),
            ["Cards is required".to_string()]
        );
        assert!(!editor.can_publish());
    }

    #[test]
    fn explicit_save_is_gated_by_validation() {
        let (mut editor, _) = editor(CONTACT);
        editor
            .update_field("email", ContentValue::text("not-an-email"))
            .expect("update");

        let err = editor.save().expect_err("publish blocked");
        assert!(matches!(
            err,
            EditorError::PublishBlocked { ref invalid_fields } if invalid_fields == &["email".to_string()]
        ));

        editor
            .update_field("email", ContentValue::text("team@example.com"))
            .expect("update");
        editor.save().expect("save");
        assert!(!editor.is_dirty());
        assert!(!editor.has_pending_save());
    }

    #[test]
    fn reset_reloads_persisted_content() {
        let (mut editor, _) = editor(CONTACT);
        editor
            .update_field("phone", ContentValue::text("+44 20 7946 0000"))
            .expect("update");
        editor.save().expect("save");

        editor
            .update_field("phone", ContentValue::text("12"))
            .expect("update");
        editor.reset();

        assert_eq!(
            editor.field_value("phone").expect("phone"),
            ContentValue::text("+44 20 7946 0000")
        );
        assert_eq!(editor.history().len(), 1);
        assert!(!editor.has_pending_save());
        assert!(editor.can_publish());
    }

    #[test]
    fn duplicate_section_adds_independent_history_entry() {
        let (mut editor, _) = editor(HERO);
        let before = editor.content().clone();
        editor.duplicate_section();

        assert_eq!(editor.history().len(), 2);
        assert_eq!(editor.content(), &before);
        assert!(editor.undo());
        assert_eq!(editor.content(), &before);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let (mut editor, _) = editor(HERO);
        assert!(matches!(
            editor.update_field("nope", ContentValue::text("x")),
            Err(DomainError::UnknownField { .. })
        ));
    }

    #[test]
    fn filter_and_group_state_are_independent() {
        let (mut editor, _) = editor(HERO);
        editor.set_filter("  BUTTON ");
        let visible: Vec<&str> = editor
            .visible_fields()
            .into_iter()
            .map(|field| field.id.as_str())
            .collect();
        assert_eq!(
            visible,
            ["ctaPrimaryText", "ctaPrimaryHref", "ctaSecondaryText"]
        );
        assert!(!editor.is_expanded("cta"));

        assert!(editor.toggle_group("cta").expect("known group"));
        editor.set_filter("");
        assert!(editor.is_expanded("cta"));
        assert!(editor.collapse_group("missing").is_err());
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let (mut editor, _) = editor(HERO);
        let before = editor.field_value("metrics").expect("metrics");

        let error = editor
            .update_field("metrics", ContentValue::text("oops"))
            .expect_err("text is not a list");
        assert_eq!(
            error,
            DomainError::ShapeMismatch {
                field: "metrics".into(),
                kind: "ordered-list".into(),
            }
        );
        assert_eq!(editor.field_value("metrics").expect("metrics"), before);
        assert!(!editor.has_pending_save());
        assert_eq!(editor.add_item("metrics").expect("add"), 2);
    }

    #[test]
    fn preview_click_clears_filter_hiding_the_field() {
        let (mut editor, _) = editor(HERO);
        editor.set_filter("button");
        assert!(editor.form().field("metrics").is_none());

        editor
            .handle_preview_click(&PreviewClick::new("hero.metrics.0.value", "span"))
            .expect("click resolves");
        assert_eq!(editor.filter(), "");
        let form = editor.form();
        let metrics = form.field("metrics").expect("metrics visible");
        let FieldControl::List { items } = &metrics.control else {
            panic!("metrics renders as a list control");
        };
        assert_eq!(items[0].highlighted_field.as_deref(), Some("value"));

        editor.set_filter("button");
        editor
            .handle_preview_click(&PreviewClick::new("hero.ctaButtons.primary.text", "a"))
            .expect("click resolves");
        assert_eq!(editor.filter(), "button");
    }

    #[test]
    fn switching_sections_discards_pending_autosave() {
        let (mut editor, clock) = editor(FEATURES);
        editor
            .update_field("title", ContentValue::text("Unsaved"))
            .expect("update");
        editor.switch_section(CONTACT).expect("switch");

        assert_eq!(editor.section_id(), CONTACT);
        clock.advance_ms(1_000);
        assert_eq!(editor.tick(), TickOutcome::default());
        assert!(editor.context.gateway.load().is_none());
    }

    #[test]
    fn open_preview_writes_draft_with_handoff_id() {
        let (mut editor, _) = editor(HERO);
        editor
            .update_field("headingPrimary", ContentValue::text("Draft headline"))
            .expect("update");

        let handoff = editor.open_preview().expect("handoff");
        let draft = editor.context.gateway.load_draft().expect("draft");
        assert_eq!(draft.revision, Some(handoff));
        assert_eq!(
            draft
                .section(HERO)
                .and_then(|content| content.get("heading.primary")),
            Some(&ContentValue::text("Draft headline"))
        );
        assert!(editor.context.gateway.load().is_none());
    }

    #[test]
    fn edit_highlights_field_in_preview() {
        let (mut editor, clock) = editor(HERO);
        editor
            .update_field("ctaPrimaryText", ContentValue::text("Start"))
            .expect("update");

        let rendered = editor.render_preview();
        assert_eq!(
            rendered.highlighted_paths(),
            vec!["hero.ctaButtons.primary.text"]
        );
        assert!(editor.form().field("ctaPrimaryText").expect("field").highlighted);

        clock.advance_ms(2_500);
        assert!(editor.tick().highlight_cleared);
        assert!(editor.render_preview().highlighted_paths().is_empty());
    }

    #[test]
    fn stored_content_is_preferred_over_defaults() {
        let clock = Arc::new(ManualClock::new());
        let context = context(clock);
        let stored = ContentTree::from_json(json!({ "title": "Stored", "items": [] }))
            .expect("object");
        context
            .gateway
            .save_section(FEATURES, stored.clone())
            .expect("save");

        let editor = ContentEditor::open(context, FEATURES).expect("open");
        assert_eq!(editor.content(), &stored);
        assert!(!editor.is_dirty());
        assert_eq!(
            editor.errors("items"),
            ["Cards is required".to_string()]
        );
    }
}
