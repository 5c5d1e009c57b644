//! Declarative field schemas describing a section's editable surface.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::domain::content::{ContentTree, ContentValue, path_segments};
use crate::domain::error::DomainError;

/// The kind of control a field is edited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    ShortText,
    RichText,
    ImageReference,
    OrderedList,
    EnumeratedChoice,
    Numeric,
    Boolean,
    /// A kind this engine has no control for; rendered as a placeholder.
    Unsupported(&'static str),
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortText => "short-text",
            Self::RichText => "rich-text",
            Self::ImageReference => "image-reference",
            Self::OrderedList => "ordered-list",
            Self::EnumeratedChoice => "enumerated-choice",
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
            Self::Unsupported(name) => *name,
        }
    }

    /// Value shown when the field's path does not resolve.
    pub fn empty_value(&self) -> ContentValue {
        match self {
            Self::OrderedList => ContentValue::empty_list(),
            Self::Boolean => ContentValue::Bool(false),
            _ => ContentValue::empty_text(),
        }
    }

    /// Whether `value` has the shape this kind stores.
    pub fn accepts(&self, value: &ContentValue) -> bool {
        match self {
            Self::OrderedList => matches!(value, ContentValue::List(_)),
            Self::Boolean => matches!(value, ContentValue::Bool(_)),
            Self::Numeric => matches!(value, ContentValue::Number(_) | ContentValue::Text(_)),
            Self::Unsupported(_) => true,
            _ => matches!(value, ContentValue::Text(_) | ContentValue::Null),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller-supplied check used by [`Rule::Predicate`].
#[derive(Clone, Copy)]
pub struct Predicate {
    pub message: &'static str,
    pub check: fn(&ContentValue) -> bool,
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// A single validation rule. Rules run in declaration order.
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
    Url,
    Numeric,
    Predicate(Predicate),
}

impl Rule {
    pub fn predicate(message: &'static str, check: fn(&ContentValue) -> bool) -> Self {
        Self::Predicate(Predicate { message, check })
    }
}

/// Item layout for ordered-list fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ListTemplate {
    pub item_fields: Vec<String>,
    pub default_item: ContentValue,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub id: String,
    pub kind: FieldKind,
    pub path: String,
    pub label: String,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
    pub rules: Vec<Rule>,
    /// Choices for enumerated-choice fields.
    pub options: Vec<String>,
    pub list: Option<ListTemplate>,
}

impl FieldDescriptor {
    pub fn new(
        id: impl Into<String>,
        kind: FieldKind,
        path: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            path: path.into(),
            label: label.into(),
            description: None,
            placeholder: None,
            required: false,
            rules: Vec::new(),
            options: Vec::new(),
            list: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn list_items<I, S>(mut self, item_fields: I, default_item: ContentValue) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.list = Some(ListTemplate {
            item_fields: item_fields.into_iter().map(Into::into).collect(),
            default_item,
        });
        self
    }

    /// Current value of this field in `content`, or the kind's empty value.
    pub fn value_in(&self, content: &ContentTree) -> ContentValue {
        content.get_or(&self.path, self.kind.empty_value())
    }

    /// Case-insensitive match on label and description. `needle` must be lowercase.
    pub fn matches_filter(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.label.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone)]
pub struct FieldGroup {
    pub id: String,
    pub title: String,
    pub fields: Vec<FieldDescriptor>,
}

impl FieldGroup {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SectionSchema {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub groups: Vec<FieldGroup>,
}

impl SectionSchema {
    pub fn new(id: impl Into<String>, title: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            icon: icon.into(),
            groups: Vec::new(),
        }
    }

    pub fn group(mut self, group: FieldGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// All fields in schema order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.groups.iter().flat_map(|group| group.fields.iter())
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|field| field.id == field_id)
    }

    pub fn require_field(&self, field_id: &str) -> Result<&FieldDescriptor, DomainError> {
        self.field(field_id)
            .ok_or_else(|| DomainError::unknown_field(&self.id, field_id))
    }

    pub fn group_by_id(&self, group_id: &str) -> Option<&FieldGroup> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    /// The group owning `field_id`.
    pub fn group_of(&self, field_id: &str) -> Option<&FieldGroup> {
        self.groups
            .iter()
            .find(|group| group.fields.iter().any(|field| field.id == field_id))
    }

    /// Check the static invariants of the schema against its default content.
    pub fn check(&self, defaults: &ContentTree) -> Result<(), DomainError> {
        let mut field_ids = HashSet::new();
        let mut group_ids = HashSet::new();

        for group in &self.groups {
            if !group_ids.insert(group.id.as_str()) {
                return Err(DomainError::invariant(format!(
                    "`{}` declares group `{}` twice",
                    self.id, group.id
                )));
            }

            for field in &group.fields {
                if !field_ids.insert(field.id.as_str()) {
                    return Err(DomainError::invariant(format!(
                        "`{}` declares field `{}` twice",
                        self.id, field.id
                    )));
                }
                if path_segments(&field.path).next().is_none() {
                    return Err(DomainError::invariant(format!(
                        "field `{}` has an empty path",
                        field.id
                    )));
                }
                if field.kind == FieldKind::OrderedList && field.list.is_none() {
                    return Err(DomainError::invariant(format!(
                        "list field `{}` has no item template",
                        field.id
                    )));
                }
                if let Some(value) = defaults.get(&field.path) {
                    if !field.kind.accepts(value) {
                        return Err(DomainError::invariant(format!(
                            "default value at `{}` does not fit {} field `{}`",
                            field.path, field.kind, field.id
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Compiled-in table of section schemas and their default content.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<SectionSchema>>,
    defaults: BTreeMap<String, ContentTree>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema and its default content after checking its invariants.
    pub fn register(
        &mut self,
        schema: SectionSchema,
        defaults: ContentTree,
    ) -> Result<(), DomainError> {
        schema.check(&defaults)?;
        let id = schema.id.clone();
        self.defaults.insert(id.clone(), defaults);
        self.schemas.insert(id, Arc::new(schema));
        Ok(())
    }

    pub fn schema(&self, section_id: &str) -> Result<Arc<SectionSchema>, DomainError> {
        self.schemas
            .get(section_id)
            .cloned()
            .ok_or_else(|| DomainError::unknown_section(section_id))
    }

    pub fn default_content(&self, section_id: &str) -> ContentTree {
        self.defaults.get(section_id).cloned().unwrap_or_default()
    }

    pub fn section_ids(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<SectionSchema>> {
        self.schemas.values()
    }
}
