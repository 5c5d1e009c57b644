//! Form view model generated from a section schema.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::application::preview::FieldTarget;
use crate::domain::content::{ContentTree, ContentValue};
use crate::domain::schema::{FieldDescriptor, FieldKind, SectionSchema};
use crate::domain::validation::ValidationReport;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub section_id: String,
    pub title: String,
    pub icon: String,
    pub filter: String,
    pub can_undo: bool,
    pub can_redo: bool,
    pub can_publish: bool,
    pub notice: Option<String>,
    pub groups: Vec<GroupView>,
}

impl FormView {
    pub fn group(&self, group_id: &str) -> Option<&GroupView> {
        self.groups.iter().find(|group| group.id == group_id)
    }

    pub fn field(&self, field_id: &str) -> Option<&FieldView> {
        self.groups
            .iter()
            .flat_map(|group| group.fields.iter())
            .find(|field| field.id == field_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView {
    pub id: String,
    pub title: String,
    pub expanded: bool,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
    pub errors: Vec<String>,
    pub highlighted: bool,
    pub control: FieldControl,
}

/// The control a field is edited with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldControl {
    Text { value: String },
    RichText { value: String },
    Image { url: String },
    List { items: Vec<ListItemView> },
    Choice { options: Vec<String>, selected: String },
    Number { value: String },
    Toggle { on: bool },
    /// No control exists for this kind; the host shows a placeholder.
    Unsupported { kind: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItemView {
    pub index: usize,
    pub fields: Vec<(String, String)>,
    pub highlighted_field: Option<String>,
}

pub(crate) struct FormState<'a> {
    pub schema: &'a SectionSchema,
    pub content: &'a ContentTree,
    pub validation: &'a ValidationReport,
    pub expanded: &'a BTreeSet<String>,
    pub filter: &'a str,
    pub highlight: Option<&'a FieldTarget>,
}

/// Groups with their visible fields. Groups left empty by the filter are omitted.
pub(crate) fn build_groups(state: &FormState<'_>) -> Vec<GroupView> {
    let needle = state.filter.to_lowercase();
    state
        .schema
        .groups
        .iter()
        .filter_map(|group| {
            let fields: Vec<FieldView> = group
                .fields
                .iter()
                .filter(|field| field.matches_filter(&needle))
                .map(|field| field_view(field, state))
                .collect();
            if fields.is_empty() && !needle.is_empty() {
                return None;
            }
            Some(GroupView {
                id: group.id.clone(),
                title: group.title.clone(),
                expanded: state.expanded.contains(&group.id),
                fields,
            })
        })
        .collect()
}

fn field_view(field: &FieldDescriptor, state: &FormState<'_>) -> FieldView {
    let highlight = state
        .highlight
        .filter(|target| target.field_id == field.id);
    let value = field.value_in(state.content);

    FieldView {
        id: field.id.clone(),
        label: field.label.clone(),
        description: field.description.clone(),
        placeholder: field.placeholder.clone(),
        required: field.required,
        errors: state.validation.errors(&field.id).to_vec(),
        highlighted: highlight.is_some_and(|target| target.item.is_none()),
        control: control_for(field, &value, highlight),
    }
}

fn control_for(
    field: &FieldDescriptor,
    value: &ContentValue,
    highlight: Option<&FieldTarget>,
) -> FieldControl {
    match field.kind {
        FieldKind::ShortText => FieldControl::Text {
            value: value.display_text(),
        },
        FieldKind::RichText => FieldControl::RichText {
            value: value.display_text(),
        },
        FieldKind::ImageReference => FieldControl::Image {
            url: value.display_text(),
        },
        FieldKind::OrderedList => FieldControl::List {
            items: list_items(field, value, highlight),
        },
        FieldKind::EnumeratedChoice => FieldControl::Choice {
            options: field.options.clone(),
            selected: value.display_text(),
        },
        FieldKind::Numeric => FieldControl::Number {
            value: value.display_text(),
        },
        FieldKind::Boolean => FieldControl::Toggle {
            on: value.as_bool().unwrap_or(false),
        },
        FieldKind::Unsupported(kind) => FieldControl::Unsupported {
            kind: kind.to_string(),
        },
    }
}

fn list_items(
    field: &FieldDescriptor,
    value: &ContentValue,
    highlight: Option<&FieldTarget>,
) -> Vec<ListItemView> {
    let item_fields = field
        .list
        .as_ref()
        .map(|template| template.item_fields.as_slice())
        .unwrap_or_default();
    let highlighted_item = highlight.and_then(|target| target.item.as_ref());

    value
        .as_list()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, item)| ListItemView {
            index,
            fields: item_fields
                .iter()
                .map(|name| {
                    let text = item
                        .as_map()
                        .and_then(|entries| entries.get(name))
                        .map(ContentValue::display_text)
                        .unwrap_or_default();
                    (name.clone(), text)
                })
                .collect(),
            highlighted_field: highlighted_item
                .filter(|target| target.index == index)
                .map(|target| {
                    target
                        .field
                        .clone()
                        .unwrap_or_else(|| item_fields.first().cloned().unwrap_or_default())
                }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::preview::ItemTarget;
    use crate::domain::schema::FieldGroup;

    fn schema() -> SectionSchema {
        SectionSchema::new("demo", "Demo", "star")
            .group(
                FieldGroup::new("main", "Main")
                    .field(
                        FieldDescriptor::new("title", FieldKind::ShortText, "title", "Title")
                            .describe("Main heading")
                            .required(),
                    )
                    .field(FieldDescriptor::new(
                        "video",
                        FieldKind::Unsupported("video"),
                        "media.video",
                        "Video",
                    )),
            )
            .group(
                FieldGroup::new("lists", "Lists").field(
                    FieldDescriptor::new("items", FieldKind::OrderedList, "items", "Items")
                        .list_items(["name"], ContentValue::from(serde_json::json!({ "name": "" }))),
                ),
            )
    }

    fn content() -> ContentTree {
        ContentTree::from_json(serde_json::json!({
            "title": "",
            "items": [{ "name": "a" }, { "name": "b" }]
        }))
        .expect("object")
    }

    #[test]
    fn builds_controls_with_fallback_variant() {
        let schema = schema();
        let content = content();
        let validation = ValidationReport::for_content(&schema, &content);
        let expanded = BTreeSet::from(["main".to_string()]);
        let groups = build_groups(&FormState {
            schema: &schema,
            content: &content,
            validation: &validation,
            expanded: &expanded,
            filter: "",
            highlight: None,
        });

        assert_eq!(groups.len(), 2);
        assert!(groups[0].expanded);
        assert!(!groups[1].expanded);
        assert_eq!(groups[0].fields[0].errors, vec!["Title is required".to_string()]);
        assert_eq!(
            groups[0].fields[1].control,
            FieldControl::Unsupported {
                kind: "video".into()
            }
        );
    }

    #[test]
    fn filter_hides_fields_without_touching_expansion() {
        let schema = schema();
        let content = content();
        let validation = ValidationReport::new();
        let expanded = BTreeSet::new();
        let groups = build_groups(&FormState {
            schema: &schema,
            content: &content,
            validation: &validation,
            expanded: &expanded,
            filter: "HEADING",
            highlight: None,
        });

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].fields.len(), 1);
        assert_eq!(groups[0].fields[0].id, "title");
        assert!(!groups[0].expanded);
    }

    #[test]
    fn item_highlight_lands_on_item_control() {
        let schema = schema();
        let content = content();
        let validation = ValidationReport::new();
        let expanded = BTreeSet::new();
        let target = FieldTarget {
            field_id: "items".into(),
            group_id: "lists".into(),
            item: Some(ItemTarget {
                index: 1,
                field: Some("name".into()),
            }),
        };
        let groups = build_groups(&FormState {
            schema: &schema,
            content: &content,
            validation: &validation,
            expanded: &expanded,
            filter: "",
            highlight: Some(&target),
        });

        let field = &groups[1].fields[0];
        assert!(!field.highlighted);
        let FieldControl::List { items } = &field.control else {
            panic!("list control expected");
        };
        assert_eq!(items[0].highlighted_field, None);
        assert_eq!(items[1].highlighted_field.as_deref(), Some("name"));
        assert_eq!(items[1].fields, vec![("name".to_string(), "b".to_string())]);
    }
}
