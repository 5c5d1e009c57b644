//! Built-in section schemas and their default content.

use once_cell::sync::Lazy;
use serde_json::json;

use crate::domain::content::{ContentTree, ContentValue};
use crate::domain::error::DomainError;
use crate::domain::schema::{
    FieldDescriptor, FieldGroup, FieldKind, Rule, SchemaRegistry, SectionSchema,
};
use crate::domain::validation::is_numeric;

pub const HERO: &str = "hero";
pub const FEATURES: &str = "features";
pub const CONTACT: &str = "contact";

static BUILTIN: Lazy<SchemaRegistry> =
    Lazy::new(|| builtin_registry().expect("built-in schemas satisfy their invariants"));

/// Shared registry of the compiled-in sections.
pub fn builtin() -> &'static SchemaRegistry {
    &BUILTIN
}

/// Build a fresh registry holding every compiled-in section.
pub fn builtin_registry() -> Result<SchemaRegistry, DomainError> {
    let mut registry = SchemaRegistry::new();
    registry.register(hero_schema(), hero_defaults())?;
    registry.register(features_schema(), features_defaults())?;
    registry.register(contact_schema(), contact_defaults())?;
    Ok(registry)
}

fn positive_number(value: &ContentValue) -> bool {
    if !is_numeric(value) {
        // Reported by the numeric rule.
        return true;
    }
    match value {
        ContentValue::Number(number) => number.as_f64().is_some_and(|n| n > 0.0),
        ContentValue::Text(text) => text.trim().parse::<f64>().is_ok_and(|n| n > 0.0),
        _ => true,
    }
}

fn hero_schema() -> SectionSchema {
    SectionSchema::new(HERO, "Hero", "sparkles")
        .group(
            FieldGroup::new("headline", "Headline")
                .field(
                    FieldDescriptor::new(
                        "headingPrimary",
                        FieldKind::ShortText,
                        "heading.primary",
                        "Headline",
                    )
                    .describe("First line of the hero heading")
                    .placeholder("Build something calm")
                    .required()
                    .rule(Rule::MaxLength(80)),
                )
                .field(
                    FieldDescriptor::new(
                        "headingSecondary",
                        FieldKind::ShortText,
                        "heading.secondary",
                        "Headline accent",
                    )
                    .describe("Highlighted second line")
                    .rule(Rule::MaxLength(80)),
                )
                .field(
                    FieldDescriptor::new("subheading", FieldKind::RichText, "subheading", "Subheading")
                        .describe("Supporting paragraph below the heading")
                        .rule(Rule::MaxLength(280)),
                )
                .field(
                    FieldDescriptor::new(
                        "backgroundImage",
                        FieldKind::ImageReference,
                        "media.background",
                        "Background image",
                    )
                    .rule(Rule::Url),
                ),
        )
        .group(
            FieldGroup::new("cta", "Call to action")
                .field(
                    FieldDescriptor::new(
                        "ctaPrimaryText",
                        FieldKind::ShortText,
                        "ctaButtons.primary.text",
                        "Primary button label",
                    )
                    .required()
                    .rule(Rule::MaxLength(30)),
                )
                .field(
                    FieldDescriptor::new(
                        "ctaPrimaryHref",
                        FieldKind::ShortText,
                        "ctaButtons.primary.href",
                        "Primary button link",
                    )
                    .required()
                    .rule(Rule::Url),
                )
                .field(
                    FieldDescriptor::new(
                        "ctaSecondaryText",
                        FieldKind::ShortText,
                        "ctaButtons.secondary.text",
                        "Secondary button label",
                    )
                    .rule(Rule::MaxLength(30)),
                ),
        )
        .group(
            FieldGroup::new("metrics", "Metrics").field(
                FieldDescriptor::new("metrics", FieldKind::OrderedList, "metrics", "Metrics")
                    .describe("Figures shown beneath the call to action")
                    .rule(Rule::MaxLength(6))
                    .list_items(
                        ["value", "label"],
                        ContentValue::from(json!({ "value": "0", "label": "New metric" })),
                    ),
            ),
        )
        .group(
            FieldGroup::new("testimonials", "Testimonials")
                .field(
                    FieldDescriptor::new(
                        "testimonials",
                        FieldKind::OrderedList,
                        "testimonials",
                        "Testimonials",
                    )
                    .list_items(
                        ["quote", "author", "role"],
                        ContentValue::from(json!({ "quote": "", "author": "", "role": "" })),
                    ),
                )
                .field(
                    FieldDescriptor::new(
                        "testimonialLayout",
                        FieldKind::EnumeratedChoice,
                        "testimonialLayout",
                        "Layout",
                    )
                    .options(["carousel", "grid"]),
                )
                .field(FieldDescriptor::new(
                    "showRatings",
                    FieldKind::Boolean,
                    "showRatings",
                    "Show ratings",
                ))
                .field(
                    FieldDescriptor::new(
                        "autoplaySeconds",
                        FieldKind::Numeric,
                        "autoplaySeconds",
                        "Autoplay interval",
                    )
                    .describe("Seconds between carousel slides")
                    .rule(Rule::Numeric)
                    .rule(Rule::predicate(
                        "Autoplay interval must be greater than zero",
                        positive_number,
                    )),
                ),
        )
}

fn hero_defaults() -> ContentTree {
    ContentTree::from_json(json!({
        "heading": { "primary": "Publish with confidence", "secondary": "without the busywork" },
        "subheading": "Edit every section of your site from one calm place.",
        "media": { "background": "https://images.example.com/hero.jpg" },
        "ctaButtons": {
            "primary": { "text": "Get started", "href": "/signup" },
            "secondary": { "text": "Talk to us" },
        },
        "metrics": [
            { "value": "99.9%", "label": "Uptime" },
            { "value": "2x", "label": "Faster launches" },
        ],
        "testimonials": [
            { "quote": "We shipped our relaunch in a week.", "author": "Dana Ruiz", "role": "Marketing lead" },
        ],
        "testimonialLayout": "carousel",
        "showRatings": true,
        "autoplaySeconds": 6,
    }))
    .unwrap_or_default()
}

fn features_schema() -> SectionSchema {
    SectionSchema::new(FEATURES, "Features", "grid")
        .group(
            FieldGroup::new("intro", "Introduction")
                .field(
                    FieldDescriptor::new("title", FieldKind::ShortText, "title", "Title")
                        .required()
                        .rule(Rule::MaxLength(60)),
                )
                .field(
                    FieldDescriptor::new("intro", FieldKind::RichText, "intro", "Introduction")
                        .describe("Lead paragraph above the feature grid"),
                ),
        )
        .group(
            FieldGroup::new("items", "Feature cards").field(
                FieldDescriptor::new("items", FieldKind::OrderedList, "items", "Cards")
                    .required()
                    .rule(Rule::MaxLength(12))
                    .list_items(
                        ["icon", "title", "body"],
                        ContentValue::from(json!({ "icon": "star", "title": "New feature", "body": "" })),
                    ),
            ),
        )
}

fn features_defaults() -> ContentTree {
    ContentTree::from_json(json!({
        "title": "Everything in one place",
        "intro": "Tools that stay out of the way.",
        "items": [
            { "icon": "bolt", "title": "Live preview", "body": "See changes as you type." },
            { "icon": "undo", "title": "Undo anything", "body": "Step back through recent edits." },
            { "icon": "save", "title": "Auto-save", "body": "Your work is kept while you edit." },
        ],
    }))
    .unwrap_or_default()
}

fn contact_schema() -> SectionSchema {
    SectionSchema::new(CONTACT, "Contact", "mail").group(
        FieldGroup::new("details", "Contact details")
            .field(
                FieldDescriptor::new("email", FieldKind::ShortText, "email", "Email")
                    .placeholder("hello@example.com")
                    .required()
                    .rule(Rule::Email),
            )
            .field(
                FieldDescriptor::new("phone", FieldKind::ShortText, "phone", "Phone")
                    .rule(Rule::MinLength(6))
                    .rule(Rule::MaxLength(24)),
            )
            .field(
                FieldDescriptor::new("website", FieldKind::ShortText, "website", "Website")
                    .rule(Rule::Url),
            )
            .field(
                FieldDescriptor::new("address", FieldKind::RichText, "address", "Address")
                    .describe("Postal address shown in the footer"),
            )
            .field(FieldDescriptor::new(
                "showMap",
                FieldKind::Boolean,
                "map.visible",
                "Show map",
            )),
    )
}

fn contact_defaults() -> ContentTree {
    ContentTree::from_json(json!({
        "email": "hello@example.com",
        "phone": "+1 555 0100",
        "website": "https://example.com",
        "address": "1 Harbour Street, Springfield",
        "map": { "visible": false },
    }))
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::ValidationReport;

    #[test]
    fn builtin_sections_register() {
        let registry = builtin_registry().expect("valid built-ins");
        let ids: Vec<&str> = registry.section_ids().collect();
        assert_eq!(ids, [CONTACT, FEATURES, HERO]);
    }

    #[test]
    fn builtin_defaults_are_valid() {
        let registry = builtin();
        for schema in registry.schemas() {
            let defaults = registry.default_content(&schema.id);
            let report = ValidationReport::for_content(schema, &defaults);
            assert!(report.is_valid(), "{}: {report:?}", schema.id);
        }
    }

    #[test]
    fn autoplay_rejects_non_positive_values() {
        let schema = builtin().schema(HERO).expect("hero");
        let field = schema.field("autoplaySeconds").expect("autoplay");
        let messages = crate::domain::validation::validate(&ContentValue::text("0"), field);
        assert_eq!(
            messages,
            vec!["Autoplay interval must be greater than zero".to_string()]
        );
        let messages = crate::domain::validation::validate(&ContentValue::text("soon"), field);
        assert_eq!(messages, vec!["Autoplay interval must be a number".to_string()]);
    }
}
