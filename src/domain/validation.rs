//! Field validation.
//!
//! Validation is pure: a value and its descriptor go in, an ordered list of
//! human-readable violations comes out. Every rule is evaluated so a field can
//! report several problems at once.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::domain::content::{ContentTree, ContentValue};
use crate::domain::schema::{FieldDescriptor, Rule, SectionSchema};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// Base used to resolve root-relative links such as `/contact`.
const RELATIVE_URL_BASE: &str = "http://localhost/";

/// Validate `value` against `field`.
///
/// Length, format and numeric rules are skipped for blank values, so an
/// optional empty field passes them and a required empty field reports the
/// missing value rather than its shape. Predicates always run.
pub fn validate(value: &ContentValue, field: &FieldDescriptor) -> Vec<String> {
    let blank = value.is_blank();
    let mut messages = Vec::new();

    let declares_required = field
        .rules
        .iter()
        .any(|rule| matches!(rule, Rule::Required));
    if field.required && !declares_required && blank {
        messages.push(required_message(field));
    }

    for rule in &field.rules {
        if blank && !matches!(rule, Rule::Required | Rule::Predicate(_)) {
            continue;
        }

        match rule {
            Rule::Required => {
                if blank {
                    messages.push(required_message(field));
                }
            }
            Rule::MinLength(min) => {
                if measure(value) < *min {
                    messages.push(format!(
                        "{} must be at least {min} {}",
                        field.label,
                        unit(value)
                    ));
                }
            }
            Rule::MaxLength(max) => {
                if measure(value) > *max {
                    messages.push(format!(
                        "{} must be at most {max} {}",
                        field.label,
                        unit(value)
                    ));
                }
            }
            Rule::Email => {
                if !value.as_str().is_some_and(|text| EMAIL_PATTERN.is_match(text.trim())) {
                    messages.push(format!("{} must be a valid email address", field.label));
                }
            }
            Rule::Url => {
                if !value.as_str().is_some_and(is_url) {
                    messages.push(format!("{} must be a valid URL", field.label));
                }
            }
            Rule::Numeric => {
                if !is_numeric(value) {
                    messages.push(format!("{} must be a number", field.label));
                }
            }
            Rule::Predicate(predicate) => {
                if !(predicate.check)(value) {
                    messages.push(predicate.message.to_string());
                }
            }
        }
    }

    messages
}

fn required_message(field: &FieldDescriptor) -> String {
    format!("{} is required", field.label)
}

fn measure(value: &ContentValue) -> usize {
    match value {
        ContentValue::List(items) => items.len(),
        other => other.display_text().chars().count(),
    }
}

fn unit(value: &ContentValue) -> &'static str {
    match value {
        ContentValue::List(_) => "items",
        _ => "characters",
    }
}

fn is_url(text: &str) -> bool {
    let text = text.trim();
    if text.starts_with('/') {
        return Url::parse(RELATIVE_URL_BASE)
            .and_then(|base| base.join(text))
            .is_ok();
    }
    Url::parse(text).is_ok()
}

/// Numbers pass; text passes when it parses as a finite float.
pub fn is_numeric(value: &ContentValue) -> bool {
    match value {
        ContentValue::Number(_) => true,
        ContentValue::Text(text) => text
            .trim()
            .parse::<f64>()
            .is_ok_and(|number| number.is_finite()),
        _ => false,
    }
}

/// Violations per field id. Absent fields are valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate every field of `schema` against `content`.
    pub fn for_content(schema: &SectionSchema, content: &ContentTree) -> Self {
        let mut report = Self::new();
        for field in schema.fields() {
            report.record(&field.id, validate(&field.value_in(content), field));
        }
        report
    }

    /// Replace the violations for one field.
    pub fn record(&mut self, field_id: &str, messages: Vec<String>) {
        if messages.is_empty() {
            self.errors.remove(field_id);
        } else {
            self.errors.insert(field_id.to_string(), messages);
        }
    }

    pub fn errors(&self, field_id: &str) -> &[String] {
        self.errors.get(field_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn invalid_fields(&self) -> Vec<String> {
        self.errors.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::schema::FieldKind;

    fn text_field(rules: Vec<Rule>) -> FieldDescriptor {
        let mut field = FieldDescriptor::new("title", FieldKind::ShortText, "title", "Title");
        field.rules = rules;
        field
    }

    #[test]
    fn required_empty_string_always_violates() {
        let variants = [
            text_field(vec![]).required(),
            text_field(vec![Rule::Required]),
            text_field(vec![Rule::MinLength(3), Rule::Email]).required(),
            text_field(vec![Rule::Url, Rule::Required, Rule::MaxLength(2)]),
        ];
        for field in variants {
            let messages = validate(&ContentValue::empty_text(), &field);
            assert_eq!(messages, vec!["Title is required".to_string()], "{field:?}");
        }
    }

    #[test]
    fn optional_empty_field_has_no_violations() {
        let field = text_field(vec![Rule::MinLength(3), Rule::Email, Rule::Numeric]);
        assert!(validate(&ContentValue::empty_text(), &field).is_empty());
        assert!(validate(&ContentValue::Null, &field).is_empty());
    }

    #[test]
    fn all_rules_are_evaluated_in_order() {
        let field = text_field(vec![Rule::MinLength(10), Rule::Email, Rule::Numeric]);
        let messages = validate(&ContentValue::text("abc"), &field);
        assert_eq!(
            messages,
            vec![
                "Title must be at least 10 characters".to_string(),
                "Title must be a valid email address".to_string(),
                "Title must be a number".to_string(),
            ]
        );
    }

    #[test]
    fn length_counts_characters_and_list_items() {
        let field = text_field(vec![Rule::MaxLength(3)]);
        assert!(validate(&ContentValue::text("héé"), &field).is_empty());
        assert_eq!(validate(&ContentValue::text("four"), &field).len(), 1);

        let list = ContentValue::from(json!([{}, {}, {}, {}]));
        assert_eq!(
            validate(&list, &field),
            vec!["Title must be at most 3 items".to_string()]
        );
    }

    #[test]
    fn email_and_url_shapes() {
        let email = text_field(vec![Rule::Email]);
        assert!(validate(&ContentValue::text("ops@example.com"), &email).is_empty());
        assert!(!validate(&ContentValue::text("ops@example"), &email).is_empty());

        let url = text_field(vec![Rule::Url]);
        assert!(validate(&ContentValue::text("https://example.com/a"), &url).is_empty());
        assert!(validate(&ContentValue::text("/contact"), &url).is_empty());
        assert!(!validate(&ContentValue::text("not a url"), &url).is_empty());
    }

    #[test]
    fn numeric_coercion() {
        assert!(is_numeric(&ContentValue::text(" 42.5 ")));
        assert!(is_numeric(&ContentValue::number(3.0)));
        assert!(!is_numeric(&ContentValue::text("NaN")));
        assert!(!is_numeric(&ContentValue::Bool(true)));
    }

    #[test]
    fn predicate_rule_reports_its_message() {
        let field = text_field(vec![Rule::predicate("Title must not shout", |value| {
            value
                .as_str()
                .is_none_or(|text| text != text.to_uppercase())
        })]);
        assert_eq!(
            validate(&ContentValue::text("HELLO"), &field),
            vec!["Title must not shout".to_string()]
        );
        assert!(validate(&ContentValue::text("Hello"), &field).is_empty());
    }

    #[test]
    fn predicates_run_on_blank_values() {
        let never = Rule::predicate("Title is reserved", |_| false);
        let optional = text_field(vec![Rule::MinLength(3), never.clone()]);
        assert_eq!(
            validate(&ContentValue::empty_text(), &optional),
            vec!["Title is reserved".to_string()]
        );

        let required = text_field(vec![Rule::MinLength(3), never]).required();
        assert_eq!(
            validate(&ContentValue::empty_text(), &required),
            vec!["Title is required".to_string(), "Title is reserved".to_string()]
        );
    }

    #[test]
    fn report_drops_fields_that_become_valid() {
        let mut report = ValidationReport::new();
        report.record("title", vec!["Title is required".into()]);
        assert!(!report.is_valid());
        assert_eq!(report.invalid_fields(), vec!["title".to_string()]);

        report.record("title", Vec::new());
        assert!(report.is_valid());
        assert!(report.errors("title").is_empty());
    }
}
