use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("no schema registered for section `{section}`")]
    UnknownSection { section: String },
    #[error("field `{field}` is not defined by the `{section}` schema")]
    UnknownField { section: String, field: String },
    #[error("group `{group}` is not defined by the `{section}` schema")]
    UnknownGroup { section: String, group: String },
    #[error("field `{field}` is not an ordered list")]
    NotAList { field: String },
    #[error("field `{field}` has no item at index {index} (length {len})")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },
    #[error("field `{field}` expects a {kind} value")]
    ShapeMismatch { field: String, kind: String },
    #[error("field `{field}` uses unsupported type `{kind}`")]
    UnsupportedField { field: String, kind: String },
    #[error("schema invariant violated: {message}")]
    Invariant { message: String },
}

impl DomainError {
    pub fn unknown_section(section: impl Into<String>) -> Self {
        Self::UnknownSection {
            section: section.into(),
        }
    }

    pub fn unknown_field(section: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            section: section.into(),
            field: field.into(),
        }
    }

    pub fn unknown_group(section: impl Into<String>, group: impl Into<String>) -> Self {
        Self::UnknownGroup {
            section: section.into(),
            group: group.into(),
        }
    }

    pub fn not_a_list(field: impl Into<String>) -> Self {
        Self::NotAList {
            field: field.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }
}
