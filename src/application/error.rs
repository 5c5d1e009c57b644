use std::error::Error as StdError;

use thiserror::Error;

use crate::{config::LoadError, domain::error::DomainError, infra::error::InfraError};

/// Flattened error chain for reporting to an operator.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    pub fn from_message(source: &'static str, message: impl Into<String>) -> Self {
        Self {
            source,
            messages: vec![message.into()],
        }
    }

    /// Messages joined outermost first.
    pub fn summary(&self) -> String {
        self.messages.join(": ")
    }
}

/// Failure reading or writing one storage slot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read `{slot}`")]
    Read {
        slot: &'static str,
        #[source]
        source: InfraError,
    },
    #[error("failed to write `{slot}`")]
    Write {
        slot: &'static str,
        #[source]
        source: InfraError,
    },
    #[error("failed to serialize `{slot}`")]
    Serialize {
        slot: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    pub fn slot(&self) -> &'static str {
        match self {
            Self::Read { slot, .. } | Self::Write { slot, .. } | Self::Serialize { slot, .. } => {
                *slot
            }
        }
    }
}

/// What editor operations report back to their caller.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("content has validation errors in: {}", invalid_fields.join(", "))]
    PublishBlocked { invalid_fields: Vec<String> },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the operator binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Infra(InfraError::Configuration { .. }) => 78,
            AppError::Domain(_) | AppError::Validation(_) => 65,
            AppError::Editor(EditorError::PublishBlocked { .. }) => 65,
            AppError::Editor(EditorError::Domain(_)) => 65,
            AppError::Persistence(_) | AppError::Editor(EditorError::Persistence(_)) => 74,
            AppError::Infra(InfraError::Io(_) | InfraError::Storage { .. }) => 74,
            AppError::Infra(InfraError::Telemetry(_)) | AppError::Unexpected(_) => 70,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_walks_source_chain() {
        let error = PersistenceError::Write {
            slot: "site-content",
            source: InfraError::storage("disk full"),
        };
        let report = ErrorReport::from_error("test", &error);
        assert_eq!(
            report.messages,
            vec![
                "failed to write `site-content`".to_string(),
                "storage error: disk full".to_string()
            ]
        );
        assert_eq!(
            report.summary(),
            "failed to write `site-content`: storage error: disk full"
        );
    }

    #[test]
    fn publish_blocked_lists_fields() {
        let error = EditorError::PublishBlocked {
            invalid_fields: vec!["email".into(), "phone".into()],
        };
        assert_eq!(
            error.to_string(),
            "content has validation errors in: email, phone"
        );
        assert_eq!(AppError::from(error).exit_code(), 65);
    }
}
