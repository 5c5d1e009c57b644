//! Domain layer: content trees, field schemas and validation.

pub mod content;
pub mod error;
pub mod schema;
pub mod sections;
pub mod site;
pub mod validation;
