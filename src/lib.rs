//! Schema-driven content editing: field schemas, validation, undo history,
//! debounced persistence and live preview targeting.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
