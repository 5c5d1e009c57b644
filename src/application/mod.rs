//! Application layer: the editing session and its collaborators.

pub mod editor;
pub mod error;
pub mod form;
pub mod gateway;
pub mod history;
pub mod preview;
pub mod timers;
