//! Content extraction module
//!
//! This module turns persisted rendered HTML into selector-scoped plain text.

pub mod convert;
pub mod selector;

pub use convert::{ExtractedText, TextConverter};
pub use selector::{SelectorSpec, DEFAULT_WRAPPER_ID};
