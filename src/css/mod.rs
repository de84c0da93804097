//! CSS model and parsing.
//!
//! [`types`] holds the immutable value types (specificity, declarations,
//! rules, stylesheets); [`parser`] turns stylesheet text into them.

pub mod parser;
pub mod types;

pub use parser::CssParser;
pub use types::{Declaration, Rule, Specificity, StyleMap, Stylesheet};
