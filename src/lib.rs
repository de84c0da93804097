//! # premail
//!
//! A fast CSS inliner for email HTML.
//!
//! Email clients (most famously desktop Outlook, which renders with a
//! word-processor engine) strip or ignore stylesheet CSS. Reliable
//! cross-client rendering requires every visual property to live on the
//! element itself. premail parses a document's embedded stylesheets,
//! computes the cascaded value of every property for every element
//! (specificity, `!important`, source order, inline priority), writes
//! the results into each element's `style` attribute, and keeps only
//! the rules that cannot be inlined (media queries, pseudo-state rules,
//! at-rules) in a `<style>` block.
//!
//! ## Quick Start
//!
//! ```
//! let html = "<html><head><style>p { color: red }</style></head>\
//!             <body><p>Hello</p></body></html>";
//! let inlined = premail::inline(html).unwrap();
//! assert!(inlined.contains(r#"<p style="color: red">"#));
//! ```
//!
//! ## Targeting a client
//!
//! ```
//! use premail::{Config, Inliner};
//!
//! let config = Config {
//!     target_email_client: "outlook".to_string(),
//!     ..Config::default()
//! };
//! let html = "<html><head><style>p { float: left; color: red }</style></head>\
//!             <body><p>x</p></body></html>";
//! let result = Inliner::new(config).inline(html).unwrap();
//! // `float` doesn't survive the Outlook policy filter.
//! assert!(result.html.contains(r#"<p style="color: red">"#));
//! assert!(!result.html.contains("float"));
//! ```

pub mod config;
pub mod css;
pub mod dom;
pub mod error;
pub mod inliner;
pub mod policy;
pub mod resolver;

pub use config::Config;
pub use css::{CssParser, Declaration, Rule, Specificity, StyleMap, Stylesheet};
pub use error::{Error, Result};
pub use inliner::{InlineResult, Inliner, IssueType, ProcessingStats, ValidationIssue};
pub use policy::{compatibility_profile, is_email_safe_property, CompatibilityProfile};
pub use resolver::{Severity, ValidationWarning};

/// Inline CSS with the default email-optimized configuration.
pub fn inline(html: &str) -> Result<String> {
    Inliner::with_defaults().inline(html).map(|result| result.html)
}

/// Inline CSS with a custom configuration.
pub fn inline_with_config(html: &str, config: Config) -> Result<String> {
    Inliner::new(config).inline(html).map(|result| result.html)
}
