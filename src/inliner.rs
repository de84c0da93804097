//! The inlining driver.
//!
//! Walks a document, resolves the cascade for every element, writes the
//! computed styles back as `style` attributes, and partitions the
//! original rules into the inlined set and the set that must stay in a
//! `<style>` block (media queries, pseudo-state rules, at-rules).
//! Per-element failures are isolated; one bad element never aborts the
//! document.

use std::fmt;
use std::time::Instant;

use kuchiki::NodeRef;

use crate::config::Config;
use crate::css::{CssParser, Rule, Stylesheet};
use crate::dom;
use crate::error::Result;
use crate::resolver::{self, Resolver, Severity, ValidationWarning};

/// The result of one inlining operation.
#[derive(Debug, Clone)]
pub struct InlineResult {
    /// Final HTML with inlined styles.
    pub html: String,
    /// Cumulative count of declarations written across elements.
    pub inlined_styles: usize,
    /// Number of CSS rules kept in `<style>` tags.
    pub preserved_rules: usize,
    /// Compatibility warnings collected while resolving.
    pub warnings: Vec<ValidationWarning>,
    pub stats: ProcessingStats,
}

/// Performance and processing metrics from one inlining run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessingStats {
    pub css_rules_parsed: usize,
    pub html_elements_processed: usize,
    pub selectors_matched: usize,
    pub processing_time_ms: u64,
}

/// Category of a document-level validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    Structure,
    Css,
    Attribute,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueType::Structure => write!(f, "structure"),
            IssueType::Css => write!(f, "css"),
            IssueType::Attribute => write!(f, "attribute"),
        }
    }
}

/// An email compatibility issue found by [`Inliner::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub issue_type: IssueType,
    pub severity: Severity,
    pub message: String,
    pub element: String,
    pub property: Option<String>,
}

/// The CSS inlining engine for email HTML.
pub struct Inliner {
    config: Config,
    parser: CssParser,
}

impl Inliner {
    pub fn new(config: Config) -> Self {
        Inliner {
            config,
            parser: CssParser::new(),
        }
    }

    /// An inliner with email-optimized defaults.
    pub fn with_defaults() -> Self {
        Inliner::new(Config::default())
    }

    /// Inline the embedded CSS of an HTML document.
    pub fn inline(&self, html: &str) -> Result<InlineResult> {
        let start = Instant::now();

        let document = dom::parse_html(html);
        let css_text = extract_css(&document);
        let stylesheet = self.parser.parse(&css_text);
        let resolver = Resolver::new(&stylesheet, &self.config);

        let mut warnings = Vec::new();
        let mut inlined_styles = 0;
        let mut elements_processed = 0;
        let mut selectors_matched = 0;

        for element in dom::elements(&document) {
            if should_skip_element(&dom::tag_name(&element)) {
                continue;
            }
            elements_processed += 1;

            let resolution = resolver.resolve(&element);
            selectors_matched += resolution.matched_rules;
            warnings.extend(resolution.warnings);
            if resolution.styles.is_empty() {
                continue;
            }

            let existing = match dom::style_attribute(&element) {
                Some(attr) => self.parser.parse_inline_style(&attr),
                None => Default::default(),
            };
            let merged = resolver::merge(&existing, &resolution.styles);
            inlined_styles += merged.len();
            dom::set_style_attribute(&element, &resolver::styles_string(&merged));
        }

        let preserved_rules = self.partition_style_tags(&document, &stylesheet);
        let html = dom::serialize_html(&document)?;

        Ok(InlineResult {
            html,
            inlined_styles,
            preserved_rules,
            warnings,
            stats: ProcessingStats {
                css_rules_parsed: stylesheet.rules.len(),
                html_elements_processed: elements_processed,
                selectors_matched,
                processing_time_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    /// Keep the rules that cannot be inlined in the first `<style>` tag
    /// and drop every other tag. Returns the number of preserved rules.
    fn partition_style_tags(&self, document: &NodeRef, stylesheet: &Stylesheet) -> usize {
        let tags = dom::style_tags(document);

        if self.config.remove_style_tags {
            for tag in &tags {
                dom::remove(tag);
            }
            return 0;
        }

        let preserved: Vec<&Rule> = stylesheet
            .rules
            .iter()
            .filter(|rule| self.should_preserve(&rule.selector))
            .collect();

        if preserved.is_empty() {
            for tag in &tags {
                dom::remove(tag);
            }
            return 0;
        }

        let css: Vec<String> = preserved.iter().map(|rule| format_rule(rule)).collect();
        if let Some((first, rest)) = tags.split_first() {
            dom::set_text_content(first, &css.join("\n"));
            for tag in rest {
                dom::remove(tag);
            }
        }

        preserved.len()
    }

    fn should_preserve(&self, selector: &str) -> bool {
        (self.config.preserve_media_queries && selector.contains("@media"))
            || (self.config.preserve_pseudo_selectors && is_pseudo_selector(selector))
            || is_uninlinable(selector)
    }

    /// Validate a document for email compatibility without inlining.
    pub fn validate(&self, html: &str) -> Vec<ValidationIssue> {
        let document = dom::parse_html(html);
        let mut issues = validate_structure(&document);
        issues.extend(validate_embedded_css(&document));
        issues
    }
}

impl Default for Inliner {
    fn default() -> Self {
        Inliner::with_defaults()
    }
}

/// Concatenate the text of every `<style>` tag, newline-separated.
fn extract_css(document: &NodeRef) -> String {
    let mut css = String::new();

    for tag in dom::style_tags(document) {
        let content = tag.as_node().text_contents();
        if !content.is_empty() {
            css.push_str(&content);
            css.push('\n');
        }
    }

    css
}

/// Elements that never carry visual styles.
fn should_skip_element(tag_name: &str) -> bool {
    matches!(
        tag_name,
        "html" | "head" | "title" | "meta" | "link" | "script" | "style" | "noscript" | "base"
    )
}

/// Whether a selector depends on interaction or generated-content state
/// that cannot be expressed as an inline style.
fn is_pseudo_selector(selector: &str) -> bool {
    selector.contains(':')
        && (selector.contains(":hover")
            || selector.contains(":focus")
            || selector.contains(":active")
            || selector.contains(":visited")
            || selector.contains("::before")
            || selector.contains("::after"))
}

/// At-rules that must stay in a `<style>` block.
fn is_uninlinable(selector: &str) -> bool {
    selector.contains("@keyframes")
        || selector.contains("@font-face")
        || selector.contains("@import")
        || selector.contains("@charset")
}

/// Re-emit a rule as CSS text from its parsed declarations.
fn format_rule(rule: &Rule) -> String {
    let declarations: Vec<String> = rule
        .declarations
        .values()
        .map(|declaration| {
            if declaration.important {
                format!("  {}: {} !important", declaration.property, declaration.value)
            } else {
                format!("  {}: {}", declaration.property, declaration.value)
            }
        })
        .collect();

    format!("{} {{\n{};\n}}", rule.selector, declarations.join(";\n"))
}

fn validate_structure(document: &NodeRef) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let has_table = document
        .select("body table")
        .map(|mut selection| selection.next().is_some())
        .unwrap_or(false);
    if !has_table {
        issues.push(ValidationIssue {
            issue_type: IssueType::Structure,
            severity: Severity::Warning,
            message: "emails should use table-based layout for better client compatibility"
                .to_string(),
            element: "body".to_string(),
            property: None,
        });
    }

    issues
}

fn validate_embedded_css(document: &NodeRef) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for tag in dom::style_tags(document) {
        let content = tag.as_node().text_contents();
        if content.contains("position:") && content.contains("fixed") {
            issues.push(ValidationIssue {
                issue_type: IssueType::Css,
                severity: Severity::Error,
                message: "position: fixed is not supported in email clients".to_string(),
                element: "style".to_string(),
                property: Some("position".to_string()),
            });
        }
    }

    issues
}
