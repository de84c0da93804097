//! CSS cascade resolution.
//!
//! Given a parsed stylesheet and one element, the resolver picks the
//! winning declaration for every property the way a browser would:
//! `!important` beats normal, higher specificity beats lower, and later
//! source order breaks ties, with the element's own inline styles
//! entering at specificity (1000,0,0,0) behind every stylesheet rule.
//! On top of the cascade sits the email policy layer: property filtering
//! for the target client and compatibility warnings.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use kuchiki::{ElementData, NodeDataRef, Selectors};

use crate::config::Config;
use crate::css::{CssParser, Declaration, Rule, Specificity, StyleMap, Stylesheet};
use crate::dom;
use crate::policy::{compatibility_profile, is_email_safe_property, CompatibilityProfile};

/// Severity of a compatibility finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A potential problem with computed styles on the target client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub property: String,
    pub value: String,
    pub message: String,
    pub severity: Severity,
}

/// A property whose value differs between two style maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictInfo {
    pub existing_value: String,
    pub existing_important: bool,
    pub new_value: String,
    pub new_important: bool,
    /// Whether the new declaration would win a [`merge`].
    pub new_wins: bool,
}

/// The resolver's output for one element.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Final property-to-declaration mapping, post policy filtering.
    pub styles: StyleMap,
    /// Compatibility warnings, computed on the unfiltered cascade output
    /// so that filtered-out properties still report.
    pub warnings: Vec<ValidationWarning>,
    /// Number of stylesheet rules that matched the element.
    pub matched_rules: usize,
}

/// Cascade bookkeeping for the current winner of one property.
#[derive(Debug, Clone, Copy)]
struct CascadeEntry {
    specificity: Specificity,
    source_order: usize,
    important: bool,
}

impl CascadeEntry {
    /// Whether this entry replaces the current winner.
    fn replaces(&self, current: &CascadeEntry) -> bool {
        if self.important != current.important {
            return self.important;
        }
        match self.specificity.cmp(&current.specificity) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.source_order >= current.source_order,
        }
    }
}

/// Resolves final styles for elements against one stylesheet.
pub struct Resolver<'a> {
    stylesheet: &'a Stylesheet,
    config: &'a Config,
    profile: CompatibilityProfile,
    parser: CssParser,
    /// Selectors compiled once per rule; `None` for selectors the DOM
    /// cannot evaluate (their rules are skipped, never fatal).
    compiled: Vec<Option<Selectors>>,
}

impl<'a> Resolver<'a> {
    pub fn new(stylesheet: &'a Stylesheet, config: &'a Config) -> Self {
        let compiled = stylesheet
            .rules
            .iter()
            .map(|rule| dom::compile_selector(&rule.selector))
            .collect();

        Resolver {
            stylesheet,
            config,
            profile: compatibility_profile(&config.target_email_client),
            parser: CssParser::new(),
            compiled,
        }
    }

    /// Compute the final styles for an element following the CSS cascade,
    /// then apply email-client filtering and collect warnings.
    pub fn resolve(&self, element: &NodeDataRef<ElementData>) -> Resolution {
        let candidates = self.matching_rules(element);
        let matched_rules = candidates.len();

        let inline_styles = match dom::style_attribute(element) {
            Some(attr) => self.parser.parse_inline_style(&attr),
            None => StyleMap::new(),
        };

        let winners = apply_cascade(&candidates, &inline_styles);
        let warnings = self.validate(&winners);
        let styles = if self.config.email_client_optimizations {
            self.filter_email_safe(winners)
        } else {
            winners
        };

        Resolution {
            styles,
            warnings,
            matched_rules,
        }
    }

    /// Stylesheet rules whose selector matches the element, in source
    /// order.
    fn matching_rules(&self, element: &NodeDataRef<ElementData>) -> Vec<&Rule> {
        self.stylesheet
            .rules
            .iter()
            .zip(&self.compiled)
            .filter_map(|(rule, selectors)| match selectors {
                Some(selectors) if selectors.matches(element) => Some(rule),
                _ => None,
            })
            .collect()
    }

    /// Drop properties the target email client cannot render.
    fn filter_email_safe(&self, styles: StyleMap) -> StyleMap {
        let mut filtered = StyleMap::new();

        for (property, declaration) in styles {
            let keep = if is_email_safe_property(&property) {
                true
            } else {
                match property.as_str() {
                    // Positioning only survives on permissive clients.
                    "position" => !self.profile.requires_inline_styles,
                    // Float works in most clients, but not in Outlook.
                    "float" => self.config.target_email_client != "outlook",
                    "display" => matches!(
                        declaration.value.as_str(),
                        "block" | "inline" | "table" | "table-cell"
                    ),
                    _ => !self.profile.requires_inline_styles,
                }
            };
            if keep {
                filtered.insert(property, declaration);
            }
        }

        filtered
    }

    /// Check computed styles for email compatibility problems.
    ///
    /// Warnings are data, not errors; they never stop the pipeline.
    pub fn validate(&self, styles: &StyleMap) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        for (property, declaration) in styles {
            match property.as_str() {
                "background-image" => {
                    if declaration.value.contains("url(")
                        && self.config.target_email_client == "outlook"
                    {
                        warnings.push(ValidationWarning {
                            property: property.clone(),
                            value: declaration.value.clone(),
                            message: "background images may not render in Outlook desktop"
                                .to_string(),
                            severity: Severity::Warning,
                        });
                    }
                }
                "width" | "height" => {
                    if declaration.value.contains("vw") || declaration.value.contains("vh") {
                        warnings.push(ValidationWarning {
                            property: property.clone(),
                            value: declaration.value.clone(),
                            message: "viewport units are not supported in email clients"
                                .to_string(),
                            severity: Severity::Error,
                        });
                    }
                }
                "position" => {
                    if declaration.value != "static" && self.profile.requires_inline_styles {
                        warnings.push(ValidationWarning {
                            property: property.clone(),
                            value: declaration.value.clone(),
                            message: "positioning is not supported in this email client"
                                .to_string(),
                            severity: Severity::Warning,
                        });
                    }
                }
                _ => {}
            }

            if !is_email_safe_property(property) {
                warnings.push(ValidationWarning {
                    property: property.clone(),
                    value: declaration.value.clone(),
                    message: "property may not be supported across all email clients".to_string(),
                    severity: Severity::Info,
                });
            }
        }

        warnings
    }
}

/// Build the winning declaration per property from the matching rules,
/// then fold in the element's existing inline declarations at inline
/// specificity with a source order behind every stylesheet rule.
fn apply_cascade(candidates: &[&Rule], inline_styles: &StyleMap) -> StyleMap {
    let mut winners: BTreeMap<String, (Declaration, CascadeEntry)> = BTreeMap::new();

    for rule in candidates {
        for (property, declaration) in &rule.declarations {
            let entry = CascadeEntry {
                specificity: rule.specificity,
                source_order: rule.source_order,
                important: declaration.important,
            };
            consider(&mut winners, property, declaration, entry);
        }
    }

    for (property, declaration) in inline_styles {
        let entry = CascadeEntry {
            specificity: Specificity::from_inline(declaration.important),
            source_order: usize::MAX,
            important: declaration.important,
        };
        consider(&mut winners, property, declaration, entry);
    }

    winners
        .into_iter()
        .map(|(property, (declaration, _))| (property, declaration))
        .collect()
}

fn consider(
    winners: &mut BTreeMap<String, (Declaration, CascadeEntry)>,
    property: &str,
    declaration: &Declaration,
    entry: CascadeEntry,
) {
    match winners.get(property) {
        Some((_, current)) if !entry.replaces(current) => {}
        _ => {
            winners.insert(property.to_string(), (declaration.clone(), entry));
        }
    }
}

/// Merge newly computed styles over existing inline styles.
///
/// New declarations win unless the existing one is `!important` and the
/// new one is not. Total and idempotent: merging the same map twice
/// yields the same result.
pub fn merge(existing: &StyleMap, new_styles: &StyleMap) -> StyleMap {
    let mut merged = existing.clone();

    for (property, new_declaration) in new_styles {
        match merged.get(property) {
            Some(current) if current.important && !new_declaration.important => {}
            _ => {
                merged.insert(property.clone(), new_declaration.clone());
            }
        }
    }

    merged
}

/// Properties that differ between two style maps, with the merge winner.
pub fn conflicting_properties(
    existing: &StyleMap,
    new_styles: &StyleMap,
) -> BTreeMap<String, ConflictInfo> {
    let mut conflicts = BTreeMap::new();

    for (property, new_declaration) in new_styles {
        if let Some(existing_declaration) = existing.get(property) {
            if existing_declaration.value != new_declaration.value
                || existing_declaration.important != new_declaration.important
            {
                conflicts.insert(
                    property.clone(),
                    ConflictInfo {
                        existing_value: existing_declaration.value.clone(),
                        existing_important: existing_declaration.important,
                        new_value: new_declaration.value.clone(),
                        new_important: new_declaration.important,
                        new_wins: !(existing_declaration.important && !new_declaration.important),
                    },
                );
            }
        }
    }

    conflicts
}

/// Serialize a style map as a `style` attribute value.
///
/// Properties are emitted in lexicographic order for deterministic
/// output; the empty map serializes to the empty string.
pub fn styles_string(styles: &StyleMap) -> String {
    let mut parts = Vec::with_capacity(styles.len());

    for declaration in styles.values() {
        if declaration.important {
            parts.push(format!(
                "{}: {} !important",
                declaration.property, declaration.value
            ));
        } else {
            parts.push(format!("{}: {}", declaration.property, declaration.value));
        }
    }

    parts.join("; ")
}
