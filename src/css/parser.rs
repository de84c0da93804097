//! CSS parsing and specificity calculation.
//!
//! Turns a stylesheet text blob into a [`Stylesheet`]. Parsing is
//! infallible from the caller's standpoint: malformed rules and
//! declarations are dropped silently so that one bad fragment never
//! costs the rest of a real-world stylesheet.
//!
//! Rule structure is scanned with cssparser; selector and declaration
//! text is recovered verbatim from source slices, because the resolver
//! re-emits values exactly as written rather than interpreting them.
//! Block-form at-rules (`@media`, `@keyframes`, `@font-face`, ...) are
//! not lifted into a structured tree: each becomes a single flat rule
//! whose selector is the at-rule header, which the inliner detects
//! textually when deciding what to preserve.

use cssparser::{
    AtRuleParser, AtRuleType, CowRcStr, ParseError, Parser, ParserInput, QualifiedRuleParser,
    RuleListParser, SourceLocation,
};
use regex_lite::Regex;

use super::types::{Declaration, Rule, Specificity, StyleMap, Stylesheet};

/// Statement-level at-rules that are dropped entirely during parsing.
const DROPPED_AT_RULES: &[&str] = &["import", "charset", "namespace"];

/// Pseudo-class keywords that must not be counted as element names.
const PSEUDO_CLASS_KEYWORDS: &[&str] = &[
    "hover",
    "focus",
    "active",
    "visited",
    "link",
    "first-child",
    "last-child",
    "nth-child",
    "nth-of-type",
    "not",
];

/// Media-query keywords that must not be counted as element names.
const MEDIA_KEYWORDS: &[&str] = &["and", "or", "not", "only", "all", "screen", "print"];

/// CSS parser with pre-compiled token regexes.
pub struct CssParser {
    comment_re: Regex,
    important_re: Regex,
    id_re: Regex,
    class_re: Regex,
    attr_re: Regex,
    pseudo_class_re: Regex,
    pseudo_element_re: Regex,
    identifier_re: Regex,
}

impl CssParser {
    pub fn new() -> Self {
        CssParser {
            comment_re: Regex::new(r"/\*[^*]*\*+([^/*][^*]*\*+)*/").unwrap(),
            important_re: Regex::new(r"(?i)!\s*important\s*$").unwrap(),
            id_re: Regex::new(r"#[a-zA-Z0-9_-]+").unwrap(),
            class_re: Regex::new(r"\.[a-zA-Z0-9_-]+").unwrap(),
            attr_re: Regex::new(r"\[[^\]]*\]").unwrap(),
            pseudo_class_re: Regex::new(r":[a-zA-Z0-9_-]+").unwrap(),
            pseudo_element_re: Regex::new(r"::[a-zA-Z0-9_-]+").unwrap(),
            identifier_re: Regex::new(r"[a-zA-Z][a-zA-Z0-9_-]*").unwrap(),
        }
    }

    /// Parse a CSS stylesheet from a string.
    pub fn parse(&self, css: &str) -> Stylesheet {
        let css = self.comment_re.replace_all(css, "");
        let mut input = ParserInput::new(&css);
        let mut parser = Parser::new(&mut input);
        let mut rules = Vec::new();

        let scanner = RuleScanner {
            parser: self,
            rules: &mut rules,
        };

        for result in RuleListParser::new_for_stylesheet(&mut parser, scanner) {
            // Malformed fragments come back as errors; valid rules have
            // already been collected by the scanner.
            let _ = result;
        }

        Stylesheet { rules }
    }

    /// Parse an inline style attribute (`style="..."`) into declarations.
    ///
    /// Inline declarations enter the cascade at specificity
    /// [`Specificity::from_inline`].
    pub fn parse_inline_style(&self, style_attr: &str) -> StyleMap {
        self.parse_declarations(style_attr)
    }

    /// Parse a declaration block body (`property: value; ...`).
    ///
    /// Splitting is quote-aware, so `;` and `:` inside string values do
    /// not act as delimiters. A declaration with a missing colon, empty
    /// property, or empty value is dropped without affecting its
    /// siblings.
    fn parse_declarations(&self, text: &str) -> StyleMap {
        let mut declarations = StyleMap::new();

        for part in smart_split(text, ';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let colon = match find_unquoted(part, ':') {
                Some(index) => index,
                None => continue,
            };

            let property = part[..colon].trim().to_ascii_lowercase();
            let mut value = part[colon + 1..].trim().to_string();
            if property.is_empty() || value.is_empty() {
                continue;
            }

            let important = self.important_re.is_match(&value);
            if important {
                value = self.important_re.replace(&value, "").trim_end().to_string();
                if value.is_empty() {
                    continue;
                }
            }

            // Later duplicate wins within the block.
            declarations.insert(
                property.clone(),
                Declaration {
                    property,
                    value,
                    important,
                },
            );
        }

        declarations
    }

    /// Calculate the specificity of a single selector group.
    ///
    /// This is token counting, not a full selector parse: ids, classes,
    /// attribute groups, and pseudo-classes are counted by pattern, and
    /// whatever identifiers remain after stripping those tokens are
    /// counted as element names (minus pseudo-class and media-query
    /// keywords). It agrees with CSS on simple selectors and plain
    /// combinators; selector arguments like `:not(.x)` are scored at
    /// class level rather than recursed into.
    pub fn specificity(&self, selector: &str) -> Specificity {
        let ids = self.id_re.find_iter(selector).count() as u32;

        let mut classes = self.class_re.find_iter(selector).count() as u32
            + self.attr_re.find_iter(selector).count() as u32;
        // Count single-colon pseudo-classes only: strip `::name` first so
        // pseudo-elements are not double-counted.
        let without_pseudo_elements = self.pseudo_element_re.replace_all(selector, " ");
        classes += self.pseudo_class_re.find_iter(&without_pseudo_elements).count() as u32;

        let mut elements = self.pseudo_element_re.find_iter(selector).count() as u32;
        let mut stripped = self.attr_re.replace_all(selector, " ").into_owned();
        stripped = self.pseudo_element_re.replace_all(&stripped, " ").into_owned();
        stripped = self.pseudo_class_re.replace_all(&stripped, " ").into_owned();
        stripped = self.class_re.replace_all(&stripped, " ").into_owned();
        stripped = self.id_re.replace_all(&stripped, " ").into_owned();
        for identifier in self.identifier_re.find_iter(&stripped) {
            let name = identifier.as_str().to_ascii_lowercase();
            if !PSEUDO_CLASS_KEYWORDS.contains(&name.as_str())
                && !MEDIA_KEYWORDS.contains(&name.as_str())
            {
                elements += 1;
            }
        }

        Specificity {
            inline: 0,
            ids,
            classes,
            elements,
            important: false,
        }
    }
}

impl Default for CssParser {
    fn default() -> Self {
        CssParser::new()
    }
}

// =============================================================================
// Rule scanning
// =============================================================================

struct RuleScanner<'a> {
    parser: &'a CssParser,
    rules: &'a mut Vec<Rule>,
}

impl RuleScanner<'_> {
    /// Record one `selector { declarations }` pair. The selector list is
    /// split on (unquoted) commas; each group becomes its own rule with
    /// its own specificity, sharing the declaration block.
    fn push_rule(&mut self, prelude: &str, body: &str) {
        let declarations = self.parser.parse_declarations(body);
        if declarations.is_empty() {
            return;
        }

        for group in smart_split(prelude, ',') {
            let selector = group.trim();
            if selector.is_empty() {
                continue;
            }
            self.rules.push(Rule {
                selector: selector.to_string(),
                specificity: self.parser.specificity(selector),
                declarations: declarations.clone(),
                source_order: self.rules.len(),
            });
        }
    }

    /// Record a block at-rule as a single flat rule. The header becomes
    /// the selector (it will never compile, so it never matches an
    /// element) and the raw block body is scanned as a declaration list.
    fn push_at_rule(&mut self, selector: String, body: &str) {
        let declarations = self.parser.parse_declarations(body);
        if declarations.is_empty() {
            return;
        }
        self.rules.push(Rule {
            specificity: self.parser.specificity(&selector),
            selector,
            declarations,
            source_order: self.rules.len(),
        });
    }
}

impl<'i> QualifiedRuleParser<'i> for RuleScanner<'_> {
    type Prelude = String;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        // Keep the verbatim selector text.
        let start = input.position();
        while input.next().is_ok() {}
        Ok(input.slice_from(start).to_string())
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _location: SourceLocation,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        let body = input.slice_from(start).to_string();
        self.push_rule(&prelude, &body);
        Ok(())
    }
}

impl<'i> AtRuleParser<'i> for RuleScanner<'_> {
    type PreludeNoBlock = ();
    type PreludeBlock = String;
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<AtRuleType<Self::PreludeNoBlock, Self::PreludeBlock>, ParseError<'i, Self::Error>>
    {
        let start = input.position();
        while input.next().is_ok() {}
        let prelude = input.slice_from(start);

        if DROPPED_AT_RULES.contains(&name.to_ascii_lowercase().as_str()) {
            return Ok(AtRuleType::WithoutBlock(()));
        }

        let header = format!("@{} {}", name, prelude.trim());
        Ok(AtRuleType::WithBlock(header.trim_end().to_string()))
    }

    fn rule_without_block(&mut self, _prelude: Self::PreludeNoBlock, _location: SourceLocation) {
        // @import / @charset / @namespace: consumed and dropped.
    }

    fn parse_block<'t>(
        &mut self,
        header: Self::PreludeBlock,
        _location: SourceLocation,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        let body = input.slice_from(start).to_string();
        self.push_at_rule(header, &body);
        Ok(())
    }
}

// =============================================================================
// Quote-aware text scanning
// =============================================================================

/// Split `text` on `delimiter`, ignoring delimiters inside single- or
/// double-quoted strings.
fn smart_split(text: &str, delimiter: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in text.chars() {
        match quote {
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            Some(q) if ch == q => {
                quote = None;
                current.push(ch);
            }
            None if ch == delimiter => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

/// Byte index of the first `needle` outside quoted strings.
fn find_unquoted(text: &str, needle: char) -> Option<usize> {
    let mut quote: Option<char> = None;

    for (index, ch) in text.char_indices() {
        match quote {
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            Some(q) if ch == q => quote = None,
            None if ch == needle => return Some(index),
            _ => {}
        }
    }
    None
}
