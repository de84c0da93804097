//! End-to-end inlining tests.
//!
//! Each test feeds a complete document through the engine and checks the
//! serialized output: which styles land on which elements, and what
//! survives in the `<style>` block.

use premail::{inline, inline_with_config, Config, Inliner, Severity};

fn outlook_config() -> Config {
    Config {
        target_email_client: "outlook".to_string(),
        ..Config::default()
    }
}

fn gmail_config() -> Config {
    Config {
        target_email_client: "gmail".to_string(),
        ..Config::default()
    }
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_basic_inline() {
    let html =
        "<html><head><style>p{color:red}</style></head><body><p>x</p></body></html>";
    let output = inline(html).unwrap();

    assert!(output.contains(r#"<p style="color: red">"#), "got: {output}");
    // Nothing preservable, so the style tag is removed entirely.
    assert!(!output.contains("<style"));
}

#[test]
fn test_specificity_class_beats_element() {
    let html = "<html><head><style>p{color:red} .hi{color:blue}</style></head>\
                <body><p class=\"hi\">x</p></body></html>";
    let output = inline(html).unwrap();

    assert!(output.contains(r#"style="color: blue""#), "got: {output}");
}

#[test]
fn test_important_beats_class() {
    let html = "<html><head><style>p{color:red !important} .hi{color:blue}</style></head>\
                <body><p class=\"hi\">x</p></body></html>";
    let output = inline(html).unwrap();

    assert!(
        output.contains(r#"style="color: red !important""#),
        "got: {output}"
    );
}

#[test]
fn test_inline_style_wins_tie() {
    let html = "<html><head><style>.hi{color:blue}</style></head>\
                <body><p class=\"hi\" style=\"color:green\">x</p></body></html>";
    let output = inline(html).unwrap();

    assert!(output.contains(r#"style="color: green""#), "got: {output}");
}

#[test]
fn test_media_query_preserved() {
    let html = "<html><head><style>@media (max-width:600px){p{color:red}} \
                p{font-size:14px}</style></head><body><p>x</p></body></html>";
    let output = inline_with_config(html, gmail_config()).unwrap();

    assert!(
        output.contains(r#"<p style="font-size: 14px">"#),
        "got: {output}"
    );
    // The style tag survives with (only) the media-query rule.
    assert!(output.contains("<style"));
    assert!(output.contains("@media (max-width:600px)"));
    assert!(output.contains("color: red"));
    let style_start = output.find("<style").unwrap();
    let style_end = output.find("</style>").unwrap();
    assert!(!output[style_start..style_end].contains("font-size"));
}

#[test]
fn test_outlook_policy_filter() {
    let html = "<html><head><style>.x{float:left;color:red}</style></head>\
                <body><div class=\"x\">x</div></body></html>";
    let result = Inliner::new(outlook_config()).inline(html).unwrap();

    assert!(
        result.html.contains(r#"<div class="x" style="color: red">"#),
        "got: {}",
        result.html
    );
    assert!(!result.html.contains("float"));
    // The dropped property is reported.
    assert!(result.warnings.iter().any(|w| w.property == "float"));
}

// ============================================================================
// Round-trip properties
// ============================================================================

#[test]
fn test_empty_stylesheet_is_noop_on_style_attributes() {
    let html = "<html><head></head><body><p>one</p><div><span>two</span></div></body></html>";
    let output = inline(html).unwrap();

    assert!(!output.contains("style="));
}

#[test]
fn test_inlining_twice_is_stable() {
    let html = "<html><head><style>\
                p{color:red} .hi{margin:0 auto; color:blue} a:hover{color:green}\
                </style></head>\
                <body><p class=\"hi\" style=\"padding:1px\">x</p><a href=\"#\">y</a></body></html>";

    let first = inline(html).unwrap();
    let second = inline(&first).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_rule_roundtrip_preserves_declarations() {
    // A preserved rule is re-emitted from its parsed declarations with
    // selector, properties, values, and !important flags intact.
    let html = "<html><head><style>a:hover{color:green !important;text-decoration:underline}\
                </style></head><body><a href=\"#\">x</a></body></html>";
    let output = inline(html).unwrap();

    assert!(output.contains("a:hover {"), "got: {output}");
    assert!(output.contains("color: green !important;"));
    assert!(output.contains("text-decoration: underline;"));
}

// ============================================================================
// Style tag handling
// ============================================================================

#[test]
fn test_remove_style_tags_config() {
    let config = Config {
        remove_style_tags: true,
        ..Config::default()
    };
    let html = "<html><head><style>p{color:red} a:hover{color:green}</style></head>\
                <body><p>x</p></body></html>";
    let result = Inliner::new(config).inline(html).unwrap();

    assert!(!result.html.contains("<style"));
    assert_eq!(result.preserved_rules, 0);
    assert!(result.html.contains(r#"<p style="color: red">"#));
}

#[test]
fn test_pseudo_rules_preserved_and_extra_tags_removed() {
    let html = "<html><head>\
                <style>p{color:red}</style>\
                <style>a:hover{color:green}</style>\
                </head><body><p>x</p><a href=\"#\">y</a></body></html>";
    let result = Inliner::with_defaults().inline(html).unwrap();

    assert_eq!(result.preserved_rules, 1);
    assert_eq!(result.html.matches("<style").count(), 1);
    assert!(result.html.contains("a:hover {"));
    // The plain rule was inlined, not preserved.
    assert!(result.html.contains(r#"<p style="color: red">"#));
}

#[test]
fn test_pseudo_preservation_disabled() {
    let config = Config {
        preserve_pseudo_selectors: false,
        ..Config::default()
    };
    let html = "<html><head><style>a:hover{color:green}</style></head>\
                <body><a href=\"#\">y</a></body></html>";
    let result = Inliner::new(config).inline(html).unwrap();

    assert_eq!(result.preserved_rules, 0);
    assert!(!result.html.contains("<style"));
}

#[test]
fn test_font_face_always_preserved() {
    let config = Config {
        preserve_media_queries: false,
        preserve_pseudo_selectors: false,
        ..Config::default()
    };
    let html = "<html><head><style>@font-face{font-family:Mail;src:url('m.woff2')}</style>\
                </head><body><p>x</p></body></html>";
    let result = Inliner::new(config).inline(html).unwrap();

    assert_eq!(result.preserved_rules, 1);
    assert!(result.html.contains("@font-face"));
    assert!(result.html.contains("font-family: Mail"));
}

// ============================================================================
// Boundary cases
// ============================================================================

#[test]
fn test_duplicate_declaration_later_wins() {
    let html = "<html><head><style>p{color:red;color:blue}</style></head>\
                <body><p>x</p></body></html>";
    let output = inline(html).unwrap();

    assert!(output.contains(r#"style="color: blue""#), "got: {output}");
}

#[test]
fn test_equal_specificity_later_rule_wins() {
    let html = "<html><head><style>.a{color:red} .b{color:blue}</style></head>\
                <body><p class=\"a b\">x</p></body></html>";
    let output = inline(html).unwrap();

    assert!(output.contains(r#"style="color: blue""#), "got: {output}");
}

#[test]
fn test_inline_important_beats_stylesheet_important() {
    let html = "<html><head><style>p{color:red !important}</style></head>\
                <body><p style=\"color:green !important\">x</p></body></html>";
    let output = inline(html).unwrap();

    assert!(
        output.contains(r#"style="color: green !important""#),
        "got: {output}"
    );
}

#[test]
fn test_stylesheet_important_beats_inline_normal() {
    let html = "<html><head><style>p{color:red !important}</style></head>\
                <body><p style=\"color:green\">x</p></body></html>";
    let output = inline(html).unwrap();

    assert!(
        output.contains(r#"style="color: red !important""#),
        "got: {output}"
    );
}

#[test]
fn test_malformed_declaration_does_not_poison_block() {
    let html = "<html><head><style>p{color red; margin: 0; ; font-size:}</style></head>\
                <body><p>x</p></body></html>";
    let output = inline(html).unwrap();

    assert!(output.contains(r#"style="margin: 0""#), "got: {output}");
    assert!(!output.contains("color"));
}

#[test]
fn test_skip_set_untouched() {
    let html = "<html><head><title>t</title><meta charset=\"utf-8\">\
                <style>*{margin:0}</style></head><body><p>x</p></body></html>";
    let output = inline(html).unwrap();

    assert!(output.contains(r#"<p style="margin: 0">"#), "got: {output}");
    assert!(!output.contains("<title style"));
    assert!(!output.contains("<meta style"));
    assert!(!output.contains("<html style"));
    // body is not in the skip set.
    assert!(output.contains(r#"<body style="margin: 0">"#));
}

// ============================================================================
// Result bookkeeping
// ============================================================================

#[test]
fn test_result_counters() {
    let html = "<html><head><style>p{color:red;margin:0} .hi{color:blue}</style></head>\
                <body><p class=\"hi\">x</p><p>y</p></body></html>";
    let result = Inliner::with_defaults().inline(html).unwrap();

    assert_eq!(result.stats.css_rules_parsed, 2);
    // body + two p elements.
    assert_eq!(result.stats.html_elements_processed, 3);
    // First p matches both rules, second p matches one.
    assert_eq!(result.stats.selectors_matched, 3);
    // First p gets color+margin, second p gets color+margin.
    assert_eq!(result.inlined_styles, 4);
    assert_eq!(result.preserved_rules, 0);
}

#[test]
fn test_warnings_surface_in_result() {
    let html = "<html><head><style>div{width:50vw}</style></head>\
                <body><div>x</div></body></html>";
    let result = Inliner::with_defaults().inline(html).unwrap();

    assert!(result
        .warnings
        .iter()
        .any(|w| w.property == "width" && w.severity == Severity::Error));
}

#[test]
fn test_invalid_client_falls_back_to_conservative_profile() {
    let config = Config {
        target_email_client: "unknown_client".to_string(),
        ..Config::default()
    };
    let html = "<html><head><style>.x{position:relative;color:red}</style></head>\
                <body><div class=\"x\">x</div></body></html>";
    let result = Inliner::new(config).inline(html).unwrap();

    // Conservative fallback requires inline styles, so position is dropped.
    assert!(result.html.contains("color: red"));
    assert!(!result.html.contains("position"));
}
