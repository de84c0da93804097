//! DOM adapter over kuchiki.
//!
//! Everything the engine needs from a document lives here: parsing,
//! serialization, element enumeration in document order, `<style>` tag
//! access, and style-attribute reads/writes. Selector semantics are
//! kuchiki's; the engine never re-derives them.

use std::collections::BTreeMap;

use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeDataRef, NodeRef, Selectors};

use crate::error::{Error, Result};

/// Parse an HTML document. html5ever is error-recovering, so this always
/// produces a tree.
pub fn parse_html(html: &str) -> NodeRef {
    kuchiki::parse_html().one(html)
}

/// Serialize a document back to HTML text.
pub fn serialize_html(document: &NodeRef) -> Result<String> {
    let mut bytes = Vec::new();
    document.serialize(&mut bytes).map_err(Error::Serialize)?;
    Ok(String::from_utf8(bytes)?)
}

/// All elements of the document, in document order.
pub fn elements(document: &NodeRef) -> Vec<NodeDataRef<ElementData>> {
    match document.select("*") {
        Ok(selection) => selection.collect(),
        Err(()) => Vec::new(),
    }
}

/// All `<style>` elements, in document order.
pub fn style_tags(document: &NodeRef) -> Vec<NodeDataRef<ElementData>> {
    match document.select("style") {
        Ok(selection) => selection.collect(),
        Err(()) => Vec::new(),
    }
}

/// Lower-cased tag name of an element.
pub fn tag_name(element: &NodeDataRef<ElementData>) -> String {
    element.name.local.as_ref().to_ascii_lowercase()
}

/// The element's `id` attribute, if present.
pub fn id(element: &NodeDataRef<ElementData>) -> Option<String> {
    element
        .attributes
        .borrow()
        .get("id")
        .map(|value| value.to_string())
}

/// The element's class list, split on whitespace.
pub fn classes(element: &NodeDataRef<ElementData>) -> Vec<String> {
    element
        .attributes
        .borrow()
        .get("class")
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// All attributes of an element as a name-to-value map.
pub fn attributes(element: &NodeDataRef<ElementData>) -> BTreeMap<String, String> {
    element
        .attributes
        .borrow()
        .map
        .iter()
        .map(|(name, attribute)| (name.local.as_ref().to_string(), attribute.value.clone()))
        .collect()
}

/// The raw `style` attribute value, if present.
pub fn style_attribute(element: &NodeDataRef<ElementData>) -> Option<String> {
    element
        .attributes
        .borrow()
        .get("style")
        .map(|value| value.to_string())
}

/// Overwrite the element's `style` attribute.
pub fn set_style_attribute(element: &NodeDataRef<ElementData>, value: &str) {
    element
        .attributes
        .borrow_mut()
        .insert("style", value.to_string());
}

/// Replace an element's children with a single text node.
pub fn set_text_content(element: &NodeDataRef<ElementData>, text: &str) {
    let node = element.as_node();
    while let Some(child) = node.first_child() {
        child.detach();
    }
    node.append(NodeRef::new_text(text));
}

/// Detach an element from the document.
pub fn remove(element: &NodeDataRef<ElementData>) {
    element.as_node().detach();
}

/// Compile a selector for matching. Selectors the engine cannot evaluate
/// (at-rule headers, unsupported syntax) come back as `None` and the
/// rules carrying them are skipped.
pub fn compile_selector(selector: &str) -> Option<Selectors> {
    Selectors::compile(selector).ok()
}
