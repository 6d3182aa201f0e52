//! Lenient XML helpers for archive service responses.
//!
//! Response payloads arrive with unpredictable namespace prefixes and
//! element casing across server versions, so every lookup here matches on
//! the local element name, ignoring ASCII case.

use roxmltree::{Document, Node};

/// Whether a node is an element whose local name matches `name`.
pub fn local_name_is(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name().eq_ignore_ascii_case(name)
}

/// Find the first descendant element with the given local name.
pub fn find_descendant<'a, 'input>(
    doc: &'a Document<'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    doc.descendants().find(|n| local_name_is(*n, name))
}

/// All descendant elements with the given local name, in document order.
pub fn descendants_named<'a, 'input: 'a>(
    doc: &'a Document<'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    doc.descendants().filter(move |n| local_name_is(*n, name))
}

/// Find the first child element with the given local name.
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| local_name_is(*child, name))
}

/// Concatenated text content of a node's subtree, trimmed.
pub fn node_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Text of the first descendant with the given local name, if present and
/// non-empty.
pub fn descendant_text(doc: &Document<'_>, name: &str) -> Option<String> {
    find_descendant(doc, name)
        .map(node_text)
        .filter(|s| !s.is_empty())
}

/// Text of the first child with the given local name, if present and
/// non-empty.
pub fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    find_child(node, name)
        .map(node_text)
        .filter(|s| !s.is_empty())
}
