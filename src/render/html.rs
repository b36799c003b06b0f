//! Serializes a render tree to HTML.
//!
//! Every text node and attribute value is escaped. Commands become
//! `data-action` / `data-target` attributes for a delegated click handler.

use super::{Element, Node};

/// Escapes `& < > " '` for use in text and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape(text)),
        Node::Element(element) => write_element(element, out),
    }
}

fn write_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

fn write_element(element: &Element, out: &mut String) {
    let tag = element.tag.name();
    out.push('<');
    out.push_str(tag);

    if let Some(key) = &element.key {
        write_attr(out, "data-key", key);
    }
    if !element.classes.is_empty() {
        write_attr(out, "class", &element.classes.join(" "));
    }
    for (name, value) in &element.attrs {
        write_attr(out, name, value);
    }
    if let Some(command) = &element.on_click {
        write_attr(out, "data-action", command.name());
        if let Some(target) = command.target() {
            write_attr(out, "data-target", target);
        }
    }
    out.push('>');

    if element.tag.is_void() {
        return;
    }
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
