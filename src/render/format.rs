//! Inline text formatting: `**bold**`, `*italic*` and line breaks.
//!
//! Applied in a fixed order. Bold is consumed first, so `**x**` never
//! becomes two emphasis markers; italic is then applied to what remains
//! (including the inside of bold runs); newlines become `<br>`. Neither
//! pattern spans a newline. Everything else is kept as plain text nodes,
//! so escaping is left to the serializer.

use std::sync::LazyLock;

use regex::Regex;

use super::{Element, Node, Tag};

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern is valid"));

/// Formats message content into inline nodes.
pub fn format_text(content: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            nodes.push(Element::new(Tag::Br).into());
        }
        nodes.extend(format_bold(line));
    }
    nodes
}

fn format_bold(line: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut last = 0;
    for caps in BOLD.captures_iter(line) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        nodes.extend(format_italic(&line[last..whole.start()]));
        nodes.push(
            Element::new(Tag::Strong)
                .children(format_italic(inner.as_str()))
                .into(),
        );
        last = whole.end();
    }
    nodes.extend(format_italic(&line[last..]));
    nodes
}

fn format_italic(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut last = 0;
    for caps in ITALIC.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_text(&mut nodes, &text[last..whole.start()]);
        nodes.push(Element::new(Tag::Em).text(inner.as_str()).into());
        last = whole.end();
    }
    push_text(&mut nodes, &text[last..]);
    nodes
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if !text.is_empty() {
        nodes.push(Node::Text(text.to_string()));
    }
}
