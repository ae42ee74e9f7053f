use crate::tpl::ast::{DocumentNode, EchoNode, ForLoopNode, Node};
use std::fmt;

/// Serializes a document back to template text.
///
/// Parsing the returned text yields a tree equal to `document`.
pub fn render(document: &DocumentNode) -> String {
    let mut out = String::new();
    render_nodes(&document.children, &mut out);
    out
}

/// Serializes a single node, including the subtree of a FOR loop.
pub fn render_node(node: &Node) -> String {
    let mut out = String::new();
    render_nodes(std::slice::from_ref(node), &mut out);
    out
}

pub(crate) fn render_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => push_text(&t.text, out),
            Node::Echo(echo) => push_echo(echo, out),
            Node::ForLoop(for_loop) => {
                push_for_open(for_loop, out);
                render_nodes(&for_loop.children, out);
                out.push_str("{$END$}");
            }
        }
    }
}

/// Text goes out verbatim apart from the two sequences the lexer would read
/// differently: a backslash and a `{` opening a tag.
fn push_text(text: &str, out: &mut String) {
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '{' if chars.peek() == Some(&'$') => out.push_str("\\{"),
            _ => out.push(c),
        }
    }
}

fn push_echo(echo: &EchoNode, out: &mut String) {
    out.push_str("{$= ");
    for element in &echo.elements {
        out.push_str(&element.as_text());
        out.push(' ');
    }
    out.push_str("$}");
}

fn push_for_open(for_loop: &ForLoopNode, out: &mut String) {
    out.push_str("{$ FOR ");
    out.push_str(&for_loop.variable);
    for element in [Some(&for_loop.start), Some(&for_loop.end), for_loop.step.as_ref()]
        .into_iter()
        .flatten()
    {
        out.push(' ');
        out.push_str(&element.as_text());
    }
    out.push_str("$}");
}

impl fmt::Display for DocumentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_node(self))
    }
}
