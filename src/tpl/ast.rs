use crate::tpl::element::Element;

/// The root of a parsed template. It is never nested inside another node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentNode {
    pub children: Vec<Node>,
}

impl DocumentNode {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(TextNode),
    Echo(EchoNode),
    ForLoop(ForLoopNode),
}

impl Node {
    /// Child nodes in document order. Text and echo nodes never have children.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Text(_) | Node::Echo(_) => &[],
            Node::ForLoop(for_loop) => &for_loop.children,
        }
    }
}

/// Document text outside any tag, already unescaped.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub text: String,
}

/// A `{$= ... $}` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoNode {
    pub elements: Vec<Element>,
}

/// A `{$ FOR ... $}` tag together with the body up to its matching `{$END$}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoopNode {
    /// Name of the loop counter variable.
    pub variable: String,
    pub start: Element,
    pub end: Element,
    pub step: Option<Element>,
    pub children: Vec<Node>,
}

impl ForLoopNode {
    /// The loop counter as a tag-body element.
    pub fn variable_element(&self) -> Element {
        Element::Variable(self.variable.clone())
    }
}

impl From<TextNode> for Node {
    fn from(node: TextNode) -> Self {
        Node::Text(node)
    }
}

impl From<EchoNode> for Node {
    fn from(node: EchoNode) -> Self {
        Node::Echo(node)
    }
}

impl From<ForLoopNode> for Node {
    fn from(node: ForLoopNode) -> Self {
        Node::ForLoop(node)
    }
}
