use crate::error::ParseError;
use crate::tpl::ast::{DocumentNode, EchoNode, ForLoopNode, Node, TextNode};
use crate::tpl::element::Element;
use crate::tpl::lexer::Lexer;
use crate::tpl::token::{LexerMode, Token};
use log::{debug, trace};

/// A `{$ FOR ... $}` tag whose `{$END$}` has not been seen yet.
///
/// Each frame on the tag stack pairs with one level of the node stack, which
/// collects the loop body until the frame is closed.
struct ForFrame {
    variable: String,
    start: Element,
    end: Element,
    step: Option<Element>,
}

/// Single-pass builder that drives the lexer and keeps the open-tag stack.
struct TreeBuilder<'a> {
    lexer: Lexer<'a>,
    /// A stack of node collections. The first element is always the root-level nodes.
    nodes_stack: Vec<Vec<Node>>,
    /// FOR tags that are still open, innermost last.
    tag_stack: Vec<ForFrame>,
}

impl<'a> TreeBuilder<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lexer: Lexer::new(text),
            nodes_stack: vec![Vec::new()],
            tag_stack: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<DocumentNode, ParseError> {
        loop {
            self.lexer.set_mode(LexerMode::Text);
            match self.lexer.next_token()? {
                Token::Eof => break,
                Token::PlainText(text) => self.append_node(TextNode { text }.into()),
                Token::OpenTag => self.parse_tag()?,
                other => return Err(ParseError::UnexpectedToken(other.to_string())),
            }
        }

        if !self.tag_stack.is_empty() {
            return Err(ParseError::MissingEndTag(self.tag_stack.len()));
        }

        let children = self.nodes_stack.pop().unwrap_or_default();
        debug!("Parsed document: top-level nodes={}", children.len());
        Ok(DocumentNode::new(children))
    }

    /// Handles everything after `{$` up to and including `$}`.
    fn parse_tag(&mut self) -> Result<(), ParseError> {
        self.lexer.set_mode(LexerMode::TagName);
        let name = match self.lexer.next_token()? {
            Token::TagName(name) => name,
            Token::Eof => return Err(ParseError::UnclosedTag("{$".to_string())),
            other => return Err(ParseError::UnexpectedToken(other.to_string())),
        };

        self.lexer.set_mode(LexerMode::TagBody);
        match name.as_str() {
            "=" => {
                let elements = self.parse_elements(&name)?;
                self.append_node(EchoNode { elements }.into());
            }
            "FOR" => {
                let elements = self.parse_elements(&name)?;
                self.open_for(elements)?;
            }
            "END" => {
                match self.lexer.next_token()? {
                    Token::CloseTag => {}
                    Token::Eof => return Err(ParseError::UnclosedTag(name)),
                    other => {
                        return Err(ParseError::UnexpectedToken(format!(
                            "{} in END tag",
                            other
                        )));
                    }
                }
                self.close_for()?;
            }
            _ => return Err(ParseError::UnknownTag(name)),
        }
        Ok(())
    }

    /// Reads tag-body tokens up to `$}` and maps each one to its element.
    fn parse_elements(&mut self, tag: &str) -> Result<Vec<Element>, ParseError> {
        let mut elements = Vec::new();
        loop {
            let element = match self.lexer.next_token()? {
                Token::CloseTag => return Ok(elements),
                Token::Eof => return Err(ParseError::UnclosedTag(tag.to_string())),
                Token::Variable(name) => Element::Variable(name),
                Token::Function(name) => Element::Function(name),
                Token::Str(value) => Element::StringLiteral(value),
                Token::Integer(v) => Element::ConstantInteger(v),
                Token::Double(v) => Element::ConstantDouble(v),
                Token::Operator(op) => Element::Operator(op),
                other => return Err(ParseError::UnexpectedToken(other.to_string())),
            };
            elements.push(element);
        }
    }

    fn open_for(&mut self, elements: Vec<Element>) -> Result<(), ParseError> {
        let count = elements.len();
        if count < 3 {
            return Err(ParseError::TooFewArguments(count));
        }
        if count > 4 {
            return Err(ParseError::TooManyArguments(count));
        }

        let mut args = elements.into_iter();
        let (Some(first), Some(start), Some(end)) = (args.next(), args.next(), args.next()) else {
            return Err(ParseError::TooFewArguments(count));
        };
        let step = args.next();

        let variable = match first {
            Element::Variable(name) => name,
            other => return Err(ParseError::InvalidLoopVariable(other.as_text())),
        };
        for arg in [Some(&start), Some(&end), step.as_ref()].into_iter().flatten() {
            if !arg.is_loop_expression() {
                return Err(ParseError::InvalidLoopArgument(format!(
                    "'{}' cannot be a FOR start, end or step expression",
                    arg
                )));
            }
        }

        trace!("Open FOR: variable={}, depth={}", variable, self.tag_stack.len() + 1);
        self.tag_stack.push(ForFrame {
            variable,
            start,
            end,
            step,
        });
        self.nodes_stack.push(Vec::new());
        Ok(())
    }

    fn close_for(&mut self) -> Result<(), ParseError> {
        let Some(frame) = self.tag_stack.pop() else {
            return Err(ParseError::TooManyEndTags);
        };
        let children = self.nodes_stack.pop().unwrap_or_default();
        trace!(
            "Close FOR: variable={}, children={}",
            frame.variable,
            children.len()
        );

        self.append_node(
            ForLoopNode {
                variable: frame.variable,
                start: frame.start,
                end: frame.end,
                step: frame.step,
                children,
            }
            .into(),
        );
        Ok(())
    }

    /// Append a node to the current active scope.
    fn append_node(&mut self, node: Node) {
        if let Some(nodes) = self.nodes_stack.last_mut() {
            nodes.push(node);
        }
    }
}

/// A parsed template.
///
/// Construction performs the whole parse; a `Parser` only exists for a
/// document that parsed without error.
#[derive(Debug, Clone)]
pub struct Parser {
    document: DocumentNode,
}

impl Parser {
    pub fn new(text: &str) -> Result<Self, ParseError> {
        let document = TreeBuilder::new(text).parse()?;
        Ok(Self { document })
    }

    pub fn document(&self) -> &DocumentNode {
        &self.document
    }

    pub fn into_document(self) -> DocumentNode {
        self.document
    }
}

/// Main entry point: parse a template string into a document tree.
pub fn parse_document(text: &str) -> Result<DocumentNode, ParseError> {
    Parser::new(text).map(Parser::into_document)
}
