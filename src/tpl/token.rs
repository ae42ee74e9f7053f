use crate::tpl::element::Operator;
use std::fmt;

/// Tolerance used when comparing double tokens and elements.
pub const DOUBLE_TOLERANCE: f64 = 1e-5;

/// Tokenization rules the lexer applies. The parser owns every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerMode {
    /// Document body: plain text until an unescaped `{$`.
    #[default]
    Text,
    /// Right after `{$`: a single identifier or `=`.
    TagName,
    /// Inside a tag: elements until `$}`.
    TagBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    PlainText,
    OpenTag,
    TagName,
    CloseTag,
    Variable,
    String,
    Double,
    Integer,
    Operator,
    Function,
    Eof,
}

#[derive(Debug, Clone)]
pub enum Token {
    PlainText(String),
    /// `{$`
    OpenTag,
    TagName(String),
    /// `$}`
    CloseTag,
    Variable(String),
    /// Decoded string literal, without quotes.
    Str(String),
    Double(f64),
    Integer(i64),
    Operator(Operator),
    /// Function name without the leading `@`.
    Function(String),
    Eof,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::PlainText(_) => TokenKind::PlainText,
            Token::OpenTag => TokenKind::OpenTag,
            Token::TagName(_) => TokenKind::TagName,
            Token::CloseTag => TokenKind::CloseTag,
            Token::Variable(_) => TokenKind::Variable,
            Token::Str(_) => TokenKind::String,
            Token::Double(_) => TokenKind::Double,
            Token::Integer(_) => TokenKind::Integer,
            Token::Operator(_) => TokenKind::Operator,
            Token::Function(_) => TokenKind::Function,
            Token::Eof => TokenKind::Eof,
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::PlainText(a), Token::PlainText(b))
            | (Token::TagName(a), Token::TagName(b))
            | (Token::Variable(a), Token::Variable(b))
            | (Token::Str(a), Token::Str(b))
            | (Token::Function(a), Token::Function(b)) => a == b,
            (Token::Double(a), Token::Double(b)) => {
                a == b || (a - b).abs() < DOUBLE_TOLERANCE
            }
            (Token::Integer(a), Token::Integer(b)) => a == b,
            (Token::Operator(a), Token::Operator(b)) => a == b,
            (Token::OpenTag, Token::OpenTag)
            | (Token::CloseTag, Token::CloseTag)
            | (Token::Eof, Token::Eof) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::PlainText(s) => write!(f, "text {:?}", s),
            Token::OpenTag => write!(f, "'{{$'"),
            Token::TagName(s) => write!(f, "tag name '{}'", s),
            Token::CloseTag => write!(f, "'$}}'"),
            Token::Variable(s) => write!(f, "variable '{}'", s),
            Token::Str(s) => write!(f, "string {:?}", s),
            Token::Double(v) => write!(f, "double {}", v),
            Token::Integer(v) => write!(f, "integer {}", v),
            Token::Operator(op) => write!(f, "operator '{}'", op.symbol()),
            Token::Function(s) => write!(f, "function '@{}'", s),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
