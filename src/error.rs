use thiserror::Error;

/// A malformed character stream, detected by the lexer.
///
/// `offset` is the byte offset into the source at which the problem was found.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} (at byte {offset})")]
pub struct LexError {
    pub reason: String,
    pub offset: usize,
}

impl LexError {
    pub fn new(reason: impl Into<String>, offset: usize) -> Self {
        Self {
            reason: reason.into(),
            offset,
        }
    }
}

/// A token stream that does not fit the template grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Lex Error: {0}")]
    Lex(#[from] LexError),
    #[error("Unknown Tag: {0}")]
    UnknownTag(String),
    #[error("Too Few Arguments: FOR tag needs at least 3, got {0}")]
    TooFewArguments(usize),
    #[error("Too Many Arguments: FOR tag takes at most 4, got {0}")]
    TooManyArguments(usize),
    #[error("Invalid Loop Variable: expected a variable, got {0}")]
    InvalidLoopVariable(String),
    #[error("Invalid Loop Argument: {0}")]
    InvalidLoopArgument(String),
    #[error("Too Many END Tags")]
    TooManyEndTags,
    #[error("Missing END Tag: {0} FOR tag(s) left open")]
    MissingEndTag(usize),
    #[error("Unclosed Tag: {0}")]
    UnclosedTag(String),
    #[error("Unexpected Token: {0}")]
    UnexpectedToken(String),
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template Parse Error: {0}")]
    Parse(#[from] ParseError),
    #[error("Template Load Error: {0}")]
    LoadError(String),
    #[error("Duplicate Template: {0}")]
    DuplicateTemplate(String),
    #[error("Template Not Found: {0}")]
    TemplateNotFound(String),
}

pub type Error = TemplateError;
