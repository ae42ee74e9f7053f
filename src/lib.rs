//! SmartScript template front end.
//!
//! A document is plain text with embedded `{$ ... $}` tags:
//!
//! ```text
//! This is sample text.
//! {$ FOR i 1 10 1 $}
//!   This is {$= i $}-th time this message is generated.
//! {$END$}
//! ```
//!
//! [`tpl::lexer`] turns the source into tokens under a mode chosen by the
//! parser, [`tpl::parser`] builds a [`tpl::ast::DocumentNode`], and
//! [`tpl::render`] serializes the tree back to template text so that
//! re-parsing it yields an equal tree. Nothing here evaluates a template.

pub mod error;
pub mod loader;
pub mod tpl;

pub use error::{LexError, ParseError, TemplateError};
pub use tpl::parser::{Parser, parse_document};
pub use tpl::render::render;

pub type Result<T> = std::result::Result<T, TemplateError>;
