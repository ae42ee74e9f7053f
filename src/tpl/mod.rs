pub mod ast;
pub mod element;
pub mod engine;
pub mod lexer;
pub mod parser;
pub mod render;
pub mod token;
