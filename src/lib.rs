//! javaparse
//!
//! A lexer and recursive-descent parser for Java SE 8 source text,
//! producing a typed abstract syntax tree suitable for program
//! analysis, refactoring tools and code generation pipelines.
//!
//! This is a pure parser: no name resolution, no type checking, no
//! classpath access. The caller supplies text and receives data
//! structures.
//!
//! ## Pipeline
//!
//! ```text
//! Java Source → Tokenizer → Token Sequence → Parser → CompilationUnit
//! ```
//!
//! ## Example
//!
//! ```
//! let unit = javaparse::parse("package p; class A { int x; }").unwrap();
//! assert_eq!(unit.types[0].name(), "A");
//! ```

pub mod ast;
pub mod parser;

pub use ast::CompilationUnit;
pub use parser::{
    parse, parse_expression, parse_member_declaration, parse_type, tokenize, Error, LexerError,
    ParserError, Result, Token, TokenKind, TokenSequence,
};
