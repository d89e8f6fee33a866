//! Lexical analysis and parsing of Java source text into an AST.
//!
//! `source text → tokens → AST`, one direction only. The lexer produces
//! a finite positioned token sequence; the parser consumes it through a
//! cursor with mark/reset speculation and builds the tree bottom-up.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::{Error, LexerError, ParserError, Result};
pub use lexer::{tokenize, Lexer, Token, TokenKind, TokenSequence};
pub use parser::{parse, parse_expression, parse_member_declaration, parse_type, Parser};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    #[test]
    fn parse_simple_class() {
        let source = r#"
package com.example;

public class HelloWorld {
    public static void main(String[] args) {
        System.out.println("Hello, World!");
    }
}
"#;
        let unit = parse(source).expect("failed to parse");
        assert_eq!(unit.types.len(), 1);
        assert_eq!(unit.types[0].name(), "HelloWorld");
    }

    #[test]
    fn parse_with_imports() {
        let source = r#"
package com.example;

import java.util.List;
import java.util.ArrayList;
import static java.util.Collections.emptyList;
import java.io.*;

class TestClass {
    private List<String> items = new ArrayList<>();
}
"#;
        let unit = parse(source).expect("failed to parse");
        assert_eq!(unit.imports.len(), 4);
        assert!(unit.imports[2].is_static);
        assert!(unit.imports[3].is_wildcard);
        assert_eq!(unit.imports[3].path, "java.io");
    }

    #[test]
    fn parse_expression_entry_point() {
        let expr = parse_expression("a + b * c").expect("failed to parse");
        let Expression::Binary(add) = expr else {
            panic!("expected binary operation");
        };
        assert_eq!(add.operator, BinaryOperator::Add);
    }

    #[test]
    fn parse_expression_rejects_trailing_input() {
        assert!(parse_expression("a + b c").is_err());
    }

    #[test]
    fn parse_member_declaration_entry_point() {
        let member = parse_member_declaration("private int count;").expect("failed to parse");
        let MemberDeclaration::Field(field) = member else {
            panic!("expected field");
        };
        assert_eq!(field.declarators[0].name, "count");
        assert_eq!(field.modifiers, vec![Modifier::Private]);
    }

    #[test]
    fn parse_type_entry_point() {
        let ty = parse_type("Map<String, List<Integer>>[]").expect("failed to parse");
        let Type::Reference(reference) = ty else {
            panic!("expected reference type");
        };
        assert_eq!(reference.name, "Map");
        assert_eq!(reference.dimensions, 1);
        let arguments = reference.type_arguments.expect("type arguments");
        assert_eq!(arguments.len(), 2);
    }

    #[test]
    fn parse_reports_first_error() {
        let err = parse("class A { void f() { int = 5; } }").expect_err("should fail");
        assert!(matches!(err, Error::Parser(_)));
    }

    #[test]
    fn lexer_errors_surface_through_parse() {
        let err = parse("class A { int x = 0x_1; }").expect_err("should fail");
        assert!(matches!(err, Error::Lexer(_)));
    }
}
