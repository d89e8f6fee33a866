use javaparse::parser::lexer::TokenKind;
use javaparse::tokenize;

#[test]
fn tokenize_ends_with_end_of_input() {
    let tokens = tokenize("class A {}").expect("failed to tokenize");
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndOfInput));
    assert_eq!(
        tokens
            .iter()
            .filter(|t| t.kind == TokenKind::EndOfInput)
            .count(),
        1
    );
}

#[test]
fn empty_input_is_just_end_of_input() {
    let tokens = tokenize("").expect("failed to tokenize");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::EndOfInput);
}

#[test]
fn positions_are_monotone() {
    let source = r#"
package p;

class A {
    int x = 1;
    String s = "hi";
}
"#;
    let tokens = tokenize(source).expect("failed to tokenize");
    let mut last = (0usize, 0usize);
    for token in &tokens {
        let at = (token.position.line, token.position.column);
        assert!(at >= last, "token {:?} moved backwards", token);
        last = at;
    }
}

#[test]
fn keyword_vs_identifier_split() {
    let tokens = tokenize("while whilex").expect("failed to tokenize");
    assert_eq!(tokens[0].kind, TokenKind::While);
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].text, "whilex");
}

#[test]
fn reserved_but_unused_words_are_keywords() {
    let tokens = tokenize("goto const").expect("failed to tokenize");
    assert_eq!(tokens[0].kind, TokenKind::Goto);
    assert_eq!(tokens[1].kind, TokenKind::Const);
}

#[test]
fn boolean_and_null_are_literals() {
    let tokens = tokenize("true false null").expect("failed to tokenize");
    assert!(tokens[0].kind.is_literal());
    assert!(tokens[1].kind.is_literal());
    assert!(tokens[2].kind.is_literal());
}

#[test]
fn dollar_and_underscore_identifiers() {
    let tokens = tokenize("$x _y a$b").expect("failed to tokenize");
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
}

#[test]
fn unicode_identifiers() {
    let tokens = tokenize("π = 3;").expect("failed to tokenize");
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].text, "π");
}

#[test]
fn hex_float_boundary_cases() {
    // valid hex float from the corner of the grammar
    let tokens = tokenize("0x1.8p1f").expect("failed to tokenize");
    assert_eq!(tokens[0].kind, TokenKind::HexFloatingPoint);
    assert_eq!(tokens[0].text, "0x1.8p1f");
    // underscore adjacent to the radix prefix is an error
    assert!(tokenize("0x_1").is_err());
}

#[test]
fn octal_and_leading_zero() {
    let tokens = tokenize("017 0 09").expect("failed to tokenize");
    assert_eq!(tokens[0].kind, TokenKind::OctalInteger);
    assert_eq!(tokens[1].kind, TokenKind::DecimalInteger);
    // javac would reject 09, but lexically it is a decimal literal
    assert_eq!(tokens[2].kind, TokenKind::DecimalInteger);
}

#[test]
fn underscores_between_digits_are_kept() {
    let tokens = tokenize("1_000_000 0b1010_1010").expect("failed to tokenize");
    assert_eq!(tokens[0].text, "1_000_000");
    assert_eq!(tokens[1].text, "0b1010_1010");
}

#[test]
fn shift_operators_lex_whole() {
    let tokens = tokenize(">>>= >>= >>> >> >").expect("failed to tokenize");
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::URShiftAssign,
            TokenKind::RShiftAssign,
            TokenKind::URShift,
            TokenKind::RShift,
            TokenKind::Gt,
            TokenKind::EndOfInput,
        ]
    );
}

#[test]
fn comment_and_whitespace_invariance() {
    let plain = tokenize("int x = 1 + 2;").expect("failed to tokenize");
    let noisy = tokenize("int /* a */ x\n\t= 1 // end\n + 2;").expect("failed to tokenize");
    let plain_kinds: Vec<_> = plain.iter().map(|t| (t.kind, t.text.clone())).collect();
    let noisy_kinds: Vec<_> = noisy.iter().map(|t| (t.kind, t.text.clone())).collect();
    assert_eq!(plain_kinds, noisy_kinds);
}

#[test]
fn lexer_error_positions_are_in_input() {
    let source = "int x = \"abc";
    let err = tokenize(source).expect_err("should fail");
    assert!(err.position.line >= 1);
    assert!(err.position.column <= source.len() + 1);
}

#[test]
fn string_escapes_are_validated_not_decoded() {
    let tokens = tokenize(r#""a\tb\101\\""#).expect("failed to tokenize");
    // the raw text is preserved
    assert_eq!(tokens[0].text, r#""a\tb\101\\""#);
    assert!(tokenize(r#""\x""#).is_err());
    assert!(tokenize(r"'\8'").is_err());
}

#[test]
fn character_literal_with_unicode_escape() {
    let tokens = tokenize("char c = '\\u0041';").expect("failed to tokenize");
    // the pre-pass decodes the escape before the lexer sees it
    assert_eq!(tokens[3].kind, TokenKind::CharacterLiteral);
    assert_eq!(tokens[3].text, "'A'");
}

#[test]
fn javadoc_is_pending_on_next_token_only() {
    let tokens = tokenize("/** first */ class A { /** second */ int x; }")
        .expect("failed to tokenize");
    assert_eq!(tokens[0].javadoc.as_deref(), Some("/** first */"));
    let int_token = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Int)
        .expect("int token");
    assert_eq!(int_token.javadoc.as_deref(), Some("/** second */"));
    // nothing else carries javadoc
    let carrying = tokens.iter().filter(|t| t.javadoc.is_some()).count();
    assert_eq!(carrying, 2);
}
