use logos::Logos;

use super::error::LexerError;
use crate::ast::{LiteralKind, Position};

/// Token kinds for the Java lexical grammar (Java SE 8).
///
/// Composite operators are matched by maximal munch; `>>` and `>>>` are
/// emitted whole and split back into `>` tokens by the parser when they
/// close nested type argument lists.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    #[token("abstract")]
    Abstract,
    #[token("assert")]
    Assert,
    #[token("boolean")]
    Boolean,
    #[token("break")]
    Break,
    #[token("byte")]
    Byte,
    #[token("case")]
    Case,
    #[token("catch")]
    Catch,
    #[token("char")]
    Char,
    #[token("class")]
    Class,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("do")]
    Do,
    #[token("double")]
    Double,
    #[token("else")]
    Else,
    #[token("enum")]
    Enum,
    #[token("extends")]
    Extends,
    #[token("final")]
    Final,
    #[token("finally")]
    Finally,
    #[token("float")]
    Float,
    #[token("for")]
    For,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("implements")]
    Implements,
    #[token("import")]
    Import,
    #[token("instanceof")]
    InstanceOf,
    #[token("int")]
    Int,
    #[token("interface")]
    Interface,
    #[token("long")]
    Long,
    #[token("native")]
    Native,
    #[token("new")]
    New,
    #[token("package")]
    Package,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("public")]
    Public,
    #[token("return")]
    Return,
    #[token("short")]
    Short,
    #[token("static")]
    Static,
    #[token("strictfp")]
    Strictfp,
    #[token("super")]
    Super,
    #[token("switch")]
    Switch,
    #[token("synchronized")]
    Synchronized,
    #[token("this")]
    This,
    #[token("throw")]
    Throw,
    #[token("throws")]
    Throws,
    #[token("transient")]
    Transient,
    #[token("try")]
    Try,
    #[token("void")]
    Void,
    #[token("volatile")]
    Volatile,
    #[token("while")]
    While,

    // Contextual keyword literals
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Operators
    #[token("=")]
    Assign,
    #[token("+=")]
    AddAssign,
    #[token("-=")]
    SubAssign,
    #[token("*=")]
    MulAssign,
    #[token("/=")]
    DivAssign,
    #[token("%=")]
    RemAssign,
    #[token("&=")]
    AndAssign,
    #[token("|=")]
    OrAssign,
    #[token("^=")]
    XorAssign,
    #[token("<<=")]
    LShiftAssign,
    #[token(">>=")]
    RShiftAssign,
    #[token(">>>=")]
    URShiftAssign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    LShift,
    #[token(">>")]
    RShift,
    #[token(">>>")]
    URShift,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    PipePipe,
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("::")]
    DoubleColon,
    #[token("->")]
    Arrow,

    // Separators
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("@")]
    At,

    // Literals. The regexes over-accept around underscores and exponents;
    // the wrapper validates the shapes the regexes cannot.
    #[regex(r#""([^"\\\n\r]|\\[^\n\r])*""#)]
    StringLiteral,
    #[regex(r"'([^'\\\n\r]|\\[^\n\r])*'")]
    CharacterLiteral,
    #[regex(r"0[xX][0-9a-fA-F_]*\.[0-9a-fA-F_]*([pP][+-]?[0-9_]*)?[fFdD]?")]
    #[regex(r"0[xX][0-9a-fA-F_]+[pP][+-]?[0-9_]*[fFdD]?")]
    HexFloatingPoint,
    #[regex(r"0[xX][0-9a-fA-F_]*[lL]?")]
    HexInteger,
    #[regex(r"0[bB][01_]*[lL]?")]
    BinaryInteger,
    #[regex(r"0[0-7_]+[lL]?", priority = 4)]
    OctalInteger,
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]*)?[fFdD]?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]*)?[fFdD]?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9_]*[fFdD]?")]
    #[regex(r"[0-9][0-9_]*[fFdD]")]
    DecimalFloatingPoint,
    #[regex(r"[0-9][0-9_]*[lL]?", priority = 3)]
    DecimalInteger,

    // Identifiers, Java letter/digit rules
    #[regex(r"[\p{L}\p{Nl}\p{Sc}\p{Pc}][\p{L}\p{Nl}\p{Sc}\p{Pc}\p{Nd}\p{Mn}\p{Mc}]*")]
    Identifier,

    // Trivia, filtered out by the wrapper
    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/", priority = 4)]
    BlockComment,
    #[regex(r"[ \t\n\r\x0C]+", priority = 3)]
    Whitespace,
    #[token("\u{FEFF}")]
    Bom,

    // Synthetic terminal appended by the wrapper. The NUL pattern never
    // occurs in well-formed source; a raw NUL is reported as a stray
    // character.
    #[token("\u{0}")]
    EndOfInput,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Abstract
                | TokenKind::Assert
                | TokenKind::Boolean
                | TokenKind::Break
                | TokenKind::Byte
                | TokenKind::Case
                | TokenKind::Catch
                | TokenKind::Char
                | TokenKind::Class
                | TokenKind::Const
                | TokenKind::Continue
                | TokenKind::Default
                | TokenKind::Do
                | TokenKind::Double
                | TokenKind::Else
                | TokenKind::Enum
                | TokenKind::Extends
                | TokenKind::Final
                | TokenKind::Finally
                | TokenKind::Float
                | TokenKind::For
                | TokenKind::Goto
                | TokenKind::If
                | TokenKind::Implements
                | TokenKind::Import
                | TokenKind::InstanceOf
                | TokenKind::Int
                | TokenKind::Interface
                | TokenKind::Long
                | TokenKind::Native
                | TokenKind::New
                | TokenKind::Package
                | TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Public
                | TokenKind::Return
                | TokenKind::Short
                | TokenKind::Static
                | TokenKind::Strictfp
                | TokenKind::Super
                | TokenKind::Switch
                | TokenKind::Synchronized
                | TokenKind::This
                | TokenKind::Throw
                | TokenKind::Throws
                | TokenKind::Transient
                | TokenKind::Try
                | TokenKind::Void
                | TokenKind::Volatile
                | TokenKind::While
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Static
                | TokenKind::Final
                | TokenKind::Abstract
                | TokenKind::Native
                | TokenKind::Synchronized
                | TokenKind::Transient
                | TokenKind::Volatile
                | TokenKind::Strictfp
                | TokenKind::Default
        )
    }

    pub fn is_basic_type(&self) -> bool {
        matches!(
            self,
            TokenKind::Byte
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Boolean
                | TokenKind::Char
        )
    }

    pub fn is_literal(&self) -> bool {
        self.literal_kind().is_some()
    }

    /// Literal classification for AST construction.
    pub fn literal_kind(&self) -> Option<LiteralKind> {
        match self {
            TokenKind::DecimalInteger => Some(LiteralKind::DecimalInteger),
            TokenKind::HexInteger => Some(LiteralKind::HexInteger),
            TokenKind::OctalInteger => Some(LiteralKind::OctalInteger),
            TokenKind::BinaryInteger => Some(LiteralKind::BinaryInteger),
            TokenKind::DecimalFloatingPoint => Some(LiteralKind::DecimalFloatingPoint),
            TokenKind::HexFloatingPoint => Some(LiteralKind::HexFloatingPoint),
            TokenKind::True | TokenKind::False => Some(LiteralKind::Boolean),
            TokenKind::CharacterLiteral => Some(LiteralKind::Character),
            TokenKind::StringLiteral => Some(LiteralKind::String),
            TokenKind::Null => Some(LiteralKind::Null),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::AddAssign
                | TokenKind::SubAssign
                | TokenKind::MulAssign
                | TokenKind::DivAssign
                | TokenKind::RemAssign
                | TokenKind::AndAssign
                | TokenKind::OrAssign
                | TokenKind::XorAssign
                | TokenKind::LShiftAssign
                | TokenKind::RShiftAssign
                | TokenKind::URShiftAssign
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Inc
                | TokenKind::Dec
                | TokenKind::Bang
                | TokenKind::Tilde
                | TokenKind::Amp
                | TokenKind::Pipe
                | TokenKind::Caret
                | TokenKind::LShift
                | TokenKind::RShift
                | TokenKind::URShift
                | TokenKind::AndAnd
                | TokenKind::PipePipe
                | TokenKind::Eq
                | TokenKind::Ne
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::Gt
                | TokenKind::Ge
                | TokenKind::Question
                | TokenKind::Colon
                | TokenKind::Arrow
        )
    }

    pub fn is_separator(&self) -> bool {
        matches!(
            self,
            TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::Semicolon
                | TokenKind::Comma
                | TokenKind::Dot
                | TokenKind::Ellipsis
                | TokenKind::DoubleColon
        )
    }
}

/// A lexical token: kind, verbatim text, source position, and the
/// Javadoc comment that immediately precedes it, if any.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
    pub javadoc: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, position: Position) -> Self {
        Self {
            kind,
            text,
            position,
            javadoc: None,
        }
    }

    /// Check if this token has the given kind.
    pub fn is(&self, kind: &TokenKind) -> bool {
        &self.kind == kind
    }

    /// Human-readable description for error messages.
    pub fn describe(&self) -> String {
        if self.kind == TokenKind::EndOfInput {
            "end of input".to_string()
        } else {
            format!("'{}'", self.text)
        }
    }
}

/// The ordered token sequence for one source text, terminated by a
/// single `EndOfInput` token.
pub type TokenSequence = Vec<Token>;

/// Tokenize Java source text.
///
/// Unicode escapes (`\uXXXX`) are decoded before lexing, as the language
/// requires; positions then refer to the decoded text.
pub fn tokenize(source: &str) -> Result<TokenSequence, LexerError> {
    let data = decode_unicode_escapes(source)?;
    Lexer::new(&data).tokenize()
}

/// Position-tracking wrapper around the generated lexer. Skips trivia,
/// records pending Javadoc, validates literal shapes and appends the
/// terminal `EndOfInput` token.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    line: usize,
    column: usize,
    javadoc: Option<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            line: 1,
            column: 1,
            javadoc: None,
        }
    }

    pub fn tokenize(mut self) -> Result<TokenSequence, LexerError> {
        let mut tokens = Vec::new();

        while let Some(result) = self.inner.next() {
            let slice = self.inner.slice();
            let position = Position::new(self.line, self.column);

            match result {
                Ok(TokenKind::Whitespace) | Ok(TokenKind::Bom) => {}
                Ok(TokenKind::LineComment) => {
                    // Any intervening comment detaches a pending Javadoc
                    self.javadoc = None;
                }
                Ok(TokenKind::BlockComment) => {
                    self.javadoc = if slice.starts_with("/**") {
                        Some(slice.to_string())
                    } else {
                        None
                    };
                }
                Ok(TokenKind::EndOfInput) => {
                    return Err(LexerError::new(position, "unexpected character '\\0'"));
                }
                Ok(kind) => {
                    if kind == TokenKind::Slash && self.inner.remainder().starts_with('*') {
                        return Err(LexerError::new(position, "unterminated block comment"));
                    }
                    validate(kind, slice, position)?;
                    let mut token = Token::new(kind, slice.to_string(), position);
                    token.javadoc = self.javadoc.take();
                    tokens.push(token);
                }
                Err(()) => {
                    return Err(self.classify_error(slice, position));
                }
            }

            self.bump(slice);
        }

        tokens.push(Token::new(
            TokenKind::EndOfInput,
            String::new(),
            Position::new(self.line, self.column),
        ));
        Ok(tokens)
    }

    /// Advance the tracked position over the given lexeme.
    fn bump(&mut self, text: &str) {
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            match ch {
                '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                '\r' => {
                    self.line += 1;
                    self.column = 1;
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                }
                _ => self.column += 1,
            }
        }
    }

    fn classify_error(&self, slice: &str, position: Position) -> LexerError {
        let offending = slice
            .chars()
            .next()
            .or_else(|| self.inner.remainder().chars().next());
        match offending {
            Some('"') => LexerError::new(position, "unterminated string literal"),
            Some('\'') => LexerError::new(position, "unterminated character literal"),
            Some(c) => LexerError::new(position, format!("unexpected character '{}'", c)),
            None => LexerError::new(position, "unexpected end of input"),
        }
    }
}

fn validate(kind: TokenKind, slice: &str, position: Position) -> Result<(), LexerError> {
    let result = match kind {
        TokenKind::DecimalInteger => validate_decimal_integer(slice),
        TokenKind::HexInteger => validate_radix_integer(slice, 2, false),
        TokenKind::BinaryInteger => validate_radix_integer(slice, 2, false),
        TokenKind::OctalInteger => validate_radix_integer(slice, 1, true),
        TokenKind::DecimalFloatingPoint => validate_decimal_float(slice),
        TokenKind::HexFloatingPoint => validate_hex_float(slice),
        TokenKind::CharacterLiteral | TokenKind::StringLiteral => validate_quoted(slice),
        _ => Ok(()),
    };
    result.map_err(|message| LexerError::new(position, message))
}

fn strip_suffix<'a>(text: &'a str, suffixes: &[char]) -> &'a str {
    match text.chars().last() {
        Some(last) if suffixes.contains(&last) => &text[..text.len() - last.len_utf8()],
        _ => text,
    }
}

/// A run of digits may contain underscores, but not at either end.
fn check_digit_run(run: &str) -> Result<(), String> {
    if run.starts_with('_') || run.ends_with('_') {
        Err("misplaced underscore in numeric literal".to_string())
    } else {
        Ok(())
    }
}

fn validate_decimal_integer(text: &str) -> Result<(), String> {
    check_digit_run(strip_suffix(text, &['l', 'L']))
}

fn validate_radix_integer(
    text: &str,
    prefix_len: usize,
    leading_underscore_ok: bool,
) -> Result<(), String> {
    let digits = &strip_suffix(text, &['l', 'L'])[prefix_len..];
    if digits.is_empty() {
        return Err("missing digits in numeric literal".to_string());
    }
    if !leading_underscore_ok && digits.starts_with('_') {
        return Err("misplaced underscore in numeric literal".to_string());
    }
    if digits.ends_with('_') {
        return Err("misplaced underscore in numeric literal".to_string());
    }
    Ok(())
}

fn validate_decimal_float(text: &str) -> Result<(), String> {
    let t = strip_suffix(text, &['f', 'F', 'd', 'D']);
    let (mantissa, exponent) = match t.find(['e', 'E']) {
        Some(i) => (&t[..i], Some(&t[i + 1..])),
        None => (t, None),
    };
    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if digits.is_empty() {
            return Err("empty exponent in numeric literal".to_string());
        }
        check_digit_run(digits)?;
    }
    let (int_part, fraction) = match mantissa.find('.') {
        Some(i) => (&mantissa[..i], Some(&mantissa[i + 1..])),
        None => (mantissa, None),
    };
    if !int_part.is_empty() {
        check_digit_run(int_part)?;
    }
    if let Some(fraction) = fraction {
        if !fraction.is_empty() {
            check_digit_run(fraction)?;
        }
    }
    Ok(())
}

fn validate_hex_float(text: &str) -> Result<(), String> {
    let t = strip_suffix(text, &['f', 'F', 'd', 'D']);
    let rest = &t[2..];
    let Some(pi) = rest.find(['p', 'P']) else {
        return Err("hex floating-point literal requires an exponent".to_string());
    };
    let (mantissa, exp) = rest.split_at(pi);
    let digits = exp[1..].strip_prefix(['+', '-']).unwrap_or(&exp[1..]);
    if digits.is_empty() {
        return Err("empty exponent in numeric literal".to_string());
    }
    check_digit_run(digits)?;
    let (int_part, fraction) = match mantissa.find('.') {
        Some(i) => (&mantissa[..i], Some(&mantissa[i + 1..])),
        None => (mantissa, None),
    };
    if int_part.is_empty() && fraction.map_or(true, str::is_empty) {
        return Err("missing digits in numeric literal".to_string());
    }
    if !int_part.is_empty() {
        check_digit_run(int_part)?;
    }
    if let Some(fraction) = fraction {
        if !fraction.is_empty() {
            check_digit_run(fraction)?;
        }
    }
    Ok(())
}

/// Validate the escape sequences of a char or string literal body.
fn validate_quoted(slice: &str) -> Result<(), String> {
    let body = &slice[1..slice.len() - 1];
    if slice.starts_with('\'') && body.is_empty() {
        return Err("empty character literal".to_string());
    }
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.next() {
            Some('b') | Some('t') | Some('n') | Some('f') | Some('r') | Some('"')
            | Some('\'') | Some('\\') => {}
            Some(d @ '0'..='7') => {
                // Octal escape, up to three digits; three only if the
                // first is 0-3
                let max = if d <= '3' { 2 } else { 1 };
                for _ in 0..max {
                    match chars.peek() {
                        Some('0'..='7') => {
                            chars.next();
                        }
                        _ => break,
                    }
                }
            }
            Some(other) => {
                return Err(format!("illegal escape character '{}'", other));
            }
            None => return Err("unterminated escape sequence".to_string()),
        }
    }
    Ok(())
}

/// Decode Java Unicode escapes (`\uXXXX`, with one or more `u`s) before
/// lexing. Only a backslash preceded by an even number of backslashes is
/// eligible, per the language specification.
fn decode_unicode_escapes(source: &str) -> Result<String, LexerError> {
    if !source.contains("\\u") {
        return Ok(source.to_string());
    }

    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut line = 1usize;
    let mut column = 1usize;
    let mut backslashes = 0usize;

    while let Some(c) = chars.next() {
        if c == '\\' && backslashes % 2 == 0 && chars.peek() == Some(&'u') {
            let position = Position::new(line, column);
            let mut consumed = 1usize;
            while chars.peek() == Some(&'u') {
                chars.next();
                consumed += 1;
            }
            let mut value = 0u32;
            let mut digits = 0usize;
            while digits < 4 {
                match chars.peek().and_then(|d| d.to_digit(16)) {
                    Some(d) => {
                        value = value * 16 + d;
                        chars.next();
                        consumed += 1;
                        digits += 1;
                    }
                    None => break,
                }
            }
            if digits < 4 {
                return Err(LexerError::new(position, "invalid unicode escape"));
            }
            let Some(decoded) = char::from_u32(value) else {
                return Err(LexerError::new(position, "invalid unicode escape"));
            };
            out.push(decoded);
            if decoded == '\n' {
                line += 1;
                column = 1;
            } else {
                column += consumed;
            }
            backslashes = 0;
            continue;
        }

        backslashes = if c == '\\' { backslashes + 1 } else { 0 };
        out.push(c);
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("failed to tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexer_keywords_and_identifiers() {
        let toks = kinds("public class Test extends Object");
        assert_eq!(
            toks,
            vec![
                TokenKind::Public,
                TokenKind::Class,
                TokenKind::Identifier,
                TokenKind::Extends,
                TokenKind::Identifier,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn lexer_keyword_prefix_is_identifier() {
        let toks = kinds("classy interfaces");
        assert_eq!(
            toks,
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::EndOfInput
            ]
        );
    }

    #[test]
    fn lexer_integer_literal_families() {
        let toks = kinds("42 0x1F 017 0b101 9L 0xCAFE_BABE");
        assert_eq!(
            toks,
            vec![
                TokenKind::DecimalInteger,
                TokenKind::HexInteger,
                TokenKind::OctalInteger,
                TokenKind::BinaryInteger,
                TokenKind::DecimalInteger,
                TokenKind::HexInteger,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn lexer_floating_point_families() {
        let toks = kinds("1.5 .5f 1e10 2f 3d 0x1.8p1f 0x1p-3");
        assert_eq!(
            toks,
            vec![
                TokenKind::DecimalFloatingPoint,
                TokenKind::DecimalFloatingPoint,
                TokenKind::DecimalFloatingPoint,
                TokenKind::DecimalFloatingPoint,
                TokenKind::DecimalFloatingPoint,
                TokenKind::HexFloatingPoint,
                TokenKind::HexFloatingPoint,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn lexer_literal_text_is_verbatim() {
        let tokens = tokenize("0xCAFE_BABE 1_000L").expect("failed to tokenize");
        assert_eq!(tokens[0].text, "0xCAFE_BABE");
        assert_eq!(tokens[1].text, "1_000L");
    }

    #[test]
    fn lexer_rejects_misplaced_underscores() {
        assert!(tokenize("0x_1").is_err());
        assert!(tokenize("1_").is_err());
        assert!(tokenize("0b1_").is_err());
        assert!(tokenize("1._5").is_err());
        assert!(tokenize("1e_5").is_err());
    }

    #[test]
    fn lexer_rejects_empty_exponent() {
        assert!(tokenize("1e").is_err());
        assert!(tokenize("0x1p").is_err());
        assert!(tokenize("0x1.8").is_err());
    }

    #[test]
    fn lexer_composite_shift_operators_lex_whole() {
        let toks = kinds("a >> b >>> c >>>= d");
        assert_eq!(
            toks,
            vec![
                TokenKind::Identifier,
                TokenKind::RShift,
                TokenKind::Identifier,
                TokenKind::URShift,
                TokenKind::Identifier,
                TokenKind::URShiftAssign,
                TokenKind::Identifier,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn lexer_separators() {
        let toks = kinds("( ) { } [ ] ; , . ... :: @");
        assert_eq!(
            toks,
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Ellipsis,
                TokenKind::DoubleColon,
                TokenKind::At,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn lexer_string_and_char_escapes() {
        let toks = kinds(r#""a\tb" '\n' '\101' 'x'"#);
        assert_eq!(
            toks,
            vec![
                TokenKind::StringLiteral,
                TokenKind::CharacterLiteral,
                TokenKind::CharacterLiteral,
                TokenKind::CharacterLiteral,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn lexer_rejects_bad_escape() {
        assert!(tokenize(r#""a\qb""#).is_err());
    }

    #[test]
    fn lexer_rejects_unterminated_literals() {
        let err = tokenize("\"abc").expect_err("should fail");
        assert!(err.message.contains("unterminated string"));
        let err = tokenize("'a").expect_err("should fail");
        assert!(err.message.contains("unterminated character"));
        let err = tokenize("/* no end").expect_err("should fail");
        assert!(err.message.contains("unterminated block comment"));
    }

    #[test]
    fn lexer_comments_are_skipped() {
        let toks = kinds("// line\n/* block */ x");
        assert_eq!(toks, vec![TokenKind::Identifier, TokenKind::EndOfInput]);
    }

    #[test]
    fn lexer_positions_are_one_indexed() {
        let tokens = tokenize("a\n  b").expect("failed to tokenize");
        assert_eq!((tokens[0].position.line, tokens[0].position.column), (1, 1));
        assert_eq!((tokens[1].position.line, tokens[1].position.column), (2, 3));
    }

    #[test]
    fn lexer_javadoc_attaches_to_next_token() {
        let tokens = tokenize("/** doc */ class A {} class B {}").expect("failed to tokenize");
        assert_eq!(tokens[0].javadoc.as_deref(), Some("/** doc */"));
        assert!(tokens[1].javadoc.is_none());
        // the second class keyword has no pending javadoc
        let class_b = &tokens[4];
        assert_eq!(class_b.kind, TokenKind::Class);
        assert!(class_b.javadoc.is_none());
    }

    #[test]
    fn lexer_line_comment_detaches_javadoc() {
        let tokens = tokenize("/** doc */\n// note\nclass A {}").expect("failed to tokenize");
        assert!(tokens[0].javadoc.is_none());
    }

    #[test]
    fn lexer_unicode_escapes_are_pre_lexed() {
        let tokens = tokenize("int \\u0078 = 1;").expect("failed to tokenize");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].text, "x");
        // an escape can even spell a keyword
        let tokens = tokenize("\\u0069nt x;").expect("failed to tokenize");
        assert_eq!(tokens[0].kind, TokenKind::Int);
    }

    #[test]
    fn lexer_invalid_unicode_escape() {
        assert!(tokenize(r"\u00ZZ").is_err());
    }

    #[test]
    fn lexer_whitespace_does_not_change_tokens() {
        let a = kinds("int x=1;");
        let b = kinds("int   x /* gap */ =\n\t1 ;");
        assert_eq!(a, b);
    }
}
