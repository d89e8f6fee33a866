//! Recursive-descent, predictive parser for the Java SE 8 grammar.
//!
//! The parser owns the token sequence and a cursor. Local ambiguities
//! (cast vs. parenthesized expression, type arguments vs. `<`, lambda
//! vs. parenthesized expression, explicit generic invocation) are
//! resolved with bounded speculation bracketed by `mark`/`reset`.
//! Composite `>>`/`>>>` tokens are split in place when they close nested
//! type argument lists.

use super::error::{ParserError, Result};
use super::lexer::{tokenize, Token, TokenKind};
use crate::ast::*;

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    // Composite `>>`/`>>>` tokens split so far, with their originals, so
    // a speculative parse that split one can be fully undone
    splits: Vec<(usize, Token)>,
}

/// A saved cursor state for `mark`/`reset` speculation.
#[derive(Debug, Clone, Copy)]
pub struct Mark {
    cursor: usize,
    splits: usize,
}

impl Parser {
    /// Create a parser from source code. Fails on the first malformed
    /// token.
    pub fn new(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        Ok(Self {
            tokens,
            current: 0,
            splits: Vec::new(),
        })
    }

    // Cursor

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        if self.current == 0 {
            &self.tokens[0]
        } else {
            &self.tokens[self.current - 1]
        }
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EndOfInput
    }

    fn position(&self) -> Position {
        self.peek().position
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> super::error::Error {
        let token = self.peek();
        if token.kind == TokenKind::EndOfInput {
            ParserError::UnexpectedEndOfInput {
                expected: expected.to_string(),
                position: token.position,
            }
            .into()
        } else {
            ParserError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.describe(),
                position: token.position,
            }
            .into()
        }
    }

    /// Require the whole input to have been consumed.
    fn expect_end(&self) -> Result<()> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    /// Save the cursor for a speculative parse.
    fn mark(&self) -> Mark {
        Mark {
            cursor: self.current,
            splits: self.splits.len(),
        }
    }

    /// Discard a speculative parse: restore the cursor and undo any
    /// composite-token splits made since the mark.
    fn reset(&mut self, mark: Mark) {
        while self.splits.len() > mark.splits {
            let (index, token) = self.splits.pop().expect("split log entry");
            self.tokens[index] = token;
        }
        self.current = mark.cursor;
    }

    /// Inspect the kind `k` tokens ahead without consuming.
    fn look_ahead(&self, k: usize) -> TokenKind {
        self.tokens
            .get(self.current + k)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::EndOfInput)
    }

    /// Javadoc pending on the token about to be consumed, if any.
    fn pending_javadoc(&self) -> Option<String> {
        self.peek().javadoc.clone()
    }

    /// Consume one `>` out of the current token. `>>` becomes `>` and
    /// `>>>` becomes `>>`, re-positioned one column right; the cursor
    /// stays on the shrunk token.
    fn split_composite_gt(&mut self) {
        let rest = match self.tokens[self.current].kind {
            TokenKind::RShift => (TokenKind::Gt, ">"),
            TokenKind::URShift => (TokenKind::RShift, ">>"),
            _ => return,
        };
        self.splits
            .push((self.current, self.tokens[self.current].clone()));
        let token = &mut self.tokens[self.current];
        token.kind = rest.0;
        token.text = rest.1.to_string();
        token.position.column += 1;
    }

    /// Close a type argument or type parameter list: a plain `>`, or one
    /// `>` split off a composite shift token.
    fn consume_type_list_close(&mut self) -> Result<()> {
        match self.peek().kind {
            TokenKind::Gt => {
                self.advance();
                Ok(())
            }
            TokenKind::RShift | TokenKind::URShift => {
                self.split_composite_gt();
                Ok(())
            }
            _ => Err(self.unexpected("'>'")),
        }
    }

    // Identifiers and names

    fn parse_identifier(&mut self) -> Result<String> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance().text.clone())
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn parse_qualified_name(&mut self) -> Result<String> {
        let mut name = self.parse_identifier()?;
        while self.check(TokenKind::Dot) && self.look_ahead(1) == TokenKind::Identifier {
            self.advance();
            name.push('.');
            name.push_str(&self.parse_identifier()?);
        }
        Ok(name)
    }

    // Compilation unit

    pub fn parse_compilation_unit(&mut self) -> Result<CompilationUnit> {
        let position = self.position();

        // Leading annotations belong to the package declaration when one
        // follows, otherwise to the first type declaration.
        let package = if self.check(TokenKind::Package) {
            Some(self.parse_package_declaration(Vec::new())?)
        } else if self.check(TokenKind::At) && self.look_ahead(1) != TokenKind::Interface {
            let save = self.mark();
            let documentation = self.pending_javadoc();
            let annotations = self.parse_annotations()?;
            if self.check(TokenKind::Package) {
                let mut decl = self.parse_package_declaration(annotations)?;
                decl.documentation = documentation;
                Some(decl)
            } else {
                self.reset(save);
                None
            }
        } else {
            None
        };

        let mut imports = Vec::new();
        while self.check(TokenKind::Import) {
            imports.push(self.parse_import_declaration()?);
        }

        let mut types = Vec::new();
        while !self.is_at_end() {
            if self.match_token(TokenKind::Semicolon) {
                continue;
            }
            types.push(self.parse_type_declaration()?);
        }

        Ok(CompilationUnit {
            package,
            imports,
            types,
            position,
        })
    }

    fn parse_package_declaration(
        &mut self,
        annotations: Vec<Annotation>,
    ) -> Result<PackageDeclaration> {
        let documentation = self.pending_javadoc();
        let position = self.position();
        self.consume(TokenKind::Package, "'package'")?;
        let name = self.parse_qualified_name()?;
        self.consume(TokenKind::Semicolon, "';' after package name")?;
        Ok(PackageDeclaration {
            annotations,
            name,
            documentation,
            position,
        })
    }

    fn parse_import_declaration(&mut self) -> Result<ImportDeclaration> {
        let position = self.position();
        self.consume(TokenKind::Import, "'import'")?;
        let is_static = self.match_token(TokenKind::Static);
        let mut path = self.parse_identifier()?;
        let mut is_wildcard = false;
        while self.match_token(TokenKind::Dot) {
            if self.match_token(TokenKind::Star) {
                is_wildcard = true;
                break;
            }
            path.push('.');
            path.push_str(&self.parse_identifier()?);
        }
        self.consume(TokenKind::Semicolon, "';' after import")?;
        Ok(ImportDeclaration {
            path,
            is_static,
            is_wildcard,
            position,
        })
    }

    // Modifiers and annotations

    fn modifier_of(kind: TokenKind) -> Option<Modifier> {
        match kind {
            TokenKind::Public => Some(Modifier::Public),
            TokenKind::Protected => Some(Modifier::Protected),
            TokenKind::Private => Some(Modifier::Private),
            TokenKind::Static => Some(Modifier::Static),
            TokenKind::Final => Some(Modifier::Final),
            TokenKind::Abstract => Some(Modifier::Abstract),
            TokenKind::Native => Some(Modifier::Native),
            TokenKind::Synchronized => Some(Modifier::Synchronized),
            TokenKind::Transient => Some(Modifier::Transient),
            TokenKind::Volatile => Some(Modifier::Volatile),
            TokenKind::Strictfp => Some(Modifier::Strictfp),
            TokenKind::Default => Some(Modifier::Default),
            _ => None,
        }
    }

    /// Modifiers and annotations may freely interleave before a
    /// declaration. Modifier sets are deduplicated; annotation order is
    /// preserved.
    fn parse_modifiers_and_annotations(&mut self) -> Result<(Vec<Modifier>, Vec<Annotation>)> {
        let mut modifiers: Vec<Modifier> = Vec::new();
        let mut annotations = Vec::new();
        loop {
            if let Some(modifier) = Self::modifier_of(self.peek().kind) {
                // `synchronized (lock) { ... }` is a statement, not a
                // modifier
                if self.peek().kind == TokenKind::Synchronized
                    && self.look_ahead(1) == TokenKind::LParen
                {
                    break;
                }
                self.advance();
                if !modifiers.contains(&modifier) {
                    modifiers.push(modifier);
                }
            } else if self.check(TokenKind::At) && self.look_ahead(1) != TokenKind::Interface {
                annotations.push(self.parse_annotation()?);
            } else {
                break;
            }
        }
        Ok((modifiers, annotations))
    }

    fn parse_annotations(&mut self) -> Result<Vec<Annotation>> {
        let mut annotations = Vec::new();
        while self.check(TokenKind::At) && self.look_ahead(1) != TokenKind::Interface {
            annotations.push(self.parse_annotation()?);
        }
        Ok(annotations)
    }

    fn parse_annotation(&mut self) -> Result<Annotation> {
        let position = self.position();
        self.consume(TokenKind::At, "'@'")?;
        let name = self.parse_qualified_name()?;
        let element = if self.match_token(TokenKind::LParen) {
            let element = if self.check(TokenKind::RParen) {
                Some(AnnotationElement::Pairs(Vec::new()))
            } else if self.check(TokenKind::Identifier)
                && self.look_ahead(1) == TokenKind::Assign
            {
                let mut pairs = Vec::new();
                loop {
                    let pair_position = self.position();
                    let pair_name = self.parse_identifier()?;
                    self.consume(TokenKind::Assign, "'=' in annotation element")?;
                    let value = self.parse_element_value()?;
                    pairs.push(ElementValuePair {
                        name: pair_name,
                        value,
                        position: pair_position,
                    });
                    if !self.match_token(TokenKind::Comma) {
                        break;
                    }
                }
                Some(AnnotationElement::Pairs(pairs))
            } else {
                Some(AnnotationElement::Value(self.parse_element_value()?))
            };
            self.consume(TokenKind::RParen, "')' after annotation arguments")?;
            element
        } else {
            None
        };
        Ok(Annotation {
            name,
            element,
            position,
        })
    }

    fn parse_element_value(&mut self) -> Result<ElementValue> {
        if self.check(TokenKind::At) {
            return Ok(ElementValue::Annotation(Box::new(self.parse_annotation()?)));
        }
        if self.check(TokenKind::LBrace) {
            let position = self.position();
            self.advance();
            let mut values = Vec::new();
            while !self.check(TokenKind::RBrace) {
                values.push(self.parse_element_value()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::RBrace, "'}' after element values")?;
            return Ok(ElementValue::Array(ElementArrayValue { values, position }));
        }
        Ok(ElementValue::Expression(self.parse_conditional()?))
    }

    // Type declarations

    fn parse_type_declaration(&mut self) -> Result<TypeDeclaration> {
        let position = self.position();
        let documentation = self.pending_javadoc();
        let (modifiers, annotations) = self.parse_modifiers_and_annotations()?;
        self.parse_type_declaration_rest(modifiers, annotations, documentation, position)
    }

    fn parse_type_declaration_rest(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
        documentation: Option<String>,
        position: Position,
    ) -> Result<TypeDeclaration> {
        match self.peek().kind {
            TokenKind::Class => Ok(TypeDeclaration::Class(self.parse_class_declaration(
                modifiers,
                annotations,
                documentation,
                position,
            )?)),
            TokenKind::Interface => Ok(TypeDeclaration::Interface(
                self.parse_interface_declaration(modifiers, annotations, documentation, position)?,
            )),
            TokenKind::Enum => Ok(TypeDeclaration::Enum(self.parse_enum_declaration(
                modifiers,
                annotations,
                documentation,
                position,
            )?)),
            TokenKind::At => Ok(TypeDeclaration::Annotation(
                self.parse_annotation_type_declaration(
                    modifiers,
                    annotations,
                    documentation,
                    position,
                )?,
            )),
            _ => Err(self.unexpected("type declaration")),
        }
    }

    fn parse_class_declaration(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
        documentation: Option<String>,
        position: Position,
    ) -> Result<ClassDeclaration> {
        self.consume(TokenKind::Class, "'class'")?;
        let name = self.parse_identifier()?;

        let type_parameters = if self.check(TokenKind::Lt) {
            self.parse_type_parameters()?
        } else {
            Vec::new()
        };

        let extends = if self.match_token(TokenKind::Extends) {
            Some(self.parse_reference_type(Vec::new())?)
        } else {
            None
        };

        let implements = if self.match_token(TokenKind::Implements) {
            self.parse_reference_type_list()?
        } else {
            Vec::new()
        };

        let body = self.parse_class_body()?;

        Ok(ClassDeclaration {
            modifiers,
            annotations,
            documentation,
            name,
            type_parameters,
            extends,
            implements,
            body,
            position,
        })
    }

    fn parse_interface_declaration(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
        documentation: Option<String>,
        position: Position,
    ) -> Result<InterfaceDeclaration> {
        self.consume(TokenKind::Interface, "'interface'")?;
        let name = self.parse_identifier()?;

        let type_parameters = if self.check(TokenKind::Lt) {
            self.parse_type_parameters()?
        } else {
            Vec::new()
        };

        let extends = if self.match_token(TokenKind::Extends) {
            self.parse_reference_type_list()?
        } else {
            Vec::new()
        };

        let body = self.parse_class_body()?;

        Ok(InterfaceDeclaration {
            modifiers,
            annotations,
            documentation,
            name,
            type_parameters,
            extends,
            body,
            position,
        })
    }

    fn parse_enum_declaration(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
        documentation: Option<String>,
        position: Position,
    ) -> Result<EnumDeclaration> {
        self.consume(TokenKind::Enum, "'enum'")?;
        let name = self.parse_identifier()?;

        let implements = if self.match_token(TokenKind::Implements) {
            self.parse_reference_type_list()?
        } else {
            Vec::new()
        };

        self.consume(TokenKind::LBrace, "'{' after enum declaration")?;

        let mut constants = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Semicolon) {
            constants.push(self.parse_enum_constant()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        let mut body = Vec::new();
        if self.match_token(TokenKind::Semicolon) {
            while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                if self.match_token(TokenKind::Semicolon) {
                    continue;
                }
                body.push(self.parse_member_declaration()?);
            }
        }

        self.consume(TokenKind::RBrace, "'}' after enum body")?;

        Ok(EnumDeclaration {
            modifiers,
            annotations,
            documentation,
            name,
            implements,
            constants,
            body,
            position,
        })
    }

    fn parse_enum_constant(&mut self) -> Result<EnumConstantDeclaration> {
        let documentation = self.pending_javadoc();
        let annotations = self.parse_annotations()?;
        let position = self.position();
        let name = self.parse_identifier()?;

        let arguments = if self.match_token(TokenKind::LParen) {
            let arguments = if self.check(TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_argument_list()?
            };
            self.consume(TokenKind::RParen, "')' after enum constant arguments")?;
            arguments
        } else {
            Vec::new()
        };

        let body = if self.check(TokenKind::LBrace) {
            Some(self.parse_class_body()?)
        } else {
            None
        };

        Ok(EnumConstantDeclaration {
            annotations,
            documentation,
            name,
            arguments,
            body,
            position,
        })
    }

    fn parse_annotation_type_declaration(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
        documentation: Option<String>,
        position: Position,
    ) -> Result<AnnotationTypeDeclaration> {
        self.consume(TokenKind::At, "'@'")?;
        self.consume(TokenKind::Interface, "'interface'")?;
        let name = self.parse_identifier()?;

        self.consume(TokenKind::LBrace, "'{' after annotation type declaration")?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.match_token(TokenKind::Semicolon) {
                continue;
            }
            body.push(self.parse_member_declaration_in(true)?);
        }
        self.consume(TokenKind::RBrace, "'}' after annotation type body")?;

        Ok(AnnotationTypeDeclaration {
            modifiers,
            annotations,
            documentation,
            name,
            body,
            position,
        })
    }

    // Members

    fn parse_class_body(&mut self) -> Result<Vec<MemberDeclaration>> {
        self.consume(TokenKind::LBrace, "'{'")?;
        let mut members = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.match_token(TokenKind::Semicolon) {
                continue;
            }
            members.push(self.parse_member_declaration()?);
        }
        self.consume(TokenKind::RBrace, "'}'")?;
        Ok(members)
    }

    pub(crate) fn parse_member_declaration(&mut self) -> Result<MemberDeclaration> {
        self.parse_member_declaration_in(false)
    }

    fn parse_member_declaration_in(&mut self, annotation_body: bool) -> Result<MemberDeclaration> {
        let position = self.position();
        let documentation = self.pending_javadoc();
        let (modifiers, annotations) = self.parse_modifiers_and_annotations()?;

        // Static or instance initializer block
        if self.check(TokenKind::LBrace) {
            let is_static = modifiers.contains(&Modifier::Static);
            let body = self.parse_block()?;
            return Ok(MemberDeclaration::Initializer(InitializerBlock {
                is_static,
                body,
                position,
            }));
        }

        // Nested type declaration
        if matches!(
            self.peek().kind,
            TokenKind::Class | TokenKind::Interface | TokenKind::Enum
        ) || (self.check(TokenKind::At) && self.look_ahead(1) == TokenKind::Interface)
        {
            let decl =
                self.parse_type_declaration_rest(modifiers, annotations, documentation, position)?;
            return Ok(MemberDeclaration::Type(decl));
        }

        // Method-level type parameters
        let type_parameters = if self.check(TokenKind::Lt) {
            self.parse_type_parameters()?
        } else {
            Vec::new()
        };

        // Constructor: an identifier directly followed by '('
        if !annotation_body
            && self.check(TokenKind::Identifier)
            && self.look_ahead(1) == TokenKind::LParen
        {
            log::debug!("member at {}: constructor", position);
            return self.parse_constructor_rest(
                modifiers,
                annotations,
                documentation,
                type_parameters,
                position,
            );
        }

        // Void method
        if self.check(TokenKind::Void) {
            self.advance();
            let name = self.parse_identifier()?;
            return self.parse_method_rest(
                modifiers,
                annotations,
                documentation,
                type_parameters,
                None,
                name,
                position,
            );
        }

        let ty = self.parse_type()?;

        // Annotation type element: `Type name() [default value];`
        if annotation_body
            && self.check(TokenKind::Identifier)
            && self.look_ahead(1) == TokenKind::LParen
        {
            let name = self.parse_identifier()?;
            self.consume(TokenKind::LParen, "'('")?;
            self.consume(TokenKind::RParen, "')' in annotation method declaration")?;
            let default_value = if self.match_token(TokenKind::Default) {
                Some(self.parse_element_value()?)
            } else {
                None
            };
            self.consume(TokenKind::Semicolon, "';' after annotation method")?;
            return Ok(MemberDeclaration::AnnotationMethod(AnnotationMethod {
                modifiers,
                annotations,
                documentation,
                return_type: ty,
                name,
                default_value,
                position,
            }));
        }

        // Method with a return type
        if self.check(TokenKind::Identifier) && self.look_ahead(1) == TokenKind::LParen {
            let name = self.parse_identifier()?;
            return self.parse_method_rest(
                modifiers,
                annotations,
                documentation,
                type_parameters,
                Some(ty),
                name,
                position,
            );
        }

        // Field
        if !type_parameters.is_empty() {
            return Err(self.unexpected("method declaration"));
        }
        let declarators = self.parse_variable_declarators()?;
        self.consume(TokenKind::Semicolon, "';' after field declaration")?;
        Ok(MemberDeclaration::Field(FieldDeclaration {
            modifiers,
            annotations,
            documentation,
            ty,
            declarators,
            position,
        }))
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_method_rest(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
        documentation: Option<String>,
        type_parameters: Vec<TypeParameter>,
        mut return_type: Option<Type>,
        name: String,
        position: Position,
    ) -> Result<MemberDeclaration> {
        let parameters = self.parse_formal_parameters()?;

        // Legacy array dimensions after the parameter list: `int m()[]`
        if return_type.is_some() {
            let extra = self.parse_empty_dims()?;
            if extra > 0 {
                match return_type.as_mut().expect("return type present") {
                    Type::Basic(t) => t.dimensions += extra,
                    Type::Reference(t) => t.dimensions += extra,
                }
            }
        }

        let throws = if self.match_token(TokenKind::Throws) {
            self.parse_reference_type_list()?
        } else {
            Vec::new()
        };

        let body = if self.check(TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            self.consume(TokenKind::Semicolon, "'{' or ';' after method declaration")?;
            None
        };

        Ok(MemberDeclaration::Method(MethodDeclaration {
            modifiers,
            annotations,
            documentation,
            type_parameters,
            return_type,
            name,
            parameters,
            throws,
            body,
            position,
        }))
    }

    fn parse_constructor_rest(
        &mut self,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
        documentation: Option<String>,
        type_parameters: Vec<TypeParameter>,
        position: Position,
    ) -> Result<MemberDeclaration> {
        let name = self.parse_identifier()?;
        let parameters = self.parse_formal_parameters()?;
        let throws = if self.match_token(TokenKind::Throws) {
            self.parse_reference_type_list()?
        } else {
            Vec::new()
        };
        let body = self.parse_block()?;
        Ok(MemberDeclaration::Constructor(ConstructorDeclaration {
            modifiers,
            annotations,
            documentation,
            type_parameters,
            name,
            parameters,
            throws,
            body,
            position,
        }))
    }

    fn parse_formal_parameters(&mut self) -> Result<Vec<FormalParameter>> {
        self.consume(TokenKind::LParen, "'('")?;
        let mut parameters = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                parameters.push(self.parse_formal_parameter()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen, "')' after parameters")?;
        Ok(parameters)
    }

    fn parse_formal_parameter(&mut self) -> Result<FormalParameter> {
        let position = self.position();
        let (modifiers, annotations) = self.parse_modifiers_and_annotations()?;
        let mut ty = self.parse_type()?;
        let varargs = self.match_token(TokenKind::Ellipsis);
        let name = self.parse_identifier()?;
        let extra = self.parse_empty_dims()?;
        if extra > 0 {
            match &mut ty {
                Type::Basic(t) => t.dimensions += extra,
                Type::Reference(t) => t.dimensions += extra,
            }
        }
        Ok(FormalParameter {
            modifiers,
            annotations,
            ty,
            name,
            varargs,
            position,
        })
    }

    fn parse_variable_declarators(&mut self) -> Result<Vec<VariableDeclarator>> {
        let mut declarators = Vec::new();
        loop {
            declarators.push(self.parse_variable_declarator()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(declarators)
    }

    fn parse_variable_declarator(&mut self) -> Result<VariableDeclarator> {
        let position = self.position();
        let name = self.parse_identifier()?;
        let dimensions = self.parse_empty_dims()?;
        let initializer = if self.match_token(TokenKind::Assign) {
            Some(self.parse_variable_initializer()?)
        } else {
            None
        };
        Ok(VariableDeclarator {
            name,
            dimensions,
            initializer,
            position,
        })
    }

    fn parse_variable_initializer(&mut self) -> Result<Expression> {
        if self.check(TokenKind::LBrace) {
            Ok(Expression::ArrayInitializer(
                self.parse_array_initializer()?,
            ))
        } else {
            self.parse_expression()
        }
    }

    fn parse_array_initializer(&mut self) -> Result<ArrayInitializer> {
        let position = self.position();
        self.consume(TokenKind::LBrace, "'{'")?;
        let mut values = Vec::new();
        while !self.check(TokenKind::RBrace) {
            values.push(self.parse_variable_initializer()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RBrace, "'}' after array initializer")?;
        Ok(ArrayInitializer { values, position })
    }

    /// Zero or more `[]` pairs, with optional type-use annotations
    /// before each pair.
    fn parse_empty_dims(&mut self) -> Result<usize> {
        let mut dims = 0;
        loop {
            if self.check(TokenKind::LBracket) {
                self.advance();
                self.consume(TokenKind::RBracket, "']' after array dimension")?;
                dims += 1;
            } else if self.check(TokenKind::At) {
                let save = self.mark();
                let _ = self.parse_annotations()?;
                if self.check(TokenKind::LBracket) {
                    self.advance();
                    self.consume(TokenKind::RBracket, "']' after array dimension")?;
                    dims += 1;
                } else {
                    self.reset(save);
                    break;
                }
            } else {
                break;
            }
        }
        Ok(dims)
    }

    // Types

    pub(crate) fn parse_type(&mut self) -> Result<Type> {
        let annotations = self.parse_annotations()?;
        if self.peek().kind.is_basic_type() {
            let position = self.position();
            let name = Self::primitive_of(self.advance().kind);
            let dimensions = self.parse_empty_dims()?;
            return Ok(Type::Basic(BasicType {
                name,
                dimensions,
                position,
            }));
        }
        let mut reference = self.parse_reference_type(annotations)?;
        reference.dimensions = self.parse_empty_dims()?;
        Ok(Type::Reference(reference))
    }

    fn primitive_of(kind: TokenKind) -> Primitive {
        match kind {
            TokenKind::Byte => Primitive::Byte,
            TokenKind::Short => Primitive::Short,
            TokenKind::Int => Primitive::Int,
            TokenKind::Long => Primitive::Long,
            TokenKind::Float => Primitive::Float,
            TokenKind::Double => Primitive::Double,
            TokenKind::Boolean => Primitive::Boolean,
            TokenKind::Char => Primitive::Char,
            _ => unreachable!("not a primitive type keyword"),
        }
    }

    /// A class or interface type, without array dimensions. Qualified
    /// segments chain through `sub_type`.
    fn parse_reference_type(&mut self, annotations: Vec<Annotation>) -> Result<ReferenceType> {
        let mut segments = vec![self.parse_reference_type_segment()?];
        while self.check(TokenKind::Dot) && self.look_ahead(1) == TokenKind::Identifier {
            self.advance();
            segments.push(self.parse_reference_type_segment()?);
        }
        let mut reference = None;
        for (name, type_arguments, position) in segments.into_iter().rev() {
            reference = Some(ReferenceType {
                name,
                type_arguments,
                sub_type: reference.map(Box::new),
                dimensions: 0,
                annotations: Vec::new(),
                position,
            });
        }
        let mut reference = reference.expect("at least one type segment");
        reference.annotations = annotations;
        Ok(reference)
    }

    fn parse_reference_type_segment(
        &mut self,
    ) -> Result<(String, Option<Vec<TypeArgument>>, Position)> {
        let position = self.position();
        let name = self.parse_identifier()?;
        let type_arguments = if self.check(TokenKind::Lt) {
            Some(self.parse_type_arguments()?)
        } else {
            None
        };
        Ok((name, type_arguments, position))
    }

    fn parse_reference_type_list(&mut self) -> Result<Vec<ReferenceType>> {
        let mut types = Vec::new();
        loop {
            let annotations = self.parse_annotations()?;
            types.push(self.parse_reference_type(annotations)?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Ok(types)
    }

    /// A `<...>` type argument list. An immediately closed list is the
    /// diamond and yields an empty vector.
    fn parse_type_arguments(&mut self) -> Result<Vec<TypeArgument>> {
        self.consume(TokenKind::Lt, "'<'")?;
        if matches!(
            self.peek().kind,
            TokenKind::Gt | TokenKind::RShift | TokenKind::URShift
        ) {
            self.consume_type_list_close()?;
            return Ok(Vec::new());
        }
        let mut arguments = Vec::new();
        loop {
            arguments.push(self.parse_type_argument()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.consume_type_list_close()?;
        Ok(arguments)
    }

    fn parse_type_argument(&mut self) -> Result<TypeArgument> {
        if self.check(TokenKind::Question) {
            let position = self.position();
            self.advance();
            let bound = if self.match_token(TokenKind::Extends) {
                Some((BoundKind::Extends, self.parse_type()?))
            } else if self.match_token(TokenKind::Super) {
                Some((BoundKind::Super, self.parse_type()?))
            } else {
                None
            };
            return Ok(TypeArgument::Wildcard(WildcardArgument {
                bound,
                position,
            }));
        }
        Ok(TypeArgument::Type(self.parse_type()?))
    }

    fn parse_type_parameters(&mut self) -> Result<Vec<TypeParameter>> {
        self.consume(TokenKind::Lt, "'<'")?;
        let mut parameters = Vec::new();
        loop {
            let position = self.position();
            let _annotations = self.parse_annotations()?;
            let name = self.parse_identifier()?;
            let bounds = if self.match_token(TokenKind::Extends) {
                let mut bounds = vec![self.parse_type()?];
                while self.match_token(TokenKind::Amp) {
                    bounds.push(self.parse_type()?);
                }
                bounds
            } else {
                Vec::new()
            };
            parameters.push(TypeParameter {
                name,
                bounds,
                position,
            });
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.consume_type_list_close()?;
        Ok(parameters)
    }

    // Statements

    fn parse_block(&mut self) -> Result<Block> {
        let position = self.position();
        self.consume(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.consume(TokenKind::RBrace, "'}'")?;
        Ok(Block {
            statements,
            position,
        })
    }

    pub(crate) fn parse_statement(&mut self) -> Result<Statement> {
        match self.peek().kind {
            TokenKind::LBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                let position = self.position();
                self.advance();
                Ok(Statement::Empty(EmptyStatement { position }))
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Return => {
                let position = self.position();
                self.advance();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume(TokenKind::Semicolon, "';' after return")?;
                Ok(Statement::Return(ReturnStatement { value, position }))
            }
            TokenKind::Throw => {
                let position = self.position();
                self.advance();
                let expression = self.parse_expression()?;
                self.consume(TokenKind::Semicolon, "';' after throw")?;
                Ok(Statement::Throw(ThrowStatement {
                    expression,
                    position,
                }))
            }
            TokenKind::Break => {
                let position = self.position();
                self.advance();
                let label = if self.check(TokenKind::Identifier) {
                    Some(self.parse_identifier()?)
                } else {
                    None
                };
                self.consume(TokenKind::Semicolon, "';' after break")?;
                Ok(Statement::Break(BreakStatement { label, position }))
            }
            TokenKind::Continue => {
                let position = self.position();
                self.advance();
                let label = if self.check(TokenKind::Identifier) {
                    Some(self.parse_identifier()?)
                } else {
                    None
                };
                self.consume(TokenKind::Semicolon, "';' after continue")?;
                Ok(Statement::Continue(ContinueStatement { label, position }))
            }
            TokenKind::Assert => {
                let position = self.position();
                self.advance();
                let condition = self.parse_expression()?;
                let message = if self.match_token(TokenKind::Colon) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                self.consume(TokenKind::Semicolon, "';' after assert")?;
                Ok(Statement::Assert(AssertStatement {
                    condition,
                    message,
                    position,
                }))
            }
            TokenKind::Synchronized if self.look_ahead(1) == TokenKind::LParen => {
                let position = self.position();
                self.advance();
                self.consume(TokenKind::LParen, "'(' after 'synchronized'")?;
                let lock = self.parse_expression()?;
                self.consume(TokenKind::RParen, "')' after lock expression")?;
                let block = self.parse_block()?;
                Ok(Statement::Synchronized(SynchronizedStatement {
                    lock,
                    block,
                    position,
                }))
            }
            TokenKind::Identifier if self.look_ahead(1) == TokenKind::Colon => {
                let position = self.position();
                let label = self.parse_identifier()?;
                self.advance(); // ':'
                let statement = Box::new(self.parse_statement()?);
                Ok(Statement::Labeled(LabeledStatement {
                    label,
                    statement,
                    position,
                }))
            }
            _ => self.parse_declaration_or_expression_statement(),
        }
    }

    fn parse_declaration_or_expression_statement(&mut self) -> Result<Statement> {
        // Local type declaration, possibly behind modifiers/annotations
        {
            let save = self.mark();
            let position = self.position();
            let documentation = self.pending_javadoc();
            if let Ok((modifiers, annotations)) = self.parse_modifiers_and_annotations() {
                if matches!(
                    self.peek().kind,
                    TokenKind::Class | TokenKind::Interface | TokenKind::Enum
                ) || (self.check(TokenKind::At) && self.look_ahead(1) == TokenKind::Interface)
                {
                    let decl = self.parse_type_declaration_rest(
                        modifiers,
                        annotations,
                        documentation,
                        position,
                    )?;
                    return Ok(Statement::TypeDeclaration(decl));
                }
            }
            self.reset(save);
        }

        // Local variable declaration, decided by a speculative type
        // parse followed by an identifier
        {
            let save = self.mark();
            if let Ok(decl) = self.try_parse_local_variable() {
                self.consume(TokenKind::Semicolon, "';' after variable declaration")?;
                return Ok(Statement::LocalVariable(decl));
            }
            self.reset(save);
        }

        let position = self.position();
        let expression = self.parse_expression()?;
        self.consume(TokenKind::Semicolon, "';' after expression")?;
        Ok(Statement::Expression(ExpressionStatement {
            expression,
            position,
        }))
    }

    /// Speculative helper: modifiers, a type, and a following identifier
    /// introduce a local variable declaration. Callers reset on error.
    fn try_parse_local_variable(&mut self) -> Result<LocalVariableDeclaration> {
        let position = self.position();
        let (modifiers, annotations) = self.parse_modifiers_and_annotations()?;
        let ty = self.parse_type()?;
        if !self.check(TokenKind::Identifier) {
            return Err(self.unexpected("variable name"));
        }
        // `a.b(x)` parses as a type followed by '('; an identifier here
        // is what actually distinguishes a declaration
        let declarators = self.parse_variable_declarators()?;
        Ok(LocalVariableDeclaration {
            modifiers,
            annotations,
            ty,
            declarators,
            position,
        })
    }

    fn parse_if_statement(&mut self) -> Result<Statement> {
        let position = self.position();
        self.consume(TokenKind::If, "'if'")?;
        self.consume(TokenKind::LParen, "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "')' after condition")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            condition,
            then_branch,
            else_branch,
            position,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement> {
        let position = self.position();
        self.consume(TokenKind::While, "'while'")?;
        self.consume(TokenKind::LParen, "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "')' after condition")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While(WhileStatement {
            condition,
            body,
            position,
        }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement> {
        let position = self.position();
        self.consume(TokenKind::Do, "'do'")?;
        let body = Box::new(self.parse_statement()?);
        self.consume(TokenKind::While, "'while' after do body")?;
        self.consume(TokenKind::LParen, "'(' after 'while'")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RParen, "')' after condition")?;
        self.consume(TokenKind::Semicolon, "';' after do-while")?;
        Ok(Statement::DoWhile(DoWhileStatement {
            body,
            condition,
            position,
        }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement> {
        let position = self.position();
        self.consume(TokenKind::For, "'for'")?;
        self.consume(TokenKind::LParen, "'(' after 'for'")?;

        // Enhanced for: `Type name : expr`
        {
            let save = self.mark();
            if let Ok(variable) = self.try_parse_foreach_variable() {
                if self.match_token(TokenKind::Colon) {
                    let iterable = self.parse_expression()?;
                    self.consume(TokenKind::RParen, "')' after for-each header")?;
                    let body = Box::new(self.parse_statement()?);
                    return Ok(Statement::ForEach(ForEachStatement {
                        variable,
                        iterable,
                        body,
                        position,
                    }));
                }
            }
            self.reset(save);
        }

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else {
            let save = self.mark();
            match self.try_parse_local_variable() {
                Ok(decl) => Some(ForInit::Declaration(decl)),
                Err(_) => {
                    self.reset(save);
                    let mut expressions = vec![self.parse_expression()?];
                    while self.match_token(TokenKind::Comma) {
                        expressions.push(self.parse_expression()?);
                    }
                    Some(ForInit::Expressions(expressions))
                }
            }
        };
        self.consume(TokenKind::Semicolon, "';' after for initializer")?;

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon, "';' after for condition")?;

        let mut update = Vec::new();
        if !self.check(TokenKind::RParen) {
            update.push(self.parse_expression()?);
            while self.match_token(TokenKind::Comma) {
                update.push(self.parse_expression()?);
            }
        }
        self.consume(TokenKind::RParen, "')' after for header")?;

        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(ForStatement {
            init,
            condition,
            update,
            body,
            position,
        }))
    }

    fn try_parse_foreach_variable(&mut self) -> Result<FormalParameter> {
        let position = self.position();
        let (modifiers, annotations) = self.parse_modifiers_and_annotations()?;
        let ty = self.parse_type()?;
        let name = self.parse_identifier()?;
        if !self.check(TokenKind::Colon) {
            return Err(self.unexpected("':'"));
        }
        Ok(FormalParameter {
            modifiers,
            annotations,
            ty,
            name,
            varargs: false,
            position,
        })
    }

    fn parse_switch_statement(&mut self) -> Result<Statement> {
        let position = self.position();
        self.consume(TokenKind::Switch, "'switch'")?;
        self.consume(TokenKind::LParen, "'(' after 'switch'")?;
        let selector = self.parse_expression()?;
        self.consume(TokenKind::RParen, "')' after selector")?;
        self.consume(TokenKind::LBrace, "'{' after switch header")?;

        let mut cases = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let case_position = self.position();
            let mut labels = Vec::new();
            let mut is_default = false;
            loop {
                if self.match_token(TokenKind::Case) {
                    labels.push(self.parse_conditional()?);
                    self.consume(TokenKind::Colon, "':' after case label")?;
                } else if self.check(TokenKind::Default)
                    && self.look_ahead(1) == TokenKind::Colon
                {
                    self.advance();
                    self.advance();
                    is_default = true;
                    labels.clear();
                } else {
                    break;
                }
            }
            if labels.is_empty() && !is_default {
                return Err(self.unexpected("'case' or 'default'"));
            }
            let mut statements = Vec::new();
            while !matches!(
                self.peek().kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace
            ) && !self.is_at_end()
            {
                statements.push(self.parse_statement()?);
            }
            cases.push(SwitchCase {
                labels,
                statements,
                position: case_position,
            });
        }
        self.consume(TokenKind::RBrace, "'}' after switch body")?;
        Ok(Statement::Switch(SwitchStatement {
            selector,
            cases,
            position,
        }))
    }

    fn parse_try_statement(&mut self) -> Result<Statement> {
        let position = self.position();
        self.consume(TokenKind::Try, "'try'")?;

        let mut resources = Vec::new();
        if self.match_token(TokenKind::LParen) {
            loop {
                resources.push(self.parse_try_resource()?);
                if !self.match_token(TokenKind::Semicolon) {
                    break;
                }
                if self.check(TokenKind::RParen) {
                    break;
                }
            }
            self.consume(TokenKind::RParen, "')' after resources")?;
        }

        let block = self.parse_block()?;

        let mut catches = Vec::new();
        while self.check(TokenKind::Catch) {
            catches.push(self.parse_catch_clause()?);
        }

        let finally_block = if self.match_token(TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if resources.is_empty() && catches.is_empty() && finally_block.is_none() {
            return Err(self.unexpected("'catch' or 'finally'"));
        }

        Ok(Statement::Try(TryStatement {
            resources,
            block,
            catches,
            finally_block,
            position,
        }))
    }

    fn parse_try_resource(&mut self) -> Result<TryResource> {
        let position = self.position();
        let (modifiers, annotations) = self.parse_modifiers_and_annotations()?;
        let ty = self.parse_type()?;
        let name = self.parse_identifier()?;
        self.consume(TokenKind::Assign, "'=' in resource declaration")?;
        let value = self.parse_expression()?;
        Ok(TryResource {
            modifiers,
            annotations,
            ty,
            name,
            value,
            position,
        })
    }

    fn parse_catch_clause(&mut self) -> Result<CatchClause> {
        let position = self.position();
        self.consume(TokenKind::Catch, "'catch'")?;
        self.consume(TokenKind::LParen, "'(' after 'catch'")?;
        let (modifiers, annotations) = self.parse_modifiers_and_annotations()?;
        let mut types = vec![self.parse_reference_type(Vec::new())?];
        while self.match_token(TokenKind::Pipe) {
            types.push(self.parse_reference_type(Vec::new())?);
        }
        let name = self.parse_identifier()?;
        self.consume(TokenKind::RParen, "')' after catch parameter")?;
        let block = self.parse_block()?;
        Ok(CatchClause {
            modifiers,
            annotations,
            types,
            name,
            block,
            position,
        })
    }

    // Expressions

    pub(crate) fn parse_expression(&mut self) -> Result<Expression> {
        // Lambda: a bare identifier or a parenthesized parameter list
        // directly followed by `->`
        if self.check(TokenKind::Identifier) && self.look_ahead(1) == TokenKind::Arrow {
            return self.parse_lambda_with_inferred_parameter();
        }
        if self.check(TokenKind::LParen) {
            let save = self.mark();
            match self.parse_lambda_parameters() {
                Ok(parameters) if self.check(TokenKind::Arrow) => {
                    return self.parse_lambda_rest(parameters, save);
                }
                _ => self.reset(save),
            }
        }

        let expr = self.parse_conditional()?;

        let operator = match self.peek().kind {
            TokenKind::Assign => Some(AssignmentOperator::Assign),
            TokenKind::AddAssign => Some(AssignmentOperator::AddAssign),
            TokenKind::SubAssign => Some(AssignmentOperator::SubAssign),
            TokenKind::MulAssign => Some(AssignmentOperator::MulAssign),
            TokenKind::DivAssign => Some(AssignmentOperator::DivAssign),
            TokenKind::RemAssign => Some(AssignmentOperator::RemAssign),
            TokenKind::AndAssign => Some(AssignmentOperator::AndAssign),
            TokenKind::OrAssign => Some(AssignmentOperator::OrAssign),
            TokenKind::XorAssign => Some(AssignmentOperator::XorAssign),
            TokenKind::LShiftAssign => Some(AssignmentOperator::ShiftLeftAssign),
            TokenKind::RShiftAssign => Some(AssignmentOperator::ShiftRightAssign),
            TokenKind::URShiftAssign => Some(AssignmentOperator::UnsignedShiftRightAssign),
            _ => None,
        };

        if let Some(operator) = operator {
            let position = expr.position();
            self.advance();
            // Right-associative
            let value = self.parse_expression()?;
            return Ok(Expression::Assignment(Assignment {
                target: Box::new(expr),
                operator,
                value: Box::new(value),
                position,
            }));
        }
        Ok(expr)
    }

    fn parse_conditional(&mut self) -> Result<Expression> {
        let condition = self.parse_logical_or()?;
        if self.match_token(TokenKind::Question) {
            let position = condition.position();
            let if_true = self.parse_expression()?;
            self.consume(TokenKind::Colon, "':' in conditional expression")?;
            let if_false = self.parse_expression()?;
            return Ok(Expression::Ternary(TernaryExpression {
                condition: Box::new(condition),
                if_true: Box::new(if_true),
                if_false: Box::new(if_false),
                position,
            }));
        }
        Ok(condition)
    }

    fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
        let position = left.position();
        Expression::Binary(BinaryOperation {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            position,
        })
    }

    fn parse_logical_or(&mut self) -> Result<Expression> {
        let mut expr = self.parse_logical_and()?;
        while self.match_token(TokenKind::PipePipe) {
            let right = self.parse_logical_and()?;
            expr = Self::binary(expr, BinaryOperator::LogicalOr, right);
        }
        Ok(expr)
    }

    fn parse_logical_and(&mut self) -> Result<Expression> {
        let mut expr = self.parse_bit_or()?;
        while self.match_token(TokenKind::AndAnd) {
            let right = self.parse_bit_or()?;
            expr = Self::binary(expr, BinaryOperator::LogicalAnd, right);
        }
        Ok(expr)
    }

    fn parse_bit_or(&mut self) -> Result<Expression> {
        let mut expr = self.parse_bit_xor()?;
        while self.match_token(TokenKind::Pipe) {
            let right = self.parse_bit_xor()?;
            expr = Self::binary(expr, BinaryOperator::BitOr, right);
        }
        Ok(expr)
    }

    fn parse_bit_xor(&mut self) -> Result<Expression> {
        let mut expr = self.parse_bit_and()?;
        while self.match_token(TokenKind::Caret) {
            let right = self.parse_bit_and()?;
            expr = Self::binary(expr, BinaryOperator::BitXor, right);
        }
        Ok(expr)
    }

    fn parse_bit_and(&mut self) -> Result<Expression> {
        let mut expr = self.parse_equality()?;
        while self.match_token(TokenKind::Amp) {
            let right = self.parse_equality()?;
            expr = Self::binary(expr, BinaryOperator::BitAnd, right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut expr = self.parse_relational()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Eq => BinaryOperator::Equal,
                TokenKind::Ne => BinaryOperator::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            expr = Self::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn parse_relational(&mut self) -> Result<Expression> {
        let mut expr = self.parse_shift()?;
        loop {
            match self.peek().kind {
                TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge => {
                    let operator = match self.peek().kind {
                        TokenKind::Lt => BinaryOperator::Less,
                        TokenKind::Gt => BinaryOperator::Greater,
                        TokenKind::Le => BinaryOperator::LessEqual,
                        _ => BinaryOperator::GreaterEqual,
                    };
                    self.advance();
                    let right = self.parse_shift()?;
                    expr = Self::binary(expr, operator, right);
                }
                TokenKind::InstanceOf => {
                    let position = expr.position();
                    self.advance();
                    let target_type = self.parse_type()?;
                    expr = Expression::InstanceOf(InstanceOf {
                        expression: Box::new(expr),
                        target_type,
                        position,
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_shift(&mut self) -> Result<Expression> {
        let mut expr = self.parse_additive()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::LShift => BinaryOperator::ShiftLeft,
                TokenKind::RShift => BinaryOperator::ShiftRight,
                TokenKind::URShift => BinaryOperator::UnsignedShiftRight,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            expr = Self::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = Self::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut expr = self.parse_unary()?;
        loop {
            let operator = match self.peek().kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::Percent => BinaryOperator::Remainder,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = Self::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let operator = match self.peek().kind {
            TokenKind::Inc => Some(UnaryOperator::PreIncrement),
            TokenKind::Dec => Some(UnaryOperator::PreDecrement),
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Minus => Some(UnaryOperator::Minus),
            TokenKind::Bang => Some(UnaryOperator::Not),
            TokenKind::Tilde => Some(UnaryOperator::BitNot),
            _ => None,
        };
        if let Some(operator) = operator {
            let position = self.position();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary(UnaryOperation {
                operator,
                operand: Box::new(operand),
                position,
            }));
        }

        if self.check(TokenKind::LParen) {
            if let Some(cast) = self.try_parse_cast()? {
                return Ok(cast);
            }
        }

        self.parse_postfix()
    }

    /// Cast vs. parenthesized expression. After `(`, a type followed by
    /// `)` is a cast when the next token can begin a unary expression;
    /// the whole attempt (operand included) is speculative, so failures
    /// fall back to the parenthesized reading.
    fn try_parse_cast(&mut self) -> Result<Option<Expression>> {
        let save = self.mark();
        let position = self.position();
        self.advance(); // '('

        // A primitive type after '(' is always a cast
        let primitive = self.peek().kind.is_basic_type();

        let attempt = (|| -> Result<Expression> {
            let target_type = self.parse_type()?;
            self.consume(TokenKind::RParen, "')' after cast type")?;
            if !primitive && !Self::can_begin_cast_operand(self.peek().kind) {
                return Err(self.unexpected("cast operand"));
            }
            // A lambda may be the operand of a reference-type cast:
            // `(Runnable) () -> {}`
            let expression = self.parse_lambda_or_unary()?;
            Ok(Expression::Cast(Cast {
                target_type,
                expression: Box::new(expression),
                position,
            }))
        })();

        match attempt {
            Ok(cast) => Ok(Some(cast)),
            Err(err) if primitive => Err(err),
            Err(_) => {
                log::trace!("cast speculation failed at {}, backtracking", position);
                self.reset(save);
                Ok(None)
            }
        }
    }

    /// Tokens that can begin the operand of a reference-type cast.
    /// `+`/`-` are excluded: `(a) - b` is a subtraction.
    fn can_begin_cast_operand(kind: TokenKind) -> bool {
        kind == TokenKind::Identifier
            || kind.is_literal()
            || kind.is_basic_type()
            || matches!(
                kind,
                TokenKind::LParen
                    | TokenKind::Bang
                    | TokenKind::Tilde
                    | TokenKind::New
                    | TokenKind::This
                    | TokenKind::Super
                    | TokenKind::Inc
                    | TokenKind::Dec
            )
    }

    fn parse_lambda_or_unary(&mut self) -> Result<Expression> {
        if self.check(TokenKind::Identifier) && self.look_ahead(1) == TokenKind::Arrow {
            return self.parse_lambda_with_inferred_parameter();
        }
        if self.check(TokenKind::LParen) {
            let save = self.mark();
            match self.parse_lambda_parameters() {
                Ok(parameters) if self.check(TokenKind::Arrow) => {
                    return self.parse_lambda_rest(parameters, save);
                }
                _ => self.reset(save),
            }
        }
        self.parse_unary()
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    expr = self.parse_selector(expr)?;
                }
                TokenKind::LBracket => {
                    let position = expr.position();
                    self.advance();
                    let index = self.parse_expression()?;
                    self.consume(TokenKind::RBracket, "']' after array index")?;
                    expr = Expression::ArraySelector(ArraySelector {
                        array: Box::new(expr),
                        index: Box::new(index),
                        position,
                    });
                }
                TokenKind::DoubleColon => {
                    self.advance();
                    expr = self.parse_method_reference_rest(expr)?;
                }
                TokenKind::LParen => {
                    // An argument list directly after a bare name is an
                    // unqualified invocation
                    if let Expression::Name(name) = &expr {
                        let member = name.name.clone();
                        let position = name.position;
                        self.advance();
                        let arguments = if self.check(TokenKind::RParen) {
                            Vec::new()
                        } else {
                            self.parse_argument_list()?
                        };
                        self.consume(TokenKind::RParen, "')' after arguments")?;
                        expr = Expression::MethodInvocation(MethodInvocation {
                            qualifier: None,
                            type_arguments: None,
                            member,
                            arguments,
                            position,
                        });
                    } else {
                        break;
                    }
                }
                TokenKind::Inc | TokenKind::Dec => {
                    let operator = if self.peek().kind == TokenKind::Inc {
                        UnaryOperator::PostIncrement
                    } else {
                        UnaryOperator::PostDecrement
                    };
                    let position = expr.position();
                    self.advance();
                    expr = Expression::Unary(UnaryOperation {
                        operator,
                        operand: Box::new(expr),
                        position,
                    });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// One `.` selector applied to `expr`; the dot is already consumed.
    fn parse_selector(&mut self, expr: Expression) -> Result<Expression> {
        let position = expr.position();

        // Explicit type arguments introduce a generic invocation:
        // `obj.<T>method(args)`
        if self.check(TokenKind::Lt) {
            let type_arguments = Some(self.parse_type_arguments()?);
            let member = self.parse_identifier()?;
            self.consume(TokenKind::LParen, "'(' after generic method name")?;
            let arguments = if self.check(TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_argument_list()?
            };
            self.consume(TokenKind::RParen, "')' after arguments")?;
            return Ok(Expression::MethodInvocation(MethodInvocation {
                qualifier: Some(Box::new(expr)),
                type_arguments,
                member,
                arguments,
                position,
            }));
        }

        // Qualified this: `Outer.this`
        if self.check(TokenKind::This) {
            self.advance();
            let qualifier = Self::expression_as_name(&expr)
                .ok_or_else(|| self.unexpected("type name before '.this'"))?;
            return Ok(Expression::This(ThisExpression {
                qualifier: Some(qualifier),
                position,
            }));
        }

        // Qualified super call: `Outer.super.m(args)`
        if self.check(TokenKind::Super) {
            self.advance();
            let qualifier = Self::expression_as_name(&expr)
                .ok_or_else(|| self.unexpected("type name before '.super'"))?;
            self.consume(TokenKind::Dot, "'.' after 'super'")?;
            let type_arguments = if self.check(TokenKind::Lt) {
                Some(self.parse_type_arguments()?)
            } else {
                None
            };
            let member = self.parse_identifier()?;
            self.consume(TokenKind::LParen, "'(' after super method name")?;
            let arguments = if self.check(TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_argument_list()?
            };
            self.consume(TokenKind::RParen, "')' after arguments")?;
            return Ok(Expression::SuperMethodInvocation(SuperMethodInvocation {
                qualifier: Some(qualifier),
                type_arguments,
                member,
                arguments,
                position,
            }));
        }

        // Qualified instance creation: `outer.new Inner(args)`
        if self.check(TokenKind::New) {
            self.advance();
            let target_type = self.parse_reference_type(Vec::new())?;
            self.consume(TokenKind::LParen, "'(' after inner class name")?;
            let arguments = if self.check(TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_argument_list()?
            };
            self.consume(TokenKind::RParen, "')' after arguments")?;
            let body = if self.check(TokenKind::LBrace) {
                Some(self.parse_class_body()?)
            } else {
                None
            };
            return Ok(Expression::InnerClassCreation(InnerClassCreation {
                qualifier: Box::new(expr),
                target_type,
                arguments,
                body,
                position,
            }));
        }

        let member = self.parse_identifier()?;
        if self.check(TokenKind::LParen) {
            self.advance();
            let arguments = if self.check(TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_argument_list()?
            };
            self.consume(TokenKind::RParen, "')' after arguments")?;
            Ok(Expression::MethodInvocation(MethodInvocation {
                qualifier: Some(Box::new(expr)),
                type_arguments: None,
                member,
                arguments,
                position,
            }))
        } else {
            Ok(Expression::MemberReference(MemberReference {
                qualifier: Some(Box::new(expr)),
                member,
                position,
            }))
        }
    }

    fn parse_method_reference_rest(&mut self, qualifier: Expression) -> Result<Expression> {
        let position = qualifier.position();
        let type_arguments = if self.check(TokenKind::Lt) {
            Some(self.parse_type_arguments()?)
        } else {
            None
        };
        let member = if self.match_token(TokenKind::New) {
            "new".to_string()
        } else {
            self.parse_identifier()?
        };
        Ok(Expression::MethodReference(MethodReference {
            qualifier: Box::new(qualifier),
            type_arguments,
            member,
            position,
        }))
    }

    /// Flatten a name chain (`Name` or dotted `MemberReference`s over
    /// names) back into a dotted string.
    fn expression_as_name(expr: &Expression) -> Option<String> {
        match expr {
            Expression::Name(name) => Some(name.name.clone()),
            Expression::MemberReference(reference) => match &reference.qualifier {
                Some(qualifier) => Self::expression_as_name(qualifier)
                    .map(|prefix| format!("{}.{}", prefix, reference.member)),
                None => Some(reference.member.clone()),
            },
            _ => None,
        }
    }

    fn parse_argument_list(&mut self) -> Result<Vec<Expression>> {
        let mut arguments = vec![self.parse_expression()?];
        while self.match_token(TokenKind::Comma) {
            arguments.push(self.parse_expression()?);
        }
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let position = self.position();

        if let Some(kind) = self.peek().kind.literal_kind() {
            let text = self.advance().text.clone();
            return Ok(Expression::Literal(Literal {
                kind,
                text,
                position,
            }));
        }

        match self.peek().kind {
            TokenKind::LParen => {
                // Lambda and cast readings were rejected upstream
                self.advance();
                let expression = self.parse_expression()?;
                self.consume(TokenKind::RParen, "')' after expression")?;
                Ok(Expression::Parenthesized(ParenthesizedExpression {
                    expression: Box::new(expression),
                    position,
                }))
            }
            TokenKind::This => {
                self.advance();
                if self.check(TokenKind::LParen) {
                    self.advance();
                    let arguments = if self.check(TokenKind::RParen) {
                        Vec::new()
                    } else {
                        self.parse_argument_list()?
                    };
                    self.consume(TokenKind::RParen, "')' after constructor arguments")?;
                    return Ok(Expression::ExplicitConstructorInvocation(
                        ExplicitConstructorInvocation {
                            is_super: false,
                            arguments,
                            position,
                        },
                    ));
                }
                Ok(Expression::This(ThisExpression {
                    qualifier: None,
                    position,
                }))
            }
            TokenKind::Super => {
                self.advance();
                if self.check(TokenKind::LParen) {
                    self.advance();
                    let arguments = if self.check(TokenKind::RParen) {
                        Vec::new()
                    } else {
                        self.parse_argument_list()?
                    };
                    self.consume(TokenKind::RParen, "')' after constructor arguments")?;
                    return Ok(Expression::ExplicitConstructorInvocation(
                        ExplicitConstructorInvocation {
                            is_super: true,
                            arguments,
                            position,
                        },
                    ));
                }
                self.consume(TokenKind::Dot, "'.' after 'super'")?;
                let type_arguments = if self.check(TokenKind::Lt) {
                    Some(self.parse_type_arguments()?)
                } else {
                    None
                };
                let member = self.parse_identifier()?;
                if self.check(TokenKind::LParen) {
                    self.advance();
                    let arguments = if self.check(TokenKind::RParen) {
                        Vec::new()
                    } else {
                        self.parse_argument_list()?
                    };
                    self.consume(TokenKind::RParen, "')' after arguments")?;
                    Ok(Expression::SuperMethodInvocation(SuperMethodInvocation {
                        qualifier: None,
                        type_arguments,
                        member,
                        arguments,
                        position,
                    }))
                } else {
                    // Field access through super
                    Ok(Expression::MemberReference(MemberReference {
                        qualifier: Some(Box::new(Expression::Name(Name {
                            name: "super".to_string(),
                            position,
                        }))),
                        member,
                        position,
                    }))
                }
            }
            TokenKind::New => self.parse_creation(),
            TokenKind::Void => {
                if self.look_ahead(1) == TokenKind::Dot && self.look_ahead(2) == TokenKind::Class {
                    self.advance();
                    self.advance();
                    self.advance();
                    Ok(Expression::VoidClassReference(VoidClassReference {
                        position,
                    }))
                } else {
                    Err(self.unexpected("expression"))
                }
            }
            TokenKind::Lt => {
                // Explicit generic invocation: `<T>method(args)`
                let save = self.mark();
                let attempt = (|| -> Result<Expression> {
                    let type_arguments = Some(self.parse_type_arguments()?);
                    let member = self.parse_identifier()?;
                    self.consume(TokenKind::LParen, "'(' after generic method name")?;
                    let arguments = if self.check(TokenKind::RParen) {
                        Vec::new()
                    } else {
                        self.parse_argument_list()?
                    };
                    self.consume(TokenKind::RParen, "')' after arguments")?;
                    Ok(Expression::MethodInvocation(MethodInvocation {
                        qualifier: None,
                        type_arguments,
                        member,
                        arguments,
                        position,
                    }))
                })();
                match attempt {
                    Ok(expr) => Ok(expr),
                    Err(_) => {
                        self.reset(save);
                        Err(self.unexpected("expression"))
                    }
                }
            }
            kind if kind == TokenKind::Identifier || kind.is_basic_type() => {
                self.parse_class_literal_or_name()
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// A primary starting with a type-ish token: a class literal
    /// (`T.class`, `int[].class`), a type qualifying a method reference
    /// (`ArrayList<String>::new`), or a plain name.
    fn parse_class_literal_or_name(&mut self) -> Result<Expression> {
        let position = self.position();

        // Speculate on a full type; commit only when `.class` or `::`
        // follows. A bare name followed by anything else skips the
        // attempt.
        let worth_trying = self.peek().kind.is_basic_type()
            || matches!(
                self.look_ahead(1),
                TokenKind::Dot | TokenKind::Lt | TokenKind::LBracket
            );
        if worth_trying {
            let save = self.mark();
            if let Ok(ty) = self.parse_type() {
                if self.check(TokenKind::Dot) && self.look_ahead(1) == TokenKind::Class {
                    self.advance(); // '.'
                    self.advance(); // 'class'
                    return Ok(Expression::ClassReference(ClassReference {
                        target_type: ty,
                        position,
                    }));
                }
                if self.check(TokenKind::DoubleColon) && ty.dimensions() == 0 {
                    if let Type::Reference(reference) = &ty {
                        // Only a parameterized qualifier needs the type
                        // reading; plain names go through the postfix
                        // selector loop unchanged
                        if Self::has_type_arguments(reference) {
                            let name = Self::reference_type_name(reference);
                            return Ok(Expression::Name(Name { name, position }));
                        }
                    }
                }
            }
            self.reset(save);
        }

        if self.peek().kind.is_basic_type() {
            return Err(self.unexpected("expression"));
        }
        let name = self.parse_identifier()?;
        Ok(Expression::Name(Name { name, position }))
    }

    fn has_type_arguments(reference: &ReferenceType) -> bool {
        reference.type_arguments.is_some()
            || reference
                .sub_type
                .as_ref()
                .is_some_and(|sub| Self::has_type_arguments(sub))
    }

    fn reference_type_name(reference: &ReferenceType) -> String {
        let mut name = reference.name.clone();
        let mut current = &reference.sub_type;
        while let Some(sub) = current {
            name.push('.');
            name.push_str(&sub.name);
            current = &sub.sub_type;
        }
        name
    }

    /// `new`: array creation or instance creation, with optional
    /// anonymous class body.
    fn parse_creation(&mut self) -> Result<Expression> {
        let position = self.position();
        self.consume(TokenKind::New, "'new'")?;

        let element_type = if self.peek().kind.is_basic_type() {
            let type_position = self.position();
            let name = Self::primitive_of(self.advance().kind);
            Type::Basic(BasicType {
                name,
                dimensions: 0,
                position: type_position,
            })
        } else {
            Type::Reference(self.parse_reference_type(Vec::new())?)
        };

        if self.check(TokenKind::LBracket) {
            let mut dimensions = Vec::new();
            while self.match_token(TokenKind::LBracket) {
                if self.match_token(TokenKind::RBracket) {
                    dimensions.push(None);
                } else {
                    dimensions.push(Some(self.parse_expression()?));
                    self.consume(TokenKind::RBracket, "']' in array creation")?;
                }
            }
            let initializer = if self.check(TokenKind::LBrace) {
                Some(self.parse_array_initializer()?)
            } else {
                None
            };
            return Ok(Expression::ArrayCreation(ArrayCreation {
                element_type,
                dimensions,
                initializer,
                position,
            }));
        }

        let target_type = match element_type {
            Type::Reference(reference) => reference,
            Type::Basic(_) => return Err(self.unexpected("'[' after primitive type")),
        };

        self.consume(TokenKind::LParen, "'(' after class name")?;
        let arguments = if self.check(TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_argument_list()?
        };
        self.consume(TokenKind::RParen, "')' after constructor arguments")?;

        let body = if self.check(TokenKind::LBrace) {
            Some(self.parse_class_body()?)
        } else {
            None
        };

        Ok(Expression::InstanceCreation(InstanceCreation {
            target_type,
            arguments,
            body,
            position,
        }))
    }

    // Lambdas

    fn parse_lambda_with_inferred_parameter(&mut self) -> Result<Expression> {
        let position = self.position();
        let name = self.parse_identifier()?;
        let parameter = LambdaParameter::Inferred(InferredParameter { name, position });
        self.consume(TokenKind::Arrow, "'->'")?;
        let body = self.parse_lambda_body()?;
        Ok(Expression::Lambda(LambdaExpression {
            parameters: vec![parameter],
            body,
            position,
        }))
    }

    fn parse_lambda_rest(
        &mut self,
        parameters: Vec<LambdaParameter>,
        start: Mark,
    ) -> Result<Expression> {
        let position = self.tokens[start.cursor].position;
        self.consume(TokenKind::Arrow, "'->'")?;
        let body = self.parse_lambda_body()?;
        Ok(Expression::Lambda(LambdaExpression {
            parameters,
            body,
            position,
        }))
    }

    fn parse_lambda_body(&mut self) -> Result<LambdaBody> {
        if self.check(TokenKind::LBrace) {
            Ok(LambdaBody::Block(self.parse_block()?))
        } else {
            Ok(LambdaBody::Expression(Box::new(self.parse_expression()?)))
        }
    }

    /// Speculative: a parenthesized lambda parameter list. Recognizes
    /// `()`, `(a)`, `(a, b)` and fully typed parameter lists; the caller
    /// resets unless `->` follows.
    fn parse_lambda_parameters(&mut self) -> Result<Vec<LambdaParameter>> {
        self.consume(TokenKind::LParen, "'('")?;
        if self.match_token(TokenKind::RParen) {
            return Ok(Vec::new());
        }

        // Untyped parameter list: identifiers separated by commas
        if self.check(TokenKind::Identifier)
            && matches!(self.look_ahead(1), TokenKind::Comma | TokenKind::RParen)
        {
            let mut parameters = Vec::new();
            loop {
                let position = self.position();
                let name = self.parse_identifier()?;
                parameters.push(LambdaParameter::Inferred(InferredParameter {
                    name,
                    position,
                }));
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::RParen, "')' after lambda parameters")?;
            return Ok(parameters);
        }

        // Typed parameter list
        let mut parameters = Vec::new();
        loop {
            parameters.push(LambdaParameter::Typed(self.parse_formal_parameter()?));
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RParen, "')' after lambda parameters")?;
        Ok(parameters)
    }
}

/// Parse a whole source text into a compilation unit.
pub fn parse(source: &str) -> Result<CompilationUnit> {
    let mut parser = Parser::new(source)?;
    parser.parse_compilation_unit()
}

/// Parse a single expression.
pub fn parse_expression(source: &str) -> Result<Expression> {
    let mut parser = Parser::new(source)?;
    let expression = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(expression)
}

/// Parse a single class member declaration (field, method, constructor,
/// initializer or nested type).
pub fn parse_member_declaration(source: &str) -> Result<MemberDeclaration> {
    let mut parser = Parser::new(source)?;
    let member = parser.parse_member_declaration()?;
    parser.expect_end()?;
    Ok(member)
}

/// Parse a single type use, such as `Map<String, List<Integer>>[]`.
pub fn parse_type(source: &str) -> Result<Type> {
    let mut parser = Parser::new(source)?;
    let ty = parser.parse_type()?;
    parser.expect_end()?;
    Ok(ty)
}
