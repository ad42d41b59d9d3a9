//! Recursive-descent parser for NDL token streams.
//!
//! Consumes the token vector produced by the [`Lexer`](crate::lexer::Lexer)
//! and builds the [`Ast`]. Fails fast with a rendered source pointer on
//! the first structural error.

use crate::ast::{Ast, AstImport, AstMember, AstMemberType, AstObject, AstValue, IdToken};
use crate::error::{render_pointer, Result, SyntaxError};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use ndl_core::{Location, Operator};
use std::sync::Arc;

/// Parse one `.ndl` file into its AST.
pub fn parse(file: impl AsRef<str>, source: &str) -> Result<Ast> {
    let file: Arc<str> = Arc::from(file.as_ref());
    let tokens = Lexer::new(file.as_ref(), source).tokenize()?;
    Parser {
        file,
        source,
        tokens,
        pos: 0,
    }
    .parse_file()
}

struct Parser<'a> {
    file: Arc<str>,
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_file(mut self) -> Result<Ast> {
        let mut imports = Vec::new();
        while self.peek() == &TokenKind::KwImport {
            imports.push(self.parse_import()?);
        }

        let mut objects = Vec::new();
        while self.peek() != &TokenKind::Eof {
            objects.push(self.parse_object()?);
        }

        Ok(Ast { imports, objects })
    }

    fn parse_import(&mut self) -> Result<AstImport> {
        self.expect(TokenKind::KwImport, "import")?;
        let namespace = self.expect_ident("imported namespace")?;

        let alias = if self.peek() == &TokenKind::KwAs {
            self.advance();
            let alias = self.expect_ident("import alias")?;
            if alias.text.contains('.') {
                return Err(self.error_at(
                    &alias.location,
                    "import alias must be a plain name, not a dotted path",
                ));
            }
            Some(alias)
        } else {
            None
        };

        self.expect(TokenKind::Newline, "end of import")?;
        Ok(AstImport { namespace, alias })
    }

    fn parse_object(&mut self) -> Result<AstObject> {
        let name = self.expect_ident("object name")?;
        if name.text.contains('.') {
            return Err(self.error_at(
                &name.location,
                "object name must not be qualified; nesting defines namespaces",
            ));
        }

        let target = if self.peek() == &TokenKind::LAngle {
            self.advance();
            let target = self.expect_ident("patch target")?;
            self.expect(TokenKind::RAngle, "closing '>' after patch target")?;
            Some(target)
        } else {
            None
        };

        let mut inheritance_add = Vec::new();
        if self.peek() == &TokenKind::LBracket {
            self.advance();
            loop {
                self.expect(TokenKind::Plus, "'+' before added parent")?;
                inheritance_add.push(self.expect_ident("added parent")?);
                if self.peek() == &TokenKind::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
            self.expect(TokenKind::RBracket, "closing ']' after added parents")?;
        }

        if !inheritance_add.is_empty() && target.is_none() {
            return Err(self.error_at(
                &name.location,
                "only patches may add parents; declare a patch target with '<Target>'",
            ));
        }

        self.expect(TokenKind::LParen, "'(' before parent list")?;
        let mut parents = Vec::new();
        if self.peek() != &TokenKind::RParen {
            loop {
                parents.push(self.expect_ident("parent name")?);
                if self.peek() == &TokenKind::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "closing ')' after parent list")?;
        self.expect(TokenKind::Colon, "':' after object header")?;
        self.expect(TokenKind::Newline, "end of object header")?;
        self.expect(TokenKind::Indent, "indented object body")?;

        let mut members = Vec::new();
        let mut objects = Vec::new();

        if matches!(self.peek(), TokenKind::KwPass | TokenKind::Ellipsis) {
            self.advance();
            self.expect(TokenKind::Newline, "end of 'pass'")?;
        } else {
            while self.peek() != &TokenKind::Dedent {
                match self.peek() {
                    TokenKind::At => members.push(self.parse_member()?),
                    TokenKind::Ident(_) => match self.peek_second() {
                        TokenKind::LAngle | TokenKind::LBracket | TokenKind::LParen => {
                            objects.push(self.parse_object()?);
                        }
                        _ => members.push(self.parse_member()?),
                    },
                    _ => {
                        return Err(self.error_here("expected a member or a nested object"));
                    }
                }
            }
        }

        self.expect(TokenKind::Dedent, "end of object body")?;

        Ok(AstObject {
            name,
            target,
            inheritance_add,
            parents,
            members,
            objects,
        })
    }

    fn parse_member(&mut self) -> Result<AstMember> {
        let mut override_depth = 0u32;
        while self.peek() == &TokenKind::At {
            self.advance();
            override_depth += 1;
        }

        let name = self.expect_ident("member name")?;
        if name.text.contains('.') {
            return Err(self.error_at(&name.location, "member name must not be qualified"));
        }

        let member_type = if self.peek() == &TokenKind::Colon {
            self.advance();
            Some(self.parse_type()?)
        } else {
            None
        };

        let (operation, value) = if let TokenKind::Op(op) = self.peek() {
            let op = *op;
            self.advance();
            (Some(op), Some(self.parse_value()?))
        } else {
            (None, None)
        };

        if member_type.is_none() && value.is_none() {
            return Err(self.error_at(
                &name.location,
                format!("member '{}' needs a type or a value", name.text),
            ));
        }

        self.expect(TokenKind::Newline, "end of member declaration")?;

        Ok(AstMember {
            name,
            override_depth,
            member_type,
            operation,
            value,
        })
    }

    fn parse_type(&mut self) -> Result<AstMemberType> {
        let name = self.expect_ident("type name")?;

        let payload = if self.peek() == &TokenKind::LParen {
            self.advance();
            let inner = self.parse_type()?;
            self.expect(TokenKind::RParen, "closing ')' after element type")?;
            Some(Box::new(inner))
        } else {
            None
        };

        Ok(AstMemberType { name, payload })
    }

    fn parse_value(&mut self) -> Result<AstValue> {
        match self.peek().clone() {
            TokenKind::Int(v) => {
                self.advance();
                Ok(AstValue::Int(v))
            }
            TokenKind::Float(v) => {
                self.advance();
                Ok(AstValue::Float(v))
            }
            TokenKind::Str(v) => {
                self.advance();
                Ok(AstValue::Text(v))
            }
            TokenKind::True => {
                self.advance();
                Ok(AstValue::Bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(AstValue::Bool(false))
            }
            TokenKind::Ident(_) => {
                let reference = self.expect_ident("object reference")?;
                Ok(AstValue::Reference(reference))
            }
            TokenKind::LBrace => {
                self.advance();
                let values = self.parse_value_list(TokenKind::RBrace, "'}'")?;
                Ok(AstValue::Set(values))
            }
            TokenKind::LAngle => {
                self.advance();
                let values = self.parse_value_list(TokenKind::RAngle, "'>'")?;
                Ok(AstValue::OrderedSet(values))
            }
            _ => Err(self.error_here("expected a value")),
        }
    }

    fn parse_value_list(&mut self, close: TokenKind, what: &str) -> Result<Vec<AstValue>> {
        let mut values = Vec::new();
        if self.peek() != &close {
            loop {
                values.push(self.parse_value()?);
                if self.peek() == &TokenKind::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(close, what)?;
        Ok(values)
    }

    // === token cursor ===

    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn peek_second(&self) -> &TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, self.source.len(), self.source.len()));
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: TokenKind, context: &str) -> Result<Token> {
        if self.peek() == &expected {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected {context}, found {}",
                self.peek().describe()
            )))
        }
    }

    fn expect_ident(&mut self, context: &str) -> Result<IdToken> {
        match self.peek() {
            TokenKind::Ident(_) => {
                let token = self.advance();
                let TokenKind::Ident(text) = token.kind else {
                    unreachable!("peeked identifier");
                };
                let location = self.location_of(token.start, token.end);
                Ok(IdToken { text, location })
            }
            other => Err(self.error_here(format!(
                "expected {context}, found {}",
                other.describe()
            ))),
        }
    }

    // === locations and errors ===

    fn location_of(&self, start: usize, end: usize) -> Location {
        let (line, column) = crate::error::line_col(self.source, start);
        Location {
            file: self.file.clone(),
            line,
            column,
            length: (end - start) as u32,
        }
    }

    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        let position = self
            .tokens
            .get(self.pos)
            .map(|t| t.start)
            .unwrap_or(self.source.len());
        let (line, column, rendered) =
            render_pointer(self.source, position, &message.into());
        SyntaxError::parse(self.file.clone(), line, column, rendered)
    }

    fn error_at(&self, location: &Location, message: impl Into<String>) -> SyntaxError {
        SyntaxError::parse(
            self.file.clone(),
            location.line,
            location.column,
            message.into(),
        )
    }
}
