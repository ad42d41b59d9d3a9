//! NDL token types.
//!
//! Tokens are the output of lexical analysis, ready for parsing. Block
//! structure is tokenized: the lexer emits `Indent`/`Dedent` pairs for
//! indentation changes and `Newline` after every content line.

use ndl_core::Operator;
use std::sync::Arc;

/// A token with its source span (byte offsets into the file).
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The token kind
    pub kind: TokenKind,
    /// Source location (start byte offset)
    pub start: usize,
    /// Source location (end byte offset)
    pub end: usize,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    /// Check if this is an EOF token.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// Token kinds for NDL.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Identifier, possibly dotted: `hp`, `units.Knight`
    Ident(Arc<str>),

    /// Integer literal (with optional leading minus)
    Int(i64),

    /// Float literal
    Float(f64),

    /// Double-quoted string literal (unescaped content)
    Str(Arc<str>),

    /// `True`
    True,
    /// `False`
    False,

    /// `import` keyword
    KwImport,
    /// `as` keyword
    KwAs,
    /// `pass` keyword
    KwPass,
    /// `...` (alternative empty block marker)
    Ellipsis,

    /// Member operator: `= += -= *= /= |= &=`
    Op(Operator),

    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `<`
    LAngle,
    /// `>`
    RAngle,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `+` (inheritance add)
    Plus,
    /// `@` (override depth marker)
    At,

    /// End of a content line
    Newline,
    /// Indentation level opened
    Indent,
    /// Indentation level closed
    Dedent,
    /// End of input
    Eof,
}

impl TokenKind {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Int(v) => format!("integer {v}"),
            TokenKind::Float(v) => format!("float {v:?}"),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::True => "'True'".to_string(),
            TokenKind::False => "'False'".to_string(),
            TokenKind::KwImport => "'import'".to_string(),
            TokenKind::KwAs => "'as'".to_string(),
            TokenKind::KwPass => "'pass'".to_string(),
            TokenKind::Ellipsis => "'...'".to_string(),
            TokenKind::Op(op) => format!("operator '{op}'"),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LAngle => "'<'".to_string(),
            TokenKind::RAngle => "'>'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::At => "'@'".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}
