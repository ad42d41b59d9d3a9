//! NDL surface-syntax crate.
//!
//! Turns `.ndl` text into the immutable AST consumed by the load
//! pipeline:
//!
//! 1. [`Lexer`] tokenizes one file into located tokens, including the
//!    synthetic `Indent`/`Dedent`/`Newline` block markers
//! 2. [`parse`] runs the recursive-descent parser over the tokens
//! 3. The [`ast`] types pretty-print back to canonical `.ndl` text, and
//!    print-then-reparse is structurally identity
//!
//! # Example
//!
//! ```
//! use ndl_syntax::parse;
//!
//! let ast = parse("units.ndl", "Knight():\n    hp : int = 10\n").unwrap();
//! assert_eq!(ast.objects.len(), 1);
//! assert_eq!(ast.objects[0].name.text.as_ref(), "Knight");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{Ast, AstImport, AstMember, AstMemberType, AstObject, AstValue, IdToken};
pub use error::{Result, SyntaxError};
pub use lexer::Lexer;
pub use parser::parse;
pub use token::{Token, TokenKind};
