//! NDL lexer implementation using winnow.
//!
//! The lexer is line-oriented: each physical line's leading spaces decide
//! its indentation level, producing synthetic `Indent`/`Dedent` tokens;
//! the line content is tokenized with winnow combinators. Fails fast on
//! the first lexical error with a rendered source pointer.

use std::sync::Arc;

use winnow::ascii::digit1;
use winnow::combinator::{alt, delimited, opt};
use winnow::error::ContextError;
use winnow::stream::{AsChar, Location};
use winnow::token::{any, one_of, take_while};
use winnow::{LocatingSlice, ModalResult, Parser};

use crate::error::{render_pointer, Result, SyntaxError};
use crate::token::{Token, TokenKind};
use ndl_core::Operator;

/// Input type for the lexer - tracks position for spans.
pub type Input<'a> = LocatingSlice<&'a str>;

/// Lexer for one NDL file.
pub struct Lexer<'a> {
    file: Arc<str>,
    input: &'a str,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given file content.
    pub fn new(file: impl AsRef<str>, input: &'a str) -> Self {
        Self {
            file: Arc::from(file.as_ref()),
            input,
        }
    }

    /// Tokenize the entire input.
    ///
    /// Returns an error immediately on the first invalid token or
    /// indentation problem, with line/column and source context.
    pub fn tokenize(self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut indent_stack: Vec<usize> = vec![0];
        let mut offset = 0usize;

        for raw_line in self.input.split_inclusive('\n') {
            let line_start = offset;
            offset += raw_line.len();
            let content = raw_line.trim_end_matches(['\n', '\r']);

            let mut indent = 0usize;
            for c in content.chars() {
                match c {
                    ' ' => indent += 1,
                    '\t' => {
                        return Err(self.make_error(
                            line_start + indent,
                            "tab character in indentation, use spaces",
                        ));
                    }
                    _ => break,
                }
            }

            let rest = &content[indent..];
            if rest.is_empty() || rest.starts_with('#') {
                continue;
            }

            let current = indent_stack.last().copied().unwrap_or(0);
            if indent > current {
                indent_stack.push(indent);
                tokens.push(Token::new(TokenKind::Indent, line_start, line_start + indent));
            } else if indent < current {
                while indent_stack.last().copied().unwrap_or(0) > indent {
                    indent_stack.pop();
                    tokens.push(Token::new(TokenKind::Dedent, line_start, line_start + indent));
                }
                if indent_stack.last().copied().unwrap_or(0) != indent {
                    return Err(self.make_error(
                        line_start + indent,
                        "dedent does not match any outer indentation level",
                    ));
                }
            }

            self.tokenize_line(rest, line_start + indent, &mut tokens)?;

            let line_end = line_start + content.len();
            tokens.push(Token::new(TokenKind::Newline, line_end, line_end));
        }

        while indent_stack.len() > 1 {
            indent_stack.pop();
            tokens.push(Token::new(TokenKind::Dedent, self.input.len(), self.input.len()));
        }
        tokens.push(Token::new(TokenKind::Eof, self.input.len(), self.input.len()));

        Ok(tokens)
    }

    /// Tokenize one line's content (indentation already consumed).
    fn tokenize_line(&self, line: &str, base: usize, tokens: &mut Vec<Token>) -> Result<()> {
        let mut input = LocatingSlice::new(line);

        loop {
            let _: ModalResult<&str, ContextError> =
                take_while(0.., [' ', '\t']).parse_next(&mut input);

            if input.is_empty() || input.starts_with('#') {
                break;
            }

            let start = input.current_token_start();

            match next_token(&mut input) {
                Ok(kind) => {
                    let end = input.current_token_start();
                    tokens.push(Token::new(kind, base + start, base + end));
                }
                Err(_) => {
                    return Err(self.bad_token_error(base + start));
                }
            }
        }

        Ok(())
    }

    /// Create a descriptive error message for an invalid token.
    fn bad_token_error(&self, position: usize) -> SyntaxError {
        let bad_char = self.input[position..].chars().next().unwrap_or('?');

        let message = if bad_char == '"' {
            "unterminated string literal".to_string()
        } else {
            format!("unexpected character '{bad_char}'")
        };

        self.make_error(position, &message)
    }

    /// Render an error with line/column and a source pointer.
    fn make_error(&self, position: usize, message: &str) -> SyntaxError {
        let (line, column, rendered) = render_pointer(self.input, position, message);
        SyntaxError::tokenize(self.file.clone(), line, column, rendered)
    }
}

/// Parse the next token.
fn next_token(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    alt((
        parse_ellipsis,
        // Multi-char operators (must come before single-char punctuation)
        parse_operator,
        parse_number,
        parse_string,
        parse_word,
        parse_punctuation,
    ))
    .parse_next(input)
}

fn parse_ellipsis(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    "...".value(TokenKind::Ellipsis).parse_next(input)
}

fn parse_operator(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let symbol: &str = alt(("+=", "-=", "*=", "/=", "|=", "&=", "=")).parse_next(input)?;

    match Operator::from_symbol(symbol) {
        Some(op) => Ok(TokenKind::Op(op)),
        None => Err(winnow::error::ErrMode::Backtrack(ContextError::new())),
    }
}

fn parse_number(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let text: &str = (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .parse_next(input)?;

    if text.contains('.') {
        text.parse::<f64>()
            .map(TokenKind::Float)
            .map_err(|_| winnow::error::ErrMode::Backtrack(ContextError::new()))
    } else {
        text.parse::<i64>()
            .map(TokenKind::Int)
            .map_err(|_| winnow::error::ErrMode::Backtrack(ContextError::new()))
    }
}

fn parse_string(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    delimited('"', parse_string_content, '"')
        .map(|s: String| TokenKind::Str(Arc::from(s)))
        .parse_next(input)
}

fn parse_string_content(input: &mut Input<'_>) -> ModalResult<String> {
    let mut result = String::new();

    loop {
        let chunk: &str =
            take_while(0.., |c| c != '"' && c != '\\' && c != '\n' && c != '\r')
                .parse_next(input)?;
        result.push_str(chunk);

        if input.is_empty() || input.starts_with('"') {
            break;
        }

        if input.starts_with('\\') {
            '\\'.parse_next(input)?;
            let escaped = parse_escape_char(input)?;
            result.push(escaped);
        } else {
            break;
        }
    }

    Ok(result)
}

fn parse_escape_char(input: &mut Input<'_>) -> ModalResult<char> {
    let c: char = any.parse_next(input)?;
    match c {
        't' => Ok('\t'),
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        '0' => Ok('\0'),
        '\\' => Ok('\\'),
        '"' => Ok('"'),
        '\'' => Ok('\''),
        'u' => {
            '{'.parse_next(input)?;
            let hex: &str = take_while(1..=6, AsChar::is_hex_digit).parse_next(input)?;
            '}'.parse_next(input)?;
            u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| winnow::error::ErrMode::Backtrack(ContextError::new()))
        }
        _ => Err(winnow::error::ErrMode::Backtrack(ContextError::new())),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse an identifier (possibly dotted) or keyword.
fn parse_word(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let first: &str = (take_while(1, is_ident_start), take_while(0.., is_ident_char))
        .take()
        .parse_next(input)?;

    let mut word = first.to_string();

    // Dotted continuation: a dot counts as part of the identifier only
    // when an identifier segment follows it.
    loop {
        if input.starts_with('.') {
            let rest = &input.as_ref()[1..];
            if let Some(next_char) = rest.chars().next() {
                if is_ident_start(next_char) {
                    '.'.parse_next(input)?;
                    let segment: &str =
                        (take_while(1, is_ident_start), take_while(0.., is_ident_char))
                            .take()
                            .parse_next(input)?;
                    word.push('.');
                    word.push_str(segment);
                    continue;
                }
            }
        }
        break;
    }

    Ok(match word.as_str() {
        "import" => TokenKind::KwImport,
        "as" => TokenKind::KwAs,
        "pass" => TokenKind::KwPass,
        "True" => TokenKind::True,
        "False" => TokenKind::False,
        _ => TokenKind::Ident(Arc::from(word.as_str())),
    })
}

fn parse_punctuation(input: &mut Input<'_>) -> ModalResult<TokenKind> {
    let c: char = one_of(['(', ')', '<', '>', '[', ']', '{', '}', ',', ':', '+', '@'])
        .parse_next(input)?;

    Ok(match c {
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '<' => TokenKind::LAngle,
        '>' => TokenKind::RAngle,
        '[' => TokenKind::LBracket,
        ']' => TokenKind::RBracket,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        ',' => TokenKind::Comma,
        ':' => TokenKind::Colon,
        '+' => TokenKind::Plus,
        _ => TokenKind::At,
    })
}

/// Tokenize a file in one call.
pub fn tokenize(file: impl AsRef<str>, input: &str) -> Result<Vec<Token>> {
    Lexer::new(file, input).tokenize()
}
