//! Token stream for the IR text format.
//!
//! The lexer knows nothing about dialects: it splits text into identifiers,
//! sigil-prefixed names, literals and punctuation. Tokens are produced
//! lazily and the lexer can be rewound to any byte position, which is how
//! the parser implements lookahead.

use winnow::ascii::{digit1, hex_digit1, multispace1, till_line_ending};
use winnow::combinator::{alt, opt, repeat};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::error::{IrError, IrResult};
use crate::location::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Bare identifier or keyword: `riscv.add`, `i32`, `true`, `stagger`.
    Ident,
    /// `%name`
    ValueId,
    /// `^name`
    BlockId,
    /// `@name` or `@"quoted name"`
    SymbolRef,
    /// `!dialect.name`
    TypeSigil,
    /// `#dialect.name`
    AttrSigil,
    String,
    Integer,
    Float,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Less,
    Greater,
    Comma,
    Colon,
    Equal,
    Arrow,
    Eof,
}

impl TokenKind {
    /// Human-readable description used in "expected ..." messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Ident => "identifier",
            TokenKind::ValueId => "value name",
            TokenKind::BlockId => "block label",
            TokenKind::SymbolRef => "symbol reference",
            TokenKind::TypeSigil => "dialect type",
            TokenKind::AttrSigil => "dialect attribute",
            TokenKind::String => "string literal",
            TokenKind::Integer => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Less => "'<'",
            TokenKind::Greater => "'>'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Equal => "'='",
            TokenKind::Arrow => "'->'",
            TokenKind::Eof => "end of input",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    /// Description of the actual token for "found ..." messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == keyword
    }

    /// Name without its sigil, for `%`, `^`, `!`, `#` and bare `@` tokens.
    pub fn sigil_name(&self) -> &'a str {
        match self.kind {
            TokenKind::ValueId
            | TokenKind::BlockId
            | TokenKind::SymbolRef
            | TokenKind::TypeSigil
            | TokenKind::AttrSigil => &self.text[1..],
            _ => self.text,
        }
    }

    /// Decoded symbol name of a `@name` / `@"name"` token.
    pub fn symbol_value(&self) -> IrResult<String> {
        let body = self.sigil_name();
        if body.starts_with('"') {
            unescape(body, self.span)
        } else {
            Ok(body.to_string())
        }
    }

    /// Decoded contents of a string literal.
    pub fn string_value(&self) -> IrResult<String> {
        unescape(self.text, self.span)
    }

    /// Value of an integer literal (decimal or `0x` hex, optionally negative).
    pub fn int_value(&self) -> IrResult<i128> {
        let (negative, digits) = match self.text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, self.text),
        };
        let magnitude = match digits.strip_prefix("0x") {
            Some(hex) => u128::from_str_radix(hex, 16),
            None => digits.parse::<u128>(),
        }
        .map_err(|_| IrError::lex(format!("integer literal '{}' is too large", self.text), self.span))?;
        let value = if negative {
            0i128.checked_sub_unsigned(magnitude)
        } else {
            i128::try_from(magnitude).ok()
        };
        value.ok_or_else(|| {
            IrError::lex(
                format!("integer literal '{}' is out of range", self.text),
                self.span,
            )
        })
    }

    pub fn float_value(&self) -> IrResult<f64> {
        self.text.parse::<f64>().map_err(|_| {
            IrError::lex(format!("malformed float literal '{}'", self.text), self.span)
        })
    }
}

fn unescape(text: &str, span: Span) -> IrResult<String> {
    let mut input = text;
    string_lit
        .parse_next(&mut input)
        .map_err(|_| IrError::lex("unterminated string literal", span))
}

/// Lazy, restartable token stream.
#[derive(Clone, Copy, Debug)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            finished: false,
        }
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Rewind or advance to a byte offset previously returned by
    /// `position` or a token span.
    pub fn reset(&mut self, pos: usize) {
        self.pos = pos.min(self.src.len());
        self.finished = false;
    }

    /// Lex the next token. At the end of input this keeps returning `Eof`.
    pub fn next_token(&mut self) -> IrResult<Token<'a>> {
        let mut rest = &self.src[self.pos..];
        // Trivia is whitespace and `//` comments; it cannot fail.
        let _ = trivia.parse_next(&mut rest);
        let start = self.src.len() - rest.len();

        let Some(first) = rest.chars().next() else {
            self.pos = start;
            return Ok(Token {
                kind: TokenKind::Eof,
                text: "",
                span: Span::new(start, start),
            });
        };

        let kind = lex_kind(first, &mut rest);
        let end = self.src.len() - rest.len();
        match kind {
            Ok(kind) => {
                self.pos = end;
                Ok(Token {
                    kind,
                    text: &self.src[start..end],
                    span: Span::new(start, end),
                })
            }
            Err(message) => {
                let end = end.max(start + first.len_utf8());
                Err(IrError::lex(message, Span::new(start, end)))
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = IrResult<Token<'a>>;

    /// Yields tokens up to and excluding `Eof`, stopping after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => {
                self.finished = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

// ============================================================================
// Winnow lexers
// ============================================================================

fn lex_kind(first: char, input: &mut &str) -> Result<TokenKind, String> {
    match first {
        '"' => string_lit
            .void()
            .parse_next(input)
            .map(|()| TokenKind::String)
            .map_err(|_| "unterminated string literal".to_string()),
        '%' => sigil('%', suffix_id, TokenKind::ValueId, input),
        '^' => sigil('^', suffix_id, TokenKind::BlockId, input),
        '!' => sigil('!', bare_ident, TokenKind::TypeSigil, input),
        '#' => sigil('#', bare_ident, TokenKind::AttrSigil, input),
        '@' => {
            let quoted = input[1..].starts_with('"');
            let res = if quoted {
                ('@', string_lit).void().parse_next(input)
            } else {
                ('@', suffix_id).void().parse_next(input)
            };
            res.map(|()| TokenKind::SymbolRef).map_err(|_| {
                if quoted {
                    "unterminated string literal".to_string()
                } else {
                    "expected a name after '@'".to_string()
                }
            })
        }
        '(' => punct(input, TokenKind::LParen),
        ')' => punct(input, TokenKind::RParen),
        '{' => punct(input, TokenKind::LBrace),
        '}' => punct(input, TokenKind::RBrace),
        '[' => punct(input, TokenKind::LBracket),
        ']' => punct(input, TokenKind::RBracket),
        '<' => punct(input, TokenKind::Less),
        '>' => punct(input, TokenKind::Greater),
        ',' => punct(input, TokenKind::Comma),
        ':' => punct(input, TokenKind::Colon),
        '=' => punct(input, TokenKind::Equal),
        '-' if input.starts_with("->") => {
            *input = &input[2..];
            Ok(TokenKind::Arrow)
        }
        c if c.is_ascii_digit() || c == '-' => number(input),
        c if c.is_ascii_alphabetic() || c == '_' => bare_ident
            .parse_next(input)
            .map(|_| TokenKind::Ident)
            .map_err(|_| format!("unexpected character '{c}'")),
        c => Err(format!("unexpected character '{c}'")),
    }
}

fn punct(input: &mut &str, kind: TokenKind) -> Result<TokenKind, String> {
    *input = &input[1..];
    Ok(kind)
}

fn sigil<'a>(
    prefix: char,
    mut body: impl Parser<&'a str, &'a str, winnow::error::ErrMode<winnow::error::ContextError>>,
    kind: TokenKind,
    input: &mut &'a str,
) -> Result<TokenKind, String> {
    *input = &input[prefix.len_utf8()..];
    body.parse_next(input)
        .map(|_| kind)
        .map_err(|_| format!("expected a name after '{prefix}'"))
}

fn number(input: &mut &str) -> Result<TokenKind, String> {
    let start = *input;
    let kind = number_body.parse_next(input).map_err(|_| {
        let end = start
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+')))
            .unwrap_or(start.len());
        format!("malformed numeric literal '{}'", &start[..end.max(1)])
    })?;
    // A literal running straight into identifier characters (`42abc`).
    let trailing = input
        .chars()
        .next()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_');
    if let Some(c) = trailing {
        let consumed = start.len() - input.len();
        *input = &start[consumed + c.len_utf8()..];
        return Err(format!(
            "malformed numeric literal '{}{c}'",
            &start[..consumed]
        ));
    }
    Ok(kind)
}

fn number_body(input: &mut &str) -> ModalResult<TokenKind> {
    opt('-').parse_next(input)?;
    if opt("0x").parse_next(input)?.is_some() {
        hex_digit1.parse_next(input)?;
        return Ok(TokenKind::Integer);
    }
    digit1.parse_next(input)?;
    let mut kind = TokenKind::Integer;
    if opt('.').parse_next(input)?.is_some() {
        digit1.parse_next(input)?;
        kind = TokenKind::Float;
    }
    if opt(one_of(['e', 'E'])).parse_next(input)?.is_some() {
        opt(one_of(['+', '-'])).parse_next(input)?;
        digit1.parse_next(input)?;
        kind = TokenKind::Float;
    }
    Ok(kind)
}

/// Skip whitespace and `//` line comments.
fn trivia(input: &mut &str) -> ModalResult<()> {
    repeat(
        0..,
        alt((multispace1.void(), ("//", till_line_ending).void())),
    )
    .parse_next(input)
}

/// Bare identifier: `[a-zA-Z_][a-zA-Z0-9_$.]*`. Dots are part of the
/// identifier so dialect-qualified names lex as one token.
fn bare_ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.')
        }),
    )
        .take()
        .parse_next(input)
}

/// Name after `%`, `^` or `@`: `[a-zA-Z0-9_$.]+`.
fn suffix_id<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.')
    })
    .parse_next(input)
}

/// Parse a string literal, decoding escapes.
fn string_lit(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut result = String::new();
    loop {
        let c = any.parse_next(input)?;
        match c {
            '"' => break,
            '\\' => {
                let escaped = any.parse_next(input)?;
                match escaped {
                    '"' => result.push('"'),
                    '\\' => result.push('\\'),
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    '0' => result.push('\0'),
                    'x' => {
                        let h1 = any.parse_next(input)?;
                        let h2 = any.parse_next(input)?;
                        let hex_str = format!("{h1}{h2}");
                        if let Ok(code) = u8::from_str_radix(&hex_str, 16) {
                            result.push(code as char);
                        } else {
                            result.push('\\');
                            result.push('x');
                            result.push(h1);
                            result.push(h2);
                        }
                    }
                    _ => {
                        result.push('\\');
                        result.push(escaped);
                    }
                }
            }
            _ => result.push(c),
        }
    }
    Ok(result)
}
