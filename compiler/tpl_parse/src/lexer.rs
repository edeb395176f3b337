//! Tokenizer for template source.
//!
//! Outside actions everything is [`TokenKind::Text`]. Inside `{{ }}` the
//! lexer produces operator, literal, and path tokens; whitespace only
//! separates them. Path tokens are fused: `$x.A.B` is one `Variable` token
//! and `.A.B` one `Field` token.
//!
//! Trim markers (`{{- ` and ` -}}`) strip adjacent whitespace from the
//! neighbouring text and leave no token behind. Comments (`{{/* */}}`)
//! vanish entirely.

use crate::error::{ParseError, ParseErrorKind};

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const RIGHT_TRIM_DELIM: &str = "-}}";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Keyword {
    If,
    Else,
    End,
    Range,
    With,
    Template,
    Define,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "end" => Keyword::End,
            "range" => Keyword::Range,
            "with" => Keyword::With,
            "template" => Keyword::Template,
            "define" => Keyword::Define,
            _ => return None,
        })
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::End => "end",
            Keyword::Range => "range",
            Keyword::With => "with",
            Keyword::Template => "template",
            Keyword::Define => "define",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Text(String),
    LeftDelim,
    RightDelim,
    Pipe,
    LParen,
    RParen,
    Comma,
    Declare,
    Dot,
    Field(Vec<String>),
    Variable(Vec<String>),
    Ident(String),
    Keyword(Keyword),
    Str(String),
    Number(String),
    Bool(bool),
    Eof,
}

impl TokenKind {
    /// Human-readable form for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Text(_) => "text".to_owned(),
            TokenKind::LeftDelim => "\"{{\"".to_owned(),
            TokenKind::RightDelim => "\"}}\"".to_owned(),
            TokenKind::Pipe => "\"|\"".to_owned(),
            TokenKind::LParen => "\"(\"".to_owned(),
            TokenKind::RParen => "\")\"".to_owned(),
            TokenKind::Comma => "\",\"".to_owned(),
            TokenKind::Declare => "\":=\"".to_owned(),
            TokenKind::Dot => "\".\"".to_owned(),
            TokenKind::Field(path) => format!("field .{}", path.join(".")),
            TokenKind::Variable(path) => format!("variable {}", path.join(".")),
            TokenKind::Ident(name) => format!("identifier {name:?}"),
            TokenKind::Keyword(keyword) => format!("keyword {:?}", keyword.as_str()),
            TokenKind::Str(text) => format!("string {text:?}"),
            TokenKind::Number(text) => format!("number {text}"),
            TokenKind::Bool(value) => format!("boolean {value}"),
            TokenKind::Eof => "end of input".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token's first character.
    pub offset: usize,
}

/// Tokenize `src`. The returned stream always ends with [`TokenKind::Eof`].
pub(crate) fn lex(src: &str) -> Result<Vec<Token>, ParseError> {
    Lexer {
        src,
        pos: 0,
        tokens: Vec::new(),
        trim_next: false,
    }
    .run()
}

struct Lexer<'src> {
    src: &'src str,
    pos: usize,
    tokens: Vec<Token>,
    /// The previous action ended with ` -}}`.
    trim_next: bool,
}

impl<'src> Lexer<'src> {
    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        while self.pos < self.src.len() {
            let open = self.src[self.pos..].find(LEFT_DELIM).map(|i| self.pos + i);
            let text_end = open.unwrap_or(self.src.len());
            let mut text = &self.src[self.pos..text_end];
            if std::mem::take(&mut self.trim_next) {
                text = text.trim_start();
            }
            let Some(open) = open else {
                self.push_text(text, self.pos);
                self.pos = self.src.len();
                break;
            };
            let mut inner = open + LEFT_DELIM.len();
            if self.has_left_trim(inner) {
                text = text.trim_end();
                inner += 2;
            }
            self.push_text(text, self.pos);
            self.pos = inner;
            if self.rest().starts_with("/*") {
                self.comment(open)?;
            } else {
                self.push(TokenKind::LeftDelim, open);
                self.action(open)?;
            }
        }
        self.push(TokenKind::Eof, self.src.len());
        Ok(self.tokens)
    }

    fn rest(&self) -> &'src str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn push(&mut self, kind: TokenKind, offset: usize) {
        self.tokens.push(Token { kind, offset });
    }

    fn push_text(&mut self, text: &str, offset: usize) {
        if !text.is_empty() {
            self.push(TokenKind::Text(text.to_owned()), offset);
        }
    }

    fn error(&self, kind: ParseErrorKind, offset: usize) -> ParseError {
        ParseError::new(kind, self.src, offset)
    }

    /// `{{-` followed by whitespace.
    fn has_left_trim(&self, at: usize) -> bool {
        let mut chars = self.src[at..].chars();
        chars.next() == Some('-') && chars.next().is_some_and(|c| c.is_ascii_whitespace())
    }

    /// Length of the right delimiter at the cursor, and whether it trims.
    fn right_delim(&self) -> Option<(usize, bool)> {
        let rest = self.rest();
        if rest.starts_with(RIGHT_DELIM) {
            return Some((RIGHT_DELIM.len(), false));
        }
        let first = rest.chars().next()?;
        if first.is_ascii_whitespace() && rest[1..].starts_with(RIGHT_TRIM_DELIM) {
            return Some((1 + RIGHT_TRIM_DELIM.len(), true));
        }
        None
    }

    fn comment(&mut self, open: usize) -> Result<(), ParseError> {
        let body = self.pos + 2;
        let Some(close) = self.src[body..].find("*/") else {
            return Err(self.error(ParseErrorKind::UnclosedComment, open));
        };
        self.pos = body + close + 2;
        let Some((len, trim)) = self.right_delim() else {
            return Err(self.error(ParseErrorKind::UnclosedComment, open));
        };
        self.pos += len;
        self.trim_next = trim;
        Ok(())
    }

    fn action(&mut self, open: usize) -> Result<(), ParseError> {
        loop {
            if let Some((len, trim)) = self.right_delim() {
                self.push(TokenKind::RightDelim, self.pos);
                self.pos += len;
                self.trim_next = trim;
                return Ok(());
            }
            let Some(c) = self.peek() else {
                return Err(self.error(ParseErrorKind::UnclosedAction, open));
            };
            let start = self.pos;
            match c {
                c if c.is_whitespace() => self.pos += c.len_utf8(),
                '|' => self.single(TokenKind::Pipe),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                ',' => self.single(TokenKind::Comma),
                ':' if self.peek_second() == Some('=') => {
                    self.push(TokenKind::Declare, start);
                    self.pos += 2;
                }
                '"' => self.quoted()?,
                '`' => self.raw()?,
                '$' => {
                    self.pos += 1;
                    let mut path = vec![format!("${}", self.word())];
                    path.extend(self.field_chain());
                    self.push(TokenKind::Variable(path), start);
                }
                '.' if self.peek_second().is_some_and(is_ident_start) => {
                    let path = self.field_chain();
                    self.push(TokenKind::Field(path), start);
                }
                '.' if self.peek_second().is_some_and(|c| c.is_ascii_digit()) => self.number()?,
                '.' => self.single(TokenKind::Dot),
                '-' | '+' | '0'..='9' => self.number()?,
                c if is_ident_start(c) => {
                    let word = self.word();
                    let kind = match word {
                        "true" => TokenKind::Bool(true),
                        "false" => TokenKind::Bool(false),
                        "nil" => {
                            return Err(self.error(ParseErrorKind::Unsupported("nil"), start))
                        }
                        _ => match Keyword::from_word(word) {
                            Some(keyword) => TokenKind::Keyword(keyword),
                            None => TokenKind::Ident(word.to_owned()),
                        },
                    };
                    self.push(kind, start);
                }
                other => return Err(self.error(ParseErrorKind::UnexpectedChar(other), start)),
            }
        }
    }

    fn single(&mut self, kind: TokenKind) {
        self.push(kind, self.pos);
        self.pos += 1;
    }

    /// Identifier characters at the cursor (possibly none).
    fn word(&mut self) -> &'src str {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// `.A.B...` at the cursor, as segments without dots.
    fn field_chain(&mut self) -> Vec<String> {
        let mut path = Vec::new();
        while self.peek() == Some('.') && self.peek_second().is_some_and(is_ident_start) {
            self.pos += 1;
            path.push(self.word().to_owned());
        }
        path
    }

    fn number(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let mut prev = '\0';
        let len = self
            .rest()
            .char_indices()
            .find(|&(i, c)| {
                let sign_ok = i == 0 || matches!(prev, 'e' | 'E' | 'p' | 'P');
                let keep = c.is_ascii_alphanumeric() || c == '.' || c == '_' || (sign_ok && matches!(c, '+' | '-'));
                prev = c;
                !keep
            })
            .map_or(self.rest().len(), |(i, _)| i);
        let text = &self.src[start..start + len];
        self.pos += len;
        let digits = text.trim_start_matches(['+', '-']);
        let well_formed = digits.starts_with(|c: char| c.is_ascii_digit() || c == '.')
            && digits.chars().any(|c| c.is_ascii_digit());
        if !well_formed {
            return Err(self.error(ParseErrorKind::BadNumber(text.to_owned()), start));
        }
        self.push(TokenKind::Number(text.to_owned()), start);
        Ok(())
    }

    fn quoted(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.error(ParseErrorKind::UnterminatedString, start));
            };
            self.pos += c.len_utf8();
            match c {
                '"' => break,
                '\n' => return Err(self.error(ParseErrorKind::UnterminatedString, start)),
                '\\' => value.push(self.escape()?),
                c => value.push(c),
            }
        }
        self.push(TokenKind::Str(value), start);
        Ok(())
    }

    fn escape(&mut self) -> Result<char, ParseError> {
        let at = self.pos - 1;
        let Some(c) = self.peek() else {
            return Err(self.error(ParseErrorKind::UnterminatedString, at));
        };
        self.pos += c.len_utf8();
        let decoded = match c {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'a' => Some('\u{7}'),
            'b' => Some('\u{8}'),
            'f' => Some('\u{c}'),
            'v' => Some('\u{b}'),
            '0' => Some('\0'),
            '\\' | '"' | '\'' => Some(c),
            'x' => self.hex_escape(2),
            'u' => self.hex_escape(4),
            'U' => self.hex_escape(8),
            _ => None,
        };
        decoded.ok_or_else(|| {
            let text = self.src[at..self.pos].to_owned();
            self.error(ParseErrorKind::InvalidEscape(text), at)
        })
    }

    fn hex_escape(&mut self, digits: usize) -> Option<char> {
        let hex = self.rest().get(..digits)?;
        let value = u32::from_str_radix(hex, 16).ok()?;
        self.pos += digits;
        char::from_u32(value)
    }

    fn raw(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let body = start + 1;
        let Some(len) = self.src[body..].find('`') else {
            return Err(self.error(ParseErrorKind::UnterminatedString, start));
        };
        let value = self.src[body..body + len].to_owned();
        self.pos = body + len + 1;
        self.push(TokenKind::Str(value), start);
        Ok(())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
