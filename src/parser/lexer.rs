//! Line-aware lexer for Vapor source text.
//!
//! Newlines are significant (one instruction per line) and are produced as
//! tokens; comments run from `//` to end of line.

use super::ParseError;
use std::iter::Peekable;
use std::str::Chars;

/// A lexical token. Keywords are recognized here so the parser can match on
/// variants directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    /// `:name` — a label reference.
    LabelRef(String),
    /// A bare `:` terminating a label definition.
    Colon,
    Eq,
    Plus,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Newline,
    // Keywords
    Func,
    Const,
    Call,
    Goto,
    If,
    If0,
    Ret,
}

impl Token {
    /// Short description used in parse error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier '{name}'"),
            Token::Int(value) => format!("integer {value}"),
            Token::Str(_) => "string literal".into(),
            Token::LabelRef(name) => format!("label ':{name}'"),
            Token::Colon => "':'".into(),
            Token::Eq => "'='".into(),
            Token::Plus => "'+'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::Newline => "end of line".into(),
            Token::Func => "'func'".into(),
            Token::Const => "'const'".into(),
            Token::Call => "'call'".into(),
            Token::Goto => "'goto'".into(),
            Token::If => "'if'".into(),
            Token::If0 => "'if0'".into(),
            Token::Ret => "'ret'".into(),
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

fn keyword(ident: &str) -> Option<Token> {
    match ident {
        "func" => Some(Token::Func),
        "const" => Some(Token::Const),
        "call" => Some(Token::Call),
        "goto" => Some(Token::Goto),
        "if" => Some(Token::If),
        "if0" => Some(Token::If0),
        "ret" => Some(Token::Ret),
        _ => None,
    }
}

/// Token stream over a source string. Yields `(line, token)` pairs.
pub struct Lexer<'input> {
    chars: Peekable<Chars<'input>>,
    line: usize,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut ident = String::new();
        ident.push(first);
        while let Some(&ch) = self.chars.peek() {
            if is_ident_continue(ch) {
                ident.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        ident
    }

    fn read_int(&mut self, first: char) -> Result<i64, ParseError> {
        let mut digits = String::new();
        digits.push(first);
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        digits.parse().map_err(|_| ParseError::Unexpected {
            line: self.line,
            message: format!("integer literal '{digits}' out of range"),
        })
    }

    fn read_string(&mut self) -> Result<String, ParseError> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(text),
                Some('\\') => match self.chars.next() {
                    Some('n') => text.push('\n'),
                    Some(ch) => text.push(ch),
                    None => return Err(ParseError::UnterminatedString { line: self.line }),
                },
                Some('\n') | None => {
                    return Err(ParseError::UnterminatedString { line: self.line })
                }
                Some(ch) => text.push(ch),
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<(usize, Token), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ch = self.chars.next()?;
            let line = self.line;
            let token = match ch {
                '\n' => {
                    self.line += 1;
                    Ok(Token::Newline)
                }
                ' ' | '\t' | '\r' => continue,
                '/' if self.chars.peek() == Some(&'/') => {
                    while let Some(&next) = self.chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                    continue;
                }
                '=' => Ok(Token::Eq),
                '+' => Ok(Token::Plus),
                '[' => Ok(Token::LBracket),
                ']' => Ok(Token::RBracket),
                '(' => Ok(Token::LParen),
                ')' => Ok(Token::RParen),
                ':' => match self.chars.peek() {
                    Some(&next) if is_ident_start(next) => {
                        self.chars.next();
                        Ok(Token::LabelRef(self.read_ident(next)))
                    }
                    _ => Ok(Token::Colon),
                },
                '"' => self.read_string().map(Token::Str),
                '-' => match self.chars.next() {
                    Some(digit) if digit.is_ascii_digit() => {
                        self.read_int(digit).map(|value| Token::Int(-value))
                    }
                    _ => Err(ParseError::UnexpectedChar { line, ch: '-' }),
                },
                _ if ch.is_ascii_digit() => self.read_int(ch).map(Token::Int),
                _ if is_ident_start(ch) => {
                    let ident = self.read_ident(ch);
                    Ok(keyword(&ident).unwrap_or(Token::Ident(ident)))
                }
                _ => Err(ParseError::UnexpectedChar { line, ch }),
            };
            return Some(token.map(|tok| (line, tok)));
        }
    }
}
