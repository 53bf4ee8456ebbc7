use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use tools::errors::{Diagnostic, ReportDiag};
use tools::span::{SourceLocation, SourceRange};

#[derive(Debug, Error, PartialEq)]
pub enum LexerError {
    #[error("Unterminated string.")]
    UnterminatedString,

    #[error("Unsupported character: -{0}-.")]
    UnsupportedChar(char),
}

impl ReportDiag for LexerError {}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Single character tokens
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier(String),
    Str(String),
    Number(f64),

    // Keywords
    And,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: SourceRange,
}

impl Token {
    pub fn new(kind: TokenKind, range: SourceRange) -> Self {
        Self { kind, range }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Default)]
pub struct Lexer {
    pub tokens: VecDeque<Token>,
    pub errors: Vec<Diagnostic>,
    keywords: HashMap<&'static str, TokenKind>,
    chars: Vec<char>,
    index: usize,
    location: SourceLocation,
}

impl Lexer {
    // Keywords generation
    fn generate_keywords(&mut self) {
        self.keywords.insert("and", TokenKind::And);
        self.keywords.insert("class", TokenKind::Class);
        self.keywords.insert("else", TokenKind::Else);
        self.keywords.insert("false", TokenKind::False);
        self.keywords.insert("for", TokenKind::For);
        self.keywords.insert("fun", TokenKind::Fun);
        self.keywords.insert("if", TokenKind::If);
        self.keywords.insert("nil", TokenKind::Nil);
        self.keywords.insert("or", TokenKind::Or);
        self.keywords.insert("print", TokenKind::Print);
        self.keywords.insert("return", TokenKind::Return);
        self.keywords.insert("super", TokenKind::Super);
        self.keywords.insert("this", TokenKind::This);
        self.keywords.insert("true", TokenKind::True);
        self.keywords.insert("var", TokenKind::Var);
        self.keywords.insert("while", TokenKind::While);
    }

    /// Turns the whole source into a token stream. A malformed lexeme is
    /// recorded in `errors` and scanning resumes at the next character, so
    /// one bad character never hides the rest of the file. The stream
    /// always ends with an Eof token.
    pub fn tokenize(&mut self, source_code: &str) {
        self.generate_keywords();

        self.chars = source_code.chars().collect();
        self.index = 0;
        self.location = SourceLocation::new(1, 0);
        self.tokens.clear();
        self.errors.clear();

        loop {
            match self.next_token() {
                Ok(Some(token)) => {
                    let at_eof = token.kind == TokenKind::Eof;
                    self.tokens.push_back(token);

                    if at_eof {
                        break;
                    }
                }
                // Whitespace or a comment
                Ok(None) => {}
                Err((err, start)) => {
                    let range = SourceRange::new(start, self.location);
                    self.errors.push(err.to_diagnostic(range));
                }
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, (LexerError, SourceLocation)> {
        let Some(c) = self.advance() else {
            let range = SourceRange::new(self.location, self.location);
            return Ok(Some(Token::new(TokenKind::Eof, range)));
        };

        // Location of the character we just consumed
        let start = self.location;

        match c {
            '(' => Ok(Some(self.make_token(TokenKind::OpenParen, start))),
            ')' => Ok(Some(self.make_token(TokenKind::CloseParen, start))),
            '{' => Ok(Some(self.make_token(TokenKind::OpenBrace, start))),
            '}' => Ok(Some(self.make_token(TokenKind::CloseBrace, start))),
            ',' => Ok(Some(self.make_token(TokenKind::Comma, start))),
            '.' => Ok(Some(self.make_token(TokenKind::Dot, start))),
            '-' => Ok(Some(self.make_token(TokenKind::Minus, start))),
            '+' => Ok(Some(self.make_token(TokenKind::Plus, start))),
            ';' => Ok(Some(self.make_token(TokenKind::Semicolon, start))),
            '*' => Ok(Some(self.make_token(TokenKind::Star, start))),
            '!' => {
                let kind = if self.advance_if('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                Ok(Some(self.make_token(kind, start)))
            }
            '=' => {
                let kind = if self.advance_if('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                Ok(Some(self.make_token(kind, start)))
            }
            '<' => {
                let kind = if self.advance_if('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                Ok(Some(self.make_token(kind, start)))
            }
            '>' => {
                let kind = if self.advance_if('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                Ok(Some(self.make_token(kind, start)))
            }
            '/' => {
                // A second slash is a comment running to the end of the line
                if self.advance_if('/') {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                    Ok(None)
                } else {
                    Ok(Some(self.make_token(TokenKind::Slash, start)))
                }
            }
            ' ' | '\t' | '\r' | '\n' => Ok(None),
            '"' => self
                .lex_string(start)
                .map(Some)
                .map_err(|e| (e, start)),
            c if c.is_ascii_digit() => Ok(Some(self.lex_number(c, start))),
            c if is_identifier_start(c) => Ok(Some(self.lex_identifier(c, start))),
            c => Err((LexerError::UnsupportedChar(c), start)),
        }
    }

    // The opening quote is already consumed. Strings are single line and
    // the quotes are not part of the value.
    fn lex_string(&mut self, start: SourceLocation) -> Result<Token, LexerError> {
        let mut value = String::new();

        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    let range = SourceRange::new(start, self.location);
                    return Ok(Token::new(TokenKind::Str(value), range));
                }
                Some('\n') | None => return Err(LexerError::UnterminatedString),
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
    }

    // A trailing dot is not consumed, so "5." lexes as a number then a dot
    fn lex_number(&mut self, first: char, start: SourceLocation) -> Token {
        let mut value = String::from(first);

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                value.push(c);
                self.advance();
            } else if c == '.' && self.peek_next().is_some_and(|n| n.is_ascii_digit()) {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let number: f64 = value.parse().unwrap();
        let range = SourceRange::new(start, self.location);
        Token::new(TokenKind::Number(number), range)
    }

    fn lex_identifier(&mut self, first: char, start: SourceLocation) -> Token {
        let mut value = String::from(first);

        while let Some(c) = self.peek() {
            if is_identifier_char(c) {
                value.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match self.keywords.get(value.as_str()) {
            Some(keyword) => keyword.clone(),
            None => TokenKind::Identifier(value),
        };

        let range = SourceRange::new(start, self.location);
        Token::new(kind, range)
    }

    fn make_token(&self, kind: TokenKind, start: SourceLocation) -> Token {
        Token::new(kind, SourceRange::new(start, self.location))
    }

    fn advance(&mut self) -> Option<char> {
        let c = *self.chars.get(self.index)?;
        self.index += 1;

        if c == '\n' {
            self.location = SourceLocation::new(self.location.line + 1, 0);
        } else {
            self.location = SourceLocation::new(self.location.line, self.location.column + 1);
        }

        Some(c)
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        let mut lexer: Lexer = Default::default();
        lexer.tokenize(text);
        assert!(lexer.errors.is_empty(), "errors: {:?}", lexer.errors);
        lexer.tokens.iter().map(|tk| tk.kind.clone()).collect()
    }

    #[test]
    fn tokenize_single_char() {
        assert_eq!(
            kinds("(){},.-+;*/"),
            vec![
                TokenKind::OpenParen,
                TokenKind::CloseParen,
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_one_or_two_char_operators() {
        assert_eq!(
            kinds("! != = == < <= > >="),
            vec![
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_keywords() {
        assert_eq!(
            kinds("and class else false for fun if nil or print return super this true var while"),
            vec![
                TokenKind::And,
                TokenKind::Class,
                TokenKind::Else,
                TokenKind::False,
                TokenKind::For,
                TokenKind::Fun,
                TokenKind::If,
                TokenKind::Nil,
                TokenKind::Or,
                TokenKind::Print,
                TokenKind::Return,
                TokenKind::Super,
                TokenKind::This,
                TokenKind::True,
                TokenKind::Var,
                TokenKind::While,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_identifiers() {
        assert_eq!(
            kinds("position _private vec2"),
            vec![
                TokenKind::Identifier("position".to_string()),
                TokenKind::Identifier("_private".to_string()),
                TokenKind::Identifier("vec2".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_numbers() {
        assert_eq!(
            kinds("123 45.67 0.5"),
            vec![
                TokenKind::Number(123.),
                TokenKind::Number(45.67),
                TokenKind::Number(0.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn number_does_not_swallow_trailing_dot() {
        assert_eq!(
            kinds("5."),
            vec![TokenKind::Number(5.), TokenKind::Dot, TokenKind::Eof]
        );
    }

    #[test]
    fn tokenize_string() {
        assert_eq!(
            kinds("\"hello world\""),
            vec![TokenKind::Str("hello world".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_reported() {
        let mut lexer: Lexer = Default::default();
        lexer.tokenize("\"oops\nvar a;");

        assert_eq!(lexer.errors.len(), 1);
        // Scanning continued on the next line
        assert_eq!(lexer.tokens[0].kind, TokenKind::Var);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("// a comment\nvar a; // trailing"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier("a".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unsupported_chars_do_not_stop_scanning() {
        let mut lexer: Lexer = Default::default();
        lexer.tokenize("var @ a # 1;");

        assert_eq!(lexer.errors.len(), 2);
        assert_eq!(
            lexer.tokens.iter().map(|tk| tk.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::Var,
                TokenKind::Identifier("a".to_string()),
                TokenKind::Number(1.),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn token_ranges_track_lines_and_columns() {
        let mut lexer: Lexer = Default::default();
        lexer.tokenize("var a;\nprint a;");

        let var = &lexer.tokens[0];
        assert_eq!(var.range.start, SourceLocation::new(1, 1));
        assert_eq!(var.range.end, SourceLocation::new(1, 3));

        let print = &lexer.tokens[3];
        assert_eq!(print.range.start, SourceLocation::new(2, 1));
        assert_eq!(print.range.end, SourceLocation::new(2, 5));
    }
}
