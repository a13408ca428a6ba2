use std::iter::Peekable;
use std::str::Chars;

use crate::types::{Result, ShellError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `quoted` is set when any part of the word was inside quotes or escaped.
    Word { text: String, quoted: bool },
    Operator(Operator),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Semicolon,           // ;
    Parallel,            // &
    Pipe,                // |
    And,                 // &&
    Or,                  // ||
    RedirectIn,          // <
    RedirectOut,         // >
    RedirectAppend,      // >>
    RedirectError,       // 2>
    RedirectErrorAppend, // 2>>
    RedirectBoth,        // &>
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Quote {
    Single,
    Double,
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    current: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.chars().peekable();
        let current = chars.next();
        Self { input: chars, current }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.consume_whitespace();

        let redirects_stderr = self.current == Some('2') && self.input.peek() == Some(&'>');
        let token = match self.current {
            None => return Ok(None),
            Some('2') if redirects_stderr => {
                self.advance();
                self.advance();
                if self.eat('>') {
                    Token::Operator(Operator::RedirectErrorAppend)
                } else {
                    Token::Operator(Operator::RedirectError)
                }
            }
            Some('|' | '&' | '>' | '<' | ';') => Token::Operator(self.read_operator()),
            Some(_) => self.read_word()?,
        };
        Ok(Some(token))
    }

    fn read_word(&mut self) -> Result<Token> {
        let mut text = String::new();
        let mut quoted = false;
        let mut quote: Option<Quote> = None;

        while let Some(c) = self.current {
            match (quote, c) {
                (None, ' ' | '\t' | '\n' | '|' | '&' | '>' | '<' | ';') => break,
                (None, '\\') => {
                    self.advance();
                    if let Some(escaped) = self.current {
                        text.push(escaped);
                        quoted = true;
                    }
                }
                (None, '\'') => {
                    quote = Some(Quote::Single);
                    quoted = true;
                }
                (None, '"') => {
                    quote = Some(Quote::Double);
                    quoted = true;
                }
                (Some(Quote::Single), '\'') | (Some(Quote::Double), '"') => quote = None,
                (Some(Quote::Double), '\\') => match self.input.peek().copied() {
                    Some(next @ ('"' | '\\' | '$' | '`')) => {
                        self.advance();
                        text.push(next);
                    }
                    _ => text.push('\\'),
                },
                (_, c) => text.push(c),
            }
            self.advance();
        }

        if quote.is_some() {
            return Err(ShellError::ParseError("unterminated quote".to_string()));
        }
        Ok(Token::Word { text, quoted })
    }

    fn read_operator(&mut self) -> Operator {
        let first = self.current;
        self.advance();
        match first {
            Some('>') if self.eat('>') => Operator::RedirectAppend,
            Some('>') => Operator::RedirectOut,
            Some('<') => Operator::RedirectIn,
            Some('|') if self.eat('|') => Operator::Or,
            Some('|') => Operator::Pipe,
            Some('&') if self.eat('&') => Operator::And,
            Some('&') if self.eat('>') => Operator::RedirectBoth,
            Some('&') => Operator::Parallel,
            _ => Operator::Semicolon,
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.current == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_whitespace(&mut self) {
        while let Some(c) = self.current {
            if !matches!(c, ' ' | '\t' | '\n') {
                break;
            }
            self.advance();
        }
    }

    fn advance(&mut self) {
        self.current = self.input.next();
    }
}

pub fn lex(input: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}
