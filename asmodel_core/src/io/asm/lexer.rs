//! Lex a reaction equation string into a series of tokens for later parsing

use std::collections::VecDeque;

use thiserror::Error;

use crate::io::asm::token::Token;

pub struct Lexer {
    source: Vec<char>,
    tokens: VecDeque<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: VecDeque::new(),
            start: 0,
            current: 0,
        }
    }

    /// Convert the source into tokens, the final token is always [`Token::Eof`]
    pub fn lex(mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push_back(Token::Eof);
        Ok(self.tokens.into_iter().collect())
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            // Single Character Tokens
            '+' => self.add_token(Token::Plus),
            '*' => self.add_token(Token::Star),
            // Arrow
            '-' => {
                if self.peek() == '>' {
                    self.advance();
                    self.add_token(Token::Arrow);
                } else {
                    return Err(LexerError::InvalidToken {
                        character: c,
                        position: self.start,
                    });
                }
            }
            // Coefficients (or identifiers starting with a digit)
            '0'..='9' | '.' => self.read_number(),
            // Identifiers
            'a'..='z' | 'A'..='Z' | '_' => self.read_identifier(),
            // Whitespace
            ' ' | '\r' | '\n' | '\t' => {}
            _ => {
                return Err(LexerError::InvalidToken {
                    character: c,
                    position: self.start,
                })
            }
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    fn read_number(&mut self) {
        while Lexer::is_digit(self.peek()) || self.peek() == '.' {
            self.advance();
        }
        // Exponent, only consumed when followed by digits
        if matches!(self.peek(), 'e' | 'E') {
            let sign_offset = if matches!(self.peek_at(1), '+' | '-') { 2 } else { 1 };
            if Lexer::is_digit(self.peek_at(sign_offset)) {
                for _ in 0..sign_offset {
                    self.advance();
                }
                while Lexer::is_digit(self.peek()) {
                    self.advance();
                }
            }
        }
        // Ids such as 13dpg_c start with digits
        if Lexer::is_identifier_char(self.peek()) {
            self.read_identifier();
            return;
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        self.add_token(Token::Number(text));
    }

    fn read_identifier(&mut self) {
        while Lexer::is_identifier_char(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        self.add_token(Token::Identifier(text));
    }

    fn is_digit(c: char) -> bool {
        c.is_ascii_digit()
    }

    fn is_identifier_char(c: char) -> bool {
        matches!(c, 'a'..='z' | 'A'..='Z' | '_' | '.') || Lexer::is_digit(c)
    }

    fn peek(&self) -> char {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> char {
        match self.source.get(self.current + offset) {
            Some(c) => *c,
            None => '\0',
        }
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push_back(token);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum LexerError {
    #[error("Invalid character {character:?} at position {position}")]
    InvalidToken { character: char, position: usize },
}
