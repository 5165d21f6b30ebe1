use crate::io::asm::token::Token;

use indexmap::IndexMap;
use thiserror::Error;
/*
Reaction Equation Grammar:
equation -> side "->" side ;
side -> ( term ( "+" term )* )? ;
term -> ( NUMBER "*"? )? COMPONENT ;

e.g. 2 A + B -> C
 */

/// Parsed sides of a reaction equation, coefficients are magnitudes
#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    /// Consumed components with the magnitude of their coefficients
    pub reactants: IndexMap<String, f64>,
    /// Produced components with the magnitude of their coefficients
    pub products: IndexMap<String, f64>,
}

/// Reaction equation parser
pub struct EquationParser {
    /// Vector of tokens from the equation string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
}

impl EquationParser {
    /// Create a new EquationParser
    pub fn new(tokens: Vec<Token>) -> EquationParser {
        EquationParser { tokens, current: 0 }
    }

    // region Parsing Functions

    /// Parse the token vector into an [`Equation`]
    pub fn parse(&mut self) -> Result<Equation, ParseError> {
        let reactants = self.side()?;
        self.consume(Token::Arrow)?;
        let products = self.side()?;
        if !self.is_at_end() {
            // Entire equation has not been parsed
            return Err(ParseError::EarlyTermination(self.peek().to_string()));
        }
        Ok(Equation {
            reactants,
            products,
        })
    }

    fn side(&mut self) -> Result<IndexMap<String, f64>, ParseError> {
        let mut terms: IndexMap<String, f64> = IndexMap::new();
        if self.check(&Token::Arrow) || self.is_at_end() {
            return Ok(terms);
        }
        loop {
            let (component, coef) = self.term()?;
            // Repeated components on one side accumulate
            *terms.entry(component).or_insert(0.) += coef;
            if !self.match_token(&Token::Plus) {
                break;
            }
        }
        Ok(terms)
    }

    fn term(&mut self) -> Result<(String, f64), ParseError> {
        let coef = match self.peek() {
            Token::Number(text) => {
                self.advance();
                self.match_token(&Token::Star);
                EquationParser::parse_coefficient(&text)?
            }
            _ => 1.,
        };
        match self.advance() {
            Token::Identifier(id) => Ok((id, coef)),
            other => Err(ParseError::ExpectedComponent(other.to_string())),
        }
    }

    fn parse_coefficient(text: &str) -> Result<f64, ParseError> {
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0. => Ok(value),
            _ => Err(ParseError::InvalidCoefficient(text.to_string())),
        }
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// Check whether the current token matches `token`, if it does advance and return true
    fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            return true;
        }
        false
    }

    /// Check whether the current token matches the provided `token`
    fn check(&self, token: &Token) -> bool {
        if self.is_at_end() {
            return false;
        }
        &self.peek() == token
    }

    /// Advance `self.current` one position unless at the end, then return the previous token.
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
            return self.tokens[self.current - 1].clone();
        }
        Token::Eof
    }

    /// Check whether the parser is at the end of the token Vec
    fn is_at_end(&self) -> bool {
        self.peek() == Token::Eof
    }

    /// Get a copy of the current token
    fn peek(&self) -> Token {
        self.tokens.get(self.current).cloned().unwrap_or(Token::Eof)
    }

    /// Match `token` or fail, used for the arrow separating the two sides
    fn consume(&mut self, token: Token) -> Result<Token, ParseError> {
        if self.check(&token) {
            return Ok(self.advance());
        }
        Err(ParseError::MissingToken {
            expected: token.to_string(),
            found: self.peek().to_string(),
        })
    }

    // endregion parsing helper functions
}

/// Enum representing possible parse errors
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    /// A component identifier was expected
    #[error("Expected a component but found {0}")]
    ExpectedComponent(String),
    /// Coefficient is not a positive finite number
    #[error("Invalid stoichiometric coefficient {0}")]
    InvalidCoefficient(String),
    /// Required token is missing
    #[error("Expected {expected} but found {found}")]
    MissingToken { expected: String, found: String },
    /// Tokens remain after a complete equation
    #[error("Unexpected {0} after the end of the equation")]
    EarlyTermination(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::asm::lexer::Lexer;

    fn parse(source: &str) -> Result<Equation, ParseError> {
        let tokens = Lexer::new(source).lex().unwrap();
        EquationParser::new(tokens).parse()
    }

    #[test]
    fn test_parse_equation() {
        let equation = parse("2 A + B -> 3*C").unwrap();
        assert_eq!(equation.reactants.get("A"), Some(&2.));
        assert_eq!(equation.reactants.get("B"), Some(&1.));
        assert_eq!(equation.products.get("C"), Some(&3.));
        let order: Vec<&String> = equation.reactants.keys().collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    #[test]
    fn test_empty_sides() {
        let sink = parse("A ->").unwrap();
        assert_eq!(sink.reactants.len(), 1);
        assert!(sink.products.is_empty());
        let source = parse("-> A").unwrap();
        assert!(source.reactants.is_empty());
        assert_eq!(source.products.len(), 1);
    }

    #[test]
    fn test_repeated_component() {
        let equation = parse("A + A -> 2 B").unwrap();
        assert_eq!(equation.reactants.get("A"), Some(&2.));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse("A + B"),
            Err(ParseError::MissingToken {
                expected: "->".to_string(),
                found: "end of equation".to_string()
            })
        );
        assert_eq!(
            parse("0 A -> B"),
            Err(ParseError::InvalidCoefficient("0".to_string()))
        );
        assert_eq!(
            parse("A -> B + "),
            Err(ParseError::ExpectedComponent("end of equation".to_string()))
        );
        assert_eq!(
            parse("A -> B -> C"),
            Err(ParseError::EarlyTermination("->".to_string()))
        );
    }
}
