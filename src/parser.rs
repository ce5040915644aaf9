// ABOUTME: Recursive-descent parser turning a token stream into the AST

use crate::error::ParseError;
use crate::lexer::{tokenize, Token};
use crate::value::Value;

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Parses one complete top-level form.
    pub fn parse_form(&mut self) -> Result<Value, ParseError> {
        let token = self
            .advance()
            .ok_or_else(|| ParseError("unexpected end of input".to_string()))?
            .clone();
        match token {
            Token::LParen => self.parse_seq(Token::RParen).map(Value::List),
            Token::RParen => Err(ParseError("unexpected ')'".to_string())),
            Token::LBracket => self.parse_seq(Token::RBracket).map(Value::Vector),
            Token::RBracket => Err(ParseError("unexpected ']'".to_string())),
            Token::LBrace => self.parse_map(),
            Token::RBrace => Err(ParseError("unexpected '}'".to_string())),
            Token::Quote => {
                let form = self.parse_form()?;
                Ok(Value::List(vec![Value::Symbol("quote".to_string()), form]))
            }
            Token::Number(n) => Ok(Value::Number(n)),
            Token::StringLit(s) => Ok(Value::String(s)),
            Token::Symbol(s) => Ok(Value::Symbol(s)),
            Token::Bool(b) => Ok(Value::Bool(b)),
            Token::Nil => Ok(Value::Nil),
        }
    }

    fn parse_seq(&mut self, closing: Token) -> Result<Vec<Value>, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(ParseError("unexpected end of input, unclosed delimiter".to_string())),
                Some(tok) if *tok == closing => {
                    self.advance();
                    return Ok(items);
                }
                _ => items.push(self.parse_form()?),
            }
        }
    }

    fn parse_map(&mut self) -> Result<Value, ParseError> {
        let items = self.parse_seq(Token::RBrace)?;
        if items.len() % 2 != 0 {
            return Err(ParseError(
                "map literal requires an even number of forms".to_string(),
            ));
        }
        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            pairs.push((k, v));
        }
        Ok(Value::Map(pairs))
    }
}

/// Parses every top-level form in `source`, e.g. a whole module file.
pub fn parse_all(source: &str) -> Result<Vec<Value>, ParseError> {
    let tokens = tokenize(source).map_err(|e| ParseError(e.0))?;
    let mut parser = Parser::new(&tokens);
    let mut forms = Vec::new();
    while !parser.at_end() {
        forms.push(parser.parse_form()?);
    }
    Ok(forms)
}

/// Parses a single form from `source`, erroring if anything but trailing
/// whitespace/comments remains.
pub fn parse_one(source: &str) -> Result<Value, ParseError> {
    let tokens = tokenize(source).map_err(|e| ParseError(e.0))?;
    if tokens.is_empty() {
        return Err(ParseError("empty input".to_string()));
    }
    let mut parser = Parser::new(&tokens);
    let form = parser.parse_form()?;
    if !parser.at_end() {
        return Err(ParseError("unexpected trailing input after form".to_string()));
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_list() {
        let value = parse_one("(+ 1 2)").unwrap();
        match value {
            Value::List(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_nested_list() {
        let value = parse_one("(a (b c) d)").unwrap();
        match value {
            Value::List(items) => {
                assert_eq!(items.len(), 3);
                assert!(matches!(&items[1], Value::List(inner) if inner.len() == 2));
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_parse_vector_literal() {
        let value = parse_one("[1 2 3]").unwrap();
        match value {
            Value::Vector(items) => assert_eq!(items.len(), 3),
            _ => panic!("expected vector"),
        }
    }

    #[test]
    fn test_parse_map_literal() {
        let value = parse_one("{:a 1 :b 2}").unwrap();
        match value {
            Value::Map(pairs) => assert_eq!(pairs.len(), 2),
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn test_parse_odd_map_is_error() {
        let err = parse_one("{:a 1 :b}").unwrap_err();
        assert!(err.0.contains("even"));
    }

    #[test]
    fn test_parse_quote_abbreviation() {
        let value = parse_one("'(1 2)").unwrap();
        match value {
            Value::List(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(&items[0], Value::Symbol(s) if s == "quote"));
            }
            _ => panic!("expected (quote ...)"),
        }
    }

    #[test]
    fn test_parse_empty_list_is_nil_like_list() {
        let value = parse_one("()").unwrap();
        assert!(matches!(value, Value::List(items) if items.is_empty()));
    }

    #[test]
    fn test_unbalanced_delimiters_is_parse_error() {
        assert!(parse_one("(1 2").is_err());
        assert!(parse_one("1 2)").is_err());
    }

    #[test]
    fn test_parse_all_multiple_top_level_forms() {
        let forms = parse_all("(define x 1) (define y 2)").unwrap();
        assert_eq!(forms.len(), 2);
    }

    #[test]
    fn test_parse_all_skips_comments() {
        let forms = parse_all("; header comment\n(define x 1) ; trailing\n").unwrap();
        assert_eq!(forms.len(), 1);
    }
}
