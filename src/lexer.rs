// ABOUTME: Tokenizer turning LisPy source text into a token stream

use crate::error::LexerError;
use nom::{
    branch::alt,
    character::complete::{char, digit1, none_of, one_of},
    combinator::{opt, peek, recognize, value},
    multi::many0,
    sequence::pair,
    IResult,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Quote,
    Number(f64),
    StringLit(String),
    Symbol(String),
    Bool(bool),
    Nil,
}

const SYMBOL_EXTRA_CHARS: &str = "+-*/=<>!?.:$%^&~_";

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_EXTRA_CHARS.contains(c)
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';')
        || c.is_whitespace()
        || c == ','
}

fn skip_ws_and_comments(mut input: &str) -> &str {
    loop {
        let trimmed = input.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if trimmed.starts_with(';') {
            let rest = trimmed.splitn(2, '\n').nth(1).unwrap_or("");
            input = rest;
            continue;
        }
        if trimmed.len() == input.len() {
            return trimmed;
        }
        input = trimmed;
    }
}

fn parse_number(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize(pair(
        opt(char('-')),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            recognize(pair(char('.'), digit1)),
        )),
    ))(input)?;
    // Reject a bare "-" (no digits followed) from being consumed as a number;
    // nom's digit1 already enforces at least one digit so this cannot happen,
    // but guard against a lone sign slipping through via the alt above.
    match text.parse::<f64>() {
        Ok(n) => Ok((rest, Token::Number(n))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

fn parse_string(input: &str) -> IResult<&str, Token> {
    let (mut rest, _) = char('"')(input)?;
    let mut out = String::new();
    loop {
        match rest.chars().next() {
            None => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    rest,
                    nom::error::ErrorKind::Eof,
                )))
            }
            Some('"') => {
                rest = &rest[1..];
                break;
            }
            Some('\\') => {
                let mut chars = rest.chars();
                chars.next();
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => {
                        return Err(nom::Err::Failure(nom::error::Error::new(
                            rest,
                            nom::error::ErrorKind::Eof,
                        )))
                    }
                }
                rest = &rest[rest.len() - chars.as_str().len()..];
            }
            Some(c) => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    Ok((rest, Token::StringLit(out)))
}

fn parse_symbol_like(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize(pair(
        none_of("()[]{}\"; \t\r\n,0123456789"),
        many0(none_of("()[]{}\"; \t\r\n,")),
    ))(input)?;
    let token = match text {
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        "nil" => Token::Nil,
        other => Token::Symbol(other.to_string()),
    };
    Ok((rest, token))
}

fn parse_signed_symbol(input: &str) -> IResult<&str, Token> {
    // A leading '+'/'-'/'.' that is not part of a number is a symbol, e.g.
    // `-`, `->`, `->>`, `+`, `...`
    let (rest, text) = recognize(pair(one_of("+-."), many0(none_of("()[]{}\"; \t\r\n,"))))(input)?;
    Ok((rest, Token::Symbol(text.to_string())))
}

fn punctuation(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::LBracket, char('[')),
        value(Token::RBracket, char(']')),
        value(Token::LBrace, char('{')),
        value(Token::RBrace, char('}')),
        value(Token::Quote, char('\'')),
    ))(input)
}

fn looks_like_number(input: &str) -> bool {
    let mut chars = input.chars().peekable();
    if matches!(chars.peek(), Some('-')) {
        chars.next();
    }
    matches!(chars.peek(), Some(c) if c.is_ascii_digit())
        || (matches!(chars.peek(), Some('.'))
            && input.chars().nth(if input.starts_with('-') { 2 } else { 1 }).is_some_and(|c| c.is_ascii_digit()))
}

fn next_token(input: &str) -> IResult<&str, Token> {
    if let Ok(result) = punctuation(input) {
        return Ok(result);
    }
    if input.starts_with('"') {
        return parse_string(input);
    }
    if looks_like_number(input) {
        if let Ok(result) = parse_number(input) {
            return Ok(result);
        }
    }
    if matches!(input.chars().next(), Some('+') | Some('-') | Some('.')) {
        // `+`/`-`/`.` that didn't parse as a number: could still be a bare
        // symbol like `+` itself, `->`, `...`.
        if let Ok(result) = parse_signed_symbol(input) {
            return Ok(result);
        }
    }
    parse_symbol_like(input)
}

/// Tokenizes a full source string. `peek` is used only to detect trailing
/// unconsumed input that doesn't match any token shape.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    loop {
        rest = skip_ws_and_comments(rest);
        if rest.is_empty() {
            break;
        }
        if peek(none_of::<_, _, nom::error::Error<&str>>(""))(rest).is_err() {
            break;
        }
        match next_token(rest) {
            Ok((new_rest, token)) => {
                if new_rest.len() == rest.len() {
                    return Err(LexerError(format!(
                        "unknown character at: {}",
                        &rest[..rest.len().min(20)]
                    )));
                }
                tokens.push(token);
                rest = new_rest;
            }
            Err(nom::Err::Failure(_)) => {
                return Err(LexerError(format!(
                    "unterminated string near: {}",
                    &rest[..rest.len().min(20)]
                )));
            }
            Err(_) => {
                return Err(LexerError(format!(
                    "malformed token near: {}",
                    &rest[..rest.len().min(20)]
                )));
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic_list() {
        let tokens = tokenize("(+ 1 2)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Symbol("+".to_string()),
                Token::Number(1.0),
                Token::Number(2.0),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_negative_number_vs_minus_symbol() {
        let tokens = tokenize("(- -5 x)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Symbol("-".to_string()),
                Token::Number(-5.0),
                Token::Symbol("x".to_string()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_vector_and_map_brackets() {
        let tokens = tokenize("[1 2] {:a 1}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LBracket,
                Token::Number(1.0),
                Token::Number(2.0),
                Token::RBracket,
                Token::LBrace,
                Token::Symbol(":a".to_string()),
                Token::Number(1.0),
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_tokenize_string_with_escapes() {
        let tokens = tokenize(r#""hi\n\"there\"""#).unwrap();
        assert_eq!(tokens, vec![Token::StringLit("hi\n\"there\"".to_string())]);
    }

    #[test]
    fn test_unterminated_string_is_lexer_error() {
        let err = tokenize(r#""unterminated"#).unwrap_err();
        assert!(err.0.contains("unterminated"));
    }

    #[test]
    fn test_literals() {
        let tokens = tokenize("true false nil").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Bool(true), Token::Bool(false), Token::Nil]
        );
    }

    #[test]
    fn test_quote_and_comment() {
        let tokens = tokenize("'x ; a comment\ny").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Quote,
                Token::Symbol("x".to_string()),
                Token::Symbol("y".to_string()),
            ]
        );
    }

    #[test]
    fn test_threading_symbols() {
        let tokens = tokenize("(-> x f) (->> y g)").unwrap();
        assert_eq!(tokens[1], Token::Symbol("->".to_string()));
        assert_eq!(tokens[8], Token::Symbol("->>".to_string()));
    }

    #[test]
    fn test_commas_are_whitespace() {
        let tokens = tokenize("(1, 2 ,3)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Number(1.0),
                Token::Number(2.0),
                Token::Number(3.0),
                Token::RParen,
            ]
        );
    }
}
