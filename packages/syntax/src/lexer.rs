//! Lexer for prefab JSON using logos
//!
//! Only the token boundaries matter here: values are decoded by serde_json,
//! the lexer is used to find where each top-level field sits in the bytes.

use crate::ast::ByteRange;
use crate::error::{ParseError, ParseResult};
use logos::Logos;
use std::collections::HashMap;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
}

pub type SpannedToken = (Token, Range<usize>);

pub fn tokenize(source: &str) -> ParseResult<Vec<SpannedToken>> {
    Token::lexer(source)
        .spanned()
        .map(|(token, span)| match token {
            Ok(token) => Ok((token, span)),
            Err(()) => Err(ParseError::LexError { span }),
        })
        .collect()
}

/// Byte range of every top-level field value of a JSON object
///
/// Keys are unescaped. A repeated key keeps its last occurrence, matching
/// how serde_json resolves duplicates.
pub fn top_level_ranges(source: &str) -> ParseResult<HashMap<String, ByteRange>> {
    let tokens = tokenize(source)?;
    let mut ranges = HashMap::new();
    let mut iter = tokens.iter().peekable();

    match iter.next() {
        Some((Token::LBrace, _)) => {}
        Some((_, span)) => {
            return Err(ParseError::invalid_syntax(
                span.start,
                "top-level value must be an object",
            ))
        }
        None => return Err(ParseError::invalid_syntax(0, "empty document")),
    }

    if let Some((Token::RBrace, _)) = iter.peek() {
        return Ok(ranges);
    }

    loop {
        let key = match iter.next() {
            Some((Token::String, span)) => serde_json::from_str::<String>(&source[span.clone()])?,
            Some((_, span)) => return Err(ParseError::invalid_syntax(span.start, "expected key")),
            None => return Err(ParseError::invalid_syntax(source.len(), "unterminated object")),
        };

        match iter.next() {
            Some((Token::Colon, _)) => {}
            other => return Err(unexpected(other, source.len(), "expected ':'")),
        }

        let (first, first_span) = match iter.next() {
            Some((token, span)) => (*token, span.clone()),
            None => return Err(ParseError::invalid_syntax(source.len(), "expected value")),
        };

        let end = match first {
            Token::LBrace | Token::LBracket => {
                let mut depth = 1usize;
                let mut end = None;
                for (token, span) in iter.by_ref() {
                    match token {
                        Token::LBrace | Token::LBracket => depth += 1,
                        Token::RBrace | Token::RBracket => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(span.end);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                end.ok_or_else(|| ParseError::invalid_syntax(first_span.start, "unclosed value"))?
            }
            Token::String | Token::Number | Token::True | Token::False | Token::Null => {
                first_span.end
            }
            _ => return Err(ParseError::invalid_syntax(first_span.start, "expected value")),
        };

        ranges.insert(key, ByteRange::new(first_span.start, end));

        match iter.next() {
            Some((Token::Comma, _)) => continue,
            Some((Token::RBrace, _)) => break,
            other => return Err(unexpected(other, source.len(), "expected ',' or '}'")),
        }
    }

    Ok(ranges)
}

fn unexpected(token: Option<&SpannedToken>, eof: usize, message: &str) -> ParseError {
    let pos = token.map(|(_, span)| span.start).unwrap_or(eof);
    ParseError::invalid_syntax(pos, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize(r#"{"a": [1, true]}"#).unwrap();
        let kinds: Vec<Token> = tokens.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::LBrace,
                Token::String,
                Token::Colon,
                Token::LBracket,
                Token::Number,
                Token::Comma,
                Token::True,
                Token::RBracket,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_top_level_ranges() {
        let source = r#"{ "version": 3, "entities": [ {"id": "a", "x": [1]} ], "name": "lvl" }"#;
        let ranges = top_level_ranges(source).unwrap();

        let entities = ranges["entities"];
        assert_eq!(&source[entities.start..entities.end], r#"[ {"id": "a", "x": [1]} ]"#);
        let version = ranges["version"];
        assert_eq!(&source[version.start..version.end], "3");
        let name = ranges["name"];
        assert_eq!(&source[name.start..name.end], "\"lvl\"");
    }

    #[test]
    fn test_escaped_keys_and_braces_in_strings() {
        let source = r#"{"a\"b": "}{", "c": {"d": "]"}}"#;
        let ranges = top_level_ranges(source).unwrap();
        assert_eq!(ranges.len(), 2);
        let c = ranges["c"];
        assert_eq!(&source[c.start..c.end], r#"{"d": "]"}"#);
        assert!(ranges.contains_key("a\"b"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            top_level_ranges("[1, 2]"),
            Err(ParseError::InvalidSyntax { pos: 0, .. })
        ));
        assert!(top_level_ranges("").is_err());
        assert!(top_level_ranges("{}").unwrap().is_empty());
    }
}
