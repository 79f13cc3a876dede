//! PDF object parser.
//!
//! Combines tokens from the [`crate::lexer`] into complete objects using
//! recursive descent. Dictionary and array parsing are mutually recursive;
//! the nesting depth decides whether recognized names are handed out as the
//! registry's canonical text (depth > 0) or freshly allocated (depth 0, so
//! top-level values never alias the registry).
//!
//! Stream payloads are *not* read here. When a top-level dictionary is
//! immediately followed by the `stream` keyword, [`read_indirect`] reports
//! the payload start offset and leaves length determination to the document
//! layer, which can fall back to a recovery scan.

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token};
use crate::names;
use crate::object::{Dict, Object, ObjectRef, StringFormat};

/// A top-level (indirect) object body.
#[derive(Debug)]
pub enum Indirect {
    /// A plain value
    Value(Object),
    /// A stream header: dictionary plus the absolute offset of the first
    /// payload byte. The payload length is resolved by the caller.
    StreamHeader {
        /// The stream dictionary
        dict: Dict,
        /// Absolute byte offset where the payload begins
        data_start: u64,
    },
}

/// Read one value from the token stream.
pub fn read_object(lexer: &mut Lexer<'_>, depth: u32) -> Result<Object> {
    let token = lexer.next_meaningful_token()?;
    read_object_with(lexer, token, depth)
}

/// Read one value starting from an already-fetched token.
pub fn read_object_with(lexer: &mut Lexer<'_>, token: Token, depth: u32) -> Result<Object> {
    match token {
        Token::Number(lexeme) => Ok(number_object(&lexeme)),
        Token::String { bytes, hex } => Ok(Object::String(
            bytes,
            if hex { StringFormat::Hex } else { StringFormat::Literal },
        )),
        Token::Name(name) => Ok(Object::Name(intern_name(name, depth))),
        Token::Reference { number, generation } => {
            Ok(Object::Reference(ObjectRef::new(number, generation)))
        },
        Token::StartArray => read_array(lexer, depth + 1),
        Token::StartDict => Ok(Object::Dictionary(read_dictionary(lexer, depth + 1)?)),
        Token::Other(keyword) => match keyword.as_str() {
            "true" => Ok(Object::Boolean(true)),
            "false" => Ok(Object::Boolean(false)),
            "null" => Ok(Object::Null),
            other => Err(parse_error(lexer, format!("unexpected keyword '{}'", other))),
        },
        Token::EndArray => Err(parse_error(lexer, "unexpected ']'")),
        Token::EndDict => Err(parse_error(lexer, "unexpected '>>'")),
        Token::Comment => Err(parse_error(lexer, "unexpected comment")),
        Token::EndOfInput => Err(Error::UnexpectedEof),
    }
}

/// Read a top-level object body, detecting the dictionary-plus-`stream`
/// idiom. After the `stream` keyword exactly one EOL is skipped (CRLF or
/// LF; a bare CR is tolerated) and the payload offset recorded.
pub fn read_indirect(lexer: &mut Lexer<'_>) -> Result<Indirect> {
    let object = read_object(lexer, 0)?;
    let dict = match object {
        Object::Dictionary(dict) => dict,
        other => return Ok(Indirect::Value(other)),
    };

    let after_dict = lexer.pos()?;
    match lexer.next_meaningful_token()? {
        ref tok if tok.is_other("stream") => {
            match lexer.read_byte()? {
                Some(b'\n') => {},
                Some(b'\r') => {
                    if let Some(next) = lexer.read_byte()? {
                        if next != b'\n' {
                            log::warn!("stream keyword followed by bare CR");
                            lexer.back_one()?;
                        }
                    }
                },
                Some(_) => {
                    log::warn!("no EOL after stream keyword");
                    lexer.back_one()?;
                },
                None => return Err(Error::UnexpectedEof),
            }
            let data_start = lexer.pos()?;
            Ok(Indirect::StreamHeader { dict, data_start })
        },
        _ => {
            lexer.seek(after_dict)?;
            Ok(Indirect::Value(Object::Dictionary(dict)))
        },
    }
}

/// Read the `<n> <g> obj` header of an indirect object, returning the
/// declared number and generation.
pub fn read_object_header(lexer: &mut Lexer<'_>) -> Result<(u32, u16)> {
    let number = expect_integer(lexer, "object number")?;
    let generation = expect_integer(lexer, "generation number")?;
    let keyword = lexer.next_token()?;
    if !keyword.is_other("obj") {
        return Err(parse_error(lexer, format!("expected 'obj', found {:?}", keyword)));
    }
    Ok((number as u32, generation as u16))
}

fn expect_integer(lexer: &mut Lexer<'_>, what: &str) -> Result<i64> {
    loop {
        match lexer.next_token()? {
            Token::Comment => continue,
            ref tok @ Token::Number(_) => {
                return tok
                    .to_i64()
                    .ok_or_else(|| parse_error(lexer, format!("invalid {}", what)));
            },
            other => {
                return Err(parse_error(
                    lexer,
                    format!("expected {}, found {:?}", what, other),
                ));
            },
        }
    }
}

fn read_array(lexer: &mut Lexer<'_>, depth: u32) -> Result<Object> {
    let mut items = Vec::new();
    loop {
        let token = lexer.next_meaningful_token()?;
        match token {
            Token::EndArray => break,
            Token::EndDict => return Err(parse_error(lexer, "'>>' inside array")),
            Token::EndOfInput => return Err(Error::UnexpectedEof),
            other => items.push(read_object_with(lexer, other, depth)?),
        }
    }
    Ok(Object::Array(items))
}

fn read_dictionary(lexer: &mut Lexer<'_>, depth: u32) -> Result<Dict> {
    let mut dict = Dict::new();
    loop {
        let token = lexer.next_meaningful_token()?;
        let key = match token {
            Token::EndDict => break,
            Token::Name(name) => intern_name(name, depth),
            Token::EndArray => return Err(parse_error(lexer, "']' inside dictionary")),
            Token::EndOfInput => return Err(Error::UnexpectedEof),
            other => {
                return Err(parse_error(
                    lexer,
                    format!("dictionary key must be a name, found {:?}", other),
                ));
            },
        };
        let value_token = lexer.next_meaningful_token()?;
        if matches!(value_token, Token::EndDict) {
            return Err(parse_error(lexer, format!("key /{} has no value", key)));
        }
        let value = read_object_with(lexer, value_token, depth)?;
        dict.insert(key, value);
    }
    Ok(dict)
}

/// Convert a numeric lexeme into an Integer or Real object.
fn number_object(lexeme: &str) -> Object {
    if lexeme.contains('.') {
        Object::Real(lexeme.parse::<f64>().unwrap_or(0.0))
    } else {
        match lexeme.parse::<i64>() {
            Ok(i) => Object::Integer(i),
            Err(_) => Object::Real(lexeme.parse::<f64>().unwrap_or(0.0)),
        }
    }
}

/// At depth 0 names always allocate fresh text; nested names reuse the
/// registry's canonical allocation when recognized.
fn intern_name(name: String, depth: u32) -> String {
    if depth > 0 {
        if let Some(canonical) = names::canonical(&name) {
            return canonical.to_string();
        }
    }
    name
}

fn parse_error(lexer: &mut Lexer<'_>, reason: impl Into<String>) -> Error {
    Error::Parse {
        offset: lexer.pos().unwrap_or(0),
        reason: reason.into(),
    }
}
