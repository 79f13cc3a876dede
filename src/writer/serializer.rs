//! PDF object serialization.
//!
//! Dictionaries are written in insertion order, literal strings with the
//! standard escapes, hex strings in the notation they were read with, and
//! reals without trailing zeros.

use crate::object::{Dict, Object, StringFormat};
use std::io::Write;

/// Serialize an object to its byte representation.
pub fn serialize(object: &Object) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    write_object(&mut buf, object).expect("vec write");
    buf
}

/// Serialize an indirect object definition:
/// `{number} {generation} obj\n{object}\nendobj\n`.
pub fn serialize_indirect(number: u32, generation: u16, object: &Object) -> Vec<u8> {
    let mut buf = Vec::new();
    write!(buf, "{} {} obj\n", number, generation).expect("vec write");
    write_object(&mut buf, object).expect("vec write");
    write!(buf, "\nendobj\n").expect("vec write");
    buf
}

/// Format a number the way content streams expect: integral values without
/// a decimal point, everything else in shortest form.
pub(crate) fn fmt_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn write_object<W: Write>(w: &mut W, object: &Object) -> std::io::Result<()> {
    match object {
        Object::Null => write!(w, "null"),
        Object::Boolean(b) => write!(w, "{}", if *b { "true" } else { "false" }),
        Object::Integer(i) => write!(w, "{}", i),
        Object::Real(r) => write!(w, "{}", fmt_number(*r)),
        Object::String(bytes, StringFormat::Literal) => write_literal_string(w, bytes),
        Object::String(bytes, StringFormat::Hex) => write_hex_string(w, bytes),
        Object::Name(name) => write_name(w, name),
        Object::Array(items) => {
            write!(w, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(w, " ")?;
                }
                write_object(w, item)?;
            }
            write!(w, "]")
        },
        Object::Dictionary(dict) => write_dictionary(w, dict),
        Object::Stream { dict, data } => {
            write_dictionary(w, dict)?;
            write!(w, "\nstream\n")?;
            w.write_all(data)?;
            write!(w, "\nendstream")
        },
        Object::Reference(r) => write!(w, "{} {} R", r.number, r.generation),
    }
}

fn write_dictionary<W: Write>(w: &mut W, dict: &Dict) -> std::io::Result<()> {
    write!(w, "<<")?;
    for (key, value) in dict {
        write_name(w, key)?;
        write!(w, " ")?;
        write_object(w, value)?;
    }
    write!(w, ">>")
}

fn write_name<W: Write>(w: &mut W, name: &str) -> std::io::Result<()> {
    write!(w, "/")?;
    for byte in name.bytes() {
        let needs_escape = byte == b'#'
            || byte <= 0x20
            || byte >= 0x7F
            || crate::lexer::is_delimiter(byte);
        if needs_escape {
            write!(w, "#{:02X}", byte)?;
        } else {
            w.write_all(&[byte])?;
        }
    }
    Ok(())
}

fn write_literal_string<W: Write>(w: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    write!(w, "(")?;
    for &byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => {
                w.write_all(&[b'\\', byte])?;
            },
            b'\n' => w.write_all(b"\\n")?,
            b'\r' => w.write_all(b"\\r")?,
            b'\t' => w.write_all(b"\\t")?,
            0x08 => w.write_all(b"\\b")?,
            0x0C => w.write_all(b"\\f")?,
            other => w.write_all(&[other])?,
        }
    }
    write!(w, ")")
}

fn write_hex_string<W: Write>(w: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    write!(w, "<")?;
    for byte in bytes {
        write!(w, "{:02X}", byte)?;
    }
    write!(w, ">")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectRef;

    fn text(object: &Object) -> String {
        String::from_utf8(serialize(object)).unwrap()
    }

    #[test]
    fn test_primitives() {
        assert_eq!(text(&Object::Null), "null");
        assert_eq!(text(&Object::Boolean(true)), "true");
        assert_eq!(text(&Object::Integer(-42)), "-42");
        assert_eq!(text(&Object::Real(1.0)), "1");
        assert_eq!(text(&Object::Real(0.5)), "0.5");
        assert_eq!(text(&Object::name("Type")), "/Type");
        assert_eq!(
            text(&Object::Reference(ObjectRef::new(3, 0))),
            "3 0 R"
        );
    }

    #[test]
    fn test_literal_string_escapes() {
        let obj = Object::String(b"a(b)\\c\nd".to_vec(), StringFormat::Literal);
        assert_eq!(text(&obj), "(a\\(b\\)\\\\c\\nd)");
    }

    #[test]
    fn test_hex_string() {
        let obj = Object::String(vec![0x90, 0x1F], StringFormat::Hex);
        assert_eq!(text(&obj), "<901F>");
    }

    #[test]
    fn test_name_escaping() {
        assert_eq!(text(&Object::name("A B")), "/A#20B");
        assert_eq!(text(&Object::name("A#B")), "/A#23B");
    }

    #[test]
    fn test_array_and_dict() {
        let mut dict = Dict::new();
        dict.insert("Type".to_string(), Object::name("Page"));
        dict.insert(
            "MediaBox".to_string(),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        );
        assert_eq!(
            text(&Object::Dictionary(dict)),
            "<</Type /Page/MediaBox [0 0 612 792]>>"
        );
    }

    #[test]
    fn test_dict_insertion_order_preserved() {
        let mut dict = Dict::new();
        dict.insert("Zebra".to_string(), Object::Integer(1));
        dict.insert("Alpha".to_string(), Object::Integer(2));
        let s = text(&Object::Dictionary(dict));
        assert!(s.find("/Zebra").unwrap() < s.find("/Alpha").unwrap());
    }

    #[test]
    fn test_indirect_framing() {
        let bytes = serialize_indirect(7, 0, &Object::Integer(5));
        assert_eq!(bytes, b"7 0 obj\n5\nendobj\n");
    }

    #[test]
    fn test_stream_framing() {
        let mut dict = Dict::new();
        dict.insert("Length".to_string(), Object::Integer(2));
        let obj = Object::Stream {
            dict,
            data: bytes::Bytes::from_static(b"AB"),
        };
        assert_eq!(text(&obj), "<</Length 2>>\nstream\nAB\nendstream");
    }

    #[test]
    fn test_round_trip_through_parser() {
        let mut dict = Dict::new();
        dict.insert("K".to_string(), Object::String(b"a(b".to_vec(), StringFormat::Literal));
        dict.insert("N".to_string(), Object::Real(2.5));
        dict.insert("R".to_string(), Object::Reference(ObjectRef::new(4, 0)));
        let original = Object::Dictionary(dict);

        let bytes = serialize(&original);
        let mut cursor = std::io::Cursor::new(bytes);
        let mut lexer = crate::lexer::Lexer::new(&mut cursor, 0);
        let reparsed = crate::parser::read_object(&mut lexer, 0).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(100.0), "100");
        assert_eq!(fmt_number(-0.25), "-0.25");
        assert_eq!(fmt_number(f64::NAN), "0");
    }
}
