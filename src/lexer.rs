//! PDF lexer (tokenizer).
//!
//! Byte-level tokenization over a seekable input handle. Unlike a slice
//! lexer, every token is produced by reading the file cursor forward and, on
//! lookahead misses, seeking back byte-for-byte; the cross-reference layer
//! depends on this exact-backtrack behavior.
//!
//! # PDF Syntax Overview
//!
//! - Numbers: integers (42, -123) and reals (3.14, -2.5, .5)
//! - Strings: literal ((Hello)) and hexadecimal (<48656C6C6F>)
//! - Names: identifiers starting with / (/Type, /Pages)
//! - Delimiters: `[`, `]`, `<<`, `>>`
//! - Barewords: obj, endobj, stream, trailer, true, R, ... kept verbatim
//!   as [`Token::Other`] for the parser to interpret in context
//!
//! Whitespace (space, \t, \r, \n, \0, \f) separates tokens; comments run
//! from % to end of line.

use crate::error::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Anything the lexer can pull bytes from and seek within.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Token types recognized by the PDF lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal, lexeme preserved verbatim
    Number(String),
    /// String bytes with escapes already decoded; `hex` records the notation
    String {
        /// Decoded string bytes
        bytes: Vec<u8>,
        /// True for `<...>` hex notation
        hex: bool,
    },
    /// Name with `#xx` escapes decoded (leading / stripped)
    Name(String),
    /// Array start delimiter `[`
    StartArray,
    /// Array end delimiter `]`
    EndArray,
    /// Dictionary start delimiter `<<`
    StartDict,
    /// Dictionary end delimiter `>>`
    EndDict,
    /// Comment from `%` to end of line (content discarded)
    Comment,
    /// The two-number-plus-`R` indirect reference idiom
    Reference {
        /// Object number
        number: u32,
        /// Generation number
        generation: u16,
    },
    /// Any other bareword keyword (obj, endobj, stream, trailer, xref, ...)
    Other(String),
    /// End of input
    EndOfInput,
}

impl Token {
    /// Integer value of a Number token.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Token::Number(lexeme) => lexeme
                .parse::<i64>()
                .ok()
                .or_else(|| lexeme.parse::<f64>().ok().map(|f| f as i64)),
            _ => None,
        }
    }

    /// Numeric value of a Number token.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Token::Number(lexeme) => lexeme.parse::<f64>().ok(),
            _ => None,
        }
    }

    /// True when this is the given bareword keyword.
    pub fn is_other(&self, keyword: &str) -> bool {
        matches!(self, Token::Other(kw) if kw == keyword)
    }
}

/// Is this byte in the PDF whitespace set?
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

/// Is this byte a PDF delimiter character?
pub fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_delimiter_or_whitespace(b: u8) -> bool {
    is_whitespace(b) || is_delimiter(b)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

/// Byte-stream lexer over a seekable input.
///
/// All offsets handed to [`Lexer::seek_from_header`] are interpreted
/// relative to the `%PDF-` header position, which is how cross-reference
/// offsets are recorded in files with leading junk bytes.
pub struct Lexer<'a> {
    src: &'a mut dyn ReadSeek,
    header_offset: u64,
}

impl<'a> Lexer<'a> {
    /// Wrap an input handle. `header_offset` is the byte position of the
    /// `%PDF-` marker.
    pub fn new(src: &'a mut dyn ReadSeek, header_offset: u64) -> Self {
        Self { src, header_offset }
    }

    /// Current absolute cursor position.
    pub fn pos(&mut self) -> Result<u64> {
        Ok(self.src.stream_position()?)
    }

    /// Seek to an absolute position.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.src.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Seek to a position recorded relative to the PDF header.
    pub fn seek_from_header(&mut self, pos: u64) -> Result<()> {
        self.seek(pos + self.header_offset)
    }

    /// Read one byte, `None` at end of input.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.src.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fill `buf` completely from the cursor.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.src.read_exact(buf)?;
        Ok(())
    }

    /// Fill as much of `buf` as the input allows; returns the byte count.
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.src.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    /// Move the cursor back one byte (no-op at position 0).
    pub fn back_one(&mut self) -> Result<()> {
        let pos = self.pos()?;
        if pos > 0 {
            self.seek(pos - 1)?;
        }
        Ok(())
    }

    fn parse_error(&mut self, reason: impl Into<String>) -> Error {
        let offset = self.pos().unwrap_or(0);
        Error::Parse {
            offset,
            reason: reason.into(),
        }
    }

    /// Consume exactly one token, or [`Token::EndOfInput`].
    pub fn next_token(&mut self) -> Result<Token> {
        let mut ch = match self.skip_whitespace()? {
            Some(b) => b,
            None => return Ok(Token::EndOfInput),
        };

        match ch {
            b'[' => Ok(Token::StartArray),
            b']' => Ok(Token::EndArray),
            b'/' => self.lex_name(),
            b'>' => match self.read_byte()? {
                Some(b'>') => Ok(Token::EndDict),
                _ => Err(self.parse_error("'>' not followed by '>'")),
            },
            b'<' => match self.read_byte()? {
                Some(b'<') => Ok(Token::StartDict),
                Some(first) => self.lex_hex_string(first),
                None => Err(Error::UnexpectedEof),
            },
            b'%' => {
                loop {
                    match self.read_byte()? {
                        None | Some(b'\r') | Some(b'\n') => break,
                        Some(_) => {},
                    }
                }
                Ok(Token::Comment)
            },
            b'(' => self.lex_literal_string(),
            b'-' | b'+' | b'.' | b'0'..=b'9' => self.lex_number(ch),
            _ => {
                // Bareword keyword, kept verbatim for contextual handling
                let mut word = Vec::new();
                loop {
                    word.push(ch);
                    match self.read_byte()? {
                        None => return Ok(Token::Other(String::from_utf8_lossy(&word).into_owned())),
                        Some(b) if is_delimiter_or_whitespace(b) => {
                            self.back_one()?;
                            break;
                        },
                        Some(b) => ch = b,
                    }
                }
                Ok(Token::Other(String::from_utf8_lossy(&word).into_owned()))
            },
        }
    }

    /// Consume the next non-comment token, folding the `<n> <g> R` idiom
    /// into a single [`Token::Reference`]. When the idiom does not
    /// complete, the cursor is restored to the byte right after the first
    /// number and that number is returned.
    pub fn next_meaningful_token(&mut self) -> Result<Token> {
        let mut level = 0u8;
        let mut first = String::new();
        let mut second = String::new();
        let mut restore_pos = 0u64;

        loop {
            let tok = self.next_token()?;
            if matches!(tok, Token::Comment) {
                continue;
            }
            match level {
                0 => match tok {
                    Token::Number(lexeme) => {
                        restore_pos = self.pos()?;
                        first = lexeme;
                        level = 1;
                    },
                    other => return Ok(other),
                },
                1 => match tok {
                    Token::Number(lexeme) => {
                        second = lexeme;
                        level = 2;
                    },
                    Token::EndOfInput => return Ok(Token::Number(first)),
                    _ => {
                        self.seek(restore_pos)?;
                        return Ok(Token::Number(first));
                    },
                },
                _ => {
                    if tok.is_other("R") {
                        if let (Ok(number), Ok(generation)) =
                            (first.parse::<u32>(), second.parse::<u16>())
                        {
                            return Ok(Token::Reference { number, generation });
                        }
                    }
                    self.seek(restore_pos)?;
                    return Ok(Token::Number(first));
                },
            }
        }
    }

    fn skip_whitespace(&mut self) -> Result<Option<u8>> {
        loop {
            match self.read_byte()? {
                None => return Ok(None),
                Some(b) if is_whitespace(b) => continue,
                Some(b) => return Ok(Some(b)),
            }
        }
    }

    fn lex_name(&mut self) -> Result<Token> {
        let mut name = Vec::new();
        loop {
            match self.read_byte()? {
                None => break,
                Some(b) if is_delimiter_or_whitespace(b) => {
                    self.back_one()?;
                    break;
                },
                Some(b'#') => {
                    let hi = self.read_byte()?.and_then(hex_value);
                    let lo = self.read_byte()?.and_then(hex_value);
                    match (hi, lo) {
                        (Some(hi), Some(lo)) => name.push((hi << 4) | lo),
                        _ => return Err(self.parse_error("invalid #xx escape in name")),
                    }
                },
                Some(b) => name.push(b),
            }
        }
        Ok(Token::Name(String::from_utf8_lossy(&name).into_owned()))
    }

    fn lex_hex_string(&mut self, first: u8) -> Result<Token> {
        let mut bytes = Vec::new();
        let mut hi = Some(first);
        loop {
            let mut h = match hi.take() {
                Some(b) => b,
                None => self.read_byte()?.ok_or(Error::UnexpectedEof)?,
            };
            while is_whitespace(h) {
                h = self.read_byte()?.ok_or(Error::UnexpectedEof)?;
            }
            if h == b'>' {
                break;
            }
            let h = hex_value(h).ok_or_else(|| self.parse_error("invalid hex digit in string"))?;

            let mut l = self.read_byte()?.ok_or(Error::UnexpectedEof)?;
            while is_whitespace(l) {
                l = self.read_byte()?.ok_or(Error::UnexpectedEof)?;
            }
            if l == b'>' {
                // Odd digit count: final digit padded with a zero nibble
                bytes.push(h << 4);
                break;
            }
            let l = hex_value(l).ok_or_else(|| self.parse_error("invalid hex digit in string"))?;
            bytes.push((h << 4) | l);
        }
        Ok(Token::String { bytes, hex: true })
    }

    fn lex_literal_string(&mut self) -> Result<Token> {
        let mut bytes = Vec::new();
        let mut nesting: i32 = 0;
        loop {
            let mut ch = match self.read_byte()? {
                Some(b) => b,
                None => return Err(Error::UnexpectedEof),
            };
            match ch {
                b'(' => nesting += 1,
                b')' => nesting -= 1,
                b'\\' => {
                    let esc = match self.read_byte()? {
                        Some(b) => b,
                        None => return Err(Error::UnexpectedEof),
                    };
                    match esc {
                        b'n' => ch = b'\n',
                        b'r' => ch = b'\r',
                        b't' => ch = b'\t',
                        b'b' => ch = 0x08,
                        b'f' => ch = 0x0C,
                        b'(' | b')' | b'\\' => ch = esc,
                        b'\r' => {
                            // Line continuation, swallow an optional LF
                            if let Some(next) = self.read_byte()? {
                                if next != b'\n' {
                                    self.back_one()?;
                                }
                            }
                            continue;
                        },
                        b'\n' => continue,
                        b'0'..=b'7' => {
                            let mut octal = (esc - b'0') as u32;
                            for _ in 0..2 {
                                match self.read_byte()? {
                                    Some(d @ b'0'..=b'7') => {
                                        octal = (octal << 3) + (d - b'0') as u32;
                                    },
                                    Some(_) => {
                                        self.back_one()?;
                                        break;
                                    },
                                    None => break,
                                }
                            }
                            // Index overflow folds into a byte
                            ch = (octal & 0xFF) as u8;
                        },
                        // Unknown escape: backslash dropped, character kept
                        other => ch = other,
                    }
                },
                b'\r' => {
                    // Bare CR and CRLF both normalize to LF
                    if let Some(next) = self.read_byte()? {
                        if next != b'\n' {
                            self.back_one()?;
                        }
                    }
                    ch = b'\n';
                },
                _ => {},
            }
            if nesting == -1 {
                break;
            }
            bytes.push(ch);
        }
        Ok(Token::String { bytes, hex: false })
    }

    fn lex_number(&mut self, first: u8) -> Result<Token> {
        let mut lexeme = String::new();
        let mut is_real = false;
        let mut minuses = 0u32;
        let mut next;

        if first == b'-' {
            // Tolerate runs of minus signs the way desktop readers do
            next = Some(first);
            while next == Some(b'-') {
                minuses += 1;
                next = self.read_byte()?;
            }
            lexeme.push('-');
        } else {
            lexeme.push(first as char);
            next = self.read_byte()?;
        }

        while let Some(b) = next {
            if b == b'.' {
                is_real = true;
                lexeme.push('.');
            } else if b.is_ascii_digit() {
                lexeme.push(b as char);
            } else {
                break;
            }
            next = self.read_byte()?;
        }

        if minuses > 1 && !is_real {
            // More than one leading minus on an integer literal reads as
            // zero; documented compatibility behavior, not negation.
            lexeme.clear();
            lexeme.push('0');
        }
        if next.is_some() {
            self.back_one()?;
        }
        Ok(Token::Number(lexeme))
    }

    /// Locate the literal `startxref` marker nearest the end of the file,
    /// scanning 1 KiB windows backward. Returns its absolute position.
    pub fn find_startxref(&mut self) -> Result<u64> {
        const NEEDLE: &[u8] = b"startxref";
        const WINDOW: u64 = 1024;

        let file_len = self.src.seek(SeekFrom::End(0))?;
        let mut end = file_len;
        while end > 0 {
            let start = end.saturating_sub(WINDOW);
            let len = (end - start) as usize;
            self.seek(start)?;
            let mut buf = vec![0u8; len];
            self.src.read_exact(&mut buf)?;
            if let Some(idx) = buf
                .windows(NEEDLE.len())
                .rposition(|w| w == NEEDLE)
            {
                return Ok(start + idx as u64);
            }
            if start == 0 {
                break;
            }
            end = start + NEEDLE.len() as u64 - 1;
        }
        Err(Error::StartxrefNotFound)
    }

    /// Read one line, skipping leading whitespace; CR, LF, and CRLF all
    /// terminate. `None` when the input is exhausted.
    pub fn read_line(&mut self, max: usize) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let mut ch = loop {
            match self.read_byte()? {
                None => return Ok(None),
                Some(b) if is_whitespace(b) => continue,
                Some(b) => break Some(b),
            }
        };

        while let Some(b) = ch {
            match b {
                b'\n' => break,
                b'\r' => {
                    if let Some(next) = self.read_byte()? {
                        if next != b'\n' {
                            self.back_one()?;
                        }
                    }
                    break;
                },
                _ => {
                    if line.len() < max {
                        line.push(b);
                    }
                },
            }
            ch = self.read_byte()?;
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lex_all(input: &[u8]) -> Vec<Token> {
        let mut cursor = Cursor::new(input.to_vec());
        let mut lexer = Lexer::new(&mut cursor, 0);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            if tok == Token::EndOfInput {
                break;
            }
            tokens.push(tok);
        }
        tokens
    }

    fn first_token(input: &[u8]) -> Token {
        lex_all(input).into_iter().next().unwrap()
    }

    #[test]
    fn test_integer_and_real() {
        assert_eq!(first_token(b"42"), Token::Number("42".to_string()));
        assert_eq!(first_token(b"-123"), Token::Number("-123".to_string()));
        assert_eq!(first_token(b"3.14"), Token::Number("3.14".to_string()));
        assert_eq!(first_token(b".5"), Token::Number(".5".to_string()));
        assert_eq!(first_token(b"+17"), Token::Number("+17".to_string()));
    }

    #[test]
    fn test_double_minus_integer_is_zero() {
        assert_eq!(first_token(b"--234 "), Token::Number("0".to_string()));
        assert_eq!(first_token(b"---9 "), Token::Number("0".to_string()));
        // Reals keep a single minus
        assert_eq!(first_token(b"--2.5 "), Token::Number("-2.5".to_string()));
    }

    #[test]
    fn test_literal_string_plain() {
        assert_eq!(
            first_token(b"(Hello World)"),
            Token::String {
                bytes: b"Hello World".to_vec(),
                hex: false
            }
        );
    }

    #[test]
    fn test_literal_string_nested_parens() {
        assert_eq!(
            first_token(b"(a (b) c)"),
            Token::String {
                bytes: b"a (b) c".to_vec(),
                hex: false
            }
        );
    }

    #[test]
    fn test_literal_string_escapes() {
        assert_eq!(
            first_token(b"(a\\nb\\tc\\(d\\))"),
            Token::String {
                bytes: b"a\nb\tc(d)".to_vec(),
                hex: false
            }
        );
    }

    #[test]
    fn test_literal_string_octal() {
        assert_eq!(
            first_token(b"(\\101\\102)"),
            Token::String {
                bytes: b"AB".to_vec(),
                hex: false
            }
        );
        // Short octal stops at a non-octal digit
        assert_eq!(
            first_token(b"(\\53x)"),
            Token::String {
                bytes: b"+x".to_vec(),
                hex: false
            }
        );
        // Overflow folds into a byte: \501 = 0o501 & 0xFF = 0x41
        assert_eq!(
            first_token(b"(\\501)"),
            Token::String {
                bytes: b"A".to_vec(),
                hex: false
            }
        );
    }

    #[test]
    fn test_literal_string_line_continuation() {
        assert_eq!(
            first_token(b"(ab\\\ncd)"),
            Token::String {
                bytes: b"abcd".to_vec(),
                hex: false
            }
        );
        assert_eq!(
            first_token(b"(ab\\\r\ncd)"),
            Token::String {
                bytes: b"abcd".to_vec(),
                hex: false
            }
        );
    }

    #[test]
    fn test_literal_string_cr_normalized() {
        assert_eq!(
            first_token(b"(a\r\nb)"),
            Token::String {
                bytes: b"a\nb".to_vec(),
                hex: false
            }
        );
        assert_eq!(
            first_token(b"(a\rb)"),
            Token::String {
                bytes: b"a\nb".to_vec(),
                hex: false
            }
        );
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(
            first_token(b"<48656C6C6F>"),
            Token::String {
                bytes: b"Hello".to_vec(),
                hex: true
            }
        );
    }

    #[test]
    fn test_hex_string_embedded_whitespace() {
        assert_eq!(
            first_token(b"<48 65 6C\n6C 6F>"),
            Token::String {
                bytes: b"Hello".to_vec(),
                hex: true
            }
        );
    }

    #[test]
    fn test_hex_string_odd_digit_padded() {
        assert_eq!(
            first_token(b"<9>"),
            Token::String {
                bytes: vec![0x90],
                hex: true
            }
        );
    }

    #[test]
    fn test_name() {
        assert_eq!(first_token(b"/Type "), Token::Name("Type".to_string()));
        assert_eq!(
            first_token(b"/A;Name_With-Stars*** "),
            Token::Name("A;Name_With-Stars***".to_string())
        );
    }

    #[test]
    fn test_name_hex_escape() {
        assert_eq!(first_token(b"/A#20B "), Token::Name("A B".to_string()));
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            lex_all(b"[ ] << >>"),
            vec![Token::StartArray, Token::EndArray, Token::StartDict, Token::EndDict]
        );
    }

    #[test]
    fn test_lone_gt_is_error() {
        let mut cursor = Cursor::new(b"> ".to_vec());
        let mut lexer = Lexer::new(&mut cursor, 0);
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_keywords_are_other() {
        assert_eq!(first_token(b"obj "), Token::Other("obj".to_string()));
        assert_eq!(first_token(b"endstream "), Token::Other("endstream".to_string()));
        assert_eq!(first_token(b"true "), Token::Other("true".to_string()));
    }

    #[test]
    fn test_comment_token() {
        assert_eq!(
            lex_all(b"% a comment\n42"),
            vec![Token::Comment, Token::Number("42".to_string())]
        );
    }

    #[test]
    fn test_meaningful_skips_comments() {
        let mut cursor = Cursor::new(b"% skip me\n/Name".to_vec());
        let mut lexer = Lexer::new(&mut cursor, 0);
        assert_eq!(
            lexer.next_meaningful_token().unwrap(),
            Token::Name("Name".to_string())
        );
    }

    #[test]
    fn test_meaningful_reference() {
        let mut cursor = Cursor::new(b"12 0 R ".to_vec());
        let mut lexer = Lexer::new(&mut cursor, 0);
        assert_eq!(
            lexer.next_meaningful_token().unwrap(),
            Token::Reference {
                number: 12,
                generation: 0
            }
        );
    }

    #[test]
    fn test_meaningful_backtracks_two_numbers() {
        let mut cursor = Cursor::new(b"10 20 30".to_vec());
        let mut lexer = Lexer::new(&mut cursor, 0);
        assert_eq!(
            lexer.next_meaningful_token().unwrap(),
            Token::Number("10".to_string())
        );
        // The cursor must be restored so the next calls re-read 20 and 30
        assert_eq!(
            lexer.next_meaningful_token().unwrap(),
            Token::Number("20".to_string())
        );
        assert_eq!(
            lexer.next_meaningful_token().unwrap(),
            Token::Number("30".to_string())
        );
    }

    #[test]
    fn test_meaningful_backtracks_number_then_keyword() {
        let mut cursor = Cursor::new(b"5 obj".to_vec());
        let mut lexer = Lexer::new(&mut cursor, 0);
        assert_eq!(
            lexer.next_meaningful_token().unwrap(),
            Token::Number("5".to_string())
        );
        assert_eq!(
            lexer.next_meaningful_token().unwrap(),
            Token::Other("obj".to_string())
        );
    }

    #[test]
    fn test_meaningful_number_at_eof() {
        let mut cursor = Cursor::new(b"77".to_vec());
        let mut lexer = Lexer::new(&mut cursor, 0);
        assert_eq!(
            lexer.next_meaningful_token().unwrap(),
            Token::Number("77".to_string())
        );
    }

    #[test]
    fn test_find_startxref() {
        let mut data = vec![b'x'; 3000];
        data.extend_from_slice(b"startxref\n1234\n%%EOF\n");
        let marker_pos = 3000u64;
        let mut cursor = Cursor::new(data);
        let mut lexer = Lexer::new(&mut cursor, 0);
        assert_eq!(lexer.find_startxref().unwrap(), marker_pos);
    }

    #[test]
    fn test_find_startxref_deep_in_file() {
        // Marker further than one window from the end
        let mut data = b"startxref\n99\n".to_vec();
        data.extend(vec![b' '; 4096]);
        let mut cursor = Cursor::new(data);
        let mut lexer = Lexer::new(&mut cursor, 0);
        assert_eq!(lexer.find_startxref().unwrap(), 0);
    }

    #[test]
    fn test_find_startxref_missing() {
        let mut cursor = Cursor::new(b"no marker here".to_vec());
        let mut lexer = Lexer::new(&mut cursor, 0);
        assert!(matches!(lexer.find_startxref(), Err(Error::StartxrefNotFound)));
    }

    #[test]
    fn test_read_line() {
        let mut cursor = Cursor::new(b"  first line\r\nsecond\rthird\n".to_vec());
        let mut lexer = Lexer::new(&mut cursor, 0);
        assert_eq!(lexer.read_line(64).unwrap().unwrap(), b"first line");
        assert_eq!(lexer.read_line(64).unwrap().unwrap(), b"second");
        assert_eq!(lexer.read_line(64).unwrap().unwrap(), b"third");
        assert_eq!(lexer.read_line(64).unwrap(), None);
    }

    #[test]
    fn test_seek_from_header() {
        let mut cursor = Cursor::new(b"JUNK%PDF-1.4 42".to_vec());
        let mut lexer = Lexer::new(&mut cursor, 4);
        lexer.seek_from_header(9).unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::Number("42".to_string()));
    }

    #[test]
    fn test_token_numeric_helpers() {
        assert_eq!(Token::Number("42".to_string()).to_i64(), Some(42));
        assert_eq!(Token::Number("3.5".to_string()).to_f64(), Some(3.5));
        assert_eq!(Token::Other("obj".to_string()).to_i64(), None);
    }
}
