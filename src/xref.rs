//! Cross-reference table and trailer resolution.
//!
//! The resolver walks the `/Prev` chain newest-first, so entries are
//! strictly additive: the first recorded state for an object number wins and
//! older revisions can never override it.
//!
//! At every chain link a cross-reference *stream* is attempted first; any
//! failure there is swallowed (logged at debug level) and the classical
//! textual table is parsed instead. Only a failure of both paths surfaces.
//! A hybrid file's `/XRefStm` entry is different: once the textual table has
//! committed to it, a broken hybrid stream is a fatal error.

use crate::error::{Error, Result};
use crate::lexer::{Lexer, Token};
use crate::names;
use crate::object::{Dict, Object};
use crate::parser;
use byteorder::{BigEndian, ByteOrder};
use std::collections::HashMap;

/// Longest accepted `/Prev` chain.
const MAX_CHAIN: u32 = 100;

/// Largest accepted subsection entry count.
const MAX_SUBSECTION: i64 = 1_000_000;

/// One cross-reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefEntry {
    /// Byte offset of the object (or next-free number for free entries)
    pub offset: u64,
    /// Generation number
    pub generation: u16,
    /// True for free-list entries
    pub free: bool,
}

/// The accumulated object-number → location table plus trailer state.
#[derive(Debug, Clone, Default)]
pub struct XrefTable {
    entries: HashMap<u32, XrefEntry>,
    trailer: Dict,
    /// Header-relative offset of the newest xref section (`startxref` value)
    pub startxref: u64,
}

impl XrefTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry.
    pub fn get(&self, number: u32) -> Option<&XrefEntry> {
        self.entries.get(&number)
    }

    /// Record an entry unless the number already has a state. Returns true
    /// when the entry was inserted.
    pub fn add_if_absent(&mut self, number: u32, entry: XrefEntry) -> bool {
        use std::collections::hash_map::Entry;
        match self.entries.entry(number) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            },
            Entry::Occupied(_) => false,
        }
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The document's object count: one past the highest recorded number,
    /// or the trailer `/Size` when that is larger.
    pub fn size(&self) -> u32 {
        let max = self
            .entries
            .keys()
            .copied()
            .max()
            .map(|n| n + 1)
            .unwrap_or(0);
        let declared = self
            .trailer
            .get(names::SIZE)
            .and_then(|o| o.as_integer())
            .unwrap_or(0);
        max.max(declared.max(0) as u32)
    }

    /// The trailer dictionary accumulated from the newest revision.
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    fn absorb_trailer(&mut self, dict: &Dict) {
        // Newest revision's trailer wins; older links only fill gaps.
        for key in [
            names::SIZE,
            names::ROOT,
            names::INFO,
            names::ID,
            names::ENCRYPT,
        ] {
            if !self.trailer.contains_key(key) {
                if let Some(value) = dict.get(key) {
                    self.trailer.insert(key.to_string(), value.clone());
                }
            }
        }
    }
}

/// Resolve the full cross-reference state of the file behind `lexer`.
pub fn resolve(lexer: &mut Lexer<'_>) -> Result<XrefTable> {
    let marker = lexer.find_startxref()?;
    lexer.seek(marker)?;
    let keyword = lexer.next_token()?;
    if !keyword.is_other("startxref") {
        return Err(Error::StartxrefNotFound);
    }
    let offset = match lexer.next_token()? {
        ref tok @ Token::Number(_) => tok
            .to_i64()
            .filter(|v| *v >= 0)
            .ok_or(Error::StartxrefNotFound)? as u64,
        _ => return Err(Error::StartxrefNotFound),
    };

    let mut table = XrefTable::new();
    table.startxref = offset;

    let mut next = Some(offset);
    let mut hops = 0u32;
    while let Some(section_offset) = next {
        hops += 1;
        if hops > MAX_CHAIN {
            return Err(Error::InvalidXref(format!(
                "/Prev chain exceeds {} sections",
                MAX_CHAIN
            )));
        }
        let prev = parse_section(lexer, section_offset, &mut table)?;
        if prev == Some(section_offset) {
            return Err(Error::XrefChainCycle(section_offset));
        }
        next = prev;
    }
    Ok(table)
}

/// Parse one chain link, preferring the stream form, and return its `/Prev`.
fn parse_section(
    lexer: &mut Lexer<'_>,
    offset: u64,
    table: &mut XrefTable,
) -> Result<Option<u64>> {
    match parse_xref_stream(lexer, offset) {
        Ok((entries, dict)) => {
            log::debug!("cross-reference stream at offset {}", offset);
            for (number, entry) in entries {
                table.add_if_absent(number, entry);
            }
            let prev = dict.get(names::PREV).and_then(|o| o.as_integer());
            table.absorb_trailer(&dict);
            return Ok(prev.map(|p| p as u64));
        },
        Err(e) => {
            log::debug!(
                "xref stream resolution failed at offset {} ({}); trying textual table",
                offset,
                e
            );
        },
    }
    parse_table(lexer, offset, table)
}

/// Parse a classical textual xref section plus its trailer.
fn parse_table(lexer: &mut Lexer<'_>, offset: u64, table: &mut XrefTable) -> Result<Option<u64>> {
    lexer.seek_from_header(offset)?;
    let keyword = lexer.next_token()?;
    if !keyword.is_other("xref") {
        return Err(Error::InvalidXref(format!(
            "no 'xref' keyword at offset {}",
            offset
        )));
    }

    loop {
        let token = lexer.next_meaningful_token()?;
        if token.is_other("trailer") {
            break;
        }
        let mut start = match token {
            ref tok @ Token::Number(_) => tok
                .to_i64()
                .ok_or_else(|| Error::InvalidXref("bad subsection start".to_string()))?,
            other => {
                return Err(Error::InvalidXref(format!(
                    "unexpected token in xref table: {:?}",
                    other
                )));
            },
        };
        let count = expect_number(lexer, "subsection count")?;
        if !(0..=MAX_SUBSECTION).contains(&count) {
            return Err(Error::InvalidXref(format!(
                "unreasonable subsection count {}",
                count
            )));
        }
        if !(0..=u32::MAX as i64 - MAX_SUBSECTION).contains(&start) {
            return Err(Error::InvalidXref(format!(
                "subsection start {} out of range",
                start
            )));
        }

        if start == 1 {
            // Recover tables written by encoders that number from 1: when
            // the first entry is the conventional head of the free list,
            // shift the whole subsection down by one.
            let checkpoint = lexer.pos()?;
            let first_offset = expect_number(lexer, "entry offset")?;
            let first_generation = expect_number(lexer, "entry generation")?;
            if first_offset == 0 && first_generation == 65535 {
                log::warn!("xref subsection starts at 1 with a free-list head; shifting to 0");
                start = 0;
            }
            lexer.seek(checkpoint)?;
        }

        for number in start..start + count {
            let entry_offset = expect_number(lexer, "entry offset")?;
            let generation = expect_number(lexer, "entry generation")?;
            let kind = lexer.next_token()?;
            let free = match &kind {
                tok if tok.is_other("n") => false,
                tok if tok.is_other("f") => true,
                other => {
                    return Err(Error::InvalidXref(format!(
                        "bad entry type {:?} for object {}",
                        other, number
                    )));
                },
            };
            if entry_offset < 0 || !(0..=65535).contains(&generation) || number < 0 {
                return Err(Error::InvalidXref(format!(
                    "malformed entry for object {}",
                    number
                )));
            }
            table.add_if_absent(
                number as u32,
                XrefEntry {
                    offset: entry_offset as u64,
                    generation: generation as u16,
                    free,
                },
            );
        }
    }

    let trailer = match parser::read_object(lexer, 0)? {
        Object::Dictionary(dict) => dict,
        other => {
            return Err(Error::InvalidTrailer(format!(
                "expected dictionary, found {}",
                other.type_name()
            )));
        },
    };

    // Hybrid file: the trailer commits to an xref stream, so a failure
    // here is fatal, unlike the top-level best-effort attempt.
    if let Some(stm_offset) = trailer.get(names::XREF_STM).and_then(|o| o.as_integer()) {
        let (entries, _) = parse_xref_stream(lexer, stm_offset as u64).map_err(|e| {
            Error::InvalidXref(format!("hybrid /XRefStm at {} failed: {}", stm_offset, e))
        })?;
        for (number, entry) in entries {
            table.add_if_absent(number, entry);
        }
    }

    let prev = trailer.get(names::PREV).and_then(|o| o.as_integer());
    table.absorb_trailer(&trailer);
    Ok(prev.map(|p| p as u64))
}

fn expect_number(lexer: &mut Lexer<'_>, what: &str) -> Result<i64> {
    match lexer.next_meaningful_token()? {
        ref tok @ Token::Number(_) => tok
            .to_i64()
            .ok_or_else(|| Error::InvalidXref(format!("bad {}", what))),
        other => Err(Error::InvalidXref(format!(
            "expected {}, found {:?}",
            what, other
        ))),
    }
}

/// Parse a cross-reference stream object at the given offset.
///
/// Type 0 (free) and type 1 (uncompressed) entries are honored; type 2
/// entries point into object streams and are skipped best-effort.
fn parse_xref_stream(lexer: &mut Lexer<'_>, offset: u64) -> Result<(Vec<(u32, XrefEntry)>, Dict)> {
    lexer.seek_from_header(offset)?;
    let _ = parser::read_object_header(lexer)?;
    let (dict, data_start) = match parser::read_indirect(lexer)? {
        parser::Indirect::StreamHeader { dict, data_start } => (dict, data_start),
        parser::Indirect::Value(other) => {
            return Err(Error::InvalidXref(format!(
                "expected stream object, found {}",
                other.type_name()
            )));
        },
    };

    match dict.get(names::TYPE).and_then(|o| o.as_name()) {
        Some(names::XREF) => {},
        other => {
            return Err(Error::InvalidXref(format!(
                "not an /XRef stream (Type = {:?})",
                other
            )));
        },
    }

    let length = dict
        .get(names::LENGTH)
        .and_then(|o| o.as_integer())
        .filter(|l| *l >= 0)
        .ok_or_else(|| Error::InvalidXref("xref stream /Length unusable".to_string()))?;

    lexer.seek(data_start)?;
    let mut raw = vec![0u8; length as usize];
    let mut filled = 0usize;
    while filled < raw.len() {
        match lexer.read_byte()? {
            Some(b) => {
                raw[filled] = b;
                filled += 1;
            },
            None => return Err(Error::UnexpectedEof),
        }
    }

    let stream = Object::Stream {
        dict: dict.clone(),
        data: bytes::Bytes::from(raw),
    };
    let data = stream.decode_stream_data()?;

    let widths = dict
        .get(names::W)
        .and_then(|o| o.as_array())
        .ok_or_else(|| Error::InvalidXref("missing /W".to_string()))?;
    if widths.len() != 3 {
        return Err(Error::InvalidXref("/W must have 3 fields".to_string()));
    }
    let mut w = [0usize; 3];
    for (i, width) in widths.iter().enumerate() {
        let v = width
            .as_integer()
            .filter(|v| (0..=8).contains(v))
            .ok_or_else(|| Error::InvalidXref("bad /W field".to_string()))?;
        w[i] = v as usize;
    }

    let size = dict
        .get(names::SIZE)
        .and_then(|o| o.as_integer())
        .unwrap_or(0);
    let index: Vec<i64> = match dict.get(names::INDEX).and_then(|o| o.as_array()) {
        Some(arr) => arr.iter().filter_map(|o| o.as_integer()).collect(),
        None => vec![0, size],
    };
    if index.len() % 2 != 0 {
        return Err(Error::InvalidXref("odd /Index length".to_string()));
    }

    let row = w[0] + w[1] + w[2];
    if row == 0 {
        return Err(Error::InvalidXref("zero-width xref stream rows".to_string()));
    }

    let mut entries = Vec::new();
    let mut cursor = 0usize;
    for pair in index.chunks(2) {
        let (start, count) = (pair[0], pair[1]);
        for i in 0..count {
            if cursor + row > data.len() {
                return Err(Error::InvalidXref("xref stream data truncated".to_string()));
            }
            // A zero-width type field defaults to type 1.
            let kind = if w[0] == 0 {
                1
            } else {
                read_field(&data[cursor..], w[0])
            };
            let f2 = read_field(&data[cursor + w[0]..], w[1]);
            let f3 = read_field(&data[cursor + w[0] + w[1]..], w[2]);
            cursor += row;

            let number = (start + i) as u32;
            match kind {
                0 => {
                    entries.push((
                        number,
                        XrefEntry {
                            offset: f2,
                            generation: f3.min(65535) as u16,
                            free: true,
                        },
                    ));
                },
                1 => {
                    entries.push((
                        number,
                        XrefEntry {
                            offset: f2,
                            generation: f3.min(65535) as u16,
                            free: false,
                        },
                    ));
                },
                2 => {
                    // Object-stream entry; object streams are out of scope.
                    log::debug!("skipping compressed entry for object {}", number);
                },
                other => {
                    log::debug!("unknown xref stream entry type {} for object {}", other, number);
                },
            }
        }
    }
    Ok((entries, dict))
}

fn read_field(data: &[u8], width: usize) -> u64 {
    if width == 0 {
        0
    } else {
        BigEndian::read_uint(data, width)
    }
}
