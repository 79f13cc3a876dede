//! Incremental body: object-number allocation, object emission, and the
//! output cross-reference table and trailer.
//!
//! Object numbers are allocated in strictly increasing order, so the write
//! cursor is monotonic; the only reordering is the flush-time sort implied
//! by the entry map. Re-adding an object number replaces its entry (last
//! write wins), which is how a modified object gets re-serialized before
//! the final table is emitted.

use super::serializer;
use super::CountingWriter;
use crate::error::Result;
use crate::names;
use crate::object::{Dict, Object, ObjectRef};
use std::collections::BTreeMap;
use std::io::Write;

/// Generation number marking free entries.
const MAX_GENERATION: u16 = 65535;

/// One output cross-reference slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    offset: u64,
    generation: u16,
    free: bool,
}

/// Trailer fields for [`Body::write_trailer`].
pub struct TrailerSpec {
    /// `/Root` reference
    pub root: ObjectRef,
    /// `/Info` reference
    pub info: Option<ObjectRef>,
    /// `/Encrypt` reference (never set by this crate; encryption is
    /// unsupported)
    pub encrypt: Option<ObjectRef>,
    /// `/ID` array
    pub id: Option<Object>,
    /// `/Prev`: offset of the prior revision's cross-reference table
    pub prev: Option<u64>,
}

/// The body of an incremental update.
#[derive(Debug)]
pub struct Body {
    slots: BTreeMap<u32, Slot>,
    refnum: u32,
}

impl Body {
    /// A fresh body carrying the conventional free entry for object 0.
    pub fn new() -> Self {
        let mut slots = BTreeMap::new();
        slots.insert(
            0,
            Slot {
                offset: 0,
                generation: MAX_GENERATION,
                free: true,
            },
        );
        Self { slots, refnum: 1 }
    }

    /// Seed the allocation counter, normally with the prior document's
    /// object count so fresh numbers never collide with existing ones.
    pub fn set_refnum(&mut self, refnum: u32) {
        self.refnum = refnum.max(1);
    }

    /// Allocate the next object number and register a provisional free
    /// slot for it.
    pub fn allocate(&mut self) -> u32 {
        let number = self.refnum;
        self.refnum += 1;
        self.slots.entry(number).or_insert(Slot {
            offset: 0,
            generation: MAX_GENERATION,
            free: true,
        });
        number
    }

    /// Serialize `object` at the current cursor under the given number and
    /// record a live entry for it, replacing any earlier entry.
    pub fn add<W: Write>(
        &mut self,
        out: &mut CountingWriter<W>,
        object: &Object,
        number: u32,
        generation: u16,
    ) -> Result<ObjectRef> {
        let offset = out.count();
        out.write_all(&serializer::serialize_indirect(number, generation, object))?;
        self.slots.insert(
            number,
            Slot {
                offset,
                generation,
                free: false,
            },
        );
        Ok(ObjectRef::new(number, generation))
    }

    /// Allocate a fresh number and write `object` under it.
    pub fn add_new<W: Write>(
        &mut self,
        out: &mut CountingWriter<W>,
        object: &Object,
    ) -> Result<ObjectRef> {
        let number = self.allocate();
        self.add(out, object, number, 0)
    }

    /// The `/Size` value: one past the highest registered number, or the
    /// allocation counter when that is larger.
    pub fn size(&self) -> u32 {
        let highest = self
            .slots
            .keys()
            .next_back()
            .map(|n| n + 1)
            .unwrap_or(0);
        highest.max(self.refnum)
    }

    /// Emit the cross-reference table: entries sorted by object number and
    /// coalesced into maximal contiguous `<start> <count>` subsections.
    /// Returns the table's byte offset.
    pub fn write_xref<W: Write>(&self, out: &mut CountingWriter<W>) -> Result<u64> {
        let table_offset = out.count();
        out.write_all(b"xref\n")?;

        let numbers: Vec<u32> = self.slots.keys().copied().collect();
        let mut run_start = 0usize;
        while run_start < numbers.len() {
            let mut run_len = 1usize;
            while run_start + run_len < numbers.len()
                && numbers[run_start + run_len] == numbers[run_start] + run_len as u32
            {
                run_len += 1;
            }
            write!(
                out,
                "{} {}\n",
                numbers[run_start], run_len
            )?;
            for number in &numbers[run_start..run_start + run_len] {
                let slot = &self.slots[number];
                write!(
                    out,
                    "{:010} {:05} {} \n",
                    slot.offset,
                    slot.generation,
                    if slot.free { 'f' } else { 'n' }
                )?;
            }
            run_start += run_len;
        }
        Ok(table_offset)
    }

    /// Emit the trailer dictionary, the producer marker line, and the
    /// closing `startxref` / `%%EOF`. The body is finished afterwards.
    pub fn write_trailer<W: Write>(
        &self,
        out: &mut CountingWriter<W>,
        spec: &TrailerSpec,
        xref_offset: u64,
    ) -> Result<()> {
        let mut dict = Dict::new();
        dict.insert(names::SIZE.to_string(), Object::Integer(self.size() as i64));
        dict.insert(names::ROOT.to_string(), Object::Reference(spec.root));
        if let Some(info) = spec.info {
            dict.insert(names::INFO.to_string(), Object::Reference(info));
        }
        if let Some(encrypt) = spec.encrypt {
            dict.insert(names::ENCRYPT.to_string(), Object::Reference(encrypt));
        }
        if let Some(id) = &spec.id {
            dict.insert(names::ID.to_string(), id.clone());
        }
        if let Some(prev) = spec.prev {
            dict.insert(names::PREV.to_string(), Object::Integer(prev as i64));
        }

        out.write_all(b"trailer\n")?;
        out.write_all(&serializer::serialize(&Object::Dictionary(dict)))?;
        out.write_all(b"\n")?;
        write!(out, "%{}-{}\n", crate::NAME, crate::VERSION)?;
        write!(out, "startxref\n{}\n%%EOF\n", xref_offset)?;
        Ok(())
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_monotonic_from_seed() {
        let mut body = Body::new();
        body.set_refnum(7);
        assert_eq!(body.allocate(), 7);
        assert_eq!(body.allocate(), 8);
        assert_eq!(body.size(), 9);
    }

    #[test]
    fn test_add_records_offset() {
        let mut body = Body::new();
        let mut out = CountingWriter::new(Vec::new());
        out.write_all(b"0123456789").unwrap();
        body.add(&mut out, &Object::Integer(1), 3, 0).unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.ends_with("3 0 obj\n1\nendobj\n"));

        let mut table = CountingWriter::new(Vec::new());
        body.write_xref(&mut table).unwrap();
        let table = String::from_utf8(table.into_inner()).unwrap();
        assert!(table.contains("0000000010 00000 n \n"));
    }

    #[test]
    fn test_last_write_wins() {
        let mut body = Body::new();
        let mut out = CountingWriter::new(Vec::new());
        body.add(&mut out, &Object::Integer(1), 5, 0).unwrap();
        let second_offset = out.count();
        body.add(&mut out, &Object::Integer(2), 5, 0).unwrap();

        let mut table = CountingWriter::new(Vec::new());
        body.write_xref(&mut table).unwrap();
        let table = String::from_utf8(table.into_inner()).unwrap();
        assert!(table.contains(&format!("{:010} 00000 n \n", second_offset)));
        // Only one subsection for object 5
        assert_eq!(table.matches("5 1\n").count(), 1);
    }

    #[test]
    fn test_xref_runs_coalesced() {
        let mut body = Body::new();
        let mut out = CountingWriter::new(Vec::new());
        for number in [5u32, 6, 7, 12, 13, 20] {
            body.add(&mut out, &Object::Null, number, 0).unwrap();
        }
        let mut table = CountingWriter::new(Vec::new());
        body.write_xref(&mut table).unwrap();
        let text = String::from_utf8(table.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "xref");
        // Runs: {0}, {5,6,7}, {12,13}, {20}
        assert_eq!(lines[1], "0 1");
        assert_eq!(lines[3], "5 3");
        assert_eq!(lines[7], "12 2");
        assert_eq!(lines[10], "20 1");
    }

    #[test]
    fn test_free_placeholder_written_as_free() {
        let mut body = Body::new();
        body.set_refnum(4);
        let number = body.allocate();
        assert_eq!(number, 4);
        let mut table = CountingWriter::new(Vec::new());
        body.write_xref(&mut table).unwrap();
        let text = String::from_utf8(table.into_inner()).unwrap();
        assert!(text.contains("0000000000 65535 f \n"));
        assert!(text.contains("4 1\n"));
    }

    #[test]
    fn test_trailer_contents() {
        let body = Body::new();
        let mut out = CountingWriter::new(Vec::new());
        body.write_trailer(
            &mut out,
            &TrailerSpec {
                root: ObjectRef::new(1, 0),
                info: Some(ObjectRef::new(9, 0)),
                encrypt: None,
                id: None,
                prev: Some(400),
            },
            1234,
        )
        .unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.starts_with("trailer\n"));
        assert!(text.contains("/Root 1 0 R"));
        assert!(text.contains("/Info 9 0 R"));
        assert!(text.contains("/Prev 400"));
        assert!(!text.contains("/Encrypt"));
        assert!(text.ends_with("startxref\n1234\n%%EOF\n"));
    }
}
