//! PDF document session.
//!
//! A [`Document`] owns the open input handle, the header offset and version,
//! the resolved cross-reference state, the catalog, a lazily-populated
//! object cache, and the page tree. The cache is append-only: once an object
//! number has been parsed it is never re-read for the session's lifetime, so
//! repeated loads return value-equal results.
//!
//! Encrypted input is rejected at open time; partial support is not
//! attempted.

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::lexer::{Lexer, ReadSeek};
use crate::names;
use crate::object::{Dict, Object, ObjectRef};
use crate::pages::{self, PageTree};
use crate::parser::{self, Indirect};
use crate::xref::{self, XrefTable};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Minimum supported version, compared lexically against the header digits.
const MIN_VERSION: &str = "1.4";

/// How far into the file the `%PDF-` marker may sit.
const HEADER_SCAN: usize = 1024;

/// An open PDF document.
pub struct Document {
    input: Box<dyn ReadSeek>,
    header_offset: u64,
    version: String,
    xref: XrefTable,
    catalog: Dict,
    pages_root: ObjectRef,
    cache: HashMap<u32, Object>,
    pages: PageTree,
    appendable: bool,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("version", &self.version)
            .field("header_offset", &self.header_offset)
            .field("xref_entries", &self.xref.len())
            .field("cached_objects", &self.cache.len())
            .field("pages", &self.pages.len())
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Open a PDF document from a file path.
    ///
    /// Parses the header, resolves the cross-reference chain, loads the
    /// catalog, and walks the page tree. The handle is closed when the
    /// document is dropped, on success and failure alike.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .map_err(|_| Error::NotAFile(path.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Open a PDF document from any seekable byte source.
    pub fn from_reader<R: std::io::Read + std::io::Seek + 'static>(reader: R) -> Result<Self> {
        Self::build(Box::new(reader))
    }

    fn build(mut input: Box<dyn ReadSeek>) -> Result<Self> {
        let (header_offset, version) = parse_header(input.as_mut())?;

        let table = {
            let mut lexer = Lexer::new(input.as_mut(), header_offset);
            xref::resolve(&mut lexer)?
        };

        if let Some(encrypt) = table.trailer().get(names::ENCRYPT) {
            let empty = matches!(encrypt, Object::Null)
                || matches!(encrypt, Object::Dictionary(d) if d.is_empty());
            if !empty {
                return Err(Error::Encrypted);
            }
        }

        let mut doc = Self {
            input,
            header_offset,
            version,
            xref: table,
            catalog: Dict::new(),
            pages_root: ObjectRef::new(0, 0),
            cache: HashMap::new(),
            pages: PageTree::default(),
            appendable: false,
        };

        let root_ref = doc
            .xref
            .trailer()
            .get(names::ROOT)
            .and_then(|o| o.as_reference())
            .ok_or(Error::MissingCatalog)?;
        doc.catalog = match doc.load_object(root_ref.number)? {
            Some(Object::Dictionary(d)) => d,
            _ => return Err(Error::MissingCatalog),
        };
        doc.pages_root = doc
            .catalog
            .get(names::PAGES)
            .and_then(|o| o.as_reference())
            .ok_or(Error::MissingCatalog)?;

        let pages_root = doc.pages_root;
        doc.pages = pages::build(&mut doc, pages_root)?;
        Ok(doc)
    }

    /// The document version from the header, e.g. `"1.7"`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Byte offset of the `%PDF-` marker.
    pub fn header_offset(&self) -> u64 {
        self.header_offset
    }

    /// The trailer dictionary of the newest revision.
    pub fn trailer(&self) -> &Dict {
        self.xref.trailer()
    }

    /// The catalog (`/Root`) dictionary.
    pub fn catalog(&self) -> &Dict {
        &self.catalog
    }

    /// Header-relative offset of the newest cross-reference section, as
    /// recorded after `startxref`.
    pub fn startxref(&self) -> u64 {
        self.xref.startxref
    }

    /// The document's object count (one past the highest object number).
    pub fn object_count(&self) -> u32 {
        self.xref.size()
    }

    /// Flag the session as the source of an incremental update.
    pub fn set_appendable(&mut self, appendable: bool) {
        self.appendable = appendable;
    }

    /// True when an incremental writer has claimed this session.
    pub fn appendable(&self) -> bool {
        self.appendable
    }

    /// Load an indirect object by number.
    ///
    /// Returns `Ok(None)` for numbers that are absent or free. Results are
    /// cached permanently; a second call never re-parses.
    pub fn load_object(&mut self, number: u32) -> Result<Option<Object>> {
        if let Some(object) = self.cache.get(&number) {
            return Ok(Some(object.clone()));
        }
        let entry = match self.xref.get(number) {
            Some(e) if !e.free => *e,
            _ => return Ok(None),
        };

        let mut lexer = Lexer::new(self.input.as_mut(), self.header_offset);
        lexer.seek_from_header(entry.offset)?;
        let (declared_number, _) = parser::read_object_header(&mut lexer)?;
        if declared_number != number {
            return Err(Error::Parse {
                offset: entry.offset,
                reason: format!(
                    "object header mismatch: expected {}, found {}",
                    number, declared_number
                ),
            });
        }

        let object = match parser::read_indirect(&mut lexer)? {
            Indirect::Value(value) => value,
            Indirect::StreamHeader { mut dict, data_start } => {
                let declared = match dict.get(names::LENGTH) {
                    Some(Object::Integer(l)) if *l >= 0 => Some(*l as u64),
                    Some(Object::Reference(r)) => self
                        .cache
                        .get(&r.number)
                        .and_then(|o| o.as_integer())
                        .filter(|l| *l >= 0)
                        .map(|l| l as u64),
                    _ => None,
                };
                let verified = match declared {
                    Some(len) if stream_end_matches(&mut lexer, data_start + len)? => Some(len),
                    _ => None,
                };
                let length = match verified {
                    Some(len) => len,
                    None => {
                        let recovered = recover_stream_length(&mut lexer, data_start)?;
                        log::warn!(
                            "object {}: /Length {:?} unusable, recovered {} bytes by scan",
                            number,
                            declared,
                            recovered
                        );
                        dict.insert(names::LENGTH.to_string(), Object::Integer(recovered as i64));
                        recovered
                    },
                };
                lexer.seek(data_start)?;
                let mut data = vec![0u8; length as usize];
                lexer.read_exact(&mut data)?;
                Object::Stream {
                    dict,
                    data: bytes::Bytes::from(data),
                }
            },
        };

        self.cache.insert(number, object.clone());
        Ok(Some(object))
    }

    /// Dereference an indirect reference exactly one level; other values
    /// come back as clones. Absent objects resolve to null.
    pub fn resolve(&mut self, object: &Object) -> Result<Object> {
        match object {
            Object::Reference(r) => {
                Ok(self.load_object(r.number)?.unwrap_or(Object::Null))
            },
            other => Ok(other.clone()),
        }
    }

    /// Resolve a value and report which indirect object must be re-emitted
    /// when the resolved value is amended: the referenced object itself for
    /// references, the enclosing `parent` for direct values. The origin is
    /// only reported in appendable mode.
    pub fn resolve_with_origin(
        &mut self,
        object: &Object,
        parent: Option<ObjectRef>,
    ) -> Result<(Object, Option<ObjectRef>)> {
        match object {
            Object::Reference(r) => {
                let value = self.load_object(r.number)?.unwrap_or(Object::Null);
                Ok((value, Some(*r)))
            },
            other => {
                let origin = if self.appendable { parent } else { None };
                Ok((other.clone(), origin))
            },
        }
    }

    pub(crate) fn cache_replace(&mut self, number: u32, object: Object) {
        self.cache.insert(number, object);
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Reference of the 1-based page.
    pub fn page_ref(&self, page: usize) -> Result<ObjectRef> {
        self.pages.get(page).ok_or(Error::PageOutOfRange(page))
    }

    /// Merged dictionary of the 1-based page, inherited attributes filled.
    pub fn page_dict(&mut self, page: usize) -> Result<Dict> {
        let page_ref = self.page_ref(page)?;
        match self.load_object(page_ref.number)? {
            Some(Object::Dictionary(d)) => Ok(d),
            _ => Err(Error::PageOutOfRange(page)),
        }
    }

    /// Effective rotation of the 1-based page, normalized to {0, 90, 180, 270}.
    pub fn rotation(&mut self, page: usize) -> Result<i32> {
        let dict = self.page_dict(page)?;
        let raw = match dict.get(names::ROTATE) {
            Some(value) => self.resolve(value)?.as_integer().unwrap_or(0),
            None => 0,
        };
        let normalized = raw.rem_euclid(360) as i32;
        match normalized {
            0 | 90 | 180 | 270 => Ok(normalized),
            other => {
                log::warn!("page {}: non-quadrant /Rotate {}, treating as 0", page, other);
                Ok(0)
            },
        }
    }

    /// Media box of the 1-based page.
    pub fn media_box(&mut self, page: usize) -> Result<Rect> {
        let dict = self.page_dict(page)?;
        let value = dict
            .get(names::MEDIA_BOX)
            .cloned()
            .ok_or_else(|| Error::InvalidObjectType {
                expected: "MediaBox array".to_string(),
                found: "Null".to_string(),
            })?;
        let array = match self.resolve(&value)? {
            Object::Array(arr) => arr,
            other => {
                return Err(Error::InvalidObjectType {
                    expected: "Array".to_string(),
                    found: other.type_name().to_string(),
                });
            },
        };
        let mut numbers = Vec::with_capacity(array.len());
        for item in &array {
            numbers.push(self.resolve(item)?);
        }
        Rect::from_array(&numbers)
    }

    /// Media box with the page rotation applied (axes swapped for 90/270).
    pub fn media_box_with_rotation(&mut self, page: usize) -> Result<Rect> {
        let rect = self.media_box(page)?;
        match self.rotation(page)? {
            90 | 270 => Ok(rect.rotated()),
            _ => Ok(rect),
        }
    }

    /// Copy the original file from its header offset into `out`, returning
    /// the byte count. This is the unmodified base of an incremental update.
    pub fn copy_original(&mut self, out: &mut dyn Write) -> Result<u64> {
        let mut lexer = Lexer::new(self.input.as_mut(), self.header_offset);
        lexer.seek_from_header(0)?;
        let mut total = 0u64;
        let mut buf = [0u8; 8192];
        loop {
            let n = lexer.read_up_to(&mut buf)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            total += n as u64;
        }
        Ok(total)
    }
}

/// Locate `%PDF-` within the first KiB and lift the 3-character version.
fn parse_header(input: &mut dyn ReadSeek) -> Result<(u64, String)> {
    let mut lexer = Lexer::new(input, 0);
    lexer.seek(0)?;
    let mut buf = vec![0u8; HEADER_SCAN];
    let len = lexer.read_up_to(&mut buf)?;
    buf.truncate(len);

    let marker = b"%PDF-";
    let idx = buf
        .windows(marker.len())
        .position(|w| w == marker)
        .ok_or(Error::InvalidHeader)?;

    let version_start = idx + marker.len();
    if version_start + 3 > buf.len() {
        return Err(Error::InvalidHeader);
    }
    let version = String::from_utf8_lossy(&buf[version_start..version_start + 3]).into_owned();
    if version.as_str() < MIN_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    Ok((idx as u64, version))
}

/// Does `endstream` (after optional whitespace) sit at this position?
fn stream_end_matches(lexer: &mut Lexer<'_>, pos: u64) -> Result<bool> {
    lexer.seek(pos)?;
    let mut buf = [0u8; 32];
    let len = lexer.read_up_to(&mut buf)?;
    let window = &buf[..len];
    let start = window
        .iter()
        .position(|b| !crate::lexer::is_whitespace(*b))
        .unwrap_or(window.len());
    Ok(window[start..].starts_with(b"endstream"))
}

/// Scan forward from the payload start for the `endstream` keyword and
/// derive the true payload length, net of one trailing EOL.
fn recover_stream_length(lexer: &mut Lexer<'_>, data_start: u64) -> Result<u64> {
    const NEEDLE: &[u8] = b"endstream";
    const CHUNK: usize = 4096;

    lexer.seek(data_start)?;
    let mut window: Vec<u8> = Vec::with_capacity(CHUNK + NEEDLE.len());
    let mut window_start = data_start;
    loop {
        let mut buf = [0u8; CHUNK];
        let n = lexer.read_up_to(&mut buf)?;
        if n == 0 {
            return Err(Error::Parse {
                offset: data_start,
                reason: "no 'endstream' found for stream with unusable /Length".to_string(),
            });
        }
        window.extend_from_slice(&buf[..n]);
        if let Some(idx) = window.windows(NEEDLE.len()).position(|w| w == NEEDLE) {
            let end = window_start + idx as u64;
            let mut span = end - data_start;
            // Trim the EOL that separates payload from the keyword.
            let before = &window[..idx];
            if before.ends_with(b"\r\n") {
                span = span.saturating_sub(2);
            } else if before.ends_with(b"\n") || before.ends_with(b"\r") {
                span = span.saturating_sub(1);
            }
            return Ok(span);
        }
        let keep = window.len().min(NEEDLE.len() - 1);
        window_start += (window.len() - keep) as u64;
        let tail = window.split_off(window.len() - keep);
        window = tail;
    }
}
