//! Incremental stamping session.
//!
//! A [`Stamper`] takes ownership of an open [`Document`] and an output sink
//! and produces a strict incremental update: the original bytes, untouched,
//! followed by the image XObjects, a rewritten Info dictionary, the amended
//! page objects, a new cross-reference table, and a trailer whose `/Prev`
//! points back at the input's newest table.
//!
//! Watermarks are staged by [`Stamper::add_watermark`] and merged into the
//! document by [`Stamper::finish`], which consumes the session; a finished
//! update is not resumable.

use super::body::{Body, TrailerSpec};
use super::stamp::{self, PageStamp};
use super::CountingWriter;
use crate::config::StampConfig;
use crate::decoders;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::image::{self, ImageData, AX, AY, BX, BY, CX, CY, DX, DY};
use crate::names;
use crate::object::{Dict, Object, ObjectRef, StringFormat};
use indexmap::IndexMap;
use md5::{Digest, Md5};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

struct PendingImage {
    image: ImageData,
    name: String,
}

/// An incremental-update writing session over one document.
pub struct Stamper<W: Write> {
    doc: Document,
    out: CountingWriter<W>,
    body: Body,
    initial_size: u32,
    prev_xref: u64,
    stamps: IndexMap<u32, PageStamp>,
    marked: BTreeSet<u32>,
    renumber: HashMap<u32, u32>,
    images: IndexMap<u128, PendingImage>,
}

impl Stamper<BufWriter<File>> {
    /// Start a stamping session writing to a new file.
    pub fn create(doc: Document, path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        Self::new(doc, BufWriter::new(file))
    }
}

impl<W: Write> Stamper<W> {
    /// Start a stamping session over `doc`, writing to `out`.
    ///
    /// The allocation counter is seeded with the document's object count so
    /// appended objects never collide with existing numbers, and the
    /// input's newest `startxref` is captured for trailer chaining before
    /// any writing begins.
    pub fn new(mut doc: Document, out: W) -> Result<Self> {
        doc.set_appendable(true);
        let initial_size = doc.object_count();
        let prev_xref = doc.startxref();
        let mut body = Body::new();
        body.set_refnum(initial_size);
        Ok(Self {
            doc,
            out: CountingWriter::new(out),
            body,
            initial_size,
            prev_xref,
            stamps: IndexMap::new(),
            marked: BTreeSet::new(),
            renumber: HashMap::new(),
            images: IndexMap::new(),
        })
    }

    /// The wrapped document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Stage a watermark image on the pages selected by `config`.
    ///
    /// The image (and its mask, if any) is registered once per session no
    /// matter how many pages it lands on; each page's stamp records a
    /// `q <matrix> cm /<name> Do Q` draw placed per the config's anchor and
    /// rotation against that page's rotated media box.
    pub fn add_watermark(&mut self, image: &ImageData, config: &StampConfig) -> Result<()> {
        let selected = config.pages.select(self.doc.page_count());
        if selected.is_empty() {
            return Err(Error::PageOutOfRange(1));
        }

        let name = self.register_image(image);
        let mask_binding = image.mask.as_deref().and_then(|mask| {
            self.images
                .get(&mask.id())
                .map(|pending| (pending.name.clone(), mask.id()))
        });

        let matrix = image.matrix(config.rotate_degrees);
        let extent = (matrix[DX] - matrix[CX], matrix[DY] - matrix[CY]);

        for page_index in selected {
            let page_ref = self.doc.page_ref(page_index)?;
            if !self.stamps.contains_key(&page_ref.number) {
                let page_dict = self.doc.page_dict(page_index)?;
                let resources = match page_dict.get(names::RESOURCES).cloned() {
                    Some(value) => match self.doc.resolve(&value)? {
                        Object::Dictionary(d) => d,
                        _ => Dict::new(),
                    },
                    None => Dict::new(),
                };
                self.stamps.insert(
                    page_ref.number,
                    PageStamp::new(page_ref, page_index, page_dict, resources),
                );
            }

            let page_rect = self.doc.media_box_with_rotation(page_index)?;
            let (x, y) = config.anchor.position(&page_rect, extent.0, extent.1);
            let e = x - matrix[CX];
            let f = y - matrix[CY];

            if let Some(stamp) = self.stamps.get_mut(&page_ref.number) {
                if let Some((mask_name, mask_id)) = &mask_binding {
                    stamp.add_xobject(mask_name, *mask_id);
                }
                stamp.add_xobject(&name, image.id());
                stamp.append_image_draw(
                    [matrix[AX], matrix[AY], matrix[BX], matrix[BY], e, f],
                    &name,
                );
            }
        }
        Ok(())
    }

    /// Register an image (and its mask) for emission, returning its
    /// session-wide resource name. Re-registering the same image is a
    /// no-op.
    fn register_image(&mut self, image: &ImageData) -> String {
        if let Some(pending) = self.images.get(&image.id()) {
            return pending.name.clone();
        }
        if let Some(mask) = image.mask.as_deref() {
            if !self.images.contains_key(&mask.id()) {
                let mask_name = format!("img{}", self.images.len());
                let mut detached = mask.clone();
                detached.mask = None;
                self.images.insert(
                    mask.id(),
                    PendingImage {
                        image: detached,
                        name: mask_name,
                    },
                );
            }
        }
        let name = format!("img{}", self.images.len());
        self.images.insert(
            image.id(),
            PendingImage {
                image: image.clone(),
                name: name.clone(),
            },
        );
        name
    }

    /// Write the incremental update and close the session.
    pub fn finish(mut self) -> Result<()> {
        self.doc.copy_original(&mut self.out)?;
        self.out.write_all(b"\n")?;

        // Image XObjects; masks were registered first and are emitted
        // before the images that reference them.
        let mut image_refs: HashMap<u128, ObjectRef> = HashMap::new();
        let pending = std::mem::take(&mut self.images);
        for (id, entry) in pending {
            let mask_ref = entry
                .image
                .mask
                .as_deref()
                .and_then(|mask| image_refs.get(&mask.id()).map(|r| (*r, mask.soft)));
            let xobject = image::build_xobject(&entry.image, mask_ref)?;
            let obj_ref = self.body.add_new(&mut self.out, &xobject)?;
            image_refs.insert(id, obj_ref);
        }

        let trailer = self.doc.trailer().clone();
        let (info_ref, skip_info) = self.write_info(&trailer)?;

        // Content amendment and page re-emission.
        let stamps = std::mem::take(&mut self.stamps);
        let mut amended = Vec::with_capacity(stamps.len());
        for (_, mut page_stamp) in stamps {
            self.marked.insert(page_stamp.page_ref.number);
            self.alter_contents(&mut page_stamp, &image_refs)?;
            amended.push(page_stamp);
        }
        for page_stamp in &amended {
            let page_ref = page_stamp.page_ref;
            self.body.add(
                &mut self.out,
                &Object::Dictionary(page_stamp.page_dict.clone()),
                page_ref.number,
                page_ref.generation,
            )?;
            self.marked.remove(&page_ref.number);
        }

        // Remaining marked originals are re-emitted unchanged at their own
        // numbers; session-invented numbers go through the renumber table.
        let marked: Vec<u32> = self.marked.iter().copied().collect();
        for number in marked {
            if Some(number) == skip_info {
                continue;
            }
            if let Some(object) = self.doc.load_object(number)? {
                let target = self.map_object_number(number);
                self.body.add(&mut self.out, &object, target, 0)?;
            }
        }

        let xref_offset = self.body.write_xref(&mut self.out)?;
        let root = trailer
            .get(names::ROOT)
            .and_then(|o| o.as_reference())
            .ok_or(Error::MissingCatalog)?;
        let root = ObjectRef::new(self.map_object_number(root.number), root.generation);
        let spec = TrailerSpec {
            root,
            info: Some(info_ref),
            encrypt: None,
            id: Some(build_file_id(&trailer)),
            prev: Some(self.prev_xref),
        };
        self.body.write_trailer(&mut self.out, &spec, xref_offset)?;
        self.out.flush()?;
        Ok(())
    }

    /// Rewrite the Info dictionary: old entries preserved, `/Producer`
    /// kept or defaulted, `/ModDate` refreshed. The old object number is
    /// reused when Info was indirect.
    fn write_info(&mut self, trailer: &Dict) -> Result<(ObjectRef, Option<u32>)> {
        let (old_info, old_ref) = match trailer.get(names::INFO).cloned() {
            Some(Object::Reference(r)) => {
                let dict = match self.doc.load_object(r.number)? {
                    Some(Object::Dictionary(d)) => d,
                    _ => Dict::new(),
                };
                (dict, Some(r))
            },
            Some(Object::Dictionary(d)) => (d, None),
            _ => (Dict::new(), None),
        };

        let mut info = old_info;
        if !info.contains_key(names::PRODUCER) {
            info.insert(
                names::PRODUCER.to_string(),
                Object::string(&format!("{} {}", crate::NAME, crate::VERSION)),
            );
        }
        info.insert(
            names::MOD_DATE.to_string(),
            Object::String(pdf_date(chrono::Local::now()).into_bytes(), StringFormat::Literal),
        );

        let info_ref = match old_ref {
            Some(r) if r.number < self.initial_size => {
                self.body
                    .add(&mut self.out, &Object::Dictionary(info), r.number, r.generation)?
            },
            _ => self.body.add_new(&mut self.out, &Object::Dictionary(info))?,
        };
        Ok((info_ref, old_ref.map(|r| r.number)))
    }

    /// Merge the staged content and resource bindings into the stamp's
    /// page dictionary.
    fn alter_contents(
        &mut self,
        page_stamp: &mut PageStamp,
        image_refs: &HashMap<u128, ObjectRef>,
    ) -> Result<()> {
        let mut page_dict = page_stamp.page_dict.clone();

        let contents_value = page_dict.get(names::CONTENTS).cloned();
        let mut contents: Vec<Object> = match &contents_value {
            None => Vec::new(),
            Some(value) => {
                let (resolved, _origin) = self
                    .doc
                    .resolve_with_origin(value, Some(page_stamp.page_ref))?;
                match resolved {
                    Object::Array(items) => items,
                    Object::Stream { .. } => vec![value.clone()],
                    _ => Vec::new(),
                }
            },
        };

        // Save graphics state ahead of whatever the page already draws.
        let prefix_ref = {
            let prefix = flate_stream(b"q\n")?;
            self.body.add_new(&mut self.out, &prefix)?
        };
        contents.insert(0, Object::Reference(prefix_ref));

        if !page_stamp.content.is_empty() {
            let rotation = self.doc.rotation(page_stamp.page_index)?;
            let page_rect = self.doc.media_box_with_rotation(page_stamp.page_index)?;
            let overlay_bytes = stamp::assemble_overlay(
                &page_stamp.content,
                page_stamp.replace_point,
                rotation,
                &page_rect,
            );
            let overlay = flate_stream(&overlay_bytes)?;
            let overlay_ref = self.body.add_new(&mut self.out, &overlay)?;
            contents.push(Object::Reference(overlay_ref));
        }
        page_dict.insert(names::CONTENTS.to_string(), Object::Array(contents));

        // Resources: original snapshot plus the new XObject bindings.
        let mut resources = page_stamp.original_resources.clone();
        let mut xobjects = match resources.get(names::XOBJECT).cloned() {
            Some(value) => match self.doc.resolve(&value)? {
                Object::Dictionary(d) => d,
                _ => Dict::new(),
            },
            None => Dict::new(),
        };
        for (res_name, image_id) in &page_stamp.xobjects {
            if let Some(obj_ref) = image_refs.get(image_id) {
                xobjects.insert(res_name.clone(), Object::Reference(*obj_ref));
            }
        }
        resources.insert(names::XOBJECT.to_string(), Object::Dictionary(xobjects));
        page_dict.insert(names::RESOURCES.to_string(), Object::Dictionary(resources));

        page_stamp.page_dict = page_dict;
        Ok(())
    }

    /// Map an original object number into the output: numbers below the
    /// original document's object count are reused as-is; anything at or
    /// above it was invented during this session and gets a fresh number
    /// through the renumbering table.
    fn map_object_number(&mut self, number: u32) -> u32 {
        if number < self.initial_size {
            return number;
        }
        if let Some(mapped) = self.renumber.get(&number) {
            return *mapped;
        }
        let fresh = self.body.allocate();
        self.renumber.insert(number, fresh);
        fresh
    }
}

fn flate_stream(data: &[u8]) -> Result<Object> {
    let packed = decoders::deflate(data)?;
    let mut dict = Dict::new();
    dict.insert(names::LENGTH.to_string(), Object::Integer(packed.len() as i64));
    dict.insert(names::FILTER.to_string(), Object::name(names::FLATE_DECODE));
    Ok(Object::Stream {
        dict,
        data: bytes::Bytes::from(packed),
    })
}

/// `D:YYYYMMDDHHmmSS+hh'mm'` timestamp for the Info dictionary.
fn pdf_date(now: chrono::DateTime<chrono::Local>) -> String {
    let offset = now.offset().local_minus_utc();
    let sign = if offset >= 0 { '+' } else { '-' };
    let abs = offset.abs();
    format!(
        "{}{}{:02}'{:02}'",
        now.format("D:%Y%m%d%H%M%S"),
        sign,
        abs / 3600,
        (abs % 3600) / 60
    )
}

/// The trailer `/ID` pair: the original first identifier (or a fresh one)
/// plus a fresh second identifier for this revision.
fn build_file_id(trailer: &Dict) -> Object {
    let first = trailer
        .get(names::ID)
        .and_then(|o| o.as_array())
        .and_then(|a| a.first())
        .and_then(|o| o.as_string())
        .map(|b| b.to_vec())
        .unwrap_or_else(fresh_file_id);
    Object::Array(vec![
        Object::String(first, StringFormat::Hex),
        Object::String(fresh_file_id(), StringFormat::Hex),
    ])
}

/// A 16-byte revision identifier from a random UUID digest.
fn fresh_file_id() -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pdf_date_format() {
        let moment = chrono::Local.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap();
        let formatted = pdf_date(moment);
        assert!(formatted.starts_with("D:20240309143005"));
        assert!(formatted.ends_with('\''));
    }

    #[test]
    fn test_fresh_file_ids_differ() {
        assert_ne!(fresh_file_id(), fresh_file_id());
        assert_eq!(fresh_file_id().len(), 16);
    }

    #[test]
    fn test_build_file_id_keeps_original_first() {
        let mut trailer = Dict::new();
        trailer.insert(
            "ID".to_string(),
            Object::Array(vec![
                Object::String(vec![0xAA; 16], StringFormat::Hex),
                Object::String(vec![0xBB; 16], StringFormat::Hex),
            ]),
        );
        let id = build_file_id(&trailer);
        let array = id.as_array().unwrap();
        assert_eq!(array[0].as_string(), Some(&[0xAA; 16][..]));
        assert_ne!(array[1].as_string(), Some(&[0xBB; 16][..]));
    }

    #[test]
    fn test_flate_stream_round_trips() {
        let obj = flate_stream(b"q\n").unwrap();
        assert_eq!(obj.decode_stream_data().unwrap(), b"q\n");
        assert_eq!(
            obj.as_dict().unwrap().get("Filter").unwrap().as_name(),
            Some("FlateDecode")
        );
    }
}
