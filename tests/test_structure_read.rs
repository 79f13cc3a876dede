//! Integration tests for the read path over whole files.

mod common;

use common::*;
use pdf_stamp::{Document, Object, StampConfig, Stamper};
use std::io::Cursor;

fn image() -> pdf_stamp::ImageData {
    pdf_stamp::ImageData::new(10, 10, 8, 1, vec![0x11; 100]).unwrap()
}

#[test]
fn test_junk_prefix_survives_stamp_and_reopen() {
    init_logging();
    // Offsets in files with leading junk are relative to the %PDF- marker.
    let mut input = b"GARBAGE BYTES ".to_vec();
    let clean = two_page_letter();
    input.extend_from_slice(&clean);

    let doc = Document::from_reader(Cursor::new(input)).unwrap();
    assert_eq!(doc.header_offset(), 14);
    let mut out = Vec::new();
    let mut stamper = Stamper::new(doc, &mut out).unwrap();
    stamper.add_watermark(&image(), &StampConfig::new()).unwrap();
    stamper.finish().unwrap();

    // The junk is dropped; the output starts at the header.
    assert!(out.starts_with(b"%PDF-1.4"));
    assert_eq!(&out[..clean.len()], &clean[..]);

    let mut reopened = Document::from_reader(Cursor::new(out)).unwrap();
    assert_eq!(reopened.header_offset(), 0);
    assert_eq!(reopened.page_count(), 2);
    let page = reopened.page_dict(1).unwrap();
    assert!(page.get("Contents").unwrap().as_array().is_some());
}

#[test]
fn test_trailing_junk_after_eof() {
    init_logging();
    let mut input = two_page_letter();
    input.extend_from_slice(&vec![b'%'; 2048]);
    let mut doc = Document::from_reader(Cursor::new(input)).unwrap();
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.media_box(1).unwrap().width(), 612.0);
}

#[test]
fn test_newest_revision_wins_after_update() {
    init_logging();
    let input = two_page_letter();
    let doc = Document::from_reader(Cursor::new(input.clone())).unwrap();
    let mut out = Vec::new();
    let mut stamper = Stamper::new(doc, &mut out).unwrap();
    stamper.add_watermark(&image(), &StampConfig::new()).unwrap();
    stamper.finish().unwrap();

    // Page 3 exists in both revisions; the appended one must win.
    let mut original = Document::from_reader(Cursor::new(input)).unwrap();
    let mut updated = Document::from_reader(Cursor::new(out)).unwrap();
    let before = original.page_dict(1).unwrap();
    let after = updated.page_dict(1).unwrap();
    assert!(before.get("Contents").unwrap().as_reference().is_some());
    assert!(after.get("Contents").unwrap().as_array().is_some());
    assert!(after
        .get("Resources")
        .unwrap()
        .as_dict()
        .unwrap()
        .contains_key("XObject"));
}

#[test]
fn test_idempotent_loads_on_updated_document() {
    init_logging();
    let input = two_page_letter();
    let doc = Document::from_reader(Cursor::new(input)).unwrap();
    let mut out = Vec::new();
    let mut stamper = Stamper::new(doc, &mut out).unwrap();
    stamper.add_watermark(&image(), &StampConfig::new()).unwrap();
    stamper.finish().unwrap();

    let mut doc = Document::from_reader(Cursor::new(out)).unwrap();
    for number in 1..doc.object_count() {
        let first = doc.load_object(number).unwrap();
        let second = doc.load_object(number).unwrap();
        assert_eq!(first, second, "object {} drifted between loads", number);
    }
}

#[test]
fn test_original_content_streams_untouched() {
    init_logging();
    let input = two_page_letter();
    let doc = Document::from_reader(Cursor::new(input)).unwrap();
    let mut out = Vec::new();
    let mut stamper = Stamper::new(doc, &mut out).unwrap();
    stamper.add_watermark(&image(), &StampConfig::new()).unwrap();
    stamper.finish().unwrap();

    let mut doc = Document::from_reader(Cursor::new(out)).unwrap();
    // Object 5 is page one's original content stream in the base revision.
    let content = doc.load_object(5).unwrap().unwrap();
    match content {
        Object::Stream { data, .. } => {
            assert_eq!(&data[..], b"BT /F1 12 Tf (one) Tj ET\nQ");
        },
        other => panic!("expected stream, got {:?}", other),
    }
}
