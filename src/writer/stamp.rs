//! Per-page content amendment.
//!
//! A [`PageStamp`] stages the bytes and resource bindings inserted into one
//! page. Nothing touches the page dictionary until flush time, when the
//! stamping session wraps `/Contents` in an array, brackets the staged
//! bytes with graphics-state save/restore streams, and merges the new
//! XObject names into a copy of the original resources.

use super::serializer::fmt_number;
use crate::geometry::Rect;
use crate::object::{Dict, ObjectRef};
use indexmap::IndexMap;

/// Staged amendments for a single page.
#[derive(Debug)]
pub(crate) struct PageStamp {
    /// The page's indirect reference in the original document
    pub page_ref: ObjectRef,
    /// 1-based page index
    pub page_index: usize,
    /// Amended copy of the page dictionary (committed at flush)
    pub page_dict: Dict,
    /// Snapshot of the page's resolved `/Resources` at first touch
    pub original_resources: Dict,
    /// Newly bound XObject resource names → image identity
    pub xobjects: IndexMap<String, u128>,
    /// Appended content-stream bytes
    pub content: Vec<u8>,
    /// Boundary between previously inserted bytes and bytes that need the
    /// rotation compensation re-applied
    pub replace_point: usize,
}

impl PageStamp {
    pub fn new(
        page_ref: ObjectRef,
        page_index: usize,
        page_dict: Dict,
        original_resources: Dict,
    ) -> Self {
        Self {
            page_ref,
            page_index,
            page_dict,
            original_resources,
            xobjects: IndexMap::new(),
            content: Vec::new(),
            replace_point: 0,
        }
    }

    /// Bind an XObject name for this page's resource dictionary.
    pub fn add_xobject(&mut self, name: &str, image_id: u128) {
        self.xobjects.insert(name.to_string(), image_id);
    }

    /// Append an image draw: `q <matrix> cm /<name> Do Q`.
    pub fn append_image_draw(&mut self, matrix: [f32; 6], name: &str) {
        let mut op = String::from("q ");
        for value in matrix {
            op.push_str(&fmt_number(value as f64));
            op.push(' ');
        }
        op.push_str("cm /");
        op.push_str(name);
        op.push_str(" Do Q\n");
        self.content.extend_from_slice(op.as_bytes());
    }
}

/// The overlay stream appended after the original content: restore the
/// state the prefix stream saved, replay staged bytes up to the replace
/// point, re-apply the rotation compensation, replay the rest.
pub(crate) fn assemble_overlay(
    content: &[u8],
    replace_point: usize,
    rotation: i32,
    page: &Rect,
) -> Vec<u8> {
    let split = replace_point.min(content.len());
    let mut out = Vec::with_capacity(content.len() + 32);
    out.extend_from_slice(b" Q\n");
    out.extend_from_slice(&content[..split]);
    out.extend_from_slice(b"q\n");
    out.extend_from_slice(&rotation_compensation(rotation, page));
    out.extend_from_slice(&content[split..]);
    out.extend_from_slice(b"Q\n");
    out
}

/// Fixed compensation matrix per effective page rotation, so inserted
/// content stays upright on rotated pages.
fn rotation_compensation(rotation: i32, page: &Rect) -> Vec<u8> {
    match rotation {
        90 => format!("0 1 -1 0 {} 0 cm\n", fmt_number(page.ury as f64)).into_bytes(),
        180 => format!(
            "-1 0 0 -1 {} {} cm\n",
            fmt_number(page.urx as f64),
            fmt_number(page.ury as f64)
        )
        .into_bytes(),
        270 => format!("0 -1 1 0 0 {} cm\n", fmt_number(page.urx as f64)).into_bytes(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> PageStamp {
        PageStamp::new(ObjectRef::new(3, 0), 1, Dict::new(), Dict::new())
    }

    #[test]
    fn test_append_image_draw() {
        let mut s = stamp();
        s.append_image_draw([100.0, 0.0, 0.0, 50.0, 256.0, 371.0], "img0");
        assert_eq!(
            String::from_utf8(s.content).unwrap(),
            "q 100 0 0 50 256 371 cm /img0 Do Q\n"
        );
    }

    #[test]
    fn test_xobject_binding_order_kept() {
        let mut s = stamp();
        s.add_xobject("img1", 11);
        s.add_xobject("img0", 10);
        let names: Vec<&String> = s.xobjects.keys().collect();
        assert_eq!(names, vec!["img1", "img0"]);
    }

    #[test]
    fn test_overlay_unrotated() {
        let page = Rect::new(0.0, 0.0, 612.0, 792.0);
        let overlay = assemble_overlay(b"DRAW\n", 0, 0, &page);
        assert_eq!(overlay, b" Q\nq\nDRAW\nQ\n".to_vec());
    }

    #[test]
    fn test_overlay_rotated_90() {
        let page = Rect::new(0.0, 0.0, 612.0, 792.0);
        let overlay = assemble_overlay(b"DRAW\n", 0, 90, &page);
        assert_eq!(
            String::from_utf8(overlay).unwrap(),
            " Q\nq\n0 1 -1 0 792 0 cm\nDRAW\nQ\n"
        );
    }

    #[test]
    fn test_overlay_rotated_180_and_270() {
        let page = Rect::new(0.0, 0.0, 612.0, 792.0);
        let overlay = String::from_utf8(assemble_overlay(b"", 0, 180, &page)).unwrap();
        assert!(overlay.contains("-1 0 0 -1 612 792 cm\n"));
        let overlay = String::from_utf8(assemble_overlay(b"", 0, 270, &page)).unwrap();
        assert!(overlay.contains("0 -1 1 0 0 612 cm\n"));
    }

    #[test]
    fn test_overlay_replace_point_splits_content() {
        let page = Rect::new(0.0, 0.0, 100.0, 100.0);
        let overlay = assemble_overlay(b"OLD NEW", 4, 90, &page);
        let text = String::from_utf8(overlay).unwrap();
        let old_idx = text.find("OLD ").unwrap();
        let cm_idx = text.find("cm\n").unwrap();
        let new_idx = text.find("NEW").unwrap();
        assert!(old_idx < cm_idx && cm_idx < new_idx);
    }
}
