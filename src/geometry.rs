//! Geometric primitives for page boxes.

use crate::error::{Error, Result};
use crate::object::Object;

/// An axis-aligned rectangle in default user space, as used by
/// `/MediaBox` and `/CropBox` entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Lower-left x-coordinate
    pub llx: f32,
    /// Lower-left y-coordinate
    pub lly: f32,
    /// Upper-right x-coordinate
    pub urx: f32,
    /// Upper-right y-coordinate
    pub ury: f32,
}

impl Rect {
    /// Create a rectangle, normalizing swapped corners.
    pub fn new(llx: f32, lly: f32, urx: f32, ury: f32) -> Self {
        Self {
            llx: llx.min(urx),
            lly: lly.min(ury),
            urx: llx.max(urx),
            ury: lly.max(ury),
        }
    }

    /// Build a rectangle from a 4-element PDF array of numbers.
    pub fn from_array(arr: &[Object]) -> Result<Self> {
        if arr.len() != 4 {
            return Err(Error::InvalidObjectType {
                expected: "4-element rectangle array".to_string(),
                found: format!("{}-element array", arr.len()),
            });
        }
        let mut v = [0f32; 4];
        for (i, obj) in arr.iter().enumerate() {
            v[i] = obj.as_f64().ok_or_else(|| Error::InvalidObjectType {
                expected: "Number".to_string(),
                found: obj.type_name().to_string(),
            })? as f32;
        }
        Ok(Self::new(v[0], v[1], v[2], v[3]))
    }

    /// Rectangle width.
    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    /// Rectangle height.
    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// The same rectangle with the axes swapped, for 90°/270° page rotation.
    pub fn rotated(&self) -> Self {
        Self::new(self.lly, self.llx, self.ury, self.urx)
    }

    /// Serialize back to a PDF array.
    pub fn to_array(&self) -> Object {
        Object::Array(vec![
            Object::Real(self.llx as f64),
            Object::Real(self.lly as f64),
            Object::Real(self.urx as f64),
            Object::Real(self.ury as f64),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_normalizes_corners() {
        let r = Rect::new(612.0, 792.0, 0.0, 0.0);
        assert_eq!(r.llx, 0.0);
        assert_eq!(r.ury, 792.0);
        assert_eq!(r.width(), 612.0);
        assert_eq!(r.height(), 792.0);
    }

    #[test]
    fn test_rect_from_array() {
        let arr = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Real(792.0),
        ];
        let r = Rect::from_array(&arr).unwrap();
        assert_eq!(r.width(), 612.0);
        assert_eq!(r.height(), 792.0);
    }

    #[test]
    fn test_rect_from_bad_array() {
        let arr = vec![Object::Integer(0), Object::Integer(0)];
        assert!(Rect::from_array(&arr).is_err());
    }

    #[test]
    fn test_rect_rotated_swaps_axes() {
        let r = Rect::new(0.0, 0.0, 612.0, 792.0).rotated();
        assert_eq!(r.width(), 792.0);
        assert_eq!(r.height(), 612.0);
    }
}
