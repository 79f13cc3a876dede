//! Decoded-image input and image XObject construction.
//!
//! The crate does not decode any pixel format. Callers hand in an
//! [`ImageData`] — dimensions, bit depth, component count, and pixel bytes
//! (raw or pre-deflated) — and the writer turns it into an image XObject
//! stream. Stencil masks, soft masks, color-key transparency, and extra
//! dictionary entries (e.g. an indexed palette) are carried through the way
//! the surrounding structure expects them.

use crate::decoders;
use crate::error::{Error, Result};
use crate::names;
use crate::object::{Dict, Object, ObjectRef};

/// Matrix slot indexes: the four transformed corner coordinates.
pub(crate) const AX: usize = 0;
pub(crate) const AY: usize = 1;
pub(crate) const BX: usize = 2;
pub(crate) const BY: usize = 3;
pub(crate) const CX: usize = 4;
pub(crate) const CY: usize = 5;
pub(crate) const DX: usize = 6;
pub(crate) const DY: usize = 7;

/// An externally decoded image, opaque to the core.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Bits per color component (1, 2, 4, 8, or 16)
    pub bits_per_component: u16,
    /// Color components per pixel (1 = gray, 3 = RGB, 4 = CMYK)
    pub components: u8,
    /// Pixel bytes, raw or already deflate-compressed
    pub data: Vec<u8>,
    /// True when `data` is already deflate-compressed
    pub deflated: bool,
    /// True for a stencil mask image
    pub is_mask: bool,
    /// When attached as another image's mask: soft (alpha) vs stencil
    pub soft: bool,
    /// Sample values are inverted
    pub inverted: bool,
    /// Attached mask image, emitted before this image
    pub mask: Option<Box<ImageData>>,
    /// Color-key transparency ranges
    pub transparency: Option<Vec<i64>>,
    /// Extra dictionary entries, e.g. an /Indexed palette ColorSpace
    pub additional: Option<Dict>,
    id: u128,
}

impl ImageData {
    /// Wrap decoded pixel data.
    pub fn new(
        width: u32,
        height: u32,
        bits_per_component: u16,
        components: u8,
        data: Vec<u8>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Image("zero image dimension".to_string()));
        }
        if !matches!(bits_per_component, 1 | 2 | 4 | 8 | 16) {
            return Err(Error::Image(format!(
                "invalid bits per component: {}",
                bits_per_component
            )));
        }
        if !matches!(components, 1 | 3 | 4) {
            return Err(Error::Image(format!(
                "invalid component count: {}",
                components
            )));
        }
        Ok(Self {
            width,
            height,
            bits_per_component,
            components,
            data,
            deflated: false,
            is_mask: false,
            soft: false,
            inverted: false,
            mask: None,
            transparency: None,
            additional: None,
            id: uuid::Uuid::new_v4().as_u128(),
        })
    }

    /// Mark the pixel bytes as already deflate-compressed.
    pub fn with_deflated(mut self, deflated: bool) -> Self {
        self.deflated = deflated;
        self
    }

    /// Turn this image into a stencil mask (1 bit, 1 component).
    pub fn into_stencil_mask(mut self) -> Result<Self> {
        if self.components != 1 || self.bits_per_component != 1 {
            return Err(Error::Image(
                "stencil masks must be 1-bit single-component".to_string(),
            ));
        }
        self.is_mask = true;
        self.mask = None;
        Ok(self)
    }

    /// Attach a stencil mask image.
    pub fn with_mask(mut self, mut mask: ImageData) -> Self {
        mask.soft = false;
        self.mask = Some(Box::new(mask));
        self
    }

    /// Attach a soft (alpha) mask image.
    pub fn with_soft_mask(mut self, mut mask: ImageData) -> Self {
        mask.soft = true;
        self.mask = Some(Box::new(mask));
        self
    }

    /// Invert sample values.
    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Set color-key transparency ranges.
    pub fn with_transparency(mut self, ranges: Vec<i64>) -> Self {
        self.transparency = Some(ranges);
        self
    }

    /// Merge extra dictionary entries into the XObject.
    pub fn with_additional(mut self, additional: Dict) -> Self {
        self.additional = Some(additional);
        self
    }

    /// Session-unique identity used to emit a shared image only once.
    pub(crate) fn id(&self) -> u128 {
        self.id
    }

    /// Transformation matrix of the image placed at the origin and rotated
    /// by `degrees`. Returns the transformed corner coordinates
    /// `[AX, AY, BX, BY, CX, CY, DX, DY]` where (CX, CY) is the lower-left
    /// and (DX, DY) the upper-right corner of the rotated bounding box.
    pub fn matrix(&self, degrees: f32) -> [f32; 8] {
        let two_pi = 2.0 * std::f32::consts::PI;
        let rot = degrees.to_radians().rem_euclid(two_pi);
        let (sin, cos) = rot.sin_cos();
        let w = self.width as f32;
        let h = self.height as f32;

        let mut m = [0f32; 8];
        m[AX] = w * cos;
        m[AY] = w * sin;
        m[BX] = -h * sin;
        m[BY] = h * cos;
        if rot < std::f32::consts::FRAC_PI_2 {
            m[CX] = m[BX];
            m[CY] = 0.0;
            m[DX] = m[AX];
            m[DY] = m[AY] + m[BY];
        } else if rot < std::f32::consts::PI {
            m[CX] = m[AX] + m[BX];
            m[CY] = m[BY];
            m[DX] = 0.0;
            m[DY] = m[AY];
        } else if rot < 1.5 * std::f32::consts::PI {
            m[CX] = m[AX];
            m[CY] = m[AY] + m[BY];
            m[DX] = m[BX];
            m[DY] = 0.0;
        } else {
            m[CX] = 0.0;
            m[CY] = m[AY];
            m[DX] = m[AX] + m[BX];
            m[DY] = m[BY];
        }
        m
    }

    /// Width and height of the rotated bounding box.
    pub fn scaled_extent(&self, degrees: f32) -> (f32, f32) {
        let m = self.matrix(degrees);
        (m[DX] - m[CX], m[DY] - m[CY])
    }
}

/// Build the image XObject stream for the writer.
///
/// `mask_ref` is the already-emitted mask object paired with its soft flag.
pub(crate) fn build_xobject(
    image: &ImageData,
    mask_ref: Option<(ObjectRef, bool)>,
) -> Result<Object> {
    let mut dict = Dict::new();
    dict.insert(names::TYPE.to_string(), Object::name(names::XOBJECT));
    dict.insert(names::SUBTYPE.to_string(), Object::name(names::IMAGE));
    dict.insert(names::WIDTH.to_string(), Object::Integer(image.width as i64));
    dict.insert(names::HEIGHT.to_string(), Object::Integer(image.height as i64));

    let stencil = image.is_mask && image.bits_per_component == 1;
    if stencil {
        dict.insert(names::IMAGE_MASK.to_string(), Object::Boolean(true));
    }

    if let Some((mask, soft)) = mask_ref {
        let key = if soft { names::SMASK } else { names::MASK };
        dict.insert(key.to_string(), Object::Reference(mask));
    }

    if stencil && image.inverted {
        dict.insert(
            names::DECODE.to_string(),
            Object::Array(vec![Object::Integer(1), Object::Integer(0)]),
        );
    }

    if let Some(ranges) = &image.transparency {
        if !image.is_mask && mask_ref.is_none() {
            dict.insert(
                names::MASK.to_string(),
                Object::Array(ranges.iter().map(|v| Object::Integer(*v)).collect()),
            );
        }
    }

    if !stencil {
        let (space, decode_len) = match image.components {
            1 => (names::DEVICE_GRAY, 2),
            3 => (names::DEVICE_RGB, 6),
            _ => (names::DEVICE_CMYK, 8),
        };
        dict.insert(names::COLOR_SPACE.to_string(), Object::name(space));
        if image.inverted {
            let decode = (0..decode_len)
                .map(|i| Object::Integer(if i % 2 == 0 { 1 } else { 0 }))
                .collect();
            dict.insert(names::DECODE.to_string(), Object::Array(decode));
        }
    }

    if let Some(additional) = &image.additional {
        for (key, value) in additional {
            dict.insert(key.clone(), value.clone());
        }
    }

    dict.insert(
        names::BITS_PER_COMPONENT.to_string(),
        Object::Integer(image.bits_per_component as i64),
    );

    let payload = if image.deflated {
        image.data.clone()
    } else {
        decoders::deflate(&image.data)?
    };
    dict.insert(names::FILTER.to_string(), Object::name(names::FLATE_DECODE));
    dict.insert(names::LENGTH.to_string(), Object::Integer(payload.len() as i64));

    Ok(Object::Stream {
        dict,
        data: bytes::Bytes::from(payload),
    })
}
