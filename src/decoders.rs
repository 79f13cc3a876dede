//! Flate compression primitives and PNG predictor reversal.
//!
//! The crate treats deflate/inflate as byte-array-to-byte-array calls into
//! `flate2`; no compression algorithm is implemented here. Predictor
//! reversal is needed for cross-reference streams, which are almost always
//! written with PNG row predictors.

use crate::error::{Error, Result};
use crate::names;
use crate::object::Object;
use std::io::{Read, Write};

/// Inflate a zlib/deflate-compressed byte array.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Decode(format!("flate: {}", e)))?;
    Ok(out)
}

/// Deflate a byte array with zlib framing at the default level.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder =
        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Predictor parameters from a `/DecodeParms` dictionary.
#[derive(Debug, Clone, Copy)]
pub struct DecodeParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, >= 10 = PNG)
    pub predictor: i64,
    /// Color components per sample
    pub colors: usize,
    /// Bits per color component
    pub bits_per_component: usize,
    /// Samples per row
    pub columns: usize,
}

impl DecodeParams {
    /// Extract parameters from a `/DecodeParms` entry (dictionary or array
    /// of dictionaries). Returns `None` when absent or predictor-free.
    pub fn from_dict(parms: Option<&Object>) -> Option<Self> {
        let dict = match parms? {
            Object::Dictionary(d) => d,
            Object::Array(arr) => arr.iter().find_map(|o| o.as_dict())?,
            _ => return None,
        };
        let get = |key: &str, default: i64| {
            dict.get(key).and_then(|o| o.as_integer()).unwrap_or(default)
        };
        let predictor = get(names::PREDICTOR, 1);
        if predictor <= 1 {
            return None;
        }
        Some(Self {
            predictor,
            colors: get(names::COLORS, 1) as usize,
            bits_per_component: get(names::BITS_PER_COMPONENT, 8) as usize,
            columns: get(names::COLUMNS, 1) as usize,
        })
    }
}

/// Reverse a PNG row predictor applied before compression.
///
/// Each predicted row carries a one-byte filter tag (0-4) followed by
/// `columns * colors * bits/8` filtered bytes. TIFF prediction (predictor 2)
/// is not supported.
pub fn unpredict(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    if params.predictor < 10 {
        return Err(Error::Decode(format!(
            "unsupported predictor {}",
            params.predictor
        )));
    }
    let bpp = (params.colors * params.bits_per_component).div_ceil(8).max(1);
    let row_len = (params.columns * params.colors * params.bits_per_component).div_ceil(8);
    if row_len == 0 {
        return Err(Error::Decode("predictor row length is zero".to_string()));
    }
    let stride = row_len + 1;
    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_len];

    for chunk in data.chunks(stride) {
        if chunk.len() < 2 {
            break;
        }
        let tag = chunk[0];
        let mut row = chunk[1..].to_vec();
        row.resize(row_len, 0);
        match tag {
            0 => {},
            1 => {
                for i in bpp..row_len {
                    row[i] = row[i].wrapping_add(row[i - bpp]);
                }
            },
            2 => {
                for i in 0..row_len {
                    row[i] = row[i].wrapping_add(prev_row[i]);
                }
            },
            3 => {
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                    let up = prev_row[i] as u16;
                    row[i] = row[i].wrapping_add(((left + up) / 2) as u8);
                }
            },
            4 => {
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] as i16 } else { 0 };
                    let up = prev_row[i] as i16;
                    let up_left = if i >= bpp { prev_row[i - bpp] as i16 } else { 0 };
                    row[i] = row[i].wrapping_add(paeth(left, up, up_left));
                }
            },
            other => {
                return Err(Error::Decode(format!("invalid PNG filter tag {}", other)));
            },
        }
        out.extend_from_slice(&row);
        prev_row = row;
    }
    Ok(out)
}

fn paeth(a: i16, b: i16, c: i16) -> u8 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flate_round_trip() {
        let data = b"q 1 0 0 1 10 10 cm /img0 Do Q\n".repeat(8);
        let packed = deflate(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(inflate(&packed).unwrap(), data);
    }

    #[test]
    fn test_inflate_garbage_fails() {
        assert!(matches!(inflate(b"not zlib data"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_unpredict_up_filter() {
        // Two rows of 3 bytes, both filtered with Up (tag 2).
        let params = DecodeParams {
            predictor: 12,
            colors: 1,
            bits_per_component: 8,
            columns: 3,
        };
        let data = [2, 1, 2, 3, 2, 1, 1, 1];
        let out = unpredict(&data, &params).unwrap();
        assert_eq!(out, vec![1, 2, 3, 2, 3, 4]);
    }

    #[test]
    fn test_unpredict_sub_filter() {
        let params = DecodeParams {
            predictor: 11,
            colors: 1,
            bits_per_component: 8,
            columns: 4,
        };
        let data = [1, 10, 1, 1, 1];
        let out = unpredict(&data, &params).unwrap();
        assert_eq!(out, vec![10, 11, 12, 13]);
    }

    #[test]
    fn test_unpredict_rejects_tiff() {
        let params = DecodeParams {
            predictor: 2,
            colors: 1,
            bits_per_component: 8,
            columns: 4,
        };
        assert!(unpredict(&[0; 5], &params).is_err());
    }

    #[test]
    fn test_decode_params_absent_without_predictor() {
        let mut dict = crate::object::Dict::new();
        dict.insert("Columns".to_string(), Object::Integer(5));
        let obj = Object::Dictionary(dict);
        assert!(DecodeParams::from_dict(Some(&obj)).is_none());
    }
}
