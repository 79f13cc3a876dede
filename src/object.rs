//! PDF object types.
//!
//! [`Object`] is the universal tagged-union value type produced by the
//! parser and consumed by the writer. Dictionaries preserve insertion order
//! for serialization; key lookup ignores order.

use crate::decoders;
use crate::error::{Error, Result};
use crate::names;
use indexmap::IndexMap;

/// Dictionary type: ordered map from name to value.
pub type Dict = IndexMap<String, Object>;

/// How a string object was written in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    /// Literal string `( ... )`
    Literal,
    /// Hexadecimal string `< ... >`
    Hex,
}

/// PDF object representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array) plus the notation it was written in
    String(Vec<u8>, StringFormat),
    /// Name (written with a leading /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(Dict),
    /// Stream (dictionary + raw payload, possibly compressed)
    Stream {
        /// Stream dictionary
        dict: Dict,
        /// Raw stream payload as stored in the file
        data: bytes::Bytes,
    },
    /// Indirect object reference.
    ///
    /// Only meaningful relative to the [`crate::document::Document`] that
    /// produced it; resolving against a different session is a logic error.
    Reference(ObjectRef),
}

/// Reference to an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub number: u32,
    /// Generation number
    pub generation: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

impl Object {
    /// Build a literal string object from text.
    pub fn string(text: &str) -> Self {
        Object::String(text.as_bytes().to_vec(), StringFormat::Literal)
    }

    /// Build a name object from a well-known constant or arbitrary text.
    pub fn name(name: &str) -> Self {
        Object::Name(name.to_string())
    }

    /// Get the type name of this object (without data).
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Integer(_) => "Integer",
            Object::Real(_) => "Real",
            Object::String(..) => "String",
            Object::Name(_) => "Name",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Try to cast to integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an Integer or Real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to name.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Try to cast to dictionary. Works for both Dictionary and Stream objects.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Try to cast to array.
    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Try to cast to reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Try to cast to boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to cast to string bytes.
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Object::String(s, _) => Some(s),
            _ => None,
        }
    }

    /// Check if object is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    /// Decode stream data by applying the filters named in the stream
    /// dictionary. Only `/FlateDecode` (plus no filter at all) is supported;
    /// anything else is an [`Error::UnsupportedFilter`].
    pub fn decode_stream_data(&self) -> Result<Vec<u8>> {
        match self {
            Object::Stream { dict, data } => {
                let filters = dict.get(names::FILTER).map(filter_names).unwrap_or_default();
                let mut out = data.to_vec();
                for filter in filters {
                    match filter.as_str() {
                        names::FLATE_DECODE => {
                            out = decoders::inflate(&out)?;
                            if let Some(params) =
                                decoders::DecodeParams::from_dict(dict.get(names::DECODE_PARMS))
                            {
                                out = decoders::unpredict(&out, &params)?;
                            }
                        },
                        other => return Err(Error::UnsupportedFilter(other.to_string())),
                    }
                }
                Ok(out)
            },
            _ => Err(Error::InvalidObjectType {
                expected: "Stream".to_string(),
                found: self.type_name().to_string(),
            }),
        }
    }
}

/// Extract the filter list from a `/Filter` entry (single name or array).
fn filter_names(filter: &Object) -> Vec<String> {
    match filter {
        Object::Name(name) => vec![name.clone()],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|obj| obj.as_name().map(|s| s.to_string()))
            .collect(),
        _ => vec![],
    }
}
