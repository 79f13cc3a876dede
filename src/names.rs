//! Well-known PDF name constants.
//!
//! The standard's common keys are kept as a process-wide, read-only registry
//! built once on first use. The parser hands out the canonical text for
//! recognized names encountered inside composite values; arbitrary names
//! always get a fresh allocation. No identity contract is implied beyond
//! equality-by-bytes.

use lazy_static::lazy_static;
use std::collections::HashSet;

macro_rules! names {
    ($($konst:ident => $text:literal),+ $(,)?) => {
        $(
            #[allow(missing_docs)]
            pub const $konst: &str = $text;
        )+

        lazy_static! {
            static ref REGISTRY: HashSet<&'static str> = {
                let mut set = HashSet::new();
                $(set.insert($konst);)+
                set
            };
        }
    };
}

names! {
    TYPE => "Type",
    SUBTYPE => "Subtype",
    CATALOG => "Catalog",
    PAGES => "Pages",
    PAGE => "Page",
    KIDS => "Kids",
    COUNT => "Count",
    PARENT => "Parent",
    MEDIA_BOX => "MediaBox",
    CROP_BOX => "CropBox",
    ROTATE => "Rotate",
    RESOURCES => "Resources",
    CONTENTS => "Contents",
    XOBJECT => "XObject",
    IMAGE => "Image",
    FONT => "Font",
    WIDTH => "Width",
    HEIGHT => "Height",
    BITS_PER_COMPONENT => "BitsPerComponent",
    COLOR_SPACE => "ColorSpace",
    DEVICE_GRAY => "DeviceGray",
    DEVICE_RGB => "DeviceRGB",
    DEVICE_CMYK => "DeviceCMYK",
    INDEXED => "Indexed",
    DECODE => "Decode",
    DECODE_PARMS => "DecodeParms",
    IMAGE_MASK => "ImageMask",
    MASK => "Mask",
    SMASK => "SMask",
    FILTER => "Filter",
    FLATE_DECODE => "FlateDecode",
    LENGTH => "Length",
    SIZE => "Size",
    ROOT => "Root",
    INFO => "Info",
    PREV => "Prev",
    ENCRYPT => "Encrypt",
    ID => "ID",
    XREF_STM => "XRefStm",
    XREF => "XRef",
    W => "W",
    INDEX => "Index",
    FIRST => "First",
    N => "N",
    OBJ_STM => "ObjStm",
    PREDICTOR => "Predictor",
    COLORS => "Colors",
    COLUMNS => "Columns",
    PRODUCER => "Producer",
    MOD_DATE => "ModDate",
    CREATION_DATE => "CreationDate",
    TITLE => "Title",
    AUTHOR => "Author",
    SUBJECT => "Subject",
    KEYWORDS => "Keywords",
    CREATOR => "Creator",
}

/// Return the canonical static text for a recognized name.
///
/// Unrecognized names return `None`; callers keep their own allocation.
pub fn canonical(name: &str) -> Option<&'static str> {
    REGISTRY.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_known() {
        assert_eq!(canonical("Type"), Some(TYPE));
        assert_eq!(canonical("MediaBox"), Some(MEDIA_BOX));
    }

    #[test]
    fn test_canonical_unknown() {
        assert_eq!(canonical("NotARealKey"), None);
        // Case sensitive per the PDF spec
        assert_eq!(canonical("type"), None);
    }
}
