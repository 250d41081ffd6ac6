macro_rules! tags {
    {
        // Permit arbitrary meta items, which include documentation.
        $( #[$enum_attr:meta] )*
        $vis:vis enum $name:ident($ty:tt) $(unknown(#[$unknown_meta:meta] $unknown_doc:ident))* {
            // Each of the `Name = Val,` permitting documentation.
            $($(#[$ident_attr:meta])* $tag:ident = $val:expr,)*
        }
    } => {
        $( #[$enum_attr] )*
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
        #[non_exhaustive]
        pub enum $name {
            $($(#[$ident_attr])* $tag,)*
            $(
                #[$unknown_meta]
                Unknown($ty),
            )*
        }

        impl $name {
            #[inline(always)]
            const fn __from_inner_type(n: $ty) -> Result<Self, $ty> {
                match n {
                    $( $val => Ok($name::$tag), )*
                    n => Err(n),
                }
            }

            #[inline(always)]
            const fn __to_inner_type(&self) -> $ty {
                match *self {
                    $( $name::$tag => $val, )*
                    $( $name::Unknown($unknown_doc) => { $unknown_doc }, )*
                }
            }
        }

        tags!($name, $ty, $($unknown_doc)*);
    };
    // For u16 tags, provide direct inherent primitive conversion methods.
    ($name:tt, u16, $($unknown_doc:ident)*) => {
        impl $name {
            #[inline(always)]
            pub const fn from_u16(val: u16) -> Option<Self> {
                match Self::__from_inner_type(val) {
                    Ok(v) => Some(v),
                    Err(_) => None,
                }
            }

            $(
            #[inline(always)]
            pub const fn from_u16_exhaustive($unknown_doc: u16) -> Self {
                match Self::__from_inner_type($unknown_doc) {
                    Ok(v) => v,
                    Err(_) => $name::Unknown($unknown_doc),
                }
            }
            )*

            #[inline(always)]
            pub const fn to_u16(&self) -> u16 {
                Self::__to_inner_type(self)
            }
        }
    };
}

// Note: only tags that matter for walking the directory structure, plus the handful that
// identify a file, are named. Everything else is `Unknown` and is searched all the same.
tags! {
/// TIFF tags
pub enum Tag(u16) unknown(
    /// A private or extension tag
    unknown
) {
    NewSubfileType = 254,
    ImageWidth = 256,
    ImageLength = 257,
    ImageDescription = 270,
    Make = 271,
    Model = 272,
    StripOffsets = 273,
    Software = 305,
    DateTime = 306,
    Artist = 315,
    /// Offsets of child directories of the first directory (DNG raw data, previews).
    SubIfd = 330,
    JPEGTables = 347,
    XmpPacket = 700,
    Copyright = 33_432,
    // <https://web.archive.org/web/20131111073619/http://www.exif.org/Exif2-1.PDF>
    ExifDirectory = 0x8769,
    GpsDirectory = 0x8825,
    IccProfile = 34675,
    InteropDirectory = 0xa005,
    MakerNote = 0x927c,
    // <https://helpx.adobe.com/camera-raw/digital-negative.html>
    DngVersion = 0xc612,
    UniqueCameraModel = 0xc614,
    DngPrivateData = 0xc634,
}
}

tags! {
/// The type of an IFD entry (a 2 byte field).
pub enum Type(u16) unknown(
    /// A type code outside the TIFF 6.0 table, its values can not be resolved
    unknown
) {
    /// 8-bit unsigned integer
    BYTE = 1,
    /// 8-bit byte that contains a 7-bit ASCII code; the last byte must be zero
    ASCII = 2,
    /// 16-bit unsigned integer
    SHORT = 3,
    /// 32-bit unsigned integer
    LONG = 4,
    /// Fraction stored as two 32-bit unsigned integers
    RATIONAL = 5,
    /// 8-bit signed integer
    SBYTE = 6,
    /// 8-bit byte that may contain anything, depending on the field
    UNDEFINED = 7,
    /// 16-bit signed integer
    SSHORT = 8,
    /// 32-bit signed integer
    SLONG = 9,
    /// Fraction stored as two 32-bit signed integers
    SRATIONAL = 10,
    /// 32-bit IEEE floating point
    FLOAT = 11,
    /// 64-bit IEEE floating point
    DOUBLE = 12,
    /// 32-bit unsigned integer (offset)
    IFD = 13,
}
}

/// How the elements of a field type are decoded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scheme {
    /// Unsigned integer of the given byte width.
    Unsigned(u8),
    /// Two's complement integer of the given byte width.
    Signed(u8),
    UnsignedRational,
    SignedRational,
    Float32,
    Float64,
    /// Opaque bytes, text or undefined data.
    Raw,
    /// A 32-bit offset of another directory.
    DirectoryOffset,
}

impl Type {
    /// Size of one element in bytes, `None` for unknown type codes.
    pub fn byte_len(&self) -> Option<u8> {
        self.scheme().map(|scheme| match scheme {
            Scheme::Unsigned(n) | Scheme::Signed(n) => n,
            Scheme::UnsignedRational | Scheme::SignedRational | Scheme::Float64 => 8,
            Scheme::Float32 | Scheme::DirectoryOffset => 4,
            Scheme::Raw => 1,
        })
    }

    /// The decode scheme, `None` for unknown type codes.
    pub fn scheme(&self) -> Option<Scheme> {
        Some(match *self {
            Type::BYTE => Scheme::Unsigned(1),
            Type::SHORT => Scheme::Unsigned(2),
            Type::LONG => Scheme::Unsigned(4),
            Type::SBYTE => Scheme::Signed(1),
            Type::SSHORT => Scheme::Signed(2),
            Type::SLONG => Scheme::Signed(4),
            Type::RATIONAL => Scheme::UnsignedRational,
            Type::SRATIONAL => Scheme::SignedRational,
            Type::FLOAT => Scheme::Float32,
            Type::DOUBLE => Scheme::Float64,
            Type::ASCII | Type::UNDEFINED => Scheme::Raw,
            Type::IFD => Scheme::DirectoryOffset,
            Type::Unknown(_) => return None,
        })
    }

    /// Total byte length of `count` elements.
    ///
    /// Returns `None` for unknown types; the multiplication can not overflow since the count
    /// is a 32-bit field.
    pub fn value_bytes(&self, count: u32) -> Option<u64> {
        self.byte_len()
            .map(|len| u64::from(len) * u64::from(count))
    }
}
