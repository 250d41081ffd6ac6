//! Parsing of TIFF containers and their directory structure.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::{self, Read, Seek};

use tracing::{debug, trace, warn};

use crate::error::LimitKind;
use crate::tags::{Tag, Type};
use crate::{Directory, TiffError, TiffFormatError, TiffResult};

use self::ifd::{Entry, Slot, Value};
use self::stream::{EndianReader, SmartReader};

pub use self::stream::ByteOrder;

pub mod ifd;
mod stream;

/// Decoding limits
#[derive(Clone, Debug)]
pub struct Limits {
    /// A main chain that reaches this many directories is rejected, the default is 32.
    pub chain_length: usize,
    /// A SubIFD list with this many offsets is rejected, the default is 32.
    pub sub_directories: usize,
    /// The maximum size of any offset-indirect ifd value in bytes, the default is 128MiB.
    ///
    /// DNG files may embed the whole original raw file as a single tag.
    pub ifd_value_size: usize,
    /// The maximum number of nested directory pointers followed by one search, the default is
    /// 4096.
    pub nested_directories: usize,
    /// The purpose of this is to prevent all the fields of the struct from
    /// being public, as this would make adding new fields a major version
    /// bump.
    _non_exhaustive: (),
}

impl Limits {
    /// A configuration that does not impose any limits.
    ///
    /// Note that a malicious file can then make a search run for a very long time.
    pub fn unlimited() -> Limits {
        Limits {
            chain_length: usize::MAX,
            sub_directories: usize::MAX,
            ifd_value_size: usize::MAX,
            nested_directories: usize::MAX,
            _non_exhaustive: (),
        }
    }
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            chain_length: 32,
            sub_directories: 32,
            ifd_value_size: 128 * 1024 * 1024,
            nested_directories: 4096,
            _non_exhaustive: (),
        }
    }
}

/// Options for opening a container.
#[derive(Clone, Debug)]
pub struct Options {
    /// Accept the vendor variants of the header magic (Olympus ORF, Panasonic RW2).
    pub allow_variants: bool,
    pub limits: Limits,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            allow_variants: true,
            limits: Limits::default(),
        }
    }
}

/// The flavour of container announced by the header magic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// `II*\0` or `MM\0*`
    Standard,
    /// `IIRO`, Olympus ORF
    Olympus,
    /// `IIU\0`, Panasonic RW2
    Panasonic,
}

impl Variant {
    /// The variant marker from bytes 2 and 3 of the header, without NULs.
    ///
    /// This is empty for standard TIFF.
    pub fn marker(&self) -> &'static str {
        match self {
            Variant::Standard => "",
            Variant::Olympus => "RO",
            Variant::Panasonic => "U",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// The fixed 8-byte file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub byte_order: ByteOrder,
    pub variant: Variant,
    /// Offset of the first directory, 0 if the file has none.
    pub first_ifd: u32,
}

/// The directories reachable from one starting offset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chain {
    /// Directories linked by their "next" field, in file order.
    pub directories: Vec<Directory>,
    /// Directories listed in the SubIFD tag of the first directory.
    pub sub_directories: Vec<Directory>,
}

impl Chain {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.sub_directories.is_empty()
    }
}

/// The representation of a TIFF container being walked.
///
/// The decoder exclusively owns the reader. All reads are blocking seeks and reads on it; its
/// position is unspecified between calls.
#[derive(Debug)]
pub struct Decoder<R>
where
    R: Read + Seek,
{
    reader: SmartReader<R>,
    header: Header,
    limits: Limits,
    pub(crate) chain: Chain,
}

impl<R: Read + Seek> Decoder<R> {
    /// Create a new decoder with default options, reading the header and the directory chain
    /// it points at.
    pub fn new(r: R) -> TiffResult<Decoder<R>> {
        Self::with_options(r, Options::default())
    }

    pub fn with_options(r: R, options: Options) -> TiffResult<Decoder<R>> {
        let mut reader = SmartReader::wrap(r, ByteOrder::LittleEndian);
        let header = Self::read_header(&mut reader, options.allow_variants)?;
        debug!(?header, "read TIFF header");

        let mut decoder = Decoder {
            reader,
            header,
            limits: options.limits,
            chain: Chain::default(),
        };

        decoder.reinit_from(header.first_ifd)?;
        Ok(decoder)
    }

    fn read_header(reader: &mut SmartReader<R>, allow_variants: bool) -> TiffResult<Header> {
        let mut magic = Vec::with_capacity(4);
        reader.by_ref().take(4).read_to_end(&mut magic)?;

        let (byte_order, variant) = match &*magic {
            b"II*\0" => (ByteOrder::LittleEndian, Variant::Standard),
            b"MM\0*" => (ByteOrder::BigEndian, Variant::Standard),
            b"IIRO" if allow_variants => (ByteOrder::LittleEndian, Variant::Olympus),
            b"IIU\0" if allow_variants => (ByteOrder::LittleEndian, Variant::Panasonic),
            _ => {
                return Err(TiffError::FormatError(
                    TiffFormatError::TiffSignatureNotFound,
                ))
            }
        };

        reader.byte_order = byte_order;
        let first_ifd = reader.read_u32()?;

        // Be conservative with a possibly mis-detected ORF.
        if variant == Variant::Olympus && first_ifd != 8 {
            return Err(TiffError::FormatError(
                TiffFormatError::UnexpectedVariantOffset {
                    variant,
                    offset: first_ifd,
                },
            ));
        }

        Ok(Header {
            byte_order,
            variant,
            first_ifd,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the byte_order
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    pub fn variant(&self) -> Variant {
        self.header.variant
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The directories loaded by the last [`Self::reinit_from`].
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Replace the loaded chain with the one starting at `offset`.
    ///
    /// This always starts a fresh chain, it never extends the previous one.
    pub fn reinit_from(&mut self, offset: u32) -> TiffResult<()> {
        self.chain = self.read_chain(offset)?;
        Ok(())
    }

    /// Follow the chain of directories starting at `offset`, then read the SubIFDs listed by
    /// its first directory.
    ///
    /// A chain that loops back onto itself ends at the first repeated offset with a warning.
    /// Exceeding [`Limits::chain_length`] or [`Limits::sub_directories`] is an error.
    pub fn read_chain(&mut self, offset: u32) -> TiffResult<Chain> {
        let mut directories = Vec::new();
        let mut seen = HashSet::from([offset]);
        let mut next = offset;

        while next != 0 {
            let dir = self.read_ifd(next, true)?;
            next = dir.next_ifd;
            directories.push(dir);

            if next != 0 && !seen.insert(next) {
                warn!(offset = next, "looping directories detected");
                break;
            }

            if directories.len() >= self.limits.chain_length {
                return Err(TiffError::LimitsExceeded(LimitKind::ChainLength));
            }
        }

        let sub_offsets = match directories.first() {
            Some(first) => match self.resolve(first, Tag::SubIfd)? {
                None => Vec::new(),
                Some(value) => value.into_offsets().unwrap_or_else(|| {
                    warn!(offset = first.offset, "SubIFD tag does not hold offsets, ignored");
                    Vec::new()
                }),
            },
            None => Vec::new(),
        };

        if sub_offsets.len() >= self.limits.sub_directories {
            return Err(TiffError::LimitsExceeded(LimitKind::SubDirectories));
        }

        let sub_directories = sub_offsets
            .into_iter()
            .map(|offset| self.read_directory(offset))
            .collect::<TiffResult<Vec<_>>>()?;

        debug!(
            offset,
            directories = directories.len(),
            sub_directories = sub_directories.len(),
            "read directory chain"
        );

        Ok(Chain {
            directories,
            sub_directories,
        })
    }

    /// Read a single directory at `offset`, not looking at its "next" field.
    pub fn read_directory(&mut self, offset: u32) -> TiffResult<Directory> {
        self.read_ifd(offset, false)
    }

    /// Reads a IFD entry.
    // An IFD entry has four fields:
    //
    // Tag   2 bytes
    // Type  2 bytes
    // Count 4 bytes
    // Value 4 bytes either a pointer the value itself
    fn read_entry(&mut self) -> TiffResult<(u16, Entry)> {
        let tag = self.reader.read_u16()?;
        let type_ = Type::from_u16_exhaustive(self.reader.read_u16()?);
        let count = self.reader.read_u32()?;
        let mut field = [0; 4];
        self.reader.read_exact(&mut field)?;

        let entry = Entry::new(type_, count, field, self.header.byte_order)?;
        Ok((tag, entry))
    }

    fn read_ifd(&mut self, offset: u32, chained: bool) -> TiffResult<Directory> {
        self.reader.goto_offset(offset.into())?;
        let num_tags = self.reader.read_u16()?;
        trace!(offset, num_tags, "reading directory");

        let mut entries = BTreeMap::new();
        for _ in 0..num_tags {
            let (tag, entry) = self.read_entry()?;
            entries.insert(tag, entry);
        }

        let next_ifd = if chained { self.reader.read_u32()? } else { 0 };

        Ok(Directory {
            offset,
            entries,
            next_ifd,
        })
    }

    /// Tries to retrieve the value of a tag in `dir`.
    ///
    /// Returns `Ok(None)` if the tag is not present or its type is unknown. Values stored
    /// outside the directory are read from the file. ASCII values have their trailing NULs
    /// removed.
    pub fn resolve(&mut self, dir: &Directory, tag: Tag) -> TiffResult<Option<Value>> {
        match dir.get(tag) {
            None => Ok(None),
            Some(entry) => self.entry_val(entry),
        }
    }

    /// Turn an entry into a value by fetching the required bytes in the stream.
    pub fn entry_val(&mut self, entry: &Entry) -> TiffResult<Option<Value>> {
        let value = match entry.slot {
            Slot::Inline(ref value) => value.clone(),
            Slot::Offset(offset) => {
                let Some(v_bytes) = entry.type_.value_bytes(entry.count) else {
                    return Ok(None);
                };
                let v_bytes = usize::try_from(v_bytes)?;
                if v_bytes > self.limits.ifd_value_size {
                    return Err(TiffError::LimitsExceeded(LimitKind::ValueSize));
                }

                self.reader.goto_offset(offset.into())?;
                let mut buf = Vec::new();
                self.reader
                    .by_ref()
                    .take(v_bytes as u64)
                    .read_to_end(&mut buf)?;
                if buf.len() != v_bytes {
                    return Err(TiffError::TruncatedData);
                }

                let r = SmartReader::wrap(io::Cursor::new(buf), self.header.byte_order);
                match ifd::decode(entry.type_, entry.count, r)? {
                    Some(value) => value,
                    None => return Ok(None),
                }
            }
        };

        Ok(Some(match (entry.type_, value) {
            (Type::ASCII, Value::Bytes(mut text)) => {
                let len = text.iter().rposition(|&b| b != 0).map_or(0, |n| n + 1);
                text.truncate(len);
                Value::Bytes(text)
            }
            (_, value) => value,
        }))
    }
}
