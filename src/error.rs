use std::fmt;
use std::io;

use quick_error::quick_error;

use crate::decoder::Variant;

quick_error! {
    /// Tiff error kinds.
    #[derive(Debug)]
    pub enum TiffError {
        /// The file is not a TIFF container or breaks a structural rule of one.
        FormatError(err: TiffFormatError) {
            from()
            display("Format error: {}", err)
            source(err)
        }
        /// A field declared more bytes than the file holds.
        TruncatedData {
            display("Truncated data: the file ended before a declared field")
        }
        /// A structural safety cap was hit.
        LimitsExceeded(kind: LimitKind) {
            from()
            display("Limits exceeded: {}", kind)
        }
        /// An I/O Error occurred while reading the file.
        IoError(err: io::Error) {
            display("{}", err)
            source(err)
        }
    }
}

quick_error! {
    /// The file is not formatted properly.
    #[derive(Debug, Clone, PartialEq, Eq)]
    #[non_exhaustive]
    pub enum TiffFormatError {
        TiffSignatureNotFound {
            display("not a TIFF container")
        }
        UnexpectedVariantOffset { variant: Variant, offset: u32 } {
            display("unexpected offset {} for declared variant `{}`", offset, variant)
        }
    }
}

/// The safety cap that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LimitKind {
    /// Too many directories in one main chain.
    ChainLength,
    /// Too many SubIFD offsets on the first directory.
    SubDirectories,
    /// An offset-indirect value larger than the configured buffer.
    ValueSize,
    /// Too many nested directory pointers followed during one search.
    NestedDirectories,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitKind::ChainLength => fmt.write_str("too many directories in the main chain"),
            LimitKind::SubDirectories => fmt.write_str("too many sub-directories"),
            LimitKind::ValueSize => fmt.write_str("tag value exceeds the value size limit"),
            LimitKind::NestedDirectories => fmt.write_str("too many nested directories"),
        }
    }
}

impl From<io::Error> for TiffError {
    fn from(err: io::Error) -> TiffError {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => TiffError::TruncatedData,
            _ => TiffError::IoError(err),
        }
    }
}

impl From<std::num::TryFromIntError> for TiffError {
    fn from(_: std::num::TryFromIntError) -> TiffError {
        TiffError::LimitsExceeded(LimitKind::ValueSize)
    }
}

/// Result of a parsing or search process
pub type TiffResult<T> = Result<T, TiffError>;
