//! Searching TIFF containers for values
//!
//! TIFF (Tagged Image File Format) stores its metadata in directories of tagged entries. Raw
//! camera formats such as DNG, ORF and RW2 use the same container. This crate parses the
//! container, walks every directory reachable from the header (the main chain, SubIFDs and
//! any nested directory pointer) and reports each tag whose value contains a given integer or
//! byte string, along with the path of directories leading to it.
//!
//! ```no_run
//! use tiffwalk::decoder::Decoder;
//! use tiffwalk::walk::{Needle, Walker};
//!
//! # fn main() -> tiffwalk::TiffResult<()> {
//! let file = std::fs::File::open("photo.dng")?;
//! let mut decoder = Decoder::new(std::io::BufReader::new(file))?;
//! for found in Walker::new(&mut decoder).search_all(&Needle::from("DNG"))? {
//!     println!("{}", found);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Related Links
//! * <https://web.archive.org/web/20210108073850/https://www.adobe.io/open/standards/TIFF.html> - The TIFF specification

pub mod decoder;
mod directory;
mod error;
pub mod tags;
pub mod walk;

pub use self::directory::Directory;
pub use self::error::{LimitKind, TiffError, TiffFormatError, TiffResult};
