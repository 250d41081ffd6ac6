use core::fmt;
use std::collections::BTreeMap;

use crate::{decoder::ifd::Entry, tags::Tag};

/// An Image File Directory (IFD).
///
/// A directory is a map of [`Tag`]s to [`Entry`]s. Small values are decoded into the entry when
/// the directory is read, larger ones are stored elsewhere in the file and the entry only holds
/// their offset. Use [`Decoder::resolve`](crate::decoder::Decoder::resolve) to get the value of
/// a tag either way.
///
/// Directories are read once and never modified afterwards.
#[doc(alias = "IFD")]
#[derive(Clone, Default, PartialEq)]
pub struct Directory {
    /// The offset this directory was read from.
    pub(crate) offset: u32,
    /// There are at most `u16::MAX` entries in any single directory, the count is stored as a
    /// 2-byte value. The order in the file is implied to be ascending by tag value (the decoder
    /// does not mind unordered entries, a repeated tag replaces the earlier entry).
    pub(crate) entries: BTreeMap<u16, Entry>,
    /// The raw "next directory" field following the entries; 0 ends the chain.
    pub(crate) next_ifd: u32,
}

impl Directory {
    /// Retrieve the entry associated with a tag.
    pub fn get(&self, tag: Tag) -> Option<&Entry> {
        self.entries.get(&tag.to_u16())
    }

    /// Check if the directory contains a specified tag.
    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.contains_key(&tag.to_u16())
    }

    /// Iterate over all known and unknown tags in this directory, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (Tag, &Entry)> + '_ {
        self.entries
            .iter()
            .map(|(k, v)| (Tag::from_u16_exhaustive(*k), v))
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The file offset this directory was read from.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// The offset of the next directory in the chain, if there is one.
    pub fn next(&self) -> Option<u32> {
        match self.next_ifd {
            0 => None,
            n => Some(n),
        }
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory")
            .field("offset", &self.offset)
            .field(
                "entries",
                &self
                    .entries
                    .iter()
                    .map(|(k, v)| (Tag::from_u16_exhaustive(*k), v))
                    .collect::<Vec<_>>(),
            )
            .field("next_ifd", &self.next_ifd)
            .finish()
    }
}
