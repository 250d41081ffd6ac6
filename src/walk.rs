//! Exhaustive search of every directory entry for a value.
//!
//! The search scans the chain currently loaded in a [`Decoder`], then follows every entry of
//! type [`Type::IFD`] through an explicit work stack, reloading the decoder's chain from each
//! pointed-to offset. Every match is reported with the path of directories that led to it.

use std::fmt;
use std::io::{Read, Seek};

use tracing::{debug, trace, warn};

use crate::decoder::ifd::Value;
use crate::decoder::{Chain, Decoder};
use crate::error::LimitKind;
use crate::tags::{Tag, Type};
use crate::{Directory, TiffError, TiffResult};

/// The value searched for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Needle {
    /// Matches numeric values containing this integer.
    Integer(i64),
    /// Matches ASCII and UNDEFINED values containing these bytes.
    Bytes(Vec<u8>),
}

impl Needle {
    /// Check a resolved value against the needle.
    ///
    /// Integers never match byte values and byte strings never match numbers. Directory
    /// offsets are never matched.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Needle::Integer(target), Value::Numbers(numbers)) => {
                numbers.iter().any(|n| n.contains(*target))
            }
            (Needle::Bytes(needle), Value::Bytes(haystack)) => {
                needle.is_empty() || haystack.windows(needle.len()).any(|w| w == &needle[..])
            }
            _ => false,
        }
    }
}

impl From<i64> for Needle {
    fn from(n: i64) -> Self {
        Needle::Integer(n)
    }
}

impl From<&[u8]> for Needle {
    fn from(bytes: &[u8]) -> Self {
        Needle::Bytes(bytes.to_vec())
    }
}

impl From<&str> for Needle {
    fn from(text: &str) -> Self {
        Needle::Bytes(text.as_bytes().to_vec())
    }
}

/// One step of the path leading to a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Index in the main chain of directories.
    Directory(usize),
    /// Index in the SubIFD list of the first directory.
    SubDirectory(usize),
    /// Index in the offsets of a nested directory pointer tag.
    Nested { tag: u16, index: usize },
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PathSegment::Directory(index) => write!(f, "{}", index),
            PathSegment::SubDirectory(index) => write!(f, "({}, {})", Tag::SubIfd.to_u16(), index),
            PathSegment::Nested { tag, index } => write!(f, "({}, {})", tag, index),
        }
    }
}

/// A tag whose value contains the needle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Match {
    pub path: Vec<PathSegment>,
    pub tag: Tag,
}

impl fmt::Display for Match {
    /// Path tokens followed by the tag number, separated by spaces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.path {
            write!(f, "{} ", segment)?;
        }
        write!(f, "{}", self.tag.to_u16())
    }
}

#[derive(Debug)]
struct WorkItem {
    path: Vec<PathSegment>,
    offset: u32,
    /// Offsets of the directories this item was reached through.
    ancestors: Vec<u32>,
}

/// Drives a search over a decoder.
pub struct Walker<'a, R>
where
    R: Read + Seek,
{
    decoder: &'a mut Decoder<R>,
    todo: Vec<WorkItem>,
    followed: usize,
}

impl<'a, R: Read + Seek> Walker<'a, R> {
    pub fn new(decoder: &'a mut Decoder<R>) -> Self {
        Walker {
            decoder,
            todo: Vec::new(),
            followed: 0,
        }
    }

    /// Search for `needle`, calling `report` for each match as it is found.
    ///
    /// The search starts from the chain currently loaded in the decoder. That chain is loaded
    /// again when the search returns, so searches can be repeated on the same decoder.
    pub fn search<F>(&mut self, needle: &Needle, mut report: F) -> TiffResult<()>
    where
        F: FnMut(Match),
    {
        let start = self.decoder.chain.clone();
        self.todo.clear();
        self.followed = 0;

        let result = self.walk(needle, &mut report);

        self.todo.clear();
        self.decoder.chain = start;
        result
    }

    fn walk<F>(&mut self, needle: &Needle, report: &mut F) -> TiffResult<()>
    where
        F: FnMut(Match),
    {
        let start = self
            .decoder
            .chain
            .directories
            .first()
            .map_or(Vec::new(), |dir| vec![dir.offset()]);
        self.scan_loaded(&[], &start, needle, report)?;

        while let Some(item) = self.todo.pop() {
            self.followed += 1;

            trace!(offset = item.offset, pending = self.todo.len(), "following nested directory");
            self.decoder.reinit_from(item.offset)?;

            let mut ancestors = item.ancestors;
            ancestors.push(item.offset);
            self.scan_loaded(&item.path, &ancestors, needle, report)?;
        }

        debug!(nested = self.followed, "search finished");
        Ok(())
    }

    /// Collect all matches for `needle`.
    pub fn search_all(&mut self, needle: &Needle) -> TiffResult<Vec<Match>> {
        let mut matches = Vec::new();
        self.search(needle, |m| matches.push(m))?;
        Ok(matches)
    }

    fn scan_loaded<F>(
        &mut self,
        prefix: &[PathSegment],
        ancestors: &[u32],
        needle: &Needle,
        report: &mut F,
    ) -> TiffResult<()>
    where
        F: FnMut(Match),
    {
        // Take the chain so the decoder can be borrowed for resolving values.
        let chain = std::mem::take(&mut self.decoder.chain);
        let result = self.scan_chain(&chain, prefix, ancestors, needle, report);
        self.decoder.chain = chain;
        result
    }

    fn scan_chain<F>(
        &mut self,
        chain: &Chain,
        prefix: &[PathSegment],
        ancestors: &[u32],
        needle: &Needle,
        report: &mut F,
    ) -> TiffResult<()>
    where
        F: FnMut(Match),
    {
        let loaded: Vec<u32> = chain
            .directories
            .iter()
            .chain(&chain.sub_directories)
            .map(Directory::offset)
            .collect();

        let main = chain
            .directories
            .iter()
            .enumerate()
            .map(|(idx, dir)| (PathSegment::Directory(idx), dir));
        let subs = chain
            .sub_directories
            .iter()
            .enumerate()
            .map(|(idx, dir)| (PathSegment::SubDirectory(idx), dir));

        for (segment, dir) in main.chain(subs) {
            let mut path = prefix.to_vec();
            path.push(segment);

            for (tag, entry) in dir.iter() {
                let Some(value) = self.decoder.entry_val(entry)? else {
                    continue;
                };

                if entry.field_type() == Type::IFD {
                    let Value::DirectoryOffsets(offsets) = value else {
                        continue;
                    };

                    for (index, offset) in offsets.into_iter().enumerate() {
                        if loaded.contains(&offset) || ancestors.contains(&offset) {
                            warn!(
                                offset,
                                tag = tag.to_u16(),
                                "nested directory already loaded or enclosing, skipped"
                            );
                            continue;
                        }

                        // Pending items count against the limit too.
                        let queued = self.followed + self.todo.len();
                        if queued >= self.decoder.limits().nested_directories {
                            return Err(TiffError::LimitsExceeded(LimitKind::NestedDirectories));
                        }

                        let mut item_path = path.clone();
                        item_path.push(PathSegment::Nested {
                            tag: tag.to_u16(),
                            index,
                        });

                        let mut item_ancestors = ancestors.to_vec();
                        item_ancestors.push(dir.offset());

                        self.todo.push(WorkItem {
                            path: item_path,
                            offset,
                            ancestors: item_ancestors,
                        });
                    }
                } else if needle.matches(&value) {
                    report(Match {
                        path: path.clone(),
                        tag,
                    });
                }
            }
        }

        Ok(())
    }
}
