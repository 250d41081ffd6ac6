//! Function for reading TIFF tags

use std::io::{self, Read};

use super::stream::{ByteOrder, EndianReader, SmartReader};
use crate::tags::{Scheme, Type};
use crate::TiffResult;

/// A single numeric element of a tag value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    /// Numerator and denominator, kept apart as they are stored.
    Rational(i64, i64),
    Float(f64),
}

impl Number {
    /// Check whether the integer `target` is one of the stored numbers.
    ///
    /// A rational holds two stored integers, either of them matches.
    pub fn contains(&self, target: i64) -> bool {
        match *self {
            Number::Integer(n) => n == target,
            Number::Rational(num, den) => num == target || den == target,
            // Exact comparison; every value that can be stored in a tag converts losslessly.
            Number::Float(f) => f == target as f64,
        }
    }
}

/// A resolved tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// BYTE, SHORT, LONG, their signed siblings, rationals and floats.
    Numbers(Vec<Number>),
    /// ASCII or UNDEFINED data.
    Bytes(Vec<u8>),
    /// Offsets of further directories.
    DirectoryOffsets(Vec<u32>),
}

impl Value {
    /// Interpret the value as a list of directory offsets.
    ///
    /// Pointer tags are commonly written as LONG instead of IFD, so non-negative integers are
    /// accepted as well. Returns `None` if any element can not be an offset.
    pub fn into_offsets(self) -> Option<Vec<u32>> {
        match self {
            Value::DirectoryOffsets(offsets) => Some(offsets),
            Value::Numbers(numbers) => numbers
                .into_iter()
                .map(|n| match n {
                    Number::Integer(n) => u32::try_from(n).ok(),
                    _ => None,
                })
                .collect(),
            Value::Bytes(_) => None,
        }
    }
}

/// Where the value of an entry lives.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// The value fit into the four byte value field and was decoded in place.
    Inline(Value),
    /// The value field holds the file offset of the value.
    Offset(u32),
}

/// One 12-byte directory entry, without its tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub(crate) type_: Type,
    pub(crate) count: u32,
    pub(crate) slot: Slot,
}

impl Entry {
    /// Build an entry from its raw type, count and value field.
    ///
    /// The value field is decoded in place when the type is known and `count` elements fit into
    /// the four bytes; otherwise it is kept as an offset in the given byte order.
    pub fn new(type_: Type, count: u32, field: [u8; 4], bo: ByteOrder) -> TiffResult<Entry> {
        let offset = match bo {
            ByteOrder::LittleEndian => u32::from_le_bytes(field),
            ByteOrder::BigEndian => u32::from_be_bytes(field),
        };

        let slot = match type_.value_bytes(count) {
            Some(n) if n <= 4 => {
                let r = SmartReader::wrap(io::Cursor::new(&field[..n as usize]), bo);
                decode(type_, count, r)?.map_or(Slot::Offset(offset), Slot::Inline)
            }
            _ => Slot::Offset(offset),
        };

        Ok(Entry {
            type_,
            count,
            slot,
        })
    }

    pub fn field_type(&self) -> Type {
        self.type_
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.slot, Slot::Inline(_))
    }
}

/// Decode `count` elements of `type_` from `reader`.
///
/// Returns `Ok(None)` for unknown types.
pub(crate) fn decode<R: Read>(
    type_: Type,
    count: u32,
    mut reader: SmartReader<R>,
) -> TiffResult<Option<Value>> {
    let Some(scheme) = type_.scheme() else {
        return Ok(None);
    };

    let value = match scheme {
        Scheme::Raw => {
            let mut buf = Vec::with_capacity(count as usize);
            reader.by_ref().take(count.into()).read_to_end(&mut buf)?;
            if buf.len() != count as usize {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            Value::Bytes(buf)
        }
        Scheme::DirectoryOffset => {
            Value::DirectoryOffsets(decode_each(count, &mut reader, |r| r.read_u32())?)
        }
        Scheme::Unsigned(1) => numbers(count, &mut reader, |r| {
            Ok(Number::Integer(r.read_u8()?.into()))
        })?,
        Scheme::Unsigned(2) => numbers(count, &mut reader, |r| {
            Ok(Number::Integer(r.read_u16()?.into()))
        })?,
        Scheme::Unsigned(_) => numbers(count, &mut reader, |r| {
            Ok(Number::Integer(r.read_u32()?.into()))
        })?,
        Scheme::Signed(1) => numbers(count, &mut reader, |r| {
            Ok(Number::Integer(r.read_i8()?.into()))
        })?,
        Scheme::Signed(2) => numbers(count, &mut reader, |r| {
            Ok(Number::Integer(r.read_i16()?.into()))
        })?,
        Scheme::Signed(_) => numbers(count, &mut reader, |r| {
            Ok(Number::Integer(r.read_i32()?.into()))
        })?,
        Scheme::UnsignedRational => numbers(count, &mut reader, |r| {
            Ok(Number::Rational(r.read_u32()?.into(), r.read_u32()?.into()))
        })?,
        Scheme::SignedRational => numbers(count, &mut reader, |r| {
            Ok(Number::Rational(r.read_i32()?.into(), r.read_i32()?.into()))
        })?,
        Scheme::Float32 => numbers(count, &mut reader, |r| {
            Ok(Number::Float(r.read_f32()?.into()))
        })?,
        Scheme::Float64 => numbers(count, &mut reader, |r| Ok(Number::Float(r.read_f64()?)))?,
    };

    Ok(Some(value))
}

#[inline(always)]
fn numbers<R: Read, F: Fn(&mut SmartReader<R>) -> io::Result<Number>>(
    count: u32,
    reader: &mut SmartReader<R>,
    decode_fn: F,
) -> TiffResult<Value> {
    decode_each(count, reader, decode_fn).map(Value::Numbers)
}

#[inline(always)]
fn decode_each<R: Read, T, F: Fn(&mut SmartReader<R>) -> io::Result<T>>(
    count: u32,
    reader: &mut SmartReader<R>,
    decode_fn: F,
) -> TiffResult<Vec<T>> {
    // The caller has already bounded the byte length, the count itself is trusted.
    let mut v = Vec::with_capacity(count as usize);
    for _ in 0..count {
        v.push(decode_fn(reader)?);
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(type_: u16, count: u32, field: [u8; 4]) -> Entry {
        Entry::new(
            Type::from_u16_exhaustive(type_),
            count,
            field,
            ByteOrder::LittleEndian,
        )
        .unwrap()
    }

    #[test]
    fn inline_shorts() {
        let e = entry(3, 2, [3, 0, 5, 0]);
        assert_eq!(
            e.slot,
            Slot::Inline(Value::Numbers(vec![Number::Integer(3), Number::Integer(5)]))
        );
    }

    #[test]
    fn four_bytes_is_inline_five_is_not() {
        let e = entry(1, 4, [1, 2, 3, 4]);
        assert!(e.is_inline());

        let e = entry(1, 5, [0x10, 0, 0, 0]);
        assert_eq!(e.slot, Slot::Offset(0x10));
    }

    #[test]
    fn big_endian_offset() {
        let e = Entry::new(Type::LONG, 2, [0, 0, 1, 0], ByteOrder::BigEndian).unwrap();
        assert_eq!(e.slot, Slot::Offset(0x100));
    }

    #[test]
    fn unknown_type_is_an_offset() {
        let e = entry(42, 1, [8, 0, 0, 0]);
        assert_eq!(e.field_type(), Type::Unknown(42));
        assert_eq!(e.slot, Slot::Offset(8));
    }

    #[test]
    fn inline_signed_and_raw() {
        let e = entry(6, 2, [0xff, 0x7f, 0, 0]);
        assert_eq!(
            e.slot,
            Slot::Inline(Value::Numbers(vec![Number::Integer(-1), Number::Integer(127)]))
        );

        let e = entry(2, 3, [b'h', b'i', 0, 0]);
        assert_eq!(e.slot, Slot::Inline(Value::Bytes(b"hi\0".to_vec())));

        let e = entry(13, 1, [0x20, 0, 0, 0]);
        assert_eq!(e.slot, Slot::Inline(Value::DirectoryOffsets(vec![0x20])));
    }

    #[test]
    fn zero_count_is_empty_inline() {
        let e = entry(4, 0, [1, 2, 3, 4]);
        assert_eq!(e.slot, Slot::Inline(Value::Numbers(vec![])));
    }

    #[test]
    fn number_membership() {
        assert!(Number::Integer(5).contains(5));
        assert!(Number::Rational(72, 1).contains(1));
        assert!(Number::Float(5.0).contains(5));
        assert!(!Number::Float(5.5).contains(5));
    }

    #[test]
    fn offsets_from_longs() {
        let v = Value::Numbers(vec![Number::Integer(8), Number::Integer(100)]);
        assert_eq!(v.into_offsets(), Some(vec![8, 100]));

        let v = Value::Numbers(vec![Number::Integer(-1)]);
        assert_eq!(v.into_offsets(), None);

        assert_eq!(Value::Bytes(vec![1]).into_offsets(), None);
    }
}
