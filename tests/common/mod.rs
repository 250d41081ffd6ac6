//! Builds small TIFF containers in memory.
#![allow(dead_code)]

/// One entry to be written, with its value already encoded.
pub struct Field {
    pub tag: u16,
    pub type_: u16,
    pub count: u32,
    pub data: Vec<u8>,
}

pub struct TiffBuilder {
    big_endian: bool,
    buf: Vec<u8>,
}

impl TiffBuilder {
    /// A standard header with no first directory yet.
    pub fn new(big_endian: bool) -> Self {
        let magic: &[u8] = if big_endian { b"MM\0*" } else { b"II*\0" };
        TiffBuilder {
            big_endian,
            buf: [magic, &[0; 4][..]].concat(),
        }
    }

    pub fn le() -> Self {
        Self::new(false)
    }

    pub fn be() -> Self {
        Self::new(true)
    }

    fn u16(&self, n: u16) -> [u8; 2] {
        if self.big_endian {
            n.to_be_bytes()
        } else {
            n.to_le_bytes()
        }
    }

    fn u32(&self, n: u32) -> [u8; 4] {
        if self.big_endian {
            n.to_be_bytes()
        } else {
            n.to_le_bytes()
        }
    }

    pub fn short(&self, tag: u16, values: &[u16]) -> Field {
        Field {
            tag,
            type_: 3,
            count: values.len() as u32,
            data: values.iter().flat_map(|&v| self.u16(v)).collect(),
        }
    }

    pub fn long(&self, tag: u16, values: &[u32]) -> Field {
        Field {
            tag,
            type_: 4,
            count: values.len() as u32,
            data: values.iter().flat_map(|&v| self.u32(v)).collect(),
        }
    }

    pub fn rational(&self, tag: u16, values: &[(u32, u32)]) -> Field {
        Field {
            tag,
            type_: 5,
            count: values.len() as u32,
            data: values
                .iter()
                .flat_map(|&(n, d)| [self.u32(n), self.u32(d)])
                .flatten()
                .collect(),
        }
    }

    pub fn double(&self, tag: u16, values: &[f64]) -> Field {
        Field {
            tag,
            type_: 12,
            count: values.len() as u32,
            data: values
                .iter()
                .flat_map(|&v| {
                    if self.big_endian {
                        v.to_be_bytes()
                    } else {
                        v.to_le_bytes()
                    }
                })
                .collect(),
        }
    }

    /// ASCII with a terminating NUL.
    pub fn ascii(&self, tag: u16, text: &str) -> Field {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        Field {
            tag,
            type_: 2,
            count: data.len() as u32,
            data,
        }
    }

    pub fn undefined(&self, tag: u16, data: &[u8]) -> Field {
        Field {
            tag,
            type_: 7,
            count: data.len() as u32,
            data: data.to_vec(),
        }
    }

    /// A nested directory pointer, type IFD.
    pub fn ifd(&self, tag: u16, offsets: &[u32]) -> Field {
        Field {
            type_: 13,
            ..self.long(tag, offsets)
        }
    }

    pub fn raw(&self, tag: u16, type_: u16, count: u32, data: &[u8]) -> Field {
        Field {
            tag,
            type_,
            count,
            data: data.to_vec(),
        }
    }

    /// Append a directory and its out-of-line values. Returns its offset.
    ///
    /// The "next" field is 0, use [`Self::set_next`] to chain directories.
    pub fn directory(&mut self, fields: &[Field]) -> u32 {
        if self.buf.len() % 2 == 1 {
            self.buf.push(0);
        }

        let start = self.buf.len();
        let mut extra_at = start + 2 + 12 * fields.len() + 4;
        let mut extra = Vec::new();
        let mut dir = Vec::new();

        dir.extend(self.u16(fields.len() as u16));
        for field in fields {
            dir.extend(self.u16(field.tag));
            dir.extend(self.u16(field.type_));
            dir.extend(self.u32(field.count));
            if field.data.len() <= 4 {
                let mut inline = field.data.clone();
                inline.resize(4, 0);
                dir.extend(inline);
            } else {
                dir.extend(self.u32(extra_at as u32));
                extra.extend_from_slice(&field.data);
                extra_at += field.data.len();
            }
        }
        dir.extend(self.u32(0));

        self.buf.extend(dir);
        self.buf.extend(extra);
        start as u32
    }

    pub fn set_first(&mut self, offset: u32) -> &mut Self {
        let bytes = self.u32(offset);
        self.buf[4..8].copy_from_slice(&bytes);
        self
    }

    fn entry_count(&self, dir: u32) -> usize {
        let at = dir as usize;
        let raw = [self.buf[at], self.buf[at + 1]];
        usize::from(if self.big_endian {
            u16::from_be_bytes(raw)
        } else {
            u16::from_le_bytes(raw)
        })
    }

    pub fn set_next(&mut self, dir: u32, next: u32) -> &mut Self {
        let at = dir as usize + 2 + 12 * self.entry_count(dir);
        let bytes = self.u32(next);
        self.buf[at..at + 4].copy_from_slice(&bytes);
        self
    }

    /// Overwrite the inline value field of the `index`-th entry of a directory.
    pub fn patch_entry(&mut self, dir: u32, index: usize, value: u32) -> &mut Self {
        let at = dir as usize + 2 + 12 * index + 8;
        let bytes = self.u32(value);
        self.buf[at..at + 4].copy_from_slice(&bytes);
        self
    }

    pub fn len(&self) -> u32 {
        self.buf.len() as u32
    }

    pub fn finish(&self) -> std::io::Cursor<Vec<u8>> {
        std::io::Cursor::new(self.buf.clone())
    }
}
