//! Bounds-checked big-endian cursor over class file bytes.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

use crate::error::{ClassFileError, Result};

pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(ClassFileError::UnexpectedEof {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }
}

/// Append helpers; writes into a `Vec<u8>` cannot fail.
pub(crate) trait ByteWriter {
    fn put_u8(&mut self, value: u8);
    fn put_u16(&mut self, value: u16);
    fn put_u32(&mut self, value: u32);
}

impl ByteWriter for Vec<u8> {
    fn put_u8(&mut self, value: u8) {
        self.push(value);
    }

    fn put_u16(&mut self, value: u16) {
        let _ = self.write_u16::<BigEndian>(value);
    }

    fn put_u32(&mut self, value: u32) {
        let _ = self.write_u32::<BigEndian>(value);
    }
}

/// Convert a collection length to a `u16` count field.
pub(crate) fn count_u16(what: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| ClassFileError::TooLarge { what, size: len })
}

/// Convert a body length to a `u32` length field.
pub(crate) fn length_u32(what: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| ClassFileError::TooLarge { what, size: len })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian() {
        let bytes = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0x07];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.u32().unwrap(), 0xCAFEBABE);
        assert_eq!(reader.u16().unwrap(), 0x34);
        assert_eq!(reader.u8().unwrap(), 7);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_short_read_reports_offset() {
        let bytes = [0x00, 0x01, 0x02];
        let mut reader = ByteReader::new(&bytes);
        reader.u16().unwrap();
        assert_eq!(
            reader.u32().unwrap_err(),
            ClassFileError::UnexpectedEof {
                offset: 2,
                needed: 3
            }
        );
    }

    #[test]
    fn test_writer_appends_big_endian() {
        let mut out = Vec::new();
        out.put_u16(0x0102);
        out.put_u32(0x03040506);
        out.put_u8(7);
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7]);
    }
}
