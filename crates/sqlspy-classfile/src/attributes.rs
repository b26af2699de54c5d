//! Attributes: raw carriage for everything, decoding for `Code` and `Exceptions`.

use crate::error::{ClassFileError, Result};
use crate::reader::{count_u16, length_u32, ByteReader, ByteWriter};

pub const CODE: &str = "Code";
pub const EXCEPTIONS: &str = "Exceptions";

/// JVM limit on the length of a method body.
pub const MAX_CODE_LENGTH: usize = 65535;

/// An undecoded attribute. The body is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl AttributeInfo {
    pub fn new(name_index: u16, info: Vec<u8>) -> Self {
        Self { name_index, info }
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let name_index = reader.u16()?;
        let len = reader.u32()? as usize;
        let info = reader.take(len)?.to_vec();
        Ok(Self { name_index, info })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.put_u16(self.name_index);
        out.put_u32(length_u32("attribute", self.info.len())?);
        out.extend_from_slice(&self.info);
        Ok(())
    }
}

pub(crate) fn read_attributes(reader: &mut ByteReader<'_>) -> Result<Vec<AttributeInfo>> {
    let count = reader.u16()?;
    (0..count).map(|_| AttributeInfo::read(reader)).collect()
}

pub(crate) fn write_attributes(attributes: &[AttributeInfo], out: &mut Vec<u8>) -> Result<()> {
    out.put_u16(count_u16("attribute count", attributes.len())?);
    for attribute in attributes {
        attribute.write(out)?;
    }
    Ok(())
}

fn malformed(name: &'static str, err: ClassFileError) -> ClassFileError {
    ClassFileError::MalformedAttribute {
        name,
        reason: err.to_string(),
    }
}

/// One `try`/`catch` range of a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Zero for a catch-all handler.
    pub catch_type: u16,
}

/// Decoded `Code` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionHandler>,
    /// Nested attributes such as `LineNumberTable` or `StackMapTable`.
    pub attributes: Vec<AttributeInfo>,
}

impl CodeAttribute {
    pub fn parse(info: &[u8]) -> Result<Self> {
        Self::parse_inner(info).map_err(|e| malformed(CODE, e))
    }

    fn parse_inner(info: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(info);
        let max_stack = reader.u16()?;
        let max_locals = reader.u16()?;
        let code_len = reader.u32()? as usize;
        let code = reader.take(code_len)?.to_vec();
        let handler_count = reader.u16()?;
        let mut exception_table = Vec::with_capacity(handler_count as usize);
        for _ in 0..handler_count {
            exception_table.push(ExceptionHandler {
                start_pc: reader.u16()?,
                end_pc: reader.u16()?,
                handler_pc: reader.u16()?,
                catch_type: reader.u16()?,
            });
        }
        let attributes = read_attributes(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(ClassFileError::TrailingBytes {
                count: reader.remaining(),
            });
        }
        Ok(Self {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.code.is_empty() || self.code.len() > MAX_CODE_LENGTH {
            return Err(ClassFileError::TooLarge {
                what: "method body",
                size: self.code.len(),
            });
        }
        let mut out = Vec::with_capacity(12 + self.code.len());
        out.put_u16(self.max_stack);
        out.put_u16(self.max_locals);
        out.put_u32(self.code.len() as u32);
        out.extend_from_slice(&self.code);
        out.put_u16(count_u16("exception table", self.exception_table.len())?);
        for handler in &self.exception_table {
            out.put_u16(handler.start_pc);
            out.put_u16(handler.end_pc);
            out.put_u16(handler.handler_pc);
            out.put_u16(handler.catch_type);
        }
        write_attributes(&self.attributes, &mut out)?;
        Ok(out)
    }
}

/// Decode an `Exceptions` attribute body into `CONSTANT_Class` indices.
pub fn parse_exceptions(info: &[u8]) -> Result<Vec<u16>> {
    let mut reader = ByteReader::new(info);
    let parse = |reader: &mut ByteReader<'_>| -> Result<Vec<u16>> {
        let count = reader.u16()?;
        (0..count).map(|_| reader.u16()).collect()
    };
    let classes = parse(&mut reader).map_err(|e| malformed(EXCEPTIONS, e))?;
    if reader.remaining() != 0 {
        return Err(malformed(
            EXCEPTIONS,
            ClassFileError::TrailingBytes {
                count: reader.remaining(),
            },
        ));
    }
    Ok(classes)
}

pub fn encode_exceptions(class_indices: &[u16]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(2 + class_indices.len() * 2);
    out.put_u16(count_u16("exception list", class_indices.len())?);
    for index in class_indices {
        out.put_u16(*index);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_code() -> CodeAttribute {
        CodeAttribute {
            max_stack: 2,
            max_locals: 3,
            code: vec![0x2a, 0x2b, 0xb0],
            exception_table: vec![ExceptionHandler {
                start_pc: 0,
                end_pc: 2,
                handler_pc: 2,
                catch_type: 0,
            }],
            attributes: vec![AttributeInfo::new(9, vec![0, 1, 0, 0, 0, 7])],
        }
    }

    #[test]
    fn test_code_attribute_roundtrip() {
        let code = sample_code();
        let bytes = code.to_bytes().unwrap();
        assert_eq!(CodeAttribute::parse(&bytes).unwrap(), code);
    }

    #[test]
    fn test_truncated_code_is_malformed() {
        let bytes = sample_code().to_bytes().unwrap();
        let err = CodeAttribute::parse(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(
            matches!(err, ClassFileError::MalformedAttribute { name: "Code", .. }),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn test_empty_body_is_rejected() {
        let mut code = sample_code();
        code.code.clear();
        assert!(code.to_bytes().is_err());
    }

    #[test]
    fn test_exceptions_roundtrip() {
        let bytes = encode_exceptions(&[4, 17]).unwrap();
        assert_eq!(bytes, vec![0, 2, 0, 4, 0, 17]);
        assert_eq!(parse_exceptions(&bytes).unwrap(), vec![4, 17]);
        assert!(parse_exceptions(&[0, 2, 0, 4]).is_err());
        assert!(parse_exceptions(&[0, 0, 1]).is_err());
    }
}
