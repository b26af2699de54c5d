//! The constant pool: decoding, lookup and interning additions.
//!
//! Entries are stored raw so that an unedited pool re-encodes byte for byte.
//! Indices are 1-based; `Long` and `Double` occupy two slots and the second
//! slot is kept as an unusable placeholder.

use crate::error::{ClassFileError, Result};
use crate::mutf8;
use crate::reader::{ByteReader, ByteWriter};

pub const TAG_UTF8: u8 = 1;
pub const TAG_INTEGER: u8 = 3;
pub const TAG_FLOAT: u8 = 4;
pub const TAG_LONG: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_CLASS: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_FIELDREF: u8 = 9;
pub const TAG_METHODREF: u8 = 10;
pub const TAG_INTERFACE_METHODREF: u8 = 11;
pub const TAG_NAME_AND_TYPE: u8 = 12;
pub const TAG_METHOD_HANDLE: u8 = 15;
pub const TAG_METHOD_TYPE: u8 = 16;
pub const TAG_DYNAMIC: u8 = 17;
pub const TAG_INVOKE_DYNAMIC: u8 = 18;
pub const TAG_MODULE: u8 = 19;
pub const TAG_PACKAGE: u8 = 20;

const MAX_POOL_COUNT: usize = u16::MAX as usize;

/// A single constant pool entry. Numeric values keep their raw bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Utf8(Vec<u8>),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    Fieldref {
        class_index: u16,
        name_and_type_index: u16,
    },
    Methodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    Module {
        name_index: u16,
    },
    Package {
        name_index: u16,
    },
}

impl Constant {
    pub fn tag(&self) -> u8 {
        match self {
            Constant::Utf8(_) => TAG_UTF8,
            Constant::Integer(_) => TAG_INTEGER,
            Constant::Float(_) => TAG_FLOAT,
            Constant::Long(_) => TAG_LONG,
            Constant::Double(_) => TAG_DOUBLE,
            Constant::Class { .. } => TAG_CLASS,
            Constant::String { .. } => TAG_STRING,
            Constant::Fieldref { .. } => TAG_FIELDREF,
            Constant::Methodref { .. } => TAG_METHODREF,
            Constant::InterfaceMethodref { .. } => TAG_INTERFACE_METHODREF,
            Constant::NameAndType { .. } => TAG_NAME_AND_TYPE,
            Constant::MethodHandle { .. } => TAG_METHOD_HANDLE,
            Constant::MethodType { .. } => TAG_METHOD_TYPE,
            Constant::Dynamic { .. } => TAG_DYNAMIC,
            Constant::InvokeDynamic { .. } => TAG_INVOKE_DYNAMIC,
            Constant::Module { .. } => TAG_MODULE,
            Constant::Package { .. } => TAG_PACKAGE,
        }
    }

    /// Number of pool slots the entry occupies.
    pub fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    fn read(tag: u8, index: u16, reader: &mut ByteReader<'_>) -> Result<Self> {
        let constant = match tag {
            TAG_UTF8 => {
                let len = reader.u16()? as usize;
                Constant::Utf8(reader.take(len)?.to_vec())
            }
            TAG_INTEGER => Constant::Integer(reader.u32()?),
            TAG_FLOAT => Constant::Float(reader.u32()?),
            TAG_LONG => {
                let high = reader.u32()? as u64;
                let low = reader.u32()? as u64;
                Constant::Long((high << 32) | low)
            }
            TAG_DOUBLE => {
                let high = reader.u32()? as u64;
                let low = reader.u32()? as u64;
                Constant::Double((high << 32) | low)
            }
            TAG_CLASS => Constant::Class {
                name_index: reader.u16()?,
            },
            TAG_STRING => Constant::String {
                string_index: reader.u16()?,
            },
            TAG_FIELDREF => Constant::Fieldref {
                class_index: reader.u16()?,
                name_and_type_index: reader.u16()?,
            },
            TAG_METHODREF => Constant::Methodref {
                class_index: reader.u16()?,
                name_and_type_index: reader.u16()?,
            },
            TAG_INTERFACE_METHODREF => Constant::InterfaceMethodref {
                class_index: reader.u16()?,
                name_and_type_index: reader.u16()?,
            },
            TAG_NAME_AND_TYPE => Constant::NameAndType {
                name_index: reader.u16()?,
                descriptor_index: reader.u16()?,
            },
            TAG_METHOD_HANDLE => Constant::MethodHandle {
                reference_kind: reader.u8()?,
                reference_index: reader.u16()?,
            },
            TAG_METHOD_TYPE => Constant::MethodType {
                descriptor_index: reader.u16()?,
            },
            TAG_DYNAMIC => Constant::Dynamic {
                bootstrap_method_attr_index: reader.u16()?,
                name_and_type_index: reader.u16()?,
            },
            TAG_INVOKE_DYNAMIC => Constant::InvokeDynamic {
                bootstrap_method_attr_index: reader.u16()?,
                name_and_type_index: reader.u16()?,
            },
            TAG_MODULE => Constant::Module {
                name_index: reader.u16()?,
            },
            TAG_PACKAGE => Constant::Package {
                name_index: reader.u16()?,
            },
            other => return Err(ClassFileError::UnknownConstantTag { tag: other, index }),
        };
        Ok(constant)
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.put_u8(self.tag());
        match self {
            Constant::Utf8(bytes) => {
                // Length is checked when the entry is added or parsed.
                out.put_u16(bytes.len() as u16);
                out.extend_from_slice(bytes);
            }
            Constant::Integer(bits) | Constant::Float(bits) => out.put_u32(*bits),
            Constant::Long(bits) | Constant::Double(bits) => {
                out.put_u32((*bits >> 32) as u32);
                out.put_u32(*bits as u32);
            }
            Constant::Class { name_index: a }
            | Constant::String { string_index: a }
            | Constant::MethodType {
                descriptor_index: a,
            }
            | Constant::Module { name_index: a }
            | Constant::Package { name_index: a } => out.put_u16(*a),
            Constant::Fieldref {
                class_index: a,
                name_and_type_index: b,
            }
            | Constant::Methodref {
                class_index: a,
                name_and_type_index: b,
            }
            | Constant::InterfaceMethodref {
                class_index: a,
                name_and_type_index: b,
            }
            | Constant::NameAndType {
                name_index: a,
                descriptor_index: b,
            }
            | Constant::Dynamic {
                bootstrap_method_attr_index: a,
                name_and_type_index: b,
            }
            | Constant::InvokeDynamic {
                bootstrap_method_attr_index: a,
                name_and_type_index: b,
            } => {
                out.put_u16(*a);
                out.put_u16(*b);
            }
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                out.put_u8(*reference_kind);
                out.put_u16(*reference_index);
            }
        }
    }
}

/// A resolved member reference, for display and matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub class_name: String,
    pub name: String,
    pub descriptor: String,
    pub is_interface: bool,
}

/// The constant pool of one class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    /// Slot 0 and the slot after each `Long`/`Double` are `None`.
    entries: Vec<Option<Constant>>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            entries: vec![None],
        }
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let count = reader.u16()? as usize;
        if count == 0 {
            return Err(ClassFileError::BadConstantIndex {
                index: 0,
                expected: "constant pool count",
            });
        }
        let mut entries: Vec<Option<Constant>> = Vec::with_capacity(count);
        entries.push(None);
        while entries.len() < count {
            let index = entries.len() as u16;
            let tag = reader.u8()?;
            let constant = Constant::read(tag, index, reader)?;
            let width = constant.width();
            entries.push(Some(constant));
            if width == 2 {
                if entries.len() >= count {
                    return Err(ClassFileError::BadConstantIndex {
                        index,
                        expected: "two-slot constant inside the pool",
                    });
                }
                entries.push(None);
            }
        }
        Ok(Self { entries })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.put_u16(self.entries.len() as u16);
        for constant in self.entries.iter().flatten() {
            constant.write(out);
        }
    }

    /// The `constant_pool_count` field: number of slots plus one.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(index, constant)` for every usable slot.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (i as u16, c)))
    }

    pub fn get(&self, index: u16) -> Result<&Constant> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(ClassFileError::BadConstantIndex {
                index,
                expected: "constant",
            })
    }

    pub fn utf8(&self, index: u16) -> Result<String> {
        match self.get(index) {
            Ok(Constant::Utf8(bytes)) => {
                mutf8::decode(bytes).ok_or(ClassFileError::InvalidUtf8 { index })
            }
            _ => Err(ClassFileError::BadConstantIndex {
                index,
                expected: "Utf8 constant",
            }),
        }
    }

    /// Internal name of the class referenced by a `CONSTANT_Class` entry.
    pub fn class_name(&self, index: u16) -> Result<String> {
        match self.get(index) {
            Ok(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(ClassFileError::BadConstantIndex {
                index,
                expected: "Class constant",
            }),
        }
    }

    pub fn name_and_type(&self, index: u16) -> Result<(String, String)> {
        match self.get(index) {
            Ok(Constant::NameAndType {
                name_index,
                descriptor_index,
            }) => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(ClassFileError::BadConstantIndex {
                index,
                expected: "NameAndType constant",
            }),
        }
    }

    /// Resolve a `Fieldref`, `Methodref` or `InterfaceMethodref`.
    pub fn member_ref(&self, index: u16) -> Result<MemberRef> {
        let (class_index, nat_index, is_interface) = match self.get(index) {
            Ok(Constant::Fieldref {
                class_index,
                name_and_type_index,
            })
            | Ok(Constant::Methodref {
                class_index,
                name_and_type_index,
            }) => (*class_index, *name_and_type_index, false),
            Ok(Constant::InterfaceMethodref {
                class_index,
                name_and_type_index,
            }) => (*class_index, *name_and_type_index, true),
            _ => {
                return Err(ClassFileError::BadConstantIndex {
                    index,
                    expected: "member reference",
                })
            }
        };
        let (name, descriptor) = self.name_and_type(nat_index)?;
        Ok(MemberRef {
            class_name: self.class_name(class_index)?,
            name,
            descriptor,
            is_interface,
        })
    }

    /// Index of an existing entry equal to `constant`.
    pub fn find(&self, constant: &Constant) -> Option<u16> {
        self.iter().find(|(_, c)| *c == constant).map(|(i, _)| i)
    }

    /// Append an entry, reusing an equal one if present.
    pub fn add(&mut self, constant: Constant) -> Result<u16> {
        if let Some(existing) = self.find(&constant) {
            return Ok(existing);
        }
        if let Constant::Utf8(bytes) = &constant {
            if bytes.len() > u16::MAX as usize {
                return Err(ClassFileError::TooLarge {
                    what: "Utf8 constant",
                    size: bytes.len(),
                });
            }
        }
        let width = constant.width();
        if self.entries.len() + width > MAX_POOL_COUNT {
            return Err(ClassFileError::ConstantPoolOverflow);
        }
        let index = self.entries.len() as u16;
        self.entries.push(Some(constant));
        if width == 2 {
            self.entries.push(None);
        }
        Ok(index)
    }

    pub fn add_utf8(&mut self, text: &str) -> Result<u16> {
        self.add(Constant::Utf8(mutf8::encode(text)))
    }

    pub fn add_class(&mut self, internal_name: &str) -> Result<u16> {
        let name_index = self.add_utf8(internal_name)?;
        self.add(Constant::Class { name_index })
    }

    pub fn add_string(&mut self, text: &str) -> Result<u16> {
        let string_index = self.add_utf8(text)?;
        self.add(Constant::String { string_index })
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.add(Constant::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    pub fn add_methodref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::Methodref {
            class_index,
            name_and_type_index,
        })
    }

    pub fn add_interface_methodref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::InterfaceMethodref {
            class_index,
            name_and_type_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(pool: &ConstantPool) -> ConstantPool {
        let mut out = Vec::new();
        pool.write(&mut out);
        let mut reader = ByteReader::new(&out);
        let parsed = ConstantPool::read(&mut reader).unwrap();
        assert_eq!(reader.remaining(), 0);
        parsed
    }

    #[test]
    fn test_add_interns_equal_entries() {
        let mut pool = ConstantPool::new();
        let a = pool.add_methodref("a/B", "run", "()V").unwrap();
        let b = pool.add_methodref("a/B", "run", "()V").unwrap();
        assert_eq!(a, b);
        // Utf8 "a/B", Class, Utf8 "run", Utf8 "()V", NameAndType, Methodref
        assert_eq!(pool.count(), 7);

        let member = pool.member_ref(a).unwrap();
        assert_eq!(member.class_name, "a/B");
        assert_eq!(member.name, "run");
        assert_eq!(member.descriptor, "()V");
        assert!(!member.is_interface);
    }

    #[test]
    fn test_wide_constants_take_two_slots() {
        let mut pool = ConstantPool::new();
        let long = pool.add(Constant::Long(0x0102_0304_0506_0708)).unwrap();
        let next = pool.add_utf8("after").unwrap();
        assert_eq!(long, 1);
        assert_eq!(next, 3);
        assert!(pool.get(2).is_err(), "second slot of a long is unusable");

        let parsed = roundtrip(&pool);
        assert_eq!(parsed, pool);
        assert_eq!(parsed.utf8(3).unwrap(), "after");
    }

    #[test]
    fn test_every_tag_roundtrips() {
        let mut pool = ConstantPool::new();
        let utf8 = pool.add_utf8("x").unwrap();
        let nat = pool.add_name_and_type("x", "I").unwrap();
        for constant in [
            Constant::Integer(42),
            Constant::Float(f32::NAN.to_bits()),
            Constant::Double(1.5f64.to_bits()),
            Constant::String { string_index: utf8 },
            Constant::Fieldref {
                class_index: 1,
                name_and_type_index: nat,
            },
            Constant::MethodHandle {
                reference_kind: 6,
                reference_index: 1,
            },
            Constant::MethodType {
                descriptor_index: utf8,
            },
            Constant::Dynamic {
                bootstrap_method_attr_index: 0,
                name_and_type_index: nat,
            },
            Constant::InvokeDynamic {
                bootstrap_method_attr_index: 0,
                name_and_type_index: nat,
            },
            Constant::Module { name_index: utf8 },
            Constant::Package { name_index: utf8 },
        ] {
            pool.add(constant).unwrap();
        }
        assert_eq!(roundtrip(&pool), pool);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let bytes = [0x00, 0x02, 0x63];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(
            ConstantPool::read(&mut reader).unwrap_err(),
            ClassFileError::UnknownConstantTag { tag: 0x63, index: 1 }
        );
    }

    #[test]
    fn test_wrong_kind_lookups_fail() {
        let mut pool = ConstantPool::new();
        let class = pool.add_class("a/B").unwrap();
        assert!(pool.utf8(class).is_err());
        assert!(pool.class_name(class - 1).is_err());
        assert_eq!(pool.class_name(class).unwrap(), "a/B");
        assert!(pool.get(0).is_err());
        assert!(pool.get(99).is_err());
    }

    #[test]
    fn test_pool_overflow() {
        let mut pool = ConstantPool::new();
        pool.entries
            .extend(std::iter::repeat(Some(Constant::Integer(0))).take(u16::MAX as usize - 1));
        assert_eq!(pool.count(), u16::MAX as usize);
        assert_eq!(pool.add(Constant::Integer(0)).unwrap(), 1, "existing entry is reused");
        assert_eq!(
            pool.add(Constant::Integer(u32::MAX)).unwrap_err(),
            ClassFileError::ConstantPoolOverflow
        );
    }
}
