//! The class file model.
//!
//! # Layout
//!
//! ```text
//! magic minor major constant_pool access this super interfaces
//! fields methods attributes
//! ```
//!
//! Fields, methods and attributes keep their attribute bodies as raw bytes,
//! so a parsed class re-encodes to exactly the input bytes unless it was
//! edited. Only `Code` and `Exceptions` are decoded, and only on request.
//!
//! # Building
//!
//! ```
//! use sqlspy_classfile::access::{ACC_PUBLIC, ACC_SUPER};
//! use sqlspy_classfile::assembler::CodeBuilder;
//! use sqlspy_classfile::class_file::ClassFile;
//! use sqlspy_classfile::descriptor::MethodDescriptor;
//!
//! let mut class = ClassFile::new("org/example/Greeter", Some("java/lang/Object"), ACC_PUBLIC | ACC_SUPER).unwrap();
//! let desc = MethodDescriptor::parse("(Ljava/lang/String;)Ljava/lang/String;").unwrap();
//! let mut code = CodeBuilder::for_method(false, &desc);
//! code.load_local(1, &desc.params[0]).unwrap();
//! code.return_value(desc.ret.as_ref()).unwrap();
//! class.add_method(ACC_PUBLIC, "greet", &desc.to_string(), Some(code.finish().unwrap()), &[]).unwrap();
//!
//! let bytes = class.to_bytes().unwrap();
//! let parsed = ClassFile::parse(&bytes).unwrap();
//! assert_eq!(parsed.class_name().unwrap(), "org/example/Greeter");
//! assert_eq!(parsed.find_method("greet", "(Ljava/lang/String;)Ljava/lang/String;").unwrap(), Some(0));
//! ```

use crate::access::{ACC_ABSTRACT, ACC_INTERFACE, ACC_NATIVE};
use crate::attributes::{
    encode_exceptions, parse_exceptions, read_attributes, write_attributes, AttributeInfo,
    CodeAttribute, CODE, EXCEPTIONS,
};
use crate::constant_pool::ConstantPool;
use crate::error::{ClassFileError, Result};
use crate::reader::{count_u16, ByteReader, ByteWriter};

pub const MAGIC: u32 = 0xCAFE_BABE;

/// Java 8 class files; no `StackMapTable` is needed for straight-line code at any version.
pub const DEFAULT_MAJOR_VERSION: u16 = 52;

/// A field or method entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

pub type MethodInfo = MemberInfo;
pub type FieldInfo = MemberInfo;

impl MemberInfo {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            access_flags: reader.u16()?,
            name_index: reader.u16()?,
            descriptor_index: reader.u16()?,
            attributes: read_attributes(reader)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.put_u16(self.access_flags);
        out.put_u16(self.name_index);
        out.put_u16(self.descriptor_index);
        write_attributes(&self.attributes, out)
    }

    pub fn name(&self, pool: &ConstantPool) -> Result<String> {
        pool.utf8(self.name_index)
    }

    pub fn descriptor(&self, pool: &ConstantPool) -> Result<String> {
        pool.utf8(self.descriptor_index)
    }

    /// First attribute whose name is `name`.
    pub fn attribute(&self, pool: &ConstantPool, name: &str) -> Option<&AttributeInfo> {
        self.attributes
            .iter()
            .find(|a| pool.utf8(a.name_index).map(|n| n == name).unwrap_or(false))
    }

    pub fn is_abstract_or_native(&self) -> bool {
        self.access_flags & (ACC_ABSTRACT | ACC_NATIVE) != 0
    }

    /// Decoded `Code` attribute; `None` for abstract and native methods.
    pub fn code(&self, pool: &ConstantPool) -> Result<Option<CodeAttribute>> {
        self.attribute(pool, CODE)
            .map(|a| CodeAttribute::parse(&a.info))
            .transpose()
    }

    /// Internal names of the declared thrown types, in declaration order.
    pub fn exceptions(&self, pool: &ConstantPool) -> Result<Vec<String>> {
        let Some(attribute) = self.attribute(pool, EXCEPTIONS) else {
            return Ok(Vec::new());
        };
        parse_exceptions(&attribute.info)?
            .into_iter()
            .map(|index| pool.class_name(index))
            .collect()
    }
}

/// A parsed class file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    /// Zero only for `java/lang/Object`.
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    /// An empty class with the given names.
    pub fn new(this_class: &str, super_class: Option<&str>, access_flags: u16) -> Result<Self> {
        let mut constant_pool = ConstantPool::new();
        let this_index = constant_pool.add_class(this_class)?;
        let super_index = match super_class {
            Some(name) => constant_pool.add_class(name)?,
            None => 0,
        };
        Ok(Self {
            minor_version: 0,
            major_version: DEFAULT_MAJOR_VERSION,
            constant_pool,
            access_flags,
            this_class: this_index,
            super_class: super_index,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic(magic));
        }
        let minor_version = reader.u16()?;
        let major_version = reader.u16()?;
        let constant_pool = ConstantPool::read(&mut reader)?;
        let access_flags = reader.u16()?;
        let this_class = reader.u16()?;
        let super_class = reader.u16()?;
        let interface_count = reader.u16()?;
        let interfaces = (0..interface_count)
            .map(|_| reader.u16())
            .collect::<Result<Vec<_>>>()?;
        let field_count = reader.u16()?;
        let fields = (0..field_count)
            .map(|_| MemberInfo::read(&mut reader))
            .collect::<Result<Vec<_>>>()?;
        let method_count = reader.u16()?;
        let methods = (0..method_count)
            .map(|_| MemberInfo::read(&mut reader))
            .collect::<Result<Vec<_>>>()?;
        let attributes = read_attributes(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(ClassFileError::TrailingBytes {
                count: reader.remaining(),
            });
        }

        let class = Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        };
        class.class_name()?;
        Ok(class)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.put_u32(MAGIC);
        out.put_u16(self.minor_version);
        out.put_u16(self.major_version);
        self.constant_pool.write(&mut out);
        out.put_u16(self.access_flags);
        out.put_u16(self.this_class);
        out.put_u16(self.super_class);
        out.put_u16(count_u16("interface count", self.interfaces.len())?);
        for interface in &self.interfaces {
            out.put_u16(*interface);
        }
        out.put_u16(count_u16("field count", self.fields.len())?);
        for field in &self.fields {
            field.write(&mut out)?;
        }
        out.put_u16(count_u16("method count", self.methods.len())?);
        for method in &self.methods {
            method.write(&mut out)?;
        }
        write_attributes(&self.attributes, &mut out)?;
        Ok(out)
    }

    /// Internal name of this class.
    pub fn class_name(&self) -> Result<String> {
        self.constant_pool.class_name(self.this_class)
    }

    pub fn super_class_name(&self) -> Result<Option<String>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    /// Index of the first method, in declaration order, with exactly this name and descriptor.
    pub fn find_method(&self, name: &str, descriptor: &str) -> Result<Option<usize>> {
        for (index, method) in self.methods.iter().enumerate() {
            if method.name(&self.constant_pool)? == name
                && method.descriptor(&self.constant_pool)? == descriptor
            {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// `(name, descriptor)` of every method, in declaration order.
    pub fn method_signatures(&self) -> Result<Vec<(String, String)>> {
        self.methods
            .iter()
            .map(|m| {
                Ok((
                    m.name(&self.constant_pool)?,
                    m.descriptor(&self.constant_pool)?,
                ))
            })
            .collect()
    }

    /// Build a method entry with interned names and encoded `Code`/`Exceptions`
    /// attributes. The entry is not added to `methods`.
    pub fn build_method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        code: Option<CodeAttribute>,
        exceptions: &[&str],
    ) -> Result<MethodInfo> {
        let name_index = self.constant_pool.add_utf8(name)?;
        let descriptor_index = self.constant_pool.add_utf8(descriptor)?;
        let mut attributes = Vec::new();
        if let Some(code) = code {
            let attr_name = self.constant_pool.add_utf8(CODE)?;
            attributes.push(AttributeInfo::new(attr_name, code.to_bytes()?));
        }
        if !exceptions.is_empty() {
            let attr_name = self.constant_pool.add_utf8(EXCEPTIONS)?;
            let classes = exceptions
                .iter()
                .map(|class| self.constant_pool.add_class(class))
                .collect::<Result<Vec<_>>>()?;
            attributes.push(AttributeInfo::new(attr_name, encode_exceptions(&classes)?));
        }
        Ok(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    /// Append a method and return its index.
    pub fn add_method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        code: Option<CodeAttribute>,
        exceptions: &[&str],
    ) -> Result<usize> {
        let method = self.build_method(access_flags, name, descriptor, code, exceptions)?;
        self.methods.push(method);
        Ok(self.methods.len() - 1)
    }

    pub fn add_interface(&mut self, internal_name: &str) -> Result<()> {
        let index = self.constant_pool.add_class(internal_name)?;
        self.interfaces.push(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{ACC_PUBLIC, ACC_SUPER};

    fn sample() -> ClassFile {
        let mut class =
            ClassFile::new("a/Sample", Some("java/lang/Object"), ACC_PUBLIC | ACC_SUPER).unwrap();
        class.add_interface("java/lang/Runnable").unwrap();
        let code = CodeAttribute {
            max_stack: 0,
            max_locals: 1,
            code: vec![crate::opcodes::RETURN],
            exception_table: Vec::new(),
            attributes: Vec::new(),
        };
        class
            .add_method(ACC_PUBLIC, "run", "()V", Some(code), &["java/io/IOException"])
            .unwrap();
        class
    }

    #[test]
    fn test_roundtrip_is_byte_identical() {
        let bytes = sample().to_bytes().unwrap();
        let parsed = ClassFile::parse(&bytes).unwrap();
        assert_eq!(parsed, sample());
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_method_accessors() {
        let class = sample();
        let run = &class.methods[0];
        assert_eq!(run.name(&class.constant_pool).unwrap(), "run");
        assert_eq!(
            run.exceptions(&class.constant_pool).unwrap(),
            vec!["java/io/IOException".to_string()]
        );
        let code = run.code(&class.constant_pool).unwrap().unwrap();
        assert_eq!(code.code, vec![crate::opcodes::RETURN]);
        assert_eq!(class.super_class_name().unwrap().as_deref(), Some("java/lang/Object"));
        assert_eq!(class.find_method("run", "(I)V").unwrap(), None);
    }

    #[test]
    fn test_bad_magic_and_trailing_bytes() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes.push(0);
        assert_eq!(
            ClassFile::parse(&bytes).unwrap_err(),
            ClassFileError::TrailingBytes { count: 1 }
        );
        bytes[0] = 0;
        assert!(matches!(
            ClassFile::parse(&bytes).unwrap_err(),
            ClassFileError::BadMagic(_)
        ));
    }

    #[test]
    fn test_every_truncation_fails() {
        let bytes = sample().to_bytes().unwrap();
        for len in 0..bytes.len() {
            assert!(
                ClassFile::parse(&bytes[..len]).is_err(),
                "prefix of {} bytes parsed",
                len
            );
        }
    }
}
