//! JVM class file model for the sqlspy rewriter.
//!
//! - [`class_file::ClassFile`]: parse and serialize; unedited input round-trips byte for byte
//! - [`constant_pool::ConstantPool`]: lookups and interning additions
//! - [`descriptor`]: field and method descriptor types
//! - [`assembler::CodeBuilder`]: straight-line code with computed `max_stack`/`max_locals`

pub mod access;
pub mod assembler;
pub mod attributes;
pub mod class_file;
pub mod constant_pool;
pub mod descriptor;
pub mod error;
pub mod mutf8;
pub mod opcodes;
mod reader;

pub use assembler::{CodeBuilder, InvokeKind};
pub use attributes::{AttributeInfo, CodeAttribute};
pub use class_file::{ClassFile, MemberInfo, MethodInfo};
pub use constant_pool::{Constant, ConstantPool, MemberRef};
pub use descriptor::{FieldType, MethodDescriptor};
pub use error::{ClassFileError, Result};
