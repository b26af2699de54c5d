//! Field and method descriptors.
//!
//! ```
//! use sqlspy_classfile::descriptor::{FieldType, MethodDescriptor};
//!
//! let desc = MethodDescriptor::parse("(Ljava/lang/String;II)Ljava/sql/PreparedStatement;").unwrap();
//! assert_eq!(desc.params.len(), 3);
//! assert_eq!(desc.params[0], FieldType::object("java/lang/String"));
//! assert_eq!(desc.param_slots(), 3);
//! assert_eq!(desc.to_string(), "(Ljava/lang/String;II)Ljava/sql/PreparedStatement;");
//! ```

use std::fmt;

use crate::error::{ClassFileError, Result};
use crate::opcodes;

/// The type of a field, parameter, local or return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    /// A class or interface, by internal name.
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn object(internal_name: impl Into<String>) -> Self {
        FieldType::Object(internal_name.into())
    }

    pub fn parse(descriptor: &str) -> Result<Self> {
        let (ty, rest) = parse_field(descriptor).ok_or_else(|| invalid(descriptor))?;
        if !rest.is_empty() {
            return Err(invalid(descriptor));
        }
        Ok(ty)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldType::Object(_) | FieldType::Array(_))
    }

    /// Local variable and operand stack slots a value of this type occupies.
    pub fn slots(&self) -> u16 {
        match self {
            FieldType::Long | FieldType::Double => 2,
            _ => 1,
        }
    }

    /// Family opcodes for this type: `(load, store, return)`.
    pub(crate) fn opcode_family(&self) -> (u8, u8, u8) {
        match self {
            FieldType::Long => (opcodes::LLOAD, opcodes::LSTORE, opcodes::LRETURN),
            FieldType::Float => (opcodes::FLOAD, opcodes::FSTORE, opcodes::FRETURN),
            FieldType::Double => (opcodes::DLOAD, opcodes::DSTORE, opcodes::DRETURN),
            FieldType::Object(_) | FieldType::Array(_) => {
                (opcodes::ALOAD, opcodes::ASTORE, opcodes::ARETURN)
            }
            _ => (opcodes::ILOAD, opcodes::ISTORE, opcodes::IRETURN),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Byte => f.write_str("B"),
            FieldType::Char => f.write_str("C"),
            FieldType::Double => f.write_str("D"),
            FieldType::Float => f.write_str("F"),
            FieldType::Int => f.write_str("I"),
            FieldType::Long => f.write_str("J"),
            FieldType::Short => f.write_str("S"),
            FieldType::Boolean => f.write_str("Z"),
            FieldType::Object(name) => write!(f, "L{};", name),
            FieldType::Array(inner) => write!(f, "[{}", inner),
        }
    }
}

/// A parsed method descriptor. `ret` is `None` for `void`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub ret: Option<FieldType>,
}

impl MethodDescriptor {
    pub fn new(params: Vec<FieldType>, ret: Option<FieldType>) -> Self {
        Self { params, ret }
    }

    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut rest = descriptor
            .strip_prefix('(')
            .ok_or_else(|| invalid(descriptor))?;
        let mut params = Vec::new();
        while !rest.starts_with(')') {
            let (ty, tail) = parse_field(rest).ok_or_else(|| invalid(descriptor))?;
            params.push(ty);
            rest = tail;
        }
        let rest = &rest[1..];
        let ret = if rest == "V" {
            None
        } else {
            Some(FieldType::parse(rest).map_err(|_| invalid(descriptor))?)
        };
        Ok(Self { params, ret })
    }

    /// Local slots taken by the parameters, excluding any receiver.
    pub fn param_slots(&self) -> u16 {
        self.params.iter().map(FieldType::slots).sum()
    }

    pub fn return_slots(&self) -> u16 {
        self.ret.as_ref().map(FieldType::slots).unwrap_or(0)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for param in &self.params {
            write!(f, "{}", param)?;
        }
        f.write_str(")")?;
        match &self.ret {
            Some(ret) => write!(f, "{}", ret),
            None => f.write_str("V"),
        }
    }
}

fn invalid(descriptor: &str) -> ClassFileError {
    ClassFileError::InvalidDescriptor(descriptor.to_string())
}

fn parse_field(input: &str) -> Option<(FieldType, &str)> {
    let mut chars = input.chars();
    let ty = match chars.next()? {
        'B' => FieldType::Byte,
        'C' => FieldType::Char,
        'D' => FieldType::Double,
        'F' => FieldType::Float,
        'I' => FieldType::Int,
        'J' => FieldType::Long,
        'S' => FieldType::Short,
        'Z' => FieldType::Boolean,
        'L' => {
            let end = input.find(';')?;
            let name = &input[1..end];
            if name.is_empty() || name.contains(['.', '[', '(', ')']) {
                return None;
            }
            return Some((FieldType::Object(name.to_string()), &input[end + 1..]));
        }
        '[' => {
            let (inner, rest) = parse_field(&input[1..])?;
            return Some((FieldType::Array(Box::new(inner)), rest));
        }
        _ => return None,
    };
    Some((ty, chars.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives_and_wide_slots() {
        let desc = MethodDescriptor::parse("(JDIZ[J)V").unwrap();
        assert_eq!(
            desc.params,
            vec![
                FieldType::Long,
                FieldType::Double,
                FieldType::Int,
                FieldType::Boolean,
                FieldType::Array(Box::new(FieldType::Long)),
            ]
        );
        assert_eq!(desc.ret, None);
        assert_eq!(desc.param_slots(), 2 + 2 + 1 + 1 + 1);
        assert_eq!(desc.return_slots(), 0);
    }

    #[test]
    fn test_parse_references() {
        let desc = MethodDescriptor::parse("([Ljava/lang/String;)[[I").unwrap();
        assert_eq!(
            desc.params,
            vec![FieldType::Array(Box::new(FieldType::object("java/lang/String")))]
        );
        assert!(desc.ret.as_ref().unwrap().is_reference());
        assert_eq!(desc.to_string(), "([Ljava/lang/String;)[[I");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "I",
            "(I",
            "(I)",
            "(Q)V",
            "(Ljava/lang/String)V",
            "(L;)V",
            "(Ljava.lang.String;)V",
            "()VV",
            "()[V",
        ] {
            assert!(MethodDescriptor::parse(bad).is_err(), "{:?} should fail", bad);
        }
    }

    #[test]
    fn test_field_type_parse_requires_exact_input() {
        assert_eq!(FieldType::parse("J").unwrap(), FieldType::Long);
        assert!(FieldType::parse("JI").is_err());
        assert!(FieldType::parse("V").is_err());
    }
}
