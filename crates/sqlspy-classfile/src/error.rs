//! Errors raised while decoding, editing or encoding class files.

/// Structured class file errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassFileError {
    /// Input ended before a structure was complete.
    UnexpectedEof {
        /// Byte offset at which the read was attempted
        offset: usize,
        /// Number of bytes the read needed
        needed: usize,
    },

    /// The first four bytes are not `0xCAFEBABE`.
    BadMagic(u32),

    /// Bytes remain after the last class attribute.
    TrailingBytes { count: usize },

    /// A constant pool entry carries a tag this codec does not know.
    UnknownConstantTag { tag: u8, index: u16 },

    /// A constant pool index is out of range, unusable, or of the wrong kind.
    BadConstantIndex {
        index: u16,
        /// What the referencing structure expected to find there
        expected: &'static str,
    },

    /// A `CONSTANT_Utf8` entry is not valid modified UTF-8.
    InvalidUtf8 { index: u16 },

    /// Adding an entry would exceed the 65535 slot limit.
    ConstantPoolOverflow,

    /// A field or method descriptor could not be parsed.
    InvalidDescriptor(String),

    /// An attribute body does not match its declared layout.
    MalformedAttribute {
        name: &'static str,
        reason: String,
    },

    /// Assembled code popped more operand stack slots than were pushed.
    StackUnderflow {
        /// Instruction offset within the method body
        offset: usize,
        needed: u16,
        available: u16,
    },

    /// A method body or table exceeds the format's size limits.
    TooLarge { what: &'static str, size: usize },
}

impl std::fmt::Display for ClassFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassFileError::UnexpectedEof { offset, needed } => write!(
                f,
                "unexpected end of class file at offset {} (needed {} more bytes)",
                offset, needed
            ),
            ClassFileError::BadMagic(magic) => {
                write!(f, "not a class file: magic 0x{:08X}", magic)
            }
            ClassFileError::TrailingBytes { count } => {
                write!(f, "{} trailing bytes after class file", count)
            }
            ClassFileError::UnknownConstantTag { tag, index } => {
                write!(f, "unknown constant pool tag {} at index {}", tag, index)
            }
            ClassFileError::BadConstantIndex { index, expected } => {
                write!(f, "constant pool index {} is not a valid {}", index, expected)
            }
            ClassFileError::InvalidUtf8 { index } => {
                write!(f, "constant pool entry {} is not valid modified UTF-8", index)
            }
            ClassFileError::ConstantPoolOverflow => {
                write!(f, "constant pool would exceed 65535 entries")
            }
            ClassFileError::InvalidDescriptor(descriptor) => {
                write!(f, "invalid descriptor '{}'", descriptor)
            }
            ClassFileError::MalformedAttribute { name, reason } => {
                write!(f, "malformed {} attribute: {}", name, reason)
            }
            ClassFileError::StackUnderflow {
                offset,
                needed,
                available,
            } => write!(
                f,
                "operand stack underflow at instruction {}: needs {} slots, {} available",
                offset, needed, available
            ),
            ClassFileError::TooLarge { what, size } => {
                write!(f, "{} too large ({})", what, size)
            }
        }
    }
}

impl std::error::Error for ClassFileError {}

pub type Result<T> = std::result::Result<T, ClassFileError>;
