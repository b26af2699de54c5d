//! The subset of JVM opcodes the assembler emits.

pub const ACONST_NULL: u8 = 0x01;
pub const ILOAD: u8 = 0x15;
pub const LLOAD: u8 = 0x16;
pub const FLOAD: u8 = 0x17;
pub const DLOAD: u8 = 0x18;
pub const ALOAD: u8 = 0x19;
pub const ILOAD_0: u8 = 0x1a;
pub const LLOAD_0: u8 = 0x1e;
pub const FLOAD_0: u8 = 0x22;
pub const DLOAD_0: u8 = 0x26;
pub const ALOAD_0: u8 = 0x2a;
pub const ISTORE: u8 = 0x36;
pub const LSTORE: u8 = 0x37;
pub const FSTORE: u8 = 0x38;
pub const DSTORE: u8 = 0x39;
pub const ASTORE: u8 = 0x3a;
pub const ISTORE_0: u8 = 0x3b;
pub const LSTORE_0: u8 = 0x3f;
pub const FSTORE_0: u8 = 0x43;
pub const DSTORE_0: u8 = 0x47;
pub const ASTORE_0: u8 = 0x4b;
pub const POP: u8 = 0x57;
pub const DUP: u8 = 0x59;
pub const IRETURN: u8 = 0xac;
pub const LRETURN: u8 = 0xad;
pub const FRETURN: u8 = 0xae;
pub const DRETURN: u8 = 0xaf;
pub const ARETURN: u8 = 0xb0;
pub const RETURN: u8 = 0xb1;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const NEW: u8 = 0xbb;
pub const WIDE: u8 = 0xc4;

/// Short form (`xload_<n>`/`xstore_<n>`) for a family opcode and slot, if one exists.
pub(crate) fn short_form(op: u8, slot: u16) -> Option<u8> {
    if slot > 3 {
        return None;
    }
    let base = match op {
        ILOAD => ILOAD_0,
        LLOAD => LLOAD_0,
        FLOAD => FLOAD_0,
        DLOAD => DLOAD_0,
        ALOAD => ALOAD_0,
        ISTORE => ISTORE_0,
        LSTORE => LSTORE_0,
        FSTORE => FSTORE_0,
        DSTORE => DSTORE_0,
        ASTORE => ASTORE_0,
        _ => return None,
    };
    Some(base + slot as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_forms() {
        assert_eq!(short_form(ALOAD, 0), Some(0x2a));
        assert_eq!(short_form(ALOAD, 3), Some(0x2d));
        assert_eq!(short_form(LSTORE, 2), Some(0x41));
        assert_eq!(short_form(ILOAD, 4), None);
        assert_eq!(short_form(NEW, 0), None);
    }
}
