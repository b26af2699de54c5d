//! Straight-line instruction builder with automatic stack and local bookkeeping.
//!
//! Every emit updates the current operand stack depth (in slots, so `long`
//! and `double` count twice) and records the high-water marks that become
//! `max_stack` and `max_locals`. The builder has no branches, so a single
//! running depth is exact.

use crate::attributes::{CodeAttribute, MAX_CODE_LENGTH};
use crate::descriptor::{FieldType, MethodDescriptor};
use crate::error::{ClassFileError, Result};
use crate::opcodes;
use crate::reader::ByteWriter;

/// Which `invoke*` instruction to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

impl InvokeKind {
    pub fn opcode(self) -> u8 {
        match self {
            InvokeKind::Virtual => opcodes::INVOKEVIRTUAL,
            InvokeKind::Special => opcodes::INVOKESPECIAL,
            InvokeKind::Static => opcodes::INVOKESTATIC,
            InvokeKind::Interface => opcodes::INVOKEINTERFACE,
        }
    }

    pub fn has_receiver(self) -> bool {
        self != InvokeKind::Static
    }
}

#[derive(Debug, Default)]
pub struct CodeBuilder {
    code: Vec<u8>,
    depth: u16,
    max_stack: u16,
    next_local: u16,
    max_locals: u16,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder whose locals already hold the receiver (unless static) and parameters.
    pub fn for_method(is_static: bool, descriptor: &MethodDescriptor) -> Self {
        let receiver = if is_static { 0 } else { 1 };
        let slots = receiver + descriptor.param_slots();
        Self {
            next_local: slots,
            max_locals: slots,
            ..Self::default()
        }
    }

    /// Local slot of each parameter, in declaration order.
    pub fn parameter_slots(is_static: bool, descriptor: &MethodDescriptor) -> Vec<u16> {
        let mut slot = if is_static { 0 } else { 1 };
        descriptor
            .params
            .iter()
            .map(|ty| {
                let this = slot;
                slot += ty.slots();
                this
            })
            .collect()
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    pub fn max_stack(&self) -> u16 {
        self.max_stack
    }

    pub fn max_locals(&self) -> u16 {
        self.max_locals
    }

    /// Reserve the next free local slot(s) for a value of `ty`.
    pub fn declare_local(&mut self, ty: &FieldType) -> Result<u16> {
        let slot = self.next_local;
        self.next_local = slot
            .checked_add(ty.slots())
            .ok_or(ClassFileError::TooLarge {
                what: "local variable table",
                size: slot as usize + ty.slots() as usize,
            })?;
        self.max_locals = self.max_locals.max(self.next_local);
        Ok(slot)
    }

    fn pop(&mut self, slots: u16) -> Result<()> {
        if self.depth < slots {
            return Err(ClassFileError::StackUnderflow {
                offset: self.code.len(),
                needed: slots,
                available: self.depth,
            });
        }
        self.depth -= slots;
        Ok(())
    }

    fn push(&mut self, slots: u16) -> Result<()> {
        self.depth = self
            .depth
            .checked_add(slots)
            .ok_or(ClassFileError::TooLarge {
                what: "operand stack",
                size: self.depth as usize + slots as usize,
            })?;
        self.max_stack = self.max_stack.max(self.depth);
        Ok(())
    }

    fn touch_local(&mut self, slot: u16, ty: &FieldType) {
        let end = slot.saturating_add(ty.slots());
        self.max_locals = self.max_locals.max(end);
        self.next_local = self.next_local.max(end);
    }

    fn emit_local_op(&mut self, op: u8, slot: u16) {
        if let Some(short) = opcodes::short_form(op, slot) {
            self.code.put_u8(short);
        } else if slot <= u8::MAX as u16 {
            self.code.put_u8(op);
            self.code.put_u8(slot as u8);
        } else {
            self.code.put_u8(opcodes::WIDE);
            self.code.put_u8(op);
            self.code.put_u16(slot);
        }
    }

    pub fn load_local(&mut self, slot: u16, ty: &FieldType) -> Result<&mut Self> {
        let (load, _, _) = ty.opcode_family();
        self.push(ty.slots())?;
        self.emit_local_op(load, slot);
        self.touch_local(slot, ty);
        Ok(self)
    }

    pub fn store_local(&mut self, slot: u16, ty: &FieldType) -> Result<&mut Self> {
        let (_, store, _) = ty.opcode_family();
        self.pop(ty.slots())?;
        self.emit_local_op(store, slot);
        self.touch_local(slot, ty);
        Ok(self)
    }

    pub fn aconst_null(&mut self) -> Result<&mut Self> {
        self.push(1)?;
        self.code.put_u8(opcodes::ACONST_NULL);
        Ok(self)
    }

    /// `new` with a `CONSTANT_Class` index.
    pub fn new_object(&mut self, class_index: u16) -> Result<&mut Self> {
        self.push(1)?;
        self.code.put_u8(opcodes::NEW);
        self.code.put_u16(class_index);
        Ok(self)
    }

    pub fn dup(&mut self) -> Result<&mut Self> {
        self.pop(1)?;
        self.push(2)?;
        self.code.put_u8(opcodes::DUP);
        Ok(self)
    }

    pub fn pop_value(&mut self) -> Result<&mut Self> {
        self.pop(1)?;
        self.code.put_u8(opcodes::POP);
        Ok(self)
    }

    /// Invoke a method through a `Methodref`/`InterfaceMethodref` index.
    pub fn invoke(
        &mut self,
        kind: InvokeKind,
        method_ref_index: u16,
        descriptor: &MethodDescriptor,
    ) -> Result<&mut Self> {
        let args = descriptor.param_slots() + u16::from(kind.has_receiver());
        self.pop(args)?;
        self.code.put_u8(kind.opcode());
        self.code.put_u16(method_ref_index);
        if kind == InvokeKind::Interface {
            let count = u8::try_from(args).map_err(|_| ClassFileError::TooLarge {
                what: "interface call arguments",
                size: args as usize,
            })?;
            self.code.put_u8(count);
            self.code.put_u8(0);
        }
        self.push(descriptor.return_slots())?;
        Ok(self)
    }

    /// Return a value of `ty`, or `void` for `None`.
    pub fn return_value(&mut self, ty: Option<&FieldType>) -> Result<&mut Self> {
        match ty {
            Some(ty) => {
                let (_, _, ret) = ty.opcode_family();
                self.pop(ty.slots())?;
                self.code.put_u8(ret);
            }
            None => self.code.put_u8(opcodes::RETURN),
        }
        Ok(self)
    }

    pub fn finish(self) -> Result<CodeAttribute> {
        if self.code.is_empty() || self.code.len() > MAX_CODE_LENGTH {
            return Err(ClassFileError::TooLarge {
                what: "method body",
                size: self.code.len(),
            });
        }
        Ok(CodeAttribute {
            max_stack: self.max_stack,
            max_locals: self.max_locals,
            code: self.code,
            exception_table: Vec::new(),
            attributes: Vec::new(),
        })
    }
}
