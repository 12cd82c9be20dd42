//! Shared marshalling logic for the two x86-64 ABIs. SysV and Win64 differ
//! only in their register lists, shadow space, whether integer and float
//! arguments share one positional counter, and how a 128-bit return value
//! escapes the register file; everything else about the generated
//! trampoline — prologue, per-argument load/store sequence, call, epilogue
//! — is identical, so it lives here once.

use super::asm_x64::{self as x, Asm, Ext, Width};
use crate::error::GenError;
use crate::signature::Signature;
use crate::types::{AbiClass, TypeKind};

pub(crate) struct X64Conv {
    pub(crate) int_regs: &'static [x::Reg],
    pub(crate) float_reg_count: u8,
    pub(crate) shared_counter: bool,
    pub(crate) shadow_space: i32,
    pub(crate) hidden_pointer_i128_return: bool,
    pub(crate) set_al_for_varargs: bool,
    pub(crate) entry_args_base: x::Reg,
    pub(crate) entry_return_slot: x::Reg,
    /// A volatile XMM register never assigned to an argument under this
    /// convention, used as a transient holder when spilling a float
    /// argument to the stack.
    pub(crate) float_spill_scratch: u8,
}

#[derive(Clone, Copy)]
enum ArgLoc {
    Int(x::Reg),
    Float(u8),
    IntPair(x::Reg, x::Reg),
    Stack(i32),
    StackPair(i32),
}

struct Classifier<'a> {
    conv: &'a X64Conv,
    next_int: usize,
    next_float: usize,
    next_stack: i32,
}

impl<'a> Classifier<'a> {
    fn new(conv: &'a X64Conv) -> Self {
        Classifier {
            conv,
            next_int: 0,
            next_float: 0,
            next_stack: 0,
        }
    }

    fn remaining_int(&self) -> usize {
        self.conv.int_regs.len().saturating_sub(self.next_int)
    }

    fn take_stack(&mut self, bytes: i32) -> i32 {
        let off = self.next_stack;
        self.next_stack += bytes;
        off
    }

    fn classify_one(&mut self, ty: TypeKind) -> ArgLoc {
        match ty.abi_class().expect("non-void parameter") {
            AbiClass::Float => {
                if self.conv.shared_counter {
                    let pos = self.next_int.max(self.next_float);
                    if (pos as u8) < self.conv.float_reg_count {
                        self.next_int = pos + 1;
                        self.next_float = pos + 1;
                        return ArgLoc::Float(pos as u8);
                    }
                } else if self.next_float < self.conv.float_reg_count as usize {
                    let r = self.next_float as u8;
                    self.next_float += 1;
                    return ArgLoc::Float(r);
                }
                ArgLoc::Stack(self.take_stack(8))
            }
            AbiClass::Integer => {
                let pos = if self.conv.shared_counter {
                    self.next_int.max(self.next_float)
                } else {
                    self.next_int
                };
                if pos < self.conv.int_regs.len() {
                    self.next_int = pos + 1;
                    if self.conv.shared_counter {
                        self.next_float = pos + 1;
                    }
                    return ArgLoc::Int(self.conv.int_regs[pos]);
                }
                ArgLoc::Stack(self.take_stack(8))
            }
            AbiClass::IntegerPair => {
                let pos = if self.conv.shared_counter {
                    self.next_int.max(self.next_float)
                } else {
                    self.next_int
                };
                if pos + 1 < self.conv.int_regs.len() {
                    self.next_int = pos + 2;
                    if self.conv.shared_counter {
                        self.next_float = pos + 2;
                    }
                    return ArgLoc::IntPair(self.conv.int_regs[pos], self.conv.int_regs[pos + 1]);
                }
                ArgLoc::StackPair(self.take_stack(16))
            }
        }
    }
}

pub(crate) fn is_supported(_ty: TypeKind) -> bool {
    true
}

pub(crate) fn generate(
    conv: &X64Conv,
    sig: &Signature,
    out: &mut [u8],
) -> Result<usize, GenError> {
    for &p in sig.params() {
        if p.abi_class().is_none() {
            return Err(GenError::Unsupported(p));
        }
    }

    let hidden_ptr_return = conv.hidden_pointer_i128_return
        && matches!(sig.return_type(), TypeKind::I128 | TypeKind::U128);

    let mut classifier = Classifier::new(conv);
    if hidden_ptr_return {
        // The implicit return pointer occupies the first integer/position
        // slot; every real argument is classified starting from the next.
        classifier.next_int = 1;
        if conv.shared_counter {
            classifier.next_float = 1;
        }
    }
    let locs: Vec<ArgLoc> = sig.params().iter().map(|&p| classifier.classify_one(p)).collect();
    let stack_bytes = classifier.next_stack;

    let reservation = super::align_up((conv.shadow_space + stack_bytes) as usize, 16) as i32;

    let mut a = Asm::new();
    a.endbr64();
    a.push_reg(x::RBP);
    a.mov_reg_reg(x::RBP, x::RSP);
    a.push_reg(x::ARGS_BASE);
    a.push_reg(x::RETURN_SLOT);
    a.mov_reg_reg(x::ARGS_BASE, conv.entry_args_base);
    a.mov_reg_reg(x::RETURN_SLOT, conv.entry_return_slot);
    a.sub_rsp_imm32(reservation);

    if hidden_ptr_return {
        a.mov_reg_reg(conv.int_regs[0], x::RETURN_SLOT);
    }

    for (i, (&ty, &loc)) in sig.params().iter().zip(locs.iter()).enumerate() {
        let disp = (i as i32) * 8;
        a.mov_reg_mem64(x::PTR_SCRATCH, x::ARGS_BASE, disp);
        match (ty.abi_class().unwrap(), loc) {
            (AbiClass::Float, ArgLoc::Float(xmm)) => {
                a.load_float(xmm, x::PTR_SCRATCH, ty.byte_width() == 8);
            }
            (AbiClass::Float, ArgLoc::Stack(off)) => {
                let scratch = conv.float_spill_scratch;
                a.load_float(scratch, x::PTR_SCRATCH, ty.byte_width() == 8);
                a.store_float(x::RSP, conv.shadow_space + off, scratch, ty.byte_width() == 8);
            }
            (AbiClass::Integer, ArgLoc::Int(r)) => {
                a.load_value(r, x::PTR_SCRATCH, width_of(ty), ext_of(ty));
            }
            (AbiClass::Integer, ArgLoc::Stack(off)) => {
                a.load_value(x::VAL_SCRATCH, x::PTR_SCRATCH, width_of(ty), ext_of(ty));
                a.store_value(x::RSP, conv.shadow_space + off, x::VAL_SCRATCH, Width::B8);
            }
            (AbiClass::IntegerPair, ArgLoc::IntPair(lo, hi)) => {
                a.load_value(lo, x::PTR_SCRATCH, Width::B8, Ext::None);
                a.mov_reg_mem64(hi, x::PTR_SCRATCH, 8);
            }
            (AbiClass::IntegerPair, ArgLoc::StackPair(off)) => {
                a.load_value(x::VAL_SCRATCH, x::PTR_SCRATCH, Width::B8, Ext::None);
                a.store_value(x::RSP, conv.shadow_space + off, x::VAL_SCRATCH, Width::B8);
                a.mov_reg_mem64(x::VAL_SCRATCH, x::PTR_SCRATCH, 8);
                a.store_value(
                    x::RSP,
                    conv.shadow_space + off + 8,
                    x::VAL_SCRATCH,
                    Width::B8,
                );
            }
            _ => unreachable!("classifier and class must agree"),
        }
    }

    if conv.set_al_for_varargs {
        a.mov_al_imm8(0);
    }

    a.mov_reg_imm64(x::CALL_TARGET, sig.target() as u64);
    a.call_reg(x::CALL_TARGET);

    if !hidden_ptr_return {
        match sig.return_type() {
            TypeKind::Void => {}
            TypeKind::F32 | TypeKind::F64 => {
                a.store_float(x::RETURN_SLOT, 0, 0, sig.return_type().byte_width() == 8);
            }
            TypeKind::I128 | TypeKind::U128 => {
                a.mov_mem64_reg(x::RETURN_SLOT, 0, x::RAX);
                a.mov_mem64_reg(x::RETURN_SLOT, 8, x::RDX);
            }
            ty => {
                a.store_value(x::RETURN_SLOT, 0, x::RAX, width_of(ty));
            }
        }
    }

    a.add_rsp_imm32(reservation);
    a.pop_reg(x::RETURN_SLOT);
    a.pop_reg(x::ARGS_BASE);
    a.pop_reg(x::RBP);
    a.ret();

    if a.buf.len() > out.len() {
        return Err(GenError::Overflow {
            needed: a.buf.len(),
        });
    }
    out[..a.buf.len()].copy_from_slice(&a.buf);
    Ok(a.buf.len())
}

fn width_of(ty: TypeKind) -> Width {
    super::asm_x64::width_of(ty)
}

fn ext_of(ty: TypeKind) -> Ext {
    super::asm_x64::ext_of(ty)
}
