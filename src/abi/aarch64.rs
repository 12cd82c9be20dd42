//! AArch64 AAPCS64 trampoline generator (Linux, macOS, Windows on arm64).

use super::asm_aarch64::{self as a64, Asm};
use super::{align_up, CodeGenerator};
use crate::error::GenError;
use crate::signature::Signature;
use crate::types::{AbiClass, TypeKind};

const INT_REGS: u32 = 8;
const FLOAT_REGS: u32 = 8;

#[derive(Clone, Copy)]
enum ArgLoc {
    Int(a64::Reg),
    Float(u32),
    IntPair(a64::Reg, a64::Reg),
    Stack(i32),
    StackPair(i32),
}

struct Classifier {
    next_int: u32,
    next_float: u32,
    next_stack: i32,
}

impl Classifier {
    fn classify_one(&mut self, ty: TypeKind) -> ArgLoc {
        match ty.abi_class().expect("non-void parameter") {
            AbiClass::Float => {
                if self.next_float < FLOAT_REGS {
                    let r = self.next_float;
                    self.next_float += 1;
                    ArgLoc::Float(r)
                } else {
                    let off = self.next_stack;
                    self.next_stack += 8;
                    ArgLoc::Stack(off)
                }
            }
            AbiClass::Integer => {
                if self.next_int < INT_REGS {
                    let r = self.next_int;
                    self.next_int += 1;
                    ArgLoc::Int(r)
                } else {
                    let off = self.next_stack;
                    self.next_stack += 8;
                    ArgLoc::Stack(off)
                }
            }
            AbiClass::IntegerPair => {
                if self.next_int + 1 < INT_REGS {
                    let lo = self.next_int;
                    let hi = self.next_int + 1;
                    self.next_int += 2;
                    ArgLoc::IntPair(lo, hi)
                } else {
                    let off = self.next_stack;
                    self.next_stack += 16;
                    ArgLoc::StackPair(off)
                }
            }
        }
    }
}

pub(crate) struct Aarch64;

impl CodeGenerator for Aarch64 {
    fn is_supported(_ty: TypeKind) -> bool {
        true
    }

    fn generate(sig: &Signature, out: &mut [u8]) -> Result<usize, GenError> {
        for &p in sig.params() {
            if p.abi_class().is_none() {
                return Err(GenError::Unsupported(p));
            }
        }

        let mut classifier = Classifier {
            next_int: 0,
            next_float: 0,
            next_stack: 0,
        };
        let locs: Vec<ArgLoc> = sig
            .params()
            .iter()
            .map(|&p| classifier.classify_one(p))
            .collect();
        let reservation = align_up(classifier.next_stack as usize, 16) as u32;

        let mut a = Asm::new();
        a.stp_preindex(a64::FP, a64::LR, a64::SP, -16);
        a.mov_reg_reg(a64::FP, a64::SP);
        a.stp_preindex(a64::ARGS_BASE, a64::RETURN_SLOT, a64::SP, -16);
        a.mov_reg_reg(a64::ARGS_BASE, 0); // entry x0 = args_base
        a.mov_reg_reg(a64::RETURN_SLOT, 2); // entry x2 = return_slot
        a.sub_imm(a64::SP, a64::SP, reservation);

        for (i, (&ty, &loc)) in sig.params().iter().zip(locs.iter()).enumerate() {
            a.load_gpr(a64::PTR_SCRATCH, a64::ARGS_BASE, (i as i32) * 8, 8, false);
            let width = ty.byte_width() as u8;
            let signed = matches!(ty.extension(), crate::types::Extension::Sign);
            match (ty.abi_class().unwrap(), loc) {
                (AbiClass::Float, ArgLoc::Float(v)) => {
                    a.load_fpr(v, a64::PTR_SCRATCH, 0, width == 8);
                }
                (AbiClass::Float, ArgLoc::Stack(off)) => {
                    a.load_fpr(a64::FLOAT_SCRATCH, a64::PTR_SCRATCH, 0, width == 8);
                    a.store_fpr(a64::FLOAT_SCRATCH, a64::SP, off, width == 8);
                }
                (AbiClass::Integer, ArgLoc::Int(r)) => {
                    a.load_gpr(r, a64::PTR_SCRATCH, 0, width, signed);
                }
                (AbiClass::Integer, ArgLoc::Stack(off)) => {
                    a.load_gpr(a64::VAL_SCRATCH, a64::PTR_SCRATCH, 0, width, signed);
                    a.store_gpr(a64::VAL_SCRATCH, a64::SP, off, 8);
                }
                (AbiClass::IntegerPair, ArgLoc::IntPair(lo, hi)) => {
                    a.load_gpr(lo, a64::PTR_SCRATCH, 0, 8, false);
                    a.load_gpr(hi, a64::PTR_SCRATCH, 8, 8, false);
                }
                (AbiClass::IntegerPair, ArgLoc::StackPair(off)) => {
                    a.load_gpr(a64::VAL_SCRATCH, a64::PTR_SCRATCH, 0, 8, false);
                    a.store_gpr(a64::VAL_SCRATCH, a64::SP, off, 8);
                    a.load_gpr(a64::VAL_SCRATCH, a64::PTR_SCRATCH, 8, 8, false);
                    a.store_gpr(a64::VAL_SCRATCH, a64::SP, off + 8, 8);
                }
                _ => unreachable!("classifier and class must agree"),
            }
        }

        a.mov_imm64(a64::CALL_TARGET, sig.target() as u64);
        a.blr(a64::CALL_TARGET);

        match sig.return_type() {
            TypeKind::Void => {}
            TypeKind::F32 | TypeKind::F64 => {
                a.store_fpr(0, a64::RETURN_SLOT, 0, sig.return_type().byte_width() == 8);
            }
            TypeKind::I128 | TypeKind::U128 => {
                a.store_gpr(0, a64::RETURN_SLOT, 0, 8);
                a.store_gpr(1, a64::RETURN_SLOT, 8, 8);
            }
            ty => {
                a.store_gpr(0, a64::RETURN_SLOT, 0, ty.byte_width() as u8);
            }
        }

        a.add_imm(a64::SP, a64::SP, reservation);
        a.ldp_postindex(a64::ARGS_BASE, a64::RETURN_SLOT, a64::SP, 16);
        a.ldp_postindex(a64::FP, a64::LR, a64::SP, 16);
        a.ret();

        if a.buf.len() > out.len() {
            return Err(GenError::Overflow {
                needed: a.buf.len(),
            });
        }
        out[..a.buf.len()].copy_from_slice(&a.buf);
        Ok(a.buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    #[test]
    fn nine_floats_spill_one_to_stack() {
        let sig = Signature::new(
            "sum9f",
            std::ptr::null(),
            vec![TypeKind::F64; 9],
            TypeKind::F64,
        )
        .unwrap();
        let mut buf = [0u8; 512];
        let n = Aarch64::generate(&sig, &mut buf).expect("encodes");
        assert!(n > 0 && n % 4 == 0, "aarch64 instructions are 4 bytes");
    }

    #[test]
    fn i128_param_and_return_round_trip_registers() {
        let sig = Signature::new(
            "wide",
            std::ptr::null(),
            vec![TypeKind::I128, TypeKind::I32],
            TypeKind::U128,
        )
        .unwrap();
        let mut buf = [0u8; 512];
        let n = Aarch64::generate(&sig, &mut buf).expect("encodes");
        assert!(n > 0);
    }
}
