//! Microsoft x64 trampoline generator (Windows on x86-64).

use super::asm_x64::{RCX, RDX, XMM_SCRATCH_WIN64, R8, R9};
use super::x64_common::{self, X64Conv};
use super::CodeGenerator;
use crate::error::GenError;
use crate::signature::Signature;
use crate::types::TypeKind;

const CONV: X64Conv = X64Conv {
    int_regs: &[RCX, RDX, R8, R9],
    float_reg_count: 4,
    shared_counter: true,
    shadow_space: 32,
    hidden_pointer_i128_return: true,
    set_al_for_varargs: false,
    entry_args_base: RCX,
    entry_return_slot: R8,
    float_spill_scratch: XMM_SCRATCH_WIN64,
};

pub(crate) struct Win64;

impl CodeGenerator for Win64 {
    fn is_supported(ty: TypeKind) -> bool {
        x64_common::is_supported(ty)
    }

    fn generate(sig: &Signature, out: &mut [u8]) -> Result<usize, GenError> {
        x64_common::generate(&CONV, sig, out)
    }
}
