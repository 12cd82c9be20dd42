//! System V AMD64 trampoline generator (Linux, macOS, BSD on x86-64).

use super::asm_x64::{RCX, RDI, RDX, RSI, XMM_SCRATCH_SYSV, R8, R9};
use super::x64_common::{self, X64Conv};
use super::CodeGenerator;
use crate::error::GenError;
use crate::signature::Signature;
use crate::types::TypeKind;

const CONV: X64Conv = X64Conv {
    int_regs: &[RDI, RSI, RDX, RCX, R8, R9],
    float_reg_count: 8,
    shared_counter: false,
    shadow_space: 0,
    hidden_pointer_i128_return: false,
    set_al_for_varargs: true,
    entry_args_base: RDI,
    entry_return_slot: RDX,
    float_spill_scratch: XMM_SCRATCH_SYSV,
};

pub(crate) struct SysV;

impl CodeGenerator for SysV {
    fn is_supported(ty: TypeKind) -> bool {
        x64_common::is_supported(ty)
    }

    fn generate(sig: &Signature, out: &mut [u8]) -> Result<usize, GenError> {
        x64_common::generate(&CONV, sig, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    #[test]
    fn empty_void_signature_encodes_something() {
        let sig = Signature::new("noop", std::ptr::null(), vec![], TypeKind::Void).unwrap();
        let mut buf = [0u8; 256];
        let n = SysV::generate(&sig, &mut buf).expect("encodes");
        assert!(n > 0);
        // prologue marker
        assert_eq!(&buf[..4], &[0xF3, 0x0F, 0x1E, 0xFA]);
        assert_eq!(buf[n - 1], 0xC3, "ends in ret");
    }

    #[test]
    fn eight_integers_spill_to_stack() {
        let sig = Signature::new(
            "sum8",
            std::ptr::null(),
            vec![TypeKind::I64; 8],
            TypeKind::I64,
        )
        .unwrap();
        let mut buf = [0u8; 512];
        let n = SysV::generate(&sig, &mut buf).expect("encodes");
        assert!(n > 0);
    }
}
