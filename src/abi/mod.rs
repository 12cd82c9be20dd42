//! Per-architecture trampoline code generators.
//!
//! Each generator turns a [`crate::Signature`] into a sequence of machine
//! instructions that: load the three entry values (argument vector, argument
//! count, return slot) into callee-saved scratch registers, marshal each
//! argument from its type-erased slot into the position its ABI assigns it,
//! call the target function, and store the return value into the return
//! slot. The differences between ABIs are entirely in register choice,
//! stack layout, and a handful of calling-convention quirks (Win64's shared
//! int/float position counter and hidden-pointer aggregate return); the
//! shape of the generated trampoline is the same everywhere.

mod aarch64;
mod asm_aarch64;
mod asm_x64;
mod sysv;
mod win64;
mod x64_common;

use crate::error::GenError;
use crate::signature::Signature;

/// Produces trampoline machine code for one target ABI.
pub(crate) trait CodeGenerator {
    /// Whether this ABI can marshal values of `ty`, as a parameter or
    /// return type.
    fn is_supported(ty: crate::types::TypeKind) -> bool;

    /// Encodes a trampoline for `sig` into `out`, returning the number of
    /// bytes written.
    ///
    /// Returns [`GenError::Overflow`] without partially writing `out` if the
    /// encoding would not fit.
    fn generate(sig: &Signature, out: &mut [u8]) -> Result<usize, GenError>;
}

pub(crate) fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

pub(crate) use aarch64::Aarch64;
pub(crate) use sysv::SysV;
pub(crate) use win64::Win64;
