//! Selects the [`crate::abi::CodeGenerator`] matching the host's calling
//! convention.
//!
//! Unlike `cranelift-native`'s runtime CPU-feature probing, the choice here
//! is purely a function of `target_arch`/`target_os`: a trampoline's ABI is
//! fixed by the platform it runs on, not by what instructions the CPU
//! happens to support.

use crate::abi::{Aarch64, CodeGenerator, SysV, Win64};
use crate::error::{Error, GenError, Result};
use crate::signature::Signature;
use crate::types::TypeKind;

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "x86_64", target_os = "windows"))] {
        pub(crate) type HostAbi = Win64;
    } else if #[cfg(target_arch = "x86_64")] {
        pub(crate) type HostAbi = SysV;
    } else if #[cfg(target_arch = "aarch64")] {
        pub(crate) type HostAbi = Aarch64;
    } else {
        compile_error!("trampolet has no code generator for this target architecture");
    }
}

pub(crate) fn generate(sig: &Signature, out: &mut [u8]) -> Result<usize> {
    for &ty in sig.params() {
        if !HostAbi::is_supported(ty) {
            return Err(Error::UnsupportedType(ty));
        }
    }
    if sig.return_type() != TypeKind::Void && !HostAbi::is_supported(sig.return_type()) {
        return Err(Error::UnsupportedType(sig.return_type()));
    }

    match HostAbi::generate(sig, out) {
        Ok(n) => Ok(n),
        Err(GenError::Unsupported(ty)) => Err(Error::UnsupportedType(ty)),
        Err(GenError::Overflow { needed }) => Err(Error::EncodingOverflow {
            needed,
            capacity: out.len(),
        }),
    }
}
