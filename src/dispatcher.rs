//! Validates an invocation against a trampoline's signature and runs it.

use crate::signature::{Argument, ReturnSlot};
use crate::trampoline::Trampoline;
use crate::types::TypeKind;

/// Invokes `trampoline`'s target function, marshalling `args` into the
/// host's calling convention and writing the result (if any) into
/// `return_slot`.
///
/// Returns `false` without calling the target if `args` does not match the
/// signature's declared arity, or if the signature has a non-`Void` return
/// type but `return_slot` is null. Both are logged at `warn` before
/// returning; a successful call is logged at `debug`.
///
/// # Safety
///
/// Each `Argument` in `args` must point to storage of the width its
/// matched parameter type expects, and `return_slot` (if non-null) must be
/// large enough for the signature's return type.
pub unsafe fn invoke(trampoline: &Trampoline, args: &[Argument], return_slot: &ReturnSlot) -> bool {
    let sig = trampoline.signature();

    if args.len() != sig.params().len() {
        log::warn!(
            "arity mismatch invoking \"{}\": expected {}, got {}",
            sig.name(),
            sig.params().len(),
            args.len()
        );
        return false;
    }
    if sig.return_type() != TypeKind::Void && return_slot.is_null() {
        log::warn!("missing return slot invoking \"{}\"", sig.name());
        return false;
    }

    log::debug!("invoking \"{}\" with {} argument(s)", sig.name(), args.len());
    (trampoline.invoker())(args.as_ptr(), args.len(), return_slot.as_mut_ptr());
    true
}
