use crate::error::{Error, Result};
use crate::signature::{Argument, ReturnSlot, Signature};
use crate::sys::{CodePage, ExecutablePage};

/// Default capacity of a trampoline's code buffer.
///
/// Every signature this crate supports — up to the stack-spilling cases
/// exercised in its test suite — fits comfortably under this; it exists as
/// a fixed starting point rather than a per-call allocation decision, the
/// same way `cranelift-entity`'s collections pick a fixed growth strategy
/// instead of taking one as configuration.
const DEFAULT_CODE_CAPACITY: usize = 512;

/// The entry point of a published trampoline: marshal `args` per the
/// signature it was built for, call the target, and (if the signature's
/// return type is not `Void`) write the result into `return_slot`.
pub(crate) type Invoker =
    unsafe extern "C" fn(args_base: *const Argument, num_args: usize, return_slot: *mut u8);

/// Executable code that calls one native function through a type-erased
/// argument vector.
///
/// A `Trampoline` owns the memory backing its generated code; the code is
/// written once, at construction, and the page is never made writable
/// again afterwards.
pub struct Trampoline {
    page: CodePage,
    code_len: usize,
    signature: Signature,
}

impl Trampoline {
    /// Generates and publishes a trampoline for `signature` on the host's
    /// native ABI.
    pub fn new(signature: Signature) -> Result<Trampoline> {
        let mut page = CodePage::allocate(DEFAULT_CODE_CAPACITY)?;
        let code_len = crate::host::generate(&signature, page.as_mut_slice())?;
        page.publish()?;
        log::debug!(
            "published trampoline \"{}\" ({} bytes)",
            signature.name(),
            code_len
        );
        Ok(Trampoline {
            page,
            code_len,
            signature,
        })
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Size in bytes of the generated code, for diagnostics and tests.
    pub fn code_len(&self) -> usize {
        self.code_len
    }

    pub(crate) fn invoker(&self) -> Invoker {
        // SAFETY: `page` was published by `ExecutablePage::publish`, so its
        // base address is executable and holds a valid trampoline for
        // `self.signature`.
        unsafe { std::mem::transmute::<*const u8, Invoker>(self.page.as_ptr()) }
    }
}

impl Drop for Trampoline {
    fn drop(&mut self) {
        log::trace!("dropping trampoline \"{}\"", self.signature.name());
    }
}

// SAFETY: the underlying code page is immutable once published, and the
// signature is plain data; a `Trampoline` can be safely shared or moved
// across threads like any other read-only function pointer.
unsafe impl Send for Trampoline {}
unsafe impl Sync for Trampoline {}
