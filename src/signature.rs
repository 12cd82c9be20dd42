use crate::error::{Error, Result};
use crate::types::TypeKind;

/// One entry of an [`ArgumentVector`]: a pointer to caller-owned storage
/// holding the value for a single parameter, in the width and layout its
/// declared [`TypeKind`] expects.
///
/// `Argument` does not own or validate the pointee; the caller must keep the
/// referenced storage alive and correctly typed for the lifetime of the
/// call.
#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct Argument(*const u8);

impl Argument {
    /// Wraps a pointer to the storage backing one parameter.
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null, correctly aligned, and point to at least
    /// `TypeKind::byte_width()` readable bytes for the parameter this
    /// argument is matched against at invocation time.
    pub unsafe fn new(ptr: *const u8) -> Self {
        Argument(ptr)
    }

    /// Builds an `Argument` pointing at `value`.
    ///
    /// The returned `Argument` borrows `value`; it must not outlive it.
    pub fn from_ref<T>(value: &T) -> Self {
        Argument(value as *const T as *const u8)
    }

    pub(crate) fn as_ptr(self) -> *const u8 {
        self.0
    }
}

/// A type-erased vector of argument slots, passed to a trampoline alongside
/// its element count.
pub type ArgumentVector<'a> = &'a [Argument];

/// Caller-owned storage a trampoline writes its return value into.
///
/// The buffer must be at least as large as the widest type the signature's
/// return type requires (16 bytes covers every [`TypeKind`]); a `Void`
/// return never writes to the slot and a null/empty slot is permitted for
/// it.
#[derive(Debug)]
#[repr(transparent)]
pub struct ReturnSlot(*mut u8);

impl ReturnSlot {
    /// # Safety
    ///
    /// `ptr` must be null (only valid for a `Void` return type) or point to
    /// writable storage at least as large as the return type's byte width.
    pub unsafe fn new(ptr: *mut u8) -> Self {
        ReturnSlot(ptr)
    }

    /// Points the slot at `value`, to receive a typed return.
    pub fn from_mut<T>(value: &mut T) -> Self {
        ReturnSlot(value as *mut T as *mut u8)
    }

    pub(crate) fn as_mut_ptr(&self) -> *mut u8 {
        self.0
    }

    pub(crate) fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Reads the slot as a `T`.
    ///
    /// # Safety
    ///
    /// The slot must have just been written by a trampoline whose return
    /// type matches `T`'s layout.
    pub unsafe fn read<T: Copy>(&self) -> T {
        (self.0 as *const T).read_unaligned()
    }
}

/// The shape of a native call: its target function, parameter types, and
/// return type.
///
/// A `Signature` is pure data; [`crate::Trampoline::new`] is what turns it
/// into executable code for the host's ABI.
#[derive(Debug, Clone)]
pub struct Signature {
    name: Box<str>,
    target: *const (),
    params: Box<[TypeKind]>,
    return_type: TypeKind,
}

impl Signature {
    /// Builds a new signature for `target`, a function taking `params` and
    /// returning `return_type`.
    ///
    /// Fails if any parameter is [`TypeKind::Void`]; only the return type
    /// may be void.
    pub fn new(
        name: impl Into<Box<str>>,
        target: *const (),
        params: impl Into<Box<[TypeKind]>>,
        return_type: TypeKind,
    ) -> Result<Signature> {
        let params = params.into();
        if params.iter().any(|p| matches!(p, TypeKind::Void)) {
            return Err(Error::InvalidSignature);
        }
        Ok(Signature {
            name: name.into(),
            target,
            params,
            return_type,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> *const () {
        self.target
    }

    pub fn params(&self) -> &[TypeKind] {
        &self.params
    }

    pub fn return_type(&self) -> TypeKind {
        self.return_type
    }
}
