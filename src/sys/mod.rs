//! Platform memory service: allocates, protects, and reclaims the pages a
//! [`crate::Trampoline`] generates code into.

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub(crate) use unix::CodePage;
    } else if #[cfg(windows)] {
        mod windows;
        pub(crate) use windows::CodePage;
    } else {
        compile_error!("trampolet has no memory backend for this target platform");
    }
}

/// An executable memory region owned by exactly one [`crate::Trampoline`].
///
/// A `CodePage` is born writable (RW) so a [`crate::abi::CodeGenerator`] can
/// fill it in, then transitioned to executable (RX) once [`CodePage::publish`]
/// is called. It is never both writable and executable at once.
pub(crate) trait ExecutablePage: Sized {
    /// Reserves a zeroed, writable region of at least `len` bytes.
    fn allocate(len: usize) -> crate::error::Result<Self>;

    /// The writable view of the page, for the code generator to fill.
    fn as_mut_slice(&mut self) -> &mut [u8];

    /// Flips the page from writable to executable and flushes any
    /// instruction cache the target architecture requires, making the
    /// generated bytes safe to jump into.
    fn publish(&mut self) -> crate::error::Result<()>;

    /// The page's base address as a callable function pointer.
    fn as_ptr(&self) -> *const u8;
}
