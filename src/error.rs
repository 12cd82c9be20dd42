use crate::types::TypeKind;

/// Everything that can go wrong building or invoking a [`crate::Trampoline`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("out of memory allocating {requested} bytes for trampoline code")]
    OutOfMemory { requested: usize },

    #[error("unsupported type for this ABI: {0:?}")]
    UnsupportedType(TypeKind),

    #[error("argument count mismatch: expected {expected}, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("non-void return type requires a non-null return slot")]
    MissingReturnSlot,

    #[error("generated code ({needed} bytes) exceeded allocated capacity ({capacity} bytes)")]
    EncodingOverflow { needed: usize, capacity: usize },

    #[error("parameter type must not be Void")]
    InvalidSignature,

    #[error("failed to change memory protection on trampoline code")]
    ProtectionFailed,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Internal failure from a [`crate::abi::CodeGenerator`], resolved into a public
/// [`Error`] by [`crate::Trampoline::new`] once it knows the allocated capacity.
#[derive(Debug)]
pub(crate) enum GenError {
    Unsupported(TypeKind),
    Overflow { needed: usize },
}
