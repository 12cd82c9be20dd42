//! Runtime code generation for calling native functions through
//! type-erased signatures.
//!
//! `trampolet` synthesizes a small machine-code shim — a *trampoline* — for
//! a given [`Signature`] at runtime, caching the result in an executable
//! page. The trampoline marshals a caller-supplied [`ArgumentVector`] into
//! the host's native calling convention, calls the target function
//! pointer, and writes its return value into a [`ReturnSlot`]. Supported
//! ABIs are System V AMD64, Microsoft x64, and AArch64 AAPCS64, selected at
//! compile time for the host the crate is built for.
//!
//! ```no_run
//! use trampolet::{invoke, Argument, ReturnSlot, Signature, Trampoline, TypeKind};
//!
//! extern "C" fn add(a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! # fn main() -> Result<(), trampolet::Error> {
//! let sig = Signature::new(
//!     "add",
//!     add as *const (),
//!     vec![TypeKind::I64, TypeKind::I64],
//!     TypeKind::I64,
//! )?;
//! let trampoline = Trampoline::new(sig)?;
//!
//! let (a, b): (i64, i64) = (40, 2);
//! let args = [Argument::from_ref(&a), Argument::from_ref(&b)];
//! let mut result: i64 = 0;
//! let slot = ReturnSlot::from_mut(&mut result);
//! assert!(unsafe { invoke(&trampoline, &args, &slot) });
//! assert_eq!(result, 42);
//! # Ok(())
//! # }
//! ```
//!
//! Trampolines are not variadic and do not support aggregates passed by
//! value; see each module's documentation for the exact type vocabulary
//! and ABI coverage.

mod abi;
mod dispatcher;
mod error;
mod host;
mod signature;
mod sys;
mod trampoline;
mod types;

pub use dispatcher::invoke;
pub use error::Error;
pub use signature::{Argument, ArgumentVector, ReturnSlot, Signature};
pub use trampoline::Trampoline;
pub use types::{AbiClass, TypeKind};
