use super::ExecutablePage;
use crate::error::{Error, Result};

/// An mmap'd region, RW while the generator fills it, RX once published.
pub(crate) struct CodePage {
    ptr: *mut libc::c_void,
    len: usize,
}

impl CodePage {
    fn flush_icache(&self) {
        // x86-64 has coherent instruction/data caches; nothing to do. AArch64
        // requires an explicit data-cache-clean + instruction-cache-invalidate
        // before code written through the data side is visible to fetch.
        #[cfg(target_arch = "aarch64")]
        unsafe {
            let start = self.ptr as usize;
            let end = start + self.len;
            let mut addr = start & !63;
            while addr < end {
                std::arch::asm!("dc cvau, {0}", in(reg) addr, options(nostack));
                addr += 64;
            }
            std::arch::asm!("dsb ish", options(nostack));
            let mut addr = start & !63;
            while addr < end {
                std::arch::asm!("ic ivau, {0}", in(reg) addr, options(nostack));
                addr += 64;
            }
            std::arch::asm!("dsb ish", "isb", options(nostack));
        }
    }
}

impl ExecutablePage for CodePage {
    fn allocate(len: usize) -> Result<Self> {
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let mapped_len = len.div_ceil(page_size).max(1) * page_size;
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                mapped_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            log::warn!("mmap of {mapped_len} bytes failed");
            return Err(Error::OutOfMemory { requested: len });
        }
        Ok(CodePage {
            ptr,
            len: mapped_len,
        })
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr as *mut u8, self.len) }
    }

    fn publish(&mut self) -> Result<()> {
        let rc = unsafe { libc::mprotect(self.ptr, self.len, libc::PROT_READ | libc::PROT_EXEC) };
        if rc != 0 {
            log::warn!("mprotect to RX failed");
            return Err(Error::ProtectionFailed);
        }
        self.flush_icache();
        Ok(())
    }

    fn as_ptr(&self) -> *const u8 {
        self.ptr as *const u8
    }
}

impl Drop for CodePage {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr, self.len);
        }
    }
}

// SAFETY: the page is exclusively owned by its `Trampoline` and never
// mutated concurrently; sending it across threads just moves that
// ownership.
unsafe impl Send for CodePage {}
unsafe impl Sync for CodePage {}
