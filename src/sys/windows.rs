use super::ExecutablePage;
use crate::error::{Error, Result};
use windows_sys::Win32::System::Diagnostics::Debug::FlushInstructionCache;
use windows_sys::Win32::System::Memory::{
    VirtualAlloc, VirtualFree, VirtualProtect, MEM_COMMIT, MEM_RELEASE, MEM_RESERVE,
    PAGE_EXECUTE_READ, PAGE_READWRITE,
};

pub(crate) struct CodePage {
    ptr: *mut std::ffi::c_void,
    len: usize,
}

impl ExecutablePage for CodePage {
    fn allocate(len: usize) -> Result<Self> {
        let mapped_len = len.max(1);
        let ptr = unsafe {
            VirtualAlloc(
                std::ptr::null(),
                mapped_len,
                MEM_COMMIT | MEM_RESERVE,
                PAGE_READWRITE,
            )
        };
        if ptr.is_null() {
            log::warn!("VirtualAlloc of {mapped_len} bytes failed");
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
        let mut old_protect = 0u32;
        let ok = unsafe {
            VirtualProtect(self.ptr, self.len, PAGE_EXECUTE_READ, &mut old_protect)
        };
        if ok == 0 {
            log::warn!("VirtualProtect to RX failed");
            return Err(Error::ProtectionFailed);
        }
        unsafe {
            FlushInstructionCache(
                windows_sys::Win32::System::Threading::GetCurrentProcess(),
                self.ptr,
                self.len,
            );
        }
        Ok(())
    }

    fn as_ptr(&self) -> *const u8 {
        self.ptr as *const u8
    }
}

impl Drop for CodePage {
    fn drop(&mut self) {
        unsafe {
            VirtualFree(self.ptr, 0, MEM_RELEASE);
        }
    }
}

unsafe impl Send for CodePage {}
unsafe impl Sync for CodePage {}
