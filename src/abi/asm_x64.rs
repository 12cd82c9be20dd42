//! A tiny x86-64 instruction encoder covering exactly the forms the SysV and
//! Win64 trampoline generators need: register moves, sign/zero-extending
//! loads, scalar SSE moves, stack adjustment, and an indirect call.
//!
//! This is not a general assembler; encoding helpers are modeled on the REX
//! prefix and ModRM/SIB byte layout used throughout the x86-64 manual (and
//! mirrored in most hand-rolled x86-64 emitters), not a full instruction
//! table.

pub(crate) type Reg = u8;

pub(crate) const RAX: Reg = 0;
pub(crate) const RCX: Reg = 1;
pub(crate) const RDX: Reg = 2;
pub(crate) const RBX: Reg = 3;
pub(crate) const RSP: Reg = 4;
pub(crate) const RBP: Reg = 5;
pub(crate) const RSI: Reg = 6;
pub(crate) const RDI: Reg = 7;
pub(crate) const R8: Reg = 8;
pub(crate) const R9: Reg = 9;
pub(crate) const R10: Reg = 10;
pub(crate) const R12: Reg = 12;
pub(crate) const R13: Reg = 13;

/// Registers used outside the ABI's argument list, for values this module
/// threads through marshalling itself.
pub(crate) const ARGS_BASE: Reg = R12;
pub(crate) const RETURN_SLOT: Reg = R13;
pub(crate) const PTR_SCRATCH: Reg = R10;
pub(crate) const VAL_SCRATCH: Reg = RAX;
pub(crate) const CALL_TARGET: Reg = R10;
/// Float spill scratch for SysV: XMM0-7 are all argument registers there, so
/// only XMM8 and up are ever free, and SysV treats every XMM register as
/// caller-saved, so no save/restore is needed around its use.
pub(crate) const XMM_SCRATCH_SYSV: u8 = 8;
/// Float spill scratch for Win64: XMM0-3 are argument registers and XMM6-15
/// are callee-saved there, so XMM4/XMM5 are the only volatile, non-argument
/// choices; XMM5 is used to leave XMM4 free as a secondary scratch.
pub(crate) const XMM_SCRATCH_WIN64: u8 = 5;

fn rex(w: bool, r: bool, x: bool, b: bool) -> u8 {
    0x40 | ((w as u8) << 3) | ((r as u8) << 2) | ((x as u8) << 1) | (b as u8)
}

fn modrm(md: u8, reg: u8, rm: u8) -> u8 {
    (md << 6) | ((reg & 7) << 3) | (rm & 7)
}

fn sib(scale: u8, index: u8, base: u8) -> u8 {
    (scale << 6) | ((index & 7) << 3) | (base & 7)
}

#[derive(Clone, Copy)]
pub(crate) enum Width {
    B1,
    B2,
    B4,
    B8,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ext {
    None,
    Sign,
    Zero,
}

#[derive(Default)]
pub(crate) struct Asm {
    pub(crate) buf: Vec<u8>,
}

impl Asm {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn emit_mem_operand(&mut self, reg_field: u8, base: Reg, disp: i32) {
        let base_low = base & 7;
        let needs_sib = base_low == 4;
        let rm = if needs_sib { 0b100 } else { base_low };
        if disp == 0 && base_low != 5 {
            self.buf.push(modrm(0b00, reg_field, rm));
            if needs_sib {
                self.buf.push(sib(0, 0b100, base_low));
            }
        } else if let Ok(d8) = i8::try_from(disp) {
            self.buf.push(modrm(0b01, reg_field, rm));
            if needs_sib {
                self.buf.push(sib(0, 0b100, base_low));
            }
            self.buf.push(d8 as u8);
        } else {
            self.buf.push(modrm(0b10, reg_field, rm));
            if needs_sib {
                self.buf.push(sib(0, 0b100, base_low));
            }
            self.buf.extend_from_slice(&disp.to_le_bytes());
        }
    }

    pub(crate) fn endbr64(&mut self) {
        self.buf.extend_from_slice(&[0xF3, 0x0F, 0x1E, 0xFA]);
    }

    pub(crate) fn push_reg(&mut self, r: Reg) {
        if r >= 8 {
            self.buf.push(rex(false, false, false, true));
        }
        self.buf.push(0x50 + (r & 7));
    }

    pub(crate) fn pop_reg(&mut self, r: Reg) {
        if r >= 8 {
            self.buf.push(rex(false, false, false, true));
        }
        self.buf.push(0x58 + (r & 7));
    }

    /// `mov dst, src` (64-bit general-purpose register to register).
    pub(crate) fn mov_reg_reg(&mut self, dst: Reg, src: Reg) {
        self.buf.push(rex(true, src >= 8, false, dst >= 8));
        self.buf.push(0x89);
        self.buf.push(modrm(0b11, src, dst));
    }

    /// `movabs dst, imm64`.
    pub(crate) fn mov_reg_imm64(&mut self, dst: Reg, imm: u64) {
        self.buf.push(rex(true, false, false, dst >= 8));
        self.buf.push(0xB8 + (dst & 7));
        self.buf.extend_from_slice(&imm.to_le_bytes());
    }

    pub(crate) fn mov_al_imm8(&mut self, v: u8) {
        self.buf.push(0xB0);
        self.buf.push(v);
    }

    pub(crate) fn sub_rsp_imm32(&mut self, imm: i32) {
        if imm == 0 {
            return;
        }
        self.buf.push(rex(true, false, false, false));
        self.buf.push(0x81);
        self.buf.push(modrm(0b11, 0b101, RSP));
        self.buf.extend_from_slice(&imm.to_le_bytes());
    }

    pub(crate) fn add_rsp_imm32(&mut self, imm: i32) {
        if imm == 0 {
            return;
        }
        self.buf.push(rex(true, false, false, false));
        self.buf.push(0x81);
        self.buf.push(modrm(0b11, 0b000, RSP));
        self.buf.extend_from_slice(&imm.to_le_bytes());
    }

    /// `mov dst, [base + disp]`, full 64-bit pointer load (used to fetch
    /// `args_base[i]` itself, and the 64-bit/pointer-width argument case).
    pub(crate) fn mov_reg_mem64(&mut self, dst: Reg, base: Reg, disp: i32) {
        self.buf.push(rex(true, dst >= 8, false, base >= 8));
        self.buf.push(0x8B);
        self.emit_mem_operand(dst, base, disp);
    }

    pub(crate) fn mov_mem64_reg(&mut self, base: Reg, disp: i32, src: Reg) {
        self.buf.push(rex(true, src >= 8, false, base >= 8));
        self.buf.push(0x89);
        self.emit_mem_operand(src, base, disp);
    }

    /// Loads the value at `[base]` into `dst`, applying `width`/`ext` the
    /// way the destination's declared type requires.
    pub(crate) fn load_value(&mut self, dst: Reg, base: Reg, width: Width, ext: Ext) {
        match (width, ext) {
            (Width::B8, _) => self.mov_reg_mem64(dst, base, 0),
            (Width::B4, Ext::Sign) => {
                // MOVSXD r64, m32
                self.buf.push(rex(true, dst >= 8, false, base >= 8));
                self.buf.push(0x63);
                self.emit_mem_operand(dst, base, 0);
            }
            (Width::B4, _) => {
                // MOV r32, m32 (implicitly zero-extends to 64 bits).
                if dst >= 8 || base >= 8 {
                    self.buf.push(rex(false, dst >= 8, false, base >= 8));
                }
                self.buf.push(0x8B);
                self.emit_mem_operand(dst, base, 0);
            }
            (Width::B2, Ext::Sign) => {
                self.buf.push(rex(true, dst >= 8, false, base >= 8));
                self.buf.extend_from_slice(&[0x0F, 0xBF]);
                self.emit_mem_operand(dst, base, 0);
            }
            (Width::B2, _) => {
                self.buf.push(rex(true, dst >= 8, false, base >= 8));
                self.buf.extend_from_slice(&[0x0F, 0xB7]);
                self.emit_mem_operand(dst, base, 0);
            }
            (Width::B1, Ext::Sign) => {
                self.buf.push(rex(true, dst >= 8, false, base >= 8));
                self.buf.extend_from_slice(&[0x0F, 0xBE]);
                self.emit_mem_operand(dst, base, 0);
            }
            (Width::B1, _) => {
                self.buf.push(rex(true, dst >= 8, false, base >= 8));
                self.buf.extend_from_slice(&[0x0F, 0xB6]);
                self.emit_mem_operand(dst, base, 0);
            }
        }
    }

    /// Stores `src` (already widened to 64 bits) into `[base + disp]` using
    /// only `width` bytes.
    pub(crate) fn store_value(&mut self, base: Reg, disp: i32, src: Reg, width: Width) {
        match width {
            Width::B8 => self.mov_mem64_reg(base, disp, src),
            Width::B4 => {
                if src >= 8 || base >= 8 {
                    self.buf.push(rex(false, src >= 8, false, base >= 8));
                }
                self.buf.push(0x89);
                self.emit_mem_operand(src, base, disp);
            }
            Width::B2 => {
                self.buf.push(0x66);
                if src >= 8 || base >= 8 {
                    self.buf.push(rex(false, src >= 8, false, base >= 8));
                }
                self.buf.push(0x89);
                self.emit_mem_operand(src, base, disp);
            }
            Width::B1 => {
                if src >= 8 || base >= 8 {
                    self.buf.push(rex(false, src >= 8, false, base >= 8));
                }
                self.buf.push(0x88);
                self.emit_mem_operand(src, base, disp);
            }
        }
    }

    /// `movss`/`movsd xmm_dst, [base]`.
    pub(crate) fn load_float(&mut self, dst_xmm: u8, base: Reg, double: bool) {
        self.buf.push(if double { 0xF2 } else { 0xF3 });
        if dst_xmm >= 8 || base >= 8 {
            self.buf.push(rex(false, dst_xmm >= 8, false, base >= 8));
        }
        self.buf.extend_from_slice(&[0x0F, 0x10]);
        self.emit_mem_operand(dst_xmm, base, 0);
    }

    /// `movss`/`movsd [base + disp], xmm_src`.
    pub(crate) fn store_float(&mut self, base: Reg, disp: i32, src_xmm: u8, double: bool) {
        self.buf.push(if double { 0xF2 } else { 0xF3 });
        if src_xmm >= 8 || base >= 8 {
            self.buf.push(rex(false, src_xmm >= 8, false, base >= 8));
        }
        self.buf.extend_from_slice(&[0x0F, 0x11]);
        self.emit_mem_operand(src_xmm, base, disp);
    }

    pub(crate) fn call_reg(&mut self, target: Reg) {
        if target >= 8 {
            self.buf.push(rex(false, false, false, true));
        }
        self.buf.push(0xFF);
        self.buf.push(modrm(0b11, 0b010, target));
    }

    pub(crate) fn ret(&mut self) {
        self.buf.push(0xC3);
    }
}

pub(crate) fn width_of(ty: crate::types::TypeKind) -> Width {
    match ty.byte_width() {
        1 => Width::B1,
        2 => Width::B2,
        4 => Width::B4,
        _ => Width::B8,
    }
}

pub(crate) fn ext_of(ty: crate::types::TypeKind) -> Ext {
    match ty.extension() {
        crate::types::Extension::None => Ext::None,
        crate::types::Extension::Sign => Ext::Sign,
        crate::types::Extension::Zero => Ext::Zero,
    }
}
