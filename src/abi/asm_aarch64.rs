//! A tiny AArch64 instruction encoder, covering the register moves, 64-bit
//! literal materialization, scalar load/store forms, and branch-with-link
//! the trampoline generator needs.
//!
//! Bit layouts follow the standard AArch64 instruction encodings (ARM
//! Architecture Reference Manual, base instruction set); each helper below
//! documents the fields it packs.

pub(crate) type Reg = u32;

pub(crate) const SP: Reg = 31;
pub(crate) const FP: Reg = 29; // x29
pub(crate) const LR: Reg = 30; // x30
pub(crate) const ARGS_BASE: Reg = 19;
pub(crate) const RETURN_SLOT: Reg = 20;
pub(crate) const PTR_SCRATCH: Reg = 9;
pub(crate) const VAL_SCRATCH: Reg = 11;
pub(crate) const CALL_TARGET: Reg = 16;
pub(crate) const FLOAT_SCRATCH: u32 = 16;

#[derive(Default)]
pub(crate) struct Asm {
    pub(crate) buf: Vec<u8>,
}

impl Asm {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push_word(&mut self, word: u32) {
        self.buf.extend_from_slice(&word.to_le_bytes());
    }

    /// `STP`/`LDP` Xt, Xt2, [Xn], #imm with pre- or post-index writeback.
    fn ldp_stp(&mut self, load: bool, pre_index: bool, rt: Reg, rt2: Reg, rn: Reg, imm: i32) {
        debug_assert_eq!(imm % 8, 0);
        let imm7 = ((imm / 8) & 0x7F) as u32;
        let op2: u32 = if pre_index { 0b011 } else { 0b001 };
        let word = (0b10 << 30)
            | (0b101 << 27)
            | (op2 << 23)
            | ((load as u32) << 22)
            | (imm7 << 15)
            | (rt2 << 10)
            | (rn << 5)
            | rt;
        self.push_word(word);
    }

    pub(crate) fn stp_preindex(&mut self, rt: Reg, rt2: Reg, rn: Reg, imm: i32) {
        self.ldp_stp(false, true, rt, rt2, rn, imm);
    }

    pub(crate) fn ldp_postindex(&mut self, rt: Reg, rt2: Reg, rn: Reg, imm: i32) {
        self.ldp_stp(true, false, rt, rt2, rn, imm);
    }

    /// `ADD`/`SUB` (immediate), 64-bit, no flags. `imm` must fit in 12 bits.
    fn add_sub_imm(&mut self, sub: bool, rd: Reg, rn: Reg, imm: u32) {
        debug_assert!(imm < 4096);
        let word = (1 << 31) | ((sub as u32) << 30) | (0b100010 << 23) | (imm << 10) | (rn << 5) | rd;
        self.push_word(word);
    }

    pub(crate) fn sub_imm(&mut self, rd: Reg, rn: Reg, imm: u32) {
        if imm != 0 {
            self.add_sub_imm(true, rd, rn, imm);
        }
    }

    pub(crate) fn add_imm(&mut self, rd: Reg, rn: Reg, imm: u32) {
        if imm != 0 {
            self.add_sub_imm(false, rd, rn, imm);
        }
    }

    /// `MOV Xd, Xm` (alias of `ORR Xd, XZR, Xm`).
    pub(crate) fn mov_reg_reg(&mut self, rd: Reg, rm: Reg) {
        self.push_word(0xAA0003E0 | (rm << 16) | rd);
    }

    fn movz(&mut self, rd: Reg, bits16: u32, shift: u32) {
        self.push_word(0x12800000 | (1 << 31) | (0b10 << 29) | (shift << 21) | (bits16 << 5) | rd);
    }

    fn movk(&mut self, rd: Reg, bits16: u32, shift: u32) {
        self.push_word(0x72800000 | (1 << 31) | (shift << 21) | (bits16 << 5) | rd);
    }

    /// Materializes a 64-bit constant into `rd` with a MOVZ + up to three
    /// MOVKs, skipping all-zero chunks beyond the first.
    pub(crate) fn mov_imm64(&mut self, rd: Reg, imm: u64) {
        let chunks = [
            (imm & 0xFFFF) as u32,
            ((imm >> 16) & 0xFFFF) as u32,
            ((imm >> 32) & 0xFFFF) as u32,
            ((imm >> 48) & 0xFFFF) as u32,
        ];
        self.movz(rd, chunks[0], 0);
        for (i, &chunk) in chunks.iter().enumerate().skip(1) {
            if chunk != 0 {
                self.movk(rd, chunk, i as u32);
            }
        }
    }

    fn ldst_uimm(&mut self, size: u32, v: u32, opc: u32, imm12: u32, rn: Reg, rt: Reg) {
        let word = (size << 30)
            | (0b111 << 27)
            | (v << 26)
            | (0b01 << 24)
            | (opc << 22)
            | (imm12 << 10)
            | (rn << 5)
            | rt;
        self.push_word(word);
    }

    /// Loads `rt` (general register) from `[rn, #offset]`, widening per
    /// `(width, signed)` the way the argument's declared type requires.
    /// `offset` must already be scaled (a byte count).
    pub(crate) fn load_gpr(&mut self, rt: Reg, rn: Reg, offset: i32, width: u8, signed: bool) {
        let (size, opc, scale) = match (width, signed) {
            (1, false) => (0b00, 0b01, 1),
            (1, true) => (0b00, 0b10, 1), // LDRSB, 64-bit dest
            (2, false) => (0b01, 0b01, 2),
            (2, true) => (0b01, 0b10, 2), // LDRSH, 64-bit dest
            (4, false) => (0b10, 0b01, 4),
            (4, true) => (0b10, 0b10, 4), // LDRSW, 64-bit dest
            (8, _) => (0b11, 0b01, 8),
            _ => unreachable!("unsupported load width"),
        };
        debug_assert_eq!(offset % scale, 0);
        self.ldst_uimm(size, 0, opc, (offset / scale) as u32, rn, rt);
    }

    /// Stores the low `width` bytes of `rt` to `[rn, #offset]`.
    pub(crate) fn store_gpr(&mut self, rt: Reg, rn: Reg, offset: i32, width: u8) {
        let (size, scale) = match width {
            1 => (0b00, 1),
            2 => (0b01, 2),
            4 => (0b10, 4),
            8 => (0b11, 8),
            _ => unreachable!("unsupported store width"),
        };
        debug_assert_eq!(offset % scale, 0);
        self.ldst_uimm(size, 0, 0b00, (offset / scale) as u32, rn, rt);
    }

    /// Loads a scalar float/double register `vt` from `[rn, #offset]`.
    pub(crate) fn load_fpr(&mut self, vt: u32, rn: Reg, offset: i32, double: bool) {
        let size = if double { 0b11 } else { 0b10 };
        let scale = if double { 8 } else { 4 };
        debug_assert_eq!(offset % scale, 0);
        self.ldst_uimm(size, 1, 0b01, (offset / scale) as u32, rn, vt);
    }

    pub(crate) fn store_fpr(&mut self, vt: u32, rn: Reg, offset: i32, double: bool) {
        let size = if double { 0b11 } else { 0b10 };
        let scale = if double { 8 } else { 4 };
        debug_assert_eq!(offset % scale, 0);
        self.ldst_uimm(size, 1, 0b00, (offset / scale) as u32, rn, vt);
    }

    pub(crate) fn blr(&mut self, rn: Reg) {
        self.push_word(0xD63F0000 | (rn << 5));
    }

    pub(crate) fn ret(&mut self) {
        self.push_word(0xD65F03C0);
    }
}
