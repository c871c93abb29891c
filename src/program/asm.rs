//! Tiny assembler for program images.
//!
//! The built-in programs and the test suites build their bytecode through
//! this instead of inline magic byte arrays.

use crate::program::{crc8, scan_len, SENTINEL_LEN};
use crate::vm::Opcode;

/// Accumulates instruction bytes; [`Asm::finish`] frames them with the
/// checksum, mode byte and trailing sentinel.
#[derive(Default)]
pub struct Asm {
    code: Vec<u8>,
}

impl Asm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(mut self, op: Opcode) -> Self {
        self.code.push(op as u8);
        self
    }

    /// An arbitrary byte, for building deliberately malformed streams.
    pub fn raw(mut self, byte: u8) -> Self {
        self.code.push(byte);
        self
    }

    /// An 8-bit register index operand.
    pub fn reg(mut self, reg: u8) -> Self {
        self.code.push(reg);
        self
    }

    /// A big-endian f32 immediate operand.
    pub fn imm(mut self, imm: f32) -> Self {
        self.code.extend_from_slice(&imm.to_bits().to_be_bytes());
        self
    }

    /// A big-endian u32 absolute byte offset, for the jump opcodes.
    pub fn addr(mut self, addr: u32) -> Self {
        self.code.extend_from_slice(&addr.to_be_bytes());
        self
    }

    /// Offset the next pushed byte will land at in the finished image
    /// (checksum and mode included), usable as a jump target.
    pub fn here(&self) -> u32 {
        (self.code.len() + 2) as u32
    }

    /// Frame the accumulated stream into a complete, valid program image.
    ///
    /// The checksum covers bytes [1, scanned length): a stream whose last
    /// byte is 0xFF merges into the sentinel window, and the loader will
    /// see the shorter length, so the checksum has to as well.
    pub fn finish(self, mode: u8) -> Vec<u8> {
        let mut image = Vec::with_capacity(self.code.len() + 2 + SENTINEL_LEN);
        image.push(0);
        image.push(mode);
        image.extend_from_slice(&self.code);
        image.extend_from_slice(&[0xFF; SENTINEL_LEN]);

        let len = scan_len(&image);
        image[0] = crc8(&image[1..len]);
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Program, MODE_PER_TICK};

    #[test]
    fn framing_layout() {
        let image = Asm::new()
            .op(Opcode::PeriodI)
            .imm(100.0)
            .finish(MODE_PER_TICK);

        assert_eq!(image[1], MODE_PER_TICK);
        assert_eq!(&image[2..7], &[0x03, 0x42, 0xC8, 0x00, 0x00]);
        assert_eq!(&image[7..], &[0xFF; SENTINEL_LEN]);
        assert_eq!(image[0], crc8(&image[1..]));
    }

    #[test]
    fn finished_images_install_with_checking_enabled() {
        let image = Asm::new()
            .op(Opcode::GetPos)
            .reg(3)
            .finish(MODE_PER_TICK);

        let mut program = Program::empty();
        program.install(&image, true).unwrap();
        assert_eq!(program.bytes(), &image[..]);
    }

    #[test]
    fn trailing_halt_byte_merges_into_the_sentinel() {
        let image = Asm::new()
            .op(Opcode::Nop)
            .op(Opcode::Halt)
            .finish(MODE_PER_TICK);

        let mut program = Program::empty();
        program.install(&image, true).unwrap();
        // halt is 0xFF, so the scan absorbs it into the terminator run.
        assert_eq!(program.len(), image.len() - 1);
    }

    #[test]
    fn here_tracks_the_image_offset() {
        let asm = Asm::new().op(Opcode::Cz).reg(0);
        // checksum + mode + cz + reg
        assert_eq!(asm.here(), 4);
    }
}
