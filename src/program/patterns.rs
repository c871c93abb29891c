//! Built-in program images: the boot animation and the fault indicator.
//!
//! Both are ordinary bytecode, installed with checksum checking bypassed,
//! and are assembled rather than spelled as magic byte arrays so they stay
//! auditable next to the opcode set.

use crate::program::asm::Asm;
use crate::program::MODE_PER_LED;
use crate::vm::Opcode::*;

/// Boot program: drifting diagonal bands in HSV, three LEDs per band, one
/// band step per tick. Runs until the first upload replaces it.
pub fn default_program() -> Vec<u8> {
    Asm::new()
        .op(Hsv)
        .op(PeriodI).imm(100.0)
        .op(BlueI).imm(150.0) // value
        .op(GetPosEnd).reg(0)
        .op(GetTicks).reg(1)
        .op(AddR).reg(0).reg(0).reg(1)
        .op(DivI).reg(0).reg(0).imm(3.0)
        .op(ModI).reg(0).reg(0).imm(4.0)
        .op(Cz).reg(0)
        .op(HaltT) // band 0 stays desaturated white
        .op(RedI).imm(348.0) // hue
        .op(GreenI).imm(79.0) // saturation
        .op(ModI).reg(1).reg(0).imm(2.0)
        .op(Cnz).reg(1)
        .op(HaltT)
        .op(RedI).imm(197.0)
        .op(GreenI).imm(162.0)
        .finish(MODE_PER_LED)
}

/// Fault indicator installed by the error reporter: solid red on even
/// ticks, dark on odd ticks. Forces RGB mode so the red is red no matter
/// what the faulted program had selected.
pub fn fault_pattern() -> Vec<u8> {
    Asm::new()
        .op(Rgb)
        .op(GetTicks).reg(0)
        .op(ModI).reg(0).reg(0).imm(2.0)
        .op(Cz).reg(0)
        .op(HaltF)
        .op(RedI).imm(255.0)
        .op(Halt)
        .finish(MODE_PER_LED)
}
