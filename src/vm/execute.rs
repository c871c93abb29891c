//! Opcode dispatch for the pass execution loop.

use crate::strip::{StripMode, StripState};
use crate::vm::cursor::Cursor;
use crate::vm::error::Fault;
use crate::vm::ops::Opcode;
use crate::vm::{Context, Flow, MEMORY_SIZE};

/// Truncating i32 modulo. The divisor converts through i32 first, so a
/// fractional divisor below 1.0 is a zero divisor.
fn modulo(value: f32, divisor: f32, op: &'static str) -> Result<f32, Fault> {
    let div = divisor as i32 as i64;
    if div == 0 {
        return Err(Fault::DivideByZero { op });
    }
    Ok((value as i32 as i64 % div) as f32)
}

/// Positive remainder over i32: the result has the divisor's sign folded
/// away, unlike `modulo` which follows the dividend.
fn remainder(value: f32, divisor: f32, op: &'static str) -> Result<f32, Fault> {
    let div = divisor as i32 as i64;
    if div == 0 {
        return Err(Fault::DivideByZero { op });
    }
    Ok(((value as i32 as i64 % div + div) % div) as f32)
}

impl Context {
    pub(crate) fn exec(
        &mut self,
        op: Opcode,
        cursor: &mut Cursor<'_>,
        strip: &mut StripState,
    ) -> Result<Flow, Fault> {
        match op {
            Opcode::Nop => {}

            // Mode and timing configuration
            Opcode::Rgb => strip.mode = StripMode::Rgb,
            Opcode::Hsv => strip.mode = StripMode::Hsv,
            Opcode::PeriodI => {
                let imm = cursor.next_f32()?;
                self.period_ms = imm as u32;
            }
            Opcode::PeriodR => {
                let reg = cursor.next_u8()?;
                self.period_ms = self.registers[reg as usize] as u32;
            }

            // Color writes. Under HSV mode the mnemonics read huei/sati/vali
            // but the target slots are the same three.
            Opcode::RedI => self.write_component_imm(cursor, strip, 0)?,
            Opcode::GreenI => self.write_component_imm(cursor, strip, 1)?,
            Opcode::BlueI => self.write_component_imm(cursor, strip, 2)?,
            Opcode::RedR => self.write_component_reg(cursor, strip, 0)?,
            Opcode::GreenR => self.write_component_reg(cursor, strip, 1)?,
            Opcode::BlueR => self.write_component_reg(cursor, strip, 2)?,

            // Read-only accessors
            Opcode::GetPos => {
                let reg = cursor.next_u8()?;
                self.registers[reg as usize] = self.current_led as f32;
            }
            Opcode::GetPosEnd => {
                let reg = cursor.next_u8()?;
                self.registers[reg as usize] = (strip.led_count() - self.current_led) as f32;
            }
            Opcode::GetTicks => {
                let reg = cursor.next_u8()?;
                self.registers[reg as usize] = self.ticks as f32;
            }
            Opcode::GetRng => {
                let reg = cursor.next_u8()?;
                self.registers[reg as usize] = self.rng as f32 / u32::MAX as f32;
            }
            Opcode::GetNumLeds => {
                let reg = cursor.next_u8()?;
                self.registers[reg as usize] = strip.led_count() as f32;
            }

            // Arithmetic
            Opcode::MovI => {
                let reg = cursor.next_u8()?;
                let imm = cursor.next_f32()?;
                self.registers[reg as usize] = imm;
            }
            Opcode::MovR => {
                let dst = cursor.next_u8()?;
                let src = cursor.next_u8()?;
                self.registers[dst as usize] = self.registers[src as usize];
            }
            Opcode::AddI => self.binary_imm(cursor, |a, b| a + b)?,
            Opcode::AddR => self.binary_reg(cursor, |a, b| a + b)?,
            Opcode::SubR => self.binary_reg(cursor, |a, b| a - b)?,
            Opcode::MulI => self.binary_imm(cursor, |a, b| a * b)?,
            Opcode::MulR => self.binary_reg(cursor, |a, b| a * b)?,
            Opcode::DivI => {
                let dst = cursor.next_u8()?;
                let src = cursor.next_u8()?;
                let imm = cursor.next_f32()?;
                if imm == 0.0 {
                    return Err(Fault::DivideByZero { op: "divi" });
                }
                self.registers[dst as usize] = self.registers[src as usize] / imm;
            }
            Opcode::DivR => {
                let dst = cursor.next_u8()?;
                let src = cursor.next_u8()?;
                let div = cursor.next_u8()?;
                let divisor = self.registers[div as usize];
                if divisor == 0.0 {
                    return Err(Fault::DivideByZero { op: "divr" });
                }
                self.registers[dst as usize] = self.registers[src as usize] / divisor;
            }
            Opcode::ModI => {
                let dst = cursor.next_u8()?;
                let src = cursor.next_u8()?;
                let imm = cursor.next_f32()?;
                self.registers[dst as usize] = modulo(self.registers[src as usize], imm, "modi")?;
            }
            Opcode::ModR => {
                let dst = cursor.next_u8()?;
                let src = cursor.next_u8()?;
                let div = cursor.next_u8()?;
                self.registers[dst as usize] =
                    modulo(self.registers[src as usize], self.registers[div as usize], "modr")?;
            }
            Opcode::RemI => {
                let dst = cursor.next_u8()?;
                let src = cursor.next_u8()?;
                let imm = cursor.next_f32()?;
                self.registers[dst as usize] =
                    remainder(self.registers[src as usize], imm, "remi")?;
            }
            Opcode::RemR => {
                let dst = cursor.next_u8()?;
                let src = cursor.next_u8()?;
                let div = cursor.next_u8()?;
                self.registers[dst as usize] = remainder(
                    self.registers[src as usize],
                    self.registers[div as usize],
                    "remr",
                )?;
            }

            // Transcendental and rounding
            Opcode::SinR => self.unary(cursor, f32::sin)?,
            Opcode::CosR => self.unary(cursor, f32::cos)?,
            Opcode::TanR => self.unary(cursor, f32::tan)?,
            Opcode::AsinR => self.unary(cursor, f32::asin)?,
            Opcode::AcosR => self.unary(cursor, f32::acos)?,
            Opcode::AtanR => self.unary(cursor, f32::atan)?,
            Opcode::Atan2R => self.binary_reg(cursor, f32::atan2)?,
            Opcode::SqrtR => self.unary(cursor, f32::sqrt)?,
            Opcode::FloorR => self.unary(cursor, f32::floor)?,
            Opcode::CeilR => self.unary(cursor, f32::ceil)?,
            Opcode::RoundR => self.unary(cursor, f32::round)?,

            // Range selection; explicit comparisons, never a fault
            Opcode::MinI => self.binary_imm(cursor, |a, b| if a < b { a } else { b })?,
            Opcode::MinR => self.binary_reg(cursor, |a, b| if a < b { a } else { b })?,
            Opcode::MaxI => self.binary_imm(cursor, |a, b| if a > b { a } else { b })?,
            Opcode::MaxR => self.binary_reg(cursor, |a, b| if a > b { a } else { b })?,
            Opcode::ClampI => {
                let dst = cursor.next_u8()?;
                let src = cursor.next_u8()?;
                let lo = cursor.next_f32()?;
                let hi = cursor.next_f32()?;
                let val = self.registers[src as usize];
                self.registers[dst as usize] = if val < lo {
                    lo
                } else if val > hi {
                    hi
                } else {
                    val
                };
            }
            Opcode::AbsR => self.unary(cursor, f32::abs)?,

            // Control flow
            Opcode::Goto => {
                let dest = cursor.next_u32()?;
                cursor.jump(dest as usize);
            }
            Opcode::Jt => {
                let dest = cursor.next_u32()?;
                if self.compare {
                    cursor.jump(dest as usize);
                }
            }
            Opcode::Jf => {
                let dest = cursor.next_u32()?;
                if !self.compare {
                    cursor.jump(dest as usize);
                }
            }
            Opcode::HaltT => {
                if self.compare {
                    return Ok(Flow::Halt);
                }
            }
            Opcode::HaltF => {
                if !self.compare {
                    return Ok(Flow::Halt);
                }
            }
            Opcode::Halt => return Ok(Flow::Halt),

            // Comparison
            Opcode::GetCmp => {
                let reg = cursor.next_u8()?;
                self.registers[reg as usize] = if self.compare { 1.0 } else { 0.0 };
            }
            Opcode::Cz => {
                let reg = cursor.next_u8()?;
                self.compare = self.registers[reg as usize] == 0.0;
            }
            Opcode::Cnz => {
                let reg = cursor.next_u8()?;
                self.compare = self.registers[reg as usize] != 0.0;
            }
            Opcode::CeqI => self.compare_imm(cursor, |a, b| a == b)?,
            Opcode::CeqR => self.compare_reg(cursor, |a, b| a == b)?,
            Opcode::CltI => self.compare_imm(cursor, |a, b| a < b)?,
            Opcode::CltR => self.compare_reg(cursor, |a, b| a < b)?,
            Opcode::CleI => self.compare_imm(cursor, |a, b| a <= b)?,
            Opcode::CleR => self.compare_reg(cursor, |a, b| a <= b)?,
            Opcode::CgtI => self.compare_imm(cursor, |a, b| a > b)?,
            Opcode::CgtR => self.compare_reg(cursor, |a, b| a > b)?,
            Opcode::CgeI => self.compare_imm(cursor, |a, b| a >= b)?,
            Opcode::CgeR => self.compare_reg(cursor, |a, b| a >= b)?,

            // Scalar memory
            Opcode::LoadI => {
                let reg = cursor.next_u8()?;
                let addr = cursor.next_f32()?;
                self.registers[reg as usize] = self.load(addr)?;
            }
            Opcode::LoadR => {
                let dst = cursor.next_u8()?;
                let addr = cursor.next_u8()?;
                self.registers[dst as usize] = self.load(self.registers[addr as usize])?;
            }
            Opcode::StoreI => {
                let reg = cursor.next_u8()?;
                let addr = cursor.next_f32()?;
                self.store(addr, self.registers[reg as usize])?;
            }
            Opcode::StoreR => {
                let val = cursor.next_u8()?;
                let addr = cursor.next_u8()?;
                self.store(self.registers[addr as usize], self.registers[val as usize])?;
            }

            // Position
            Opcode::PosI => {
                let imm = cursor.next_f32()?;
                self.set_current_led(imm as i64, strip)?;
            }
            Opcode::PosR => {
                let reg = cursor.next_u8()?;
                self.set_current_led(self.registers[reg as usize] as i64, strip)?;
            }
            Opcode::PosEndI => {
                let imm = cursor.next_f32()?;
                self.set_current_led(strip.led_count() as i64 - imm as i64, strip)?;
            }
            Opcode::PosEndR => {
                let reg = cursor.next_u8()?;
                self.set_current_led(
                    strip.led_count() as i64 - self.registers[reg as usize] as i64,
                    strip,
                )?;
            }
        }

        Ok(Flow::Continue)
    }

    fn write_component_imm(
        &mut self,
        cursor: &mut Cursor<'_>,
        strip: &mut StripState,
        slot: usize,
    ) -> Result<(), Fault> {
        let imm = cursor.next_f32()?;
        strip.data[self.current_led][slot] = imm as u32;
        Ok(())
    }

    fn write_component_reg(
        &mut self,
        cursor: &mut Cursor<'_>,
        strip: &mut StripState,
        slot: usize,
    ) -> Result<(), Fault> {
        let reg = cursor.next_u8()?;
        strip.data[self.current_led][slot] = self.registers[reg as usize] as u32;
        Ok(())
    }

    /// dst = f(src), one register operand.
    fn unary(&mut self, cursor: &mut Cursor<'_>, f: fn(f32) -> f32) -> Result<(), Fault> {
        let dst = cursor.next_u8()?;
        let src = cursor.next_u8()?;
        self.registers[dst as usize] = f(self.registers[src as usize]);
        Ok(())
    }

    /// dst = f(src, imm).
    fn binary_imm(&mut self, cursor: &mut Cursor<'_>, f: fn(f32, f32) -> f32) -> Result<(), Fault> {
        let dst = cursor.next_u8()?;
        let src = cursor.next_u8()?;
        let imm = cursor.next_f32()?;
        self.registers[dst as usize] = f(self.registers[src as usize], imm);
        Ok(())
    }

    /// dst = f(a, b), two register operands.
    fn binary_reg(&mut self, cursor: &mut Cursor<'_>, f: fn(f32, f32) -> f32) -> Result<(), Fault> {
        let dst = cursor.next_u8()?;
        let a = cursor.next_u8()?;
        let b = cursor.next_u8()?;
        self.registers[dst as usize] = f(self.registers[a as usize], self.registers[b as usize]);
        Ok(())
    }

    fn compare_imm(
        &mut self,
        cursor: &mut Cursor<'_>,
        f: fn(f32, f32) -> bool,
    ) -> Result<(), Fault> {
        let reg = cursor.next_u8()?;
        let imm = cursor.next_f32()?;
        self.compare = f(self.registers[reg as usize], imm);
        Ok(())
    }

    fn compare_reg(
        &mut self,
        cursor: &mut Cursor<'_>,
        f: fn(f32, f32) -> bool,
    ) -> Result<(), Fault> {
        let a = cursor.next_u8()?;
        let b = cursor.next_u8()?;
        self.compare = f(self.registers[a as usize], self.registers[b as usize]);
        Ok(())
    }

    fn load(&self, addr: f32) -> Result<f32, Fault> {
        let idx = addr as i64;
        if idx < 0 || idx >= MEMORY_SIZE as i64 {
            return Err(Fault::MemoryRead { addr: idx });
        }
        Ok(self.memory[idx as usize])
    }

    fn store(&mut self, addr: f32, value: f32) -> Result<(), Fault> {
        let idx = addr as i64;
        if idx < 0 || idx >= MEMORY_SIZE as i64 {
            return Err(Fault::MemoryWrite { addr: idx });
        }
        self.memory[idx as usize] = value;
        Ok(())
    }

    /// Out-of-range positions fault and leave `current_led` unchanged.
    fn set_current_led(&mut self, position: i64, strip: &StripState) -> Result<(), Fault> {
        if position < 0 || position >= strip.led_count() as i64 {
            return Err(Fault::LedOutOfRange { position });
        }
        self.current_led = position as usize;
        Ok(())
    }
}
