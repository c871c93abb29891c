//! Register/memory execution model for strip bytecode.

pub mod cursor;
pub mod error;
mod execute;
pub mod ops;

pub use cursor::Cursor;
pub use error::Fault;
pub use ops::Opcode;

use crate::program::Program;
use crate::strip::StripState;

pub const REGISTER_COUNT: usize = 256;
pub const MEMORY_SIZE: usize = 4096;

/// Per-pass instruction budget. A pass that hits it faults instead of
/// wedging the scheduler.
pub const MAX_INSTRS: u32 = 100_000;

/// Tick period applied whenever a program is installed.
pub const DEFAULT_PERIOD_MS: u32 = 1000;

/// Feedback mask for the 32-bit Galois generator behind `getrng`.
const RNG_FEEDBACK: u32 = 0x8020_0003;

/// Whether the pass continues after an instruction.
pub(crate) enum Flow {
    Continue,
    Halt,
}

/// Everything a pass reads and writes besides the color buffer.
///
/// There is exactly one of these per process, owned by the scheduler while a
/// pass runs. Registers, the compare flag and the cursor are transient per
/// pass; memory lives for the lifetime of one installed program; ticks,
/// period and the RNG state persist across passes and ticks.
pub struct Context {
    pub registers: [f32; REGISTER_COUNT],
    pub memory: Box<[f32; MEMORY_SIZE]>,
    pub compare: bool,
    pub current_led: usize,
    pub ticks: u32,
    pub period_ms: u32,
    pub rng: u32,
    instrs: u32,
}

impl Context {
    pub fn new() -> Self {
        Self {
            registers: [0.0; REGISTER_COUNT],
            memory: Box::new([0.0; MEMORY_SIZE]),
            compare: false,
            current_led: 0,
            ticks: 0,
            period_ms: DEFAULT_PERIOD_MS,
            rng: 0,
            instrs: 0,
        }
    }

    /// Reset the per-program state after an install. The RNG state
    /// deliberately survives program replacement.
    pub fn reset_for_program(&mut self) {
        self.ticks = 0;
        self.period_ms = DEFAULT_PERIOD_MS;
        self.memory.fill(0.0);
    }

    /// Run one pass over `program`, from the reset cursor to a halt, the end
    /// of the program, or a fault.
    pub fn run_pass(&mut self, program: &Program, strip: &mut StripState) -> Result<(), Fault> {
        self.registers = [0.0; REGISTER_COUNT];
        self.compare = false;
        self.instrs = 0;

        let mut cursor = Cursor::new(program.buffer(), Program::CODE_START);

        loop {
            if cursor.pos() >= program.len() {
                return Ok(());
            }

            let byte = cursor.next_u8()?;
            let op = Opcode::from_byte(byte).ok_or(Fault::InvalidOpcode { opcode: byte })?;

            // The generator moves in lockstep with every dispatched
            // instruction, whether or not the instruction reads it and
            // whether or not its handler faults.
            let flow = match self.exec(op, &mut cursor, strip) {
                Ok(flow) => flow,
                Err(fault) => {
                    self.step_rng();
                    return Err(fault);
                }
            };
            self.step_rng();

            self.instrs += 1;
            if let Flow::Halt = flow {
                return Ok(());
            }
            if self.instrs >= MAX_INSTRS {
                return Err(Fault::InstructionCap);
            }
        }
    }

    /// One step of the Galois generator. States 0 and 1 are special-cased:
    /// 1 steps to 0, and 0 steps as if it were 1.
    pub fn step_rng(&mut self) {
        if self.rng == 1 {
            self.rng = 0;
            return;
        }

        if self.rng == 0 {
            self.rng = 1;
        }
        self.rng = (self.rng >> 1) ^ ((self.rng & 1).wrapping_neg() & RNG_FEEDBACK);
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
