//! Runtime faults for the bytecode VM.

use thiserror::Error;

/// Conditions that abort the in-progress pass.
///
/// A fault never stops the scheduler; the error reporter swaps in the
/// built-in indicator pattern so the failure is visible on the strip itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    /// Opcode byte with no assigned handler.
    #[error("invalid opcode {opcode:02x}")]
    InvalidOpcode { opcode: u8 },

    /// Memory load with an address outside the 4096-cell store.
    #[error("out of bounds memory read (addr {addr})")]
    MemoryRead { addr: i64 },

    /// Memory store with an address outside the 4096-cell store.
    #[error("out of bounds memory write (addr {addr})")]
    MemoryWrite { addr: i64 },

    /// Position opcode pointing outside the strip.
    #[error("tried to set led outside the strip (position {position})")]
    LedOutOfRange { position: i64 },

    /// Zero divisor in a divide, modulo or remainder opcode. `op` names the
    /// offending mnemonic.
    #[error("{op} by zero")]
    DivideByZero { op: &'static str },

    /// A single pass ran 100000 instructions without halting.
    #[error("exceeded instruction cap")]
    InstructionCap,

    /// Operand bytes would extend past the end of the program buffer.
    #[error("unexpected end of program")]
    UnexpectedEnd,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_display_formats() {
        assert_eq!(
            Fault::InvalidOpcode { opcode: 0x3B }.to_string(),
            "invalid opcode 3b"
        );
        assert_eq!(
            Fault::MemoryWrite { addr: 5000 }.to_string(),
            "out of bounds memory write (addr 5000)"
        );
        assert_eq!(
            Fault::DivideByZero { op: "modi" }.to_string(),
            "modi by zero"
        );
        assert_eq!(
            Fault::InstructionCap.to_string(),
            "exceeded instruction cap"
        );
    }
}
