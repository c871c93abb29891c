//! The closed opcode set and its wire numbering.

/// Every assigned opcode byte.
///
/// The numbering is part of the wire format and must not change. The gaps
/// between groups are unassigned bytes; they decode to `None` and fault.
/// The color-write and period mnemonics come in an immediate (`..I`) and a
/// register (`..R`) form; under HSV mode the color writes are conventionally
/// spelled huei/sati/vali but the encoding is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x00,

    // Mode and timing configuration
    Rgb = 0x01,
    Hsv = 0x02,
    PeriodI = 0x03,
    PeriodR = 0x04,

    // Color writes for the current LED
    RedI = 0x05,
    GreenI = 0x06,
    BlueI = 0x07,
    RedR = 0x08,
    GreenR = 0x09,
    BlueR = 0x0A,

    // Read-only accessors
    GetPos = 0x0B,
    GetPosEnd = 0x0C,
    GetTicks = 0x0D,
    GetRng = 0x0E,
    GetNumLeds = 0x0F,

    // Arithmetic
    MovI = 0x10,
    MovR = 0x11,
    AddI = 0x12,
    AddR = 0x13,
    SubR = 0x14,
    MulI = 0x15,
    MulR = 0x16,
    DivI = 0x17,
    DivR = 0x18,
    ModI = 0x19,
    ModR = 0x1A,
    RemI = 0x1B,
    RemR = 0x1C,

    // Transcendental and rounding
    SinR = 0x1D,
    CosR = 0x1E,
    TanR = 0x1F,
    AsinR = 0x20,
    AcosR = 0x21,
    AtanR = 0x22,
    Atan2R = 0x23,
    SqrtR = 0x24,
    FloorR = 0x25,
    CeilR = 0x26,
    RoundR = 0x27,

    // Range selection
    MinI = 0x28,
    MinR = 0x29,
    MaxI = 0x2A,
    MaxR = 0x2B,
    ClampI = 0x2C,
    AbsR = 0x2D,

    // Control flow
    Goto = 0x30,
    Jt = 0x31,
    Jf = 0x32,
    HaltT = 0x33,
    HaltF = 0x34,

    // Comparison
    GetCmp = 0x40,
    Cz = 0x41,
    Cnz = 0x42,
    CeqI = 0x43,
    CeqR = 0x44,
    CltI = 0x45,
    CltR = 0x46,
    CleI = 0x47,
    CleR = 0x48,
    CgtI = 0x49,
    CgtR = 0x4A,
    CgeI = 0x4B,
    CgeR = 0x4C,

    // Scalar memory
    LoadI = 0x50,
    LoadR = 0x51,
    StoreI = 0x52,
    StoreR = 0x53,

    // Position
    PosI = 0x60,
    PosR = 0x61,
    PosEndI = 0x62,
    PosEndR = 0x63,

    Halt = 0xFF,
}

impl Opcode {
    /// Decode one opcode byte. `None` is an unassigned byte, which the
    /// execution loop turns into an invalid-opcode fault.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        use Opcode::*;

        Some(match byte {
            0x00 => Nop,
            0x01 => Rgb,
            0x02 => Hsv,
            0x03 => PeriodI,
            0x04 => PeriodR,
            0x05 => RedI,
            0x06 => GreenI,
            0x07 => BlueI,
            0x08 => RedR,
            0x09 => GreenR,
            0x0A => BlueR,
            0x0B => GetPos,
            0x0C => GetPosEnd,
            0x0D => GetTicks,
            0x0E => GetRng,
            0x0F => GetNumLeds,
            0x10 => MovI,
            0x11 => MovR,
            0x12 => AddI,
            0x13 => AddR,
            0x14 => SubR,
            0x15 => MulI,
            0x16 => MulR,
            0x17 => DivI,
            0x18 => DivR,
            0x19 => ModI,
            0x1A => ModR,
            0x1B => RemI,
            0x1C => RemR,
            0x1D => SinR,
            0x1E => CosR,
            0x1F => TanR,
            0x20 => AsinR,
            0x21 => AcosR,
            0x22 => AtanR,
            0x23 => Atan2R,
            0x24 => SqrtR,
            0x25 => FloorR,
            0x26 => CeilR,
            0x27 => RoundR,
            0x28 => MinI,
            0x29 => MinR,
            0x2A => MaxI,
            0x2B => MaxR,
            0x2C => ClampI,
            0x2D => AbsR,
            0x30 => Goto,
            0x31 => Jt,
            0x32 => Jf,
            0x33 => HaltT,
            0x34 => HaltF,
            0x40 => GetCmp,
            0x41 => Cz,
            0x42 => Cnz,
            0x43 => CeqI,
            0x44 => CeqR,
            0x45 => CltI,
            0x46 => CltR,
            0x47 => CleI,
            0x48 => CleR,
            0x49 => CgtI,
            0x4A => CgtR,
            0x4B => CgeI,
            0x4C => CgeR,
            0x50 => LoadI,
            0x51 => LoadR,
            0x52 => StoreI,
            0x53 => StoreR,
            0x60 => PosI,
            0x61 => PosR,
            0x62 => PosEndI,
            0x63 => PosEndR,
            0xFF => Halt,
            _ => return None,
        })
    }
}
