pub trait OpCode {
    fn op_code(&self) -> u8;
}

/// Function commands understood by all three supported models.
///
/// ROM-level commands (match, skip, search) are the transport's business and
/// never appear here.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    ConvertT = 0x44,
    WriteScratchpad = 0x4E,
    ReadScratchpad = 0xBE,
    CopyScratchpad = 0x48,
    ReadPowerSupply = 0xB4,
}

impl OpCode for Command {
    fn op_code(&self) -> u8 {
        *self as _
    }
}
