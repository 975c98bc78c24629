/// Program counter and instruction memory addresses.
///
/// Wide enough to hold a branch target that fell outside of the instruction memory, so that the
/// fault can be raised on the next fetch.
pub type Address = i64;

/// Raw operand field of an instruction
pub type Operand = i32;

/// Raw content of a data memory cell
pub type Word = u32;

/// Number of integer registers (`i0` to `i31`)
pub const INT_REGS_COUNT: usize = 32;

/// Number of floating-point registers (`f0` to `f31`)
pub const FLOAT_REGS_COUNT: usize = 32;

/// Size of the instruction memory
pub const INSTR_MEM_SIZE: usize = 1024;

/// Size of the data memory
pub const DATA_MEM_SIZE: usize = 1024;

/// Number of slots in the string table
pub const STRING_TABLE_SIZE: usize = 1024;

/// Maximum length of a string, in characters
pub const MAX_STRING_LEN: usize = 128;
