use thiserror::Error;

use super::instructions::Instruction;
use crate::constants::{Address, Operand};

/// Kind of run-time faults
///
/// Every fault is fatal: there is no way for a program to recover from one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    #[error("invalid opcode {0}")]
    InvalidOpcode(u8),

    #[error("register index {0} out of range")]
    OperandOutOfRange(Operand),

    #[error("instruction address {0} out of range")]
    InstructionAddressOutOfRange(Address),

    #[error("data address {0} out of range")]
    DataAddressOutOfRange(Operand),

    #[error("string index {0} out of range")]
    StringIndexOutOfRange(Operand),

    #[error("string of {length} characters is too long")]
    StringTooLong { length: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid boolean value {0}")]
    InvalidBooleanValue(i32),

    #[error("invalid syscall code {0}")]
    InvalidSyscall(Operand),

    #[error(
        "could not read {expected} from input (got {})",
        .token.as_deref().unwrap_or("end of input")
    )]
    IoParseError {
        expected: &'static str,
        token: Option<String>,
    },

    #[error("I/O error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for FaultKind {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.kind())
    }
}

/// The diagnostic record of a faulted run
#[derive(Error, Debug, Clone, PartialEq)]
pub struct Fault {
    pub kind: FaultKind,

    /// Address of the instruction being executed (or fetched) when the fault occurred
    pub pc: Address,

    /// The faulting instruction, if it could be fetched
    pub instruction: Option<Instruction>,
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.instruction {
            Some(instruction) => write!(f, "{} at {} (\"{}\")", self.kind, self.pc, instruction),
            None => write!(f, "{} at {}", self.kind, self.pc),
        }
    }
}
