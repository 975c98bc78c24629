//! Load a program in a fresh [`Computer`].
//!
//! A [`Program`] is everything needed before a run starts: the instructions, the initial content
//! of the data memory and the string constants referenced by `SSTR` instructions.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::constants::{Word, INSTR_MEM_SIZE, STRING_TABLE_SIZE};
use crate::runtime::{check_length, Computer, FaultKind, Instruction};

/// A program, ready to be loaded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// Instructions, placed from address 0
    pub instructions: Vec<Instruction>,

    /// Initial content of the data memory, as raw bits
    pub data: BTreeMap<usize, Word>,

    /// String constants, indexed by the operand of `SSTR`
    pub constants: Vec<String>,
}

impl Program {
    #[must_use]
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            ..Self::default()
        }
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Set the initial value of a data cell to an integer
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn with_int(mut self, address: usize, value: i32) -> Self {
        self.data.insert(address, value as Word);
        self
    }

    /// Set the initial value of a data cell to a float
    #[must_use]
    pub fn with_float(mut self, address: usize, value: f32) -> Self {
        self.data.insert(address, value.to_bits());
        self
    }

    /// Add a string constant, returning its index. The same string is only stored once.
    pub fn intern(&mut self, text: &str) -> usize {
        if let Some(index) = self.constants.iter().position(|c| c == text) {
            index
        } else {
            self.constants.push(text.to_owned());
            self.constants.len() - 1
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error(
        "program has {0} instructions, but the instruction memory only holds {}",
        INSTR_MEM_SIZE
    )]
    ProgramTooLarge(usize),

    #[error("data address {0} out of range")]
    DataAddressOutOfRange(usize),

    #[error(
        "program has {0} string constants, but the string table only holds {}",
        STRING_TABLE_SIZE
    )]
    TooManyConstants(usize),

    #[error("string constant {index} is invalid: {kind}")]
    InvalidConstant { index: usize, kind: FaultKind },
}

/// Load a program in a new computer
///
/// # Errors
///
/// This function will return an error if any part of the program does not fit in the computer
#[tracing::instrument(skip(program), fields(instructions = program.instructions.len()))]
pub fn load(program: Program) -> Result<Computer, LoadError> {
    let mut computer = Computer::default();

    if !computer.memory.load_instructions(&program.instructions) {
        return Err(LoadError::ProgramTooLarge(program.instructions.len()));
    }

    for (&address, &word) in &program.data {
        let error = || LoadError::DataAddressOutOfRange(address);
        let cell = i32::try_from(address).map_err(|_| error())?;
        computer
            .memory
            .store_word(cell, word)
            .map_err(|_| error())?;
    }

    if program.constants.len() > STRING_TABLE_SIZE {
        return Err(LoadError::TooManyConstants(program.constants.len()));
    }

    for (index, constant) in program.constants.iter().enumerate() {
        check_length(constant).map_err(|kind| LoadError::InvalidConstant { index, kind })?;
    }

    debug!(
        data = program.data.len(),
        constants = program.constants.len(),
        "Program loaded"
    );
    computer.constants = program.constants;

    Ok(computer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Opcode, State};

    #[test]
    fn load_test() {
        let mut program = Program::new(vec![
            Instruction::new(Opcode::LdwI, 0, 10, 0),
            Instruction::new(Opcode::LdwF, 0, 11, 0),
        ])
        .with_int(10, -5)
        .with_float(11, 0.25);
        let index = program.intern("hello");
        assert_eq!(program.intern("world"), 1);
        assert_eq!(program.intern("hello"), index);

        let computer = load(program).unwrap();
        assert_eq!(computer.state(), &State::Loaded);
        assert_eq!(computer.memory.load_word_as_int(10), Ok(-5));
        assert_eq!(computer.memory.load_word_as_float(11), Ok(0.25));
        assert_eq!(
            computer.memory.fetch_instruction(1),
            Ok(Instruction::new(Opcode::LdwF, 0, 11, 0))
        );
        assert_eq!(computer.constants(), ["hello", "world"]);
        // Constants only reach the string table through `SSTR`
        assert!(computer.strings.is_empty_slot(0));
    }

    #[test]
    fn load_error_test() {
        let program = Program::new(vec![Instruction::default(); 1025]);
        assert_eq!(load(program).unwrap_err(), LoadError::ProgramTooLarge(1025));

        let program = Program::new(vec![Instruction::default(); 1024]);
        assert!(load(program).is_ok());

        let program = Program::default().with_int(1024, 1);
        assert_eq!(
            load(program).unwrap_err(),
            LoadError::DataAddressOutOfRange(1024)
        );

        let mut program = Program::default();
        program.intern(&"x".repeat(129));
        assert_eq!(
            load(program).unwrap_err(),
            LoadError::InvalidConstant {
                index: 0,
                kind: FaultKind::StringTooLong { length: 129 }
            }
        );

        let program = Program {
            constants: vec![String::new(); 1025],
            ..Program::default()
        };
        assert_eq!(load(program).unwrap_err(), LoadError::TooManyConstants(1025));
    }
}
