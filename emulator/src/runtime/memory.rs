use super::fault::FaultKind;
use super::instructions::Instruction;
use crate::constants::{Address, Operand, Word, DATA_MEM_SIZE, INSTR_MEM_SIZE};

/// Holds the instruction memory and the data memory of the computer.
///
/// They are two separate address spaces: the program can never read or overwrite its own
/// instructions.
#[derive(Clone)]
pub struct Memory {
    instructions: Box<[Instruction]>,
    data: Box<[Word]>,
}

impl Default for Memory {
    fn default() -> Self {
        // Unused instruction slots decode to `HALT`
        Self {
            instructions: vec![Instruction::default(); INSTR_MEM_SIZE].into_boxed_slice(),
            data: vec![0; DATA_MEM_SIZE].into_boxed_slice(),
        }
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory").finish_non_exhaustive()
    }
}

impl Memory {
    /// Get the instruction at an address
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::InstructionAddressOutOfRange`] if the address is not in the
    /// instruction memory.
    pub fn fetch_instruction(&self, address: Address) -> Result<Instruction, FaultKind> {
        usize::try_from(address)
            .ok()
            .and_then(|a| self.instructions.get(a))
            .copied()
            .ok_or(FaultKind::InstructionAddressOutOfRange(address))
    }

    /// Copy a program at the start of the instruction memory. Only used when loading a program.
    ///
    /// Returns `false` if it does not fit.
    pub(crate) fn load_instructions(&mut self, program: &[Instruction]) -> bool {
        match self.instructions.get_mut(..program.len()) {
            Some(slots) => {
                slots.copy_from_slice(program);
                true
            }
            None => false,
        }
    }

    fn cell(&self, address: Operand) -> Result<Word, FaultKind> {
        usize::try_from(address)
            .ok()
            .and_then(|a| self.data.get(a))
            .copied()
            .ok_or(FaultKind::DataAddressOutOfRange(address))
    }

    fn cell_mut(&mut self, address: Operand) -> Result<&mut Word, FaultKind> {
        usize::try_from(address)
            .ok()
            .and_then(|a| self.data.get_mut(a))
            .ok_or(FaultKind::DataAddressOutOfRange(address))
    }

    /// Get the raw bits of a data cell
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::DataAddressOutOfRange`] if the address is not in the data memory.
    pub fn load_word(&self, address: Operand) -> Result<Word, FaultKind> {
        self.cell(address)
    }

    /// Read a data cell as an integer
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::DataAddressOutOfRange`] if the address is not in the data memory.
    #[allow(clippy::cast_possible_wrap)]
    pub fn load_word_as_int(&self, address: Operand) -> Result<i32, FaultKind> {
        self.cell(address).map(|w| w as i32)
    }

    /// Read a data cell as a float. The bits are reinterpreted, whatever was stored there.
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::DataAddressOutOfRange`] if the address is not in the data memory.
    pub fn load_word_as_float(&self, address: Operand) -> Result<f32, FaultKind> {
        self.cell(address).map(f32::from_bits)
    }

    /// Write raw bits to a data cell
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::DataAddressOutOfRange`] if the address is not in the data memory.
    pub fn store_word(&mut self, address: Operand, word: Word) -> Result<(), FaultKind> {
        *self.cell_mut(address)? = word;
        Ok(())
    }

    /// Write an integer to a data cell
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::DataAddressOutOfRange`] if the address is not in the data memory.
    #[allow(clippy::cast_sign_loss)]
    pub fn store_word_as_int(&mut self, address: Operand, value: i32) -> Result<(), FaultKind> {
        self.store_word(address, value as Word)
    }

    /// Write a float to a data cell
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::DataAddressOutOfRange`] if the address is not in the data memory.
    pub fn store_word_as_float(&mut self, address: Operand, value: f32) -> Result<(), FaultKind> {
        self.store_word(address, value.to_bits())
    }
}
