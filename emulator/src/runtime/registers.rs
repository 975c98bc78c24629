use parse_display::{Display, FromStr};

use super::fault::FaultKind;
use crate::constants::{self as C, Address, Operand};

/// Register file of the machine
///
/// Two banks of 32 registers, one for integers and one for floats, and the program counter.
/// There is no implicit conversion between the two banks.
#[derive(Debug, Clone, PartialEq)]
pub struct Registers {
    int: [i32; C::INT_REGS_COUNT],
    float: [f32; C::FLOAT_REGS_COUNT],

    /// Program counter
    pub pc: Address,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            int: [0; C::INT_REGS_COUNT],
            float: [0.0; C::FLOAT_REGS_COUNT],
            pc: 0,
        }
    }
}

/// Validate a register index against the size of a bank
fn index(idx: Operand, count: usize) -> Result<usize, FaultKind> {
    usize::try_from(idx)
        .ok()
        .filter(|&i| i < count)
        .ok_or(FaultKind::OperandOutOfRange(idx))
}

impl Registers {
    /// Read an integer register
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::OperandOutOfRange`] if the index is not in `[0, 31]`.
    pub fn read_int(&self, idx: Operand) -> Result<i32, FaultKind> {
        Ok(self.int[index(idx, C::INT_REGS_COUNT)?])
    }

    /// Write an integer register
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::OperandOutOfRange`] if the index is not in `[0, 31]`.
    pub fn write_int(&mut self, idx: Operand, value: i32) -> Result<(), FaultKind> {
        self.int[index(idx, C::INT_REGS_COUNT)?] = value;
        Ok(())
    }

    /// Read a floating-point register
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::OperandOutOfRange`] if the index is not in `[0, 31]`.
    pub fn read_float(&self, idx: Operand) -> Result<f32, FaultKind> {
        Ok(self.float[index(idx, C::FLOAT_REGS_COUNT)?])
    }

    /// Write a floating-point register
    ///
    /// # Errors
    ///
    /// Fails with [`FaultKind::OperandOutOfRange`] if the index is not in `[0, 31]`.
    pub fn write_float(&mut self, idx: Operand, value: f32) -> Result<(), FaultKind> {
        self.float[index(idx, C::FLOAT_REGS_COUNT)?] = value;
        Ok(())
    }

    #[must_use]
    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn set_pc(&mut self, address: Address) {
        self.pc = address;
    }

    /// Get the value of a register, formatted for display
    #[must_use]
    pub fn get(&self, reg: Reg) -> String {
        match reg {
            Reg::Int(i) => self.int.get(usize::from(i)).map(ToString::to_string),
            Reg::Float(i) => self.float.get(usize::from(i)).map(ToString::to_string),
            Reg::PC => Some(self.pc.to_string()),
        }
        .unwrap_or_else(|| "–".to_owned())
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%pc = {}", self.pc)?;

        // Only show the registers that were written to
        for (i, v) in self.int.iter().enumerate().filter(|(_, v)| **v != 0) {
            write!(f, " | %i{i} = {v}")?;
        }

        for (i, v) in self.float.iter().enumerate().filter(|(_, v)| **v != 0.0) {
            write!(f, " | %f{i} = {v}")?;
        }

        Ok(())
    }
}

/// A register name, as typed in the interactive mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromStr)]
pub enum Reg {
    /// Integer register
    #[display("%i{0}")]
    Int(u8),

    /// Floating-point register
    #[display("%f{0}")]
    Float(u8),

    /// Program counter
    #[display("%pc")]
    PC,
}
