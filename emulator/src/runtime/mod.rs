//! The execution engine.
//!
//! A [`Computer`] owns everything a run needs: the register file, the instruction and data
//! memories, the string table and the string constants of the program. It repeatedly fetches the
//! instruction at `%pc`, decodes it and executes it, until it halts or faults.

use parse_display::Display;
use tracing::{debug, info, warn};

use crate::constants::Address;

mod fault;
mod instructions;
mod memory;
mod opcode;
mod registers;
mod strings;
mod syscall;

pub use self::fault::{Fault, FaultKind};
pub use self::instructions::{Decoded, Instruction};
pub use self::memory::Memory;
pub use self::opcode::{
    ArithOp, Bank, CompareKind, Comparison, Opcode, OpcodeInfo, Operation, UnknownMnemonic,
    UnknownOpcode,
};
pub use self::registers::{Reg, Registers};
pub use self::strings::StringTable;
pub use self::syscall::{Console, StdConsole, StdioConsole, Syscall};

pub(crate) use self::strings::check_length;

use self::instructions::Flow;

/// Lifecycle of a computer
#[derive(Debug, Clone, PartialEq, Default, Display)]
#[display(style = "lowercase")]
pub enum State {
    /// A program was loaded, nothing was executed yet
    #[default]
    Loaded,

    Running,

    /// A `HALT` instruction was executed
    Halted,

    /// The run was stopped by a fault
    #[display("faulted ({0})")]
    Faulted(Fault),
}

impl State {
    /// Check if the computer can't run anymore
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Halted | Self::Faulted(_))
    }
}

/// Result of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted,
}

#[derive(Default)]
pub struct Computer {
    pub registers: Registers,
    pub memory: Memory,
    pub strings: StringTable,

    /// String constants of the program, referenced by `SSTR`
    pub(crate) constants: Vec<String>,

    state: State,

    /// Number of executed instructions
    pub cycles: usize,
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computer {{ registers: {:?}, state: {:?}, memory: [...] }}",
            self.registers, self.state
        )
    }
}

impl Computer {
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The fault that stopped the run, if any
    #[must_use]
    pub fn fault(&self) -> Option<&Fault> {
        match &self.state {
            State::Faulted(fault) => Some(fault),
            _ => None,
        }
    }

    /// String constants of the loaded program
    #[must_use]
    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    /// Record a fault and stop the computer
    fn raise(&mut self, kind: FaultKind, pc: Address, instruction: Option<Instruction>) -> Fault {
        let fault = Fault {
            kind,
            pc,
            instruction,
        };
        warn!(%fault, "Computer faulted");
        self.state = State::Faulted(fault.clone());
        fault
    }

    /// Execute one instruction
    ///
    /// Stepping a halted computer does nothing.
    ///
    /// # Errors
    ///
    /// Returns the fault record if the instruction faulted, or if the computer already faulted
    /// before.
    #[tracing::instrument(skip(self, console), level = "debug")]
    pub fn step(&mut self, console: &mut dyn Console) -> Result<Status, Fault> {
        match &self.state {
            State::Halted => return Ok(Status::Halted),
            State::Faulted(fault) => return Err(fault.clone()),
            State::Loaded | State::Running => {}
        }
        self.state = State::Running;

        let pc = self.registers.pc();
        let instruction = self
            .memory
            .fetch_instruction(pc)
            .map_err(|kind| self.raise(kind, pc, None))?;

        let flow = instruction.decode().and_then(|decoded| {
            info!("Executing instruction \"{}\"", decoded);
            decoded.execute(pc, self, console)
        });
        self.cycles += 1;

        match flow {
            Ok(Flow::Next) => self.registers.set_pc(pc + 1),
            Ok(Flow::Jump(target)) => self.registers.set_pc(target),
            Ok(Flow::Halt) => {
                info!(cycles = self.cycles, "Computer halted");
                self.state = State::Halted;
                return Ok(Status::Halted);
            }
            Err(kind) => return Err(self.raise(kind, pc, Some(instruction))),
        }

        debug!("Register state {}", self.registers);
        Ok(Status::Running)
    }

    /// Run the program until it halts
    ///
    /// # Errors
    ///
    /// Returns the fault record if the program faulted.
    #[tracing::instrument(skip(self, console))]
    pub fn run(&mut self, console: &mut dyn Console) -> Result<(), Fault> {
        while self.step(console)? == Status::Running {}
        Ok(())
    }
}
