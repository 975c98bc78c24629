//! This module implements the TTY interactive interface.
//!
//! It is mainly based on two crates:
//!   - rustyline, to handle the line-editting logic
//!   - clap, to handle the parsing of those interactive commands
//!
//! Using Parser to do this is a bit of a hack, and requires some weird options
//! to have it working but works nonetheless.

use std::collections::BTreeSet;

use clap::{CommandFactory, Parser};
use nstm_emulator::constants::{Address, Operand, STRING_TABLE_SIZE};
use nstm_emulator::runtime::{Computer, Console, Reg, Status};
use rustyline::history::DefaultHistory;
use rustyline::{Behavior, CompletionType, Config, EditMode, Editor};
use tracing::{debug, info, warn};

mod helper;
use self::helper::RunHelper;

static HELP: &str = r#"
Run "help [command]" for command-specific help.
An empty line re-runs the last valid command."#;

#[derive(Parser, Clone, Debug)]
#[command(
    help_template = "{about}\n\nCOMMANDS:\n{subcommands}\n{after-help}",
    after_help = HELP,
    disable_version_flag = true,
    infer_subcommands = true,
    no_binary_name = true
)]
/// Interactive mode commands
enum Command {
    /// Execute the next instructions
    #[command(alias = "s")]
    Step {
        /// Number of steps to execute
        #[arg(default_value = "1")]
        number: u64,
    },

    /// Exit the emulator
    Exit,

    /// Show the state of registers
    Registers {
        /// A single register to show, like `%i3`, `%f0` or `%pc`
        register: Option<Reg>,
    },

    /// Show the content of a block in the data memory
    Memory {
        /// The address of the first cell to show
        #[arg(allow_negative_numbers = true)]
        address: Operand,

        /// Number of memory cells to show.
        #[arg(default_value = "1")]
        number: u16,
    },

    /// Show the content of the string table
    Strings {
        /// The index of the first slot to show. Shows all the non-empty slots if omitted.
        #[arg(allow_negative_numbers = true)]
        index: Option<Operand>,

        /// Number of slots to show.
        #[arg(default_value = "1")]
        number: u16,
    },

    /// Show the next few instructions
    List {
        /// Number of instructions to show.
        #[arg(default_value = "10")]
        number: u16,
    },

    /// Set a breakpoint
    Break {
        /// The address where to set the breakpoint
        #[arg(allow_negative_numbers = true)]
        address: Address,
    },

    /// Remove a breakpoint
    Unbreak {
        /// The address of the breakpoint to remove
        #[arg(allow_negative_numbers = true)]
        address: Address,
    },

    /// Continue the program until the next breakpoint or the end of the program
    Continue,

    /// Show informations about the current debugging session
    Info {
        #[command(subcommand)]
        sub: Option<InfoCommand>,
    },
}

#[derive(Parser, Clone, Debug)]
enum InfoCommand {
    /// List active breakpoints
    Breakpoints,

    /// Show the number of executed instructions since the beginning of the program
    Cycles,

    /// Show the state of the computer
    State,
}

/// Holds informations about a interactive session
#[derive(Debug, Default)]
struct Session {
    /// List of active breakpoints, sorted by address
    breakpoints: BTreeSet<Address>,

    /// Current address for the `list` command
    list_address: Option<Address>,
}

impl Session {
    /// Add a breakpoint
    fn add_breakpoint(&mut self, address: Address) {
        if self.breakpoints.insert(address) {
            info!(address, "Setting a breakpoint");
        } else {
            warn!(address, "A breakpoint was already set");
        }
    }

    /// Remove a breakpoint
    fn remove_breakpoint(&mut self, address: Address) {
        if self.breakpoints.remove(&address) {
            info!(address, "Removing breakpoint");
        } else {
            warn!(address, "No breakpoint was set here");
        }
    }

    /// Checks if the given address has a breakpoint
    fn has_breakpoint(&self, address: Address) -> bool {
        self.breakpoints.contains(&address)
    }

    /// Reset the `list` command (after running an instruction)
    fn reset_list(&mut self) {
        self.list_address = None;
    }

    /// Offset the `list` command, returns the address to show
    fn offset_list(&mut self, computer: &Computer, offset: Address) -> Address {
        let addr = self.list_address.unwrap_or(computer.registers.pc);
        self.list_address = Some(addr + offset);
        addr
    }

    /// Display the list of breakpoints
    fn display_breakpoints(&self, computer: &Computer) {
        match self.breakpoints.len() {
            0 => info!("No breakpoints"),
            1 => info!("1 breakpoint:"),
            x => info!("{} breakpoints:", x),
        }

        for &addr in &self.breakpoints {
            self.display_instruction(computer, addr);
        }
    }

    /// Display an instruction at specified address
    fn display_instruction(&self, computer: &Computer, address: Address) {
        // Compute what is supposed to show in the gutter
        let is_current_line = computer.registers.pc == address;
        let has_breakpoint = self.has_breakpoint(address);

        let gutter = match (has_breakpoint, is_current_line) {
            (true, true) => "B>",
            (true, false) => "B ",
            (false, true) => " >",
            (false, false) => "  ",
        };

        // This will be `None` if the address is out of the instruction memory
        if let Ok(instruction) = computer.memory.fetch_instruction(address) {
            info!("{:<2} {:>5}    {}", gutter, address, instruction);
        } else {
            info!("{:<2} {:>5}    –", gutter, address);
        }
    }

    /// Display the number of executed instructions
    fn display_cycles(computer: &Computer) {
        info!("Cycles: {}", computer.cycles);
    }

    /// Display the lifecycle state of the computer
    fn display_state(computer: &Computer) {
        info!("State: {}", computer.state());
    }
}

/// Execute one instruction, logging the end of the program if it is reached.
///
/// Returns `true` if the program can go on.
fn step(computer: &mut Computer, console: &mut dyn Console) -> bool {
    match computer.step(console) {
        Ok(Status::Running) => true,
        Ok(Status::Halted) => {
            info!(cycles = computer.cycles, "Halted");
            false
        }
        Err(e) => {
            warn!(error = &e as &dyn std::error::Error, "Faulted");
            false
        }
    }
}

#[allow(clippy::too_many_lines)]
pub(crate) fn run_interactive(
    computer: &mut Computer,
    console: &mut dyn Console,
) -> anyhow::Result<()> {
    info!("Running in interactive mode. Type \"help\" to list available commands.");
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .behavior(Behavior::Stdio)
        .auto_add_history(true)
        .build();

    let mut session = Session::default();

    let mut rl: Editor<RunHelper, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(RunHelper::new(Command::command())));

    let mut last_command: Option<Command> = None;

    'read: loop {
        // A macro to unwrap an error, log it and continue the loop
        macro_rules! warn_and_continue {
            ($e:expr) => {
                match $e {
                    Ok(o) => o,
                    Err(e) => {
                        tracing::warn!(error = %e);
                        continue 'read;
                    }
                }
            };
        }

        if let Some(helper) = rl.helper_mut() {
            helper.refresh(computer, &session.breakpoints);
        }

        let Ok(readline) = rl.readline(">> ") else {
            info!("EOF, exitting");
            return Ok(());
        };

        let command = if readline.is_empty() {
            if let Some(command) = &last_command {
                command.clone()
            } else {
                info!("Type \"help\" to get the list of available commands");
                continue 'read;
            }
        } else {
            let Ok(words) = shell_words::split(readline.as_str()) else {
                warn!("Invalid input");
                continue 'read;
            };

            let command = warn_and_continue!(Command::try_parse_from(words));
            last_command = Some(command.clone());
            command
        };

        debug!("Executing command: {:?}", command);

        let stopped = computer.state().is_terminal();
        match (command, stopped) {
            (Command::Exit, _) => break,
            (Command::Step { number }, false) => {
                session.reset_list();

                for _ in 0..number {
                    if !step(computer, console) {
                        continue 'read;
                    }
                }
            }

            (Command::Registers { register }, _) => {
                if let Some(reg) = register {
                    info!("Register {} = {}", reg, computer.registers.get(reg));
                } else {
                    info!("Registers: {}", computer.registers);
                }
            }

            (Command::Memory { address, number }, _) => {
                for offset in 0..number {
                    let Some(address) = address.checked_add(Operand::from(offset)) else {
                        break;
                    };
                    let word = warn_and_continue!(computer.memory.load_word(address));
                    let int = warn_and_continue!(computer.memory.load_word_as_int(address));
                    let float = warn_and_continue!(computer.memory.load_word_as_float(address));
                    info!(address, int, float, "{word:#010x}");
                }
            }

            (Command::Strings { index: Some(index), number }, _) => {
                for offset in 0..number {
                    let Some(index) = index.checked_add(Operand::from(offset)) else {
                        break;
                    };
                    let text = warn_and_continue!(computer.strings.get(index));
                    info!(index, "{text:?}");
                }
            }

            (Command::Strings { index: None, .. }, _) => {
                let filled = (0..STRING_TABLE_SIZE)
                    .filter_map(|index| Operand::try_from(index).ok())
                    .filter(|&index| !computer.strings.is_empty_slot(index));

                let mut count = 0;
                for index in filled {
                    let text = computer.strings.get(index).unwrap_or_default();
                    info!(index, "{text:?}");
                    count += 1;
                }

                if count == 0 {
                    info!("The string table is empty");
                }
            }

            (Command::List { number }, _) => {
                let addr = session.offset_list(computer, Address::from(number));
                for i in 0..Address::from(number) {
                    session.display_instruction(computer, addr + i);
                }
            }

            (Command::Break { address }, _) => {
                session.add_breakpoint(address);
            }

            (Command::Unbreak { address }, _) => {
                session.remove_breakpoint(address);
            }

            (Command::Continue, false) => {
                session.reset_list();

                loop {
                    if !step(computer, console) {
                        continue 'read;
                    }

                    if session.has_breakpoint(computer.registers.pc) {
                        info!(address = computer.registers.pc, "Stopped at a breakpoint");
                        break;
                    }
                }
            }

            (Command::Info { sub }, _) => match sub {
                Some(InfoCommand::Breakpoints) => {
                    session.display_breakpoints(computer);
                }
                Some(InfoCommand::Cycles) => {
                    Session::display_cycles(computer);
                }
                Some(InfoCommand::State) => {
                    Session::display_state(computer);
                }
                None => {
                    session.display_breakpoints(computer);
                    info!("–");
                    Session::display_cycles(computer);
                    Session::display_state(computer);
                }
            },

            (Command::Step { .. } | Command::Continue, true) => {
                // The program ended but the user asked to continue, we just warn
                warn!("Computer is {}. Use \"exit\" to quit", computer.state());
            }
        }
    }

    Ok(())
}
