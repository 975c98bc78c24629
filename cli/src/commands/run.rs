use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueHint};
use nstm_emulator::load;
use nstm_emulator::runtime::StdioConsole;
use tracing::{debug, info};

use crate::interactive::run_interactive;

#[derive(Parser, Debug)]
pub struct RunOpt {
    /// Input file
    #[arg(value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Run the program in interactive mode
    #[arg(short, long, action = ArgAction::SetTrue)]
    interactive: bool,
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let program = super::read_program(&self.input)?;

        debug!("Loading program");
        let mut computer = load(program)?;
        let mut console = StdioConsole::default();

        info!("Running program");
        if self.interactive {
            run_interactive(&mut computer, &mut console)?;
        } else {
            computer.run(&mut console)?;
        }

        info!(
            registers = %computer.registers,
            cycles = computer.cycles,
            state = %computer.state(),
            "End of program"
        );

        // The debugger leaves a faulted computer behind instead of failing
        if let Some(fault) = computer.fault() {
            return Err(fault.clone().into());
        }

        Ok(())
    }
}
