use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};

#[derive(Parser, Debug)]
pub struct PrintOpt {
    /// Input file
    #[arg(value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,
}

impl PrintOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let program = super::read_program(&self.input)?;
        print!("{program}");

        Ok(())
    }
}
