mod completion;
mod print;
mod run;

#[derive(clap::Subcommand)]
pub enum Subcommand {
    /// Parse, load and run a program
    Run(self::run::RunOpt),

    /// Print the program as parsed
    Print(self::print::PrintOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Self::Run(opt) => opt.exec(),
            Self::Print(opt) => opt.exec(),
            Self::Completion(opt) => opt.exec(),
        }
    }
}

/// Read and parse a listing. Exits after printing a report if the listing is invalid.
fn read_program(input: &camino::Utf8Path) -> anyhow::Result<nstm_emulator::Program> {
    tracing::info!(path = %input, "Reading program");
    let source = std::fs::read_to_string(input)
        .map_err(|e| anyhow::anyhow!("could not read {input}: {e}"))?;

    tracing::debug!("Parsing program");
    match nstm_emulator::parse(&source) {
        Ok(program) => Ok(program),
        Err(e) => {
            let report =
                miette::Report::new(e).with_source_code(miette::NamedSource::new(input, source));
            eprintln!("{report:?}");
            std::process::exit(1);
        }
    }
}
