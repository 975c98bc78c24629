use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};

use anstyle::Style;
use clap::Command;
use nstm_emulator::constants::{
    Address, Operand, FLOAT_REGS_COUNT, INT_REGS_COUNT, STRING_TABLE_SIZE,
};
use nstm_emulator::runtime::{Computer, Reg};
use rustyline::{
    completion::Completer,
    highlight::Highlighter,
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
    Context,
};
use rustyline_derive::Helper;

/// Rustyline helper for the debugger prompt.
///
/// Commands are completed from the clap command tree, and arguments from a snapshot of the
/// machine taken before each prompt.
#[derive(Helper, Debug)]
pub(crate) struct RunHelper {
    command: Command,

    /// Current `%pc`, suggested by `break`
    pc: Address,

    /// Active breakpoints, suggested by `unbreak`
    breakpoints: Vec<Address>,

    /// Non-empty string slots, suggested by `strings`
    strings: Vec<Operand>,
}

impl RunHelper {
    pub(crate) fn new(command: Command) -> Self {
        Self {
            command,
            pc: 0,
            breakpoints: Vec::new(),
            strings: Vec::new(),
        }
    }

    /// Take a new snapshot of the machine
    pub(crate) fn refresh(&mut self, computer: &Computer, breakpoints: &BTreeSet<Address>) {
        self.pc = computer.registers.pc;
        self.breakpoints = breakpoints.iter().copied().collect();
        self.strings = (0..STRING_TABLE_SIZE)
            .filter_map(|index| Operand::try_from(index).ok())
            .filter(|&index| !computer.strings.is_empty_slot(index))
            .collect();
    }

    /// Values worth suggesting for a positional argument of a command
    fn argument_values(&self, command: &str, argument: &str) -> Vec<String> {
        match (command, argument) {
            ("registers", "register") => {
                let ints = (0..INT_REGS_COUNT).filter_map(|i| u8::try_from(i).ok().map(Reg::Int));
                let floats =
                    (0..FLOAT_REGS_COUNT).filter_map(|i| u8::try_from(i).ok().map(Reg::Float));
                std::iter::once(Reg::PC)
                    .chain(ints)
                    .chain(floats)
                    .map(|reg| reg.to_string())
                    .collect()
            }
            ("break", "address") => vec![self.pc.to_string()],
            ("unbreak", "address") => self.breakpoints.iter().map(ToString::to_string).collect(),
            ("strings", "index") => self.strings.iter().map(ToString::to_string).collect(),
            _ => Vec::new(),
        }
    }

    /// Find the candidates for the last word of the input, and the length of what they replace
    fn suggest(&self, command: &Command, input: &[String]) -> (usize, HashSet<String>) {
        if let [head, tail @ ..] = input {
            if let Some(sub) = command.find_subcommand(head).filter(|_| !tail.is_empty()) {
                return self.suggest(sub, tail);
            }
        }

        let Some(last) = input.last() else {
            return (0, HashSet::new());
        };

        let mut candidates = HashSet::new();
        if input.len() == 1 && command.has_subcommands() {
            candidates.extend(command.get_subcommands().flat_map(|cmd| {
                std::iter::once(cmd.get_name().to_owned())
                    .chain(cmd.get_visible_aliases().map(ToOwned::to_owned))
            }));
            candidates.insert("help".to_owned());
        }

        if let Some(arg) = command.get_positionals().nth(input.len() - 1) {
            candidates.extend(self.argument_values(command.get_name(), arg.get_id().as_str()));
        }

        candidates.retain(|candidate| candidate.starts_with(last.as_str()));
        (last.len(), candidates)
    }

    /// Split the line in words, with an empty last word if the cursor is after a space
    fn words(line: &str) -> Option<Vec<String>> {
        let mut words = shell_words::split(line).ok()?;
        if line.ends_with([' ', '\t']) || line.is_empty() {
            words.push(String::new());
        }
        Some(words)
    }

    fn complete_line(&self, line: &str) -> (usize, Vec<String>) {
        let Some(words) = Self::words(line) else {
            return (0, Vec::new());
        };

        let (offset, candidates) = self.suggest(&self.command, &words);
        let mut candidates: Vec<_> = candidates.into_iter().collect();
        candidates.sort_unstable();
        (line.len().saturating_sub(offset), candidates)
    }

    fn hint_line(&self, line: &str) -> Option<String> {
        let words = Self::words(line)?;
        let (offset, candidates) = self.suggest(&self.command, &words);

        let candidates: Vec<_> = candidates.into_iter().collect();
        match candidates.as_slice() {
            [candidate] => candidate.get(offset..).map(ToOwned::to_owned),
            _ => None,
        }
    }
}

impl Completer for RunHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        Ok(self.complete_line(&line[..pos]))
    }
}

impl Highlighter for RunHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        let style = Style::new().dimmed();
        Cow::Owned(format!("{}{hint}{}", style.render(), style.render_reset()))
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        let style = Style::new().bold();
        Cow::Owned(format!("{}{prompt}{}", style.render(), style.render_reset()))
    }
}

impl Hinter for RunHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        // Hinting an empty prompt would always show the same command
        if pos == 0 {
            return None;
        }
        self.hint_line(&line[..pos])
    }
}

impl Validator for RunHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        // Unbalanced quotes continue on the next line
        if shell_words::split(ctx.input()).is_err() {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}
