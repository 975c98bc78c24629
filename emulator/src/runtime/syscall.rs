//! System calls, the only way for a program to talk to the outside world.
//!
//! Input is read one whitespace-delimited token at a time, output is written one value per line.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use parse_display::Display;
use tracing::debug;

use super::{fault::FaultKind, Computer};
use crate::constants::Operand;

/// Source of input tokens and sink of output lines for system calls
pub trait Console {
    /// Read the next whitespace-delimited token. Returns `None` at the end of the input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input fails
    fn read_token(&mut self) -> std::io::Result<Option<String>>;

    /// Write a line of output
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying output fails
    fn write_line(&mut self, line: &str) -> std::io::Result<()>;
}

/// A [`Console`] over a buffered reader and a writer
pub struct StdConsole<R, W> {
    input: R,
    output: W,
    pending: VecDeque<String>,
}

impl<R: BufRead, W: Write> StdConsole<R, W> {
    #[must_use]
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            pending: VecDeque::new(),
        }
    }

    /// Give back the writer, to inspect what was written
    #[must_use]
    pub fn into_output(self) -> W {
        self.output
    }
}

/// Read the next token, refilling the pending tokens one line at a time
fn next_token(
    pending: &mut VecDeque<String>,
    mut read_line: impl FnMut(&mut String) -> std::io::Result<usize>,
) -> std::io::Result<Option<String>> {
    while pending.is_empty() {
        let mut line = String::new();
        if read_line(&mut line)? == 0 {
            return Ok(None);
        }
        pending.extend(line.split_whitespace().map(ToOwned::to_owned));
    }

    Ok(pending.pop_front())
}

impl<R: BufRead, W: Write> Console for StdConsole<R, W> {
    fn read_token(&mut self) -> std::io::Result<Option<String>> {
        next_token(&mut self.pending, |line| self.input.read_line(line))
    }

    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        writeln!(self.output, "{line}")?;
        self.output.flush()
    }
}

/// A [`Console`] bound to the standard input and output of the process
///
/// The standard streams are only locked for the duration of each call, so that something else
/// (like a line editor) can read from the same input between two system calls.
pub struct StdioConsole {
    stdin: std::io::Stdin,
    stdout: std::io::Stdout,
    pending: VecDeque<String>,
}

impl Default for StdioConsole {
    fn default() -> Self {
        Self {
            stdin: std::io::stdin(),
            stdout: std::io::stdout(),
            pending: VecDeque::new(),
        }
    }
}

impl Console for StdioConsole {
    fn read_token(&mut self) -> std::io::Result<Option<String>> {
        next_token(&mut self.pending, |line| self.stdin.read_line(line))
    }

    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        let mut stdout = self.stdout.lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()
    }
}

/// The fixed table of system calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "kebab-case")]
pub enum Syscall {
    ReadInt,
    ReadFloat,
    ReadBool,
    ReadString,
    WriteInt,
    WriteFloat,
    WriteBool,
    WriteString,
}

impl TryFrom<Operand> for Syscall {
    type Error = FaultKind;

    fn try_from(code: Operand) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::ReadInt),
            1 => Ok(Self::ReadFloat),
            2 => Ok(Self::ReadBool),
            3 => Ok(Self::ReadString),
            4 => Ok(Self::WriteInt),
            5 => Ok(Self::WriteFloat),
            6 => Ok(Self::WriteBool),
            7 => Ok(Self::WriteString),
            _ => Err(FaultKind::InvalidSyscall(code)),
        }
    }
}

/// Read a token and parse it with the given function
fn read<T>(
    console: &mut dyn Console,
    expected: &'static str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, FaultKind> {
    let token = console.read_token()?;
    let value = token.as_deref().and_then(parse);
    value.ok_or(FaultKind::IoParseError { expected, token })
}

/// Parse a boolean token: `0`, `1`, `true` or `false`
fn parse_bool(token: &str) -> Option<i32> {
    if token == "1" || token.eq_ignore_ascii_case("true") {
        Some(1)
    } else if token == "0" || token.eq_ignore_ascii_case("false") {
        Some(0)
    } else {
        None
    }
}

impl Syscall {
    /// Perform the system call on register or string slot `x`
    pub(crate) fn execute(
        self,
        x: Operand,
        computer: &mut Computer,
        console: &mut dyn Console,
    ) -> Result<(), FaultKind> {
        debug!(syscall = %self, x, "System call");

        match self {
            // The destination is checked before consuming any input
            Self::ReadInt => {
                computer.registers.read_int(x)?;
                let value = read(console, "an integer", |t| t.parse().ok())?;
                computer.registers.write_int(x, value)?;
            }

            Self::ReadFloat => {
                computer.registers.read_float(x)?;
                let value = read(console, "a float", |t| t.parse().ok())?;
                computer.registers.write_float(x, value)?;
            }

            Self::ReadBool => {
                computer.registers.read_int(x)?;
                let value = read(console, "a boolean", parse_bool)?;
                computer.registers.write_int(x, value)?;
            }

            Self::ReadString => {
                computer.strings.get(x)?;
                let value = read(console, "a string", |t| Some(t.to_owned()))?;
                computer.strings.set(x, &value)?;
            }

            Self::WriteInt => {
                let value = computer.registers.read_int(x)?;
                console.write_line(&value.to_string())?;
            }

            Self::WriteFloat => {
                let value = computer.registers.read_float(x)?;
                console.write_line(&value.to_string())?;
            }

            Self::WriteBool => {
                let value = match computer.registers.read_int(x)? {
                    0 => "false",
                    1 => "true",
                    other => return Err(FaultKind::InvalidBooleanValue(other)),
                };
                console.write_line(value)?;
            }

            Self::WriteString => {
                let value = computer.strings.get(x)?;
                console.write_line(value)?;
            }
        }

        Ok(())
    }
}
