//! Program listing parsing
//!
//! A listing has one instruction or directive per line:
//!
//! ```text
//! .string "hello"       ; append a string constant
//! .data 10, 2.5         ; initial value of a data cell
//!     SSTR "world"      ; string arguments are interned in the constants
//!     LDIf 0, 1.5       ; float immediates are stored as raw bits
//!     CALL 5, 0
//!     HALT
//! ```
//!
//! The parsing of a single line is handled by the `nom` library, the lines are then assembled in
//! a [`Program`].

use nom::{Finish, Offset};
use tracing::debug;

use crate::constants::{Operand, Word, DATA_MEM_SIZE};
use crate::loader::Program;
use crate::runtime::{Instruction, Opcode};

mod errors;
pub(crate) mod line;
pub(crate) mod literal;

pub use self::errors::{ListingError, ListingErrorKind};

use self::line::{parse_line, Argument, ContentKind, LineContent};

/// A problem on a line, with the part of the line it is about
type LineError<'a> = (&'a str, ListingErrorKind);

/// Parse a program listing
///
/// # Errors
///
/// This function will return an error on the first invalid line
#[tracing::instrument(skip_all, fields(length = input.len()))]
pub fn parse(input: &str) -> Result<Program, ListingError> {
    let mut program = Program::default();

    for (index, line) in input.lines().enumerate() {
        let located = |at: &str, kind| ListingError {
            line: index + 1,
            span: (input.offset(at), at.len()).into(),
            kind,
        };

        let (_, content) = parse_line(line)
            .finish()
            .map_err(|e| located(e.input, ListingErrorKind::Syntax))?;

        if let Some(content) = content {
            assemble(&mut program, &content).map_err(|(at, kind)| located(at, kind))?;
        }
    }

    debug!(
        instructions = program.instructions.len(),
        data = program.data.len(),
        constants = program.constants.len(),
        "Listing parsed"
    );

    Ok(program)
}

/// Report a wrong number of arguments on a line
fn argument_count<'a>(content: &LineContent<'a>, expected: usize) -> LineError<'a> {
    (
        content.name,
        ListingErrorKind::ArgumentCount {
            name: content.name.to_owned(),
            expected,
            found: content.arguments.len(),
        },
    )
}

/// Add the content of a line to the program
#[allow(clippy::cast_sign_loss)]
fn assemble<'a>(program: &mut Program, content: &LineContent<'a>) -> Result<(), LineError<'a>> {
    let invalid = |at: &'a str, expected| (at, ListingErrorKind::InvalidArgument { expected });

    match content.kind {
        ContentKind::Instruction => {
            let opcode: Opcode = content.name.parse().map_err(|_| {
                (
                    content.name,
                    ListingErrorKind::UnknownMnemonic(content.name.to_owned()),
                )
            })?;
            if content.arguments.len() != opcode.arity() {
                return Err(argument_count(content, opcode.arity()));
            }

            let mut operands = [0; 3];
            for (position, &(at, ref argument)) in content.arguments.iter().enumerate() {
                operands[position] = operand(program, opcode, position, argument)
                    .map_err(|expected| invalid(at, expected))?;
            }

            let [o1, o2, o3] = operands;
            program.push(Instruction::new(opcode, o1, o2, o3));
        }

        ContentKind::Directive => match (content.name, content.arguments.as_slice()) {
            ("data", &[(address_at, ref address), (value_at, ref value)]) => {
                let &Argument::Integer(address) = address else {
                    return Err(invalid(address_at, "a data address"));
                };
                let cell = usize::try_from(address)
                    .ok()
                    .filter(|&cell| cell < DATA_MEM_SIZE)
                    .ok_or((address_at, ListingErrorKind::DataAddressOutOfRange(address)))?;

                let word = match *value {
                    Argument::Integer(value) => value as Word,
                    Argument::Float(value) => value.to_bits(),
                    Argument::String(_) => return Err(invalid(value_at, "a number")),
                };
                program.data.insert(cell, word);
            }
            ("data", _) => return Err(argument_count(content, 2)),

            ("string", [(_, Argument::String(text))]) => program.constants.push(text.clone()),
            ("string", &[(at, _)]) => return Err(invalid(at, "a string")),
            ("string", _) => return Err(argument_count(content, 1)),

            (name, _) => {
                return Err((
                    content.name,
                    ListingErrorKind::UnknownDirective(name.to_owned()),
                ))
            }
        },
    }

    Ok(())
}

/// Encode an instruction argument as an operand
///
/// Most operands are plain integers. The string argument of `SSTR` is interned in the program
/// constants, and the immediate of `LDIf` is a float stored as its raw bits.
#[allow(
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn operand(
    program: &mut Program,
    opcode: Opcode,
    position: usize,
    argument: &Argument,
) -> Result<Operand, &'static str> {
    match (opcode, position, argument) {
        (Opcode::Sstr, 0, Argument::String(text)) => {
            Operand::try_from(program.intern(text)).map_err(|_| "a string constant index")
        }
        (Opcode::Sstr, 0, Argument::Float(_)) => Err("a string or a string constant index"),
        (Opcode::LdiF, 1, Argument::Float(value)) => Ok(value.to_bits() as Operand),
        (Opcode::LdiF, 1, Argument::Integer(value)) => Ok((*value as f32).to_bits() as Operand),
        (Opcode::LdiF, 1, Argument::String(_)) => Err("a float"),
        (_, _, Argument::Integer(value)) => Ok(*value),
        _ => Err("an integer"),
    }
}

/// Quote a string the way string literals are written in listings
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Print a program as a listing, which can be parsed back
impl std::fmt::Display for Program {
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for constant in &self.constants {
            writeln!(f, ".string {}", quote(constant))?;
        }

        for (address, &word) in &self.data {
            writeln!(f, ".data {address}, {}", word as i32)?;
        }

        for instruction in &self.instructions {
            let Ok(decoded) = instruction.decode() else {
                writeln!(f, "    ; {instruction}")?;
                continue;
            };

            write!(f, "    {}", decoded.opcode)?;
            let arity = decoded.opcode.arity();
            for (position, &operand) in decoded.operands[..arity].iter().enumerate() {
                let sep = if position == 0 { " " } else { ", " };
                if decoded.opcode == Opcode::LdiF && position == 1 {
                    write!(f, "{sep}{:?}", f32::from_bits(operand as Word))?;
                } else {
                    write!(f, "{sep}{operand}")?;
                }
            }

            if decoded.opcode == Opcode::Sstr {
                let constant = usize::try_from(decoded.operands[0])
                    .ok()
                    .and_then(|index| self.constants.get(index));
                if let Some(text) = constant {
                    write!(f, " ; {}", quote(text))?;
                }
            }

            writeln!(f)?;
        }

        Ok(())
    }
}
