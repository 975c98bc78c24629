//! Program line parsing
//!
//! A line is made of an optional content (either an instruction or a directive) followed by an
//! optional comment, starting with `;`. Lines are parsed one by one, and do zero copy over the original input, except
//! for string literals which may contain escape sequences. Each argument keeps the slice of the
//! input it was parsed from, so that errors can point at it.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, not_line_ending, space0, space1},
    combinator::{consumed, eof, map, opt, recognize},
    multi::separated_list1,
    sequence::{delimited, pair, preceded},
    IResult,
};

use super::literal::{parse_float, parse_integer, parse_string_literal};

/// An instruction or directive argument
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Argument {
    Integer(i32),
    Float(f32),
    String(String),
}

/// Parse an argument. Floats are tried before integers, as both start with digits.
fn parse_argument(input: &str) -> IResult<&str, Argument> {
    alt((
        map(parse_string_literal, Argument::String),
        map(parse_float, Argument::Float),
        map(parse_integer, Argument::Integer),
    ))(input)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ContentKind {
    Instruction,
    Directive,
}

/// Holds the content of a line: an instruction or a directive, with its arguments
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LineContent<'a> {
    pub kind: ContentKind,

    /// The mnemonic of the instruction, or the name of the directive without the leading dot
    pub name: &'a str,

    /// The arguments, along with the part of the input they come from
    pub arguments: Vec<(&'a str, Argument)>,
}

fn parse_line_content(input: &str) -> IResult<&str, LineContent<'_>> {
    let (input, dot) = opt(char('.'))(input)?;
    let (input, name) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;
    let (input, arguments) = opt(preceded(
        space1,
        separated_list1(
            delimited(space0, char(','), space0),
            consumed(parse_argument),
        ),
    ))(input)?;

    let kind = if dot.is_some() {
        ContentKind::Directive
    } else {
        ContentKind::Instruction
    };

    Ok((
        input,
        LineContent {
            kind,
            name,
            arguments: arguments.unwrap_or_default(),
        },
    ))
}

/// Parse a comment, including the leading `;`
fn parse_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char(';'), not_line_ending))(input)
}

/// Parse a single line, without its line ending. Comments are dropped, and empty lines give
/// `None`.
pub(crate) fn parse_line(input: &str) -> IResult<&str, Option<LineContent<'_>>> {
    let (input, _) = space0(input)?;
    let (input, content) = opt(parse_line_content)(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = opt(parse_comment)(input)?;
    let (input, _) = eof(input)?;

    Ok((input, content))
}
