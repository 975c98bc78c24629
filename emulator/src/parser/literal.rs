//! Parse number and string literals.
//!
//! Integers are either base 10 or base 16 (prefixed by `0x`), with an optional minus sign.
//! Floats must have a decimal point or an exponent, so that they never get mistaken for integers.
//! The non-finite values are spelled `inf`, `-inf` and `NaN`.

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, tag_no_case, take_while1},
    character::complete::{char, none_of},
    combinator::{map_res, opt, recognize, value, verify},
    number::complete::recognize_float,
    sequence::pair,
    IResult,
};

/// Parse the character following a backslash in a string literal
fn escape(input: &str) -> IResult<&str, &str> {
    alt((
        value("\\", char('\\')),
        value("\"", char('"')),
        value("\n", char('n')),
        value("\t", char('t')),
    ))(input)
}

/// Parse a string literal
pub(crate) fn parse_string_literal(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    // `escaped_transform` fails on empty strings
    let (input, string) = opt(escaped_transform(none_of("\"\\"), '\\', escape))(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, string.unwrap_or_default()))
}

/// Check if character is a decimal digit
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Check if character is a hexadecimal digit
fn is_hex_digit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// Extract a hexadecimal literal
fn take_hexadecimal_literal(input: &str) -> IResult<&str, &str> {
    let (input, _) = tag_no_case("0x")(input)?;
    take_while1(is_hex_digit)(input)
}

/// Parse the magnitude of an integer literal
fn parse_magnitude(input: &str) -> IResult<&str, i64> {
    alt((
        map_res(take_hexadecimal_literal, |s| i64::from_str_radix(s, 16)),
        map_res(take_while1(is_digit), str::parse),
    ))(input)
}

/// Parse an integer literal that fits in an operand
pub(crate) fn parse_integer(input: &str) -> IResult<&str, i32> {
    map_res(
        pair(opt(char('-')), parse_magnitude),
        |(sign, magnitude)| {
            let value = if sign.is_some() { -magnitude } else { magnitude };
            i32::try_from(value)
        },
    )(input)
}

/// Parse the spelling of an infinite or NaN float
fn parse_non_finite(input: &str) -> IResult<&str, f32> {
    alt((
        value(f32::INFINITY, tag("inf")),
        value(f32::NEG_INFINITY, tag("-inf")),
        value(f32::NAN, tag("NaN")),
    ))(input)
}

/// Parse a float literal
///
/// Decimal literals too large for an `f32` are rejected instead of rounding to an infinity.
pub(crate) fn parse_float(input: &str) -> IResult<&str, f32> {
    let decimal = verify(
        map_res(
            verify(recognize(recognize_float), |s: &str| {
                s.contains(['.', 'e', 'E'])
            }),
            str::parse::<f32>,
        ),
        |value: &f32| value.is_finite(),
    );

    alt((parse_non_finite, decimal))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_string_literal_test() {
        assert_eq!(
            parse_string_literal(r#""hello" rest"#),
            Ok((" rest", "hello".to_owned()))
        );
        assert_eq!(
            parse_string_literal(r#""a \"b\"\n\\""#),
            Ok(("", "a \"b\"\n\\".to_owned()))
        );
        assert_eq!(parse_string_literal(r#""""#), Ok(("", String::new())));
        assert!(parse_string_literal(r#""unterminated"#).is_err());
        assert!(parse_string_literal("bare").is_err());
    }

    #[test]
    fn parse_integer_test() {
        assert_eq!(parse_integer("42"), Ok(("", 42)));
        assert_eq!(parse_integer("-3, 4"), Ok((", 4", -3)));
        assert_eq!(parse_integer("0x1F"), Ok(("", 31)));
        assert_eq!(parse_integer("-0x10"), Ok(("", -16)));
        assert_eq!(parse_integer("2147483647"), Ok(("", i32::MAX)));
        assert_eq!(parse_integer("-2147483648"), Ok(("", i32::MIN)));
        assert!(parse_integer("2147483648").is_err());
        assert!(parse_integer("abc").is_err());
        assert!(parse_integer("-").is_err());
    }

    #[test]
    fn parse_float_test() {
        assert_eq!(parse_float("1.5"), Ok(("", 1.5)));
        assert_eq!(parse_float("-0.25 ;"), Ok((" ;", -0.25)));
        assert_eq!(parse_float("1e3"), Ok(("", 1000.0)));
        assert_eq!(parse_float("3."), Ok(("", 3.0)));
        // Integers are not floats
        assert!(parse_float("3").is_err());
        assert!(parse_float("0x10").is_err());
    }

    #[test]
    fn parse_non_finite_float_test() {
        assert_eq!(parse_float("inf"), Ok(("", f32::INFINITY)));
        assert_eq!(parse_float("-inf ;"), Ok((" ;", f32::NEG_INFINITY)));
        let (rest, nan) = parse_float("NaN").unwrap();
        assert_eq!(rest, "");
        assert!(nan.is_nan());

        // Out of the range of an f32
        assert!(parse_float("1e50").is_err());
        assert!(parse_float("-3.5e39").is_err());
        assert_eq!(parse_float("3.4e38"), Ok(("", 3.4e38)));
    }

    #[test]
    fn is_digit_test() {
        for c in '0'..='9' {
            assert!(is_digit(c));
            assert!(is_hex_digit(c));
        }

        for c in ('g'..='z').chain('G'..='Z') {
            assert!(!is_digit(c));
            assert!(!is_hex_digit(c));
        }
    }
}
