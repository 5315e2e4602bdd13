//! C-style string literals as they appear in `str;` transcript entries.

use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while_m_n},
    character::complete::{char, hex_digit1, multispace0},
    combinator::{map, map_opt, value},
    multi::{fold_many0, fold_many1},
    sequence::{delimited, preceded},
    IResult,
};
use std::fmt::Write;

enum Fragment<'a> {
    Text(&'a str),
    Byte(u8),
}

fn octal_escape(input: &str) -> IResult<&str, u8> {
    map_opt(
        take_while_m_n(1, 3, |c: char| c.is_digit(8)),
        |digits: &str| u8::from_str_radix(digits, 8).ok(),
    )(input)
}

fn hex_escape(input: &str) -> IResult<&str, u8> {
    preceded(
        char('x'),
        map_opt(hex_digit1, |digits: &str| u8::from_str_radix(digits, 16).ok()),
    )(input)
}

fn simple_escape(input: &str) -> IResult<&str, u8> {
    alt((
        value(b'\n', char('n')),
        value(b'\t', char('t')),
        value(b'\r', char('r')),
        value(0x07, char('a')),
        value(0x08, char('b')),
        value(0x0c, char('f')),
        value(0x0b, char('v')),
        value(b'\\', char('\\')),
        value(b'"', char('"')),
        value(b'\'', char('\'')),
        value(b'?', char('?')),
    ))(input)
}

fn escape(input: &str) -> IResult<&str, u8> {
    preceded(char('\\'), alt((octal_escape, hex_escape, simple_escape)))(input)
}

fn fragment(input: &str) -> IResult<&str, Fragment<'_>> {
    alt((map(is_not("\"\\"), Fragment::Text), map(escape, Fragment::Byte)))(input)
}

fn segment(input: &str) -> IResult<&str, Vec<u8>> {
    delimited(
        char('"'),
        fold_many0(fragment, Vec::new, |mut bytes, frag| {
            match frag {
                Fragment::Text(text) => bytes.extend_from_slice(text.as_bytes()),
                Fragment::Byte(byte) => bytes.push(byte),
            }
            bytes
        }),
        char('"'),
    )(input)
}

/// Parses one or more adjacent quoted literals into their decoded bytes.
pub fn c_string(input: &str) -> IResult<&str, Vec<u8>> {
    fold_many1(
        preceded(multispace0, segment),
        Vec::new,
        |mut bytes, part| {
            bytes.extend(part);
            bytes
        },
    )(input)
}

/// Renders bytes as a C literal that decodes back to exactly those bytes.
///
/// Non-printable bytes use three-digit octal escapes so a following digit
/// can never be absorbed into the escape.
pub fn to_c_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &byte in bytes {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'?' => out.push_str("\\?"),
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\{byte:03o}");
            }
        }
    }
    out.push('"');
    out
}
