//! Literal collection parser for host-var values.
//!
//! A host-var value such as `['a', 'b']` or `{"port": 8080}` is stored as a
//! structured value instead of text. The grammar is the expression literal
//! syntax users already write inside templates:
//!
//! ```text
//! literal := list | map
//! value   := list | map | string | number | bool | none
//! list    := '[' ( value ( ',' value )* ','? )? ']'
//! map     := '{' ( key ':' value ( ',' key ':' value )* ','? )? '}'
//! key     := string | number
//! ```
//!
//! Only a complete list or map is accepted at the top level; scalars stay
//! text so that `port=8080` remains the string `"8080"`. Collections nested
//! deeper than [`MAX_NESTING_DEPTH`] are not parsed.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0, none_of},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    Err as NomErr, IResult,
};
use serde_json::{Number, Value};

type ParseResult<'a, T> = IResult<&'a str, T>;

/// Deepest collection nesting accepted; the top-level collection is depth 1.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parse `text` as a list or mapping literal.
///
/// Returns `None` for anything that is not a complete collection literal,
/// including scalars and trailing garbage.
#[must_use]
pub fn try_parse_literal(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
        return None;
    }

    all_consuming(|input| collection(input, 1))(trimmed)
        .ok()
        .map(|(_, parsed)| parsed)
}

fn collection(input: &str, depth: usize) -> ParseResult<'_, Value> {
    match list(input, depth) {
        Err(NomErr::Error(_)) => mapping(input, depth),
        result => result,
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> ParseResult<'a, O>
where
    F: FnMut(&'a str) -> ParseResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn literal_value(input: &str, depth: usize) -> ParseResult<'_, Value> {
    match collection(input, depth) {
        Err(NomErr::Error(_)) => alt((map(string, Value::String), number, boolean, none))(input),
        result => result,
    }
}

/// Fails the whole parse, not just this branch, once `depth` is too deep.
fn check_depth(input: &str, depth: usize) -> ParseResult<'_, ()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(NomErr::Failure(Error::new(input, ErrorKind::TooLarge)));
    }
    Ok((input, ()))
}

fn list(input: &str, depth: usize) -> ParseResult<'_, Value> {
    let (input, _) = char('[')(input)?;
    let (input, ()) = check_depth(input, depth)?;
    map(
        delimited(
            multispace0,
            terminated(
                separated_list0(ws(char(',')), |i| literal_value(i, depth + 1)),
                opt(ws(char(','))),
            ),
            pair(multispace0, char(']')),
        ),
        Value::Array,
    )(input)
}

fn mapping(input: &str, depth: usize) -> ParseResult<'_, Value> {
    let (input, _) = char('{')(input)?;
    let (input, ()) = check_depth(input, depth)?;
    map(
        delimited(
            multispace0,
            terminated(
                separated_list0(ws(char(',')), |i| entry(i, depth + 1)),
                opt(ws(char(','))),
            ),
            pair(multispace0, char('}')),
        ),
        |entries: Vec<(String, Value)>| Value::Object(entries.into_iter().collect()),
    )(input)
}

fn entry(input: &str, depth: usize) -> ParseResult<'_, (String, Value)> {
    separated_pair(map_key, ws(char(':')), |i| literal_value(i, depth))(input)
}

fn map_key(input: &str) -> ParseResult<'_, String> {
    alt((string, map(number_text, str::to_string)))(input)
}

fn string(input: &str) -> ParseResult<'_, String> {
    alt((quoted('"'), quoted('\'')))(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> ParseResult<'a, String> {
    let plain = if quote == '"' { "\"\\" } else { "'\\" };
    move |input| {
        delimited(
            char(quote),
            map(
                many0(alt((
                    value('\n', tag("\\n")),
                    value('\r', tag("\\r")),
                    value('\t', tag("\\t")),
                    value('\\', tag("\\\\")),
                    value('"', tag("\\\"")),
                    value('\'', tag("\\'")),
                    none_of(plain),
                ))),
                |chars: Vec<char>| chars.into_iter().collect(),
            ),
            char(quote),
        )(input)
    }
}

fn number_text(input: &str) -> ParseResult<'_, &str> {
    recognize(tuple((
        opt(char('-')),
        digit1,
        opt(preceded(char('.'), digit1)),
    )))(input)
}

fn number(input: &str) -> ParseResult<'_, Value> {
    map_res(number_text, parse_number)(input)
}

fn parse_number(text: &str) -> Result<Value, String> {
    if text.contains('.') {
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("invalid float '{text}'"))
    } else {
        text.parse::<i64>()
            .map(Value::from)
            .map_err(|e| e.to_string())
    }
}

fn boolean(input: &str) -> ParseResult<'_, Value> {
    alt((
        value(Value::Bool(true), alt((tag("true"), tag("True")))),
        value(Value::Bool(false), alt((tag("false"), tag("False")))),
    ))(input)
}

fn none(input: &str) -> ParseResult<'_, Value> {
    value(Value::Null, alt((tag("None"), tag("none"), tag("null"))))(input)
}
