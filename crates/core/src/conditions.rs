//! Default validator for message template conditions.
//!
//! Conditions are boolean selection expressions evaluated elsewhere at
//! message-selection time. This module only checks that an expression is
//! well formed; it never evaluates one.
//!
//! ```text
//! expression := or_expr
//! or_expr    := and_expr ("or" and_expr)*
//! and_expr   := unary ("and" unary)*
//! unary      := "not" unary | primary
//! primary    := "(" expression ")" | "always" | "never"
//!             | ("is_set" | "is_not_set") attribute
//!             | attribute op literal
//! attribute  := ident ("." ident)*
//! op         := "==" | "!=" | ">=" | "<=" | ">" | "<"
//! literal    := number | "string" | 'string' | true | false | null
//! ```
//!
//! An empty expression means "no conditions" and is accepted.

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, none_of, one_of, satisfy},
    combinator::{all_consuming, not, opt, recognize, value, verify},
    multi::{many0_count, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::validation::TextValidator;

/// Words that cannot be used as attribute names.
const RESERVED_WORDS: &[&str] = &[
    "and", "or", "not", "always", "never", "true", "false", "null", "is_set", "is_not_set",
];

/// Number of characters of the offending input echoed back in error messages.
const SNIPPET_LEN: usize = 20;

/// Validates conditions against the expression grammar above.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionExpressionValidator;

impl TextValidator for ConditionExpressionValidator {
    fn validate(&self, text: &str) -> Result<(), String> {
        if text.trim().is_empty() {
            return Ok(());
        }

        match all_consuming(delimited(multispace0, expression, multispace0))(text) {
            Ok(_) => Ok(()),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                let position = text.len() - e.input.len();
                let snippet: String = e.input.chars().take(SNIPPET_LEN).collect();
                if snippet.is_empty() {
                    Err(format!(
                        "The conditions expression ends unexpectedly at position {position}"
                    ))
                } else {
                    Err(format!(
                        "The conditions expression is invalid at position {position} near '{snippet}'"
                    ))
                }
            }
            Err(nom::Err::Incomplete(_)) => {
                Err("The conditions expression is incomplete".to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Grammar
// ---------------------------------------------------------------------------

fn expression(input: &str) -> IResult<&str, ()> {
    value(
        (),
        pair(
            and_expression,
            many0_count(preceded(
                delimited(multispace0, keyword("or"), multispace0),
                and_expression,
            )),
        ),
    )(input)
}

fn and_expression(input: &str) -> IResult<&str, ()> {
    value(
        (),
        pair(
            unary,
            many0_count(preceded(
                delimited(multispace0, keyword("and"), multispace0),
                unary,
            )),
        ),
    )(input)
}

fn unary(input: &str) -> IResult<&str, ()> {
    alt((
        preceded(pair(keyword("not"), multispace0), unary),
        primary,
    ))(input)
}

fn primary(input: &str) -> IResult<&str, ()> {
    alt((
        delimited(
            pair(char('('), multispace0),
            expression,
            pair(multispace0, char(')')),
        ),
        value((), keyword("always")),
        value((), keyword("never")),
        value(
            (),
            tuple((
                alt((keyword("is_not_set"), keyword("is_set"))),
                multispace0,
                attribute,
            )),
        ),
        comparison,
    ))(input)
}

fn comparison(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((attribute, multispace0, operator, multispace0, literal)),
    )(input)
}

fn operator(input: &str) -> IResult<&str, &str> {
    alt((
        tag("=="),
        tag("!="),
        tag(">="),
        tag("<="),
        tag(">"),
        tag("<"),
    ))(input)
}

fn literal(input: &str) -> IResult<&str, ()> {
    alt((
        value((), number),
        value((), quoted('"')),
        value((), quoted('\'')),
        value((), keyword("true")),
        value((), keyword("false")),
        value((), keyword("null")),
    ))(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, Option<&'a str>> {
    let normal = if quote == '"' { "\\\"" } else { "\\'" };
    delimited(
        char(quote),
        opt(escaped(none_of(normal), '\\', one_of("\"'\\nt"))),
        char(quote),
    )
}

/// A dotted attribute path such as `user.first_name`.
fn attribute(input: &str) -> IResult<&str, &str> {
    verify(
        recognize(separated_list1(char('.'), identifier)),
        |attr: &str| !RESERVED_WORDS.contains(&attr),
    )(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// Match `word` only when it is not the prefix of a longer identifier or of
/// a dotted attribute path.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(
        tag(word),
        not(satisfy(|c: char| c.is_alphanumeric() || c == '_' || c == '.')),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
