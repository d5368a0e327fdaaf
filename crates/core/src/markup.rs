//! Default validator for message template markup.
//!
//! A markup body is an XML fragment with a single root element whose text
//! may embed `{{variable}}` placeholders. Rendering happens elsewhere; this
//! module only checks that a body could be rendered.

use std::sync::LazyLock;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;

use crate::validation::TextValidator;

/// Regex pattern matching `{{ placeholder }}` tokens, capturing the inner text.
pub const PLACEHOLDER_PATTERN: &str = r"\{\{(.*?)\}\}";

/// Regex pattern for a valid placeholder variable such as `user.first_name`.
pub const VARIABLE_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(VARIABLE_PATTERN).expect("valid regex"));

/// Checks markup well-formedness and placeholder syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageMarkupValidator;

impl TextValidator for MessageMarkupValidator {
    fn validate(&self, text: &str) -> Result<(), String> {
        if text.trim().is_empty() {
            return Err("The message markup must not be empty".to_string());
        }
        check_xml(text)?;
        check_placeholders(text)
    }
}

/// Walk the document and verify nesting and the single-root constraint.
fn check_xml(text: &str) -> Result<(), String> {
    let mut reader = Reader::from_str(text);
    let mut open: Vec<String> = Vec::new();
    let mut roots = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            format!(
                "The message markup is not well-formed XML at position {}: {e}",
                reader.buffer_position()
            )
        })?;

        match event {
            Event::Start(start) => {
                if open.is_empty() {
                    roots += 1;
                }
                open.push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                match open.pop() {
                    Some(expected) if expected == name => {}
                    Some(expected) => {
                        return Err(format!(
                            "The message markup closes <{name}> while <{expected}> is open"
                        ))
                    }
                    None => {
                        return Err(format!(
                            "The message markup closes <{name}> which was never opened"
                        ))
                    }
                }
            }
            Event::Empty(_) => {
                if open.is_empty() {
                    roots += 1;
                }
            }
            Event::Text(content) => {
                if open.is_empty() && !content.iter().all(u8::is_ascii_whitespace) {
                    return Err(
                        "The message markup has text outside of its root element".to_string()
                    );
                }
            }
            Event::CData(_) => {
                if open.is_empty() {
                    return Err(
                        "The message markup has text outside of its root element".to_string()
                    );
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(format!("The message markup never closes <{unclosed}>"));
    }
    match roots {
        0 => Err("The message markup must contain a root element".to_string()),
        1 => Ok(()),
        _ => Err("The message markup must have exactly one root element".to_string()),
    }
}

/// Every `{{ ... }}` must wrap a variable name, and no braces may dangle.
fn check_placeholders(text: &str) -> Result<(), String> {
    for caps in PLACEHOLDER_RE.captures_iter(text) {
        let inner = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if !VARIABLE_RE.is_match(inner) {
            return Err(format!(
                "The message markup has an invalid placeholder '{}'",
                &caps[0]
            ));
        }
    }

    let remainder = PLACEHOLDER_RE.replace_all(text, "");
    if remainder.contains("{{") || remainder.contains("}}") {
        return Err("The message markup has an unbalanced placeholder".to_string());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
