//! Call-string parsing: `module.function(args)` into a structured call.
//!
//! The grammar is a single line with no interior parentheses except the
//! outer argument list: `identifier '.' identifier '(' argsText ')'`.
//! Arguments are a JSON array body, so only literal values are
//! representable.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{ParseError, ParsedCall};

/// The full-width comma, the one non-ASCII typo worth a dedicated diagnostic
const FULL_WIDTH_COMMA: char = '\u{ff0c}';

static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\((.*)\)$")
        .expect("call grammar pattern is valid")
});

/// Anything that loosely resembles `x.y(...)`: used to tell a bad
/// identifier apart from a structurally broken call
static LOOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\.(\S+)\((.*)\)$").expect("loose call pattern is valid")
});

/// Parse a raw call string, producing the most specific diagnostic for
/// malformed input. Conditions are checked in a fixed order so the same
/// input always yields the same error.
pub fn parse_call(raw: &str) -> Result<ParsedCall, ParseError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }
    if !trimmed.contains('.') {
        return Err(ParseError::MissingModuleName);
    }
    if !trimmed.contains('(') || !trimmed.contains(')') {
        return Err(ParseError::MissingParentheses);
    }

    let Some(captures) = CALL_RE.captures(trimmed) else {
        if LOOSE_RE.is_match(trimmed) {
            return Err(ParseError::InvalidIdentifier);
        }
        return Err(ParseError::InvalidFormat);
    };

    let module = captures[1].to_string();
    let function = captures[2].to_string();
    let args_text = &captures[3];

    if args_text.contains(FULL_WIDTH_COMMA) {
        return Err(ParseError::FullWidthComma);
    }
    if args_text.trim_end().ends_with(',') {
        return Err(ParseError::TrailingComma);
    }

    let args = if args_text.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&format!("[{args_text}]"))
            .map_err(|_| ParseError::InvalidArguments)?
    };

    Ok(ParsedCall {
        module,
        function,
        args,
    })
}
