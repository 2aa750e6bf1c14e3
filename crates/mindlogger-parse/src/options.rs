//! Options cell grammar.
//!
//! An options cell takes one of three shapes, tried in this order:
//!
//! | Shape | Example |
//! |-------|---------|
//! | scored list | `1: 0 (score: 1), 2: 1 (score: 2)` |
//! | numeric range | `Max: 2, Min: 0` or `Min: 0, Max: 2` |
//! | value list | `1: 0, 2: 1, 3: 2` |
//!
//! Shapes are never mixed within one cell; a cell where some entries carry a
//! score and others do not is rejected.

use mindlogger_model::{Grammar, OptionRecord, ParseError};

use crate::cursor::Cursor;

type Shape = fn(Cursor<'_>) -> Result<Vec<OptionRecord>, usize>;

const SHAPES: &[(&str, Shape)] = &[
    ("scored_list", scored_list),
    ("range", range),
    ("value_list", value_list),
];

/// Decodes one options cell into its ordered option list.
///
/// # Errors
///
/// Returns a [`ParseError`] pointing at the furthest byte any shape reached
/// when no shape consumes the whole cell.
pub fn parse_options(text: &str) -> Result<Vec<OptionRecord>, ParseError> {
    let trimmed = text.trim();
    let offset = text.len() - text.trim_start().len();
    if trimmed.is_empty() {
        return Err(ParseError::new(Grammar::Options, text, 0, "empty options"));
    }
    let mut furthest = 0;
    for (_, shape) in SHAPES {
        match shape(Cursor::new(trimmed)) {
            Ok(options) => return Ok(options),
            Err(position) => furthest = furthest.max(position),
        }
    }
    Err(ParseError::new(
        Grammar::Options,
        text,
        offset + furthest,
        "expected a scored list, a Min/Max range or a value list",
    ))
}

fn is_name_char(ch: char) -> bool {
    !matches!(ch, ':' | ',' | '(' | ')' | '\n' | '\r')
}

/// `<name>: <value>`
fn entry(c: &mut Cursor<'_>) -> Option<(String, i64)> {
    let name = c.take_while(is_name_char).trim();
    if name.is_empty() || !c.eat(":") {
        return None;
    }
    c.skip_ws();
    let value = c.signed_int()?;
    Some((name.to_string(), value))
}

/// `(score: <n>)`
fn score(c: &mut Cursor<'_>) -> Option<i64> {
    if !c.eat("(") {
        return None;
    }
    c.skip_ws();
    if !c.eat("score:") {
        return None;
    }
    c.skip_ws();
    let score = c.signed_int()?;
    c.skip_ws();
    c.eat(")").then_some(score)
}

/// Consumes a list comma; true when another entry follows it.
fn next_entry(c: &mut Cursor<'_>) -> bool {
    let mut probe = *c;
    probe.skip_ws();
    if !probe.eat(",") {
        return false;
    }
    probe.skip_ws();
    *c = probe;
    !c.is_eof()
}

fn complete(c: Cursor<'_>, options: Vec<OptionRecord>) -> Result<Vec<OptionRecord>, usize> {
    if c.is_eof() { Ok(options) } else { Err(c.pos()) }
}

fn scored_list(mut c: Cursor<'_>) -> Result<Vec<OptionRecord>, usize> {
    let mut options = Vec::new();
    loop {
        let (name, value) = entry(&mut c).ok_or(c.pos())?;
        c.skip_ws();
        let score = score(&mut c).ok_or(c.pos())?;
        options.push(OptionRecord::new(name, value, Some(score)));
        if !next_entry(&mut c) {
            break;
        }
    }
    complete(c, options)
}

fn bound(c: &mut Cursor<'_>, key: &str) -> Option<i64> {
    if !c.eat(key) {
        return None;
    }
    c.skip_ws();
    c.signed_int()
}

/// `Max: hi, Min: lo` in either order, expanded low to high.
fn range(mut c: Cursor<'_>) -> Result<Vec<OptionRecord>, usize> {
    let max_first = c.rest().starts_with("Max:");
    let (first_key, second_key) = if max_first {
        ("Max:", "Min:")
    } else {
        ("Min:", "Max:")
    };
    let first = bound(&mut c, first_key).ok_or(c.pos())?;
    c.skip_ws();
    if !c.eat(",") {
        return Err(c.pos());
    }
    c.skip_ws();
    let second = bound(&mut c, second_key).ok_or(c.pos())?;
    let (low, high) = if max_first {
        (second, first)
    } else {
        (first, second)
    };
    complete(c, (low..=high).map(OptionRecord::from_range_step).collect())
}

fn value_list(mut c: Cursor<'_>) -> Result<Vec<OptionRecord>, usize> {
    let mut options = Vec::new();
    loop {
        let (name, value) = entry(&mut c).ok_or(c.pos())?;
        options.push(OptionRecord::new(name, value, None));
        if !next_entry(&mut c) {
            break;
        }
    }
    complete(c, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_ascending_regardless_of_key_order() {
        let expected = vec![
            OptionRecord::new("0", 0, Some(0)),
            OptionRecord::new("1", 1, Some(1)),
            OptionRecord::new("2", 2, Some(2)),
        ];
        assert_eq!(parse_options("Max: 2, Min: 0").unwrap(), expected);
        assert_eq!(parse_options("Min: 0, Max: 2").unwrap(), expected);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert_eq!(parse_options("Min: 3, Max: 1").unwrap(), Vec::new());
    }

    #[test]
    fn mixed_scored_and_plain_entries_are_rejected() {
        let err = parse_options("1: 0 (score: 1), 2: 1").unwrap_err();
        assert_eq!(err.grammar, Grammar::Options);
        assert!(err.position > 0);
    }

    #[test]
    fn names_may_contain_spaces() {
        let options = parse_options("Not at all: 0, Several days: 1").unwrap();
        assert_eq!(options[0].name, "Not at all");
        assert_eq!(options[1], OptionRecord::new("Several days", 1, None));
    }

    #[test]
    fn error_position_accounts_for_leading_whitespace() {
        let err = parse_options("  Yes: maybe").unwrap_err();
        assert_eq!(err.position, 7);
    }
}
