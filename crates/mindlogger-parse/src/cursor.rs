//! Byte cursor shared by the response and options grammars.
//!
//! Every matcher works on a copy of the cursor and only commits the copy back
//! when it succeeds, so a failed rule never consumes input.

#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes `literal` if the remaining input starts with it.
    pub(crate) fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    pub(crate) fn take_while(&mut self, mut accept: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !accept(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.text[start..self.pos]
    }

    /// Skips spaces and tabs, returning how many bytes were skipped.
    pub(crate) fn skip_ws(&mut self) -> usize {
        self.take_while(|ch| ch == ' ' || ch == '\t').len()
    }

    /// Requires at least one space or tab.
    pub(crate) fn ws(&mut self) -> Option<()> {
        (self.skip_ws() > 0).then_some(())
    }

    /// Separator between two tokens: whitespace, a comma, or both.
    pub(crate) fn sep(&mut self) -> Option<()> {
        let start = self.pos;
        self.skip_ws();
        if self.eat(",") {
            self.skip_ws();
        }
        (self.pos > start).then_some(())
    }

    /// Consumes one or more line breaks (`\n` or `\r\n`).
    pub(crate) fn newlines(&mut self) -> bool {
        let start = self.pos;
        loop {
            let mut probe = *self;
            probe.eat("\r");
            if !probe.eat("\n") {
                break;
            }
            *self = probe;
        }
        self.pos > start
    }

    /// A run of ASCII digits whose length is within `min..=max`.
    pub(crate) fn digits(&mut self, min: usize, max: usize) -> Option<&'a str> {
        let mut probe = *self;
        let run = probe.take_while(|ch| ch.is_ascii_digit());
        if run.len() < min || run.len() > max {
            return None;
        }
        *self = probe;
        Some(run)
    }

    /// Unsigned decimal integer.
    pub(crate) fn int(&mut self) -> Option<i64> {
        let mut probe = *self;
        let value = probe.digits(1, usize::MAX)?.parse().ok()?;
        *self = probe;
        Some(value)
    }

    /// Decimal integer with an optional sign.
    pub(crate) fn signed_int(&mut self) -> Option<i64> {
        let mut probe = *self;
        let negative = if probe.eat("-") {
            true
        } else {
            probe.eat("+");
            false
        };
        let magnitude = probe.int()?;
        *self = probe;
        Some(if negative { -magnitude } else { magnitude })
    }

    /// Decimal number with optional sign, fraction and exponent.
    pub(crate) fn float(&mut self) -> Option<f64> {
        let mut probe = *self;
        let start = probe.pos;
        if !probe.eat("-") {
            probe.eat("+");
        }
        let whole = probe.take_while(|ch| ch.is_ascii_digit()).len();
        let mut fraction = 0;
        if probe.eat(".") {
            fraction = probe.take_while(|ch| ch.is_ascii_digit()).len();
        }
        if whole + fraction == 0 {
            return None;
        }
        let mut exponent = probe;
        if exponent.eat("e") || exponent.eat("E") {
            if !exponent.eat("-") {
                exponent.eat("+");
            }
            if exponent.digits(1, usize::MAX).is_some() {
                probe = exponent;
            }
        }
        let value = self.text[start..probe.pos].parse().ok()?;
        *self = probe;
        Some(value)
    }

    /// Comma separated unsigned integers; a trailing comma is tolerated.
    pub(crate) fn int_list(&mut self) -> Option<Vec<i64>> {
        let mut probe = *self;
        let mut values = vec![probe.int()?];
        loop {
            let mut next = probe;
            next.skip_ws();
            if !next.eat(",") {
                break;
            }
            next.skip_ws();
            probe = next;
            match next.int() {
                Some(value) => {
                    values.push(value);
                    probe = next;
                }
                None => break,
            }
        }
        *self = probe;
        Some(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_match_does_not_consume() {
        let mut cursor = Cursor::new("abc");
        assert!(cursor.int().is_none());
        assert!(!cursor.eat("abd"));
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn digits_respects_length_bounds() {
        assert_eq!(Cursor::new("04/").digits(1, 2), Some("04"));
        assert_eq!(Cursor::new("123/").digits(1, 2), None);
        assert_eq!(Cursor::new("/").digits(1, 2), None);
    }

    #[test]
    fn float_accepts_integers_and_exponents() {
        assert_eq!(Cursor::new("-12.5").float(), Some(-12.5));
        assert_eq!(Cursor::new("40").float(), Some(40.0));
        assert_eq!(Cursor::new("1e3").float(), Some(1000.0));
        assert_eq!(Cursor::new(".5").float(), Some(0.5));
        assert_eq!(Cursor::new("-").float(), None);
    }

    #[test]
    fn int_list_stops_before_garbage() {
        let mut cursor = Cursor::new("1, 2,3 ,4, x");
        assert_eq!(cursor.int_list(), Some(vec![1, 2, 3, 4]));
        assert_eq!(cursor.rest(), "x");
    }

    #[test]
    fn newlines_accepts_crlf_runs() {
        let mut cursor = Cursor::new("\r\n\nrow");
        assert!(cursor.newlines());
        assert_eq!(cursor.rest(), "row");
    }
}
