//! Scanner for guest floating-point literals, as accepted by the guest's
//! strict `Float()` conversion: optional surrounding whitespace, optional
//! sign, decimal digits with `_` separators, optional fraction and
//! exponent. Underscores must sit between digits.

struct FloatScanner {
    chars: Vec<char>,
    pos: usize,
    buf: String,
}

impl FloatScanner {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            buf: String::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        ch
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Consume `digit (('_')? digit)*`, pushing the digits (without the
    /// separators) onto the buffer. Returns false if no digit was found
    /// or a separator was not followed by a digit.
    fn scan_digits(&mut self) -> bool {
        let mut seen = false;
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    let ch = self.bump();
                    self.buf.push(ch);
                    seen = true;
                }
                Some('_') if seen => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c) if c.is_ascii_digit() => {
                            let ch = self.bump();
                            self.buf.push(ch);
                        }
                        _ => return false,
                    }
                }
                _ => return seen,
            }
        }
    }

    fn scan(mut self) -> (f64, bool) {
        self.skip_whitespace();
        if matches!(self.peek(), Some('+') | Some('-')) {
            let ch = self.bump();
            self.buf.push(ch);
        }
        if !self.scan_digits() {
            return (0.0, false);
        }
        if self.peek() == Some('.') {
            // A bare trailing dot is not part of the literal.
            if self.chars.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit()) {
                let ch = self.bump();
                self.buf.push(ch);
                if !self.scan_digits() {
                    return (0.0, false);
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.buf.push('e');
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                let ch = self.bump();
                self.buf.push(ch);
            }
            if !self.scan_digits() {
                return (0.0, false);
            }
        }
        self.skip_whitespace();
        let complete = self.pos == self.chars.len();
        let value = self.buf.parse::<f64>().unwrap_or(0.0);
        (value, complete)
    }
}

/// Parse `text` as a guest float literal. The second element reports
/// whether the parse consumed the entire input; partial parses carry the
/// prefix value but are rejected by the strict conversion protocol.
pub fn scan_float(text: &str) -> (f64, bool) {
    FloatScanner::new(text).scan()
}
