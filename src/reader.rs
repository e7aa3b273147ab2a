use std::collections::VecDeque;

use crate::error::{SkeemError, SkeemResult};
use crate::eval::Interpreter;
use crate::primitives::Builtin;
use crate::value::Value;

/// Outcome of asking the reader for the next form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadStatus {
    /// One complete top-level form. Not rooted: pin or evaluate it before
    /// the next allocation.
    Complete(Value),
    /// The buffered text does not yet hold a complete form.
    Incomplete,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Quote,
    Integer(i64),
    Float(f64),
    Str(String),
    Char(char),
    Boolean(bool),
    Builtin(Builtin),
    Symbol(String),
}

/// Line-fed reader. Text is tokenized as it arrives; paren depth and open
/// string literals are tracked across lines so the driver knows when a form
/// is complete.
#[derive(Debug, Default)]
pub struct Reader {
    tokens: VecDeque<Token>,
    word: String,
    /// Contents of a string literal still waiting for its closing quote.
    string: Option<String>,
    depth: i64,
}

impl Reader {
    pub fn new() -> Self {
        Reader::default()
    }

    /// Feed one line of input. A missing trailing newline is implied.
    pub fn push_line(&mut self, line: &str) -> SkeemResult<()> {
        for ch in line.chars() {
            if let Some(s) = self.string.as_mut() {
                if ch == '"' {
                    let s = std::mem::take(s);
                    self.string = None;
                    self.tokens.push_back(Token::Str(s));
                } else {
                    s.push(ch);
                }
                continue;
            }

            match ch {
                '"' => {
                    self.flush_word();
                    self.string = Some(String::new());
                }
                '(' => {
                    self.flush_word();
                    self.depth += 1;
                    self.tokens.push_back(Token::Open);
                }
                ')' => {
                    self.flush_word();
                    self.depth -= 1;
                    if self.depth < 0 {
                        self.reset();
                        return Err(SkeemError::UnbalancedExpression);
                    }
                    self.tokens.push_back(Token::Close);
                }
                '\'' if self.word.is_empty() => self.tokens.push_back(Token::Quote),
                ';' => {
                    // Comment runs to end of line.
                    self.flush_word();
                    break;
                }
                c if c.is_whitespace() => self.flush_word(),
                c => self.word.push(c),
            }
        }

        if !line.ends_with('\n') {
            match self.string.as_mut() {
                Some(s) => s.push('\n'),
                None => self.flush_word(),
            }
        }
        tracing::trace!(depth = self.depth, open_string = self.string.is_some(), "line read");
        Ok(())
    }

    /// Feed a whole source text.
    pub fn push_str(&mut self, src: &str) -> SkeemResult<()> {
        for line in src.split_inclusive('\n') {
            self.push_line(line)?;
        }
        Ok(())
    }

    /// True when no partial text or queued tokens remain.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.word.is_empty() && self.string.is_none()
    }

    /// True while a form has been started but not finished.
    pub fn is_pending(&self) -> bool {
        self.depth > 0 || self.string.is_some() || !self.tokens.is_empty()
    }

    /// Drop all buffered input.
    pub fn reset(&mut self) {
        self.tokens.clear();
        self.word.clear();
        self.string = None;
        self.depth = 0;
    }

    /// Build the next complete form from the buffered tokens.
    pub fn read_form(&mut self, interp: &mut Interpreter) -> SkeemResult<ReadStatus> {
        if !self.has_complete_form() {
            return Ok(ReadStatus::Incomplete);
        }

        let mark = interp.pin_mark();
        let result = self.read_datum(interp);
        interp.unpin_to(mark);
        match result {
            Ok(val) => Ok(ReadStatus::Complete(val)),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// True if the queued tokens begin with a whole datum. Later forms may
    /// still be open.
    fn has_complete_form(&self) -> bool {
        let mut depth = 0usize;
        for token in &self.tokens {
            match token {
                Token::Quote => {}
                Token::Open => depth += 1,
                Token::Close if depth > 1 => depth -= 1,
                _ if depth == 0 => return true,
                Token::Close => return true,
                _ => {}
            }
        }
        false
    }

    fn read_datum(&mut self, interp: &mut Interpreter) -> SkeemResult<Value> {
        let token = self
            .tokens
            .pop_front()
            .ok_or(SkeemError::UnbalancedExpression)?;

        let val = match token {
            Token::Open => self.read_list(interp)?,
            Token::Close => return Err(SkeemError::UnbalancedExpression),
            Token::Quote => {
                let quoted = self.read_datum(interp)?;
                interp.pin(quoted);
                interp.list(&[Value::Primitive(Builtin::Quote), quoted])
            }
            Token::Integer(n) => Value::Integer(n),
            Token::Float(x) => Value::Float(x),
            Token::Char(c) => Value::Char(c),
            Token::Boolean(b) => Value::Boolean(b),
            Token::Builtin(b) => Value::Primitive(b),
            Token::Str(s) => interp.alloc_string(s),
            Token::Symbol(name) => Value::Symbol(interp.intern(&name)),
        };
        interp.pin(val);
        Ok(val)
    }

    /// Elements up to the matching `)`. `()` is the empty list, not a pair.
    fn read_list(&mut self, interp: &mut Interpreter) -> SkeemResult<Value> {
        let mut items = Vec::new();
        loop {
            match self.tokens.front() {
                Some(Token::Close) => {
                    self.tokens.pop_front();
                    break;
                }
                Some(_) => items.push(self.read_datum(interp)?),
                None => return Err(SkeemError::UnbalancedExpression),
            }
        }
        Ok(interp.list(&items))
    }

    fn flush_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let word = std::mem::take(&mut self.word);
        self.tokens.push_back(classify(&word));
    }
}

/// Classify a whitespace-delimited word.
fn classify(word: &str) -> Token {
    match word {
        "+" => return Token::Builtin(Builtin::Add),
        "-" => return Token::Builtin(Builtin::Sub),
        "*" => return Token::Builtin(Builtin::Mul),
        "/" => return Token::Builtin(Builtin::Div),
        "#t" => return Token::Boolean(true),
        "#f" => return Token::Boolean(false),
        _ => {}
    }

    if let Some(token) = parse_number(word) {
        return token;
    }

    if let Some(name) = word.strip_prefix("#\\") {
        if let Some(c) = char_literal(name) {
            return Token::Char(c);
        }
    }

    // Reserved names resolve to their builtin at read time.
    match Builtin::from_name(word) {
        Some(builtin) => Token::Builtin(builtin),
        None => Token::Symbol(word.to_string()),
    }
}

/// Numbers start with a digit, optionally after a sign. A float has exactly
/// one `.` followed by more digits. Anything else starting with a digit is a
/// symbol.
fn parse_number(word: &str) -> Option<Token> {
    let unsigned = word.strip_prefix(['+', '-']).unwrap_or(word);
    if !unsigned.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    match unsigned.split_once('.') {
        None => {
            if !unsigned.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            match word.parse::<i64>() {
                Ok(n) => Some(Token::Integer(n)),
                // Too large for an integer: keep the magnitude as a float.
                Err(_) => word.parse::<f64>().ok().map(Token::Float),
            }
        }
        Some((int_part, frac_part)) => {
            let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
            if digits(int_part) && digits(frac_part) {
                word.parse::<f64>().ok().map(Token::Float)
            } else {
                None
            }
        }
    }
}

fn char_literal(name: &str) -> Option<char> {
    match name {
        "space" => Some(' '),
        "newline" => Some('\n'),
        "tab" => Some('\t'),
        _ => {
            let mut chars = name.chars();
            let c = chars.next()?;
            chars.next().is_none().then_some(c)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_one(src: &str) -> String {
        let mut interp = Interpreter::new();
        let mut reader = Reader::new();
        reader.push_str(src).unwrap();
        match reader.read_form(&mut interp).unwrap() {
            ReadStatus::Complete(val) => interp.print(val),
            ReadStatus::Incomplete => panic!("incomplete: {src}"),
        }
    }

    #[test]
    fn classifies_words() {
        assert_eq!(classify("42"), Token::Integer(42));
        assert_eq!(classify("-7"), Token::Integer(-7));
        assert_eq!(classify("3.25"), Token::Float(3.25));
        assert_eq!(classify("+"), Token::Builtin(Builtin::Add));
        assert_eq!(classify("/"), Token::Builtin(Builtin::Div));
        assert_eq!(classify("#t"), Token::Boolean(true));
        assert_eq!(classify("car"), Token::Builtin(Builtin::Car));
        assert_eq!(classify("foo"), Token::Symbol("foo".into()));
        assert_eq!(classify("#\\a"), Token::Char('a'));
    }

    #[test]
    fn malformed_numbers_are_symbols() {
        assert_eq!(classify("1.2.3"), Token::Symbol("1.2.3".into()));
        assert_eq!(classify("1."), Token::Symbol("1.".into()));
        assert_eq!(classify("12abc"), Token::Symbol("12abc".into()));
        assert_eq!(classify("-x"), Token::Symbol("-x".into()));
    }

    #[test]
    fn reads_nested_lists() {
        assert_eq!(read_one("(1 (2 3) \"four\" five)"), "(1 (2 3) \"four\" five)");
        assert_eq!(read_one("()"), "()");
        assert_eq!(read_one("(())"), "(())");
    }

    #[test]
    fn quote_shorthand() {
        assert_eq!(read_one("'x"), "(<procedure quote> x)");
    }

    #[test]
    fn incomplete_until_balanced() {
        let mut interp = Interpreter::new();
        let mut reader = Reader::new();
        reader.push_line("(define x").unwrap();
        assert_eq!(reader.read_form(&mut interp).unwrap(), ReadStatus::Incomplete);
        reader.push_line("  (+ 1 2))").unwrap();
        match reader.read_form(&mut interp).unwrap() {
            ReadStatus::Complete(val) => {
                assert_eq!(interp.print(val), "(<procedure define> x (<procedure +> 1 2))")
            }
            ReadStatus::Incomplete => panic!("expected a complete form"),
        }
        assert!(reader.is_empty());
    }

    #[test]
    fn complete_forms_ahead_of_an_open_one() {
        let mut interp = Interpreter::new();
        let mut reader = Reader::new();
        reader.push_line("(a b) 'c (d").unwrap();
        let mut seen = Vec::new();
        while let ReadStatus::Complete(val) = reader.read_form(&mut interp).unwrap() {
            seen.push(interp.print(val));
        }
        assert_eq!(seen, vec!["(a b)".to_string(), "(<procedure quote> c)".to_string()]);
        assert!(reader.is_pending());

        reader.push_line("e)").unwrap();
        match reader.read_form(&mut interp).unwrap() {
            ReadStatus::Complete(val) => assert_eq!(interp.print(val), "(d e)"),
            ReadStatus::Incomplete => panic!("expected a complete form"),
        }
        assert!(!reader.is_pending());
    }

    #[test]
    fn open_string_spans_lines() {
        let mut interp = Interpreter::new();
        let mut reader = Reader::new();
        reader.push_line("\"hello").unwrap();
        assert_eq!(reader.read_form(&mut interp).unwrap(), ReadStatus::Incomplete);
        reader.push_line("world (\"").unwrap();
        match reader.read_form(&mut interp).unwrap() {
            ReadStatus::Complete(Value::String(id)) => {
                assert_eq!(interp.heap.string(id), "hello\nworld (")
            }
            other => panic!("expected a string, got {other:?}"),
        }
    }

    #[test]
    fn negative_depth_is_an_error_and_resets() {
        let mut reader = Reader::new();
        reader.push_line("(a").unwrap();
        assert_eq!(reader.push_line("))"), Err(SkeemError::UnbalancedExpression));
        assert!(reader.is_empty());
        assert!(!reader.is_pending());
    }

    #[test]
    fn reset_discards_queued_forms() {
        let mut interp = Interpreter::new();
        let mut reader = Reader::new();
        reader.push_line("(car 5) (define x 1) (y").unwrap();
        assert!(matches!(reader.read_form(&mut interp).unwrap(), ReadStatus::Complete(_)));
        reader.reset();
        assert!(reader.is_empty());
        assert_eq!(reader.read_form(&mut interp).unwrap(), ReadStatus::Incomplete);
        reader.push_line("2").unwrap();
        match reader.read_form(&mut interp).unwrap() {
            ReadStatus::Complete(val) => assert_eq!(interp.print(val), "2"),
            ReadStatus::Incomplete => panic!("expected a complete form"),
        }
    }

    #[test]
    fn several_forms_on_one_line() {
        let mut interp = Interpreter::new();
        let mut reader = Reader::new();
        reader.push_line("1 (a) ; trailing comment").unwrap();
        let mut seen = Vec::new();
        while let ReadStatus::Complete(val) = reader.read_form(&mut interp).unwrap() {
            seen.push(interp.print(val));
        }
        assert_eq!(seen, vec!["1".to_string(), "(a)".to_string()]);
    }

    #[test]
    fn atomic_literals_round_trip() {
        for literal in ["17", "-3", "\"text with spaces\"", "sym", "#t", "#f", "#\\a"] {
            assert_eq!(read_one(literal), literal);
        }
    }
}
