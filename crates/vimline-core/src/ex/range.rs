//! Ex address ranges: `%`, `.,$`, `'a,'b`, `/foo/+1;?bar?`, ...

use std::fmt;

use regex::Regex;
use tracing::trace;

use crate::buffer::TextBuffer;
use crate::error::RangeError;
use crate::registers::Marks;

/// The base of one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSpecifier {
    /// 1-based line number; `0` is allowed and means "before the first line".
    Number(usize),
    /// `.`
    Current,
    /// `$`
    Last,
    /// `'x`
    Mark(char),
    /// `/pattern/`
    SearchForward(String),
    /// `?pattern?`
    SearchBackward(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub specifier: LineSpecifier,
    pub offset: i64,
}

impl Address {
    pub fn new(specifier: LineSpecifier) -> Self {
        Self {
            specifier,
            offset: 0,
        }
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    fn resolve(
        &self,
        buffer: &dyn TextBuffer,
        marks: &Marks,
        current: usize,
    ) -> Result<usize, RangeError> {
        let count = buffer.line_count();
        let base = match &self.specifier {
            LineSpecifier::Number(n) => *n,
            LineSpecifier::Current => current,
            LineSpecifier::Last => count,
            LineSpecifier::Mark(name) => {
                marks
                    .get(*name)
                    .ok_or(RangeError::UnsetMark(*name))?
                    .line
                    + 1
            }
            LineSpecifier::SearchForward(pattern) => search(buffer, pattern, current, true)?,
            LineSpecifier::SearchBackward(pattern) => search(buffer, pattern, current, false)?,
        };
        let line = i64::try_from(base)
            .ok()
            .and_then(|base| base.checked_add(self.offset))
            .ok_or(RangeError::LineOutOfRange {
                line: i64::MAX,
                count,
            })?;
        match usize::try_from(line) {
            Ok(line) if line <= count => Ok(line),
            _ => Err(RangeError::LineOutOfRange { line, count }),
        }
    }
}

/// Find the next (or previous) line matching `pattern`, wrapping around the
/// buffer. Lines are 1-based; the search starts after `current`.
fn search(
    buffer: &dyn TextBuffer,
    pattern: &str,
    current: usize,
    forward: bool,
) -> Result<usize, RangeError> {
    let regex = Regex::new(pattern).map_err(|e| RangeError::InvalidRegex(e.to_string()))?;
    let count = buffer.line_count();
    let start = current.saturating_sub(1);
    for step in 1..=count {
        let index = if forward {
            (start + step) % count
        } else {
            (start + count - step % count) % count
        };
        if buffer.line(index).is_some_and(|line| regex.is_match(line)) {
            trace!(pattern, line = index + 1, "address search matched");
            return Ok(index + 1);
        }
    }
    Err(RangeError::PatternNotFound(pattern.to_string()))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.specifier {
            LineSpecifier::Number(n) => write!(f, "{n}")?,
            LineSpecifier::Current => f.write_str(".")?,
            LineSpecifier::Last => f.write_str("$")?,
            LineSpecifier::Mark(c) => write!(f, "'{c}")?,
            LineSpecifier::SearchForward(p) => write!(f, "/{}/", p.replace('/', "\\/"))?,
            LineSpecifier::SearchBackward(p) => write!(f, "?{}?", p.replace('?', "\\?"))?,
        }
        match self.offset {
            0 => Ok(()),
            n if n > 0 => write!(f, "+{n}"),
            n => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `,`: every address is relative to the cursor line.
    Comma,
    /// `;`: the next address is relative to the previous one.
    Semicolon,
}

impl Separator {
    fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Semicolon => ';',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRange {
    pub start: Address,
    pub rest: Vec<(Separator, Address)>,
}

impl LineRange {
    pub fn single(address: Address) -> Self {
        Self {
            start: address,
            rest: Vec::new(),
        }
    }

    /// `%`, i.e. `1,$`.
    pub fn whole() -> Self {
        Self {
            start: Address::new(LineSpecifier::Number(1)),
            rest: vec![(Separator::Comma, Address::new(LineSpecifier::Last))],
        }
    }

    /// Resolve to 1-based `(first, last)` line numbers. Either may be `0`
    /// for commands that accept "before the first line".
    pub fn resolve(
        &self,
        buffer: &dyn TextBuffer,
        marks: &Marks,
    ) -> Result<(usize, usize), RangeError> {
        let cursor_line = buffer.cursor().line + 1;
        let mut current = cursor_line;
        let mut lines = vec![self.start.resolve(buffer, marks, current)?];
        for (separator, address) in &self.rest {
            if *separator == Separator::Semicolon {
                current = lines.last().copied().unwrap_or(cursor_line);
            }
            lines.push(address.resolve(buffer, marks, current)?);
        }
        // With more than two addresses only the last two count.
        let end = lines[lines.len() - 1];
        let start = if lines.len() >= 2 {
            lines[lines.len() - 2]
        } else {
            end
        };
        if start > end {
            return Err(RangeError::Backwards { start, end });
        }
        Ok((start, end))
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)?;
        for (separator, address) in &self.rest {
            write!(f, "{}{address}", separator.as_char())?;
        }
        Ok(())
    }
}

/// Parse a range off the front of `input`. Returns the range, if any, and
/// whatever follows it.
pub fn parse(input: &str) -> Result<(Option<LineRange>, &str), RangeError> {
    if let Some(rest) = input.strip_prefix('%') {
        return Ok((Some(LineRange::whole()), rest));
    }

    let (start, mut rest) = match parse_address(input)? {
        Some(parsed) => parsed,
        // `,5` starts from the cursor line.
        None if input.starts_with([',', ';']) => (Address::new(LineSpecifier::Current), input),
        None => return Ok((None, input)),
    };

    let mut others = Vec::new();
    loop {
        let separator = match rest.chars().next() {
            Some(',') => Separator::Comma,
            Some(';') => Separator::Semicolon,
            _ => break,
        };
        let after = &rest[1..];
        match parse_address(after)? {
            Some((address, remaining)) => {
                others.push((separator, address));
                rest = remaining;
            }
            None => {
                others.push((separator, Address::new(LineSpecifier::Current)));
                rest = after;
            }
        }
    }
    Ok((
        Some(LineRange {
            start,
            rest: others,
        }),
        rest,
    ))
}

fn parse_address(input: &str) -> Result<Option<(Address, &str)>, RangeError> {
    let Some(first) = input.chars().next() else {
        return Ok(None);
    };
    let (specifier, rest) = match first {
        '0'..='9' => {
            let (number, rest) = take_number(input)?;
            (LineSpecifier::Number(number), rest)
        }
        '.' => (LineSpecifier::Current, &input[1..]),
        '$' => (LineSpecifier::Last, &input[1..]),
        '\'' => {
            let mut chars = input[1..].chars();
            let name = chars
                .next()
                .ok_or_else(|| RangeError::InvalidMark("'".to_string()))?;
            if !(name.is_ascii_alphabetic() || matches!(name, '<' | '>' | '\'' | '`')) {
                return Err(RangeError::InvalidMark(format!("'{name}")));
            }
            (LineSpecifier::Mark(name), &input[1 + name.len_utf8()..])
        }
        '/' | '?' => {
            let (pattern, rest) = take_pattern(&input[1..], first)?;
            let specifier = if first == '/' {
                LineSpecifier::SearchForward(pattern)
            } else {
                LineSpecifier::SearchBackward(pattern)
            };
            (specifier, rest)
        }
        '+' | '-' => (LineSpecifier::Current, input),
        _ => return Ok(None),
    };

    let (offset, rest) = parse_offsets(rest)?;
    Ok(Some((Address { specifier, offset }, rest)))
}

/// `+N`, `-N`, bare `+`/`-` (1), repeated: `.+2-1`.
fn parse_offsets(mut input: &str) -> Result<(i64, &str), RangeError> {
    let mut offset = 0i64;
    while let Some(sign) = input.chars().next().filter(|c| matches!(c, '+' | '-')) {
        let after = &input[1..];
        let (amount, rest) = if after.starts_with(|c: char| c.is_ascii_digit()) {
            take_number(after)?
        } else {
            (1, after)
        };
        let amount = i64::try_from(amount)
            .map_err(|_| RangeError::ExpectedNumber(amount.to_string()))?;
        offset = if sign == '+' {
            offset.saturating_add(amount)
        } else {
            offset.saturating_sub(amount)
        };
        input = rest;
    }
    Ok((offset, input))
}

fn take_number(input: &str) -> Result<(usize, &str), RangeError> {
    let end = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let digits = &input[..end];
    let number = digits
        .parse::<usize>()
        .map_err(|_| RangeError::ExpectedNumber(digits.to_string()))?;
    Ok((number, &input[end..]))
}

/// Read a search pattern up to the unescaped `delimiter`.
fn take_pattern(input: &str, delimiter: char) -> Result<(String, &str), RangeError> {
    let mut pattern = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, next)) if next == delimiter => pattern.push(next),
                Some((_, next)) => {
                    pattern.push('\\');
                    pattern.push(next);
                }
                None => pattern.push('\\'),
            },
            c if c == delimiter => {
                if pattern.is_empty() {
                    return Err(RangeError::EmptyPattern);
                }
                return Ok((pattern, &input[i + c.len_utf8()..]));
            }
            c => pattern.push(c),
        }
    }
    Err(RangeError::UnterminatedPattern(pattern))
}
