//! Record scanning over one byte range.

use memchr::memchr;

use crate::decimal::parse_millionths;
use crate::error::{Error, MalformedKind, Result};
use crate::planner::ByteRange;

/// One parsed line. Borrowed from the input, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub key: &'a [u8],
    /// Value in millionths, see [`crate::decimal`].
    pub value: i64,
    /// Absolute offset of the line start.
    pub offset: usize,
}

/// Lazy, single-pass iterator over the records of one range.
///
/// After yielding an error it stops until resumed.
pub struct RecordScanner<'a> {
    input: &'a [u8],
    pos: usize,
    end: usize,
    delimiter: u8,
    terminator: u8,
    halted: bool,
}

impl<'a> RecordScanner<'a> {
    pub fn new(input: &'a [u8], range: ByteRange, delimiter: u8, terminator: u8) -> Self {
        let end = range.end.min(input.len());
        Self {
            input,
            pos: range.start.min(end),
            end,
            delimiter,
            terminator,
            halted: false,
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Clears the stop after an error; scanning continues with the line after
    /// the bad one.
    pub fn resume(&mut self) {
        self.halted = false;
    }
}

impl<'a> Iterator for RecordScanner<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted || self.pos >= self.end {
            return None;
        }

        let input: &'a [u8] = self.input;
        let start = self.pos;
        let window = &input[start..self.end];
        let line_len = memchr(self.terminator, window).unwrap_or(window.len());
        self.pos = (start + line_len + 1).min(self.end);

        match split_record(&window[..line_len], self.delimiter) {
            Ok((key, value)) => Some(Ok(Record {
                key,
                value,
                offset: start,
            })),
            Err(kind) => {
                self.halted = true;
                Some(Err(Error::malformed(start, kind)))
            }
        }
    }
}

fn split_record(line: &[u8], delimiter: u8) -> std::result::Result<(&[u8], i64), MalformedKind> {
    let split = memchr(delimiter, line).ok_or(MalformedKind::MissingDelimiter)?;
    let (key, token) = (&line[..split], &line[split + 1..]);
    if key.is_empty() {
        return Err(MalformedKind::EmptyKey);
    }
    let value = parse_millionths(token)
        .ok_or_else(|| MalformedKind::InvalidNumber(String::from_utf8_lossy(token).into_owned()))?;
    Ok((key, value))
}
