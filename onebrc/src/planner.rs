//! Chunk planning: split the input into record-aligned byte ranges.

use memchr::memchr;

/// Half-open byte range `[start, end)` into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `input` into at most `worker_count` contiguous ranges covering it
/// exactly once.
///
/// Every interior boundary is the byte right after a `terminator`, so no
/// record straddles two ranges. An empty input yields one empty range.
pub fn plan(input: &[u8], worker_count: usize, terminator: u8) -> Vec<ByteRange> {
    let len = input.len();
    if len == 0 {
        return vec![ByteRange::new(0, 0)];
    }

    let workers = worker_count.max(1);
    let target = (len / workers).max(1);
    let mut ranges = Vec::with_capacity(workers.min(len / target + 1));
    let mut start = 0;

    while start < len {
        let end = if ranges.len() + 1 == workers {
            len
        } else {
            snap_to_record_start(input, start + target, terminator)
        };
        // Never emit a range that fails to advance.
        let end = if end <= start {
            next_record_start(input, start, terminator)
        } else {
            end
        };

        ranges.push(ByteRange::new(start, end));
        start = end;
    }

    ranges
}

/// Moves `candidate` forward to the nearest record start at or after it.
fn snap_to_record_start(input: &[u8], candidate: usize, terminator: u8) -> usize {
    if candidate >= input.len() {
        return input.len();
    }
    if candidate > 0 && input[candidate - 1] == terminator {
        return candidate;
    }
    next_record_start(input, candidate, terminator)
}

/// Offset just past the first terminator at or after `from`, or the input end.
fn next_record_start(input: &[u8], from: usize, terminator: u8) -> usize {
    match memchr(terminator, &input[from..]) {
        Some(index) => from + index + 1,
        None => input.len(),
    }
}
