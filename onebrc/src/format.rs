//! Sorting and rendering of the final aggregate.
//!
//! All figures are rounded to two fractional digits, half away from zero,
//! straight from the exact fixed-point values. The mean is rounded from the
//! exact quotient `sum / count`, never from an intermediate float.

use std::fmt;
use std::io::{self, Write};

use clap::ValueEnum;

use crate::aggregate::AggregateMap;
use crate::decimal::SCALE;
use crate::stats::Stats;

const MILLIONTHS_PER_HUNDREDTH: i128 = (SCALE / 100) as i128;

/// A value in hundredths; displays as `-12.34`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hundredths(pub i64);

impl Hundredths {
    pub fn from_millionths(value: i64) -> Self {
        Self(round_div(value as i128, MILLIONTHS_PER_HUNDREDTH) as i64)
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Hundredths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, magnitude / 100, magnitude % 100)
    }
}

/// Integer division rounding half away from zero. `denominator` must be positive.
fn round_div(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator {
        quotient + numerator.signum()
    } else {
        quotient
    }
}

/// Rendered statistics for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub key: String,
    pub min: Hundredths,
    pub mean: Hundredths,
    pub max: Hundredths,
    pub count: u64,
}

impl Summary {
    fn new(key: &[u8], stats: &Stats) -> Self {
        let mean = round_div(
            stats.sum(),
            stats.count() as i128 * MILLIONTHS_PER_HUNDREDTH,
        );
        Self {
            key: String::from_utf8_lossy(key).into_owned(),
            min: Hundredths::from_millionths(stats.min()),
            mean: Hundredths(mean as i64),
            max: Hundredths::from_millionths(stats.max()),
            count: stats.count(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{};{};{}", self.key, self.min, self.mean, self.max)
    }
}

/// Summaries sorted by the raw key bytes.
pub fn summarize(map: AggregateMap) -> Vec<Summary> {
    map.into_sorted()
        .iter()
        .map(|(key, stats)| Summary::new(key, stats))
        .collect()
}

/// One `key:min;mean;max` line per key, sorted by key.
pub fn format(map: AggregateMap) -> Vec<String> {
    summarize(map).iter().map(Summary::to_string).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputStyle {
    /// `key:min;mean;max`, one key per line
    #[default]
    Lines,
    /// `{key=min/mean/max, ...}` on a single line
    Braces,
}

pub fn write_summaries<W: Write>(
    out: &mut W,
    summaries: &[Summary],
    style: OutputStyle,
) -> io::Result<()> {
    match style {
        OutputStyle::Lines => {
            for summary in summaries {
                writeln!(out, "{}", summary)?;
            }
        }
        OutputStyle::Braces => {
            write!(out, "{{")?;
            for (index, s) in summaries.iter().enumerate() {
                let separator = if index == 0 { "" } else { ", " };
                write!(out, "{}{}={}/{}/{}", separator, s.key, s.min, s.mean, s.max)?;
            }
            writeln!(out, "}}")?;
        }
    }
    Ok(())
}
