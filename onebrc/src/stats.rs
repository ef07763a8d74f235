use crate::decimal::SCALE;

/// Running aggregate for one key. Values are in millionths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    min: i64,
    max: i64,
    sum: i128,
    count: u64,
}

impl Stats {
    pub fn new(value: i64) -> Self {
        Self {
            min: value,
            max: value,
            sum: value as i128,
            count: 1,
        }
    }

    #[inline]
    pub fn observe(&mut self, value: i64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value as i128;
        self.count += 1;
    }

    #[inline]
    pub fn merge(&mut self, other: &Stats) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn sum(&self) -> i128 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64 / SCALE as f64
    }
}
