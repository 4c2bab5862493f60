use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// An inclusive range of `u64` points. The interval `[start, start - 1]` is the empty interval at `start`.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct Interval {
    pub start: u64,
    pub end: u64,
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

impl From<Interval> for (u64, u64) {
    fn from(val: Interval) -> Self {
        (val.start, val.end)
    }
}

impl Interval {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start > 0 && end < u64::MAX && end >= start - 1);
        Interval { start, end }
    }

    pub fn empty() -> Self {
        Self::new(1, 0)
    }

    /// Returns the maximally allowed `u64` interval. We leave a margin of 1 from
    /// both `u64` bounds (`0` and `u64::MAX`) in order to support the reduction of any
    /// legal interval to an empty one by setting `end = start - 1` or `start = end + 1`
    pub fn maximal() -> Self {
        Self::new(1, u64::MAX - 1)
    }

    /// The capacity assigned to the genesis block, `[1, 2^63 - 1]`. The root may
    /// later grow towards [`Interval::maximal`] if the tree outgrows it
    pub fn genesis() -> Self {
        Self::new(1, (1u64 << 63) - 1)
    }

    pub fn size(&self) -> u64 {
        (self.end + 1) - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn increase(&self, offset: u64) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }

    pub fn decrease(&self, offset: u64) -> Self {
        Self::new(self.start - offset, self.end - offset)
    }

    pub fn increase_start(&self, offset: u64) -> Self {
        Self::new(self.start + offset, self.end)
    }

    pub fn decrease_start(&self, offset: u64) -> Self {
        Self::new(self.start - offset, self.end)
    }

    pub fn increase_end(&self, offset: u64) -> Self {
        Self::new(self.start, self.end + offset)
    }

    pub fn decrease_end(&self, offset: u64) -> Self {
        Self::new(self.start, self.end - offset)
    }

    /// Splits the interval into two halves. When the size is odd the left half
    /// gets the extra point, so a single remaining point is still allocatable
    pub fn split_half(&self) -> (Self, Self) {
        let left_size = self.size().div_ceil(2);
        (Self::new(self.start, self.start + left_size - 1), Self::new(self.start + left_size, self.end))
    }

    /// Splits this interval to two parts such that their union is equal to the
    /// original interval and the first (left) part holds `⌊size · fraction⌋` points.
    /// `fraction = 0` yields an empty left part and `fraction = 1` an empty right part
    pub fn split_fraction(&self, fraction: f64) -> (Self, Self) {
        debug_assert!((0.0..=1.0).contains(&fraction));
        let left_size = f64::floor(self.size() as f64 * fraction) as u64;
        let left_size = left_size.min(self.size());
        (Self::new(self.start, self.start + left_size - 1), Self::new(self.start + left_size, self.end))
    }

    /// Splits this interval to exactly |sizes| parts where
    /// |part_i| = sizes[i]. This method expects sum(sizes) to be exactly
    /// equal to the interval's size.
    pub fn split_exact(&self, sizes: &[u64]) -> Vec<Self> {
        assert_eq!(sizes.iter().sum::<u64>(), self.size(), "sum of sizes must be equal to the interval's size");
        let mut start = self.start;
        sizes
            .iter()
            .map(|size| {
                let interval = Self::new(start, start + size - 1);
                start += size;
                interval
            })
            .collect()
    }

    /// Splits this interval to |sizes| parts
    /// by the allocation rule described below. This method expects sum(sizes)
    /// to be smaller or equal to the interval's size. Every part_i is
    /// allocated at least sizes[i] capacity. The remaining budget is
    /// split by an exponentially biased rule described below.
    ///
    /// This rule follows the GHOSTDAG protocol behavior where the child
    /// with the largest subtree is expected to dominate the competition
    /// for new blocks and thus grow the most. However, we may need to
    /// add slack for non-largest subtrees in order to make CPU reindexing
    /// attacks unworthy.
    pub fn split_exponential(&self, sizes: &[u64]) -> Vec<Self> {
        let interval_size = self.size();
        let sizes_sum = sizes.iter().sum::<u64>();
        assert!(interval_size >= sizes_sum, "interval's size must be greater than or equal to sum of sizes");
        assert!(sizes_sum > 0, "cannot split to 0 parts");
        if interval_size == sizes_sum {
            return self.split_exact(sizes);
        }

        //
        // Add a fractional bias to every size in the provided sizes
        //

        let mut remaining_bias = interval_size - sizes_sum;
        let total_bias = remaining_bias as f64;

        let mut biased_sizes = Vec::<u64>::with_capacity(sizes.len());
        let exp_fractions = exponential_fractions(sizes);
        for (i, fraction) in exp_fractions.iter().enumerate() {
            let bias: u64 = if i == exp_fractions.len() - 1 {
                remaining_bias
            } else {
                remaining_bias.min(f64::round(total_bias * fraction) as u64)
            };
            biased_sizes.push(sizes[i] + bias);
            remaining_bias -= bias;
        }
        self.split_exact(biased_sizes.as_slice())
    }

    pub fn contains(&self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn strictly_contains(&self, other: Self) -> bool {
        self.start <= other.start && other.end < self.end
    }
}

/// Returns a fraction for each size in sizes
/// as follows:
///   fraction[i] = 2^size[i] / sum_j(2^size[j])
/// In the code below the above equation is divided by 2^max(size)
/// to avoid exploding numbers. Note that in 1 / 2^(max(size)-size[i])
/// we divide 1 by potentially a very large number, which will
/// result in loss of float precision. This is not a problem - all
/// numbers close to 0 bear effectively the same weight.
fn exponential_fractions(sizes: &[u64]) -> Vec<f64> {
    let max_size = sizes.iter().copied().max().unwrap_or_default();

    let mut fractions = sizes.iter().map(|s| 1f64 / 2f64.powf((max_size - s) as f64)).collect::<Vec<f64>>();

    let fractions_sum = fractions.iter().sum::<f64>();
    for item in &mut fractions {
        *item /= fractions_sum;
    }

    fractions
}
