use std::fmt;

use crate::descriptor::Descriptor;

/// Additive checksum over every descriptor word.
///
/// Pure wrapping summation: order-independent, detects gross corruption
/// (wrong count, zeroed or garbage output), not a proof of correctness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Checksum(pub u64);

impl fmt::LowerHex for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

pub fn checksum(descriptors: &[Descriptor]) -> Checksum {
    let total = descriptors
        .iter()
        .flat_map(|d| d.words().iter())
        .fold(0u64, |acc, &w| acc.wrapping_add(w));
    Checksum(total)
}

/// Pairwise comparison of two descriptor sets, index by index.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Comparison {
    /// Pairs compared (the shorter of the two lengths).
    pub compared: usize,
    pub identical: usize,
    pub left_len: usize,
    pub right_len: usize,
    /// Mean Hamming distance over the compared pairs; zero when none.
    pub mean_hamming: f64,
    pub max_hamming: u32,
}

impl Comparison {
    pub fn differing(&self) -> usize {
        self.compared - self.identical
    }

    pub fn lengths_match(&self) -> bool {
        self.left_len == self.right_len
    }
}

pub fn compare(left: &[Descriptor], right: &[Descriptor]) -> Comparison {
    let mut result = Comparison {
        left_len: left.len(),
        right_len: right.len(),
        ..Default::default()
    };
    let mut total = 0u64;
    for (a, b) in left.iter().zip(right) {
        let d = a.hamming(b);
        result.compared += 1;
        if d == 0 {
            result.identical += 1;
        }
        result.max_hamming = result.max_hamming.max(d);
        total += d as u64;
    }
    if result.compared > 0 {
        result.mean_hamming = total as f64 / result.compared as f64;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_wraps() {
        let d = Descriptor([u64::MAX, 2, 0, 0, 0, 0, 0, 0]);
        assert_eq!(checksum(&[d]), Checksum(1));
        assert_eq!(checksum(&[]), Checksum(0));
    }

    #[test]
    fn test_checksum_hex_format() {
        assert_eq!(Checksum(0xdead_beef).to_string(), "deadbeef");
    }

    #[test]
    fn test_compare_counts_differences() {
        let zero = Descriptor::default();
        let mut one = zero;
        one.set_bit(3);
        let cmp = compare(&[zero, one, zero], &[zero, zero]);
        assert_eq!(cmp.compared, 2);
        assert_eq!(cmp.identical, 1);
        assert_eq!(cmp.differing(), 1);
        assert_eq!(cmp.max_hamming, 1);
        assert!(!cmp.lengths_match());
        assert!((cmp.mean_hamming - 0.5).abs() < 1e-12);
    }
}
