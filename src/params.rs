use std::fmt::{Display, Formatter};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::algorithms::int_factor::is_prime_power;
use crate::algorithms::miller_rabin::is_prime;

///
/// The characteristic `p` and extension degree `n` of the finite field `GF(p^n)`
/// that is benchmarked in one iteration.
///
/// Parameter pairs produced by [`ParameterPairs`] always have `p` prime, `n >= 2`
/// and `gcd(p, n) = 1`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterPair {
    pub p: u64,
    pub n: u64
}

impl Display for ParameterPair {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "p = {}, n = {}", self.p, self.n)
    }
}

///
/// Restriction on the extension degree `n`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimalityMode {
    #[default]
    Any,
    Prime,
    PrimePower
}

impl PrimalityMode {

    pub fn admits(&self, n: u64) -> bool {
        match self {
            PrimalityMode::Any => true,
            PrimalityMode::Prime => is_prime(n),
            PrimalityMode::PrimePower => is_prime_power(n).is_some()
        }
    }
}

///
/// The set of parameters to sweep over, i.e. the half-open ranges for `p` and `n`
/// together with the filters applied to `n`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpace {
    pub p_range: Range<u64>,
    pub n_range: Range<u64>,
    pub primality: PrimalityMode,
    /// if `false`, only odd `n` are considered; if `true`, `n` of both parities are
    pub even: bool
}

impl ParameterSpace {

    pub fn admits_degree(&self, p: u64, n: u64) -> bool {
        n >= 2 &&
            self.primality.admits(n) &&
            n % p != 0 &&
            (self.even || n % 2 == 1)
    }

    pub fn pairs(&self) -> ParameterPairs {
        ParameterPairs::new(self)
    }
}

///
/// Lazy iterator over all admissible [`ParameterPair`]s of a [`ParameterSpace`],
/// ordered by `p` first, and then by `n`.
///
/// Since `p` is always prime, the condition `gcd(p, n) = 1` reduces to `p` not
/// dividing `n`.
///
pub struct ParameterPairs {
    space: ParameterSpace,
    current_p: Option<u64>,
    next_p: u64,
    next_n: u64
}

impl ParameterPairs {

    pub fn new(space: &ParameterSpace) -> Self {
        ParameterPairs {
            space: space.clone(),
            current_p: None,
            next_p: space.p_range.start,
            next_n: space.n_range.start
        }
    }

    fn advance_p(&mut self) -> Option<u64> {
        while self.next_p < self.space.p_range.end {
            let candidate = self.next_p;
            self.next_p += 1;
            if is_prime(candidate) {
                return Some(candidate);
            }
        }
        return None;
    }
}

impl Iterator for ParameterPairs {

    type Item = ParameterPair;

    fn next(&mut self) -> Option<ParameterPair> {
        loop {
            let p = match self.current_p {
                Some(p) => p,
                None => {
                    let p = self.advance_p()?;
                    self.current_p = Some(p);
                    self.next_n = self.space.n_range.start;
                    p
                }
            };
            while self.next_n < self.space.n_range.end {
                let n = self.next_n;
                self.next_n += 1;
                if self.space.admits_degree(p, n) {
                    return Some(ParameterPair { p, n });
                }
            }
            self.current_p = None;
        }
    }
}

#[cfg(test)]
use crate::algorithms::eea::gcd;

#[cfg(test)]
fn space(p_range: Range<u64>, n_range: Range<u64>, primality: PrimalityMode, even: bool) -> ParameterSpace {
    ParameterSpace { p_range, n_range, primality, even }
}

#[test]
fn test_enumerate_small() {
    let pairs = space(2..6, 2..8, PrimalityMode::Any, false).pairs().collect::<Vec<_>>();
    let expected = [(2, 3), (2, 5), (2, 7), (3, 5), (3, 7), (5, 3), (5, 7)];
    assert_eq!(expected.iter().map(|(p, n)| ParameterPair { p: *p, n: *n }).collect::<Vec<_>>(), pairs);
}

#[test]
fn test_enumerate_even() {
    let pairs = space(3..4, 2..9, PrimalityMode::Any, true).pairs().map(|pair| pair.n).collect::<Vec<_>>();
    assert_eq!(vec![2, 4, 5, 7, 8], pairs);
}

#[test]
fn test_enumerate_properties() {
    for primality in [PrimalityMode::Any, PrimalityMode::Prime, PrimalityMode::PrimePower] {
        for even in [false, true] {
            let space = space(0..60, 0..50, primality, even);
            let mut count = 0;
            for pair in space.pairs() {
                count += 1;
                assert!(is_prime(pair.p));
                assert!(pair.n >= 2);
                assert_eq!(1, gcd(pair.p, pair.n));
                assert!(even || pair.n % 2 == 1);
                match primality {
                    PrimalityMode::Any => {},
                    PrimalityMode::Prime => assert!(is_prime(pair.n)),
                    PrimalityMode::PrimePower => assert!(is_prime_power(pair.n).is_some())
                }
            }
            assert!(count > 0);
        }
    }
}

#[test]
fn test_enumerate_prime_power() {
    let pairs = space(5..6, 2..30, PrimalityMode::PrimePower, false).pairs().map(|pair| pair.n).collect::<Vec<_>>();
    assert_eq!(vec![3, 7, 9, 11, 13, 17, 19, 23, 27, 29], pairs);
    let pairs = space(5..6, 2..30, PrimalityMode::Prime, true).pairs().map(|pair| pair.n).collect::<Vec<_>>();
    assert_eq!(vec![2, 3, 7, 11, 13, 17, 19, 23, 29], pairs);
}

#[test]
fn test_enumerate_empty() {
    assert_eq!(0, space(10..3, 2..10, PrimalityMode::Any, false).pairs().count());
    assert_eq!(0, space(3..10, 10..2, PrimalityMode::Any, false).pairs().count());
    assert_eq!(0, space(8..11, 2..10, PrimalityMode::Any, false).pairs().count());
    assert_eq!(0, space(3..10, 0..2, PrimalityMode::Any, true).pairs().count());
}

#[test]
fn test_enumerate_restartable() {
    let space = space(3..20, 3..20, PrimalityMode::Any, false);
    let first = space.pairs().collect::<Vec<_>>();
    let second = space.pairs().collect::<Vec<_>>();
    assert_eq!(first, second);
    assert!(first.len() > 10);
}
