use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::algorithms::unit_order::multiplicative_order;
use crate::params::ParameterPair;

///
/// Searches for the order `o` of the roots of unity used by Rains' algorithm
/// to build an isomorphism between two copies of `GF(p^n)`.
///
pub trait RootOrderSearch {

    fn root_order(&mut self, params: ParameterPair) -> u64;
}

impl<F> RootOrderSearch for F
    where F: FnMut(ParameterPair) -> u64
{
    fn root_order(&mut self, params: ParameterPair) -> u64 {
        self(params)
    }
}

///
/// The invariants of a [`ParameterPair`] that determine which algorithm families
/// are applicable:
///  - `o` is the order returned by the [`RootOrderSearch`], governing the Rains
///    family and the CAS-embed family
///  - `c` is the multiplicative order of `p` modulo `n`, i.e. the degree of the
///    cyclotomic extension used by the Kummer family and the CAS library
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Invariants {
    pub o: u64,
    pub c: u64
}

impl Invariants {

    #[tracing::instrument(skip(root_order), level = "trace")]
    pub fn compute<R>(params: ParameterPair, root_order: &mut R) -> Self
        where R: ?Sized + RootOrderSearch
    {
        let o = root_order.root_order(params);
        // `n` is coprime to the prime `p` for all enumerated pairs
        let c = multiplicative_order(params.p, params.n).unwrap_or(0);
        Invariants { o, c }
    }

    ///
    /// Guard shared by the CAS-embed family and the plain cyclotomic Rains algorithm.
    /// The case `o = p` is degenerate and excluded.
    ///
    pub fn rains_applicable(&self, params: ParameterPair, o_window: &RangeInclusive<u64>) -> bool {
        o_window.contains(&self.o) && self.o != params.p
    }

    pub fn cas_embed_applicable(&self, params: ParameterPair, o_window: &RangeInclusive<u64>) -> bool {
        self.rains_applicable(params, o_window)
    }

    pub fn lucas_applicable(&self, params: ParameterPair, o_window: &RangeInclusive<u64>) -> bool {
        self.o == 2 && self.rains_applicable(params, o_window)
    }

    ///
    /// Guard shared by the Kummer family and the CAS library.
    ///
    pub fn kummer_applicable(&self, c_window: &RangeInclusive<u64>) -> bool {
        c_window.contains(&self.c)
    }
}

impl Display for Invariants {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.o, self.c)
    }
}

#[test]
fn test_compute_invariants() {
    let mut calls = Vec::new();
    let mut search = |params: ParameterPair| -> u64 {
        calls.push(params);
        11
    };
    let invariants = Invariants::compute(ParameterPair { p: 3, n: 5 }, &mut search);
    assert_eq!(Invariants { o: 11, c: 4 }, invariants);
    assert_eq!(vec![ParameterPair { p: 3, n: 5 }], calls);
}

#[test]
fn test_compute_trivial_cyclotomic() {
    let invariants = Invariants::compute(ParameterPair { p: 7, n: 3 }, &mut |_: ParameterPair| -> u64 { 2 });
    assert_eq!(Invariants { o: 2, c: 1 }, invariants);
}

#[test]
fn test_guards() {
    let params = ParameterPair { p: 3, n: 5 };
    let unbounded = 1..=u64::MAX;
    assert!(Invariants { o: 11, c: 4 }.rains_applicable(params, &unbounded));
    assert!(!Invariants { o: 11, c: 4 }.rains_applicable(params, &(1..=10)));
    assert!(!Invariants { o: 3, c: 4 }.rains_applicable(params, &unbounded));
    assert!(!Invariants { o: 3, c: 4 }.cas_embed_applicable(params, &unbounded));
    assert!(Invariants { o: 2, c: 4 }.lucas_applicable(params, &unbounded));
    assert!(!Invariants { o: 4, c: 4 }.lucas_applicable(params, &unbounded));
    assert!(!Invariants { o: 2, c: 4 }.lucas_applicable(params, &(3..=10)));
    assert!(Invariants { o: 2, c: 4 }.kummer_applicable(&(1..=4)));
    assert!(!Invariants { o: 2, c: 4 }.kummer_applicable(&(1..=3)));
    assert!(!Invariants { o: 2, c: 4 }.kummer_applicable(&(5..=9)));
}

#[test]
fn test_display() {
    assert_eq!("(2, 4)", format!("{}", Invariants { o: 2, c: 4 }));
}
