use std::fmt::Debug;

use crate::params::ParameterPair;

///
/// A numeric backend in which finite fields can be represented, e.g. a general
/// symbolic encoding as used by a computer algebra system, or a fast native encoding
/// based on word-size modular arithmetic.
///
/// The backend owns the finite field arithmetic; this crate only needs to create
/// fields and to compute minimal polynomials, which serve as the correctness oracle
/// for the isomorphisms found by the benchmarked algorithms.
///
pub trait FieldBackend {

    ///
    /// A handle to a representation of `GF(p^n)`, usually given as `GF(p)[X]/(f)`
    /// for some irreducible polynomial `f`.
    ///
    type Field;

    type Element;

    ///
    /// A univariate polynomial over the prime field `GF(p)`.
    ///
    type Poly: PartialEq + Debug;

    ///
    /// Creates the canonical representation of `GF(p^n)`, i.e. the one whose modulus
    /// depends only on `p` and `n`.
    ///
    fn canonical_field(&self, params: ParameterPair) -> Self::Field;

    ///
    /// Creates a representation of `GF(p^n)` w.r.t. a random irreducible modulus, drawn
    /// using the given source of randomness.
    ///
    fn random_field(&self, params: ParameterPair, rng: &mut oorandom::Rand64) -> Self::Field;

    ///
    /// Computes the minimal polynomial of `el` over the prime field.
    ///
    fn minpoly(&self, field: &Self::Field, el: &Self::Element) -> Self::Poly;

    fn degree(&self, poly: &Self::Poly) -> usize;
}

///
/// Two independently constructed representations of the same finite field, so that
/// benchmarked algorithms have to find a nontrivial isomorphism instead of the identity.
///
#[derive(Debug, Clone)]
pub struct FieldPair<F> {
    pub canonical: F,
    pub randomized: F
}

impl<F> FieldPair<F> {

    pub fn construct<B>(backend: &B, params: ParameterPair, rng: &mut oorandom::Rand64) -> Self
        where B: FieldBackend<Field = F>
    {
        FieldPair {
            canonical: backend.canonical_field(params),
            randomized: backend.random_field(params, rng)
        }
    }
}

///
/// All field representations required to benchmark one [`ParameterPair`]: the general
/// symbolic encoding used by the CAS-embed and CAS-library families, and the native
/// encoding used by the Rains and Kummer families.
///
pub struct BenchmarkFields<S: FieldBackend, N: FieldBackend> {
    pub symbolic: FieldPair<S::Field>,
    pub native: FieldPair<N::Field>
}

impl<S: FieldBackend, N: FieldBackend> BenchmarkFields<S, N> {

    pub fn construct(symbolic: &S, native: &N, params: ParameterPair, rng: &mut oorandom::Rand64) -> Self {
        BenchmarkFields {
            symbolic: FieldPair::construct(symbolic, params, rng),
            native: FieldPair::construct(native, params, rng)
        }
    }
}

#[cfg(test)]
use crate::testing::*;

#[test]
fn test_construct_pair_distinct() {
    let backend = MockBackend::new();
    let params = ParameterPair { p: 3, n: 5 };
    let mut rng = oorandom::Rand64::new(1);
    let pair = FieldPair::construct(&backend, params, &mut rng);
    assert_eq!(params, pair.canonical.params);
    assert_eq!(params, pair.randomized.params);
    assert_eq!(6, pair.canonical.modulus.len());
    assert_eq!(6, pair.randomized.modulus.len());
    assert_ne!(pair.canonical.modulus, pair.randomized.modulus);
}

#[test]
fn test_construct_pair_reproducible() {
    let backend = MockBackend::new();
    let params = ParameterPair { p: 7, n: 9 };
    let first = FieldPair::construct(&backend, params, &mut oorandom::Rand64::new(42));
    let second = FieldPair::construct(&backend, params, &mut oorandom::Rand64::new(42));
    assert_eq!(first.canonical.modulus, second.canonical.modulus);
    assert_eq!(first.randomized.modulus, second.randomized.modulus);
}

#[test]
fn test_construct_benchmark_fields() {
    let symbolic = MockBackend::new();
    let native = MockBackend::new();
    let params = ParameterPair { p: 5, n: 3 };
    let fields = BenchmarkFields::construct(&symbolic, &native, params, &mut oorandom::Rand64::new(7));
    assert_eq!(fields.symbolic.canonical.modulus, fields.native.canonical.modulus);
    assert_ne!(fields.symbolic.canonical.modulus, fields.symbolic.randomized.modulus);
    assert_ne!(fields.native.canonical.modulus, fields.native.randomized.modulus);
    assert_eq!(1, symbolic.constructed());
    assert_eq!(1, native.constructed());
}
