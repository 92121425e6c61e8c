use std::fmt::{Display, Formatter};
use std::io;

use serde::{Deserialize, Serialize};

use crate::field::FieldBackend;

///
/// Reasons why a single attempt of a benchmarked algorithm did not produce a result.
///
/// All variants except [`AttemptError::Environment`] are soft failures: the attempt
/// contributes no time, but still counts towards the number of performed attempts.
///
#[derive(Debug)]
pub enum AttemptError {
    ///
    /// The (usually randomized) algorithm could not find an isomorphism in this attempt.
    ///
    NoIsomorphismFound,
    ///
    /// The algorithm is not applicable to the given parameters.
    ///
    Inapplicable,
    ///
    /// The interface to an external system got confused about the types of the
    /// exchanged objects.
    ///
    InterfaceConfusion(String),
    ///
    /// Starting or stopping an external process failed. Retrying is expected to
    /// make the situation worse, hence this aborts the benchmark.
    ///
    Environment(io::Error)
}

impl Display for AttemptError {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::NoIsomorphismFound => write!(f, "no isomorphism found in this attempt"),
            AttemptError::Inapplicable => write!(f, "algorithm not applicable to these parameters"),
            AttemptError::InterfaceConfusion(msg) => write!(f, "external interface failure: {}", msg),
            AttemptError::Environment(err) => write!(f, "external process failure: {}", err)
        }
    }
}

impl std::error::Error for AttemptError {

    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttemptError::Environment(err) => Some(err),
            _ => None
        }
    }
}

impl From<io::Error> for AttemptError {

    fn from(err: io::Error) -> Self {
        AttemptError::Environment(err)
    }
}

///
/// Generators `(a, b)` of two representations of the same field, such that `a -> b`
/// defines an isomorphism. In particular, `a` and `b` have the same minimal polynomial.
///
pub type Generators<B> = (<B as FieldBackend>::Element, <B as FieldBackend>::Element);

///
/// An algorithm that computes an isomorphism between two representations of a finite
/// field, by finding compatible generators.
///
pub trait IsomorphismAlgorithm<B: FieldBackend> {

    fn find_generators(&mut self, source: &B::Field, target: &B::Field) -> Result<Generators<B>, AttemptError>;
}

///
/// The two variants of Rains' algorithm based on cyclotomic auxiliary extensions.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CyclotomicVariant {
    Plain,
    ///
    /// Uses Lucas sequences instead of arithmetic in the auxiliary extension,
    /// only applicable if the root order is `2`.
    ///
    Lucas
}

///
/// Rains' randomized algorithm using cyclotomic auxiliary structure.
///
pub trait CyclotomicRains<B: FieldBackend> {

    fn find_generators(&mut self, source: &B::Field, target: &B::Field, variant: CyclotomicVariant) -> Result<Generators<B>, AttemptError>;
}

///
/// One of the strategies of the Kummer-type algorithm, e.g. the way in which the
/// semi-trace is computed.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KummerVariant {
    pub name: String,
    ///
    /// Whether the variant is implemented for the case that the auxiliary cyclotomic
    /// extension is trivial, i.e. `c = 1`.
    ///
    pub trivial_cyclotomic: bool
}

impl KummerVariant {

    pub fn new(name: &str, trivial_cyclotomic: bool) -> Self {
        KummerVariant { name: name.to_owned(), trivial_cyclotomic }
    }

    pub fn applies_to(&self, c: u64) -> bool {
        c != 1 || self.trivial_cyclotomic
    }

    ///
    /// The default list of variants: two at each end that require a nontrivial
    /// cyclotomic extension, and the linear algebra and modular composition variants
    /// in the middle, which work for all `c`.
    ///
    pub fn defaults() -> Vec<KummerVariant> {
        vec![
            KummerVariant::new("cofactor", false),
            KummerVariant::new("iterfrob", false),
            KummerVariant::new("linalg", true),
            KummerVariant::new("modcomp", true),
            KummerVariant::new("ht90_modexp", false),
            KummerVariant::new("ht90_linalg", false)
        ]
    }
}

///
/// The deterministic Kummer-type algorithm, parameterized by the extension degree
/// and the variant to use.
///
pub trait KummerAlgorithm<B: FieldBackend> {

    fn find_generators(&mut self, source: &B::Field, target: &B::Field, degree: u64, variant: &KummerVariant) -> Result<Generators<B>, AttemptError>;
}

///
/// Identifies a benchmarked algorithm family (and variant), used for logging and
/// in error messages.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    CasEmbed,
    RainsCyclotomic,
    RainsLucas,
    RainsElliptic,
    CasLibrary,
    Kummer(usize)
}

impl Display for Family {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Family::CasEmbed => write!(f, "cas-embed"),
            Family::RainsCyclotomic => write!(f, "rains-cyclotomic"),
            Family::RainsLucas => write!(f, "rains-lucas"),
            Family::RainsElliptic => write!(f, "rains-elliptic"),
            Family::CasLibrary => write!(f, "cas-library"),
            Family::Kummer(index) => write!(f, "kummer[{}]", index)
        }
    }
}

#[test]
fn test_kummer_defaults() {
    let variants = KummerVariant::defaults();
    assert_eq!(6, variants.len());
    assert_eq!(2, variants.iter().filter(|v| v.applies_to(1)).count());
    assert!(variants.iter().all(|v| v.applies_to(2)));
    assert!(!variants[0].applies_to(1) && !variants[1].applies_to(1));
    assert!(!variants[4].applies_to(1) && !variants[5].applies_to(1));
}

#[test]
fn test_family_display() {
    assert_eq!("cas-embed", format!("{}", Family::CasEmbed));
    assert_eq!("kummer[3]", format!("{}", Family::Kummer(3)));
}
