///
/// Contains a version of the Sieve of Erathostenes, for enumerating
/// prime numbers up to a certain bound.
/// 
pub mod erathostenes;
///
/// Contains modular multiplication and square-and-multiply exponentiation
/// of `u64` integers.
/// 
pub mod sqr_mul;
///
/// Contains the euclidean algorithm for `u64` integers.
/// 
pub mod eea;
///
/// Contains an implementation of the Miller-Rabin probabilistic primality test.
/// 
pub mod miller_rabin;
///
/// Contains integer factoring and related utilities, like computing integer roots
/// and detecting prime powers.
/// 
pub mod int_factor;
///
/// Contains an algorithm to compute multiplicative orders in `(Z/nZ)*`.
/// 
pub mod unit_order;
