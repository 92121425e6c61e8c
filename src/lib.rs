#![allow(non_snake_case)]

//!
//! A driver for benchmarking algorithms that compute isomorphisms between two
//! representations of the same finite field `GF(p^n)`.
//!
//! For every admissible parameter pair `(p, n)` of a configured sweep, the driver
//! constructs two independent representations of the field, computes the invariants
//! that decide which algorithm families are applicable, times each applicable algorithm
//! over several attempts and writes one line of mean times per pair. The algorithms
//! themselves, as well as the finite field arithmetic, are provided by the caller
//! through the traits in [`field`], [`isomorphism`], [`invariants`] and [`cas`].
//!
//! The entry point is [`benchmark::benchmark()`].
//!

pub mod computation;
pub mod algorithms;
pub mod params;
pub mod field;
pub mod invariants;
pub mod isomorphism;
pub mod cas;
pub mod trial;
pub mod suite;
pub mod emit;
pub mod config;
pub mod benchmark;

#[cfg(test)]
mod testing;
