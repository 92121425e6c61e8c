use std::ops::RangeInclusive;

use crate::benchmark::BenchmarkError;
use crate::cas::{reap_orphaned_children, CasInstance, CasService};
use crate::field::{BenchmarkFields, FieldBackend};
use crate::invariants::{Invariants, RootOrderSearch};
use crate::isomorphism::*;
use crate::params::ParameterPair;
use crate::trial::{TrialRunner, TrialSettings};

///
/// Which algorithm families to run, and the windows for the invariants `o` and `c`
/// outside of which the corresponding families are skipped.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteSettings {
    pub trials: TrialSettings,
    pub o_window: RangeInclusive<u64>,
    pub c_window: RangeInclusive<u64>,
    pub skip_cas_embed: bool,
    pub skip_rains: bool,
    pub skip_cas_library: bool,
    pub skip_kummer: bool,
    pub kummer_variants: Vec<KummerVariant>
}

///
/// The mean times of all benchmarked algorithms on one parameter pair, in seconds.
/// Skipped algorithms have time `0`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyTimings {
    pub cas_embed: f64,
    ///
    /// The plain cyclotomic, the Lucas and the elliptic variant of Rains' algorithm,
    /// in this order.
    ///
    pub rains: [f64; 3],
    pub cas_library: f64,
    ///
    /// One entry per configured Kummer variant, in the configured order.
    ///
    pub kummer: Vec<f64>
}

///
/// The collection of benchmarked algorithms, together with the field backends they
/// work with.
///
/// The CAS-embed and CAS-library families work with the symbolic backend `S`, while
/// the Rains and Kummer families work with the native backend `N`.
///
pub struct AlgorithmSuite<'a, S: FieldBackend, N: FieldBackend> {
    pub symbolic: S,
    pub native: N,
    pub root_order: Box<dyn RootOrderSearch + 'a>,
    pub cas_embed: Box<dyn CasService<S> + 'a>,
    pub rains_cyclotomic: Box<dyn CyclotomicRains<N> + 'a>,
    pub rains_elliptic: Box<dyn IsomorphismAlgorithm<N> + 'a>,
    pub cas_library: Box<dyn IsomorphismAlgorithm<S> + 'a>,
    pub kummer: Box<dyn KummerAlgorithm<N> + 'a>
}

impl<'a, S: FieldBackend, N: FieldBackend> AlgorithmSuite<'a, S, N> {

    pub fn invariants(&mut self, params: ParameterPair) -> Invariants {
        Invariants::compute(params, &mut *self.root_order)
    }

    ///
    /// Runs all algorithm families on the given field representations, in the order
    /// CAS-embed, Rains (cyclotomic, Lucas, elliptic), CAS library, Kummer.
    ///
    #[tracing::instrument(skip_all, fields(p = params.p, n = params.n))]
    pub fn run_pair(&mut self, settings: &SuiteSettings, params: ParameterPair, invariants: Invariants, fields: &BenchmarkFields<S, N>) -> Result<FamilyTimings, BenchmarkError> {
        let symbolic_runner = TrialRunner::new(&settings.trials, &self.symbolic, &fields.symbolic, params);
        let native_runner = TrialRunner::new(&settings.trials, &self.native, &fields.native, params);

        let cas_embed = if !settings.skip_cas_embed && invariants.cas_embed_applicable(params, &settings.o_window) {
            let service = &mut *self.cas_embed;
            symbolic_runner.run(Family::CasEmbed, |clock| {
                let result = {
                    let mut instance = CasInstance::start(&mut *service)?;
                    let attempt = (|| {
                        let source = instance.load(&fields.symbolic.canonical)?;
                        let target = instance.load(&fields.symbolic.randomized)?;
                        clock.time(|| instance.embed(source, target))
                    })();
                    instance.release()?;
                    attempt
                };
                reap_orphaned_children();
                result.map(|()| None)
            })?
        } else {
            skipped(Family::CasEmbed)
        };

        let rains_cyclotomic = &mut *self.rains_cyclotomic;
        let rains_plain = if !settings.skip_rains && invariants.rains_applicable(params, &settings.o_window) {
            native_runner.run(Family::RainsCyclotomic, |clock| {
                clock.time(|| rains_cyclotomic.find_generators(&fields.native.canonical, &fields.native.randomized, CyclotomicVariant::Plain)).map(Some)
            })?
        } else {
            skipped(Family::RainsCyclotomic)
        };
        let rains_lucas = if !settings.skip_rains && invariants.lucas_applicable(params, &settings.o_window) {
            native_runner.run(Family::RainsLucas, |clock| {
                clock.time(|| rains_cyclotomic.find_generators(&fields.native.canonical, &fields.native.randomized, CyclotomicVariant::Lucas)).map(Some)
            })?
        } else {
            skipped(Family::RainsLucas)
        };
        let rains_elliptic = if !settings.skip_rains {
            let algorithm = &mut *self.rains_elliptic;
            native_runner.run(Family::RainsElliptic, |clock| {
                clock.time(|| algorithm.find_generators(&fields.native.canonical, &fields.native.randomized)).map(Some)
            })?
        } else {
            skipped(Family::RainsElliptic)
        };

        let kummer_applicable = invariants.kummer_applicable(&settings.c_window);
        let cas_library = if !settings.skip_cas_library && kummer_applicable {
            let algorithm = &mut *self.cas_library;
            symbolic_runner.run(Family::CasLibrary, |clock| {
                clock.time(|| algorithm.find_generators(&fields.symbolic.canonical, &fields.symbolic.randomized)).map(Some)
            })?
        } else {
            skipped(Family::CasLibrary)
        };

        let mut kummer = Vec::with_capacity(settings.kummer_variants.len());
        for (index, variant) in settings.kummer_variants.iter().enumerate() {
            let family = Family::Kummer(index);
            // variants that are not implemented for `c = 1` keep their column, with time `0`
            let timing = if !settings.skip_kummer && kummer_applicable && variant.applies_to(invariants.c) {
                let algorithm = &mut *self.kummer;
                native_runner.run(family, |clock| {
                    clock.time(|| algorithm.find_generators(&fields.native.canonical, &fields.native.randomized, params.n, variant)).map(Some)
                })?
            } else {
                skipped(family)
            };
            kummer.push(timing);
        }

        return Ok(FamilyTimings {
            cas_embed,
            rains: [rains_plain, rains_lucas, rains_elliptic],
            cas_library,
            kummer
        });
    }
}

fn skipped(family: Family) -> f64 {
    tracing::debug!(%family, "skipped");
    0.
}

#[cfg(test)]
use crate::testing::*;
#[cfg(test)]
use crate::trial::{CheckLevel, TimeSource};
#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
fn suite_settings(loops: usize) -> SuiteSettings {
    SuiteSettings {
        trials: TrialSettings { loops, tmax: None, check: CheckLevel::Every, clock: TimeSource::Wall },
        o_window: 1..=u64::MAX,
        c_window: 1..=u64::MAX,
        skip_cas_embed: false,
        skip_rains: false,
        skip_cas_library: false,
        skip_kummer: false,
        kummer_variants: KummerVariant::defaults()
    }
}

#[cfg(test)]
fn run(suite: &mut MockSuite, settings: &SuiteSettings, params: ParameterPair) -> (Invariants, Result<FamilyTimings, BenchmarkError>) {
    let fields = BenchmarkFields::construct(&suite.suite.symbolic, &suite.suite.native, params, &mut oorandom::Rand64::new(3));
    let invariants = suite.suite.invariants(params);
    let result = suite.suite.run_pair(settings, params, invariants, &fields);
    (invariants, result)
}

#[test]
fn test_all_families_run() {
    let mut suite = MockSuite::new(|_| 2);
    let settings = suite_settings(1);
    let (invariants, timings) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    let timings = timings.unwrap();
    assert_eq!(Invariants { o: 2, c: 4 }, invariants);
    assert!(timings.cas_embed > 0.);
    assert!(timings.rains.iter().all(|t| *t > 0.));
    assert!(timings.cas_library > 0.);
    assert_eq!(6, timings.kummer.len());
    assert!(timings.kummer.iter().all(|t| *t > 0.));
    assert_eq!(1, suite.cas_log.started());
    assert_eq!(1, suite.cas_log.quit());
    assert_eq!(1, suite.calls.get(Family::RainsCyclotomic));
    assert_eq!(1, suite.calls.get(Family::RainsLucas));
    assert_eq!(1, suite.calls.get(Family::RainsElliptic));
    assert_eq!(1, suite.calls.get(Family::CasLibrary));
    assert_eq!(6, suite.calls.kummer_total());
}

#[test]
fn test_trivial_cyclotomic_padding() {
    let mut suite = MockSuite::new(|_| 4);
    let settings = suite_settings(2);
    let (invariants, timings) = run(&mut suite, &settings, ParameterPair { p: 7, n: 3 });
    let timings = timings.unwrap();
    assert_eq!(1, invariants.c);
    assert_eq!(6, timings.kummer.len());
    assert_eq!(0., timings.kummer[0]);
    assert_eq!(0., timings.kummer[1]);
    assert!(timings.kummer[2] > 0.);
    assert!(timings.kummer[3] > 0.);
    assert_eq!(0., timings.kummer[4]);
    assert_eq!(0., timings.kummer[5]);
    assert_eq!(vec!["linalg", "linalg", "modcomp", "modcomp"], suite.calls.kummer_variants());
    // `o = 4` excludes only the Lucas variant
    assert_eq!(0., timings.rains[1]);
    assert!(timings.rains[0] > 0.);
}

#[test]
fn test_padding_parametric_in_variant_count() {
    let mut suite = MockSuite::new(|_| 2);
    let mut settings = suite_settings(1);
    settings.kummer_variants = vec![
        KummerVariant::new("a", false),
        KummerVariant::new("b", true),
        KummerVariant::new("c", false)
    ];
    let (_, timings) = run(&mut suite, &settings, ParameterPair { p: 7, n: 3 });
    let timings = timings.unwrap();
    assert_eq!(3, timings.kummer.len());
    assert_eq!(0., timings.kummer[0]);
    assert!(timings.kummer[1] > 0.);
    assert_eq!(0., timings.kummer[2]);

    let (_, timings) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    let timings = timings.unwrap();
    assert_eq!(3, timings.kummer.len());
    assert!(timings.kummer.iter().all(|t| *t > 0.));
}

#[test]
fn test_skip_flags() {
    let mut suite = MockSuite::new(|_| 2);
    let mut settings = suite_settings(3);
    settings.skip_cas_embed = true;
    settings.skip_rains = true;
    settings.skip_cas_library = true;
    settings.skip_kummer = true;
    let (_, timings) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    let timings = timings.unwrap();
    assert_eq!(FamilyTimings { cas_embed: 0., rains: [0., 0., 0.], cas_library: 0., kummer: vec![0.; 6] }, timings);
    assert_eq!(0, suite.cas_log.started());
    assert_eq!(0, suite.calls.total());
}

#[test]
fn test_order_guards() {
    // o = p excludes the CAS-embed and both cyclotomic Rains variants, but not the elliptic one
    let mut suite = MockSuite::new(|params| params.p);
    let settings = suite_settings(1);
    let (_, timings) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    let timings = timings.unwrap();
    assert_eq!(0., timings.cas_embed);
    assert_eq!(0., timings.rains[0]);
    assert_eq!(0., timings.rains[1]);
    assert!(timings.rains[2] > 0.);
    assert_eq!(0, suite.cas_log.started());

    // o above the ceiling
    let mut suite = MockSuite::new(|_| 11);
    let mut settings = suite_settings(1);
    settings.o_window = 1..=10;
    let (_, timings) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    let timings = timings.unwrap();
    assert_eq!(0., timings.cas_embed);
    assert_eq!(0., timings.rains[0]);
    assert!(timings.rains[2] > 0.);
}

#[test]
fn test_cyclotomic_window() {
    let mut suite = MockSuite::new(|_| 2);
    let mut settings = suite_settings(1);
    settings.c_window = 1..=3;
    let (invariants, timings) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    let timings = timings.unwrap();
    assert_eq!(4, invariants.c);
    assert_eq!(0., timings.cas_library);
    assert_eq!(vec![0.; 6], timings.kummer);
    assert!(timings.cas_embed > 0.);
    assert_eq!(0, suite.calls.kummer_total());
}

#[test]
fn test_cas_soft_failure_releases_instance() {
    let mut suite = MockSuite::with_cas(|_| 2, MockCas::confused());
    let settings = suite_settings(4);
    let (_, timings) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    let timings = timings.unwrap();
    assert_eq!(0., timings.cas_embed);
    assert_eq!(4, suite.cas_log.started());
    assert_eq!(4, suite.cas_log.quit());
}

#[test]
fn test_cas_start_failure_is_fatal() {
    let mut suite = MockSuite::with_cas(|_| 2, MockCas::unavailable());
    let settings = suite_settings(4);
    let (_, result) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    assert!(matches!(result, Err(BenchmarkError::Environment { family: Family::CasEmbed, .. })));
    assert_eq!(0, suite.calls.total());
}

#[test]
fn test_incorrect_algorithm_is_fatal() {
    let mut suite = MockSuite::new(|_| 2);
    suite.suite.rains_elliptic = Box::new(MockAlgorithm::mismatched());
    let settings = suite_settings(2);
    let (_, result) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    assert!(matches!(result, Err(BenchmarkError::DifferentMinpolys { family: Family::RainsElliptic, p: 3, n: 5 })));
    // families after the failing one are not run
    assert_eq!(0, suite.calls.get(Family::CasLibrary));
}

#[test]
fn test_cas_quit_failure_is_fatal() {
    let mut suite = MockSuite::with_cas(|_| 2, MockCas::unkillable());
    let settings = suite_settings(3);
    let (_, result) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    assert!(matches!(result, Err(BenchmarkError::Environment { family: Family::CasEmbed, .. })));
    assert_eq!(1, suite.cas_log.started());
    assert_eq!(1, suite.cas_log.quit());
    assert_eq!(0, suite.calls.total());
}

#[test]
fn test_cas_setup_not_timed() {
    let delay = Duration::from_millis(50);
    let mut suite = MockSuite::with_cas(|_| 2, MockCas::slow_load(delay));
    let settings = suite_settings(2);
    let (_, timings) = run(&mut suite, &settings, ParameterPair { p: 3, n: 5 });
    let timings = timings.unwrap();
    assert_eq!(2, suite.cas_log.embedded());
    assert!(timings.cas_embed > 0.);
    // each attempt loads two fields, which takes at least `2 * delay`
    assert!(timings.cas_embed < delay.as_secs_f64() / 2., "{}", timings.cas_embed);
}
