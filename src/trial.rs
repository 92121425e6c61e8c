use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::benchmark::BenchmarkError;
use crate::field::{FieldBackend, FieldPair};
use crate::isomorphism::{AttemptError, Family, Generators};
use crate::params::ParameterPair;

///
/// Which clock is used to measure the duration of algorithm calls.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    #[default]
    Wall,
    ///
    /// CPU time consumed by this process. Falls back to wall-clock time on platforms
    /// where it is not available.
    ///
    ProcessCpu
}

impl TimeSource {

    fn now(&self) -> Timestamp {
        match self {
            TimeSource::Wall => Timestamp::Wall(Instant::now()),
            TimeSource::ProcessCpu => process_cpu_time().map(Timestamp::Cpu).unwrap_or_else(|| Timestamp::Wall(Instant::now()))
        }
    }
}

enum Timestamp {
    Wall(Instant),
    Cpu(Duration)
}

impl Timestamp {

    fn elapsed(&self) -> Duration {
        match self {
            Timestamp::Wall(start) => start.elapsed(),
            Timestamp::Cpu(start) => process_cpu_time().map(|now| now.saturating_sub(*start)).unwrap_or(Duration::ZERO)
        }
    }
}

///
/// Returns the CPU time consumed by this process so far.
///
#[stability::unstable(feature = "enable")]
pub fn process_cpu_time() -> Option<Duration> {
    #[cfg(unix)] {
        // SAFETY: `timespec` is plain data, and `clock_gettime` only writes to `time`
        let mut time: libc::timespec = unsafe { std::mem::zeroed() };
        let result = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut time) };
        if result == 0 {
            return Some(Duration::new(time.tv_sec as u64, time.tv_nsec as u32));
        }
    }
    return None;
}

///
/// Measures the time spent in the timed part of one attempt.
///
/// Only the algorithm call itself should be timed, setup work like starting external
/// processes or converting inputs happens outside of [`AttemptClock::time()`].
///
pub struct AttemptClock {
    source: TimeSource,
    elapsed: Duration
}

impl AttemptClock {

    pub fn new(source: TimeSource) -> Self {
        AttemptClock { source, elapsed: Duration::ZERO }
    }

    pub fn time<T, F>(&mut self, f: F) -> T
        where F: FnOnce() -> T
    {
        let start = self.source.now();
        let result = f();
        self.elapsed += start.elapsed();
        return result;
    }

    ///
    /// Adds a duration that was measured externally, e.g. by an algorithm that
    /// reports its own running time.
    ///
    pub fn record(&mut self, duration: Duration) {
        self.elapsed += duration;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

///
/// Whether the generators returned by an algorithm are checked to define an isomorphism.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckLevel {
    #[default]
    Off,
    ///
    /// Only check the result of the first attempt of each algorithm.
    ///
    First,
    Every
}

impl CheckLevel {

    pub fn applies_to(&self, attempt_index: usize) -> bool {
        match self {
            CheckLevel::Off => false,
            CheckLevel::First => attempt_index == 0,
            CheckLevel::Every => true
        }
    }
}

///
/// The parameters of the timing loop that are shared by all algorithm families.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialSettings {
    pub loops: usize,
    ///
    /// Stop performing attempts once the accumulated time (in seconds) reaches this bound.
    /// This is only checked between attempts, so a single slow attempt can exceed it.
    ///
    pub tmax: Option<f64>,
    pub check: CheckLevel,
    pub clock: TimeSource
}

impl TrialSettings {

    fn budget_exhausted(&self, accumulated: f64) -> bool {
        self.tmax.map(|tmax| accumulated >= tmax).unwrap_or(false)
    }
}

///
/// Performs the timed attempts of one algorithm on one pair of field representations.
///
pub struct TrialRunner<'a, B: FieldBackend> {
    settings: &'a TrialSettings,
    backend: &'a B,
    fields: &'a FieldPair<B::Field>,
    params: ParameterPair
}

impl<'a, B: FieldBackend> TrialRunner<'a, B> {

    pub fn new(settings: &'a TrialSettings, backend: &'a B, fields: &'a FieldPair<B::Field>, params: ParameterPair) -> Self {
        TrialRunner { settings, backend, fields, params }
    }

    ///
    /// Runs up to `loops` attempts, and returns the mean time per attempt in seconds.
    ///
    /// An attempt returns the generators it found, or `None` if it completed without
    /// producing generators to check. Soft failures contribute no time, but they count
    /// as attempts, i.e. the mean is the total time of all successful attempts divided
    /// by the number of performed attempts. If no attempt is performed, this is `0`.
    ///
    /// Fails if an attempt fails in a way that must not be retried, or if the returned
    /// generators do not define an isomorphism.
    ///
    pub fn run<F>(&self, family: Family, mut attempt: F) -> Result<f64, BenchmarkError>
        where F: FnMut(&mut AttemptClock) -> Result<Option<Generators<B>>, AttemptError>
    {
        let mut accumulated = 0.;
        let mut attempts = 0;
        for l in 0..self.settings.loops {
            attempts = l + 1;
            let mut clock = AttemptClock::new(self.settings.clock);
            match attempt(&mut clock) {
                Ok(generators) => {
                    accumulated += clock.elapsed().as_secs_f64();
                    if let Some((a, b)) = generators {
                        if self.settings.check.applies_to(l) {
                            self.check_isomorphism(family, &a, &b)?;
                        }
                    }
                },
                Err(AttemptError::Environment(err)) => {
                    return Err(BenchmarkError::Environment { family, source: err });
                },
                Err(err) => {
                    tracing::debug!(%family, params = %self.params, attempt = l, %err, "attempt failed");
                }
            }
            if self.settings.budget_exhausted(accumulated) {
                break;
            }
        }
        return Ok(accumulated / attempts.max(1) as f64);
    }

    ///
    /// Checks that `a` and `b` have the same minimal polynomial of degree `n`, which
    /// is the case if and only if `a -> b` defines an isomorphism.
    ///
    pub fn check_isomorphism(&self, family: Family, a: &B::Element, b: &B::Element) -> Result<(), BenchmarkError> {
        let ParameterPair { p, n } = self.params;
        let minpoly_a = self.backend.minpoly(&self.fields.canonical, a);
        let degree = self.backend.degree(&minpoly_a);
        if degree as u64 != n {
            tracing::error!(%family, p, n, degree, "generator has wrong degree");
            return Err(BenchmarkError::WrongDegree { family, p, n, degree });
        }
        let minpoly_b = self.backend.minpoly(&self.fields.randomized, b);
        if minpoly_a != minpoly_b {
            tracing::error!(%family, p, n, ?minpoly_a, ?minpoly_b, "generators have different minimal polynomials");
            return Err(BenchmarkError::DifferentMinpolys { family, p, n });
        }
        return Ok(());
    }
}

#[cfg(test)]
use crate::testing::*;
#[cfg(test)]
use std::io;

#[cfg(test)]
fn settings(loops: usize, tmax: Option<f64>, check: CheckLevel) -> TrialSettings {
    TrialSettings { loops, tmax, check, clock: TimeSource::Wall }
}

#[cfg(test)]
fn fixture() -> (MockBackend, FieldPair<MockField>, ParameterPair) {
    let backend = MockBackend::new();
    let params = ParameterPair { p: 3, n: 5 };
    let fields = FieldPair::construct(&backend, params, &mut oorandom::Rand64::new(1));
    (backend, fields, params)
}

#[test]
fn test_mean_over_attempts() {
    let (backend, fields, params) = fixture();
    let settings = settings(4, None, CheckLevel::Off);
    let runner = TrialRunner::new(&settings, &backend, &fields, params);
    let mut calls = 0;
    let mean = runner.run(Family::RainsElliptic, |clock| {
        calls += 1;
        if calls % 2 == 0 {
            return Err(AttemptError::NoIsomorphismFound);
        }
        clock.record(Duration::from_millis(500));
        Ok(None)
    }).unwrap();
    assert_eq!(4, calls);
    // two successful attempts of 0.5s, averaged over all four attempts
    assert!((mean - 0.25).abs() < 1e-9);
}

#[test]
fn test_all_attempts_fail() {
    let (backend, fields, params) = fixture();
    let settings = settings(10, None, CheckLevel::Every);
    let runner = TrialRunner::new(&settings, &backend, &fields, params);
    let mut calls = 0;
    let mean = runner.run(Family::RainsCyclotomic, |_| {
        calls += 1;
        Err(AttemptError::Inapplicable)
    }).unwrap();
    assert_eq!(10, calls);
    assert_eq!(0., mean);
}

#[test]
fn test_no_loops() {
    let (backend, fields, params) = fixture();
    let settings = settings(0, None, CheckLevel::Off);
    let runner = TrialRunner::new(&settings, &backend, &fields, params);
    let mean = runner.run(Family::CasLibrary, |_| panic!("no attempt expected")).unwrap();
    assert_eq!(0., mean);
}

#[test]
fn test_zero_budget_stops_after_first_attempt() {
    let (backend, fields, params) = fixture();
    let settings = settings(10, Some(0.), CheckLevel::Off);
    let runner = TrialRunner::new(&settings, &backend, &fields, params);

    let mut calls = 0;
    let mean = runner.run(Family::RainsElliptic, |clock| {
        calls += 1;
        clock.record(Duration::from_millis(300));
        Ok(None)
    }).unwrap();
    assert_eq!(1, calls);
    assert!((mean - 0.3).abs() < 1e-9);

    let mut calls = 0;
    let mean = runner.run(Family::RainsElliptic, |_| {
        calls += 1;
        Err(AttemptError::NoIsomorphismFound)
    }).unwrap();
    assert_eq!(1, calls);
    assert_eq!(0., mean);
}

#[test]
fn test_budget_checked_between_attempts() {
    let (backend, fields, params) = fixture();
    let settings = settings(10, Some(1.), CheckLevel::Off);
    let runner = TrialRunner::new(&settings, &backend, &fields, params);
    let mut calls = 0;
    let mean = runner.run(Family::RainsElliptic, |clock| {
        calls += 1;
        clock.record(Duration::from_millis(400));
        Ok(None)
    }).unwrap();
    assert_eq!(3, calls);
    assert!((mean - 0.4).abs() < 1e-9);
}

#[test]
fn test_check_first_attempt_only() {
    let (backend, fields, params) = fixture();
    let settings = settings(3, None, CheckLevel::First);
    let runner = TrialRunner::new(&settings, &backend, &fields, params);
    let mut calls = 0;
    let result = runner.run(Family::Kummer(2), |_| {
        calls += 1;
        if calls == 1 {
            Ok(Some(correct_generators(&fields)))
        } else {
            Ok(Some(mismatched_generators(&fields)))
        }
    });
    assert!(result.is_ok());
    assert_eq!(3, calls);
}

#[test]
fn test_check_every_attempt() {
    let (backend, fields, params) = fixture();
    let settings = settings(3, None, CheckLevel::Every);
    let runner = TrialRunner::new(&settings, &backend, &fields, params);
    let mut calls = 0;
    let result = runner.run(Family::Kummer(2), |_| {
        calls += 1;
        if calls == 1 {
            Ok(Some(correct_generators(&fields)))
        } else {
            Ok(Some(mismatched_generators(&fields)))
        }
    });
    assert!(matches!(result, Err(BenchmarkError::DifferentMinpolys { family: Family::Kummer(2), p: 3, n: 5 })));
    assert_eq!(2, calls);
}

#[test]
fn test_check_wrong_degree() {
    let (backend, fields, params) = fixture();
    let settings = settings(3, None, CheckLevel::First);
    let runner = TrialRunner::new(&settings, &backend, &fields, params);
    let result = runner.run(Family::CasLibrary, |_| Ok(Some(subfield_generators(&fields))));
    assert!(matches!(result, Err(BenchmarkError::WrongDegree { family: Family::CasLibrary, p: 3, n: 5, degree: 1 })));
}

#[test]
fn test_check_accepts_correct_algorithm() {
    for seed in 0..20 {
        let backend = MockBackend::new();
        let params = ParameterPair { p: 7, n: 9 };
        let fields = FieldPair::construct(&backend, params, &mut oorandom::Rand64::new(seed));
        let settings = settings(5, None, CheckLevel::Every);
        let runner = TrialRunner::new(&settings, &backend, &fields, params);
        let mut algorithm = MockAlgorithm::correct();
        assert!(runner.run(Family::RainsElliptic, |clock| clock.time(|| algorithm.generators(&fields)).map(Some)).is_ok());
    }
}

#[test]
fn test_environment_failure_aborts() {
    let (backend, fields, params) = fixture();
    let settings = settings(5, None, CheckLevel::Off);
    let runner = TrialRunner::new(&settings, &backend, &fields, params);
    let mut calls = 0;
    let result = runner.run(Family::CasEmbed, |_| {
        calls += 1;
        Err(AttemptError::Environment(io::Error::new(io::ErrorKind::Other, "fork failed")))
    });
    assert!(matches!(result, Err(BenchmarkError::Environment { family: Family::CasEmbed, .. })));
    assert_eq!(1, calls);
}

#[test]
fn test_attempt_clock() {
    let mut clock = AttemptClock::new(TimeSource::Wall);
    assert_eq!(Duration::ZERO, clock.elapsed());
    let value = clock.time(|| {
        let start = Instant::now();
        while start.elapsed() < Duration::from_millis(2) {}
        42
    });
    assert_eq!(42, value);
    assert!(clock.elapsed() >= Duration::from_millis(2));
    clock.record(Duration::from_secs(1));
    assert!(clock.elapsed() >= Duration::from_millis(1002));
}

#[test]
fn test_cpu_clock() {
    let mut clock = AttemptClock::new(TimeSource::ProcessCpu);
    clock.time(|| {
        let start = Instant::now();
        let mut x = 1u64;
        while start.elapsed() < Duration::from_millis(5) {
            x = std::hint::black_box(x.wrapping_mul(3).wrapping_add(1));
        }
        x
    });
    assert!(clock.elapsed() > Duration::ZERO);
}

#[test]
fn test_check_level() {
    assert!(!CheckLevel::Off.applies_to(0));
    assert!(CheckLevel::First.applies_to(0));
    assert!(!CheckLevel::First.applies_to(1));
    assert!(CheckLevel::Every.applies_to(0));
    assert!(CheckLevel::Every.applies_to(7));
}
