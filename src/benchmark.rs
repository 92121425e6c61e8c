use std::fmt::{Display, Formatter};
use std::io::{self, Write};

use crate::computation::{BenchmarkObserver, DontObserve, LogProgress};
use crate::config::BenchmarkConfig;
use crate::emit::{OutputRecord, ResultEmitter};
use crate::field::{BenchmarkFields, FieldBackend};
use crate::isomorphism::Family;
use crate::log_progress;
use crate::suite::AlgorithmSuite;

///
/// Errors that abort a whole benchmark run.
///
#[derive(Debug)]
pub enum BenchmarkError {
    InvalidConfig(String),
    ConfigParse(serde_json::Error),
    ///
    /// Writing the results failed.
    ///
    Output(io::Error),
    ///
    /// An external process could not be started or stopped.
    ///
    Environment {
        family: Family,
        source: io::Error
    },
    ///
    /// An algorithm returned a generator whose minimal polynomial does not have
    /// degree `n`; this indicates a bug in the algorithm or the backend.
    ///
    WrongDegree {
        family: Family,
        p: u64,
        n: u64,
        degree: usize
    },
    ///
    /// An algorithm returned generators with different minimal polynomials, so
    /// they do not define an isomorphism; this indicates a bug in the algorithm or
    /// the backend.
    ///
    DifferentMinpolys {
        family: Family,
        p: u64,
        n: u64
    }
}

impl Display for BenchmarkError {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchmarkError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            BenchmarkError::ConfigParse(err) => write!(f, "cannot parse configuration: {}", err),
            BenchmarkError::Output(err) => write!(f, "cannot write results: {}", err),
            BenchmarkError::Environment { family, source } => write!(f, "{}: external process failure: {}", family, source),
            BenchmarkError::WrongDegree { family, p, n, degree } => write!(f, "{}: wrong degree {} of generator for p = {}, n = {}", family, degree, p, n),
            BenchmarkError::DifferentMinpolys { family, p, n } => write!(f, "{}: different minpolys of generators for p = {}, n = {}", family, p, n)
        }
    }
}

impl std::error::Error for BenchmarkError {

    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchmarkError::ConfigParse(err) => Some(err),
            BenchmarkError::Output(err) => Some(err),
            BenchmarkError::Environment { source, .. } => Some(source),
            _ => None
        }
    }
}

impl From<io::Error> for BenchmarkError {

    fn from(err: io::Error) -> Self {
        BenchmarkError::Output(err)
    }
}

///
/// Runs the benchmark described by `config` on the given algorithms, and writes the
/// results to the configured output target.
///
/// For each parameter pair `(p, n)`, this builds two independent representations of
/// `GF(p^n)` in each backend, computes the invariants `o` and `c`, times all
/// applicable algorithms and writes one line with the mean times. Progress is printed
/// to stdout if `config.verbose` is set.
///
/// The run is aborted if an algorithm returns an incorrect result (if checks are enabled),
/// if an external process fails, or if writing the results fails.
///
pub fn benchmark<S, N>(config: &BenchmarkConfig, suite: &mut AlgorithmSuite<S, N>) -> Result<(), BenchmarkError>
    where S: FieldBackend, N: FieldBackend
{
    config.validate()?;
    let mut emitter = ResultEmitter::open(&config.output)?;
    if config.verbose {
        benchmark_with(config, suite, LogProgress, &mut emitter)
    } else {
        benchmark_with(config, suite, DontObserve, &mut emitter)
    }
}

///
/// Like [`benchmark()`], but reports progress to the given observer and writes the
/// results to the given emitter, ignoring `config.verbose` and `config.output`.
///
pub fn benchmark_with<S, N, O, W>(config: &BenchmarkConfig, suite: &mut AlgorithmSuite<S, N>, observer: O, emitter: &mut ResultEmitter<W>) -> Result<(), BenchmarkError>
    where S: FieldBackend, N: FieldBackend, O: BenchmarkObserver, W: Write
{
    config.validate()?;
    let settings = config.suite_settings();
    let mut rng = config.rng();
    for params in config.parameter_space().pairs() {
        let fields = BenchmarkFields::construct(&suite.symbolic, &suite.native, params, &mut rng);
        let invariants = suite.invariants(params);
        log_progress!(observer, "{}, (o = {}, c = {})\n", params, invariants.o, invariants.c);
        let timings = suite.run_pair(&settings, params, invariants, &fields)?;
        let record = OutputRecord { params, invariants, timings };
        tracing::info!(%record, "finished parameter pair");
        emitter.emit(&record)?;
    }
    return Ok(());
}

#[cfg(test)]
use crate::computation::RecordProgress;
#[cfg(test)]
use crate::testing::*;
#[cfg(test)]
use crate::trial::CheckLevel;
#[cfg(test)]
use crate::emit::{OutputTarget, WriteMode};

#[cfg(test)]
fn run_to_string(config: &BenchmarkConfig, suite: &mut MockSuite) -> (Result<(), BenchmarkError>, String, String) {
    let observer = RecordProgress::default();
    let mut emitter = ResultEmitter::new(Vec::new());
    let result = benchmark_with(config, &mut suite.suite, observer.clone(), &mut emitter);
    let output = String::from_utf8(emitter.into_inner()).unwrap();
    let progress = observer.output.borrow().clone();
    (result, output, progress)
}

#[cfg(test)]
fn small_config() -> BenchmarkConfig {
    let mut config = BenchmarkConfig::default();
    config.p_range = 3..4;
    config.n_range = 5..6;
    config.loops = 1;
    config.seed = Some(1);
    config.check = CheckLevel::Every;
    config
}

#[test]
fn test_single_pair() {
    let mut suite = MockSuite::new(|_| 2);
    let (result, output, progress) = run_to_string(&small_config(), &mut suite);
    assert!(result.is_ok());
    assert_eq!("p = 3, n = 5, (o = 2, c = 4)\n", progress);
    let lines = output.lines().collect::<Vec<_>>();
    assert_eq!(1, lines.len());
    assert!(lines[0].starts_with("3 5 (2, 4) "));
    let columns = lines[0].split(' ').skip(4).map(|x| x.parse::<f64>().unwrap()).collect::<Vec<_>>();
    assert_eq!(11, columns.len());
    assert!(columns.iter().all(|t| *t > 0.));
}

#[test]
fn test_uniform_column_count() {
    let mut suite = MockSuite::new(|_| 2);
    let mut config = small_config();
    config.p_range = 2..12;
    config.n_range = 2..10;
    let (result, output, _) = run_to_string(&config, &mut suite);
    assert!(result.is_ok());
    let lines = output.lines().collect::<Vec<_>>();
    let expected = config.parameter_space().pairs().count();
    assert_eq!(expected, lines.len());
    assert!(lines.len() > 5);
    assert!(lines.iter().any(|line| line.contains(", 1) ")));
    for line in lines {
        assert_eq!(4 + 11, line.split(' ').count(), "{}", line);
    }
}

#[test]
fn test_skipped_families_report_zero() {
    let mut suite = MockSuite::new(|_| 2);
    let mut config = small_config();
    config.skip_cas_embed = true;
    config.skip_kummer = true;
    let (result, output, _) = run_to_string(&config, &mut suite);
    assert!(result.is_ok());
    let columns = output.trim_end().split(' ').skip(4).collect::<Vec<_>>();
    assert_eq!("0", columns[0]);
    assert!(columns[1..5].iter().all(|t| *t != "0"));
    assert_eq!(vec!["0"; 6], columns[5..].to_vec());
}

#[test]
fn test_zero_budget() {
    let mut suite = MockSuite::new(|_| 2);
    let mut config = small_config();
    config.loops = 10;
    config.tmax = Some(0.);
    let (result, _, _) = run_to_string(&config, &mut suite);
    assert!(result.is_ok());
    assert_eq!(1, suite.cas_log.started());
    assert_eq!(1, suite.calls.get(Family::RainsCyclotomic));
    assert_eq!(1, suite.calls.get(Family::RainsLucas));
    assert_eq!(1, suite.calls.get(Family::RainsElliptic));
    assert_eq!(1, suite.calls.get(Family::CasLibrary));
    assert_eq!(6, suite.calls.kummer_total());
}

#[test]
fn test_correctness_violation_aborts_run() {
    let mut suite = MockSuite::new(|_| 2);
    suite.suite.cas_library = Box::new(MockAlgorithm::wrong_degree());
    let mut config = small_config();
    config.p_range = 3..8;
    let (result, output, _) = run_to_string(&config, &mut suite);
    assert!(matches!(result, Err(BenchmarkError::WrongDegree { family: Family::CasLibrary, p: 3, n: 5, degree: 1 })));
    assert_eq!("", output);
}

#[test]
fn test_no_check_ignores_incorrect_results() {
    let mut suite = MockSuite::new(|_| 2);
    suite.suite.cas_library = Box::new(MockAlgorithm::wrong_degree());
    let mut config = small_config();
    config.check = CheckLevel::Off;
    let (result, output, _) = run_to_string(&config, &mut suite);
    assert!(result.is_ok());
    assert_eq!(1, output.lines().count());
}

#[test]
fn test_empty_sweep() {
    let mut suite = MockSuite::new(|_| 2);
    let mut config = small_config();
    config.n_range = 5..2;
    let (result, output, progress) = run_to_string(&config, &mut suite);
    assert!(result.is_ok());
    assert_eq!("", output);
    assert_eq!("", progress);
}

#[test]
fn test_invalid_config() {
    let mut suite = MockSuite::new(|_| 2);
    let mut config = small_config();
    config.tmax = Some(f64::NAN);
    let (result, _, _) = run_to_string(&config, &mut suite);
    assert!(matches!(result, Err(BenchmarkError::InvalidConfig(_))));
    assert_eq!(0, suite.calls.total());
}

#[test]
fn test_benchmark_to_file() {
    let path = std::env::temp_dir().join(format!("ffisom-bench-{}-run", std::process::id()));
    let mut config = small_config();
    config.verbose = false;
    config.output = OutputTarget::File { path: path.clone(), mode: WriteMode::Truncate };

    benchmark(&config, &mut MockSuite::new(|_| 2).suite).unwrap();
    benchmark(&config, &mut MockSuite::new(|_| 3).suite).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(1, content.lines().count());
    assert!(content.starts_with("3 5 (3, 4) "));

    config.output = OutputTarget::File { path: path.clone(), mode: WriteMode::Append };
    benchmark(&config, &mut MockSuite::new(|_| 2).suite).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(2, content.lines().count());
    assert!(content.lines().nth(1).unwrap().starts_with("3 5 (2, 4) "));

    std::fs::remove_file(&path).unwrap();
}
