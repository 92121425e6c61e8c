use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};

use crate::benchmark::BenchmarkError;
use crate::emit::OutputTarget;
use crate::isomorphism::KummerVariant;
use crate::params::{ParameterSpace, PrimalityMode};
use crate::suite::SuiteSettings;
use crate::trial::{CheckLevel, TimeSource, TrialSettings};

///
/// All options of a benchmark run.
///
/// Every field has a default, so a configuration file only has to contain the
/// options that differ from it. The defaults sweep over `3 <= p < 2^10` and odd
/// `3 <= n < 2^8`, with 10 attempts per algorithm, no time limit and no correctness
/// checks, and write the results to stdout.
///
/// # Example
/// ```
/// # use ffisom_bench::config::*;
/// # use ffisom_bench::trial::CheckLevel;
/// let config = BenchmarkConfig::from_json(r#"{
///     "p_range": { "start": 3, "end": 20 },
///     "n_range": { "start": 3, "end": 10 },
///     "loops": 3,
///     "check": "first",
///     "skip_cas_embed": true
/// }"#).unwrap();
/// assert_eq!(3..20, config.p_range);
/// assert_eq!(CheckLevel::First, config.check);
/// assert_eq!(None, config.tmax);
/// ```
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchmarkConfig {
    pub p_range: Range<u64>,
    pub n_range: Range<u64>,
    pub c_window: RangeInclusive<u64>,
    pub o_window: RangeInclusive<u64>,
    pub loops: usize,
    ///
    /// Time budget per algorithm and parameter pair in seconds; `None` means unbounded.
    ///
    pub tmax: Option<f64>,
    pub primality: PrimalityMode,
    pub even: bool,
    pub check: CheckLevel,
    pub output: OutputTarget,
    pub verbose: bool,
    pub skip_cas_embed: bool,
    pub skip_rains: bool,
    pub skip_cas_library: bool,
    pub skip_kummer: bool,
    pub clock: TimeSource,
    ///
    /// Seed for the randomized field representations; if `None`, a seed is derived
    /// from the current time.
    ///
    pub seed: Option<u64>,
    pub kummer_variants: Vec<KummerVariant>
}

impl Default for BenchmarkConfig {

    fn default() -> Self {
        BenchmarkConfig {
            p_range: 3..(1 << 10),
            n_range: 3..(1 << 8),
            c_window: 1..=u64::MAX,
            o_window: 1..=u64::MAX,
            loops: 10,
            tmax: None,
            primality: PrimalityMode::Any,
            even: false,
            check: CheckLevel::Off,
            output: OutputTarget::Stdout,
            verbose: true,
            skip_cas_embed: false,
            skip_rains: false,
            skip_cas_library: false,
            skip_kummer: false,
            clock: TimeSource::Wall,
            seed: None,
            kummer_variants: KummerVariant::defaults()
        }
    }
}

impl BenchmarkConfig {

    pub fn from_json(json: &str) -> Result<Self, BenchmarkError> {
        let config: BenchmarkConfig = serde_json::from_str(json).map_err(BenchmarkError::ConfigParse)?;
        config.validate()?;
        return Ok(config);
    }

    ///
    /// Checks that the configuration is consistent. Empty ranges for `p` or `n` are
    /// allowed, and just lead to an empty benchmark.
    ///
    pub fn validate(&self) -> Result<(), BenchmarkError> {
        if let Some(tmax) = self.tmax {
            if tmax.is_nan() || tmax < 0. {
                return Err(BenchmarkError::InvalidConfig(format!("time budget must be nonnegative, got {}", tmax)));
            }
        }
        if self.c_window.is_empty() {
            return Err(BenchmarkError::InvalidConfig(format!("empty window for c: {:?}", self.c_window)));
        }
        if self.o_window.is_empty() {
            return Err(BenchmarkError::InvalidConfig(format!("empty window for o: {:?}", self.o_window)));
        }
        return Ok(());
    }

    pub fn parameter_space(&self) -> ParameterSpace {
        ParameterSpace {
            p_range: self.p_range.clone(),
            n_range: self.n_range.clone(),
            primality: self.primality,
            even: self.even
        }
    }

    pub fn suite_settings(&self) -> SuiteSettings {
        SuiteSettings {
            trials: TrialSettings {
                loops: self.loops,
                tmax: self.tmax,
                check: self.check,
                clock: self.clock
            },
            o_window: self.o_window.clone(),
            c_window: self.c_window.clone(),
            skip_cas_embed: self.skip_cas_embed,
            skip_rains: self.skip_rains,
            skip_cas_library: self.skip_cas_library,
            skip_kummer: self.skip_kummer,
            kummer_variants: self.kummer_variants.clone()
        }
    }

    pub fn rng(&self) -> oorandom::Rand64 {
        let seed = self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH)
                .map(|time| time.as_nanos() as u64)
                .unwrap_or(0)
        });
        oorandom::Rand64::new(seed as u128)
    }
}

#[cfg(test)]
use crate::emit::WriteMode;

#[test]
fn test_default_config() {
    let config = BenchmarkConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(3..1024, config.p_range);
    assert_eq!(3..256, config.n_range);
    assert_eq!(10, config.loops);
    assert_eq!(OutputTarget::Stdout, config.output);
    assert_eq!(6, config.kummer_variants.len());
}

#[test]
fn test_from_json_partial() {
    let config = BenchmarkConfig::from_json(r#"{
        "loops": 2,
        "tmax": 0.5,
        "even": true,
        "primality": "prime_power",
        "check": "every",
        "clock": "process_cpu",
        "c_window": { "start": 2, "end": 8 },
        "output": { "file": { "path": "/tmp/results.txt", "mode": "append" } },
        "seed": 17
    }"#).unwrap();
    assert_eq!(2, config.loops);
    assert_eq!(Some(0.5), config.tmax);
    assert!(config.even);
    assert_eq!(PrimalityMode::PrimePower, config.primality);
    assert_eq!(CheckLevel::Every, config.check);
    assert_eq!(TimeSource::ProcessCpu, config.clock);
    assert_eq!(2..=8, config.c_window);
    assert_eq!(OutputTarget::File { path: "/tmp/results.txt".into(), mode: WriteMode::Append }, config.output);
    assert_eq!(Some(17), config.seed);
    assert_eq!(BenchmarkConfig::default().p_range, config.p_range);
}

#[test]
fn test_from_json_rejects() {
    assert!(matches!(BenchmarkConfig::from_json(r#"{ "tmax": -1.0 }"#), Err(BenchmarkError::InvalidConfig(_))));
    assert!(matches!(BenchmarkConfig::from_json(r#"{ "c_window": { "start": 5, "end": 2 } }"#), Err(BenchmarkError::InvalidConfig(_))));
    assert!(matches!(BenchmarkConfig::from_json(r#"{ "loop": 5 }"#), Err(BenchmarkError::ConfigParse(_))));
    assert!(matches!(BenchmarkConfig::from_json(r#"{ "check": "sometimes" }"#), Err(BenchmarkError::ConfigParse(_))));
}

#[test]
fn test_json_roundtrip() {
    let mut config = BenchmarkConfig::default();
    config.skip_kummer = true;
    config.tmax = Some(2.5);
    config.kummer_variants.truncate(2);
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(config, BenchmarkConfig::from_json(&json).unwrap());
}

#[test]
fn test_seeded_rng() {
    let mut config = BenchmarkConfig::default();
    config.seed = Some(5);
    assert_eq!(config.rng().rand_u64(), config.rng().rand_u64());
}

#[test]
fn test_derived_settings() {
    let mut config = BenchmarkConfig::default();
    config.o_window = 1..=10;
    config.skip_rains = true;
    config.loops = 4;
    let settings = config.suite_settings();
    assert_eq!(1..=10, settings.o_window);
    assert!(settings.skip_rains);
    assert!(!settings.skip_kummer);
    assert_eq!(4, settings.trials.loops);
    let space = config.parameter_space();
    assert_eq!(config.p_range, space.p_range);
    assert!(!space.even);
}
