use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::invariants::Invariants;
use crate::params::ParameterPair;
use crate::suite::FamilyTimings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    #[default]
    Truncate,
    Append
}

///
/// Where the benchmark results are written to.
///
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    #[default]
    Stdout,
    File {
        path: PathBuf,
        #[serde(default)]
        mode: WriteMode
    }
}

///
/// The result line of one parameter pair, of the form
/// ```text
/// p n (o, c) cas_embed rains_cyclotomic rains_lucas rains_elliptic cas_library kummer...
/// ```
///
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub params: ParameterPair,
    pub invariants: Invariants,
    pub timings: FamilyTimings
}

impl OutputRecord {

    ///
    /// Number of whitespace-separated timing columns after the `(o, c)` tuple.
    ///
    pub fn timing_columns(&self) -> usize {
        5 + self.timings.kummer.len()
    }
}

impl Display for OutputRecord {

    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.params.p, self.params.n, self.invariants, self.timings.cas_embed)?;
        for time in &self.timings.rains {
            write!(f, " {}", time)?;
        }
        write!(f, " {}", self.timings.cas_library)?;
        for time in &self.timings.kummer {
            write!(f, " {}", time)?;
        }
        return Ok(());
    }
}

///
/// Writes one line per [`OutputRecord`], flushing after each of them, so that
/// partial results survive an aborted run.
///
pub struct ResultEmitter<W: Write> {
    out: W
}

impl ResultEmitter<Box<dyn Write>> {

    pub fn open(target: &OutputTarget) -> io::Result<Self> {
        let out: Box<dyn Write> = match target {
            OutputTarget::Stdout => Box::new(io::stdout()),
            OutputTarget::File { path, mode: WriteMode::Truncate } => Box::new(OpenOptions::new().write(true).create(true).truncate(true).open(path)?),
            OutputTarget::File { path, mode: WriteMode::Append } => Box::new(OpenOptions::new().append(true).create(true).open(path)?)
        };
        Ok(ResultEmitter::new(out))
    }
}

impl<W: Write> ResultEmitter<W> {

    pub fn new(out: W) -> Self {
        ResultEmitter { out }
    }

    pub fn emit(&mut self, record: &OutputRecord) -> io::Result<()> {
        writeln!(self.out, "{}", record)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
fn record(c: u64, kummer: Vec<f64>) -> OutputRecord {
    OutputRecord {
        params: ParameterPair { p: 3, n: 5 },
        invariants: Invariants { o: 2, c },
        timings: FamilyTimings { cas_embed: 0.5, rains: [0.25, 0., 1.5], cas_library: 0., kummer }
    }
}

#[cfg(test)]
fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ffisom-bench-{}-{}", std::process::id(), name))
}

#[test]
fn test_format_record() {
    let record = record(4, vec![0.125, 2., 0., 0., 3., 0.75]);
    assert_eq!("3 5 (2, 4) 0.5 0.25 0 1.5 0 0.125 2 0 0 3 0.75", format!("{}", record));
    assert_eq!(11, record.timing_columns());
    assert_eq!(11, format!("{}", record).split(' ').skip(4).count());
}

#[test]
fn test_emit_lines() {
    let mut emitter = ResultEmitter::new(Vec::new());
    emitter.emit(&record(4, vec![1.; 6])).unwrap();
    emitter.emit(&record(1, vec![0., 0., 1., 1., 0., 0.])).unwrap();
    let output = String::from_utf8(emitter.into_inner()).unwrap();
    assert_eq!("3 5 (2, 4) 0.5 0.25 0 1.5 0 1 1 1 1 1 1\n3 5 (2, 1) 0.5 0.25 0 1.5 0 0 0 1 1 0 0\n", output);
}

#[test]
fn test_truncate_and_append() {
    let path = temp_path("truncate-append");
    let truncate = OutputTarget::File { path: path.clone(), mode: WriteMode::Truncate };
    let append = OutputTarget::File { path: path.clone(), mode: WriteMode::Append };
    let first = record(4, vec![1.; 6]);
    let second = record(1, vec![2.; 6]);

    ResultEmitter::open(&truncate).unwrap().emit(&first).unwrap();
    ResultEmitter::open(&truncate).unwrap().emit(&second).unwrap();
    assert_eq!(format!("{}\n", second), std::fs::read_to_string(&path).unwrap());

    ResultEmitter::open(&append).unwrap().emit(&first).unwrap();
    assert_eq!(format!("{}\n{}\n", second, first), std::fs::read_to_string(&path).unwrap());

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_append_creates_file() {
    let path = temp_path("append-create");
    let _ = std::fs::remove_file(&path);
    ResultEmitter::open(&OutputTarget::File { path: path.clone(), mode: WriteMode::Append }).unwrap().emit(&record(4, Vec::new())).unwrap();
    assert_eq!("3 5 (2, 4) 0.5 0.25 0 1.5 0\n", std::fs::read_to_string(&path).unwrap());
    std::fs::remove_file(&path).unwrap();
}
